mod common;

use common::{dec, setup_test_env, ymd};
use report_core::{
    config::ReportConfig,
    domain::{ReferenceEntry, ReferenceKind},
    storage::{InMemoryCarryoverStore, InMemoryTransactionSource},
    Catalog, FixedClock, MonthKey, PaymentStatus, ReportEngine, ReportFilters, Transaction,
    TransactionFilter, TransactionType,
};

fn month(year: i32, month: u32) -> ReportFilters {
    ReportFilters::for_month(MonthKey::new(year, month).unwrap())
}

fn no_auto_carryover() -> ReportConfig {
    ReportConfig {
        auto_carryover: false,
        ..ReportConfig::default()
    }
}

#[test]
fn scenario_c_partial_expense_uses_derived_status() {
    let env = setup_test_env();
    // Stored as paid, but 300 is still outstanding.
    let expense = Transaction::expense(dec(500), ymd(2024, 5, 10))
        .with_payment(dec(200))
        .with_stored_status(PaymentStatus::Paid);
    assert_eq!(expense.effective_status(), PaymentStatus::Partial);
    env.seed(&[expense], &Catalog::default());

    let report = env
        .engine_with(no_auto_carryover(), ymd(2024, 6, 1))
        .build_report(&month(2024, 5))
        .unwrap();
    let tallies = &report.stats.payment_status_expense;
    assert_eq!(tallies.partial.count, 1);
    assert_eq!(tallies.partial.amount, dec(200));
    assert_eq!(tallies.partial.balance, dec(300));
    assert_eq!(tallies.paid.count, 0);
}

#[test]
fn scenario_d_first_week_of_january_2026_starts_in_december() {
    let env = setup_test_env();
    env.seed(
        &[
            Transaction::income(dec(90), ymd(2025, 12, 30)),
            Transaction::income(dec(40), ymd(2026, 1, 2)),
            Transaction::expense(dec(15), ymd(2026, 1, 31)).paid_in_full(),
        ],
        &Catalog::default(),
    );
    let report = env
        .engine_with(no_auto_carryover(), ymd(2026, 3, 1))
        .build_report(&month(2026, 1))
        .unwrap();

    let weekly = &report.stats.weekly_breakdown;
    let first = weekly.weeks[0];
    assert_eq!(first.start_date, ymd(2025, 12, 29));
    assert_eq!(first.start_boundary, ymd(2026, 1, 1));
    assert_eq!(first.iso_week, 1);

    let income = &weekly.income["Uncategorized > Uncategorized > Uncategorized"];
    assert_eq!(income.week(1), dec(40));
    assert_eq!(income.total, dec(40));
    let expense = &weekly.expense["Uncategorized > Uncategorized > Uncategorized"];
    assert_eq!(expense.week(5), dec(15));
}

#[test]
fn scenario_e_prior_unpaid_expense_stays_out_of_breakdowns() {
    let env = setup_test_env();
    let rent = ReferenceEntry::new("Rent").with_kind(ReferenceKind::Expense);
    let catalog = Catalog {
        categories: vec![rent.clone()],
        ..Catalog::default()
    };
    env.seed(
        &[
            Transaction::expense(dec(700), ymd(2024, 1, 25)).with_hierarchy(
                Some(rent.id),
                None,
                None,
            ),
            Transaction::expense(dec(300), ymd(2024, 2, 5))
                .paid_in_full()
                .with_hierarchy(Some(rent.id), None, None),
            Transaction::income(dec(2_000), ymd(2024, 2, 1)),
        ],
        &catalog,
    );

    let report = env
        .engine_with(no_auto_carryover(), ymd(2024, 6, 1))
        .build_report(&month(2024, 2))
        .unwrap();
    let stats = &report.stats;
    assert_eq!(stats.payment_status_expense.prior_pending.count, 1);
    assert_eq!(stats.payment_status_expense.prior_pending.amount, dec(700));
    assert_eq!(stats.carryover_balance, dec(700));
    assert_eq!(stats.total_expenses, dec(300));
    assert_eq!(stats.by_category["Rent"].expense, dec(300));
    assert_eq!(stats.by_category["Rent"].count, 1);
    assert!(stats.by_month.keys().all(|key| key == "2024-02"));
    assert_eq!(report.transactions.len(), 3);
}

#[test]
fn total_transactions_counts_income_and_expense() {
    let env = setup_test_env();
    env.seed(
        &[
            Transaction::income(dec(10), ymd(2024, 3, 1)),
            Transaction::income(dec(20), ymd(2024, 3, 9)),
            Transaction::expense(dec(5), ymd(2024, 3, 9)),
            Transaction::expense(dec(5), ymd(2024, 2, 9)).paid_in_full(),
            Transaction::income(dec(99), ymd(2024, 4, 1)),
        ],
        &Catalog::default(),
    );
    let stats = env
        .engine_with(no_auto_carryover(), ymd(2024, 6, 1))
        .build_report(&month(2024, 3))
        .unwrap()
        .stats;
    assert_eq!(stats.income_count, 2);
    assert_eq!(stats.expense_count, 1);
    assert_eq!(
        stats.total_transactions,
        stats.income_count + stats.expense_count
    );
    assert_eq!(stats.average_income, dec(15));
}

#[test]
fn derived_status_ignores_the_stored_status() {
    for stored in [
        PaymentStatus::Unpaid,
        PaymentStatus::Partial,
        PaymentStatus::Paid,
    ] {
        let base = Transaction::expense(dec(100), ymd(2024, 1, 1)).with_stored_status(stored);
        assert_eq!(base.effective_status(), PaymentStatus::Unpaid);
        let partial = Transaction::expense(dec(100), ymd(2024, 1, 1))
            .with_payment(dec(40))
            .with_stored_status(stored);
        assert_eq!(partial.effective_status(), PaymentStatus::Partial);
        let paid = Transaction::expense(dec(100), ymd(2024, 1, 1))
            .paid_in_full()
            .with_stored_status(stored);
        assert_eq!(paid.effective_status(), PaymentStatus::Paid);
    }
}

#[test]
fn mixed_tree_rows_chain_weekly_carryover() {
    let env = setup_test_env();
    let dues = ReferenceEntry::new("Dues").with_kind(ReferenceKind::Mixed);
    let refunds = ReferenceEntry::new("Refunds").under_general(dues.id);
    let salary = ReferenceEntry::new("Salary").with_kind(ReferenceKind::Income);
    let catalog = Catalog {
        categories: vec![dues.clone(), salary.clone()],
        concepts: vec![refunds.clone()],
        ..Catalog::default()
    };
    let tag = |txn: Transaction| txn.with_hierarchy(Some(dues.id), Some(refunds.id), None);
    env.seed(
        &[
            tag(Transaction::income(dec(300), ymd(2024, 6, 20))),
            tag(Transaction::income(dec(150), ymd(2024, 7, 2))),
            tag(Transaction::expense(dec(60), ymd(2024, 7, 9)).paid_in_full()),
            tag(Transaction::expense(dec(20), ymd(2024, 7, 16))),
            tag(Transaction::income(dec(75), ymd(2024, 7, 30))),
            Transaction::income(dec(5_000), ymd(2024, 7, 1)).with_hierarchy(
                Some(salary.id),
                None,
                None,
            ),
        ],
        &catalog,
    );

    let report = env
        .engine_with(no_auto_carryover(), ymd(2024, 7, 20))
        .build_report(&month(2024, 7))
        .unwrap();
    let rows = &report.mixed_trees;
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| row.category_label == "Dues"));
    assert_eq!(rows[0].carryover_in, dec(300));
    for n in 1..rows.len() {
        let earlier: rust_decimal::Decimal = rows[..n].iter().map(|row| row.balance).sum();
        assert_eq!(rows[n].carryover_in, rows[0].carryover_in + earlier);
    }
    let last = rows.last().unwrap();
    assert_eq!(last.income, dec(75));
    // Dated after "today", so nothing counts toward the to-date projection.
    assert_eq!(last.today_income, dec(0));
    assert_eq!(last.running_balance_to_date, last.carryover_in);
}

#[test]
fn criteria_narrow_every_figure() {
    let env = setup_test_env();
    let food = ReferenceEntry::new("Food");
    let catalog = Catalog {
        categories: vec![food.clone()],
        ..Catalog::default()
    };
    env.seed(
        &[
            Transaction::expense(dec(30), ymd(2024, 10, 3))
                .paid_in_full()
                .with_hierarchy(Some(food.id), None, None),
            Transaction::expense(dec(70), ymd(2024, 10, 4)).paid_in_full(),
            Transaction::income(dec(500), ymd(2024, 10, 5)),
        ],
        &catalog,
    );
    let filters = month(2024, 10).with_criteria(TransactionFilter {
        kind: Some(TransactionType::Expense),
        general_id: Some(food.id),
        ..TransactionFilter::default()
    });
    let report = env
        .engine_with(no_auto_carryover(), ymd(2024, 12, 1))
        .build_report(&filters)
        .unwrap();
    assert_eq!(report.transactions.len(), 1);
    assert_eq!(report.stats.total_expenses, dec(30));
    assert_eq!(report.stats.total_income, dec(0));
    assert_eq!(report.stats.by_category.len(), 1);
}

#[test]
fn negative_amounts_are_skipped_and_reported() {
    let mut broken = Transaction::expense(dec(10), ymd(2024, 3, 4));
    broken.amount = dec(-10);
    let source = InMemoryTransactionSource::new(vec![
        broken,
        Transaction::income(dec(25), ymd(2024, 3, 5)),
    ]);
    let engine = ReportEngine::new(
        Box::new(source),
        Box::new(InMemoryCarryoverStore::new()),
        Box::new(Catalog::default()),
    )
    .with_clock(Box::new(FixedClock::on(ymd(2024, 8, 1))));

    let report = engine.build_report(&month(2024, 3)).unwrap();
    assert_eq!(report.stats.skipped_records, 1);
    assert_eq!(report.stats.total_income, dec(25));
    assert_eq!(report.warnings.len(), 1);

    let stats = engine
        .generate_report_stats(&report.transactions, &month(2024, 3))
        .unwrap();
    assert_eq!(stats.total_transactions, 1);
}
