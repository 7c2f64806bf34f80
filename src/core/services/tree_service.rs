//! Weekly running balances for category/concept pairs that carry both income and expense.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    core::services::week_service::WeekBucketer,
    domain::{Catalog, MixedTreeRow, ReportFilters, ReportStats, Transaction},
};

type PairKey = (Option<Uuid>, Option<Uuid>);

#[derive(Default)]
struct WeekCell {
    income: Decimal,
    expense: Decimal,
    today_income: Decimal,
    today_expense: Decimal,
    transactions: Vec<Uuid>,
}

#[derive(Default, Clone, Copy)]
struct Activity {
    income: bool,
    expense: bool,
}

pub struct MixedTreeComparator<'a> {
    catalog: &'a Catalog,
    today: NaiveDate,
}

impl<'a> MixedTreeComparator<'a> {
    /// `today` bounds the as-of-today projection in each row.
    pub fn new(catalog: &'a Catalog, today: NaiveDate) -> Self {
        Self { catalog, today }
    }

    /// Rows ordered by week, then by the magnitude of the week's balance.
    pub fn compare_trees(
        &self,
        all_transactions: &[Transaction],
        stats: &ReportStats,
        filters: &ReportFilters,
    ) -> Vec<MixedTreeRow> {
        let weeks = if stats.weekly_breakdown.weeks.is_empty() {
            match filters.range() {
                Some((start, end)) => WeekBucketer::build_weeks(start, end),
                None => return Vec::new(),
            }
        } else {
            stats.weekly_breakdown.weeks.clone()
        };
        let Some(period_start) = filters
            .start_date
            .or_else(|| weeks.first().map(|week| week.start_boundary))
        else {
            return Vec::new();
        };

        let mut initial_carryover: HashMap<PairKey, Decimal> = HashMap::new();
        let mut cells: BTreeMap<PairKey, BTreeMap<u32, WeekCell>> = BTreeMap::new();
        let mut activity: HashMap<PairKey, Activity> = HashMap::new();

        for txn in all_transactions.iter().filter(|txn| txn.is_well_formed()) {
            let key = (txn.general_id, txn.concept_id);
            if txn.date < period_start {
                *initial_carryover.entry(key).or_default() += signed(txn);
                continue;
            }
            if !filters.in_period(txn.date) {
                continue;
            }
            let Some(week) = WeekBucketer::assign(&weeks, txn.date) else {
                continue;
            };
            let cell = cells.entry(key).or_default().entry(week).or_default();
            let seen = activity.entry(key).or_default();
            let counts_today = txn.date <= self.today;
            if txn.is_income() {
                cell.income += txn.amount;
                seen.income = true;
                if counts_today {
                    cell.today_income += txn.amount;
                }
            } else {
                cell.expense += txn.amount;
                seen.expense = true;
                if counts_today {
                    cell.today_expense += txn.amount;
                }
            }
            cell.transactions.push(txn.id);
        }

        let mut rows = Vec::new();
        for (key, weeks_for_pair) in cells {
            let seen = activity.get(&key).copied().unwrap_or_default();
            let mixed = (seen.income && seen.expense) || self.catalog.is_mixed_pair(key.0, key.1);
            if !mixed {
                continue;
            }
            let mut running = initial_carryover.get(&key).copied().unwrap_or_default();
            for (week_number, cell) in weeks_for_pair {
                let balance = cell.income - cell.expense;
                let carryover_in = running;
                running += balance;
                if week_number == 0 {
                    continue;
                }
                rows.push(MixedTreeRow {
                    week_number,
                    general_id: key.0,
                    concept_id: key.1,
                    category_label: self.catalog.category_label(key.0),
                    concept_label: self.catalog.concept_label(key.1),
                    carryover_in,
                    income: cell.income,
                    expense: cell.expense,
                    balance,
                    today_income: cell.today_income,
                    today_expense: cell.today_expense,
                    running_balance_to_date: carryover_in + cell.today_income
                        - cell.today_expense,
                    transaction_count: cell.transactions.len(),
                    transactions: cell.transactions,
                });
            }
        }

        rows.sort_by(|a, b| {
            a.week_number
                .cmp(&b.week_number)
                .then_with(|| b.balance.abs().cmp(&a.balance.abs()))
                .then_with(|| a.category_label.cmp(&b.category_label))
                .then_with(|| a.concept_label.cmp(&b.concept_label))
        });
        rows
    }
}

fn signed(txn: &Transaction) -> Decimal {
    if txn.is_income() {
        txn.amount
    } else {
        -txn.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReferenceEntry, ReferenceKind};

    fn ymd(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn april() -> ReportFilters {
        ReportFilters::between(ymd(4, 1), ymd(4, 30)).unwrap()
    }

    #[test]
    fn carryover_in_chains_weekly_balances() {
        let dues = ReferenceEntry::new("Dues");
        let members = ReferenceEntry::new("Members").under_general(dues.id);
        let catalog = Catalog {
            categories: vec![dues.clone()],
            concepts: vec![members.clone()],
            ..Catalog::default()
        };
        let pair = |txn: Transaction| txn.with_hierarchy(Some(dues.id), Some(members.id), None);
        // 2024-04-01 is a Monday: weeks start on the 1st, 8th, 15th, 22nd and 29th.
        let txns = vec![
            pair(Transaction::income(dec(200), ymd(3, 20))),
            pair(Transaction::expense(dec(50), ymd(3, 25))),
            pair(Transaction::income(dec(500), ymd(4, 2))),
            pair(Transaction::expense(dec(120), ymd(4, 3))),
            pair(Transaction::expense(dec(80), ymd(4, 10))),
            pair(Transaction::income(dec(40), ymd(4, 16))),
            pair(Transaction::expense(dec(10), ymd(4, 17))),
        ];
        let comparator = MixedTreeComparator::new(&catalog, ymd(4, 16));
        let rows = comparator.compare_trees(&txns, &ReportStats::default(), &april());

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].carryover_in, dec(150));
        assert_eq!(rows[0].balance, dec(380));
        for n in 1..rows.len() {
            let prior: Decimal = rows[..n].iter().map(|row| row.balance).sum();
            assert_eq!(rows[n].carryover_in, rows[0].carryover_in + prior);
        }

        // Week 3 only counts the income dated on or before "today".
        let third = &rows[2];
        assert_eq!(third.week_number, 3);
        assert_eq!(third.today_income, dec(40));
        assert_eq!(third.today_expense, Decimal::ZERO);
        assert_eq!(third.running_balance_to_date, third.carryover_in + dec(40));
        assert_eq!(third.category_label, "Dues");
    }

    #[test]
    fn single_sided_pairs_need_a_mixed_tag() {
        let tagged = ReferenceEntry::new("Refunds").with_kind(ReferenceKind::Mixed);
        let plain = ReferenceEntry::new("Salary");
        let catalog = Catalog {
            categories: vec![tagged.clone(), plain.clone()],
            ..Catalog::default()
        };
        let txns = vec![
            Transaction::income(dec(90), ymd(4, 5)).with_hierarchy(Some(tagged.id), None, None),
            Transaction::income(dec(900), ymd(4, 5)).with_hierarchy(Some(plain.id), None, None),
        ];
        let rows = MixedTreeComparator::new(&catalog, ymd(4, 30)).compare_trees(
            &txns,
            &ReportStats::default(),
            &april(),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].general_id, Some(tagged.id));
    }

    #[test]
    fn rows_sort_by_week_then_balance_magnitude() {
        let catalog = Catalog::default();
        let small = Uuid::new_v4();
        let large = Uuid::new_v4();
        let txns = vec![
            Transaction::income(dec(10), ymd(4, 2)).with_hierarchy(Some(small), None, None),
            Transaction::expense(dec(5), ymd(4, 2)).with_hierarchy(Some(small), None, None),
            Transaction::income(dec(10), ymd(4, 3)).with_hierarchy(Some(large), None, None),
            Transaction::expense(dec(400), ymd(4, 3)).with_hierarchy(Some(large), None, None),
            Transaction::income(dec(1), ymd(4, 9)).with_hierarchy(Some(small), None, None),
        ];
        let rows = MixedTreeComparator::new(&catalog, ymd(4, 30)).compare_trees(
            &txns,
            &ReportStats::default(),
            &april(),
        );
        let order: Vec<_> = rows.iter().map(|row| (row.week_number, row.general_id)).collect();
        assert_eq!(
            order,
            vec![(1, Some(large)), (1, Some(small)), (2, Some(small))]
        );
    }

    #[test]
    fn nothing_to_compare_without_a_period() {
        let catalog = Catalog::default();
        let txns = vec![Transaction::income(dec(10), ymd(4, 2))];
        let rows = MixedTreeComparator::new(&catalog, ymd(4, 30)).compare_trees(
            &txns,
            &ReportStats::default(),
            &ReportFilters::default(),
        );
        assert!(rows.is_empty());
    }
}
