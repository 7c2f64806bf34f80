use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::Identifiable;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    /// Derives a status from the raw settlement fields, ignoring whatever was stored.
    pub fn derive(total_paid: Decimal, balance: Decimal) -> Self {
        if total_paid <= Decimal::ZERO {
            PaymentStatus::Unpaid
        } else if balance > Decimal::ZERO {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Paid
        }
    }
}

/// A single income or expense event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "status")]
    pub stored_status: PaymentStatus,
    #[serde(default)]
    pub total_paid: Decimal,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub general_id: Option<Uuid>,
    #[serde(default)]
    pub concept_id: Option<Uuid>,
    #[serde(default)]
    pub subconcept_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    #[serde(default)]
    pub is_carryover: bool,
}

impl Transaction {
    pub fn new(kind: TransactionType, amount: Decimal, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            date,
            created_at: Utc::now(),
            stored_status: PaymentStatus::Unpaid,
            total_paid: Decimal::ZERO,
            balance: amount,
            general_id: None,
            concept_id: None,
            subconcept_id: None,
            provider_id: None,
            division: None,
            is_carryover: false,
        }
    }

    pub fn income(amount: Decimal, date: NaiveDate) -> Self {
        Self::new(TransactionType::Income, amount, date)
    }

    pub fn expense(amount: Decimal, date: NaiveDate) -> Self {
        Self::new(TransactionType::Expense, amount, date)
    }

    /// Records a cumulative payment and keeps `balance` and the stored status consistent.
    pub fn with_payment(mut self, total_paid: Decimal) -> Self {
        self.total_paid = total_paid;
        self.balance = (self.amount - total_paid).max(Decimal::ZERO);
        self.stored_status = PaymentStatus::derive(self.total_paid, self.balance);
        self
    }

    pub fn paid_in_full(self) -> Self {
        let amount = self.amount;
        self.with_payment(amount)
    }

    pub fn with_stored_status(mut self, status: PaymentStatus) -> Self {
        self.stored_status = status;
        self
    }

    pub fn with_hierarchy(
        mut self,
        general_id: Option<Uuid>,
        concept_id: Option<Uuid>,
        subconcept_id: Option<Uuid>,
    ) -> Self {
        self.general_id = general_id;
        self.concept_id = concept_id;
        self.subconcept_id = subconcept_id;
        self
    }

    pub fn with_provider(mut self, provider_id: Uuid) -> Self {
        self.provider_id = Some(provider_id);
        self
    }

    pub fn with_division(mut self, division: impl Into<String>) -> Self {
        self.division = Some(division.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    /// Status used for every tally. Expenses are re-derived from `total_paid`/`balance`;
    /// income keeps the stored value.
    pub fn effective_status(&self) -> PaymentStatus {
        match self.kind {
            TransactionType::Expense => PaymentStatus::derive(self.total_paid, self.balance),
            TransactionType::Income => self.stored_status,
        }
    }

    /// Splits the amount into `(settled, outstanding)` according to the effective status.
    pub fn settlement(&self) -> (Decimal, Decimal) {
        match self.effective_status() {
            PaymentStatus::Paid => (self.amount, Decimal::ZERO),
            PaymentStatus::Partial => (self.total_paid, self.balance),
            PaymentStatus::Unpaid => (Decimal::ZERO, self.outstanding()),
        }
    }

    /// Amount still owed. Falls back to the full amount when no balance was recorded.
    pub fn outstanding(&self) -> Decimal {
        if self.balance > Decimal::ZERO {
            self.balance
        } else if self.total_paid <= Decimal::ZERO {
            self.amount
        } else {
            Decimal::ZERO
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.amount >= Decimal::ZERO
            && self.total_paid >= Decimal::ZERO
            && self.balance >= Decimal::ZERO
    }
}

impl Identifiable for Transaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Narrows a transaction set the way report callers filter it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransactionFilter {
    #[serde(default, rename = "type")]
    pub kind: Option<TransactionType>,
    #[serde(default)]
    pub general_id: Option<Uuid>,
    #[serde(default)]
    pub concept_id: Option<Uuid>,
    #[serde(default)]
    pub subconcept_id: Option<Uuid>,
    #[serde(default)]
    pub provider_id: Option<Uuid>,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
}

impl TransactionFilter {
    pub fn is_empty(&self) -> bool {
        self == &TransactionFilter::default()
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        fn check<T: PartialEq>(wanted: &Option<T>, actual: Option<&T>) -> bool {
            match wanted {
                Some(value) => actual == Some(value),
                None => true,
            }
        }

        check(&self.kind, Some(&txn.kind))
            && check(&self.general_id, txn.general_id.as_ref())
            && check(&self.concept_id, txn.concept_id.as_ref())
            && check(&self.subconcept_id, txn.subconcept_id.as_ref())
            && check(&self.provider_id, txn.provider_id.as_ref())
            && check(&self.division, txn.division.as_ref())
            && check(&self.status, Some(&txn.effective_status()))
    }
}
