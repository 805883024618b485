//! Ledger-side entities and the operations the reconciler consumes.

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The account owner the API token belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerUser {
    pub id: i64,
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: i64,
    pub title: String,
}

/// A user-defined rule assigning a category to payees matching `pattern`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRule {
    pub pattern: String,
    pub category: CategoryRef,
}

impl CategoryRule {
    /// Case-insensitive substring match. An empty pattern never matches.
    pub fn matches(&self, payee: &str) -> bool {
        if self.pattern.is_empty() {
            return false;
        }
        payee.to_lowercase().contains(&self.pattern.to_lowercase())
    }
}

/// An uploaded file (receipt image, slip) stored alongside transactions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub id: i64,
    pub title: String,
}

/// A ledger transaction considered for matching against a notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateTransaction {
    pub id: i64,
    /// Payee as currently shown (may already be user-edited)
    pub payee: String,
    /// Payee text as imported from the bank feed
    pub original_payee: String,
    pub memo: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub is_transfer: bool,
    pub needs_review: bool,
    pub category: Option<CategoryRef>,
    pub note: String,
}

/// Fields submitted when enriching a transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionUpdate {
    pub payee: String,
    pub memo: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub is_transfer: bool,
    pub needs_review: bool,
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

/// Remote personal-finance ledger.
///
/// Every call is awaited to completion before the reconciler moves on, so
/// implementations do not need to be `Send` or reentrant.
#[allow(async_fn_in_trait)]
pub trait Ledger {
    async fn current_user(&self) -> Result<LedgerUser>;

    async fn category_rules(&self, user_id: i64) -> Result<Vec<CategoryRule>>;

    /// Transactions on `account_id` between the two dates (inclusive) whose
    /// text or amount matches `query`, in service order.
    async fn search_transactions(
        &self,
        account_id: i64,
        from: NaiveDate,
        to: NaiveDate,
        query: &str,
    ) -> Result<Vec<CandidateTransaction>>;

    async fn attachments(&self, user_id: i64, unassigned_only: bool) -> Result<Vec<Attachment>>;

    async fn assign_attachment(&self, transaction_id: i64, attachment_id: i64) -> Result<()>;

    async fn update_transaction(
        &self,
        transaction_id: i64,
        update: &TransactionUpdate,
    ) -> Result<CandidateTransaction>;
}
