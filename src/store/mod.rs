//! Persistence for groups and expenses.
//!
//! Shares live inside their expense, so writing an expense also writes its
//! complete share set in one go.

use async_trait::async_trait;

use crate::error::Result;
use crate::schemas::{Expense, Group, UserNick};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn insert_group(&self, group: &Group) -> Result<()>;

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>>;

    /// Exact, case-sensitive lookup of a join code
    async fn find_group_by_code(&self, code: &str) -> Result<Option<Group>>;

    async fn groups_with_member(&self, user: &str) -> Result<Vec<Group>>;

    /// Overwrites a stored group. Fails with `NotFound` when it is missing.
    async fn update_group(&self, group: &Group) -> Result<()>;

    async fn insert_expense(&self, expense: &Expense) -> Result<()>;

    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>>;

    /// The expense holding the share with this id, if any
    async fn find_expense_by_share(&self, share_id: &str) -> Result<Option<Expense>>;

    /// Expenses matching `filter`, in storage order
    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>>;

    /// Overwrites a stored expense together with its shares. Fails with
    /// `NotFound` when it is missing.
    async fn replace_expense(&self, expense: &Expense) -> Result<()>;

    /// Returns true if the expense was found and deleted
    async fn delete_expense(&self, expense_id: &str) -> Result<bool>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub group_id: String,
    pub payer: Option<UserNick>,
    pub participant: Option<UserNick>,
    pub unpaid_only: bool,
}

impl ExpenseFilter {
    pub fn group(group_id: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            ..Self::default()
        }
    }

    pub fn paid_by(mut self, user: &str) -> Self {
        self.payer = Some(user.to_string());
        self
    }

    pub fn shared_with(mut self, user: &str) -> Self {
        self.participant = Some(user.to_string());
        self
    }

    /// Only expenses with at least one unpaid share
    pub fn with_unpaid_shares(mut self) -> Self {
        self.unpaid_only = true;
        self
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        expense.group_id == self.group_id
            && self.payer.as_ref().map_or(true, |payer| &expense.payer == payer)
            && self
                .participant
                .as_ref()
                .map_or(true, |user| expense.shared_among.contains(user))
            && (!self.unpaid_only || expense.shares.iter().any(|share| !share.paid))
    }
}
