use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{ExpenseFilter, Store};
use crate::error::{Result, SplitError};
use crate::schemas::{Expense, Group};

/// In-process store, used by the tests and for running without MongoDB.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    groups: Vec<Group>,
    expenses: Vec<Expense>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| SplitError::Store("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_group(&self, group: &Group) -> Result<()> {
        let mut state = self.state()?;
        if state
            .groups
            .iter()
            .any(|stored| stored.id == group.id || stored.code == group.code)
        {
            return Err(SplitError::Store(format!(
                "group {} or code {} already stored",
                group.id, group.code
            )));
        }
        state.groups.push(group.clone());
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>> {
        let state = self.state()?;
        Ok(state.groups.iter().find(|group| group.id == group_id).cloned())
    }

    async fn find_group_by_code(&self, code: &str) -> Result<Option<Group>> {
        let state = self.state()?;
        Ok(state.groups.iter().find(|group| group.code == code).cloned())
    }

    async fn groups_with_member(&self, user: &str) -> Result<Vec<Group>> {
        let state = self.state()?;
        Ok(state
            .groups
            .iter()
            .filter(|group| group.is_member(user))
            .cloned()
            .collect())
    }

    async fn update_group(&self, group: &Group) -> Result<()> {
        let mut state = self.state()?;
        match state.groups.iter_mut().find(|stored| stored.id == group.id) {
            Some(stored) => {
                *stored = group.clone();
                Ok(())
            }
            None => Err(SplitError::not_found(format!("group {}", group.id))),
        }
    }

    async fn insert_expense(&self, expense: &Expense) -> Result<()> {
        let mut state = self.state()?;
        if state.expenses.iter().any(|stored| stored.id == expense.id) {
            return Err(SplitError::Store(format!(
                "expense {} already stored",
                expense.id
            )));
        }
        state.expenses.push(expense.clone());
        Ok(())
    }

    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>> {
        let state = self.state()?;
        Ok(state
            .expenses
            .iter()
            .find(|expense| expense.id == expense_id)
            .cloned())
    }

    async fn find_expense_by_share(&self, share_id: &str) -> Result<Option<Expense>> {
        let state = self.state()?;
        Ok(state
            .expenses
            .iter()
            .find(|expense| expense.share(share_id).is_some())
            .cloned())
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let state = self.state()?;
        Ok(state
            .expenses
            .iter()
            .filter(|expense| filter.matches(expense))
            .cloned()
            .collect())
    }

    async fn replace_expense(&self, expense: &Expense) -> Result<()> {
        let mut state = self.state()?;
        match state.expenses.iter_mut().find(|stored| stored.id == expense.id) {
            Some(stored) => {
                *stored = expense.clone();
                Ok(())
            }
            None => Err(SplitError::not_found(format!("expense {}", expense.id))),
        }
    }

    async fn delete_expense(&self, expense_id: &str) -> Result<bool> {
        let mut state = self.state()?;
        let before = state.expenses.len();
        state.expenses.retain(|expense| expense.id != expense_id);
        Ok(state.expenses.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::Share;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn expense(id: &str, group_id: &str, payer: &str, paid: bool) -> Expense {
        Expense {
            id: id.to_string(),
            group_id: group_id.to_string(),
            title: id.to_string(),
            amount: dec!(10.00),
            payer: payer.to_string(),
            shared_among: vec!["alice".to_string(), "bob".to_string()],
            created_at: Utc::now(),
            shares: vec![Share {
                id: format!("{}-bob", id),
                user: "bob".to_string(),
                amount: dec!(5.00),
                paid,
                paid_at: None,
            }],
        }
    }

    #[tokio::test]
    async fn filters_by_group_payer_participant_and_paid_flag() {
        let store = MemoryStore::new();
        store.insert_expense(&expense("e1", "g1", "alice", false)).await.unwrap();
        store.insert_expense(&expense("e2", "g1", "bob", true)).await.unwrap();
        store.insert_expense(&expense("e3", "g2", "alice", false)).await.unwrap();

        let ids = |expenses: Vec<Expense>| expenses.into_iter().map(|e| e.id).collect::<Vec<_>>();

        let all = store.list_expenses(&ExpenseFilter::group("g1")).await.unwrap();
        assert_eq!(ids(all), vec!["e1", "e2"]);

        let by_bob = store
            .list_expenses(&ExpenseFilter::group("g1").paid_by("bob"))
            .await
            .unwrap();
        assert_eq!(ids(by_bob), vec!["e2"]);

        let with_carol = store
            .list_expenses(&ExpenseFilter::group("g1").shared_with("carol"))
            .await
            .unwrap();
        assert!(with_carol.is_empty());

        let unpaid = store
            .list_expenses(&ExpenseFilter::group("g1").with_unpaid_shares())
            .await
            .unwrap();
        assert_eq!(ids(unpaid), vec!["e1"]);
    }

    #[tokio::test]
    async fn finds_expense_by_share_and_deletes_it() {
        let store = MemoryStore::new();
        store.insert_expense(&expense("e1", "g1", "alice", false)).await.unwrap();

        let found = store.find_expense_by_share("e1-bob").await.unwrap();
        assert_eq!(found.map(|e| e.id), Some("e1".to_string()));
        assert!(store.find_expense_by_share("nope").await.unwrap().is_none());

        assert!(store.delete_expense("e1").await.unwrap());
        assert!(!store.delete_expense("e1").await.unwrap());
    }

    #[tokio::test]
    async fn replacing_a_missing_expense_is_not_found() {
        let store = MemoryStore::new();
        let result = store.replace_expense(&expense("e1", "g1", "alice", false)).await;
        assert!(matches!(result, Err(SplitError::NotFound(_))));
    }
}
