use async_trait::async_trait;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::{options::IndexOptions, Client, Collection, IndexModel};
use tracing::info;

use super::{ExpenseFilter, Store};
use crate::error::{Result, SplitError};
use crate::schemas::{Expense, Group};

const GROUPS: &str = "Groups";
const EXPENSES: &str = "Expenses";

/// MongoDB-backed store. Each expense is one document embedding its shares.
#[derive(Clone)]
pub struct MongoStore {
    groups: Collection<Group>,
    expenses: Collection<Expense>,
}

impl MongoStore {
    pub fn new(client: &Client, database: &str) -> Self {
        let database = client.database(database);
        Self {
            groups: database.collection(GROUPS),
            expenses: database.collection(EXPENSES),
        }
    }

    /// Creates the lookup indexes; safe to call on every start.
    pub async fn init(&self) -> Result<()> {
        for key in ["id", "code"] {
            self.groups.create_index(unique_index(key), None).await?;
        }
        self.groups.create_index(index("members"), None).await?;
        self.expenses.create_index(unique_index("id"), None).await?;
        for key in ["group_id", "shares.id"] {
            self.expenses.create_index(index(key), None).await?;
        }
        info!("MongoDB indexes ready");
        Ok(())
    }
}

fn ascending(key: &str) -> Document {
    let mut keys = Document::new();
    keys.insert(key, 1);
    keys
}

fn index(key: &str) -> IndexModel {
    IndexModel::builder().keys(ascending(key)).build()
}

fn unique_index(key: &str) -> IndexModel {
    IndexModel::builder()
        .keys(ascending(key))
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

fn expense_filter_doc(filter: &ExpenseFilter) -> Document {
    let mut query = doc! { "group_id": filter.group_id.as_str() };
    if let Some(payer) = &filter.payer {
        query.insert("payer", payer.as_str());
    }
    if let Some(participant) = &filter.participant {
        query.insert("shared_among", participant.as_str());
    }
    if filter.unpaid_only {
        query.insert("shares", doc! { "$elemMatch": { "paid": false } });
    }
    query
}

#[async_trait]
impl Store for MongoStore {
    async fn insert_group(&self, group: &Group) -> Result<()> {
        self.groups.insert_one(group, None).await?;
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>> {
        Ok(self.groups.find_one(doc! { "id": group_id }, None).await?)
    }

    async fn find_group_by_code(&self, code: &str) -> Result<Option<Group>> {
        Ok(self.groups.find_one(doc! { "code": code }, None).await?)
    }

    async fn groups_with_member(&self, user: &str) -> Result<Vec<Group>> {
        let cursor = self.groups.find(doc! { "members": user }, None).await?;
        Ok(cursor.try_collect::<Vec<_>>().await?)
    }

    async fn update_group(&self, group: &Group) -> Result<()> {
        let result = self
            .groups
            .replace_one(doc! { "id": group.id.as_str() }, group, None)
            .await?;
        if result.matched_count == 0 {
            return Err(SplitError::not_found(format!("group {}", group.id)));
        }
        Ok(())
    }

    async fn insert_expense(&self, expense: &Expense) -> Result<()> {
        self.expenses.insert_one(expense, None).await?;
        Ok(())
    }

    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>> {
        Ok(self.expenses.find_one(doc! { "id": expense_id }, None).await?)
    }

    async fn find_expense_by_share(&self, share_id: &str) -> Result<Option<Expense>> {
        Ok(self
            .expenses
            .find_one(doc! { "shares.id": share_id }, None)
            .await?)
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let cursor = self.expenses.find(expense_filter_doc(filter), None).await?;
        Ok(cursor.try_collect::<Vec<_>>().await?)
    }

    async fn replace_expense(&self, expense: &Expense) -> Result<()> {
        let result = self
            .expenses
            .replace_one(doc! { "id": expense.id.as_str() }, expense, None)
            .await?;
        if result.matched_count == 0 {
            return Err(SplitError::not_found(format!("expense {}", expense.id)));
        }
        Ok(())
    }

    async fn delete_expense(&self, expense_id: &str) -> Result<bool> {
        let result = self
            .expenses
            .delete_one(doc! { "id": expense_id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }
}
