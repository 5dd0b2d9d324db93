//! Commands and queries over groups, expenses and shares.
//!
//! Every operation names its actor and its target explicitly. Expense writes
//! recompute the share set through the allocator and store the expense and
//! its shares in a single write.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::allocation::{allocate, reallocate, unique_participants, validate_amount};
use crate::balance::{self, compute_balance_from_group, Balance};
use crate::error::{Result, SplitError};
use crate::exchange::{self, Debt};
use crate::schemas::{Expense, ExpenseDraft, Group, Share, UserNick};
use crate::store::{ExpenseFilter, Store};

const MAX_GROUP_NAME: usize = 100;
const MAX_TITLE: usize = 200;
const JOIN_CODE_LEN: usize = 8;
const JOIN_CODE_ATTEMPTS: usize = 5;

pub struct Ledger<S> {
    store: S,
}

impl<S: Store> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create_group(&self, actor: &str, name: &str) -> Result<Group> {
        let name = checked_text("group name", name, MAX_GROUP_NAME)?;

        let mut code = None;
        for _ in 0..JOIN_CODE_ATTEMPTS {
            let candidate = new_join_code();
            if self.store.find_group_by_code(&candidate).await?.is_none() {
                code = Some(candidate);
                break;
            }
        }
        let code = code.ok_or_else(|| {
            SplitError::Store("could not generate a unique join code".to_string())
        })?;

        let group = Group {
            id: Uuid::new_v4().to_string(),
            name,
            code,
            creator: actor.to_string(),
            members: vec![actor.to_string()],
            created_at: Utc::now(),
        };
        self.store.insert_group(&group).await?;
        info!("{} created group {} ({}) with code {}", actor, group.name, group.id, group.code);
        Ok(group)
    }

    pub async fn join_group(&self, actor: &str, code: &str) -> Result<Group> {
        let code = code.trim().to_uppercase();
        let mut group = self
            .store
            .find_group_by_code(&code)
            .await?
            .ok_or_else(|| SplitError::not_found(format!("group with code {}", code)))?;

        if group.is_member(actor) {
            debug!("{} is already a member of group {}", actor, group.id);
            return Ok(group);
        }
        group.members.push(actor.to_string());
        self.store.update_group(&group).await?;
        info!("{} joined group {}", actor, group.id);
        Ok(group)
    }

    pub async fn leave_group(&self, actor: &str, group_id: &str) -> Result<Group> {
        let mut group = self.member_group(actor, group_id).await?;
        if group.creator == actor {
            return Err(SplitError::invalid("the creator of a group cannot leave it"));
        }
        group.members.retain(|member| member != actor);
        self.store.update_group(&group).await?;
        info!("{} left group {}", actor, group.id);
        Ok(group)
    }

    pub async fn group(&self, actor: &str, group_id: &str) -> Result<Group> {
        self.member_group(actor, group_id).await
    }

    pub async fn members(&self, actor: &str, group_id: &str) -> Result<Vec<UserNick>> {
        Ok(self.member_group(actor, group_id).await?.members)
    }

    pub async fn groups_for(&self, actor: &str) -> Result<Vec<Group>> {
        self.store.groups_with_member(actor).await
    }

    pub async fn add_expense(
        &self,
        actor: &str,
        group_id: &str,
        draft: ExpenseDraft,
    ) -> Result<Expense> {
        let group = self.member_group(actor, group_id).await?;
        let draft = checked_draft(&group, draft)?;

        let now = Utc::now();
        let mut expense = Expense {
            id: Uuid::new_v4().to_string(),
            group_id: group.id,
            title: draft.title,
            amount: draft.amount,
            payer: draft.payer,
            shared_among: draft.shared_among,
            created_at: now,
            shares: vec![],
        };
        expense.shares = allocate(&expense, &expense.shared_among, now)?;
        self.store.insert_expense(&expense).await?;
        info!(
            "{} added expense {} of {} paid by {} in group {}",
            actor, expense.id, expense.amount, expense.payer, expense.group_id
        );
        Ok(expense)
    }

    pub async fn expense(&self, actor: &str, expense_id: &str) -> Result<Expense> {
        let expense = self.find_expense(expense_id).await?;
        self.member_group(actor, &expense.group_id).await?;
        Ok(expense)
    }

    /// Newest first
    pub async fn expenses(&self, actor: &str, group_id: &str) -> Result<Vec<Expense>> {
        let group = self.member_group(actor, group_id).await?;
        let mut expenses = self.store.list_expenses(&ExpenseFilter::group(&group.id)).await?;
        expenses.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(expenses)
    }

    /// Edits an expense. Changing the amount or the payer un-pays every share
    /// except the payer's; changing only who shares it keeps paid flags.
    pub async fn update_expense(
        &self,
        actor: &str,
        expense_id: &str,
        draft: ExpenseDraft,
    ) -> Result<Expense> {
        let (group, previous) = self.owned_expense(actor, expense_id).await?;
        let draft = checked_draft(&group, draft)?;

        let mut updated = Expense {
            title: draft.title,
            amount: draft.amount,
            payer: draft.payer,
            shared_among: draft.shared_among,
            ..previous.clone()
        };
        updated.shares = reallocate(&previous, &updated, Utc::now())?;
        self.store.replace_expense(&updated).await?;
        info!("{} updated expense {}", actor, updated.id);
        Ok(updated)
    }

    pub async fn remove_participant(
        &self,
        actor: &str,
        expense_id: &str,
        user: &str,
    ) -> Result<Expense> {
        let (_, previous) = self.owned_expense(actor, expense_id).await?;
        if !previous.shared_among.iter().any(|participant| participant == user) {
            return Err(SplitError::not_found(format!(
                "participant {} on expense {}",
                user, expense_id
            )));
        }

        let mut updated = Expense {
            shared_among: previous
                .shared_among
                .iter()
                .filter(|participant| *participant != user)
                .cloned()
                .collect(),
            ..previous.clone()
        };
        updated.shares = reallocate(&previous, &updated, Utc::now())?;
        self.store.replace_expense(&updated).await?;
        if updated.shares.is_empty() {
            info!("Expense {} has no participants left, shares dropped", updated.id);
        }
        info!("{} removed {} from expense {}", actor, user, updated.id);
        Ok(updated)
    }

    pub async fn delete_expense(&self, actor: &str, expense_id: &str) -> Result<()> {
        let (_, expense) = self.owned_expense(actor, expense_id).await?;
        if !self.store.delete_expense(&expense.id).await? {
            return Err(SplitError::not_found(format!("expense {}", expense_id)));
        }
        info!("{} deleted expense {}", actor, expense_id);
        Ok(())
    }

    /// Flips a share between paid and unpaid. Any member of the expense's
    /// group may do so.
    pub async fn toggle_payment(&self, actor: &str, share_id: &str) -> Result<Share> {
        let mut expense = self
            .store
            .find_expense_by_share(share_id)
            .await?
            .ok_or_else(|| SplitError::not_found(format!("share {}", share_id)))?;
        self.member_group(actor, &expense.group_id).await?;

        let share = expense
            .shares
            .iter_mut()
            .find(|share| share.id == share_id)
            .ok_or_else(|| SplitError::not_found(format!("share {}", share_id)))?;
        share.toggle(Utc::now());
        let share = share.clone();

        self.store.replace_expense(&expense).await?;
        info!(
            "{} marked share {} of {} on expense {} as {}",
            actor,
            share.id,
            share.user,
            expense.id,
            if share.paid { "paid" } else { "unpaid" }
        );
        Ok(share)
    }

    pub async fn balance(&self, actor: &str, group_id: &str, user: &str) -> Result<Decimal> {
        let group = self.member_group(actor, group_id).await?;

        let mut expenses = self
            .store
            .list_expenses(&ExpenseFilter::group(&group.id).paid_by(user).with_unpaid_shares())
            .await?;
        let owing = self
            .store
            .list_expenses(&ExpenseFilter::group(&group.id).shared_with(user).with_unpaid_shares())
            .await?;
        expenses.extend(owing.into_iter().filter(|expense| expense.payer != user));

        Ok(balance::balance(user, &expenses))
    }

    pub async fn balances(&self, actor: &str, group_id: &str) -> Result<Balance> {
        let group = self.member_group(actor, group_id).await?;
        let expenses = self
            .store
            .list_expenses(&ExpenseFilter::group(&group.id).with_unpaid_shares())
            .await?;
        Ok(compute_balance_from_group(&group, &expenses))
    }

    pub async fn debts(&self, actor: &str, group_id: &str) -> Result<Vec<Debt>> {
        let group = self.member_group(actor, group_id).await?;
        let expenses = self
            .store
            .list_expenses(&ExpenseFilter::group(&group.id).with_unpaid_shares())
            .await?;
        Ok(exchange::debts(&expenses))
    }

    async fn member_group(&self, actor: &str, group_id: &str) -> Result<Group> {
        let group = self
            .store
            .get_group(group_id)
            .await?
            .ok_or_else(|| SplitError::not_found(format!("group {}", group_id)))?;
        if !group.is_member(actor) {
            warn!("{} is not a member of group {}", actor, group_id);
            return Err(SplitError::denied(format!(
                "{} is not a member of group {}",
                actor, group_id
            )));
        }
        Ok(group)
    }

    async fn find_expense(&self, expense_id: &str) -> Result<Expense> {
        self.store
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| SplitError::not_found(format!("expense {}", expense_id)))
    }

    // Only whoever paid an expense may change or delete it, even after
    // leaving its group.
    async fn owned_expense(&self, actor: &str, expense_id: &str) -> Result<(Group, Expense)> {
        let expense = self.find_expense(expense_id).await?;
        let group = self
            .store
            .get_group(&expense.group_id)
            .await?
            .ok_or_else(|| SplitError::not_found(format!("group {}", expense.group_id)))?;
        if expense.payer != actor {
            warn!("{} tried to modify expense {} paid by {}", actor, expense.id, expense.payer);
            return Err(SplitError::denied(format!(
                "only {} can modify expense {}",
                expense.payer, expense.id
            )));
        }
        Ok((group, expense))
    }
}

fn new_join_code() -> String {
    Uuid::new_v4().simple().to_string()[..JOIN_CODE_LEN].to_uppercase()
}

fn checked_text(what: &str, value: &str, max_chars: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SplitError::invalid(format!("{} cannot be empty", what)));
    }
    if value.chars().count() > max_chars {
        return Err(SplitError::invalid(format!(
            "{} is longer than {} characters",
            what, max_chars
        )));
    }
    Ok(value.to_string())
}

fn checked_draft(group: &Group, draft: ExpenseDraft) -> Result<ExpenseDraft> {
    let title = checked_text("title", &draft.title, MAX_TITLE)?;
    validate_amount(draft.amount)?;
    if !group.is_member(&draft.payer) {
        return Err(SplitError::invalid(format!(
            "payer {} is not a member of group {}",
            draft.payer, group.id
        )));
    }

    let shared_among = unique_participants(&draft.shared_among);
    if shared_among.is_empty() {
        return Err(SplitError::invalid("an expense needs at least one participant"));
    }
    if let Some(stranger) = shared_among.iter().find(|user| !group.is_member(user)) {
        return Err(SplitError::invalid(format!(
            "participant {} is not a member of group {}",
            stranger, group.id
        )));
    }

    Ok(ExpenseDraft {
        title,
        amount: draft.amount,
        payer: draft.payer,
        shared_among,
    })
}
