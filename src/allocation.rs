use crate::error::{Result, SplitError};
use crate::schemas::{Expense, Share, UserNick};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

// Ten digits, two of them decimals
fn max_amount() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// How an edit relates to the expense it replaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitChange {
    Unchanged,
    /// Only the participant set moved: amounts are recomputed, paid flags survive.
    Regroup,
    /// Amount or payer moved: every share is recomputed and un-paid, except the payer's.
    Reset,
}

impl SplitChange {
    pub fn between(previous: &Expense, updated: &Expense) -> Self {
        if previous.amount != updated.amount || previous.payer != updated.payer {
            return SplitChange::Reset;
        }
        let mut before = unique_participants(&previous.shared_among);
        let mut after = unique_participants(&updated.shared_among);
        before.sort();
        after.sort();
        if before == after {
            SplitChange::Unchanged
        } else {
            SplitChange::Regroup
        }
    }
}

pub fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(SplitError::invalid(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    if amount.normalize().scale() > 2 {
        return Err(SplitError::invalid(format!(
            "amount {} has more than two decimal places",
            amount
        )));
    }
    if amount > max_amount() {
        return Err(SplitError::invalid(format!(
            "amount {} exceeds {}",
            amount,
            max_amount()
        )));
    }
    Ok(())
}

/// Splits the expense evenly across `participants` and returns a fresh share set.
///
/// Every share gets `amount / n` truncated to the cent. The cents lost to
/// truncation go to the payer's share, or to the first participant when the
/// payer is not sharing, so the shares always add up to the amount. The
/// payer's own share starts out paid.
pub fn allocate(
    expense: &Expense,
    participants: &[UserNick],
    now: DateTime<Utc>,
) -> Result<Vec<Share>> {
    let split = split_evenly(expense.amount, &expense.payer, participants)?;
    Ok(split
        .into_iter()
        .map(|(user, amount)| new_share(user, amount, &expense.payer, now))
        .collect())
}

/// Recomputes the shares of `previous` after it was edited into `updated`.
///
/// The existing shares are taken from `previous.shares`. Removing every
/// participant leaves the expense with no shares.
pub fn reallocate(
    previous: &Expense,
    updated: &Expense,
    now: DateTime<Utc>,
) -> Result<Vec<Share>> {
    match SplitChange::between(previous, updated) {
        SplitChange::Unchanged => Ok(previous.shares.clone()),
        SplitChange::Reset => allocate(updated, &updated.shared_among, now),
        SplitChange::Regroup => {
            if unique_participants(&updated.shared_among).is_empty() {
                return Ok(Vec::new());
            }
            let split = split_evenly(updated.amount, &updated.payer, &updated.shared_among)?;
            Ok(split
                .into_iter()
                .map(|(user, amount)| {
                    match previous.shares.iter().find(|share| share.user == user) {
                        Some(existing) => Share {
                            amount,
                            ..existing.clone()
                        },
                        None => new_share(user, amount, &updated.payer, now),
                    }
                })
                .collect())
        }
    }
}

fn split_evenly(
    amount: Decimal,
    payer: &str,
    participants: &[UserNick],
) -> Result<Vec<(UserNick, Decimal)>> {
    validate_amount(amount)?;
    let participants = unique_participants(participants);
    if participants.is_empty() {
        return Err(SplitError::invalid("an expense needs at least one participant"));
    }

    let heads = Decimal::from(participants.len());
    let per_head = (amount / heads).round_dp_with_strategy(2, RoundingStrategy::ToZero);
    let remainder = amount - per_head * heads;
    let remainder_to = participants
        .iter()
        .position(|user| user == payer)
        .unwrap_or(0);

    Ok(participants
        .into_iter()
        .enumerate()
        .map(|(index, user)| {
            let amount = if index == remainder_to {
                per_head + remainder
            } else {
                per_head
            };
            (user, to_cents(amount))
        })
        .collect())
}

fn new_share(user: UserNick, amount: Decimal, payer: &str, now: DateTime<Utc>) -> Share {
    let paid = user == payer;
    Share {
        id: Uuid::new_v4().to_string(),
        user,
        amount,
        paid,
        paid_at: paid.then_some(now),
    }
}

/// Drops repeated nicks, keeping the first occurrence.
pub fn unique_participants(participants: &[UserNick]) -> Vec<UserNick> {
    let mut unique: Vec<UserNick> = Vec::with_capacity(participants.len());
    for user in participants {
        if !unique.contains(user) {
            unique.push(user.clone());
        }
    }
    unique
}

fn to_cents(mut amount: Decimal) -> Decimal {
    amount.rescale(2);
    amount
}
