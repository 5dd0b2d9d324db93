use crate::schemas::{Expense, UserNick};
use rust_decimal::Decimal;
use serde::Serialize;

/// One outstanding share, owed by `from` to the expense payer `to`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Debt {
    pub from: UserNick,
    pub to: UserNick,
    pub amount: Decimal,
    pub expense_id: String,
    pub expense_title: String,
    pub share_id: String,
}

// Every unpaid share becomes its own obligation; nothing is netted across
// expenses. Ordered by expense creation, then by debtor.
pub fn debts(expenses: &[Expense]) -> Vec<Debt> {
    let mut expenses = expenses.iter().collect::<Vec<_>>();
    expenses.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut debts = Vec::new();
    for expense in expenses {
        let mut owed = expense
            .shares
            .iter()
            .filter(|share| !share.paid && share.user != expense.payer)
            .filter(|share| share.amount > Decimal::ZERO)
            .collect::<Vec<_>>();
        owed.sort_by(|a, b| a.user.cmp(&b.user));

        debts.extend(owed.into_iter().map(|share| Debt {
            from: share.user.clone(),
            to: expense.payer.clone(),
            amount: share.amount,
            expense_id: expense.id.clone(),
            expense_title: expense.title.clone(),
            share_id: share.id.clone(),
        }));
    }
    debts
}
