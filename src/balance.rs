use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::schemas::{Expense, Group, UserNick};

pub type Balance = BTreeMap<UserNick, Decimal>;

/// Net balance of `user` across `expenses`: what others still owe them minus
/// what they still owe others. Paid shares and the payer's own share never count.
pub fn balance(user: &str, expenses: &[Expense]) -> Decimal {
    let mut net = Decimal::ZERO;
    for expense in expenses {
        for share in expense.shares.iter().filter(|share| !share.paid) {
            if share.user == expense.payer {
                continue;
            }
            if expense.payer == user {
                net += share.amount;
            } else if share.user == user {
                net -= share.amount;
            }
        }
    }
    net
}

/// Balance of every member of `group`, members without shares included.
pub fn compute_balance_from_group(group: &Group, expenses: &[Expense]) -> Balance {
    let mut balance = Balance::new();
    for member in &group.members {
        balance.insert(member.clone(), Decimal::ZERO);
    }
    for expense in expenses.iter().filter(|expense| expense.group_id == group.id) {
        for share in expense.shares.iter().filter(|share| !share.paid) {
            if share.user == expense.payer {
                continue;
            }
            let amount = share.amount;
            balance
                .entry(expense.payer.clone())
                .and_modify(|v| *v += amount)
                .or_insert(amount);
            balance
                .entry(share.user.clone())
                .and_modify(|v| *v -= amount)
                .or_insert(-amount);
        }
    }
    balance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::allocate;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn group(members: &[&str]) -> Group {
        Group {
            id: "g1".to_string(),
            name: "Flat".to_string(),
            code: "CAFEBABE".to_string(),
            creator: members[0].to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    fn expense(id: &str, amount: Decimal, payer: &str, shared_among: &[&str]) -> Expense {
        let mut expense = Expense {
            id: id.to_string(),
            group_id: "g1".to_string(),
            title: id.to_string(),
            amount,
            payer: payer.to_string(),
            shared_among: shared_among.iter().map(|m| m.to_string()).collect(),
            created_at: Utc::now(),
            shares: vec![],
        };
        expense.shares = allocate(&expense, &expense.shared_among, Utc::now()).unwrap();
        expense
    }

    #[test]
    fn payer_is_owed_unpaid_shares() {
        let expenses = vec![expense("rent", dec!(30.00), "alice", &["alice", "bob", "carol"])];
        assert_eq!(balance("alice", &expenses), dec!(20.00));
        assert_eq!(balance("bob", &expenses), dec!(-10.00));
        assert_eq!(balance("carol", &expenses), dec!(-10.00));
    }

    #[test]
    fn paid_shares_do_not_count() {
        let mut expenses = vec![expense("rent", dec!(30.00), "alice", &["alice", "bob", "carol"])];
        expenses[0].shares[1].toggle(Utc::now());
        assert_eq!(balance("alice", &expenses), dec!(10.00));
        assert_eq!(balance("bob", &expenses), Decimal::ZERO);
    }

    #[test]
    fn payer_outside_the_split_is_owed_everything() {
        let expenses = vec![expense("gift", dec!(20.00), "dave", &["alice", "bob"])];
        assert_eq!(balance("dave", &expenses), dec!(20.00));
        assert_eq!(balance("alice", &expenses), dec!(-10.00));
    }

    #[test]
    fn no_expenses_means_zero() {
        assert_eq!(balance("alice", &[]), Decimal::ZERO);
    }

    #[test]
    fn balances_conserve_with_one_unpaid_expense() {
        let members = ["alice", "bob", "carol", "dave"];
        let expenses = vec![expense("trip", dec!(100.00), "bob", &members)];
        let total: Decimal = members.iter().map(|m| balance(m, &expenses)).sum();
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn group_balance_lists_every_member() {
        let group = group(&["alice", "bob", "carol", "erin"]);
        let expenses = vec![
            expense("rent", dec!(30.00), "alice", &["alice", "bob", "carol"]),
            expense("milk", dec!(4.00), "bob", &["alice", "bob"]),
        ];

        let balances = compute_balance_from_group(&group, &expenses);
        assert_eq!(balances.len(), 4);
        assert_eq!(balances["alice"], dec!(18.00));
        assert_eq!(balances["bob"], dec!(-8.00));
        assert_eq!(balances["carol"], dec!(-10.00));
        assert_eq!(balances["erin"], Decimal::ZERO);
        for member in &group.members {
            assert_eq!(balances[member], balance(member, &expenses));
        }
    }
}
