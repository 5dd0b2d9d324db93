use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type UserNick = String;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub code: String,
    pub creator: UserNick,
    pub members: Vec<UserNick>,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn is_member(&self, user: &str) -> bool {
        self.members.iter().any(|member| member == user)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Expense {
    pub id: String,
    pub group_id: String,
    pub title: String,
    pub amount: Decimal,
    pub payer: UserNick,
    pub shared_among: Vec<UserNick>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub shares: Vec<Share>,
}

impl Expense {
    pub fn share(&self, share_id: &str) -> Option<&Share> {
        self.shares.iter().find(|share| share.id == share_id)
    }
}

/// A participant's owed portion of one expense.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Share {
    pub id: String,
    pub user: UserNick,
    pub amount: Decimal,
    pub paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Share {
    /// Flips the paid flag, stamping or clearing `paid_at` accordingly.
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        self.paid = !self.paid;
        self.paid_at = if self.paid { Some(now) } else { None };
    }
}

/// The caller-supplied part of an expense, used both to create and to edit one.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ExpenseDraft {
    pub title: String,
    pub amount: Decimal,
    pub payer: UserNick,
    pub shared_among: Vec<UserNick>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share() -> Share {
        Share {
            id: "s1".to_string(),
            user: "bob".to_string(),
            amount: Decimal::new(1000, 2),
            paid: false,
            paid_at: None,
        }
    }

    #[test]
    fn toggle_twice_restores_unpaid_state() {
        let mut share = share();
        let original = share.clone();
        share.toggle(Utc::now());
        assert!(share.paid);
        assert!(share.paid_at.is_some());
        share.toggle(Utc::now());
        assert_eq!(share, original);
    }

    #[test]
    fn membership_is_checked_by_nick() {
        let group = Group {
            id: "g".to_string(),
            name: "Flat 4".to_string(),
            code: "ABCD1234".to_string(),
            creator: "alice".to_string(),
            members: vec!["alice".to_string(), "bob".to_string()],
            created_at: Utc::now(),
        };
        assert!(group.is_member("bob"));
        assert!(!group.is_member("carol"));
    }

    #[test]
    fn decimals_serialize_as_strings() {
        let json = serde_json::to_value(share()).unwrap();
        assert_eq!(json["amount"], "10.00");
        assert_eq!(json["paid_at"], serde_json::Value::Null);
    }
}
