use crate::constants::PRECISION;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type AccountId = u32;
pub type OwnerId = u32;

/// Eligibility gate read by the transfer & refund engines, mutated from outside the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Blocked,
    Canceled,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Blocked => "blocked",
            AccountStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "blocked" => Ok(AccountStatus::Blocked),
            "canceled" => Ok(AccountStatus::Canceled),
            other => Err(format!("unknown account status: {}", other)),
        }
    }
}

/// Struct to hold data and methods for an account
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Assigned by the store at creation
    pub id: AccountId,

    /// Owning party, validated outside the ledger
    pub owner_id: OwnerId,

    /// Present iff this is a filial account
    pub parent_id: Option<AccountId>,

    /// Derived from `parent_id` at creation, never changed afterwards
    pub is_main: bool,

    /// Only the transfer & refund engines write this
    pub balance: Decimal,

    pub status: AccountStatus,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Main iff parentless. Holds for every account the store hands out
    pub fn hierarchy_consistent(&self) -> bool {
        self.is_main == self.parent_id.is_none()
    }

    pub fn get_display_str(&self) -> String {
        format!(
            "{},{},{},{},{:.*},{}",
            self.id,
            self.owner_id,
            self.parent_id.map(|p| p.to_string()).unwrap_or_default(),
            self.is_main,
            PRECISION,
            self.balance,
            self.status
        )
    }

    pub fn print_std_out(&self) {
        println!("{}", self.get_display_str())
    }
}
