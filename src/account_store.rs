use crate::account::{Account, AccountId, AccountStatus, OwnerId};
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccountError {
    #[error("Account {0} does not exist")]
    NotFound(AccountId),

    #[error("Account requires an owner")]
    OwnerRequired,

    #[error("Parent account {0} does not exist")]
    ParentNotFound(AccountId),

    #[error("Balance of account {0} would overflow")]
    BalanceOverflow(AccountId),
}

impl AccountError {
    pub fn code(&self) -> &'static str {
        match self {
            AccountError::NotFound(_) => "ACCOUNT_NOT_FOUND",
            AccountError::OwnerRequired => "OWNER_REQUIRED",
            AccountError::ParentNotFound(_) => "PARENT_NOT_FOUND",
            AccountError::BalanceOverflow(_) => "BALANCE_OVERFLOW",
        }
    }
}

/// Creation request. Unset balance & status fall back to zero & active
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub owner_id: Option<OwnerId>,
    pub parent_id: Option<AccountId>,
    pub balance: Option<Decimal>,
    pub status: Option<AccountStatus>,
}

#[cfg(test)]
impl NewAccount {
    pub fn main(owner_id: OwnerId) -> Self {
        Self {
            owner_id: Some(owner_id),
            ..Default::default()
        }
    }

    pub fn filial(owner_id: OwnerId, parent_id: AccountId) -> Self {
        Self {
            owner_id: Some(owner_id),
            parent_id: Some(parent_id),
            ..Default::default()
        }
    }

    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = Some(balance);
        self
    }

    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[derive(Debug, Default)]
pub struct AccountStore {
    /// List of accounts in order of their creation
    accounts: Vec<Account>,
    /// O(1) lookup from account id to position in `accounts`
    /// Parent/filial links are resolved through this index, never by reference
    acnt_map: HashMap<AccountId, usize>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an account, assigning the next sequential id
    pub fn create(&mut self, new_account: NewAccount) -> Result<&Account, AccountError> {
        let owner_id = new_account.owner_id.ok_or(AccountError::OwnerRequired)?;
        // The parent only has to exist; it is not required to be a main account
        if let Some(parent_id) = new_account.parent_id {
            if !self.acnt_map.contains_key(&parent_id) {
                return Err(AccountError::ParentNotFound(parent_id));
            }
        }

        let account = Account {
            id: self.accounts.len() as AccountId + 1,
            owner_id,
            parent_id: new_account.parent_id,
            is_main: new_account.parent_id.is_none(),
            balance: new_account.balance.unwrap_or_default(),
            status: new_account.status.unwrap_or_default(),
        };
        debug_assert!(account.hierarchy_consistent());
        let indx = self.accounts.len();
        self.acnt_map.insert(account.id, indx);
        self.accounts.push(account);
        Ok(&self.accounts[indx])
    }

    pub fn find(&self, id: AccountId) -> Result<&Account, AccountError> {
        self.acnt_map
            .get(&id)
            .map(|indx| &self.accounts[*indx])
            .ok_or(AccountError::NotFound(id))
    }

    pub fn is_active(&self, id: AccountId) -> bool {
        self.find(id).map(Account::is_active).unwrap_or(false)
    }

    pub fn set_balance(&mut self, id: AccountId, balance: Decimal) -> Result<(), AccountError> {
        let indx = *self.acnt_map.get(&id).ok_or(AccountError::NotFound(id))?;
        self.accounts[indx].balance = balance;
        Ok(())
    }

    /// Read-then-write against the balance as it is right now
    pub fn credit(&mut self, id: AccountId, delta: Decimal) -> Result<(), AccountError> {
        let current = self.find(id)?.balance;
        let balance = current
            .checked_add(delta)
            .ok_or(AccountError::BalanceOverflow(id))?;
        self.set_balance(id, balance)
    }

    pub fn set_status(&mut self, id: AccountId, status: AccountStatus) -> Result<(), AccountError> {
        let indx = *self.acnt_map.get(&id).ok_or(AccountError::NotFound(id))?;
        self.accounts[indx].status = status;
        Ok(())
    }

    pub fn filials(&self, parent_id: AccountId) -> impl Iterator<Item = &Account> + '_ {
        self.accounts
            .iter()
            .filter(move |acnt| acnt.parent_id == Some(parent_id))
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
