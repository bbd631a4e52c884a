use crate::account::AccountId;
use rust_decimal::Decimal;
use std::fmt;

pub type TxnId = u32;

/// Opaque code issued for main account deposits, lets a refund find the deposit without its id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferCode(pub String);

impl TransferCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransferCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransferCode {
    fn from(code: &str) -> Self {
        TransferCode(code.to_string())
    }
}

/// A committed movement of `value` into `destination`, debited from `origin` when present.
/// Immutable once committed
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TxnId,
    pub destination: AccountId,
    pub origin: Option<AccountId>,
    pub value: Decimal,
    pub code: Option<TransferCode>,
    /// Set on records created by a refund
    pub reversal: bool,
}

/// Transaction intent before it has been validated & committed
#[derive(Debug, Clone, PartialEq)]
pub struct TransferDraft {
    pub destination: AccountId,
    pub origin: Option<AccountId>,
    pub value: Decimal,
    /// Only refunds pre-set a code; deposits get theirs from the pipeline
    pub code: Option<TransferCode>,
    pub reversal: bool,
}

impl TransferDraft {
    pub fn new(destination: AccountId, origin: Option<AccountId>, value: Decimal) -> Self {
        Self {
            destination,
            origin,
            value,
            code: None,
            reversal: false,
        }
    }

    pub fn reversal(
        destination: AccountId,
        origin: Option<AccountId>,
        value: Decimal,
        code: Option<TransferCode>,
    ) -> Self {
        Self {
            destination,
            origin,
            value,
            code,
            reversal: true,
        }
    }

    pub(crate) fn into_transaction(self, id: TxnId) -> Transaction {
        Transaction {
            id,
            destination: self.destination,
            origin: self.origin,
            value: self.value,
            code: self.code,
            reversal: self.reversal,
        }
    }
}
