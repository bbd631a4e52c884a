use super::transfers::TransferError;
use super::LedgerEngine;
use crate::account::AccountId;
use crate::account_store::AccountError;
use crate::config::RefundBalanceMode;
use crate::transaction::{Transaction, TransferDraft, TxnId};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RefundError {
    #[error("Refund needs a transfer code or a transaction id")]
    MissingSelector,

    #[error("Transaction or one of its accounts does not exist")]
    NotFound,

    #[error("Transfers into a main account can only be refunded by code")]
    MainDestinationRequiresCode,

    #[error("Reversal could not be committed: {0}")]
    CommitFailed(#[source] TransferError),

    /// The reversal is committed but a compensating balance write failed
    #[error("Reversal {txn_id} committed but balances were not applied: {source}")]
    BalancesNotApplied {
        txn_id: TxnId,
        #[source]
        source: AccountError,
    },
}

impl RefundError {
    pub fn code(&self) -> &'static str {
        match self {
            RefundError::MissingSelector => "MISSING_SELECTOR",
            RefundError::NotFound => "NOT_FOUND",
            RefundError::MainDestinationRequiresCode => "MAIN_DESTINATION_REQUIRES_CODE",
            RefundError::CommitFailed(_) => "COMMIT_FAILED",
            RefundError::BalancesNotApplied { .. } => "BALANCES_NOT_APPLIED",
        }
    }
}

impl From<TransferError> for RefundError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::BalancesNotApplied { txn_id, source } => {
                RefundError::BalancesNotApplied { txn_id, source }
            }
            e @ TransferError::Validation(_) => RefundError::CommitFailed(e),
        }
    }
}

impl LedgerEngine {
    /// Compensating write applied outside the reversal record's own balance step
    fn compensate(&mut self, reversal: &Transaction, id: AccountId, delta: Decimal) -> Result<(), RefundError> {
        self.accounts
            .credit(id, delta)
            .map_err(|source| RefundError::BalancesNotApplied {
                txn_id: reversal.id,
                source,
            })
    }

    /// Reversal of a main account deposit found by its code
    fn refund_deposit(&mut self, original: &Transaction) -> Result<Transaction, RefundError> {
        let draft = TransferDraft::reversal(original.destination, None, -original.value, None);
        let reversal = self.commit_draft(draft)?;
        if self.refund_mode == RefundBalanceMode::DoubleApply {
            self.compensate(&reversal, original.destination, reversal.value)?;
        }
        Ok(reversal)
    }

    /// Reversal of a transfer that debited a main account.
    /// The main account gets a deposit-shaped reversal, the filial destination is debited directly
    fn refund_main_origin(
        &mut self,
        original: &Transaction,
        main_origin: AccountId,
    ) -> Result<Transaction, RefundError> {
        match self.refund_mode {
            RefundBalanceMode::SingleApply => {
                let draft = TransferDraft::reversal(main_origin, None, original.value, None);
                let reversal = self.commit_draft(draft)?;
                self.compensate(&reversal, original.destination, -original.value)?;
                Ok(reversal)
            }
            RefundBalanceMode::DoubleApply => {
                let draft = TransferDraft::reversal(main_origin, None, -original.value, None);
                let reversal = self.commit_draft(draft)?;
                self.compensate(&reversal, original.destination, -original.value)?;
                self.compensate(&reversal, main_origin, original.value)?;
                Ok(reversal)
            }
        }
    }

    /// Reversal of a transfer between two filial-side accounts: the same value flows back
    fn refund_transfer(
        &mut self,
        original: &Transaction,
        origin: AccountId,
    ) -> Result<Transaction, RefundError> {
        let code = self.code_gen.next_code();
        let draft = TransferDraft::reversal(origin, Some(original.destination), original.value, Some(code));
        let reversal = self.commit_draft(draft)?;
        if self.refund_mode == RefundBalanceMode::DoubleApply {
            self.compensate(&reversal, original.destination, -original.value)?;
            self.compensate(&reversal, origin, original.value)?;
        }
        Ok(reversal)
    }

    fn resolve_refund(
        &mut self,
        code: Option<&str>,
        txn_id: Option<TxnId>,
    ) -> Result<Transaction, RefundError> {
        let original = match (code, txn_id) {
            (Some(code), _) => self.find_by_code(code),
            (None, Some(id)) => self.find_transaction(id),
            (None, None) => return Err(RefundError::MissingSelector),
        }
        .cloned()
        .ok_or(RefundError::NotFound)?;

        let destination = self
            .accounts
            .find(original.destination)
            .map_err(|_| RefundError::NotFound)?;
        let destination_is_main = destination.is_main;
        let origin = match original.origin {
            Some(id) => Some(self.accounts.find(id).map_err(|_| RefundError::NotFound)?),
            None => None,
        };
        let origin = origin.map(|acnt| (acnt.id, acnt.is_main));

        if code.is_some() {
            return self.refund_deposit(&original);
        }
        if destination_is_main {
            return Err(RefundError::MainDestinationRequiresCode);
        }
        match origin {
            Some((origin_id, true)) => self.refund_main_origin(&original, origin_id),
            Some((origin_id, false)) => self.refund_transfer(&original, origin_id),
            // a committed filial transfer always has an origin
            None => Err(RefundError::NotFound),
        }
    }

    /// Reverses a committed transaction, found by transfer code or else by id.
    /// Blank codes count as absent; a code wins when both selectors are given
    pub fn refund(&mut self, code: Option<&str>, txn_id: Option<TxnId>) -> Result<Transaction, RefundError> {
        let code = code.map(str::trim).filter(|c| !c.is_empty());
        match self.resolve_refund(code, txn_id) {
            Ok(reversal) => {
                info!(
                    code = ?code,
                    txn_id = ?txn_id,
                    reversal_id = reversal.id,
                    mode = ?self.refund_mode,
                    "refund committed"
                );
                Ok(reversal)
            }
            Err(e) => {
                warn!(code = ?code, txn_id = ?txn_id, reason = e.code(), error = %e, "refund failed");
                Err(e)
            }
        }
    }
}
