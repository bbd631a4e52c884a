use super::state::TransferState;
use super::LedgerEngine;
use crate::account::AccountId;
use crate::account_store::AccountError;
use crate::transaction::{Transaction, TransferCode, TransferDraft, TxnId};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Rejections raised before anything is persisted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Destination is a main account, a transfer into it must not have an origin")]
    OriginNotAllowed,

    #[error("Destination is a filial account, a transfer into it needs an origin")]
    OriginRequired,

    #[error("Account {0} is not active")]
    AccountInactive(AccountId),

    #[error("Account {0} does not exist")]
    AccountNotFound(AccountId),

    #[error("Transfer code {0} was already issued")]
    CodeAlreadyIssued(TransferCode),

    #[error("Balance of account {0} would overflow")]
    BalanceOverflow(AccountId),
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::OriginNotAllowed => "ORIGIN_NOT_ALLOWED",
            ValidationError::OriginRequired => "ORIGIN_REQUIRED",
            ValidationError::AccountInactive(_) => "ACCOUNT_INACTIVE",
            ValidationError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            ValidationError::CodeAlreadyIssued(_) => "CODE_ALREADY_ISSUED",
            ValidationError::BalanceOverflow(_) => "BALANCE_OVERFLOW",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The record is committed but its balance deltas are missing
    #[error("Transaction {txn_id} committed but balances were not applied: {source}")]
    BalancesNotApplied {
        txn_id: TxnId,
        #[source]
        source: AccountError,
    },
}

impl TransferError {
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::Validation(e) => e.code(),
            TransferError::BalancesNotApplied { .. } => "BALANCES_NOT_APPLIED",
        }
    }
}

/// Shape of an eligible transfer, decided by the destination kind & origin presence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Main destination, no origin. Gets a transfer code
    Deposit,
    /// Filial destination, explicit origin
    Transfer,
}

/// One transfer on its way through the pipeline
#[derive(Debug)]
struct TransferPipeline {
    draft: TransferDraft,
    kind: Option<TransferKind>,
    state: TransferState,
}

impl TransferPipeline {
    fn new(draft: TransferDraft) -> Self {
        Self {
            draft,
            kind: None,
            state: TransferState::Pending,
        }
    }

    fn advance(&mut self, next: TransferState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transfer transition {} -> {}",
            self.state,
            next
        );
        debug!(from = %self.state, to = %next, destination = self.draft.destination, "transfer state");
        self.state = next;
    }
}

impl LedgerEngine {
    /// Step 1. Pure: decides the transfer shape from the destination kind and origin presence
    fn classify(&self, draft: &TransferDraft) -> Result<TransferKind, ValidationError> {
        let destination = self
            .accounts
            .find(draft.destination)
            .map_err(|_| ValidationError::AccountNotFound(draft.destination))?;

        match (destination.is_main, draft.origin) {
            (true, Some(_)) => Err(ValidationError::OriginNotAllowed),
            (true, None) => Ok(TransferKind::Deposit),
            (false, Some(_)) => Ok(TransferKind::Transfer),
            (false, None) => Err(ValidationError::OriginRequired),
        }
    }

    /// Step 3. Pure: every account the transfer touches has to be active
    fn check_status(&self, draft: &TransferDraft, kind: TransferKind) -> Result<(), ValidationError> {
        if kind == TransferKind::Transfer {
            // classify only lets a transfer through with an origin id
            let origin = draft.origin.ok_or(ValidationError::OriginRequired)?;
            let origin = self
                .accounts
                .find(origin)
                .map_err(|_| ValidationError::AccountNotFound(origin))?;
            if !origin.is_active() {
                return Err(ValidationError::AccountInactive(origin.id));
            }
        }
        if !self.accounts.is_active(draft.destination) {
            return Err(ValidationError::AccountInactive(draft.destination));
        }
        Ok(())
    }

    /// Pure: both legs have to stay representable, so a commit never leaves balances half applied
    fn check_balances(&self, draft: &TransferDraft, kind: TransferKind) -> Result<(), ValidationError> {
        let destination = self
            .accounts
            .find(draft.destination)
            .map_err(|_| ValidationError::AccountNotFound(draft.destination))?;
        if destination.balance.checked_add(draft.value).is_none() {
            return Err(ValidationError::BalanceOverflow(destination.id));
        }
        if let (TransferKind::Transfer, Some(origin)) = (kind, draft.origin) {
            let origin = self
                .accounts
                .find(origin)
                .map_err(|_| ValidationError::AccountNotFound(origin))?;
            if origin.balance.checked_sub(draft.value).is_none() {
                return Err(ValidationError::BalanceOverflow(origin.id));
            }
        }
        Ok(())
    }

    fn validate(&self, pipeline: &mut TransferPipeline) -> Result<(), ValidationError> {
        let res = self.classify(&pipeline.draft).and_then(|kind| {
            self.check_status(&pipeline.draft, kind)?;
            self.check_balances(&pipeline.draft, kind)?;
            Ok(kind)
        });
        match res {
            Ok(kind) => {
                pipeline.kind = Some(kind);
                pipeline.advance(TransferState::Validated);
                Ok(())
            }
            Err(e) => {
                pipeline.advance(TransferState::Rejected);
                Err(e)
            }
        }
    }

    /// Step 2. Exactly one code per validated deposit, none for transfers
    fn assign_code(&mut self, pipeline: &mut TransferPipeline) {
        if pipeline.kind == Some(TransferKind::Deposit) {
            pipeline.draft.code = Some(self.code_gen.next_code());
        }
    }

    /// Step 4. Persists & indexes the record. A rejection here also leaves nothing behind
    fn commit(&mut self, pipeline: &mut TransferPipeline) -> Result<Transaction, ValidationError> {
        if let Some(code) = pipeline.draft.code.clone() {
            if self.code_map.contains_key(&code) {
                pipeline.advance(TransferState::Rejected);
                return Err(ValidationError::CodeAlreadyIssued(code));
            }
        }

        let txn = pipeline
            .draft
            .clone()
            .into_transaction(self.processed_txns.len() as TxnId + 1);
        let indx = self.processed_txns.len();
        self.txn_map.insert(txn.id, indx);
        if let Some(code) = &txn.code {
            self.code_map.insert(code.clone(), indx);
        }
        self.processed_txns.push(txn.clone());
        pipeline.advance(TransferState::Committed);
        Ok(txn)
    }

    /// Step 5. Destination credit first, then origin debit.
    /// These are two independent single-account writes: a failure between them leaves the
    /// transfer half applied and nothing rolls the first write back.
    // TODO: apply both legs as one store write once AccountStore supports multi-record updates
    fn apply_balances(
        &mut self,
        txn_id: TxnId,
        destination: AccountId,
        origin: Option<AccountId>,
        value: Decimal,
    ) -> Result<(), TransferError> {
        let wrap = |source: AccountError| TransferError::BalancesNotApplied { txn_id, source };
        self.accounts.credit(destination, value).map_err(wrap)?;
        if let Some(origin) = origin {
            self.accounts.credit(origin, -value).map_err(wrap)?;
        }
        Ok(())
    }

    /// Validate, assign code, commit, then apply balances. Shared by transfers & refund reversals.
    /// Status runs ahead of code assignment, so a rejected deposit does not consume a code
    pub(super) fn commit_draft(&mut self, draft: TransferDraft) -> Result<Transaction, TransferError> {
        let mut pipeline = TransferPipeline::new(draft);

        if let Err(e) = self.validate(&mut pipeline) {
            warn!(
                destination = pipeline.draft.destination,
                origin = ?pipeline.draft.origin,
                value = %pipeline.draft.value,
                reason = e.code(),
                "transfer rejected"
            );
            return Err(e.into());
        }
        self.assign_code(&mut pipeline);
        let txn = match self.commit(&mut pipeline) {
            Ok(txn) => txn,
            Err(e) => {
                warn!(reason = e.code(), "transfer rejected at commit");
                return Err(e.into());
            }
        };
        let origin = match pipeline.kind {
            Some(TransferKind::Transfer) => txn.origin,
            _ => None,
        };
        if let Err(e) = self.apply_balances(txn.id, txn.destination, origin, txn.value) {
            error!(
                txn_id = txn.id,
                reason = e.code(),
                error = %e,
                "transaction committed without its balance update"
            );
            return Err(e);
        }
        pipeline.advance(TransferState::BalancesApplied);
        debug_assert!(pipeline.state.is_terminal());

        info!(
            txn_id = txn.id,
            destination = txn.destination,
            origin = ?txn.origin,
            value = %txn.value,
            code = ?txn.code.as_ref().map(TransferCode::as_str),
            reversal = txn.reversal,
            "transaction committed"
        );
        Ok(txn)
    }

    /// Moves `value` into `destination`.
    /// Main destinations only take deposits (no origin) and get a transfer code back;
    /// filial destinations need an origin to debit
    pub fn create_transfer(
        &mut self,
        destination: AccountId,
        origin: Option<AccountId>,
        value: Decimal,
    ) -> Result<Transaction, TransferError> {
        self.commit_draft(TransferDraft::new(destination, origin, value))
    }
}

#[cfg(test)]
pub mod tests {
    use super::{TransferError, TransferKind, ValidationError};
    use crate::account::AccountStatus;
    use crate::account_store::NewAccount;
    use crate::config::RefundBalanceMode;
    use crate::ledger_engine::tests::init_test_engine;
    use crate::ledger_engine::LedgerEngine;
    use crate::transaction::{TransferCode, TransferDraft};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// Main 1 (45.0), filials 2 (21.0) & 3 (118.0) under it, all active
    pub fn init_test_ledger(refund_mode: RefundBalanceMode) -> LedgerEngine {
        let mut engine = init_test_engine(refund_mode);
        let _ = engine.accounts.create(NewAccount::main(1).with_balance(dec!(45.0)));
        let _ = engine.accounts.create(NewAccount::filial(1, 1).with_balance(dec!(21.0)));
        let _ = engine.accounts.create(NewAccount::filial(1, 1).with_balance(dec!(118.0)));
        engine
    }

    fn balance(engine: &LedgerEngine, id: u32) -> Decimal {
        engine.accounts.find(id).unwrap().balance
    }

    #[test]
    fn tst_classify() {
        let engine = init_test_ledger(RefundBalanceMode::SingleApply);
        let res = engine.classify(&TransferDraft::new(1, Some(2), dec!(1)));
        assert_eq!(res, Err(ValidationError::OriginNotAllowed));
        let res = engine.classify(&TransferDraft::new(1, None, dec!(1)));
        assert_eq!(res, Ok(TransferKind::Deposit));
        let res = engine.classify(&TransferDraft::new(2, Some(1), dec!(1)));
        assert_eq!(res, Ok(TransferKind::Transfer));
        let res = engine.classify(&TransferDraft::new(2, None, dec!(1)));
        assert_eq!(res, Err(ValidationError::OriginRequired));
        let res = engine.classify(&TransferDraft::new(9, None, dec!(1)));
        assert_eq!(res, Err(ValidationError::AccountNotFound(9)));
    }

    #[test]
    fn tst_deposit_into_main() {
        let mut engine = init_test_ledger(RefundBalanceMode::SingleApply);
        let txn = engine.create_transfer(1, None, dec!(10.0)).unwrap();
        assert_eq!(txn.id, 1);
        assert_eq!(txn.code, Some(TransferCode::from("TRF-000001")), "Deposit should get a code");
        assert!(!txn.reversal);
        assert_eq!(balance(&engine, 1), dec!(55.0));
        assert_eq!(engine.transactions().len(), 1);
    }

    #[test]
    fn tst_deposit_into_inactive_main() {
        for status in [AccountStatus::Blocked, AccountStatus::Canceled] {
            let mut engine = init_test_ledger(RefundBalanceMode::SingleApply);
            let _ = engine.accounts.set_status(1, status);
            let res = engine.create_transfer(1, None, dec!(10.0));
            assert_eq!(
                res,
                Err(TransferError::Validation(ValidationError::AccountInactive(1)))
            );
            assert_eq!(balance(&engine, 1), dec!(45.0), "Balance should be untouched");
            assert!(engine.transactions().is_empty(), "Nothing should be persisted");
        }
    }

    #[test]
    fn tst_main_destination_with_origin() {
        let mut engine = init_test_ledger(RefundBalanceMode::SingleApply);
        let res = engine.create_transfer(1, Some(2), dec!(10.0));
        assert_eq!(res, Err(ValidationError::OriginNotAllowed.into()));

        let _ = engine.accounts.set_status(1, AccountStatus::Blocked);
        let _ = engine.accounts.set_status(2, AccountStatus::Canceled);
        let res = engine.create_transfer(1, Some(2), dec!(10.0));
        assert_eq!(
            res,
            Err(ValidationError::OriginNotAllowed.into()),
            "Shape is rejected before status is read"
        );
        assert_eq!(balance(&engine, 1), dec!(45.0));
        assert_eq!(balance(&engine, 2), dec!(21.0));
    }

    #[test]
    fn tst_filial_destination_without_origin() {
        let mut engine = init_test_ledger(RefundBalanceMode::SingleApply);
        let res = engine.create_transfer(2, None, dec!(4));
        assert_eq!(res, Err(ValidationError::OriginRequired.into()));
        assert!(engine.transactions().is_empty());
    }

    #[test]
    fn tst_transfer_main_to_filial() {
        let mut engine = init_test_ledger(RefundBalanceMode::SingleApply);
        let txn = engine.create_transfer(2, Some(1), dec!(10.0)).unwrap();
        assert_eq!(txn.code, None, "Transfers with an origin get no code");
        assert_eq!(balance(&engine, 1), dec!(35.0));
        assert_eq!(balance(&engine, 2), dec!(31.0));
    }

    #[test]
    fn tst_transfer_status_checks() {
        let mut engine = init_test_ledger(RefundBalanceMode::SingleApply);
        let _ = engine.accounts.set_status(2, AccountStatus::Canceled);
        let res = engine.create_transfer(2, Some(1), dec!(4));
        assert_eq!(res, Err(ValidationError::AccountInactive(2).into()));

        let _ = engine.accounts.set_status(2, AccountStatus::Active);
        let _ = engine.accounts.set_status(1, AccountStatus::Blocked);
        let res = engine.create_transfer(2, Some(1), dec!(4));
        assert_eq!(res, Err(ValidationError::AccountInactive(1).into()));

        let res = engine.create_transfer(2, Some(9), dec!(4));
        assert_eq!(res, Err(ValidationError::AccountNotFound(9).into()));

        assert!(engine.transactions().is_empty());
        assert_eq!(balance(&engine, 1), dec!(45.0));
        assert_eq!(balance(&engine, 2), dec!(21.0));
    }

    #[test]
    fn tst_rejected_deposit_burns_no_code() {
        let mut engine = init_test_ledger(RefundBalanceMode::SingleApply);
        let _ = engine.accounts.set_status(1, AccountStatus::Blocked);
        let _ = engine.create_transfer(1, None, dec!(1));
        let _ = engine.accounts.set_status(1, AccountStatus::Active);
        let txn = engine.create_transfer(1, None, dec!(1)).unwrap();
        assert_eq!(txn.code, Some(TransferCode::from("TRF-000001")));
    }

    #[test]
    fn tst_duplicate_code_rejected() {
        let mut engine = init_test_ledger(RefundBalanceMode::SingleApply);
        let _ = engine.create_transfer(1, None, dec!(1)).unwrap();
        let draft = TransferDraft::reversal(3, Some(2), dec!(1), Some(TransferCode::from("TRF-000001")));
        let res = engine.commit_draft(draft);
        assert_eq!(
            res,
            Err(ValidationError::CodeAlreadyIssued(TransferCode::from("TRF-000001")).into())
        );
        assert_eq!(engine.transactions().len(), 1);
        assert_eq!(balance(&engine, 2), dec!(21.0));
        assert_eq!(balance(&engine, 3), dec!(118.0));
    }

    #[test]
    fn tst_overflowing_deposit_rejected() {
        let mut engine = init_test_engine(RefundBalanceMode::SingleApply);
        let _ = engine.accounts.create(NewAccount::main(1).with_balance(Decimal::MAX));
        let _ = engine.accounts.create(NewAccount::main(2).with_balance(dec!(5)));

        let res = engine.create_transfer(1, None, dec!(1));
        assert_eq!(res, Err(ValidationError::BalanceOverflow(1).into()));
        assert_eq!(res.unwrap_err().code(), "BALANCE_OVERFLOW");
        assert!(engine.transactions().is_empty(), "Nothing should be persisted");
        assert_eq!(balance(&engine, 1), Decimal::MAX);

        let txn = engine.create_transfer(2, None, dec!(1)).unwrap();
        assert_eq!(txn.id, 1);
        assert_eq!(txn.code, Some(TransferCode::from("TRF-000001")), "No code was consumed");
    }

    #[test]
    fn tst_overflowing_transfer_rejected() {
        let mut engine = init_test_engine(RefundBalanceMode::SingleApply);
        let _ = engine.accounts.create(NewAccount::main(1).with_balance(Decimal::MIN));
        let _ = engine.accounts.create(NewAccount::filial(1, 1).with_balance(dec!(21.0)));
        let _ = engine.accounts.create(NewAccount::filial(1, 1).with_balance(Decimal::MAX));

        let res = engine.create_transfer(2, Some(1), dec!(1));
        assert_eq!(res, Err(ValidationError::BalanceOverflow(1).into()), "Origin leg checked");
        let res = engine.create_transfer(3, Some(2), dec!(1));
        assert_eq!(res, Err(ValidationError::BalanceOverflow(3).into()), "Destination leg checked");

        assert!(engine.transactions().is_empty());
        assert_eq!(balance(&engine, 1), Decimal::MIN);
        assert_eq!(balance(&engine, 2), dec!(21.0));
        assert_eq!(balance(&engine, 3), Decimal::MAX);
    }

    #[test]
    fn tst_transaction_ids_sequential() {
        let mut engine = init_test_ledger(RefundBalanceMode::SingleApply);
        let first = engine.create_transfer(1, None, dec!(1)).unwrap();
        let _ = engine.create_transfer(2, None, dec!(1));
        let second = engine.create_transfer(3, Some(2), dec!(1)).unwrap();
        assert_eq!((first.id, second.id), (1, 2), "Rejected transfers take no id");
    }
}
