use crate::account_store::AccountStore;
use crate::code_generator::CodeGenerator;
use crate::config::{EngineConfig, RefundBalanceMode};
use crate::transaction::{Transaction, TransferCode, TxnId};
use std::collections::HashMap;
pub mod refunds;
pub mod state;
pub mod stream_process;
pub mod transfers;

pub struct LedgerEngine {
    pub accounts: AccountStore,

    /// Committed transactions in commit order. Never modified after the push
    processed_txns: Vec<Transaction>,
    /// O(1) lookup from transaction id to position in `processed_txns`
    txn_map: HashMap<TxnId, usize>,
    /// O(1) lookup from transfer code to position in `processed_txns`, doubles as the uniqueness index
    code_map: HashMap<TransferCode, usize>,

    code_gen: Box<dyn CodeGenerator>,
    refund_mode: RefundBalanceMode,
}

impl LedgerEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_code_generator(config.build_code_generator(), config.refund_mode)
    }

    pub fn with_code_generator(
        code_gen: Box<dyn CodeGenerator>,
        refund_mode: RefundBalanceMode,
    ) -> Self {
        Self {
            accounts: AccountStore::new(),
            processed_txns: vec![],
            txn_map: HashMap::new(),
            code_map: HashMap::new(),
            code_gen,
            refund_mode,
        }
    }

    pub fn refund_mode(&self) -> RefundBalanceMode {
        self.refund_mode
    }

    pub fn find_transaction(&self, id: TxnId) -> Option<&Transaction> {
        self.txn_map.get(&id).map(|indx| &self.processed_txns[*indx])
    }

    pub fn find_by_code(&self, code: &str) -> Option<&Transaction> {
        self.code_map
            .get(&TransferCode::from(code))
            .map(|indx| &self.processed_txns[*indx])
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.processed_txns
    }
}
