use super::refunds::RefundError;
use crate::account_store::AccountError;
use super::transfers::TransferError;
use super::LedgerEngine;
use crate::cli_io::{output_accounts, parse_accounts_csv, CliOptions, InputError, Operation, RawOperation};
use crate::transaction::Transaction;
use csv::{ReaderBuilder, Trim};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Refund(#[from] RefundError),

    #[error(transparent)]
    Account(#[from] AccountError),
}

impl OperationError {
    pub fn code(&self) -> &'static str {
        match self {
            OperationError::Transfer(e) => e.code(),
            OperationError::Refund(e) => e.code(),
            OperationError::Account(e) => e.code(),
        }
    }
}

/// Tally of a processed operations file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub applied: usize,
    pub rejected: usize,
    /// Rows that never made it to the engine
    pub malformed: usize,
}

impl LedgerEngine {
    /// Base level operation processing. Logging of failures is left to the caller.
    /// Status changes write no transaction record
    pub fn process_operation(&mut self, op: &Operation) -> Result<Option<Transaction>, OperationError> {
        match op {
            Operation::Transfer {
                destination,
                origin,
                value,
            } => Ok(Some(self.create_transfer(*destination, *origin, *value)?)),
            Operation::Refund { code, txn_id } => Ok(Some(self.refund(code.as_deref(), *txn_id)?)),
            Operation::Status { account, status } => {
                self.accounts.set_status(*account, *status)?;
                debug!(account, %status, "account status changed");
                Ok(None)
            }
        }
    }

    /// Creates every account in the file. Any bad row aborts the load, since later rows
    /// may reference the ids of earlier ones
    pub fn load_accounts_csv(&mut self, in_file_path: &str, has_header: bool) -> Result<usize, InputError> {
        let new_accounts = parse_accounts_csv(in_file_path, has_header)?;
        let count = new_accounts.len();
        for (row, new_account) in new_accounts.into_iter().enumerate() {
            self.accounts
                .create(new_account)
                .map_err(|source| InputError::Account { row: row + 1, source })?;
        }
        for main in self.accounts.accounts().iter().filter(|acnt| acnt.is_main) {
            debug!(account = main.id, filials = self.accounts.filials(main.id).count(), "main account loaded");
        }
        info!(count, file = in_file_path, "accounts loaded");
        Ok(count)
    }

    /// Returns error in the event that file cannot be read
    /// Else mutates the ledger state
    /// Records with correct data format but fail logically given business logic are counted as rejected
    /// Improper csv format or corrupted records are skipped
    pub fn stream_process_csv(&mut self, in_file_path: &str, has_header: bool) -> Result<StreamSummary, InputError> {
        let mut rdr = ReaderBuilder::new()
            .trim(Trim::All)
            .has_headers(has_header)
            .from_path(in_file_path)?;

        let mut summary = StreamSummary::default();
        for (row, result) in rdr.deserialize::<RawOperation>().enumerate() {
            let op = match result.map_err(InputError::from).and_then(RawOperation::convert_to_operation) {
                Ok(op) => op,
                Err(e) => {
                    warn!(row = row + 1, error = %e, "skipping malformed operation");
                    summary.malformed += 1;
                    continue;
                }
            };
            match self.process_operation(&op) {
                Ok(_) => summary.applied += 1,
                Err(e) => {
                    warn!(row = row + 1, reason = e.code(), error = %e, "operation rejected");
                    summary.rejected += 1;
                }
            }
        }

        info!(
            applied = summary.applied,
            rejected = summary.rejected,
            malformed = summary.malformed,
            transactions = self.transactions().len(),
            refund_mode = ?self.refund_mode(),
            "operations processed"
        );
        Ok(summary)
    }

    /// Loads accounts, streams operations, then reports the final account state.
    /// If the operations file breaks mid stream, the state reached so far is still reported
    pub fn streaming_execute(&mut self, cli_input: &CliOptions) -> Result<StreamSummary, InputError> {
        self.load_accounts_csv(&cli_input.accounts_file, true)?;
        let res = self.stream_process_csv(&cli_input.operations_file, true);
        output_accounts(self.accounts.accounts(), &cli_input.output)?;
        res
    }
}
