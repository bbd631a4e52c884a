use crate::account::{Account, AccountId, AccountStatus, OwnerId};
use crate::account_store::{AccountError, NewAccount};
use crate::constants::PRECISION;
use crate::transaction::TxnId;
use csv::Writer;
use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;

pub const ACCOUNTS_HEADER: [&str; 6] = ["account", "owner", "parent", "main", "balance", "status"];

#[derive(Error, Debug)]
pub enum InputError {
    #[error("usage: filialledger <accounts.csv> <operations.csv> [config.yaml]")]
    Usage,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid decimal: {0}")]
    InvalidDecimal(String),

    #[error("Invalid account status: {0}")]
    InvalidStatus(String),

    #[error("Unsupported operation type: {0}")]
    UnsupportedType(String),

    #[error("Account row {row} rejected: {source}")]
    Account {
        row: usize,
        #[source]
        source: AccountError,
    },
}

/// Options and data to export results
pub enum OutputMethod {
    /// Output to csv file.  Used for integration testing.
    #[cfg(test)]
    Csv(String),
    /// Output to console
    StdOutput,
}

/// Output a collection of accounts
pub fn output_accounts(accounts: &[Account], output: &OutputMethod) -> Result<(), csv::Error> {
    match output {
        #[cfg(test)]
        OutputMethod::Csv(file_path) => output_accounts_csv(accounts, file_path),
        OutputMethod::StdOutput => {
            println!("{}", ACCOUNTS_HEADER.join(","));
            for acnt in accounts.iter() {
                acnt.print_std_out();
            }
            Ok(())
        }
    }
}

#[cfg(test)]
fn output_accounts_csv(accounts: &[Account], file_path: &str) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_path(file_path)?;
    wtr.write_record(ACCOUNTS_HEADER)?;
    for acnt in accounts {
        wtr.write_record(&[
            format!("{}", acnt.id),
            format!("{}", acnt.owner_id),
            acnt.parent_id.map(|p| p.to_string()).unwrap_or_default(),
            format!("{}", acnt.is_main),
            format!("{:.*}", PRECISION, acnt.balance),
            format!("{}", acnt.status),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub struct CliOptions {
    pub accounts_file: String,
    pub operations_file: String,
    pub config_file: Option<String>,
    pub output: OutputMethod,
}

pub fn parse_cli() -> Result<CliOptions, InputError> {
    let mut args = std::env::args().skip(1);
    let accounts_file = args.next().ok_or(InputError::Usage)?;
    let operations_file = args.next().ok_or(InputError::Usage)?;
    let config_file = args.next();

    Ok(CliOptions {
        accounts_file,
        operations_file,
        config_file,
        output: OutputMethod::StdOutput,
    })
}

fn parse_decimal(raw: &str) -> Result<Decimal, InputError> {
    Decimal::from_str(raw).map_err(|_| InputError::InvalidDecimal(raw.to_string()))
}

/// Account row; ids are handed out by the store in row order
#[derive(Debug, Deserialize)]
pub struct RawAccountRow {
    #[serde(rename = "owner", deserialize_with = "csv::invalid_option")]
    owner_id: Option<OwnerId>,
    #[serde(rename = "parent", deserialize_with = "csv::invalid_option")]
    parent_id: Option<AccountId>,
    balance: Option<String>,
    status: Option<String>,
}

impl RawAccountRow {
    pub fn convert_to_new_account(self) -> Result<NewAccount, InputError> {
        let balance = match self.balance.as_deref() {
            Some(raw) if !raw.is_empty() => Some(parse_decimal(raw)?),
            _ => None,
        };
        let status = match self.status.as_deref() {
            Some(raw) if !raw.is_empty() => Some(
                AccountStatus::from_str(raw).map_err(|_| InputError::InvalidStatus(raw.to_string()))?,
            ),
            _ => None,
        };
        Ok(NewAccount {
            owner_id: self.owner_id,
            parent_id: self.parent_id,
            balance,
            status,
        })
    }
}

/// What a caller asks of the ledger
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Transfer {
        destination: AccountId,
        origin: Option<AccountId>,
        value: Decimal,
    },
    Refund {
        code: Option<String>,
        txn_id: Option<TxnId>,
    },
    /// Block, cancel or reactivate an account
    Status {
        account: AccountId,
        status: AccountStatus,
    },
}

#[derive(Debug, Deserialize)]
pub struct RawOperation {
    #[serde(rename = "type")]
    op_type: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    destination: Option<AccountId>,
    #[serde(deserialize_with = "csv::invalid_option")]
    origin: Option<AccountId>,
    value: Option<String>,
    code: Option<String>,
    #[serde(rename = "tx", deserialize_with = "csv::invalid_option")]
    txn_id: Option<TxnId>,
    status: Option<String>,
}

impl RawOperation {
    pub fn convert_to_operation(self) -> Result<Operation, InputError> {
        match self.op_type.as_str() {
            "transfer" => {
                let destination = self.destination.ok_or(InputError::MissingField("destination"))?;
                let value = match self.value.as_deref() {
                    Some(raw) if !raw.is_empty() => parse_decimal(raw)?,
                    _ => return Err(InputError::MissingField("value")),
                };
                Ok(Operation::Transfer {
                    destination,
                    origin: self.origin,
                    value,
                })
            }
            // selector checks are the engine's job
            "refund" => Ok(Operation::Refund {
                code: self.code.filter(|c| !c.is_empty()),
                txn_id: self.txn_id,
            }),
            "status" => {
                let account = self.destination.ok_or(InputError::MissingField("destination"))?;
                let status = match self.status.as_deref() {
                    Some(raw) if !raw.is_empty() => AccountStatus::from_str(raw)
                        .map_err(|_| InputError::InvalidStatus(raw.to_string()))?,
                    _ => return Err(InputError::MissingField("status")),
                };
                Ok(Operation::Status { account, status })
            }
            other => Err(InputError::UnsupportedType(other.to_string())),
        }
    }
}

pub fn parse_accounts_csv(in_file_path: &str, has_header: bool) -> Result<Vec<NewAccount>, InputError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(has_header)
        .from_path(in_file_path)?;

    let mut accounts = vec![];
    for result in rdr.deserialize() {
        let record: RawAccountRow = result?;
        accounts.push(record.convert_to_new_account()?);
    }
    Ok(accounts)
}
