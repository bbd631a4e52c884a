use crate::constants::DEFAULT_CODE_PREFIX;
use crate::transaction::TransferCode;
use std::collections::HashSet;
use ulid::Ulid;

/// Source of unique transfer codes
pub trait CodeGenerator {
    fn next_code(&mut self) -> TransferCode;
}

/// Random, time ordered codes. Remembers what it handed out and redraws on a repeat
#[derive(Debug, Default)]
pub struct UlidCodeGenerator {
    issued: HashSet<String>,
}

impl UlidCodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CodeGenerator for UlidCodeGenerator {
    fn next_code(&mut self) -> TransferCode {
        loop {
            let code = Ulid::new().to_string();
            if self.issued.insert(code.clone()) {
                return TransferCode(code);
            }
        }
    }
}

/// Deterministic `<prefix>-000001` style codes so batch files can refer to them
#[derive(Debug)]
pub struct SequentialCodeGenerator {
    prefix: String,
    counter: u64,
}

impl SequentialCodeGenerator {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            counter: 0,
        }
    }
}

impl Default for SequentialCodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_PREFIX)
    }
}

impl CodeGenerator for SequentialCodeGenerator {
    fn next_code(&mut self) -> TransferCode {
        self.counter += 1;
        TransferCode(format!("{}-{:06}", self.prefix, self.counter))
    }
}
