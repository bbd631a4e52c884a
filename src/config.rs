use crate::code_generator::{CodeGenerator, SequentialCodeGenerator, UlidCodeGenerator};
use crate::constants::DEFAULT_CODE_PREFIX;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// How a refund touches balances.
/// `DoubleApply` keeps the historical behavior where the compensating deltas are applied on top
/// of the reversal record's own balance step, so a refunded account ends up off by the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundBalanceMode {
    #[default]
    SingleApply,
    DoubleApply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeGeneratorKind {
    #[default]
    Ulid,
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub refund_mode: RefundBalanceMode,
    pub code_generator: CodeGeneratorKind,
    /// Only used by the sequential generator
    pub code_prefix: String,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refund_mode: RefundBalanceMode::default(),
            code_generator: CodeGeneratorKind::default(),
            code_prefix: DEFAULT_CODE_PREFIX.to_string(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn build_code_generator(&self) -> Box<dyn CodeGenerator> {
        match self.code_generator {
            CodeGeneratorKind::Ulid => Box::new(UlidCodeGenerator::new()),
            CodeGeneratorKind::Sequential => Box::new(SequentialCodeGenerator::new(&self.code_prefix)),
        }
    }
}
