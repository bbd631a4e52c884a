/// Decimal places used when rendering balances and values
pub const PRECISION: usize = 4;

/// Prefix for codes issued by the sequential code generator
pub const DEFAULT_CODE_PREFIX: &str = "TRF";
