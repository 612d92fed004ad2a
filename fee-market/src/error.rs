use {
    crate::{executor::ExecutionResult, state::Address},
    thiserror::Error,
};

/// Errors produced by the fee market validator and executor.
///
/// Every variant carries the offending and the expected values so that a
/// driver can decide whether to skip the transaction/block or abort the run.
/// Nothing in this crate retries on error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeeMarketError {
    /// The fee cap cannot cover the current base fee, so the transaction can
    /// never be included.
    #[error("max fee per gas {max_fee_per_gas} less than base fee {base_fee}")]
    FeeTooLow { max_fee_per_gas: u64, base_fee: u64 },

    /// The tip cap exceeds the total fee cap.
    #[error(
        "max fee per gas {max_fee_per_gas} less than max priority fee per gas \
         {max_priority_fee_per_gas}"
    )]
    FeeCapBelowTip {
        max_fee_per_gas: u64,
        max_priority_fee_per_gas: u64,
    },

    #[error("transaction gas limit cannot be zero")]
    ZeroGasLimit,

    /// The sender cannot cover `gas_limit × max_fee_per_gas + value`.
    #[error("insufficient funds for {address}: have {balance}, need {required}")]
    InsufficientFunds {
        address: Address,
        balance: u64,
        required: u128,
    },

    #[error("invalid nonce for {address}: have {got}, expected {expected}")]
    NonceMismatch {
        address: Address,
        expected: u64,
        got: u64,
    },

    #[error("invalid block number: expected {expected}, got {got}")]
    InvalidBlockNumber { expected: u64, got: u64 },

    #[error("invalid parent hash: expected {expected:?}, got {got:?}")]
    ParentHashMismatch { expected: String, got: String },

    #[error("gas used ({gas_used}) exceeds gas limit ({gas_limit})")]
    GasLimitExceeded { gas_used: u64, gas_limit: u64 },

    /// The block gas limit moved further than `parent / bound_divisor`.
    #[error(
        "gas limit changed too much: parent {parent_gas_limit}, current {gas_limit}, \
         allowed [{min}, {max}]"
    )]
    GasLimitDrift {
        parent_gas_limit: u64,
        gas_limit: u64,
        min: u64,
        max: u64,
    },

    #[error("gas limit ({gas_limit}) below minimum ({minimum})")]
    GasLimitBelowMinimum { gas_limit: u64, minimum: u64 },

    /// The declared base fee differs from the value recomputed from the parent.
    #[error("invalid base fee: expected {expected}, got {got}")]
    BaseFeeMismatch { expected: u64, got: u64 },

    /// Appending the transaction would push the block over its gas limit.
    #[error(
        "transaction would exceed block gas limit: used {gas_used} + tx {tx_gas_limit} > \
         limit {block_gas_limit}"
    )]
    BlockGasLimitReached {
        gas_used: u64,
        tx_gas_limit: u64,
        block_gas_limit: u64,
    },

    /// The gas model charged more than the transaction's own gas limit.
    #[error("intrinsic gas too high: requires {required}, gas limit {gas_limit}")]
    IntrinsicGasTooHigh { required: u64, gas_limit: u64 },

    /// The configuration is invalid (e.g. denominator = 0).
    #[error("Invalid protocol configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A balance or nonce would leave the `u64` range.
    #[error("Balance arithmetic overflow")]
    Overflow,
}

impl FeeMarketError {
    /// `true` for the block-linkage failures (wrong number or parent hash).
    pub fn is_block_sequence_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidBlockNumber { .. } | Self::ParentHashMismatch { .. }
        )
    }
}

/// A transaction inside a block failed to execute.
///
/// Transactions before `index` were applied and are NOT rolled back; their
/// results (followed by the failing one) are kept in `results`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transaction {index} in block {block_number} failed: {source}")]
pub struct BlockExecutionError {
    pub block_number: u64,
    pub index: usize,
    pub results: Vec<ExecutionResult>,
    #[source]
    pub source: FeeMarketError,
}
