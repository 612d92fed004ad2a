use {
    crate::error::FeeMarketError,
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
};

/// Base fee of the first block after activation (1 gwei).
pub const INITIAL_BASE_FEE: u64 = 1_000_000_000;

/// Each block, the base fee can change by at most `1 / 8` (12.5 %).
pub const BASE_FEE_CHANGE_DENOMINATOR: u64 = 8;

/// Blocks may use up to twice the target gas.
pub const ELASTICITY_MULTIPLIER: u64 = 2;

/// Absolute floor for a block gas limit.
pub const MIN_GAS_LIMIT: u64 = 5_000;

/// Block number at which the fee market activates (London).
pub const FORK_BLOCK_NUMBER: u64 = 12_965_000;

/// The block gas limit can move by at most `parent / 1024` per block.
pub const GAS_LIMIT_BOUND_DIVISOR: u64 = 1_024;

/// Flat gas charged for every transaction.
pub const TX_BASE_GAS: u64 = 21_000;

/// Gas charged per byte of transaction payload.
pub const TX_DATA_GAS_PER_BYTE: u64 = 16;

/// Protocol parameters of the fee market.
///
/// The defaults are Ethereum mainnet's London parameters. Every field can be
/// overridden (the simulator reads them from TOML), which is why missing
/// fields fall back to the defaults on deserialisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Base fee assigned to the first block after `fork_block_number - 1`.
    pub initial_base_fee: u64,

    /// Denominator for the base fee adjustment fraction.
    pub base_fee_change_denominator: u64,

    /// `target = gas_limit / elasticity_multiplier`.
    pub elasticity_multiplier: u64,

    /// Blocks with a smaller gas limit are rejected.
    pub min_gas_limit: u64,

    /// Activation block number; its parent gets the bootstrap fee.
    pub fork_block_number: u64,

    /// Bounds the per-block gas limit change to `parent / divisor`.
    pub gas_limit_bound_divisor: u64,

    /// Simulated gas cost of a transaction.
    pub gas_schedule: GasSchedule,
}

impl ProtocolConfig {
    /// Target gas for a block with the given gas limit (truncating).
    ///
    /// A zero multiplier yields a zero target rather than panicking.
    #[inline]
    pub fn target_gas(&self, gas_limit: u64) -> u64 {
        gas_limit
            .checked_div(self.elasticity_multiplier)
            .unwrap_or(0)
    }

    /// Maximum distance a child's gas limit may move away from `parent_gas_limit`.
    #[inline]
    pub fn gas_limit_bound(&self, parent_gas_limit: u64) -> u64 {
        parent_gas_limit
            .checked_div(self.gas_limit_bound_divisor)
            .unwrap_or(0)
    }

    /// Check that the parameters are internally consistent.
    pub fn validate(&self) -> Result<(), FeeMarketError> {
        if self.base_fee_change_denominator == 0 {
            return Err(FeeMarketError::InvalidConfig {
                reason: "base_fee_change_denominator must be > 0".to_string(),
            });
        }
        if self.elasticity_multiplier == 0 {
            return Err(FeeMarketError::InvalidConfig {
                reason: "elasticity_multiplier must be > 0".to_string(),
            });
        }
        if self.gas_limit_bound_divisor == 0 {
            return Err(FeeMarketError::InvalidConfig {
                reason: "gas_limit_bound_divisor must be > 0".to_string(),
            });
        }
        if self.gas_schedule.tx_base_gas == 0 {
            return Err(FeeMarketError::InvalidConfig {
                reason: "tx_base_gas must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            initial_base_fee: INITIAL_BASE_FEE,
            base_fee_change_denominator: BASE_FEE_CHANGE_DENOMINATOR,
            elasticity_multiplier: ELASTICITY_MULTIPLIER,
            min_gas_limit: MIN_GAS_LIMIT,
            fork_block_number: FORK_BLOCK_NUMBER,
            gas_limit_bound_divisor: GAS_LIMIT_BOUND_DIVISOR,
            gas_schedule: GasSchedule::default(),
        }
    }
}

/// Fixed gas cost model: a flat charge plus a per-byte payload surcharge.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(default)]
pub struct GasSchedule {
    pub tx_base_gas: u64,
    pub data_gas_per_byte: u64,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            tx_base_gas: TX_BASE_GAS,
            data_gas_per_byte: TX_DATA_GAS_PER_BYTE,
        }
    }
}
