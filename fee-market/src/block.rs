use {
    crate::{
        config::ProtocolConfig, error::FeeMarketError, state::Address, transaction::Transaction,
    },
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
};

/// A block carrying its own base fee.
///
/// `gas_used` is the sum of the gas limits of the included transactions and
/// never exceeds `gas_limit` when built through [`Block::add_transaction`].
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Block {
    pub number: u64,
    pub parent_hash: String,
    pub hash: String,
    pub gas_limit: u64,
    pub gas_used: u64,
    /// Per-gas fee burned for every unit of gas used in this block.
    pub base_fee: u64,
    /// Receives the tips.
    pub miner: Address,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// An empty block on top of `parent_hash`.
    pub fn new(
        number: u64,
        parent_hash: impl Into<String>,
        gas_limit: u64,
        base_fee: u64,
        miner: impl Into<Address>,
    ) -> Self {
        Self {
            number,
            parent_hash: parent_hash.into(),
            gas_limit,
            base_fee,
            miner: miner.into(),
            ..Self::default()
        }
    }

    /// Append `tx`, charging its full gas limit against the block.
    ///
    /// The block is left unchanged if the transaction does not fit.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<(), FeeMarketError> {
        let gas_used = self
            .gas_used
            .checked_add(tx.gas_limit)
            .filter(|gas_used| *gas_used <= self.gas_limit)
            .ok_or(FeeMarketError::BlockGasLimitReached {
                gas_used: self.gas_used,
                tx_gas_limit: tx.gas_limit,
                block_gas_limit: self.gas_limit,
            })?;
        self.transactions.push(tx);
        self.gas_used = gas_used;
        Ok(())
    }

    #[inline]
    pub fn gas_target(&self, config: &ProtocolConfig) -> u64 {
        config.target_gas(self.gas_limit)
    }

    pub fn is_above_target(&self, config: &ProtocolConfig) -> bool {
        self.gas_used > self.gas_target(config)
    }

    pub fn is_below_target(&self, config: &ProtocolConfig) -> bool {
        self.gas_used < self.gas_target(config)
    }

    /// Gas utilisation as a percentage (0 for a zero gas limit).
    pub fn utilization(&self) -> f64 {
        if self.gas_limit == 0 {
            return 0.0;
        }
        self.gas_used as f64 / self.gas_limit as f64 * 100.0
    }
}
