use {
    crate::{error::FeeMarketError, state::Address},
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
};

/// A dynamic-fee (type 2) transaction without a signature.
///
/// The sender is trusted as given; identity is not verified here.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    /// Tip cap: the most the sender pays the miner per unit of gas.
    pub max_priority_fee_per_gas: u64,
    /// Fee cap: the most the sender pays per unit of gas, base fee included.
    pub max_fee_per_gas: u64,
    pub gas_limit: u64,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: u64,
    pub data: Vec<u8>,
    pub from: Address,
}

impl Transaction {
    /// Tip actually paid per unit of gas at `base_fee`.
    ///
    /// ```text
    /// min(max_priority_fee_per_gas, max_fee_per_gas - base_fee)
    /// ```
    ///
    /// so that `base_fee + tip` never exceeds the fee cap.
    #[inline]
    pub fn effective_priority_fee(&self, base_fee: u64) -> u64 {
        self.max_priority_fee_per_gas
            .min(self.max_fee_per_gas.saturating_sub(base_fee))
    }

    /// Price actually paid per unit of gas: `base_fee + effective tip`.
    #[inline]
    pub fn effective_gas_price(&self, base_fee: u64) -> u64 {
        base_fee.saturating_add(self.effective_priority_fee(base_fee))
    }

    /// Worst-case charge, `gas_limit × max_fee_per_gas + value`.
    ///
    /// Computed in `u128` so it cannot wrap; a value above `u64::MAX` is
    /// simply unaffordable for any account.
    #[inline]
    pub fn max_cost(&self) -> u128 {
        u128::from(self.gas_limit)
            .saturating_mul(u128::from(self.max_fee_per_gas))
            .saturating_add(u128::from(self.value))
    }

    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }

    /// Stateless checks of the fee fields against `base_fee`.
    pub fn check_fee_caps(&self, base_fee: u64) -> Result<(), FeeMarketError> {
        if self.max_fee_per_gas < base_fee {
            return Err(FeeMarketError::FeeTooLow {
                max_fee_per_gas: self.max_fee_per_gas,
                base_fee,
            });
        }
        if self.max_fee_per_gas < self.max_priority_fee_per_gas {
            return Err(FeeMarketError::FeeCapBelowTip {
                max_fee_per_gas: self.max_fee_per_gas,
                max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            });
        }
        if self.gas_limit == 0 {
            return Err(FeeMarketError::ZeroGasLimit);
        }
        Ok(())
    }
}
