//! Protocol rule checks for transactions and blocks.
//!
//! Both checks are read-only and report the first rule that fails.

use crate::{
    block::Block, calculator::next_base_fee, config::ProtocolConfig, error::FeeMarketError,
    state::LedgerState, transaction::Transaction,
};

/// Check that `tx` is includable at `base_fee` given the sender's account.
///
/// Rules, in order:
/// 1. `max_fee_per_gas >= base_fee`
/// 2. `max_fee_per_gas >= max_priority_fee_per_gas`
/// 3. `gas_limit > 0`
/// 4. the sender can cover `gas_limit × max_fee_per_gas + value`
/// 5. `tx.nonce` equals the sender's nonce exactly
///
/// An unknown sender is treated as an empty account; it is not created.
pub fn validate_transaction(
    tx: &Transaction,
    base_fee: u64,
    state: &LedgerState,
) -> Result<(), FeeMarketError> {
    tx.check_fee_caps(base_fee)?;

    let (balance, nonce) = state
        .get_account(tx.from.as_str())
        .map_or((0, 0), |account| (account.balance, account.nonce));

    let max_cost = tx.max_cost();
    if u128::from(balance) < max_cost {
        return Err(FeeMarketError::InsufficientFunds {
            address: tx.from.clone(),
            balance,
            required: max_cost,
        });
    }

    if tx.nonce != nonce {
        return Err(FeeMarketError::NonceMismatch {
            address: tx.from.clone(),
            expected: nonce,
            got: tx.nonce,
        });
    }

    Ok(())
}

/// Check that `block` is a valid child of `parent`.
///
/// The declared base fee is not trusted: it must equal [`next_base_fee`]
/// recomputed from `parent`.
pub fn validate_block(
    config: &ProtocolConfig,
    block: &Block,
    parent: &Block,
) -> Result<(), FeeMarketError> {
    let expected_number = parent.number.saturating_add(1);
    if block.number != expected_number {
        return Err(FeeMarketError::InvalidBlockNumber {
            expected: expected_number,
            got: block.number,
        });
    }

    if block.parent_hash != parent.hash {
        return Err(FeeMarketError::ParentHashMismatch {
            expected: parent.hash.clone(),
            got: block.parent_hash.clone(),
        });
    }

    if block.gas_used > block.gas_limit {
        return Err(FeeMarketError::GasLimitExceeded {
            gas_used: block.gas_used,
            gas_limit: block.gas_limit,
        });
    }

    let bound = config.gas_limit_bound(parent.gas_limit);
    let max = parent.gas_limit.saturating_add(bound);
    let min = parent.gas_limit.saturating_sub(bound);
    if block.gas_limit > max || block.gas_limit < min {
        return Err(FeeMarketError::GasLimitDrift {
            parent_gas_limit: parent.gas_limit,
            gas_limit: block.gas_limit,
            min,
            max,
        });
    }

    if block.gas_limit < config.min_gas_limit {
        return Err(FeeMarketError::GasLimitBelowMinimum {
            gas_limit: block.gas_limit,
            minimum: config.min_gas_limit,
        });
    }

    let expected_base_fee = next_base_fee(config, parent);
    if block.base_fee != expected_base_fee {
        return Err(FeeMarketError::BaseFeeMismatch {
            expected: expected_base_fee,
            got: block.base_fee,
        });
    }

    Ok(())
}
