use {
    crate::{block::Block, config::ProtocolConfig},
    log::debug,
};

/// Calculate the next block's base fee from its parent.
///
/// # Formula
///
/// ```text
/// target = parent.gas_limit / elasticity_multiplier
///
/// if parent.number + 1 == fork_block_number:
///     next_base_fee = initial_base_fee          (activation block)
///
/// if parent.gas_used == target:
///     next_base_fee = parent.base_fee           (no change)
///
/// if parent.gas_used > target:
///     delta = parent.base_fee × (parent.gas_used - target) / target / denominator
///     next_base_fee = parent.base_fee + max(delta, 1)
///
/// if parent.gas_used < target:
///     delta = parent.base_fee × (target - parent.gas_used) / target / denominator
///     next_base_fee = parent.base_fee - delta   (floored at 0)
/// ```
///
/// The product is formed in `u128` and the two divisions are applied in that
/// order, so results match go-ethereum bit for bit. A result that would not
/// fit in `u64` saturates.
///
/// # Note on `max(delta, 1)` when above target
///
/// Without the minimum bump a very small base fee would round every increase
/// to zero and stay stuck under sustained congestion.
///
/// A zero target (gas limit smaller than the elasticity multiplier) has no
/// proportional delta: any gas used still raises the fee by the minimum bump
/// of 1, and an empty block leaves it unchanged.
pub fn next_base_fee(config: &ProtocolConfig, parent: &Block) -> u64 {
    if parent.number.checked_add(1) == Some(config.fork_block_number) {
        return config.initial_base_fee;
    }

    let target = config.target_gas(parent.gas_limit);
    let current = parent.base_fee;

    if parent.gas_used == target {
        return current;
    }

    let next = if parent.gas_used > target {
        let excess = parent.gas_used.saturating_sub(target);
        let delta = fee_delta(config, current, excess, target).max(1);
        u128::from(current).saturating_add(delta)
    } else {
        let deficit = target.saturating_sub(parent.gas_used);
        let delta = fee_delta(config, current, deficit, target);
        u128::from(current).saturating_sub(delta)
    };
    let next = u64::try_from(next).unwrap_or(u64::MAX);

    debug!(
        "next base fee: parent={} gas_used={} target={} base_fee={} -> {}",
        parent.number, parent.gas_used, target, current, next
    );
    next
}

/// `base_fee × gas_delta / target / denominator`, 0 on a zero divisor.
#[inline]
fn fee_delta(config: &ProtocolConfig, base_fee: u64, gas_delta: u64, target: u64) -> u128 {
    u128::from(base_fee)
        .saturating_mul(u128::from(gas_delta))
        .checked_div(u128::from(target))
        .and_then(|d| d.checked_div(u128::from(config.base_fee_change_denominator)))
        .unwrap_or(0)
}

/// Forecast the base fee over a sequence of hypothetical gas usages.
///
/// Starting from `initial`, each step derives the next fee from the current
/// hypothetical block, records it, and builds the following block with the
/// next usage value, the same gas limit and the recorded fee. Nothing outside
/// the returned vector is touched.
pub fn forecast_base_fees(
    config: &ProtocolConfig,
    initial: &Block,
    gas_used_sequence: &[u64],
) -> Vec<u64> {
    let mut current = Block {
        number: initial.number,
        gas_limit: initial.gas_limit,
        gas_used: initial.gas_used,
        base_fee: initial.base_fee,
        ..Block::default()
    };

    gas_used_sequence
        .iter()
        .map(|&gas_used| {
            let fee = next_base_fee(config, &current);
            current = Block {
                number: current.number.saturating_add(1),
                gas_limit: current.gas_limit,
                gas_used,
                base_fee: fee,
                ..Block::default()
            };
            fee
        })
        .collect()
}
