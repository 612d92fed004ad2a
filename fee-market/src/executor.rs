//! Applies transactions to the [`LedgerState`].
//!
//! Execution of a single transaction:
//!
//! 1. **Reserve** `gas_limit × max_fee_per_gas + value` from the sender.
//! 2. **Meter** the gas actually used via a [`GasModel`].
//! 3. **Refund** unused gas at the cap price plus the overpayment on used gas
//!    (`max_fee_per_gas - effective_gas_price` per unit).
//! 4. **Transfer** `value` to the recipient, if any.
//! 5. **Tip** the miner `gas_used × effective_priority_fee`.
//! 6. **Burn** `gas_used × base_fee`, which is credited to no one.
//!
//! A failing transaction leaves every account exactly as it found it and does
//! not bump the sender's nonce. A failing transaction inside a block does not
//! undo the transactions before it.

use {
    crate::{
        block::Block,
        config::GasSchedule,
        error::{BlockExecutionError, FeeMarketError},
        state::LedgerState,
        transaction::Transaction,
    },
    log::{debug, info},
};

/// Source of the gas consumed by a transaction.
pub trait GasModel {
    fn gas_used(&self, tx: &Transaction) -> u64;
}

impl GasModel for GasSchedule {
    /// `tx_base_gas + data_gas_per_byte × data.len()`
    fn gas_used(&self, tx: &Transaction) -> u64 {
        let data_len = u64::try_from(tx.data.len()).unwrap_or(u64::MAX);
        self.tx_base_gas
            .saturating_add(self.data_gas_per_byte.saturating_mul(data_len))
    }
}

/// Outcome of executing one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionResult {
    pub gas_used: u64,
    /// Base-fee portion removed from circulation: `gas_used × base_fee`.
    pub burned: u64,
    /// Paid to the block's miner: `gas_used × effective_priority_fee`.
    pub tip: u64,
    pub success: bool,
    pub error: Option<FeeMarketError>,
}

impl ExecutionResult {
    fn failed(error: FeeMarketError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

/// Execute `tx` inside `block`, mutating `state`.
///
/// Sender, miner and recipient accounts are created on first use. On failure
/// the result carries the error and `state` is restored to its prior value.
pub fn execute_transaction<G: GasModel + ?Sized>(
    gas_model: &G,
    tx: &Transaction,
    block: &Block,
    state: &mut LedgerState,
) -> ExecutionResult {
    let checkpoint = state.checkpoint(
        [&tx.from, &block.miner]
            .into_iter()
            .chain(tx.to.as_ref()),
    );

    match apply_transaction(gas_model, tx, block, state) {
        Ok(result) => {
            debug!(
                "executed tx from={} nonce={} gas_used={} burned={} tip={}",
                tx.from, tx.nonce, result.gas_used, result.burned, result.tip
            );
            result
        }
        Err(err) => {
            state.revert(checkpoint);
            debug!("tx from={} nonce={} failed: {err}", tx.from, tx.nonce);
            ExecutionResult::failed(err)
        }
    }
}

fn apply_transaction<G: GasModel + ?Sized>(
    gas_model: &G,
    tx: &Transaction,
    block: &Block,
    state: &mut LedgerState,
) -> Result<ExecutionResult, FeeMarketError> {
    let base_fee = block.base_fee;
    // Guards the refund arithmetic below when called without prior validation.
    tx.check_fee_caps(base_fee)?;

    state.get_account_mut(block.miner.as_str());

    let effective_price = tx.effective_gas_price(base_fee);
    let effective_tip = tx.effective_priority_fee(base_fee);

    state
        .get_account_mut(tx.from.as_str())
        .debit(tx.max_cost())?;

    let gas_used = gas_model.gas_used(tx);
    if gas_used > tx.gas_limit {
        return Err(FeeMarketError::IntrinsicGasTooHigh {
            required: gas_used,
            gas_limit: tx.gas_limit,
        });
    }

    let unused_refund = tx
        .gas_limit
        .checked_sub(gas_used)
        .and_then(|unused| unused.checked_mul(tx.max_fee_per_gas));
    let overpay_refund = tx
        .max_fee_per_gas
        .checked_sub(effective_price)
        .and_then(|overpay| gas_used.checked_mul(overpay));
    let refund = unused_refund
        .zip(overpay_refund)
        .and_then(|(unused, overpay)| unused.checked_add(overpay))
        .ok_or(FeeMarketError::Overflow)?;
    state.get_account_mut(tx.from.as_str()).credit(refund)?;

    if let Some(to) = &tx.to {
        state.get_account_mut(to.as_str()).credit(tx.value)?;
    }

    let tip = gas_used
        .checked_mul(effective_tip)
        .ok_or(FeeMarketError::Overflow)?;
    state.get_account_mut(block.miner.as_str()).credit(tip)?;

    let burned = gas_used
        .checked_mul(base_fee)
        .ok_or(FeeMarketError::Overflow)?;

    state.get_account_mut(tx.from.as_str()).increment_nonce()?;

    Ok(ExecutionResult {
        gas_used,
        burned,
        tip,
        success: true,
        error: None,
    })
}

/// Execute every transaction of `block` in order.
///
/// Stops at the first failure and returns it together with the results so
/// far (the failing one last). Earlier transactions stay applied.
pub fn execute_block<G: GasModel + ?Sized>(
    gas_model: &G,
    block: &Block,
    state: &mut LedgerState,
) -> Result<Vec<ExecutionResult>, BlockExecutionError> {
    let mut results = Vec::with_capacity(block.transactions.len());

    for (index, tx) in block.transactions.iter().enumerate() {
        let result = execute_transaction(gas_model, tx, block, state);
        let error = result.error.clone();
        results.push(result);
        if let Some(source) = error {
            return Err(BlockExecutionError {
                block_number: block.number,
                index,
                results,
                source,
            });
        }
    }

    let (burned, tips) = results.iter().fold((0u64, 0u64), |(burned, tips), r| {
        (burned.saturating_add(r.burned), tips.saturating_add(r.tip))
    });
    info!(
        "block {} executed: txs={} gas_used={} base_fee={} burned={} tips={}",
        block.number,
        results.len(),
        block.gas_used,
        block.base_fee,
        burned,
        tips
    );
    Ok(results)
}
