//! Property-based tests for EIP-1559 economic invariants.
//!
//! Properties tested:
//! 1. Base fee moves by at most 1/8 per block, in the direction of demand
//! 2. Sustained demand moves the fee monotonically
//! 3. Execution removes exactly the burned amount from circulation
//! 4. A failed execution leaves the ledger untouched
//! 5. A transaction the validator accepts always executes
//! 6. The effective price never exceeds the sender's caps

#[cfg(test)]
mod tests {
    use {
        eip1559_fee_market::{
            calculator::{forecast_base_fees, next_base_fee},
            config::FORK_BLOCK_NUMBER,
            executor::execute_transaction,
            validator::validate_transaction,
            Account, Address, Block, LedgerState, ProtocolConfig, Transaction,
        },
        proptest::prelude::*,
    };

    fn parent(target: u64, gas_used: u64, base_fee: u64) -> Block {
        Block {
            number: FORK_BLOCK_NUMBER,
            gas_limit: target * 2,
            gas_used,
            base_fee,
            ..Block::default()
        }
    }

    fn arb_transaction() -> impl Strategy<Value = Transaction> {
        (
            0..=100_000_000_000u64,
            0..=100_000_000_000u64,
            21_000..=100_000u64,
            0..=1_000_000_000u64,
            proptest::collection::vec(any::<u8>(), 0..=128),
            any::<bool>(),
        )
            .prop_map(|(tip_cap, fee_cap, gas_limit, value, data, create)| Transaction {
                chain_id: 1,
                nonce: 0,
                max_priority_fee_per_gas: tip_cap,
                max_fee_per_gas: fee_cap,
                gas_limit,
                to: (!create).then(|| Address::from("0xBob")),
                value,
                data,
                from: Address::from("0xAlice"),
            })
    }

    /// Bend a random transaction until it passes the stateless rules at
    /// `base_fee` and carries enough gas for its payload.
    fn includable(mut tx: Transaction, base_fee: u64, config: &ProtocolConfig) -> Transaction {
        tx.max_fee_per_gas += base_fee;
        tx.max_priority_fee_per_gas = tx.max_priority_fee_per_gas.min(tx.max_fee_per_gas);
        let intrinsic = config.gas_schedule.tx_base_gas
            + config.gas_schedule.data_gas_per_byte * tx.data.len() as u64;
        tx.gas_limit = tx.gas_limit.max(intrinsic);
        tx
    }

    fn ledger(alice_balance: u64) -> LedgerState {
        let mut state = LedgerState::new();
        state.set_account(Account::new("0xAlice", alice_balance));
        state.set_account(Account::new("0xBob", 0));
        state.set_account(Account::new("0xMiner", 0));
        state
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 1. Per-block adjustment is bounded and points the right way
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn base_fee_change_bounded(
            target in 2_500..=30_000_000u64,
            used_pct in 0..=200u64,
            base_fee in 0..=1_000_000_000_000_000u64,
        ) {
            let config = ProtocolConfig::default();
            let gas_used = target * used_pct / 100;
            let next = next_base_fee(&config, &parent(target, gas_used, base_fee));
            let max_step = (base_fee / 8).max(1);

            if gas_used > target {
                prop_assert!(next > base_fee, "fee did not rise: {base_fee} -> {next}");
                prop_assert!(next - base_fee <= max_step);
            } else if gas_used < target {
                prop_assert!(next <= base_fee, "fee rose: {base_fee} -> {next}");
                prop_assert!(base_fee - next <= base_fee / 8);
            } else {
                prop_assert_eq!(next, base_fee);
            }
        }

        /// The fee never wraps, however large it gets.
        #[test]
        fn base_fee_never_wraps(
            target in 2_500..=30_000_000u64,
            base_fee in any::<u64>(),
        ) {
            let config = ProtocolConfig::default();
            let next = next_base_fee(&config, &parent(target, target * 2, base_fee));
            prop_assert!(next >= base_fee);
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 2. Sustained demand
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn congestion_strictly_raises_fee(
            base_fee in 0..=1_000_000_000_000u64,
            over_pct in 101..=200u64,
            num_blocks in 1..=64usize,
        ) {
            let config = ProtocolConfig::default();
            let target = 15_000_000u64;
            let usage = target * over_pct / 100;
            let fees = forecast_base_fees(
                &config,
                &parent(target, usage, base_fee),
                &vec![usage; num_blocks],
            );

            prop_assert_eq!(fees.len(), num_blocks);
            let mut previous = base_fee;
            for (i, &fee) in fees.iter().enumerate() {
                prop_assert!(fee > previous, "block {i}: {previous} -> {fee}");
                previous = fee;
            }
        }

        #[test]
        fn slack_never_raises_fee(
            base_fee in 0..=1_000_000_000_000u64,
            under_pct in 0..=99u64,
            num_blocks in 1..=64usize,
        ) {
            let config = ProtocolConfig::default();
            let target = 15_000_000u64;
            let usage = target * under_pct / 100;
            let fees = forecast_base_fees(
                &config,
                &parent(target, usage, base_fee),
                &vec![usage; num_blocks],
            );

            let mut previous = base_fee;
            for &fee in &fees {
                prop_assert!(fee <= previous);
                previous = fee;
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 3–4. Supply accounting and failure atomicity
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn execution_conserves_supply(
            tx in arb_transaction(),
            base_fee in 0..=100_000_000_000u64,
            alice_balance in 0..=100_000_000_000_000_000u64,
        ) {
            let config = ProtocolConfig::default();
            let block = Block::new(FORK_BLOCK_NUMBER, "0xparent", 30_000_000, base_fee, "0xMiner");
            let mut state = ledger(alice_balance);
            let before = state.clone();
            let supply_before = state.total_supply();

            let result = execute_transaction(&config.gas_schedule, &tx, &block, &mut state);

            if result.success {
                let sunk = if tx.is_contract_creation() { u128::from(tx.value) } else { 0 };
                prop_assert_eq!(
                    state.total_supply() + u128::from(result.burned) + sunk,
                    supply_before
                );
                prop_assert_eq!(
                    u128::from(result.burned),
                    u128::from(result.gas_used) * u128::from(base_fee)
                );
                prop_assert_eq!(
                    u128::from(result.tip),
                    u128::from(result.gas_used) * u128::from(tx.effective_priority_fee(base_fee))
                );
                prop_assert_eq!(state.balance("0xMiner"), result.tip);
                // The sender pays the effective price for metered gas plus the value.
                prop_assert_eq!(
                    u128::from(before.balance("0xAlice")) - u128::from(state.balance("0xAlice")),
                    u128::from(result.gas_used) * u128::from(tx.effective_gas_price(base_fee))
                        + u128::from(tx.value)
                );
                prop_assert_eq!(state.nonce("0xAlice"), 1);
            } else {
                prop_assert!(result.error.is_some());
                prop_assert_eq!((result.gas_used, result.burned, result.tip), (0, 0, 0));
                prop_assert_eq!(&state, &before);
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 5. Validator / executor agreement
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn validated_transaction_executes(
            tx in arb_transaction(),
            base_fee in 0..=100_000_000_000u64,
            headroom in 0..=1_000_000_000_000u64,
        ) {
            let config = ProtocolConfig::default();
            let tx = includable(tx, base_fee, &config);
            let block = Block::new(FORK_BLOCK_NUMBER, "0xparent", 30_000_000, base_fee, "0xMiner");
            let alice_balance = u64::try_from(tx.max_cost()).unwrap() + headroom;
            let mut state = ledger(alice_balance);

            prop_assert_eq!(validate_transaction(&tx, base_fee, &state), Ok(()));
            let result = execute_transaction(&config.gas_schedule, &tx, &block, &mut state);
            prop_assert!(result.success, "accepted tx failed: {:?}", result.error);
        }

        /// Whatever the sender pays per gas stays within both caps.
        #[test]
        fn effective_price_within_caps(
            tx in arb_transaction(),
            base_fee in 0..=100_000_000_000u64,
        ) {
            let tx = includable(tx, base_fee, &ProtocolConfig::default());
            let price = tx.effective_gas_price(base_fee);
            let tip = tx.effective_priority_fee(base_fee);

            prop_assert!(price <= tx.max_fee_per_gas);
            prop_assert!(price >= base_fee);
            prop_assert!(tip <= tx.max_priority_fee_per_gas);
            prop_assert_eq!(price - tip, base_fee);
        }
    }
}
