//! # EIP-1559 Fee Market
//!
//! A reference engine for the **EIP-1559 base fee market**.
//!
//! Every block carries a **base fee per gas** that is derived from how full
//! its parent was and is **burned** for every unit of gas consumed. Senders
//! cap what they pay with `max_fee_per_gas` and add a **priority fee** (tip)
//! that goes to the block's miner.
//!
//! The crate is split the way a block is processed:
//!
//! * [`calculator`]: parent block → next base fee (pure).
//! * [`validator`]: transaction and block rule checks (pure).
//! * [`executor`]: applies a transaction to the [`LedgerState`], burning the
//!   base fee and paying the tip.
//!
//! ## Quick start
//!
//! ```rust
//! use eip1559_fee_market::{
//!     calculator, executor, validator, Account, Block, LedgerState, ProtocolConfig, Transaction,
//! };
//!
//! let config = ProtocolConfig::default();
//!
//! let mut state = LedgerState::new();
//! state.set_account(Account::new("0xAlice", 1_000_000_000_000_000));
//!
//! // The parent used 20 M of 30 M gas (above the 15 M target).
//! let parent = Block {
//!     number: config.fork_block_number,
//!     hash: "0xparent".to_string(),
//!     gas_limit: 30_000_000,
//!     gas_used: 20_000_000,
//!     base_fee: config.initial_base_fee,
//!     ..Block::default()
//! };
//!
//! let base_fee = calculator::next_base_fee(&config, &parent);
//! assert!(base_fee > parent.base_fee, "base fee should rise");
//!
//! let tx = Transaction {
//!     from: "0xAlice".into(),
//!     to: Some("0xBob".into()),
//!     max_priority_fee_per_gas: 2_000_000_000,
//!     max_fee_per_gas: base_fee + 5_000_000_000,
//!     gas_limit: 21_000,
//!     value: 1_000,
//!     ..Transaction::default()
//! };
//! validator::validate_transaction(&tx, base_fee, &state).unwrap();
//!
//! let mut block = Block::new(parent.number + 1, "0xparent", 30_000_000, base_fee, "0xMiner");
//! block.add_transaction(tx.clone()).unwrap();
//! validator::validate_block(&config, &block, &parent).unwrap();
//!
//! let supply_before = state.total_supply();
//! let result = executor::execute_transaction(&config.gas_schedule, &tx, &block, &mut state);
//! assert!(result.success);
//! assert_eq!(state.total_supply(), supply_before - u128::from(result.burned));
//! ```
//!
//! See [`calculator`] for the base fee formula and [`config`] for the
//! protocol parameters.

pub mod block;
pub mod calculator;
pub mod config;
pub mod error;
pub mod executor;
pub mod state;
pub mod transaction;
pub mod validator;


// Re-exports for convenience.
pub use {
    block::Block,
    config::{GasSchedule, ProtocolConfig},
    error::{BlockExecutionError, FeeMarketError},
    executor::{ExecutionResult, GasModel},
    state::{Account, Address, LedgerState},
    transaction::Transaction,
};
