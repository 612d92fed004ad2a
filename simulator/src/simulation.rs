//! Block-by-block driver over the fee market.
//!
//! Each simulated block carries one transfer from the sender to the
//! recipient. When the requested gas usage is larger than a transfer, filler
//! transactions make up the difference so the block lands on the requested
//! usage and the base fee reacts to it.
//!
//! Filler accounts are a synthetic gas source, not market participants: each
//! one is topped up to exactly its transaction's maximum cost before it is
//! validated. The top-ups are reported as `total_minted`, so
//! `supply_after = supply_before + total_minted - total_burned` holds for
//! every run.

use {
    eip1559_fee_market::{
        calculator::{forecast_base_fees, next_base_fee},
        executor::execute_block,
        validator::{validate_block, validate_transaction},
        Account, Block, BlockExecutionError, FeeMarketError, LedgerState, ProtocolConfig,
        Transaction,
    },
    log::{debug, info, warn},
    serde::Serialize,
    std::{
        fmt, fs, io,
        path::{Path, PathBuf},
    },
    thiserror::Error,
};

pub const SENDER: &str = "0xAlice";
pub const RECIPIENT: &str = "0xBob";
pub const MINER: &str = "0xMiner";
/// Address prefix of the accounts that pay for the gas topping a block up
/// to the requested usage: `0xFiller0`, `0xFiller1`, ...
pub const FILLER: &str = "0xFiller";

pub const DEFAULT_GAS_LIMIT: u64 = 30_000_000;

const SENDER_BALANCE: u64 = 10_000_000_000_000_000_000;
/// Upper bound on one filler transaction's `gas_limit × base_fee`. Keeps each
/// top-up inside a `u64` balance however high the fee climbs.
const FILLER_MAX_COST: u64 = 9_000_000_000_000_000_000;
const CHAIN_ID: u64 = 1;
const TIP: u64 = 2_000_000_000;
/// The transfer's fee cap is the block's base fee plus this much.
const FEE_HEADROOM: u64 = 5_000_000_000;
const TRANSFER_VALUE: u64 = 1_000;
const BLOCK_TIME_SECS: u64 = 12;
const WEI_PER_GWEI: f64 = 1_000_000_000.0;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("failed to read config {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    FeeMarket(#[from] FeeMarketError),

    #[error(transparent)]
    Execution(#[from] BlockExecutionError),

    #[error("bad parameter: {0}")]
    BadParameter(String),
}

/// Load protocol parameters from a TOML file. Missing keys keep their
/// defaults; the result is validated before it is returned.
pub fn load_config(path: &Path) -> Result<ProtocolConfig, SimError> {
    let contents = fs::read_to_string(path).map_err(|source| SimError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&contents).map_err(|err| match err {
        SimError::ParseConfig { source, .. } => SimError::ParseConfig {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    info!("loaded protocol config from {}", path.display());
    Ok(config)
}

fn parse_config(contents: &str) -> Result<ProtocolConfig, SimError> {
    let config: ProtocolConfig =
        toml::from_str(contents).map_err(|source| SimError::ParseConfig {
            path: PathBuf::new(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

/// Parse a comma-separated list of gas usages, e.g. `"30000000,0,15000000"`.
pub fn parse_usages(list: &str) -> Result<Vec<u64>, SimError> {
    let usages = list
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<u64>()
                .map_err(|_| SimError::BadParameter(format!("invalid gas usage '{item}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if usages.is_empty() {
        return Err(SimError::BadParameter("no gas usages given".to_string()));
    }
    Ok(usages)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationParams {
    pub blocks: u64,
    /// Gas each block should consume. Never less than one transfer.
    pub gas_used: u64,
    pub gas_limit: u64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            blocks: 10,
            gas_used: 15_000_000,
            gas_limit: DEFAULT_GAS_LIMIT,
        }
    }
}

pub struct Simulation {
    config: ProtocolConfig,
    params: SimulationParams,
    state: LedgerState,
    head: Block,
    /// Wei credited to filler accounts so far.
    minted: u128,
}

impl Simulation {
    pub fn new(config: ProtocolConfig, params: SimulationParams) -> Result<Self, SimError> {
        config.validate()?;
        if params.gas_used > params.gas_limit {
            return Err(SimError::BadParameter(format!(
                "gas used {} exceeds gas limit {}",
                params.gas_used, params.gas_limit
            )));
        }
        if params.gas_limit < config.min_gas_limit {
            return Err(SimError::BadParameter(format!(
                "gas limit {} below protocol minimum {}",
                params.gas_limit, config.min_gas_limit
            )));
        }

        let mut state = LedgerState::new();
        for account in [
            Account::new(SENDER, SENDER_BALANCE),
            Account::new(RECIPIENT, 0),
            Account::new(MINER, 0),
        ] {
            state.set_account(account);
        }

        // The activation block is the genesis block's child, so the first
        // simulated block starts at the initial base fee.
        let genesis = Block {
            number: config.fork_block_number.saturating_sub(1),
            hash: "0xgenesis".to_string(),
            gas_limit: params.gas_limit,
            gas_used: config.target_gas(params.gas_limit),
            base_fee: config.initial_base_fee,
            miner: MINER.into(),
            ..Block::default()
        };

        Ok(Self {
            config,
            params,
            state,
            head: genesis,
            minted: 0,
        })
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// The last block that was accepted.
    pub fn head(&self) -> &Block {
        &self.head
    }

    /// Run `params.blocks` blocks. A block that fails validation is logged
    /// and skipped; the chain head stays where it was.
    pub fn run(&mut self) -> SimulationReport {
        let mut report = SimulationReport::default();

        for _ in 0..self.params.blocks {
            match self.step() {
                Ok(block) => report.blocks.push(block),
                Err(err) => {
                    warn!(
                        "block {} skipped: {err}",
                        self.head.number.saturating_add(1)
                    );
                    report.skipped = report.skipped.saturating_add(1);
                }
            }
        }

        for block in &report.blocks {
            report.total_burned = report.total_burned.saturating_add(block.burned);
            report.total_tips = report.total_tips.saturating_add(block.tips);
        }
        report.total_minted = self.minted;
        report.final_base_fee = self.head.base_fee;
        report.balances = [SENDER, RECIPIENT, MINER]
            .into_iter()
            .map(|address| AccountBalance {
                address: address.to_string(),
                balance: self.state.balance(address),
            })
            .collect();

        info!(
            "simulated {} blocks ({} skipped): burned={} tips={} minted={} final_base_fee={}",
            report.blocks.len(),
            report.skipped,
            report.total_burned,
            report.total_tips,
            report.total_minted,
            report.final_base_fee
        );
        report
    }

    /// Build, validate and execute the next block on top of the head.
    pub fn step(&mut self) -> Result<BlockReport, SimError> {
        let base_fee = next_base_fee(&self.config, &self.head);
        let number = self.head.number.saturating_add(1);

        let mut block = Block::new(
            number,
            self.head.hash.clone(),
            self.params.gas_limit,
            base_fee,
            MINER,
        );
        block.hash = format!("0xblock{number}");
        block.timestamp = self.head.timestamp.saturating_add(BLOCK_TIME_SECS);

        let transfer = Transaction {
            chain_id: CHAIN_ID,
            nonce: self.state.nonce(SENDER),
            max_priority_fee_per_gas: TIP,
            max_fee_per_gas: base_fee.saturating_add(FEE_HEADROOM),
            gas_limit: self.config.gas_schedule.tx_base_gas,
            to: Some(RECIPIENT.into()),
            value: TRANSFER_VALUE,
            data: Vec::new(),
            from: SENDER.into(),
        };
        validate_transaction(&transfer, base_fee, &self.state)?;
        block.add_transaction(transfer)?;

        for filler in self.fillers(base_fee, block.gas_used)? {
            block.add_transaction(filler)?;
        }
        validate_block(&self.config, &block, &self.head)?;

        // Everything after the transfer is filler; fund it once the block is valid.
        let mut minted = 0u128;
        for filler in block.transactions.iter().skip(1) {
            minted = minted.saturating_add(self.top_up(filler)?);
            validate_transaction(filler, base_fee, &self.state)?;
        }
        let results = execute_block(&self.config.gas_schedule, &block, &mut self.state)?;

        let (burned, tips) = results.iter().fold((0u128, 0u128), |(burned, tips), r| {
            (
                burned.saturating_add(u128::from(r.burned)),
                tips.saturating_add(u128::from(r.tip)),
            )
        });
        debug!(
            "block {number}: base_fee={base_fee} gas_used={} burned={burned} tips={tips} \
             minted={minted}",
            block.gas_used
        );

        let report = BlockReport {
            number,
            base_fee,
            gas_used: block.gas_used,
            gas_limit: block.gas_limit,
            utilization: block.utilization(),
            transactions: results.len(),
            burned,
            tips,
            sender_balance: self.state.balance(SENDER),
            miner_balance: self.state.balance(MINER),
        };
        self.head = block;
        Ok(report)
    }

    /// Contract-creation style transactions whose payloads consume the gas
    /// between `gas_used` and the requested usage. Empty when the gap is
    /// smaller than a bare transaction.
    ///
    /// The gap is split evenly into as few transactions as keep each one's
    /// maximum cost within `FILLER_MAX_COST`, one filler account apiece.
    fn fillers(&self, base_fee: u64, gas_used: u64) -> Result<Vec<Transaction>, SimError> {
        let schedule = &self.config.gas_schedule;
        let gap = self.params.gas_used.saturating_sub(gas_used);
        if gap < schedule.tx_base_gas {
            return Ok(Vec::new());
        }

        let too_expensive = || {
            SimError::BadParameter(format!(
                "base fee {base_fee} too high to fill {gap} gas within the filler budget"
            ))
        };
        let max_gas = FILLER_MAX_COST.checked_div(base_fee).unwrap_or(u64::MAX);
        if max_gas < schedule.tx_base_gas.max(1) {
            return Err(too_expensive());
        }
        let count = gap.div_ceil(max_gas);
        let share = gap.checked_div(count).unwrap_or(gap);
        let remainder = gap.checked_rem(count).unwrap_or(0);
        if share < schedule.tx_base_gas {
            return Err(too_expensive());
        }

        let fillers = (0..count)
            .map(|index| {
                let gas_limit = if index < remainder {
                    share.saturating_add(1)
                } else {
                    share
                };
                let data_len = gas_limit
                    .saturating_sub(schedule.tx_base_gas)
                    .checked_div(schedule.data_gas_per_byte)
                    .unwrap_or(0);
                let from = format!("{FILLER}{index}");

                Transaction {
                    chain_id: CHAIN_ID,
                    nonce: self.state.nonce(&from),
                    max_priority_fee_per_gas: 0,
                    max_fee_per_gas: base_fee,
                    gas_limit,
                    to: None,
                    value: 0,
                    data: vec![0; usize::try_from(data_len).unwrap_or(0)],
                    from: from.into(),
                }
            })
            .collect();
        Ok(fillers)
    }

    /// Credit the filler's account up to its transaction's maximum cost and
    /// return the amount credited.
    fn top_up(&mut self, filler: &Transaction) -> Result<u128, SimError> {
        let max_cost = u64::try_from(filler.max_cost()).map_err(|_| FeeMarketError::Overflow)?;
        let account = self.state.get_account_mut(filler.from.as_str());
        let shortfall = max_cost.saturating_sub(account.balance);
        account.credit(shortfall)?;
        self.minted = self.minted.saturating_add(u128::from(shortfall));
        Ok(u128::from(shortfall))
    }
}

/// Base fee path for a list of hypothetical gas usages, starting from a
/// post-activation block at `start_base_fee` that sat exactly on target.
pub fn forecast(
    config: &ProtocolConfig,
    start_base_fee: u64,
    gas_limit: u64,
    usages: &[u64],
) -> ForecastReport {
    let start = Block {
        number: config.fork_block_number,
        gas_limit,
        gas_used: config.target_gas(gas_limit),
        base_fee: start_base_fee,
        ..Block::default()
    };

    let rows: Vec<ForecastRow> = forecast_base_fees(config, &start, usages)
        .into_iter()
        .zip(usages)
        .zip(1u64..)
        .map(|((base_fee, &gas_used), offset)| ForecastRow {
            offset,
            base_fee,
            gas_used,
            utilization: utilization(gas_used, gas_limit),
        })
        .collect();

    let next_base_fee = rows.last().map_or(start_base_fee, |last| {
        next_base_fee(
            config,
            &Block {
                number: start.number.saturating_add(last.offset),
                gas_limit,
                gas_used: last.gas_used,
                base_fee: last.base_fee,
                ..Block::default()
            },
        )
    });

    ForecastReport {
        gas_limit,
        target: config.target_gas(gas_limit),
        rows,
        next_base_fee,
    }
}

fn utilization(gas_used: u64, gas_limit: u64) -> f64 {
    if gas_limit == 0 {
        return 0.0;
    }
    gas_used as f64 / gas_limit as f64 * 100.0
}

fn gwei(wei: u64) -> f64 {
    wei as f64 / WEI_PER_GWEI
}

// ── Output Structs ──────────────────────────────────────────────────

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BlockReport {
    pub number: u64,
    pub base_fee: u64,
    pub gas_used: u64,
    pub gas_limit: u64,
    pub utilization: f64,
    pub transactions: usize,
    pub burned: u128,
    pub tips: u128,
    pub sender_balance: u64,
    pub miner_balance: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountBalance {
    pub address: String,
    pub balance: u64,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct SimulationReport {
    pub blocks: Vec<BlockReport>,
    pub skipped: u64,
    pub total_burned: u128,
    pub total_tips: u128,
    /// Wei credited to filler accounts to pay for their gas.
    pub total_minted: u128,
    pub final_base_fee: u64,
    pub balances: Vec<AccountBalance>,
}

/// `{}` prints the block table and summary; `{:#}` adds per-block balances.
impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<10} | {:>14} | {:>12} | {:>8} | {:>18} | {:>18}",
            "Block", "Base Fee", "Gas Used", "Usage", "Burned", "Tips"
        )?;
        writeln!(f, "{}", "-".repeat(95))?;
        for block in &self.blocks {
            writeln!(
                f,
                "{:<10} | {:>14} | {:>12} | {:>7.2}% | {:>18} | {:>18}",
                block.number,
                block.base_fee,
                block.gas_used,
                block.utilization,
                block.burned,
                block.tips
            )?;
            if f.alternate() {
                writeln!(f, "    Sender balance: {}", block.sender_balance)?;
                writeln!(f, "    Miner balance:  {}", block.miner_balance)?;
                writeln!(
                    f,
                    "    Gas used:       {} / {}",
                    block.gas_used, block.gas_limit
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Summary")?;
        writeln!(f, "  Blocks simulated:  {}", self.blocks.len())?;
        if self.skipped > 0 {
            writeln!(f, "  Blocks skipped:    {}", self.skipped)?;
        }
        writeln!(f, "  Total burned:      {} wei", self.total_burned)?;
        writeln!(f, "  Total tips:        {} wei", self.total_tips)?;
        writeln!(f, "  Filler minted:     {} wei", self.total_minted)?;
        writeln!(
            f,
            "  Final base fee:    {} wei ({:.2} gwei)",
            self.final_base_fee,
            gwei(self.final_base_fee)
        )?;
        writeln!(f)?;
        writeln!(f, "Final balances")?;
        for account in &self.balances {
            writeln!(f, "  {:<12} {} wei", account.address, account.balance)?;
        }
        Ok(())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ForecastRow {
    /// Blocks after the starting block.
    pub offset: u64,
    pub base_fee: u64,
    pub gas_used: u64,
    pub utilization: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ForecastReport {
    pub gas_limit: u64,
    pub target: u64,
    pub rows: Vec<ForecastRow>,
    /// Base fee of the block after the last row.
    pub next_base_fee: u64,
}

impl fmt::Display for ForecastReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Base fee forecast (gas limit {}, target {})",
            self.gas_limit, self.target
        )?;
        writeln!(
            f,
            "  {:<6} {:>14} {:>12} {:>12} {:>8}",
            "Block", "Base Fee", "Gwei", "Gas Used", "Usage"
        )?;
        writeln!(f, "  {}", "-".repeat(56))?;
        for row in &self.rows {
            writeln!(
                f,
                "  +{:<5} {:>14} {:>12.4} {:>12} {:>7.2}%",
                row.offset,
                row.base_fee,
                gwei(row.base_fee),
                row.gas_used,
                row.utilization
            )?;
        }
        writeln!(
            f,
            "  Next base fee: {} wei ({:.4} gwei)",
            self.next_base_fee,
            gwei(self.next_base_fee)
        )?;
        Ok(())
    }
}
