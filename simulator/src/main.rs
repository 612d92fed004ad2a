use {
    clap::{
        crate_description, crate_version, value_t, App, AppSettings, Arg, ArgMatches, SubCommand,
    },
    eip1559_fee_market::ProtocolConfig,
    log::{error, info},
    serde::Serialize,
    simulation::{
        forecast, load_config, parse_usages, SimError, Simulation, SimulationParams,
        DEFAULT_GAS_LIMIT,
    },
    std::{fmt, path::PathBuf, process::exit},
};

mod simulation;

// ── Command Enum ────────────────────────────────────────────────────
#[derive(Debug, PartialEq)]
enum SimCommand {
    Run(SimulationParams),
    Forecast {
        usages: Vec<u64>,
        start_base_fee: Option<u64>,
        gas_limit: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Display,
    DisplayVerbose,
    Json,
}

// ── App Definition (clap) ───────────────────────────────────────────
fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("fee-sim")
        .about(crate_description!())
        .version(crate_version!())
        .setting(AppSettings::VersionlessSubcommands)
        .arg(
            Arg::with_name("config")
                .long("config")
                .short("c")
                .value_name("FILE")
                .takes_value(true)
                .global(true)
                .help("TOML file overriding the protocol parameters"),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .global(true)
                .help("Print balances after every block and enable debug logging"),
        )
        .arg(
            Arg::with_name("output")
                .long("output")
                .value_name("FORMAT")
                .takes_value(true)
                .possible_values(&["display", "json"])
                .default_value("display")
                .global(true)
                .help("Output format"),
        )
        .arg(
            Arg::with_name("blocks")
                .long("blocks")
                .short("n")
                .value_name("COUNT")
                .takes_value(true)
                .default_value("10")
                .validator(is_u64)
                .help("Number of blocks to simulate"),
        )
        .arg(
            Arg::with_name("gas_used")
                .long("gas-used")
                .value_name("GAS")
                .takes_value(true)
                .default_value("15000000")
                .validator(is_u64)
                .help("Gas used per block (the target is half the gas limit)"),
        )
        .arg(gas_limit_arg())
        .subcommand(
            SubCommand::with_name("forecast")
                .about("Print the base fee path for a sequence of gas usages")
                .arg(
                    Arg::with_name("usages")
                        .index(1)
                        .value_name("GAS,GAS,...")
                        .takes_value(true)
                        .required(true)
                        .help("Comma-separated gas used by each hypothetical block"),
                )
                .arg(
                    Arg::with_name("base_fee")
                        .long("base-fee")
                        .value_name("WEI")
                        .takes_value(true)
                        .validator(is_u64)
                        .help("Starting base fee [default: the initial base fee]"),
                )
                .arg(gas_limit_arg()),
        )
}

fn gas_limit_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("gas_limit")
        .long("gas-limit")
        .value_name("GAS")
        .takes_value(true)
        .default_value("30000000")
        .validator(is_u64)
        .help("Block gas limit")
}

fn is_u64(value: String) -> Result<(), String> {
    value
        .parse::<u64>()
        .map(|_| ())
        .map_err(|err| format!("'{value}' is not a valid number: {err}"))
}

// ── Argument Parsing ────────────────────────────────────────────────
fn parse_command(matches: &ArgMatches<'_>) -> Result<SimCommand, SimError> {
    match matches.subcommand() {
        ("forecast", Some(matches)) => {
            let usages = parse_usages(matches.value_of("usages").unwrap_or_default())?;
            let start_base_fee = matches
                .value_of("base_fee")
                .map(|_| value_t!(matches, "base_fee", u64))
                .transpose()
                .map_err(|err| SimError::BadParameter(err.to_string()))?;
            let gas_limit = value_t!(matches, "gas_limit", u64).unwrap_or(DEFAULT_GAS_LIMIT);
            Ok(SimCommand::Forecast {
                usages,
                start_base_fee,
                gas_limit,
            })
        }
        _ => {
            let params = SimulationParams {
                blocks: value_t!(matches, "blocks", u64)
                    .map_err(|err| SimError::BadParameter(err.to_string()))?,
                gas_used: value_t!(matches, "gas_used", u64)
                    .map_err(|err| SimError::BadParameter(err.to_string()))?,
                gas_limit: value_t!(matches, "gas_limit", u64)
                    .map_err(|err| SimError::BadParameter(err.to_string()))?,
            };
            Ok(SimCommand::Run(params))
        }
    }
}

/// Global flags may be given before or after the subcommand.
fn global_matches<'a>(matches: &'a ArgMatches<'a>) -> &'a ArgMatches<'a> {
    matches.subcommand().1.unwrap_or(matches)
}

fn output_format(matches: &ArgMatches<'_>) -> OutputFormat {
    let matches = global_matches(matches);
    match (matches.value_of("output"), matches.is_present("verbose")) {
        (Some("json"), _) => OutputFormat::Json,
        (_, true) => OutputFormat::DisplayVerbose,
        _ => OutputFormat::Display,
    }
}

// ── Command Processing ──────────────────────────────────────────────
fn process_command(
    command: SimCommand,
    config: &ProtocolConfig,
    format: OutputFormat,
) -> Result<String, SimError> {
    match command {
        SimCommand::Run(params) => {
            info!(
                "simulating {} blocks with {} gas used per block",
                params.blocks, params.gas_used
            );
            let mut simulation = Simulation::new(config.clone(), params)?;
            let report = simulation.run();
            info!(
                "chain head {} ({}), tracked supply {} wei",
                simulation.head().number,
                simulation.head().hash,
                simulation.state().total_supply()
            );
            Ok(format_output(&report, format))
        }
        SimCommand::Forecast {
            usages,
            start_base_fee,
            gas_limit,
        } => {
            config.validate()?;
            let start_base_fee = start_base_fee.unwrap_or(config.initial_base_fee);
            let report = forecast(config, start_base_fee, gas_limit, &usages);
            Ok(format_output(&report, format))
        }
    }
}

fn format_output<T: Serialize + fmt::Display>(item: &T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(item)
            .unwrap_or_else(|err| format!("failed to serialize output: {err}")),
        OutputFormat::DisplayVerbose => format!("{item:#}"),
        OutputFormat::Display => format!("{item}"),
    }
}

fn run(matches: &ArgMatches<'_>) -> Result<String, SimError> {
    let config = match global_matches(matches).value_of("config") {
        Some(path) => load_config(&PathBuf::from(path))?,
        None => ProtocolConfig::default(),
    };
    let command = parse_command(matches)?;
    process_command(command, &config, output_format(matches))
}

fn main() {
    let matches = app().get_matches();

    let default_filter = if global_matches(&matches).is_present("verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(&matches) {
        Ok(output) => print!("{output}"),
        Err(err) => {
            error!("{err}");
            exit(1);
        }
    }
}
