#![deny(clippy::all)]

#[macro_use]
extern crate log;

use crate::config::Configuration;
use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, ArgMatches, Command};
use coupon_loadtest::report::{PercentileReport, Percentiles};
use coupon_loadtest::{IssueEndpoint, LoadTestError};
use env_logger::Builder;
use goose::config::GooseConfiguration;
use goose::metrics::GooseMetrics;
use goose::prelude::*;
use gumdrop::Options;
use log::LevelFilter;
use std::process;
use thiserror::Error;

mod config;

const LOADTEST_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("COUPON_LOADTEST_GIT_HASH"),
    ") ",
    env!("COUPON_LOADTEST_PROFILE"),
);

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("invalid value for {name}: '{value}'")]
    Config { name: &'static str, value: String },
    #[error("invalid goose arguments: {0}")]
    GooseArgs(String),
    #[error("{0}")]
    LoadTest(#[from] LoadTestError),
    #[error("load test failed: {0}")]
    Goose(#[from] GooseError),
}

fn cmdline() -> Command {
    Command::new("Coupon Issuance Load Test")
        .version(LOADTEST_VERSION)
        .about("Goose load test against the coupon issuance API")
        .after_help("Arguments after `--` go to goose, e.g. `-- --host http://coupon-api:8080 --users 500 --run-time 10m`")
        .arg(
            Arg::new("config_from_env")
                .short('E')
                .long("use-env-vars")
                .action(ArgAction::SetTrue)
                .help("Sets the load test up from ENV VARS instead of these options")
                .exclusive(true),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .default_value(Configuration::DEFAULT_ENDPOINT)
                .value_parser(PossibleValuesParser::new(["v0", "v1", "v3"]))
                .display_order(1)
                .help("Issuance API version to hit"),
        )
        .arg(
            Arg::new("coupon_id")
                .long("coupon-id")
                .default_value(Configuration::DEFAULT_COUPON_ID)
                .value_parser(clap::value_parser!(u64))
                .display_order(2)
                .help("Coupon to issue on every request"),
        )
        .arg(
            Arg::new("min_user_id")
                .long("min-user-id")
                .default_value(Configuration::DEFAULT_MIN_USER_ID)
                .value_parser(clap::value_parser!(u64))
                .display_order(3)
                .help("Lowest user id drawn, inclusive"),
        )
        .arg(
            Arg::new("max_user_id")
                .long("max-user-id")
                .default_value(Configuration::DEFAULT_MAX_USER_ID)
                .value_parser(clap::value_parser!(u64))
                .display_order(4)
                .help("Highest user id drawn, inclusive"),
        )
        .arg(
            Arg::new("connection_timeout")
                .long("connection-timeout")
                .default_value(Configuration::DEFAULT_TIMEOUT_SEC)
                .value_parser(clap::value_parser!(f64))
                .display_order(5)
                .help("Seconds to wait for a connection to be established"),
        )
        .arg(
            Arg::new("network_timeout")
                .long("network-timeout")
                .default_value(Configuration::DEFAULT_TIMEOUT_SEC)
                .value_parser(clap::value_parser!(f64))
                .display_order(6)
                .help("Seconds to wait for a response"),
        )
        .arg(
            Arg::new("percentiles")
                .long("percentiles")
                .default_value(Configuration::DEFAULT_PERCENTILES)
                .value_parser(|s: &str| s.parse::<Percentiles>().map_err(|e| e.to_string()))
                .display_order(7)
                .help("Latency percentiles to chart after the run"),
        )
        .arg(
            Arg::new("v")
                .short('v')
                .action(ArgAction::Count)
                .display_order(8)
                .help("Sets the level of verbosity"),
        )
        .arg(
            Arg::new("goose_args")
                .num_args(0..)
                .last(true)
                .allow_hyphen_values(true)
                .value_name("GOOSE_ARGS")
                .help("Forwarded to goose"),
        )
}

fn config_from_matches(matches: &ArgMatches) -> Result<Configuration, RunnerError> {
    if matches.get_flag("config_from_env") {
        return Configuration::from_env();
    }

    Ok(Configuration::with(
        arg(matches, "endpoint", |s: &String| s.parse().ok())?,
        arg(matches, "coupon_id", |v: &u64| Some(*v))?,
        arg(matches, "min_user_id", |v: &u64| Some(*v))?,
        arg(matches, "max_user_id", |v: &u64| Some(*v))?,
        arg(matches, "connection_timeout", |v: &f64| Some(*v))?,
        arg(matches, "network_timeout", |v: &f64| Some(*v))?,
        arg(matches, "percentiles", |p: &Percentiles| Some(p.clone()))?,
        matches
            .get_many::<String>("goose_args")
            .map(|args| args.cloned().collect())
            .unwrap_or_default(),
    ))
}

fn arg<T, U>(
    matches: &ArgMatches,
    id: &'static str,
    convert: impl FnOnce(&T) -> Option<U>,
) -> Result<U, RunnerError>
where
    T: Clone + Send + Sync + 'static,
{
    matches
        .get_one::<T>(id)
        .and_then(convert)
        .ok_or_else(|| RunnerError::Config {
            name: id,
            value: String::new(),
        })
}

fn level_filter(occurrences: u8) -> LevelFilter {
    match occurrences {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        3 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

async fn run(config: &Configuration) -> Result<GooseMetrics, RunnerError> {
    let behavior = config.behavior()?;
    let goose_config = GooseConfiguration::parse_args_default(&config.goose_args)
        .map_err(|e| RunnerError::GooseArgs(e.to_string()))?;

    info!(
        "Scenario {} posting to {}",
        behavior.scenario_name(),
        behavior.endpoint().path()
    );

    let metrics = GooseAttack::initialize_with_config(goose_config)?
        .register_scenario(behavior.scenario())
        .set_default(GooseDefault::Host, Configuration::DEFAULT_HOST)?
        .set_default(
            GooseDefault::CoordinatedOmissionMitigation,
            GooseCoordinatedOmissionMitigation::Average,
        )?
        .execute()
        .await?;

    Ok(metrics)
}

fn endpoint_summary(report: &PercentileReport, endpoint: IssueEndpoint) -> String {
    match report.row(&endpoint.metric_name()) {
        Some(row) => format!(
            "{}: {} requests, {:.1}% failed",
            row.name,
            row.requests,
            row.failure_rate() * 100.0
        ),
        None => format!("{}: no requests recorded", endpoint.metric_name()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cmdline().get_matches();

    let config = match config_from_matches(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1)
        }
    };

    let mut builder = Builder::new();
    builder
        .filter(None, level_filter(matches.get_count("v")))
        .parse_default_env()
        .init();

    info!("Using config: {:?}", config);

    let metrics = match run(&config).await {
        Ok(metrics) => metrics,
        Err(RunnerError::Goose(e)) => return Err(Box::new(e) as Box<dyn std::error::Error>),
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1)
        }
    };

    let report = PercentileReport::from_metrics(&metrics, &config.report_config());
    info!("{}", endpoint_summary(&report, config.endpoint));
    for row in report.rows() {
        if row.failures > 0 {
            warn!(
                "{}: {} of {} requests failed ({:.1}%)",
                row.name,
                row.failures,
                row.requests,
                row.failure_rate() * 100.0
            );
        }
    }
    println!("{}", report);

    Ok(())
}
