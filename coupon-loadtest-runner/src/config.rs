// ISSUE_ENDPOINT: enum IssueEndpoint { v0, v1, v3 }
//
// COUPON_ID: u64
//
// USER_ID_MIN: u64
// USER_ID_MAX: u64
//
// CONNECTION_TIMEOUT_SECONDS: f64 -> Duration
// NETWORK_TIMEOUT_SECONDS: f64 -> Duration
//
// PERCENTILES_TO_CHART: comma separated fractions, e.g. "0.95,0.99"
//
// GOOSE_ARGS: whitespace separated, handed to goose as is ("--users 100 --run-time 5m")

use crate::RunnerError;
use coupon_loadtest::report::{Percentiles, ReportConfig};
use coupon_loadtest::request::IssueRequestGenerator;
use coupon_loadtest::{ClientTimeouts, IssueEndpoint, IssueUserBehavior, LoadTestError};
use std::env;
use std::str::FromStr;

#[derive(Debug, PartialEq)]
pub struct Configuration {
    pub endpoint: IssueEndpoint,
    pub coupon_id: u64,
    pub min_user_id: u64,
    pub max_user_id: u64,
    pub connection_timeout: f64,
    pub network_timeout: f64,
    pub percentiles: Percentiles,
    pub goose_args: Vec<String>,
}

impl Configuration {
    pub const DEFAULT_ENDPOINT: &'static str = "v0";
    pub const DEFAULT_COUPON_ID: &'static str = "1";
    pub const DEFAULT_MIN_USER_ID: &'static str = "1";
    pub const DEFAULT_MAX_USER_ID: &'static str = "10000000";
    pub const DEFAULT_TIMEOUT_SEC: &'static str = "10.0";
    pub const DEFAULT_PERCENTILES: &'static str = "0.95,0.99";
    pub const DEFAULT_HOST: &'static str = "http://localhost:8080";

    pub fn from_env() -> Result<Self, RunnerError> {
        Ok(Self {
            endpoint: env_or("ISSUE_ENDPOINT", Self::DEFAULT_ENDPOINT)?,
            coupon_id: env_or("COUPON_ID", Self::DEFAULT_COUPON_ID)?,
            min_user_id: env_or("USER_ID_MIN", Self::DEFAULT_MIN_USER_ID)?,
            max_user_id: env_or("USER_ID_MAX", Self::DEFAULT_MAX_USER_ID)?,
            connection_timeout: env_or("CONNECTION_TIMEOUT_SECONDS", Self::DEFAULT_TIMEOUT_SEC)?,
            network_timeout: env_or("NETWORK_TIMEOUT_SECONDS", Self::DEFAULT_TIMEOUT_SEC)?,
            percentiles: env_or("PERCENTILES_TO_CHART", Self::DEFAULT_PERCENTILES)?,
            goose_args: env::var("GOOSE_ARGS")
                .map(|args| args.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with(
        endpoint: IssueEndpoint,
        coupon_id: u64,
        min_user_id: u64,
        max_user_id: u64,
        connection_timeout: f64,
        network_timeout: f64,
        percentiles: Percentiles,
        goose_args: Vec<String>,
    ) -> Self {
        Self {
            endpoint,
            coupon_id,
            min_user_id,
            max_user_id,
            connection_timeout,
            network_timeout,
            percentiles,
            goose_args,
        }
    }

    pub fn behavior(&self) -> Result<IssueUserBehavior, LoadTestError> {
        Ok(IssueUserBehavior::new(
            self.endpoint,
            IssueRequestGenerator::new(self.min_user_id, self.max_user_id, self.coupon_id)?,
            ClientTimeouts::new(self.connection_timeout, self.network_timeout)?,
        ))
    }

    pub fn report_config(&self) -> ReportConfig {
        ReportConfig::new(self.percentiles.clone())
    }
}

fn env_or<T: FromStr>(name: &'static str, default: &str) -> Result<T, RunnerError> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    value
        .parse()
        .map_err(|_| RunnerError::Config { name, value })
}
