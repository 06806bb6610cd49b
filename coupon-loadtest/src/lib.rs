//! Coupon issuance load test, built on [goose](https://docs.rs/goose).
//!
//! # Basic operation
//!
//! Every virtual user goose spawns runs an [`IssueUserBehavior`]: once at
//! start it swaps in an HTTP client bounded by the configured connection and
//! network timeouts, then it keeps posting issuance requests for random users
//! until the run ends. Goose owns everything else: user count, hatch rate,
//! run time, target host and the metrics.
//!
//! ```no_run
//! use coupon_loadtest::IssueUserBehavior;
//! use goose::prelude::*;
//!
//! # async fn run() -> Result<(), GooseError> {
//! GooseAttack::initialize()?
//!     .register_scenario(IssueUserBehavior::default().scenario())
//!     .set_default(GooseDefault::Host, "http://localhost:8080")?
//!     .execute()
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Requests
//!
//! Each call posts a fresh body to `/v0/issue` (or the configured endpoint):
//!
//! ```
//! use coupon_loadtest::request::IssueRequestGenerator;
//!
//! let generator = IssueRequestGenerator::default();
//! let request = generator.generate();
//! assert!((1..=10_000_000).contains(&request.user_id));
//! assert_eq!(request.coupon_id, 1);
//! ```
//!
//! # Reporting
//!
//! Which latency percentiles get charted after the run is explicit
//! configuration, 95th and 99th by default:
//!
//! ```
//! use coupon_loadtest::report::{Percentiles, ReportConfig};
//!
//! let config = ReportConfig::new("0.5,0.95,0.99".parse::<Percentiles>().unwrap());
//! assert_eq!(config.percentiles.labels(), vec!["p50", "p95", "p99"]);
//! ```

#![deny(clippy::all)]

#[macro_use]
extern crate log;

pub use behavior::{ClientTimeouts, IssueEndpoint, IssueUserBehavior};
pub use errors::LoadTestError;

pub mod behavior;
pub mod errors;
pub mod report;
pub mod request;
