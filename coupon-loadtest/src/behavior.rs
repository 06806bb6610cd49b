use crate::errors::LoadTestError;
use crate::request::{IssueRequest, IssueRequestGenerator};
use goose::goose::{GooseMethod, GooseRequest, GooseResponse};
use goose::prelude::*;
use reqwest::{Client, ClientBuilder};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CONNECTION_TIMEOUT_SEC: f64 = 10.0;
pub const DEFAULT_NETWORK_TIMEOUT_SEC: f64 = 10.0;

const USER_AGENT: &str = concat!("coupon-loadtest/", env!("CARGO_PKG_VERSION"));

/// Version of the issuance API to hit. All of them take the same body.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum IssueEndpoint {
    /// Synchronous issuance, locks the coupon row.
    #[default]
    V0,
    /// Asynchronous issuance, requests are queued.
    V1,
    /// Asynchronous issuance, admission checked in a single script call.
    V3,
}

impl IssueEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            IssueEndpoint::V0 => "/v0/issue",
            IssueEndpoint::V1 => "/v1/issue",
            IssueEndpoint::V3 => "/v3/issue",
        }
    }

    /// Key of this endpoint's requests in goose's aggregated metrics.
    pub fn metric_name(&self) -> String {
        format!("POST {}", self.path())
    }
}

impl Display for IssueEndpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IssueEndpoint::V0 => "v0",
            IssueEndpoint::V1 => "v1",
            IssueEndpoint::V3 => "v3",
        };
        write!(f, "{name}")
    }
}

impl FromStr for IssueEndpoint {
    type Err = LoadTestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v0" => Ok(IssueEndpoint::V0),
            "v1" => Ok(IssueEndpoint::V1),
            "v3" => Ok(IssueEndpoint::V3),
            _ => Err(LoadTestError::Endpoint(s.to_string())),
        }
    }
}

/// Connection level bounds applied to every request a user makes. A request
/// exceeding either one is recorded by goose as a failed sample.
///
/// `connection` bounds establishing the TCP (and TLS) connection. `network` is
/// a deadline for the whole request, from connecting until the response body
/// is read; it is not reset by each chunk received, so a response trickling in
/// slower than `network` in total fails even if no single read stalls.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ClientTimeouts {
    connection: Duration,
    network: Duration,
}

impl ClientTimeouts {
    pub fn new(connection_sec: f64, network_sec: f64) -> Result<Self, LoadTestError> {
        Ok(Self {
            connection: timeout_from_secs("connection", connection_sec)?,
            network: timeout_from_secs("network", network_sec)?,
        })
    }

    pub fn from_durations(connection: Duration, network: Duration) -> Self {
        Self {
            connection,
            network,
        }
    }

    pub fn connection(&self) -> Duration {
        self.connection
    }

    pub fn network(&self) -> Duration {
        self.network
    }
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            connection: Duration::from_secs_f64(DEFAULT_CONNECTION_TIMEOUT_SEC),
            network: Duration::from_secs_f64(DEFAULT_NETWORK_TIMEOUT_SEC),
        }
    }
}

fn timeout_from_secs(name: &'static str, seconds: f64) -> Result<Duration, LoadTestError> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(LoadTestError::Timeout { name, seconds });
    }
    Ok(Duration::from_secs_f64(seconds))
}

/// What a single virtual user does: configure its client once, then issue
/// coupons for as long as goose keeps scheduling it.
#[derive(Debug, Clone, Default)]
pub struct IssueUserBehavior {
    endpoint: IssueEndpoint,
    generator: IssueRequestGenerator,
    timeouts: ClientTimeouts,
}

impl IssueUserBehavior {
    pub const CONFIGURE_CLIENT: &'static str = "configure_client";
    pub const ISSUE: &'static str = "issue";

    pub fn new(
        endpoint: IssueEndpoint,
        generator: IssueRequestGenerator,
        timeouts: ClientTimeouts,
    ) -> Self {
        Self {
            endpoint,
            generator,
            timeouts,
        }
    }

    pub fn endpoint(&self) -> IssueEndpoint {
        self.endpoint
    }

    pub fn generator(&self) -> &IssueRequestGenerator {
        &self.generator
    }

    pub fn timeouts(&self) -> ClientTimeouts {
        self.timeouts
    }

    pub fn scenario_name(&self) -> String {
        format!("CouponIssue{}", self.endpoint.to_string().to_uppercase())
    }

    pub fn client_builder(&self) -> ClientBuilder {
        Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .gzip(true)
            .connect_timeout(self.timeouts.connection)
            .timeout(self.timeouts.network)
    }

    /// Swaps the user's default client for one bounded by our timeouts.
    pub async fn configure_client(&self, user: &mut GooseUser) -> TransactionResult {
        user.set_client_builder(self.client_builder()).await?;
        debug!(
            "client for {} configured: connect {:?}, network {:?}",
            user.base_url, self.timeouts.connection, self.timeouts.network
        );
        Ok(())
    }

    /// Issues one coupon to a freshly drawn user. Failures are goose's to
    /// count; nothing is retried.
    pub async fn issue(&self, user: &mut GooseUser) -> TransactionResult {
        let request = self.generator.generate();
        let _goose = self.send_issue(user, &request).await?;

        Ok(())
    }

    pub async fn send_issue(
        &self,
        user: &mut GooseUser,
        request: &IssueRequest,
    ) -> Result<GooseResponse, Box<TransactionError>> {
        trace!(
            "POST {} userId={} couponId={}",
            self.endpoint.path(),
            request.user_id,
            request.coupon_id
        );
        // Named after the path, otherwise goose files the sample under the
        // transaction name.
        let path = self.endpoint.path();
        let request_builder = user.get_request_builder(&GooseMethod::Post, path)?;
        let goose_request = GooseRequest::builder()
            .method(GooseMethod::Post)
            .path(path)
            .name(path)
            .set_request_builder(request_builder.json(request))
            .build();

        user.request(goose_request).await
    }

    /// The named transactions a user runs, in registration order.
    pub fn transactions(self: &Arc<Self>) -> Vec<Transaction> {
        let behavior = Arc::clone(self);
        let configure_client: TransactionFunction = Arc::new(move |user| {
            let behavior = Arc::clone(&behavior);
            Box::pin(async move { behavior.configure_client(user).await })
        });

        let behavior = Arc::clone(self);
        let issue: TransactionFunction = Arc::new(move |user| {
            let behavior = Arc::clone(&behavior);
            Box::pin(async move { behavior.issue(user).await })
        });

        vec![
            Transaction::new(configure_client)
                .set_name(Self::CONFIGURE_CLIENT)
                .set_on_start(),
            Transaction::new(issue).set_name(Self::ISSUE),
        ]
    }

    pub fn scenario(self) -> Scenario {
        let name = self.scenario_name();
        let behavior = Arc::new(self);

        behavior
            .transactions()
            .into_iter()
            .fold(Scenario::new(&name), |scenario, transaction| {
                scenario.register_transaction(transaction)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_paths() {
        assert_eq!(IssueEndpoint::V0.path(), "/v0/issue");
        assert_eq!(IssueEndpoint::V1.path(), "/v1/issue");
        assert_eq!(IssueEndpoint::V3.path(), "/v3/issue");
        assert_eq!(IssueEndpoint::default(), IssueEndpoint::V0);
    }

    #[test]
    fn endpoint_metric_names() {
        assert_eq!(IssueEndpoint::V0.metric_name(), "POST /v0/issue");
        assert_eq!(IssueEndpoint::V3.metric_name(), "POST /v3/issue");
    }

    #[test]
    fn endpoint_parsing() {
        assert_eq!("v0".parse::<IssueEndpoint>().unwrap(), IssueEndpoint::V0);
        assert_eq!(" V3 ".parse::<IssueEndpoint>().unwrap(), IssueEndpoint::V3);
        assert!(matches!(
            "v2".parse::<IssueEndpoint>(),
            Err(LoadTestError::Endpoint(_))
        ));
    }

    #[test]
    fn default_timeouts_are_ten_seconds() {
        let timeouts = ClientTimeouts::default();
        assert_eq!(timeouts.connection(), Duration::from_secs(10));
        assert_eq!(timeouts.network(), Duration::from_secs(10));
        assert_eq!(ClientTimeouts::new(10.0, 10.0).unwrap(), timeouts);
    }

    #[test]
    fn rejects_invalid_timeouts() {
        assert!(matches!(
            ClientTimeouts::new(0.0, 10.0),
            Err(LoadTestError::Timeout {
                name: "connection",
                ..
            })
        ));
        assert!(matches!(
            ClientTimeouts::new(10.0, -1.0),
            Err(LoadTestError::Timeout { name: "network", .. })
        ));
        assert!(ClientTimeouts::new(f64::NAN, 1.0).is_err());
        assert!(ClientTimeouts::new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn default_behavior() {
        let behavior = IssueUserBehavior::default();
        assert_eq!(behavior.endpoint(), IssueEndpoint::V0);
        assert_eq!(behavior.generator(), &IssueRequestGenerator::default());
        assert_eq!(behavior.timeouts(), ClientTimeouts::default());
        assert_eq!(behavior.scenario_name(), "CouponIssueV0");
    }

    #[test]
    fn registers_client_setup_then_issue() {
        let behavior = Arc::new(IssueUserBehavior::default());
        let transactions = behavior.transactions();

        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].name, IssueUserBehavior::CONFIGURE_CLIENT);
        assert!(transactions[0].on_start);
        assert_eq!(transactions[1].name, IssueUserBehavior::ISSUE);
        assert!(!transactions[1].on_start);
    }

    #[test]
    fn scenario_carries_both_transactions() {
        let scenario = IssueUserBehavior::new(
            IssueEndpoint::V1,
            IssueRequestGenerator::default(),
            ClientTimeouts::default(),
        )
        .scenario();

        assert_eq!(scenario.name, "CouponIssueV1");
        assert_eq!(scenario.transactions.len(), 2);
    }
}
