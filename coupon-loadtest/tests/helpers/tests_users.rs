use goose::config::GooseConfiguration;
use goose::metrics::GooseCoordinatedOmissionMitigation;
use goose::prelude::*;
use gumdrop::Options;
use httpmock::MockServer;
use reqwest::Url;

// Goose users and configurations pointed at a mock issuance API, so the
// tests don't need the coupon service running.

const EMPTY_ARGS: Vec<&str> = vec![];

pub fn single_user(server: &MockServer) -> GooseUser {
    let mut configuration = GooseConfiguration::parse_args_default(&EMPTY_ARGS)
        .expect("Empty goose args should parse");
    // A standalone user needs a coordinated omission setting; GooseAttack
    // would normally default this to Average.
    configuration.co_mitigation = Some(GooseCoordinatedOmissionMitigation::Average);
    let base_url = Url::parse(&server.url("/")).expect("Mock server URL should be valid");
    GooseUser::single(base_url, &configuration).expect("Should build a single goose user")
}

pub fn attack_configuration(server: &MockServer, users: usize, iterations: usize) -> GooseConfiguration {
    let host = server.url("/");
    let users = users.to_string();
    let iterations = iterations.to_string();
    let args = vec![
        "--host",
        host.as_str(),
        "--users",
        users.as_str(),
        "--hatch-rate",
        users.as_str(),
        "--iterations",
        iterations.as_str(),
    ];

    GooseConfiguration::parse_args_default(&args).expect("Goose args should parse")
}
