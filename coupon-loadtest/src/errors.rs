use goose::GooseError;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum LoadTestError {
    UserIdRange { min: u64, max: u64 },
    Timeout { name: &'static str, seconds: f64 },
    Percentile(String),
    Endpoint(String),
    Goose(GooseError),
}

impl Display for LoadTestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadTestError::UserIdRange { min, max } => {
                write!(f, "invalid user id range [{min}, {max}]: ids start at 1 and min <= max")
            }
            LoadTestError::Timeout { name, seconds } => {
                write!(f, "invalid {name} timeout: {seconds}s, expected a positive number of seconds")
            }
            LoadTestError::Percentile(value) => {
                write!(f, "invalid percentile '{value}', expected a fraction in (0, 1]")
            }
            LoadTestError::Endpoint(value) => {
                write!(f, "unknown issue endpoint '{value}', expected one of v0, v1, v3")
            }
            LoadTestError::Goose(err) => {
                write!(f, "error while setting up the load test: {err}")
            }
        }
    }
}

impl Error for LoadTestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadTestError::Goose(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GooseError> for LoadTestError {
    fn from(e: GooseError) -> Self {
        Self::Goose(e)
    }
}
