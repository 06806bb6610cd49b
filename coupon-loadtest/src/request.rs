use crate::errors::LoadTestError;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_USER_ID: u64 = 1;
pub const DEFAULT_MAX_USER_ID: u64 = 10_000_000;
pub const DEFAULT_COUPON_ID: u64 = 1;

/// Body of a single coupon issuance call.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    pub user_id: u64,
    pub coupon_id: u64,
}

/// Draws a fresh [`IssueRequest`] per call: the user id uniformly from an
/// inclusive range, the coupon id fixed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IssueRequestGenerator {
    min_user_id: u64,
    max_user_id: u64,
    coupon_id: u64,
}

impl IssueRequestGenerator {
    pub fn new(min_user_id: u64, max_user_id: u64, coupon_id: u64) -> Result<Self, LoadTestError> {
        if min_user_id == 0 || min_user_id > max_user_id {
            return Err(LoadTestError::UserIdRange {
                min: min_user_id,
                max: max_user_id,
            });
        }

        Ok(Self {
            min_user_id,
            max_user_id,
            coupon_id,
        })
    }

    pub fn min_user_id(&self) -> u64 {
        self.min_user_id
    }

    pub fn max_user_id(&self) -> u64 {
        self.max_user_id
    }

    pub fn coupon_id(&self) -> u64 {
        self.coupon_id
    }

    pub fn generate(&self) -> IssueRequest {
        self.generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> IssueRequest {
        IssueRequest {
            user_id: rng.gen_range(self.min_user_id..=self.max_user_id),
            coupon_id: self.coupon_id,
        }
    }
}

impl Default for IssueRequestGenerator {
    fn default() -> Self {
        Self {
            min_user_id: DEFAULT_MIN_USER_ID,
            max_user_id: DEFAULT_MAX_USER_ID,
            coupon_id: DEFAULT_COUPON_ID,
        }
    }
}
