//! Common test utilities for lectern-access-core integration tests

pub mod mock_repos;

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

use lectern_access_core::{AccessConfig, AccessService, AccessStores, Clock};

#[allow(unused_imports)]
pub use mock_repos::{FailingSnapshots, MockStore, StalledSnapshots};

pub const JWT_SECRET: &str = "hosted-auth-test-secret";
pub const CAPABILITY_SECRET: &str = "capability-test-secret-0123456789abcdef";

/// Clock that only moves when told to
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

#[allow(dead_code)]
impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(now)))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.0.lock().unwrap() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

pub fn test_config() -> AccessConfig {
    AccessConfig::try_new(JWT_SECRET, CAPABILITY_SECRET).unwrap()
}

/// Build a service over `stores` with a manual clock
pub fn service_with(stores: AccessStores, clock: &ManualClock) -> AccessService {
    AccessService::with_clock(test_config(), stores, Arc::new(clock.clone())).unwrap()
}
