//! Attempt counters and the fault injector that drives the endpoint policies.
//!
//! The counters are an explicitly owned object handed to the injector at
//! construction, so every server instance (and every test) gets its own
//! isolated state. Each scripted endpoint has its own lock; the
//! increment, evaluate and reset steps for one call happen while holding it,
//! so concurrent callers never lose an update or skip a reset response.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::policy::{self, Endpoint, PolicyResponse, RequestContext};

/// One attempt counter per scripted endpoint.
#[derive(Debug, Default)]
pub struct AttemptCounters {
    slots: [Mutex<u32>; Endpoint::SCRIPTED.len()],
}

impl AttemptCounters {
    /// Fresh counters, all at zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, endpoint: Endpoint) -> Option<MutexGuard<'_, u32>> {
        let idx = Endpoint::SCRIPTED.iter().position(|e| *e == endpoint)?;
        Some(self.slots[idx].lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Current counter value; stateless endpoints always report zero.
    pub fn get(&self, endpoint: Endpoint) -> u32 {
        self.slot(endpoint).map(|count| *count).unwrap_or(0)
    }

    /// Snapshot of every scripted counter, keyed by endpoint name.
    pub fn snapshot(&self) -> BTreeMap<&'static str, u32> {
        Endpoint::SCRIPTED
            .iter()
            .map(|endpoint| (endpoint.as_str(), self.get(*endpoint)))
            .collect()
    }
}

/// Outcome of one call through the injector.
#[derive(Debug, Clone, PartialEq)]
pub struct Served {
    /// Attempt number the policy was evaluated for (`None` for stateless endpoints).
    pub attempt: Option<u32>,
    /// Response to send back.
    pub response: PolicyResponse,
}

/// Dispatches calls to endpoint policies using shared attempt counters.
#[derive(Debug, Clone)]
pub struct FaultInjector {
    counters: Arc<AttemptCounters>,
}

impl FaultInjector {
    /// Build an injector around caller-owned counters.
    pub fn new(counters: Arc<AttemptCounters>) -> Self {
        Self { counters }
    }

    /// Read access to the counters.
    pub fn counters(&self) -> &AttemptCounters {
        &self.counters
    }

    /// Serve one call to `endpoint`.
    pub fn handle(&self, endpoint: Endpoint, ctx: &RequestContext) -> Served {
        let Some(mut count) = self.counters.slot(endpoint) else {
            debug!(%endpoint, "serving stateless endpoint");
            return Served {
                attempt: None,
                response: policy::evaluate(endpoint, 1, ctx),
            };
        };

        *count = count.saturating_add(1);
        let attempt = *count;
        let response = policy::evaluate(endpoint, attempt, ctx);
        if response.resets_counter {
            *count = 0;
        }
        drop(count);

        if response.is_success() {
            info!(%endpoint, attempt, status = response.status, "scripted attempt succeeded");
        } else {
            warn!(%endpoint, attempt, status = response.status, "scripted attempt failed");
        }

        Served {
            attempt: Some(attempt),
            response,
        }
    }
}
