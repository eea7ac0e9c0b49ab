// ABOUTME: Per-agent rate limiting for the invoke endpoint
// ABOUTME: One in-process limiter per agent, built from the agent's configured quota

use governor::{
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    num::NonZeroU32,
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing::debug;

use agentdesk_agents::RateLimit;

type RateLimiterType = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;
type RateLimiterInstance = Arc<RateLimiterType>;

/// Registry of per-agent limiters. Keyed by agent id plus the quota so a
/// changed configuration gets a fresh limiter.
#[derive(Clone, Default)]
pub struct InvokeRateLimiters {
    limiters: Arc<Mutex<HashMap<String, RateLimiterInstance>>>,
}

/// Details returned when an agent is over its quota
#[derive(Debug, Clone, Copy)]
pub struct RateLimitExceeded {
    pub limit: u32,
    pub retry_after_secs: u64,
}

impl InvokeRateLimiters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check an agent against its configured quota. Agents without a
    /// configured limit are never throttled.
    pub fn check(&self, agent_id: &str, config: &RateLimit) -> Result<(), RateLimitExceeded> {
        let Some(requests) = NonZeroU32::new(config.requests) else {
            return Ok(());
        };
        if config.window_seconds == 0 {
            return Ok(());
        }

        let limiter = self.get_limiter(agent_id, requests, config.window_seconds);
        match limiter.check() {
            Ok(_) => Ok(()),
            Err(not_until) => {
                let clock = DefaultClock::default();
                let wait = not_until.wait_time_from(clock.now());
                Err(RateLimitExceeded {
                    limit: config.requests,
                    retry_after_secs: wait.as_secs().max(1),
                })
            }
        }
    }

    /// Drop every limiter belonging to an agent, for example after the
    /// agent is deleted
    pub fn remove_agent(&self, agent_id: &str) {
        let prefix = format!("{}:", agent_id);
        let mut limiters = self.limiters.lock().unwrap_or_else(|e| e.into_inner());
        limiters.retain(|key, _| !key.starts_with(&prefix));
    }

    fn get_limiter(
        &self,
        agent_id: &str,
        requests: NonZeroU32,
        window_seconds: u64,
    ) -> RateLimiterInstance {
        let key = format!("{}:{}:{}", agent_id, requests, window_seconds);
        let mut limiters = self.limiters.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(limiter) = limiters.get(&key) {
            return limiter.clone();
        }

        // A changed quota replaces the agent's old limiter instead of
        // leaving it behind
        let prefix = format!("{}:", agent_id);
        limiters.retain(|key, _| !key.starts_with(&prefix));

        // Allow `requests` as burst, replenishing evenly over the window
        let period = Duration::from_secs_f64(window_seconds as f64 / requests.get() as f64);
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_minute(requests))
            .allow_burst(requests);

        let limiter = Arc::new(RateLimiter::direct(quota));
        limiters.insert(key, limiter.clone());
        debug!(
            agent_id = %agent_id,
            requests = %requests,
            window_seconds = %window_seconds,
            "Created rate limiter for agent"
        );
        limiter
    }

    #[cfg(test)]
    fn entry_count(&self) -> usize {
        self.limiters.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
