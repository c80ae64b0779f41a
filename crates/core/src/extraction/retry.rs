//! Sequential recovery of failed detail fetches
//!
//! Runs after all batches have finished, off the concurrent path, so retried
//! ids compete with nothing but the rate limiter. An id either recovers with
//! a full payload or is declared permanently failed after the attempt budget
//! runs out.

use std::sync::Arc;
use std::time::Duration;

use decant_common::resilience::BackoffStrategy;
use decant_domain::constants::{DEFAULT_RETRY_MAX_ATTEMPTS, RETRY_BACKOFF_BASE_SECS};
use decant_domain::{EntityId, ResourceSpec, RetryOutcome};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::ports::ExtractionGateway;

/// Retries failed ids one at a time with exponential backoff
pub struct RetryCoordinator {
    gateway: Arc<dyn ExtractionGateway>,
    max_attempts: u32,
    backoff: BackoffStrategy,
}

impl RetryCoordinator {
    pub fn new(gateway: Arc<dyn ExtractionGateway>) -> Self {
        Self {
            gateway,
            max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            backoff: BackoffStrategy::Exponential {
                initial_delay: Duration::from_secs(RETRY_BACKOFF_BASE_SECS),
                base: 2.0,
                max_delay: Duration::from_secs(60),
            },
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Retry every failed id sequentially and split them into recovered
    /// payloads and permanent failures
    pub async fn recover(
        &self,
        resource: &ResourceSpec,
        failed_ids: Vec<EntityId>,
    ) -> RetryOutcome {
        if failed_ids.is_empty() {
            return RetryOutcome::default();
        }

        info!(
            resource = %resource.name,
            ids = failed_ids.len(),
            "Retrying failed ids sequentially"
        );

        let mut recovered = Vec::new();
        let mut permanent = Vec::new();

        for id in failed_ids {
            match self.recover_one(resource, &id).await {
                Some(record) => recovered.push(record),
                None => {
                    warn!(
                        resource = %resource.name,
                        id = %id,
                        attempts = self.max_attempts,
                        "Id failed every retry attempt"
                    );
                    permanent.push(id);
                }
            }
        }

        info!(
            resource = %resource.name,
            recovered = recovered.len(),
            permanent = permanent.len(),
            "Retry phase complete"
        );

        RetryOutcome { recovered, permanent }
    }

    /// Attempt one id up to the configured budget, sleeping between attempts
    async fn recover_one(&self, resource: &ResourceSpec, id: &EntityId) -> Option<Value> {
        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                let delay = self.backoff.calculate_delay(attempt - 2);
                debug!(id = %id, attempt, delay_ms = delay.as_millis() as u64, "Backing off before retry");
                tokio::time::sleep(delay).await;
            }

            match self.gateway.fetch_detail(resource, id).await {
                Ok(record) => {
                    debug!(id = %id, attempt, "Id recovered");
                    return Some(record);
                }
                Err(error) => {
                    debug!(id = %id, attempt, error = %error, "Retry attempt failed");
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::testkit::ScriptedGateway;

    fn create_test_resource() -> ResourceSpec {
        ResourceSpec::paged("orders", "orders")
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_id_that_succeeds_on_second_attempt() {
        let gateway = ScriptedGateway::new();
        gateway.fail_detail("7", 1);
        let coordinator = RetryCoordinator::new(gateway.clone());

        let outcome = coordinator
            .recover(&create_test_resource(), vec![EntityId::from(7)])
            .await;

        assert_eq!(outcome.recovered.len(), 1);
        assert!(outcome.permanent.is_empty());
        assert_eq!(gateway.detail_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_attempt_budget() {
        let gateway = ScriptedGateway::new();
        gateway.fail_detail("7", 5);
        let coordinator = RetryCoordinator::new(gateway.clone());

        let outcome = coordinator
            .recover(&create_test_resource(), vec![EntityId::from(7)])
            .await;

        assert!(outcome.recovered.is_empty());
        assert_eq!(outcome.permanent, vec![EntityId::from(7)]);
        assert_eq!(gateway.detail_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles_between_attempts() {
        let gateway = ScriptedGateway::new();
        gateway.fail_detail("7", 3);
        let coordinator = RetryCoordinator::new(gateway.clone());

        coordinator
            .recover(&create_test_resource(), vec![EntityId::from(7)])
            .await;

        let times = gateway.detail_times();
        assert_eq!(times.len(), 3);
        let first_gap = times[1] - times[0];
        let second_gap = times[2] - times[1];
        assert_eq!(first_gap, Duration::from_secs(2));
        assert_eq!(second_gap, Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_are_retried_sequentially() {
        let gateway = ScriptedGateway::new();
        gateway.fail_detail("1", 1);
        gateway.fail_detail("2", 1);
        let coordinator = RetryCoordinator::new(gateway.clone());

        let outcome = coordinator
            .recover(
                &create_test_resource(),
                vec![EntityId::from(1), EntityId::from(2)],
            )
            .await;

        assert_eq!(outcome.recovered.len(), 2);
        // Two attempts per id, and every attempt for id 1 lands before any
        // attempt for id 2.
        let times = gateway.detail_times();
        assert_eq!(times.len(), 4);
        assert!(times[1] >= times[0]);
        assert!(times[2] >= times[1]);
        assert!(times[3] >= times[2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_outcome_accounts_every_id() {
        let gateway = ScriptedGateway::new();
        gateway.fail_detail("1", 1);
        gateway.fail_detail("2", 5);
        let coordinator = RetryCoordinator::new(gateway.clone());

        let outcome = coordinator
            .recover(
                &create_test_resource(),
                vec![EntityId::from(1), EntityId::from(2), EntityId::from(3)],
            )
            .await;

        assert_eq!(outcome.recovered.len(), 2);
        assert_eq!(outcome.permanent, vec![EntityId::from(2)]);
        assert_eq!(outcome.total(), 3);
    }

    #[tokio::test]
    async fn test_empty_input_skips_gateway_entirely() {
        let gateway = ScriptedGateway::new();
        let coordinator = RetryCoordinator::new(gateway.clone());

        let outcome = coordinator.recover(&create_test_resource(), Vec::new()).await;

        assert_eq!(outcome.total(), 0);
        assert_eq!(gateway.detail_calls(), 0);
    }
}
