//! Health check module
//! Provides health status for the application and its dependencies

use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::payments::factory::PaymentGateways;
use crate::services::order_metadata::OrderMetadataStore;
use std::future::Future;
use std::sync::Arc;

/// Health status response
#[derive(Debug, Serialize, Clone)]
pub struct HealthStatus {
    pub status: HealthState,
    pub checks: HashMap<String, ComponentHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Overall health state
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health status
#[derive(Debug, Serialize, Clone)]
pub struct ComponentHealth {
    pub status: ComponentState,
    pub response_time_ms: Option<u128>,
    pub details: Option<String>,
}

/// Component state
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComponentState {
    Up,
    Down,
    Warning,
}

impl HealthStatus {
    pub fn new() -> Self {
        Self {
            status: HealthState::Healthy,
            checks: HashMap::new(),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl ComponentHealth {
    pub fn up(response_time_ms: Option<u128>) -> Self {
        Self {
            status: ComponentState::Up,
            response_time_ms,
            details: None,
        }
    }

    pub fn down(details: Option<String>) -> Self {
        Self {
            status: ComponentState::Down,
            response_time_ms: None,
            details,
        }
    }

    pub fn warning(response_time_ms: Option<u128>, details: Option<String>) -> Self {
        Self {
            status: ComponentState::Warning,
            response_time_ms,
            details,
        }
    }
}

/// Health checker for the application
#[derive(Clone)]
pub struct HealthChecker {
    order_metadata: Arc<dyn OrderMetadataStore>,
    gateways: PaymentGateways,
    #[cfg(feature = "database")]
    db_pool: Option<sqlx::PgPool>,
}

impl HealthChecker {
    pub fn new(order_metadata: Arc<dyn OrderMetadataStore>, gateways: PaymentGateways) -> Self {
        Self {
            order_metadata,
            gateways,
            #[cfg(feature = "database")]
            db_pool: None,
        }
    }

    #[cfg(feature = "database")]
    pub fn with_database(mut self, pool: sqlx::PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Perform comprehensive health check
    pub async fn check_health(&self) -> HealthStatus {
        let mut health_status = HealthStatus::new();

        let store = self.order_metadata.clone();
        let metadata = timed_check(Duration::from_secs(5), async move {
            store.health_check().await.map_err(|e| e.to_string())
        })
        .await;
        health_status.checks.insert(
            format!("order_metadata_{}", self.order_metadata.backend()),
            metadata,
        );

        #[cfg(feature = "database")]
        if let Some(pool) = self.db_pool.clone() {
            let database = timed_check(Duration::from_secs(5), async move {
                crate::database::health_check(&pool)
                    .await
                    .map_err(|e| e.to_string())
            })
            .await;
            health_status.checks.insert("database".to_string(), database);
        }

        for gateway in [&self.gateways.delayed, &self.gateways.immediate] {
            let component = if gateway.is_configured() {
                ComponentHealth::up(None)
            } else {
                warn!(gateway = %gateway.name(), "Gateway credentials missing");
                ComponentHealth::warning(None, Some("credentials not configured".to_string()))
            };
            health_status
                .checks
                .insert(format!("gateway_{}", gateway.name()), component);
        }

        health_status.status = overall_state(&health_status.checks);
        health_status
    }
}

async fn timed_check<F>(limit: Duration, check: F) -> ComponentHealth
where
    F: Future<Output = Result<(), String>>,
{
    let start = Instant::now();
    match timeout(limit, check).await {
        Ok(Ok(())) => {
            let elapsed = start.elapsed().as_millis();
            info!("Health check: OK ({}ms)", elapsed);
            ComponentHealth::up(Some(elapsed))
        }
        Ok(Err(e)) => {
            error!("Health check failed: {}", e);
            ComponentHealth::down(Some(e))
        }
        Err(_) => {
            error!("Health check timed out");
            ComponentHealth::down(Some("Timeout".to_string()))
        }
    }
}

fn overall_state(checks: &HashMap<String, ComponentHealth>) -> HealthState {
    if checks.values().any(|c| c.status == ComponentState::Down) {
        HealthState::Unhealthy
    } else if checks.values().any(|c| c.status == ComponentState::Warning) {
        HealthState::Degraded
    } else {
        HealthState::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::factory::{GatewaysConfig, PaymentGatewayFactory};
    use crate::services::order_metadata::InMemoryOrderMetadataStore;

    #[tokio::test]
    async fn test_health_status_creation() {
        let health_status = HealthStatus::new();
        assert!(matches!(health_status.status, HealthState::Healthy));
        assert!(health_status.checks.is_empty());
        assert!(health_status.timestamp <= chrono::Utc::now());
    }

    #[test]
    fn test_component_health_states() {
        let up_health = ComponentHealth::up(Some(100));
        assert!(matches!(up_health.status, ComponentState::Up));
        assert_eq!(up_health.response_time_ms, Some(100));

        let down_health = ComponentHealth::down(Some("Test error".to_string()));
        assert!(matches!(down_health.status, ComponentState::Down));
        assert_eq!(down_health.details, Some("Test error".to_string()));

        let warning_health = ComponentHealth::warning(Some(500), Some("Slow response".to_string()));
        assert!(matches!(warning_health.status, ComponentState::Warning));
        assert_eq!(warning_health.response_time_ms, Some(500));
    }

    #[tokio::test]
    async fn unconfigured_gateways_degrade_health() {
        let gateways = PaymentGatewayFactory::build(&GatewaysConfig::default()).unwrap();
        let checker = HealthChecker::new(Arc::new(InMemoryOrderMetadataStore::default()), gateways);

        let status = checker.check_health().await;
        assert_eq!(status.status, HealthState::Degraded);
        assert!(matches!(
            status.checks["order_metadata_memory"].status,
            ComponentState::Up
        ));
        assert!(matches!(
            status.checks["gateway_paypal"].status,
            ComponentState::Warning
        ));
    }
}
