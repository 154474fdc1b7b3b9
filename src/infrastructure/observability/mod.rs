//! Observability infrastructure - Prometheus metrics

mod metrics;

pub use metrics::{
    create_metrics_router, init_metrics, record_access_change, record_auth_failure,
    record_session_destroyed, record_session_started, PrometheusMetrics,
};
