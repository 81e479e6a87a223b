//! Gateway counters.
//!
//! Lock-free atomics shared by the trace layer and the handlers. The
//! Prometheus text export is behind the `metrics` feature.

use std::sync::atomic::{AtomicU64, Ordering};

/// Gateway metrics
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    // Request counters
    pub requests_total: AtomicU64,
    pub requests_success: AtomicU64,
    pub requests_error: AtomicU64,
    pub auth_failures: AtomicU64,
    pub timeouts: AtomicU64,
    pub panics: AtomicU64,

    // Credentials lifecycle
    pub registrations: AtomicU64,
    pub rotations: AtomicU64,
    pub unregistrations: AtomicU64,
    pub tokens_issued: AtomicU64,

    // Latency tracking (simplified)
    pub total_latency_ms: AtomicU64,
}

/// Credentials lifecycle events counted by the handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Registered,
    Rotated,
    Unregistered,
    TokenIssued,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed request by its HTTP status.
    pub fn record_request(&self, status: u16, latency_ms: u64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if status < 400 {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_error.fetch_add(1, Ordering::Relaxed);
        }
        if status == 401 {
            self.auth_failures.fetch_add(1, Ordering::Relaxed);
        }
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_panic(&self) {
        self.panics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record(&self, event: LifecycleEvent) {
        let counter = match event {
            LifecycleEvent::Registered => &self.registrations,
            LifecycleEvent::Rotated => &self.rotations,
            LifecycleEvent::Unregistered => &self.unregistrations,
            LifecycleEvent::TokenIssued => &self.tokens_issued,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get average latency in ms
    pub fn average_latency_ms(&self) -> f64 {
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        let count = self.requests_total.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            requests_total: load(&self.requests_total),
            requests_success: load(&self.requests_success),
            requests_error: load(&self.requests_error),
            auth_failures: load(&self.auth_failures),
            timeouts: load(&self.timeouts),
            panics: load(&self.panics),
            registrations: load(&self.registrations),
            rotations: load(&self.rotations),
            unregistrations: load(&self.unregistrations),
            tokens_issued: load(&self.tokens_issued),
            average_latency_ms: self.average_latency_ms(),
        }
    }

    /// Export metrics in Prometheus format
    #[cfg(feature = "metrics")]
    pub fn to_prometheus(&self) -> String {
        let s = self.snapshot();
        let counters = [
            ("ocpi_requests_total", "Total number of OCPI requests", s.requests_total),
            ("ocpi_requests_success_total", "Requests answered below HTTP 400", s.requests_success),
            ("ocpi_requests_error_total", "Requests answered with HTTP 400 or above", s.requests_error),
            ("ocpi_auth_failures_total", "Requests rejected with HTTP 401", s.auth_failures),
            ("ocpi_request_timeouts_total", "Requests that hit the request timeout", s.timeouts),
            ("ocpi_handler_panics_total", "Handler panics caught", s.panics),
            ("ocpi_registrations_total", "Completed registrations", s.registrations),
            ("ocpi_rotations_total", "Credential rotations", s.rotations),
            ("ocpi_unregistrations_total", "Unregistrations", s.unregistrations),
            ("ocpi_tokens_issued_total", "Registration tokens issued", s.tokens_issued),
        ];

        let mut output = String::new();
        for (name, help, value) in counters {
            output.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n"
            ));
        }
        output.push_str(&format!(
            "# HELP ocpi_average_latency_ms Average request latency\n\
             # TYPE ocpi_average_latency_ms gauge\n\
             ocpi_average_latency_ms {:.2}\n",
            s.average_latency_ms
        ));
        output
    }
}

/// Serializable view of [`GatewayMetrics`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub requests_success: u64,
    pub requests_error: u64,
    pub auth_failures: u64,
    pub timeouts: u64,
    pub panics: u64,
    pub registrations: u64,
    pub rotations: u64,
    pub unregistrations: u64,
    pub tokens_issued: u64,
    pub average_latency_ms: f64,
}
