// Process-level counters for the dashboard and Prometheus scrape.

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub static METRICS: Lazy<ServiceMetrics> = Lazy::new(ServiceMetrics::new);

pub struct ServiceMetrics {
    pub http_requests: AtomicU64,
    pub http_errors: AtomicU64,
    pub batches_created: AtomicU64,
    pub batches_finalized: AtomicU64,
    pub commitments_submitted: AtomicU64,
    pub transactions_revealed: AtomicU64,
    pub reveal_mismatches: AtomicU64,
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            http_requests: AtomicU64::new(0),
            http_errors: AtomicU64::new(0),
            batches_created: AtomicU64::new(0),
            batches_finalized: AtomicU64::new(0),
            commitments_submitted: AtomicU64::new(0),
            transactions_revealed: AtomicU64::new(0),
            reveal_mismatches: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn inc_http_requests(&self) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_http_errors(&self) {
        self.http_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_batches_created(&self) {
        self.batches_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_batches_finalized(&self) {
        self.batches_finalized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_commitments_submitted(&self) {
        self.commitments_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_transactions_revealed(&self) {
        self.transactions_revealed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_reveal_mismatches(&self) {
        self.reveal_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// JSON snapshot for the status endpoint.
    pub fn export_json(&self) -> serde_json::Value {
        serde_json::json!({
            "http_requests": self.http_requests.load(Ordering::Relaxed),
            "http_errors": self.http_errors.load(Ordering::Relaxed),
            "batches_created": self.batches_created.load(Ordering::Relaxed),
            "batches_finalized": self.batches_finalized.load(Ordering::Relaxed),
            "commitments_submitted": self.commitments_submitted.load(Ordering::Relaxed),
            "transactions_revealed": self.transactions_revealed.load(Ordering::Relaxed),
            "reveal_mismatches": self.reveal_mismatches.load(Ordering::Relaxed),
            "uptime_secs": self.uptime_secs(),
        })
    }

    pub fn export_prometheus(&self) -> String {
        format!(
            "# HELP http_requests_total Total HTTP requests\n\
             # TYPE http_requests_total counter\n\
             http_requests_total {}\n\
             \n\
             # HELP http_errors_total Total HTTP errors\n\
             # TYPE http_errors_total counter\n\
             http_errors_total {}\n\
             \n\
             # HELP batches_created_total Batches opened by the coordinator\n\
             # TYPE batches_created_total counter\n\
             batches_created_total {}\n\
             \n\
             # HELP batches_finalized_total Batches driven to completion\n\
             # TYPE batches_finalized_total counter\n\
             batches_finalized_total {}\n\
             \n\
             # HELP commitments_submitted_total Accepted commitments\n\
             # TYPE commitments_submitted_total counter\n\
             commitments_submitted_total {}\n\
             \n\
             # HELP transactions_revealed_total Verified reveals\n\
             # TYPE transactions_revealed_total counter\n\
             transactions_revealed_total {}\n\
             \n\
             # HELP reveal_mismatches_total Reveals rejected for digest mismatch\n\
             # TYPE reveal_mismatches_total counter\n\
             reveal_mismatches_total {}\n",
            self.http_requests.load(Ordering::Relaxed),
            self.http_errors.load(Ordering::Relaxed),
            self.batches_created.load(Ordering::Relaxed),
            self.batches_finalized.load(Ordering::Relaxed),
            self.commitments_submitted.load(Ordering::Relaxed),
            self.transactions_revealed.load(Ordering::Relaxed),
            self.reveal_mismatches.load(Ordering::Relaxed),
        )
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}
