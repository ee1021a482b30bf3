//! ID generation utilities for wellflow
//!
//! Provides timestamps and correlation identifiers for orchestration calls.

use uuid::Uuid;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Generate a trace ID for one orchestration call
///
/// Format: `trace-{timestamp_ms}-{random_hex}`
/// Example: `trace-1738300800123-a1b2c3d4`
pub fn generate_trace_id() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("trace-{}-{}", now_ms(), &random[..8])
}
