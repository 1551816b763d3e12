//! # Observability & Tracing
//!
//! The framework logs through the `tracing` crate with structured fields:
//!
//! - `actor_id` on every mailbox event (init attempts, stop, failures),
//! - `dispatcher` on executor lifecycle events,
//! - `attempt`, `delay`, `stop_reason` where they apply.
//!
//! ## Usage
//!
//! ```bash
//! # Lifecycle events only
//! RUST_LOG=info cargo run -p fleet-sample
//!
//! # Creation, init attempts and supervision decisions
//! RUST_LOG=actor_system=debug cargo run -p fleet-sample
//!
//! # Scheduling gate decisions (very verbose)
//! RUST_LOG=actor_system=trace cargo run -p fleet-sample
//! ```
//!
//! With `RUST_LOG=debug` an init retry looks like:
//!
//! ```text
//! DEBUG Trying to init actor actor_id=DEVICE|6f1c... attempt=1
//!  INFO Failed to init actor, scheduling retry actor_id=DEVICE|6f1c... attempt=1 delay=100ms
//! DEBUG Trying to init actor actor_id=DEVICE|6f1c... attempt=2
//! ```

/// Installs a compact `tracing-subscriber` filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
