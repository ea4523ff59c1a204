//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by `RUST_LOG`.
//!
//! ## What Gets Traced
//!
//! - **Session**: logins, renewals and cache hits
//! - **Dispatch**: every remote procedure, with the request body at `trace`
//! - **Batches**: submitted/created/rejected counts per collection at `info`
//! - **Per-item errors**: one `warn` per failed instance, with its kind and message
//!
//! ## Usage Examples
//!
//! ```bash
//! # Batch summaries only
//! RUST_LOG=info cargo run -p resource-sample
//!
//! # Procedure names and session activity
//! RUST_LOG=debug cargo run -p resource-sample
//!
//! # Full request bodies
//! RUST_LOG=resource_framework=trace cargo run -p resource-sample
//! ```
//!
//! With `RUST_LOG=info` a save of two new contacts where one is rejected reads:
//!
//! ```text
//! INFO Session established
//! INFO save:Updated collection="contacts" count=2 submitted=0
//! WARN save:Item rejected collection="contacts" count=2 id=None kind="email" error="is required"
//! INFO save:Created collection="contacts" count=2 submitted=2 rejected=1
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
