//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! upload handler / receiver produce:
//!     → logging.rs (structured log events, request_id on every upload span)
//!     → metrics.rs (counters, gauges, histograms)
//! ```

pub mod logging;
pub mod metrics;
