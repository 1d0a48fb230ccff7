pub mod auth;
pub mod metrics;

pub use auth::{redirect_to, session_guard};
pub use metrics::metrics_middleware;
