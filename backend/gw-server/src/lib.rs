pub mod error;
pub mod gateway_state;
pub mod health;
pub mod logger;
pub mod route_guard;
pub mod routes;
pub mod shutdown_coordinator;
pub mod shutdown_guard;
pub mod startup;

#[cfg(test)]
mod tests;

pub use error::{Result, ServerError};
pub use gateway_state::{GatewayState, RouteGuard};
pub use route_guard::{REMAINING_HEADER, RETRY_IN_HEADER};
pub use routes::build_router;
pub use shutdown_coordinator::ShutdownCoordinator;
pub use shutdown_guard::ShutdownGuard;
