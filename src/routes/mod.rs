pub mod error;
pub mod health;
pub mod reports;

pub use error::{ApiError, ErrorEnvelope, panic_response};
pub use reports::report_routes;
