pub mod error;
pub mod handlers;
pub mod routes;

pub use error::ApiError;
pub use routes::{app_router, AppState};
