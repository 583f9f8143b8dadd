pub mod config;
pub mod kernel;
pub mod server;
pub mod services;

// Re-export specific items if needed for convenient access
pub use kernel::controller::TimerController;
pub use kernel::reactor::{TimerHandle, TimerReactor};
