pub mod panel;
pub mod signature;
