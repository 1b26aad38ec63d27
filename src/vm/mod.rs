pub mod bridge;
pub mod session;
