pub mod common;
pub mod engine;
pub mod status;
pub mod system;
