pub mod error;
pub mod http;
pub mod simulated;

pub use error::EngineError;
pub use http::{HttpEngine, HttpTransfer};
pub use simulated::{SimulatedEngine, SimulatedTransfer};
