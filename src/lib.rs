pub mod config;
pub mod executor;
pub mod exports;
pub mod figma;
pub mod harvest;
pub mod logging;
pub mod model;
pub mod report;
pub mod traits;

// Re-export common types for convenience
pub use executor::*;
pub use model::*;
pub use traits::*;
