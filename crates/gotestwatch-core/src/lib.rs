pub mod config;
pub mod error;
pub mod snapshot;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use snapshot::*;
pub use traits::*;
pub use types::*;
