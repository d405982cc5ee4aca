pub mod snapshot;
pub mod metrics;
pub mod price;
pub mod error;
pub mod cache;

pub use snapshot::*;
pub use metrics::*;
pub use price::*;
pub use error::*;
pub use cache::*;
