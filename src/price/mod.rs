pub mod oracle;
pub mod resilience;
pub mod service;

pub use oracle::{CoinGeckoSource, PriceSource};
pub use resilience::{CircuitBreaker, CircuitState};
pub use service::PriceService;
