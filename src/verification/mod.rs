pub mod address;
pub mod snapshot;

pub use address::{is_valid_wallet_address, WalletAddress};
pub use snapshot::{is_percentile_label, validate_submission};
