pub mod settings;

pub use settings::{
    Settings, AppSettings, CalculationSettings, RateLimitRule, RateLimitSettings,
    DatabaseSettings, PriceSettings, ApiSettings, HistorySettings, SeasonSettings, ClientSettings,
};
