pub mod common;
pub mod market_data;

pub use common::YahooBar;
pub use market_data::{YahooMarketDataService, YahooMarketDataServiceBuilder};
