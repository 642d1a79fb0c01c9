pub mod history_range;
pub mod price_series;

pub use history_range::{HistoryRange, Period};
pub use price_series::{PricePoint, PriceSeries, RawBar, RawClose, RawTable};
