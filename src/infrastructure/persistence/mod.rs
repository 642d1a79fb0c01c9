pub mod historical_csv;
pub mod model_store;

pub use model_store::{load_json, save_json};
