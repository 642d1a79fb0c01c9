pub mod http;

pub use http::{ApiError, AppState, router};
