// Domain-specific error types
pub mod errors;

// Price series and provider rows
pub mod market;

// Windowing, scaling and accuracy metrics
pub mod ml;

// Port interfaces
pub mod ports;
