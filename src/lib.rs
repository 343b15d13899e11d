pub mod cancel;
pub mod client;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod pipeline;
pub mod session;
pub mod token;
pub mod ui;

/// Wire types shared with the backend.
pub use cvtailor_contract as contract;
