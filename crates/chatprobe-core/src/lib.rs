pub mod config;
pub mod dataset;
pub mod engine;
pub mod errors;
pub mod fingerprint;
pub mod metrics_api;
pub mod model;
pub mod report;
pub mod session;
pub mod validator;
