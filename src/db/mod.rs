pub mod appointments;
pub mod audit;
pub mod lab_results;
pub mod medications;
pub mod metrics;
pub mod ml_settings;
pub mod patients;
pub mod refresh_tokens;
pub mod users;
