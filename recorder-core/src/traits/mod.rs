pub mod capture_provider;
pub mod file_sink;
pub mod recording_listener;
