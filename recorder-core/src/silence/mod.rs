pub mod clock;
pub mod silence_service;
