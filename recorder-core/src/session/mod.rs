pub mod recording_engine;
