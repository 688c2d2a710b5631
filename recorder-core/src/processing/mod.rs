pub mod pcm;
pub mod sample_aggregator;
pub mod volume_fader;
pub mod wav_format;
