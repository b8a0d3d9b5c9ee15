// Adapters - External system implementations

pub mod probe_ffprobe;

pub use probe_ffprobe::FfprobeAdapter;
