// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod ffmpeg_output;
pub mod probe_ffprobe;
#[cfg(feature = "libav")]
pub mod probe_libav;
pub mod toml_config;

// Re-export adapters
pub use exec_ffmpeg::{FfmpegAnalyzer, FfmpegSplicer, ToolCandidates};
pub use ffmpeg_output::FfmpegOutputParser;
pub use probe_ffprobe::FfprobeKeyframeLocator;
#[cfg(feature = "libav")]
pub use probe_libav::LibavKeyframeLocator;
pub use toml_config::TomlConfigAdapter;
