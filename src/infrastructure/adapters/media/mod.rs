//! Media Adapter - ffmpeg 媒体后端

mod ffmpeg_backend;

pub use ffmpeg_backend::{build_render_args, FfmpegBackend, FfmpegBackendConfig};
