//! Media Backend Port - 音视频编码后端抽象
//!
//! 视频合成只生成渲染计划，探测和编码交给外部后端（如 ffmpeg）

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 渲染错误
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No background clips available")]
    NoBackgrounds,

    #[error("No background is long enough: need {required_secs:.2}s, longest is {longest_secs:.2}s")]
    BackgroundTooShort {
        required_secs: f64,
        longest_secs: f64,
    },

    #[error("Missing asset: {0}")]
    MissingAsset(String),

    #[error("Probe failed for {path}: {message}")]
    ProbeFailed { path: String, message: String },

    #[error("Backend failed: {0}")]
    BackendFailed(String),

    #[error("Render timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(String),
}

/// 媒体文件信息
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub duration_secs: f64,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// 标题叠加层
#[derive(Debug, Clone, PartialEq)]
pub struct TitleOverlay {
    pub image: PathBuf,
    /// 显示时长（秒），从 0 开始
    pub duration_secs: f64,
}

/// 渲染计划
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    /// 背景视频
    pub background: PathBuf,
    /// 背景宽度（标题图片缩放到此宽度）
    pub background_width: Option<u32>,
    /// 背景裁剪起点（秒）
    pub trim_start_secs: f64,
    /// 输出时长（秒）= 旁白总时长
    pub duration_secs: f64,
    /// 旁白音轨（替换背景原声）
    pub narration: PathBuf,
    /// 标题叠加层
    pub title: Option<TitleOverlay>,
    /// 需要烧录的字幕文件（已去除被抑制的条目）
    pub burn_subtitles: Option<PathBuf>,
    /// 输出路径
    pub output: PathBuf,
    /// 编码参数
    pub encoding: EncodingSettings,
}

/// 编码参数
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingSettings {
    pub fps: u32,
    pub video_codec: String,
    pub video_bitrate: String,
    pub audio_codec: String,
    /// 字幕样式（ASS force_style）
    pub subtitle_style: String,
}

/// Media Backend Port
#[async_trait]
pub trait MediaBackendPort: Send + Sync {
    /// 探测媒体文件
    async fn probe(&self, path: &Path) -> Result<MediaInfo, RenderError>;

    /// 执行渲染
    async fn render(&self, plan: &RenderPlan) -> Result<(), RenderError>;
}
