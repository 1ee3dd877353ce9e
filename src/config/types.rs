//! Configuration Types
//!
//! 定义所有配置结构体

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::{default_replacement_rules, DEFAULT_CHUNK_LIMIT, DEFAULT_GAP_MS, DEFAULT_MASK_CHAR};
use crate::infrastructure::adapters::{default_endpoints, ResponseShape};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// TTS 配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 流水线配置
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// 视频配置
    #[serde(default)]
    pub video: VideoConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 内容过滤配置
    #[serde(default)]
    pub filter: FilterSettings,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

// ============================================================================
// Server
// ============================================================================

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5060
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ============================================================================
// TTS
// ============================================================================

/// TTS 引擎类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsEngineKind {
    /// 远程 HTTP 端点
    Http,
    /// 离线静音引擎（演练和测试用）
    Fake,
}

/// 单个 TTS 端点
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub url: String,
    pub shape: ResponseShape,
}

/// TTS 配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_engine")]
    pub engine: TtsEngineKind,

    /// 可互换端点（按顺序轮换）
    #[serde(default = "default_endpoint_configs")]
    pub endpoints: Vec<EndpointConfig>,

    /// 朗读音色
    #[serde(default = "default_voice")]
    pub voice: String,

    /// 语速倍率
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 探测轮数
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 探测轮间隔（秒）
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// 单次请求字符上限
    #[serde(default = "default_chunk_limit")]
    pub chunk_limit: usize,

    /// 允许的音色（为空时不限制）
    #[serde(default = "default_allowed_voices")]
    pub allowed_voices: Vec<String>,
}

fn default_engine() -> TtsEngineKind {
    TtsEngineKind::Http
}

fn default_endpoint_configs() -> Vec<EndpointConfig> {
    default_endpoints()
        .into_iter()
        .map(|e| EndpointConfig {
            url: e.url,
            shape: e.shape,
        })
        .collect()
}

fn default_voice() -> String {
    "en_us_006".to_string()
}

fn default_speed() -> f32 {
    1.15
}

fn default_tts_timeout() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    5
}

fn default_chunk_limit() -> usize {
    DEFAULT_CHUNK_LIMIT
}

fn default_allowed_voices() -> Vec<String> {
    [
        "en_au_001",
        "en_au_002",
        "en_uk_001",
        "en_uk_003",
        "en_us_001",
        "en_us_002",
        "en_us_006",
        "en_us_007",
        "en_us_009",
        "en_us_010",
        "en_male_narration",
        "en_male_funny",
        "en_female_emotional",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            endpoints: default_endpoint_configs(),
            voice: default_voice(),
            speed: default_speed(),
            timeout_secs: default_tts_timeout(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay(),
            chunk_limit: default_chunk_limit(),
            allowed_voices: default_allowed_voices(),
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// 流水线配置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// 句间间隔（毫秒）
    #[serde(default = "default_gap_ms")]
    pub gap_ms: u64,

    /// 启动时处理全部未处理条目
    #[serde(default = "default_true")]
    pub process_on_startup: bool,

    /// 命令队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_gap_ms() -> u64 {
    DEFAULT_GAP_MS
}

fn default_true() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    16
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gap_ms: default_gap_ms(),
            process_on_startup: true,
            queue_capacity: default_queue_capacity(),
        }
    }
}

// ============================================================================
// Video
// ============================================================================

/// 视频配置
#[derive(Debug, Clone, Deserialize)]
pub struct VideoConfig {
    /// 背景视频目录（*.mp4）
    #[serde(default = "default_background_dir")]
    pub background_dir: PathBuf,

    #[serde(default = "default_fps")]
    pub fps: u32,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_video_bitrate")]
    pub video_bitrate: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// 字幕样式（ASS force_style）
    #[serde(default = "default_subtitle_style")]
    pub subtitle_style: String,

    /// 不烧录文字的前置字幕条数
    #[serde(default = "default_suppressed")]
    pub suppressed_leading_cues: usize,

    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: PathBuf,

    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: PathBuf,

    /// 单次渲染超时（秒）
    #[serde(default = "default_render_timeout")]
    pub render_timeout_secs: u64,
}

fn default_background_dir() -> PathBuf {
    PathBuf::from("data/backgrounds")
}

fn default_fps() -> u32 {
    60
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_video_bitrate() -> String {
    "8000k".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_subtitle_style() -> String {
    "FontName=Tahoma,Bold=1,FontSize=13,PrimaryColour=&H00FFFFFF,Alignment=10".to_string()
}

fn default_suppressed() -> usize {
    2
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_render_timeout() -> u64 {
    1800
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            background_dir: default_background_dir(),
            fps: default_fps(),
            video_codec: default_video_codec(),
            video_bitrate: default_video_bitrate(),
            audio_codec: default_audio_codec(),
            subtitle_style: default_subtitle_style(),
            suppressed_leading_cues: default_suppressed(),
            ffmpeg_path: default_ffmpeg(),
            ffprobe_path: default_ffprobe(),
            render_timeout_secs: default_render_timeout(),
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 条目临时目录的根
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// 成品（wav/srt/mp4）目录
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// 标题图片目录（`{id}.png`）
    #[serde(default = "default_title_image_dir")]
    pub title_image_dir: PathBuf,
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("data/temp")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/output")
}

fn default_title_image_dir() -> PathBuf {
    PathBuf::from("data/titles")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            output_dir: default_output_dir(),
            title_image_dir: default_title_image_dir(),
        }
    }
}

// ============================================================================
// Database
// ============================================================================

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/storyreel.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

// ============================================================================
// Filter
// ============================================================================

/// 字面替换规则
#[derive(Debug, Clone, Deserialize)]
pub struct ReplacementConfig {
    pub from: String,
    pub to: String,
}

/// 内容过滤配置
#[derive(Debug, Clone, Deserialize)]
pub struct FilterSettings {
    /// 屏蔽字符
    #[serde(default = "default_mask_char")]
    pub mask_char: char,

    /// 替换规则（按顺序应用）
    #[serde(default = "default_replacements")]
    pub replacements: Vec<ReplacementConfig>,

    /// 首次启动时写入的过滤词
    #[serde(default = "default_words")]
    pub default_words: Vec<String>,
}

fn default_mask_char() -> char {
    DEFAULT_MASK_CHAR
}

fn default_replacements() -> Vec<ReplacementConfig> {
    default_replacement_rules()
        .into_iter()
        .map(|r| ReplacementConfig { from: r.from, to: r.to })
        .collect()
}

fn default_words() -> Vec<String> {
    [
        "fuck", "fucking", "fucked", "shit", "bitch", "bastard", "cunt", "dick", "cock",
        "pussy", "whore", "slut", "damn", "piss", "twat", "wanker",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            mask_char: default_mask_char(),
            replacements: default_replacements(),
            default_words: default_words(),
        }
    }
}

// ============================================================================
// Log
// ============================================================================

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别（RUST_LOG 优先）
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 输出 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ============================================================================
// 转换为组件配置
// ============================================================================

impl TtsConfig {
    /// HTTP 客户端配置
    pub fn http_client_config(&self) -> crate::infrastructure::adapters::HttpTtsClientConfig {
        use crate::infrastructure::adapters::{HttpTtsClientConfig, TtsEndpoint};

        let endpoints = self
            .endpoints
            .iter()
            .map(|e| TtsEndpoint::new(e.url.clone(), e.shape))
            .collect();

        HttpTtsClientConfig {
            endpoints,
            timeout_secs: self.timeout_secs,
            max_attempts: self.max_attempts,
            retry_delay: std::time::Duration::from_secs(self.retry_delay_secs),
            chunk_limit: self.chunk_limit,
            allowed_voices: self.allowed_voices.clone(),
        }
    }

    pub fn script_builder_config(&self) -> crate::application::pipeline::ScriptBuilderConfig {
        crate::application::pipeline::ScriptBuilderConfig {
            voice: self.voice.clone(),
            speed: self.speed,
        }
    }
}

impl VideoConfig {
    pub fn composer_config(&self) -> crate::application::pipeline::VideoComposerConfig {
        crate::application::pipeline::VideoComposerConfig {
            encoding: crate::application::ports::EncodingSettings {
                fps: self.fps,
                video_codec: self.video_codec.clone(),
                video_bitrate: self.video_bitrate.clone(),
                audio_codec: self.audio_codec.clone(),
                subtitle_style: self.subtitle_style.clone(),
            },
            suppressed_leading_cues: self.suppressed_leading_cues,
        }
    }

    pub fn ffmpeg_config(&self) -> crate::infrastructure::adapters::FfmpegBackendConfig {
        crate::infrastructure::adapters::FfmpegBackendConfig {
            ffmpeg_path: self.ffmpeg_path.clone(),
            ffprobe_path: self.ffprobe_path.clone(),
            render_timeout_secs: self.render_timeout_secs,
        }
    }
}

impl FilterSettings {
    pub fn filter_config(&self) -> crate::domain::FilterConfig {
        crate::domain::FilterConfig {
            mask_char: self.mask_char,
            replacements: self
                .replacements
                .iter()
                .map(|r| crate::domain::ReplacementRule::new(r.from.clone(), r.to.clone()))
                .collect(),
        }
    }
}

impl DatabaseConfig {
    pub fn pool_config(&self) -> crate::infrastructure::persistence::sqlite::DatabaseConfig {
        crate::infrastructure::persistence::sqlite::DatabaseConfig {
            max_connections: self.max_connections,
            ..crate::infrastructure::persistence::sqlite::DatabaseConfig::new(&self.path)
        }
    }
}
