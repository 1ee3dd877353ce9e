//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. config.local.toml
//! 3. config.toml
//! 4. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, TtsEngineKind};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 以逗号分隔解析的列表键
const LIST_KEYS: &[&str] = &["tts.allowed_voices", "filter.default_words"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `STORYREEL_SERVER__PORT=8080`
/// - `STORYREEL_TTS__ENGINE=fake`
/// - `STORYREEL_TTS__ALLOWED_VOICES=en_us_006,en_us_010`
/// - `STORYREEL_VIDEO__BACKGROUND_DIR=/data/backgrounds`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 标量默认值；列表和嵌套结构由 serde 默认值补齐
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5060)?
        .set_default("tts.engine", "http")?
        .set_default("tts.voice", "en_us_006")?
        .set_default("database.path", "data/storyreel.db")?
        .set_default("database.max_connections", 5)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 前缀 STORYREEL_，层级分隔符 __
    let mut env = Environment::with_prefix("STORYREEL")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",");
    for key in LIST_KEYS {
        env = env.with_list_parse_key(key);
    }
    builder = builder.add_source(env);

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("Server port cannot be 0"));
    }

    let tts = &config.tts;
    if tts.engine == TtsEngineKind::Http {
        if tts.endpoints.is_empty() {
            return Err(invalid("At least one TTS endpoint is required"));
        }
        for endpoint in &tts.endpoints {
            let url = reqwest::Url::parse(&endpoint.url)
                .map_err(|e| invalid(format!("Invalid TTS endpoint {}: {}", endpoint.url, e)))?;
            if url.host_str().is_none() {
                return Err(invalid(format!("TTS endpoint has no host: {}", endpoint.url)));
            }
        }
    }
    if !(tts.speed.is_finite() && tts.speed > 0.0 && tts.speed <= 4.0) {
        return Err(invalid(format!("TTS speed must be in (0, 4]: {}", tts.speed)));
    }
    if tts.max_attempts == 0 {
        return Err(invalid("TTS max_attempts cannot be 0"));
    }
    if tts.timeout_secs == 0 {
        return Err(invalid("TTS timeout cannot be 0"));
    }
    if tts.chunk_limit == 0 {
        return Err(invalid("TTS chunk_limit cannot be 0"));
    }
    if tts.voice.trim().is_empty() {
        return Err(invalid("TTS voice cannot be empty"));
    }
    if !tts.allowed_voices.is_empty() && !tts.allowed_voices.contains(&tts.voice) {
        return Err(invalid(format!("TTS voice is not allowed: {}", tts.voice)));
    }

    if config.pipeline.queue_capacity == 0 {
        return Err(invalid("Pipeline queue_capacity cannot be 0"));
    }

    let video = &config.video;
    if video.fps == 0 {
        return Err(invalid("Video fps cannot be 0"));
    }
    if video.render_timeout_secs == 0 {
        return Err(invalid("Render timeout cannot be 0"));
    }
    if video.video_codec.is_empty() || video.audio_codec.is_empty() {
        return Err(invalid("Video and audio codecs cannot be empty"));
    }

    if config.database.path.is_empty() {
        return Err(invalid("Database path cannot be empty"));
    }

    if config
        .filter
        .replacements
        .iter()
        .any(|r| r.from.is_empty())
    {
        return Err(invalid("Replacement rule source cannot be empty"));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("TTS Engine: {:?}", config.tts.engine);
    if config.tts.engine == TtsEngineKind::Http {
        for endpoint in &config.tts.endpoints {
            tracing::info!("TTS Endpoint: {} ({:?})", endpoint.url, endpoint.shape);
        }
    }
    tracing::info!("TTS Voice: {} @ {}x", config.tts.voice, config.tts.speed);
    tracing::info!(
        "TTS Retry: {} rounds, {}s apart",
        config.tts.max_attempts,
        config.tts.retry_delay_secs
    );
    tracing::info!("Sentence Gap: {}ms", config.pipeline.gap_ms);
    tracing::info!("Process On Startup: {}", config.pipeline.process_on_startup);
    tracing::info!("Backgrounds: {:?}", config.video.background_dir);
    tracing::info!(
        "Encoding: {} {} @ {}fps, {}",
        config.video.video_codec,
        config.video.video_bitrate,
        config.video.fps,
        config.video.audio_codec
    );
    tracing::info!("Temp Directory: {:?}", config.storage.temp_dir);
    tracing::info!("Output Directory: {:?}", config.storage.output_dir);
    tracing::info!("Title Images: {:?}", config.storage.title_image_dir);
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
