//! TTS Engine Port - 语音合成引擎抽象
//!
//! 定义语音合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use super::CodecError;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Text is empty")]
    EmptyText,

    #[error("Invalid voice: {0}")]
    InvalidVoice(String),

    #[error("No TTS endpoint available after {attempts} attempts")]
    ServiceUnavailable { attempts: u32 },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Audio codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("IO error: {0}")]
    Io(String),
}

impl TtsError {
    /// 输入类错误：跳过当前句子即可，不影响整个条目
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, TtsError::EmptyText | TtsError::InvalidVoice(_))
    }

    /// 服务暂时不可用（网络、超时、所有端点不可达）
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TtsError::ServiceUnavailable { .. } | TtsError::NetworkError(_) | TtsError::Timeout
        )
    }

    /// 单个端点的请求失败，可换下一个端点重试
    pub fn is_endpoint_failure(&self) -> bool {
        matches!(
            self,
            TtsError::NetworkError(_) | TtsError::Timeout | TtsError::InvalidResponse(_)
        )
    }
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的文本
    pub text: String,
    /// 音色 ID
    pub voice: String,
    /// 语速倍率（1.0 表示不变速）
    pub speed: f32,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
            speed: 1.0,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

/// 合成结果
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// WAV 音频数据
    pub audio_data: Vec<u8>,
    /// 音频时长（毫秒）
    pub duration_ms: u64,
    /// 发出请求的端点（离线引擎为 None）
    pub endpoint: Option<String>,
    /// 文本被切分的块数
    pub chunk_count: usize,
}

/// TTS Engine Port
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 合成一段文本
    ///
    /// 超长文本由实现负责切块并按原顺序拼接。
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedAudio, TtsError>;

    /// 测量已写入磁盘的音频时长（毫秒）
    ///
    /// 文件不存在时返回 0。
    async fn duration(&self, audio_path: &Path) -> Result<u64, TtsError>;

    /// 检查 TTS 服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
