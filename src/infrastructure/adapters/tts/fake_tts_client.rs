//! Fake TTS Client - 用于测试的 TTS 客户端
//!
//! 不调用任何外部服务，按文本长度生成静音 WAV

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{
    AudioCodecPort, PcmAudio, SynthesisRequest, SynthesizedAudio, TtsEnginePort, TtsError,
};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 每个字符对应的时长（毫秒）
    pub ms_per_char: u64,
    /// 最短时长（毫秒）
    pub min_duration_ms: u64,
    /// 采样率
    pub sample_rate: u32,
    /// 模拟推理延迟（毫秒）
    pub latency_ms: u64,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            ms_per_char: 40,
            min_duration_ms: 200,
            sample_rate: 16000,
            latency_ms: 0,
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
    codec: Arc<dyn AudioCodecPort>,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig, codec: Arc<dyn AudioCodecPort>) -> Self {
        tracing::info!(
            sample_rate = config.sample_rate,
            ms_per_char = config.ms_per_char,
            "FakeTtsClient initialized"
        );
        Self { config, codec }
    }

    /// 使用默认配置创建
    pub fn with_defaults(codec: Arc<dyn AudioCodecPort>) -> Self {
        Self::new(FakeTtsClientConfig::default(), codec)
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedAudio, TtsError> {
        let chars = request.text.trim().chars().count() as u64;
        if chars == 0 {
            return Err(TtsError::EmptyText);
        }

        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        let natural_ms = (chars * self.config.ms_per_char).max(self.config.min_duration_ms);
        let duration_ms = if request.speed > 0.0 {
            (natural_ms as f64 / request.speed as f64).round() as u64
        } else {
            natural_ms
        };

        let pcm = PcmAudio::silence(self.config.sample_rate, 1, duration_ms);
        let audio_data = self.codec.encode_wav(&pcm)?;

        tracing::debug!(
            text_len = chars,
            voice = %request.voice,
            duration_ms = pcm.duration_ms(),
            "FakeTtsClient: generated silence"
        );

        Ok(SynthesizedAudio {
            audio_data,
            duration_ms: pcm.duration_ms(),
            endpoint: None,
            chunk_count: 1,
        })
    }

    async fn duration(&self, audio_path: &Path) -> Result<u64, TtsError> {
        let data = match tokio::fs::read(audio_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(TtsError::Io(e.to_string())),
        };
        Ok(self.codec.duration_ms(&data)?)
    }
}
