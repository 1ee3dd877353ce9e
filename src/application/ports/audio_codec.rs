//! Audio Codec Port - 音频编解码抽象
//!
//! 流水线只在 PCM 层面拼接音频：TTS 返回的 MP3/WAV 先解码为 PCM，
//! 拼接、变速、插入静音后再统一编码为 WAV。

use thiserror::Error;

/// 编解码错误
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// 交错排列的 f32 PCM 音频
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// 指定时长的静音
    pub fn silence(sample_rate: u32, channels: u16, duration_ms: u64) -> Self {
        let frames = frames_for_ms(sample_rate, duration_ms);
        Self::new(
            vec![0.0; frames * channels.max(1) as usize],
            sample_rate,
            channels,
        )
    }

    /// 帧数（每声道样本数）
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// 时长（毫秒，向下取整）
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 追加同格式的音频
    pub fn append(&mut self, other: &PcmAudio) -> Result<(), CodecError> {
        if other.sample_rate != self.sample_rate || other.channels != self.channels {
            return Err(CodecError::InvalidInput(format!(
                "format mismatch: {}Hz/{}ch vs {}Hz/{}ch",
                self.sample_rate, self.channels, other.sample_rate, other.channels
            )));
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }
}

/// 毫秒对应的帧数（四舍五入）
pub fn frames_for_ms(sample_rate: u32, duration_ms: u64) -> usize {
    ((sample_rate as u64 * duration_ms + 500) / 1000) as usize
}

/// WAV 头信息
#[derive(Debug, Clone)]
pub struct AudioInfo {
    /// 时长（毫秒）
    pub duration_ms: u64,
    /// 采样率
    pub sample_rate: u32,
    /// 声道数
    pub channels: u16,
    /// 位深度
    pub bits_per_sample: u16,
    /// 数据大小（字节）
    pub data_size: usize,
}

/// Audio Codec Port
///
/// CPU 密集的同步接口，由调用方决定是否放入阻塞线程池。
pub trait AudioCodecPort: Send + Sync {
    /// 解码任意受支持的格式（WAV、MP3）为 PCM
    fn decode(&self, data: &[u8]) -> Result<PcmAudio, CodecError>;

    /// 编码为 16 位 PCM WAV
    fn encode_wav(&self, pcm: &PcmAudio) -> Result<Vec<u8>, CodecError>;

    /// 读取 WAV 头信息（不解码）
    fn wav_info(&self, wav_data: &[u8]) -> Result<AudioInfo, CodecError>;

    /// 变速（speed > 1 加快，speed < 1 放慢）
    fn change_speed(&self, pcm: &PcmAudio, speed: f32) -> Result<PcmAudio, CodecError>;

    /// 转换为指定采样率和声道数
    fn conform(
        &self,
        pcm: &PcmAudio,
        sample_rate: u32,
        channels: u16,
    ) -> Result<PcmAudio, CodecError>;

    /// 测量任意受支持格式的时长
    fn duration_ms(&self, data: &[u8]) -> Result<u64, CodecError> {
        match self.wav_info(data) {
            Ok(info) => Ok(info.duration_ms),
            Err(_) => Ok(self.decode(data)?.duration_ms()),
        }
    }
}
