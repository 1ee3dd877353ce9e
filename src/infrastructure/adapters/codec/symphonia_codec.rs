//! Symphonia Codec - 基于 symphonia 的音频编解码器
//!
//! 支持：
//! - 16 位 PCM WAV 直接解析（样本数精确，不经过解码器）
//! - 其他格式（MP3 等）通过 symphonia 解码
//! - WAV 编码、线性重采样、声道转换
//! - 分块丢弃 + 交叉淡化的变速

use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{frames_for_ms, AudioCodecPort, AudioInfo, CodecError, PcmAudio};

/// 变速分块长度（毫秒）
const SPEEDUP_CHUNK_MS: u64 = 150;
/// 变速交叉淡化上限（毫秒）
const SPEEDUP_CROSSFADE_MS: u64 = 25;

/// 音频编解码器
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaCodec;

impl SymphoniaCodec {
    pub fn new() -> Self {
        Self
    }

    /// 解析 WAV 文件头
    fn parse_wav_header(&self, data: &[u8]) -> Result<WavHeader, CodecError> {
        if data.len() < 44 {
            return Err(CodecError::InvalidInput("WAV data too short".to_string()));
        }

        if &data[0..4] != b"RIFF" {
            return Err(CodecError::InvalidInput(
                "Invalid WAV: missing RIFF header".to_string(),
            ));
        }

        if &data[8..12] != b"WAVE" {
            return Err(CodecError::InvalidInput(
                "Invalid WAV: missing WAVE identifier".to_string(),
            ));
        }

        let mut pos = 12;
        let mut fmt_chunk: Option<FmtChunk> = None;
        let mut data_chunk: Option<(usize, usize)> = None;

        while pos + 8 <= data.len() {
            let chunk_id = &data[pos..pos + 4];
            let chunk_size =
                u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
                    as usize;

            match chunk_id {
                b"fmt " => {
                    if chunk_size < 16 || pos + 8 + 16 > data.len() {
                        return Err(CodecError::InvalidInput(
                            "Invalid fmt chunk size".to_string(),
                        ));
                    }
                    let fmt = &data[pos + 8..pos + 8 + 16];
                    fmt_chunk = Some(FmtChunk {
                        audio_format: u16::from_le_bytes([fmt[0], fmt[1]]),
                        num_channels: u16::from_le_bytes([fmt[2], fmt[3]]),
                        sample_rate: u32::from_le_bytes([fmt[4], fmt[5], fmt[6], fmt[7]]),
                        bits_per_sample: u16::from_le_bytes([fmt[14], fmt[15]]),
                    });
                }
                b"data" => {
                    let start = pos + 8;
                    // 流式写入的 WAV 可能把 data 长度写成占位值
                    let size = chunk_size.min(data.len() - start);
                    data_chunk = Some((start, size));
                    break;
                }
                _ => {}
            }

            pos += 8 + chunk_size;
            // 对齐到偶数字节
            if chunk_size % 2 != 0 {
                pos += 1;
            }
        }

        let fmt = fmt_chunk.ok_or_else(|| {
            CodecError::InvalidInput("Invalid WAV: missing fmt chunk".to_string())
        })?;
        let (data_start, data_size) = data_chunk.ok_or_else(|| {
            CodecError::InvalidInput("Invalid WAV: missing data chunk".to_string())
        })?;

        Ok(WavHeader {
            fmt,
            data_start,
            data_size,
        })
    }

    /// 直接读取 16 位 PCM 样本
    fn decode_pcm16(&self, data: &[u8], header: &WavHeader) -> PcmAudio {
        let bytes = &data[header.data_start..header.data_start + header.data_size];
        let samples = bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
            .collect();
        PcmAudio::new(samples, header.fmt.sample_rate, header.fmt.num_channels)
    }

    /// 使用 symphonia 解码
    fn decode_with_symphonia(&self, data: &[u8]) -> Result<PcmAudio, CodecError> {
        let cursor = Cursor::new(data.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &Hint::new(),
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| CodecError::UnsupportedFormat(format!("Probe failed: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| CodecError::DecodingError("No audio track found".to_string()))?;

        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count() as u16);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| CodecError::DecodingError(format!("Decoder creation failed: {}", e)))?;

        let mut samples: Vec<f32> = Vec::new();
        let track_id = track.id;

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    return Err(CodecError::DecodingError(format!(
                        "Packet read error: {}",
                        e
                    )));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(error = %e, "Decode error, skipping packet");
                    continue;
                }
            };

            let spec = *decoded.spec();
            sample_rate.get_or_insert(spec.rate);
            channels.get_or_insert(spec.channels.count() as u16);

            let num_frames = decoded.frames();
            let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            let actual_samples = num_frames * spec.channels.count();
            samples.extend(&sample_buf.samples()[..actual_samples]);
        }

        let sample_rate = sample_rate
            .ok_or_else(|| CodecError::DecodingError("Unknown sample rate".to_string()))?;
        let channels =
            channels.ok_or_else(|| CodecError::DecodingError("Unknown channel count".to_string()))?;

        Ok(PcmAudio::new(samples, sample_rate, channels))
    }
}

#[derive(Debug)]
struct WavHeader {
    fmt: FmtChunk,
    data_start: usize,
    data_size: usize,
}

#[derive(Debug)]
struct FmtChunk {
    audio_format: u16,
    num_channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

impl AudioCodecPort for SymphoniaCodec {
    fn decode(&self, data: &[u8]) -> Result<PcmAudio, CodecError> {
        if let Ok(header) = self.parse_wav_header(data) {
            if header.fmt.audio_format == 1 && header.fmt.bits_per_sample == 16 {
                return Ok(self.decode_pcm16(data, &header));
            }
        }
        self.decode_with_symphonia(data)
    }

    fn encode_wav(&self, pcm: &PcmAudio) -> Result<Vec<u8>, CodecError> {
        if pcm.sample_rate == 0 || pcm.channels == 0 {
            return Err(CodecError::EncodingError(format!(
                "invalid format: {}Hz/{}ch",
                pcm.sample_rate, pcm.channels
            )));
        }

        let bits_per_sample: u16 = 16;
        let num_channels = pcm.channels;
        let sample_rate = pcm.sample_rate;
        let byte_rate = sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
        let block_align = num_channels * (bits_per_sample / 8);

        let data_size = pcm.samples.len() * 2;
        let file_size = 36 + data_size;

        let mut wav = Vec::with_capacity(44 + data_size);

        // RIFF header
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(file_size as u32).to_le_bytes());
        wav.extend_from_slice(b"WAVE");

        // fmt chunk
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&num_channels.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&(data_size as u32).to_le_bytes());

        for &s in &pcm.samples {
            let sample = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            wav.extend_from_slice(&sample.to_le_bytes());
        }

        Ok(wav)
    }

    fn wav_info(&self, wav_data: &[u8]) -> Result<AudioInfo, CodecError> {
        let header = self.parse_wav_header(wav_data)?;

        let frame_bytes =
            (header.fmt.bits_per_sample as usize / 8) * header.fmt.num_channels as usize;
        let frames = if frame_bytes > 0 {
            header.data_size / frame_bytes
        } else {
            0
        };

        let duration_ms = if header.fmt.sample_rate > 0 {
            (frames as u64 * 1000) / header.fmt.sample_rate as u64
        } else {
            0
        };

        Ok(AudioInfo {
            duration_ms,
            sample_rate: header.fmt.sample_rate,
            channels: header.fmt.num_channels,
            bits_per_sample: header.fmt.bits_per_sample,
            data_size: header.data_size,
        })
    }

    fn change_speed(&self, pcm: &PcmAudio, speed: f32) -> Result<PcmAudio, CodecError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(CodecError::InvalidInput(format!("invalid speed: {}", speed)));
        }
        if (speed - 1.0).abs() < f32::EPSILON {
            return Ok(pcm.clone());
        }
        if speed < 1.0 {
            // 放慢：拉长样本后按原采样率播放
            let target = (pcm.sample_rate as f64 / speed as f64).round() as u32;
            let samples = resample(&pcm.samples, pcm.sample_rate, target, pcm.channels);
            return Ok(PcmAudio::new(samples, pcm.sample_rate, pcm.channels));
        }
        Ok(speedup(pcm, speed as f64))
    }

    fn conform(
        &self,
        pcm: &PcmAudio,
        sample_rate: u32,
        channels: u16,
    ) -> Result<PcmAudio, CodecError> {
        if sample_rate == 0 || channels == 0 {
            return Err(CodecError::InvalidInput(format!(
                "invalid target format: {}Hz/{}ch",
                sample_rate, channels
            )));
        }

        let remixed = remix(&pcm.samples, pcm.channels, channels);
        let samples = resample(&remixed, pcm.sample_rate, sample_rate, channels);
        Ok(PcmAudio::new(samples, sample_rate, channels))
    }
}

/// 简单线性重采样
fn resample(samples: &[f32], from_rate: u32, to_rate: u32, channels: u16) -> Vec<f32> {
    if from_rate == to_rate || from_rate == 0 || channels == 0 {
        return samples.to_vec();
    }

    let channel_count = channels as usize;
    let frame_count = samples.len() / channel_count;
    if frame_count == 0 {
        return Vec::new();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let new_frame_count = (frame_count as f64 * ratio).round() as usize;
    let mut resampled = Vec::with_capacity(new_frame_count * channel_count);

    for i in 0..new_frame_count {
        let src_pos = i as f64 / ratio;
        let src_idx = (src_pos as usize).min(frame_count - 1);
        let frac = src_pos - src_idx as f64;

        for ch in 0..channel_count {
            let idx0 = src_idx * channel_count + ch;
            let idx1 = ((src_idx + 1).min(frame_count - 1)) * channel_count + ch;

            let s0 = samples[idx0];
            let s1 = samples[idx1];

            // 线性插值
            resampled.push(s0 + (s1 - s0) * frac as f32);
        }
    }

    resampled
}

/// 声道转换（下混取平均，上混复制）
fn remix(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    if from == to || from == 0 {
        return samples.to_vec();
    }

    let from = from as usize;
    let to = to as usize;
    let mut out = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        if to < from {
            let mean = frame.iter().sum::<f32>() / from as f32;
            out.extend(std::iter::repeat(mean).take(to));
        } else {
            for ch in 0..to {
                out.push(frame[ch.min(from - 1)]);
            }
        }
    }
    out
}

/// 分块丢弃 + 交叉淡化变速（保持音高）
///
/// 每个 `chunk + remove` 长度的块只保留前 `chunk` 部分，
/// 相邻块用最长 25ms 的线性交叉淡化拼接；音频不足两块时原样返回。
fn speedup(pcm: &PcmAudio, speed: f64) -> PcmAudio {
    let atk = 1.0 / speed;
    let (chunk_ms, remove_ms) = if speed < 2.0 {
        (
            SPEEDUP_CHUNK_MS,
            (SPEEDUP_CHUNK_MS as f64 * (1.0 - atk) / atk) as u64,
        )
    } else {
        (
            (atk * SPEEDUP_CHUNK_MS as f64 / (1.0 - atk)) as u64,
            SPEEDUP_CHUNK_MS,
        )
    };
    let crossfade_ms = SPEEDUP_CROSSFADE_MS.min(remove_ms.saturating_sub(1));

    let ch = pcm.channels.max(1) as usize;
    let block = frames_for_ms(pcm.sample_rate, chunk_ms + remove_ms);
    let cut = frames_for_ms(pcm.sample_rate, remove_ms - crossfade_ms);
    let fade = frames_for_ms(pcm.sample_rate, crossfade_ms);

    let frames: Vec<&[f32]> = pcm.samples.chunks(block * ch).collect();
    if block == 0 || frames.len() < 2 {
        return pcm.clone();
    }

    let (last, body) = match frames.split_last() {
        Some(split) => split,
        None => return pcm.clone(),
    };

    let mut out: Vec<f32> = Vec::with_capacity(pcm.samples.len());
    for (i, chunk) in body.iter().enumerate() {
        let keep = chunk.len().saturating_sub(cut * ch);
        let piece = &chunk[..keep];
        if i == 0 {
            out.extend_from_slice(piece);
        } else {
            crossfade_append(&mut out, piece, fade * ch, ch);
        }
    }
    out.extend_from_slice(last);

    PcmAudio::new(out, pcm.sample_rate, pcm.channels)
}

/// 交叉淡化拼接：out 末尾 `fade` 个样本与 next 开头重叠
fn crossfade_append(out: &mut Vec<f32>, next: &[f32], fade: usize, channels: usize) {
    let fade = fade.min(out.len()).min(next.len());
    let fade_frames = fade / channels;
    if fade_frames == 0 {
        out.extend_from_slice(next);
        return;
    }
    let fade = fade_frames * channels;

    let start = out.len() - fade;
    for f in 0..fade_frames {
        let t = (f as f32 + 0.5) / fade_frames as f32;
        for c in 0..channels {
            let idx = f * channels + c;
            out[start + idx] = out[start + idx] * (1.0 - t) + next[idx] * t;
        }
    }
    out.extend_from_slice(&next[fade..]);
}
