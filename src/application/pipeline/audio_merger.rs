//! Audio Merger - 合并句子音频
//!
//! 严格按片段携带的序号拼接，相邻片段之间插入固定时长的静音，
//! 合并结果落盘后才删除临时片段。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use super::script_builder::SynthesizedClip;
use crate::application::ports::{
    frames_for_ms, ArtifactStoragePort, AudioCodecPort, CodecError, PcmAudio, StorageError,
};

/// 合并错误
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("No clips to merge")]
    NoClips,

    #[error("Duplicate clip index: {0}")]
    DuplicateIndex(usize),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Merge task failed: {0}")]
    Join(String),
}

/// 合并后的音轨
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedAudioTrack {
    pub path: PathBuf,
    pub total_duration_ms: u64,
    pub sample_rate: u32,
    pub channels: u16,
}

impl MergedAudioTrack {
    pub fn total_duration_secs(&self) -> f64 {
        self.total_duration_ms as f64 / 1000.0
    }
}

pub struct AudioMerger {
    codec: Arc<dyn AudioCodecPort>,
    storage: Arc<dyn ArtifactStoragePort>,
}

impl AudioMerger {
    pub fn new(codec: Arc<dyn AudioCodecPort>, storage: Arc<dyn ArtifactStoragePort>) -> Self {
        Self { codec, storage }
    }

    /// 合并片段并写入 `output`
    pub async fn merge(
        &self,
        clips: &[SynthesizedClip],
        gap_ms: u64,
        output: &Path,
    ) -> Result<MergedAudioTrack, MergeError> {
        if clips.is_empty() {
            return Err(MergeError::NoClips);
        }

        let mut ordered: Vec<&SynthesizedClip> = clips.iter().collect();
        ordered.sort_by_key(|clip| clip.index);
        if let Some(pair) = ordered.windows(2).find(|w| w[0].index == w[1].index) {
            return Err(MergeError::DuplicateIndex(pair[0].index));
        }

        let mut encoded = Vec::with_capacity(ordered.len());
        for clip in &ordered {
            let data = tokio::fs::read(&clip.path)
                .await
                .map_err(|e| StorageError::IoError(format!("{}: {}", clip.path.display(), e)))?;
            encoded.push(data);
        }

        let codec = self.codec.clone();
        let (wav, merged) = tokio::task::spawn_blocking(move || concat_with_gaps(codec.as_ref(), &encoded, gap_ms))
            .await
            .map_err(|e| MergeError::Join(e.to_string()))??;

        self.storage.write_durable(output, &wav).await?;

        for clip in &ordered {
            if let Err(e) = self.storage.remove_file(&clip.path).await {
                tracing::warn!(path = %clip.path.display(), error = %e, "Failed to remove clip");
            }
        }

        let track = MergedAudioTrack {
            path: output.to_path_buf(),
            total_duration_ms: merged.duration_ms(),
            sample_rate: merged.sample_rate,
            channels: merged.channels,
        };

        tracing::debug!(
            clips = ordered.len(),
            total_ms = track.total_duration_ms,
            path = %track.path.display(),
            "Audio merged"
        );

        Ok(track)
    }
}

/// 解码、统一格式、插入静音并编码为 WAV
///
/// 第一个片段的采样率和声道数决定输出格式。
fn concat_with_gaps(
    codec: &dyn AudioCodecPort,
    encoded: &[Vec<u8>],
    gap_ms: u64,
) -> Result<(Vec<u8>, PcmAudio), MergeError> {
    let mut merged: Option<PcmAudio> = None;

    for data in encoded {
        let pcm = codec.decode(data)?;
        match merged.as_mut() {
            None => merged = Some(pcm),
            Some(track) => {
                let pcm = if pcm.sample_rate != track.sample_rate || pcm.channels != track.channels {
                    codec.conform(&pcm, track.sample_rate, track.channels)?
                } else {
                    pcm
                };
                let gap_frames = frames_for_ms(track.sample_rate, gap_ms);
                track
                    .samples
                    .extend(std::iter::repeat(0.0).take(gap_frames * track.channels as usize));
                track.append(&pcm)?;
            }
        }
    }

    let merged = merged.ok_or(MergeError::NoClips)?;
    let wav = codec.encode_wav(&merged)?;
    Ok((wav, merged))
}
