//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod artifact_storage;
mod audio_codec;
mod job_control;
mod media_backend;
mod repositories;
mod tts_engine;

pub use artifact_storage::{ArtifactStoragePort, OutputPaths, StorageError};
pub use audio_codec::{frames_for_ms, AudioCodecPort, AudioInfo, CodecError, PcmAudio};
pub use job_control::{ActiveJob, JobClaimPort, JobCommand, JobControlError, JobQueuePort};
pub use media_backend::{
    EncodingSettings, MediaBackendPort, MediaInfo, RenderError, RenderPlan, TitleOverlay,
};
pub use repositories::{
    FilterWordRepositoryPort, JobRecord, JobRepositoryPort, NewJob, RegisterOutcome,
    RepositoryError,
};
pub use tts_engine::{SynthesisRequest, SynthesizedAudio, TtsEnginePort, TtsError};
