//! Pipeline - 条目级内容到视频流水线
//!
//! - ScriptBuilder: 逐句合成并测量时长
//! - AudioMerger: 按序号拼接音频并插入间隔
//! - VideoComposer: 背景选择、标题叠加、字幕烧录
//! - PipelineOrchestrator: 状态驱动的批量编排

mod audio_merger;
mod error;
mod orchestrator;
mod script_builder;
mod video_composer;

#[cfg(test)]
pub(crate) mod test_support;

pub use audio_merger::{AudioMerger, MergeError, MergedAudioTrack};
pub use error::{ErrorClass, PipelineError};
pub use orchestrator::{
    BatchReport, ItemOutcome, OrchestratorConfig, OrchestratorError, PipelineOrchestrator,
    SkipReason,
};
pub use script_builder::{BuiltScript, ScriptBuilder, ScriptBuilderConfig, SynthesizedClip};
pub use video_composer::{
    pick_trim_start, select_burned_cues, BackgroundClip, BackgroundPool, RenderContext,
    RenderRequest, VideoComposer, VideoComposerConfig,
};
