//! 流水线错误
//!
//! 单个条目运行中的所有失败都汇总为 PipelineError，
//! 编排器据此把条目标记为失败并继续下一个条目。

use thiserror::Error;

use super::audio_merger::MergeError;
use crate::application::ports::{RenderError, RepositoryError, StorageError, TtsError};
use crate::domain::SubtitleError;

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// TTS 端点不可用（已重试并切换端点）
    TransientService,
    /// 输入无效（空文本、未知音色、过滤后为空）
    InvalidInput,
    /// 渲染失败（背景过短、编码失败、素材缺失）
    Render,
    /// 状态存储写入失败
    Persistence,
    /// 其他内部错误
    Internal,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::TransientService => "transient_service",
            ErrorClass::InvalidInput => "invalid_input",
            ErrorClass::Render => "render",
            ErrorClass::Persistence => "persistence",
            ErrorClass::Internal => "internal",
        }
    }
}

/// 流水线错误
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Script is empty: no sentence could be synthesized")]
    EmptyScript,

    #[error("TTS failed on sentence {index}: {source}")]
    Synthesis {
        index: usize,
        #[source]
        source: TtsError,
    },

    #[error("Audio merge failed: {0}")]
    Merge(#[from] MergeError),

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] RepositoryError),
}

impl PipelineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::EmptyScript => ErrorClass::InvalidInput,
            PipelineError::Synthesis { source, .. } => {
                if source.is_transient() {
                    ErrorClass::TransientService
                } else if source.is_invalid_input() {
                    ErrorClass::InvalidInput
                } else {
                    ErrorClass::Internal
                }
            }
            PipelineError::Render(_) | PipelineError::Subtitle(_) => ErrorClass::Render,
            PipelineError::Merge(MergeError::NoClips) => ErrorClass::InvalidInput,
            PipelineError::Merge(_) | PipelineError::Storage(_) => ErrorClass::Internal,
            PipelineError::Persistence(_) => ErrorClass::Persistence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        let unavailable = PipelineError::Synthesis {
            index: 0,
            source: TtsError::ServiceUnavailable { attempts: 3 },
        };
        assert_eq!(unavailable.class(), ErrorClass::TransientService);
        assert_eq!(PipelineError::EmptyScript.class(), ErrorClass::InvalidInput);
        assert_eq!(
            PipelineError::Render(RenderError::NoBackgrounds).class(),
            ErrorClass::Render
        );
        assert_eq!(
            PipelineError::Merge(MergeError::NoClips).class(),
            ErrorClass::InvalidInput
        );
    }
}
