//! Domain Layer - 领域层
//!
//! - Job Context: 视频任务状态机
//! - 内容过滤、分块、脚本、字幕等纯函数模块

pub mod job;

mod content_filter;
mod script;
mod subtitle;
mod text_chunker;
mod text_repair;

pub use content_filter::{
    default_replacement_rules, expand_demographics, mask_word, ContentFilter, FilterConfig,
    ReplacementRule, DEFAULT_MASK_CHAR,
};
pub use script::{Script, ScriptEntry, Sentence};
pub use subtitle::{
    first_cue_duration_ms, format_timestamp, generate_cues, parse_srt, parse_timestamp,
    render_srt, SubtitleCue, SubtitleError, DEFAULT_GAP_MS,
};
pub use text_chunker::{split_into_chunks, DEFAULT_CHUNK_LIMIT};
pub use text_repair::normalize_text;
