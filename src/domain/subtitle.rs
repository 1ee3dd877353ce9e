//! 字幕生成
//!
//! 由脚本推导字幕时间轴，并负责 SRT 格式的序列化与解析。
//! 字幕时间轴是唯一的计时依据：合并音轨使用相同的间隔。

use thiserror::Error;

use super::script::Script;

/// 默认句间间隔（毫秒）
pub const DEFAULT_GAP_MS: u64 = 100;

/// 字幕错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubtitleError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Malformed block {block}: {reason}")]
    MalformedBlock { block: usize, reason: String },

    #[error("Subtitle file has no cues")]
    Empty,
}

/// 字幕条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleCue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

impl SubtitleCue {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// 根据脚本生成字幕
///
/// - 第一条从 0 开始
/// - 结束 = 开始 + 该句时长
/// - 下一条开始 = 上一条结束 + gap
pub fn generate_cues(script: &Script, gap_ms: u64) -> Vec<SubtitleCue> {
    let mut cues = Vec::with_capacity(script.len());
    let mut cursor = 0u64;

    for entry in script.entries() {
        let start_ms = cursor;
        let end_ms = start_ms + entry.duration_ms;
        cues.push(SubtitleCue {
            start_ms,
            end_ms,
            text: entry.text.clone(),
        });
        cursor = end_ms + gap_ms;
    }

    cues
}

/// 格式化为 `HH:MM:SS,mmm`
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// 解析 `HH:MM:SS,mmm`（也接受 `.` 作为毫秒分隔符）
pub fn parse_timestamp(value: &str) -> Result<u64, SubtitleError> {
    let invalid = || SubtitleError::InvalidTimestamp(value.to_string());
    let value = value.trim();

    let (clock, millis) = value
        .split_once(',')
        .or_else(|| value.split_once('.'))
        .ok_or_else(invalid)?;

    let parts: Vec<&str> = clock.split(':').collect();
    if parts.len() != 3 || millis.len() != 3 {
        return Err(invalid());
    }

    let number = |s: &str| s.parse::<u64>().map_err(|_| invalid());
    let hours = number(parts[0])?;
    let minutes = number(parts[1])?;
    let seconds = number(parts[2])?;
    let millis = number(millis)?;
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }

    Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1000 + millis)
}

/// 序列化为 SRT 文本（块编号从 1 开始）
///
/// 文本中的空行会被去掉，空行是块分隔符。
pub fn render_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(cue.start_ms),
            format_timestamp(cue.end_ms),
            cue_body(&cue.text)
        ));
    }
    out
}

fn cue_body(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// 解析 SRT 文本
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleCue>, SubtitleError> {
    let normalized = content.replace("\r\n", "\n");
    let mut cues = Vec::new();

    for (block_index, block) in normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .enumerate()
    {
        let malformed = |reason: &str| SubtitleError::MalformedBlock {
            block: block_index + 1,
            reason: reason.to_string(),
        };

        let mut lines = block.lines();
        let _sequence = lines.next().ok_or_else(|| malformed("missing sequence"))?;
        let timing = lines.next().ok_or_else(|| malformed("missing timing line"))?;
        let (start, end) = timing
            .split_once("-->")
            .ok_or_else(|| malformed("missing '-->'"))?;

        let start_ms = parse_timestamp(start)?;
        let end_ms = parse_timestamp(end)?;
        if end_ms < start_ms {
            return Err(malformed("end before start"));
        }

        let text = lines.collect::<Vec<_>>().join("\n");
        cues.push(SubtitleCue {
            start_ms,
            end_ms,
            text,
        });
    }

    Ok(cues)
}

/// 从序列化的字幕中读回第一条的时长（标题叠加时长）
pub fn first_cue_duration_ms(content: &str) -> Result<u64, SubtitleError> {
    let cues = parse_srt(content)?;
    cues.first()
        .map(SubtitleCue::duration_ms)
        .ok_or(SubtitleError::Empty)
}
