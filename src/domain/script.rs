//! 朗读脚本
//!
//! 句子与其实测音频时长的有序配对。时长统一使用整数毫秒，
//! 字幕时间轴和合并音轨都由同一份脚本推导。

use serde::{Deserialize, Serialize};

/// 过滤后的句子（非空，至少 2 个字符）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence(String);

impl Sentence {
    /// 内部空白（含换行）折叠为单个空格；长度不超过 1 的文本不构成句子
    pub fn new(text: &str) -> Option<Self> {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.chars().count() <= 1 {
            return None;
        }
        Some(Self(collapsed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl std::fmt::Display for Sentence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 脚本条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub text: String,
    pub duration_ms: u64,
}

impl ScriptEntry {
    pub fn new(text: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            text: text.into(),
            duration_ms,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }
}

/// 有序脚本
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    entries: Vec<ScriptEntry>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ScriptEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ScriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 含间隔的总时长：sum(durations) + gap * (n - 1)
    pub fn total_duration_ms(&self, gap_ms: u64) -> u64 {
        let speech: u64 = self.entries.iter().map(|e| e.duration_ms).sum();
        let gaps = self.entries.len().saturating_sub(1) as u64 * gap_ms;
        speech + gaps
    }
}

impl From<Vec<ScriptEntry>> for Script {
    fn from(entries: Vec<ScriptEntry>) -> Self {
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_rejects_short_text() {
        assert!(Sentence::new("").is_none());
        assert!(Sentence::new("  a  ").is_none());
        assert_eq!(Sentence::new("  ok ").unwrap().as_str(), "ok");
        assert_eq!(
            Sentence::new("Part one\n\n  Part\ttwo").unwrap().as_str(),
            "Part one Part two"
        );
    }

    #[test]
    fn test_total_duration_includes_gaps() {
        let script = Script::from(vec![
            ScriptEntry::new("a", 2000),
            ScriptEntry::new("b", 1500),
            ScriptEntry::new("c", 3000),
        ]);
        assert_eq!(script.total_duration_ms(100), 6700);
        assert_eq!(Script::new().total_duration_ms(100), 0);
    }
}
