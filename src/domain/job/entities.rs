//! Job Context - Entities

use super::JobId;

/// 内容条目
///
/// 一次流水线运行的输入，运行期间不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: JobId,
    pub title: String,
    pub raw_text: String,
    pub source_url: String,
}

impl ContentItem {
    pub fn new(
        id: JobId,
        title: impl Into<String>,
        raw_text: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            raw_text: raw_text.into(),
            source_url: source_url.into(),
        }
    }
}
