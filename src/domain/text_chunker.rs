//! 文本分块
//!
//! TTS 服务对单次请求的文本长度有上限，超长句子按单词边界切块。

/// 默认单次请求字符上限
pub const DEFAULT_CHUNK_LIMIT: usize = 300;

/// 按单词边界切块，每块不超过 `limit` 个字符
///
/// - 文本不超过上限时原样返回一块
/// - 单词之间以单个空格连接
/// - 超过上限的单个单词独立成块（不拆分单词）
pub fn split_into_chunks(text: &str, limit: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if limit == 0 || text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let needed = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };

        if needed > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
