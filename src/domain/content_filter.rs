//! 内容过滤器
//!
//! 将原始帖子正文转换为可朗读的句子序列：
//! 1. 规范化编码和排版字符
//! 2. 结构性替换（换行、编辑标记、缩写）
//! 3. 屏蔽过滤词（保留首尾字符）
//! 4. 展开人口统计简写（M25 -> Male 25）
//! 5. 按句子边界分割，丢弃长度不超过 1 的片段

use regex::Regex;
use std::sync::OnceLock;

use super::script::Sentence;
use super::text_repair::normalize_text;

/// 默认屏蔽字符
pub const DEFAULT_MASK_CHAR: char = '*';

/// 句子边界标记
pub const SENTENCE_BOUNDARY: &str = ". ";

/// 字面替换规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementRule {
    pub from: String,
    pub to: String,
}

impl ReplacementRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// 默认的结构性替换规则
pub fn default_replacement_rules() -> Vec<ReplacementRule> {
    vec![
        ReplacementRule::new("\n", ". "),
        ReplacementRule::new(".\"", "\". "),
        ReplacementRule::new("UPDATE:", ". UPDATE:. "),
        ReplacementRule::new("EDIT:", ". EDIT:. "),
        ReplacementRule::new("AITA", "Am I the asshole"),
    ]
}

/// 过滤器配置
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// 屏蔽字符
    pub mask_char: char,
    /// 替换规则（按顺序应用）
    pub replacements: Vec<ReplacementRule>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            mask_char: DEFAULT_MASK_CHAR,
            replacements: default_replacement_rules(),
        }
    }
}

/// 屏蔽单个词：保留首尾字符，中间替换为屏蔽字符
///
/// 不超过 2 个字符的词整体屏蔽，否则屏蔽后仍等于原词。
pub fn mask_word(word: &str, mask: char) -> String {
    let chars: Vec<char> = word.chars().collect();
    if chars.len() <= 2 {
        return std::iter::repeat(mask).take(chars.len()).collect();
    }

    let mut masked = String::with_capacity(word.len());
    masked.push(chars[0]);
    masked.extend(std::iter::repeat(mask).take(chars.len() - 2));
    masked.push(chars[chars.len() - 1]);
    masked
}

fn demographic_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([MF])(\d{1,3})\b").expect("demographic regex is valid"))
}

/// 展开人口统计简写：`M25` -> `Male 25`，`F30` -> `Female 30`
pub fn expand_demographics(text: &str) -> String {
    demographic_regex()
        .replace_all(text, |caps: &regex::Captures| {
            let word = if &caps[1] == "M" { "Male" } else { "Female" };
            format!("{} {}", word, &caps[2])
        })
        .into_owned()
}

/// 内容过滤器
///
/// 纯函数式：同样的 (文本, 过滤词集合) 总是得到同样的句子序列。
#[derive(Debug, Clone)]
pub struct ContentFilter {
    /// 过滤词，按长度降序排列
    words: Vec<String>,
    config: FilterConfig,
}

impl ContentFilter {
    /// 使用过滤词集合创建过滤器
    pub fn new<I, S>(words: I, config: FilterConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut words: Vec<String> = words
            .into_iter()
            .map(Into::into)
            .filter(|w: &String| !w.is_empty())
            .collect();
        // 长词优先，避免短词先命中长词的一部分
        words.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });
        words.dedup();

        Self { words, config }
    }

    /// 过滤词数量
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// 过滤正文，返回有序句子序列
    pub fn filter(&self, raw_text: &str) -> Vec<Sentence> {
        if raw_text.trim().is_empty() {
            return Vec::new();
        }

        let text = normalize_text(raw_text);
        let text = self.apply_replacements(&text);
        let text = self.censor(&text);
        let text = expand_demographics(&text);

        text.split(SENTENCE_BOUNDARY)
            .filter_map(Sentence::new)
            .collect()
    }

    /// 过滤标题（只规范化和屏蔽，不分句）
    pub fn filter_title(&self, title: &str) -> Option<Sentence> {
        let text = normalize_text(title);
        let text = self.censor(&text);
        let text = expand_demographics(&text);
        Sentence::new(&text)
    }

    /// 屏蔽所有过滤词
    pub fn censor(&self, text: &str) -> String {
        let mut result = text.to_string();
        for word in &self.words {
            let masked = mask_word(word, self.config.mask_char);
            if masked == *word {
                continue;
            }
            // 重叠出现（如 "aba" 之于 "ababa"）需要多轮替换
            while result.contains(word.as_str()) {
                result = result.replace(word.as_str(), &masked);
            }
        }
        result
    }

    fn apply_replacements(&self, text: &str) -> String {
        self.config
            .replacements
            .iter()
            .filter(|rule| !rule.from.is_empty())
            .fold(text.to_string(), |acc, rule| acc.replace(&rule.from, &rule.to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_with(words: &[&str]) -> ContentFilter {
        ContentFilter::new(words.iter().copied(), FilterConfig::default())
    }

    fn texts(sentences: &[Sentence]) -> Vec<&str> {
        sentences.iter().map(|s| s.as_str()).collect()
    }

    #[test]
    fn test_mask_word_keeps_first_and_last() {
        assert_eq!(mask_word("shit", '*'), "s**t");
        assert_eq!(mask_word("bastard", '#'), "b#####d");
        assert_eq!(mask_word("ok", '*'), "**");
    }

    #[test]
    fn test_split_on_sentence_boundary() {
        let filter = filter_with(&[]);
        let sentences = filter.filter("First one. Second one. A. Third");
        assert_eq!(texts(&sentences), vec!["First one", "Second one", "Third"]);
    }

    #[test]
    fn test_newline_becomes_sentence_break() {
        let filter = filter_with(&[]);
        let sentences = filter.filter("Line one\n\nLine two");
        assert_eq!(texts(&sentences), vec!["Line one", "Line two"]);
    }

    #[test]
    fn test_update_marker_is_its_own_sentence() {
        let filter = filter_with(&[]);
        let sentences = filter.filter("It went fine UPDATE: it did not");
        assert_eq!(texts(&sentences), vec!["It went fine", "UPDATE:", "it did not"]);
    }

    #[test]
    fn test_censor_longest_first() {
        let filter = filter_with(&["ass", "asshole"]);
        assert_eq!(filter.censor("what an asshole"), "what an a*****e");
        assert_eq!(filter.censor("pain in the ass"), "pain in the a*s");
    }

    #[test]
    fn test_censor_is_case_sensitive() {
        let filter = filter_with(&["crap"]);
        assert_eq!(filter.censor("Crap and crap"), "Crap and c**p");
    }

    #[test]
    fn test_censor_overlapping_occurrences() {
        let filter = filter_with(&["aba"]);
        let censored = filter.censor("ababa");
        assert!(!censored.contains("aba"));
    }

    #[test]
    fn test_aita_expanded_then_censored() {
        let filter = filter_with(&["asshole"]);
        let sentences = filter.filter("AITA for leaving");
        assert_eq!(texts(&sentences), vec!["Am I the a*****e for leaving"]);
    }

    #[test]
    fn test_demographic_expansion() {
        let filter = filter_with(&[]);
        let sentences = filter.filter("My sister F27 and her husband M30 visited");
        assert_eq!(
            texts(&sentences),
            vec!["My sister Female 27 and her husband Male 30 visited"]
        );
    }

    #[test]
    fn test_demographic_expansion_needs_word_boundary() {
        assert_eq!(expand_demographics("MP3 and FM2000"), "MP3 and FM2000");
    }

    #[test]
    fn test_mojibake_repaired_before_split() {
        let filter = filter_with(&[]);
        let sentences = filter.filter("I donâ€™t know. Really");
        assert_eq!(texts(&sentences), vec!["I don't know", "Really"]);
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let filter = filter_with(&["x"]);
        assert!(filter.filter("").is_empty());
        assert!(filter.filter("   \n  ").is_empty());
        assert!(filter.filter(". . .").is_empty());
    }

    #[test]
    fn test_output_properties_hold() {
        let words = ["fuck", "shit", "ass", "crap", "dick"];
        let filter = filter_with(&words);
        let raw = "What the fuck.\nThis shit is crap. a. \n\nDick moves? dickhead ass. x";
        let sentences = filter.filter(raw);

        assert!(!sentences.is_empty());
        for sentence in &sentences {
            assert!(sentence.as_str().chars().count() > 1);
            for word in &words {
                assert!(!sentence.as_str().contains(word), "{} leaked in {:?}", word, sentence);
            }
        }
    }

    #[test]
    fn test_filter_title() {
        let filter = filter_with(&["shit"]);
        let title = filter.filter_title("This shit. Again").unwrap();
        assert_eq!(title.as_str(), "This s**t. Again");
        assert!(filter.filter_title(" ").is_none());
    }

    #[test]
    fn test_filter_title_flattens_blank_lines() {
        let filter = filter_with(&[]);
        let title = filter.filter_title("Part one\n\nPart two").unwrap();
        assert_eq!(title.as_str(), "Part one Part two");
    }
}
