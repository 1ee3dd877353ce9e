//! 文本修复
//!
//! 修复常见的编码错误（UTF-8 被误按 cp1252/Latin-1 解码产生的乱码）、
//! HTML 实体以及排版引号，保证后续的替换和过滤规则能命中原文。

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// cp1252 在 0x80..=0x9F 区间的字符映射（None 表示该字节未定义）
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

/// 最多修复的嵌套层数（双重编码）
const MAX_REPAIR_ROUNDS: usize = 2;

/// 将字符还原为 cp1252/Latin-1 的单字节
fn char_to_legacy_byte(ch: char) -> Option<u8> {
    let code = ch as u32;
    if code < 0x80 || (0xA0..=0xFF).contains(&code) {
        return Some(code as u8);
    }
    // Latin-1 中未被 cp1252 占用的控制字符
    if (0x80..=0x9F).contains(&code) {
        return Some(code as u8);
    }
    CP1252_HIGH
        .iter()
        .position(|c| *c == Some(ch))
        .map(|i| 0x80 + i as u8)
}

/// 尝试修复单个 token
///
/// 只有当 token 能完整还原为单字节序列、且该序列是合法 UTF-8 时才替换。
fn repair_token(token: &str) -> Option<String> {
    if token.is_ascii() {
        return None;
    }

    let bytes: Option<Vec<u8>> = token.chars().map(char_to_legacy_byte).collect();
    let bytes = bytes?;
    let decoded = String::from_utf8(bytes).ok()?;
    if decoded == token {
        None
    } else {
        Some(decoded)
    }
}

/// 修复乱码（按 ASCII 空白分隔的 token 逐个处理）
///
/// U+00A0 不作分隔符：它可能是乱码的一部分（`à` 误解码为 `Ã` + U+00A0）。
pub fn fix_mojibake(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut token = String::new();

    let flush = |token: &mut String, out: &mut String| {
        let mut current = std::mem::take(token);
        for _ in 0..MAX_REPAIR_ROUNDS {
            match repair_token(&current) {
                Some(fixed) => current = fixed,
                None => break,
            }
        }
        out.push_str(&current);
    };

    for ch in text.chars() {
        if ch.is_ascii_whitespace() {
            flush(&mut token, &mut result);
            result.push(ch);
        } else {
            token.push(ch);
        }
    }
    flush(&mut token, &mut result);

    result
}

fn entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[a-zA-Z]{2,8});")
            .expect("entity regex is valid")
    })
}

/// 解码常见 HTML 实体
pub fn decode_html_entities(text: &str) -> String {
    entity_regex()
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            match decoded {
                Some(ch) => ch.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// 将排版引号和不间断空格替换为普通字符
pub fn uncurl_quotes(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => '"',
            '\u{00A0}' => ' ',
            other => other,
        })
        .collect()
}

/// 完整的文本规范化流程
pub fn normalize_text(text: &str) -> String {
    let repaired = fix_mojibake(text);
    let decoded = decode_html_entities(&repaired);
    uncurl_quotes(&decoded)
}
