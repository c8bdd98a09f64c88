//! Natural-language text helpers shared by extraction and compression
//!
//! Memory content is written in English, Chinese, or a mix of both. These
//! helpers decide which vocabulary applies and do the small normalisations
//! everything else relies on.

/// Natural language of a piece of memory content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaturalLanguage {
    English,
    Chinese,
}

impl NaturalLanguage {
    /// Chinese when at least 30% of the non-whitespace characters are CJK.
    pub fn detect(text: &str) -> Self {
        let mut total = 0usize;
        let mut cjk = 0usize;
        for c in text.chars().filter(|c| !c.is_whitespace()) {
            total += 1;
            if is_cjk(c) {
                cjk += 1;
            }
        }
        if total > 0 && cjk * 10 >= total * 3 {
            Self::Chinese
        } else {
            Self::English
        }
    }
}

/// CJK ideographs and CJK punctuation.
pub fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{3000}'..='\u{303F}'
        | '\u{FF00}'..='\u{FFEF}'
    )
}

/// Collapse every run of whitespace to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

const ENGLISH_FILLERS: &[&str] = &[
    "the", "a", "an", "please", "very", "really", "just", "basically", "actually", "simply",
    "that", "which", "generally", "note", "kindly", "also", "quite",
];

const CHINESE_FILLERS: &[&str] = &[
    "请注意", "注意", "一定", "非常", "所有的", "进行", "一些", "的", "了", "请", "都",
];

/// Remove filler words for the content's language, then collapse whitespace.
pub fn strip_fillers(text: &str) -> String {
    match NaturalLanguage::detect(text) {
        NaturalLanguage::English => text
            .split_whitespace()
            .filter(|w| {
                let bare = w.trim_matches(|c: char| !c.is_alphanumeric());
                !ENGLISH_FILLERS.iter().any(|f| f.eq_ignore_ascii_case(bare))
            })
            .collect::<Vec<_>>()
            .join(" "),
        NaturalLanguage::Chinese => {
            let mut out = text.to_string();
            for filler in CHINESE_FILLERS {
                out = out.replace(filler, "");
            }
            collapse_whitespace(&out)
        }
    }
}

/// Keep a head and tail slice (in characters) joined by an elision marker.
pub fn head_tail(text: &str, max_chars: usize, head: usize, tail: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars || head + tail >= chars.len() {
        return text.to_string();
    }
    let head_part: String = chars[..head].iter().collect();
    let tail_part: String = chars[chars.len() - tail..].iter().collect();
    format!("{} ... {}", head_part.trim_end(), tail_part.trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(NaturalLanguage::detect("Never use eval"), NaturalLanguage::English);
        assert_eq!(NaturalLanguage::detect("禁止使用 eval 函数"), NaturalLanguage::Chinese);
        assert_eq!(NaturalLanguage::detect(""), NaturalLanguage::English);
    }

    #[test]
    fn test_strip_fillers_english() {
        assert_eq!(
            strip_fillers("Please  always use the   Repository pattern."),
            "always use Repository pattern."
        );
    }

    #[test]
    fn test_strip_fillers_chinese() {
        assert_eq!(strip_fillers("请注意：所有的接口都必须进行鉴权"), "：接口必须鉴权");
    }

    #[test]
    fn test_head_tail() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        assert_eq!(head_tail(text, 10, 4, 3), "abcd ... xyz");
        assert_eq!(head_tail(text, 100, 4, 3), text);
    }

    #[test]
    fn test_head_tail_counts_chars_not_bytes() {
        let text = "数据库访问必须经过仓储层不能直接调用";
        assert_eq!(head_tail(text, 6, 2, 2), "数据 ... 调用");
    }
}
