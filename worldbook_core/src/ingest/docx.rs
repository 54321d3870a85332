//! Document text extractor - best-effort text recovery from `.docx` bytes.
//!
//! The raw container bytes are scanned as lossy UTF-8 for WordprocessingML
//! markup. The container is never inflated, so text stored in deflated ZIP
//! members is not found; only uncompressed (stored) document parts yield text.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

fn run_pattern() -> Option<&'static Regex> {
    static RUN: OnceLock<Option<Regex>> = OnceLock::new();
    RUN.get_or_init(|| Regex::new(r"<w:t[^>]*>([^<]*)</w:t>").ok())
        .as_ref()
}

fn paragraph_pattern() -> Option<&'static Regex> {
    static PARAGRAPH: OnceLock<Option<Regex>> = OnceLock::new();
    PARAGRAPH
        .get_or_init(|| Regex::new(r"(?s)<w:p[^>]*>.*?</w:p>").ok())
        .as_ref()
}

/// Extracts plain text from document bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentTextExtractor;

impl DocumentTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Recover the document text. An empty string means nothing was found.
    pub fn extract(&self, bytes: &[u8]) -> String {
        let text = String::from_utf8_lossy(bytes);

        let runs = join_runs(&text);
        if !runs.trim().is_empty() {
            return runs;
        }

        if let Some(paragraph) = paragraph_pattern() {
            let paragraphs = paragraph
                .find_iter(&text)
                .map(|p| join_runs(p.as_str()))
                .filter(|p| !p.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            if !paragraphs.trim().is_empty() {
                return paragraphs;
            }
        }

        debug!(len = bytes.len(), "no document text found");
        String::new()
    }
}

/// Concatenate the inner text of every run in `markup`.
fn join_runs(markup: &str) -> String {
    let Some(run) = run_pattern() else {
        return String::new();
    };
    run.captures_iter(markup)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        assert!(run_pattern().is_some());
        assert!(paragraph_pattern().is_some());
    }

    #[test]
    fn test_extracts_runs() {
        let xml = br#"PK..<w:body><w:p><w:r><w:t>Hello, </w:t></w:r><w:r><w:t xml:space="preserve">world</w:t></w:r></w:p></w:body>"#;
        assert_eq!(DocumentTextExtractor::new().extract(xml), "Hello, world");
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let mut bytes = vec![0xff, 0xfe, 0x00];
        bytes.extend_from_slice("<w:t>设定内容</w:t>".as_bytes());
        bytes.push(0xc3);
        assert_eq!(DocumentTextExtractor::new().extract(&bytes), "设定内容");
    }

    #[test]
    fn test_nothing_found_is_empty() {
        assert_eq!(DocumentTextExtractor::new().extract(b"PK\x03\x04 compressed"), "");
        assert_eq!(DocumentTextExtractor::new().extract(b""), "");
    }

    #[test]
    fn test_whitespace_only_runs_are_empty() {
        let xml = b"<w:p><w:r><w:t>   </w:t></w:r></w:p><w:p><w:r><w:t> </w:t></w:r></w:p>";
        assert_eq!(DocumentTextExtractor::new().extract(xml), "");
    }
}
