//! Span alignment.
//!
//! Finds where a transcribed excerpt sits inside independently produced page
//! text. The two sources disagree in predictable ways: long s may be kept,
//! read as `f`, or modernized to `s`; line breaks and spacing differ; OCR
//! sometimes garbles a line in the middle of a passage. Alignment tries, in
//! order:
//!
//! 1. an exact substring match;
//! 2. an exact match with long s replaced by `f` on both sides;
//! 3. a pattern match that tolerates any whitespace between words, long-s
//!    variants, and the note markers page reconstruction inserts between
//!    words;
//! 4. for multi-line excerpts, locating the first and last lines separately
//!    and spanning from one to the other.
//!
//! Offsets are character (Unicode scalar value) offsets, not byte offsets.

use regex::Regex;

use crate::util::{LONG_S, byte_offset, char_offset, normalize_long_s};

/// Location of an excerpt in a page's text, as character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExcerptSpan {
    pub start: usize,
    pub end: usize,
}

impl ExcerptSpan {
    /// Number of characters covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True if the span covers nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The covered text.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        crate::util::char_slice(text, self.start, self.end)
    }
}

/// How an excerpt was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Verbatim substring.
    Exact,
    /// Substring once long s is read as `f`.
    LongS,
    /// Whitespace- and long-s-tolerant pattern.
    Pattern,
    /// First and last lines located separately.
    FirstLastLine,
}

/// A located excerpt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    pub span: ExcerptSpan,
    pub strategy: MatchStrategy,
}

/// Configuration for alignment.
#[derive(Debug, Clone)]
pub struct AlignConfig {
    /// Fall back to a whitespace-tolerant pattern match.
    pub pattern_fallback: bool,
    /// Let a plain `s` in the excerpt match a long s or an `f` in the page
    /// (modernized transcription against OCR that kept the old letterform).
    /// Off by default: a plain `s` matches only itself.
    pub lenient_s: bool,
    /// For multi-line excerpts, fall back to matching first and last lines.
    pub line_fallback: bool,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            pattern_fallback: true,
            lenient_s: false,
            line_fallback: true,
        }
    }
}

impl AlignConfig {
    pub fn with_pattern_fallback(mut self, enabled: bool) -> Self {
        self.pattern_fallback = enabled;
        self
    }

    pub fn with_lenient_s(mut self, enabled: bool) -> Self {
        self.lenient_s = enabled;
        self
    }

    pub fn with_line_fallback(mut self, enabled: bool) -> Self {
        self.line_fallback = enabled;
        self
    }
}

/// Locates excerpts in page text.
#[derive(Debug, Clone, Default)]
pub struct Aligner {
    config: AlignConfig,
}

impl Aligner {
    /// Create an aligner with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an aligner with the specified configuration.
    pub fn with_config(config: AlignConfig) -> Self {
        Self { config }
    }

    /// Locate `excerpt` in `page_text`.
    ///
    /// Returns `None` when no strategy finds it; callers should then skip the
    /// excerpt rather than guess a position. An empty excerpt is never found.
    pub fn locate(&self, excerpt: &str, page_text: &str) -> Option<Alignment> {
        if excerpt.is_empty() {
            return None;
        }

        if let Some(alignment) = self.locate_line(excerpt, page_text) {
            return Some(alignment);
        }

        if self.config.line_fallback
            && let Some(span) = self.locate_by_lines(excerpt, page_text)
        {
            log::debug!("located excerpt by first and last lines at {span:?}");
            return Some(Alignment {
                span,
                strategy: MatchStrategy::FirstLastLine,
            });
        }

        log::debug!(
            "could not locate excerpt ({} chars) in page text",
            excerpt.chars().count()
        );
        None
    }

    /// Exact, long-s and pattern matching, without splitting into lines.
    fn locate_line(&self, excerpt: &str, page_text: &str) -> Option<Alignment> {
        if let Some(start) = find_chars(excerpt, page_text) {
            return Some(Alignment {
                span: span_from(start, excerpt),
                strategy: MatchStrategy::Exact,
            });
        }

        let normalized_page = normalize_long_s(page_text);
        let normalized_excerpt = normalize_long_s(excerpt);
        if let Some(start) = find_chars(&normalized_excerpt, &normalized_page) {
            return Some(Alignment {
                span: span_from(start, excerpt),
                strategy: MatchStrategy::LongS,
            });
        }

        if self.config.pattern_fallback
            && let Some(span) = self.locate_pattern(excerpt, page_text)
        {
            return Some(Alignment {
                span,
                strategy: MatchStrategy::Pattern,
            });
        }

        None
    }

    fn locate_pattern(&self, excerpt: &str, page_text: &str) -> Option<ExcerptSpan> {
        let pattern = tolerant_pattern(excerpt, self.config.lenient_s)?;
        let regex = match Regex::new(&pattern) {
            Ok(regex) => regex,
            Err(e) => {
                log::debug!("excerpt pattern did not compile: {e}");
                return None;
            }
        };

        regex.find(page_text).map(|m| ExcerptSpan {
            start: char_offset(page_text, m.start()),
            end: char_offset(page_text, m.end()),
        })
    }

    /// Span from the first line's start to the last line's end.
    fn locate_by_lines(&self, excerpt: &str, page_text: &str) -> Option<ExcerptSpan> {
        let lines: Vec<&str> = excerpt
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let (&first, &last) = (lines.first()?, lines.last()?);
        if lines.len() < 2 {
            return None;
        }

        let start = self.locate_line(first, page_text)?.span.start;

        // The last line must come after the first
        let tail = &page_text[byte_offset(page_text, start)..];
        let end = start + self.locate_line(last, tail)?.span.end;

        Some(ExcerptSpan { start, end })
    }
}

/// Locate `excerpt` in `page_text` with default configuration.
///
/// ```
/// use ppa_excerpt::{ExcerptSpan, locate_span};
///
/// let page = "as Virgil hath it, graviter commotu•, et alto\nProspiciens";
/// let span = locate_span("graviter commotu\n   •, et alto", page).unwrap();
/// assert_eq!(span.slice(page), "graviter commotu•, et alto");
///
/// // A match at the very start is still a match
/// assert_eq!(locate_span("as", page), Some(ExcerptSpan { start: 0, end: 2 }));
/// assert_eq!(locate_span("nowhere", page), None);
/// ```
pub fn locate_span(excerpt: &str, page_text: &str) -> Option<ExcerptSpan> {
    Aligner::new()
        .locate(excerpt, page_text)
        .map(|alignment| alignment.span)
}

/// Character offset of the first occurrence of `needle` in `haystack`.
fn find_chars(needle: &str, haystack: &str) -> Option<usize> {
    memchr::memmem::find(haystack.as_bytes(), needle.as_bytes())
        .map(|byte| char_offset(haystack, byte))
}

fn span_from(start: usize, excerpt: &str) -> ExcerptSpan {
    ExcerptSpan {
        start,
        end: start + excerpt.chars().count(),
    }
}

/// Symbols the segmenter inserts where an unlabelled note is attached.
const NOTE_MARKERS: &str = "[*\u{2020}\u{2021}\u{00A7}]*";

/// Regex source matching `excerpt` with any whitespace or note markers
/// between words, and long-s variants. `None` if the excerpt has no words.
fn tolerant_pattern(excerpt: &str, lenient_s: bool) -> Option<String> {
    let words: Vec<String> = excerpt
        .split_whitespace()
        .map(|word| word_pattern(word, lenient_s))
        .collect();
    if words.is_empty() {
        return None;
    }
    let separator = format!(r"\s*{NOTE_MARKERS}\s*");
    Some(format!("(?m){}", words.join(&separator)))
}

fn word_pattern(word: &str, lenient_s: bool) -> String {
    let mut pattern = String::with_capacity(word.len() * 2);
    let mut buf = [0u8; 4];
    for c in word.chars() {
        match c {
            LONG_S => pattern.push_str("[ſfs]"),
            's' if lenient_s => pattern.push_str("[sſf]"),
            _ => pattern.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    pattern
}
