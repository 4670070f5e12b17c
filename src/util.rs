//! Text helpers shared by the segmenter, extractor and aligner.

use std::borrow::Cow;

use unicode_categories::UnicodeCategories;

/// Glyph marking a line-break split inside a word in TCP transcriptions.
pub const DIVIDER: char = '\u{2223}';

/// Historical long s.
pub const LONG_S: char = '\u{017F}';

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from `<?xml encoding="..."?>`)
/// 3. Falls back to Windows-1252 (the usual encoding of older TCP exports)
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Pull the `encoding="..."` value out of an XML declaration, if present.
pub fn declared_encoding(bytes: &[u8]) -> Option<&str> {
    let head = &bytes[..bytes.len().min(200)];
    if !head.starts_with(b"<?xml") {
        return None;
    }
    let decl_end = memchr::memmem::find(head, b"?>")?;
    let decl = std::str::from_utf8(&head[..decl_end]).ok()?;
    let rest = &decl[decl.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let value = &rest[1..];
    value.find(quote).map(|end| &value[..end])
}

/// Remove every divider glyph.
pub fn strip_divider(text: &str) -> Cow<'_, str> {
    if text.contains(DIVIDER) {
        Cow::Owned(text.chars().filter(|&c| c != DIVIDER).collect())
    } else {
        Cow::Borrowed(text)
    }
}

/// Replace long s with a plain `f`.
///
/// One character for one character, so character offsets computed on the
/// result are valid for the input.
pub fn normalize_long_s(text: &str) -> Cow<'_, str> {
    if text.contains(LONG_S) {
        Cow::Owned(text.replace(LONG_S, "f"))
    } else {
        Cow::Borrowed(text)
    }
}

/// True if the text has at least one character that is neither punctuation
/// nor whitespace.
pub fn has_content(text: &str) -> bool {
    text.chars()
        .any(|c| !c.is_whitespace() && !c.is_punctuation() && c != DIVIDER)
}

/// Zero-pad a page sequence number to the width used for page text keys.
pub fn zero_pad(seq: usize) -> String {
    format!("{seq:04}")
}

/// Convert a byte offset into a character offset.
pub fn char_offset(text: &str, byte_offset: usize) -> usize {
    let head = &text[..byte_offset];
    if head.is_ascii() {
        return byte_offset;
    }
    head.chars().count()
}

/// Convert a character offset into a byte offset, clamping to the end of
/// the text.
pub fn byte_offset(text: &str, char_offset: usize) -> usize {
    if text.is_ascii() {
        return char_offset.min(text.len());
    }
    text.char_indices()
        .nth(char_offset)
        .map_or(text.len(), |(i, _)| i)
}

/// Slice a string by character offsets, clamping to the end of the text.
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    if text.is_ascii() {
        let start = start.min(text.len());
        return &text[start..end.clamp(start, text.len())];
    }

    // One pass: `end` is found by continuing from `start`
    let mut boundaries = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()));
    let start_byte = boundaries.nth(start).unwrap_or(text.len());
    let end_byte = match end.checked_sub(start + 1) {
        Some(remaining) => boundaries.nth(remaining).unwrap_or(text.len()),
        None => start_byte,
    };
    &text[start_byte..end_byte]
}
