//! Tolerant block splitter for HTML-like source markup

use crate::document::block::{Block, BlockKind, MarkupFragment};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::borrow::Cow;
use std::ops::Range;

/// Marks a `<br>` while text is being collected; becomes `\n` after
/// whitespace normalization.
const HARD_BREAK: char = '\u{2028}';

/// Elements that never have content or an end tag in HTML
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Block-level elements. Their start tag closes an open `<p>`, and their end
/// tag closes a top-level block whatever its name.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hgroup", "hr", "main", "menu", "nav", "ol", "p", "pre", "section", "table", "ul",
];

/// Sections copied through untouched when escaping stray `<`
const OPAQUE_SECTIONS: &[(&str, &str)] = &[("<!--", "-->"), ("<![CDATA[", "]]>")];

/// A block whose end has not been seen yet
struct OpenBlock {
    kind: BlockKind,
    /// Lowercase tag name; empty for loose text
    tag: String,
    /// Byte offset of the block's first token in the source
    start: usize,
    /// Nesting depth below the block's own element
    depth: usize,
    text: String,
    /// Loose top-level text, not wrapped in an element
    loose: bool,
}

impl OpenBlock {
    fn element(tag: String, start: usize) -> Self {
        Self {
            kind: BlockKind::from_tag(&tag),
            tag,
            start,
            depth: 0,
            text: String::new(),
            loose: false,
        }
    }

    fn loose(start: usize) -> Self {
        Self {
            loose: true,
            ..Self::element(String::new(), start)
        }
    }

    /// Close the block at byte offset `end`. Loose whitespace yields nothing.
    fn finish(self, source: &str, end: usize) -> Option<Block> {
        let text = normalize_text(&self.text);
        if self.loose && text.is_empty() {
            return None;
        }
        let markup = source.get(self.start..end).unwrap_or_default().trim();
        Some(Block::new(self.kind, MarkupFragment::new(markup, text)))
    }

    /// An open paragraph ends where HTML would close it implicitly
    fn closed_by(&self, tag: &str) -> bool {
        !self.loose && self.kind == BlockKind::Paragraph && is_block_level(tag)
    }
}

/// Split source markup into top-level blocks.
///
/// Never fails: unknown elements become [`BlockKind::Other`], unclosed
/// elements are closed at end of input, a bare `&` or `<` is kept as text,
/// and a tokenizer error turns only the offending region into one `Other`
/// block before parsing resumes at the next start tag.
pub fn parse_blocks(raw: &str) -> Vec<Block> {
    let source = escape_stray_lt(raw);
    let mut blocks = Vec::new();
    let mut offset = 0;

    while let Some(resume) = parse_from(&source, offset, &mut blocks) {
        offset = resume;
    }
    blocks
}

/// Tokenize `source` from `offset` to the end. Returns the resume offset
/// after a tokenizer error.
fn parse_from(source: &str, offset: usize, blocks: &mut Vec<Block>) -> Option<usize> {
    let mut reader = Reader::from_str(source.get(offset..)?);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;

    let mut open: Option<OpenBlock> = None;

    loop {
        let event_start = offset + reader.buffer_position() as usize;
        let event = reader.read_event();
        let event_end = offset + reader.buffer_position() as usize;

        match event {
            Ok(Event::Start(e)) => {
                let tag = tag_name(e.name().as_ref());
                if open.as_ref().is_some_and(|b| b.closed_by(&tag)) {
                    log::debug!("<{}> at byte {} closes the open paragraph", tag, event_start);
                    flush(&mut open, source, event_start, blocks);
                }
                if let Some(block) = open.as_mut().filter(|b| !b.loose) {
                    if is_void(&tag) {
                        if tag == "br" {
                            block.text.push(HARD_BREAK);
                        }
                    } else {
                        block.depth += 1;
                    }
                    continue;
                }
                flush(&mut open, source, event_start, blocks);
                if is_void(&tag) {
                    blocks.push(void_block(&tag, source, event_start..event_end));
                } else {
                    open = Some(OpenBlock::element(tag, event_start));
                }
            }
            Ok(Event::Empty(e)) => {
                let tag = tag_name(e.name().as_ref());
                if open.as_ref().is_some_and(|b| b.closed_by(&tag)) {
                    flush(&mut open, source, event_start, blocks);
                }
                if let Some(block) = open.as_mut().filter(|b| !b.loose) {
                    if tag == "br" {
                        block.text.push(HARD_BREAK);
                    }
                    continue;
                }
                flush(&mut open, source, event_start, blocks);
                blocks.push(void_block(&tag, source, event_start..event_end));
            }
            Ok(Event::End(e)) => {
                if let Some(block) = open.as_mut().filter(|b| !b.loose && b.depth > 0) {
                    block.depth -= 1;
                    continue;
                }
                let tag = tag_name(e.name().as_ref());
                let close_at = match open.as_ref() {
                    // A stray end tag only terminates loose text
                    Some(block) if block.loose => Some(event_start),
                    Some(block) if block.tag == tag || is_block_level(&tag) => Some(event_end),
                    Some(_) => {
                        log::debug!("Ignoring stray </{}> at byte {}", tag, event_start);
                        None
                    }
                    None => None,
                };
                if let Some(end) = close_at {
                    flush(&mut open, source, end, blocks);
                }
            }
            Ok(Event::Text(e)) => {
                let text = match e.decode() {
                    Ok(text) => text.into_owned(),
                    Err(_) => String::from_utf8_lossy(&e).into_owned(),
                };
                open.get_or_insert_with(|| OpenBlock::loose(event_start))
                    .text
                    .push_str(&text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                open.get_or_insert_with(|| OpenBlock::loose(event_start))
                    .text
                    .push_str(&text);
            }
            Ok(Event::GeneralRef(e)) => {
                let name = String::from_utf8_lossy(&e).into_owned();
                open.get_or_insert_with(|| OpenBlock::loose(event_start))
                    .text
                    .push_str(&resolve_entity(&name));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                let error_at = offset + reader.error_position() as usize;
                let from = open.as_ref().map_or(event_start, |b| b.start);
                let resume = next_start_tag(source, error_at.max(event_start) + 1);
                log::warn!(
                    "Markup tokenizer error at byte {}: {}; keeping bytes {}..{} as one block",
                    error_at,
                    err,
                    from,
                    resume
                );
                if let Some(block) = recover_region(source, from..resume) {
                    blocks.push(block);
                }
                return (resume < source.len()).then_some(resume);
            }
        }
    }

    flush(&mut open, source, source.len(), blocks);
    None
}

fn flush(open: &mut Option<OpenBlock>, source: &str, end: usize, blocks: &mut Vec<Block>) {
    if let Some(block) = open.take().and_then(|b| b.finish(source, end)) {
        blocks.push(block);
    }
}

fn void_block(tag: &str, source: &str, range: Range<usize>) -> Block {
    let markup = source.get(range).unwrap_or_default();
    let text = if tag == "br" { "\n" } else { "" };
    Block::new(BlockKind::Other, MarkupFragment::new(markup, text))
}

/// Keep a region the tokenizer rejected as one `Other` block with its tags
/// stripped. Regions without text are dropped.
fn recover_region(source: &str, range: Range<usize>) -> Option<Block> {
    let region = source.get(range)?.trim();
    let mut text = String::with_capacity(region.len());
    let mut in_tag = false;
    for c in region.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    let text = normalize_text(&text);
    if text.is_empty() {
        return None;
    }
    Some(Block::new(
        BlockKind::Other,
        MarkupFragment::new(region, text),
    ))
}

/// Offset of the first `<` followed by a letter at or after `from`
fn next_start_tag(source: &str, from: usize) -> usize {
    let bytes = source.as_bytes();
    (from..bytes.len())
        .find(|&i| bytes[i] == b'<' && bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic))
        .unwrap_or(bytes.len())
}

/// Rewrite every `<` that cannot open markup as `&lt;`, the way an HTML
/// tokenizer reads it as text. Comments and CDATA are left alone.
fn escape_stray_lt(raw: &str) -> Cow<'_, str> {
    let bytes = raw.as_bytes();
    let mut escaped: Option<String> = None;
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let rest = &raw[i..];
        let opaque = OPAQUE_SECTIONS.iter().find_map(|(open, close)| {
            rest.starts_with(open).then(|| {
                rest[open.len()..]
                    .find(close)
                    .map_or(rest.len(), |p| open.len() + p + close.len())
            })
        });
        if let Some(len) = opaque {
            i += len;
            continue;
        }

        let opens_markup = bytes
            .get(i + 1)
            .is_some_and(|&b| b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'));
        if !opens_markup {
            let out = escaped.get_or_insert_with(|| String::with_capacity(raw.len() + 16));
            out.push_str(&raw[copied..i]);
            out.push_str("&lt;");
            copied = i + 1;
        }
        i += 1;
    }

    match escaped {
        Some(mut out) => {
            log::debug!("Escaped stray '<' in markup");
            out.push_str(&raw[copied..]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(raw),
    }
}

fn tag_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).to_ascii_lowercase()
}

fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

fn is_block_level(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

fn resolve_entity(name: &str) -> String {
    if let Some(rest) = name.strip_prefix('#') {
        let code = match rest.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => rest.parse::<u32>().ok(),
        };
        if let Some(c) = code.and_then(char::from_u32) {
            return c.to_string();
        }
    } else if let Some(resolved) = quick_xml::escape::resolve_html5_entity(name) {
        return resolved.to_string();
    }
    format!("&{name};")
}

/// Collapse ASCII whitespace runs to single spaces and trim each hard-broken
/// segment. Non-breaking spaces survive.
fn normalize_text(raw: &str) -> String {
    raw.split(HARD_BREAK)
        .map(|segment| {
            segment
                .split(|c: char| c.is_ascii_whitespace())
                .filter(|word| !word.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(blocks: &[Block]) -> Vec<BlockKind> {
        blocks.iter().map(|b| b.kind).collect()
    }

    #[test]
    fn test_top_level_elements() {
        let blocks = parse_blocks("<h1>Title</h1>\n<p>First <em>para</em>.</p>\n<h5>Small</h5>");

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].kind, BlockKind::Heading1);
        assert_eq!(blocks[0].text(), "Title");
        assert_eq!(blocks[1].kind, BlockKind::Paragraph);
        assert_eq!(blocks[1].text(), "First para.");
        assert_eq!(blocks[1].markup(), "<p>First <em>para</em>.</p>");
        assert_eq!(blocks[2].kind, BlockKind::Other);
    }

    #[test]
    fn test_whitespace_and_breaks() {
        let blocks = parse_blocks("<p>  one\n   two<br>three <br/> four </p>");

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text(), "one two\nthree\nfour");
    }

    #[test]
    fn test_entities() {
        let blocks = parse_blocks("<p>a &amp; b&nbsp;c &#65;&#x42; &bogus;</p>");

        assert_eq!(blocks[0].text(), "a & b\u{a0}c AB &bogus;");
    }

    #[test]
    fn test_loose_text_becomes_other() {
        let blocks = parse_blocks("  \n<p>x</p> stray words <p>y</p>  ");

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].kind, BlockKind::Other);
        assert_eq!(blocks[1].text(), "stray words");
    }

    #[test]
    fn test_unclosed_element() {
        let blocks = parse_blocks("<p>one</p><p>two <b>bold");

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].text(), "two bold");
        assert_eq!(blocks[1].markup(), "<p>two <b>bold");
    }

    #[test]
    fn test_nested_same_tag() {
        let blocks = parse_blocks("<div><div>inner</div>after</div><p>next</p>");

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text(), "innerafter");
        assert_eq!(blocks[1].kind, BlockKind::Paragraph);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_blocks("").is_empty());
        assert!(parse_blocks("   \n ").is_empty());
    }

    #[test]
    fn test_void_top_level() {
        let blocks = parse_blocks("<p>a</p><hr><p>b</p>");

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].kind, BlockKind::Other);
        assert_eq!(blocks[1].markup(), "<hr>");
        assert_eq!(blocks[1].text(), "");
    }

    #[test]
    fn test_bare_ampersand() {
        let blocks = parse_blocks("<p>Tom & Jerry</p><h1>Chapter</h1><p>Q&A</p>");

        assert_eq!(
            kinds(&blocks),
            vec![BlockKind::Paragraph, BlockKind::Heading1, BlockKind::Paragraph]
        );
        assert_eq!(blocks[0].text(), "Tom & Jerry");
        assert_eq!(blocks[1].text(), "Chapter");
        assert_eq!(blocks[2].text(), "Q&A");
    }

    #[test]
    fn test_malformed_text_keeps_headings() {
        let blocks = parse_blocks("<p>if a < b then</p><h2>Next</h2><p>x <3 y & z</p>");

        assert_eq!(
            kinds(&blocks),
            vec![BlockKind::Paragraph, BlockKind::Heading2, BlockKind::Paragraph]
        );
        assert_eq!(blocks[0].text(), "if a < b then");
        assert_eq!(blocks[0].markup(), "<p>if a &lt; b then</p>");
        assert_eq!(blocks[1].text(), "Next");
        assert_eq!(blocks[2].text(), "x <3 y & z");
    }

    #[test]
    fn test_paragraph_closed_implicitly() {
        let blocks = parse_blocks("<p>one<p>two<h1>Head</h1><p>three<hr>four");

        assert_eq!(
            kinds(&blocks),
            vec![
                BlockKind::Paragraph,
                BlockKind::Paragraph,
                BlockKind::Heading1,
                BlockKind::Paragraph,
                BlockKind::Other,
                BlockKind::Other,
            ]
        );
        assert_eq!(blocks[0].text(), "one");
        assert_eq!(blocks[0].markup(), "<p>one");
        assert_eq!(blocks[1].text(), "two");
        assert_eq!(blocks[2].text(), "Head");
        assert_eq!(blocks[3].text(), "three");
        assert_eq!(blocks[5].text(), "four");
    }

    #[test]
    fn test_stray_inline_end_tag() {
        let blocks = parse_blocks("<h2>Title</em> more</h2><p>body</p>");

        assert_eq!(kinds(&blocks), vec![BlockKind::Heading2, BlockKind::Paragraph]);
        assert_eq!(blocks[0].text(), "Title more");
    }

    #[test]
    fn test_comments_and_cdata_untouched() {
        let blocks = parse_blocks("<!-- a < b --><p><![CDATA[1 < 2]]></p>");

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text(), "1 < 2");
    }

    #[test]
    fn test_tokenizer_error_recovery() {
        let blocks = parse_blocks("<p>one</p><p>two <!x> three</p><h1>Head</h1><p>four</p>");

        assert_eq!(
            kinds(&blocks),
            vec![
                BlockKind::Paragraph,
                BlockKind::Other,
                BlockKind::Heading1,
                BlockKind::Paragraph,
            ]
        );
        assert_eq!(blocks[0].text(), "one");
        assert_eq!(blocks[1].text(), "two three");
        assert_eq!(blocks[1].markup(), "<p>two <!x> three</p>");
        assert_eq!(blocks[2].text(), "Head");
        assert_eq!(blocks[3].text(), "four");
    }

    #[test]
    fn test_tokenizer_error_at_end() {
        let blocks = parse_blocks("<h1>Head</h1><p>tail <b");

        assert_eq!(kinds(&blocks), vec![BlockKind::Heading1, BlockKind::Other]);
        assert_eq!(blocks[1].text(), "tail");
    }
}
