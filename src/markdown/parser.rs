//! Markdown → plain text + entities.
//!
//! Markers are toggles, not a stack: the first `*` opens bold, the next `*`
//! closes it, independently of every other marker kind. A marker still open
//! at the end of the input is not formatting at all, so the input is scanned
//! again with that marker copied as text, until nothing is left open.

use std::collections::BTreeSet;

use crate::config::MarkdownVersion;
use crate::entity::{Entity, EntityType, FormattedText};
use crate::error::Error;
use crate::normalize::normalize;
use crate::utf16;

use super::Marker;

const FENCE: &str = "```";

/// Parse `input` into plain text and normalized entities.
pub(crate) fn parse(
    input: &str,
    version: MarkdownVersion,
    max_depth: usize,
) -> Result<FormattedText, Error> {
    let mut literal = BTreeSet::new();
    loop {
        let scan = Scanner::new(input, version, &literal)?.scan();
        if scan.unclosed.is_empty() {
            let entities = normalize(scan.entities, max_depth)?;
            return Ok(FormattedText::new(scan.text, entities));
        }
        tracing::debug!(unclosed = ?scan.unclosed, "re-scanning with unclosed markers as text");
        literal.extend(scan.unclosed);
    }
}

/// Result of one pass over the input.
struct Scan {
    text: String,
    entities: Vec<Entity>,
    /// Byte offsets of markers that were opened but never closed.
    unclosed: Vec<usize>,
}

#[derive(Clone, Copy, Debug)]
struct OpenMarker {
    /// UTF-16 position in the plain text where the span starts.
    position: u32,
    /// Byte offset of the marker in the input.
    source: usize,
}

#[derive(Debug)]
struct OpenPre {
    marker: OpenMarker,
    language: Option<String>,
}

/// A `[label](url)` found in the input, as byte ranges.
struct LinkSyntax<'i> {
    label: &'i str,
    url: &'i str,
    /// Byte offset just past the closing `)`.
    end: usize,
}

struct Scanner<'i, 'l> {
    input: &'i str,
    version: MarkdownVersion,
    /// Byte offsets of markers to copy as plain text.
    literal: &'l BTreeSet<usize>,
    /// Byte offset of the next unread input.
    cursor: usize,
    text: String,
    /// UTF-16 length of `text`.
    position: u32,
    entities: Vec<Entity>,
    open: [Option<OpenMarker>; Marker::COUNT],
    pre: Option<OpenPre>,
    /// Byte offset just past the last `_` or `__` marker.
    underscore_end: Option<usize>,
}

impl<'i, 'l> Scanner<'i, 'l> {
    fn new(
        input: &'i str,
        version: MarkdownVersion,
        literal: &'l BTreeSet<usize>,
    ) -> Result<Self, Error> {
        let mut text = String::new();
        text.try_reserve(input.len())?;
        Ok(Self {
            input,
            version,
            literal,
            cursor: 0,
            text,
            position: 0,
            entities: Vec::new(),
            open: [None; Marker::COUNT],
            pre: None,
            underscore_end: None,
        })
    }

    fn is_v2(&self) -> bool {
        self.version == MarkdownVersion::V2
    }

    fn rest(&self) -> &'i str {
        &self.input[self.cursor..]
    }

    fn scan(mut self) -> Scan {
        while let Some(c) = self.rest().chars().next() {
            if self.pre.is_some() {
                self.scan_pre(c);
            } else if self.open[Marker::Code as usize].is_some() {
                self.scan_code(c);
            } else {
                self.scan_inline(c);
            }
        }

        let unclosed = self
            .open
            .iter()
            .flatten()
            .chain(self.pre.as_ref().map(|pre| &pre.marker))
            .map(|marker| marker.source)
            .collect();
        Scan {
            text: self.text,
            entities: self.entities,
            unclosed,
        }
    }

    /// Inside a pre block everything up to the closing fence is text, save
    /// for escaped backticks and backslashes.
    fn scan_pre(&mut self, c: char) {
        let rest = self.rest();
        if self.scan_verbatim_escape(c) {
            return;
        }
        if rest.starts_with(FENCE) {
            self.cursor += FENCE.len();
            if let Some(pre) = self.pre.take() {
                self.emit(EntityType::Pre, pre.marker.position, pre.language);
            }
        } else if rest.starts_with('\n') && rest[1..].starts_with(FENCE) {
            // The line break before the closing fence belongs to the fence.
            self.cursor += 1;
        } else {
            self.push_source_char(c);
        }
    }

    /// Inside inline code everything up to the next unescaped backtick is text.
    fn scan_code(&mut self, c: char) {
        if self.scan_verbatim_escape(c) {
            return;
        }
        if c == '`' {
            self.cursor += 1;
            self.close_marker(Marker::Code);
        } else {
            self.push_source_char(c);
        }
    }

    /// Read a backslash-escaped backtick or backslash inside V2 code or pre.
    fn scan_verbatim_escape(&mut self, c: char) -> bool {
        if !self.is_v2() || c != '\\' {
            return false;
        }
        match self.rest()[1..].chars().next() {
            Some(escaped @ ('`' | '\\')) => {
                self.cursor += 2;
                self.push(escaped);
                true
            }
            _ => false,
        }
    }

    fn scan_inline(&mut self, c: char) {
        let rest = self.rest();
        let v2 = self.is_v2();

        if c == '\r' && self.underscore_end == Some(self.cursor) {
            // Separates `_` markers that would otherwise read as `__`.
            self.cursor += 1;
            return;
        }

        if v2 && c == '\\' {
            if let Some(escaped) = rest[1..].chars().next().filter(char::is_ascii_punctuation) {
                self.cursor += 2;
                self.push(escaped);
                return;
            }
        }

        if v2 && rest.starts_with(FENCE) {
            self.open_pre();
            return;
        }

        let marker = match c {
            '`' => Some(Marker::Code),
            '|' if v2 && rest.starts_with("||") => Some(Marker::Spoiler),
            '_' if v2 && rest.starts_with("__") => Some(Marker::Underline),
            '*' => Some(Marker::Bold),
            '_' if v2 => Some(Marker::Italic),
            '~' if v2 => Some(Marker::Strikethrough),
            _ => None,
        };
        if let Some(marker) = marker {
            self.toggle(marker);
            return;
        }

        if c == '[' {
            if let Some(link) = self.find_link() {
                self.cursor = link.end;
                self.push_link(link.label, link.url);
                return;
            }
        }

        self.push_source_char(c);
    }

    fn toggle(&mut self, marker: Marker) {
        let source = self.cursor;
        let spelling = marker.spelling();
        self.cursor += spelling.len();
        if self.literal.contains(&source) {
            self.push_str(spelling);
            return;
        }
        match self.open[marker as usize] {
            Some(_) => self.close_marker(marker),
            None => {
                self.open[marker as usize] = Some(OpenMarker {
                    position: self.position,
                    source,
                });
            }
        }
        if matches!(marker, Marker::Italic | Marker::Underline) {
            self.underscore_end = Some(self.cursor);
        }
    }

    /// Close the open `marker`, emitting its entity.
    fn close_marker(&mut self, marker: Marker) {
        if let Some(open) = self.open[marker as usize].take() {
            self.emit(marker.entity_type(), open.position, None);
        }
    }

    fn open_pre(&mut self) {
        let source = self.cursor;
        self.cursor += FENCE.len();
        if self.literal.contains(&source) {
            self.push_str(FENCE);
            return;
        }

        // The rest of the opening line names the language, unless the block
        // closes on that same line.
        let rest = self.rest();
        let language = match rest.find('\n') {
            Some(line_end) if !rest[..line_end].contains(FENCE) => {
                self.cursor += line_end + 1;
                Some(rest[..line_end].trim())
                    .filter(|language| !language.is_empty())
                    .map(str::to_string)
            }
            _ => None,
        };
        tracing::trace!(source, ?language, "open pre");
        self.pre = Some(OpenPre {
            marker: OpenMarker {
                position: self.position,
                source,
            },
            language,
        });
    }

    /// Match `[label](url)` at the cursor.
    ///
    /// Brackets inside the label nest; in V2, escaped brackets and an escaped
    /// `)` in the URL are skipped.
    fn find_link(&self) -> Option<LinkSyntax<'i>> {
        let input = self.input;
        let bytes = input.as_bytes();
        let v2 = self.is_v2();
        let is_escape = |at: usize| {
            v2 && bytes[at] == b'\\' && bytes.get(at + 1).is_some_and(u8::is_ascii_punctuation)
        };

        let label_start = self.cursor + 1;
        let mut depth = 1usize;
        let mut at = label_start;
        let label_end = loop {
            match bytes.get(at).copied()? {
                _ if is_escape(at) => at += 2,
                b'[' => {
                    depth += 1;
                    at += 1;
                }
                b']' => {
                    depth -= 1;
                    if depth == 0 {
                        break at;
                    }
                    at += 1;
                }
                _ => at += 1,
            }
        };

        if bytes.get(label_end + 1) != Some(&b'(') {
            return None;
        }
        let url_start = label_end + 2;
        let mut at = url_start;
        let url_end = loop {
            match bytes.get(at).copied()? {
                _ if is_escape(at) => at += 2,
                b')' => break at,
                _ => at += 1,
            }
        };

        Some(LinkSyntax {
            label: &input[label_start..label_end],
            url: &input[url_start..url_end],
            end: url_end + 1,
        })
    }

    fn push_link(&mut self, label: &str, url: &str) {
        let start = self.position;
        let label = self.unescape(label);
        self.push_str(&label);
        let url = self.unescape(url);
        tracing::trace!(start, ?url, "link");
        self.emit(EntityType::TextLink, start, Some(url));
    }

    /// Resolve V2 backslash escapes. V1 has none.
    fn unescape(&self, s: &str) -> String {
        if !self.is_v2() {
            return s.to_string();
        }
        let mut output = String::with_capacity(s.len());
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            match chars.peek() {
                Some(&escaped) if c == '\\' && escaped.is_ascii_punctuation() => {
                    output.push(escaped);
                    chars.next();
                }
                _ => output.push(c),
            }
        }
        output
    }

    fn emit(&mut self, kind: EntityType, start: u32, extra: Option<String>) {
        let length = self.position - start;
        if length > 0 {
            self.entities.push(Entity {
                kind,
                offset: start,
                length,
                extra,
            });
        }
    }

    /// Copy `c` from the input to the plain text.
    fn push_source_char(&mut self, c: char) {
        self.cursor += c.len_utf8();
        self.push(c);
    }

    fn push(&mut self, c: char) {
        self.text.push(c);
        self.position = self.position.saturating_add(utf16::units(c));
    }

    fn push_str(&mut self, s: &str) {
        s.chars().for_each(|c| self.push(c));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_DEPTH;
    use crate::entity::EntityType::*;
    use MarkdownVersion::*;

    fn md(input: &str, version: MarkdownVersion) -> (String, Vec<Entity>) {
        let parsed = parse(input, version, DEFAULT_MAX_DEPTH).unwrap();
        (parsed.text, parsed.entities)
    }

    #[test]
    fn bold() {
        assert_eq!(
            md("Hello *world*", V2),
            ("Hello world".into(), vec![Entity::new(Bold, 6, 5)])
        );
    }

    #[test]
    fn unterminated_marker_is_text() {
        assert_eq!(md("Hello *world", V2), ("Hello *world".into(), vec![]));
        assert_eq!(
            md("*a* b *c", V2),
            ("a b *c".into(), vec![Entity::new(Bold, 0, 1)])
        );
    }

    #[test]
    fn unterminated_code_lets_the_rest_format() {
        assert_eq!(
            md("`x *y*", V2),
            ("`x y".into(), vec![Entity::new(Bold, 3, 1)])
        );
    }

    #[test]
    fn every_v2_marker() {
        let (text, entities) = md("*b* _i_ __u__ ~s~ ||p|| `c`", V2);
        assert_eq!(text, "b i u s p c");
        assert_eq!(
            entities,
            vec![
                Entity::new(Bold, 0, 1),
                Entity::new(Italic, 2, 1),
                Entity::new(Underline, 4, 1),
                Entity::new(Strikethrough, 6, 1),
                Entity::new(Spoiler, 8, 1),
                Entity::new(Code, 10, 1),
            ]
        );
    }

    #[test]
    fn nested_markers() {
        assert_eq!(
            md("*Bold _italic_*", V2),
            (
                "Bold italic".into(),
                vec![Entity::new(Bold, 0, 11), Entity::new(Italic, 5, 6)]
            )
        );
    }

    #[test]
    fn crossing_markers_are_normalized() {
        assert_eq!(
            md("*a _b* c_", V2),
            ("a b c".into(), vec![Entity::new(Bold, 0, 3)])
        );
    }

    #[test]
    fn code_is_literal() {
        assert_eq!(
            md("`*not bold* \\_`", V2),
            ("*not bold* \\_".into(), vec![Entity::new(Code, 0, 13)])
        );
    }

    #[test]
    fn code_and_pre_read_escaped_backticks() {
        assert_eq!(
            md(r"`a\`b \\ \_`", V2),
            (r"a`b \ \_".into(), vec![Entity::new(Code, 0, 8)])
        );
        assert_eq!(
            md("```\na\\`\\`\\`b\n```", V2),
            ("a```b".into(), vec![Entity::new(Pre, 0, 5)])
        );
        assert_eq!(md(r"`a\`", V1), (r"a\".into(), vec![Entity::new(Code, 0, 2)]));
    }

    #[test]
    fn carriage_return_after_underscore_marker_is_dropped() {
        assert_eq!(
            md("_a_\r_b_", V2),
            (
                "ab".into(),
                vec![Entity::new(Italic, 0, 1), Entity::new(Italic, 1, 1)]
            )
        );
        assert_eq!(
            md("__\r_a_b__", V2),
            (
                "ab".into(),
                vec![Entity::new(Underline, 0, 2), Entity::new(Italic, 0, 1)]
            )
        );
        assert_eq!(
            md("a\r_b_ \r", V2),
            ("a\rb \r".into(), vec![Entity::new(Italic, 2, 1)])
        );
    }

    #[test]
    fn escapes() {
        assert_eq!(md(r"2 \* 3 \= 6\\", V2), (r"2 * 3 = 6\".into(), vec![]));
        assert_eq!(md(r"a\b", V2), (r"a\b".into(), vec![]));
    }

    #[test]
    fn pre_block_with_language() {
        assert_eq!(
            md("```rust\nfn main() {}\n```", V2),
            (
                "fn main() {}".into(),
                vec![Entity::with_extra(Pre, 0, 12, "rust")]
            )
        );
    }

    #[test]
    fn pre_block_on_one_line() {
        assert_eq!(
            md("```*x*```", V2),
            ("*x*".into(), vec![Entity::new(Pre, 0, 3)])
        );
    }

    #[test]
    fn unterminated_pre_is_text() {
        assert_eq!(
            md("```rust\n*x*", V2),
            ("```rust\nx".into(), vec![Entity::new(Bold, 8, 1)])
        );
    }

    #[test]
    fn links() {
        assert_eq!(
            md("see [the docs](https://example.com/a_b)!", V2),
            (
                "see the docs!".into(),
                vec![Entity::with_extra(TextLink, 4, 8, "https://example.com/a_b")]
            )
        );
        assert_eq!(
            md(r"[a \] [b]](https://x.example/\))", V2),
            (
                "a ] [b]".into(),
                vec![Entity::with_extra(TextLink, 0, 7, "https://x.example/)")]
            )
        );
    }

    #[test]
    fn broken_link_is_text() {
        assert_eq!(md("[a] (b)", V1), ("[a] (b)".into(), vec![]));
        assert_eq!(md("[a](b", V1), ("[a](b".into(), vec![]));
    }

    #[test]
    fn v1_subset() {
        assert_eq!(
            md("*b* _i_ ~s~ `c` [l](u)", V1),
            (
                "b _i_ ~s~ c l".into(),
                vec![
                    Entity::new(Bold, 0, 1),
                    Entity::new(Code, 10, 1),
                    Entity::with_extra(TextLink, 12, 1, "u"),
                ]
            )
        );
        assert_eq!(
            md(r"\*x\*", V1),
            (r"\x\".into(), vec![Entity::new(Bold, 1, 2)])
        );
    }

    #[test]
    fn surrogate_pairs_count_twice() {
        assert_eq!(
            md("a*🙂*b", V2),
            ("a🙂b".into(), vec![Entity::new(Bold, 1, 2)])
        );
    }

    #[test]
    fn third_marker_stays_open() {
        assert_eq!(
            md("*a* *b", V2),
            ("a *b".into(), vec![Entity::new(Bold, 0, 1)])
        );
    }

    #[test]
    fn empty_spans_vanish() {
        assert_eq!(md("a ** b", V2), ("a  b".into(), vec![]));
    }
}
