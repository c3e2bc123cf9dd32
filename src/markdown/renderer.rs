//! Plain text + entities → Markdown.

use std::fmt::Write;

use crate::config::MarkdownVersion;
use crate::entity::{Entity, EntityType};
use crate::error::Error;
use crate::render::{self, Markup, USER_LINK_PREFIX};

use super::{needs_escape, Marker};

/// Render `text` and `entities` as Markdown of the given `version`.
///
/// V2 output escapes every special character outside code and pre spans,
/// and only backticks and backslashes inside them. V1 has no escapes and only
/// knows bold, code and links; other entities are left out and their text
/// written plainly. Code, pre and link labels hold no further markup, so
/// entities nested in them are left out too.
pub(crate) fn render(
    text: &str,
    entities: &[Entity],
    version: MarkdownVersion,
) -> Result<String, Error> {
    let mut buffer = String::new();
    buffer.try_reserve(text.len() + text.len() / 4 + entities.len() * 4)?;
    render::render(
        text,
        entities,
        MarkdownMarkup {
            buffer,
            version,
            open: Vec::new(),
            after_underscore: false,
        },
    )
}

struct MarkdownMarkup {
    buffer: String,
    version: MarkdownVersion,
    /// Entities opened and not yet closed, innermost last.
    open: Vec<OpenSpan>,
    /// The last thing written was a marker ending in `_`.
    after_underscore: bool,
}

struct OpenSpan {
    kind: EntityType,
    /// Whether its syntax made it into the output.
    written: bool,
}

impl Write for MarkdownMarkup {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.buffer.push_str(s);
        Ok(())
    }
}

impl MarkdownMarkup {
    fn is_v2(&self) -> bool {
        self.version == MarkdownVersion::V2
    }

    fn marker(&self, kind: EntityType) -> Option<Marker> {
        Marker::for_entity(kind).filter(|marker| self.is_v2() || marker.in_v1())
    }

    fn has_syntax(&self, kind: EntityType) -> bool {
        self.marker(kind).is_some()
            || (kind == EntityType::Pre && self.is_v2())
            || matches!(kind, EntityType::TextLink | EntityType::TextMention)
    }

    fn is_written(&self, kinds: &[EntityType]) -> bool {
        self.open
            .iter()
            .any(|span| span.written && kinds.contains(&span.kind))
    }

    /// Inside code or pre, where text is taken as is.
    fn is_verbatim(&self) -> bool {
        self.is_written(&[EntityType::Code, EntityType::Pre])
    }

    fn in_link_label(&self) -> bool {
        self.is_written(&[EntityType::TextLink, EntityType::TextMention])
    }

    /// Write `marker`, keeping it apart from a preceding `_` with `\r`, which
    /// the parser skips.
    fn write_marker(&mut self, marker: Marker) -> std::fmt::Result {
        let spelling = marker.spelling();
        if self.after_underscore && spelling.starts_with('_') {
            self.write_char('\r')?;
        }
        self.after_underscore = spelling.ends_with('_');
        self.write_str(spelling)
    }

    fn write_link_target(&mut self, prefix: &str, target: &str) -> std::fmt::Result {
        self.write_str("](")?;
        self.write_str(prefix)?;
        for c in target.chars() {
            if self.is_v2() && matches!(c, ')' | '\\') {
                self.write_char('\\')?;
            }
            self.write_char(c)?;
        }
        self.write_char(')')
    }
}

impl Markup for MarkdownMarkup {
    fn open(&mut self, entity: &Entity) -> std::fmt::Result {
        let written =
            self.has_syntax(entity.kind) && !self.is_verbatim() && !self.in_link_label();
        self.open.push(OpenSpan {
            kind: entity.kind,
            written,
        });
        if !written {
            return Ok(());
        }
        if let Some(marker) = self.marker(entity.kind) {
            return self.write_marker(marker);
        }
        self.after_underscore = false;
        match entity.kind {
            EntityType::Pre => {
                let language = entity.extra.as_deref().unwrap_or_default();
                writeln!(self, "```{language}")
            }
            EntityType::TextLink | EntityType::TextMention => self.write_char('['),
            _ => Ok(()),
        }
    }

    fn close(&mut self, entity: &Entity) -> std::fmt::Result {
        let written = match self.open.iter().rposition(|span| span.kind == entity.kind) {
            Some(index) => self.open.remove(index).written,
            None => false,
        };
        if !written {
            return Ok(());
        }
        if let Some(marker) = self.marker(entity.kind) {
            return self.write_marker(marker);
        }
        self.after_underscore = false;
        let extra = entity.extra.as_deref().unwrap_or_default();
        match entity.kind {
            EntityType::Pre => self.write_str("\n```"),
            EntityType::TextLink => self.write_link_target("", extra),
            EntityType::TextMention => self.write_link_target(USER_LINK_PREFIX, extra),
            _ => Ok(()),
        }
    }

    fn text(&mut self, c: char) -> std::fmt::Result {
        if self.is_v2() {
            let escape = if self.is_verbatim() {
                matches!(c, '`' | '\\')
            } else {
                needs_escape(c)
            };
            if escape {
                self.write_char('\\')?;
            } else if c == '\r' && self.after_underscore {
                self.write_char('\r')?;
            }
        }
        self.after_underscore = false;
        self.write_char(c)
    }

    fn into_buffer(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType::*;
    use MarkdownVersion::*;

    #[test]
    fn bold() {
        assert_eq!(
            render("Hello world", &[Entity::new(Bold, 6, 5)], V2).unwrap(),
            "Hello *world*"
        );
    }

    #[test]
    fn escapes_special_characters() {
        assert_eq!(
            render("1+1=2. (ok) a_b \\", &[], V2).unwrap(),
            r"1\+1\=2\. \(ok\) a\_b \\"
        );
        assert_eq!(render("1+1=2.", &[], V1).unwrap(), "1+1=2.");
    }

    #[test]
    fn code_is_not_escaped() {
        assert_eq!(
            render("x a.b_c", &[Entity::new(Code, 2, 5)], V2).unwrap(),
            r"x `a.b_c`"
        );
    }

    #[test]
    fn code_and_pre_escape_backticks_and_backslashes() {
        assert_eq!(
            render("a`b \\", &[Entity::new(Code, 0, 5)], V2).unwrap(),
            r"`a\`b \\`"
        );
        assert_eq!(
            render("a```b", &[Entity::new(Pre, 0, 5)], V2).unwrap(),
            "```\na\\`\\`\\`b\n```"
        );
    }

    #[test]
    fn nothing_is_marked_up_inside_code_or_link_labels() {
        let entities = [Entity::new(Code, 0, 2), Entity::new(Bold, 0, 1)];
        assert_eq!(render("ab", &entities, V2).unwrap(), "`ab`");
        let entities = [
            Entity::new(Pre, 0, 2),
            Entity::new(Code, 0, 2),
            Entity::new(Italic, 1, 1),
        ];
        assert_eq!(render("ab", &entities, V2).unwrap(), "```\nab\n```");
        let entities = [
            Entity::with_extra(TextLink, 0, 2, "https://x.example"),
            Entity::new(Italic, 1, 1),
        ];
        assert_eq!(
            render("ab", &entities, V2).unwrap(),
            "[ab](https://x.example)"
        );
        let entities = [
            Entity::new(Bold, 0, 2),
            Entity::with_extra(TextLink, 0, 2, "https://x.example"),
        ];
        assert_eq!(
            render("ab", &entities, V2).unwrap(),
            "*[ab](https://x.example)*"
        );
    }

    #[test]
    fn adjacent_underscore_markers_are_separated() {
        let entities = [Entity::new(Italic, 0, 1), Entity::new(Italic, 1, 1)];
        assert_eq!(render("ab", &entities, V2).unwrap(), "_a_\r_b_");
        let entities = [Entity::new(Italic, 0, 1), Entity::new(Underline, 1, 1)];
        assert_eq!(render("ab", &entities, V2).unwrap(), "_a_\r__b__");
        let entities = [Entity::new(Underline, 0, 2), Entity::new(Italic, 0, 1)];
        assert_eq!(render("ab", &entities, V2).unwrap(), "__\r_a_b__");
        assert_eq!(
            render("a\r", &[Entity::new(Italic, 0, 1)], V2).unwrap(),
            "_a_\r\r"
        );
        let entities = [Entity::new(Italic, 0, 1), Entity::new(Bold, 1, 1)];
        assert_eq!(render("ab", &entities, V2).unwrap(), "_a_*b*");
    }

    #[test]
    fn pre_block() {
        let entities = [Entity::with_extra(Pre, 0, 12, "rust")];
        assert_eq!(
            render("fn main() {}", &entities, V2).unwrap(),
            "```rust\nfn main() {}\n```"
        );
        assert_eq!(
            render("x.y", &[Entity::new(Pre, 0, 3)], V2).unwrap(),
            "```\nx.y\n```"
        );
    }

    #[test]
    fn links_escape_their_target() {
        let entities = [Entity::with_extra(TextLink, 0, 4, "https://x.example/(a)")];
        assert_eq!(
            render("docs", &entities, V2).unwrap(),
            r"[docs](https://x.example/(a\))"
        );
        let entities = [Entity::with_extra(TextMention, 0, 3, "42")];
        assert_eq!(
            render("Bob", &entities, V2).unwrap(),
            "[Bob](tg://user?id=42)"
        );
    }

    #[test]
    fn v1_leaves_out_unknown_entities() {
        let entities = [
            Entity::new(Bold, 0, 1),
            Entity::new(Italic, 2, 1),
            Entity::new(Pre, 4, 1),
        ];
        assert_eq!(render("a b c", &entities, V1).unwrap(), "*a* b c");
    }

    #[test]
    fn entities_without_syntax_are_omitted() {
        let entities = [
            Entity::with_extra(CustomEmoji, 0, 2, "5368324170671202286"),
            Entity::new(Blockquote, 0, 3),
        ];
        assert_eq!(render("🙂!", &entities, V2).unwrap(), r"🙂\!");
    }
}
