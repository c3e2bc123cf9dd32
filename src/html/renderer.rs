//! Plain text + entities → HTML.

use std::fmt::Write;

use crate::entity::{Entity, EntityType};
use crate::error::Error;
use crate::render::{self, Markup, USER_LINK_PREFIX};

use super::char_ref::{escape_attribute, escape_text};

/// Render `text` and `entities` as HTML.
///
/// Only `&`, `<` and `>` are escaped in text. Entities with no HTML form,
/// such as mentions and hashtags that clients detect on their own, are left
/// out and their text written plainly.
pub(crate) fn render(text: &str, entities: &[Entity]) -> Result<String, Error> {
    let mut buffer = String::new();
    buffer.try_reserve(text.len() + entities.len() * 16)?;
    render::render(text, entities, HtmlMarkup { buffer })
}

struct HtmlMarkup {
    buffer: String,
}

impl Write for HtmlMarkup {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.buffer.push_str(s);
        Ok(())
    }
}

/// The simple tag name for `kind`, when it has one and no attributes.
fn plain_tag(kind: EntityType) -> Option<&'static str> {
    Some(match kind {
        EntityType::Bold => "b",
        EntityType::Italic => "i",
        EntityType::Underline => "u",
        EntityType::Strikethrough => "s",
        EntityType::Spoiler => "tg-spoiler",
        EntityType::Code => "code",
        EntityType::Blockquote => "blockquote",
        _ => return None,
    })
}

/// The language of a pre block. An empty language counts as none.
fn pre_language(entity: &Entity) -> Option<&str> {
    entity.extra.as_deref().filter(|language| !language.is_empty())
}

impl Markup for HtmlMarkup {
    fn open(&mut self, entity: &Entity) -> std::fmt::Result {
        if let Some(tag) = plain_tag(entity.kind) {
            return write!(self, "<{tag}>");
        }
        let extra = entity.extra.as_deref().unwrap_or_default();
        match entity.kind {
            EntityType::Pre => match pre_language(entity) {
                Some(language) => write!(
                    self,
                    r#"<pre><code class="language-{}">"#,
                    escape_attribute(language)
                ),
                None => self.write_str("<pre>"),
            },
            EntityType::TextLink => write!(self, r#"<a href="{}">"#, escape_attribute(extra)),
            EntityType::TextMention => write!(
                self,
                r#"<a href="{USER_LINK_PREFIX}{}">"#,
                escape_attribute(extra)
            ),
            EntityType::CustomEmoji => write!(
                self,
                r#"<tg-emoji emoji-id="{}">"#,
                escape_attribute(extra)
            ),
            _ => Ok(()),
        }
    }

    fn close(&mut self, entity: &Entity) -> std::fmt::Result {
        if let Some(tag) = plain_tag(entity.kind) {
            return write!(self, "</{tag}>");
        }
        match entity.kind {
            EntityType::Pre if pre_language(entity).is_some() => self.write_str("</code></pre>"),
            EntityType::Pre => self.write_str("</pre>"),
            EntityType::TextLink | EntityType::TextMention => self.write_str("</a>"),
            EntityType::CustomEmoji => self.write_str("</tg-emoji>"),
            _ => Ok(()),
        }
    }

    fn text(&mut self, c: char) -> std::fmt::Result {
        match escape_text(c) {
            Some(escaped) => self.write_str(escaped),
            None => self.write_char(c),
        }
    }

    fn into_buffer(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType::*;

    #[test]
    fn bold() {
        assert_eq!(
            render("Hello world", &[Entity::new(Bold, 6, 5)]).unwrap(),
            "Hello <b>world</b>"
        );
    }

    #[test]
    fn escapes_text() {
        assert_eq!(
            render("a < b & c > d \"e\"", &[]).unwrap(),
            "a &lt; b &amp; c &gt; d \"e\""
        );
    }

    #[test]
    fn nesting_follows_input_order() {
        let entities = [Entity::new(Bold, 0, 5), Entity::new(Italic, 0, 5)];
        assert_eq!(render("hello", &entities).unwrap(), "<b><i>hello</i></b>");
        let entities = [Entity::new(Italic, 0, 5), Entity::new(Bold, 0, 5)];
        assert_eq!(render("hello", &entities).unwrap(), "<i><b>hello</b></i>");
    }

    #[test]
    fn shared_boundaries() {
        let entities = [
            Entity::new(Bold, 0, 11),
            Entity::new(Italic, 6, 5),
            Entity::new(Underline, 11, 1),
        ];
        assert_eq!(
            render("Hello world!", &entities).unwrap(),
            "<b>Hello <i>world</i></b><u>!</u>"
        );
    }

    #[test]
    fn attributes_are_escaped() {
        let entities = [
            Entity::with_extra(TextLink, 0, 1, r#"https://x.example/?a="1"&b=<2>"#),
            Entity::with_extra(TextMention, 2, 1, "42"),
            Entity::with_extra(CustomEmoji, 4, 2, "5368324170671202286"),
        ];
        assert_eq!(
            render("a b 🙂", &entities).unwrap(),
            r#"<a href="https://x.example/?a=&quot;1&quot;&amp;b=&lt;2&gt;">a</a> <a href="tg://user?id=42">b</a> <tg-emoji emoji-id="5368324170671202286">🙂</tg-emoji>"#
        );
    }

    #[test]
    fn pre_blocks() {
        assert_eq!(
            render("x<y", &[Entity::with_extra(Pre, 0, 3, "rust")]).unwrap(),
            r#"<pre><code class="language-rust">x&lt;y</code></pre>"#
        );
        assert_eq!(
            render("x", &[Entity::new(Pre, 0, 1)]).unwrap(),
            "<pre>x</pre>"
        );
        assert_eq!(
            render("x", &[Entity::with_extra(Pre, 0, 1, "")]).unwrap(),
            "<pre>x</pre>"
        );
    }

    #[test]
    fn entities_without_tags_are_plain_text() {
        let entities = [
            Entity::new(Mention, 0, 4),
            Entity::new(Hashtag, 5, 3),
            Entity::new(Bold, 5, 3),
        ];
        assert_eq!(
            render("@bob #hi", &entities).unwrap(),
            "@bob <b>#hi</b>"
        );
    }

    #[test]
    fn entities_past_the_text() {
        let entities = [Entity::new(Bold, 0, 10), Entity::new(Italic, 8, 2)];
        assert_eq!(render("abc", &entities).unwrap(), "<b>abc</b>");
    }
}
