//! HTML → plain text + entities.

use crate::entity::{Entity, EntityType, FormattedText};
use crate::error::Error;
use crate::normalize::normalize;
use crate::utf16;

use super::char_ref;
use super::tag::Tag;

/// Parse `input` into plain text and normalized entities.
///
/// Unknown tags are dropped but their content kept; unclosed tags produce no
/// entity. Fails only if tags nest deeper than `max_depth` or the output
/// cannot be allocated.
pub(crate) fn parse(input: &str, max_depth: usize) -> Result<FormattedText, Error> {
    HtmlParser::new(input, max_depth)?.parse()
}

/// A tag waiting for its closing counterpart.
#[derive(Debug)]
struct OpenTag {
    kind: EntityType,
    /// UTF-16 position in the plain text where the tag opened.
    start: u32,
    extra: Option<String>,
    /// A `<code>` folded into the `<pre>` around it. Closes without an entity.
    folded: bool,
}

struct HtmlParser<'i> {
    input: &'i str,
    max_depth: usize,
    text: String,
    /// UTF-16 length of `text`.
    position: u32,
    /// Open tags, innermost last.
    stack: Vec<OpenTag>,
    entities: Vec<Entity>,
}

impl<'i> HtmlParser<'i> {
    fn new(input: &'i str, max_depth: usize) -> Result<Self, Error> {
        let mut text = String::new();
        text.try_reserve(input.len())?;
        Ok(Self {
            input,
            max_depth,
            text,
            position: 0,
            stack: Vec::new(),
            entities: Vec::new(),
        })
    }

    fn parse(mut self) -> Result<FormattedText, Error> {
        let mut rest = self.input;
        while let Some(c) = rest.chars().next() {
            if c == '<' {
                if let Some((inner, consumed)) = tag_at(rest) {
                    self.handle_tag(Tag::parse(inner))?;
                    rest = &rest[consumed..];
                    continue;
                }
            } else if c == '&' {
                if let Some((decoded, consumed)) = char_ref::decode(rest) {
                    self.push(decoded);
                    rest = &rest[consumed..];
                    continue;
                }
            }
            self.push(c);
            rest = &rest[c.len_utf8()..];
        }

        if !self.stack.is_empty() {
            tracing::debug!(unclosed = ?self.stack, "discarding unclosed tags");
        }
        let entities = normalize(self.entities, self.max_depth)?;
        Ok(FormattedText::new(self.text, entities))
    }

    fn handle_tag(&mut self, tag: Tag<'_>) -> Result<(), Error> {
        let Some(kind) = tag.entity_type() else {
            tracing::trace!(name = tag.name, "skipping unknown tag");
            return Ok(());
        };
        if tag.is_close {
            self.close(kind);
            return Ok(());
        }

        let mut folded = false;
        let extra = match kind {
            EntityType::Pre => tag.language(),
            EntityType::Code => {
                // `<pre><code class="language-x">` names the pre block's language.
                // A plain `<code>` there is its own entity.
                if let Some(language) = tag.language() {
                    if let Some(pre) = self
                        .stack
                        .last_mut()
                        .filter(|open| open.kind == EntityType::Pre && open.start == self.position)
                    {
                        pre.extra.get_or_insert(language);
                        folded = true;
                    }
                }
                None
            }
            EntityType::TextLink => match tag.attribute("href") {
                Some(href) => Some(href),
                None => return Ok(()),
            },
            EntityType::CustomEmoji => match tag.attribute("emoji-id") {
                Some(id) => Some(id),
                None => return Ok(()),
            },
            _ => None,
        };

        if self.stack.len() >= self.max_depth {
            return Err(Error::DepthExceeded {
                limit: self.max_depth,
            });
        }
        self.stack.push(OpenTag {
            kind,
            start: self.position,
            extra,
            folded,
        });
        Ok(())
    }

    /// Close the innermost open tag of `kind`, tolerating out-of-order closes.
    fn close(&mut self, kind: EntityType) {
        let Some(index) = self.stack.iter().rposition(|open| open.kind == kind) else {
            tracing::trace!(?kind, "closing tag without an open one");
            return;
        };
        let open = self.stack.remove(index);
        let length = self.position - open.start;
        if !open.folded && length > 0 {
            self.entities.push(Entity {
                kind,
                offset: open.start,
                length,
                extra: open.extra,
            });
        }
    }

    fn push(&mut self, c: char) {
        self.text.push(c);
        self.position = self.position.saturating_add(utf16::units(c));
    }
}

/// Find the tag starting at the `<` that begins `input`.
///
/// Returns the text between `<` and `>` and the number of bytes the whole tag
/// spans. A `<` not followed by a letter, `/` or `!`, or never closed, is not
/// a tag.
fn tag_at(input: &str) -> Option<(&str, usize)> {
    let after = input.strip_prefix('<')?;
    if let Some(comment) = after.strip_prefix("!--") {
        let end = comment.find("-->")?;
        let inner_len = "!--".len() + end;
        return Some((&after[..inner_len], 1 + inner_len + "-->".len()));
    }
    match after.bytes().next()? {
        b'/' | b'!' => {}
        b if b.is_ascii_alphabetic() => {}
        _ => return None,
    }
    let end = after.find('>')?;
    Some((&after[..end], end + 2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_DEPTH;
    use crate::entity::EntityType::*;

    fn html(input: &str) -> (String, Vec<Entity>) {
        let parsed = parse(input, DEFAULT_MAX_DEPTH).unwrap();
        (parsed.text, parsed.entities)
    }

    #[test]
    fn bold() {
        assert_eq!(
            html("Hello <b>world</b>"),
            ("Hello world".into(), vec![Entity::new(Bold, 6, 5)])
        );
    }

    #[test]
    fn tag_aliases() {
        let (text, entities) = html(
            "<STRONG>b</strong><em>i</em><ins>u</ins><del>s</del><strike>s</strike>\
             <tg-spoiler>p</tg-spoiler><blockquote>q</blockquote>",
        );
        assert_eq!(text, "biusspq");
        assert_eq!(
            entities,
            vec![
                Entity::new(Bold, 0, 1),
                Entity::new(Italic, 1, 1),
                Entity::new(Underline, 2, 1),
                Entity::new(Strikethrough, 3, 1),
                Entity::new(Strikethrough, 4, 1),
                Entity::new(Spoiler, 5, 1),
                Entity::new(Blockquote, 6, 1),
            ]
        );
    }

    #[test]
    fn links_and_custom_emoji() {
        assert_eq!(
            html(r#"<a href='https://example.com/?a=1&amp;b=2'>link</a> <tg-emoji emoji-id=5368324170671202286>🙂</tg-emoji>"#),
            (
                "link 🙂".into(),
                vec![
                    Entity::with_extra(TextLink, 0, 4, "https://example.com/?a=1&b=2"),
                    Entity::with_extra(CustomEmoji, 5, 2, "5368324170671202286"),
                ]
            )
        );
    }

    #[test]
    fn attributeless_link_is_ignored() {
        assert_eq!(html("<a>x</a>"), ("x".into(), vec![]));
    }

    #[test]
    fn pre_with_language() {
        assert_eq!(
            html(r#"<pre><code class="language-rust">fn main() {}</code></pre>"#),
            (
                "fn main() {}".into(),
                vec![Entity::with_extra(Pre, 0, 12, "rust")]
            )
        );
        assert_eq!(
            html(r#"<pre class="language-c">x</pre>"#),
            ("x".into(), vec![Entity::with_extra(Pre, 0, 1, "c")])
        );
    }

    #[test]
    fn plain_code_at_pre_start_is_kept() {
        assert_eq!(
            html("<pre><code>a</code>bc</pre>"),
            (
                "abc".into(),
                vec![Entity::new(Pre, 0, 3), Entity::new(Code, 0, 1)]
            )
        );
        assert_eq!(
            html("<pre><code>abc</code></pre>"),
            (
                "abc".into(),
                vec![Entity::new(Pre, 0, 3), Entity::new(Code, 0, 3)]
            )
        );
    }

    #[test]
    fn code_inside_pre_text_is_kept() {
        assert_eq!(
            html("<pre>a <code>b</code></pre>"),
            (
                "a b".into(),
                vec![Entity::new(Pre, 0, 3), Entity::new(Code, 2, 1)]
            )
        );
    }

    #[test]
    fn character_references() {
        assert_eq!(
            html("a &lt;b&gt; &amp; &#x1F642; &#65; &bogus; &"),
            ("a <b> & 🙂 A &bogus; &".into(), vec![])
        );
        assert_eq!(
            html("<b>&#x1F642;</b>"),
            ("🙂".into(), vec![Entity::new(Bold, 0, 2)])
        );
    }

    #[test]
    fn unknown_tags_keep_their_content() {
        assert_eq!(
            html("<p>a <span>b</span></p><!-- <b>not</b> --><br/>"),
            ("a b".into(), vec![])
        );
    }

    #[test]
    fn stray_angle_brackets_are_text() {
        assert_eq!(html("1 < 2 and 3 > 2"), ("1 < 2 and 3 > 2".into(), vec![]));
        assert_eq!(html("a <b"), ("a <b".into(), vec![]));
    }

    #[test]
    fn mismatched_close_order() {
        assert_eq!(
            html("<b>a<i>b</b>c</i>"),
            ("abc".into(), vec![Entity::new(Bold, 0, 2)])
        );
        assert_eq!(
            html("<b>a<i>b</i></b>"),
            (
                "ab".into(),
                vec![Entity::new(Bold, 0, 2), Entity::new(Italic, 1, 1)]
            )
        );
    }

    #[test]
    fn unclosed_and_empty_tags_emit_nothing() {
        assert_eq!(html("<b>a</i>"), ("a".into(), vec![]));
        assert_eq!(html("a<b></b>"), ("a".into(), vec![]));
    }

    #[test]
    fn depth_limit() {
        assert!(matches!(
            parse("<b><i><u>x</u></i></b>", 2),
            Err(Error::DepthExceeded { limit: 2 })
        ));
        assert!(parse("<b><i>x</i></b><u>y</u>", 2).is_ok());
    }
}
