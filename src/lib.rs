//! Convert between formatted markup and plain text with message entities.
//!
//! A message is plain text plus a list of [`Entity`] spans, each with an
//! offset and length in UTF-16 code units, the way Telegram's Bot API
//! describes formatting. [tg_markup] reads and writes two surface syntaxes
//! for it: a Markdown shorthand (in [`MarkdownVersion::V1`] and
//! [`MarkdownVersion::V2`] dialects) and a small HTML tag language.
//!
//! [tg_markup]: index.html
//!
//! # Getting Started
//!
//! ```rust
//! use tg_markup::{parse_markdown, render_html, MarkdownVersion};
//!
//! let parsed = parse_markdown("Hello *world*", MarkdownVersion::V2)?;
//! assert_eq!(parsed.text, "Hello world");
//!
//! let html = render_html(&parsed.text, &parsed.entities)?;
//! assert_eq!(html, "Hello <b>world</b>");
//! # Ok::<(), tg_markup::Error>(())
//! ```
//!
//! Malformed markup never fails; it degrades to literal text:
//!
//! ```rust
//! use tg_markup::{parse_html, parse_markdown, MarkdownVersion};
//!
//! let parsed = parse_markdown("Hello *world", MarkdownVersion::V2)?;
//! assert_eq!(parsed.text, "Hello *world");
//! assert!(parsed.entities.is_empty());
//!
//! let parsed = parse_html("1 < 2 <b>unclosed")?;
//! assert_eq!(parsed.text, "1 < 2 unclosed");
//! assert!(parsed.entities.is_empty());
//! # Ok::<(), tg_markup::Error>(())
//! ```
//!
//! # Using the [Transcoder]
//!
//! The [Transcoder] holds a [Config] for the nesting limit and Markdown
//! dialect.
//!
//! ```rust
//! use tg_markup::{Error, MarkdownVersion, Transcoder};
//!
//! let mut transcoder = Transcoder::default();
//! transcoder.max_depth(2).markdown_version(MarkdownVersion::V1);
//!
//! let parsed = transcoder.parse_html("<b>bold <code>code</code></b>")?;
//! assert_eq!(transcoder.render_markdown(&parsed.text, &parsed.entities)?, "*bold `code`*");
//!
//! let too_deep = transcoder.parse_html("<b><i><u>deep</u></i></b>");
//! assert!(matches!(too_deep, Err(Error::DepthExceeded { limit: 2 })));
//! # Ok::<(), tg_markup::Error>(())
//! ```

mod builder;
mod config;
mod entity;
mod error;
mod html;
mod markdown;
mod normalize;
mod render;
pub mod utf16;

pub use builder::Transcoder;
pub use config::{Config, MarkdownVersion, ParseMarkdownVersionError, DEFAULT_MAX_DEPTH};
pub use entity::{format_entities, parse_entities, Entity, EntityType, FormattedText};
pub use error::{Error, ParseEntityError};

/// Parse Markdown of the given dialect into plain text and normalized entities.
///
/// ```rust
/// # use tg_markup::{parse_markdown, Entity, EntityType, MarkdownVersion};
/// let parsed = parse_markdown(r"__under__ \*not bold\*", MarkdownVersion::V2).unwrap();
/// assert_eq!(parsed.text, "under *not bold*");
/// assert_eq!(parsed.entities, [Entity::new(EntityType::Underline, 0, 5)]);
/// ```
pub fn parse_markdown(input: &str, version: MarkdownVersion) -> Result<FormattedText, Error> {
    let mut transcoder = Transcoder::default();
    transcoder.markdown_version(version);
    transcoder.parse_markdown(input)
}

/// Parse HTML into plain text and normalized entities with the default settings.
///
/// ```rust
/// # use tg_markup::{parse_html, Entity, EntityType};
/// let parsed = parse_html(r#"<a href="https://example.com">site</a> &amp; more"#).unwrap();
/// assert_eq!(parsed.text, "site & more");
/// assert_eq!(
///     parsed.entities,
///     [Entity::with_extra(EntityType::TextLink, 0, 4, "https://example.com")]
/// );
/// ```
pub fn parse_html(input: &str) -> Result<FormattedText, Error> {
    Transcoder::default().parse_html(input)
}

/// Render plain text and entities as HTML with the default settings.
///
/// ```rust
/// # use tg_markup::{render_html, Entity, EntityType};
/// let entities = [Entity::with_extra(EntityType::Pre, 0, 5, "rust")];
/// let html = render_html("a < b", &entities).unwrap();
/// assert_eq!(html, r#"<pre><code class="language-rust">a &lt; b</code></pre>"#);
/// ```
pub fn render_html(text: &str, entities: &[Entity]) -> Result<String, Error> {
    Transcoder::default().render_html(text, entities)
}

/// Render plain text and entities as Markdown of the given dialect.
///
/// ```rust
/// # use tg_markup::{render_markdown, Entity, EntityType, MarkdownVersion};
/// let entities = [Entity::new(EntityType::Italic, 0, 4)];
/// let markdown = render_markdown("1+1=2", &entities, MarkdownVersion::V2).unwrap();
/// assert_eq!(markdown, r"_1\+1\=_2");
/// ```
pub fn render_markdown(
    text: &str,
    entities: &[Entity],
    version: MarkdownVersion,
) -> Result<String, Error> {
    let mut transcoder = Transcoder::default();
    transcoder.markdown_version(version);
    transcoder.render_markdown(text, entities)
}

/// Sort entities by offset, longer spans first, dropping empty entities and
/// any entity that crosses the boundary of one enclosing it.
///
/// ```rust
/// # use tg_markup::{normalize, Entity, EntityType::*};
/// let entities = vec![
///     Entity::new(Italic, 2, 4),
///     Entity::new(Bold, 0, 4),
///     Entity::new(Code, 1, 2),
///     Entity::new(Underline, 3, 0),
/// ];
/// assert_eq!(
///     normalize(entities).unwrap(),
///     [Entity::new(Bold, 0, 4), Entity::new(Code, 1, 2)]
/// );
/// ```
pub fn normalize(entities: Vec<Entity>) -> Result<Vec<Entity>, Error> {
    Transcoder::default().normalize(entities)
}
