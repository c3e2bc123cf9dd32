use std::fmt::{self, Display, Write};
use std::ops::Range;
use std::str::FromStr;

use crate::error::ParseEntityError;
use crate::utf16;

/// The kind of a formatting or semantic span.
///
/// The Markdown and HTML parsers only ever produce the formatting kinds
/// (see [`EntityType::is_formatting`]); the remaining kinds are carried through
/// the model so entities from other sources can be rendered and normalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EntityType {
    /// Bold text.
    Bold,
    /// Italic text.
    Italic,
    /// Underlined text.
    Underline,
    /// Struck-through text.
    Strikethrough,
    /// Text hidden behind a spoiler.
    Spoiler,
    /// Inline monospace code.
    Code,
    /// A preformatted code block, optionally tagged with a language.
    Pre,
    /// Text linking to the URL in `extra`.
    TextLink,
    /// A custom emoji, identified by the id in `extra`.
    CustomEmoji,
    /// A quotation block.
    Blockquote,
    /// An `@username` mention.
    Mention,
    /// A `#hashtag`.
    Hashtag,
    /// A `$USD` cashtag.
    Cashtag,
    /// A `/command`.
    BotCommand,
    /// A bare URL.
    Url,
    /// An email address.
    Email,
    /// A phone number.
    PhoneNumber,
    /// A mention of the user whose id is in `extra`.
    TextMention,
}

impl EntityType {
    /// Every entity type, in declaration order.
    pub const ALL: [EntityType; 18] = [
        EntityType::Bold,
        EntityType::Italic,
        EntityType::Underline,
        EntityType::Strikethrough,
        EntityType::Spoiler,
        EntityType::Code,
        EntityType::Pre,
        EntityType::TextLink,
        EntityType::CustomEmoji,
        EntityType::Blockquote,
        EntityType::Mention,
        EntityType::Hashtag,
        EntityType::Cashtag,
        EntityType::BotCommand,
        EntityType::Url,
        EntityType::Email,
        EntityType::PhoneNumber,
        EntityType::TextMention,
    ];

    /// The snake_case name used in the textual entity form.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Strikethrough => "strikethrough",
            Self::Spoiler => "spoiler",
            Self::Code => "code",
            Self::Pre => "pre",
            Self::TextLink => "text_link",
            Self::CustomEmoji => "custom_emoji",
            Self::Blockquote => "blockquote",
            Self::Mention => "mention",
            Self::Hashtag => "hashtag",
            Self::Cashtag => "cashtag",
            Self::BotCommand => "bot_command",
            Self::Url => "url",
            Self::Email => "email",
            Self::PhoneNumber => "phone_number",
            Self::TextMention => "text_mention",
        }
    }

    /// Whether the Markdown and HTML parsers can produce this kind.
    pub fn is_formatting(self) -> bool {
        matches!(
            self,
            Self::Bold
                | Self::Italic
                | Self::Underline
                | Self::Strikethrough
                | Self::Spoiler
                | Self::Code
                | Self::Pre
                | Self::TextLink
                | Self::CustomEmoji
                | Self::Blockquote
        )
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityType {
    type Err = ParseEntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseEntityError::UnknownType(s.to_string()))
    }
}

/// A typed `[offset, offset + length)` span over some plain text.
///
/// Offsets and lengths are counted in UTF-16 code units, never bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity {
    /// What kind of span this is.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: EntityType,
    /// Start of the span in UTF-16 code units.
    pub offset: u32,
    /// Length of the span in UTF-16 code units.
    pub length: u32,
    /// URL for text links, language for pre blocks, document id for custom
    /// emoji, user id for text mentions. `None` for everything else.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub extra: Option<String>,
}

impl Entity {
    /// Create an entity without auxiliary data.
    pub fn new(kind: EntityType, offset: u32, length: u32) -> Self {
        Self {
            kind,
            offset,
            length,
            extra: None,
        }
    }

    /// Create an entity carrying auxiliary data.
    pub fn with_extra(kind: EntityType, offset: u32, length: u32, extra: impl Into<String>) -> Self {
        Self {
            kind,
            offset,
            length,
            extra: Some(extra.into()),
        }
    }

    /// End of the span, or `None` if `offset + length` overflows.
    pub fn end(&self) -> Option<u32> {
        self.offset.checked_add(self.length)
    }

    /// The span as a range of UTF-16 code units, saturating on overflow.
    pub fn range(&self) -> Range<u32> {
        self.offset..self.offset.saturating_add(self.length)
    }
}

/// Writes the `TYPE\tOFFSET\tLENGTH\tEXTRA` line, without a trailing newline.
impl Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.kind,
            self.offset,
            self.length,
            self.extra.as_deref().unwrap_or_default()
        )
    }
}

impl FromStr for Entity {
    type Err = ParseEntityError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.splitn(4, '\t');
        let (Some(kind), Some(offset), Some(length)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(ParseEntityError::MalformedLine(line.to_string()));
        };
        let extra = fields
            .next()
            .map(|extra| extra.trim_end_matches(['\r', '\n']))
            .filter(|extra| !extra.is_empty())
            .map(str::to_string);
        Ok(Self {
            kind: kind.trim().parse()?,
            offset: offset.trim().parse()?,
            length: length.trim().parse()?,
            extra,
        })
    }
}

/// Format a list of entities in the textual form, one per line.
pub fn format_entities(entities: &[Entity]) -> String {
    let mut output = String::with_capacity(entities.len() * 16);
    for entity in entities {
        // Writing into a `String` cannot fail.
        let _ = writeln!(output, "{entity}");
    }
    output
}

/// Parse a list of entities written by [`format_entities`]. Blank lines are skipped.
pub fn parse_entities(input: &str) -> Result<Vec<Entity>, ParseEntityError> {
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// Plain text together with the entities describing its formatting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormattedText {
    /// The plain text, with all markup removed.
    pub text: String,
    /// Entities over [`FormattedText::text`], in UTF-16 code units.
    pub entities: Vec<Entity>,
}

impl FormattedText {
    /// Bundle plain text and its entities.
    pub fn new(text: impl Into<String>, entities: Vec<Entity>) -> Self {
        Self {
            text: text.into(),
            entities,
        }
    }

    /// The slice of text covered by `entity`, if its span lies on char boundaries.
    pub fn entity_text(&self, entity: &Entity) -> Option<&str> {
        let start = utf16::byte_offset(&self.text, entity.offset)?;
        let end = utf16::byte_offset(&self.text, entity.end()?)?;
        self.text.get(start..end)
    }
}
