use crate::entity::EntityType;

mod parser;
mod renderer;

pub(crate) use parser::parse;
pub(crate) use renderer::render;

/// Inline markers that toggle a span on and off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Marker {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
    Code,
}

impl Marker {
    const COUNT: usize = 6;

    fn spelling(self) -> &'static str {
        match self {
            Self::Bold => "*",
            Self::Italic => "_",
            Self::Underline => "__",
            Self::Strikethrough => "~",
            Self::Spoiler => "||",
            Self::Code => "`",
        }
    }

    fn entity_type(self) -> EntityType {
        match self {
            Self::Bold => EntityType::Bold,
            Self::Italic => EntityType::Italic,
            Self::Underline => EntityType::Underline,
            Self::Strikethrough => EntityType::Strikethrough,
            Self::Spoiler => EntityType::Spoiler,
            Self::Code => EntityType::Code,
        }
    }

    fn for_entity(kind: EntityType) -> Option<Self> {
        Some(match kind {
            EntityType::Bold => Self::Bold,
            EntityType::Italic => Self::Italic,
            EntityType::Underline => Self::Underline,
            EntityType::Strikethrough => Self::Strikethrough,
            EntityType::Spoiler => Self::Spoiler,
            EntityType::Code => Self::Code,
            _ => return None,
        })
    }

    /// Whether the legacy dialect knows this marker.
    fn in_v1(self) -> bool {
        matches!(self, Self::Bold | Self::Code)
    }
}

/// Characters that must be escaped with a backslash in MarkdownV2 text.
fn needs_escape(c: char) -> bool {
    matches!(
        c,
        '_' | '*'
            | '['
            | ']'
            | '('
            | ')'
            | '~'
            | '`'
            | '>'
            | '#'
            | '+'
            | '-'
            | '='
            | '|'
            | '{'
            | '}'
            | '.'
            | '!'
            | '\\'
    )
}
