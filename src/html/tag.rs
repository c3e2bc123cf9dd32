//! Tag and attribute scanning.

use crate::entity::EntityType;

use super::char_ref;

/// A tag found between `<` and `>`.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct Tag<'a> {
    /// Tag name as written. Compare case-insensitively.
    pub(super) name: &'a str,
    pub(super) is_close: bool,
    /// Everything after the name, up to but excluding `>`.
    attributes: &'a str,
}

impl<'a> Tag<'a> {
    /// Parse the inside of a tag, i.e. the text between `<` and `>`.
    pub(super) fn parse(inner: &'a str) -> Self {
        let (is_close, rest) = match inner.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, inner),
        };
        let name_end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '/')
            .unwrap_or(rest.len());
        Self {
            name: &rest[..name_end],
            is_close,
            attributes: &rest[name_end..],
        }
    }

    fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// The entity type this tag maps to, ignoring attributes.
    pub(super) fn entity_type(&self) -> Option<EntityType> {
        let kind = if self.is("b") || self.is("strong") {
            EntityType::Bold
        } else if self.is("i") || self.is("em") {
            EntityType::Italic
        } else if self.is("u") || self.is("ins") {
            EntityType::Underline
        } else if self.is("s") || self.is("del") || self.is("strike") {
            EntityType::Strikethrough
        } else if self.is("tg-spoiler") {
            EntityType::Spoiler
        } else if self.is("code") {
            EntityType::Code
        } else if self.is("pre") {
            EntityType::Pre
        } else if self.is("a") {
            EntityType::TextLink
        } else if self.is("tg-emoji") {
            EntityType::CustomEmoji
        } else if self.is("blockquote") {
            EntityType::Blockquote
        } else {
            return None;
        };
        Some(kind)
    }

    /// Look up an attribute by case-insensitive name and decode its value.
    ///
    /// Values may be double-quoted, single-quoted, or unquoted. An attribute
    /// written without a value yields an empty string.
    pub(super) fn attribute(&self, name: &str) -> Option<String> {
        Attributes {
            rest: self.attributes,
        }
        .find(|(attribute, _)| attribute.eq_ignore_ascii_case(name))
        .map(|(_, value)| char_ref::unescape(value))
    }

    /// The language named by a `class="language-xxx"` attribute.
    pub(super) fn language(&self) -> Option<String> {
        self.attribute("class")?
            .split_ascii_whitespace()
            .find_map(|class| class.strip_prefix("language-"))
            .filter(|language| !language.is_empty())
            .map(str::to_string)
    }
}

/// Iterator over raw `(name, value)` attribute pairs.
struct Attributes<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Attributes<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let is_separator = |c: char| c.is_ascii_whitespace() || c == '/';
        let rest = self.rest.trim_start_matches(is_separator);
        if rest.is_empty() {
            self.rest = rest;
            return None;
        }

        let name_end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        let after_name = rest[name_end..].trim_start_matches(|c: char| c.is_ascii_whitespace());

        let Some(after_equals) = after_name.strip_prefix('=') else {
            self.rest = after_name;
            return Some((name, ""));
        };
        let value_start = after_equals.trim_start_matches(|c: char| c.is_ascii_whitespace());

        let (value, rest) = match value_start.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let quoted = &value_start[1..];
                match quoted.find(quote) {
                    Some(end) => (&quoted[..end], &quoted[end + 1..]),
                    None => (quoted, ""),
                }
            }
            _ => {
                let end = value_start
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .unwrap_or(value_start.len());
                (&value_start[..end], &value_start[end..])
            }
        };
        self.rest = rest;
        Some((name, value))
    }
}
