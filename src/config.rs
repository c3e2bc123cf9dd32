use std::str::FromStr;

/// Default ceiling for tag and entity nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Which Markdown dialect to read or write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MarkdownVersion {
    /// Legacy subset: `*bold*`, `` `code` `` and `[text](url)`.
    V1,
    /// Full dialect with italic, underline, strikethrough, spoilers, pre blocks
    /// and backslash escapes.
    #[default]
    V2,
}

/// The given string does not name a [`MarkdownVersion`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown markdown version `{0}`")]
pub struct ParseMarkdownVersionError(String);

impl FromStr for MarkdownVersion {
    type Err = ParseMarkdownVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "v1" => Ok(Self::V1),
            "2" | "v2" => Ok(Self::V2),
            _ => Err(ParseMarkdownVersionError(s.to_string())),
        }
    }
}

/// Settings shared by the parsers, renderers and the normalizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Deepest nesting of open tags or entities before a call fails with
    /// [`Error::DepthExceeded`](crate::Error::DepthExceeded).
    pub max_depth: usize,
    /// Dialect used when parsing or rendering Markdown.
    pub markdown_version: MarkdownVersion,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            markdown_version: MarkdownVersion::default(),
        }
    }
}

impl Config {
    /// Legacy Telegram Markdown with the default nesting limit.
    pub fn markdown_v1() -> Self {
        Self {
            markdown_version: MarkdownVersion::V1,
            ..Self::default()
        }
    }

    /// Internal setter for config options. Used for testing
    #[cfg(test)]
    pub(crate) fn set(&mut self, field: &str, value: &str) {
        match field {
            "max_depth" => self.max_depth = value.parse::<usize>().unwrap(),
            "markdown_version" => self.markdown_version = value.parse().unwrap(),
            _ => panic!("unknown configuration {field}"),
        }
    }
}
