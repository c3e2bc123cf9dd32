use super::*;

/// Converts between markup and plain text with entities.
///
/// Holds a [`Config`]; every conversion reads its limits and Markdown dialect
/// from it. The free functions at the crate root use [`Transcoder::default`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Transcoder {
    pub(crate) config: Config,
}

impl Transcoder {
    /// Create a [`Transcoder`] with custom [`Config`].
    ///
    /// ```rust
    /// # use tg_markup::{Config, MarkdownVersion, Transcoder};
    /// let transcoder = Transcoder::with_config(Config {
    ///     max_depth: 8,
    ///     ..Default::default()
    /// });
    /// assert_eq!(transcoder.config().markdown_version, MarkdownVersion::V2);
    /// ```
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Configure the deepest nesting of tags or entities a call accepts.
    pub fn max_depth(&mut self, max_depth: usize) -> &mut Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Configure the Markdown dialect used by [`Self::parse_markdown`] and
    /// [`Self::render_markdown`].
    pub fn markdown_version(&mut self, version: MarkdownVersion) -> &mut Self {
        self.config.markdown_version = version;
        self
    }

    /// Parse Markdown into plain text and normalized entities.
    ///
    /// ```rust
    /// # use tg_markup::{Entity, EntityType, Transcoder};
    /// let parsed = Transcoder::default().parse_markdown("Hello *world*")?;
    /// assert_eq!(parsed.text, "Hello world");
    /// assert_eq!(parsed.entities, [Entity::new(EntityType::Bold, 6, 5)]);
    /// # Ok::<(), tg_markup::Error>(())
    /// ```
    pub fn parse_markdown(&self, input: &str) -> Result<FormattedText, Error> {
        tracing::trace!(config = ?self.config, "parse_markdown");
        markdown::parse(input, self.config.markdown_version, self.config.max_depth)
    }

    /// Parse HTML into plain text and normalized entities.
    ///
    /// ```rust
    /// # use tg_markup::{Entity, EntityType, Transcoder};
    /// let parsed = Transcoder::default().parse_html("Hello <b>world</b>")?;
    /// assert_eq!(parsed.text, "Hello world");
    /// assert_eq!(parsed.entities, [Entity::new(EntityType::Bold, 6, 5)]);
    /// # Ok::<(), tg_markup::Error>(())
    /// ```
    pub fn parse_html(&self, input: &str) -> Result<FormattedText, Error> {
        tracing::trace!(config = ?self.config, "parse_html");
        html::parse(input, self.config.max_depth)
    }

    /// Render plain text and entities as HTML.
    ///
    /// Entities may arrive in any order. They are normalized against `text`
    /// first, so entities that cross others or run past the end of the text
    /// are left out and the output is always well nested.
    ///
    /// ```rust
    /// # use tg_markup::{Entity, EntityType, Transcoder};
    /// let entities = [Entity::new(EntityType::Italic, 6, 5), Entity::new(EntityType::Bold, 0, 11)];
    /// let html = Transcoder::default().render_html("Hello world", &entities)?;
    /// assert_eq!(html, "<b>Hello <i>world</i></b>");
    /// # Ok::<(), tg_markup::Error>(())
    /// ```
    pub fn render_html(&self, text: &str, entities: &[Entity]) -> Result<String, Error> {
        let entities = self.normalize_for_text(text, entities.to_vec())?;
        html::render(text, &entities)
    }

    /// Render plain text and entities as Markdown.
    ///
    /// Entities are normalized against `text` first, like [`Self::render_html`].
    ///
    /// ```rust
    /// # use tg_markup::{Entity, EntityType, Transcoder};
    /// let entities = [Entity::new(EntityType::Bold, 0, 5)];
    /// let markdown = Transcoder::default().render_markdown("Hello!", &entities)?;
    /// assert_eq!(markdown, r"*Hello*\!");
    /// # Ok::<(), tg_markup::Error>(())
    /// ```
    pub fn render_markdown(&self, text: &str, entities: &[Entity]) -> Result<String, Error> {
        let entities = self.normalize_for_text(text, entities.to_vec())?;
        markdown::render(text, &entities, self.config.markdown_version)
    }

    /// Sort entities and drop empty and crossing ones.
    ///
    /// See [`normalize()`](crate::normalize()) for the exact rules.
    pub fn normalize(&self, entities: Vec<Entity>) -> Result<Vec<Entity>, Error> {
        normalize::normalize(entities, self.config.max_depth)
    }

    /// [`Self::normalize`], also dropping entities that run past the end of `text`.
    pub fn normalize_for_text(
        &self,
        text: &str,
        entities: Vec<Entity>,
    ) -> Result<Vec<Entity>, Error> {
        normalize::normalize_for_text(text, entities, self.config.max_depth)
    }
}

impl std::fmt::Debug for Transcoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcoder")
            .field("config", &self.config)
            .finish()
    }
}
