//! Command line interface for converting between markup and plain text with entities.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tg_markup::{
    format_entities, parse_entities, Entity, Error, FormattedText, MarkdownVersion, Transcoder,
    DEFAULT_MAX_DEPTH,
};

/// Convert Telegram-style Markdown and HTML to and from plain text with entities.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Deepest nesting of tags or entities to accept.
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Read and write entities as JSON instead of tab-separated lines.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Parse markup into plain text and entities.
    Parse {
        /// Syntax of the input.
        #[arg(long)]
        from: Syntax,
        /// Input file. Reads stdin when omitted.
        file: Option<PathBuf>,
    },
    /// Render plain text and entities as markup.
    Render {
        /// Syntax of the output.
        #[arg(long)]
        to: Syntax,
        /// File holding the entities.
        #[arg(long)]
        entities: PathBuf,
        /// Plain text file. Reads stdin when omitted.
        file: Option<PathBuf>,
    },
    /// Convert markup from one syntax to another.
    Convert {
        /// Syntax of the input.
        #[arg(long)]
        from: Syntax,
        /// Syntax of the output.
        #[arg(long)]
        to: Syntax,
        /// Input file. Reads stdin when omitted.
        file: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Syntax {
    /// MarkdownV2.
    Markdown,
    /// Legacy Markdown.
    MarkdownV1,
    /// Telegram HTML.
    Html,
}

impl Syntax {
    fn transcoder(self, max_depth: usize) -> Transcoder {
        let mut transcoder = Transcoder::default();
        transcoder.max_depth(max_depth);
        if let Self::MarkdownV1 = self {
            transcoder.markdown_version(MarkdownVersion::V1);
        }
        transcoder
    }

    fn parse(self, input: &str, max_depth: usize) -> Result<FormattedText, Error> {
        let transcoder = self.transcoder(max_depth);
        match self {
            Self::Markdown | Self::MarkdownV1 => transcoder.parse_markdown(input),
            Self::Html => transcoder.parse_html(input),
        }
    }

    fn render(self, text: &str, entities: &[Entity], max_depth: usize) -> Result<String, Error> {
        let transcoder = self.transcoder(max_depth);
        match self {
            Self::Markdown | Self::MarkdownV1 => transcoder.render_markdown(text, entities),
            Self::Html => transcoder.render_html(text, entities),
        }
    }
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();
    match cli.command {
        Command::Parse { from, file } => {
            let input = read_input(file.as_deref())?;
            let parsed = from.parse(&input, cli.max_depth)?;
            if cli.json {
                serde_json::to_writer_pretty(&mut stdout, &parsed)?;
                writeln!(stdout)?;
            } else {
                writeln!(stdout, "{}\n", parsed.text)?;
                write!(stdout, "{}", format_entities(&parsed.entities))?;
            }
        }
        Command::Render { to, entities, file } => {
            let text = read_input(file.as_deref())?;
            let entities_input = read_input(Some(&entities))?;
            let entities: Vec<Entity> = if cli.json {
                serde_json::from_str(&entities_input).context("invalid entity JSON")?
            } else {
                parse_entities(&entities_input).context("invalid entity lines")?
            };
            let rendered = to.render(&text, &entities, cli.max_depth)?;
            writeln!(stdout, "{rendered}")?;
        }
        Command::Convert { from, to, file } => {
            let input = read_input(file.as_deref())?;
            let parsed = from.parse(&input, cli.max_depth)?;
            tracing::debug!(entities = parsed.entities.len(), "parsed input");
            let rendered = to.render(&parsed.text, &parsed.entities, cli.max_depth)?;
            writeln!(stdout, "{rendered}")?;
        }
    }
    Ok(())
}
