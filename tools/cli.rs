use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use cohl::languages::co::{self, CO_TAG, CoVersion};
use cohl::{
    DEFAULT_CLASS_PREFIX, HighlightOptions, HtmlRenderer, RawTheme, Registry, RenderOptions,
    TerminalRenderer, Theme,
};

#[derive(Parser)]
#[command(name = "cohl", version, about = "Highlights Co source code")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Highlights a file
    Highlight {
        file: PathBuf,
        /// Tag of the grammar to use
        #[arg(long, default_value = CO_TAG)]
        lang: String,
        #[arg(long, value_enum, default_value_t = Format::Ansi)]
        format: Format,
        /// Which Co syntax to highlight
        #[arg(long, value_enum, default_value_t = Version::Current)]
        version: Version,
        /// JSON grammar registered under `--lang`
        #[arg(long)]
        grammar: Option<PathBuf>,
        /// JSON theme for the terminal output
        #[arg(long)]
        theme: Option<PathBuf>,
        #[arg(long)]
        line_numbers: bool,
    },
    /// Prints the stylesheet of a theme for the HTML output
    Css {
        #[arg(long, default_value = DEFAULT_CLASS_PREFIX)]
        prefix: String,
        #[arg(long)]
        theme: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    Html,
    Ansi,
    /// The regions found, as JSON
    Tokens,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Version {
    Current,
    Slash,
    Hash,
}

impl From<Version> for CoVersion {
    fn from(version: Version) -> Self {
        match version {
            Version::Current => CoVersion::Current,
            Version::Slash => CoVersion::Slash,
            Version::Hash => CoVersion::Hash,
        }
    }
}

fn load_theme(path: Option<PathBuf>) -> Result<Theme, cohl::Error> {
    match path {
        Some(path) => RawTheme::load_from_file(path)?.compile(),
        None => Ok(Theme::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Highlight {
            file,
            lang,
            format,
            version,
            grammar,
            theme,
            line_numbers,
        } => {
            let mut registry = Registry::default();
            registry.register_language(CO_TAG, co::grammar(version.into()))?;
            if let Some(grammar) = grammar {
                registry.add_grammar_from_path(&lang, grammar)?;
            }

            let content = fs::read_to_string(&file)?;
            let highlighted = registry.highlight(&content, HighlightOptions::new(&lang))?;
            if highlighted.illegal {
                eprintln!(
                    "{} doesn't look like `{lang}`, showing it as plain text",
                    file.display()
                );
            }

            let render_options = RenderOptions {
                show_line_numbers: line_numbers,
                ..Default::default()
            };
            let rendered = match format {
                Format::Html => HtmlRenderer::default().render(&highlighted, &render_options),
                Format::Ansi => {
                    TerminalRenderer::new(load_theme(theme)?).render(&highlighted, &render_options)
                }
                Format::Tokens => serde_json::to_string_pretty(&highlighted.regions)?,
            };
            println!("{rendered}");
        }
        Command::Css { prefix, theme } => {
            let theme = load_theme(theme)?;
            print!("{}", cohl::COHL_CSS);
            print!("{}", theme.generate_css(&prefix));
        }
    }

    Ok(())
}
