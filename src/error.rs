use std::fmt;
use std::io;

use crate::tokenizer::TokenizeError;

pub(crate) type CohlResult<T> = Result<T, Error>;

/// Errors that can occur during cohl usage
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred when reading a grammar, theme or site config file
    Io(io::Error),

    /// JSON parsing failed when loading a grammar, a theme or a site config.
    Json(serde_json::Error),

    /// An invalid hex color was encountered.
    /// Can only happen when loading a theme.
    #[allow(missing_docs)]
    InvalidHexColor { value: String, reason: String },

    /// A grammar was not found in the registry.
    /// Only happens when asking to highlight something with a tag we don't know
    GrammarNotFound(String),

    /// A mode referenced by name in `contains` is not defined in the grammar `modes` table.
    #[allow(missing_docs)]
    UnknownNamedMode { grammar: String, name: String },

    /// A pattern of a grammar does not compile.
    /// Grammars are checked when they are registered, never in the middle of highlighting.
    #[allow(missing_docs)]
    InvalidRegex { pattern: String, message: String },

    /// A grammar has more modes, patterns or keyword sets than ids can address.
    #[allow(missing_docs)]
    GrammarTooLarge { grammar: String, table: &'static str },

    /// The tokenizer gave up on the input.
    Tokenize(TokenizeError),

    /// A before/after build hook reported a failure.
    Hook(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Json(err) => write!(f, "JSON parsing error: {}", err),
            Error::InvalidHexColor { value, reason } => {
                write!(f, "invalid hex color '{}': {}", value, reason)
            }
            Error::GrammarNotFound(name) => write!(f, "grammar '{}' not found", name),
            Error::UnknownNamedMode { grammar, name } => {
                write!(f, "grammar '{}' references unknown mode '{}'", grammar, name)
            }
            Error::InvalidRegex { pattern, message } => {
                write!(f, "invalid regex '{}': {}", pattern, message)
            }
            Error::GrammarTooLarge { grammar, table } => {
                write!(f, "grammar '{}' has too many {}", grammar, table)
            }
            Error::Tokenize(err) => write!(f, "tokenization error: {}", err),
            Error::Hook(message) => write!(f, "build hook failed: {}", message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Tokenize(err) => Some(err),
            Error::InvalidHexColor { .. }
            | Error::GrammarNotFound(_)
            | Error::UnknownNamedMode { .. }
            | Error::InvalidRegex { .. }
            | Error::GrammarTooLarge { .. }
            | Error::Hook(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<TokenizeError> for Error {
    fn from(err: TokenizeError) -> Self {
        Error::Tokenize(err)
    }
}
