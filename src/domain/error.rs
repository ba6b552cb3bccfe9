//! Domain error types.

use std::fmt;

/// Location of a token or diagnostic in the source text.
///
/// `offset` is a byte offset; `line` and `column` are 1-based, with the
/// column counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unrecognized character or unterminated string literal.
    Lexical,
    /// Token sequence does not match the grammar.
    Syntax,
    /// Unsupported indicator, out-of-whitelist parameter or missing config.
    Semantic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Lexical => write!(f, "lexical error"),
            ErrorKind::Syntax => write!(f, "syntax error"),
            ErrorKind::Semantic => write!(f, "semantic gap"),
        }
    }
}

/// A single compile diagnostic with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} at {span}: {message}")]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
}

impl CompileError {
    pub fn lexical(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ErrorKind::Lexical,
            message: message.into(),
            span,
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ErrorKind::Syntax,
            message: message.into(),
            span,
        }
    }

    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ErrorKind::Semantic,
            message: message.into(),
            span,
        }
    }

    /// Format the error with the offending source line and a caret under the
    /// error column.
    pub fn display_with_context(&self, source: &str) -> String {
        let line = source
            .lines()
            .nth(self.span.line.saturating_sub(1))
            .unwrap_or("");
        let caret = " ".repeat(self.span.column.saturating_sub(1)) + "^";
        format!("{line}\n{caret}\n{err}", err = self)
    }
}

/// Non-empty list of diagnostics returned by a failed compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileErrors(pub Vec<CompileError>);

impl CompileErrors {
    pub fn single(err: CompileError) -> Self {
        Self(vec![err])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompileError> {
        self.0.iter()
    }

    pub fn display_with_context(&self, source: &str) -> String {
        self.0
            .iter()
            .map(|e| e.display_with_context(source))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [only] => write!(f, "{only}"),
            errors => {
                write!(f, "{} compile errors", errors.len())?;
                for e in errors {
                    write!(f, "\n  {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CompileErrors {}

impl From<CompileError> for CompileErrors {
    fn from(err: CompileError) -> Self {
        Self::single(err)
    }
}

impl IntoIterator for CompileErrors {
    type Item = CompileError;
    type IntoIter = std::vec::IntoIter<CompileError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Top-level error type for stockdsl.
#[derive(Debug, thiserror::Error)]
pub enum StockDslError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Compile(#[from] CompileErrors),

    #[error("no data for {symbol}: {reason}")]
    Data { symbol: String, reason: String },

    #[error("simulation failed: {reason}")]
    Simulation { reason: String },

    #[error("could not read runtime output: {reason}")]
    OutputParse { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StockDslError {
    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            StockDslError::Io(_) => 1,
            StockDslError::ConfigParse { .. }
            | StockDslError::ConfigMissing { .. }
            | StockDslError::ConfigInvalid { .. } => 2,
            StockDslError::Compile(_) => 4,
            StockDslError::Data { .. } | StockDslError::Simulation { .. } => 5,
            StockDslError::OutputParse { .. } => 6,
        }
    }
}

impl From<&StockDslError> for std::process::ExitCode {
    fn from(err: &StockDslError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
