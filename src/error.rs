//! Error types and position tracking for command-line parsing
//!
//! Setup problems (registering literals and options) are reported as
//! [`RegistrationError`] values. Problems found while parsing are never
//! raised; they are recorded as [`ParseIssue`] values on the allocation result
//! and can be rendered against the original input for user feedback.

use crate::lexer::TokenKind;
use crate::registry::{CaseSensitivity, LexicalRole};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Convenience alias for setup operations
pub type Result<T> = std::result::Result<T, RegistrationError>;

/// Represents a position in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, counted in characters)
    pub column: usize,
    /// Byte offset from start of input (0-based)
    pub offset: usize,
}

impl Position {
    /// Creates a new position at the start of input
    pub fn new() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// Advances the position by one character
    pub fn advance(&mut self, c: char) {
        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\r' => {
                self.column = 1;
            }
            _ => {
                self.column += 1;
            }
        }
        self.offset += c.len_utf8();
    }

    /// Computes the line/column of a byte offset within `source`.
    ///
    /// Offsets past the end of the input clamp to the end position.
    pub fn locate(source: &str, offset: usize) -> Self {
        let mut position = Self::new();
        for c in source.chars() {
            if position.offset >= offset {
                break;
            }
            position.advance(c);
        }
        position
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors raised while assembling the lexical registry or the option catalog
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A literal is already registered under some role
    #[error("Literal '{literal}' is already registered as {existing}")]
    DuplicateLiteral {
        literal: String,
        existing: LexicalRole,
    },

    /// Empty literals can never be matched
    #[error("Cannot register an empty literal as {role}")]
    EmptyLiteral { role: LexicalRole },

    /// A lexical role that parsing depends on has no literals
    #[error("No literal registered for required role {role}")]
    EmptyRole { role: LexicalRole },

    /// Two options share a context path
    #[error("Context path '{context_path}' is already registered")]
    DuplicateContextPath { context_path: String },

    /// A command-line key is already bound to an option
    #[error("Key '{key}' of '{context_path}' is already bound to '{existing}'")]
    DuplicateKey {
        key: String,
        context_path: String,
        existing: String,
    },

    /// An option must be reachable through at least one key
    #[error("Option '{context_path}' declares no command-line keys")]
    EmptyKeys { context_path: String },

    /// An explicit value range is inconsistent with the option style
    #[error("Invalid value range for '{context_path}': {message}")]
    InvalidValueRange {
        context_path: String,
        message: String,
    },

    /// Registry and catalog were built with different comparison modes
    #[error("Catalog compares keys {catalog:?} but the registry compares literals {registry:?}")]
    CaseSensitivityMismatch {
        registry: CaseSensitivity,
        catalog: CaseSensitivity,
    },
}

/// Problems recorded while parsing a command line
///
/// None of these stop the parser; they mark the allocation as failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ParseIssue {
    /// A syntactically valid key that no option declares
    #[error("Unknown option key '{key}'")]
    UnknownKey { key: String, offset: usize },

    /// Two adjacent tokens that the grammar does not allow
    #[error("Unexpected {} after {}", .current.type_name(), .previous.type_name())]
    MalformedSequence {
        previous: TokenKind,
        current: TokenKind,
        offset: usize,
    },

    /// An opening quote without a matching closing quote
    #[error("Unterminated quote {quote}")]
    UnterminatedQuote { quote: String, offset: usize },
}

impl ParseIssue {
    /// Byte offset in the input where the issue starts
    pub fn offset(&self) -> usize {
        match self {
            ParseIssue::UnknownKey { offset, .. }
            | ParseIssue::MalformedSequence { offset, .. }
            | ParseIssue::UnterminatedQuote { offset, .. } => *offset,
        }
    }

    /// Line/column of the issue within `source`
    pub fn position(&self, source: &str) -> Position {
        Position::locate(source, self.offset())
    }

    fn marker_width(&self) -> usize {
        match self {
            ParseIssue::UnknownKey { key, .. } => key.chars().count().max(1),
            ParseIssue::UnterminatedQuote { quote, .. } => quote.chars().count().max(1),
            ParseIssue::MalformedSequence { .. } => 1,
        }
    }

    /// Formats the issue on one line with its location
    pub fn format_compact(&self, source: &str) -> String {
        format!("{} at {}", self, self.position(source))
    }

    /// Formats the issue with the offending source line and a caret marker
    pub fn render(&self, source: &str) -> String {
        let position = self.position(source);
        let line = source.lines().nth(position.line - 1).unwrap_or("");
        let gutter = position.line.to_string();

        let mut output = self.format_compact(source);
        output.push('\n');
        output.push_str(&format!("{} | {}\n", gutter, line));
        output.push_str(&format!(
            "{} | {}{}\n",
            " ".repeat(gutter.len()),
            " ".repeat(position.column - 1),
            "^".repeat(self.marker_width())
        ));
        output
    }
}
