//! # Command-line Rust Parser
//!
//! A command-line lexer and key/value allocator driven by configurable lexical
//! conventions and per-option cardinality rules.
//!
//! ## Overview
//!
//! A raw command line is split into tokens using a registry of literals
//! (key prefixes, separators, quotes and value enclosers), cleaned up by a
//! small pipeline of token passes, and then driven through a fixed grammar
//! that assigns every piece of text to an option key, an unknown key, or the
//! list of unkeyed values. The parser never aborts on bad input: unknown
//! keys, malformed sequences and unterminated quotes are recorded and parsing
//! carries on.
//!
//! ## Key Features
//!
//! - **Leftmost-longest tokenization**: `--` wins over `-` at the same offset
//! - **Quoted spans**: several quote characters at once, each closing only itself
//! - **Option styles**: switches, single values, collections and concatenated values
//! - **Graceful recovery**: surplus values are diverted, never dropped
//! - **Pluggable cleanup**: token passes are plain functions
//!
//! ## Basic Usage
//!
//! ```rust
//! use cmdline_parser::{CommandLineParserBuilder, OptionSpec, OptionStyle};
//!
//! let mut parser = CommandLineParserBuilder::new()
//!     .with_option(OptionSpec::new("server:port", OptionStyle::SingleValued).with_keys(["p", "port"]))
//!     .with_option(OptionSpec::new("server:verbose", OptionStyle::Switch).with_key("v"))
//!     .with_option(OptionSpec::new("server:hosts", OptionStyle::Collection).with_key("host"))
//!     .build()?;
//!
//! let result = parser.parse("--port=8080 -v --host a.example b.example extra");
//! assert!(result.is_success());
//!
//! let port = parser.option("server:port").unwrap();
//! assert_eq!(port.values(), ["8080"]);
//! assert_eq!(port.provided_key(), Some("port"));
//! assert!(parser.option("server:verbose").unwrap().values_satisfied());
//! assert_eq!(
//!     parser.option("server:hosts").unwrap().values(),
//!     ["a.example", "b.example", "extra"]
//! );
//! # Ok::<(), cmdline_parser::RegistrationError>(())
//! ```
//!
//! ## Error Handling
//!
//! Registration returns [`RegistrationError`]; parsing records
//! [`ParseIssue`] values that can be rendered against the input:
//!
//! ```rust
//! use cmdline_parser::{CommandLineParserBuilder, ParseIssue};
//!
//! let mut parser = CommandLineParserBuilder::new().build()?;
//! let input = "-z 1";
//! let result = parser.parse(input);
//!
//! assert!(!result.is_success());
//! assert!(matches!(result.issues[0], ParseIssue::UnknownKey { .. }));
//! assert_eq!(result.unknown_key_names(), ["z"]);
//! println!("{}", result.issues[0].render(input));
//! # Ok::<(), cmdline_parser::RegistrationError>(())
//! ```
//!
//! ## Conventions From Configuration
//!
//! [`LexicalConventions`] and [`ParserConfig`] are serde types, so they can
//! be loaded from any format serde supports. Missing fields keep their
//! defaults: prefixes `-`, `--` and `/`, whitespace separators, `"` and `'`
//! quotes, `=` and `:` value enclosers, and `?`/`help` as help keys.

pub mod catalog;
pub mod cleanup;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod registry;

#[cfg(test)]
mod error_tests;

// Re-export main types
pub use catalog::{CommandOption, OptionCatalog, OptionSpec, OptionStyle, ValueRange};
pub use cleanup::{CleanupPipeline, CleanupStage, TokenStream, UnterminatedQuotePolicy};
pub use error::{ParseIssue, Position, RegistrationError, Result};
pub use lexer::{Token, TokenKind, Tokenizer};
pub use parser::{
    Accumulator, Action, AllocationResult, CommandLineParser, CommandLineParserBuilder,
    ParserConfig, Previous, Symbol, transition,
};
pub use registry::{CaseSensitivity, LexicalConventions, LexicalRegistry, LexicalRole};

// Re-export the cleanup passes
pub use cleanup::{
    consolidate_quoted_text, consolidate_quoted_text_keeping_open_quotes, demote_embedded_prefixes,
    detach_value_enclosers, merge_sequential_separators,
};
