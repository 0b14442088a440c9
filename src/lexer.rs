//! Command-line lexical analyzer
//!
//! This module converts raw command-line text into a flat list of tokens by
//! repeatedly locating the earliest registered literal in the remaining text.
//! When several literals start at the same offset the longest one wins, so
//! `--` is preferred over `-`.

use crate::registry::{CaseSensitivity, LexicalRegistry, LexicalRole};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Reverse;

/// Token categories produced by the tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Separator,
    KeyPrefix,
    ValuePrefix,
    Quoter,
    Text,
    /// Synthetic; only ever used as the state machine's initial previous kind
    StartOfInput,
    /// Synthetic; appended exactly once at the end of every token list
    EndOfInput,
}

impl TokenKind {
    /// Returns a string representation of the token kind for messages
    pub fn type_name(&self) -> &'static str {
        match self {
            TokenKind::Separator => "separator",
            TokenKind::KeyPrefix => "key prefix",
            TokenKind::ValuePrefix => "value encloser",
            TokenKind::Quoter => "quote",
            TokenKind::Text => "text",
            TokenKind::StartOfInput => "start of input",
            TokenKind::EndOfInput => "end of input",
        }
    }

    fn for_role(role: LexicalRole) -> Option<Self> {
        match role {
            LexicalRole::Prefix => Some(TokenKind::KeyPrefix),
            LexicalRole::Separator => Some(TokenKind::Separator),
            LexicalRole::Quote => Some(TokenKind::Quoter),
            LexicalRole::ValueEncloser => Some(TokenKind::ValuePrefix),
            LexicalRole::OptionKey | LexicalRole::HelpOptionKey => None,
        }
    }
}

/// A single lexical token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Text as it appears in the input, or reassembled text for quoted spans
    pub text: Cow<'a, str>,
    /// Byte offset of the token in the input
    pub offset: usize,
}

impl<'a> Token<'a> {
    /// Creates a token borrowing its text from the input
    pub fn new(kind: TokenKind, text: &'a str, offset: usize) -> Self {
        Self {
            kind,
            text: Cow::Borrowed(text),
            offset,
        }
    }

    /// Creates a text token that owns its content
    pub fn owned_text(text: String, offset: usize) -> Self {
        Self {
            kind: TokenKind::Text,
            text: Cow::Owned(text),
            offset,
        }
    }

    /// Creates the end-of-input sentinel
    pub fn end_of_input(offset: usize) -> Self {
        Self::new(TokenKind::EndOfInput, "", offset)
    }

    /// Returns true if the token has the given kind
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

/// Splits command-line text into tokens using a [`LexicalRegistry`]
///
/// Only prefixes, separators, quotes and value enclosers are matched inside
/// text. Option keys are never split out of surrounding text.
#[derive(Debug, Clone)]
pub struct Tokenizer<'r> {
    case_sensitivity: CaseSensitivity,
    /// Matchable literals, longest first
    literals: Vec<(&'r str, TokenKind)>,
}

impl<'r> Tokenizer<'r> {
    /// Creates a tokenizer over the literals of `registry`
    pub fn new(registry: &'r LexicalRegistry) -> Self {
        let mut literals: Vec<(&'r str, TokenKind)> = LexicalRole::MATCHABLE
            .into_iter()
            .filter_map(|role| TokenKind::for_role(role).map(|kind| (role, kind)))
            .flat_map(|(role, kind)| {
                registry
                    .lookup(role)
                    .iter()
                    .map(move |literal| (literal.as_str(), kind))
            })
            .collect();
        // Stable sort keeps registration order among equal lengths
        literals.sort_by_key(|(literal, _)| Reverse(literal.len()));

        Self {
            case_sensitivity: registry.case_sensitivity(),
            literals,
        }
    }

    /// Tokenizes `input` into a list terminated by [`TokenKind::EndOfInput`]
    pub fn tokenize<'a>(&self, input: &'a str) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        let mut cursor = 0;

        while cursor < input.len() {
            let rest = &input[cursor..];
            match self.find_literal(rest) {
                Some((start, length, kind)) => {
                    if start > 0 {
                        tokens.push(Token::new(TokenKind::Text, &rest[..start], cursor));
                    }
                    let at = cursor + start;
                    tokens.push(Token::new(kind, &input[at..at + length], at));
                    cursor = at + length;
                }
                None => {
                    tokens.push(Token::new(TokenKind::Text, rest, cursor));
                    cursor = input.len();
                }
            }
        }

        tokens.push(Token::end_of_input(input.len()));
        tracing::trace!(count = tokens.len(), "tokenized command line");
        tokens
    }

    /// Finds the leftmost literal in `rest`, preferring the longest at a tie.
    ///
    /// Returns the start offset, the matched length and the token kind.
    fn find_literal(&self, rest: &str) -> Option<(usize, usize, TokenKind)> {
        rest.char_indices().find_map(|(start, _)| {
            let candidate = &rest[start..];
            self.literals
                .iter()
                .find(|(literal, _)| self.case_sensitivity.starts_with(candidate, literal))
                .map(|(literal, kind)| (start, literal.len(), *kind))
        })
    }
}
