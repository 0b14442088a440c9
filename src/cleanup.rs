//! Token cleanup passes run between tokenizing and parsing
//!
//! Each pass is a plain function from one [`TokenStream`] to the next, so a
//! [`CleanupPipeline`] is nothing more than an ordered list of function
//! pointers folded over the tokenizer output. Issues found by a pass travel
//! with the stream.

use crate::error::ParseIssue;
use crate::lexer::{Token, TokenKind};
use serde::{Deserialize, Serialize};

/// What to do with an opening quote that is never closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnterminatedQuotePolicy {
    /// Discard the quote and everything after it
    #[default]
    Truncate,
    /// Keep the quote character as literal text and continue after it
    Literal,
}

/// Tokens plus the issues recorded while cleaning them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStream<'a> {
    pub tokens: Vec<Token<'a>>,
    pub issues: Vec<ParseIssue>,
}

impl<'a> TokenStream<'a> {
    pub fn new(tokens: Vec<Token<'a>>) -> Self {
        Self {
            tokens,
            issues: Vec::new(),
        }
    }
}

/// A single cleanup pass
pub type CleanupStage = for<'a> fn(TokenStream<'a>) -> TokenStream<'a>;

/// Ordered list of cleanup passes
#[derive(Debug, Clone, Default)]
pub struct CleanupPipeline {
    stages: Vec<CleanupStage>,
}

impl CleanupPipeline {
    /// Creates a pipeline with no passes
    pub fn new() -> Self {
        Self::default()
    }

    /// The default passes in their fixed order
    pub fn standard(policy: UnterminatedQuotePolicy) -> Self {
        let consolidate: CleanupStage = match policy {
            UnterminatedQuotePolicy::Truncate => consolidate_quoted_text,
            UnterminatedQuotePolicy::Literal => consolidate_quoted_text_keeping_open_quotes,
        };
        Self::new()
            .with_stage(merge_sequential_separators)
            .with_stage(consolidate)
            .with_stage(detach_value_enclosers)
    }

    /// Appends a pass
    pub fn with_stage(mut self, stage: CleanupStage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Inserts a pass at `index`, shifting later passes back
    pub fn insert_stage(&mut self, index: usize, stage: CleanupStage) {
        self.stages.insert(index, stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs every pass in order over `tokens`
    pub fn run<'a>(&self, tokens: Vec<Token<'a>>) -> TokenStream<'a> {
        self.stages
            .iter()
            .fold(TokenStream::new(tokens), |stream, stage| stage(stream))
    }
}

/// Drops every separator that directly follows another separator
pub fn merge_sequential_separators(mut stream: TokenStream<'_>) -> TokenStream<'_> {
    let mut previous_was_separator = false;
    stream.tokens.retain(|token| {
        let is_separator = token.is(TokenKind::Separator);
        let keep = !(is_separator && previous_was_separator);
        previous_was_separator = is_separator;
        keep
    });
    stream
}

/// Replaces each quoted span with a single text token.
///
/// An unterminated quote truncates the stream at the opening quote.
pub fn consolidate_quoted_text(stream: TokenStream<'_>) -> TokenStream<'_> {
    consolidate(stream, UnterminatedQuotePolicy::Truncate)
}

/// Like [`consolidate_quoted_text`], but an unterminated quote is kept as
/// literal text and scanning resumes right after it.
pub fn consolidate_quoted_text_keeping_open_quotes(stream: TokenStream<'_>) -> TokenStream<'_> {
    consolidate(stream, UnterminatedQuotePolicy::Literal)
}

fn consolidate(mut stream: TokenStream<'_>, policy: UnterminatedQuotePolicy) -> TokenStream<'_> {
    let tokens = &mut stream.tokens;
    let mut index = 0;

    while index < tokens.len() {
        if !tokens[index].is(TokenKind::Quoter) {
            index += 1;
            continue;
        }

        let opening = &tokens[index];
        let closing = tokens[index + 1..]
            .iter()
            .position(|t| t.is(TokenKind::Quoter) && t.text == opening.text)
            .map(|relative| index + 1 + relative);

        match closing {
            Some(close) => {
                let text: String = tokens[index + 1..close]
                    .iter()
                    .map(|t| t.text.as_ref())
                    .collect();
                let replacement = Token::owned_text(text, opening.offset);
                tokens.splice(index..=close, [replacement]);
                index += 1;
            }
            None => {
                let quote = opening.text.to_string();
                let offset = opening.offset;
                tracing::debug!(%quote, offset, ?policy, "unterminated quote");
                stream.issues.push(ParseIssue::UnterminatedQuote { quote, offset });

                match policy {
                    UnterminatedQuotePolicy::Truncate => {
                        let end = tokens
                            .pop()
                            .filter(|t| t.is(TokenKind::EndOfInput))
                            .unwrap_or_else(|| Token::end_of_input(offset));
                        tokens.truncate(index);
                        tokens.push(end);
                        break;
                    }
                    UnterminatedQuotePolicy::Literal => {
                        tokens[index].kind = TokenKind::Text;
                        index += 1;
                    }
                }
            }
        }
    }

    stream
}

/// Splits a value encloser from the key it is glued to.
///
/// `-x=value` tokenizes as prefix, text, encloser, text; a synthetic
/// separator is inserted before the encloser so the key and its value reach
/// the parser as `-x =value`. Enclosers after free text are left alone.
pub fn detach_value_enclosers(mut stream: TokenStream<'_>) -> TokenStream<'_> {
    let mut output = Vec::with_capacity(stream.tokens.len());

    for token in stream.tokens {
        if token.is(TokenKind::ValuePrefix) && follows_key(&output) {
            output.push(Token::new(TokenKind::Separator, "", token.offset));
        }
        output.push(token);
    }

    stream.tokens = output;
    stream
}

fn follows_key(output: &[Token<'_>]) -> bool {
    matches!(
        output,
        [.., prefix, key] if prefix.is(TokenKind::KeyPrefix) && key.is(TokenKind::Text)
    )
}

/// Folds key prefixes glued to preceding text back into that text.
///
/// With this pass `my-file.txt` stays one value instead of being read as the
/// text `my` followed by the key `file.txt`.
pub fn demote_embedded_prefixes(mut stream: TokenStream<'_>) -> TokenStream<'_> {
    let mut output: Vec<Token<'_>> = Vec::with_capacity(stream.tokens.len());
    let mut gluing = false;

    for token in stream.tokens {
        let glue = match output.last() {
            Some(last) if last.is(TokenKind::Text) => {
                token.is(TokenKind::KeyPrefix) || (gluing && token.is(TokenKind::Text))
            }
            _ => false,
        };

        match output.last_mut() {
            Some(last) if glue => {
                last.text.to_mut().push_str(&token.text);
                gluing = true;
            }
            _ => {
                gluing = false;
                output.push(token);
            }
        }
    }

    stream.tokens = output;
    stream
}
