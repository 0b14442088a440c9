//! Command-line parser allocating tokens to options
//!
//! This module drives cleaned tokens through a fixed transition table keyed
//! by the kind of the previous token and the kind of the current one. Each
//! transition yields an [`Action`] that builds, commits or discards the
//! accumulator for the key being assembled. Committed values are written into
//! the [`OptionCatalog`]; everything that cannot be attributed to an option
//! ends up in the [`AllocationResult`].

use crate::catalog::{CommandOption, OptionCatalog, OptionSpec};
use crate::cleanup::{
    CleanupPipeline, CleanupStage, UnterminatedQuotePolicy, demote_embedded_prefixes,
};
use crate::error::{ParseIssue, RegistrationError, Result};
use crate::lexer::{Token, TokenKind, Tokenizer};
use crate::registry::{CaseSensitivity, LexicalConventions, LexicalRegistry, LexicalRole};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, trace};

/// Configuration options for the parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Comparison mode for literals and keys
    pub case_sensitivity: CaseSensitivity,
    /// Handling of quotes that are never closed
    pub unterminated_quote: UnterminatedQuotePolicy,
    /// Keep key prefixes glued to preceding text as part of that text
    pub embedded_prefixes_as_text: bool,
}

impl ParserConfig {
    /// Creates a new parser configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the comparison mode
    pub fn with_case_sensitivity(mut self, case_sensitivity: CaseSensitivity) -> Self {
        self.case_sensitivity = case_sensitivity;
        self
    }

    /// Sets the unterminated quote policy
    pub fn with_unterminated_quote(mut self, policy: UnterminatedQuotePolicy) -> Self {
        self.unterminated_quote = policy;
        self
    }

    /// Sets whether embedded key prefixes are read as text
    pub fn with_embedded_prefixes_as_text(mut self, enabled: bool) -> Self {
        self.embedded_prefixes_as_text = enabled;
        self
    }

    /// The cleanup passes implied by this configuration
    pub fn cleanup_pipeline(&self) -> CleanupPipeline {
        let mut pipeline = CleanupPipeline::standard(self.unterminated_quote);
        if self.embedded_prefixes_as_text {
            // After quote consolidation so quoted text is already one token
            pipeline.insert_stage(2, demote_embedded_prefixes);
        }
        pipeline
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            case_sensitivity: CaseSensitivity::Insensitive,
            unterminated_quote: UnterminatedQuotePolicy::Truncate,
            embedded_prefixes_as_text: false,
        }
    }
}

/// Token kinds the state machine accepts as input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Separator,
    KeyPrefix,
    ValuePrefix,
    Text,
}

impl Symbol {
    /// Maps a cleaned token kind to its grammar symbol.
    ///
    /// Sentinels have no symbol. A quote that survived a custom cleanup
    /// pipeline is read as plain text.
    pub fn from_kind(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Separator => Some(Symbol::Separator),
            TokenKind::KeyPrefix => Some(Symbol::KeyPrefix),
            TokenKind::ValuePrefix => Some(Symbol::ValuePrefix),
            TokenKind::Text | TokenKind::Quoter => Some(Symbol::Text),
            TokenKind::StartOfInput | TokenKind::EndOfInput => None,
        }
    }

    pub fn kind(self) -> TokenKind {
        match self {
            Symbol::Separator => TokenKind::Separator,
            Symbol::KeyPrefix => TokenKind::KeyPrefix,
            Symbol::ValuePrefix => TokenKind::ValuePrefix,
            Symbol::Text => TokenKind::Text,
        }
    }
}

/// The previous position of the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Previous {
    StartOfInput,
    Token(Symbol),
}

impl Previous {
    pub fn kind(self) -> TokenKind {
        match self {
            Previous::StartOfInput => TokenKind::StartOfInput,
            Previous::Token(symbol) => symbol.kind(),
        }
    }
}

/// What the state machine does with the current token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Start a new, empty accumulator
    Create,
    /// Skip the token
    ConsumeToken,
    /// Use the text as key, value or unkeyed value
    ProcessText,
    /// Allocate the current accumulator and start a new one
    Commit,
    /// Discard the current accumulator and record a malformed sequence
    TerminateWithPrejudice,
    /// Final commit after the last token
    End,
}

/// The grammar: action for each (previous, current) pair
pub fn transition(previous: Previous, current: Symbol) -> Action {
    use Action::*;
    use Previous::StartOfInput;
    use Symbol::{KeyPrefix, Separator, Text, ValuePrefix};

    match (previous, current) {
        (StartOfInput, KeyPrefix) => Create,
        (StartOfInput, Separator) => ConsumeToken,
        (StartOfInput, Text) => ProcessText,
        (StartOfInput, ValuePrefix) => TerminateWithPrejudice,

        (Previous::Token(KeyPrefix), Text) => ProcessText,
        (Previous::Token(KeyPrefix), KeyPrefix | ValuePrefix | Separator) => {
            TerminateWithPrejudice
        }

        (Previous::Token(ValuePrefix), Separator) => ConsumeToken,
        (Previous::Token(ValuePrefix), Text) => ProcessText,
        (Previous::Token(ValuePrefix), KeyPrefix | ValuePrefix) => TerminateWithPrejudice,

        (Previous::Token(Separator), KeyPrefix) => Commit,
        (Previous::Token(Separator), ValuePrefix | Separator) => ConsumeToken,
        (Previous::Token(Separator), Text) => ProcessText,

        (Previous::Token(Text), Separator) => ConsumeToken,
        (Previous::Token(Text), Text) => ProcessText,
        (Previous::Token(Text), KeyPrefix | ValuePrefix) => TerminateWithPrejudice,
    }
}

/// A key and the values collected for it while parsing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Accumulator {
    pub key: Option<String>,
    pub values: SmallVec<[String; 4]>,
    /// Byte offset of the key text, or of the prefix while no key is set
    pub offset: usize,
}

impl Accumulator {
    pub fn new(offset: usize) -> Self {
        Self {
            key: None,
            values: SmallVec::new(),
            offset,
        }
    }
}

/// Everything a parse could not attribute to a declared option
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AllocationResult {
    /// Keys that no option declares, with the values collected under them
    pub unknown_keys: Vec<Accumulator>,
    /// Free-standing text and values diverted from full options
    pub unkeyed_values: Vec<String>,
    /// Problems recorded during the parse, in input order per stage
    pub issues: Vec<ParseIssue>,
    /// Set when a registered help key appeared
    pub help_requested: bool,
}

impl AllocationResult {
    /// Returns true when no unknown key, malformed sequence or unterminated
    /// quote was found
    pub fn is_success(&self) -> bool {
        self.issues.is_empty()
    }

    /// The unresolved key names, in input order
    pub fn unknown_key_names(&self) -> Vec<&str> {
        self.unknown_keys
            .iter()
            .filter_map(|accumulator| accumulator.key.as_deref())
            .collect()
    }

    /// Renders every issue against the parsed input
    pub fn render_issues(&self, source: &str) -> Vec<String> {
        self.issues.iter().map(|issue| issue.render(source)).collect()
    }
}

/// Mutable state threaded through one parse
struct ParseState<'p> {
    catalog: &'p mut OptionCatalog,
    registry: &'p LexicalRegistry,
    current: Option<Accumulator>,
    result: AllocationResult,
}

impl<'p> ParseState<'p> {
    fn new(
        catalog: &'p mut OptionCatalog,
        registry: &'p LexicalRegistry,
        issues: Vec<ParseIssue>,
    ) -> Self {
        Self {
            catalog,
            registry,
            current: None,
            result: AllocationResult {
                issues,
                ..AllocationResult::default()
            },
        }
    }

    fn apply(&mut self, action: Action, previous: Previous, token: Token<'_>) {
        trace!(?previous, current = ?token.kind, ?action, text = %token.text, "transition");
        match action {
            Action::Create => self.create(token.offset),
            Action::ConsumeToken => {}
            Action::ProcessText => self.process_text(token),
            Action::Commit | Action::End => self.commit(token.kind, token.offset),
            Action::TerminateWithPrejudice => {
                self.terminate(previous.kind(), token.kind, token.offset)
            }
        }
    }

    fn create(&mut self, offset: usize) {
        self.current = Some(Accumulator::new(offset));
    }

    fn process_text(&mut self, token: Token<'_>) {
        let text = token.text.into_owned();
        match self.current.as_mut() {
            None => self.result.unkeyed_values.push(text),
            Some(accumulator) if accumulator.key.is_none() => {
                accumulator.key = Some(text);
                accumulator.offset = token.offset;
            }
            Some(accumulator) => accumulator.values.push(text),
        }
    }

    fn commit(&mut self, incoming: TokenKind, offset: usize) {
        let Some(accumulator) = self.current.take() else {
            if incoming == TokenKind::KeyPrefix {
                self.create(offset);
            }
            return;
        };

        match accumulator.key.as_deref() {
            None => {
                // A prefix that never received key text
                self.record(ParseIssue::MalformedSequence {
                    previous: TokenKind::KeyPrefix,
                    current: incoming,
                    offset: accumulator.offset,
                });
                self.result.unkeyed_values.extend(accumulator.values);
            }
            Some(key) => match self.catalog.resolve_mut(key) {
                Some(option) => {
                    let diverted = allocate(option, key, accumulator.values);
                    self.result.unkeyed_values.extend(diverted);
                }
                None if self.registry.is(LexicalRole::HelpOptionKey, key) => {
                    debug!(key, "help requested");
                    self.result.help_requested = true;
                    self.result.unkeyed_values.extend(accumulator.values);
                }
                None => {
                    debug!(key, values = ?accumulator.values, "unknown option key");
                    self.record(ParseIssue::UnknownKey {
                        key: key.to_string(),
                        offset: accumulator.offset,
                    });
                    self.result
                        .unkeyed_values
                        .extend(accumulator.values.iter().cloned());
                    self.result.unknown_keys.push(accumulator);
                }
            },
        }

        self.create(offset);
    }

    fn terminate(&mut self, previous: TokenKind, current: TokenKind, offset: usize) {
        self.current = None;
        self.record(ParseIssue::MalformedSequence {
            previous,
            current,
            offset,
        });
    }

    fn record(&mut self, issue: ParseIssue) {
        debug!(%issue, "parse issue");
        self.result.issues.push(issue);
    }

    fn finish(self) -> AllocationResult {
        self.result
    }
}

/// Moves values into `option` up to its capacity and returns the surplus.
///
/// A switch has no capacity, so every value after it is surplus.
fn allocate(
    option: &mut CommandOption,
    key: &str,
    values: SmallVec<[String; 4]>,
) -> Vec<String> {
    option.set_provided_key(key);

    let mut diverted = Vec::new();
    for value in values {
        if let Err(value) = option.append_value(value) {
            diverted.push(value);
        }
    }

    debug!(
        option = option.context_path(),
        key,
        allocated = option.values().len(),
        diverted = diverted.len(),
        "committed option"
    );
    diverted
}

/// Parses command lines against a lexical registry and an option catalog
///
/// Registration happens up front; every call to [`parse`](Self::parse)
/// clears previously allocated values before running.
#[derive(Debug, Clone)]
pub struct CommandLineParser {
    config: ParserConfig,
    registry: LexicalRegistry,
    catalog: OptionCatalog,
    pipeline: CleanupPipeline,
}

impl CommandLineParser {
    /// Creates a parser with an empty catalog
    pub fn new(conventions: &LexicalConventions, config: ParserConfig) -> Result<Self> {
        let registry = conventions.build_registry(config.case_sensitivity)?;
        Self::from_parts(registry, OptionCatalog::new(config.case_sensitivity), config)
    }

    /// Creates a parser from an assembled registry and catalog.
    ///
    /// The registry's comparison mode wins over the one in `config`, and the
    /// catalog must have been built with that same mode. Catalog keys missing
    /// from the registry are registered as option keys.
    pub fn from_parts(
        mut registry: LexicalRegistry,
        catalog: OptionCatalog,
        mut config: ParserConfig,
    ) -> Result<Self> {
        registry.validate_required_roles()?;
        if catalog.case_sensitivity() != registry.case_sensitivity() {
            return Err(RegistrationError::CaseSensitivityMismatch {
                registry: registry.case_sensitivity(),
                catalog: catalog.case_sensitivity(),
            });
        }
        config.case_sensitivity = registry.case_sensitivity();

        for key in catalog.iter().flat_map(|option| option.keys()) {
            if !registry.is(LexicalRole::OptionKey, key) {
                registry.register(LexicalRole::OptionKey, key.as_str())?;
            }
        }

        let pipeline = config.cleanup_pipeline();
        Ok(Self {
            config,
            registry,
            catalog,
            pipeline,
        })
    }

    /// Declares an option.
    ///
    /// Its keys must be unique across the catalog and must not clash with
    /// any other registered literal.
    pub fn register_option(&mut self, spec: OptionSpec) -> Result<&CommandOption> {
        self.catalog.validate(&spec)?;
        for key in &spec.keys {
            if let Some(existing) = self.registry.role_of(key) {
                return Err(RegistrationError::DuplicateLiteral {
                    literal: key.clone(),
                    existing,
                });
            }
        }
        for key in &spec.keys {
            self.registry.register(LexicalRole::OptionKey, key.as_str())?;
        }
        self.catalog.register(spec)
    }

    /// Appends a cleanup pass after the configured ones
    pub fn add_cleanup_stage(&mut self, stage: CleanupStage) {
        self.pipeline = std::mem::take(&mut self.pipeline).with_stage(stage);
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn registry(&self) -> &LexicalRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &OptionCatalog {
        &self.catalog
    }

    pub fn pipeline(&self) -> &CleanupPipeline {
        &self.pipeline
    }

    /// Looks up an option by context path
    pub fn option(&self, context_path: &str) -> Option<&CommandOption> {
        self.catalog.get(context_path)
    }

    /// Resets allocated values; registrations are kept
    pub fn clear_values(&mut self) {
        self.catalog.clear_values();
    }

    /// Tokenizes and cleans `input` without allocating anything
    pub fn tokens<'a>(&self, input: &'a str) -> Vec<Token<'a>> {
        let tokens = Tokenizer::new(&self.registry).tokenize(input);
        self.pipeline.run(tokens).tokens
    }

    /// Parses `input`, writing option values into the catalog.
    ///
    /// Never fails; problems are reported through the returned result.
    pub fn parse(&mut self, input: &str) -> AllocationResult {
        let tokens = Tokenizer::new(&self.registry).tokenize(input);
        self.allocate_tokens(tokens)
    }

    /// Parses already-split arguments, such as `std::env::args().skip(1)`.
    ///
    /// Arguments are never re-split. An argument that starts with a key
    /// prefix is read as a key, optionally followed by a value encloser and
    /// its value (`--port=8080`). Every other argument is one value as given,
    /// whatever literals it contains. Issue offsets index into the arguments
    /// joined by the first registered separator.
    pub fn parse_args<I, S>(&mut self, args: I) -> AllocationResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let tokens = self.argument_tokens(&args);
        self.allocate_tokens(tokens)
    }

    fn argument_tokens<'a, S: AsRef<str>>(&self, args: &'a [S]) -> Vec<Token<'a>> {
        let separator_len = self
            .registry
            .lookup(LexicalRole::Separator)
            .first()
            .map_or(1, String::len);
        let tokenizer = Tokenizer::new(&self.registry);

        let mut tokens = Vec::new();
        let mut offset = 0;
        for (index, arg) in args.iter().enumerate() {
            let arg = arg.as_ref();
            if index > 0 {
                tokens.push(Token::new(TokenKind::Separator, "", offset));
                offset += separator_len;
            }
            tokens.extend(split_argument(&tokenizer, arg, offset));
            offset += arg.len();
        }
        tokens.push(Token::end_of_input(offset));
        tokens
    }

    fn allocate_tokens(&mut self, tokens: Vec<Token<'_>>) -> AllocationResult {
        self.catalog.clear_values();

        let mut end_offset = tokens.last().map_or(0, |t| t.offset + t.text.len());
        let stream = self.pipeline.run(tokens);
        let mut state = ParseState::new(&mut self.catalog, &self.registry, stream.issues);

        let mut previous = Previous::StartOfInput;
        for token in stream.tokens {
            if token.is(TokenKind::EndOfInput) {
                end_offset = token.offset;
                break;
            }
            let Some(current) = Symbol::from_kind(token.kind) else {
                continue;
            };
            state.apply(transition(previous, current), previous, token);
            previous = Previous::Token(current);
        }
        state.apply(Action::End, previous, Token::end_of_input(end_offset));

        let result = state.finish();
        debug!(
            success = result.is_success(),
            unknown = result.unknown_keys.len(),
            unkeyed = result.unkeyed_values.len(),
            "parsed command line"
        );
        result
    }
}

/// Splits one argument into key prefix, key text, encloser and value, or
/// keeps it whole as a single text token.
///
/// Only the leading prefix and the first encloser after it are literals;
/// the key and the value are taken verbatim from the argument.
fn split_argument<'a>(tokenizer: &Tokenizer<'_>, arg: &'a str, base: usize) -> Vec<Token<'a>> {
    let pieces = tokenizer.tokenize(arg);
    let Some(prefix) = pieces.first().filter(|t| t.is(TokenKind::KeyPrefix)) else {
        return vec![Token::new(TokenKind::Text, arg, base)];
    };

    let key_start = prefix.text.len();
    let encloser = pieces.iter().find(|t| t.is(TokenKind::ValuePrefix));
    let key_end = encloser.map_or(arg.len(), |t| t.offset);

    let mut tokens = vec![Token::new(TokenKind::KeyPrefix, &arg[..key_start], base)];
    if key_end > key_start {
        tokens.push(Token::new(
            TokenKind::Text,
            &arg[key_start..key_end],
            base + key_start,
        ));
    }
    if let Some(encloser) = encloser {
        let value_start = encloser.offset + encloser.text.len();
        tokens.push(Token::new(
            TokenKind::ValuePrefix,
            &arg[encloser.offset..value_start],
            base + encloser.offset,
        ));
        if value_start < arg.len() {
            tokens.push(Token::new(
                TokenKind::Text,
                &arg[value_start..],
                base + value_start,
            ));
        }
    }
    tokens
}

/// Builder for creating a parser with its options
#[derive(Debug, Default)]
pub struct CommandLineParserBuilder {
    conventions: Option<LexicalConventions>,
    config: Option<ParserConfig>,
    options: Vec<OptionSpec>,
    stages: Vec<CleanupStage>,
}

impl CommandLineParserBuilder {
    /// Creates a new parser builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lexical conventions
    pub fn with_conventions(mut self, conventions: LexicalConventions) -> Self {
        self.conventions = Some(conventions);
        self
    }

    /// Sets the parser configuration
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Adds an option declaration
    pub fn with_option(mut self, spec: OptionSpec) -> Self {
        self.options.push(spec);
        self
    }

    /// Adds several option declarations
    pub fn with_options(mut self, specs: impl IntoIterator<Item = OptionSpec>) -> Self {
        self.options.extend(specs);
        self
    }

    /// Appends a cleanup pass after the configured ones
    pub fn with_cleanup_stage(mut self, stage: CleanupStage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Builds the parser, registering every option in declaration order
    pub fn build(self) -> Result<CommandLineParser> {
        let conventions = self.conventions.unwrap_or_default();
        let config = self.config.unwrap_or_default();

        let mut parser = CommandLineParser::new(&conventions, config)?;
        for spec in self.options {
            parser.register_option(spec)?;
        }
        for stage in self.stages {
            parser.add_cleanup_stage(stage);
        }
        Ok(parser)
    }
}
