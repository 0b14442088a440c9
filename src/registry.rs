//! Lexical registry of recognized command-line literals
//!
//! Every literal the tokenizer or the allocator needs to recognize (key
//! prefixes, separators, quote characters, value enclosers, option keys and
//! help keys) is registered here under exactly one [`LexicalRole`]. The
//! comparison mode is chosen when the registry is created and never changes.

use crate::error::{RegistrationError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// How literals and keys are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaseSensitivity {
    /// Literals match byte for byte
    Sensitive,
    /// Literals match after lowercasing both sides
    #[default]
    Insensitive,
}

impl CaseSensitivity {
    /// Normalizes text for comparison under this mode
    pub fn fold<'s>(self, text: &'s str) -> Cow<'s, str> {
        match self {
            CaseSensitivity::Sensitive => Cow::Borrowed(text),
            CaseSensitivity::Insensitive if text.chars().any(char::is_uppercase) => {
                Cow::Owned(text.to_lowercase())
            }
            CaseSensitivity::Insensitive => Cow::Borrowed(text),
        }
    }

    /// Compares two strings under this mode
    pub fn matches(self, a: &str, b: &str) -> bool {
        match self {
            CaseSensitivity::Sensitive => a == b,
            CaseSensitivity::Insensitive => self.fold(a) == self.fold(b),
        }
    }

    /// Returns true if `text` starts with `literal` under this mode
    pub fn starts_with(self, text: &str, literal: &str) -> bool {
        match text.get(..literal.len()) {
            Some(head) => self.matches(head, literal),
            None => false,
        }
    }
}

/// The role a literal plays on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LexicalRole {
    /// Introduces a key, e.g. `-`, `--` or `/`
    Prefix,
    /// Separates entries, usually whitespace
    Separator,
    /// Opens and closes a quoted span
    Quote,
    /// Binds a value directly to a key, e.g. `=` in `-x=value`
    ValueEncloser,
    /// A key declared by an option in the catalog
    OptionKey,
    /// A key that requests help instead of naming an option
    HelpOptionKey,
}

impl LexicalRole {
    /// Roles the tokenizer matches inside raw text
    pub const MATCHABLE: [LexicalRole; 4] = [
        LexicalRole::Prefix,
        LexicalRole::Separator,
        LexicalRole::Quote,
        LexicalRole::ValueEncloser,
    ];

    const ALL: [LexicalRole; 6] = [
        LexicalRole::Prefix,
        LexicalRole::Separator,
        LexicalRole::Quote,
        LexicalRole::ValueEncloser,
        LexicalRole::OptionKey,
        LexicalRole::HelpOptionKey,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for LexicalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LexicalRole::Prefix => "key prefix",
            LexicalRole::Separator => "separator",
            LexicalRole::Quote => "quote",
            LexicalRole::ValueEncloser => "value encloser",
            LexicalRole::OptionKey => "option key",
            LexicalRole::HelpOptionKey => "help option key",
        };
        f.write_str(name)
    }
}

/// Registered literals grouped by role
#[derive(Debug, Clone)]
pub struct LexicalRegistry {
    case_sensitivity: CaseSensitivity,
    literals: [Vec<String>; 6],
}

impl LexicalRegistry {
    /// Creates an empty registry with a fixed comparison mode
    pub fn new(case_sensitivity: CaseSensitivity) -> Self {
        Self {
            case_sensitivity,
            literals: Default::default(),
        }
    }

    /// The comparison mode used for every lookup
    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case_sensitivity
    }

    /// Registers `literal` under `role`.
    ///
    /// A literal can only occupy one role; registering it again under any
    /// role, including the same one, fails.
    pub fn register(&mut self, role: LexicalRole, literal: impl Into<String>) -> Result<()> {
        let literal = literal.into();
        if literal.is_empty() {
            return Err(RegistrationError::EmptyLiteral { role });
        }
        if let Some(existing) = self.role_of(&literal) {
            return Err(RegistrationError::DuplicateLiteral { literal, existing });
        }
        self.literals[role.index()].push(literal);
        Ok(())
    }

    /// Literals registered under `role`, in registration order
    pub fn lookup(&self, role: LexicalRole) -> &[String] {
        &self.literals[role.index()]
    }

    /// Returns true if `literal` is registered under any role
    pub fn contains(&self, literal: &str) -> bool {
        self.role_of(literal).is_some()
    }

    /// The role `literal` is registered under, if any
    pub fn role_of(&self, literal: &str) -> Option<LexicalRole> {
        LexicalRole::ALL.into_iter().find(|role| {
            self.lookup(*role)
                .iter()
                .any(|known| self.case_sensitivity.matches(known, literal))
        })
    }

    /// Returns true if `literal` is registered under `role`
    pub fn is(&self, role: LexicalRole, literal: &str) -> bool {
        self.lookup(role)
            .iter()
            .any(|known| self.case_sensitivity.matches(known, literal))
    }

    /// Fails if a role the parser cannot work without has no literals
    pub fn validate_required_roles(&self) -> Result<()> {
        for role in [LexicalRole::Prefix, LexicalRole::Separator] {
            if self.lookup(role).is_empty() {
                return Err(RegistrationError::EmptyRole { role });
            }
        }
        Ok(())
    }
}

/// Literal sets used to build a [`LexicalRegistry`]
///
/// Deserializable so applications can load their conventions from a
/// configuration file; missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalConventions {
    pub prefixes: Vec<String>,
    pub separators: Vec<String>,
    pub quotes: Vec<String>,
    pub value_enclosers: Vec<String>,
    pub help_keys: Vec<String>,
}

impl LexicalConventions {
    /// Creates conventions with the default literal sets
    pub fn new() -> Self {
        Self::default()
    }

    /// Conventions with nothing registered
    pub fn empty() -> Self {
        Self {
            prefixes: Vec::new(),
            separators: Vec::new(),
            quotes: Vec::new(),
            value_enclosers: Vec::new(),
            help_keys: Vec::new(),
        }
    }

    /// Replaces the key prefixes
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the separators
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the quote characters
    pub fn with_quotes<I, S>(mut self, quotes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quotes = quotes.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the value enclosers
    pub fn with_value_enclosers<I, S>(mut self, enclosers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_enclosers = enclosers.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the help keys
    pub fn with_help_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.help_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Builds a registry holding every literal of these conventions
    pub fn build_registry(&self, case_sensitivity: CaseSensitivity) -> Result<LexicalRegistry> {
        let mut registry = LexicalRegistry::new(case_sensitivity);
        let sets = [
            (LexicalRole::Prefix, &self.prefixes),
            (LexicalRole::Separator, &self.separators),
            (LexicalRole::Quote, &self.quotes),
            (LexicalRole::ValueEncloser, &self.value_enclosers),
            (LexicalRole::HelpOptionKey, &self.help_keys),
        ];
        for (role, literals) in sets {
            for literal in literals {
                registry.register(role, literal.as_str())?;
            }
        }
        registry.validate_required_roles()?;
        Ok(registry)
    }
}

impl Default for LexicalConventions {
    fn default() -> Self {
        fn strings(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            prefixes: strings(&["-", "--", "/"]),
            separators: strings(&[" ", "\t", "\r", "\n"]),
            quotes: strings(&["\"", "'"]),
            value_enclosers: strings(&["=", ":"]),
            help_keys: strings(&["?", "help"]),
        }
    }
}
