//! Option catalog
//!
//! Declares the options a command line may carry. Each option has a unique
//! context path, one or more globally unique command-line keys, a
//! cardinality [`OptionStyle`], and a values buffer the parser fills in.

use crate::error::{RegistrationError, Result};
use crate::registry::CaseSensitivity;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cardinality contract for an option's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionStyle {
    /// Presence only; never takes values
    Switch,
    /// Exactly one value
    SingleValued,
    /// Any number of values read as one space-joined value
    ConcatenatedSingleValue,
    /// Any number of values
    Collection,
}

impl OptionStyle {
    /// Upper bound on values, `None` when unbounded
    pub fn max_values(self) -> Option<usize> {
        match self {
            OptionStyle::Switch => Some(0),
            OptionStyle::SingleValued => Some(1),
            OptionStyle::ConcatenatedSingleValue | OptionStyle::Collection => None,
        }
    }

    /// Number of values needed for the option to count as satisfied
    pub fn min_values(self) -> usize {
        match self {
            OptionStyle::Switch => 0,
            _ => 1,
        }
    }
}

/// Explicit bounds narrowing an option style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: usize,
    /// `None` keeps the style's upper bound
    pub max: Option<usize>,
}

impl ValueRange {
    pub fn new(min: usize, max: Option<usize>) -> Self {
        Self { min, max }
    }
}

/// Declaration of an option, consumed by [`OptionCatalog::register`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSpec {
    pub context_path: String,
    pub keys: Vec<String>,
    pub style: OptionStyle,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub value_range: Option<ValueRange>,
}

impl OptionSpec {
    /// Creates a declaration with no keys yet
    pub fn new(context_path: impl Into<String>, style: OptionStyle) -> Self {
        Self {
            context_path: context_path.into(),
            keys: Vec::new(),
            style,
            required: false,
            value_range: None,
        }
    }

    /// Adds a command-line key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    /// Adds several command-line keys
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Marks the option as required
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Narrows the number of accepted values
    pub fn with_value_range(mut self, min: usize, max: Option<usize>) -> Self {
        self.value_range = Some(ValueRange::new(min, max));
        self
    }

    fn validate_range(&self) -> Result<()> {
        let Some(range) = self.value_range else {
            return Ok(());
        };
        let invalid = |message: &str| RegistrationError::InvalidValueRange {
            context_path: self.context_path.clone(),
            message: message.to_string(),
        };

        if let Some(max) = range.max {
            if range.min > max {
                return Err(invalid("minimum exceeds maximum"));
            }
        }
        if let Some(style_max) = self.style.max_values() {
            if range.min > style_max || range.max.is_some_and(|max| max > style_max) {
                return Err(invalid("range exceeds what the option style allows"));
            }
        }
        Ok(())
    }
}

/// A registered option and the values allocated to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOption {
    context_path: String,
    keys: Vec<String>,
    style: OptionStyle,
    required: bool,
    value_range: Option<ValueRange>,
    values: Vec<String>,
    provided_key: Option<String>,
}

impl CommandOption {
    fn from_spec(spec: OptionSpec) -> Self {
        Self {
            context_path: spec.context_path,
            keys: spec.keys,
            style: spec.style,
            required: spec.required,
            value_range: spec.value_range,
            values: Vec::new(),
            provided_key: None,
        }
    }

    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn style(&self) -> OptionStyle {
        self.style
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn value_range(&self) -> Option<ValueRange> {
        self.value_range
    }

    /// Values allocated by the last parse, in command-line order
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// The key alias actually seen on the command line
    pub fn provided_key(&self) -> Option<&str> {
        self.provided_key.as_deref()
    }

    /// Upper bound on values after applying the explicit range
    pub fn max_values(&self) -> Option<usize> {
        let range_max = self.value_range.and_then(|range| range.max);
        match (self.style.max_values(), range_max) {
            (Some(style), Some(range)) => Some(style.min(range)),
            (style, range) => style.or(range),
        }
    }

    /// Lower bound on values after applying the explicit range
    pub fn min_values(&self) -> usize {
        match self.style {
            OptionStyle::Switch => 0,
            _ => self
                .value_range
                .map_or_else(|| self.style.min_values(), |range| range.min),
        }
    }

    /// How many more values the option can take
    pub fn remaining_capacity(&self) -> Option<usize> {
        self.max_values()
            .map(|max| max.saturating_sub(self.values.len()))
    }

    /// Returns true when the allocated values meet the option's contract.
    ///
    /// A switch is satisfied by being present; other styles by their value
    /// count. A required option whose key never appeared is not satisfied.
    pub fn values_satisfied(&self) -> bool {
        let count = self.values.len();
        let meets_style = match self.style {
            OptionStyle::Switch => count == 0 && self.provided_key.is_some(),
            _ => count >= self.min_values() && self.max_values().is_none_or(|max| count <= max),
        };
        meets_style && !(self.required && self.provided_key.is_none())
    }

    /// All values joined by single spaces.
    ///
    /// This is how a [`OptionStyle::ConcatenatedSingleValue`] option is read;
    /// `None` when nothing was allocated.
    pub fn joined_value(&self) -> Option<String> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.join(" "))
        }
    }

    /// Appends a value, handing it back when the option is full
    pub(crate) fn append_value(&mut self, value: String) -> std::result::Result<(), String> {
        if self.remaining_capacity() == Some(0) {
            return Err(value);
        }
        self.values.push(value);
        Ok(())
    }

    pub(crate) fn set_provided_key(&mut self, key: &str) {
        self.provided_key = Some(key.to_string());
    }

    fn clear(&mut self) {
        self.values.clear();
        self.provided_key = None;
    }
}

/// All declared options, in registration order
///
/// Serializes as a map from context path to option, keeping that order.
#[derive(Debug, Clone, Serialize)]
pub struct OptionCatalog {
    #[serde(skip)]
    case_sensitivity: CaseSensitivity,
    #[serde(flatten)]
    options: IndexMap<String, CommandOption>,
    /// Folded key -> index into `options`
    #[serde(skip)]
    keys: HashMap<String, usize>,
}

impl OptionCatalog {
    /// Creates an empty catalog using `case_sensitivity` for key lookups
    pub fn new(case_sensitivity: CaseSensitivity) -> Self {
        Self {
            case_sensitivity,
            options: IndexMap::new(),
            keys: HashMap::new(),
        }
    }

    /// The comparison mode used for key lookups
    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case_sensitivity
    }

    /// Checks a declaration against this catalog without registering it
    pub fn validate(&self, spec: &OptionSpec) -> Result<()> {
        if self.options.contains_key(&spec.context_path) {
            return Err(RegistrationError::DuplicateContextPath {
                context_path: spec.context_path.clone(),
            });
        }
        if spec.keys.is_empty() || spec.keys.iter().any(String::is_empty) {
            return Err(RegistrationError::EmptyKeys {
                context_path: spec.context_path.clone(),
            });
        }

        let mut seen = Vec::with_capacity(spec.keys.len());
        for key in &spec.keys {
            let folded = self.case_sensitivity.fold(key);
            if let Some(existing) = self.resolve(key) {
                return Err(RegistrationError::DuplicateKey {
                    key: key.clone(),
                    context_path: spec.context_path.clone(),
                    existing: existing.context_path.clone(),
                });
            }
            if seen.contains(&folded) {
                return Err(RegistrationError::DuplicateKey {
                    key: key.clone(),
                    context_path: spec.context_path.clone(),
                    existing: spec.context_path.clone(),
                });
            }
            seen.push(folded);
        }

        spec.validate_range()
    }

    /// Registers an option.
    ///
    /// Fails on a duplicate context path, a key already bound to any option,
    /// an empty key list, or a value range the style cannot honor.
    pub fn register(&mut self, spec: OptionSpec) -> Result<&CommandOption> {
        self.validate(&spec)?;

        let index = self.options.len();
        for key in &spec.keys {
            let folded = self.case_sensitivity.fold(key).into_owned();
            self.keys.insert(folded, index);
        }
        let (index, _) = self
            .options
            .insert_full(spec.context_path.clone(), CommandOption::from_spec(spec));
        Ok(&self.options[index])
    }

    /// Looks up the option bound to a command-line key
    pub fn resolve(&self, key: &str) -> Option<&CommandOption> {
        self.index_of(key)
            .and_then(|index| self.options.get_index(index))
            .map(|(_, option)| option)
    }

    pub(crate) fn resolve_mut(&mut self, key: &str) -> Option<&mut CommandOption> {
        self.index_of(key)
            .and_then(|index| self.options.get_index_mut(index))
            .map(|(_, option)| option)
    }

    fn index_of(&self, key: &str) -> Option<usize> {
        self.keys.get(self.case_sensitivity.fold(key).as_ref()).copied()
    }

    /// Looks up an option by context path
    pub fn get(&self, context_path: &str) -> Option<&CommandOption> {
        self.options.get(context_path)
    }

    /// Iterates options in registration order
    pub fn iter(&self) -> impl Iterator<Item = &CommandOption> {
        self.options.values()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Resets every option's values and provided key; metadata persists
    pub fn clear_values(&mut self) {
        self.options.values_mut().for_each(CommandOption::clear);
    }

    /// Required options whose values do not satisfy their contract
    pub fn unsatisfied_required(&self) -> Vec<&CommandOption> {
        self.iter()
            .filter(|option| option.required && !option.values_satisfied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> OptionCatalog {
        OptionCatalog::new(CaseSensitivity::Insensitive)
    }

    #[test]
    fn test_register_and_resolve() {
        let mut catalog = catalog();
        catalog
            .register(
                OptionSpec::new("server:port", OptionStyle::SingleValued).with_keys(["p", "port"]),
            )
            .unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.resolve("PORT").unwrap().context_path(), "server:port");
        assert_eq!(catalog.resolve("p").unwrap().keys(), ["p", "port"]);
        assert!(catalog.resolve("q").is_none());
        assert!(catalog.get("server:port").is_some());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut catalog = catalog();
        catalog
            .register(OptionSpec::new("a", OptionStyle::Switch).with_key("v"))
            .unwrap();

        let err = catalog
            .register(OptionSpec::new("b", OptionStyle::Switch).with_key("V"))
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateKey {
                key: "V".to_string(),
                context_path: "b".to_string(),
                existing: "a".to_string(),
            }
        );
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.resolve("v").unwrap().context_path(), "a");
    }

    #[test]
    fn test_duplicate_key_within_one_declaration() {
        let mut catalog = catalog();
        let err = catalog
            .register(OptionSpec::new("a", OptionStyle::Switch).with_keys(["x", "X"]))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateKey { .. }));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_duplicate_context_path_rejected() {
        let mut catalog = catalog();
        catalog
            .register(OptionSpec::new("a", OptionStyle::Switch).with_key("x"))
            .unwrap();
        assert_eq!(
            catalog.register(OptionSpec::new("a", OptionStyle::Switch).with_key("y")),
            Err(RegistrationError::DuplicateContextPath {
                context_path: "a".to_string()
            })
        );
    }

    #[test]
    fn test_empty_keys_rejected() {
        let mut catalog = catalog();
        assert!(matches!(
            catalog.register(OptionSpec::new("a", OptionStyle::Switch)),
            Err(RegistrationError::EmptyKeys { .. })
        ));
        assert!(matches!(
            catalog.register(OptionSpec::new("a", OptionStyle::Switch).with_key("")),
            Err(RegistrationError::EmptyKeys { .. })
        ));
    }

    #[test]
    fn test_value_range_validation() {
        let mut catalog = catalog();
        assert!(matches!(
            catalog.register(
                OptionSpec::new("a", OptionStyle::SingleValued)
                    .with_key("a")
                    .with_value_range(0, Some(2))
            ),
            Err(RegistrationError::InvalidValueRange { .. })
        ));
        assert!(matches!(
            catalog.register(
                OptionSpec::new("b", OptionStyle::Collection)
                    .with_key("b")
                    .with_value_range(3, Some(2))
            ),
            Err(RegistrationError::InvalidValueRange { .. })
        ));
        let option = catalog
            .register(
                OptionSpec::new("c", OptionStyle::Collection)
                    .with_key("c")
                    .with_value_range(2, Some(3)),
            )
            .unwrap();
        assert_eq!(option.min_values(), 2);
        assert_eq!(option.max_values(), Some(3));
    }

    #[test]
    fn test_style_bounds() {
        assert_eq!(OptionStyle::Switch.max_values(), Some(0));
        assert_eq!(OptionStyle::SingleValued.max_values(), Some(1));
        assert_eq!(OptionStyle::Collection.max_values(), None);
        assert_eq!(OptionStyle::ConcatenatedSingleValue.max_values(), None);
    }

    #[test]
    fn test_append_value_respects_capacity() {
        let mut catalog = catalog();
        catalog
            .register(OptionSpec::new("a", OptionStyle::SingleValued).with_key("a"))
            .unwrap();
        let option = catalog.resolve_mut("a").unwrap();
        assert_eq!(option.append_value("one".to_string()), Ok(()));
        assert_eq!(option.append_value("two".to_string()), Err("two".to_string()));
        assert_eq!(option.values(), ["one"]);
        assert_eq!(option.remaining_capacity(), Some(0));
    }

    #[test]
    fn test_values_satisfied() {
        let mut catalog = catalog();
        catalog
            .register(OptionSpec::new("s", OptionStyle::Switch).with_key("s"))
            .unwrap();
        catalog
            .register(
                OptionSpec::new("c", OptionStyle::Collection)
                    .with_key("c")
                    .with_required(true),
            )
            .unwrap();

        assert!(!catalog.get("s").unwrap().values_satisfied());
        assert!(!catalog.get("c").unwrap().values_satisfied());
        assert_eq!(catalog.unsatisfied_required().len(), 1);

        catalog.resolve_mut("s").unwrap().set_provided_key("s");
        let collection = catalog.resolve_mut("c").unwrap();
        collection.set_provided_key("c");
        collection.append_value("v".to_string()).unwrap();

        assert!(catalog.get("s").unwrap().values_satisfied());
        assert!(catalog.get("c").unwrap().values_satisfied());
        assert!(catalog.unsatisfied_required().is_empty());
    }

    #[test]
    fn test_clear_values_keeps_metadata() {
        let mut catalog = catalog();
        catalog
            .register(
                OptionSpec::new("m", OptionStyle::ConcatenatedSingleValue).with_key("m"),
            )
            .unwrap();
        let option = catalog.resolve_mut("m").unwrap();
        option.set_provided_key("M");
        option.append_value("hello".to_string()).unwrap();
        option.append_value("world".to_string()).unwrap();
        assert_eq!(option.joined_value().as_deref(), Some("hello world"));

        catalog.clear_values();
        let option = catalog.get("m").unwrap();
        assert!(option.values().is_empty());
        assert_eq!(option.provided_key(), None);
        assert_eq!(option.joined_value(), None);
        assert_eq!(option.keys(), ["m"]);
    }

    #[test]
    fn test_spec_from_json() {
        let spec: OptionSpec = serde_json::from_str(
            r#"{"context_path": "log:level", "keys": ["l"], "style": "SingleValued"}"#,
        )
        .unwrap();
        assert_eq!(spec, OptionSpec::new("log:level", OptionStyle::SingleValued).with_key("l"));
    }
}
