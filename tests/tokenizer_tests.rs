//! Tokenizer and cleanup pipeline tests through the public API
//!
//! Checks the structural guarantees the parser relies on: a single
//! end-of-input sentinel, no surviving quote tokens, and leftmost-longest
//! literal matching.

use cmdline_parser::{
    CaseSensitivity, CleanupPipeline, LexicalConventions, LexicalRegistry, LexicalRole, Token,
    TokenKind, Tokenizer, UnterminatedQuotePolicy,
};

fn default_registry() -> LexicalRegistry {
    LexicalConventions::default()
        .build_registry(CaseSensitivity::Insensitive)
        .unwrap()
}

fn clean<'a>(registry: &LexicalRegistry, input: &'a str) -> Vec<Token<'a>> {
    let tokens = Tokenizer::new(registry).tokenize(input);
    CleanupPipeline::standard(UnterminatedQuotePolicy::Truncate)
        .run(tokens)
        .tokens
}

#[test]
fn test_cleanup_structural_guarantees() {
    let registry = default_registry();
    let inputs = [
        "",
        " ",
        "-a",
        "--name=value",
        "/out:dir \"quoted  text\" 'x'",
        "\"unterminated -a b",
        "'a\"b' \"c'd\"",
        "a\t\tb\n-c",
        "\"\"''",
        "-x \"one\" \"two",
    ];

    for input in inputs {
        let tokens = clean(&registry, input);
        let ends = tokens.iter().filter(|t| t.is(TokenKind::EndOfInput)).count();
        assert_eq!(ends, 1, "input {input:?}");
        assert!(tokens.last().unwrap().is(TokenKind::EndOfInput), "input {input:?}");
        assert!(
            !tokens.iter().any(|t| t.is(TokenKind::Quoter)),
            "input {input:?}"
        );
        assert!(
            !tokens.iter().any(|t| t.is(TokenKind::StartOfInput)),
            "input {input:?}"
        );
        assert!(
            !tokens
                .windows(2)
                .any(|w| w[0].is(TokenKind::Separator) && w[1].is(TokenKind::Separator)
                    && !w[1].text.is_empty()),
            "input {input:?}"
        );
    }
}

#[test]
fn test_tokenize_is_deterministic() {
    let registry = default_registry();
    let tokenizer = Tokenizer::new(&registry);
    let input = "--a=1 -b \"c d\" /e:f";
    assert_eq!(tokenizer.tokenize(input), tokenizer.tokenize(input));
}

#[test]
fn test_tokens_cover_input() {
    let registry = default_registry();
    let input = "-x=\"a b\" --yy c/d";
    let tokens = Tokenizer::new(&registry).tokenize(input);
    let rebuilt: String = tokens.iter().map(|t| t.text.as_ref()).collect();
    assert_eq!(rebuilt, input);

    for token in &tokens {
        assert_eq!(&input[token.offset..token.offset + token.text.len()], token.text);
    }
}

#[test]
fn test_overlapping_prefixes_prefer_longest() {
    let mut registry = LexicalRegistry::new(CaseSensitivity::Sensitive);
    registry.register(LexicalRole::Prefix, "-").unwrap();
    registry.register(LexicalRole::Prefix, "--").unwrap();
    registry.register(LexicalRole::Prefix, "---").unwrap();
    registry.register(LexicalRole::Separator, " ").unwrap();

    let tokens = Tokenizer::new(&registry).tokenize("----a");
    let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_ref()).collect();
    assert_eq!(texts, ["---", "-", "a", ""]);
}

#[test]
fn test_multi_character_quotes() {
    let mut registry = LexicalRegistry::new(CaseSensitivity::Sensitive);
    registry.register(LexicalRole::Prefix, "-").unwrap();
    registry.register(LexicalRole::Separator, " ").unwrap();
    registry.register(LexicalRole::Quote, "<<").unwrap();
    registry.register(LexicalRole::Quote, ">>").unwrap();
    registry.register(LexicalRole::Quote, "%%").unwrap();

    let tokens = clean(&registry, "-m %%a -b%%");
    assert_eq!(tokens[3].kind, TokenKind::Text);
    assert_eq!(tokens[3].text, "a -b");
}

#[test]
fn test_truncation_keeps_leading_tokens() {
    let registry = default_registry();
    let tokens = clean(&registry, "-a 'b c");
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        [
            TokenKind::KeyPrefix,
            TokenKind::Text,
            TokenKind::Separator,
            TokenKind::EndOfInput,
        ]
    );
}
