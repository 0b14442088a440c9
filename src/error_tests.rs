//! Tests for error messages, positions and issue rendering
//!
//! Covers registration error wording, position tracking over multi-line and
//! multi-byte input, and the caret snippets produced for parse issues.

#[cfg(test)]
mod tests {
    use crate::error::{ParseIssue, Position, RegistrationError};
    use crate::lexer::TokenKind;
    use crate::registry::{CaseSensitivity, LexicalRole};

    #[test]
    fn test_position_tracking_accuracy() {
        let mut pos = Position::new();

        pos.advance('a');
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 2);
        assert_eq!(pos.offset, 1);

        pos.advance('\n');
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 1);
        assert_eq!(pos.offset, 2);

        // Multi-byte characters advance one column but several bytes
        pos.advance('ü');
        assert_eq!(pos.column, 2);
        assert_eq!(pos.offset, 4);
    }

    #[test]
    fn test_locate_offsets() {
        let source = "-a 1\n-b ü 2";
        assert_eq!(Position::locate(source, 0), Position::new());

        let pos = Position::locate(source, 5);
        assert_eq!((pos.line, pos.column), (2, 1));

        // "2" sits after the two-byte 'ü'
        let pos = Position::locate(source, source.len() - 1);
        assert_eq!((pos.line, pos.column), (2, 6));

        let end = Position::locate(source, 1000);
        assert_eq!(end.offset, source.len());
    }

    #[test]
    fn test_registration_error_messages() {
        let err = RegistrationError::DuplicateLiteral {
            literal: "/".to_string(),
            existing: LexicalRole::Prefix,
        };
        assert_eq!(err.to_string(), "Literal '/' is already registered as key prefix");

        let err = RegistrationError::DuplicateKey {
            key: "v".to_string(),
            context_path: "log:verbose".to_string(),
            existing: "app:version".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Key 'v' of 'log:verbose' is already bound to 'app:version'"
        );

        let err = RegistrationError::EmptyRole {
            role: LexicalRole::Separator,
        };
        assert_eq!(err.to_string(), "No literal registered for required role separator");

        let err = RegistrationError::CaseSensitivityMismatch {
            registry: CaseSensitivity::Sensitive,
            catalog: CaseSensitivity::Insensitive,
        };
        assert_eq!(
            err.to_string(),
            "Catalog compares keys Insensitive but the registry compares literals Sensitive"
        );
    }

    #[test]
    fn test_issue_messages() {
        let issue = ParseIssue::MalformedSequence {
            previous: TokenKind::KeyPrefix,
            current: TokenKind::Separator,
            offset: 1,
        };
        assert_eq!(issue.to_string(), "Unexpected separator after key prefix");

        let issue = ParseIssue::UnterminatedQuote {
            quote: "'".to_string(),
            offset: 0,
        };
        assert_eq!(issue.to_string(), "Unterminated quote '");
        assert_eq!(issue.format_compact("'abc"), "Unterminated quote ' at 1:1");
    }

    #[test]
    fn test_issue_render_snippet() {
        let source = "-x 1 -zed 2";
        let issue = ParseIssue::UnknownKey {
            key: "zed".to_string(),
            offset: 6,
        };
        assert_eq!(
            issue.render(source),
            "Unknown option key 'zed' at 1:7\n1 | -x 1 -zed 2\n  |       ^^^\n"
        );
    }

    #[test]
    fn test_issue_render_second_line() {
        let source = "-a\n- -b";
        let issue = ParseIssue::MalformedSequence {
            previous: TokenKind::KeyPrefix,
            current: TokenKind::Separator,
            offset: 4,
        };
        let rendered = issue.render(source);
        assert!(rendered.starts_with("Unexpected separator after key prefix at 2:2\n"));
        assert!(rendered.contains("2 | - -b\n"));
        assert!(rendered.ends_with("  |  ^\n"));
    }

    #[test]
    fn test_issue_render_empty_source() {
        let issue = ParseIssue::MalformedSequence {
            previous: TokenKind::KeyPrefix,
            current: TokenKind::EndOfInput,
            offset: 0,
        };
        let rendered = issue.render("");
        assert!(rendered.contains("1 | \n"));
    }
}
