//! Integration tests for the lexer

use zmanim_language::{Lexer, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::tokenize_all(source)
        .into_iter()
        .map(|t| t.kind)
        .filter(|k| !k.is_trivia())
        .collect()
}

#[test]
fn offset_expression() {
    assert_eq!(
        kinds("sunset - 18min"),
        [
            TokenKind::Ident("sunset".into()),
            TokenKind::Minus,
            TokenKind::Duration(18.0),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn compound_durations_are_one_token() {
    assert_eq!(kinds("1h 30min"), [TokenKind::Duration(90.0), TokenKind::Eof]);
    assert_eq!(kinds("1.5hr"), [TokenKind::Duration(90.0), TokenKind::Eof]);
}

#[test]
fn references_dates_and_strings() {
    assert_eq!(
        kinds(r#"@alos_72 21-May "winter""#),
        [
            TokenKind::Reference("alos_72".into()),
            TokenKind::Date { day: 21, month: 5 },
            TokenKind::String("winter".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn keywords_and_operators() {
    assert_eq!(
        kinds("if (month >= 3 && !false) {} else {}"),
        [
            TokenKind::If,
            TokenKind::LParen,
            TokenKind::Ident("month".into()),
            TokenKind::GtEq,
            TokenKind::Number(3.0),
            TokenKind::AndAnd,
            TokenKind::Bang,
            TokenKind::False,
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::RBrace,
            TokenKind::Else,
            TokenKind::LBrace,
            TokenKind::RBrace,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn comments_are_trivia() {
    let tokens = Lexer::tokenize_all("sunrise // first light\n/* block */ + 5min");
    assert!(tokens.iter().any(|t| matches!(t.kind, TokenKind::Comment(_))));
    assert_eq!(kinds("sunrise // x\n+ 5min").len(), 4);
}

#[test]
fn spans_track_lines() {
    let source = "sunrise\n  + 5min";
    let tokens = Lexer::tokenize_all(source);
    let plus = tokens.iter().find(|t| t.kind == TokenKind::Plus).unwrap();
    assert_eq!(plus.span.line, 2);
    assert_eq!(plus.span.column, 3);
    assert_eq!(plus.text(source), "+");
}

#[test]
fn unterminated_string_is_an_error_token() {
    assert!(kinds("\"winter").iter().any(|k| matches!(k, TokenKind::Error(_))));
}
