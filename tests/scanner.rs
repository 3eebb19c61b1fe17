use std::borrow::Cow;

use uni::diagnostics::AsStr;
use uni::syntax::SyntaxErrorKind;
use uni::syntax::scanner::Lexer;
use uni::syntax::token::Token;

fn tokens(src: &str) -> Vec<Token<'_>> {
    Lexer::new(src).map(|t| t.unwrap().token).collect()
}

fn scan_error(src: &str) -> SyntaxErrorKind {
    Lexer::new(src).find_map(Result::err).expect("expected a lexical error").kind
}

#[test]
fn test_keywords() {
    let src = "var if else while for in fn return len print println true false or and";
    assert_eq!(
        tokens(src),
        vec![
            Token::Var,
            Token::If,
            Token::Else,
            Token::While,
            Token::For,
            Token::In,
            Token::Fn,
            Token::Return,
            Token::Len,
            Token::Print,
            Token::Println,
            Token::True,
            Token::False,
            Token::Or,
            Token::And,
            Token::EOF,
        ]
    );
}

#[test]
fn test_keyword_prefix_is_an_identifier() {
    assert_eq!(
        tokens("variable iffy _for printer"),
        vec![
            Token::Identifier("variable"),
            Token::Identifier("iffy"),
            Token::Identifier("_for"),
            Token::Identifier("printer"),
            Token::EOF,
        ]
    );
}

#[test]
fn test_numbers_keep_their_text() {
    assert_eq!(
        tokens("0 42 3.14 10.0"),
        vec![Token::Int("0"), Token::Int("42"), Token::Float("3.14"), Token::Float("10.0"), Token::EOF]
    );
}

#[test]
fn test_string_escapes() {
    let toks = tokens(r#""a\nb" "q\"q" "back\\slash" """#);
    assert_eq!(toks[0], Token::String(Cow::Owned("a\nb".into())));
    assert_eq!(toks[1], Token::String(Cow::Owned("q\"q".into())));
    assert_eq!(toks[2], Token::String(Cow::Owned("back\\slash".into())));
    assert_eq!(toks[3], Token::String(Cow::Borrowed("")));
}

#[test]
fn test_comments_run_to_end_of_line() {
    let src = "var x = 1 # the answer = 42\nx # trailing";
    assert_eq!(
        tokens(src),
        vec![
            Token::Var,
            Token::Identifier("x"),
            Token::Assign,
            Token::Int("1"),
            Token::Identifier("x"),
            Token::EOF,
        ]
    );
}

#[test]
fn test_punctuation_count_matches_lexical_units() {
    let units = [
        ",", ":", ";", "(", ")", "[", "]", "{", "}", "=", "+", "-", "*", "/", "!", "<", ">", "<=",
        ">=", "==", "!=",
    ];
    // Every unit once, separated by a mix of whitespace and comments
    let mut src = String::new();
    for (i, unit) in units.iter().enumerate() {
        src.push_str(unit);
        src.push_str(if i % 3 == 0 { "  # note\n" } else { "\t" });
    }
    let toks = tokens(&src);
    assert_eq!(toks.len() - 1, units.len());
    assert_eq!(toks.last(), Some(&Token::EOF));

    // Glued together, two-character operators still win
    assert_eq!(tokens("<=>=!===").len() - 1, 4);
}

#[test]
fn test_exactly_one_eof() {
    let eofs = tokens("x   \n\n  # done").iter().filter(|t| **t == Token::EOF).count();
    assert_eq!(eofs, 1);
    assert_eq!(tokens(""), vec![Token::EOF]);
}

#[test]
fn test_lexical_errors() {
    assert_eq!(scan_error("var x = 1 @ 2"), SyntaxErrorKind::UnexpectedChar);
    assert_eq!(scan_error("\"never closed"), SyntaxErrorKind::UnterminatedString);
    assert_eq!(scan_error(r#""bad \q escape""#), SyntaxErrorKind::InvalidStringEscape);
    assert_eq!(scan_error("1.2.3"), SyntaxErrorKind::InvalidNumber);
    assert_eq!(scan_error("1."), SyntaxErrorKind::InvalidNumber);
    assert_eq!(scan_error("9lives"), SyntaxErrorKind::InvalidNumber);
    assert_eq!(SyntaxErrorKind::UnterminatedString.as_str(), "Unterminated string");
}

#[test]
fn test_error_is_yielded_before_the_end() {
    let results: Vec<_> = Lexer::new("a & b").collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    let err = results[1].as_ref().unwrap_err();
    assert_eq!(err.span, 2..3);
}
