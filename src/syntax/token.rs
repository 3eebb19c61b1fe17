use std::borrow::Cow;
use std::fmt;

use crate::diagnostics::Span;

/// All possible token types in Uni
///
/// The lifetime parameter 'input ties token references to the source text lifetime,
/// letting us avoid copying strings for identifiers and numbers
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Token<'input> {
    // Delimiters
    Comma,     // ","
    Colon,     // ":"
    Semicolon, // ";" - optional statement terminator
    LParen,    // "("
    RParen,    // ")"
    LBracket,  // "["
    RBracket,  // "]"
    LBrace,    // "{"
    RBrace,    // "}"

    // Variable length tokens
    Identifier(&'input str),  // Variable and function names
    Int(&'input str),         // Integer literals, parsed by the parser
    Float(&'input str),       // Decimal literals, parsed by the parser
    String(Cow<'input, str>), // String literals with escapes resolved

    // Keywords
    True,
    False,
    Var,
    If,
    Else,
    While,
    For,
    In,
    Fn,
    Return,
    Len,
    Print,
    Println,

    // Operators
    Assign, // "="
    Plus,   // "+"
    Minus,  // "-"
    Star,   // "*"
    Slash,  // "/"
    Bang,   // "!"
    Lt,     // "<"
    Gt,     // ">"
    LtEq,   // "<="
    GtEq,   // ">="
    EqEq,   // "=="
    NotEq,  // "!="
    Or,     // "or"
    And,    // "and"

    // Special tokens
    #[default]
    EOF, // End of file
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "{name}"),
            Token::Int(text) | Token::Float(text) => write!(f, "{text}"),
            Token::String(s) => write!(f, "\"{s}\""),
            Token::EOF => write!(f, "end of input"),
            other => write!(f, "{}", other.as_symbol()),
        }
    }
}

impl<'input> Token<'input> {
    /// Maps a scanned word to its keyword token, if it is one.
    pub fn keyword(word: &str) -> Option<Self> {
        let token = match word {
            "true" => Token::True,
            "false" => Token::False,
            "var" => Token::Var,
            "if" => Token::If,
            "else" => Token::Else,
            "while" => Token::While,
            "for" => Token::For,
            "in" => Token::In,
            "fn" => Token::Fn,
            "return" => Token::Return,
            "len" => Token::Len,
            "print" => Token::Print,
            "println" => Token::Println,
            "or" => Token::Or,
            "and" => Token::And,
            _ => return None,
        };
        Some(token)
    }

    /// Maps one or two punctuation characters to their token.
    pub fn symbol(text: &str) -> Option<Self> {
        let token = match text {
            "," => Token::Comma,
            ":" => Token::Colon,
            ";" => Token::Semicolon,
            "(" => Token::LParen,
            ")" => Token::RParen,
            "[" => Token::LBracket,
            "]" => Token::RBracket,
            "{" => Token::LBrace,
            "}" => Token::RBrace,
            "=" => Token::Assign,
            "+" => Token::Plus,
            "-" => Token::Minus,
            "*" => Token::Star,
            "/" => Token::Slash,
            "!" => Token::Bang,
            "<" => Token::Lt,
            ">" => Token::Gt,
            "<=" => Token::LtEq,
            ">=" => Token::GtEq,
            "==" => Token::EqEq,
            "!=" => Token::NotEq,
            _ => return None,
        };
        Some(token)
    }

    /// Source spelling of fixed-text tokens.
    pub const fn as_symbol(&self) -> &'static str {
        match self {
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Semicolon => ";",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::True => "true",
            Token::False => "false",
            Token::Var => "var",
            Token::If => "if",
            Token::Else => "else",
            Token::While => "while",
            Token::For => "for",
            Token::In => "in",
            Token::Fn => "fn",
            Token::Return => "return",
            Token::Len => "len",
            Token::Print => "print",
            Token::Println => "println",
            Token::Assign => "=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Bang => "!",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Or => "or",
            Token::And => "and",
            Token::Identifier(_) => "identifier",
            Token::Int(_) => "integer",
            Token::Float(_) => "float",
            Token::String(_) => "string",
            Token::EOF => "end of input",
        }
    }
}

/// Represents a token along with its location in the original source text.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SpannedToken<'input> {
    pub token: Token<'input>,
    pub span: Span,
}
