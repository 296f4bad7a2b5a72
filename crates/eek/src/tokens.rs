use crate::position::Span;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    Import,
    Var,
    Func,
    Return,
    If,
    Else,
    For,
    Break,
    Continue,
    True,
    False,
}

impl Keyword {
    pub fn from_ident(ident: &str) -> Option<Self> {
        use Keyword::*;
        let kw = match ident {
            "import" => Import,
            "var" => Var,
            "func" => Func,
            "return" => Return,
            "if" => If,
            "else" => Else,
            "for" => For,
            "break" => Break,
            "continue" => Continue,
            "true" => True,
            "false" => False,
            _ => return None,
        };
        Some(kw)
    }

    pub fn as_str(&self) -> &'static str {
        use Keyword::*;
        match self {
            Import => "import",
            Var => "var",
            Func => "func",
            Return => "return",
            If => "if",
            Else => "else",
            For => "for",
            Break => "break",
            Continue => "continue",
            True => "true",
            False => "false",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semicolon,
    Define,
    Equals,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    PlusEquals,
    MinusEquals,
    StarEquals,
    SlashEquals,
    PercentEquals,
    PipePipe,
    AmpAmp,
    Bang,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Symbol::*;
        let s = match self {
            LParen => "(",
            RParen => ")",
            LBrace => "{",
            RBrace => "}",
            Comma => ",",
            Dot => ".",
            Semicolon => ";",
            Define => ":=",
            Equals => "=",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            PlusPlus => "++",
            MinusMinus => "--",
            PlusEquals => "+=",
            MinusEquals => "-=",
            StarEquals => "*=",
            SlashEquals => "/=",
            PercentEquals => "%=",
            PipePipe => "||",
            AmpAmp => "&&",
            Bang => "!",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            EqEq => "==",
            NotEq => "!=",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TokenKind {
    Identifier(SmolStr),
    IntLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    StringLiteral(String),
    Keyword(Keyword),
    Symbol(Symbol),
    /// Statement terminator inserted at a line end.
    Newline,
    Eof,
}

impl TokenKind {
    /// Whether a line break right after this token ends the statement.
    pub fn terminates_line(&self) -> bool {
        matches!(
            self,
            TokenKind::Identifier(_)
                | TokenKind::IntLiteral(_)
                | TokenKind::FloatLiteral(_)
                | TokenKind::BoolLiteral(_)
                | TokenKind::StringLiteral(_)
                | TokenKind::Keyword(Keyword::Return | Keyword::Break | Keyword::Continue)
                | TokenKind::Symbol(
                    Symbol::RParen | Symbol::RBrace | Symbol::PlusPlus | Symbol::MinusMinus
                )
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(name) => write!(f, "identifier `{name}`"),
            TokenKind::IntLiteral(v) => write!(f, "`{v}`"),
            TokenKind::FloatLiteral(v) => write!(f, "`{v}`"),
            TokenKind::BoolLiteral(v) => write!(f, "`{v}`"),
            TokenKind::StringLiteral(v) => write!(f, "{v:?}"),
            TokenKind::Keyword(kw) => write!(f, "keyword `{kw}`"),
            TokenKind::Symbol(sym) => write!(f, "`{sym}`"),
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
