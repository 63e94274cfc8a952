use crate::string_interning::StringId;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    IntLit(i64),
    FloatLit(f64),
    StringLit(StringId),
    CharLit(char),
    True,
    False,
    Null,
    Ident(StringId),

    // Keywords
    Package,
    Import,
    Class,
    Interface,
    Enum,
    Object,
    Fun,
    Val,
    Var,
    ConstVal,
    Return,
    If,
    Else,
    When,
    For,
    In,
    NotIn,
    While,
    Do,
    Try,
    Catch,
    Finally,
    Throw,
    Break,
    Continue,
    Guard,
    Use,
    This,
    Super,
    New,
    As,
    Is,
    NotIs,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Dot,
    SafeDot,
    Colon,
    Semicolon,
    Arrow,
    FatArrow,
    Pipeline,
    Elvis,
    ElvisAssign,
    QuestionMark,
    Bang,
    BangBang,
    Underscore,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    Assign,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    UShr,
    DotDot,
    DotDotLt,

    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub byte_offset: usize,
    pub byte_length: usize,
}
