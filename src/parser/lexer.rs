use super::tokens::{Token, TokenKind};
use crate::string_interning::StringTable;
use crate::token_log;

/// A straightforward, tolerant hand-rolled lexer. On an unrecognized
/// character it skips the byte and keeps going rather than aborting, since
/// the parser built on top is itself tolerant-mode.
pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src: src.as_bytes(),
            pos: 0,
        }
    }

    pub fn tokenize(mut self, table: &mut StringTable) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(self.src.len() / 4);
        loop {
            self.skip_whitespace_and_comments();
            let start = self.pos;
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    byte_offset: start,
                    byte_length: 0,
                });
                break;
            };

            let kind = if c.is_ascii_digit() {
                self.lex_number()
            } else if c == b'"' {
                self.lex_string(table)
            } else if c == b'\'' {
                self.lex_char()
            } else if is_ident_start(c) {
                self.lex_ident_or_keyword(table)
            } else {
                self.lex_operator()
            };

            tokens.push(Token {
                kind,
                byte_offset: start,
                byte_length: self.pos - start,
            });
        }
        token_log!("lexed {} tokens", tokens.len());
        tokens
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.pos += 1;
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.pos += 2;
                    while self.pos < self.src.len() {
                        if self.peek() == Some(b'*') && self.peek_at(1) == Some(b'/') {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
        let mut is_float = false;
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b) if b.is_ascii_digit()) {
            is_float = true;
            self.pos += 1;
            while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("0");
        if is_float {
            TokenKind::FloatLit(text.parse().unwrap_or(0.0))
        } else {
            TokenKind::IntLit(text.parse().unwrap_or(0))
        }
    }

    fn lex_string(&mut self, table: &mut StringTable) -> TokenKind {
        self.pos += 1; // opening quote
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'"' {
                break;
            }
            if b == b'\\' {
                self.pos += 1;
            }
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("");
        let id = table.intern(text);
        if self.peek() == Some(b'"') {
            self.pos += 1;
        }
        TokenKind::StringLit(id)
    }

    fn lex_char(&mut self) -> TokenKind {
        self.pos += 1;
        let c = self.bump().unwrap_or(b'\0') as char;
        if self.peek() == Some(b'\'') {
            self.pos += 1;
        }
        TokenKind::CharLit(c)
    }

    fn lex_ident_or_keyword(&mut self, table: &mut StringTable) -> TokenKind {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if is_ident_continue(b)) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("");
        match text {
            "package" => TokenKind::Package,
            "import" => TokenKind::Import,
            "class" => TokenKind::Class,
            "interface" => TokenKind::Interface,
            "enum" => TokenKind::Enum,
            "object" => TokenKind::Object,
            "fun" => TokenKind::Fun,
            "val" => TokenKind::Val,
            "var" => TokenKind::Var,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "when" => TokenKind::When,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "finally" => TokenKind::Finally,
            "throw" => TokenKind::Throw,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "guard" => TokenKind::Guard,
            "use" => TokenKind::Use,
            "this" => TokenKind::This,
            "super" => TokenKind::Super,
            "new" => TokenKind::New,
            "as" => TokenKind::As,
            "is" => TokenKind::Is,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "_" => TokenKind::Underscore,
            _ => TokenKind::Ident(table.intern(text)),
        }
    }

    fn lex_operator(&mut self) -> TokenKind {
        let c = self.bump().unwrap();
        macro_rules! two {
            ($next:expr, $yes:expr, $no:expr) => {{
                if self.peek() == Some($next) {
                    self.pos += 1;
                    $yes
                } else {
                    $no
                }
            }};
        }
        match c {
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b';' => TokenKind::Semicolon,
            b'.' => {
                if self.peek() == Some(b'.') {
                    self.pos += 1;
                    two!(b'<', TokenKind::DotDotLt, TokenKind::DotDot)
                } else {
                    TokenKind::Dot
                }
            }
            b'?' => {
                if self.peek() == Some(b'.') {
                    self.pos += 1;
                    TokenKind::SafeDot
                } else if self.peek() == Some(b':') {
                    self.pos += 1;
                    two!(b'=', TokenKind::ElvisAssign, TokenKind::Elvis)
                } else {
                    TokenKind::QuestionMark
                }
            }
            b'!' => {
                if self.peek() == Some(b'!') {
                    self.pos += 1;
                    TokenKind::BangBang
                } else {
                    two!(b'=', TokenKind::NotEq, TokenKind::Bang)
                }
            }
            b'+' => two!(b'=', TokenKind::PlusAssign, TokenKind::Plus),
            b'-' => {
                if self.peek() == Some(b'>') {
                    self.pos += 1;
                    TokenKind::Arrow
                } else {
                    two!(b'=', TokenKind::MinusAssign, TokenKind::Minus)
                }
            }
            b'*' => two!(b'=', TokenKind::StarAssign, TokenKind::Star),
            b'/' => two!(b'=', TokenKind::SlashAssign, TokenKind::Slash),
            b'%' => two!(b'=', TokenKind::PercentAssign, TokenKind::Percent),
            b'=' => {
                if self.peek() == Some(b'=') {
                    self.pos += 1;
                    TokenKind::EqEq
                } else if self.peek() == Some(b'>') {
                    self.pos += 1;
                    TokenKind::FatArrow
                } else {
                    TokenKind::Assign
                }
            }
            b'<' => two!(b'=', TokenKind::Le, TokenKind::Lt),
            b'>' => two!(b'=', TokenKind::Ge, TokenKind::Gt),
            b'&' => two!(b'&', TokenKind::AndAnd, TokenKind::Amp),
            b'|' => {
                if self.peek() == Some(b'>') {
                    self.pos += 1;
                    TokenKind::Pipeline
                } else {
                    two!(b'|', TokenKind::OrOr, TokenKind::Pipe)
                }
            }
            b'^' => TokenKind::Caret,
            _ => TokenKind::Eof,
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
