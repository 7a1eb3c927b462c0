// C Lexer
// Tokenizes the C subset used for event sources. Preprocessor lines are
// handled before tokenizing: `#include` is ignored and object-like `#define`
// macros are substituted token by token.

use std::collections::HashMap;

use super::error::CcError;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(i64),
    Str(String),
    Identifier(String),

    // Keywords
    Void,
    Char,
    Short,
    Int,
    Long,
    Signed,
    Unsigned,
    Const,
    Volatile,
    Static,
    Extern,
    If,
    Else,
    While,
    Do,
    For,
    Return,
    Break,
    Continue,
    Sizeof,

    // Symbols
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    LeftParen,    // (
    RightParen,   // )
    Semicolon,    // ;
    Comma,        // ,
    Question,     // ?
    Colon,        // :

    // Operators
    Assign,       // =
    OpAssign(&'static str), // += -= ...
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Not,
    Shl,
    Shr,
    AndAnd,
    OrOr,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    PlusPlus,
    MinusMinus,

    EOF,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Identifier(name) => format!("'{}'", name),
            TokenKind::EOF => "end of input".to_string(),
            other => format!("{:?}", other),
        }
    }
}

fn keyword(word: &str) -> Option<TokenKind> {
    Some(match word {
        "void" => TokenKind::Void,
        "char" => TokenKind::Char,
        "short" => TokenKind::Short,
        "int" => TokenKind::Int,
        "long" => TokenKind::Long,
        "signed" => TokenKind::Signed,
        "unsigned" => TokenKind::Unsigned,
        "const" => TokenKind::Const,
        "volatile" => TokenKind::Volatile,
        "static" => TokenKind::Static,
        "extern" => TokenKind::Extern,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "do" => TokenKind::Do,
        "for" => TokenKind::For,
        "return" => TokenKind::Return,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "sizeof" => TokenKind::Sizeof,
        _ => return None,
    })
}

/// Fixed-width integer aliases, spelled out as their C keywords.
fn fixed_width_alias(word: &str) -> Option<[TokenKind; 2]> {
    Some(match word {
        "s8" => [TokenKind::Signed, TokenKind::Char],
        "u8" => [TokenKind::Unsigned, TokenKind::Char],
        "s16" => [TokenKind::Signed, TokenKind::Short],
        "u16" => [TokenKind::Unsigned, TokenKind::Short],
        "s32" => [TokenKind::Signed, TokenKind::Int],
        "u32" => [TokenKind::Unsigned, TokenKind::Int],
        _ => return None,
    })
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.input.get(self.position + ahead).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) -> Result<(), CcError> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.advance();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.line;
                    self.advance();
                    self.advance();
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('*'), Some('/')) => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            (Some(_), _) => {
                                self.advance();
                            }
                            (None, _) => return Err(CcError::UnterminatedComment(start)),
                        }
                    }
                }
                (Some('#'), _) => {
                    // Preprocessor lines were consumed earlier; anything left
                    // is ignored to the end of the line.
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn escape(&mut self, line: usize) -> Result<char, CcError> {
        match self.advance() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('0') => Ok('\0'),
            Some(c) => Ok(c),
            None => Err(CcError::UnterminatedString(line)),
        }
    }

    fn number(&mut self) -> Result<TokenKind, CcError> {
        let line = self.line;
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
        let lower = digits.to_ascii_lowercase();
        let parsed = if let Some(hex) = lower.strip_prefix("0x") {
            i64::from_str_radix(hex, 16)
        } else if let Some(bin) = lower.strip_prefix("0b") {
            i64::from_str_radix(bin, 2)
        } else if lower.len() > 1 && lower.starts_with('0') {
            i64::from_str_radix(&lower[1..], 8)
        } else {
            lower.parse::<i64>()
        };
        parsed
            .map(TokenKind::Number)
            .map_err(|_| CcError::ParseError(format!("bad number literal '{}'", text), line))
    }

    fn next_token(&mut self) -> Result<Token, CcError> {
        self.skip_trivia()?;
        let line = self.line;
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::EOF,
                line,
            });
        };

        if c.is_ascii_digit() {
            let kind = self.number()?;
            return Ok(Token { kind, line });
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let mut word = String::new();
            while let Some(c) = self.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    word.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            let kind = keyword(&word).unwrap_or(TokenKind::Identifier(word));
            return Ok(Token { kind, line });
        }

        if c == '"' {
            self.advance();
            let mut text = String::new();
            loop {
                match self.advance() {
                    Some('"') => break,
                    Some('\\') => text.push(self.escape(line)?),
                    Some('\n') | None => return Err(CcError::UnterminatedString(line)),
                    Some(c) => text.push(c),
                }
            }
            return Ok(Token {
                kind: TokenKind::Str(text),
                line,
            });
        }

        if c == '\'' {
            self.advance();
            let value = match self.advance() {
                Some('\\') => self.escape(line)?,
                Some(c) => c,
                None => return Err(CcError::UnterminatedString(line)),
            };
            if self.advance() != Some('\'') {
                return Err(CcError::ParseError("bad character literal".to_string(), line));
            }
            return Ok(Token {
                kind: TokenKind::Number(value as i64),
                line,
            });
        }

        let ahead = |n: usize| -> String {
            self.input[self.position..(self.position + n).min(self.input.len())]
                .iter()
                .collect()
        };
        let (kind, width) = match ahead(3).as_str() {
            "<<=" => (TokenKind::OpAssign("<<"), 3),
            ">>=" => (TokenKind::OpAssign(">>"), 3),
            _ => match ahead(2).as_str() {
                "==" => (TokenKind::EqualEqual, 2),
                "!=" => (TokenKind::NotEqual, 2),
                "<=" => (TokenKind::LessEqual, 2),
                ">=" => (TokenKind::GreaterEqual, 2),
                "<<" => (TokenKind::Shl, 2),
                ">>" => (TokenKind::Shr, 2),
                "&&" => (TokenKind::AndAnd, 2),
                "||" => (TokenKind::OrOr, 2),
                "++" => (TokenKind::PlusPlus, 2),
                "--" => (TokenKind::MinusMinus, 2),
                "+=" => (TokenKind::OpAssign("+"), 2),
                "-=" => (TokenKind::OpAssign("-"), 2),
                "*=" => (TokenKind::OpAssign("*"), 2),
                "/=" => (TokenKind::OpAssign("/"), 2),
                "%=" => (TokenKind::OpAssign("%"), 2),
                "&=" => (TokenKind::OpAssign("&"), 2),
                "|=" => (TokenKind::OpAssign("|"), 2),
                "^=" => (TokenKind::OpAssign("^"), 2),
                _ => {
                    let kind = match c {
                        '{' => TokenKind::LeftBrace,
                        '}' => TokenKind::RightBrace,
                        '[' => TokenKind::LeftBracket,
                        ']' => TokenKind::RightBracket,
                        '(' => TokenKind::LeftParen,
                        ')' => TokenKind::RightParen,
                        ';' => TokenKind::Semicolon,
                        ',' => TokenKind::Comma,
                        '?' => TokenKind::Question,
                        ':' => TokenKind::Colon,
                        '=' => TokenKind::Assign,
                        '+' => TokenKind::Plus,
                        '-' => TokenKind::Minus,
                        '*' => TokenKind::Star,
                        '/' => TokenKind::Slash,
                        '%' => TokenKind::Percent,
                        '&' => TokenKind::Amp,
                        '|' => TokenKind::Pipe,
                        '^' => TokenKind::Caret,
                        '~' => TokenKind::Tilde,
                        '!' => TokenKind::Not,
                        '<' => TokenKind::Less,
                        '>' => TokenKind::Greater,
                        other => return Err(CcError::UnexpectedCharacter(other, line)),
                    };
                    (kind, 1)
                }
            },
        };
        for _ in 0..width {
            self.advance();
        }
        Ok(Token { kind, line })
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, CcError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::EOF;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}

/// Strip preprocessor lines and collect `#define NAME body` macros. Stripped
/// lines are left blank so line numbers survive.
fn preprocess(source: &str) -> (String, HashMap<String, String>) {
    let mut defines = HashMap::new();
    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        let trimmed = line.trim_start();
        if let Some(directive) = trimmed.strip_prefix('#') {
            let directive = directive.trim_start();
            if let Some(rest) = directive.strip_prefix("define") {
                let rest = rest.trim();
                let (name, body) = match rest.find(char::is_whitespace) {
                    Some(split) => (&rest[..split], rest[split..].trim()),
                    None => (rest, ""),
                };
                if !name.is_empty() && !name.contains('(') {
                    defines.insert(name.to_string(), body.to_string());
                }
            } else {
                log::debug!("Ignoring preprocessor line '{}'", trimmed);
            }
            out.push('\n');
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    (out, defines)
}

/// Tokenize `source`, expanding object-like macros.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CcError> {
    let (text, defines) = preprocess(source);
    let mut expansions: HashMap<String, Vec<TokenKind>> = HashMap::new();
    for (name, body) in &defines {
        let mut kinds: Vec<TokenKind> = Lexer::new(body)
            .tokenize()?
            .into_iter()
            .map(|t| t.kind)
            .collect();
        kinds.pop();
        expansions.insert(name.clone(), kinds);
    }

    let mut tokens = Vec::new();
    for token in Lexer::new(&text).tokenize()? {
        match &token.kind {
            TokenKind::Identifier(name) if expansions.contains_key(name) => {
                for kind in &expansions[name] {
                    tokens.push(Token {
                        kind: kind.clone(),
                        line: token.line,
                    });
                }
            }
            TokenKind::Identifier(name) if fixed_width_alias(name).is_some() => {
                for kind in fixed_width_alias(name).into_iter().flatten() {
                    tokens.push(Token {
                        kind,
                        line: token.line,
                    });
                }
            }
            _ => tokens.push(token),
        }
    }
    Ok(tokens)
}
