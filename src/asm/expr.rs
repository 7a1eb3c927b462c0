// Assembler expressions
//
// Integer expressions over literals, symbols and the current address, with
// the usual C precedence for the operators armips sources rely on.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(i64),
    Ident(String),
    Op(&'static str),
    LeftParen,
    RightParen,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(i64),
    Symbol(String),
    /// `.`, the address of the current statement
    Here,
    Unary(&'static str, Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    Undefined(String),
    Invalid(String),
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExprError::Undefined(name) => write!(f, "undefined symbol '{}'", name),
            ExprError::Invalid(msg) => write!(f, "{}", msg),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '@'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '@'
}

fn parse_number(text: &str) -> Result<i64, ExprError> {
    let lower = text.to_ascii_lowercase();
    let result = if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2)
    } else {
        lower.parse::<i64>()
    };
    result.map_err(|_| ExprError::Invalid(format!("bad number '{}'", text)))
}

fn tokenize(text: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                i += 1;
            }
            let literal: String = chars[start..i].iter().collect();
            tokens.push(Token::Number(parse_number(&literal)?));
            continue;
        }
        if is_ident_start(c) {
            let start = i;
            while i < chars.len() && is_ident_char(chars[i]) {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }
        if c == '\'' {
            match (chars.get(i + 1), chars.get(i + 2)) {
                (Some(&ch), Some('\'')) => {
                    tokens.push(Token::Number(ch as i64));
                    i += 3;
                    continue;
                }
                _ => return Err(ExprError::Invalid("bad character literal".to_string())),
            }
        }
        let two: String = chars[i..chars.len().min(i + 2)].iter().collect();
        let op = match two.as_str() {
            "<<" => Some("<<"),
            ">>" => Some(">>"),
            _ => None,
        };
        if let Some(op) = op {
            tokens.push(Token::Op(op));
            i += 2;
            continue;
        }
        let token = match c {
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            ',' => Token::Comma,
            '+' => Token::Op("+"),
            '-' => Token::Op("-"),
            '*' => Token::Op("*"),
            '/' => Token::Op("/"),
            '%' => Token::Op("%"),
            '&' => Token::Op("&"),
            '|' => Token::Op("|"),
            '^' => Token::Op("^"),
            '~' => Token::Op("~"),
            '!' => Token::Op("!"),
            '.' => Token::Ident(".".to_string()),
            other => {
                return Err(ExprError::Invalid(format!(
                    "unexpected character '{}' in expression",
                    other
                )))
            }
        };
        tokens.push(token);
        i += 1;
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

const PRECEDENCE: &[&[&str]] = &[&["|"], &["^"], &["&"], &["<<", ">>"], &["+", "-"], &["*", "/", "%"]];

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn binary(&mut self, level: usize) -> Result<Expr, ExprError> {
        if level == PRECEDENCE.len() {
            return self.unary();
        }
        let mut left = self.binary(level + 1)?;
        while let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            if !PRECEDENCE[level].contains(&op) {
                break;
            }
            self.pos += 1;
            let right = self.binary(level + 1)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        if let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            if matches!(op, "-" | "~" | "!" | "+") {
                self.pos += 1;
                let operand = self.unary()?;
                return Ok(Expr::Unary(op, Box::new(operand)));
            }
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Ident(name)) if name == "." => Ok(Expr::Here),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LeftParen) {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RightParen) {
                        loop {
                            args.push(self.binary(0)?);
                            match self.next() {
                                Some(Token::Comma) => continue,
                                Some(Token::RightParen) => break,
                                _ => return Err(ExprError::Invalid("expected ')'".to_string())),
                            }
                        }
                    } else {
                        self.pos += 1;
                    }
                    Ok(Expr::Call(name.to_ascii_lowercase(), args))
                } else {
                    Ok(Expr::Symbol(name))
                }
            }
            Some(Token::LeftParen) => {
                let inner = self.binary(0)?;
                match self.next() {
                    Some(Token::RightParen) => Ok(inner),
                    _ => Err(ExprError::Invalid("expected ')'".to_string())),
                }
            }
            Some(other) => Err(ExprError::Invalid(format!("unexpected {:?}", other))),
            None => Err(ExprError::Invalid("expression ends early".to_string())),
        }
    }
}

pub fn parse_expr(text: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(ExprError::Invalid("empty expression".to_string()));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.binary(0)?;
    if parser.pos != parser.tokens.len() {
        return Err(ExprError::Invalid(format!(
            "unexpected trailing input in '{}'",
            text
        )));
    }
    Ok(expr)
}

/// Upper half for a `LUI` paired with a sign-extended low half.
pub fn hi(value: i64) -> i64 {
    ((value + 0x8000) >> 16) & 0xFFFF
}

pub fn lo(value: i64) -> i64 {
    value & 0xFFFF
}

impl Expr {
    /// Whether the expression names any symbol or the current address.
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Number(_) => true,
            Expr::Symbol(_) | Expr::Here => false,
            Expr::Unary(_, e) => e.is_constant(),
            Expr::Binary(_, a, b) => a.is_constant() && b.is_constant(),
            Expr::Call(_, args) => args.iter().all(Expr::is_constant),
        }
    }

    pub fn eval(
        &self,
        lookup: &dyn Fn(&str) -> Option<i64>,
        here: i64,
    ) -> Result<i64, ExprError> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Here => Ok(here),
            Expr::Symbol(name) => lookup(name).ok_or_else(|| ExprError::Undefined(name.clone())),
            Expr::Unary(op, e) => {
                let v = e.eval(lookup, here)?;
                Ok(match *op {
                    "-" => v.wrapping_neg(),
                    "~" => !v,
                    "!" => (v == 0) as i64,
                    _ => v,
                })
            }
            Expr::Binary(op, a, b) => {
                let a = a.eval(lookup, here)?;
                let b = b.eval(lookup, here)?;
                match *op {
                    "+" => Ok(a.wrapping_add(b)),
                    "-" => Ok(a.wrapping_sub(b)),
                    "*" => Ok(a.wrapping_mul(b)),
                    "/" | "%" if b == 0 => Err(ExprError::Invalid("division by zero".to_string())),
                    "/" => Ok(a / b),
                    "%" => Ok(a % b),
                    "<<" => Ok(a.wrapping_shl(b as u32)),
                    ">>" => Ok(a.wrapping_shr(b as u32)),
                    "&" => Ok(a & b),
                    "|" => Ok(a | b),
                    "^" => Ok(a ^ b),
                    other => Err(ExprError::Invalid(format!("unknown operator {}", other))),
                }
            }
            Expr::Call(name, args) => {
                if args.len() != 1 {
                    return Err(ExprError::Invalid(format!("{}() takes one argument", name)));
                }
                let v = args[0].eval(lookup, here)?;
                match name.as_str() {
                    "hi" => Ok(hi(v)),
                    "lo" => Ok(lo(v)),
                    other => Err(ExprError::Invalid(format!("unknown function {}()", other))),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn eval(text: &str) -> Result<i64, ExprError> {
        let lookup = |name: &str| match name {
            "table" => Some(0x800F_8000),
            "@local" => Some(12),
            _ => None,
        };
        parse_expr(text)?.eval(&lookup, 0x100)
    }

    #[test]
    fn precedence_follows_c() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), 7);
        assert_eq!(eval("(1 + 2) * 3").unwrap(), 9);
        assert_eq!(eval("1 << 4 | 1").unwrap(), 17);
        assert_eq!(eval("-4").unwrap(), -4);
        assert_eq!(eval("~0 & 0xFF").unwrap(), 0xFF);
    }

    #[test]
    fn literals() {
        assert_eq!(eval("0x1F").unwrap(), 31);
        assert_eq!(eval("0b101").unwrap(), 5);
        assert_eq!(eval("'A'").unwrap(), 65);
        assert!(eval("0xZZ").is_err());
    }

    #[test]
    fn symbols_and_current_address() {
        assert_eq!(eval("table + 4").unwrap(), 0x800F_8004);
        assert_eq!(eval("@local").unwrap(), 12);
        assert_eq!(eval(". + 8").unwrap(), 0x108);
        assert_eq!(eval("missing"), Err(ExprError::Undefined("missing".to_string())));
    }

    #[test]
    fn hi_lo_functions() {
        assert_eq!(eval("hi(table)").unwrap(), 0x8010);
        assert_eq!(eval("lo(table)").unwrap(), 0x8000);
        assert_eq!(eval("HI(0x80001234)").unwrap(), 0x8000);
    }

    #[test]
    fn constness() {
        assert!(parse_expr("4 * 8").unwrap().is_constant());
        assert!(!parse_expr("hi(table)").unwrap().is_constant());
    }

    #[test]
    fn malformed_expressions() {
        assert!(parse_expr("").is_err());
        assert!(parse_expr("(1 + 2").is_err());
        assert!(parse_expr("1 2").is_err());
    }
}
