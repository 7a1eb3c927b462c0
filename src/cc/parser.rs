// C Recursive Descent Parser

use super::ast::*;
use super::error::CcError;
use super::lexer::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

/// Fold an initializer down to a constant.
pub fn const_eval(expr: &Expr) -> Option<i64> {
    match &expr.kind {
        ExprKind::Number(n) => Some(*n),
        ExprKind::SizeofType(ty) => Some(ty.size() as i64),
        ExprKind::Cast(_, inner) => const_eval(inner),
        ExprKind::Unary(op, inner) => {
            let v = const_eval(inner)?;
            match op {
                UnaryOp::Neg => Some(v.wrapping_neg()),
                UnaryOp::Not => Some((v == 0) as i64),
                UnaryOp::BitNot => Some(!v),
                _ => None,
            }
        }
        ExprKind::Binary(op, a, b) => {
            let a = const_eval(a)?;
            let b = const_eval(b)?;
            Some(match op {
                BinaryOp::Add => a.wrapping_add(b),
                BinaryOp::Sub => a.wrapping_sub(b),
                BinaryOp::Mul => a.wrapping_mul(b),
                BinaryOp::Div if b != 0 => a / b,
                BinaryOp::Mod if b != 0 => a % b,
                BinaryOp::Shl => a.wrapping_shl(b as u32),
                BinaryOp::Shr => a.wrapping_shr(b as u32),
                BinaryOp::BitAnd => a & b,
                BinaryOp::BitOr => a | b,
                BinaryOp::BitXor => a ^ b,
                BinaryOp::Eq => (a == b) as i64,
                BinaryOp::Ne => (a != b) as i64,
                BinaryOp::Lt => (a < b) as i64,
                BinaryOp::Le => (a <= b) as i64,
                BinaryOp::Gt => (a > b) as i64,
                BinaryOp::Ge => (a >= b) as i64,
                BinaryOp::And => (a != 0 && b != 0) as i64,
                BinaryOp::Or => (a != 0 || b != 0) as i64,
                _ => return None,
            })
        }
        _ => None,
    }
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Program, CcError> {
        let mut items = Vec::new();
        while !self.is_at_end() {
            if self.match_token(&TokenKind::Semicolon) {
                continue;
            }
            items.extend(self.parse_item()?);
        }
        Ok(Program { items })
    }

    // Helpers

    fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.current.min(last)]
    }

    fn peek_next(&self) -> Option<&Token> {
        self.tokens.get(self.current + 1)
    }

    fn line(&self) -> usize {
        self.peek().line
    }

    fn is_at_end(&self) -> bool {
        self.tokens.is_empty() || self.peek().kind == TokenKind::EOF
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        !self.tokens.is_empty() && &self.peek().kind == kind
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<(), CcError> {
        if self.check(&kind) {
            self.advance();
            Ok(())
        } else {
            let token = self.peek();
            Err(CcError::ExpectedToken(
                expected.to_string(),
                token.kind.describe(),
                token.line,
            ))
        }
    }

    fn consume_identifier(&mut self, expected: &str) -> Result<String, CcError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(CcError::ExpectedToken(
                expected.to_string(),
                other.describe(),
                token.line,
            )),
        }
    }

    fn is_type_start(kind: &TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Void
                | TokenKind::Char
                | TokenKind::Short
                | TokenKind::Int
                | TokenKind::Long
                | TokenKind::Signed
                | TokenKind::Unsigned
                | TokenKind::Const
                | TokenKind::Volatile
                | TokenKind::Static
                | TokenKind::Extern
        )
    }

    // Types

    /// Storage class and base type. Returns (is_extern, type).
    fn parse_specifiers(&mut self) -> Result<(bool, CType), CcError> {
        let line = self.line();
        let mut is_extern = false;
        let mut unsigned = false;
        let mut base: Option<BaseType> = None;
        let mut saw_sign = false;
        loop {
            match self.peek().kind {
                TokenKind::Extern => is_extern = true,
                TokenKind::Static | TokenKind::Const | TokenKind::Volatile => {}
                TokenKind::Signed => saw_sign = true,
                TokenKind::Unsigned => {
                    saw_sign = true;
                    unsigned = true;
                }
                TokenKind::Void => base = Some(BaseType::Void),
                TokenKind::Char => base = Some(BaseType::Char),
                TokenKind::Short => base = Some(BaseType::Short),
                TokenKind::Int => {
                    // `short int` stays short
                    if base.is_none() {
                        base = Some(BaseType::Int);
                    }
                }
                TokenKind::Long => base = Some(BaseType::Int),
                _ => break,
            }
            self.advance();
        }
        let base = match base {
            Some(base) => base,
            None if saw_sign => BaseType::Int,
            None => {
                return Err(CcError::ExpectedToken(
                    "a type".to_string(),
                    self.peek().kind.describe(),
                    line,
                ))
            }
        };
        Ok((
            is_extern,
            CType {
                base,
                unsigned,
                pointers: 0,
            },
        ))
    }

    fn parse_pointers(&mut self, mut ty: CType) -> CType {
        while self.match_token(&TokenKind::Star) {
            ty = ty.pointer_to();
            while self.match_token(&TokenKind::Const) || self.match_token(&TokenKind::Volatile) {}
        }
        ty
    }

    /// `[N]` or `[]` after a declarator name. `Some(None)` is an unsized array.
    fn parse_array_suffix(&mut self) -> Result<Option<Option<u32>>, CcError> {
        if !self.match_token(&TokenKind::LeftBracket) {
            return Ok(None);
        }
        if self.match_token(&TokenKind::RightBracket) {
            return Ok(Some(None));
        }
        let line = self.line();
        let size = self.parse_conditional()?;
        let size = const_eval(&size)
            .filter(|&n| n > 0)
            .ok_or_else(|| CcError::ParseError("array size must be a positive constant".to_string(), line))?;
        self.consume(TokenKind::RightBracket, "']'")?;
        Ok(Some(Some(size as u32)))
    }

    fn parse_type_name(&mut self) -> Result<CType, CcError> {
        let (_, ty) = self.parse_specifiers()?;
        Ok(self.parse_pointers(ty))
    }

    // Items

    fn parse_item(&mut self) -> Result<Vec<Item>, CcError> {
        let line = self.line();
        let (is_extern, base) = self.parse_specifiers()?;
        let mut items = Vec::new();
        loop {
            let ty = self.parse_pointers(base);
            let name = self.consume_identifier("a declaration name")?;

            if self.check(&TokenKind::LeftParen) {
                self.advance();
                let params = self.parse_params()?;
                if self.check(&TokenKind::LeftBrace) {
                    let body = self.parse_block()?;
                    items.push(Item::Function(Function {
                        name,
                        return_type: ty,
                        params,
                        body,
                        line,
                    }));
                    return Ok(items);
                }
                items.push(Item::Prototype {
                    name,
                    return_type: ty,
                });
            } else {
                let array = self.parse_array_suffix()?;
                if is_extern {
                    items.push(Item::Extern {
                        name,
                        ty,
                        array: array.is_some(),
                    });
                } else {
                    let init = if self.match_token(&TokenKind::Assign) {
                        Some(self.parse_global_init()?)
                    } else {
                        None
                    };
                    let array = match (array, &init) {
                        (None, _) => None,
                        (Some(Some(n)), _) => Some(n),
                        (Some(None), Some(GlobalInit::List(values))) => Some(values.len() as u32),
                        (Some(None), Some(GlobalInit::Str(text))) => Some(text.len() as u32 + 1),
                        (Some(None), _) => {
                            return Err(CcError::ParseError(
                                format!("size of array '{}' is unknown", name),
                                line,
                            ))
                        }
                    };
                    items.push(Item::Global {
                        name,
                        ty,
                        array,
                        init,
                        line,
                    });
                }
            }

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::Semicolon, "';'")?;
        Ok(items)
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, CcError> {
        let mut params = Vec::new();
        if self.match_token(&TokenKind::RightParen) {
            return Ok(params);
        }
        if self.check(&TokenKind::Void)
            && self.peek_next().map(|t| &t.kind) == Some(&TokenKind::RightParen)
        {
            self.advance();
            self.advance();
            return Ok(params);
        }
        loop {
            let ty = self.parse_type_name()?;
            let name = match &self.peek().kind {
                TokenKind::Identifier(name) => {
                    let name = name.clone();
                    self.advance();
                    name
                }
                _ => format!("arg{}", params.len()),
            };
            let ty = match self.parse_array_suffix()? {
                Some(_) => ty.pointer_to(),
                None => ty,
            };
            params.push(Param { name, ty });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RightParen, "')'")?;
        Ok(params)
    }

    fn parse_global_init(&mut self) -> Result<GlobalInit, CcError> {
        let line = self.line();
        if let TokenKind::Str(text) = &self.peek().kind {
            let text = text.clone();
            self.advance();
            return Ok(GlobalInit::Str(text));
        }
        if self.match_token(&TokenKind::LeftBrace) {
            let mut values = Vec::new();
            while !self.check(&TokenKind::RightBrace) {
                let expr = self.parse_conditional()?;
                values.push(const_eval(&expr).ok_or_else(|| {
                    CcError::ParseError("initializer must be constant".to_string(), expr.line)
                })?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.consume(TokenKind::RightBrace, "'}'")?;
            return Ok(GlobalInit::List(values));
        }
        let expr = self.parse_conditional()?;
        const_eval(&expr)
            .map(GlobalInit::Scalar)
            .ok_or_else(|| CcError::ParseError("initializer must be constant".to_string(), line))
    }

    // Statements

    fn parse_block(&mut self) -> Result<Vec<Stmt>, CcError> {
        self.consume(TokenKind::LeftBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            if self.is_at_end() {
                return Err(CcError::ExpectedToken(
                    "'}'".to_string(),
                    "end of input".to_string(),
                    self.line(),
                ));
            }
            statements.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RightBrace, "'}'")?;
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Stmt, CcError> {
        let line = self.line();
        match self.peek().kind.clone() {
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Semicolon => {
                self.advance();
                Ok(Stmt::Empty)
            }
            TokenKind::If => {
                self.advance();
                self.consume(TokenKind::LeftParen, "'(' after 'if'")?;
                let condition = self.parse_expression()?;
                self.consume(TokenKind::RightParen, "')'")?;
                let then = self.parse_statement()?;
                let otherwise = if self.match_token(&TokenKind::Else) {
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };
                Ok(Stmt::If(condition, Box::new(then), otherwise))
            }
            TokenKind::While => {
                self.advance();
                self.consume(TokenKind::LeftParen, "'(' after 'while'")?;
                let condition = self.parse_expression()?;
                self.consume(TokenKind::RightParen, "')'")?;
                Ok(Stmt::While(condition, Box::new(self.parse_statement()?)))
            }
            TokenKind::Do => {
                self.advance();
                let body = self.parse_statement()?;
                self.consume(TokenKind::While, "'while' after do body")?;
                self.consume(TokenKind::LeftParen, "'('")?;
                let condition = self.parse_expression()?;
                self.consume(TokenKind::RightParen, "')'")?;
                self.consume(TokenKind::Semicolon, "';'")?;
                Ok(Stmt::DoWhile(Box::new(body), condition))
            }
            TokenKind::For => {
                self.advance();
                self.consume(TokenKind::LeftParen, "'(' after 'for'")?;
                let init = if self.match_token(&TokenKind::Semicolon) {
                    None
                } else if Self::is_type_start(&self.peek().kind) {
                    Some(Box::new(self.parse_declaration()?))
                } else {
                    let expr = self.parse_expression()?;
                    self.consume(TokenKind::Semicolon, "';'")?;
                    Some(Box::new(Stmt::Expression(expr)))
                };
                let condition = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume(TokenKind::Semicolon, "';'")?;
                let step = if self.check(&TokenKind::RightParen) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume(TokenKind::RightParen, "')'")?;
                let body = Box::new(self.parse_statement()?);
                Ok(Stmt::For {
                    init,
                    condition,
                    step,
                    body,
                })
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume(TokenKind::Semicolon, "';' after return")?;
                Ok(Stmt::Return(value, line))
            }
            TokenKind::Break => {
                self.advance();
                self.consume(TokenKind::Semicolon, "';' after break")?;
                Ok(Stmt::Break(line))
            }
            TokenKind::Continue => {
                self.advance();
                self.consume(TokenKind::Semicolon, "';' after continue")?;
                Ok(Stmt::Continue(line))
            }
            kind if Self::is_type_start(&kind) => self.parse_declaration(),
            _ => {
                let expr = self.parse_expression()?;
                self.consume(TokenKind::Semicolon, "';'")?;
                Ok(Stmt::Expression(expr))
            }
        }
    }

    fn parse_declaration(&mut self) -> Result<Stmt, CcError> {
        let (is_extern, base) = self.parse_specifiers()?;
        if is_extern {
            return Err(CcError::ParseError(
                "extern declarations belong at file scope".to_string(),
                self.line(),
            ));
        }
        let mut decls = Vec::new();
        loop {
            let line = self.line();
            let ty = self.parse_pointers(base);
            let name = self.consume_identifier("a variable name")?;
            let array = match self.parse_array_suffix()? {
                Some(Some(n)) => Some(n),
                Some(None) => {
                    return Err(CcError::ParseError(
                        format!("local array '{}' needs a size", name),
                        line,
                    ))
                }
                None => None,
            };
            let init = if self.match_token(&TokenKind::Assign) {
                if array.is_some() {
                    return Err(CcError::ParseError(
                        format!("local array '{}' cannot be initialized", name),
                        line,
                    ));
                }
                Some(self.parse_assignment()?)
            } else {
                None
            };
            decls.push(VarDecl {
                name,
                ty,
                array,
                init,
                line,
            });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::Semicolon, "';'")?;
        Ok(Stmt::Declare(decls))
    }

    // Expressions

    pub fn parse_expression(&mut self) -> Result<Expr, CcError> {
        let mut expr = self.parse_assignment()?;
        while self.match_token(&TokenKind::Comma) {
            let right = self.parse_assignment()?;
            let line = expr.line;
            expr = Expr::new(ExprKind::Comma(Box::new(expr), Box::new(right)), line);
        }
        Ok(expr)
    }

    fn parse_assignment(&mut self) -> Result<Expr, CcError> {
        let target = self.parse_conditional()?;
        let line = target.line;
        match self.peek().kind.clone() {
            TokenKind::Assign => {
                self.advance();
                let value = self.parse_assignment()?;
                Ok(Expr::new(ExprKind::Assign(Box::new(target), Box::new(value)), line))
            }
            TokenKind::OpAssign(op) => {
                self.advance();
                let value = self.parse_assignment()?;
                let op = BinaryOp::from_compound(op).ok_or_else(|| {
                    CcError::ParseError(format!("unknown operator '{}='", op), line)
                })?;
                Ok(Expr::new(
                    ExprKind::CompoundAssign(op, Box::new(target), Box::new(value)),
                    line,
                ))
            }
            _ => Ok(target),
        }
    }

    fn parse_conditional(&mut self) -> Result<Expr, CcError> {
        let condition = self.parse_binary(0)?;
        if !self.match_token(&TokenKind::Question) {
            return Ok(condition);
        }
        let line = condition.line;
        let then = self.parse_expression()?;
        self.consume(TokenKind::Colon, "':' in conditional")?;
        let otherwise = self.parse_conditional()?;
        Ok(Expr::new(
            ExprKind::Conditional(Box::new(condition), Box::new(then), Box::new(otherwise)),
            line,
        ))
    }

    fn binary_op(kind: &TokenKind, level: usize) -> Option<BinaryOp> {
        let op = match (level, kind) {
            (0, TokenKind::OrOr) => BinaryOp::Or,
            (1, TokenKind::AndAnd) => BinaryOp::And,
            (2, TokenKind::Pipe) => BinaryOp::BitOr,
            (3, TokenKind::Caret) => BinaryOp::BitXor,
            (4, TokenKind::Amp) => BinaryOp::BitAnd,
            (5, TokenKind::EqualEqual) => BinaryOp::Eq,
            (5, TokenKind::NotEqual) => BinaryOp::Ne,
            (6, TokenKind::Less) => BinaryOp::Lt,
            (6, TokenKind::LessEqual) => BinaryOp::Le,
            (6, TokenKind::Greater) => BinaryOp::Gt,
            (6, TokenKind::GreaterEqual) => BinaryOp::Ge,
            (7, TokenKind::Shl) => BinaryOp::Shl,
            (7, TokenKind::Shr) => BinaryOp::Shr,
            (8, TokenKind::Plus) => BinaryOp::Add,
            (8, TokenKind::Minus) => BinaryOp::Sub,
            (9, TokenKind::Star) => BinaryOp::Mul,
            (9, TokenKind::Slash) => BinaryOp::Div,
            (9, TokenKind::Percent) => BinaryOp::Mod,
            _ => return None,
        };
        Some(op)
    }

    fn parse_binary(&mut self, level: usize) -> Result<Expr, CcError> {
        if level > 9 {
            return self.parse_unary();
        }
        let mut left = self.parse_binary(level + 1)?;
        while let Some(op) = Self::binary_op(&self.peek().kind, level) {
            self.advance();
            let right = self.parse_binary(level + 1)?;
            let line = left.line;
            left = Expr::new(ExprKind::Binary(op, Box::new(left), Box::new(right)), line);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, CcError> {
        let line = self.line();
        let unary = |op: UnaryOp, operand: Expr| Expr::new(ExprKind::Unary(op, Box::new(operand)), line);
        match self.peek().kind.clone() {
            TokenKind::Minus => {
                self.advance();
                Ok(unary(UnaryOp::Neg, self.parse_unary()?))
            }
            TokenKind::Plus => {
                self.advance();
                self.parse_unary()
            }
            TokenKind::Not => {
                self.advance();
                Ok(unary(UnaryOp::Not, self.parse_unary()?))
            }
            TokenKind::Tilde => {
                self.advance();
                Ok(unary(UnaryOp::BitNot, self.parse_unary()?))
            }
            TokenKind::Star => {
                self.advance();
                Ok(unary(UnaryOp::Deref, self.parse_unary()?))
            }
            TokenKind::Amp => {
                self.advance();
                Ok(unary(UnaryOp::AddressOf, self.parse_unary()?))
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let delta = if self.advance().kind == TokenKind::PlusPlus { 1 } else { -1 };
                let target = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::IncDec {
                        target: Box::new(target),
                        delta,
                        prefix: true,
                    },
                    line,
                ))
            }
            TokenKind::Sizeof => {
                self.advance();
                let is_type = self.check(&TokenKind::LeftParen)
                    && self
                        .peek_next()
                        .map_or(false, |t| Self::is_type_start(&t.kind));
                if is_type {
                    self.advance();
                    let ty = self.parse_type_name()?;
                    self.consume(TokenKind::RightParen, "')'")?;
                    return Ok(Expr::new(ExprKind::SizeofType(ty), line));
                }
                Err(CcError::ParseError(
                    "sizeof is only supported on type names".to_string(),
                    line,
                ))
            }
            TokenKind::LeftParen
                if self
                    .peek_next()
                    .map_or(false, |t| Self::is_type_start(&t.kind)) =>
            {
                self.advance();
                let ty = self.parse_type_name()?;
                self.consume(TokenKind::RightParen, "')' after cast type")?;
                let operand = self.parse_unary()?;
                Ok(Expr::new(ExprKind::Cast(ty, Box::new(operand)), line))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, CcError> {
        let mut expr = self.parse_primary()?;
        loop {
            let line = self.line();
            match self.peek().kind {
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.consume(TokenKind::RightBracket, "']'")?;
                    expr = Expr::new(ExprKind::Index(Box::new(expr), Box::new(index)), line);
                }
                TokenKind::LeftParen => {
                    self.advance();
                    let name = match &expr.kind {
                        ExprKind::Identifier(name) => name.clone(),
                        _ => {
                            return Err(CcError::ParseError(
                                "only named functions can be called".to_string(),
                                line,
                            ))
                        }
                    };
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RightParen) {
                        loop {
                            args.push(self.parse_assignment()?);
                            if !self.match_token(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.consume(TokenKind::RightParen, "')' after arguments")?;
                    expr = Expr::new(ExprKind::Call(name, args), expr.line);
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let delta = if self.advance().kind == TokenKind::PlusPlus { 1 } else { -1 };
                    expr = Expr::new(
                        ExprKind::IncDec {
                            target: Box::new(expr),
                            delta,
                            prefix: false,
                        },
                        line,
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, CcError> {
        let token = self.advance();
        let line = token.line;
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::new(ExprKind::Number(n), line)),
            TokenKind::Str(mut text) => {
                // Adjacent literals concatenate
                while let TokenKind::Str(more) = &self.peek().kind {
                    text.push_str(more);
                    self.advance();
                }
                Ok(Expr::new(ExprKind::Str(text), line))
            }
            TokenKind::Identifier(name) => Ok(Expr::new(ExprKind::Identifier(name), line)),
            TokenKind::LeftParen => {
                let inner = self.parse_expression()?;
                self.consume(TokenKind::RightParen, "')'")?;
                Ok(inner)
            }
            other => Err(CcError::ExpectedToken(
                "an expression".to_string(),
                other.describe(),
                line,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cc::lexer::tokenize;
    use test_log::test;

    fn parse(source: &str) -> Program {
        Parser::new(tokenize(source).unwrap()).parse().unwrap()
    }

    fn parse_err(source: &str) -> CcError {
        Parser::new(tokenize(source).unwrap()).parse().unwrap_err()
    }

    #[test]
    fn function_with_locals_and_loops() {
        let program = parse(
            "int main() {\n  int i, total = 0;\n  for (i = 0; i < 4; i++) total += i;\n  return total;\n}",
        );
        let Item::Function(main) = &program.items[0] else {
            panic!("expected a function");
        };
        assert_eq!(main.name, "main");
        assert_eq!(main.body.len(), 3);
        assert!(matches!(main.body[1], Stmt::For { .. }));
    }

    #[test]
    fn externs_prototypes_and_globals() {
        let program = parse(
            "extern s16 CurrentPlayerIndex;\nvoid PlaySound(int id);\nu8 table[] = {1, 2, 3};\nchar msg[] = \"hi\";",
        );
        assert!(matches!(
            &program.items[0],
            Item::Extern { name, ty, array: false } if name == "CurrentPlayerIndex" && ty.base == BaseType::Short
        ));
        assert!(matches!(&program.items[1], Item::Prototype { name, .. } if name == "PlaySound"));
        assert!(matches!(
            &program.items[2],
            Item::Global { array: Some(3), ty, .. } if ty.unsigned && ty.base == BaseType::Char
        ));
        assert!(matches!(&program.items[3], Item::Global { array: Some(3), .. }));
    }

    #[test]
    fn precedence_and_casts() {
        let program = parse("int main() { return (u8)a + b * 2 == 3 || !c; }");
        let Item::Function(main) = &program.items[0] else {
            panic!("expected a function");
        };
        let Stmt::Return(Some(expr), _) = &main.body[0] else {
            panic!("expected return");
        };
        let ExprKind::Binary(BinaryOp::Or, left, _) = &expr.kind else {
            panic!("|| should bind loosest: {:?}", expr);
        };
        assert!(matches!(left.kind, ExprKind::Binary(BinaryOp::Eq, _, _)));
    }

    #[test]
    fn constant_folding_for_initializers() {
        let program = parse("int mask = (1 << 4) | 3;");
        assert!(matches!(
            &program.items[0],
            Item::Global { init: Some(GlobalInit::Scalar(19)), .. }
        ));
    }

    #[test]
    fn syntax_errors_name_the_line() {
        let err = parse_err("int main() {\n  return 1\n}");
        assert_eq!(err.line(), Some(3));
        assert!(err.to_string().contains("';' after return"));
        assert!(matches!(parse_err("int x = y;"), CcError::ParseError(_, 1)));
    }
}
