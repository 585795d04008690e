use eidos_core::{
    global_id_for_string, pool, Argument, BinaryOp, EidosError, EidosResult, EidosValue,
    Expression, InterpreterBlock, Span, Statement, Token, TokenKind, UnaryOp,
};
use std::rc::Rc;
use std::sync::Arc;

const SITE_PARSE: &str = "Parser::parse";

/// Recursive-descent parser producing the interpreter-block AST.
///
/// Precedence, loosest to tightest: assignment (right-assoc), ternary
/// `? else`, `|`, `&`, `!`, equality, relational, `:`, additive,
/// multiplicative, unary sign, `^` (right-assoc), postfix `[] . ()`.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    final_semicolon_optional: bool,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            final_semicolon_optional: false,
        }
    }

    pub fn new_with_options(tokens: Vec<Token>, final_semicolon_optional: bool) -> Self {
        Self {
            tokens,
            pos: 0,
            final_semicolon_optional,
        }
    }

    pub fn parse_interpreter_block(&mut self) -> EidosResult<InterpreterBlock> {
        let start_span = self.current().span;
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        let span = statements
            .last()
            .map(|s: &Statement| start_span.merge(s.span()))
            .unwrap_or(start_span);

        Ok(InterpreterBlock { statements, span })
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn is_at_end(&self) -> bool {
        self.current().is_eof()
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> EidosResult<Span> {
        if self.check(&kind) {
            Ok(self.advance().span)
        } else {
            let found = self.current();
            Err(EidosError::parse(
                SITE_PARSE,
                format!(
                    "unexpected token {}; expected {}.",
                    found.kind.describe(),
                    kind.describe()
                ),
                found.span,
            ))
        }
    }

    /// A statement terminator: `;`, or nothing when the final semicolon is
    /// optional and the script is at its end.
    fn expect_statement_terminator(&mut self) -> EidosResult<()> {
        if self.check(&TokenKind::Semicolon) {
            self.advance();
            return Ok(());
        }
        if self.final_semicolon_optional && self.is_at_end() {
            return Ok(());
        }
        let found = self.current();
        Err(EidosError::parse(
            SITE_PARSE,
            format!("unexpected token {}; expected ';'.", found.kind.describe()),
            found.span,
        ))
    }

    fn parse_statement(&mut self) -> EidosResult<Statement> {
        match &self.current().kind {
            TokenKind::LBrace => self.parse_compound(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Next => {
                let span = self.advance().span;
                self.expect_statement_terminator()?;
                Ok(Statement::Next { span })
            }
            TokenKind::Break => {
                let span = self.advance().span;
                self.expect_statement_terminator()?;
                Ok(Statement::Break { span })
            }
            TokenKind::Return => self.parse_return(),
            TokenKind::Semicolon => {
                let span = self.advance().span;
                Ok(Statement::Empty { span })
            }
            _ => {
                let expr = self.parse_expression()?;
                let span = *expr.span();
                self.expect_statement_terminator()?;
                Ok(Statement::Expression { expr, span })
            }
        }
    }

    fn parse_compound(&mut self) -> EidosResult<Statement> {
        let start_span = self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        let end_span = self.expect(TokenKind::RBrace)?;
        Ok(Statement::Compound {
            statements,
            span: start_span.merge(&end_span),
        })
    }

    fn parse_if(&mut self) -> EidosResult<Statement> {
        let start_span = self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        let then_branch = Box::new(self.parse_statement()?);
        let mut span = start_span.merge(then_branch.span());

        let else_branch = if self.check(&TokenKind::Else) {
            self.advance();
            let branch = Box::new(self.parse_statement()?);
            span = span.merge(branch.span());
            Some(branch)
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
            span,
        })
    }

    fn parse_while(&mut self) -> EidosResult<Statement> {
        let start_span = self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        let body = Box::new(self.parse_statement()?);
        let span = start_span.merge(body.span());

        Ok(Statement::While {
            condition,
            body,
            span,
        })
    }

    fn parse_do_while(&mut self) -> EidosResult<Statement> {
        let start_span = self.expect(TokenKind::Do)?;
        let body = Box::new(self.parse_statement()?);

        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        let end_span = self.expect(TokenKind::RParen)?;
        self.expect_statement_terminator()?;

        Ok(Statement::DoWhile {
            body,
            condition,
            span: start_span.merge(&end_span),
        })
    }

    fn parse_for(&mut self) -> EidosResult<Statement> {
        let start_span = self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;

        let variable = self.expect_identifier()?;
        let variable_id = global_id_for_string(&variable);
        self.expect(TokenKind::In)?;
        let range = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        let body = Box::new(self.parse_statement()?);
        let span = start_span.merge(body.span());

        Ok(Statement::For {
            variable,
            variable_id,
            range,
            body,
            span,
        })
    }

    fn parse_return(&mut self) -> EidosResult<Statement> {
        let span = self.expect(TokenKind::Return)?;

        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else if self.final_semicolon_optional && self.is_at_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_statement_terminator()?;

        Ok(Statement::Return { value, span })
    }

    fn expect_identifier(&mut self) -> EidosResult<Arc<String>> {
        match &self.current().kind {
            TokenKind::Identifier(name) => {
                let name = Arc::clone(name);
                self.advance();
                Ok(name)
            }
            other => Err(EidosError::parse(
                SITE_PARSE,
                format!("unexpected token {}; expected an identifier.", other.describe()),
                self.current().span,
            )),
        }
    }

    pub fn parse_expression(&mut self) -> EidosResult<Expression> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> EidosResult<Expression> {
        let target = self.parse_ternary()?;

        if self.check(&TokenKind::Assign) {
            self.advance();
            let value = self.parse_assignment()?;
            let span = target.span().merge(value.span());
            return Ok(Expression::Assign {
                target: Box::new(target),
                value: Box::new(value),
                span,
            });
        }

        Ok(target)
    }

    fn parse_ternary(&mut self) -> EidosResult<Expression> {
        let condition = self.parse_or()?;

        if self.check(&TokenKind::Question) {
            self.advance();
            let then_expr = self.parse_ternary()?;
            self.expect(TokenKind::Else)?;
            let else_expr = self.parse_ternary()?;
            let span = condition.span().merge(else_expr.span());
            return Ok(Expression::Ternary {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
                span,
            });
        }

        Ok(condition)
    }

    fn parse_or(&mut self) -> EidosResult<Expression> {
        let mut left = self.parse_and()?;
        while self.check(&TokenKind::Pipe) {
            self.advance();
            let right = self.parse_and()?;
            let span = left.span().merge(right.span());
            left = Expression::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> EidosResult<Expression> {
        let mut left = self.parse_not()?;
        while self.check(&TokenKind::Amp) {
            self.advance();
            let right = self.parse_not()?;
            let span = left.span().merge(right.span());
            left = Expression::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> EidosResult<Expression> {
        if self.check(&TokenKind::Bang) {
            let start_span = self.advance().span;
            let operand = self.parse_not()?;
            let span = start_span.merge(operand.span());
            return Ok(Expression::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                span,
            });
        }
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> EidosResult<Expression> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match &self.current().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            let span = left.span().merge(right.span());
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> EidosResult<Expression> {
        let mut left = self.parse_range()?;
        loop {
            let op = match &self.current().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_range()?;
            let span = left.span().merge(right.span());
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_range(&mut self) -> EidosResult<Expression> {
        let start = self.parse_additive()?;
        if self.check(&TokenKind::Colon) {
            self.advance();
            let end = self.parse_additive()?;
            let span = start.span().merge(end.span());
            return Ok(Expression::Range {
                start: Box::new(start),
                end: Box::new(end),
                span,
            });
        }
        Ok(start)
    }

    fn parse_additive(&mut self) -> EidosResult<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match &self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            let span = left.span().merge(right.span());
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> EidosResult<Expression> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match &self.current().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            let span = left.span().merge(right.span());
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> EidosResult<Expression> {
        let op = match &self.current().kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            _ => None,
        };

        if let Some(op) = op {
            let start_span = self.advance().span;
            // Sign binds looser than `^`, so -2^2 negates the power.
            let operand = self.parse_unary()?;
            let span = start_span.merge(operand.span());
            return Ok(Expression::Unary {
                op,
                operand: Box::new(operand),
                span,
            });
        }

        self.parse_power()
    }

    fn parse_power(&mut self) -> EidosResult<Expression> {
        let base = self.parse_postfix()?;
        if self.check(&TokenKind::Caret) {
            self.advance();
            // Right-associative; the exponent may carry its own sign.
            let exponent = self.parse_unary()?;
            let span = base.span().merge(exponent.span());
            return Ok(Expression::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
                span,
            });
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> EidosResult<Expression> {
        let mut expr = self.parse_primary()?;

        loop {
            match &self.current().kind {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let end_span = self.expect(TokenKind::RBracket)?;
                    let span = expr.span().merge(&end_span);
                    expr = Expression::Subscript {
                        object: Box::new(expr),
                        index: Box::new(index),
                        span,
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let name_span = self.current().span;
                    let name = self.expect_identifier()?;
                    let id = global_id_for_string(&name);
                    let span = expr.span().merge(&name_span);
                    expr = Expression::Member {
                        object: Box::new(expr),
                        name,
                        id,
                        span,
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_arguments()?;
                    let end_span = self.expect(TokenKind::RParen)?;
                    let span = expr.span().merge(&end_span);
                    expr = Expression::Call {
                        callee: Box::new(expr),
                        args,
                        span,
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_arguments(&mut self) -> EidosResult<Vec<Argument>> {
        let mut args = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }

        loop {
            // `name=value` is a keyword argument; `==` after the identifier
            // is an ordinary comparison and falls through.
            let keyword = match &self.current().kind {
                TokenKind::Identifier(name)
                    if self.tokens.get(self.pos + 1).map(|t| &t.kind)
                        == Some(&TokenKind::Assign) =>
                {
                    let name = Arc::clone(name);
                    self.advance();
                    self.advance();
                    Some(name)
                }
                _ => None,
            };

            let value = self.parse_expression()?;
            args.push(Argument {
                name: keyword,
                value,
            });

            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        Ok(args)
    }

    fn parse_primary(&mut self) -> EidosResult<Expression> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Integer(n) => {
                self.advance();
                let value = pool::static_integer(n).unwrap_or_else(|| Rc::new(EidosValue::integer(n)));
                Ok(Expression::Constant {
                    value,
                    span: token.span,
                })
            }
            TokenKind::Float(x) => {
                self.advance();
                let value = pool::static_float(x).unwrap_or_else(|| Rc::new(EidosValue::float(x)));
                Ok(Expression::Constant {
                    value,
                    span: token.span,
                })
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expression::Constant {
                    value: Rc::new(EidosValue::string(s.as_str())),
                    span: token.span,
                })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                let id = global_id_for_string(&name);
                Ok(Expression::Identifier {
                    name,
                    id,
                    span: token.span,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            other => Err(EidosError::parse(
                SITE_PARSE,
                format!("unexpected token {}; expected an expression.", other.describe()),
                token.span,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> EidosResult<InterpreterBlock> {
        let tokens = Lexer::new(source).tokenize()?;
        Parser::new(tokens).parse_interpreter_block()
    }

    fn single_expression(source: &str) -> Expression {
        let block = parse(source).unwrap();
        match block.statements.into_iter().next() {
            Some(Statement::Expression { expr, .. }) => expr,
            other => panic!("expected an expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_arithmetic_over_range() {
        // `:` binds looser than `+`, so 1:3+1 is 1:(3+1).
        let expr = single_expression("1:3+1;");
        match expr {
            Expression::Range { end, .. } => {
                assert!(matches!(*end, Expression::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("expected a range, got {:?}", other),
        }
    }

    #[test]
    fn test_power_binds_tighter_than_sign() {
        let expr = single_expression("-2^2;");
        match expr {
            Expression::Unary { op: UnaryOp::Neg, operand, .. } => {
                assert!(matches!(*operand, Expression::Binary { op: BinaryOp::Pow, .. }));
            }
            other => panic!("expected unary minus over power, got {:?}", other),
        }
    }

    #[test]
    fn test_not_binds_looser_than_comparison() {
        let expr = single_expression("!1 == 2;");
        match expr {
            Expression::Unary { op: UnaryOp::Not, operand, .. } => {
                assert!(matches!(*operand, Expression::Binary { op: BinaryOp::Eq, .. }));
            }
            other => panic!("expected not over comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let expr = single_expression("x = y = 1;");
        match expr {
            Expression::Assign { value, .. } => {
                assert!(matches!(*value, Expression::Assign { .. }));
            }
            other => panic!("expected nested assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_postfix_chain() {
        let expr = single_expression("x[0].prop;");
        match expr {
            Expression::Member { object, name, .. } => {
                assert_eq!(name.as_str(), "prop");
                assert!(matches!(*object, Expression::Subscript { .. }));
            }
            other => panic!("expected member of subscript, got {:?}", other),
        }
    }

    #[test]
    fn test_keyword_arguments() {
        let expr = single_expression("seq(1, 10, by=2);");
        match expr {
            Expression::Call { args, .. } => {
                assert_eq!(args.len(), 3);
                assert!(args[0].name.is_none());
                assert_eq!(args[2].name.as_deref().map(|s| s.as_str()), Some("by"));
            }
            other => panic!("expected a call, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_expression_error_has_span() {
        let source = "x = 1 + ;";
        let err = parse(source).unwrap_err();
        let span = err.span().expect("parse error carries a span");
        assert_eq!(span.start, source.find(';').unwrap());
    }

    #[test]
    fn test_final_semicolon_optional() {
        let tokens = Lexer::new("1 + 2").tokenize().unwrap();
        assert!(Parser::new(tokens.clone()).parse_interpreter_block().is_err());
        assert!(Parser::new_with_options(tokens, true)
            .parse_interpreter_block()
            .is_ok());
    }

    #[test]
    fn test_control_flow_statements() {
        assert!(parse("if (T) x = 1; else x = 2;").is_ok());
        assert!(parse("while (x < 10) { x = x + 1; }").is_ok());
        assert!(parse("do x = x + 1; while (x < 10);").is_ok());
        assert!(parse("for (i in 1:10) { next; }").is_ok());
        assert!(parse("return 5;").is_ok());
    }
}
