use crate::interner::EidosStringId;
use crate::pool::ValueRc;
use crate::span::Span;
use std::sync::Arc;

/// The root of a parsed script: a sequence of top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterBlock {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression {
        expr: Expression,
        span: Span,
    },
    Compound {
        statements: Vec<Statement>,
        span: Span,
    },
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
        span: Span,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
        span: Span,
    },
    DoWhile {
        body: Box<Statement>,
        condition: Expression,
        span: Span,
    },
    For {
        variable: Arc<String>,
        variable_id: EidosStringId,
        range: Expression,
        body: Box<Statement>,
        span: Span,
    },
    Next {
        span: Span,
    },
    Break {
        span: Span,
    },
    Return {
        value: Option<Expression>,
        span: Span,
    },
    /// A lone `;`.
    Empty {
        span: Span,
    },
}

impl Statement {
    pub fn span(&self) -> &Span {
        match self {
            Statement::Expression { span, .. }
            | Statement::Compound { span, .. }
            | Statement::If { span, .. }
            | Statement::While { span, .. }
            | Statement::DoWhile { span, .. }
            | Statement::For { span, .. }
            | Statement::Next { span }
            | Statement::Break { span }
            | Statement::Return { span, .. }
            | Statement::Empty { span } => span,
        }
    }
}

/// One call argument, optionally keyword-named (`f(x, name=val)`).
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<Arc<String>>,
    pub value: Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal with its value cached at parse time; evaluation just clones
    /// the shared reference.
    Constant {
        value: ValueRc,
        span: Span,
    },
    Identifier {
        name: Arc<String>,
        id: EidosStringId,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
        span: Span,
    },
    /// The sequence operator `a:b`.
    Range {
        start: Box<Expression>,
        end: Box<Expression>,
        span: Span,
    },
    /// `cond ? a else b`.
    Ternary {
        condition: Box<Expression>,
        then_expr: Box<Expression>,
        else_expr: Box<Expression>,
        span: Span,
    },
    Assign {
        target: Box<Expression>,
        value: Box<Expression>,
        span: Span,
    },
    Subscript {
        object: Box<Expression>,
        index: Box<Expression>,
        span: Span,
    },
    Member {
        object: Box<Expression>,
        name: Arc<String>,
        id: EidosStringId,
        span: Span,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Argument>,
        span: Span,
    },
}

impl Expression {
    pub fn span(&self) -> &Span {
        match self {
            Expression::Constant { span, .. }
            | Expression::Identifier { span, .. }
            | Expression::Unary { span, .. }
            | Expression::Binary { span, .. }
            | Expression::Range { span, .. }
            | Expression::Ternary { span, .. }
            | Expression::Assign { span, .. }
            | Expression::Subscript { span, .. }
            | Expression::Member { span, .. }
            | Expression::Call { span, .. } => span,
        }
    }
}
