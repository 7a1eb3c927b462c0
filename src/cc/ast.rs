// C Abstract Syntax Tree

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Void,
    Char,
    Short,
    Int,
}

/// A scalar type with a pointer depth. Arrays decay to pointers everywhere
/// except in their declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CType {
    pub base: BaseType,
    pub unsigned: bool,
    pub pointers: u8,
}

impl CType {
    pub const INT: CType = CType {
        base: BaseType::Int,
        unsigned: false,
        pointers: 0,
    };

    pub const VOID: CType = CType {
        base: BaseType::Void,
        unsigned: false,
        pointers: 0,
    };

    pub fn is_pointer(&self) -> bool {
        self.pointers > 0
    }

    pub fn is_void(&self) -> bool {
        self.base == BaseType::Void && self.pointers == 0
    }

    /// Size in bytes of a value of this type.
    pub fn size(&self) -> u32 {
        if self.pointers > 0 {
            return 4;
        }
        match self.base {
            BaseType::Void => 1,
            BaseType::Char => 1,
            BaseType::Short => 2,
            BaseType::Int => 4,
        }
    }

    pub fn pointer_to(self) -> CType {
        CType {
            pointers: self.pointers + 1,
            ..self
        }
    }

    pub fn pointee(self) -> Option<CType> {
        if self.pointers == 0 {
            return None;
        }
        Some(CType {
            pointers: self.pointers - 1,
            ..self
        })
    }

    /// Step for pointer arithmetic and `++`/`--`.
    pub fn stride(&self) -> i64 {
        self.pointee().map_or(1, |t| t.size() as i64)
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.unsigned {
            write!(f, "unsigned ")?;
        }
        let base = match self.base {
            BaseType::Void => "void",
            BaseType::Char => "char",
            BaseType::Short => "short",
            BaseType::Int => "int",
        };
        write!(f, "{}{}", base, "*".repeat(self.pointers as usize))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn from_compound(op: &str) -> Option<BinaryOp> {
        Some(match op {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            "&" => BinaryOp::BitAnd,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            _ => return None,
        })
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
    Deref,
    AddressOf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(i64),
    Str(String),
    Identifier(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Assign(Box<Expr>, Box<Expr>),
    /// `a op= b`
    CompoundAssign(BinaryOp, Box<Expr>, Box<Expr>),
    /// `++x`/`--x` (prefix true) or `x++`/`x--`
    IncDec { target: Box<Expr>, delta: i64, prefix: bool },
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    Index(Box<Expr>, Box<Expr>),
    Cast(CType, Box<Expr>),
    SizeofType(CType),
    /// Left evaluated for effect, right is the value
    Comma(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: usize,
}

impl Expr {
    pub fn new(kind: ExprKind, line: usize) -> Self {
        Expr { kind, line }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: CType,
    /// Element count for array declarations
    pub array: Option<u32>,
    pub init: Option<Expr>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Declare(Vec<VarDecl>),
    Expression(Expr),
    Block(Vec<Stmt>),
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),
    While(Expr, Box<Stmt>),
    DoWhile(Box<Stmt>, Expr),
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    Return(Option<Expr>, usize),
    Break(usize),
    Continue(usize),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: CType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub return_type: CType,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GlobalInit {
    Scalar(i64),
    List(Vec<i64>),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Function(Function),
    /// Forward declaration of a function defined here or in the game
    Prototype { name: String, return_type: CType },
    /// Data that lives in the game, reached by symbol
    Extern { name: String, ty: CType, array: bool },
    Global {
        name: String,
        ty: CType,
        array: Option<u32>,
        init: Option<GlobalInit>,
        line: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub items: Vec<Item>,
}
