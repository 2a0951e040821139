//! Syntax tree for the supported JavaScript subset

use crate::core::value::Value;
use std::rc::Rc;

/// A parsed function: parameters plus a pre-parsed body
///
/// Function literals nested in the body are parsed once, here, and shared by
/// every closure later created from them.
#[derive(Debug)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug)]
pub enum Stmt {
    Empty,
    Expr(Expr),
    Var(Vec<VarDecl>),
    Return(Option<Expr>),
    Throw(Expr),
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    Switch {
        selector: Expr,
        cases: Vec<SwitchCase>,
    },
    Try {
        body: Vec<Stmt>,
        catch: Option<CatchClause>,
        finally: Option<Vec<Stmt>>,
    },
    Break,
    Continue,
}

#[derive(Debug)]
pub struct VarDecl {
    pub name: String,
    pub init: Option<Expr>,
}

/// One `case` clause; a `None` label is the `default` clause
#[derive(Debug)]
pub struct SwitchCase {
    pub label: Option<Expr>,
    pub body: Vec<Stmt>,
}

/// A `catch` clause. Its body is never executed, so only the binding is kept.
#[derive(Debug)]
pub struct CatchClause {
    pub param: Option<String>,
}

#[derive(Debug)]
pub enum Expr {
    Literal(Literal),
    Ident(String),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Function(Rc<FunctionDef>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `++x`, `x--`, ... on a bare identifier
    Update {
        op: UpdateOp,
        prefix: bool,
        name: String,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    /// `name = v`, `name[i] = v` and compound forms like `name += v`
    Assign {
        name: String,
        index: Option<Box<Expr>>,
        op: Option<BinaryOp>,
        value: Box<Expr>,
    },
    Sequence(Vec<Expr>),
    Member {
        object: Box<Expr>,
        property: Property,
        optional: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
}

#[derive(Debug)]
pub enum Property {
    Name(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Undefined => Value::Undefined,
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Nullish,
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    StrictEq,
    StrictNe,
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
    Shr,
    Shl,
    Sub,
    Add,
    Mod,
    Div,
    Mul,
    Pow,
}

impl BinaryOp {
    /// Order in which expressions are scanned for a top-level operator
    ///
    /// This is a fixed textual scan order, not JavaScript precedence. The
    /// `| ^ & >> << - + % / *` core must stay in exactly this order for
    /// deciphering routines to produce the same output.
    pub const SCAN_ORDER: [BinaryOp; 22] = [
        BinaryOp::Nullish,
        BinaryOp::Or,
        BinaryOp::And,
        BinaryOp::BitOr,
        BinaryOp::BitXor,
        BinaryOp::BitAnd,
        BinaryOp::StrictEq,
        BinaryOp::StrictNe,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Le,
        BinaryOp::Ge,
        BinaryOp::Lt,
        BinaryOp::Gt,
        BinaryOp::Shr,
        BinaryOp::Shl,
        BinaryOp::Sub,
        BinaryOp::Add,
        BinaryOp::Mod,
        BinaryOp::Div,
        BinaryOp::Mul,
        BinaryOp::Pow,
    ];

    pub fn token(self) -> &'static str {
        match self {
            BinaryOp::Nullish => "??",
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNe => "!==",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Shr => ">>",
            BinaryOp::Shl => "<<",
            BinaryOp::Sub => "-",
            BinaryOp::Add => "+",
            BinaryOp::Mod => "%",
            BinaryOp::Div => "/",
            BinaryOp::Mul => "*",
            BinaryOp::Pow => "**",
        }
    }

    /// Decode an assignment token: `Some(None)` for `=`, `Some(Some(op))` for `op=`
    pub fn from_assign_token(token: &str) -> Option<Option<BinaryOp>> {
        let op = match token {
            "=" => return Some(None),
            "+=" => BinaryOp::Add,
            "-=" => BinaryOp::Sub,
            "*=" => BinaryOp::Mul,
            "/=" => BinaryOp::Div,
            "%=" => BinaryOp::Mod,
            "**=" => BinaryOp::Pow,
            "&=" => BinaryOp::BitAnd,
            "|=" => BinaryOp::BitOr,
            "^=" => BinaryOp::BitXor,
            "<<=" => BinaryOp::Shl,
            ">>=" => BinaryOp::Shr,
            _ => return None,
        };
        Some(Some(op))
    }

    /// Operators whose right operand is only evaluated on demand
    pub fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOp::Nullish | BinaryOp::Or | BinaryOp::And)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_order_keeps_core_sequence() {
        let core: Vec<&str> = BinaryOp::SCAN_ORDER
            .iter()
            .map(|op| op.token())
            .filter(|t| ["|", "^", "&", ">>", "<<", "-", "+", "%", "/", "*"].contains(t))
            .collect();
        assert_eq!(core, vec!["|", "^", "&", ">>", "<<", "-", "+", "%", "/", "*"]);
    }

    #[test]
    fn test_from_assign_token() {
        assert_eq!(BinaryOp::from_assign_token("="), Some(None));
        assert_eq!(BinaryOp::from_assign_token("+="), Some(Some(BinaryOp::Add)));
        assert_eq!(BinaryOp::from_assign_token("=="), None);
    }

    #[test]
    fn test_literal_to_value() {
        assert_eq!(Literal::Number(3.0).to_value(), Value::from(3));
        assert_eq!(Literal::String("a".into()).to_value(), Value::from("a"));
        assert_eq!(Literal::Undefined.to_value(), Value::Undefined);
    }
}
