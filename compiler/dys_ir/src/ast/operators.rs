//! Operator enums.

use super::NodeKind;

/// Binary arithmetic and bitwise operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
}

impl BinaryOp {
    /// Operator symbol as written in source.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mult => "*",
            BinaryOp::MatMult => "@",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::LShift => "<<",
            BinaryOp::RShift => ">>",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
        }
    }

    pub fn node_kind(self) -> NodeKind {
        match self {
            BinaryOp::Add => NodeKind::Add,
            BinaryOp::Sub => NodeKind::Sub,
            BinaryOp::Mult => NodeKind::Mult,
            BinaryOp::MatMult => NodeKind::MatMult,
            BinaryOp::Div => NodeKind::Div,
            BinaryOp::FloorDiv => NodeKind::FloorDiv,
            BinaryOp::Mod => NodeKind::Mod,
            BinaryOp::Pow => NodeKind::Pow,
            BinaryOp::LShift => NodeKind::LShift,
            BinaryOp::RShift => NodeKind::RShift,
            BinaryOp::BitOr => NodeKind::BitOr,
            BinaryOp::BitXor => NodeKind::BitXor,
            BinaryOp::BitAnd => NodeKind::BitAnd,
        }
    }
}

/// Unary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Invert,
    Not,
    UAdd,
    USub,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Invert => "~",
            UnaryOp::Not => "not",
            UnaryOp::UAdd => "+",
            UnaryOp::USub => "-",
        }
    }

    pub fn node_kind(self) -> NodeKind {
        match self {
            UnaryOp::Invert => NodeKind::Invert,
            UnaryOp::Not => NodeKind::Not,
            UnaryOp::UAdd => NodeKind::UAdd,
            UnaryOp::USub => NodeKind::USub,
        }
    }
}

/// Short-circuit boolean operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn node_kind(self) -> NodeKind {
        match self {
            BoolOp::And => NodeKind::And,
            BoolOp::Or => NodeKind::Or,
        }
    }
}

/// Comparison operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        }
    }

    pub fn node_kind(self) -> NodeKind {
        match self {
            CmpOp::Eq => NodeKind::Eq,
            CmpOp::NotEq => NodeKind::NotEq,
            CmpOp::Lt => NodeKind::Lt,
            CmpOp::LtE => NodeKind::LtE,
            CmpOp::Gt => NodeKind::Gt,
            CmpOp::GtE => NodeKind::GtE,
            CmpOp::Is => NodeKind::Is,
            CmpOp::IsNot => NodeKind::IsNot,
            CmpOp::In => NodeKind::In,
            CmpOp::NotIn => NodeKind::NotIn,
        }
    }
}
