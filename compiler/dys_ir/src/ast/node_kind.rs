//! Flat node-kind tags.
//!
//! Every element of the tree (statements, expressions, operators, and the
//! helper nodes such as `arg` or `keyword`) has a tag here. The validator
//! checks tags against the evaluator's supported set, and tracking hooks
//! report them by name.

/// Kind tag of one program tree element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    // Root
    Module,

    // Statements
    FunctionDef,
    AsyncFunctionDef,
    ClassDef,
    Return,
    Delete,
    Assign,
    AugAssign,
    AnnAssign,
    For,
    AsyncFor,
    While,
    If,
    With,
    AsyncWith,
    Raise,
    Try,
    Assert,
    Import,
    ImportFrom,
    Global,
    Nonlocal,
    Expr,
    Pass,
    Break,
    Continue,

    // Expressions
    BoolOp,
    NamedExpr,
    BinOp,
    UnaryOp,
    Lambda,
    IfExp,
    Dict,
    Set,
    ListComp,
    SetComp,
    DictComp,
    GeneratorExp,
    Await,
    Yield,
    YieldFrom,
    Compare,
    Call,
    FormattedValue,
    JoinedStr,
    Constant,
    Attribute,
    Subscript,
    Starred,
    Name,
    List,
    Tuple,
    Slice,

    // Boolean operators
    And,
    Or,

    // Binary operators
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
    FloorDiv,

    // Unary operators
    Invert,
    Not,
    UAdd,
    USub,

    // Comparison operators
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

    // Helper nodes
    ExceptHandler,
    Arguments,
    Arg,
    Keyword,
    Alias,
    Comprehension,
    WithItem,

    // Expression contexts
    Load,
    Store,
    Del,
}

impl NodeKind {
    /// Name of the node kind, as reported to tracking callbacks.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Module => "Module",
            NodeKind::FunctionDef => "FunctionDef",
            NodeKind::AsyncFunctionDef => "AsyncFunctionDef",
            NodeKind::ClassDef => "ClassDef",
            NodeKind::Return => "Return",
            NodeKind::Delete => "Delete",
            NodeKind::Assign => "Assign",
            NodeKind::AugAssign => "AugAssign",
            NodeKind::AnnAssign => "AnnAssign",
            NodeKind::For => "For",
            NodeKind::AsyncFor => "AsyncFor",
            NodeKind::While => "While",
            NodeKind::If => "If",
            NodeKind::With => "With",
            NodeKind::AsyncWith => "AsyncWith",
            NodeKind::Raise => "Raise",
            NodeKind::Try => "Try",
            NodeKind::Assert => "Assert",
            NodeKind::Import => "Import",
            NodeKind::ImportFrom => "ImportFrom",
            NodeKind::Global => "Global",
            NodeKind::Nonlocal => "Nonlocal",
            NodeKind::Expr => "Expr",
            NodeKind::Pass => "Pass",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::BoolOp => "BoolOp",
            NodeKind::NamedExpr => "NamedExpr",
            NodeKind::BinOp => "BinOp",
            NodeKind::UnaryOp => "UnaryOp",
            NodeKind::Lambda => "Lambda",
            NodeKind::IfExp => "IfExp",
            NodeKind::Dict => "Dict",
            NodeKind::Set => "Set",
            NodeKind::ListComp => "ListComp",
            NodeKind::SetComp => "SetComp",
            NodeKind::DictComp => "DictComp",
            NodeKind::GeneratorExp => "GeneratorExp",
            NodeKind::Await => "Await",
            NodeKind::Yield => "Yield",
            NodeKind::YieldFrom => "YieldFrom",
            NodeKind::Compare => "Compare",
            NodeKind::Call => "Call",
            NodeKind::FormattedValue => "FormattedValue",
            NodeKind::JoinedStr => "JoinedStr",
            NodeKind::Constant => "Constant",
            NodeKind::Attribute => "Attribute",
            NodeKind::Subscript => "Subscript",
            NodeKind::Starred => "Starred",
            NodeKind::Name => "Name",
            NodeKind::List => "List",
            NodeKind::Tuple => "Tuple",
            NodeKind::Slice => "Slice",
            NodeKind::And => "And",
            NodeKind::Or => "Or",
            NodeKind::Add => "Add",
            NodeKind::Sub => "Sub",
            NodeKind::Mult => "Mult",
            NodeKind::MatMult => "MatMult",
            NodeKind::Div => "Div",
            NodeKind::Mod => "Mod",
            NodeKind::Pow => "Pow",
            NodeKind::LShift => "LShift",
            NodeKind::RShift => "RShift",
            NodeKind::BitOr => "BitOr",
            NodeKind::BitXor => "BitXor",
            NodeKind::BitAnd => "BitAnd",
            NodeKind::FloorDiv => "FloorDiv",
            NodeKind::Invert => "Invert",
            NodeKind::Not => "Not",
            NodeKind::UAdd => "UAdd",
            NodeKind::USub => "USub",
            NodeKind::Eq => "Eq",
            NodeKind::NotEq => "NotEq",
            NodeKind::Lt => "Lt",
            NodeKind::LtE => "LtE",
            NodeKind::Gt => "Gt",
            NodeKind::GtE => "GtE",
            NodeKind::Is => "Is",
            NodeKind::IsNot => "IsNot",
            NodeKind::In => "In",
            NodeKind::NotIn => "NotIn",
            NodeKind::ExceptHandler => "ExceptHandler",
            NodeKind::Arguments => "arguments",
            NodeKind::Arg => "arg",
            NodeKind::Keyword => "keyword",
            NodeKind::Alias => "alias",
            NodeKind::Comprehension => "comprehension",
            NodeKind::WithItem => "withitem",
            NodeKind::Load => "Load",
            NodeKind::Store => "Store",
            NodeKind::Del => "Del",
        }
    }

    /// Whether nodes of this kind carry their own source position.
    ///
    /// Operators, contexts and most helper nodes borrow their parent's span
    /// when walked; they are not reported in coverage.
    pub fn has_position(self) -> bool {
        !matches!(
            self,
            NodeKind::Module
                | NodeKind::And
                | NodeKind::Or
                | NodeKind::Add
                | NodeKind::Sub
                | NodeKind::Mult
                | NodeKind::MatMult
                | NodeKind::Div
                | NodeKind::Mod
                | NodeKind::Pow
                | NodeKind::LShift
                | NodeKind::RShift
                | NodeKind::BitOr
                | NodeKind::BitXor
                | NodeKind::BitAnd
                | NodeKind::FloorDiv
                | NodeKind::Invert
                | NodeKind::Not
                | NodeKind::UAdd
                | NodeKind::USub
                | NodeKind::Eq
                | NodeKind::NotEq
                | NodeKind::Lt
                | NodeKind::LtE
                | NodeKind::Gt
                | NodeKind::GtE
                | NodeKind::Is
                | NodeKind::IsNot
                | NodeKind::In
                | NodeKind::NotIn
                | NodeKind::Arguments
                | NodeKind::Comprehension
                | NodeKind::WithItem
                | NodeKind::Load
                | NodeKind::Store
                | NodeKind::Del
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
