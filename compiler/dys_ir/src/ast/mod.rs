//! Abstract syntax tree (grammar version 1).
//!
//! Statements and expressions live in an `ExprArena` and refer to each other
//! through `StmtId`/`ExprId` indices. Child lists are small vectors of ids;
//! nodes never own other nodes.
//!
//! The tree is a superset of what the evaluator runs: constructs such as
//! `with`, `yield` or `global` parse into real nodes so the validator can
//! reject them with an exact position.

mod node_kind;
mod operators;

pub use node_kind::NodeKind;
pub use operators::{BinaryOp, BoolOp, CmpOp, UnaryOp};

use crate::{ExprId, Name, Span, StmtId};

/// Literal constant.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Box<str>),
    Bytes(Box<[u8]>),
    Ellipsis,
}

/// Expression node.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// Expression kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Constant(Constant),
    Name(Name),
    BoolOp {
        op: BoolOp,
        values: Vec<ExprId>,
    },
    /// `target := value`
    NamedExpr {
        target: Name,
        value: ExprId,
    },
    BinOp {
        left: ExprId,
        op: BinaryOp,
        right: ExprId,
    },
    UnaryOp {
        op: UnaryOp,
        operand: ExprId,
    },
    Lambda {
        params: Box<Parameters>,
        body: ExprId,
    },
    /// `body if test else orelse`
    IfExp {
        test: ExprId,
        body: ExprId,
        orelse: ExprId,
    },
    Dict(Vec<DictEntry>),
    Set(Vec<ExprId>),
    ListComp {
        elt: ExprId,
        generators: Vec<Comprehension>,
    },
    SetComp {
        elt: ExprId,
        generators: Vec<Comprehension>,
    },
    DictComp {
        key: ExprId,
        value: ExprId,
        generators: Vec<Comprehension>,
    },
    GeneratorExp {
        elt: ExprId,
        generators: Vec<Comprehension>,
    },
    Await(ExprId),
    Yield(Option<ExprId>),
    YieldFrom(ExprId),
    /// Chained comparison: `left op0 c0 op1 c1 ...`
    Compare {
        left: ExprId,
        ops: Vec<CmpOp>,
        comparators: Vec<ExprId>,
    },
    Call {
        func: ExprId,
        /// Positional arguments; `Starred` entries are splats.
        args: Vec<ExprId>,
        keywords: Vec<Keyword>,
    },
    /// One `{...}` field of an f-string.
    FormattedValue {
        value: ExprId,
        conversion: Option<Conversion>,
        /// A `JoinedStr` expression, if a spec was given.
        format_spec: Option<ExprId>,
    },
    /// An f-string: literal `Constant` parts and `FormattedValue` parts.
    JoinedStr(Vec<ExprId>),
    Attribute {
        value: ExprId,
        attr: Name,
    },
    Subscript {
        value: ExprId,
        slice: ExprId,
    },
    Starred(ExprId),
    List(Vec<ExprId>),
    Tuple(Vec<ExprId>),
    Slice {
        lower: Option<ExprId>,
        upper: Option<ExprId>,
        step: Option<ExprId>,
    },
}

impl ExprKind {
    pub fn node_kind(&self) -> NodeKind {
        match self {
            ExprKind::Constant(_) => NodeKind::Constant,
            ExprKind::Name(_) => NodeKind::Name,
            ExprKind::BoolOp { .. } => NodeKind::BoolOp,
            ExprKind::NamedExpr { .. } => NodeKind::NamedExpr,
            ExprKind::BinOp { .. } => NodeKind::BinOp,
            ExprKind::UnaryOp { .. } => NodeKind::UnaryOp,
            ExprKind::Lambda { .. } => NodeKind::Lambda,
            ExprKind::IfExp { .. } => NodeKind::IfExp,
            ExprKind::Dict(_) => NodeKind::Dict,
            ExprKind::Set(_) => NodeKind::Set,
            ExprKind::ListComp { .. } => NodeKind::ListComp,
            ExprKind::SetComp { .. } => NodeKind::SetComp,
            ExprKind::DictComp { .. } => NodeKind::DictComp,
            ExprKind::GeneratorExp { .. } => NodeKind::GeneratorExp,
            ExprKind::Await(_) => NodeKind::Await,
            ExprKind::Yield(_) => NodeKind::Yield,
            ExprKind::YieldFrom(_) => NodeKind::YieldFrom,
            ExprKind::Compare { .. } => NodeKind::Compare,
            ExprKind::Call { .. } => NodeKind::Call,
            ExprKind::FormattedValue { .. } => NodeKind::FormattedValue,
            ExprKind::JoinedStr(_) => NodeKind::JoinedStr,
            ExprKind::Attribute { .. } => NodeKind::Attribute,
            ExprKind::Subscript { .. } => NodeKind::Subscript,
            ExprKind::Starred(_) => NodeKind::Starred,
            ExprKind::List(_) => NodeKind::List,
            ExprKind::Tuple(_) => NodeKind::Tuple,
            ExprKind::Slice { .. } => NodeKind::Slice,
        }
    }
}

/// f-string field conversion (`!s`, `!r`, `!a`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Conversion {
    Str,
    Repr,
    Ascii,
}

/// Dict display entry; `key == None` is a `**mapping` unpack.
#[derive(Clone, Debug, PartialEq)]
pub struct DictEntry {
    pub key: Option<ExprId>,
    pub value: ExprId,
}

/// Keyword argument; `arg == None` is a `**mapping` splat.
#[derive(Clone, Debug, PartialEq)]
pub struct Keyword {
    pub arg: Option<Name>,
    pub value: ExprId,
    pub span: Span,
}

/// One `for target in iter if cond...` clause.
#[derive(Clone, Debug, PartialEq)]
pub struct Comprehension {
    pub target: ExprId,
    pub iter: ExprId,
    pub ifs: Vec<ExprId>,
    pub is_async: bool,
}

/// Function or lambda parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: Name,
    pub annotation: Option<ExprId>,
    pub default: Option<ExprId>,
    pub span: Span,
}

/// Parameter list of a `def` or `lambda`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parameters {
    pub posonly: Vec<Param>,
    pub args: Vec<Param>,
    pub vararg: Option<Param>,
    pub kwonly: Vec<Param>,
    pub kwarg: Option<Param>,
}

impl Parameters {
    /// All parameters in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.posonly
            .iter()
            .chain(self.args.iter())
            .chain(self.vararg.iter())
            .chain(self.kwonly.iter())
            .chain(self.kwarg.iter())
    }
}

/// Statement node.
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// `import` alias; `name` is the full dotted name, `*` for star imports.
#[derive(Clone, Debug, PartialEq)]
pub struct Alias {
    pub name: Name,
    pub asname: Option<Name>,
    pub span: Span,
}

/// `except [ty [as name]]:` clause.
#[derive(Clone, Debug, PartialEq)]
pub struct ExceptHandler {
    pub ty: Option<ExprId>,
    pub name: Option<Name>,
    pub body: Vec<StmtId>,
    pub span: Span,
}

/// `with` item.
#[derive(Clone, Debug, PartialEq)]
pub struct WithItem {
    pub context: ExprId,
    pub vars: Option<ExprId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: Name,
    pub params: Parameters,
    pub body: Vec<StmtId>,
    pub decorators: Vec<ExprId>,
    pub returns: Option<ExprId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassDef {
    pub name: Name,
    pub bases: Vec<ExprId>,
    pub keywords: Vec<Keyword>,
    pub body: Vec<StmtId>,
    pub decorators: Vec<ExprId>,
}

/// Which statement an `async` prefix applied to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AsyncKind {
    FunctionDef,
    For,
    With,
}

/// Statement kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Expr(ExprId),
    /// `t0 = t1 = ... = value`
    Assign {
        targets: Vec<ExprId>,
        value: ExprId,
    },
    AugAssign {
        target: ExprId,
        op: BinaryOp,
        value: ExprId,
    },
    AnnAssign {
        target: ExprId,
        annotation: ExprId,
        value: Option<ExprId>,
    },
    Pass,
    Break,
    Continue,
    Return(Option<ExprId>),
    Raise {
        exc: Option<ExprId>,
        cause: Option<ExprId>,
    },
    Assert {
        test: ExprId,
        msg: Option<ExprId>,
    },
    Delete(Vec<ExprId>),
    Import(Vec<Alias>),
    ImportFrom {
        module: Name,
        names: Vec<Alias>,
    },
    Global(Vec<Name>),
    Nonlocal(Vec<Name>),
    If {
        test: ExprId,
        body: Vec<StmtId>,
        orelse: Vec<StmtId>,
    },
    While {
        test: ExprId,
        body: Vec<StmtId>,
        orelse: Vec<StmtId>,
    },
    For {
        target: ExprId,
        iter: ExprId,
        body: Vec<StmtId>,
        orelse: Vec<StmtId>,
    },
    Try {
        body: Vec<StmtId>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<StmtId>,
        finalbody: Vec<StmtId>,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<StmtId>,
    },
    FunctionDef(Box<FunctionDef>),
    ClassDef(Box<ClassDef>),
    /// `async def` / `async for` / `async with`.
    Async {
        kind: AsyncKind,
        stmt: StmtId,
    },
}

impl StmtKind {
    pub fn node_kind(&self) -> NodeKind {
        match self {
            StmtKind::Expr(_) => NodeKind::Expr,
            StmtKind::Assign { .. } => NodeKind::Assign,
            StmtKind::AugAssign { .. } => NodeKind::AugAssign,
            StmtKind::AnnAssign { .. } => NodeKind::AnnAssign,
            StmtKind::Pass => NodeKind::Pass,
            StmtKind::Break => NodeKind::Break,
            StmtKind::Continue => NodeKind::Continue,
            StmtKind::Return(_) => NodeKind::Return,
            StmtKind::Raise { .. } => NodeKind::Raise,
            StmtKind::Assert { .. } => NodeKind::Assert,
            StmtKind::Delete(_) => NodeKind::Delete,
            StmtKind::Import(_) => NodeKind::Import,
            StmtKind::ImportFrom { .. } => NodeKind::ImportFrom,
            StmtKind::Global(_) => NodeKind::Global,
            StmtKind::Nonlocal(_) => NodeKind::Nonlocal,
            StmtKind::If { .. } => NodeKind::If,
            StmtKind::While { .. } => NodeKind::While,
            StmtKind::For { .. } => NodeKind::For,
            StmtKind::Try { .. } => NodeKind::Try,
            StmtKind::With { .. } => NodeKind::With,
            StmtKind::FunctionDef(_) => NodeKind::FunctionDef,
            StmtKind::ClassDef(_) => NodeKind::ClassDef,
            StmtKind::Async { kind, .. } => match kind {
                AsyncKind::FunctionDef => NodeKind::AsyncFunctionDef,
                AsyncKind::For => NodeKind::AsyncFor,
                AsyncKind::With => NodeKind::AsyncWith,
            },
        }
    }
}
