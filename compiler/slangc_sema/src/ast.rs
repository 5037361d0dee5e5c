//! Syntactic AST consumed by the unit loader, collector, and validator.
//!
//! Nodes here carry *unresolved* type references (`Ty`, not `LirTy`) — the
//! validator (§4.3.1) is what turns a `Ty::Named("HashMap")` plus type
//! arguments into a concrete `slangc_lir::syntax::LirTy`. A front end that
//! produces this tree (lexer/parser) is out of scope for this crate; the
//! loader accepts an already-parsed `Unit` per §4.1's "Entry: a root unit
//! name and the root AST".

/// A name as written in source: a bare identifier, never a dotted unit path.
pub type Name = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ty {
    Named(Name),
    Generic(Name, Vec<Ty>),
    Array(Box<Ty>, u64),
    Ref { mutable: bool, inner: Box<Ty> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Name,
    pub ty: Ty,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: Name,
    pub ty: Ty,
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: Name,
    pub generics: Vec<Name>,
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone)]
pub struct VariantDecl {
    pub name: Name,
    pub payload: Vec<Ty>,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: Name,
    pub generics: Vec<Name>,
    pub variants: Vec<VariantDecl>,
}

/// A perk declaration: the set of method names a type must provide to claim
/// the perk (§4.3.2's nominal capability system).
#[derive(Debug, Clone)]
pub struct PerkDecl {
    pub name: Name,
    pub required_methods: Vec<Name>,
}

#[derive(Debug, Clone)]
pub struct ExtensionDecl {
    pub target: Name,
    pub perk: Option<Name>,
    pub methods: Vec<FunctionDecl>,
}

#[derive(Debug, Clone)]
pub struct ConstDecl {
    pub name: Name,
    pub visibility: Visibility,
    pub ty: Option<Ty>,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Name,
    pub visibility: Visibility,
    pub generics: Vec<Name>,
    pub params: Vec<Param>,
    pub return_ty: Ty,
    pub body: Block,
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowKind {
    Peek,
    Poke,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Let {
        name: Name,
        mutable: bool,
        ty: Option<Ty>,
        init: Expr,
    },
    Expr(Expr),
    Return(Option<Expr>),
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },
    While {
        cond: Expr,
        body: Block,
    },
    Foreach {
        binding: Name,
        iter: Expr,
        body: Block,
    },
    Match {
        scrutinee: Expr,
        arms: Vec<MatchArm>,
    },
    Break,
    Continue,
}

#[derive(Debug, Clone)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub enum Pattern {
    Variant { variant: Name, bindings: Vec<Name> },
    Wildcard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOpKind {
    Neg,
    Not,
}

#[derive(Debug, Clone)]
pub enum CallArgs {
    Positional(Vec<Expr>),
    Named(Vec<(Name, Expr)>),
}

#[derive(Debug, Clone)]
pub enum InterpSegment {
    Literal(String),
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub enum Expr {
    IntLit(i128),
    FloatLit(f64),
    BoolLit(bool),
    StrLit(String),
    Interpolated(Vec<InterpSegment>),
    Ident(Name),
    Binary {
        op: BinOpKind,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnOpKind,
        operand: Box<Expr>,
    },
    /// A free function call, or a static call on a type (e.g.
    /// `HashMap<string, i32>.new()`, represented with `callee ==
    /// "HashMap.new"` and `type_args == [string, i32]`).
    Call {
        callee: Name,
        type_args: Vec<Ty>,
        args: CallArgs,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: Name,
        args: Vec<Expr>,
    },
    FieldAccess {
        receiver: Box<Expr>,
        field: Name,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    ArrayLit(Vec<Expr>),
    StructLit {
        name: Name,
        fields: CallArgs,
    },
    Borrow {
        kind: BorrowKind,
        place: Box<Expr>,
    },
    /// `e ??` (§4.3.1, §4.4.8).
    TryProp(Box<Expr>),
    Ok(Box<Expr>),
    Err(Box<Expr>),
    Some(Box<Expr>),
    None,
    Destroy(Box<Expr>),
}

#[derive(Debug, Clone)]
pub enum Import {
    /// Another source unit, addressed by its dotted-path name.
    Unit(Name),
    Stdlib(Name),
    Library(Name),
}

#[derive(Debug, Clone, Default)]
pub struct Unit {
    pub name: Name,
    pub imports: Vec<Import>,
    pub structs: Vec<StructDecl>,
    pub enums: Vec<EnumDecl>,
    pub perks: Vec<PerkDecl>,
    pub extensions: Vec<ExtensionDecl>,
    pub functions: Vec<FunctionDecl>,
    pub consts: Vec<ConstDecl>,
}
