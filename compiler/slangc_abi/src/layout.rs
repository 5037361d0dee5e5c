use crate::size_and_align::{AbiAndPrefAlign, Size};
use crate::target::AddressSpace;

/// Represents a type along with its size and alignment information.
///
/// This is commonly used during codegen and layout computation to reason about
/// how values should be represented in memory on the target platform.
#[derive(Debug, Clone)]
pub struct TyAndLayout<T> {
    /// The type this layout refers to.
    ///
    /// This is usually a LIR type, but can be any type that has a size and alignment.
    pub ty: T,
    /// The layout information for the type, including size and alignment.
    pub layout: Layout,
}

impl<T> std::ops::Deref for TyAndLayout<T> {
    type Target = Layout;

    fn deref(&self) -> &Layout {
        &self.layout
    }
}

impl<T> TyAndLayout<T> {
    pub fn is_zst(&self) -> bool {
        self.layout.size.bytes() == 0
    }

    pub fn is_memory(&self) -> bool {
        self.layout.backend_repr.is_memory()
    }
}

/// Represents the layout of a type in the target architecture.
///
/// This struct contains the size, alignment, and backend representation
/// of a type, which is essential for code generation and memory layout decisions.
#[derive(Debug, Clone)]
pub struct Layout {
    /// The size of the type in bytes.
    pub size: Size,
    /// The ABI and preferred alignment of the type.
    pub align: AbiAndPrefAlign,
    /// The backend representation of the type, which may include additional
    /// scalar/pair/memory classification used by a backend to pick the
    /// cheapest legal value representation (e.g. an LLVM first-class type
    /// instead of an opaque blob of bytes).
    pub backend_repr: BackendRepr,
}

/// Integer width, independent of signedness. Mirrors the widths the source
/// language's built-in integer types can have (§3 DATA MODEL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integer {
    I8,
    I16,
    I32,
    I64,
    I128,
}

impl Integer {
    pub const fn size(self) -> Size {
        match self {
            Integer::I8 => Size::from_bytes_const(1),
            Integer::I16 => Size::from_bytes_const(2),
            Integer::I32 => Size::from_bytes_const(4),
            Integer::I64 => Size::from_bytes_const(8),
            Integer::I128 => Size::from_bytes_const(16),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    F32,
    F64,
}

impl FloatWidth {
    pub const fn size(self) -> Size {
        match self {
            FloatWidth::F32 => Size::from_bytes_const(4),
            FloatWidth::F64 => Size::from_bytes_const(8),
        }
    }
}

/// A single scalar value as the backend sees it: an integer of some width and
/// signedness, a float, or a pointer into some address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Int { width: Integer, signed: bool },
    Float(FloatWidth),
    Pointer(AddressSpace),
}

impl Primitive {
    pub const fn size(self) -> Size {
        match self {
            Primitive::Int { width, .. } => width.size(),
            Primitive::Float(w) => w.size(),
            Primitive::Pointer(_) => Size::from_bytes_const(8),
        }
    }
}

/// How a backend should actually materialize a value: as a single first-class
/// scalar, a pair of scalars passed together (e.g. the fat-pointer string
/// representation `{ data, size }` or a dynamic array's `{ len, cap, data }`
/// collapsed to its two leading scalars when legal), or an opaque memory
/// blob that must always be addressed through a pointer.
///
/// This is the piece the stale draft in this position left as a single
/// placeholder variant; every codegen consumer (`slangc_codegen_ssa::lir`,
/// `slangc_codegen_llvm::context`) matches on all three arms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendRepr {
    Scalar(Primitive),
    ScalarPair(Primitive, Primitive),
    Memory { sized: bool },
}

impl BackendRepr {
    pub fn is_scalar(&self) -> bool {
        matches!(self, BackendRepr::Scalar(_))
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, BackendRepr::Memory { .. })
    }
}
