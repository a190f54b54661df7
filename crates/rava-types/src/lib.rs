//! Resolved Java program model and type compatibility oracle for Rava.
//!
//! This crate holds the read-only view of a name-resolved program (classes,
//! methods, type parameters) plus the structural primitives the checkers in
//! `rava-check` consult: subtyping, assignability, erasure and type-parameter
//! substitution. It knows nothing about source text or diagnostics rendering.

#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod format;
mod relations;
mod store;
mod substitutor;

pub use relations::{
    canonicalize_named, erasure, instantiate_as_supertype, is_assignable, is_convertible,
    is_inheritor, is_subtype, is_unchecked_exception, types_equal,
};
pub use store::{Readiness, TypeStore, WellKnownTypes};
pub use substitutor::{SubstitutionError, Substitutor};

/// A byte-span into a source string. Opaque to the checkers; diagnostics carry
/// it through to the rendering layer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}..{})", self.start, self.end)
    }
}

/// Identifier of a class or interface definition in a [`TypeStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a declared type parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeVarId(pub(crate) u32);

/// Identifier of a method: its declaring class plus the index into that
/// class's `methods` list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodId {
    pub class: ClassId,
    pub index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl PrimitiveType {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Double => "double",
            PrimitiveType::Float => "float",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Short => "short",
            PrimitiveType::Boolean => "boolean",
        }
    }

    /// Binary name of the corresponding boxed class.
    pub fn boxed_name(self) -> &'static str {
        match self {
            PrimitiveType::Byte => "java.lang.Byte",
            PrimitiveType::Char => "java.lang.Character",
            PrimitiveType::Double => "java.lang.Double",
            PrimitiveType::Float => "java.lang.Float",
            PrimitiveType::Int => "java.lang.Integer",
            PrimitiveType::Long => "java.lang.Long",
            PrimitiveType::Short => "java.lang.Short",
            PrimitiveType::Boolean => "java.lang.Boolean",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveType::Boolean)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

/// A (possibly parameterized) reference to a class definition.
///
/// `args` empty while the definition declares type parameters means the raw
/// type (`List` rather than `List<String>`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    pub def: ClassId,
    pub args: Vec<Type>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Primitive(PrimitiveType),
    Void,
    Class(ClassType),
    Array(Box<Type>),
    TypeVar(TypeVarId),
    Wildcard(WildcardBound),
    Intersection(Vec<Type>),
    /// A class reference that name resolution could not (yet) bind.
    Named(String),
    /// Placeholder while the resolver is still warming up.
    Unknown,
    Error,
}

impl Type {
    pub fn class(def: ClassId, args: Vec<Type>) -> Self {
        Type::Class(ClassType { def, args })
    }

    pub fn int() -> Self {
        Type::Primitive(PrimitiveType::Int)
    }

    pub fn boolean() -> Self {
        Type::Primitive(PrimitiveType::Boolean)
    }

    /// Unknown/Error types are treated as compatible with everything so a
    /// half-resolved model never produces spurious diagnostics.
    pub fn is_errorish(&self) -> bool {
        matches!(self, Type::Unknown | Type::Error)
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Class(_) | Type::Array(_) | Type::TypeVar(_) | Type::Intersection(_) | Type::Named(_)
        )
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            Type::Class(ct) => Some(ct),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
}

/// Java access levels, ordered so that `a < b` means `a` is more restrictive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Access {
    Private,
    PackagePrivate,
    Protected,
    Public,
}

impl Access {
    pub fn describe(self) -> &'static str {
        match self {
            Access::Private => "private",
            Access::PackagePrivate => "package-private",
            Access::Protected => "protected",
            Access::Public => "public",
        }
    }
}

/// A declared type parameter: its name and bound list.
///
/// `upper_bounds` excludes nothing; an unbounded parameter carries a single
/// `java.lang.Object` bound, matching how classfile signatures are loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamDef {
    pub name: String,
    pub upper_bounds: Vec<Type>,
    pub lower_bound: Option<Type>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDef {
    pub name: String,
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<Type>,
    pub return_type: Type,
    pub throws: Vec<Type>,
    pub access: Access,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_default: bool,
    pub is_varargs: bool,
    pub span: Option<Span>,
}

impl Default for MethodDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            type_params: Vec::new(),
            params: Vec::new(),
            return_type: Type::Void,
            throws: Vec::new(),
            access: Access::Public,
            is_static: false,
            is_abstract: false,
            is_final: false,
            is_default: false,
            is_varargs: false,
            span: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub access: Access,
    pub is_abstract: bool,
    pub is_final: bool,
    pub type_params: Vec<TypeVarId>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub methods: Vec<MethodDef>,
    pub span: Option<Span>,
}

impl Default for ClassDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: ClassKind::Class,
            access: Access::Public,
            is_abstract: false,
            is_final: false,
            type_params: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            span: None,
        }
    }
}

impl ClassDef {
    /// Whether this definition is used raw when referenced without arguments.
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

/// Read-only access to the resolved program, supplied by the surrounding
/// resolver. [`TypeStore`] is the concrete implementation used in tests.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;

    fn method(&self, id: MethodId) -> Option<&MethodDef> {
        self.class(id.class)?.methods.get(id.index)
    }

    fn class_name(&self, id: ClassId) -> Option<&str> {
        self.class(id).map(|c| c.name.as_str())
    }

    fn is_interface(&self, id: ClassId) -> bool {
        self.class(id)
            .map(|c| c.kind == ClassKind::Interface)
            .unwrap_or(false)
    }
}
