//! Semantic compatibility checks over a resolved Java class model.
//!
//! The checks mirror what javac reports after resolution: override
//! compatibility across a class hierarchy ([`overrides`]), same-erasure
//! clashes and default-method diamonds, type-argument bounds ([`bounds`])
//! and call-site classification after overload resolution ([`overload`]).
//! Everything is pure over a [`rava_types::TypeEnv`]; diagnostics accumulate
//! in a [`DiagnosticSink`] and re-runs are deterministic.

#![forbid(unsafe_code)]

pub mod bounds;
pub mod diagnostics;
pub mod hierarchy;
pub mod level;
pub mod overload;
pub mod overrides;

pub use bounds::{
    check_type_arguments, DiamondInference, InstantiationContext, TypeArguments, TypeParamOwner,
};
pub use diagnostics::{
    ArgumentMismatch, BoundKeyword, ClashRelation, Diagnostic, DiagnosticKind, DiagnosticSink,
    Severity,
};
pub use hierarchy::{ClassHierarchy, HierarchicalSignature, MethodSignature};
pub use level::LanguageLevel;
pub use overload::{classify_call, CallSite, Candidate};
pub use overrides::check_class;
