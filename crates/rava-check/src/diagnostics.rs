//! Structured diagnostics produced by the checkers.
//!
//! A [`Diagnostic`] carries a machine-readable [`DiagnosticKind`] whose
//! variant fields are the structured message parameters; rendering is the
//! consuming layer's job. [`Diagnostic::message`] is the stable fallback
//! renderer used by tests and simple frontends.

use serde::{Deserialize, Serialize};

use rava_types::format::{format_call, format_method, format_type, format_type_list};
use rava_types::{Access, ClassId, MethodId, Span, Type, TypeEnv};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// Whether a violated bound should have been satisfied via `extends` or
/// `implements` wording in the message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundKeyword {
    Extends,
    Implements,
}

/// The three erasure-clash message variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClashRelation {
    /// Both methods are declared by the subject class itself.
    SameClass,
    /// Both methods are static: a hide relation.
    Hides,
    /// An override-shaped relation that is not a valid override.
    Overrides,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgumentMismatch {
    /// Exactly one argument position is incompatible.
    Single {
        index: usize,
        expected: Type,
        actual: Type,
    },
    /// Several positions mismatch; full lists for a side-by-side report.
    General {
        expected: Vec<Type>,
        actual: Vec<Type>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    MultipleInheritanceConflict {
        ancestor: ClassId,
        first_args: Vec<Type>,
        second_args: Vec<Type>,
    },
    IncompatibleReturnType {
        method: MethodId,
        super_method: MethodId,
        found: Type,
        required: Type,
    },
    IncompatibleThrows {
        method: MethodId,
        super_method: MethodId,
        exception: Type,
    },
    WeakerAccessPrivileges {
        method: MethodId,
        super_method: MethodId,
        found: Access,
        required: Access,
    },
    StaticOverrideMismatch {
        method: MethodId,
        super_method: MethodId,
        method_is_static: bool,
    },
    FinalMethodOverride {
        method: MethodId,
        super_method: MethodId,
    },
    SameErasureClash {
        first: MethodId,
        second: MethodId,
        relation: ClashRelation,
    },
    UnrelatedDefaultMethods {
        class: ClassId,
        method_name: String,
        first: MethodId,
        second: MethodId,
        /// One of the two inherited members is abstract, so a concrete class
        /// must implement the method rather than merely disambiguate.
        abstract_conflict: bool,
    },
    GenericBoundViolation {
        parameter: String,
        argument: Type,
        bound: Type,
        keyword: BoundKeyword,
    },
    WrongTypeArgumentCount {
        expected: usize,
        found: usize,
    },
    DiamondInferenceFailure {
        message: String,
    },
    AmbiguousMethodCall {
        first: MethodId,
        second: MethodId,
    },
    InapplicableArguments {
        method: MethodId,
        mismatch: ArgumentMismatch,
    },
    UnresolvedMethod {
        name: String,
        argument_types: Vec<Type>,
    },
}

impl DiagnosticKind {
    /// Stable per-kind code, in the `jv_checker` style of code tables.
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::MultipleInheritanceConflict { .. } => "RAVA0301",
            DiagnosticKind::IncompatibleReturnType { .. } => "RAVA0302",
            DiagnosticKind::IncompatibleThrows { .. } => "RAVA0303",
            DiagnosticKind::WeakerAccessPrivileges { .. } => "RAVA0304",
            DiagnosticKind::StaticOverrideMismatch { .. } => "RAVA0305",
            DiagnosticKind::FinalMethodOverride { .. } => "RAVA0306",
            DiagnosticKind::SameErasureClash { .. } => "RAVA0307",
            DiagnosticKind::UnrelatedDefaultMethods { .. } => "RAVA0308",
            DiagnosticKind::GenericBoundViolation { .. } => "RAVA0309",
            DiagnosticKind::WrongTypeArgumentCount { .. } => "RAVA0310",
            DiagnosticKind::DiamondInferenceFailure { .. } => "RAVA0311",
            DiagnosticKind::AmbiguousMethodCall { .. } => "RAVA0312",
            DiagnosticKind::InapplicableArguments { .. } => "RAVA0313",
            DiagnosticKind::UnresolvedMethod { .. } => "RAVA0314",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Option<Span>,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Error,
            span,
            kind,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Fallback rendering of the structured parameters. Missing model pieces
    /// degrade to placeholders instead of panicking.
    pub fn message(&self, env: &dyn TypeEnv) -> String {
        let class_name = |id: ClassId| {
            env.class_name(id)
                .map(str::to_string)
                .unwrap_or_else(|| "<class>".to_string())
        };
        let method_sig = |id: MethodId| match env.method(id) {
            Some(m) => format_method(env, env.class_name(id.class), m),
            None => "<method>".to_string(),
        };
        match &self.kind {
            DiagnosticKind::MultipleInheritanceConflict {
                ancestor,
                first_args,
                second_args,
            } => format!(
                "'{}' cannot be inherited with different type arguments: <{}> and <{}>",
                class_name(*ancestor),
                format_type_list(env, first_args),
                format_type_list(env, second_args)
            ),
            DiagnosticKind::IncompatibleReturnType {
                method,
                super_method,
                found,
                required,
            } => format!(
                "'{}' clashes with '{}'; attempting to use incompatible return type '{}' (required: '{}')",
                method_sig(*method),
                method_sig(*super_method),
                format_type(env, found),
                format_type(env, required)
            ),
            DiagnosticKind::IncompatibleThrows {
                method,
                super_method,
                exception,
            } => format!(
                "'{}' clashes with '{}'; overridden method does not throw '{}'",
                method_sig(*method),
                method_sig(*super_method),
                format_type(env, exception)
            ),
            DiagnosticKind::WeakerAccessPrivileges {
                method,
                super_method,
                found,
                required,
            } => format!(
                "'{}' clashes with '{}'; attempting to assign weaker access privileges ('{}'); was '{}'",
                method_sig(*method),
                method_sig(*super_method),
                found.describe(),
                required.describe()
            ),
            DiagnosticKind::StaticOverrideMismatch {
                method,
                super_method,
                method_is_static,
            } => {
                let (own, other) = if *method_is_static {
                    ("static", "instance")
                } else {
                    ("instance", "static")
                };
                format!(
                    "{} method '{}' cannot hide {} method '{}'",
                    own,
                    method_sig(*method),
                    other,
                    method_sig(*super_method)
                )
            }
            DiagnosticKind::FinalMethodOverride {
                method,
                super_method,
            } => format!(
                "'{}' cannot override '{}'; overridden method is final",
                method_sig(*method),
                method_sig(*super_method)
            ),
            DiagnosticKind::SameErasureClash {
                first,
                second,
                relation,
            } => {
                let tail = match relation {
                    ClashRelation::SameClass => "both methods have same erasure",
                    ClashRelation::Hides => {
                        "both methods have same erasure, yet neither hides the other"
                    }
                    ClashRelation::Overrides => {
                        "both methods have same erasure, yet neither overrides the other"
                    }
                };
                format!(
                    "'{}' clashes with '{}'; {}",
                    method_sig(*first),
                    method_sig(*second),
                    tail
                )
            }
            DiagnosticKind::UnrelatedDefaultMethods {
                class,
                method_name,
                first,
                second,
                abstract_conflict,
            } => {
                let what = if *abstract_conflict {
                    "inherits abstract and default"
                } else {
                    "inherits unrelated defaults"
                };
                format!(
                    "'{}' {} for '{}' from '{}' and '{}'",
                    class_name(*class),
                    what,
                    method_name,
                    class_name(first.class),
                    class_name(second.class)
                )
            }
            DiagnosticKind::GenericBoundViolation {
                parameter,
                argument,
                bound,
                keyword,
            } => format!(
                "type argument '{}' for parameter '{}' is not within its bound; should {} '{}'",
                format_type(env, argument),
                parameter,
                match keyword {
                    BoundKeyword::Extends => "extend",
                    BoundKeyword::Implements => "implement",
                },
                format_type(env, bound)
            ),
            DiagnosticKind::WrongTypeArgumentCount { expected, found } => format!(
                "wrong number of type arguments: {found}; required: {expected}"
            ),
            DiagnosticKind::DiamondInferenceFailure { message } => message.clone(),
            DiagnosticKind::AmbiguousMethodCall { first, second } => format!(
                "ambiguous method call: both '{}' and '{}' match",
                method_sig(*first),
                method_sig(*second)
            ),
            DiagnosticKind::InapplicableArguments { method, mismatch } => match mismatch {
                ArgumentMismatch::Single {
                    index,
                    expected,
                    actual,
                } => format!(
                    "'{}' cannot be applied: argument {}: '{}' cannot be converted to '{}'",
                    method_sig(*method),
                    index + 1,
                    format_type(env, actual),
                    format_type(env, expected)
                ),
                ArgumentMismatch::General { expected, actual } => format!(
                    "'{}' cannot be applied to '({})'; expected '({})'",
                    method_sig(*method),
                    format_type_list(env, actual),
                    format_type_list(env, expected)
                ),
            },
            DiagnosticKind::UnresolvedMethod {
                name,
                argument_types,
            } => format!(
                "cannot resolve method '{}'",
                format_call(env, name, argument_types)
            ),
        }
    }
}

/// Append-only accumulator for one analysis unit.
///
/// Exact duplicates are suppressed so order-independent checks (erasure
/// clashes, diamond detection) can report from either direction and still
/// surface a single diagnostic.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if self.diagnostics.contains(&diagnostic) {
            return;
        }
        tracing::debug!(code = diagnostic.code(), "emitting diagnostic");
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, kind: DiagnosticKind, span: Option<Span>) {
        self.push(Diagnostic::error(kind, span));
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn kinds(&self) -> impl Iterator<Item = &DiagnosticKind> {
        self.diagnostics.iter().map(|d| &d.kind)
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rava_types::TypeStore;

    #[test]
    fn sink_suppresses_exact_duplicates() {
        let mut sink = DiagnosticSink::new();
        let kind = DiagnosticKind::UnresolvedMethod {
            name: "m".to_string(),
            argument_types: vec![],
        };
        sink.error(kind.clone(), None);
        sink.error(kind, None);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn unresolved_method_message_lists_argument_types() {
        let env = TypeStore::with_minimal_jdk();
        let string = env.well_known().string;
        let diag = Diagnostic::error(
            DiagnosticKind::UnresolvedMethod {
                name: "frob".to_string(),
                argument_types: vec![Type::class(string, vec![]), Type::int()],
            },
            None,
        );
        assert_eq!(
            diag.message(&env),
            "cannot resolve method 'frob(java.lang.String, int)'"
        );
    }

    #[test]
    fn missing_model_pieces_render_placeholders() {
        let env = TypeStore::with_minimal_jdk();
        let bogus = MethodId {
            class: env.well_known().object,
            index: 99,
        };
        let diag = Diagnostic::error(
            DiagnosticKind::FinalMethodOverride {
                method: bogus,
                super_method: bogus,
            },
            None,
        );
        assert!(diag.message(&env).contains("<method>"));
    }
}
