//! Type-argument validation against declared type-parameter bounds
//! (JLS 4.5): arity, per-bound subtyping with the owner's own substitutor
//! applied (so F-bounded parameters like `T extends Comparable<T>` resolve
//! against the supplied arguments), raw references, and diamond inference
//! outcomes.

use tracing::trace;

use rava_types::{erasure, is_assignable, Substitutor, Type, TypeEnv, TypeVarId, WildcardBound};

use crate::diagnostics::{BoundKeyword, DiagnosticKind, DiagnosticSink};
use crate::LanguageLevel;

/// The outcome of diamond (`<>`) inference, produced by the caller's
/// inference engine. `Failed` carries the engine's own message verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiamondInference {
    Inferred(Vec<Type>),
    Failed { message: String },
}

/// Type arguments as written at a use site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeArguments {
    /// No argument list at all: a raw reference, always legal here.
    Raw,
    /// An empty `<>` list resolved by inference.
    Diamond(DiamondInference),
    /// Arguments written out in source.
    Explicit(Vec<Type>),
}

/// The declaration whose type parameters are being instantiated: a generic
/// class reference or a generic method call.
#[derive(Clone, Debug)]
pub struct TypeParamOwner<'a> {
    pub name: &'a str,
    pub type_params: &'a [TypeVarId],
    pub is_method: bool,
}

impl<'a> TypeParamOwner<'a> {
    pub fn class(def: &'a rava_types::ClassDef) -> Self {
        Self {
            name: &def.name,
            type_params: &def.type_params,
            is_method: false,
        }
    }

    pub fn method(def: &'a rava_types::MethodDef) -> Self {
        Self {
            name: &def.name,
            type_params: &def.type_params,
            is_method: true,
        }
    }
}

/// Where the instantiation appears. A raw expected type suppresses diamond
/// inference failures, matching the compiler's unchecked fallback.
#[derive(Clone, Debug, Default)]
pub struct InstantiationContext {
    pub expected_type: Option<Type>,
}

impl InstantiationContext {
    fn expects_raw(&self, env: &dyn TypeEnv) -> bool {
        match &self.expected_type {
            Some(Type::Class(class_type)) => {
                class_type.args.is_empty()
                    && env
                        .class(class_type.def)
                        .map(|d| !d.type_params.is_empty())
                        .unwrap_or(false)
            }
            _ => false,
        }
    }
}

/// Validate one instantiation of `owner`'s type parameters.
pub fn check_type_arguments(
    env: &dyn TypeEnv,
    level: LanguageLevel,
    owner: &TypeParamOwner<'_>,
    arguments: &TypeArguments,
    context: &InstantiationContext,
    span: Option<rava_types::Span>,
    sink: &mut DiagnosticSink,
) {
    if matches!(arguments, TypeArguments::Diamond(_)) && !level.has_diamond() {
        sink.error(
            DiagnosticKind::DiamondInferenceFailure {
                message: format!(
                    "diamond type arguments require Java 7 or later for {}",
                    owner.name
                ),
            },
            span,
        );
        return;
    }
    let args = match arguments {
        TypeArguments::Raw => return,
        TypeArguments::Diamond(DiamondInference::Failed { message }) => {
            if !context.expects_raw(env) {
                sink.error(
                    DiagnosticKind::DiamondInferenceFailure {
                        message: message.clone(),
                    },
                    span,
                );
            }
            return;
        }
        TypeArguments::Diamond(DiamondInference::Inferred(args)) => {
            if owner.type_params.is_empty() {
                // `new C<>()` on a non-generic declaration.
                sink.error(
                    DiagnosticKind::WrongTypeArgumentCount {
                        expected: 0,
                        found: 1,
                    },
                    span,
                );
                return;
            }
            args
        }
        TypeArguments::Explicit(args) => args,
    };

    if args.len() != owner.type_params.len() {
        sink.error(
            DiagnosticKind::WrongTypeArgumentCount {
                expected: owner.type_params.len(),
                found: args.len(),
            },
            span,
        );
        return;
    }

    let Ok(substitutor) = Substitutor::from_pairs(owner.type_params, args) else {
        // Cyclic argument lists never typecheck; arity was handled above.
        return;
    };
    trace!(owner = owner.name, method = owner.is_method, "checking bounds");

    for (param_id, argument) in owner.type_params.iter().zip(args.iter()) {
        if argument.is_errorish() {
            continue;
        }
        let Some(param) = env.type_param(*param_id) else {
            continue;
        };
        if let Some(kind) = first_violated_bound(env, &substitutor, param, argument) {
            sink.error(kind, span);
        }
    }
}

/// At most one diagnostic per parameter: the first bound the argument fails.
fn first_violated_bound(
    env: &dyn TypeEnv,
    substitutor: &Substitutor,
    param: &rava_types::TypeParamDef,
    argument: &Type,
) -> Option<DiagnosticKind> {
    let Some(checked) = bound_checked_side(argument) else {
        return None;
    };
    for bound in &param.upper_bounds {
        if is_implicit_object_bound(env, bound) {
            continue;
        }
        let substituted = substitutor.apply(env, bound);
        if !satisfies_bound(env, checked, &substituted) {
            return Some(DiagnosticKind::GenericBoundViolation {
                parameter: param.name.clone(),
                argument: argument.clone(),
                bound: substituted.clone(),
                keyword: bound_keyword(env, &substituted, checked),
            });
        }
    }
    None
}

/// Which type actually has to satisfy the bound. `? extends X` checks `X`;
/// `?` and `? super X` have `Object` as their upper side, which only an
/// explicit non-Object bound could reject, and those are reported at the
/// capture site instead.
fn bound_checked_side(argument: &Type) -> Option<&Type> {
    match argument {
        Type::Wildcard(WildcardBound::Extends(inner)) => Some(inner),
        Type::Wildcard(_) => None,
        other => Some(other),
    }
}

fn satisfies_bound(env: &dyn TypeEnv, argument: &Type, bound: &Type) -> bool {
    if is_assignable(env, argument, bound) {
        return true;
    }
    // A type variable argument may satisfy the bound only after erasure,
    // which is how javac accepts `T` against `Comparable<T>` for a fresh
    // variable bounded the same way.
    if matches!(argument, Type::TypeVar(_)) {
        return is_assignable(env, &erasure(env, argument), &erasure(env, bound));
    }
    false
}

fn is_implicit_object_bound(env: &dyn TypeEnv, bound: &Type) -> bool {
    match bound {
        Type::Class(class_type) => {
            class_type.args.is_empty() && class_type.def == env.well_known().object
        }
        _ => false,
    }
}

/// `implements` wording when a class-typed argument misses an interface
/// bound, `extends` everywhere else.
fn bound_keyword(env: &dyn TypeEnv, bound: &Type, argument: &Type) -> BoundKeyword {
    let bound_is_interface = matches!(bound, Type::Class(c) if env.is_interface(c.def));
    let argument_is_class = matches!(argument, Type::Class(c) if !env.is_interface(c.def));
    if bound_is_interface && argument_is_class {
        BoundKeyword::Implements
    } else {
        BoundKeyword::Extends
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rava_types::{ClassKind, ClassDef, MethodDef, TypeParamDef, TypeStore};

    fn generic_box(store: &mut TypeStore) -> rava_types::ClassId {
        let number = store.class_id("java.lang.Number").unwrap();
        let t = store.add_type_param("T", vec![Type::class(number, vec![])]);
        store.add_class(ClassDef {
            name: "Box".into(),
            kind: ClassKind::Class,
            type_params: vec![t],
            super_class: Some(Type::class(store.well_known().object, vec![])),
            ..ClassDef::default()
        })
    }

    #[test]
    fn argument_outside_bound_is_reported_with_extends() {
        let mut store = TypeStore::with_minimal_jdk();
        let boxed = generic_box(&mut store);
        let def = store.class(boxed).unwrap().clone();
        let string = store.class_id("java.lang.String").unwrap();

        let mut sink = DiagnosticSink::new();
        check_type_arguments(
            &store,
            LanguageLevel::Jdk8,
            &TypeParamOwner::class(&def),
            &TypeArguments::Explicit(vec![Type::class(string, vec![])]),
            &InstantiationContext::default(),
            None,
            &mut sink,
        );
        assert_eq!(sink.diagnostics().len(), 1);
        assert!(matches!(
            &sink.diagnostics()[0].kind,
            DiagnosticKind::GenericBoundViolation {
                parameter,
                keyword: BoundKeyword::Extends,
                ..
            } if parameter == "T"
        ));
    }

    #[test]
    fn argument_inside_bound_is_accepted() {
        let mut store = TypeStore::with_minimal_jdk();
        let boxed = generic_box(&mut store);
        let def = store.class(boxed).unwrap().clone();
        let integer = store.class_id("java.lang.Integer").unwrap();

        let mut sink = DiagnosticSink::new();
        check_type_arguments(
            &store,
            LanguageLevel::Jdk8,
            &TypeParamOwner::class(&def),
            &TypeArguments::Explicit(vec![Type::class(integer, vec![])]),
            &InstantiationContext::default(),
            None,
            &mut sink,
        );
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn f_bounded_parameter_accepts_its_own_argument() {
        let mut store = TypeStore::with_minimal_jdk();
        let comparable = store.class_id("java.lang.Comparable").unwrap();
        let t = store.add_type_param("T", Vec::new());
        store.define_type_param(
            t,
            TypeParamDef {
                name: "T".into(),
                upper_bounds: vec![Type::class(comparable, vec![Type::TypeVar(t)])],
                lower_bound: None,
            },
        );
        let def = ClassDef {
            name: "Sorted".into(),
            kind: ClassKind::Class,
            type_params: vec![t],
            ..ClassDef::default()
        };
        store.add_class(def.clone());
        let string = store.class_id("java.lang.String").unwrap();

        // String implements Comparable<String>, so T := String closes the
        // recursive bound.
        let mut sink = DiagnosticSink::new();
        check_type_arguments(
            &store,
            LanguageLevel::Jdk8,
            &TypeParamOwner::class(&def),
            &TypeArguments::Explicit(vec![Type::class(string, vec![])]),
            &InstantiationContext::default(),
            None,
            &mut sink,
        );
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn arity_mismatch_is_a_single_count_diagnostic() {
        let mut store = TypeStore::with_minimal_jdk();
        let boxed = generic_box(&mut store);
        let def = store.class(boxed).unwrap().clone();
        let integer = store.class_id("java.lang.Integer").unwrap();

        let mut sink = DiagnosticSink::new();
        check_type_arguments(
            &store,
            LanguageLevel::Jdk8,
            &TypeParamOwner::class(&def),
            &TypeArguments::Explicit(vec![
                Type::class(integer, vec![]),
                Type::class(integer, vec![]),
            ]),
            &InstantiationContext::default(),
            None,
            &mut sink,
        );
        assert_eq!(
            sink.kinds().cloned().collect::<Vec<_>>(),
            vec![DiagnosticKind::WrongTypeArgumentCount {
                expected: 1,
                found: 2,
            }]
        );
    }

    #[test]
    fn diamond_on_non_generic_class_is_rejected() {
        let mut store = TypeStore::with_minimal_jdk();
        let def = ClassDef {
            name: "Plain".into(),
            kind: ClassKind::Class,
            ..ClassDef::default()
        };
        store.add_class(def.clone());

        let mut sink = DiagnosticSink::new();
        check_type_arguments(
            &store,
            LanguageLevel::Jdk8,
            &TypeParamOwner::class(&def),
            &TypeArguments::Diamond(DiamondInference::Inferred(Vec::new())),
            &InstantiationContext::default(),
            None,
            &mut sink,
        );
        assert_eq!(
            sink.kinds().cloned().collect::<Vec<_>>(),
            vec![DiagnosticKind::WrongTypeArgumentCount {
                expected: 0,
                found: 1,
            }]
        );
    }

    #[test]
    fn diamond_arguments_require_jdk_7() {
        let mut store = TypeStore::with_minimal_jdk();
        let boxed = generic_box(&mut store);
        let def = store.class(boxed).unwrap().clone();
        let integer = store.class_id("java.lang.Integer").unwrap();
        let inferred =
            TypeArguments::Diamond(DiamondInference::Inferred(vec![Type::class(integer, vec![])]));

        let mut sink = DiagnosticSink::new();
        check_type_arguments(
            &store,
            LanguageLevel::Jdk6,
            &TypeParamOwner::class(&def),
            &inferred,
            &InstantiationContext::default(),
            None,
            &mut sink,
        );
        assert!(matches!(
            sink.diagnostics(),
            [d] if matches!(d.kind, DiagnosticKind::DiamondInferenceFailure { .. })
        ));

        // The same instantiation is clean once the level allows it.
        let mut sink = DiagnosticSink::new();
        check_type_arguments(
            &store,
            LanguageLevel::Jdk7,
            &TypeParamOwner::class(&def),
            &inferred,
            &InstantiationContext::default(),
            None,
            &mut sink,
        );
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn diamond_failure_under_raw_expectation_is_suppressed() {
        let mut store = TypeStore::with_minimal_jdk();
        let boxed = generic_box(&mut store);
        let def = store.class(boxed).unwrap().clone();

        let raw_expected = InstantiationContext {
            expected_type: Some(Type::class(boxed, vec![])),
        };
        let failed = TypeArguments::Diamond(DiamondInference::Failed {
            message: "cannot infer type arguments".into(),
        });

        let mut sink = DiagnosticSink::new();
        check_type_arguments(
            &store,
            LanguageLevel::Jdk8,
            &TypeParamOwner::class(&def),
            &failed,
            &raw_expected,
            None,
            &mut sink,
        );
        assert!(sink.diagnostics().is_empty());

        check_type_arguments(
            &store,
            LanguageLevel::Jdk8,
            &TypeParamOwner::class(&def),
            &failed,
            &InstantiationContext::default(),
            None,
            &mut sink,
        );
        assert_eq!(
            sink.kinds().cloned().collect::<Vec<_>>(),
            vec![DiagnosticKind::DiamondInferenceFailure {
                message: "cannot infer type arguments".into(),
            }]
        );
    }

    #[test]
    fn raw_reference_is_never_diagnosed() {
        let mut store = TypeStore::with_minimal_jdk();
        let boxed = generic_box(&mut store);
        let def = store.class(boxed).unwrap().clone();

        let mut sink = DiagnosticSink::new();
        check_type_arguments(
            &store,
            LanguageLevel::Jdk8,
            &TypeParamOwner::class(&def),
            &TypeArguments::Raw,
            &InstantiationContext::default(),
            None,
            &mut sink,
        );
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn generic_method_bounds_use_the_call_site_arguments() {
        let mut store = TypeStore::with_minimal_jdk();
        let number = store.class_id("java.lang.Number").unwrap();
        let t = store.add_type_param("T", vec![Type::class(number, vec![])]);
        let method = MethodDef {
            name: "pick".into(),
            type_params: vec![t],
            params: vec![Type::TypeVar(t)],
            return_type: Type::TypeVar(t),
            ..MethodDef::default()
        };
        let string = store.class_id("java.lang.String").unwrap();

        let mut sink = DiagnosticSink::new();
        check_type_arguments(
            &store,
            LanguageLevel::Jdk8,
            &TypeParamOwner::method(&method),
            &TypeArguments::Explicit(vec![Type::class(string, vec![])]),
            &InstantiationContext::default(),
            None,
            &mut sink,
        );
        assert_eq!(sink.diagnostics().len(), 1);
    }
}
