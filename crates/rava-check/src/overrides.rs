//! Override compatibility checking.
//!
//! For every method of a subject class this module evaluates the inherited
//! signatures with the same erasure: static/instance consistency, final
//! overrides, access monotonicity, covariant returns, throws narrowing,
//! same-erasure clashes and default-method diamonds. Only the first failed
//! rule per method is reported; clash detection is order-independent via a
//! per-class reported-signature set.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use rava_types::{
    erasure, is_assignable, is_inheritor, is_unchecked_exception, types_equal, ClassDef, ClassId,
    MethodDef, Substitutor, Type, TypeEnv,
};

use crate::diagnostics::{ClashRelation, DiagnosticKind, DiagnosticSink};
use crate::hierarchy::{self, ClassHierarchy, HierarchicalSignature, MethodSignature};
use crate::LanguageLevel;

/// Run every override-related rule for `subject`, appending diagnostics to
/// `sink`. Pure over its inputs; all scratch state is local to the call.
pub fn check_class(
    env: &dyn TypeEnv,
    level: LanguageLevel,
    subject: ClassId,
    sink: &mut DiagnosticSink,
) {
    let Some(subject_def) = env.class(subject) else {
        return;
    };
    trace!(class = %subject_def.name, "checking overrides");
    let hierarchy = hierarchy::collect(env, subject, sink);

    check_erasure_clashes(env, level, subject_def, &hierarchy, sink);

    for own in hierarchy.own_signatures() {
        check_super_signatures(env, level, subject_def, own, &hierarchy, sink);
    }

    if level.has_default_methods() {
        check_default_conflicts(env, subject, subject_def, &hierarchy, sink);
    }
}

/// Same-erasure collision scan over every signature visible from the subject
/// class. The `same_erasure` map and `reported` set are scoped to this call,
/// so entries never leak across classes checked in the same pass.
fn check_erasure_clashes(
    env: &dyn TypeEnv,
    level: LanguageLevel,
    subject_def: &ClassDef,
    hierarchy: &ClassHierarchy,
    sink: &mut DiagnosticSink,
) {
    let mut same_erasure: HashMap<&MethodSignature, Vec<&HierarchicalSignature>> = HashMap::new();
    let mut reported: HashSet<&MethodSignature> = HashSet::new();

    for sig in &hierarchy.signatures {
        let Some(method) = sig.method_def(env) else {
            continue;
        };
        if is_uninherited_interface_static(env, sig, method) {
            continue;
        }
        // Every earlier signature with the same erasure is a comparison
        // partner. A raw-boundary member is override-consistent with
        // anything, so stopping at the first bucket entry would hide a
        // clash between two later members.
        let bucket = same_erasure.entry(&sig.signature).or_default();
        for prior in bucket.iter().copied() {
            if is_override_consistent(env, prior, sig) {
                continue;
            }
            let Some(prior_method) = prior.method_def(env) else {
                continue;
            };
            let relation = if prior.own && sig.own {
                ClashRelation::SameClass
            } else if prior_method.is_static && method.is_static {
                ClashRelation::Hides
            } else {
                ClashRelation::Overrides
            };
            // Static-hide clashes only became errors with the JDK 7 compiler.
            if relation == ClashRelation::Hides && !level.has_diamond() {
                continue;
            }
            if !reported.insert(&sig.signature) {
                break;
            }
            let span = own_span(prior, sig, env).or(subject_def.span);
            sink.error(
                DiagnosticKind::SameErasureClash {
                    first: prior.method,
                    second: sig.method,
                    relation,
                },
                span,
            );
            break;
        }
        bucket.push(sig);
    }
}

/// Evaluate `own` against every inherited signature with the same erasure,
/// short-circuiting after the first diagnostic for this method.
fn check_super_signatures(
    env: &dyn TypeEnv,
    level: LanguageLevel,
    subject_def: &ClassDef,
    own: &HierarchicalSignature,
    hierarchy: &ClassHierarchy,
    sink: &mut DiagnosticSink,
) {
    let Some(method) = own.method_def(env) else {
        return;
    };
    for sup in hierarchy.inherited_signatures() {
        if sup.signature != own.signature {
            continue;
        }
        let Some(super_method) = sup.method_def(env) else {
            continue;
        };
        if is_uninherited_interface_static(env, sup, super_method) {
            continue;
        }
        if !is_real_override(env, own, sup) {
            // Same erasure without an override relation: the clash scan owns
            // this pair.
            continue;
        }
        if let Some(kind) = check_pair(env, level, own, method, sup, super_method) {
            sink.error(kind, method.span.or(subject_def.span));
            return;
        }
    }
}

fn check_pair(
    env: &dyn TypeEnv,
    level: LanguageLevel,
    own: &HierarchicalSignature,
    method: &MethodDef,
    sup: &HierarchicalSignature,
    super_method: &MethodDef,
) -> Option<DiagnosticKind> {
    if method.is_static != super_method.is_static {
        return Some(DiagnosticKind::StaticOverrideMismatch {
            method: own.method,
            super_method: sup.method,
            method_is_static: method.is_static,
        });
    }

    if super_method.is_final {
        return Some(DiagnosticKind::FinalMethodOverride {
            method: own.method,
            super_method: sup.method,
        });
    }

    if method.access < super_method.access {
        return Some(DiagnosticKind::WeakerAccessPrivileges {
            method: own.method,
            super_method: sup.method,
            found: method.access,
            required: super_method.access,
        });
    }

    let unifier = method_unifier(method, super_method);

    // Return type: covariance since Java 5, identical erasures before.
    let own_return = own.substituted_return(env);
    let super_return = unifier.apply(env, &sup.substituted_return(env));
    let return_ok = if level.has_generics() {
        is_assignable(env, &own_return, &super_return)
    } else {
        types_equal(
            env,
            &erasure(env, &own_return),
            &erasure(env, &super_return),
        )
    };
    if !return_ok {
        return Some(DiagnosticKind::IncompatibleReturnType {
            method: own.method,
            super_method: sup.method,
            found: own_return,
            required: super_return,
        });
    }

    // Throws: every checked exception of the override must be covered by
    // some declared exception of the overridden method.
    let super_throws: Vec<Type> = sup
        .substituted_throws(env)
        .into_iter()
        .map(|t| unifier.apply(env, &t))
        .collect();
    for thrown in own.substituted_throws(env) {
        if is_unchecked_exception(env, &thrown) {
            continue;
        }
        let covered = super_throws
            .iter()
            .any(|declared| is_assignable(env, &thrown, declared));
        if !covered {
            return Some(DiagnosticKind::IncompatibleThrows {
                method: own.method,
                super_method: sup.method,
                exception: thrown,
            });
        }
    }

    None
}

/// Interface static methods are never inherited, so they neither override
/// nor clash at the subject class.
fn is_uninherited_interface_static(
    env: &dyn TypeEnv,
    sig: &HierarchicalSignature,
    method: &MethodDef,
) -> bool {
    !sig.own && method.is_static && env.is_interface(sig.method.class)
}

/// Does `own` actually override `sup`, rather than merely colliding under
/// erasure? Across a raw supertype boundary the erased signature match is the
/// override relation; otherwise the substituted parameter types must agree
/// (after unifying method-level type parameters positionally).
fn is_real_override(
    env: &dyn TypeEnv,
    own: &HierarchicalSignature,
    sup: &HierarchicalSignature,
) -> bool {
    let (Some(method), Some(super_method)) = (own.method_def(env), sup.method_def(env)) else {
        return false;
    };
    if sup.substitutor.is_raw() {
        return true;
    }
    if method.type_params.len() != super_method.type_params.len() {
        return false;
    }
    let unifier = method_unifier(method, super_method);
    let own_params = own.substituted_params(env);
    let super_params = sup.substituted_params(env);
    if own_params.len() != super_params.len() {
        return false;
    }
    own_params
        .iter()
        .zip(super_params.iter())
        .all(|(a, b)| types_equal(env, a, &unifier.apply(env, b)))
}

/// Positional renaming of the super method's type parameters to the
/// overriding method's, so `<T> T m(T)` matches `<S> S m(S)`.
fn method_unifier(method: &MethodDef, super_method: &MethodDef) -> Substitutor {
    if method.type_params.len() != super_method.type_params.len() {
        return Substitutor::identity();
    }
    let mut unifier = Substitutor::identity();
    for (sup_param, own_param) in super_method
        .type_params
        .iter()
        .zip(method.type_params.iter())
    {
        unifier = unifier.with(*sup_param, Type::TypeVar(*own_param));
    }
    unifier
}

fn own_span(
    prior: &HierarchicalSignature,
    current: &HierarchicalSignature,
    env: &dyn TypeEnv,
) -> Option<rava_types::Span> {
    for sig in [current, prior] {
        if sig.own {
            if let Some(span) = sig.method_def(env).and_then(|m| m.span) {
                return Some(span);
            }
        }
    }
    None
}

/// Erasure clashes have no override relation; two inherited signatures are
/// consistent when they agree on parameter types (a shared declaration or a
/// legal duplicate inherit), or when one genuinely overrides the other.
fn is_override_consistent(
    env: &dyn TypeEnv,
    first: &HierarchicalSignature,
    second: &HierarchicalSignature,
) -> bool {
    is_real_override(env, second, first) || is_real_override(env, first, second)
}

/// Default-method diamonds (JLS 9.4.1.3 / 8.4.8.4): a class inheriting two
/// unrelated same-signature interface members where at least one is a
/// default.
fn check_default_conflicts(
    env: &dyn TypeEnv,
    subject: ClassId,
    subject_def: &ClassDef,
    hierarchy: &ClassHierarchy,
    sink: &mut DiagnosticSink,
) {
    let declared_by_subject: HashSet<&MethodSignature> = hierarchy
        .own_signatures()
        .map(|sig| &sig.signature)
        .collect();

    // Candidate interface members: instance methods not redeclared by the
    // subject and not implemented by a concrete superclass method.
    let mut groups: Vec<(&MethodSignature, Vec<&HierarchicalSignature>)> = Vec::new();
    for sig in hierarchy.inherited_signatures() {
        let Some(method) = sig.method_def(env) else {
            continue;
        };
        if method.is_static || !env.is_interface(sig.method.class) {
            continue;
        }
        if declared_by_subject.contains(&sig.signature) {
            continue;
        }
        let implemented_by_class = hierarchy.inherited_signatures().any(|other| {
            !env.is_interface(other.method.class)
                && other.signature == sig.signature
                && other
                    .method_def(env)
                    .map(|m| !m.is_abstract)
                    .unwrap_or(false)
        });
        if implemented_by_class {
            continue;
        }
        match groups.iter_mut().find(|(key, _)| **key == sig.signature) {
            Some((_, members)) => members.push(sig),
            None => groups.push((&sig.signature, vec![sig])),
        }
    }

    for (signature, members) in groups {
        if members.len() < 2 {
            continue;
        }
        // Keep only maximally specific members: drop anything redeclared by
        // a subinterface that is also in the group.
        let specific: Vec<&HierarchicalSignature> = members
            .iter()
            .copied()
            .filter(|sig| {
                !members.iter().any(|other| {
                    other.method.class != sig.method.class
                        && is_inheritor(env, other.method.class, sig.method.class, true)
                })
            })
            .collect();
        if specific.len() < 2 {
            continue;
        }

        let mut conflict = None;
        'outer: for (i, first) in specific.iter().enumerate() {
            for second in &specific[i + 1..] {
                if is_inheritor(env, first.method.class, second.method.class, false)
                    || is_inheritor(env, second.method.class, first.method.class, false)
                {
                    continue;
                }
                let (Some(a), Some(b)) = (first.method_def(env), second.method_def(env)) else {
                    continue;
                };
                match (a.is_default, b.is_default) {
                    (true, true) => {
                        conflict = Some((first, second, false));
                        break 'outer;
                    }
                    (true, false) | (false, true) if !subject_def.is_abstract => {
                        // A concrete class must implement the abstract side.
                        conflict = Some((first, second, true));
                        break 'outer;
                    }
                    _ => {}
                }
            }
        }

        if let Some((first, second, abstract_conflict)) = conflict {
            sink.error(
                DiagnosticKind::UnrelatedDefaultMethods {
                    class: subject,
                    method_name: signature.name.clone(),
                    first: first.method,
                    second: second.method,
                    abstract_conflict,
                },
                subject_def.span,
            );
        }
    }
}
