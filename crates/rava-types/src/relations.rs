//! Structural type relations: erasure, supertype instantiation, subtyping,
//! assignability and cast convertibility.
//!
//! These are best-effort oracle primitives for IDE-style checking. They never
//! panic: missing class metadata degrades to "not related" (or, for
//! `Unknown`/`Error` inputs, to "compatible" so a half-resolved model stays
//! quiet).

use std::collections::HashSet;

use crate::{
    ClassId, ClassKind, ClassType, PrimitiveType, Substitutor, Type, TypeEnv, TypeVarId,
    WildcardBound,
};

/// Resolve `Named` spellings to `Class` references where possible, recursing
/// into arguments so equivalent types compare equal regardless of how the
/// loader spelled them.
pub fn canonicalize_named(env: &dyn TypeEnv, ty: &Type) -> Type {
    match ty {
        Type::Named(name) => match env.lookup_class(name) {
            Some(id) => Type::class(id, vec![]),
            None => ty.clone(),
        },
        Type::Class(ClassType { def, args }) => Type::class(
            *def,
            args.iter().map(|a| canonicalize_named(env, a)).collect(),
        ),
        Type::Array(elem) => Type::Array(Box::new(canonicalize_named(env, elem))),
        Type::Wildcard(WildcardBound::Extends(upper)) => Type::Wildcard(WildcardBound::Extends(
            Box::new(canonicalize_named(env, upper)),
        )),
        Type::Wildcard(WildcardBound::Super(lower)) => Type::Wildcard(WildcardBound::Super(
            Box::new(canonicalize_named(env, lower)),
        )),
        Type::Intersection(parts) => {
            Type::Intersection(parts.iter().map(|p| canonicalize_named(env, p)).collect())
        }
        other => other.clone(),
    }
}

/// Structural equality after canonicalization. This is the oracle's
/// `equals(T, U)` used for diamond-conflict and override-signature checks.
pub fn types_equal(env: &dyn TypeEnv, a: &Type, b: &Type) -> bool {
    canonicalize_named(env, a) == canonicalize_named(env, b)
}

/// Type erasure per JLS 4.6.
pub fn erasure(env: &dyn TypeEnv, ty: &Type) -> Type {
    let mut seen = HashSet::new();
    erase(env, ty, &mut seen)
}

fn erase(env: &dyn TypeEnv, ty: &Type, seen: &mut HashSet<TypeVarId>) -> Type {
    match ty {
        Type::Class(ClassType { def, .. }) => Type::class(*def, vec![]),
        Type::Named(name) => match env.lookup_class(name) {
            Some(id) => Type::class(id, vec![]),
            None => ty.clone(),
        },
        Type::Array(elem) => Type::Array(Box::new(erase(env, elem, seen))),
        Type::TypeVar(id) => {
            // The erasure of a type variable is the erasure of its leftmost
            // bound; guard against cyclic parameter chains.
            if !seen.insert(*id) {
                return Type::class(env.well_known().object, vec![]);
            }
            let leftmost = env
                .type_param(*id)
                .and_then(|tp| tp.upper_bounds.first())
                .cloned();
            let out = match leftmost {
                Some(bound) => erase(env, &bound, seen),
                None => Type::class(env.well_known().object, vec![]),
            };
            seen.remove(id);
            out
        }
        Type::Wildcard(WildcardBound::Extends(upper)) => erase(env, upper, seen),
        Type::Wildcard(_) => Type::class(env.well_known().object, vec![]),
        Type::Intersection(parts) => parts
            .first()
            .map(|p| erase(env, p, seen))
            .unwrap_or_else(|| Type::class(env.well_known().object, vec![])),
        other => other.clone(),
    }
}

/// View `ty` as an instantiation of `target` by walking its supertype graph
/// and substituting type arguments along the way.
///
/// `ArrayList<String>` viewed as `java.util.List` yields `List<String>`; a raw
/// source stays raw all the way up because the raw substitutor erases every
/// supertype reference it rewrites.
pub fn instantiate_as_supertype(env: &dyn TypeEnv, ty: &Type, target: ClassId) -> Option<Type> {
    let mut seen_vars = HashSet::new();
    instantiate_inner(env, ty, target, &mut seen_vars)
}

fn instantiate_inner(
    env: &dyn TypeEnv,
    ty: &Type,
    target: ClassId,
    seen_vars: &mut HashSet<TypeVarId>,
) -> Option<Type> {
    match ty {
        Type::Array(_) => {
            let wk = env.well_known();
            if target == wk.object || target == wk.cloneable || target == wk.serializable {
                return Some(Type::class(target, vec![]));
            }
            None
        }
        Type::TypeVar(id) => {
            if !seen_vars.insert(*id) {
                return None;
            }
            let bounds = env.type_param(*id).map(|tp| tp.upper_bounds.clone());
            let out = bounds.and_then(|bounds| {
                bounds
                    .iter()
                    .find_map(|bound| instantiate_inner(env, bound, target, seen_vars))
            });
            seen_vars.remove(id);
            out
        }
        Type::Intersection(parts) => parts
            .iter()
            .find_map(|part| instantiate_inner(env, part, target, seen_vars)),
        Type::Named(_) => {
            let canon = canonicalize_named(env, ty);
            match canon {
                Type::Class(ct) => walk_class(env, &ct, target, &mut HashSet::new()),
                _ => None,
            }
        }
        Type::Class(ct) => walk_class(env, ct, target, &mut HashSet::new()),
        _ => None,
    }
}

fn walk_class(
    env: &dyn TypeEnv,
    current: &ClassType,
    target: ClassId,
    seen: &mut HashSet<ClassId>,
) -> Option<Type> {
    if current.def == target {
        return Some(Type::Class(current.clone()));
    }
    if !seen.insert(current.def) {
        return None;
    }
    let def = env.class(current.def)?;
    let subst = Substitutor::for_class_type(env, current);

    for declared in def.super_class.iter().chain(def.interfaces.iter()) {
        let sup = canonicalize_named(env, &subst.apply(env, declared));
        if let Type::Class(ct) = sup {
            if let Some(found) = walk_class(env, &ct, target, seen) {
                return Some(found);
            }
        }
    }

    // Every interface implicitly has Object as a supertype (JLS 4.10.2).
    if def.kind == ClassKind::Interface && target == env.well_known().object {
        return Some(Type::class(target, vec![]));
    }
    None
}

/// `isInheritor(sub, sup, strict)`: does `sub` extend/implement `sup`
/// (transitively)? With `strict` the classes must differ.
pub fn is_inheritor(env: &dyn TypeEnv, sub: ClassId, sup: ClassId, strict: bool) -> bool {
    if sub == sup {
        return !strict;
    }
    instantiate_as_supertype(env, &Type::class(sub, vec![]), sup).is_some()
}

/// Subtyping per JLS 4.10, with wildcard containment (4.5.1) for generic
/// arguments. Generics stay invariant without wildcards; a raw source is not
/// a subtype of a parameterized target (that is an unchecked assignment,
/// handled by [`is_assignable`]).
pub fn is_subtype(env: &dyn TypeEnv, sub: &Type, sup: &Type) -> bool {
    if sub.is_errorish() || sup.is_errorish() {
        return true;
    }
    let sub = canonicalize_named(env, sub);
    let sup = canonicalize_named(env, sup);
    if sub == sup {
        return true;
    }
    match (&sub, &sup) {
        (_, Type::Intersection(parts)) => parts.iter().all(|p| is_subtype(env, &sub, p)),
        (Type::Intersection(parts), _) => parts.iter().any(|p| is_subtype(env, p, &sup)),
        (Type::Array(a), Type::Array(b)) => match (a.as_ref(), b.as_ref()) {
            (Type::Primitive(pa), Type::Primitive(pb)) => pa == pb,
            (elem_a, elem_b) if elem_a.is_reference() && elem_b.is_reference() => {
                is_subtype(env, elem_a, elem_b)
            }
            _ => false,
        },
        (_, Type::Class(sup_ct)) if sub.is_reference() => {
            match instantiate_as_supertype(env, &sub, sup_ct.def) {
                Some(Type::Class(found)) => args_contained(env, &found, sup_ct),
                _ => false,
            }
        }
        (Type::TypeVar(id), _) => env
            .type_param(*id)
            .map(|tp| tp.upper_bounds.iter().any(|b| is_subtype(env, b, &sup)))
            .unwrap_or(false),
        _ => false,
    }
}

fn args_contained(env: &dyn TypeEnv, found: &ClassType, sup: &ClassType) -> bool {
    if sup.args.is_empty() {
        // Raw target: every instantiation converts to it.
        return true;
    }
    if found.args.is_empty() {
        return false;
    }
    if found.args.len() != sup.args.len() {
        return false;
    }
    found
        .args
        .iter()
        .zip(sup.args.iter())
        .all(|(sub_arg, sup_arg)| contains(env, sup_arg, sub_arg))
}

/// Type-argument containment, JLS 4.5.1: does `sup_arg` contain `sub_arg`?
fn contains(env: &dyn TypeEnv, sup_arg: &Type, sub_arg: &Type) -> bool {
    if sup_arg.is_errorish() || sub_arg.is_errorish() {
        return true;
    }
    if types_equal(env, sup_arg, sub_arg) {
        return true;
    }
    match sup_arg {
        Type::Wildcard(WildcardBound::Unbounded) => true,
        Type::Wildcard(WildcardBound::Extends(upper)) => {
            is_subtype(env, &upper_bound_of(env, sub_arg), upper)
        }
        Type::Wildcard(WildcardBound::Super(lower)) => match lower_bound_of(sub_arg) {
            Some(low) => is_subtype(env, lower, &low),
            None => false,
        },
        _ => false,
    }
}

fn upper_bound_of(env: &dyn TypeEnv, arg: &Type) -> Type {
    match arg {
        Type::Wildcard(WildcardBound::Extends(upper)) => (**upper).clone(),
        Type::Wildcard(_) => Type::class(env.well_known().object, vec![]),
        other => other.clone(),
    }
}

fn lower_bound_of(arg: &Type) -> Option<Type> {
    match arg {
        Type::Wildcard(WildcardBound::Super(lower)) => Some((**lower).clone()),
        Type::Wildcard(_) => None,
        other => Some(other.clone()),
    }
}

/// Assignment conversion (JLS 5.2): subtyping plus primitive widening,
/// boxing/unboxing, the unchecked raw-to-parameterized conversion, and
/// capture lower bounds.
pub fn is_assignable(env: &dyn TypeEnv, from: &Type, to: &Type) -> bool {
    if from.is_errorish() || to.is_errorish() {
        return true;
    }
    let from = canonicalize_named(env, from);
    let to = canonicalize_named(env, to);
    if is_subtype(env, &from, &to) {
        return true;
    }
    match (&from, &to) {
        (Type::Primitive(a), Type::Primitive(b)) => widens(*a, *b),
        (Type::Primitive(p), _) => {
            // Boxing, then reference widening.
            match env.lookup_class(p.boxed_name()) {
                Some(id) => is_subtype(env, &Type::class(id, vec![]), &to),
                None => false,
            }
        }
        (Type::Class(ct), Type::Primitive(p)) => {
            // Unboxing, then primitive widening.
            match unboxed(env, ct.def) {
                Some(q) => q == *p || widens(q, *p),
                None => false,
            }
        }
        (_, Type::TypeVar(id)) => env
            .type_param(*id)
            .and_then(|tp| tp.lower_bound.as_ref())
            .map(|lower| is_subtype(env, &from, lower))
            .unwrap_or(false),
        (Type::Class(_), Type::Class(to_ct)) => {
            // Unchecked assignment of a raw value to a parameterized target.
            matches!(
                instantiate_as_supertype(env, &from, to_ct.def),
                Some(Type::Class(found)) if found.args.is_empty()
            )
        }
        _ => false,
    }
}

/// Cast conversion (JLS 5.5), approximated: assignability in either
/// direction, numeric casts, and up/down casts through interfaces.
pub fn is_convertible(env: &dyn TypeEnv, from: &Type, to: &Type) -> bool {
    if is_assignable(env, from, to) || is_assignable(env, to, from) {
        return true;
    }
    let from = canonicalize_named(env, from);
    let to = canonicalize_named(env, to);
    match (&from, &to) {
        (Type::Primitive(a), Type::Primitive(b)) => a.is_numeric() && b.is_numeric(),
        (Type::Class(a), Type::Class(b)) => {
            let a_iface = env.is_interface(a.def);
            let b_iface = env.is_interface(b.def);
            let a_final = env.class(a.def).map(|c| c.is_final).unwrap_or(false);
            let b_final = env.class(b.def).map(|c| c.is_final).unwrap_or(false);
            (a_iface && !b_final) || (b_iface && !a_final)
        }
        _ => false,
    }
}

fn unboxed(env: &dyn TypeEnv, class: ClassId) -> Option<PrimitiveType> {
    let name = env.class_name(class)?;
    for prim in [
        PrimitiveType::Byte,
        PrimitiveType::Char,
        PrimitiveType::Double,
        PrimitiveType::Float,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Short,
        PrimitiveType::Boolean,
    ] {
        if prim.boxed_name() == name {
            return Some(prim);
        }
    }
    None
}

fn widens(from: PrimitiveType, to: PrimitiveType) -> bool {
    use PrimitiveType::*;
    matches!(
        (from, to),
        (Byte, Short | Int | Long | Float | Double)
            | (Short, Int | Long | Float | Double)
            | (Char, Int | Long | Float | Double)
            | (Int, Long | Float | Double)
            | (Long, Float | Double)
            | (Float, Double)
    )
}

/// Exceptions assignable to `RuntimeException` or `Error` need not be
/// declared; everything else under `Throwable` is checked.
pub fn is_unchecked_exception(env: &dyn TypeEnv, ty: &Type) -> bool {
    let wk = env.well_known();
    is_assignable(env, ty, &Type::class(wk.runtime_exception, vec![]))
        || is_assignable(env, ty, &Type::class(wk.error, vec![]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn erasure_discards_type_arguments() {
        let env = TypeStore::with_minimal_jdk();
        let list = env.class_id("java.util.List").unwrap();
        let string = env.well_known().string;

        let list_string = Type::class(list, vec![Type::class(string, vec![])]);
        assert_eq!(erasure(&env, &list_string), Type::class(list, vec![]));
    }

    #[test]
    fn erasure_of_type_var_is_leftmost_bound() {
        let mut env = TypeStore::with_minimal_jdk();
        let number = env.well_known().number;
        let t = env.add_type_param("T", vec![Type::class(number, vec![])]);

        assert_eq!(erasure(&env, &Type::TypeVar(t)), Type::class(number, vec![]));
    }

    #[test]
    fn instantiate_as_supertype_substitutes_through_two_levels() {
        let env = TypeStore::with_minimal_jdk();
        let array_list = env.class_id("java.util.ArrayList").unwrap();
        let iterable = env.class_id("java.lang.Iterable").unwrap();
        let string = env.well_known().string;
        let string_ty = Type::class(string, vec![]);

        let found = instantiate_as_supertype(
            &env,
            &Type::class(array_list, vec![string_ty.clone()]),
            iterable,
        )
        .unwrap();
        assert_eq!(found, Type::class(iterable, vec![string_ty]));
    }

    #[test]
    fn raw_source_stays_raw_up_the_hierarchy() {
        let env = TypeStore::with_minimal_jdk();
        let array_list = env.class_id("java.util.ArrayList").unwrap();
        let list = env.class_id("java.util.List").unwrap();

        let found =
            instantiate_as_supertype(&env, &Type::class(array_list, vec![]), list).unwrap();
        assert_eq!(found, Type::class(list, vec![]));
    }

    #[test]
    fn generics_are_invariant_without_wildcards() {
        let env = TypeStore::with_minimal_jdk();
        let list = env.class_id("java.util.List").unwrap();
        let string = env.well_known().string;
        let object = env.well_known().object;

        let list_string = Type::class(list, vec![Type::class(string, vec![])]);
        let list_object = Type::class(list, vec![Type::class(object, vec![])]);
        assert!(!is_subtype(&env, &list_string, &list_object));
        assert!(is_subtype(&env, &list_string, &list_string));
    }

    #[test]
    fn extends_wildcard_containment() {
        let env = TypeStore::with_minimal_jdk();
        let list = env.class_id("java.util.List").unwrap();
        let string = env.well_known().string;
        let object = env.well_known().object;

        let list_string = Type::class(list, vec![Type::class(string, vec![])]);
        let list_extends_object = Type::class(
            list,
            vec![Type::Wildcard(WildcardBound::Extends(Box::new(
                Type::class(object, vec![]),
            )))],
        );
        assert!(is_subtype(&env, &list_string, &list_extends_object));
        assert!(!is_subtype(&env, &list_extends_object, &list_string));
    }

    #[test]
    fn boxing_and_widening_assignment() {
        let env = TypeStore::with_minimal_jdk();
        let integer = env.well_known().integer;
        let number = env.well_known().number;

        assert!(is_assignable(&env, &Type::int(), &Type::class(integer, vec![])));
        assert!(is_assignable(&env, &Type::int(), &Type::class(number, vec![])));
        assert!(is_assignable(
            &env,
            &Type::class(integer, vec![]),
            &Type::int()
        ));
        assert!(is_assignable(
            &env,
            &Type::int(),
            &Type::Primitive(PrimitiveType::Long)
        ));
        assert!(!is_assignable(
            &env,
            &Type::Primitive(PrimitiveType::Long),
            &Type::int()
        ));
    }

    #[test]
    fn raw_assignment_is_unchecked_but_allowed() {
        let env = TypeStore::with_minimal_jdk();
        let list = env.class_id("java.util.List").unwrap();
        let array_list = env.class_id("java.util.ArrayList").unwrap();
        let string = env.well_known().string;

        let raw = Type::class(array_list, vec![]);
        let list_string = Type::class(list, vec![Type::class(string, vec![])]);
        assert!(is_assignable(&env, &raw, &list_string));
        assert!(!is_subtype(&env, &raw, &list_string));
    }

    #[test]
    fn checked_vs_unchecked_exceptions() {
        let env = TypeStore::with_minimal_jdk();
        let io = env.class_id("java.io.IOException").unwrap();
        let iae = env.class_id("java.lang.IllegalArgumentException").unwrap();

        assert!(!is_unchecked_exception(&env, &Type::class(io, vec![])));
        assert!(is_unchecked_exception(&env, &Type::class(iae, vec![])));
    }

    #[test]
    fn inheritor_walks_interfaces() {
        let env = TypeStore::with_minimal_jdk();
        let array_list = env.class_id("java.util.ArrayList").unwrap();
        let iterable = env.class_id("java.lang.Iterable").unwrap();
        let object = env.well_known().object;

        assert!(is_inheritor(&env, array_list, iterable, true));
        assert!(is_inheritor(&env, iterable, object, true));
        assert!(is_inheritor(&env, array_list, array_list, false));
        assert!(!is_inheritor(&env, array_list, array_list, true));
    }
}
