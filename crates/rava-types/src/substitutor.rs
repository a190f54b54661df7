//! Type-parameter substitution.
//!
//! A [`Substitutor`] maps type parameters to types and rewrites types through
//! that mapping. Substitutors compose when walking from a subtype to a
//! supertype: the inner substitutor expresses a supertype reference as seen
//! from the subtype, the outer one re-expresses the result in terms of the
//! subject class. Composition is associative but not commutative.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::{erasure, ClassType, Type, TypeEnv, TypeVarId, WildcardBound};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubstitutionError {
    #[error("expected {expected} type arguments, got {found}")]
    ArityMismatch { expected: usize, found: usize },
    #[error("type parameter `{name}` is mapped through itself")]
    CyclicReference { name: String },
}

/// An immutable mapping from type parameters to types.
///
/// A raw substitutor models legacy erasure mode: applying it to any type
/// yields that type's erasure, regardless of the mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitutor {
    map: HashMap<TypeVarId, Type>,
    raw: bool,
}

impl Substitutor {
    /// The identity substitutor: applying it returns types unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    /// The erasing substitutor used for raw supertype references.
    pub fn raw() -> Self {
        Self {
            map: HashMap::new(),
            raw: true,
        }
    }

    /// Build a substitutor from parallel parameter/argument lists.
    ///
    /// Rejects arity mismatches and mappings where a parameter's replacement
    /// reaches the parameter itself through other mapped parameters; such an
    /// input could never be produced by a well-formed resolved model.
    pub fn from_pairs(
        params: &[TypeVarId],
        args: &[Type],
    ) -> Result<Self, SubstitutionError> {
        if params.len() != args.len() {
            return Err(SubstitutionError::ArityMismatch {
                expected: params.len(),
                found: args.len(),
            });
        }
        let mut map = HashMap::with_capacity(params.len());
        for (param, arg) in params.iter().copied().zip(args.iter().cloned()) {
            // `T -> T` is the identity on that parameter, not a cycle.
            if arg == Type::TypeVar(param) {
                continue;
            }
            map.insert(param, arg);
        }
        let subst = Self { map, raw: false };
        for param in params.iter().copied() {
            if subst.reaches_itself(param) {
                return Err(SubstitutionError::CyclicReference {
                    name: format!("#{}", param.0),
                });
            }
        }
        Ok(subst)
    }

    /// Build the substitutor for a class reference: the definition's declared
    /// parameters mapped to the reference's arguments. A raw reference to a
    /// generic definition yields the raw (erasing) substitutor.
    pub fn for_class_type(env: &dyn TypeEnv, class_type: &ClassType) -> Self {
        let Some(def) = env.class(class_type.def) else {
            return Self::identity();
        };
        if def.type_params.is_empty() {
            return Self::identity();
        }
        if class_type.args.is_empty() {
            return Self::raw();
        }
        let mut map = HashMap::with_capacity(def.type_params.len());
        for (idx, param) in def.type_params.iter().copied().enumerate() {
            map.insert(
                param,
                class_type.args.get(idx).cloned().unwrap_or(Type::Unknown),
            );
        }
        Self { map, raw: false }
    }

    pub fn with(mut self, param: TypeVarId, ty: Type) -> Self {
        self.map.insert(param, ty);
        self
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    pub fn is_identity(&self) -> bool {
        !self.raw && self.map.is_empty()
    }

    pub fn lookup(&self, param: TypeVarId) -> Option<&Type> {
        self.map.get(&param)
    }

    /// Compose two substitutors: `compose(env, outer, inner).apply(ty)` equals
    /// `outer.apply(inner.apply(ty))`. Rawness is absorbing: once a raw
    /// supertype boundary has been crossed everything above it is erased.
    pub fn compose(env: &dyn TypeEnv, outer: &Substitutor, inner: &Substitutor) -> Substitutor {
        if inner.raw || outer.raw {
            return Substitutor::raw();
        }
        let mut map = HashMap::with_capacity(inner.map.len() + outer.map.len());
        for (param, ty) in &inner.map {
            map.insert(*param, outer.apply(env, ty));
        }
        for (param, ty) in &outer.map {
            map.entry(*param).or_insert_with(|| ty.clone());
        }
        Substitutor { map, raw: false }
    }

    /// Rewrite `ty` through this substitutor.
    ///
    /// A substituted type may itself contain mapped type parameters, so type
    /// variables are chased to a fixed point. Re-entering a variable already
    /// being expanded leaves it in place instead of recursing forever.
    /// Substituting an unmapped parameter is the identity. Never fails.
    pub fn apply(&self, env: &dyn TypeEnv, ty: &Type) -> Type {
        if self.raw {
            return erasure(env, ty);
        }
        if self.map.is_empty() {
            return ty.clone();
        }
        let mut expanding = HashSet::new();
        self.apply_inner(env, ty, &mut expanding)
    }

    pub fn apply_all(&self, env: &dyn TypeEnv, types: &[Type]) -> Vec<Type> {
        types.iter().map(|t| self.apply(env, t)).collect()
    }

    fn apply_inner(
        &self,
        env: &dyn TypeEnv,
        ty: &Type,
        expanding: &mut HashSet<TypeVarId>,
    ) -> Type {
        match ty {
            Type::TypeVar(id) => {
                let Some(mapped) = self.map.get(id) else {
                    return ty.clone();
                };
                if !expanding.insert(*id) {
                    return ty.clone();
                }
                let out = self.apply_inner(env, mapped, expanding);
                expanding.remove(id);
                out
            }
            Type::Class(ClassType { def, args }) => {
                let args = args
                    .iter()
                    .map(|a| self.apply_inner(env, a, expanding))
                    .collect();
                Type::class(*def, args)
            }
            Type::Array(elem) => Type::Array(Box::new(self.apply_inner(env, elem, expanding))),
            Type::Wildcard(WildcardBound::Extends(upper)) => Type::Wildcard(
                WildcardBound::Extends(Box::new(self.apply_inner(env, upper, expanding))),
            ),
            Type::Wildcard(WildcardBound::Super(lower)) => Type::Wildcard(WildcardBound::Super(
                Box::new(self.apply_inner(env, lower, expanding)),
            )),
            Type::Intersection(parts) => Type::Intersection(
                parts
                    .iter()
                    .map(|p| self.apply_inner(env, p, expanding))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn reaches_itself(&self, start: TypeVarId) -> bool {
        fn occurs(map: &HashMap<TypeVarId, Type>, target: TypeVarId, ty: &Type, depth: usize) -> bool {
            if depth > map.len() + 1 {
                return true;
            }
            match ty {
                Type::TypeVar(id) => {
                    if *id == target {
                        return true;
                    }
                    map.get(id)
                        .map(|next| occurs(map, target, next, depth + 1))
                        .unwrap_or(false)
                }
                Type::Class(ClassType { args, .. }) => {
                    // Arguments do not re-expand through the substitutor once
                    // substituted (F-bounded uses like `T -> Comparable<T>`
                    // appear inside class arguments and are legal).
                    let _ = args;
                    false
                }
                _ => false,
            }
        }
        self.map
            .get(&start)
            .map(|ty| occurs(&self.map, start, ty, 0))
            .unwrap_or(false)
    }
}
