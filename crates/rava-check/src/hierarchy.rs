//! Hierarchy signature collection.
//!
//! Walks a class's transitive supertypes depth-first in declaration order,
//! composing substitutors along each edge so every inherited member signature
//! is expressed in terms of the subject class. The same ancestor reached
//! through two paths with different type-argument bindings is a diamond
//! conflict, reported exactly once per ancestor.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use rava_types::{
    canonicalize_named, erasure, types_equal, Access, ClassId, MethodDef, MethodId, Substitutor,
    Type, TypeEnv,
};

use crate::diagnostics::{DiagnosticKind, DiagnosticSink};

/// A method name plus erased parameter types: the key for same-erasure
/// collision detection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub name: String,
    pub erased_params: Vec<Type>,
}

impl MethodSignature {
    pub fn of(env: &dyn TypeEnv, method: &MethodDef, substitutor: &Substitutor) -> Self {
        let erased_params = method
            .params
            .iter()
            .map(|p| erasure(env, &substitutor.apply(env, p)))
            .collect();
        Self {
            name: method.name.clone(),
            erased_params,
        }
    }

    pub fn arity(&self) -> usize {
        self.erased_params.len()
    }
}

/// A member signature visible from the subject class, with the substitutor
/// already composed (supertype ∘ subtype); checkers never compose further.
#[derive(Clone, Debug, PartialEq)]
pub struct HierarchicalSignature {
    pub method: MethodId,
    pub substitutor: Substitutor,
    pub signature: MethodSignature,
    /// True when the declaring class is the subject class itself.
    pub own: bool,
}

impl HierarchicalSignature {
    pub fn method_def<'e>(&self, env: &'e dyn TypeEnv) -> Option<&'e MethodDef> {
        env.method(self.method)
    }

    pub fn substituted_params(&self, env: &dyn TypeEnv) -> Vec<Type> {
        self.method_def(env)
            .map(|m| self.substitutor.apply_all(env, &m.params))
            .unwrap_or_default()
    }

    pub fn substituted_return(&self, env: &dyn TypeEnv) -> Type {
        self.method_def(env)
            .map(|m| self.substitutor.apply(env, &m.return_type))
            .unwrap_or(Type::Unknown)
    }

    pub fn substituted_throws(&self, env: &dyn TypeEnv) -> Vec<Type> {
        self.method_def(env)
            .map(|m| self.substitutor.apply_all(env, &m.throws))
            .unwrap_or_default()
    }
}

/// Everything the override checker needs about one subject class. Built fresh
/// per class; never cached or shared.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassHierarchy {
    pub subject: ClassId,
    /// Ancestors in depth-first declaration order, each with the substitutor
    /// expressing it relative to the subject.
    pub ancestors: Vec<(ClassId, Substitutor)>,
    /// Subject-declared signatures first, then inherited ones in ancestor
    /// order.
    pub signatures: Vec<HierarchicalSignature>,
}

impl ClassHierarchy {
    pub fn own_signatures(&self) -> impl Iterator<Item = &HierarchicalSignature> {
        self.signatures.iter().filter(|s| s.own)
    }

    pub fn inherited_signatures(&self) -> impl Iterator<Item = &HierarchicalSignature> {
        self.signatures.iter().filter(|s| !s.own)
    }

    pub fn ancestor_substitutor(&self, class: ClassId) -> Option<&Substitutor> {
        self.ancestors
            .iter()
            .find(|(id, _)| *id == class)
            .map(|(_, s)| s)
    }
}

/// Collect the hierarchy of `subject`, emitting at most one
/// `MultipleInheritanceConflict` per conflicting ancestor into `sink`.
pub fn collect(env: &dyn TypeEnv, subject: ClassId, sink: &mut DiagnosticSink) -> ClassHierarchy {
    trace!(subject = subject.index(), "collecting hierarchy signatures");
    let mut walker = Walker {
        env,
        subject,
        recorded: HashMap::new(),
        order: Vec::new(),
        conflicted: HashSet::new(),
        path: vec![subject],
        sink,
    };

    if let Some(def) = env.class(subject) {
        let identity = Substitutor::identity();
        for declared in def.super_class.iter().chain(def.interfaces.iter()) {
            walker.visit(declared, &identity);
        }
    }

    let Walker {
        recorded, order, ..
    } = walker;

    let mut signatures = Vec::new();
    if let Some(def) = env.class(subject) {
        let identity = Substitutor::identity();
        for (index, method) in def.methods.iter().enumerate() {
            signatures.push(HierarchicalSignature {
                method: MethodId {
                    class: subject,
                    index,
                },
                substitutor: identity.clone(),
                signature: MethodSignature::of(env, method, &identity),
                own: true,
            });
        }
    }

    let mut ancestors = Vec::with_capacity(order.len());
    for class in order {
        let substitutor = recorded
            .get(&class)
            .cloned()
            .unwrap_or_else(Substitutor::identity);
        if let Some(def) = env.class(class) {
            for (index, method) in def.methods.iter().enumerate() {
                // Private members are not inherited (and, since Java 9,
                // interfaces may declare them too).
                if method.access == Access::Private {
                    continue;
                }
                signatures.push(HierarchicalSignature {
                    method: MethodId { class, index },
                    substitutor: substitutor.clone(),
                    signature: MethodSignature::of(env, method, &substitutor),
                    own: false,
                });
            }
        }
        ancestors.push((class, substitutor));
    }

    ClassHierarchy {
        subject,
        ancestors,
        signatures,
    }
}

struct Walker<'a> {
    env: &'a dyn TypeEnv,
    subject: ClassId,
    recorded: HashMap<ClassId, Substitutor>,
    order: Vec<ClassId>,
    conflicted: HashSet<ClassId>,
    /// Classes on the current descent path. Scoped to the path (not the whole
    /// walk) so diamond reconvergence may revisit finished nodes while
    /// cyclic inheritance still terminates.
    path: Vec<ClassId>,
    sink: &'a mut DiagnosticSink,
}

impl Walker<'_> {
    fn visit(&mut self, declared: &Type, outer: &Substitutor) {
        let Type::Class(ct) = canonicalize_named(self.env, declared) else {
            return;
        };
        let class = ct.def;
        if self.path.contains(&class) {
            return;
        }

        let inner = Substitutor::for_class_type(self.env, &ct);
        let composed = Substitutor::compose(self.env, outer, &inner);

        if let Some(existing) = self.recorded.get(&class) {
            if !self.same_binding(class, existing, &composed) && self.conflicted.insert(class) {
                let first_args = self.binding_args(class, existing);
                let second_args = self.binding_args(class, &composed);
                let span = self.env.class(self.subject).and_then(|c| c.span);
                self.sink.error(
                    DiagnosticKind::MultipleInheritanceConflict {
                        ancestor: class,
                        first_args,
                        second_args,
                    },
                    span,
                );
            }
            // Already processed: its subtree was recorded under the first
            // binding, and a conflicting branch stops here.
            return;
        }

        self.recorded.insert(class, composed.clone());
        self.order.push(class);

        let Some(def) = self.env.class(class) else {
            return;
        };
        let supers: Vec<Type> = def
            .super_class
            .iter()
            .chain(def.interfaces.iter())
            .cloned()
            .collect();
        self.path.push(class);
        for declared in &supers {
            self.visit(declared, &composed);
        }
        self.path.pop();
    }

    /// Compare two bindings of `class` type-parameter-by-type-parameter via
    /// the oracle's equality.
    fn same_binding(&self, class: ClassId, a: &Substitutor, b: &Substitutor) -> bool {
        if a.is_raw() && b.is_raw() {
            return true;
        }
        let Some(def) = self.env.class(class) else {
            return true;
        };
        def.type_params.iter().all(|param| {
            let var = Type::TypeVar(*param);
            types_equal(self.env, &a.apply(self.env, &var), &b.apply(self.env, &var))
        })
    }

    fn binding_args(&self, class: ClassId, substitutor: &Substitutor) -> Vec<Type> {
        let Some(def) = self.env.class(class) else {
            return Vec::new();
        };
        def.type_params
            .iter()
            .map(|param| substitutor.apply(self.env, &Type::TypeVar(*param)))
            .collect()
    }
}
