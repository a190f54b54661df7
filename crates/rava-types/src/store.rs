//! Mutable store backing the [`TypeEnv`] oracle.
//!
//! Checkers only ever see the store through `&dyn TypeEnv`; mutation happens
//! while the surrounding resolver (or a test) loads definitions. Class ids can
//! be interned before their definitions exist so self-referential shapes
//! (`T extends Comparable<T>`, a class mentioning itself in a bound) load in
//! two passes.

use std::collections::HashMap;

use crate::{
    Access, ClassDef, ClassId, ClassKind, MethodDef, PrimitiveType, Type, TypeEnv, TypeParamDef,
    TypeVarId,
};

/// Whether the surrounding resolver has finished indexing.
///
/// Checkers return "no diagnostic" on missing model pieces; callers consult
/// this flag to distinguish "verified clean" from "could not determine yet".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Readiness {
    #[default]
    Ready,
    Indexing,
}

/// Ids of classes the checkers need without lookup-by-name.
#[derive(Clone, Copy, Debug)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub string: ClassId,
    pub number: ClassId,
    pub integer: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
    pub throwable: ClassId,
    pub exception: ClassId,
    pub runtime_exception: ClassId,
    pub error: ClassId,
}

#[derive(Clone, Debug)]
pub struct TypeStore {
    classes: Vec<Option<ClassDef>>,
    class_names: HashMap<String, ClassId>,
    type_params: Vec<TypeParamDef>,
    well_known: Option<WellKnownTypes>,
    readiness: Readiness,
}

impl TypeStore {
    /// A store seeded with just enough of `java.lang`/`java.util`/`java.io`
    /// for hierarchy and exception checks: `Object`, `String`, the boxed
    /// numerics, the `Throwable` tree (including `IOException`,
    /// `FileNotFoundException` and `SQLException`), `Comparable`, `Iterable`,
    /// `Collection`, `List` and `ArrayList`.
    pub fn with_minimal_jdk() -> Self {
        let mut store = TypeStore {
            classes: Vec::new(),
            class_names: HashMap::new(),
            type_params: Vec::new(),
            well_known: None,
            readiness: Readiness::Ready,
        };
        store.seed_minimal_jdk();
        store
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn set_readiness(&mut self, readiness: Readiness) {
        self.readiness = readiness;
    }

    /// Reserve an id for `name` without defining it yet.
    pub fn intern_class_id(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.class_names.get(name) {
            return *id;
        }
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(None);
        self.class_names.insert(name.to_string(), id);
        id
    }

    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        self.class_names.insert(def.name.clone(), id);
        self.classes[id.index()] = Some(def);
    }

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = self.intern_class_id(&def.name);
        self.define_class(id, def);
        id
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.index())?.as_mut()
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.class_names.get(name).copied()
    }

    pub fn add_type_param(&mut self, name: impl Into<String>, upper_bounds: Vec<Type>) -> TypeVarId {
        let id = TypeVarId(self.type_params.len() as u32);
        self.type_params.push(TypeParamDef {
            name: name.into(),
            upper_bounds,
            lower_bound: None,
        });
        id
    }

    /// Redefine a previously allocated type parameter; used for
    /// self-referential bounds that need the id before the bound exists.
    pub fn define_type_param(&mut self, id: TypeVarId, def: TypeParamDef) {
        self.type_params[id.0 as usize] = def;
    }

    fn seed_minimal_jdk(&mut self) {
        let object = self.add_class(ClassDef {
            name: "java.lang.Object".to_string(),
            ..ClassDef::default()
        });
        let object_ty = Type::class(object, vec![]);

        let cloneable = self.add_interface("java.lang.Cloneable", vec![], vec![]);
        let serializable = self.add_interface("java.io.Serializable", vec![], vec![]);

        // interface Comparable<T> { int compareTo(T o); }
        let comparable_t = self.add_type_param("T", vec![object_ty.clone()]);
        let comparable = self.add_class(ClassDef {
            name: "java.lang.Comparable".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![comparable_t],
            methods: vec![MethodDef {
                name: "compareTo".to_string(),
                params: vec![Type::TypeVar(comparable_t)],
                return_type: Type::int(),
                is_abstract: true,
                ..MethodDef::default()
            }],
            ..ClassDef::default()
        });

        let string = self.add_class(ClassDef {
            name: "java.lang.String".to_string(),
            is_final: true,
            super_class: Some(object_ty.clone()),
            interfaces: vec![Type::class(serializable, vec![])],
            ..ClassDef::default()
        });
        let string_ty = Type::class(string, vec![]);
        // String implements Comparable<String>; patched in after `string` exists.
        if let Some(def) = self.class_mut(string) {
            def.interfaces.push(Type::class(comparable, vec![string_ty.clone()]));
        }

        let number = self.add_class(ClassDef {
            name: "java.lang.Number".to_string(),
            is_abstract: true,
            super_class: Some(object_ty.clone()),
            interfaces: vec![Type::class(serializable, vec![])],
            ..ClassDef::default()
        });
        let number_ty = Type::class(number, vec![]);

        let mut boxed = |store: &mut Self, prim: PrimitiveType, numeric: bool| {
            let super_class = if numeric {
                number_ty.clone()
            } else {
                object_ty.clone()
            };
            store.add_class(ClassDef {
                name: prim.boxed_name().to_string(),
                is_final: true,
                super_class: Some(super_class),
                ..ClassDef::default()
            })
        };
        let integer = boxed(self, PrimitiveType::Int, true);
        boxed(self, PrimitiveType::Long, true);
        boxed(self, PrimitiveType::Short, true);
        boxed(self, PrimitiveType::Byte, true);
        boxed(self, PrimitiveType::Float, true);
        boxed(self, PrimitiveType::Double, true);
        boxed(self, PrimitiveType::Boolean, false);
        boxed(self, PrimitiveType::Char, false);
        if let Some(def) = self.class_mut(integer) {
            def.interfaces
                .push(Type::class(comparable, vec![Type::class(integer, vec![])]));
        }

        // The Throwable tree, with the java.io/java.sql leaves the throws
        // rule's tests lean on.
        let throwable = self.add_class(ClassDef {
            name: "java.lang.Throwable".to_string(),
            super_class: Some(object_ty.clone()),
            interfaces: vec![Type::class(serializable, vec![])],
            ..ClassDef::default()
        });
        let exception = self.add_throwable("java.lang.Exception", throwable);
        let runtime_exception = self.add_throwable("java.lang.RuntimeException", exception);
        let error = self.add_throwable("java.lang.Error", throwable);
        let io_exception = self.add_throwable("java.io.IOException", exception);
        self.add_throwable("java.io.FileNotFoundException", io_exception);
        self.add_throwable("java.sql.SQLException", exception);
        self.add_throwable("java.lang.IllegalArgumentException", runtime_exception);

        // interface Iterable<T>
        let iterable_t = self.add_type_param("T", vec![object_ty.clone()]);
        let iterable = self.add_interface("java.lang.Iterable", vec![iterable_t], vec![]);

        // interface Collection<E> extends Iterable<E> { boolean add(E e); int size(); }
        let collection_e = self.add_type_param("E", vec![object_ty.clone()]);
        let collection = self.add_class(ClassDef {
            name: "java.util.Collection".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![collection_e],
            interfaces: vec![Type::class(iterable, vec![Type::TypeVar(collection_e)])],
            methods: vec![
                MethodDef {
                    name: "add".to_string(),
                    params: vec![Type::TypeVar(collection_e)],
                    return_type: Type::boolean(),
                    is_abstract: true,
                    ..MethodDef::default()
                },
                MethodDef {
                    name: "size".to_string(),
                    return_type: Type::int(),
                    is_abstract: true,
                    ..MethodDef::default()
                },
            ],
            ..ClassDef::default()
        });

        // interface List<E> extends Collection<E> { E get(int i); boolean add(E e); }
        let list_e = self.add_type_param("E", vec![object_ty.clone()]);
        let list = self.add_class(ClassDef {
            name: "java.util.List".to_string(),
            kind: ClassKind::Interface,
            type_params: vec![list_e],
            interfaces: vec![Type::class(collection, vec![Type::TypeVar(list_e)])],
            methods: vec![
                MethodDef {
                    name: "get".to_string(),
                    params: vec![Type::int()],
                    return_type: Type::TypeVar(list_e),
                    is_abstract: true,
                    ..MethodDef::default()
                },
                MethodDef {
                    name: "add".to_string(),
                    params: vec![Type::TypeVar(list_e)],
                    return_type: Type::boolean(),
                    is_abstract: true,
                    ..MethodDef::default()
                },
            ],
            ..ClassDef::default()
        });

        // class ArrayList<E> implements List<E>
        let array_list_e = self.add_type_param("E", vec![object_ty.clone()]);
        self.add_class(ClassDef {
            name: "java.util.ArrayList".to_string(),
            type_params: vec![array_list_e],
            super_class: Some(object_ty.clone()),
            interfaces: vec![Type::class(list, vec![Type::TypeVar(array_list_e)])],
            methods: vec![
                MethodDef {
                    name: "get".to_string(),
                    params: vec![Type::int()],
                    return_type: Type::TypeVar(array_list_e),
                    ..MethodDef::default()
                },
                MethodDef {
                    name: "add".to_string(),
                    params: vec![Type::TypeVar(array_list_e)],
                    return_type: Type::boolean(),
                    ..MethodDef::default()
                },
            ],
            ..ClassDef::default()
        });

        self.well_known = Some(WellKnownTypes {
            object,
            string,
            number,
            integer,
            cloneable,
            serializable,
            throwable,
            exception,
            runtime_exception,
            error,
        });
    }

    fn add_interface(
        &mut self,
        name: &str,
        type_params: Vec<TypeVarId>,
        interfaces: Vec<Type>,
    ) -> ClassId {
        self.add_class(ClassDef {
            name: name.to_string(),
            kind: ClassKind::Interface,
            access: Access::Public,
            type_params,
            interfaces,
            ..ClassDef::default()
        })
    }

    fn add_throwable(&mut self, name: &str, super_class: ClassId) -> ClassId {
        self.add_class(ClassDef {
            name: name.to_string(),
            super_class: Some(Type::class(super_class, vec![])),
            ..ClassDef::default()
        })
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.index())?.as_ref()
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.type_params.get(id.0 as usize)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.class_id(name)
    }

    fn well_known(&self) -> &WellKnownTypes {
        self.well_known
            .as_ref()
            .expect("TypeStore is always constructed with well-known types")
    }
}
