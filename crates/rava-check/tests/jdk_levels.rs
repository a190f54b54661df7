//! Rules that switch on the language level, plus raw-type propagation
//! through deep hierarchies and determinism of repeated runs.

use pretty_assertions::assert_eq;

use rava_check::diagnostics::{ClashRelation, DiagnosticKind, DiagnosticSink};
use rava_check::{check_class, hierarchy, LanguageLevel};
use rava_types::{ClassDef, ClassId, ClassKind, MethodDef, Type, TypeEnv, TypeStore};

fn run(store: &TypeStore, level: LanguageLevel, subject: ClassId) -> Vec<DiagnosticKind> {
    let mut sink = DiagnosticSink::new();
    check_class(store, level, subject, &mut sink);
    sink.into_diagnostics().into_iter().map(|d| d.kind).collect()
}

#[test]
fn raw_supertype_erases_through_three_levels() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = Type::class(store.well_known().object, vec![]);
    let t = store.add_type_param("T", vec![]);
    let top = store.add_class(ClassDef {
        name: "Top".into(),
        type_params: vec![t],
        methods: vec![MethodDef {
            name: "id".into(),
            params: vec![Type::TypeVar(t)],
            return_type: Type::TypeVar(t),
            ..MethodDef::default()
        }],
        ..ClassDef::default()
    });
    let mid = store.add_class(ClassDef {
        name: "Mid".into(),
        // Raw extends: everything below sees the erased Top.
        super_class: Some(Type::class(top, vec![])),
        ..ClassDef::default()
    });
    let bottom = store.add_class(ClassDef {
        name: "Bottom".into(),
        super_class: Some(Type::class(mid, vec![])),
        methods: vec![MethodDef {
            name: "id".into(),
            params: vec![object.clone()],
            return_type: object,
            ..MethodDef::default()
        }],
        ..ClassDef::default()
    });

    let mut sink = DiagnosticSink::new();
    let collected = hierarchy::collect(&store, bottom, &mut sink);
    assert!(collected
        .ancestor_substitutor(top)
        .expect("Top reachable")
        .is_raw());
    assert!(sink.diagnostics().is_empty());

    // `Object id(Object)` matches the erased inherited signature.
    assert_eq!(run(&store, LanguageLevel::Jdk8, bottom), vec![]);
}

#[test]
fn static_hide_clashes_require_jdk_7() {
    let mut store = TypeStore::with_minimal_jdk();
    let list = store.class_id("java.util.List").unwrap();
    let string = Type::class(store.class_id("java.lang.String").unwrap(), vec![]);
    let integer = Type::class(store.class_id("java.lang.Integer").unwrap(), vec![]);
    let stat = |arg: Type| MethodDef {
        name: "of".into(),
        is_static: true,
        params: vec![Type::class(list, vec![arg])],
        ..MethodDef::default()
    };
    let base = store.add_class(ClassDef {
        name: "Base".into(),
        methods: vec![stat(string)],
        ..ClassDef::default()
    });
    let sub = store.add_class(ClassDef {
        name: "Sub".into(),
        super_class: Some(Type::class(base, vec![])),
        methods: vec![stat(integer)],
        ..ClassDef::default()
    });

    assert_eq!(run(&store, LanguageLevel::Jdk6, sub), vec![]);
    assert!(matches!(
        run(&store, LanguageLevel::Jdk7, sub).as_slice(),
        [DiagnosticKind::SameErasureClash {
            relation: ClashRelation::Hides,
            ..
        }]
    ));
}

#[test]
fn interface_statics_are_not_inherited() {
    let mut store = TypeStore::with_minimal_jdk();
    let helper = store.add_class(ClassDef {
        name: "Helper".into(),
        kind: ClassKind::Interface,
        methods: vec![MethodDef {
            name: "size".into(),
            is_static: true,
            is_final: true,
            ..MethodDef::default()
        }],
        ..ClassDef::default()
    });
    // Declaring an instance `size()` would be a static mismatch if the
    // interface static were inherited; it is not.
    let user = store.add_class(ClassDef {
        name: "User".into(),
        interfaces: vec![Type::class(helper, vec![])],
        methods: vec![MethodDef {
            name: "size".into(),
            ..MethodDef::default()
        }],
        ..ClassDef::default()
    });

    assert_eq!(run(&store, LanguageLevel::Jdk8, user), vec![]);
}

#[test]
fn private_interface_methods_are_not_inherited() {
    let mut store = TypeStore::with_minimal_jdk();
    let source = store.add_class(ClassDef {
        name: "Source".into(),
        kind: ClassKind::Interface,
        methods: vec![
            MethodDef {
                name: "helper".into(),
                access: rava_types::Access::Private,
                ..MethodDef::default()
            },
            MethodDef {
                name: "go".into(),
                is_default: true,
                ..MethodDef::default()
            },
        ],
        ..ClassDef::default()
    });
    let user = store.add_class(ClassDef {
        name: "User".into(),
        interfaces: vec![Type::class(source, vec![])],
        ..ClassDef::default()
    });

    let mut sink = DiagnosticSink::new();
    let collected = hierarchy::collect(&store, user, &mut sink);
    let inherited: Vec<&str> = collected
        .inherited_signatures()
        .map(|sig| sig.signature.name.as_str())
        .collect();
    assert!(inherited.contains(&"go"));
    assert!(!inherited.contains(&"helper"));
}

#[test]
fn repeated_runs_are_identical() {
    let mut store = TypeStore::with_minimal_jdk();
    let string = Type::class(store.class_id("java.lang.String").unwrap(), vec![]);
    let base = store.add_class(ClassDef {
        name: "Base".into(),
        methods: vec![
            MethodDef {
                name: "a".into(),
                is_final: true,
                ..MethodDef::default()
            },
            MethodDef {
                name: "b".into(),
                return_type: string.clone(),
                ..MethodDef::default()
            },
        ],
        ..ClassDef::default()
    });
    let sub = store.add_class(ClassDef {
        name: "Sub".into(),
        super_class: Some(Type::class(base, vec![])),
        methods: vec![
            MethodDef {
                name: "a".into(),
                ..MethodDef::default()
            },
            MethodDef {
                name: "b".into(),
                return_type: Type::class(store.class_id("java.lang.Integer").unwrap(), vec![]),
                ..MethodDef::default()
            },
        ],
        ..ClassDef::default()
    });

    let first = run(&store, LanguageLevel::Jdk8, sub);
    let second = run(&store, LanguageLevel::Jdk8, sub);
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}
