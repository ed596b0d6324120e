//! An end-to-end extension kind: a duration value with a registered type,
//! exercising every capability table.

use std::any::Any;

use tessella::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Duration {
    secs: u64,
}

impl ExtensionTerm for Duration {
    fn clone_box(&self) -> Box<dyn ExtensionTerm> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone)]
struct DurationType;

impl ExtensionTerm for DurationType {
    fn clone_box(&self) -> Box<dyn ExtensionTerm> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn duration(tag: ExtTag, secs: u64) -> Value {
    Value::Ext(ExtValue::new(tag, Box::new(Duration { secs })))
}

fn secs_of(x: &ExtValue) -> u64 {
    x.downcast_ref::<Duration>().expect("a duration").secs
}

/// Registry with the duration extension fully wired up, plus the two tags
/// (value kind, type kind).
fn duration_registry() -> (Registry, ExtTag, ExtTag) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut builder = Registry::builder();
    let val_tag = builder.declare_extension("Duration");
    let ty_tag = builder.declare_extension("DurationType");

    builder
        .register_printer(
            val_tag,
            Box::new(|_, x| format!("Duration({}s)", secs_of(x))),
        )
        .register_eq(val_tag, Box::new(|_, a, b| secs_of(a) == secs_of(b)))
        .register_compare(val_tag, Box::new(|_, a, b| secs_of(a).cmp(&secs_of(b))))
        .register_hasher(val_tag, Box::new(|_, x| secs_of(x)))
        .register_abstract_type(
            val_tag,
            Box::new(move |_, _| Value::Ext(ExtValue::new(ty_tag, Box::new(DurationType)))),
        )
        .register_inhabits((Tag::Ext(val_tag), Tag::Ext(ty_tag)), Box::new(|_, _, _| true))
        .register_constructor(
            (Tag::Ext(ty_tag), Tag::Np(NpTerm::Uint64)),
            Box::new(move |_, _, arg| match arg {
                Value::Uint64(secs) => Ok(duration(val_tag, secs)),
                _ => unreachable!("keyed on Uint64"),
            }),
        );

    (builder.build(), val_tag, ty_tag)
}

#[test]
fn printing_uses_the_registered_printer() {
    let (registry, val_tag, _) = duration_registry();
    let v = duration(val_tag, 90);
    assert_eq!(render(&registry, &v).unwrap(), "Duration(90s)");
}

#[test]
fn equality_and_order_use_the_registered_capabilities() {
    let (registry, val_tag, _) = duration_registry();
    let short = duration(val_tag, 10);
    let long = duration(val_tag, 60);

    assert!(equals(&registry, &short, &short.clone()));
    assert!(!equals(&registry, &short, &long));
    assert_eq!(compare(&registry, &short, &long), TermOrdering::Less);
    assert_eq!(compare(&registry, &long, &short), TermOrdering::Greater);
    // Cross-kind comparison stays unspecified.
    assert_eq!(
        compare(&registry, &short, &Value::from(10u64)),
        TermOrdering::Unspecified
    );
}

#[test]
fn equal_extension_values_hash_alike() {
    let (registry, val_tag, _) = duration_registry();
    let a = duration(val_tag, 5);
    let b = duration(val_tag, 5);
    assert_eq!(
        hash64(&registry, &a).unwrap(),
        hash64(&registry, &b).unwrap()
    );
}

#[test]
fn extension_values_satisfy_the_soundness_invariant() {
    let (registry, val_tag, _) = duration_registry();
    let v = duration(val_tag, 30);
    let ty = abstract_type_of(&registry, &v).unwrap();
    assert!(inhabits(&registry, &v, &ty));
}

#[test]
fn extension_types_construct_through_the_registry() {
    let (registry, val_tag, ty_tag) = duration_registry();
    let ty = Value::Ext(ExtValue::new(ty_tag, Box::new(DurationType)));
    let built = construct_inhabitant_of(&registry, &ty, Value::from(45u64)).unwrap();
    assert!(equals(&registry, &built, &duration(val_tag, 45)));

    // No constructor entry for this argument kind.
    let err = construct_inhabitant_of(&registry, &ty, Value::from("45")).unwrap_err();
    assert!(err.is_unregistered_capability());
}

#[test]
fn missing_capabilities_surface_as_configuration_errors() {
    let mut builder = Registry::builder();
    let bare_tag = builder.declare_extension("Bare");
    let registry = builder.build();
    let v = Value::Ext(ExtValue::new(bare_tag, Box::new(Duration { secs: 1 })));

    assert!(render(&registry, &v).unwrap_err().is_unregistered_capability());
    assert_eq!(display_lossy(&registry, &v), "<Bare>");
    assert!(
        abstract_type_of(&registry, &v)
            .unwrap_err()
            .is_unregistered_capability()
    );
    assert!(hash64(&registry, &v).unwrap_err().is_unregistered_capability());
    assert!(
        to_bytes(&registry, &v)
            .unwrap_err()
            .is_unregistered_capability()
    );
}

#[test]
fn unregistered_extension_equality_degrades_without_failing() {
    let mut builder = Registry::builder();
    let tag = builder.declare_extension("Opaque");
    let registry = builder.build();
    let a = Value::Ext(ExtValue::new(tag, Box::new(Duration { secs: 1 })));
    let b = Value::Ext(ExtValue::new(tag, Box::new(Duration { secs: 1 })));

    // Without an equality capability, distinct cells are never equal, and
    // the public ordering is unspecified rather than an error.
    assert!(!equals(&registry, &a, &b));
    assert_eq!(compare(&registry, &a, &b), TermOrdering::Unspecified);
    // The extension still inhabits nothing but the top type.
    assert!(inhabits(&registry, &a, &Value::term()));
    assert!(!inhabits(&registry, &a, &Value::Np(NpTerm::Type)));
}
