use paramflow::error::ResolutionError;
use paramflow::resolution::{
    Dispatcher, FnResolver, InvocationContext, MatchPolicy, ParameterDescriptor, ResolvedValue,
    SequenceResolver, SupplierResolver, TypedResolver,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
struct NestedDummyInput {
    numbers: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq)]
struct DummyInput {
    name: String,
    nested: NestedDummyInput,
}

#[derive(Debug, Clone, PartialEq)]
struct SomeNested {
    value: String,
}

#[derive(Debug, Clone, PartialEq)]
struct SomeValue {
    value: String,
    nested: SomeNested,
}

#[derive(Debug, PartialEq)]
struct NonCloneable {
    value: String,
}

fn dummy(input: &DummyInput) -> String {
    format!("{}/{}", input.name, input.nested.numbers.iter().sum::<i32>())
}

fn ctx() -> InvocationContext {
    InvocationContext::new("resolution_test")
}

fn dummy_input_resolver() -> TypedResolver<DummyInput> {
    TypedResolver::new("dummy-input", || DummyInput {
        name: "whatever".to_string(),
        nested: NestedDummyInput {
            numbers: vec![1, 2, 3],
        },
    })
}

fn dummy_supplier_resolver() -> SupplierResolver<DummyInput> {
    SupplierResolver::new("dummy-supplier", || DummyInput {
        name: "fromSupplier".to_string(),
        nested: NestedDummyInput { numbers: vec![] },
    })
}

#[test]
fn test_value_and_supplier_resolved_independently() {
    let dispatcher = Dispatcher::builder()
        .with_resolver(dummy_input_resolver())
        .with_resolver(dummy_supplier_resolver())
        .build();

    let values = dispatcher
        .resolve_all(
            &[
                ParameterDescriptor::value::<DummyInput>(0, "dummy_input"),
                ParameterDescriptor::supplier::<DummyInput>(1, "supplier"),
            ],
            &ctx(),
        )
        .unwrap();
    let mut values = values.into_iter();

    let input = values.next().unwrap().into_value::<DummyInput>().unwrap();
    assert_eq!(dummy(&input), "whatever/6");

    let supplier = values.next().unwrap().into_supplier::<DummyInput>().unwrap();
    assert_eq!(dummy(&supplier.get()), "fromSupplier/0");
}

#[test]
fn test_nested_value() {
    let dispatcher = Dispatcher::builder()
        .with_resolver(TypedResolver::new("some-value", || SomeValue {
            value: "foo".to_string(),
            nested: SomeNested {
                value: "nested-foo".to_string(),
            },
        }))
        .build();

    let value = dispatcher
        .resolve(&ParameterDescriptor::value::<SomeValue>(0, "some"), &ctx())
        .unwrap()
        .into_value::<SomeValue>()
        .unwrap();
    assert_eq!(value.value, "foo");
    assert_eq!(value.nested.value, "nested-foo");
}

#[test]
fn test_sequence_of_non_cloneable_values() {
    let dispatcher = Dispatcher::builder()
        .with_resolver(SequenceResolver::new("list", || {
            vec![
                NonCloneable {
                    value: "foo".to_string(),
                },
                NonCloneable {
                    value: "bar".to_string(),
                },
            ]
        }))
        .build();

    let list = dispatcher
        .resolve(&ParameterDescriptor::sequence::<NonCloneable>(0, "list"), &ctx())
        .unwrap()
        .into_sequence::<NonCloneable>()
        .unwrap();
    let values: Vec<&str> = list.iter().map(|v| v.value.as_str()).collect();
    assert_eq!(values, vec!["foo", "bar"]);
}

#[test]
fn test_supplier_factory_is_lazy() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let dispatcher = Dispatcher::builder()
        .with_resolver(SupplierResolver::new("counting", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            7_u32
        }))
        .build();

    let supplier = dispatcher
        .resolve(&ParameterDescriptor::supplier::<u32>(0, "n"), &ctx())
        .unwrap()
        .into_supplier::<u32>()
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert_eq!(supplier.get(), 7);
    assert_eq!(supplier.get(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_shapes_do_not_cross_match() {
    let dispatcher = Dispatcher::builder()
        .with_resolver(dummy_input_resolver())
        .build();

    let err = dispatcher
        .resolve(&ParameterDescriptor::supplier::<DummyInput>(3, "supplier"), &ctx())
        .unwrap_err();
    match err {
        ResolutionError::Unresolvable {
            test_id,
            index,
            name,
            shape,
        } => {
            assert_eq!(test_id, "resolution_test");
            assert_eq!(index, 3);
            assert_eq!(name, "supplier");
            assert!(shape.starts_with("supplier<"), "{shape}");
        }
        other => panic!("expected unresolvable, got {other:?}"),
    }
}

#[test]
fn test_competing_resolvers() {
    let strict = Dispatcher::builder()
        .with_resolver(dummy_input_resolver())
        .with_resolver(FnResolver::by_name("by-name", "dummy_input", |_, _| {
            Ok(ResolvedValue::value(DummyInput {
                name: "named".to_string(),
                nested: NestedDummyInput { numbers: vec![10] },
            }))
        }))
        .build();
    let param = ParameterDescriptor::value::<DummyInput>(0, "dummy_input");

    assert_eq!(
        strict.claimants(&param, &ctx()),
        vec!["dummy-input".to_string(), "by-name".to_string()]
    );
    assert!(matches!(
        strict.resolve(&param, &ctx()),
        Err(ResolutionError::Ambiguous { .. })
    ));

    let first_match = Dispatcher::builder()
        .with_resolver(FnResolver::by_name("by-name", "dummy_input", |_, _| {
            Ok(ResolvedValue::value(DummyInput {
                name: "named".to_string(),
                nested: NestedDummyInput { numbers: vec![10] },
            }))
        }))
        .with_resolver(dummy_input_resolver())
        .with_policy(MatchPolicy::FirstMatch)
        .build();
    let input = first_match
        .resolve(&param, &ctx())
        .unwrap()
        .into_value::<DummyInput>()
        .unwrap();
    assert_eq!(dummy(&input), "named/10");
}

#[test]
fn test_resolver_failure_is_reported() {
    let dispatcher = Dispatcher::builder()
        .with_resolver(FnResolver::by_name("broken", "port", |param, _| {
            Err(ResolutionError::resolver_failed(
                "broken",
                param,
                "no free port",
            ))
        }))
        .build();

    let err = dispatcher
        .resolve(&ParameterDescriptor::value::<u16>(0, "port"), &ctx())
        .unwrap_err();
    assert!(err.to_string().contains("no free port"), "{err}");
}

#[test]
fn test_context_aware_resolver() {
    let dispatcher = Dispatcher::builder()
        .with_resolver(TypedResolver::with_context("test-name", |param, ctx| {
            format!("{}#{}", ctx.display_name(), param.name())
        }))
        .build();
    let ctx = InvocationContext::new("suite::case").with_display_name("Readable case");

    let value = dispatcher
        .resolve(&ParameterDescriptor::value::<String>(0, "label"), &ctx)
        .unwrap()
        .into_value::<String>()
        .unwrap();
    assert_eq!(value, "Readable case#label");
}
