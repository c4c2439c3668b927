//! End-to-end tests driving the engine through the host API,
//! with modules written in the text format and assembled by `wat`.

use std::cell::RefCell;
use std::rc::Rc;
use wasm_vm::{
    ExternalKind, ExternalValue, FunctionType, GlobalType, InstantiationError, InvokeError, Limit,
    LinkError, MemoryType, ResultType, Store, StoreLimits, Trap, Value, ValueType, PAGE_SIZE,
};

fn instantiate(store: &mut Store, source: &str) -> wasm_vm::ModuleHandle {
    let _ = env_logger::builder().is_test(true).try_init();

    let binary = wat::parse_str(source).expect("the test module should assemble");

    store
        .instantiate(&binary)
        .expect("the test module should instantiate")
}

fn trap_name(error: InvokeError) -> &'static str {
    match error {
        InvokeError::Trap(trap) => trap.name(),
        other => panic!("expected a trap, got {other:?}"),
    }
}

#[test]
fn add_two_numbers() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (func (export "add") (param i32 i32) (result i32)
               local.get 0
               local.get 1
               i32.add))"#,
    );

    let result = store
        .invoke(module, "add", &[Value::I32(2), Value::I32(3)])
        .unwrap();

    assert_eq!(result, Some(Value::I32(5)));
}

#[test]
fn signed_division_overflow_traps() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (func (export "div") (param i32 i32) (result i32)
               local.get 0
               local.get 1
               i32.div_s))"#,
    );

    let error = store
        .invoke(module, "div", &[Value::I32(i32::MIN), Value::I32(-1)])
        .unwrap_err();

    assert_eq!(trap_name(error), "IntegerOverflow");
}

#[test]
fn division_by_zero_traps() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (func (export "div") (param i32 i32) (result i32)
               local.get 0
               local.get 1
               i32.div_u))"#,
    );

    let error = store
        .invoke(module, "div", &[Value::I32(7), Value::I32(0)])
        .unwrap_err();

    assert_eq!(trap_name(error), "DivideByZero");
}

#[test]
fn float_minimum_propagates_nan() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (func (export "min") (param f32) (result f32)
               local.get 0
               f32.const 1.0
               f32.min))"#,
    );

    let result = store
        .invoke(module, "min", &[Value::F32(f32::NAN)])
        .unwrap()
        .unwrap();

    assert!(result.as_f32().unwrap().is_nan());
}

#[test]
fn memory_store_load_round_trip_and_bounds() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (memory 1)
             (func (export "write") (param i32 i32)
               local.get 0
               local.get 1
               i32.store)
             (func (export "read") (param i32) (result i32)
               local.get 0
               i32.load))"#,
    );

    let value = 0xDEADBEEFu32 as i32;

    store
        .invoke(module, "write", &[Value::I32(16), Value::I32(value)])
        .unwrap();

    let loaded = store.invoke(module, "read", &[Value::I32(16)]).unwrap();

    assert_eq!(loaded, Some(Value::I32(value)));

    let error = store
        .invoke(module, "read", &[Value::I32(PAGE_SIZE as i32 - 3)])
        .unwrap_err();

    assert_eq!(trap_name(error), "OutOfBoundsMemory");
}

#[test]
fn host_import_receives_calls_in_order() {
    let mut store = Store::new();
    let received = Rc::new(RefCell::new(Vec::new()));
    let sink = received.clone();

    store.register_function(
        "console",
        "log",
        FunctionType::new(
            ResultType::new(vec![ValueType::I32]),
            ResultType::empty(),
        ),
        move |arguments| {
            sink.borrow_mut().push(arguments[0].as_i32().unwrap());

            Ok(None)
        },
    );

    let module = instantiate(
        &mut store,
        r#"(module
             (import "console" "log" (func $log (param i32)))
             (func (export "run")
               (local $i i32)
               (block $exit
                 (loop $next
                   local.get $i
                   i32.const 3
                   i32.ge_s
                   br_if $exit
                   local.get $i
                   call $log
                   local.get $i
                   i32.const 1
                   i32.add
                   local.set $i
                   br $next))))"#,
    );

    store.invoke(module, "run", &[]).unwrap();

    assert_eq!(received.borrow().as_slice(), &[0, 1, 2]);
}

#[test]
fn indirect_call_with_wrong_type_traps() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (type $unary32 (func (param i32) (result i32)))
             (type $unary64 (func (param i64) (result i64)))
             (table 1 funcref)
             (func $identity (type $unary32)
               local.get 0)
             (elem (i32.const 0) $identity)
             (func (export "good") (param i32) (result i32)
               local.get 0
               i32.const 0
               call_indirect (type $unary32))
             (func (export "bad") (param i64) (result i64)
               local.get 0
               i32.const 0
               call_indirect (type $unary64)))"#,
    );

    let result = store.invoke(module, "good", &[Value::I32(9)]).unwrap();

    assert_eq!(result, Some(Value::I32(9)));

    let error = store.invoke(module, "bad", &[Value::I64(9)]).unwrap_err();

    assert_eq!(trap_name(error), "IndirectCallTypeMismatch");
}

#[test]
fn indirect_call_through_null_entry_traps() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (type $nullary (func))
             (table 2 funcref)
             (func $noop)
             (elem (i32.const 0) $noop)
             (func (export "call") (param i32)
               local.get 0
               call_indirect (type $nullary)))"#,
    );

    store.invoke(module, "call", &[Value::I32(0)]).unwrap();

    let null_entry = store.invoke(module, "call", &[Value::I32(1)]).unwrap_err();
    let out_of_bounds = store.invoke(module, "call", &[Value::I32(2)]).unwrap_err();

    assert_eq!(trap_name(null_entry), "UndefinedElement");
    assert_eq!(trap_name(out_of_bounds), "OutOfBoundsTable");
}

#[test]
fn unreachable_traps() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module (func (export "boom") unreachable))"#,
    );

    let error = store.invoke(module, "boom", &[]).unwrap_err();

    assert_eq!(trap_name(error), "Unreachable");
}

#[test]
fn branch_discards_values_above_the_label() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (func (export "pick") (result i32)
               (block (result i32)
                 i32.const 10
                 i32.const 42
                 br 0)))"#,
    );

    let result = store.invoke(module, "pick", &[]).unwrap();

    assert_eq!(result, Some(Value::I32(42)));
}

#[test]
fn loop_with_branch_computes_factorial() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (func (export "factorial") (param $n i32) (result i32)
               (local $acc i32)
               i32.const 1
               local.set $acc
               (block $exit
                 (loop $next
                   local.get $n
                   i32.const 1
                   i32.le_s
                   br_if $exit
                   local.get $acc
                   local.get $n
                   i32.mul
                   local.set $acc
                   local.get $n
                   i32.const 1
                   i32.sub
                   local.set $n
                   br $next))
               local.get $acc))"#,
    );

    let result = store.invoke(module, "factorial", &[Value::I32(5)]).unwrap();

    assert_eq!(result, Some(Value::I32(120)));
}

#[test]
fn branch_table_selects_by_index() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (func (export "classify") (param i32) (result i32)
               (block $default
                 (block $one
                   (block $zero
                     local.get 0
                     br_table $zero $one $default)
                   i32.const 100
                   return)
                 i32.const 200
                 return)
               i32.const 300))"#,
    );

    let outcomes = [(0, 100), (1, 200), (2, 300), (9, 300)];

    for (input, expected) in outcomes {
        let result = store
            .invoke(module, "classify", &[Value::I32(input)])
            .unwrap();

        assert_eq!(result, Some(Value::I32(expected)));
    }
}

#[test]
fn if_else_selects_branches() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (func (export "sign") (param i32) (result i32)
               local.get 0
               i32.const 0
               i32.lt_s
               (if (result i32)
                 (then i32.const -1)
                 (else
                   local.get 0
                   (if (result i32)
                     (then i32.const 1)
                     (else i32.const 0))))))"#,
    );

    assert_eq!(
        store.invoke(module, "sign", &[Value::I32(-5)]).unwrap(),
        Some(Value::I32(-1))
    );
    assert_eq!(
        store.invoke(module, "sign", &[Value::I32(0)]).unwrap(),
        Some(Value::I32(0))
    );
    assert_eq!(
        store.invoke(module, "sign", &[Value::I32(7)]).unwrap(),
        Some(Value::I32(1))
    );
}

#[test]
fn nop_is_observationally_transparent() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (func (export "plain") (param i32) (result i32)
               local.get 0
               i32.const 2
               i32.mul)
             (func (export "padded") (param i32) (result i32)
               nop
               local.get 0
               nop
               i32.const 2
               nop
               i32.mul
               nop))"#,
    );

    for input in [-7, 0, 21] {
        let plain = store.invoke(module, "plain", &[Value::I32(input)]).unwrap();
        let padded = store
            .invoke(module, "padded", &[Value::I32(input)])
            .unwrap();

        assert_eq!(plain, padded);
    }
}

#[test]
fn memory_grow_reports_previous_size_and_respects_maximum() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (memory 1 2)
             (func (export "size") (result i32) memory.size)
             (func (export "grow") (param i32) (result i32)
               local.get 0
               memory.grow))"#,
    );

    assert_eq!(
        store.invoke(module, "size", &[]).unwrap(),
        Some(Value::I32(1))
    );
    assert_eq!(
        store.invoke(module, "grow", &[Value::I32(1)]).unwrap(),
        Some(Value::I32(1))
    );
    assert_eq!(
        store.invoke(module, "size", &[]).unwrap(),
        Some(Value::I32(2))
    );
    assert_eq!(
        store.invoke(module, "grow", &[Value::I32(1)]).unwrap(),
        Some(Value::I32(-1))
    );
}

#[test]
fn passive_segment_init_and_drop() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (memory 1)
             (data $greeting "hi")
             (func (export "init") (param i32 i32 i32)
               local.get 0
               local.get 1
               local.get 2
               memory.init $greeting)
             (func (export "toss") data.drop $greeting)
             (func (export "read") (param i32) (result i32)
               local.get 0
               i32.load8_u))"#,
    );

    store
        .invoke(
            module,
            "init",
            &[Value::I32(8), Value::I32(0), Value::I32(2)],
        )
        .unwrap();

    assert_eq!(
        store.invoke(module, "read", &[Value::I32(8)]).unwrap(),
        Some(Value::I32(b'h' as i32))
    );

    store.invoke(module, "toss", &[]).unwrap();

    let error = store
        .invoke(
            module,
            "init",
            &[Value::I32(8), Value::I32(0), Value::I32(2)],
        )
        .unwrap_err();

    assert_eq!(trap_name(error), "OutOfBoundsMemory");

    store
        .invoke(
            module,
            "init",
            &[Value::I32(8), Value::I32(0), Value::I32(0)],
        )
        .unwrap();
}

#[test]
fn active_data_segment_out_of_bounds_fails_instantiation() {
    let mut store = Store::new();
    let binary = wat::parse_str(
        r#"(module
             (memory 1)
             (data (i32.const 65534) "abcdef"))"#,
    )
    .unwrap();

    let error = store.instantiate(&binary).unwrap_err();

    assert!(matches!(
        error,
        InstantiationError::Link(LinkError::StartTrapped(Trap::OutOfBoundsMemory))
    ));
}

#[test]
fn start_function_runs_at_instantiation() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (global $ready (mut i32) (i32.const 0))
             (func $mark i32.const 1 global.set $ready)
             (start $mark)
             (func (export "ready") (result i32) global.get $ready))"#,
    );

    assert_eq!(
        store.invoke(module, "ready", &[]).unwrap(),
        Some(Value::I32(1))
    );
}

#[test]
fn imported_global_is_read_and_written() {
    let mut store = Store::new();
    let counter = store
        .allocate_global(GlobalType::mutable(ValueType::I32), Value::I32(5))
        .unwrap();

    store.register_import("env", "counter", ExternalValue::Global(counter));

    let module = instantiate(
        &mut store,
        r#"(module
             (import "env" "counter" (global $counter (mut i32)))
             (func (export "bump") (result i32)
               global.get $counter
               i32.const 1
               i32.add
               global.set $counter
               global.get $counter))"#,
    );

    assert_eq!(
        store.invoke(module, "bump", &[]).unwrap(),
        Some(Value::I32(6))
    );
    assert_eq!(store.global(counter).get(), Value::I32(6));
}

#[test]
fn global_initializer_may_reference_an_imported_global() {
    let mut store = Store::new();
    let base = store
        .allocate_global(GlobalType::immutable(ValueType::I32), Value::I32(40))
        .unwrap();

    store.register_import("env", "base", ExternalValue::Global(base));

    let module = instantiate(
        &mut store,
        r#"(module
             (import "env" "base" (global $base i32))
             (global $derived i32 (global.get $base))
             (func (export "derived") (result i32) global.get $derived))"#,
    );

    assert_eq!(
        store.invoke(module, "derived", &[]).unwrap(),
        Some(Value::I32(40))
    );
}

#[test]
fn data_segment_offset_may_not_reference_an_own_global() {
    let mut store = Store::new();
    let binary = wat::parse_str(
        r#"(module
             (global $base i32 (i32.const 16))
             (memory 1)
             (data (global.get $base) "abc"))"#,
    )
    .unwrap();

    let error = store.instantiate(&binary).unwrap_err();

    assert!(matches!(
        error,
        InstantiationError::Link(LinkError::UnsupportedInitializer { index: 0 })
    ));
}

#[test]
fn element_segment_offset_may_not_reference_an_own_global() {
    let mut store = Store::new();
    let binary = wat::parse_str(
        r#"(module
             (global $base i32 (i32.const 0))
             (table 1 funcref)
             (func $noop)
             (elem (global.get $base) $noop))"#,
    )
    .unwrap();

    let error = store.instantiate(&binary).unwrap_err();

    assert!(matches!(
        error,
        InstantiationError::Link(LinkError::UnsupportedInitializer { index: 0 })
    ));
}

#[test]
fn segment_offset_may_reference_an_imported_global() {
    let mut store = Store::new();
    let base = store
        .allocate_global(GlobalType::immutable(ValueType::I32), Value::I32(16))
        .unwrap();

    store.register_import("env", "base", ExternalValue::Global(base));

    let module = instantiate(
        &mut store,
        r#"(module
             (import "env" "base" (global $base i32))
             (memory 1)
             (data (global.get $base) "abc")
             (func (export "read") (param i32) (result i32)
               local.get 0
               i32.load8_u))"#,
    );

    assert_eq!(
        store.invoke(module, "read", &[Value::I32(16)]).unwrap(),
        Some(Value::I32(b'a' as i32))
    );
}

#[test]
fn missing_import_fails_to_link() {
    let mut store = Store::new();
    let binary = wat::parse_str(r#"(module (import "env" "absent" (func)))"#).unwrap();

    let error = store.instantiate(&binary).unwrap_err();

    assert!(matches!(
        error,
        InstantiationError::Link(LinkError::MissingImport { .. })
    ));
}

#[test]
fn function_import_with_wrong_signature_fails_to_link() {
    let mut store = Store::new();

    store.register_function(
        "env",
        "callback",
        FunctionType::new(ResultType::new(vec![ValueType::I64]), ResultType::empty()),
        |_| Ok(None),
    );

    let binary =
        wat::parse_str(r#"(module (import "env" "callback" (func (param i32))))"#).unwrap();

    let error = store.instantiate(&binary).unwrap_err();

    assert!(matches!(
        error,
        InstantiationError::Link(LinkError::SignatureMismatch { .. })
    ));
}

#[test]
fn global_import_with_wrong_mutability_fails_to_link() {
    let mut store = Store::new();
    let constant = store
        .allocate_global(GlobalType::immutable(ValueType::I32), Value::I32(0))
        .unwrap();

    store.register_import("env", "value", ExternalValue::Global(constant));

    let binary =
        wat::parse_str(r#"(module (import "env" "value" (global (mut i32))))"#).unwrap();

    let error = store.instantiate(&binary).unwrap_err();

    assert!(matches!(
        error,
        InstantiationError::Link(LinkError::MutabilityMismatch { .. })
    ));
}

#[test]
fn imported_memory_with_insufficient_limits_fails_to_link() {
    let mut store = Store::new();
    let memory = store.allocate_memory(MemoryType::new(Limit::bounded(1, 1)));

    store.register_import("env", "memory", ExternalValue::Memory(memory));

    let binary = wat::parse_str(r#"(module (import "env" "memory" (memory 2)))"#).unwrap();

    let error = store.instantiate(&binary).unwrap_err();

    assert!(matches!(
        error,
        InstantiationError::Link(LinkError::LimitsMismatch { .. })
    ));
}

#[test]
fn imported_memory_is_shared_with_the_host() {
    let mut store = Store::new();
    let memory = store.allocate_memory(MemoryType::new(Limit::unbounded(1)));

    store.register_import("env", "memory", ExternalValue::Memory(memory));

    let module = instantiate(
        &mut store,
        r#"(module
             (import "env" "memory" (memory 1))
             (func (export "read") (param i32) (result i32)
               local.get 0
               i32.load8_u))"#,
    );

    store.memory_mut(memory).write(32, b"*").unwrap();

    assert_eq!(
        store.invoke(module, "read", &[Value::I32(32)]).unwrap(),
        Some(Value::I32(b'*' as i32))
    );
}

#[test]
fn runaway_recursion_traps_with_stack_overflow() {
    let mut store = Store::with_limits(StoreLimits::new(64));
    let module = instantiate(
        &mut store,
        r#"(module (func $spin (export "spin") call $spin))"#,
    );

    let error = store.invoke(module, "spin", &[]).unwrap_err();

    assert_eq!(trap_name(error), "StackOverflow");
}

#[test]
fn host_error_surfaces_as_a_host_trap() {
    let mut store = Store::new();

    store.register_function("env", "fail", FunctionType::runnable(), |_| {
        Err("the host declined".into())
    });

    let module = instantiate(
        &mut store,
        r#"(module
             (import "env" "fail" (func $fail))
             (func (export "run") call $fail))"#,
    );

    let error = store.invoke(module, "run", &[]).unwrap_err();

    assert_eq!(trap_name(error), "Host");
}

#[test]
fn trap_leaves_sibling_instances_untouched() {
    let source = r#"(module
         (memory 1)
         (func (export "write") (param i32 i32)
           local.get 0
           local.get 1
           i32.store)
         (func (export "read") (param i32) (result i32)
           local.get 0
           i32.load)
         (func (export "boom") unreachable))"#;

    let mut store = Store::new();
    let first = instantiate(&mut store, source);
    let second = instantiate(&mut store, source);

    store
        .invoke(first, "write", &[Value::I32(0), Value::I32(7)])
        .unwrap();
    store
        .invoke(second, "write", &[Value::I32(0), Value::I32(9)])
        .unwrap();

    let error = store.invoke(second, "boom", &[]).unwrap_err();

    assert_eq!(trap_name(error), "Unreachable");
    assert_eq!(
        store.invoke(first, "read", &[Value::I32(0)]).unwrap(),
        Some(Value::I32(7))
    );
    assert_eq!(
        store.invoke(second, "read", &[Value::I32(0)]).unwrap(),
        Some(Value::I32(9))
    );
}

#[test]
fn reference_instructions_inspect_nullness() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (func $probe)
             (elem declare func $probe)
             (func (export "null_is_null") (result i32)
               ref.null func
               ref.is_null)
             (func (export "func_is_null") (result i32)
               ref.func $probe
               ref.is_null))"#,
    );

    assert_eq!(
        store.invoke(module, "null_is_null", &[]).unwrap(),
        Some(Value::I32(1))
    );
    assert_eq!(
        store.invoke(module, "func_is_null", &[]).unwrap(),
        Some(Value::I32(0))
    );
}

#[test]
fn select_picks_by_condition() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (func (export "pick") (param i32) (result i32)
               i32.const 100
               i32.const 200
               local.get 0
               select))"#,
    );

    assert_eq!(
        store.invoke(module, "pick", &[Value::I32(1)]).unwrap(),
        Some(Value::I32(100))
    );
    assert_eq!(
        store.invoke(module, "pick", &[Value::I32(0)]).unwrap(),
        Some(Value::I32(200))
    );
}

#[test]
fn invoke_rejects_wrong_arguments() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module (func (export "echo") (param i32) (result i32) local.get 0))"#,
    );

    assert!(matches!(
        store.invoke(module, "echo", &[]),
        Err(InvokeError::ArityMismatch {
            expected: 1,
            actual: 0
        })
    ));
    assert!(matches!(
        store.invoke(module, "echo", &[Value::F32(1.0)]),
        Err(InvokeError::ArgumentTypeMismatch { index: 0 })
    ));
    assert!(matches!(
        store.invoke(module, "absent", &[]),
        Err(InvokeError::UnknownExport(_))
    ));
}

#[test]
fn sixty_four_bit_arithmetic() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (func (export "mul") (param i64 i64) (result i64)
               local.get 0
               local.get 1
               i64.mul)
             (func (export "sqrt") (param f64) (result f64)
               local.get 0
               f64.sqrt))"#,
    );

    assert_eq!(
        store
            .invoke(
                module,
                "mul",
                &[Value::I64(0x1_0000_0000), Value::I64(0x10)]
            )
            .unwrap(),
        Some(Value::I64(0x10_0000_0000))
    );

    let root = store
        .invoke(module, "sqrt", &[Value::F64(2.0)])
        .unwrap()
        .unwrap()
        .as_f64()
        .unwrap();

    assert!((root - std::f64::consts::SQRT_2).abs() < 1e-6);
}

#[test]
fn locals_start_zeroed() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (func (export "zero") (result i64)
               (local i64)
               local.get 0))"#,
    );

    assert_eq!(
        store.invoke(module, "zero", &[]).unwrap(),
        Some(Value::I64(0))
    );
}

#[test]
fn exports_expose_kind_and_handle() {
    let mut store = Store::new();
    let module = instantiate(
        &mut store,
        r#"(module
             (memory (export "memory") 1)
             (global (export "answer") i32 (i32.const 42))
             (func (export "noop")))"#,
    );

    match store.get_export(module, "memory") {
        Some(export @ ExternalValue::Memory(address)) => {
            assert_eq!(export.kind(), ExternalKind::Memory);
            assert_eq!(store.memory(address).size_pages(), 1);
        }
        other => panic!("expected a memory export, got {other:?}"),
    }

    match store.get_export(module, "answer") {
        Some(ExternalValue::Global(address)) => {
            assert_eq!(store.global(address).get(), Value::I32(42));
        }
        other => panic!("expected a global export, got {other:?}"),
    }

    assert!(matches!(
        store.get_export(module, "noop"),
        Some(ExternalValue::Function(_))
    ));
}
