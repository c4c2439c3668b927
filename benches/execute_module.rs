use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wasm_vm::{
    parse_binary, Data, Element, Export, ExportDescription, Expression, Function, FunctionType,
    Global, Limit, Memory, MemoryType, Module, NumberType, NumericInstruction, ResultType, Store,
    Table, TableType, Value, ValueType, VariableInstruction,
};

const FIBONACCI: &str = r#"(module
  (func $fibonacci (export "fibonacci") (param i32) (result i32)
    local.get 0
    i32.const 2
    i32.lt_s
    (if (result i32)
      (then local.get 0)
      (else
        local.get 0
        i32.const 1
        i32.sub
        call $fibonacci
        local.get 0
        i32.const 2
        i32.sub
        call $fibonacci
        i32.add))))"#;

/// Builds a module with one of each kind of definition through the builder API.
fn singular_module() -> Module {
    let mut builder = Module::builder();

    let kind = builder
        .add_function_type(FunctionType::new(
            ResultType::new(vec![ValueType::I32, ValueType::I32]),
            ResultType::new(vec![ValueType::I32]),
        ))
        .expect("the module should have room for a type");
    let function = builder
        .add_function(Function::new(
            kind,
            ResultType::empty(),
            Expression::new(vec![
                VariableInstruction::LocalGet(0).into(),
                VariableInstruction::LocalGet(1).into(),
                NumericInstruction::Add(NumberType::I32).into(),
            ]),
        ))
        .expect("the module should have room for a function");

    builder
        .add_memory(Memory::new(MemoryType::new(Limit::unbounded(1))))
        .expect("the module should have room for a memory");
    builder
        .add_table(Table::new(TableType::new(Limit::bounded(1, 1))))
        .expect("the module should have room for a table");
    builder
        .add_global(Global::immutable(
            ValueType::I32,
            Expression::new(vec![42i32.into()]),
        ))
        .expect("the module should have room for a global");
    builder
        .add_element(Element::active(
            0,
            Expression::new(vec![0i32.into()]),
            vec![Expression::new(vec![
                wasm_vm::ReferenceInstruction::Function(function).into(),
            ])],
        ))
        .expect("the module should have room for an element segment");
    builder
        .add_data(Data::active(
            0,
            Expression::new(vec![0i32.into()]),
            b"seed".to_vec(),
        ))
        .expect("the module should have room for a data segment");
    builder.add_export(Export::new(
        "add".into(),
        ExportDescription::Function(function),
    ));

    builder.build()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let fibonacci = wat::parse_str(FIBONACCI).expect("the benchmark module should assemble");

    c.bench_function("instantiate", |b| {
        let module = singular_module();

        b.iter(|| {
            let mut store = Store::new();

            store
                .instantiate_module(black_box(&module))
                .expect("the module should instantiate")
        })
    });

    c.bench_function("decode", |b| {
        b.iter(|| parse_binary(black_box(&fibonacci)).expect("the module should decode"))
    });

    c.bench_function("invoke_add", |b| {
        let mut store = Store::new();
        let module = store
            .instantiate_module(&singular_module())
            .expect("the module should instantiate");

        b.iter(|| {
            store
                .invoke(module, "add", &[Value::I32(2), Value::I32(3)])
                .expect("the invocation should succeed")
        })
    });

    c.bench_function("fibonacci_15", |b| {
        let mut store = Store::new();
        let module = store
            .instantiate(&fibonacci)
            .expect("the module should instantiate");

        b.iter(|| {
            store
                .invoke(module, "fibonacci", &[Value::I32(15)])
                .expect("the invocation should succeed")
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
