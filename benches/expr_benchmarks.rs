//! Performance benchmarks for the expression pipeline.
//!
//! Each stage is measured on its own so regressions are attributable:
//! - parse: source text to tree
//! - compile: tree to invocable form (resolution and overload picking)
//! - invoke: repeated evaluation of an already compiled expression
//! - pipeline: all three stages end to end

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use dynexpr::{eval, parse, parse_and_compile, Ty, Value};

const ARITHMETIC: &str = "1 + 2 * 3 - 4 / 2";
const CONDITIONAL: &str = "(a, b) => a > b ? a * 2 : b - 1";
const STRINGS: &str = r#""Don't Panic".ToUpper().Substring(0, 5) + "!""#;
const INTERPOLATION: &str = r#"$"total {1 + 2 * 3} items, tag {"order".ToUpper()}""#;
const SEQUENCE: &str = "xs => xs.Where(x => x % 2 == 0).Select(x => x * x).Sum()";
const RECORD: &str = r#"new { Total = 3 * 7, Tag = "order" }.Total"#;
const MATH: &str = "Math.Round(Math.Sqrt(2.0) * 100.0, 2)";

fn int_array(len: i32) -> Value {
    Value::array(Ty::Int32, (0..len).map(Value::Int32).collect())
}

/// Benchmark the parser on representative source shapes.
fn parse_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("expr/parse");

    for (name, source) in [
        ("arithmetic", ARITHMETIC),
        ("conditional_lambda", CONDITIONAL),
        ("string_methods", STRINGS),
        ("interpolation", INTERPOLATION),
        ("sequence_chain", SEQUENCE),
        ("record_literal", RECORD),
    ] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| black_box(parse(black_box(source)).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark compilation from an already parsed tree.
fn compile_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("expr/compile");

    let arithmetic = parse(ARITHMETIC).unwrap();
    group.bench_function("arithmetic", |b| {
        b.iter(|| black_box(dynexpr::compile(black_box(&arithmetic), &[]).unwrap()));
    });

    let conditional = parse(CONDITIONAL).unwrap();
    let int_pair = [Ty::Int32, Ty::Int32];
    group.bench_function("conditional_lambda", |b| {
        b.iter(|| black_box(dynexpr::compile(black_box(&conditional), &int_pair).unwrap()));
    });

    // overload picking and extension unification dominate these two
    let strings = parse(STRINGS).unwrap();
    group.bench_function("string_methods", |b| {
        b.iter(|| black_box(dynexpr::compile(black_box(&strings), &[]).unwrap()));
    });

    let sequence = parse(SEQUENCE).unwrap();
    let array_param = [Ty::Int32.array_of()];
    group.bench_function("sequence_chain", |b| {
        b.iter(|| black_box(dynexpr::compile(black_box(&sequence), &array_param).unwrap()));
    });

    let math = parse(MATH).unwrap();
    group.bench_function("static_overloads", |b| {
        b.iter(|| black_box(dynexpr::compile(black_box(&math), &[]).unwrap()));
    });

    group.finish();
}

/// Benchmark repeated invocation of compiled expressions.
fn invoke_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("expr/invoke");

    let arithmetic = parse_and_compile(ARITHMETIC, &[]).unwrap();
    group.bench_function("arithmetic", |b| {
        b.iter(|| black_box(arithmetic.invoke(black_box(&[])).unwrap()));
    });

    let conditional = parse_and_compile(CONDITIONAL, &[Ty::Int32, Ty::Int32]).unwrap();
    let args = [Value::Int32(3), Value::Int32(9)];
    group.bench_function("conditional_lambda", |b| {
        b.iter(|| black_box(conditional.invoke(black_box(&args)).unwrap()));
    });

    let sequence = parse_and_compile(SEQUENCE, &[Ty::Int32.array_of()]).unwrap();
    for len in [8, 64, 512] {
        let args = [int_array(len)];
        group.bench_function(format!("sequence_chain_{len}"), |b| {
            b.iter(|| black_box(sequence.invoke(black_box(&args)).unwrap()));
        });
    }

    let interpolation = parse_and_compile(INTERPOLATION, &[]).unwrap();
    group.bench_function("interpolation", |b| {
        b.iter(|| black_box(interpolation.invoke(black_box(&[])).unwrap()));
    });

    group.finish();
}

/// Benchmark the whole pipeline the way one-shot callers use it.
fn pipeline_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("expr/pipeline");

    for (name, source) in [
        ("arithmetic", ARITHMETIC),
        ("string_methods", STRINGS),
        ("record_literal", RECORD),
        ("static_overloads", MATH),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| black_box(eval(black_box(source)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    parse_benchmarks,
    compile_benchmarks,
    invoke_benchmarks,
    pipeline_benchmarks
);

criterion_main!(benches);
