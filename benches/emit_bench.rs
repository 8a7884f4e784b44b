use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use progemit::ir::{IntType, IrValue};
use progemit::options::{CheckAlgo, OptionLevel, Options};
use progemit::program::{emit, Program};
use progemit::stmt::Stmt;
use progemit::symbol::{Array, ArrayKind, Kind, PtrKind, ScalarVar};

const VAR_KINDS: [Kind; 9] = [
    Kind::Ordinary,
    Kind::Pointer(PtrKind::Raw),
    Kind::Pointer(PtrKind::Shared),
    Kind::Pointer(PtrKind::Unique),
    Kind::StructMember,
    Kind::ClassPublicMember,
    Kind::ClassPrivateMember,
    Kind::DynamicStructMember,
    Kind::DynamicClassMember,
];

const ARRAY_KINDS: [ArrayKind; 5] = [
    ArrayKind::Ordinary,
    ArrayKind::StructMember,
    ArrayKind::ClassPublicMember,
    ArrayKind::DynamicStructMember,
    ArrayKind::DynamicClassMember,
];

/// A program with `n` scalars and `n / 2` arrays per table, cycling through
/// every declaration kind.
fn generate_program(n: usize) -> Program {
    let v = IrValue::from_u64;
    let mut p = Program::default();
    let mut id = 0;
    let mut next = |prefix: &str| {
        id += 1;
        format!("{}_{}", prefix, id)
    };
    for i in 0..n {
        let kind = VAR_KINDS[i % VAR_KINDS.len()];
        p.inputs
            .add_var(ScalarVar::new(next("var"), IntType::Int, v(i as u64)).with_kind(kind))
            .unwrap();
        let kind = VAR_KINDS[(i + 4) % VAR_KINDS.len()];
        p.outputs
            .add_var(
                ScalarVar::new(next("var"), IntType::Ulong, v(0))
                    .with_kind(kind)
                    .with_current(v(i as u64 * 3)),
            )
            .unwrap();
    }
    for i in 0..n / 2 {
        let dims = vec![4 + i % 3, 8];
        let kind = ARRAY_KINDS[i % ARRAY_KINDS.len()];
        p.inputs
            .add_array(Array::new(next("arr"), IntType::Short, dims.clone(), v(1), v(1)).with_kind(kind))
            .unwrap();
        let mut out = Array::new(next("arr"), IntType::Llong, dims, v(0), v(7)).with_kind(kind);
        if i % 2 == 0 {
            out = out.with_mul_vals(1, v(2), v(9)).with_footprint(vec![3, 8], vec![1, 2]);
        }
        p.outputs.add_array(out).unwrap();
    }
    p.test = (0..n)
        .map(|i| Stmt::Loop {
            header: format!("for (int i_{} = 0; i_{} < 4; ++i_{})", i, i, i),
            body: vec![Stmt::expr("zero += 0")],
        })
        .collect();
    p.with_zero_var()
}

fn bench_emit_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit/scaling");
    let opts = Options::default();

    for n in [8_usize, 32, 128, 512] {
        let program = generate_program(n);
        group.bench_with_input(BenchmarkId::from_parameter(format!("{}vars", n)), &program, |b, program| {
            b.iter(|| black_box(emit(black_box(program), &opts).unwrap()));
        });
    }

    group.finish();
}

fn bench_check_algo(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit/check_algo");
    let program = generate_program(64);

    for algo in [CheckAlgo::Precompute, CheckAlgo::Hash, CheckAlgo::Asserts] {
        let opts = Options {
            check_algo: algo,
            inp_as_args: OptionLevel::Some,
            emit_align_attr: OptionLevel::Some,
            ..Options::default()
        };
        group.bench_function(format!("{:?}", algo).to_lowercase(), |b| {
            b.iter(|| black_box(emit(black_box(&program), &opts).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_emit_scaling, bench_check_algo);
criterion_main!(benches);
