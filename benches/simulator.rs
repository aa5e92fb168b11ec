use criterion::{criterion_group, criterion_main, Criterion};
use niosim::parser;
use niosim::simulator::{RunState, Simulator};

const TESTCASES: &[&str] = &["count.s", "fibonacci.s", "memory.s"];

fn criterion_benchmark(c: &mut Criterion) {
    for testcase in TESTCASES {
        let path = format!("./benches/samples/{testcase}");

        c.bench_function(&format!("assemble {testcase}"), |b| {
            b.iter(|| parser::parse_file(&path).unwrap_or_else(|e| panic!("{e}")))
        });

        c.bench_function(&format!("run {testcase}"), |b| {
            let mut simulator = Simulator::new();
            simulator
                .load_file(&path)
                .unwrap_or_else(|e| panic!("Couldn't parse {testcase}: {e}"));

            b.iter(|| {
                simulator.restart();
                let state = simulator.run().unwrap();
                assert_eq!(state, RunState::Complete);
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
