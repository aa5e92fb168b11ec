use niosim::simulator::{RunState, Simulator};
use std::path::Path;

/// Every program in tests/programs leaves this in r2 when it works
const SUCCESS: i32 = 42;

/// Switches 0 and 2 are on
const SWITCHES: i32 = 0b0101;

const MAX_CYCLES: u64 = 1_000_000;

fn run(path: &impl AsRef<Path>) -> Simulator {
    let path = path.as_ref();
    let mut sim = Simulator::new();
    sim.load_file(path)
        .unwrap_or_else(|e| panic!("Couldn't assemble <{}>: {e}", path.display()));
    sim.io().lock().set_switches(SWITCHES);

    sim.start().unwrap();
    while sim.tick() == RunState::Running {
        assert!(
            sim.cycles() < MAX_CYCLES,
            "<{}> is taking too long",
            path.display()
        );
    }
    sim
}

fn check(path: &impl AsRef<Path>) -> Simulator {
    let sim = run(path);
    let path = path.as_ref().display();

    assert_eq!(
        sim.state(),
        RunState::Complete,
        "<{path}> halted with {:?}",
        sim.termination()
    );
    assert_eq!(
        sim.registers().read(2),
        SUCCESS,
        "<{path}> failed, halted at pc {:#06x}",
        sim.pc()
    );
    sim
}

#[test]
fn test_programs() {
    let dir = Path::new("tests/programs");
    assert!(dir.is_dir(), "programs directory not found!");

    let mut count = 0;
    for file in dir.read_dir().unwrap() {
        let path = file.unwrap().path();
        if path.extension().unwrap_or_default() == "s" {
            check(&path);
            count += 1;
        }
    }
    assert!(count >= 6, "only found {count} programs");
}

#[test]
fn test_display_program() {
    let sim = check(&"tests/programs/io.s");
    let io = sim.io();
    assert_eq!(io.lock().display_text(), "0123");
    assert_eq!(io.lock().display(), 0x3F06_5B4F);
}

#[test]
fn test_recovered_fault_program() {
    let sim = check(&"tests/programs/bits.s");
    assert_eq!(sim.faults().len(), 1);
    assert_eq!(sim.registers().get(12), None);
}

#[test]
fn test_end_directive_program() {
    let mut sim = Simulator::new();
    let report = sim.load_file("tests/programs/bits.s").unwrap();
    assert!(report.ended);
    assert_eq!(report.labels, 1);
}
