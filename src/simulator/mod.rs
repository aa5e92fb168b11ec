//!
//! Runs a loaded program one instruction at a time.
//!
//! The [`Simulator`] owns everything a program can touch: registers, memory, the label table and
//! the program counter. It's driven from the outside: call [`Simulator::tick`] (or
//! [`Simulator::step`]) as often as you want cycles to happen, or [`Simulator::run`] to go until
//! the program halts. Instructions are decoded right before they're executed, see
//! [`crate::instruction::Instruction::decode`], and their semantics live in `executor.rs`.
//!

use crate::instruction::Instruction;
use crate::parser::{self, AsmParser, Labels};
use owo_colors::OwoColorize;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub mod error;
use error::{ExecError, SimError};

mod executor;
pub use executor::{Compat, Flow};

mod into_register;

pub mod memory;
use memory::{Cell, IoHandle, Memory, DISPLAY_ADDRESS, SWITCH_ADDRESS};

pub mod registers;
use registers::RegisterFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Loaded (or restarted) and not started yet
    Idle,
    Running,
    Paused,
    /// Executing a single cycle on behalf of [`Simulator::step`]
    Stepping,
    /// Halted normally
    Complete,
    /// Halted on an error
    Error,
}

impl RunState {
    pub fn is_halted(self) -> bool {
        matches!(self, RunState::Complete | RunState::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Complete,
    Error,
}

/// How and where a program halted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Termination {
    pub status: RunStatus,
    pub pc: usize,
    pub error: Option<ExecError>,
}

/// An error the simulator recovered from, like a division by zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub pc: usize,
    pub error: ExecError,
}

/// Summary of a successful load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub labels: usize,
    /// Number of cells the program image occupies, starting at address 0
    pub cells: usize,
    /// Whether the source was cut short by `.end`
    pub ended: bool,
}

/// Asks a running simulator to pause. Clone it and hand it to another thread, the simulator
/// checks it before every cycle.
#[derive(Debug, Clone, Default)]
pub struct PauseHandle(Arc<AtomicBool>);

impl PauseHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Simulates the CPU. Generally initialized by calling [`Simulator::load_file`] and ran by
/// calling [`Simulator::run`].
pub struct Simulator {
    registers: RegisterFile,
    memory: Memory,
    labels: Labels,
    pc: usize,
    compat: Compat,

    state: RunState,
    pause: PauseHandle,
    termination: Option<Termination>,
    faults: Vec<Fault>,
    cycles: u64,
}

impl Default for Simulator {
    fn default() -> Self {
        Self {
            registers: RegisterFile::new(),
            memory: Memory::new(),
            labels: Labels::new(),
            pc: 0,
            compat: Compat::default(),
            state: RunState::Idle,
            pause: PauseHandle::default(),
            termination: None,
            faults: Vec::new(),
            cycles: 0,
        }
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compat(mut self, compat: Compat) -> Self {
        self.compat = compat;
        self
    }

    /// Shares I/O ports with someone else (a display, probably)
    pub fn with_io(mut self, io: IoHandle) -> Self {
        self.memory = std::mem::take(&mut self.memory).with_io(io);
        self
    }

    /// Assembles and loads `source`. See [`Simulator::load_lines`].
    pub fn load(&mut self, source: &str) -> Result<LoadReport, SimError> {
        self.load_lines(source.lines().map(Ok::<_, io::Error>), "<source>")
    }

    /// Assembles and loads a program. On success, memory, labels, registers and the program
    /// counter are all replaced. On failure nothing changes.
    pub fn load_lines<I, S>(&mut self, lines: I, file: &str) -> Result<LoadReport, SimError>
    where
        I: Iterator<Item = io::Result<S>>,
        S: AsRef<str>,
    {
        self.check_loadable()?;
        let parsed = lines.parse_asm(file)?;
        Ok(self.commit(parsed))
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadReport, SimError> {
        self.check_loadable()?;
        let parsed = parser::parse_file(path)?;
        Ok(self.commit(parsed))
    }

    fn check_loadable(&self) -> Result<(), SimError> {
        match self.state {
            RunState::Running | RunState::Stepping => Err(SimError::Busy),
            _ => Ok(()),
        }
    }

    fn commit(&mut self, parsed: parser::Parsed) -> LoadReport {
        let report = LoadReport {
            labels: parsed.labels.len(),
            cells: parsed.image.len(),
            ended: parsed.ended,
        };

        self.memory.load_image(parsed.image);
        self.labels = parsed.labels;
        self.restart();

        tracing::debug!(
            labels = report.labels,
            cells = report.cells,
            ended = report.ended,
            "program loaded"
        );
        report
    }

    /// Zeroes registers and the program counter, keeping memory as it is
    pub fn restart(&mut self) {
        self.registers.reset();
        self.pc = 0;
        self.state = RunState::Idle;
        self.termination = None;
        self.faults.clear();
        self.cycles = 0;
        self.pause.clear();
    }

    pub fn start(&mut self) -> Result<(), SimError> {
        match self.state {
            RunState::Idle | RunState::Paused => {
                // a request made while stopped would pause before the first cycle
                self.pause.clear();
                self.state = RunState::Running;
                Ok(())
            }
            RunState::Running => Ok(()),
            RunState::Stepping | RunState::Complete | RunState::Error => Err(SimError::NotRunnable),
        }
    }

    /// Executes one cycle if running. A pending pause request is honored instead of executing.
    pub fn tick(&mut self) -> RunState {
        if self.state == RunState::Running {
            if self.pause.take() {
                self.state = RunState::Paused;
                tracing::debug!(pc = self.pc, "paused");
            } else {
                self.cycle();
            }
        }
        self.state
    }

    pub fn pause(&mut self) {
        self.pause.clear();
        if self.state == RunState::Running {
            self.state = RunState::Paused;
        }
    }

    /// Executes exactly one cycle and pauses
    pub fn step(&mut self) -> Result<RunState, SimError> {
        match self.state {
            RunState::Idle | RunState::Paused | RunState::Running => {}
            RunState::Stepping | RunState::Complete | RunState::Error => {
                return Err(SimError::NotRunnable)
            }
        }

        self.pause.clear();
        self.state = RunState::Stepping;
        self.cycle();
        if self.state == RunState::Stepping {
            self.state = RunState::Paused;
        }
        Ok(self.state)
    }

    /// Runs until the program halts or is paused through a [`PauseHandle`]
    pub fn run(&mut self) -> Result<RunState, SimError> {
        self.start()?;
        while self.tick() == RunState::Running {}
        Ok(self.state)
    }

    fn cycle(&mut self) {
        let pc = self.pc;
        self.cycles += 1;

        match self.execute_at(pc) {
            Ok(Flow::Next) => self.pc += 1,
            Ok(Flow::Jump(target)) => self.pc = target,
            Ok(Flow::Exit) => self.halt(RunStatus::Complete, None),
            Err(error) if error.is_recoverable() => {
                tracing::warn!(pc, %error, "recovered from fault");
                self.faults.push(Fault { pc, error });
                self.pc += 1;
            }
            Err(error) => self.halt(RunStatus::Error, Some(error)),
        }
    }

    fn execute_at(&mut self, pc: usize) -> Result<Flow, ExecError> {
        let record = self.memory.fetch(pc)?;
        let instruction = Instruction::decode(record, &self.labels)?;
        tracing::trace!(pc, %instruction, "executing");
        self.execute(instruction)
    }

    fn halt(&mut self, status: RunStatus, error: Option<ExecError>) {
        self.state = match status {
            RunStatus::Complete => RunState::Complete,
            RunStatus::Error => RunState::Error,
        };

        match &error {
            Some(e) => tracing::info!(pc = self.pc, cycles = self.cycles, error = %e, "halted"),
            None => tracing::info!(pc = self.pc, cycles = self.cycles, "complete"),
        }

        self.termination = Some(Termination {
            status,
            pc: self.pc,
            error,
        });
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn compat(&self) -> Compat {
        self.compat
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn io(&self) -> IoHandle {
        self.memory.io()
    }

    pub fn pause_handle(&self) -> PauseHandle {
        self.pause.clone()
    }

    pub fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    pub fn take_faults(&mut self) -> Vec<Fault> {
        std::mem::take(&mut self.faults)
    }

    pub fn print_state(&self) {
        self.registers.print();

        let io = self.io();
        let io = io.lock();
        eprintln!(
            "{} {:#06x}   {} [{}]   {} {:04b}",
            "pc:".bright_blue(),
            self.pc,
            "display:".bright_blue(),
            io.display_text(),
            "switches:".bright_blue(),
            io.switches() & 0xF,
        );
        for fault in &self.faults {
            eprintln!("{} {} at {:#06x}", "[fault]".bright_yellow(), fault.error, fault.pc);
        }
    }

    /// Prints every occupied cell, with its labels
    pub fn print_image(&self) {
        let mut labels: Vec<_> = self.labels.iter().collect();
        labels.sort_by_key(|&(name, address)| (*address, name));

        eprintln!("{}", "Memory: ---------------------".bright_blue());
        for (address, cell) in self.memory.occupied() {
            for (name, _) in labels.iter().filter(|(_, a)| **a == address) {
                eprintln!("{}:", name.bright_yellow());
            }
            match cell {
                Cell::Instruction(record) => eprintln!("  {address:#06x}  {record}"),
                Cell::Data(x) => eprintln!("  {address:#06x}  {} {x}", ".word".bright_blue()),
                Cell::Empty => {}
            }
        }
        eprintln!(
            "  {DISPLAY_ADDRESS:#06x}  {}\n  {SWITCH_ADDRESS:#06x}  {}",
            "display".bright_blue(),
            "switches".bright_blue()
        );
        eprintln!("{} cells free", self.memory.free_cells());
        eprintln!("{}", "-----------------------------".bright_blue());
    }
}
