use niosim::config::Config;
use niosim::simulator::{RunState, RunStatus, Simulator};
use owo_colors::OwoColorize;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// How often the main thread looks at the display while the simulator runs
const DISPLAY_POLL: Duration = Duration::from_millis(10);

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e}", "error:".bright_red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn Error>> {
    let config = Config::get()?;

    let mut sim = Simulator::new().with_compat(config.compat);
    if let Err(e) = sim.load_file(&config.file) {
        eprintln!("An error occurred while assembling your code:\n{e}");
        return Ok(ExitCode::FAILURE);
    }
    sim.io().lock().set_switches(config.switches);

    if config.print_instructions {
        sim.print_image();
    }

    let start_time = Instant::now();
    let sim = if config.step {
        step_interactively(sim)?
    } else {
        run_in_background(sim, &config)?
    };

    if config.print_state {
        sim.print_state();
    }
    Ok(report(&sim, start_time))
}

/// Runs the simulator in its own thread while this one shows what happens on the display
fn run_in_background(mut sim: Simulator, config: &Config) -> Result<Simulator, Box<dyn Error>> {
    let io = sim.io();
    let tick = Duration::from_millis(config.tick_ms);
    let max_cycles = config.max_cycles;

    sim.start()?;
    let simulator = thread::Builder::new()
        .name("niosim simulator".into())
        .spawn(move || {
            while sim.tick() == RunState::Running {
                if max_cycles.is_some_and(|max| sim.cycles() >= max) {
                    tracing::info!(cycles = sim.cycles(), "cycle limit reached");
                    sim.pause();
                    break;
                }
                if !tick.is_zero() {
                    thread::sleep(tick);
                }
            }
            sim
        })?;

    let mut shown = io.lock().display();
    let mut show_display = || {
        let (word, text) = {
            let io = io.lock();
            (io.display(), io.display_text())
        };
        if word != shown {
            println!("{} [{}]", "display:".bright_blue(), text);
            shown = word;
        }
    };

    while !simulator.is_finished() {
        show_display();
        thread::sleep(DISPLAY_POLL);
    }
    show_display();

    simulator
        .join()
        .map_err(|_| "the simulator thread panicked".into())
}

/// Executes one instruction per line read from stdin
fn step_interactively(mut sim: Simulator) -> Result<Simulator, Box<dyn Error>> {
    eprintln!(
        "{}",
        "enter: step | c: continue | s <n>: toggle switch n | r: registers | q: quit".bright_blue()
    );

    let mut lines = io::stdin().lock().lines();
    while !sim.state().is_halted() {
        let pc = sim.pc();
        eprint!("{:#06x}  {}  {} ", pc, sim.memory().describe(pc), ">".bright_blue());
        io::stderr().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let mut words = line.split_whitespace();

        match words.next() {
            None => {
                sim.step()?;
            }
            Some("c") => {
                sim.run()?;
            }
            Some("s") => {
                let toggled = words
                    .next()
                    .and_then(|n| n.parse().ok())
                    .is_some_and(|n| sim.memory().toggle_switch(n));
                if !toggled {
                    eprintln!("{}", "No such switch".bright_red());
                }
            }
            Some("r") => eprint!("{}", sim.registers()),
            Some("q") => break,
            Some(other) => eprintln!("Unknown command '{}'", other.bright_yellow()),
        }

        let io = sim.io();
        let io = io.lock();
        eprintln!(
            "{} [{}]  {} {:04b}",
            "display:".bright_blue(),
            io.display_text(),
            "switches:".bright_blue(),
            io.switches() & 0xF
        );
    }

    Ok(sim)
}

fn report(sim: &Simulator, start_time: Instant) -> ExitCode {
    for fault in sim.faults() {
        eprintln!("{} {} at {:#06x}", "[warning]".bright_yellow(), fault.error, fault.pc);
    }

    match sim.termination() {
        Some(t) if t.status == RunStatus::Complete => {
            eprintln!(
                "Finished in {} cycles ({}ms)",
                sim.cycles(),
                start_time.elapsed().as_millis()
            );
            ExitCode::SUCCESS
        }
        Some(t) => {
            eprintln!(
                "{} at {:#06x} ({}):",
                "Execution halted".bright_red().bold(),
                t.pc,
                sim.memory().describe(t.pc)
            );
            if let Some(error) = &t.error {
                eprintln!("   {error}");
            }
            ExitCode::FAILURE
        }
        None => {
            eprintln!("Stopped after {} cycles at {:#06x}", sim.cycles(), sim.pc());
            ExitCode::SUCCESS
        }
    }
}
