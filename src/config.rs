use crate::simulator::Compat;
use clap::Parser;
use owo_colors::OwoColorize;
use serde::Deserialize;
use thiserror::Error;

/// Read from the working directory, if it exists
pub const CONFIG_FILE: &str = "niosim.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {0}", CONFIG_FILE.bright_yellow())]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {}: {0}", CONFIG_FILE.bright_yellow())]
    Toml(#[from] toml::de::Error),

    #[error("No file specified")]
    NoFile,
}

#[derive(Parser, Deserialize, Debug, Default)]
#[command(author, version, about)]
#[clap(disable_help_flag = true)]
#[serde(default, deny_unknown_fields)]
pub struct OptionalConfig {
    #[clap(long, action = clap::ArgAction::HelpLong)]
    #[serde(skip)]
    help: Option<bool>,

    /// Milliseconds to wait between cycles. 0 runs as fast as possible
    #[arg(short, long)]
    pub tick_ms: Option<u64>,

    /// `legacy` keeps the classroom simulator's quirks, `strict` follows the ISA manual
    #[arg(short, long, value_enum)]
    pub compat: Option<Compat>,

    /// Stops the program after this many cycles
    #[arg(short, long)]
    pub max_cycles: Option<u64>,

    /// Executes one instruction each time enter is pressed
    #[arg(long)]
    pub step: bool,

    /// Initial position of the slide switches, like 0b0101
    #[arg(long, value_parser = parse_switches)]
    pub switches: Option<i32>,

    /// Prints the memory image after loading
    #[arg(long)]
    pub print_instructions: bool,

    /// Prints the final state of the program after execution
    #[arg(long)]
    pub print_state: bool,

    /// The assembly file to execute
    pub file: Option<String>,
}

fn parse_switches(s: &str) -> Result<i32, String> {
    crate::parser::parse_integer(s)
        .map(crate::bits::signed32)
        .ok_or_else(|| format!("'{s}' is not an integer"))
}

impl OptionalConfig {
    pub fn get_args() -> Self {
        Self::parse()
    }

    pub fn get_toml() -> Result<Self, ConfigError> {
        match std::fs::read_to_string(CONFIG_FILE) {
            Ok(config) => Ok(toml::from_str(&config)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Fields set in `self` win
    pub fn merge(self, rhs: Self) -> Self {
        Self {
            help: self.help.or(rhs.help),
            tick_ms: self.tick_ms.or(rhs.tick_ms),
            compat: self.compat.or(rhs.compat),
            max_cycles: self.max_cycles.or(rhs.max_cycles),
            step: self.step || rhs.step,
            switches: self.switches.or(rhs.switches),
            print_instructions: self.print_instructions || rhs.print_instructions,
            print_state: self.print_state || rhs.print_state,
            file: self.file.or(rhs.file),
        }
    }
}

#[derive(Debug, Default)]
pub struct Config {
    pub tick_ms: u64,
    pub compat: Compat,
    pub max_cycles: Option<u64>,
    pub step: bool,
    pub switches: i32,
    pub print_instructions: bool,
    pub print_state: bool,
    pub file: String,
}

impl TryFrom<OptionalConfig> for Config {
    type Error = ConfigError;

    fn try_from(config: OptionalConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            tick_ms: config.tick_ms.unwrap_or(0),
            compat: config.compat.unwrap_or_default(),
            max_cycles: config.max_cycles,
            step: config.step,
            switches: config.switches.unwrap_or(0),
            print_instructions: config.print_instructions,
            print_state: config.print_state,
            file: config.file.ok_or(ConfigError::NoFile)?,
        })
    }
}

impl Config {
    /// Command line arguments, falling back to `niosim.toml`
    pub fn get() -> Result<Self, ConfigError> {
        OptionalConfig::get_args()
            .merge(OptionalConfig::get_toml()?)
            .try_into()
    }
}
