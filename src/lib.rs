//!
//! niosim is an instructional simulator for a small Nios II flavoured instruction set. It
//! assembles a source file into a memory image in a single pass, and then executes that image
//! one instruction at a time against 32 registers and 65536 memory cells.
//!
//! It's a teaching tool, not a hardware model: there's no pipeline, no caches, no interrupts and
//! no binary encoding. Every memory cell holds a whole instruction or a whole data word, and the
//! program counter advances by one per instruction. The last two addresses are a seven segment
//! display and a bank of slide switches.
//!
//! Some instructions behave the way the classroom simulator niosim replaces did, rather than the
//! way the ISA manual says, see [`simulator::Compat`].
//!

pub mod bits;
pub mod config;
pub mod instruction;
pub mod parser;
pub mod simulator;
pub(crate) mod utf8_lossy_lines;

pub use simulator::Simulator;
