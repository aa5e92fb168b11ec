use crate::instruction::InstructionRecord;
use crate::simulator::error::ExecError;
use parking_lot::Mutex;
use std::sync::Arc;

pub mod consts;
pub use consts::*;

pub mod seven_segment;

/// A single memory cell. Addresses hold exactly one of these.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Cell {
    #[default]
    Empty,
    Instruction(InstructionRecord),
    Data(i32),
}

/// The memory-mapped devices: a seven segment display and a few slide switches. Shared between
/// the simulator and whoever is drawing them, see [`IoHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoPorts {
    display: i32,
    glyphs: [char; DISPLAY_DIGITS],
    switches: i32,
}

impl Default for IoPorts {
    fn default() -> Self {
        Self {
            display: 0,
            glyphs: [seven_segment::BLANK; DISPLAY_DIGITS],
            switches: 0,
        }
    }
}

impl IoPorts {
    /// The last word stored to the display
    pub fn display(&self) -> i32 {
        self.display
    }

    /// Display digits, leftmost first
    pub fn glyphs(&self) -> [char; DISPLAY_DIGITS] {
        self.glyphs
    }

    pub fn display_text(&self) -> String {
        self.glyphs.iter().collect()
    }

    pub fn set_display(&mut self, word: i32) {
        self.display = word;
        self.glyphs = seven_segment::render(word);
    }

    pub fn switches(&self) -> i32 {
        self.switches
    }

    pub fn switch(&self, n: u32) -> bool {
        n < SWITCH_COUNT && self.switches >> n & 1 == 1
    }

    pub fn set_switches(&mut self, word: i32) {
        self.switches = word;
    }

    /// Flips switch `n`. Returns false (and does nothing) if there's no such switch.
    pub fn toggle_switch(&mut self, n: u32) -> bool {
        if n >= SWITCH_COUNT {
            return false;
        }
        self.switches ^= 1 << n;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub type IoHandle = Arc<Mutex<IoPorts>>;

/// Unified memory: the program image and its data share the same 65536 cells. The last two are
/// not real cells, reads and writes there go to the [`IoPorts`].
pub struct Memory {
    cells: Vec<Cell>,
    io: IoHandle,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Self {
            cells: vec![Cell::Empty; IO_START],
            io: Arc::new(Mutex::new(IoPorts::default())),
        }
    }

    /// Uses an existing set of I/O ports instead of fresh ones
    pub fn with_io(mut self, io: IoHandle) -> Self {
        self.io = io;
        self
    }

    pub fn io(&self) -> IoHandle {
        self.io.clone()
    }

    /// Converts an effective address into a memory index
    pub fn address(x: i64) -> Result<usize, ExecError> {
        usize::try_from(x)
            .ok()
            .filter(|&a| a < MEMORY_SIZE)
            .ok_or(ExecError::AddressOutOfRange(x))
    }

    /// Reads a cell. `None` means there's nothing there, which is not the same as `Data(0)`.
    /// I/O addresses always hold data.
    pub fn read(&self, addr: usize) -> Option<Cell> {
        match addr {
            DISPLAY_ADDRESS => Some(Cell::Data(self.io.lock().display())),
            SWITCH_ADDRESS => Some(Cell::Data(self.io.lock().switches())),
            _ => self.get(addr).cloned(),
        }
    }

    /// Borrows a regular (non I/O) cell, if it's not empty
    pub fn get(&self, addr: usize) -> Option<&Cell> {
        self.cells.get(addr).filter(|cell| **cell != Cell::Empty)
    }

    /// Writes a cell. Writing to the I/O window stores the data word there, anything that isn't a
    /// data word is stored as 0.
    pub fn write(&mut self, addr: usize, cell: Cell) -> Result<(), ExecError> {
        let word = match &cell {
            Cell::Data(x) => *x,
            _ => 0,
        };

        match addr {
            DISPLAY_ADDRESS => self.io.lock().set_display(word),
            SWITCH_ADDRESS => self.io.lock().set_switches(word),
            _ => {
                let slot = self
                    .cells
                    .get_mut(addr)
                    .ok_or(ExecError::AddressOutOfRange(addr as i64))?;
                *slot = cell;
            }
        }
        Ok(())
    }

    /// Reads a data word, as `ldw` and friends do
    pub fn load_word(&self, addr: usize) -> Result<i32, ExecError> {
        match self.read(addr) {
            Some(Cell::Data(x)) => Ok(x),
            _ => Err(ExecError::UndefinedMemoryAccess { address: addr }),
        }
    }

    pub fn store_word(&mut self, addr: usize, word: i32) -> Result<(), ExecError> {
        self.write(addr, Cell::Data(word))
    }

    /// Fetches the instruction at `pc`
    pub fn fetch(&self, pc: usize) -> Result<&InstructionRecord, ExecError> {
        if (IO_START..MEMORY_SIZE).contains(&pc) {
            return Err(ExecError::NotAnInstruction { address: pc });
        }

        match self.get(pc) {
            Some(Cell::Instruction(record)) => Ok(record),
            Some(_) => Err(ExecError::NotAnInstruction { address: pc }),
            None => Err(ExecError::UndefinedMemoryAccess { address: pc }),
        }
    }

    /// Clears every cell and resets the I/O ports
    pub fn reset(&mut self) {
        self.cells.fill(Cell::Empty);
        self.io.lock().reset();
    }

    /// Replaces the whole memory by an image, starting at address 0
    pub fn load_image(&mut self, image: Vec<Cell>) {
        self.reset();
        for (slot, cell) in self.cells.iter_mut().zip(image) {
            *slot = cell;
        }
    }

    pub fn toggle_switch(&self, n: u32) -> bool {
        self.io.lock().toggle_switch(n)
    }

    /// Human readable content of a cell
    pub fn describe(&self, addr: usize) -> String {
        match self.read(addr) {
            Some(Cell::Instruction(record)) => record.to_string(),
            Some(Cell::Data(x)) => x.to_string(),
            _ => "No Data".to_owned(),
        }
    }

    /// Addresses of every cell that isn't empty, in order
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell != Cell::Empty)
    }

    /// How many cells are still empty. The I/O ports don't count.
    pub fn free_cells(&self) -> usize {
        self.cells.len() - self.occupied().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instr(text: &str) -> Cell {
        let tokens = text.split_whitespace().map(str::to_owned).collect();
        Cell::Instruction(InstructionRecord::from_tokens(tokens, text).unwrap())
    }

    #[test]
    fn test_read_write() {
        let mut mem = Memory::new();
        assert_eq!(mem.read(10), None);
        mem.write(10, Cell::Data(0)).unwrap();
        assert_eq!(mem.read(10), Some(Cell::Data(0)));
        assert_eq!(mem.load_word(10).unwrap(), 0);
        assert!(matches!(
            mem.load_word(11),
            Err(ExecError::UndefinedMemoryAccess { address: 11 })
        ));
    }

    #[test]
    fn test_fetch() {
        let mut mem = Memory::new();
        mem.load_image(vec![instr("nop"), Cell::Data(3)]);
        assert_eq!(mem.fetch(0).unwrap().mnemonic, "nop");
        assert!(matches!(
            mem.fetch(1),
            Err(ExecError::NotAnInstruction { address: 1 })
        ));
        assert!(matches!(
            mem.fetch(2),
            Err(ExecError::UndefinedMemoryAccess { address: 2 })
        ));
        assert!(matches!(
            mem.fetch(SWITCH_ADDRESS),
            Err(ExecError::NotAnInstruction { .. })
        ));
    }

    #[test]
    fn test_load_image_replaces_everything() {
        let mut mem = Memory::new();
        mem.write(500, Cell::Data(7)).unwrap();
        mem.store_word(DISPLAY_ADDRESS, 0x3F).unwrap();
        mem.load_image(vec![Cell::Data(1)]);
        assert_eq!(mem.read(500), None);
        assert_eq!(mem.read(0), Some(Cell::Data(1)));
        assert_eq!(mem.load_word(DISPLAY_ADDRESS).unwrap(), 0);
        assert_eq!(mem.occupied().count(), 1);
        assert_eq!(mem.free_cells(), IO_START - 1);
    }

    #[test]
    fn test_free_cells() {
        let mut mem = Memory::new();
        assert_eq!(mem.free_cells(), IO_START);
        mem.load_image(vec![instr("nop"), Cell::Empty, Cell::Data(0)]);
        assert_eq!(mem.free_cells(), IO_START - 2);
        mem.write(IO_START - 1, Cell::Data(5)).unwrap();
        assert_eq!(mem.free_cells(), IO_START - 3);
        mem.reset();
        assert_eq!(mem.free_cells(), IO_START);
    }

    #[test]
    fn test_display() {
        let mut mem = Memory::new();
        let io = mem.io();
        mem.store_word(DISPLAY_ADDRESS, 0x0006_5B4F).unwrap();
        assert_eq!(io.lock().display_text(), " 123");
        assert_eq!(io.lock().display(), 0x0006_5B4F);
        assert_eq!(mem.load_word(DISPLAY_ADDRESS).unwrap(), 0x0006_5B4F);
    }

    #[test]
    fn test_switches() {
        let mem = Memory::new();
        assert!(mem.toggle_switch(0));
        assert!(mem.toggle_switch(2));
        assert!(!mem.toggle_switch(SWITCH_COUNT));
        assert_eq!(mem.load_word(SWITCH_ADDRESS).unwrap(), 0b101);
        assert!(mem.toggle_switch(0));
        assert_eq!(mem.load_word(SWITCH_ADDRESS).unwrap(), 0b100);
        assert!(mem.io().lock().switch(2));
    }

    #[test]
    fn test_shared_io() {
        let io = IoHandle::default();
        let mem = Memory::new().with_io(io.clone());
        io.lock().toggle_switch(3);
        assert_eq!(mem.load_word(SWITCH_ADDRESS).unwrap(), 0b1000);
    }

    #[test]
    fn test_address() {
        assert_eq!(Memory::address(0xFFFF).unwrap(), 0xFFFF);
        assert!(matches!(
            Memory::address(-1),
            Err(ExecError::AddressOutOfRange(-1))
        ));
        assert!(Memory::address(0x1_0000).is_err());
    }

    #[test]
    fn test_describe() {
        let mut mem = Memory::new();
        mem.load_image(vec![instr("add r1, r2, r3"), Cell::Data(-9)]);
        assert_eq!(mem.describe(0), "add r1, r2, r3");
        assert_eq!(mem.describe(1), "-9");
        assert_eq!(mem.describe(2), "No Data");
    }
}
