//! Deals with how instructions are executed

use super::error::ExecError;
use super::into_register::IntoRegister;
use super::memory::{Memory, DISPLAY_ADDRESS};
use super::Simulator;
use crate::bits::{normalize, unsigned32, Signedness};
use crate::instruction::{Instruction, Mnemonic, Operand};
use crate::parser::register_names::LINK_REGISTER;
use serde::Deserialize;

/// Which semantics to use for the handful of instructions where the classroom simulator this
/// crate replaces disagrees with the ISA manual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Compat {
    /// Behave like the classroom simulator, quirks included. Unsigned operands are taken by
    /// magnitude, `cmplt` is `<=`, `bge` is `==`, and so on.
    #[default]
    Legacy,
    /// Behave like the ISA manual says
    Strict,
}

/// What to do after an instruction is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Go to `pc + 1`
    Next,
    Jump(usize),
    /// Halt normally
    Exit,
}

fn bad_operand(op: Operand, expected: &'static str) -> ExecError {
    ExecError::BadOperand {
        token: op.to_string(),
        expected,
    }
}

fn register(op: Operand) -> Result<u8, ExecError> {
    match op {
        Operand::Register(r) => Ok(r),
        other => Err(bad_operand(other, "a register")),
    }
}

fn immediate(op: Operand) -> Result<i32, ExecError> {
    match op {
        Operand::Value(x) => Ok(x),
        other => Err(bad_operand(other, "an immediate or a label")),
    }
}

/// `(imm & 0xFFFF) << 16`, for the `*hi` instructions
fn high_half(imm: i32) -> i32 {
    ((unsigned32(imm as i64) & 0xFFFF) << 16) as i32
}

impl Simulator {
    fn set_reg<T: IntoRegister>(&mut self, i: u8, x: T, m: Mnemonic) -> Result<(), ExecError> {
        if i == 0 {
            return Err(ExecError::ReservedRegisterWrite(m));
        }
        self.registers.write(i, x.into_register());
        Ok(())
    }

    /// `offset(base)`, or just `base`/`address` when there's a single memory operand
    fn effective_address(&self, b: Operand, c: Operand) -> Result<usize, ExecError> {
        let address = match (b, c) {
            (Operand::Register(base), Operand::Missing) => self.registers.read(base) as i64,
            (Operand::Value(address), Operand::Missing) => address as i64,
            (offset, base) => immediate(offset)? as i64 + self.registers.read(register(base)?) as i64,
        };
        Memory::address(address)
    }

    /// Executes a decoded instruction. The program counter is left alone, the caller moves it
    /// according to the returned [`Flow`].
    ///
    /// A division by zero still returns [`ExecError::DivideByZero`], but only after marking the
    /// destination as undefined, so the caller may carry on.
    pub(super) fn execute(&mut self, instr: Instruction) -> Result<Flow, ExecError> {
        use Mnemonic::*;

        let [a, b, c] = instr.operands;
        let m = instr.mnemonic;
        let pc = self.pc;
        let legacy = self.compat == Compat::Legacy;

        // Unsigned view of a register. The legacy semantics take the magnitude and then
        // reinterpret it as a signed word, so `i32::MIN` stays negative.
        let u = |x: i32| -> i64 {
            if legacy {
                unsigned32(x as i64) as i32 as i64
            } else {
                x as u32 as i64
            }
        };

        macro_rules! get {
            ($op:expr) => {
                self.registers.read(register($op)?)
            };
        }

        macro_rules! set {
            ($op:expr => $val:expr) => {{
                let value = $val;
                self.set_reg(register($op)?, value, m)?;
                Flow::Next
            }};
        }

        macro_rules! imm {
            ($op:expr) => {
                immediate($op)?
            };
        }

        macro_rules! branch {
            (if $cond:expr) => {
                if $cond {
                    Flow::Jump(Memory::address(imm!(c) as i64)?)
                } else {
                    Flow::Next
                }
            };
        }

        macro_rules! jump {
            ($target:expr) => {
                Flow::Jump(Memory::address($target as i64)?)
            };
        }

        macro_rules! load {
            ($mode:expr, $width:expr) => {{
                let address = self.effective_address(b, c)?;
                let word = self.memory.load_word(address)?;
                set!(a => normalize(word as i64, $mode, $width))
            }};
        }

        macro_rules! store {
            ($width:expr) => {{
                let address = self.effective_address(b, c)?;
                let value = get!(a);
                // the display always gets the whole register
                let word = if address == DISPLAY_ADDRESS {
                    value
                } else {
                    normalize(value as i64, Signedness::Signed, $width) as i32
                };
                self.memory.store_word(address, word)?;
                Flow::Next
            }};
        }

        let flow = match m {
            // Type R: arithmetic and logic
            Add => set!(a => get!(b) as i64 + get!(c) as i64),
            Sub => set!(a => get!(b) as i64 - get!(c) as i64),
            And => set!(a => get!(b) & get!(c)),
            Or => set!(a => get!(b) | get!(c)),
            Xor => set!(a => get!(b) ^ get!(c)),
            Nor => set!(a => !(get!(b) | get!(c))),
            Mul => set!(a => get!(b) as i64 * get!(c) as i64),
            Mulxss => {
                let product = get!(b) as i64 * get!(c) as i64;
                set!(a => if legacy { product } else { product >> 32 })
            }
            Mulxsu => {
                let product = get!(b) as i64 * u(get!(c));
                set!(a => if legacy { product } else { product >> 32 })
            }
            Mulxuu => {
                let product = (u(get!(b)) as u64).wrapping_mul(u(get!(c)) as u64);
                set!(a => (if legacy { product } else { product >> 32 }) as u32)
            }
            Div => {
                let (dividend, divisor) = (get!(b), get!(c));
                if divisor == 0 {
                    self.registers.set_undefined(register(a)?);
                    return Err(ExecError::DivideByZero);
                }
                set!(a => dividend as i64 / divisor as i64)
            }
            Divu => {
                let (dividend, divisor) = (u(get!(b)), u(get!(c)));
                if divisor == 0 {
                    self.registers.set_undefined(register(a)?);
                    return Err(ExecError::DivideByZero);
                }
                set!(a => dividend / divisor)
            }

            // Type R: comparisons
            Cmpeq => set!(a => get!(b) == get!(c)),
            Cmpne => set!(a => get!(b) != get!(c)),
            Cmpge => set!(a => get!(b) >= get!(c)),
            Cmpgt => set!(a => get!(b) > get!(c)),
            Cmplt if legacy => set!(a => get!(b) <= get!(c)),
            Cmplt => set!(a => get!(b) < get!(c)),
            Cmple if legacy => set!(a => true),
            Cmple => set!(a => get!(b) <= get!(c)),
            Cmpgeu => set!(a => u(get!(b)) >= u(get!(c))),
            Cmpgtu => set!(a => u(get!(b)) > u(get!(c))),
            Cmpleu => set!(a => u(get!(b)) <= u(get!(c))),
            Cmpltu if legacy => {
                // writes the false result into B, r0 included
                if u(get!(b)) <= u(get!(c)) {
                    set!(a => true)
                } else {
                    set!(b => false)
                }
            }
            Cmpltu => set!(a => u(get!(b)) < u(get!(c))),

            // Type R: shifts and rotates
            Sll => set!(a => get!(b) << (get!(c) & 31)),
            Slli => set!(a => get!(b) << (imm!(c) & 31)),
            Sra if legacy => set!(a => (get!(b) as u32) >> (u(get!(c)) & 31)),
            Sra => set!(a => get!(b) >> (get!(c) & 31)),
            Srai if legacy => set!(a => (get!(b) as u32) >> (u(imm!(c)) & 31)),
            Srai => set!(a => get!(b) >> (imm!(c) & 31)),
            Srl => set!(a => (u(get!(b)) as u32) >> (u(get!(c)) & 31)),
            Srli => set!(a => (u(get!(b)) as u32) >> (u(imm!(c)) & 31)),
            Rol => set!(a => (get!(b) as u32).rotate_left(get!(c) as u32 & 31)),
            Roli => set!(a => (get!(b) as u32).rotate_left(imm!(c) as u32 & 31)),
            Ror => set!(a => (get!(b) as u32).rotate_right(get!(c) as u32 & 31)),

            // Type R: control
            Break | Bret => Flow::Exit,
            Callr => {
                let target = get!(a);
                self.registers.write(LINK_REGISTER, (pc + 1).into_register());
                jump!(target)
            }
            Jmp => jump!(get!(a)),
            Ret => jump!(self.registers.read(LINK_REGISTER)),
            Nextpc => set!(a => pc + 1),
            Mov => set!(a => get!(b)),
            Custom | Sync => Flow::Next,

            // Type I: arithmetic and logic
            Addi => set!(a => get!(b) as i64 + imm!(c) as i64),
            Subi => set!(a => get!(b) as i64 - imm!(c) as i64),
            Muli => set!(a => get!(b) as i64 * imm!(c) as i64),
            Andi => set!(a => get!(b) & imm!(c)),
            Ori => set!(a => get!(b) | imm!(c)),
            Xori => set!(a => get!(b) ^ imm!(c)),
            Andhi => set!(a => get!(b) & high_half(imm!(c))),
            Orhi => set!(a => get!(b) | high_half(imm!(c))),
            Xorhi => set!(a => get!(b) ^ high_half(imm!(c))),

            // Type I: comparisons
            Cmpeqi => set!(a => get!(b) == imm!(c)),
            Cmpnei if legacy => set!(a => get!(b) < imm!(c)),
            Cmpnei => set!(a => get!(b) != imm!(c)),
            Cmpgei => set!(a => get!(b) >= imm!(c)),
            Cmpgti => set!(a => get!(b) > imm!(c)),
            Cmplei => set!(a => get!(b) <= imm!(c)),
            Cmplti => set!(a => get!(b) < imm!(c)),
            Cmpgeui => set!(a => u(get!(b)) >= u(imm!(c))),
            Cmpgtui => set!(a => u(get!(b)) > u(imm!(c))),
            Cmpleui => set!(a => u(get!(b)) <= u(imm!(c))),
            Cmpltui if legacy => set!(a => u(get!(b)) <= u(imm!(c))),
            Cmpltui => set!(a => u(get!(b)) < u(imm!(c))),

            // Type I: moves
            Movi | Movia => set!(a => imm!(b)),
            Movui => set!(a => unsigned32(imm!(b) as i64)),
            Movhi => set!(a => high_half(imm!(b))),

            // Type I: branches
            Beq => branch!(if get!(a) == get!(b)),
            Bne => branch!(if get!(a) != get!(b)),
            Bge if legacy => branch!(if get!(a) == get!(b)),
            Bge => branch!(if get!(a) >= get!(b)),
            Bgt => branch!(if get!(a) > get!(b)),
            Ble => branch!(if get!(a) <= get!(b)),
            Blt => branch!(if get!(a) < get!(b)),
            Bgeu => branch!(if u(get!(a)) >= u(get!(b))),
            Bgtu => branch!(if u(get!(a)) > u(get!(b))),
            Bleu => branch!(if u(get!(a)) <= u(get!(b))),
            Bltu => branch!(if u(get!(a)) < u(get!(b))),
            Br => {
                let target = Memory::address(imm!(a) as i64)?;
                if target == pc {
                    Flow::Exit
                } else {
                    Flow::Jump(target)
                }
            }

            // Type I: memory
            Ldb => load!(Signedness::Signed, 8),
            Ldbu => load!(Signedness::Unsigned, 8),
            Ldh => load!(Signedness::Signed, 16),
            Ldhu => load!(Signedness::Unsigned, 16),
            Ldw => load!(Signedness::Signed, 32),
            Stb => store!(8),
            Sth => store!(16),
            Stw => store!(32),

            // Type J
            Call => {
                let target = imm!(a);
                self.registers.write(LINK_REGISTER, (pc + 1).into_register());
                jump!(target)
            }
            Jmpi => jump!(imm!(a)),

            Nop => Flow::Next,
        };

        Ok(flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::{RunState, Simulator};

    fn run_with(compat: Compat, src: &str) -> Simulator {
        let mut sim = Simulator::new().with_compat(compat);
        sim.load(src).unwrap();
        sim.run().unwrap();
        sim
    }

    fn run(src: &str) -> Simulator {
        run_with(Compat::Legacy, src)
    }

    fn reg(sim: &Simulator, i: u8) -> i32 {
        sim.registers().read(i)
    }

    #[test]
    fn test_arithmetic() {
        let sim = run("
            movi r2, 0x7FFFFFFF
            addi r3, r2, 1
            movi r4, 7
            movi r5, -2
            sub r6, r4, r5
            mul r7, r4, r5
            div r8, r4, r5
            divu r9, r4, r5
            nor r10, r4, r0
            muli r11, r2, 2
            subi r12, r0, 1
            break
        ");
        assert_eq!(reg(&sim, 3), i32::MIN);
        assert_eq!(reg(&sim, 6), 9);
        assert_eq!(reg(&sim, 7), -14);
        assert_eq!(reg(&sim, 8), -3);
        assert_eq!(reg(&sim, 9), 3);
        assert_eq!(reg(&sim, 10), !7);
        assert_eq!(reg(&sim, 11), -2);
        assert_eq!(reg(&sim, 12), -1);
        assert_eq!(sim.state(), RunState::Complete);
    }

    #[test]
    fn test_logic_immediates() {
        let sim = run("
            movi r2, 0x0F0F
            andi r3, r2, 0xFF
            ori r4, r2, 0xF000
            xori r5, r2, -1
            movhi r6, 0x1234
            orhi r7, r2, 0xABCD
            andhi r8, r5, 0xFFFF
            xorhi r9, r0, 1
            movui r10, 0xFFFF
            break
        ");
        assert_eq!(reg(&sim, 3), 0x0F);
        assert_eq!(reg(&sim, 4), 0xFF0F);
        assert_eq!(reg(&sim, 5), !0x0F0F);
        assert_eq!(reg(&sim, 6), 0x1234_0000);
        assert_eq!(reg(&sim, 7), 0xABCD_0F0Fu32 as i32);
        assert_eq!(reg(&sim, 8), 0xFFFF_0000u32 as i32);
        assert_eq!(reg(&sim, 9), 0x0001_0000);
        assert_eq!(reg(&sim, 10), 0xFFFF);
    }

    #[test]
    fn test_shifts_and_rotates() {
        let src = "
            movi r2, -16
            movi r3, 2
            sll r4, r2, r3
            srai r5, r2, 2
            srl r6, r2, r3
            movi r7, 0x80000001
            roli r8, r7, 1
            ror r9, r7, r3
            rol r10, r7, r0
            slli r11, r3, 33
            break
        ";
        let legacy = run(src);
        assert_eq!(reg(&legacy, 4), -64);
        assert_eq!(reg(&legacy, 5), (0xFFFF_FFF0u32 >> 2) as i32);
        assert_eq!(reg(&legacy, 6), 4); // |-16| >> 2
        assert_eq!(reg(&legacy, 8), 0x0000_0003);
        assert_eq!(reg(&legacy, 9), 0x6000_0000);
        assert_eq!(reg(&legacy, 10), 0x8000_0001u32 as i32);
        assert_eq!(reg(&legacy, 11), 4);

        let strict = run_with(Compat::Strict, src);
        assert_eq!(reg(&strict, 5), -4);
        assert_eq!(reg(&strict, 6), (0xFFFF_FFF0u32 >> 2) as i32);
        assert_eq!(reg(&strict, 8), 0x0000_0003);
    }

    #[test]
    fn test_extended_multiplication() {
        let src = "
            movi r2, 0x10000
            movi r3, -0x10000
            mulxss r4, r2, r3
            mulxsu r5, r2, r2
            mulxuu r6, r3, r3
            break
        ";
        let legacy = run(src);
        assert_eq!(reg(&legacy, 4), 0);
        assert_eq!(reg(&legacy, 5), 0);
        assert_eq!(reg(&legacy, 6), 0);

        let strict = run_with(Compat::Strict, src);
        assert_eq!(reg(&strict, 4), -1);
        assert_eq!(reg(&strict, 5), 1);
        // 0xFFFF0000 * 0xFFFF0000 = 0xFFFE0001_00000000
        assert_eq!(reg(&strict, 6), 0xFFFE_0001u32 as i32);
    }

    #[test]
    fn test_comparisons() {
        let src = "
            movi r2, 3
            movi r3, 3
            movi r4, -1
            cmplt r5, r2, r3
            cmple r6, r2, r4
            cmpnei r7, r2, 5
            cmpltui r8, r2, 3
            cmpgeu r9, r4, r2
            cmpeqi r10, r4, -1
            cmpgt r11, r2, r4
            break
        ";
        let legacy = run(src);
        assert_eq!(reg(&legacy, 5), 1);
        assert_eq!(reg(&legacy, 6), 1);
        assert_eq!(reg(&legacy, 7), 1);
        assert_eq!(reg(&legacy, 8), 1);
        assert_eq!(reg(&legacy, 9), 0); // |-1| < 3
        assert_eq!(reg(&legacy, 10), 1);
        assert_eq!(reg(&legacy, 11), 1);

        let strict = run_with(Compat::Strict, src);
        assert_eq!(reg(&strict, 5), 0);
        assert_eq!(reg(&strict, 6), 0);
        assert_eq!(reg(&strict, 7), 1);
        assert_eq!(reg(&strict, 8), 0);
        assert_eq!(reg(&strict, 9), 1); // 0xFFFFFFFF >= 3
    }

    #[test]
    fn test_more_comparisons() {
        let src = "
            movi r2, 3
            movi r3, -1
            movi r4, 0x80000000
            movi r5, 5
            cmpeq r6, r2, r2
            cmpne r7, r2, r3
            cmpge r8, r3, r2
            cmpgtu r9, r3, r2
            cmpleu r10, r3, r2
            cmpgei r11, r2, 3
            cmpgti r12, r3, -2
            cmplei r13, r2, 2
            cmpgeui r14, r3, 2
            cmpgtui r15, r2, -2
            cmpleui r16, r2, 3
            cmpgeu r17, r4, r5
            xor r18, r2, r3
            srli r19, r3, 28
            srli r20, r4, 31
            custom
            break
        ";
        let legacy = run(src);
        let strict = run_with(Compat::Strict, src);
        for sim in [&legacy, &strict] {
            assert_eq!(sim.state(), RunState::Complete);
            assert_eq!(reg(sim, 6), 1);
            assert_eq!(reg(sim, 7), 1);
            assert_eq!(reg(sim, 8), 0);
            assert_eq!(reg(sim, 11), 1);
            assert_eq!(reg(sim, 12), 1);
            assert_eq!(reg(sim, 13), 0);
            assert_eq!(reg(sim, 16), 1);
            assert_eq!(reg(sim, 18), -4);
            assert_eq!(reg(sim, 20), 1);
        }

        // |-1| is 1, and |i32::MIN| wraps back to i32::MIN
        assert_eq!(reg(&legacy, 9), 0);
        assert_eq!(reg(&legacy, 10), 1);
        assert_eq!(reg(&legacy, 14), 0);
        assert_eq!(reg(&legacy, 15), 1);
        assert_eq!(reg(&legacy, 17), 0);
        assert_eq!(reg(&legacy, 19), 0);

        assert_eq!(reg(&strict, 9), 1);
        assert_eq!(reg(&strict, 10), 0);
        assert_eq!(reg(&strict, 14), 1);
        assert_eq!(reg(&strict, 15), 0);
        assert_eq!(reg(&strict, 17), 1);
        assert_eq!(reg(&strict, 19), 0xF);
    }

    #[test]
    fn test_legacy_unsigned_min() {
        let src = "
            movi r2, 0x80000000
            movi r3, -3
            divu r4, r2, r3
            mulxuu r5, r2, r3
            break
        ";
        let legacy = run(src);
        assert_eq!(reg(&legacy, 4), -715827882);
        assert_eq!(reg(&legacy, 5), i32::MIN);

        let strict = run_with(Compat::Strict, src);
        assert_eq!(reg(&strict, 4), 0);
        // 0x80000000 * 0xFFFFFFFD = 0x7FFFFFFE_80000000
        assert_eq!(reg(&strict, 5), 0x7FFF_FFFE);
    }

    #[test]
    fn test_legacy_cmpltu_writes_b() {
        let sim = run("
            movi r2, 9
            movi r3, 4
            movi r4, 7
            cmpltu r4, r2, r3
            break
        ");
        assert_eq!(reg(&sim, 2), 0);
        assert_eq!(reg(&sim, 4), 7);

        let mut sim = Simulator::new();
        sim.load("movi r2, 9\ncmpltu r2, r0, r2\ncmpltu r3, r2, r0\nbreak").unwrap();
        sim.run().unwrap();
        assert_eq!(reg(&sim, 2), 1);
        let termination = sim.termination().unwrap();
        assert_eq!(termination.pc, 2);
        assert!(matches!(
            termination.error,
            Some(ExecError::ReservedRegisterWrite(Mnemonic::Cmpltu))
        ));
    }

    #[test]
    fn test_branches() {
        let src = "
            movi r2, 1
            movi r3, 2
            bge r3, r2, taken
            movi r4, 1
        taken:
            bltu r2, r3, next
            movi r5, 1
        next:
            bgt r2, r3, nowhere
            beq r0, r0, done
            movi r6, 1
        done:
            break
        nowhere:
            movi r7, 1
            break
        ";
        let legacy = run(src);
        assert_eq!(reg(&legacy, 4), 1); // bge is == in legacy mode
        assert_eq!(reg(&legacy, 5), 0);
        assert_eq!(reg(&legacy, 6), 0);
        assert_eq!(reg(&legacy, 7), 0);

        let strict = run_with(Compat::Strict, src);
        assert_eq!(reg(&strict, 4), 0);
    }

    #[test]
    fn test_unsigned_branches_and_bret() {
        let src = "
            movi r2, 1
            movi r3, -1
            movi r4, 2
            bgeu r3, r4, first
            movi r10, 1
        first:
            bgtu r4, r3, second
            movi r11, 1
        second:
            bleu r2, r3, third
            movi r12, 1
        third:
            blt r3, r2, fourth
            movi r13, 1
        fourth:
            bret
            movi r14, 1
            break
        ";
        let legacy = run(src);
        let strict = run_with(Compat::Strict, src);
        for sim in [&legacy, &strict] {
            assert_eq!(reg(sim, 12), 0);
            assert_eq!(reg(sim, 13), 0);
            assert_eq!(reg(sim, 14), 0);
            assert_eq!(sim.state(), RunState::Complete);
            let termination = sim.termination().unwrap();
            assert_eq!(termination.pc, 11);
            assert_eq!(termination.error, None);
        }

        assert_eq!(reg(&legacy, 10), 1);
        assert_eq!(reg(&legacy, 11), 0);
        assert_eq!(reg(&strict, 10), 0);
        assert_eq!(reg(&strict, 11), 1);
    }

    #[test]
    fn test_jumps() {
        let sim = run("
            movia r2, target
            jmp r2
            movi r3, 1
        target:
            nextpc r4
            jmpi end
            movi r5, 1
        end:
            br end
        ");
        assert_eq!(reg(&sim, 3), 0);
        assert_eq!(reg(&sim, 4), 4);
        assert_eq!(reg(&sim, 5), 0);
        assert_eq!(sim.state(), RunState::Complete);
        assert_eq!(sim.termination().unwrap().pc, 6);
    }

    #[test]
    fn test_call_and_ret() {
        let sim = run("
            call func
            movi r3, 5
            movia r4, func2
            callr r4
            break
        func:
            movi r2, 10
            ret
        func2:
            addi r2, r2, 1
            ret
        ");
        assert_eq!(reg(&sim, 2), 11);
        assert_eq!(reg(&sim, 3), 5);
        assert_eq!(reg(&sim, 31), 4);
    }

    #[test]
    fn test_loads_and_stores() {
        let sim = run("
            movia r2, words
            ldw r3, 0(r2)
            ldb r4, 1(r2)
            ldbu r5, 1(r2)
            ldh r6, 1(r2)
            ldhu r7, 1(r2)
            movi r8, 0x12345
            stb r8, 2(r2)
            sth r8, 3(r2)
            stw r8, free
            ldw r9, 2(r2)
            ldw r10, 3(r2)
            ldw r11, free
            ldw r12, r2
            break
        .data
        words: 7
            -200
            0
            0
        free: 0
        ");
        assert_eq!(reg(&sim, 3), 7);
        assert_eq!(reg(&sim, 4), 56); // -200 = ...0x38
        assert_eq!(reg(&sim, 5), 200);
        assert_eq!(reg(&sim, 6), -200);
        assert_eq!(reg(&sim, 7), 200);
        assert_eq!(reg(&sim, 9), 0x45);
        assert_eq!(reg(&sim, 10), 0x2345);
        assert_eq!(reg(&sim, 11), 0x12345);
        assert_eq!(reg(&sim, 12), 7);
    }

    #[test]
    fn test_divide_by_zero_is_recovered() {
        let sim = run("
            movi r2, 5
            div r3, r2, r0
            divu r4, r2, r0
            addi r5, r3, 1
            break
        ");
        assert_eq!(sim.state(), RunState::Complete);
        assert_eq!(sim.registers().get(3), None);
        assert_eq!(sim.registers().get(4), None);
        assert_eq!(reg(&sim, 5), 1);
        assert_eq!(sim.faults().len(), 2);
        assert_eq!(sim.faults()[0].pc, 1);
        assert_eq!(sim.faults()[0].error, ExecError::DivideByZero);
    }

    #[test]
    fn test_runtime_errors() {
        let cases: &[(&str, fn(&ExecError) -> bool)] = &[
            ("movi r0, 1", |e| matches!(e, ExecError::ReservedRegisterWrite(Mnemonic::Movi))),
            ("ldw r2, 100(r0)", |e| matches!(e, ExecError::UndefinedMemoryAccess { address: 100 })),
            ("stw r2, -1(r0)", |e| matches!(e, ExecError::AddressOutOfRange(-1))),
            ("start: frob r1, r2", |e| matches!(e, ExecError::UnidentifiedInstruction(_))),
            ("addi r2, r3, r4", |e| matches!(e, ExecError::BadOperand { .. })),
            ("jmpi nowhere", |e| matches!(e, ExecError::BadOperand { .. })),
            ("nop", |e| matches!(e, ExecError::UndefinedMemoryAccess { address: 1 })),
        ];

        for (src, check) in cases {
            let mut sim = Simulator::new();
            sim.load(src).unwrap();
            sim.run().unwrap();
            assert_eq!(sim.state(), RunState::Error, "{src}");
            let error = sim.termination().and_then(|t| t.error.clone()).unwrap();
            assert!(check(&error), "{src}: {error:?}");
        }
    }
}
