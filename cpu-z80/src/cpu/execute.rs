//! Instruction execution: one flat dispatch table over the synthesized
//! opcode index, plus the executor helpers it leans on.
//!
//! Index pages: 0x00nn base, 0xCBnn/0xEDnn/0xDDnn/0xFDnn prefixed,
//! 0xAAnn/0xBBnn the folded DD CB/FD CB pages. Every arm returns the
//! T-states the instruction consumed; absent entries fall through to the
//! undefined-opcode arm.

use emu_core::Bus;

use crate::alu;

use super::Z80;

impl Z80 {
    /// Execute the instruction at the given synthesized index and return
    /// its T-state cost.
    pub(super) fn execute<B: Bus>(&mut self, bus: &mut B, index: u16) -> u32 {
        let lo = (index & 0xFF) as u8;

        match index {
            // ================================================================
            // Base page
            // ================================================================

            // NOP
            0x00 => 4,

            // LD rr, nn (01=BC 11=DE 21=HL 31=SP)
            0x01 | 0x11 | 0x21 | 0x31 => {
                let nn = self.fetch_word(bus);
                self.set_rp((lo >> 4) & 3, nn);
                10
            }

            // LD (BC), A / LD (DE), A
            0x02 => {
                bus.write_byte(self.regs.bc(), self.regs.a);
                7
            }
            0x12 => {
                bus.write_byte(self.regs.de(), self.regs.a);
                7
            }

            // INC rr / DEC rr
            0x03 | 0x13 | 0x23 | 0x33 => {
                let rp = (lo >> 4) & 3;
                let value = self.rp(rp).wrapping_add(1);
                self.set_rp(rp, value);
                6
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                let rp = (lo >> 4) & 3;
                let value = self.rp(rp).wrapping_sub(1);
                self.set_rp(rp, value);
                6
            }

            // INC r / DEC r
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x3C => {
                let code = (lo >> 3) & 7;
                let result = self.inc8(self.regs.reg8(code));
                self.regs.set_reg8(code, result);
                4
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x3D => {
                let code = (lo >> 3) & 7;
                let result = self.dec8(self.regs.reg8(code));
                self.regs.set_reg8(code, result);
                4
            }

            // LD r, n
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => {
                let n = self.fetch_byte(bus);
                self.regs.set_reg8((lo >> 3) & 7, n);
                7
            }

            // RLCA / RRCA / RLA / RRA
            0x07 => {
                let bit7 = self.regs.a >> 7;
                self.regs.a = self.regs.a.rotate_left(1);
                self.regs.set_half_carry(false);
                self.regs.set_subtract(false);
                self.regs.set_carry(bit7 == 1);
                4
            }
            0x0F => {
                let bit0 = self.regs.a & 1;
                self.regs.a = self.regs.a.rotate_right(1);
                self.regs.set_half_carry(false);
                self.regs.set_subtract(false);
                self.regs.set_carry(bit0 == 1);
                4
            }
            0x17 => {
                let old_carry = u8::from(self.regs.carry());
                let bit7 = self.regs.a >> 7;
                self.regs.a = (self.regs.a << 1) | old_carry;
                self.regs.set_half_carry(false);
                self.regs.set_subtract(false);
                self.regs.set_carry(bit7 == 1);
                4
            }
            0x1F => {
                let old_carry = u8::from(self.regs.carry());
                let bit0 = self.regs.a & 1;
                self.regs.a = (self.regs.a >> 1) | (old_carry << 7);
                self.regs.set_half_carry(false);
                self.regs.set_subtract(false);
                self.regs.set_carry(bit0 == 1);
                4
            }

            // EX AF, AF'
            0x08 => {
                std::mem::swap(&mut self.regs.a, &mut self.regs.a_alt);
                std::mem::swap(&mut self.regs.f, &mut self.regs.f_alt);
                4
            }

            // ADD HL, rr
            0x09 | 0x19 | 0x29 | 0x39 => {
                let rr = self.rp((lo >> 4) & 3);
                let result = self.add16(self.regs.hl(), rr);
                self.regs.set_hl(result);
                11
            }

            // LD A, (BC) / LD A, (DE)
            0x0A => {
                self.regs.a = bus.read_byte(self.regs.bc());
                7
            }
            0x1A => {
                self.regs.a = bus.read_byte(self.regs.de());
                7
            }

            // DJNZ e
            0x10 => {
                let offset = self.fetch_byte(bus) as i8;
                self.regs.b = self.regs.b.wrapping_sub(1);
                if self.regs.b != 0 {
                    self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                    13
                } else {
                    8
                }
            }

            // JR e
            0x18 => {
                let offset = self.fetch_byte(bus) as i8;
                self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                12
            }

            // JR cc, e (20=NZ 28=Z 30=NC 38=C)
            0x20 | 0x28 | 0x30 | 0x38 => {
                let offset = self.fetch_byte(bus) as i8;
                if self.condition((lo >> 3) & 3) {
                    self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                    12
                } else {
                    7
                }
            }

            // LD (nn), HL / LD HL, (nn)
            0x22 => {
                let addr = self.fetch_word(bus);
                bus.write_word(addr, self.regs.hl());
                16
            }
            0x2A => {
                let addr = self.fetch_word(bus);
                let value = bus.read_word(addr);
                self.regs.set_hl(value);
                16
            }

            // DAA
            0x27 => {
                self.daa();
                4
            }

            // CPL
            0x2F => {
                self.regs.a = !self.regs.a;
                self.regs.set_half_carry(true);
                self.regs.set_subtract(true);
                4
            }

            // LD (nn), A / LD A, (nn)
            0x32 => {
                let addr = self.fetch_word(bus);
                bus.write_byte(addr, self.regs.a);
                13
            }
            0x3A => {
                let addr = self.fetch_word(bus);
                self.regs.a = bus.read_byte(addr);
                13
            }

            // INC (HL) / DEC (HL) / LD (HL), n
            0x34 => {
                let addr = self.regs.hl();
                let result = self.inc8(bus.read_byte(addr));
                bus.write_byte(addr, result);
                11
            }
            0x35 => {
                let addr = self.regs.hl();
                let result = self.dec8(bus.read_byte(addr));
                bus.write_byte(addr, result);
                11
            }
            0x36 => {
                let n = self.fetch_byte(bus);
                bus.write_byte(self.regs.hl(), n);
                10
            }

            // SCF / CCF
            0x37 => {
                self.regs.set_half_carry(false);
                self.regs.set_subtract(false);
                self.regs.set_carry(true);
                4
            }
            0x3F => {
                let old_carry = self.regs.carry();
                self.regs.set_half_carry(old_carry);
                self.regs.set_subtract(false);
                self.regs.set_carry(!old_carry);
                4
            }

            // HALT: rewind PC so the same address re-fetches until an
            // interrupt wakes the CPU.
            0x76 => {
                self.regs.halted = true;
                self.regs.pc = self.regs.pc.wrapping_sub(1);
                4
            }

            // LD r, r'
            0x40..=0x75 | 0x77..=0x7F => {
                let src = lo & 7;
                let dst = (lo >> 3) & 7;
                if src == 6 {
                    let value = bus.read_byte(self.regs.hl());
                    self.regs.set_reg8(dst, value);
                    7
                } else if dst == 6 {
                    bus.write_byte(self.regs.hl(), self.regs.reg8(src));
                    7
                } else {
                    let value = self.regs.reg8(src);
                    self.regs.set_reg8(dst, value);
                    4
                }
            }

            // ALU A, r (80-BF: ADD/ADC/SUB/SBC/AND/XOR/OR/CP by bits 3-5)
            0x80..=0xBF => {
                let src = lo & 7;
                let kind = (lo >> 3) & 7;
                if src == 6 {
                    let value = bus.read_byte(self.regs.hl());
                    self.alu_a(kind, value);
                    7
                } else {
                    self.alu_a(kind, self.regs.reg8(src));
                    4
                }
            }

            // RET cc
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                if self.condition((lo >> 3) & 7) {
                    self.regs.pc = self.pop_word(bus);
                    11
                } else {
                    5
                }
            }

            // POP rr (C1=BC D1=DE E1=HL F1=AF)
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop_word(bus);
                self.set_rp_af((lo >> 4) & 3, value);
                10
            }

            // JP cc, nn / JP nn
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let nn = self.fetch_word(bus);
                if self.condition((lo >> 3) & 7) {
                    self.regs.pc = nn;
                }
                10
            }
            0xC3 => {
                self.regs.pc = self.fetch_word(bus);
                10
            }

            // CALL cc, nn / CALL nn
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let nn = self.fetch_word(bus);
                if self.condition((lo >> 3) & 7) {
                    let pc = self.regs.pc;
                    self.push_word(bus, pc);
                    self.regs.pc = nn;
                    17
                } else {
                    10
                }
            }
            0xCD => {
                let nn = self.fetch_word(bus);
                let pc = self.regs.pc;
                self.push_word(bus, pc);
                self.regs.pc = nn;
                17
            }

            // PUSH rr
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let value = self.rp_af((lo >> 4) & 3);
                self.push_word(bus, value);
                11
            }

            // ALU A, n
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let n = self.fetch_byte(bus);
                self.alu_a((lo >> 3) & 7, n);
                7
            }

            // RST p
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                let pc = self.regs.pc;
                self.push_word(bus, pc);
                self.regs.pc = u16::from(lo & 0x38);
                11
            }

            // RET
            0xC9 => {
                self.regs.pc = self.pop_word(bus);
                10
            }

            // OUT (n), A / IN A, (n): A supplies the high address byte.
            0xD3 => {
                let n = self.fetch_byte(bus);
                let port = u16::from(n) | (u16::from(self.regs.a) << 8);
                bus.io_write_byte(port, self.regs.a);
                11
            }
            0xDB => {
                let n = self.fetch_byte(bus);
                let port = u16::from(n) | (u16::from(self.regs.a) << 8);
                self.regs.a = bus.io_read_byte(port);
                11
            }

            // EXX
            0xD9 => {
                std::mem::swap(&mut self.regs.b, &mut self.regs.b_alt);
                std::mem::swap(&mut self.regs.c, &mut self.regs.c_alt);
                std::mem::swap(&mut self.regs.d, &mut self.regs.d_alt);
                std::mem::swap(&mut self.regs.e, &mut self.regs.e_alt);
                std::mem::swap(&mut self.regs.h, &mut self.regs.h_alt);
                std::mem::swap(&mut self.regs.l, &mut self.regs.l_alt);
                4
            }

            // EX (SP), HL
            0xE3 => {
                let stacked = bus.read_word(self.regs.sp);
                bus.write_word(self.regs.sp, self.regs.hl());
                self.regs.set_hl(stacked);
                19
            }

            // JP (HL)
            0xE9 => {
                self.regs.pc = self.regs.hl();
                4
            }

            // EX DE, HL
            0xEB => {
                let de = self.regs.de();
                let hl = self.regs.hl();
                self.regs.set_de(hl);
                self.regs.set_hl(de);
                4
            }

            // DI / EI
            0xF3 => {
                self.regs.iff1 = false;
                self.regs.iff2 = false;
                4
            }
            0xFB => {
                // Interrupts stay held off through the next instruction.
                self.regs.iff1 = true;
                self.regs.iff2 = true;
                self.irq_suspended = true;
                self.suspend_armed = true;
                4
            }

            // LD SP, HL
            0xF9 => {
                self.regs.sp = self.regs.hl();
                6
            }

            // ================================================================
            // CB page: rotates, shifts, bit operations
            // ================================================================
            0xCB00..=0xCB3F => {
                let src = lo & 7;
                let kind = (lo >> 3) & 7;
                if src == 6 {
                    let addr = self.regs.hl();
                    let result = self.rot_shift(kind, bus.read_byte(addr));
                    bus.write_byte(addr, result);
                    15
                } else {
                    let result = self.rot_shift(kind, self.regs.reg8(src));
                    self.regs.set_reg8(src, result);
                    8
                }
            }
            0xCB40..=0xCB7F => {
                let src = lo & 7;
                let bit = (lo >> 3) & 7;
                if src == 6 {
                    let value = bus.read_byte(self.regs.hl());
                    self.bit_test(bit, value);
                    12
                } else {
                    self.bit_test(bit, self.regs.reg8(src));
                    8
                }
            }
            0xCB80..=0xCBBF => {
                let src = lo & 7;
                let bit = (lo >> 3) & 7;
                if src == 6 {
                    let addr = self.regs.hl();
                    let value = bus.read_byte(addr) & !(1 << bit);
                    bus.write_byte(addr, value);
                    15
                } else {
                    let value = self.regs.reg8(src) & !(1 << bit);
                    self.regs.set_reg8(src, value);
                    8
                }
            }
            0xCBC0..=0xCBFF => {
                let src = lo & 7;
                let bit = (lo >> 3) & 7;
                if src == 6 {
                    let addr = self.regs.hl();
                    let value = bus.read_byte(addr) | (1 << bit);
                    bus.write_byte(addr, value);
                    15
                } else {
                    let value = self.regs.reg8(src) | (1 << bit);
                    self.regs.set_reg8(src, value);
                    8
                }
            }

            // ================================================================
            // ED page
            // ================================================================

            // IN r, (C); ED 70 is the undocumented flags-only form.
            0xED40 | 0xED48 | 0xED50 | 0xED58 | 0xED60 | 0xED68 | 0xED70 | 0xED78 => {
                let data = bus.io_read_byte(self.regs.bc());
                let dst = (lo >> 3) & 7;
                if dst != 6 {
                    self.regs.set_reg8(dst, data);
                }
                self.set_szp(data);
                self.regs.set_half_carry(false);
                self.regs.set_subtract(false);
                12
            }

            // OUT (C), r; ED 71 is the undocumented OUT (C), 0.
            0xED41 | 0xED49 | 0xED51 | 0xED59 | 0xED61 | 0xED69 | 0xED71 | 0xED79 => {
                let src = (lo >> 3) & 7;
                let value = if src == 6 { 0 } else { self.regs.reg8(src) };
                bus.io_write_byte(self.regs.bc(), value);
                12
            }

            // SBC HL, rr / ADC HL, rr
            0xED42 | 0xED52 | 0xED62 | 0xED72 => {
                let rr = self.rp((lo >> 4) & 3);
                self.sbc16(rr);
                15
            }
            0xED4A | 0xED5A | 0xED6A | 0xED7A => {
                let rr = self.rp((lo >> 4) & 3);
                self.adc16(rr);
                15
            }

            // LD (nn), rr / LD rr, (nn)
            0xED43 | 0xED53 | 0xED63 | 0xED73 => {
                let addr = self.fetch_word(bus);
                let value = self.rp((lo >> 4) & 3);
                bus.write_word(addr, value);
                20
            }
            0xED4B | 0xED5B | 0xED6B | 0xED7B => {
                let addr = self.fetch_word(bus);
                let value = bus.read_word(addr);
                self.set_rp((lo >> 4) & 3, value);
                20
            }

            // NEG (ED 44 plus its undocumented duplicates)
            0xED44 | 0xED4C | 0xED54 | 0xED5C | 0xED64 | 0xED6C | 0xED74 | 0xED7C => {
                let a = self.regs.a;
                let result = 0u8.wrapping_sub(a);
                self.regs.a = result;
                self.regs.set_sign(result & 0x80 != 0);
                self.regs.set_zero(result == 0);
                self.regs.set_half_carry(alu::borrow_bit4(0, a, result));
                self.regs.set_parity_overflow(alu::overflow_sub(0, a, result));
                self.regs.set_subtract(true);
                self.regs.set_carry(alu::borrow_bit8(0, a, result));
                8
            }

            // RETN / RETI and their duplicates. Every form restores IFF1
            // from the backup flip-flop; RETI is distinct only on the
            // peripheral side of the bus.
            0xED45 | 0xED4D | 0xED55 | 0xED5D | 0xED65 | 0xED6D | 0xED75 | 0xED7D => {
                self.regs.pc = self.pop_word(bus);
                self.regs.iff1 = self.regs.iff2;
                14
            }

            // IM 0 / IM 1 / IM 2 (with undocumented duplicates)
            0xED46 | 0xED4E | 0xED66 | 0xED6E => {
                self.regs.im = super::InterruptMode::Im0;
                8
            }
            0xED56 | 0xED76 => {
                self.regs.im = super::InterruptMode::Im1;
                8
            }
            0xED5E | 0xED7E => {
                self.regs.im = super::InterruptMode::Im2;
                8
            }

            // LD I, A / LD R, A / LD A, I / LD A, R
            0xED47 => {
                self.regs.i = self.regs.a;
                9
            }
            0xED4F => {
                self.regs.r = self.regs.a;
                9
            }
            0xED57 => {
                self.regs.a = self.regs.i;
                self.ld_a_ir_flags();
                9
            }
            0xED5F => {
                self.regs.a = self.regs.r;
                self.ld_a_ir_flags();
                9
            }

            // RRD / RLD: BCD nibble rotation through A and (HL)
            0xED67 => {
                let m = bus.read_byte(self.regs.hl());
                let a = self.regs.a;
                self.regs.a = (a & 0xF0) | (m & 0x0F);
                bus.write_byte(self.regs.hl(), (m >> 4) | (a << 4));
                let result = self.regs.a;
                self.set_szp(result);
                self.regs.set_half_carry(false);
                self.regs.set_subtract(false);
                18
            }
            0xED6F => {
                let m = bus.read_byte(self.regs.hl());
                let a = self.regs.a;
                self.regs.a = (a & 0xF0) | (m >> 4);
                bus.write_byte(self.regs.hl(), (m << 4) | (a & 0x0F));
                let result = self.regs.a;
                self.set_szp(result);
                self.regs.set_half_carry(false);
                self.regs.set_subtract(false);
                18
            }

            // Block transfer: LDI/LDD and their repeating forms
            0xEDA0 => self.block_transfer(bus, 1, false),
            0xEDA8 => self.block_transfer(bus, -1, false),
            0xEDB0 => self.block_transfer(bus, 1, true),
            0xEDB8 => self.block_transfer(bus, -1, true),

            // Block compare: CPI/CPD/CPIR/CPDR
            0xEDA1 => self.block_compare(bus, 1, false),
            0xEDA9 => self.block_compare(bus, -1, false),
            0xEDB1 => self.block_compare(bus, 1, true),
            0xEDB9 => self.block_compare(bus, -1, true),

            // Block input: INI/IND/INIR/INDR
            0xEDA2 => self.block_input(bus, 1, false),
            0xEDAA => self.block_input(bus, -1, false),
            0xEDB2 => self.block_input(bus, 1, true),
            0xEDBA => self.block_input(bus, -1, true),

            // Block output: OUTI/OUTD/OTIR/OTDR
            0xEDA3 => self.block_output(bus, 1, false),
            0xEDAB => self.block_output(bus, -1, false),
            0xEDB3 => self.block_output(bus, 1, true),
            0xEDBB => self.block_output(bus, -1, true),

            // ================================================================
            // DD/FD pages: IX/IY substituted for HL, plus the undocumented
            // IXH/IXL/IYH/IYL register halves
            // ================================================================

            // ADD IX, rr (the HL slot is the index register itself)
            0xDD09 | 0xDD19 | 0xDD29 | 0xDD39 | 0xFD09 | 0xFD19 | 0xFD29 | 0xFD39 => {
                let rp = (lo >> 4) & 3;
                let rr = if rp == 2 { self.idx(index) } else { self.rp(rp) };
                let result = self.add16(self.idx(index), rr);
                self.set_idx(index, result);
                15
            }

            // LD IX, nn / LD (nn), IX / LD IX, (nn)
            0xDD21 | 0xFD21 => {
                let nn = self.fetch_word(bus);
                self.set_idx(index, nn);
                14
            }
            0xDD22 | 0xFD22 => {
                let addr = self.fetch_word(bus);
                bus.write_word(addr, self.idx(index));
                20
            }
            0xDD2A | 0xFD2A => {
                let addr = self.fetch_word(bus);
                let value = bus.read_word(addr);
                self.set_idx(index, value);
                20
            }

            // INC IX / DEC IX
            0xDD23 | 0xFD23 => {
                let value = self.idx(index).wrapping_add(1);
                self.set_idx(index, value);
                10
            }
            0xDD2B | 0xFD2B => {
                let value = self.idx(index).wrapping_sub(1);
                self.set_idx(index, value);
                10
            }

            // INC/DEC IXH, IXL
            0xDD24 | 0xDD2C | 0xFD24 | 0xFD2C => {
                let code = (lo >> 3) & 7;
                let result = self.inc8(self.reg8_idx(index, code));
                self.set_reg8_idx(index, code, result);
                8
            }
            0xDD25 | 0xDD2D | 0xFD25 | 0xFD2D => {
                let code = (lo >> 3) & 7;
                let result = self.dec8(self.reg8_idx(index, code));
                self.set_reg8_idx(index, code, result);
                8
            }

            // LD IXH, n / LD IXL, n
            0xDD26 | 0xDD2E | 0xFD26 | 0xFD2E => {
                let n = self.fetch_byte(bus);
                self.set_reg8_idx(index, (lo >> 3) & 7, n);
                11
            }

            // INC (IX+d) / DEC (IX+d) / LD (IX+d), n
            0xDD34 | 0xFD34 => {
                let addr = self.displaced_addr(bus, index);
                let result = self.inc8(bus.read_byte(addr));
                bus.write_byte(addr, result);
                23
            }
            0xDD35 | 0xFD35 => {
                let addr = self.displaced_addr(bus, index);
                let result = self.dec8(bus.read_byte(addr));
                bus.write_byte(addr, result);
                23
            }
            0xDD36 | 0xFD36 => {
                let addr = self.displaced_addr(bus, index);
                let n = self.fetch_byte(bus);
                bus.write_byte(addr, n);
                19
            }

            // HALT executes unchanged under a prefix.
            0xDD76 | 0xFD76 => {
                self.regs.halted = true;
                self.regs.pc = self.regs.pc.wrapping_sub(1);
                8
            }

            // LD group. When (IX+d) is one operand the other side uses the
            // real register set; register-to-register forms substitute
            // IXH/IXL for H/L.
            0xDD40..=0xDD75 | 0xDD77..=0xDD7F | 0xFD40..=0xFD75 | 0xFD77..=0xFD7F => {
                let src = lo & 7;
                let dst = (lo >> 3) & 7;
                if src == 6 {
                    let addr = self.displaced_addr(bus, index);
                    let value = bus.read_byte(addr);
                    self.regs.set_reg8(dst, value);
                    19
                } else if dst == 6 {
                    let addr = self.displaced_addr(bus, index);
                    bus.write_byte(addr, self.regs.reg8(src));
                    19
                } else {
                    let value = self.reg8_idx(index, src);
                    self.set_reg8_idx(index, dst, value);
                    8
                }
            }

            // ALU A, src with the same substitution rules
            0xDD80..=0xDDBF | 0xFD80..=0xFDBF => {
                let src = lo & 7;
                let kind = (lo >> 3) & 7;
                if src == 6 {
                    let addr = self.displaced_addr(bus, index);
                    let value = bus.read_byte(addr);
                    self.alu_a(kind, value);
                    19
                } else {
                    let value = self.reg8_idx(index, src);
                    self.alu_a(kind, value);
                    8
                }
            }

            // POP IX / EX (SP), IX / PUSH IX / JP (IX) / LD SP, IX
            0xDDE1 | 0xFDE1 => {
                let value = self.pop_word(bus);
                self.set_idx(index, value);
                14
            }
            0xDDE3 | 0xFDE3 => {
                let stacked = bus.read_word(self.regs.sp);
                bus.write_word(self.regs.sp, self.idx(index));
                self.set_idx(index, stacked);
                23
            }
            0xDDE5 | 0xFDE5 => {
                let value = self.idx(index);
                self.push_word(bus, value);
                15
            }
            0xDDE9 | 0xFDE9 => {
                self.regs.pc = self.idx(index);
                8
            }
            0xDDF9 | 0xFDF9 => {
                self.regs.sp = self.idx(index);
                10
            }

            // ================================================================
            // DD CB / FD CB pages (synthesized 0xAA/0xBB markers). The
            // displacement byte sits at PC, the opcode behind it was
            // already decoded. The undocumented forms copy the memory
            // result into the register named by bits 0-2.
            // ================================================================
            0xAA00..=0xAA3F | 0xBB00..=0xBB3F => {
                let addr = self.ddcb_addr(bus, index);
                let result = self.rot_shift((lo >> 3) & 7, bus.read_byte(addr));
                bus.write_byte(addr, result);
                if lo & 7 != 6 {
                    self.regs.set_reg8(lo & 7, result);
                }
                23
            }
            0xAA40..=0xAA7F | 0xBB40..=0xBB7F => {
                let addr = self.ddcb_addr(bus, index);
                let value = bus.read_byte(addr);
                self.bit_test((lo >> 3) & 7, value);
                20
            }
            0xAA80..=0xAABF | 0xBB80..=0xBBBF => {
                let addr = self.ddcb_addr(bus, index);
                let result = bus.read_byte(addr) & !(1 << ((lo >> 3) & 7));
                bus.write_byte(addr, result);
                if lo & 7 != 6 {
                    self.regs.set_reg8(lo & 7, result);
                }
                23
            }
            0xAAC0..=0xAAFF | 0xBBC0..=0xBBFF => {
                let addr = self.ddcb_addr(bus, index);
                let result = bus.read_byte(addr) | (1 << ((lo >> 3) & 7));
                bus.write_byte(addr, result);
                if lo & 7 != 6 {
                    self.regs.set_reg8(lo & 7, result);
                }
                23
            }

            // A DD/FD prefix before an opcode with no indexed variant:
            // the prefix costs its fetch and the opcode runs unprefixed.
            i if i & 0xFF00 == 0xDD00 || i & 0xFF00 == 0xFD00 => 4 + self.execute(bus, i & 0x00FF),

            // ED-page holes fetched two bytes.
            i if i & 0xFF00 == 0xED00 => self.undefined(i, 8),

            _ => self.undefined(index, 4),
        }
    }

    // --- condition codes ------------------------------------------------

    /// Condition by 3-bit code: NZ, Z, NC, C, PO, PE, P, M.
    fn condition(&self, code: u8) -> bool {
        match code {
            0 => !self.regs.zero(),
            1 => self.regs.zero(),
            2 => !self.regs.carry(),
            3 => self.regs.carry(),
            4 => !self.regs.parity_overflow(),
            5 => self.regs.parity_overflow(),
            6 => !self.regs.sign(),
            7 => self.regs.sign(),
            _ => unreachable!(),
        }
    }

    // --- register-pair access -------------------------------------------

    /// Register pair by 2-bit code: BC, DE, HL, SP.
    fn rp(&self, code: u8) -> u16 {
        match code {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            3 => self.regs.sp,
            _ => unreachable!(),
        }
    }

    fn set_rp(&mut self, code: u8, value: u16) {
        match code {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            3 => self.regs.sp = value,
            _ => unreachable!(),
        }
    }

    /// PUSH/POP variant: BC, DE, HL, AF.
    fn rp_af(&self, code: u8) -> u16 {
        match code {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            3 => self.regs.af(),
            _ => unreachable!(),
        }
    }

    fn set_rp_af(&mut self, code: u8, value: u16) {
        match code {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            3 => self.regs.set_af(value),
            _ => unreachable!(),
        }
    }

    // --- index-register access ------------------------------------------

    /// IX or IY, selected by the page marker in the synthesized index.
    fn idx(&self, index: u16) -> u16 {
        match index >> 8 {
            0xDD | 0xAA => self.regs.ix,
            _ => self.regs.iy,
        }
    }

    fn set_idx(&mut self, index: u16, value: u16) {
        match index >> 8 {
            0xDD | 0xAA => self.regs.ix = value,
            _ => self.regs.iy = value,
        }
    }

    /// Register by code with IXH/IXL (or IYH/IYL) substituted for H/L.
    fn reg8_idx(&self, index: u16, code: u8) -> u8 {
        match code {
            4 => (self.idx(index) >> 8) as u8,
            5 => self.idx(index) as u8,
            _ => self.regs.reg8(code),
        }
    }

    fn set_reg8_idx(&mut self, index: u16, code: u8, value: u8) {
        match code {
            4 => {
                let ix = (self.idx(index) & 0x00FF) | (u16::from(value) << 8);
                self.set_idx(index, ix);
            }
            5 => {
                let ix = (self.idx(index) & 0xFF00) | u16::from(value);
                self.set_idx(index, ix);
            }
            _ => self.regs.set_reg8(code, value),
        }
    }

    /// Fetch the displacement operand and form IX+d / IY+d.
    fn displaced_addr<B: Bus>(&mut self, bus: &mut B, index: u16) -> u16 {
        let d = self.fetch_byte(bus) as i8;
        self.idx(index).wrapping_add(d as u16)
    }

    /// DD CB addressing: the displacement sits at PC with the (already
    /// decoded) opcode byte behind it.
    fn ddcb_addr<B: Bus>(&mut self, bus: &mut B, index: u16) -> u16 {
        let d = bus.read_byte(self.regs.pc) as i8;
        self.regs.pc = self.regs.pc.wrapping_add(2);
        self.idx(index).wrapping_add(d as u16)
    }

    // --- flag composition -----------------------------------------------

    /// Sign, zero and parity from a result byte.
    fn set_szp(&mut self, value: u8) {
        self.regs.set_sign(value & 0x80 != 0);
        self.regs.set_zero(value == 0);
        self.regs.set_parity_overflow(alu::parity_even(value));
    }

    fn ld_a_ir_flags(&mut self) {
        let value = self.regs.a;
        self.regs.set_sign(value & 0x80 != 0);
        self.regs.set_zero(value == 0);
        self.regs.set_half_carry(false);
        // P/V reports the backup flip-flop so software can recover the
        // pre-interrupt enable state.
        self.regs.set_parity_overflow(self.regs.iff2);
        self.regs.set_subtract(false);
    }

    // --- 8-bit arithmetic -----------------------------------------------

    fn inc8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.regs.set_sign(result & 0x80 != 0);
        self.regs.set_zero(result == 0);
        self.regs.set_half_carry(alu::carry_bit3(value, 1, result));
        self.regs.set_parity_overflow(alu::overflow_add(value, 1, result));
        self.regs.set_subtract(false);
        result
    }

    fn dec8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.regs.set_sign(result & 0x80 != 0);
        self.regs.set_zero(result == 0);
        self.regs.set_half_carry(alu::borrow_bit4(value, 1, result));
        self.regs.set_parity_overflow(alu::overflow_sub(value, 1, result));
        self.regs.set_subtract(true);
        result
    }

    /// The eight accumulator operations, by bits 3-5 of the opcode:
    /// ADD, ADC, SUB, SBC, AND, XOR, OR, CP.
    fn alu_a(&mut self, kind: u8, value: u8) {
        let a = self.regs.a;
        match kind {
            0 => {
                let result = a.wrapping_add(value);
                self.add_flags(a, value, result);
                self.regs.a = result;
            }
            1 => {
                let carry = u8::from(self.regs.carry());
                let result = a.wrapping_add(value).wrapping_add(carry);
                self.add_flags(a, value, result);
                self.regs.a = result;
            }
            2 => {
                let result = a.wrapping_sub(value);
                self.sub_flags(a, value, result);
                self.regs.a = result;
            }
            3 => {
                let carry = u8::from(self.regs.carry());
                let result = a.wrapping_sub(value).wrapping_sub(carry);
                self.sub_flags(a, value, result);
                self.regs.a = result;
            }
            4 => {
                self.regs.a &= value;
                let result = self.regs.a;
                self.set_szp(result);
                self.regs.set_half_carry(true);
                self.regs.set_subtract(false);
                self.regs.set_carry(false);
            }
            5 => {
                self.regs.a ^= value;
                let result = self.regs.a;
                self.set_szp(result);
                self.regs.set_half_carry(false);
                self.regs.set_subtract(false);
                self.regs.set_carry(false);
            }
            6 => {
                self.regs.a |= value;
                let result = self.regs.a;
                self.set_szp(result);
                self.regs.set_half_carry(false);
                self.regs.set_subtract(false);
                self.regs.set_carry(false);
            }
            7 => {
                // CP: SUB flags, A unchanged.
                let result = a.wrapping_sub(value);
                self.sub_flags(a, value, result);
            }
            _ => unreachable!(),
        }
    }

    fn add_flags(&mut self, a: u8, b: u8, result: u8) {
        self.regs.set_sign(result & 0x80 != 0);
        self.regs.set_zero(result == 0);
        self.regs.set_half_carry(alu::carry_bit3(a, b, result));
        self.regs.set_parity_overflow(alu::overflow_add(a, b, result));
        self.regs.set_subtract(false);
        self.regs.set_carry(alu::carry_bit7(a, b, result));
    }

    fn sub_flags(&mut self, a: u8, b: u8, result: u8) {
        self.regs.set_sign(result & 0x80 != 0);
        self.regs.set_zero(result == 0);
        self.regs.set_half_carry(alu::borrow_bit4(a, b, result));
        self.regs.set_parity_overflow(alu::overflow_sub(a, b, result));
        self.regs.set_subtract(true);
        self.regs.set_carry(alu::borrow_bit8(a, b, result));
    }

    /// Decimal adjust after addition/subtraction.
    fn daa(&mut self) {
        let a = self.regs.a;
        let n = self.regs.subtract();
        let c = self.regs.carry();
        let h = self.regs.half_carry();

        let mut correction = 0u8;
        let mut carry_out = c;
        if h || (a & 0x0F) > 9 {
            correction |= 0x06;
        }
        if c || a > 0x99 {
            correction |= 0x60;
            carry_out = true;
        }

        let result = if n {
            a.wrapping_sub(correction)
        } else {
            a.wrapping_add(correction)
        };
        let half = if n {
            h && (a & 0x0F) < 6
        } else {
            (a & 0x0F) > 9
        };

        self.regs.a = result;
        self.set_szp(result);
        self.regs.set_half_carry(half);
        self.regs.set_carry(carry_out);
    }

    // --- 16-bit arithmetic ----------------------------------------------

    /// ADD HL/IX/IY, rr: only H, N and C are affected.
    fn add16(&mut self, a: u16, b: u16) -> u16 {
        let result = a.wrapping_add(b);
        self.regs.set_half_carry(alu::carry_bit11(a, b, result));
        self.regs.set_subtract(false);
        self.regs.set_carry(alu::carry_bit15(a, b, result));
        result
    }

    fn adc16(&mut self, value: u16) {
        let hl = self.regs.hl();
        let carry = u16::from(self.regs.carry());
        let result = hl.wrapping_add(value).wrapping_add(carry);
        self.regs.set_hl(result);
        self.regs.set_sign(result & 0x8000 != 0);
        self.regs.set_zero(result == 0);
        self.regs.set_half_carry(alu::carry_bit11(hl, value, result));
        self.regs
            .set_parity_overflow(alu::overflow_add16(hl, value, result));
        self.regs.set_subtract(false);
        self.regs.set_carry(alu::carry_bit15(hl, value, result));
    }

    fn sbc16(&mut self, value: u16) {
        let hl = self.regs.hl();
        let carry = u16::from(self.regs.carry());
        let result = hl.wrapping_sub(value).wrapping_sub(carry);
        self.regs.set_hl(result);
        self.regs.set_sign(result & 0x8000 != 0);
        self.regs.set_zero(result == 0);
        self.regs.set_half_carry(alu::borrow_bit12(hl, value, result));
        self.regs
            .set_parity_overflow(alu::overflow_sub16(hl, value, result));
        self.regs.set_subtract(true);
        self.regs.set_carry(alu::borrow_bit16(hl, value, result));
    }

    // --- rotates, shifts, bit tests -------------------------------------

    /// CB-page rotate/shift by kind: RLC, RRC, RL, RR, SLA, SRA, SLL, SRL.
    fn rot_shift(&mut self, kind: u8, value: u8) -> u8 {
        let old_carry = u8::from(self.regs.carry());
        let (result, carry) = match kind {
            0 => (value.rotate_left(1), value >> 7),
            1 => (value.rotate_right(1), value & 1),
            2 => ((value << 1) | old_carry, value >> 7),
            3 => ((value >> 1) | (old_carry << 7), value & 1),
            4 => (value << 1, value >> 7),
            5 => ((value >> 1) | (value & 0x80), value & 1),
            // SLL: undocumented shift that feeds a 1 into bit 0.
            6 => ((value << 1) | 1, value >> 7),
            7 => (value >> 1, value & 1),
            _ => unreachable!(),
        };
        self.set_szp(result);
        self.regs.set_half_carry(false);
        self.regs.set_subtract(false);
        self.regs.set_carry(carry == 1);
        result
    }

    fn bit_test(&mut self, bit: u8, value: u8) {
        let set = value & (1 << bit) != 0;
        self.regs.set_zero(!set);
        self.regs.set_sign(set && bit == 7);
        self.regs.set_half_carry(true);
        self.regs.set_parity_overflow(!set);
        self.regs.set_subtract(false);
    }

    // --- block operations -----------------------------------------------

    fn block_transfer<B: Bus>(&mut self, bus: &mut B, dir: i16, repeat: bool) -> u32 {
        let value = bus.read_byte(self.regs.hl());
        bus.write_byte(self.regs.de(), value);
        let hl = self.regs.hl().wrapping_add(dir as u16);
        let de = self.regs.de().wrapping_add(dir as u16);
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_hl(hl);
        self.regs.set_de(de);
        self.regs.set_bc(bc);

        self.regs.set_half_carry(false);
        self.regs.set_parity_overflow(bc != 0);
        self.regs.set_subtract(false);

        if repeat && bc != 0 {
            self.regs.pc = self.regs.pc.wrapping_sub(2);
            21
        } else {
            16
        }
    }

    fn block_compare<B: Bus>(&mut self, bus: &mut B, dir: i16, repeat: bool) -> u32 {
        let a = self.regs.a;
        let value = bus.read_byte(self.regs.hl());
        let result = a.wrapping_sub(value);
        let hl = self.regs.hl().wrapping_add(dir as u16);
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_hl(hl);
        self.regs.set_bc(bc);

        self.regs.set_sign(result & 0x80 != 0);
        self.regs.set_zero(result == 0);
        self.regs
            .set_half_carry(alu::borrow_bit4(a, value, result));
        self.regs.set_parity_overflow(bc != 0);
        self.regs.set_subtract(true);

        if repeat && bc != 0 && result != 0 {
            self.regs.pc = self.regs.pc.wrapping_sub(2);
            21
        } else {
            16
        }
    }

    fn block_input<B: Bus>(&mut self, bus: &mut B, dir: i16, repeat: bool) -> u32 {
        let value = bus.io_read_byte(self.regs.bc());
        bus.write_byte(self.regs.hl(), value);
        let hl = self.regs.hl().wrapping_add(dir as u16);
        self.regs.set_hl(hl);
        self.regs.b = self.regs.b.wrapping_sub(1);

        self.regs.set_zero(self.regs.b == 0);
        self.regs.set_subtract(true);

        if repeat && self.regs.b != 0 {
            self.regs.pc = self.regs.pc.wrapping_sub(2);
            21
        } else {
            16
        }
    }

    fn block_output<B: Bus>(&mut self, bus: &mut B, dir: i16, repeat: bool) -> u32 {
        let value = bus.read_byte(self.regs.hl());
        // B decrements before it appears on the port address.
        self.regs.b = self.regs.b.wrapping_sub(1);
        bus.io_write_byte(self.regs.bc(), value);
        let hl = self.regs.hl().wrapping_add(dir as u16);
        self.regs.set_hl(hl);

        self.regs.set_zero(self.regs.b == 0);
        self.regs.set_subtract(true);

        if repeat && self.regs.b != 0 {
            self.regs.pc = self.regs.pc.wrapping_sub(2);
            21
        } else {
            16
        }
    }
}
