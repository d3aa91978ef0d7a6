//! Pattern-table disassembler driven by the shared encoding.

use crate::constants::*;
use crate::instructions::*;
use crate::Word;

/// One row of the pattern table. The first row for which
/// `word & mask == bits` holds supplies the format string.
pub struct Pattern {
    pub mask: u32,
    pub bits: u32,
    pub fmt: &'static str,
}

const fn row(mask: u32, bits: u32, fmt: &'static str) -> Pattern {
    Pattern { mask, bits, fmt }
}

const LOW6: u32 = 0x3F;
const RT_FIELD: u32 = REG_MASK << RT_OFFSET;
const RA_FIELD: u32 = REG_MASK << RA_OFFSET;

/// Ordered pattern table. The `bits` of every row come from the same
/// encoders the assembler uses, so the two cannot drift apart. Rows for
/// pseudo-instruction shapes precede their general parents; the final
/// row matches anything.
pub static INSTAB: &[Pattern] = &[
    row(!0, 0, "nop"),
    row(!0, make_alu_reg(AluOp::JALR, 0, 1, 0), "ret"),
    row(!RA_FIELD, make_alu_reg(AluOp::JALR, 0, 0, 0), "jr %a"),
    row(LOW6 | RA_FIELD, make_alu_reg(AluOp::ADD, 0, 0, 0), "mv %t, %b"),
    row(LOW6 | RA_FIELD, make_alu_imm(AluOp::ADD, 0, 0, 0), "li %t, %i"),
    row(LOW6 | RT_FIELD, make_jump(JumpOp::JAL, 0, 0), "j %J"),
    // ALU, immediate operand
    row(LOW6, make_alu_imm(AluOp::ADD, 0, 0, 0), "addi %t, %a, %i"),
    row(LOW6, make_alu_imm(AluOp::SUB, 0, 0, 0), "subi %t, %a, %i"),
    row(LOW6, make_alu_imm(AluOp::AND, 0, 0, 0), "andi %t, %a, %i"),
    row(LOW6, make_alu_imm(AluOp::OR, 0, 0, 0), "ori %t, %a, %i"),
    row(LOW6, make_alu_imm(AluOp::XOR, 0, 0, 0), "xori %t, %a, %i"),
    row(LOW6, make_alu_imm(AluOp::SLL, 0, 0, 0), "slli %t, %a, %i"),
    row(LOW6, make_alu_imm(AluOp::SRL, 0, 0, 0), "srli %t, %a, %i"),
    row(LOW6, make_alu_imm(AluOp::SRA, 0, 0, 0), "srai %t, %a, %i"),
    row(LOW6, make_alu_imm(AluOp::SLT, 0, 0, 0), "slti %t, %a, %i"),
    row(LOW6, make_alu_imm(AluOp::SLTU, 0, 0, 0), "sltui %t, %a, %i"),
    row(LOW6, make_alu_imm(AluOp::MUL, 0, 0, 0), "muli %t, %a, %i"),
    row(LOW6, make_alu_imm(AluOp::DIV, 0, 0, 0), "divi %t, %a, %i"),
    row(LOW6, make_alu_imm(AluOp::JALR, 0, 0, 0), "jalr %t, %a, %i"),
    // ALU, register operand
    row(LOW6, make_alu_reg(AluOp::ADD, 0, 0, 0), "add %t, %a, %b"),
    row(LOW6, make_alu_reg(AluOp::SUB, 0, 0, 0), "sub %t, %a, %b"),
    row(LOW6, make_alu_reg(AluOp::AND, 0, 0, 0), "and %t, %a, %b"),
    row(LOW6, make_alu_reg(AluOp::OR, 0, 0, 0), "or %t, %a, %b"),
    row(LOW6, make_alu_reg(AluOp::XOR, 0, 0, 0), "xor %t, %a, %b"),
    row(LOW6, make_alu_reg(AluOp::SLL, 0, 0, 0), "sll %t, %a, %b"),
    row(LOW6, make_alu_reg(AluOp::SRL, 0, 0, 0), "srl %t, %a, %b"),
    row(LOW6, make_alu_reg(AluOp::SRA, 0, 0, 0), "sra %t, %a, %b"),
    row(LOW6, make_alu_reg(AluOp::SLT, 0, 0, 0), "slt %t, %a, %b"),
    row(LOW6, make_alu_reg(AluOp::SLTU, 0, 0, 0), "sltu %t, %a, %b"),
    row(LOW6, make_alu_reg(AluOp::MUL, 0, 0, 0), "mul %t, %a, %b"),
    row(LOW6, make_alu_reg(AluOp::DIV, 0, 0, 0), "div %t, %a, %b"),
    row(LOW6, make_alu_reg(AluOp::JALR, 0, 0, 0), "jalr %t, %a, %b"),
    // Loads
    row(LOW6, make_load(LoadOp::LDW, 0, 0, 0), "ldw %t, %i(%a)"),
    row(LOW6, make_load(LoadOp::LDH, 0, 0, 0), "ldh %t, %i(%a)"),
    row(LOW6, make_load(LoadOp::LDB, 0, 0, 0), "ldb %t, %i(%a)"),
    row(LOW6, make_load(LoadOp::LDX, 0, 0, 0), "ldx %t, %i(%a)"),
    row(LOW6, make_load(LoadOp::LUI, 0, 0, 0), "lui %t, %U"),
    row(LOW6, make_load(LoadOp::LDHU, 0, 0, 0), "ldhu %t, %i(%a)"),
    row(LOW6, make_load(LoadOp::LDBU, 0, 0, 0), "ldbu %t, %i(%a)"),
    row(LOW6, make_load(LoadOp::AUIPC, 0, 0, 0), "auipc %t, %U"),
    // Stores
    row(LOW6, make_store(StoreOp::STW, 0, 0, 0), "stw %t, %i(%a)"),
    row(LOW6, make_store(StoreOp::STH, 0, 0, 0), "sth %t, %i(%a)"),
    row(LOW6, make_store(StoreOp::STB, 0, 0, 0), "stb %t, %i(%a)"),
    row(LOW6, make_store(StoreOp::STX, 0, 0, 0), "stx %t, %i(%a)"),
    // Branches
    row(LOW6, make_branch(BranchOp::BEQ, 0, 0, 0), "beq %a, %t, %B"),
    row(LOW6, make_branch(BranchOp::BNE, 0, 0, 0), "bne %a, %t, %B"),
    row(LOW6, make_branch(BranchOp::BLT, 0, 0, 0), "blt %a, %t, %B"),
    row(LOW6, make_branch(BranchOp::BLTU, 0, 0, 0), "bltu %a, %t, %B"),
    row(LOW6, make_branch(BranchOp::BGE, 0, 0, 0), "bge %a, %t, %B"),
    row(LOW6, make_branch(BranchOp::BGEU, 0, 0, 0), "bgeu %a, %t, %B"),
    // Jumps
    row(LOW6, make_jump(JumpOp::JAL, 0, 0), "jal %t, %J"),
    row(LOW6 | RT_FIELD, make_jump(JumpOp::SYSCALL, 0, 0), "syscall %j"),
    row(!0, make_jump(JumpOp::BREAK, 0, 0), "break"),
    row(!0, make_jump(JumpOp::SYSRET, 0, 0), "sysret"),
    row(0, 0, "???"),
];

static REG_NAMES: [&str; REGISTER_COUNT] = [
    "x0", "x1", "x2", "x3", "x4", "x5", "x6", "x7", "x8", "x9", "x10", "x11", "x12", "x13", "x14",
    "x15", "x16", "x17", "x18", "x19", "x20", "x21", "x22", "x23", "x24", "x25", "x26", "x27",
    "x28", "x29", "x30", "x31",
];

/// Renders the word `ins` fetched from address `pc` as assembly text.
pub fn disassemble(pc: u32, ins: Word) -> String {
    let pattern = INSTAB
        .iter()
        .find(|p| ins & p.mask == p.bits)
        .expect("the pattern table ends with a catch-all row");

    let mut out = String::new();
    let mut fmt = pattern.fmt.chars();
    while let Some(c) = fmt.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match fmt.next() {
            Some('a') => out.push_str(REG_NAMES[get_ra(ins) as usize]),
            Some('b') => out.push_str(REG_NAMES[get_rb(ins) as usize]),
            Some('t') => out.push_str(REG_NAMES[get_rt(ins) as usize]),
            Some('i') => out.push_str(&get_i16(ins).to_string()),
            Some('u') => out.push_str(&format!("0x{:x}", get_i16(ins))),
            Some('j') => out.push_str(&get_i21(ins).to_string()),
            Some('s') => out.push_str(&get_rb(ins).to_string()),
            Some('J') => {
                let target = pc.wrapping_add(4).wrapping_add(get_i21(ins) as u32);
                out.push_str(&format!("0x{:x}", target));
            }
            Some('B') => {
                let target = pc.wrapping_add(4).wrapping_add(get_i16(ins) as u32);
                out.push_str(&format!("0x{:x}", target));
            }
            Some('U') => out.push_str(&format!("0x{:x}", (get_i16(ins) as u32) << 16)),
            _ => {}
        }
    }
    out
}
