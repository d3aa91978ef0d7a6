use pest::iterators::Pair;
use pest::Span;
use std::str::FromStr;

use sr32::*;

use crate::image::Image;
use crate::int_util::process_imm;
use crate::labels::{patch, FixupKind, SymbolTable};
use crate::{check_token_length, new_parser_error, Result, Rule};

/// A branch or jump destination as written in the source.
enum JumpTarget<'i> {
    /// A numeric absolute address, resolved against the site at once.
    Address(u32, Span<'i>),
    /// A symbol, resolved now or when its definition arrives.
    Label(Span<'i>),
    /// `.`, the address of the instruction itself.
    Here,
}

pub fn process_instruction<'i>(
    pair: Pair<'i, Rule>,
    image: &mut Image,
    symbols: &mut SymbolTable<'i>,
) -> Result<()> {
    let rule = pair.as_rule();
    let mut pairs = pair.into_inner();

    match rule {
        Rule::instruction_alu_r => {
            let op: AluOp = process_mnemonic(&pairs.next().unwrap())?;
            let rt = process_register(&pairs.next().unwrap());
            let ra = process_register(&pairs.next().unwrap());
            let rb = process_register(&pairs.next().unwrap());
            image.emit(make_alu_reg(op, rt, ra, rb));
        }
        Rule::instruction_alu_i => {
            let op = process_alu_imm_mnemonic(&pairs.next().unwrap())?;
            let rt = process_register(&pairs.next().unwrap());
            let ra = process_register(&pairs.next().unwrap());
            let imm = process_imm(pairs.next().unwrap())?;
            image.emit(make_alu_imm(op, rt, ra, imm));
        }
        Rule::instruction_branch => {
            let op: BranchOp = process_mnemonic(&pairs.next().unwrap())?;
            let ra = process_register(&pairs.next().unwrap());
            let rb = process_register(&pairs.next().unwrap());
            let target = process_jump_target(pairs.next().unwrap())?;
            emit_relative(image, symbols, target, FixupKind::PcRelS16, |imm| {
                make_branch(op, ra, rb, imm)
            })?;
        }
        Rule::instruction_load => {
            let op: LoadOp = process_mnemonic(&pairs.next().unwrap())?;
            let rt = process_register(&pairs.next().unwrap());
            let (ra, imm) = process_memref(pairs.next().unwrap())?;
            image.emit(make_load(op, rt, ra, imm));
        }
        Rule::instruction_upper => {
            let op: LoadOp = process_mnemonic(&pairs.next().unwrap())?;
            let rt = process_register(&pairs.next().unwrap());
            let value = process_imm(pairs.next().unwrap())?;
            image.emit(make_load(op, rt, 0, value >> 16));
        }
        Rule::instruction_store => {
            let op: StoreOp = process_mnemonic(&pairs.next().unwrap())?;
            let rb = process_register(&pairs.next().unwrap());
            let (ra, imm) = process_memref(pairs.next().unwrap())?;
            image.emit(make_store(op, rb, ra, imm));
        }
        Rule::instruction_jalr => {
            let rt = process_register(&pairs.next().unwrap());
            let ra = process_register(&pairs.next().unwrap());
            let operand = pairs.next().unwrap();
            match operand.as_rule() {
                Rule::register => {
                    let rb = process_register(&operand);
                    image.emit(make_alu_reg(AluOp::JALR, rt, ra, rb));
                }
                Rule::imm => {
                    let imm = process_imm(operand)?;
                    image.emit(make_alu_imm(AluOp::JALR, rt, ra, imm));
                }
                _ => unreachable!(),
            }
        }
        Rule::instruction_jal => {
            let rt = process_register(&pairs.next().unwrap());
            let target = process_jump_target(pairs.next().unwrap())?;
            emit_relative(image, symbols, target, FixupKind::PcRelS21, |imm| {
                make_jump(JumpOp::JAL, rt, imm)
            })?;
        }
        Rule::instruction_syscall => {
            let imm = process_imm(pairs.next().unwrap())?;
            image.emit(make_jump(JumpOp::SYSCALL, 0, imm));
        }
        Rule::instruction_sys => {
            let op: JumpOp = process_mnemonic(&pairs.next().unwrap())?;
            image.emit(make_jump(op, 0, 0));
        }
        Rule::instruction_nop => {
            image.emit(make_alu_imm(AluOp::ADD, 0, 0, 0));
        }
        Rule::instruction_mv => {
            let rt = process_register(&pairs.next().unwrap());
            let ra = process_register(&pairs.next().unwrap());
            image.emit(make_alu_reg(AluOp::ADD, rt, 0, ra));
        }
        Rule::instruction_jr => {
            let ra = process_register(&pairs.next().unwrap());
            image.emit(make_alu_reg(AluOp::JALR, 0, ra, 0));
        }
        Rule::instruction_ret => {
            image.emit(make_alu_reg(AluOp::JALR, 0, 1, 0));
        }
        Rule::instruction_li => {
            let rt = process_register(&pairs.next().unwrap());
            let value = pairs.next().unwrap();
            match value.as_rule() {
                Rule::imm => {
                    emit_load_immediate(image, rt, process_imm(value)?);
                }
                Rule::identifier => {
                    check_token_length(&value.as_span())?;
                    let site = image.emit(make_load(LoadOp::LUI, rt, 0, 0));
                    image.emit(make_alu_imm(AluOp::ADD, rt, rt, 0));
                    symbols.refer(image, value.as_span(), site, FixupKind::AbsHilo)?;
                }
                _ => unreachable!(),
            }
        }
        Rule::instruction_la => {
            let rt = process_register(&pairs.next().unwrap());
            let target = pairs.next().unwrap();
            match target.as_rule() {
                Rule::identifier => {
                    check_token_length(&target.as_span())?;
                    let site = image.emit(make_load(LoadOp::AUIPC, rt, 0, 0));
                    image.emit(make_alu_imm(AluOp::ADD, rt, rt, 0));
                    symbols.refer(image, target.as_span(), site, FixupKind::PcRelHilo)?;
                }
                Rule::dot => {
                    let (hi, lo) = hilo_split(-4i32 as u32);
                    image.emit(make_load(LoadOp::AUIPC, rt, 0, hi));
                    image.emit(make_alu_imm(AluOp::ADD, rt, rt, lo));
                }
                _ => unreachable!(),
            }
        }
        Rule::instruction_j => {
            let target = process_jump_target(pairs.next().unwrap())?;
            emit_relative(image, symbols, target, FixupKind::PcRelS21, |imm| {
                make_jump(JumpOp::JAL, 0, imm)
            })?;
        }
        _ => unreachable!(),
    }

    Ok(())
}

/// Emits a PC-relative instruction: a `.` target encodes its offset
/// directly, anything else emits a zero-immediate skeleton and patches
/// it now (defined symbols, absolute addresses) or later.
fn emit_relative<'i, F>(
    image: &mut Image,
    symbols: &mut SymbolTable<'i>,
    target: JumpTarget<'i>,
    kind: FixupKind,
    encode: F,
) -> Result<()>
where
    F: Fn(u32) -> Word,
{
    match target {
        JumpTarget::Here => {
            image.emit(encode(-4i32 as u32));
            Ok(())
        }
        JumpTarget::Address(address, span) => {
            let site = image.emit(encode(0));
            patch(image, site, address, kind, &span)
        }
        JumpTarget::Label(span) => {
            let site = image.emit(encode(0));
            symbols.refer(image, span, site, kind)
        }
    }
}

/// `li` with a known value: one `addi` when it fits, otherwise a
/// `lui`/`addi` pair whose `addi` is dropped for a zero low half.
fn emit_load_immediate(image: &mut Image, rt: u32, value: u32) {
    if fits_signed16(value) {
        image.emit(make_alu_imm(AluOp::ADD, rt, 0, value));
    } else {
        let (hi, lo) = hilo_split(value);
        image.emit(make_load(LoadOp::LUI, rt, 0, hi));
        if lo != 0 {
            image.emit(make_alu_imm(AluOp::ADD, rt, rt, lo));
        }
    }
}

fn process_mnemonic<T: FromStr<Err = ParseEnumError>>(pair: &Pair<Rule>) -> Result<T> {
    pair.as_str()
        .parse()
        .map_err(|err: ParseEnumError| new_parser_error(pair.as_span(), err.to_string()))
}

/// ALU immediate mnemonics are the register forms with an `i` suffix.
fn process_alu_imm_mnemonic(pair: &Pair<Rule>) -> Result<AluOp> {
    let text = pair.as_str();
    text[..text.len() - 1]
        .parse()
        .map_err(|err: ParseEnumError| new_parser_error(pair.as_span(), err.to_string()))
}

fn process_register(pair: &Pair<Rule>) -> u32 {
    let text = pair.as_str().to_ascii_lowercase();
    match text.as_str() {
        "zero" => 0,
        "ra" => 1,
        "sp" => 2,
        _ => text[1..].parse().expect("the grammar admits only x0..x31"),
    }
}

fn process_jump_target(pair: Pair<Rule>) -> Result<JumpTarget> {
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::imm => {
            let span = inner.as_span();
            Ok(JumpTarget::Address(process_imm(inner)?, span))
        }
        Rule::identifier => {
            check_token_length(&inner.as_span())?;
            Ok(JumpTarget::Label(inner.as_span()))
        }
        Rule::dot => Ok(JumpTarget::Here),
        _ => unreachable!(),
    }
}

/// A memory reference: `off(ra)`, `(ra)` with offset zero, or a bare
/// absolute address with base `x0`.
fn process_memref(pair: Pair<Rule>) -> Result<(u32, u32)> {
    let mut ra = 0;
    let mut imm = 0;
    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::imm => imm = process_imm(item)?,
            Rule::paren_reg => ra = process_register(&item.into_inner().next().unwrap()),
            _ => unreachable!(),
        }
    }
    Ok((ra, imm))
}
