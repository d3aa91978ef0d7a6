//! Assembler for the [sr32](../sr32/index.html) processor.
//!
//! [`assemble`](fn.assemble.html) translates a source string into an
//! [`Image`](struct.Image.html): 32-bit words (and raw data bytes)
//! placed at absolute addresses from a base of `0x100000`, ready to be
//! written out as a hex listing via the [hexfile](../hexfile/index.html)
//! crate. [`assemble_at`](fn.assemble_at.html) does the same at an
//! arbitrary base.
//!
//! Parsing is implemented with [pest], and the crate's [`Error`](type.Error.html)
//! type is an alias of `pest::error::Error`, so every diagnostic
//! (including semantic ones such as label redefinition or a branch
//! offset out of range) renders with file, line and source context.
//!
//! # Assembly language
//!
//! The source is line-oriented. Each line holds an optional `label:`,
//! then at most one instruction or directive. `//` and `;` start
//! comments. Mnemonics, register names and label names are
//! case-insensitive. Integers use C literal syntax (`0x` hex, leading
//! `0` octal, decimal, optional `-`), optionally prefixed with `#`.
//! Registers are `x0`..`x31` with the aliases `zero` (x0), `ra` (x1)
//! and `sp` (x2).
//!
//!  Shape | Syntax | Example
//! -------|--------|--------
//! ALU register | `op rt, ra, rb` | `add x3, x4, x5`
//! ALU immediate | `op rt, ra, #i` | `addi x3, x4, -2`
//! Branch | `op ra, rb, target` | `beq x1, x0, done`
//! Load | `op rt, off(ra)` | `ldw x3, 8(sp)`
//! Upper immediate | `op rt, value` | `lui x3, 0x12340000`
//! Store | `op rb, off(ra)` | `stw x3, (sp)`
//! Jumps | `jal rt, target` / `jalr rt, ra, rb\|#i` | `jal ra, main`
//! System | `syscall #i` / `break` / `sysret` | `syscall 1`
//!
//! A branch or jump `target` is a label, a numeric absolute address, or
//! `.` for the instruction's own address. Memory references may omit
//! the offset (`(ra)`) or the base register (`0x200`, base `x0`).
//!
//! Pseudo-instructions: `nop`, `mv rt, ra`, `jr ra`, `ret`,
//! `j target`, `li rt, value-or-label` (one word when the value fits a
//! signed 16-bit immediate, otherwise a `lui`/`addi` pair), and
//! `la rt, label` (a PC-relative `auipc`/`addi` pair).
//!
//! Directives: `equ name, #n` binds a name to a literal value;
//! `word a, b, ...` emits 32-bit words (labels become absolute-address
//! fixups); `half` emits 16-bit values; `byte` emits bytes and string
//! contents (no trailing NUL) and may leave the PC unaligned until the
//! next word-sized emission pads back to a word boundary.
//!
//! [pest]: https://docs.rs/pest/

mod data;
mod image;
mod instructions;
mod int_util;
mod labels;
mod parser;

#[cfg(test)]
mod test;

use parser::{Rule, SR32Parser};
use pest::iterators::Pair;
use pest::{Parser, Span};

pub use image::Image;

use sr32::DEFAULT_ORIGIN;

pub type Error = pest::error::Error<Rule>;

pub type Result<T> = std::result::Result<T, Error>;

/// Longest accepted identifier or string, in bytes.
const MAX_TOKEN: usize = 1024;

/// Assembles `input` at the default base address.
pub fn assemble(input: &str) -> Result<Image> {
    assemble_at(input, DEFAULT_ORIGIN)
}

/// Assembles `input` with the image base and initial PC at `origin`.
pub fn assemble_at(input: &str, origin: u32) -> Result<Image> {
    let program = parse(input)?;

    let mut image = Image::new(origin);
    let mut symbols = labels::SymbolTable::new();

    for line in program.into_inner() {
        if line.as_rule() == Rule::line {
            process_line(line, &mut image, &mut symbols)?;
        }
    }

    symbols.check_defined()?;
    Ok(image)
}

fn parse(input: &str) -> Result<Pair<Rule>> {
    Ok(SR32Parser::parse(Rule::program, input)?.next().unwrap())
}

fn new_parser_error(span: Span, message: String) -> Error {
    Error::new_from_span(pest::error::ErrorVariant::CustomError { message }, span)
}

fn check_token_length(span: &Span) -> Result<()> {
    if span.as_str().len() > MAX_TOKEN {
        Err(new_parser_error(span.clone(), "token too long".to_owned()))
    } else {
        Ok(())
    }
}

fn process_line<'i>(
    pair: Pair<'i, Rule>,
    image: &mut Image,
    symbols: &mut labels::SymbolTable<'i>,
) -> Result<()> {
    let mut label = None;
    let mut statement = None;
    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::label => label = Some(item.into_inner().next().unwrap()),
            Rule::statement => statement = Some(item.into_inner().next().unwrap()),
            _ => unreachable!(),
        }
    }

    // A label ahead of a word- or half-sized statement binds to the
    // aligned address its first item will land on; byte data keeps the
    // raw PC so that string labels address their first byte.
    if let Some(statement) = &statement {
        if let Some(to) = statement_alignment(statement) {
            image.align(to);
        }
    }

    if let Some(name) = label {
        check_token_length(&name.as_span())?;
        let pc = image.pc();
        symbols.define(image, name.as_span(), pc)?;
    }

    match statement {
        Some(statement) => match statement.as_rule() {
            Rule::instruction => instructions::process_instruction(
                statement.into_inner().next().unwrap(),
                image,
                symbols,
            ),
            Rule::directive => {
                data::process_directive(statement.into_inner().next().unwrap(), image, symbols)
            }
            _ => unreachable!(),
        },
        None => Ok(()),
    }
}

fn statement_alignment(statement: &Pair<Rule>) -> Option<u32> {
    match statement.as_rule() {
        Rule::instruction => Some(4),
        Rule::directive => {
            match statement.clone().into_inner().next().unwrap().as_rule() {
                Rule::directive_word => Some(4),
                Rule::directive_half => Some(2),
                _ => None,
            }
        }
        _ => unreachable!(),
    }
}
