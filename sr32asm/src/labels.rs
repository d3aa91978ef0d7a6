use pest::Span;
use std::collections::HashMap;

use sr32::{fits_signed16, fits_signed21, hilo_split};

use crate::image::Image;
use crate::{new_parser_error, Error, Result};

/// How a referencing site consumes a symbol's value once it is known.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FixupKind {
    /// Signed 16-bit offset from `site + 4`, ORed into bits 31..16.
    PcRelS16,
    /// Signed 21-bit offset from `site + 4`, ORed into bits 31..11.
    PcRelS21,
    /// The target written verbatim over the word at the site.
    AbsU32,
    /// Upper/lower pair: hi ORed into the word at the site, lo into
    /// the word at `site + 4`.
    AbsHilo,
    /// As `AbsHilo`, applied to the offset from `site + 4`.
    PcRelHilo,
}

struct Fixup<'i> {
    pc: u32,
    kind: FixupKind,
    span: Span<'i>,
}

struct Symbol<'i> {
    pc: u32,
    defined: bool,
    fixups: Vec<Fixup<'i>>,
    span: Span<'i>,
}

/// Assembly-time symbol table. Names are case-insensitive. A symbol is
/// created by whichever comes first, definition or reference; pending
/// references queue fixups that are applied the moment the definition
/// arrives.
pub struct SymbolTable<'i> {
    symbols: HashMap<String, Symbol<'i>>,
}

impl<'i> SymbolTable<'i> {
    pub fn new() -> SymbolTable<'i> {
        SymbolTable {
            symbols: HashMap::new(),
        }
    }

    fn entry(&mut self, span: &Span<'i>) -> &mut Symbol<'i> {
        let key = span.as_str().to_ascii_lowercase();
        let span = span.clone();
        self.symbols.entry(key).or_insert_with(|| Symbol {
            pc: 0,
            defined: false,
            fixups: Vec::new(),
            span,
        })
    }

    /// Binds the name at `span` to `pc` and resolves every queued
    /// fixup. Redefinition is an error.
    pub fn define(&mut self, image: &mut Image, span: Span<'i>, pc: u32) -> Result<()> {
        let name = span.as_str();
        let symbol = self.entry(&span);
        if symbol.defined {
            return Err(new_parser_error(
                span.clone(),
                format!("cannot redefine '{}'", name),
            ));
        }
        symbol.pc = pc;
        symbol.defined = true;
        image.set_name(pc, name);
        for fixup in symbol.fixups.drain(..) {
            patch(image, fixup.pc, pc, fixup.kind, &fixup.span)?;
        }
        Ok(())
    }

    /// Records a reference from the instruction at `site` to the name
    /// at `span`. A defined symbol is patched into the skeleton right
    /// away; otherwise the fixup is queued.
    pub fn refer(
        &mut self,
        image: &mut Image,
        span: Span<'i>,
        site: u32,
        kind: FixupKind,
    ) -> Result<()> {
        let symbol = self.entry(&span);
        if symbol.defined {
            let target = symbol.pc;
            patch(image, site, target, kind, &span)
        } else {
            symbol.fixups.push(Fixup {
                pc: site,
                kind,
                span,
            });
            Ok(())
        }
    }

    /// Fails on any symbol that was referenced but never defined.
    pub fn check_defined(&self) -> Result<()> {
        for symbol in self.symbols.values() {
            if !symbol.defined {
                return Err(new_parser_error(
                    symbol.span.clone(),
                    format!("undefined label '{}'", symbol.span.as_str()),
                ));
            }
        }
        Ok(())
    }
}

/// Applies a single fixup. The immediate bits of the skeleton at
/// `site` are still zero, so the computed field can be ORed in.
pub fn patch(image: &mut Image, site: u32, target: u32, kind: FixupKind, span: &Span) -> Result<()> {
    match kind {
        FixupKind::PcRelS16 => {
            let n = target.wrapping_sub(site.wrapping_add(4));
            if !fits_signed16(n) {
                return Err(out_of_range(span, target, site));
            }
            image.wr32(site, image.rd32(site) | (n << 16));
        }
        FixupKind::PcRelS21 => {
            let n = target.wrapping_sub(site.wrapping_add(4));
            if !fits_signed21(n) {
                return Err(out_of_range(span, target, site));
            }
            image.wr32(site, image.rd32(site) | (n << 11));
        }
        FixupKind::AbsU32 => image.wr32(site, target),
        FixupKind::AbsHilo => patch_hilo(image, site, target),
        FixupKind::PcRelHilo => patch_hilo(image, site, target.wrapping_sub(site.wrapping_add(4))),
    }
    Ok(())
}

fn patch_hilo(image: &mut Image, site: u32, n: u32) {
    let (hi, lo) = hilo_split(n);
    image.wr32(site, image.rd32(site) | (hi << 16));
    image.wr32(site + 4, image.rd32(site + 4) | (lo << 16));
}

fn out_of_range(span: &Span, target: u32, site: u32) -> Error {
    new_parser_error(
        span.clone(),
        format!(
            "label '{}' at {:08x} is out of range of {:08x}",
            span.as_str(),
            target,
            site
        ),
    )
}
