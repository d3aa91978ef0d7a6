use matches::debug_assert_matches;
use pest::iterators::Pair;

use crate::image::Image;
use crate::int_util::process_imm;
use crate::labels::{FixupKind, SymbolTable};
use crate::{check_token_length, Result, Rule};

pub fn process_directive<'i>(
    pair: Pair<'i, Rule>,
    image: &mut Image,
    symbols: &mut SymbolTable<'i>,
) -> Result<()> {
    match pair.as_rule() {
        Rule::directive_equ => {
            let mut pairs = pair.into_inner();
            let name = pairs.next().unwrap();
            check_token_length(&name.as_span())?;
            let value = process_imm(pairs.next().unwrap())?;
            symbols.define(image, name.as_span(), value)
        }
        Rule::directive_word => {
            for item in pair.into_inner() {
                debug_assert_matches!(item.as_rule(), Rule::word_item);
                let inner = item.into_inner().next().unwrap();
                match inner.as_rule() {
                    Rule::imm => {
                        image.emit(process_imm(inner)?);
                    }
                    Rule::identifier => {
                        check_token_length(&inner.as_span())?;
                        let site = image.emit(0);
                        symbols.refer(image, inner.as_span(), site, FixupKind::AbsU32)?;
                    }
                    _ => unreachable!(),
                }
            }
            Ok(())
        }
        Rule::directive_half => {
            for item in pair.into_inner() {
                let value = process_imm(item)?;
                image.emit_half(value as u16);
            }
            Ok(())
        }
        Rule::directive_byte => {
            for item in pair.into_inner() {
                debug_assert_matches!(item.as_rule(), Rule::byte_item);
                let inner = item.into_inner().next().unwrap();
                match inner.as_rule() {
                    Rule::imm => image.emit_byte(process_imm(inner)? as u8),
                    Rule::string => {
                        let text = inner.into_inner().next().unwrap();
                        check_token_length(&text.as_span())?;
                        for byte in text.as_str().bytes() {
                            image.emit_byte(byte);
                        }
                    }
                    _ => unreachable!(),
                }
            }
            Ok(())
        }
        _ => unreachable!(),
    }
}
