use matches::debug_assert_matches;
use pest::iterators::Pair;

use crate::{new_parser_error, Result, Rule};

/// Processes an `imm` pair (an integer with an optional `#` prefix).
pub fn process_imm(pair: Pair<Rule>) -> Result<u32> {
    debug_assert_matches!(pair.as_rule(), Rule::imm);
    process_int(pair.into_inner().next().unwrap())
}

/// Processes an `int` pair.
pub fn process_int(pair: Pair<Rule>) -> Result<u32> {
    let span = pair.as_span();
    match parse_c_int(span.as_str()) {
        Some(value) => Ok(value),
        None => Err(new_parser_error(
            span.clone(),
            format!("bad integer literal '{}'", span.as_str()),
        )),
    }
}

/// Parses with C base detection: `0x` is hex, a leading `0` is octal,
/// anything else decimal. A leading `-` negates with wraparound.
pub fn parse_c_int(text: &str) -> Option<u32> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = if rest.starts_with("0x") || rest.starts_with("0X") {
        u32::from_str_radix(&rest[2..], 16).ok()?
    } else if rest.len() > 1 && rest.starts_with('0') {
        u32::from_str_radix(&rest[1..], 8).ok()?
    } else {
        rest.parse::<u32>().ok()?
    };
    Some(if negative { value.wrapping_neg() } else { value })
}
