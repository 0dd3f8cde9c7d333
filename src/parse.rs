// Fixed-format value parsing.
//
// Values always look like `-?d{1,2}.d`, so we skip general float parsing and
// read the digits directly. Anything else is rejected; this is not a float
// parser and must not be used for other inputs.

/// Parses a value token into tenths, eg `b"-12.3"` into `-123`.
#[inline(always)]
pub fn parse_tenths(token: &[u8]) -> Option<i32> {
    let (negative, digits) = match token.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some(_) => (false, token),
        None => return None,
    };

    let tenths = match *digits {
        [d0, b'.', f] => digit(d0)? * 10 + digit(f)?,
        [d0, d1, b'.', f] => (digit(d0)? * 10 + digit(d1)?) * 10 + digit(f)?,
        _ => return None,
    };

    return Some(if negative { -tenths } else { tenths });
}

/// Parses a value token into a double.
///
/// The digits are combined as an integer number of tenths and divided once,
/// which lands on the same double as the decimal literal.
#[inline(always)]
pub fn parse_value(token: &[u8]) -> Option<f64> {
    parse_tenths(token).map(|tenths| tenths as f64 / 10.0)
}

#[inline(always)]
fn digit(c: u8) -> Option<i32> {
    if c.is_ascii_digit() {
        Some((c - b'0') as i32)
    } else {
        None
    }
}
