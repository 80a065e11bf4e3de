//! Numeric decoders for index and coordinate fields.

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};

/// Decode `-?[0-9]+` into an `i32` without going through `str::parse`.
///
/// Anything else (empty input, a lone `-`, letters, inner whitespace, a `+`
/// sign) is rejected. Digits are accumulated towards the sign so that
/// `i32::MIN` round-trips.
pub fn decode_int(token: &str) -> DecodeResult<i32> {
    if token.is_empty() {
        return Err(DecodeError::EmptyToken);
    }
    let (negative, digits) = match token.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, token),
    };
    if digits.is_empty() {
        return Err(DecodeError::invalid(token));
    }

    let mut num: i32 = 0;
    for b in digits.bytes() {
        if !b.is_ascii_digit() {
            return Err(DecodeError::invalid(token));
        }
        let d = i32::from(b - b'0');
        num = num
            .checked_mul(10)
            .and_then(|n| if negative { n.checked_sub(d) } else { n.checked_add(d) })
            .ok_or_else(|| DecodeError::Overflow {
                token: token.to_owned(),
            })?;
    }
    Ok(num)
}

/// Same as [`decode_int`] but tolerates leading/trailing whitespace.
pub fn decode_int_trimmed(token: &str) -> DecodeResult<i32> {
    decode_int(token.trim())
}

pub fn decode_float(token: &str) -> DecodeResult<f32> {
    token.parse::<f32>().map_err(|_| DecodeError::InvalidFloat {
        token: token.to_owned(),
    })
}

/// Pull `N` whitespace-separated floats off the cursor.
///
/// Fewer than `N` fields is an error; fields past `N` are left on the cursor
/// (e.g. the optional `w` of `v x y z w`).
pub fn decode_floats<const N: usize>(cursor: &mut Cursor<'_>) -> DecodeResult<[f32; N]> {
    let mut out = [0.0_f32; N];
    for (found, slot) in out.iter_mut().enumerate() {
        let field = cursor
            .next_word()
            .ok_or(DecodeError::MissingField { expected: N, found })?;
        *slot = decode_float(field)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_signed_ints() {
        assert_eq!(decode_int("0"), Ok(0));
        assert_eq!(decode_int("42"), Ok(42));
        assert_eq!(decode_int("-7"), Ok(-7));
        assert_eq!(decode_int("-2147483648"), Ok(i32::MIN));
        assert_eq!(decode_int("2147483647"), Ok(i32::MAX));
    }

    #[test]
    fn rejects_bad_ints() {
        assert_eq!(decode_int(""), Err(DecodeError::EmptyToken));
        assert!(matches!(decode_int("-"), Err(DecodeError::InvalidToken { .. })));
        assert!(matches!(decode_int("a"), Err(DecodeError::InvalidToken { .. })));
        assert!(matches!(decode_int("1a"), Err(DecodeError::InvalidToken { .. })));
        assert!(matches!(decode_int("+1"), Err(DecodeError::InvalidToken { .. })));
        assert!(matches!(decode_int("1 2"), Err(DecodeError::InvalidToken { .. })));
        assert!(matches!(decode_int("2147483648"), Err(DecodeError::Overflow { .. })));
    }

    #[test]
    fn trimmed_variant_allows_outer_whitespace() {
        assert_eq!(decode_int_trimmed("  -3 \t"), Ok(-3));
        assert!(decode_int("  -3").is_err());
        assert!(matches!(decode_int_trimmed(" 3x "), Err(DecodeError::InvalidToken { .. })));
        assert_eq!(decode_int_trimmed("   "), Err(DecodeError::EmptyToken));
    }

    #[test]
    fn error_keeps_offending_token() {
        let err = decode_int("12b").unwrap_err();
        assert_eq!(err.token(), Some("12b"));
    }

    #[test]
    fn decodes_three_floats() {
        let mut c = Cursor::new("1.0 -2.5  3e1");
        assert_eq!(decode_floats::<3>(&mut c), Ok([1.0, -2.5, 30.0]));
        assert!(c.is_empty());
    }

    #[test]
    fn tab_separated_floats() {
        let mut c = Cursor::new("1.0\t-2.0\t3.5");
        assert_eq!(decode_floats::<3>(&mut c), Ok([1.0, -2.0, 3.5]));
    }

    #[test]
    fn extra_fields_stay_on_cursor() {
        let mut c = Cursor::new("0.5 0.25 0.0");
        assert_eq!(decode_floats::<2>(&mut c), Ok([0.5, 0.25]));
        assert_eq!(c.rest(), "0.0");
    }

    #[test]
    fn missing_float_field_is_error() {
        let mut c = Cursor::new("1.0 2.0");
        assert_eq!(
            decode_floats::<3>(&mut c),
            Err(DecodeError::MissingField {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn bad_float_field_is_error_not_zero() {
        let mut c = Cursor::new("1.0 oops 3.0");
        let err = decode_floats::<3>(&mut c).unwrap_err();
        assert_eq!(err.token(), Some("oops"));
    }
}
