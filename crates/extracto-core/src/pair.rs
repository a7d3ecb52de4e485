//! Pair extraction for quiniela-style draw values.
//!
//! The winning "pair" of a draw value is always its final two digits: 1425
//! plays as 25, not 14. Short values are read as if left-padded with zeros
//! to four digits, so 7 plays as 07.

const PAD_WIDTH: usize = 4;

/// Derive the two-character pair key of a draw value.
///
/// Any input is accepted, including the empty string (`"00"`).
pub fn pair_key(value: &str) -> String {
    let padded = format!("{:0>width$}", value, width = PAD_WIDTH);
    let chars: Vec<char> = padded.chars().collect();
    chars[chars.len() - 2..].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_digit_value() {
        assert_eq!(pair_key("1425"), "25");
    }

    #[test]
    fn single_digit_is_zero_padded() {
        assert_eq!(pair_key("7"), "07");
    }

    #[test]
    fn long_value_keeps_last_two() {
        assert_eq!(pair_key("123456"), "56");
    }

    #[test]
    fn short_values() {
        assert_eq!(pair_key("42"), "42");
        assert_eq!(pair_key("305"), "05");
        assert_eq!(pair_key("0007"), "07");
    }

    #[test]
    fn empty_value() {
        assert_eq!(pair_key(""), "00");
    }
}
