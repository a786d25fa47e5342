//! Mod-10 (Luhn) check digit validation for order numbers.

/// Returns true if `value` is a string of at least two ASCII digits whose Luhn checksum is zero.
///
/// Starting from the rightmost (check) digit, every second digit is doubled, and 9 is subtracted from any result
/// above 9. The number is valid when the sum of all the digits is divisible by 10.
pub fn validate(value: &str) -> bool {
    if value.len() < 2 {
        return false;
    }
    let mut sum = 0u32;
    for (i, c) in value.bytes().rev().enumerate() {
        if !c.is_ascii_digit() {
            return false;
        }
        let mut digit = u32::from(c - b'0');
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}
