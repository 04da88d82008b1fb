fn map_digits(number: isize, digits: &[char; 10], minus: char) -> String {
    number
        .to_string()
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => digits[d as usize],
            None => minus,
        })
        .collect()
}

/// Exponents of plain-text symbols, `x²`.
pub fn to_superscript(number: isize) -> String {
    map_digits(number, &['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'], '⁻')
}

/// Labels of freshly allocated dummy variables, `x₁`.
pub fn to_subscript(number: isize) -> String {
    map_digits(number, &['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'], '₋')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unicode_digits() {
        assert_eq!(to_superscript(2), "²");
        assert_eq!(to_superscript(-12), "⁻¹²");
        assert_eq!(to_subscript(0), "₀");
        assert_eq!(to_subscript(305), "₃₀₅");
    }
}
