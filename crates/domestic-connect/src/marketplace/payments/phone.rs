/// Minimum characters accepted in the phone field before anything is sent.
pub const MIN_PHONE_LENGTH: usize = 10;

/// Canonical Safaricom MSISDN (`2547XXXXXXXX` / `2541XXXXXXXX`).
///
/// Separators and a leading `+` are ignored; a local `0` prefix or a bare
/// subscriber number gains the `254` country code.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    let msisdn = if let Some(rest) = digits.strip_prefix("254") {
        format!("254{rest}")
    } else if let Some(rest) = digits.strip_prefix('0') {
        format!("254{rest}")
    } else if digits.starts_with('7') || digits.starts_with('1') {
        format!("254{digits}")
    } else {
        return None;
    };

    let subscriber = &msisdn[3..];
    let valid = subscriber.len() == 9 && (subscriber.starts_with('7') || subscriber.starts_with('1'));
    valid.then_some(msisdn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0712345678", Some("254712345678"))]
    #[case("+254 712 345 678", Some("254712345678"))]
    #[case("254712345678", Some("254712345678"))]
    #[case("712345678", Some("254712345678"))]
    #[case("0110-123-456", Some("254110123456"))]
    #[case("071234567", None)]
    #[case("0612345678", None)]
    #[case("+44 7700 900123", None)]
    fn normalizes_kenyan_numbers(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize_phone(raw).as_deref(), expected);
    }
}
