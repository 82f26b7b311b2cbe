//! Price text repair
//!
//! The site renders prices as separate dollar and cent spans, so the scraped
//! text loses its decimal separator (`$1999` for $19.99).

/// Reinsert the decimal point two digits from the end of the digit run
///
/// All digits in `text` are collected; if they form one contiguous run in the
/// text, that run is replaced by the repaired value. Text whose digits are not
/// contiguous (including text that was already repaired) comes back unchanged.
pub fn repair_price(text: &str) -> String {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return text.to_string();
    }

    let padded = format!("{:0>3}", digits);
    let split = padded.len() - 2;
    let fixed = format!("{}.{}", &padded[..split], &padded[split..]);

    text.replace(&digits, &fixed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repair_inserts_decimal() {
        assert_eq!(repair_price("1999"), "19.99");
        assert_eq!(repair_price("$1999"), "$19.99");
        assert_eq!(repair_price("Price: $34900"), "Price: $349.00");
    }

    #[test]
    fn test_repair_is_idempotent() {
        for raw in ["$1999", "$34900", "$5", "Price: $120045"] {
            let once = repair_price(raw);
            assert_eq!(repair_price(&once), once, "second pass changed {}", once);
            assert_eq!(once.matches('.').count(), 1);
            let dot = once.find('.').unwrap();
            let cents: String = once[dot + 1..].chars().take_while(|c| c.is_ascii_digit()).collect();
            assert_eq!(cents.len(), 2);
        }
    }

    #[test]
    fn test_repair_short_prices() {
        assert_eq!(repair_price("$5"), "$0.05");
        assert_eq!(repair_price("$99"), "$0.99");
    }

    #[test]
    fn test_repair_without_digits() {
        assert_eq!(repair_price("See price in cart"), "See price in cart");
    }

    #[test]
    fn test_repair_split_digits_unchanged() {
        assert_eq!(repair_price("$1,299"), "$1,299");
    }
}
