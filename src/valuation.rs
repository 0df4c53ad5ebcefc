const CURRENCY_SYMBOLS: [char; 3] = ['€', '£', '$'];

/// Parses listing prices such as `€45.5M`, `£900K` or a bare `12`.
///
/// `N/A`, blanks and anything unparsable mean "no valuation", which is not
/// the same as zero. When both suffix letters appear, `M` wins.
pub fn parse_valuation(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
        return None;
    }
    let cleaned: String = trimmed
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c))
        .collect::<String>()
        .trim()
        .to_uppercase();

    let multiplier = if cleaned.contains('M') {
        1_000_000.0
    } else if cleaned.contains('K') {
        1_000.0
    } else {
        1.0
    };
    let digits: String = cleaned.chars().filter(|c| *c != 'M' && *c != 'K').collect();
    let value = digits.trim().parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value * multiplier)
}

pub fn parse_valuation_opt(text: Option<&str>) -> Option<f64> {
    text.and_then(parse_valuation)
}

pub fn to_millions(value: f64) -> f64 {
    (value / 1_000_000.0 * 100.0).round() / 100.0
}
