use rapidfuzz::distance::indel;

/// Lower-cases, drops non-ASCII characters and turns every other
/// non-alphanumeric character into a space.
pub fn full_process(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if !ch.is_ascii() {
            continue;
        }
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(' ');
        }
    }
    out.trim().to_string()
}

pub fn sort_key(raw: &str) -> String {
    let processed = full_process(raw);
    let mut tokens: Vec<&str> = processed.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

pub fn ratio_of_keys(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let sim = indel::normalized_similarity(a.chars(), b.chars());
    (sim * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Order-insensitive similarity: 100 means identical token multisets.
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    ratio_of_keys(&sort_key(a), &sort_key(b))
}
