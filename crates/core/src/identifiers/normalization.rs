use super::identifiers_constants::{ENTITY_SUFFIXES, EXCHANGE_SUFFIXES, SYMBOL_SEPARATORS};

/// Canonical form of a ticker: uppercase, known exchange suffix removed,
/// separators and whitespace dropped.
///
/// Pure function of its input; an empty symbol normalizes to an empty string.
pub fn normalize_symbol(symbol: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    strip_exchange_suffix(&upper)
        .chars()
        .filter(|c| !c.is_whitespace() && !SYMBOL_SEPARATORS.contains(c))
        .collect()
}

fn strip_exchange_suffix(symbol: &str) -> &str {
    for suffix in EXCHANGE_SUFFIXES {
        if let Some(stripped) = symbol.strip_suffix(suffix) {
            if !stripped.is_empty() {
                return stripped;
            }
        }
    }
    symbol
}

/// Canonical form of a security name used for fuzzy matching.
///
/// Lowercases, removes punctuation, drops trailing corporate-entity words
/// ("inc", "asa", "oyj", ...) and collapses whitespace. Returns `None` when
/// nothing meaningful remains.
pub fn normalize_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| *c != '.' && *c != '\'')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    // A name made only of entity words ("AB") is left alone.
    while tokens.len() > 1 {
        match tokens.last() {
            Some(last) if ENTITY_SUFFIXES.contains(last) => {
                tokens.pop();
            }
            _ => break,
        }
    }

    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

/// Canonical form of a standardized code (ISIN, CUSIP, SEDOL).
pub fn normalize_code(code: &str) -> Option<String> {
    let normalized: String = code
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}
