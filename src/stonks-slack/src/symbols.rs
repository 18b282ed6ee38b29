//! Market symbol extraction from message text.

/// Pick candidate market symbols out of whitespace-separated tokens.
///
/// A token qualifies when it is 3 or 4 ASCII letters, optionally followed
/// by any run of non-letter characters (punctuation, emoji shortcodes'
/// colons, etc.), which are stripped. Order and duplicates are kept and the
/// letters keep the case they were written in.
///
/// # Example
///
/// ```rust
/// use stonks_slack::symbols::extract_symbols;
///
/// let symbols = extract_symbols(["quote", "DOCN", "aapl."]);
/// assert_eq!(symbols, vec!["DOCN", "aapl"]);
/// ```
pub fn extract_symbols<'a, I>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    tokens.into_iter().filter_map(symbol_core).map(str::to_string).collect()
}

/// Extract candidate symbols from a whole message.
pub fn symbols_in_text(text: &str) -> Vec<String> {
    extract_symbols(text.split_whitespace())
}

fn symbol_core(token: &str) -> Option<&str> {
    let letters = token
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(token.len());

    if !(3..=4).contains(&letters) {
        return None;
    }

    let (core, rest) = token.split_at(letters);
    if rest.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    Some(core)
}
