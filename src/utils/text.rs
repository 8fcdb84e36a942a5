/// Truncate to at most `max_chars` characters, appending an ellipsis when
/// anything was cut. Char-based, so multi-byte input can't split.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_pass_through() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 5), "hello");
    }

    #[test]
    fn long_strings_get_an_ellipsis() {
        assert_eq!(truncate("hello world", 5), "hello…");
    }

    #[test]
    fn multibyte_input_does_not_split() {
        assert_eq!(truncate("ééééé", 3), "ééé…");
    }
}
