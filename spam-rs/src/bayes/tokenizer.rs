//! Message tokenizer
//!
//! Lowercases each field and splits on every run of characters outside
//! `[a-z0-9@._+]`, so addresses like `a@b.com` survive as one token.

/// Shortest token kept
pub const MIN_TOKEN_LEN: usize = 2;
/// Longest token kept
pub const MAX_TOKEN_LEN: usize = 40;

fn is_token_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '@' | '.' | '_' | '+')
}

/// Tokenize the sender, subject and body of a message, in that order.
///
/// Repeated tokens are kept: both training and classification weight a
/// token by how often it occurs.
pub fn tokenize(sender: &str, subject: &str, body: &str) -> Vec<String> {
    let mut tokens = Vec::new();

    for field in [sender, subject, body] {
        if field.is_empty() {
            continue;
        }

        let lower = field.to_lowercase();
        tokens.extend(
            lower
                .split(|c: char| !is_token_char(c))
                .filter(|t| (MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&t.len()))
                .map(str::to_string),
        );
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_strip_punctuation() {
        assert_eq!(tokenize("Hello, WORLD!!", "", ""), vec!["hello", "world"]);
    }

    #[test]
    fn test_single_char_dropped() {
        assert!(tokenize("a", "", "").is_empty());
    }

    #[test]
    fn test_empty_fields() {
        assert!(tokenize("", "", "").is_empty());
        assert_eq!(tokenize("", "", "ok"), vec!["ok"]);
    }

    #[test]
    fn test_field_order_and_repeats() {
        let tokens = tokenize("a@b.com", "win money now", "click here now");
        assert_eq!(
            tokens,
            vec!["a@b.com", "win", "money", "now", "click", "here", "now"]
        );
    }

    #[test]
    fn test_address_chars_kept() {
        let tokens = tokenize("John.Doe+promo@Mail.example_co.uk", "", "");
        assert_eq!(tokens, vec!["john.doe+promo@mail.example_co.uk"]);
    }

    #[test]
    fn test_length_bounds() {
        let forty = "x".repeat(40);
        let forty_one = "y".repeat(41);
        let body = format!("{} {} ab", forty, forty_one);

        assert_eq!(tokenize("", "", &body), vec![forty, "ab".to_string()]);
    }

    #[test]
    fn test_non_ascii_letters_split() {
        // é is not in the token alphabet, so it acts as a separator
        assert_eq!(tokenize("", "café résumé", ""), vec!["caf", "sum"]);
    }

    #[test]
    fn test_control_chars_split() {
        assert_eq!(tokenize("", "", "line1\r\nline2\tend"), vec!["line1", "line2", "end"]);
    }
}
