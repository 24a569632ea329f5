//! Sanitization for text crossing an agent boundary.
//!
//! Distinct from the event stream's visibility filter: the filter decides who
//! receives a frame, the sanitizer rewrites what a handoff carries. Patterns
//! are compiled once at construction; there is no global registry.

use regex_lite::Regex;

const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}";

/// 16 digits, optionally separated by spaces or dashes. Longer digit runs are
/// left alone.
const CARD_PATTERN: &str = r"\b(?:\d[ -]?){15}\d\b";

const SECRET_PATTERN: &str =
    r"(?i)\b(password|passwd|token|secret|api[_-]?key|authorization)\b\s*[:=]\s*\S+";

/// Masks emails, card numbers, and key=value secrets in free text.
pub struct ContextSanitizer {
    email: Regex,
    card: Regex,
    secret: Regex,
}

impl ContextSanitizer {
    pub fn new() -> Self {
        Self {
            email: Regex::new(EMAIL_PATTERN).expect("valid email pattern"),
            card: Regex::new(CARD_PATTERN).expect("valid card pattern"),
            secret: Regex::new(SECRET_PATTERN).expect("valid secret pattern"),
        }
    }

    /// Rewrite `text` with every sensitive match replaced by a placeholder.
    /// Secrets first, so a secret whose value looks like an email or card is
    /// masked as a secret.
    pub fn sanitize(&self, text: &str) -> String {
        let text = self.secret.replace_all(text, "${1}=[REDACTED]");
        let text = self.card.replace_all(&text, "[CARD]");
        self.email.replace_all(&text, "[EMAIL]").into_owned()
    }

    /// True when no pattern matches `text`.
    pub fn is_clean(&self, text: &str) -> bool {
        !self.secret.is_match(text) && !self.card.is_match(text) && !self.email.is_match(text)
    }
}

impl Default for ContextSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_addresses_are_masked() {
        let sanitizer = ContextSanitizer::new();
        let out = sanitizer.sanitize("Contact me at alice@example.com for details");
        assert!(out.contains("[EMAIL]"));
        assert!(!out.contains("alice@example.com"));
        assert!(!sanitizer.is_clean("Contact me at alice@example.com"));
    }

    #[test]
    fn card_numbers_are_masked_in_all_spellings() {
        let sanitizer = ContextSanitizer::new();
        assert_eq!(sanitizer.sanitize("4111111111111111"), "[CARD]");
        assert_eq!(sanitizer.sanitize("4111 1111 1111 1111"), "[CARD]");
        assert_eq!(sanitizer.sanitize("4111-1111-1111-1111"), "[CARD]");
    }

    #[test]
    fn longer_digit_runs_are_not_cards() {
        let sanitizer = ContextSanitizer::new();
        assert!(sanitizer.is_clean("order 12345678901234567 shipped"));
    }

    #[test]
    fn key_value_secrets_are_redacted() {
        let sanitizer = ContextSanitizer::new();
        assert_eq!(sanitizer.sanitize("password=hunter2"), "password=[REDACTED]");
        assert_eq!(sanitizer.sanitize("api_key: sk-12345"), "api_key=[REDACTED]");
        assert_eq!(sanitizer.sanitize("Token = abc"), "Token=[REDACTED]");
    }

    #[test]
    fn secret_values_shaped_like_other_patterns_stay_redacted() {
        let sanitizer = ContextSanitizer::new();
        let out = sanitizer.sanitize("password=alice@example.com");
        assert_eq!(out, "password=[REDACTED]");
    }

    #[test]
    fn clean_text_passes_through_unchanged() {
        let sanitizer = ContextSanitizer::new();
        let text = "Customer wants a refund for order 42.";
        assert_eq!(sanitizer.sanitize(text), text);
        assert!(sanitizer.is_clean(text));
    }
}
