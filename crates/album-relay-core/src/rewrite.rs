//! Username mention rewriting.
//!
//! A single rule: every case-insensitive occurrence of `@<handle>` is replaced
//! with a fixed string. The replacement is inserted literally, so `$` in it has
//! no capture-group meaning.

use regex::{NoExpand, Regex, RegexBuilder};
use std::borrow::Cow;
use tracing::debug;

/// Replaces one `@handle` mention with a fixed replacement.
#[derive(Debug, Clone)]
pub struct HandleRewriter {
    pattern: Regex,
    token: String,
    replacement: String,
}

impl HandleRewriter {
    /// Builds a rewriter for `handle`, given with or without its leading `@`.
    ///
    /// # Errors
    ///
    /// Returns a `regex::Error` if the escaped pattern cannot be compiled,
    /// which only happens when it exceeds the regex size limit.
    pub fn new(handle: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        let token = format!("@{}", handle.trim().trim_start_matches('@'));
        let pattern = RegexBuilder::new(&regex::escape(&token))
            .case_insensitive(true)
            .build()?;

        Ok(Self {
            pattern,
            token,
            replacement: replacement.into(),
        })
    }

    /// The `@handle` token being replaced.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The replacement string.
    #[must_use]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Returns `true` if a second pass could rewrite the output of the first,
    /// i.e. the replacement itself contains the token.
    #[must_use]
    pub fn is_self_referential(&self) -> bool {
        self.pattern.is_match(&self.replacement)
    }

    /// Rewrites every occurrence of the token in `text`.
    ///
    /// Borrows the input unchanged when the token is absent.
    #[must_use]
    pub fn rewrite<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let rewritten = self
            .pattern
            .replace_all(text, NoExpand(self.replacement.as_str()));
        if let Cow::Owned(_) = rewritten {
            debug!(token = %self.token, replacement = %self.replacement, "Mention replaced");
        }
        rewritten
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter() -> HandleRewriter {
        match HandleRewriter::new("cashxcore", "@InfoXCashReal") {
            Ok(r) => r,
            Err(e) => panic!("rewriter should build: {e}"),
        }
    }

    #[test]
    fn test_replaces_all_case_variants() {
        let r = rewriter();
        assert_eq!(
            r.rewrite("@cashxcore and @CashXCore and @CASHXCORE"),
            "@InfoXCashReal and @InfoXCashReal and @InfoXCashReal"
        );
    }

    #[test]
    fn test_absent_token_borrows_input() {
        let r = rewriter();
        let out = r.rewrite("nothing to see, cashxcore without at");
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, "nothing to see, cashxcore without at");
    }

    #[test]
    fn test_handle_with_leading_at() {
        let r = HandleRewriter::new("@cashxcore", "@InfoXCashReal")
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(r.token(), "@cashxcore");
        assert_eq!(r.rewrite("buy @cashxcore now"), "buy @InfoXCashReal now");
    }

    #[test]
    fn test_replacement_is_literal() {
        let r = HandleRewriter::new("foo", "$1 @bar").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(r.rewrite("hi @foo"), "hi $1 @bar");
    }

    #[test]
    fn test_handle_is_escaped() {
        let r = HandleRewriter::new("a.b", "@x").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(r.rewrite("@a.b @aXb"), "@x @aXb");
    }

    #[test]
    fn test_self_referential_detection() {
        assert!(!rewriter().is_self_referential());
        let r = HandleRewriter::new("info", "@INFO_backup").unwrap_or_else(|e| panic!("{e}"));
        assert!(r.is_self_referential());
    }
}
