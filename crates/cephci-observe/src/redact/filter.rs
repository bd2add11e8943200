use std::{
    borrow::Cow,
    sync::{Arc, LazyLock},
};

use regex::{Captures, Regex, RegexBuilder};

use crate::redact::Payload;

/// Replacement written in place of a sensitive value.
pub const MASK: &str = "<masked>";

/// Key names whose values never reach a log sink.
pub const SENSITIVE_KEYS: &[&str] = &["password", "token", "keyring", "access_key", "access-key"];

/// ANSI SGR escape as written by coloured console output.
const SGR: &str = r"\x1b\[[0-9;]*m";

static DEFAULT_FILTER: LazyLock<SensitiveFilter> = LazyLock::new(|| {
    SensitiveFilter::with_keys(SENSITIVE_KEYS.iter().copied())
        .expect("built-in sensitive key pattern compiles")
});

/// Redacts credential-like values from log payloads.
///
/// The filter is immutable once built and cheap to clone, so a single instance can be
/// shared by every sink and called from any thread.
#[derive(Debug, Clone)]
pub struct SensitiveFilter {
    keys: Arc<[String]>,
    pattern: Option<Regex>,
}

impl Default for SensitiveFilter {
    fn default() -> Self {
        DEFAULT_FILTER.clone()
    }
}

impl SensitiveFilter {
    /// Builds a filter over a custom key set.
    pub fn with_keys<I, K>(keys: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        keys.retain(|k| !k.is_empty());
        // Longest first so `access_key` wins over a shorter key sharing its prefix.
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        keys.dedup();

        let pattern = if keys.is_empty() {
            None
        } else {
            let alternation = keys
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            // Styling codes may wrap the key and the separator.
            let src = format!(
                r#"(?:\b|(?P<style>{SGR}))(?P<key>{alternation})(?P<sep>(?:{SGR})*["']?[ \t]*(?:{SGR})*[:=](?:{SGR})*[ \t]*|["']?[ \t]+)(?P<val>"[^"]*"|'[^']*'|[^\s\x1b]+)"#
            );
            Some(RegexBuilder::new(&src).case_insensitive(true).build()?)
        };

        Ok(Self {
            keys: keys.into(),
            pattern,
        })
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Exact, ASCII case-insensitive key match.
    pub fn is_sensitive_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k.eq_ignore_ascii_case(key))
    }

    /// Returns a redacted copy of `payload`; the input is left untouched.
    pub fn redact(&self, payload: &Payload) -> Payload {
        match payload {
            Payload::Str(s) => Payload::Str(self.redact_str(s).into_owned()),
            Payload::Bytes(raw) => self.redact_bytes(raw),
            Payload::Map(entries) => Payload::Map(
                entries
                    .iter()
                    .map(|(k, v)| {
                        let v = if self.is_sensitive_key(k) {
                            Payload::Str(MASK.to_string())
                        } else {
                            self.redact(v)
                        };
                        (k.clone(), v)
                    })
                    .collect(),
            ),
            Payload::List(items) => Payload::List(items.iter().map(|v| self.redact(v)).collect()),
            Payload::Tuple(items) => {
                Payload::Tuple(items.iter().map(|v| self.redact(v)).collect())
            }
            Payload::Null | Payload::Bool(_) | Payload::Int(_) | Payload::Float(_) => {
                payload.clone()
            }
        }
    }

    /// Masks the value following each sensitive keyword in free text.
    ///
    /// `password: s3cr3t` becomes `password: <masked>`; a quoted value keeps its quotes.
    ///
    /// Text without a keyword comes back borrowed and unchanged.
    pub fn redact_str<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let Some(pattern) = &self.pattern else {
            return Cow::Borrowed(text);
        };
        pattern.replace_all(text, |caps: &Captures<'_>| {
            let val = &caps["val"];
            let quote = match val.chars().next() {
                Some(q @ ('"' | '\'')) if val.len() > 1 && val.ends_with(q) => q.to_string(),
                _ => String::new(),
            };
            let style = caps.name("style").map_or("", |m| m.as_str());
            format!("{style}{}{}{quote}{MASK}{quote}", &caps["key"], &caps["sep"])
        })
    }

    /// Non UTF-8 bytes pass through as is.
    fn redact_bytes(&self, raw: &[u8]) -> Payload {
        match std::str::from_utf8(raw) {
            Ok(text) => match self.redact_str(text) {
                Cow::Owned(redacted) => Payload::Bytes(redacted.into_bytes()),
                Cow::Borrowed(_) => Payload::Bytes(raw.to_vec()),
            },
            Err(_) => Payload::Bytes(raw.to_vec()),
        }
    }
}
