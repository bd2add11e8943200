use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Boolean switch that defaults to `true`.
///
/// Used for options that are on unless explicitly disabled, such as exit code checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flag(pub bool);

impl Flag {
    pub const fn enabled() -> Self {
        Self(true)
    }

    pub const fn disabled() -> Self {
        Self(false)
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.0
    }
}

impl Default for Flag {
    fn default() -> Self {
        Self::enabled()
    }
}

impl From<bool> for Flag {
    fn from(v: bool) -> Self {
        Self(v)
    }
}

impl FromStr for Flag {
    type Err = ();

    /// Accepts `1/true/yes/on` and `0/false/no/off`, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Self(true)),
            "0" | "false" | "no" | "off" => Ok(Self(false)),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Flag;

    #[test]
    fn default_is_enabled() {
        assert!(Flag::default().is_enabled());
    }

    #[test]
    fn parses_common_spellings() {
        assert_eq!("yes".parse::<Flag>(), Ok(Flag(true)));
        assert_eq!(" ON ".parse::<Flag>(), Ok(Flag(true)));
        assert_eq!("0".parse::<Flag>(), Ok(Flag(false)));
        assert_eq!("False".parse::<Flag>(), Ok(Flag(false)));
        assert!("maybe".parse::<Flag>().is_err());
    }
}
