//! Mount-time configuration values.
//!
//! Everything is configured through builders at startup; there is no file or
//! environment layer. The only value that needs parsing is the request-body
//! size limit, which is written the way people write it: `"10mb"`, `"512kb"`,
//! `"1048576"`.

use std::fmt;
use std::str::FromStr;

/// Default request-body limit for a controller.
pub const DEFAULT_BODY_LIMIT: &str = "10mb";

/// Maximum number of body bytes a controller accepts per request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BodyLimit(usize);

/// A body limit string that could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid body size limit `{0}`")]
pub struct InvalidBodyLimit(pub String);

impl BodyLimit {
    pub const fn from_bytes(bytes: usize) -> Self {
        Self(bytes)
    }

    pub const fn bytes(self) -> usize {
        self.0
    }
}

impl Default for BodyLimit {
    fn default() -> Self {
        // 10mb
        Self(10 * 1024 * 1024)
    }
}

/// Parses `<number>[unit]`, units `b`, `kb`, `mb`, `gb`, `tb` (1024-based,
/// case-insensitive). A bare number is a byte count. Fractions are allowed
/// and rounded down: `"1.5kb"` is 1536 bytes.
impl FromStr for BodyLimit {
    type Err = InvalidBodyLimit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidBodyLimit(s.to_owned());

        let raw = s.trim().to_ascii_lowercase();
        let split = raw
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(raw.len());
        let (number, unit) = raw.split_at(split);

        let number: f64 = number.trim().parse().map_err(|_| invalid())?;
        if !number.is_finite() || number < 0.0 {
            return Err(invalid());
        }

        let scale: f64 = match unit {
            ""   | "b"  => 1.0,
            "kb"        => 1024.0,
            "mb"        => 1024.0 * 1024.0,
            "gb"        => 1024.0 * 1024.0 * 1024.0,
            "tb"        => 1024.0 * 1024.0 * 1024.0 * 1024.0,
            _           => return Err(invalid()),
        };

        let bytes = (number * scale).floor();
        if bytes > usize::MAX as f64 {
            return Err(invalid());
        }
        Ok(Self(bytes as usize))
    }
}

impl fmt::Display for BodyLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}b", self.0)
    }
}
