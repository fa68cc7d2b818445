//! HTTP method as a typed enum.
//!
//! Only the five methods an action can be declared with are represented.
//! `OPTIONS` is never declared: every controller answers it on its own.
//! Anything else on the wire (`HEAD`, `TRACE`, `PURGE`, …) does not parse and
//! falls through to the `405 Method Not Allowed` handler.

use std::fmt;
use std::str::FromStr;

/// Wire name of the method every controller answers implicitly.
pub const OPTIONS: &str = "OPTIONS";

/// A method an action can be declared with.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Delete,
    Get,
    Patch,
    Post,
    Put,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Get    => "GET",
            Self::Patch  => "PATCH",
            Self::Post   => "POST",
            Self::Put    => "PUT",
        }
    }
}

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DELETE" => Ok(Self::Delete),
            "GET"    => Ok(Self::Get),
            "PATCH"  => Ok(Self::Patch),
            "POST"   => Ok(Self::Post),
            "PUT"    => Ok(Self::Put),
            _        => Err(()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_declarable_methods_only() {
        assert_eq!("GET".parse(), Ok(Method::Get));
        assert_eq!("DELETE".parse(), Ok(Method::Delete));
        assert_eq!("get".parse::<Method>(), Err(()));
        assert_eq!(OPTIONS.parse::<Method>(), Err(()));
        assert_eq!("HEAD".parse::<Method>(), Err(()));
    }

    #[test]
    fn displays_wire_name() {
        assert_eq!(Method::Patch.to_string(), "PATCH");
    }
}
