//! Client-certificate authentication level.
//!
//! A [`Level`] is written in configuration files as a short mnemonic:
//!
//! | mnemonic     | level                               |
//! |--------------|-------------------------------------|
//! | `none`       | [`Level::NoClientCert`]             |
//! | `request`    | [`Level::RequestClientCert`]        |
//! | `any`        | [`Level::RequireAnyClientCert`]     |
//! | `hard`       | [`Level::RequireAndVerifyClientCert`] |
//! | `hardAndSAN` | [`Level::RequireAndVerifyClientCertAndSan`] |
//!
//! Mnemonics are case-sensitive.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// mTLS authentication policy, ordered from the most permissive to the
/// strictest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Level {
    /// No client certificate is expected.
    #[default]
    NoClientCert = 0,
    /// A client certificate is requested but not required.
    RequestClientCert = 1,
    /// Any client certificate is required, without chain validation.
    RequireAnyClientCert = 2,
    /// A client certificate signed by the CA bundle is required.
    RequireAndVerifyClientCert = 3,
    /// As [`Level::RequireAndVerifyClientCert`], plus a SAN check.
    RequireAndVerifyClientCertAndSan = 4,
}

impl Level {
    /// Every level, in strictness order.
    pub const ALL: [Self; 5] = [
        Self::NoClientCert,
        Self::RequestClientCert,
        Self::RequireAnyClientCert,
        Self::RequireAndVerifyClientCert,
        Self::RequireAndVerifyClientCertAndSan,
    ];

    /// Canonical mnemonic.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoClientCert => "none",
            Self::RequestClientCert => "request",
            Self::RequireAnyClientCert => "any",
            Self::RequireAndVerifyClientCert => "hard",
            Self::RequireAndVerifyClientCertAndSan => "hardAndSAN",
        }
    }

    /// Parse a mnemonic.
    ///
    /// An empty string means "no level given" and yields `Ok(None)`, which
    /// callers can tell apart from an explicit `none`.
    pub fn parse(s: &str) -> Result<Option<Self>> {
        if s.is_empty() {
            return Ok(None);
        }

        Self::ALL
            .into_iter()
            .find(|lvl| lvl.as_str() == s)
            .map(Some)
            .ok_or_else(|| Error::InvalidLevel(s.to_owned()))
    }

    /// Whether a CA bundle is needed to enforce this level.
    #[must_use]
    pub const fn verifies_chain(self) -> bool {
        matches!(
            self,
            Self::RequireAndVerifyClientCert | Self::RequireAndVerifyClientCertAndSan
        )
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)?.ok_or_else(|| Error::InvalidLevel(String::new()))
    }
}

impl TryFrom<u64> for Level {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or(Error::LevelMapping(value))
    }
}

impl Serialize for Level {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Decodes a level from either its mnemonic or its stored integer value.
///
/// An empty string decodes to the default level, as if the field had been
/// left out.
impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LevelVisitor)
    }
}

struct LevelVisitor;

impl Visitor<'_> for LevelVisitor {
    type Value = Level;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a TLS level mnemonic (none, request, any, hard, hardAndSAN) or 0..=4")
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Level, E>
    where
        E: de::Error,
    {
        Level::parse(v)
            .map(Option::unwrap_or_default)
            .map_err(E::custom)
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<Level, E>
    where
        E: de::Error,
    {
        Level::try_from(v).map_err(E::custom)
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<Level, E>
    where
        E: de::Error,
    {
        let v = u64::try_from(v)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))?;
        self.visit_u64(v)
    }
}
