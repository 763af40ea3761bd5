//! The client/server version triple exchanged during login.

use std::fmt;

use crate::error::ProtocolError;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32, patch: u32) -> Version {
        Version { major, minor, patch }
    }

    /// Parses `major.minor.patch`, ignoring an optional trailing `-suffix`.
    pub fn parse(raw: &str) -> Result<Version, ProtocolError> {
        let malformed = || ProtocolError::Malformed { variant: "version", raw: raw.to_string() };

        let core = raw.split('-').next().ok_or_else(malformed)?;
        let mut parts = core.splitn(3, '.');
        let major = parts.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
        let minor = parts.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
        let patch = parts.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
        Ok(Version { major, minor, patch })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
