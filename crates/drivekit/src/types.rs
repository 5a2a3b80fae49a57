//! Drive letters, remote paths and mapping records.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

// \\server\share[\dir...] with no characters Windows forbids in path parts
static UNC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\\\\[^\\/:*?"<>|\s][^\\/:*?"<>|]*(\\[^\\/:*?"<>|]+)+$"#).expect("valid regex")
});

/// A drive letter, stored upper-case. Displays as `Z:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DriveLetter(char);

impl DriveLetter {
    pub fn new(letter: char) -> Result<Self> {
        if letter.is_ascii_alphabetic() {
            Ok(Self(letter.to_ascii_uppercase()))
        } else {
            Err(Error::InvalidLetter(letter.to_string()))
        }
    }

    pub fn as_char(&self) -> char {
        self.0
    }

    /// `Z:` form used by `net use`.
    pub fn device(&self) -> String {
        format!("{}:", self.0)
    }
}

impl FromStr for DriveLetter {
    type Err = Error;

    /// Accepts `z`, `Z`, `Z:` and `Z:\`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let bare = trimmed
            .strip_suffix(":\\")
            .or_else(|| trimmed.strip_suffix(':'))
            .unwrap_or(trimmed);
        let mut chars = bare.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::new(c),
            _ => Err(Error::InvalidLetter(s.to_string())),
        }
    }
}

impl fmt::Display for DriveLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.0)
    }
}

impl Serialize for DriveLetter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for DriveLetter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A UNC path `\\server\share[\dir...]`, without trailing backslash.
///
/// Equality ignores ASCII case, as the redirector does.
#[derive(Debug, Clone, Eq)]
pub struct RemotePath(String);

impl RemotePath {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for RemotePath {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl FromStr for RemotePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_end_matches('\\');
        if UNC_RE.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(Error::InvalidPath(s.to_string()))
        }
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for RemotePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RemotePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Connection status column of `net use`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Ok,
    Disconnected,
    Unavailable,
    Other(String),
}

impl ConnectionStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "OK" => Self::Ok,
            "Disconnected" => Self::Disconnected,
            "Unavailable" => Self::Unavailable,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether the mapping can be used as-is.
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Unavailable => write!(f, "Unavailable"),
            Self::Other(s) if s.is_empty() => write!(f, "-"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// A letter currently bound to a remote resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedDrive {
    pub letter: DriveLetter,
    /// Remote path as reported, which may not be a valid [`RemotePath`]
    pub remote: String,
    pub status: ConnectionStatus,
}

impl MappedDrive {
    /// Whether this mapping already serves `remote` and is usable.
    pub fn satisfies(&self, remote: &RemotePath) -> bool {
        self.status.is_usable()
            && self
                .remote
                .trim_end_matches('\\')
                .eq_ignore_ascii_case(remote.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_letter_forms() {
        for input in ["z", "Z", "Z:", "z:\\", " Z: "] {
            assert_eq!(input.parse::<DriveLetter>().unwrap().to_string(), "Z:");
        }
        for input in ["", "ZZ", "1", "Z:/x", "é"] {
            assert!(input.parse::<DriveLetter>().is_err(), "{input:?}");
        }
    }

    #[test]
    fn test_remote_path_validation() {
        let path: RemotePath = r"\\fs01\Finance\".parse().unwrap();
        assert_eq!(path.as_str(), r"\\fs01\Finance");
        assert!(r"\\fs01.corp.local\share$\sub dir".parse::<RemotePath>().is_ok());

        for bad in [r"C:\share", r"\\server", r"\\server\", r"//server/share", r"\\srv\sh*re", ""] {
            assert!(bad.parse::<RemotePath>().is_err(), "{bad:?}");
        }
    }

    #[test]
    fn test_remote_path_equality_ignores_case() {
        let a: RemotePath = r"\\FS01\finance".parse().unwrap();
        let b: RemotePath = r"\\fs01\Finance".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_satisfies_requires_usable_status() {
        let remote: RemotePath = r"\\fs01\finance".parse().unwrap();
        let mut mapped = MappedDrive {
            letter: DriveLetter::new('f').unwrap(),
            remote: r"\\FS01\Finance".to_string(),
            status: ConnectionStatus::Ok,
        };
        assert!(mapped.satisfies(&remote));

        mapped.status = ConnectionStatus::Unavailable;
        assert!(!mapped.satisfies(&remote));
    }

    #[test]
    fn test_deserialize_letter_and_path() {
        #[derive(Deserialize)]
        struct M {
            letter: DriveLetter,
            path: RemotePath,
        }
        let m: M = serde_json::from_str(r#"{"letter":"h:","path":"\\\\srv\\home"}"#).unwrap();
        assert_eq!(m.letter.as_char(), 'H');
        assert_eq!(m.path.as_str(), r"\\srv\home");
    }
}
