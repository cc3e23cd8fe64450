use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Longest owner or fragment id accepted, in bytes.
///
/// Filesystem backends hex-encode ids into file names, which doubles them;
/// this keeps every encoded name under the usual 255-byte limit.
pub const MAX_ID_LEN: usize = 100;

fn check_len(kind: &'static str, value: &str) -> Result<(), TypeError> {
    if value.len() > MAX_ID_LEN {
        return Err(TypeError::IdTooLong {
            kind,
            len: value.len(),
            max: MAX_ID_LEN,
        });
    }
    Ok(())
}

/// Opaque identifier of the principal that owns a fragment.
///
/// The core never interprets an owner id. It is whatever the authenticator
/// hands over, with one rule: it is never empty.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Wrap an already-verified owner identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        if value.is_empty() {
            return Err(TypeError::EmptyOwnerId);
        }
        check_len("owner id", &value)?;
        Ok(Self(value))
    }

    /// Derive an owner id from a principal name (e.g. an e-mail address).
    ///
    /// The result is the hex BLAKE3 digest of the name, so raw principal
    /// names never reach the stores.
    pub fn from_principal(name: &str) -> Self {
        Self(blake3::hash(name.as_bytes()).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerId({})", self.0)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OwnerId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OwnerId> for String {
    fn from(id: OwnerId) -> Self {
        id.0
    }
}

/// Opaque fragment identifier.
///
/// Generated ids are random UUID v4 strings. Ids read back from storage or
/// supplied by callers are accepted as-is as long as they are non-empty and
/// no longer than [`MAX_ID_LEN`] bytes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FragmentId(String);

impl FragmentId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        if value.is_empty() {
            return Err(TypeError::EmptyFragmentId);
        }
        check_len("fragment id", &value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FragmentId({})", self.0)
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FragmentId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FragmentId> for String {
    fn from(id: FragmentId) -> Self {
        id.0
    }
}

/// The composite `(owner, id)` key.
///
/// Metadata and data are always addressed by the full key, never by the
/// fragment id alone.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentKey {
    pub owner: OwnerId,
    pub id: FragmentId,
}

impl FragmentKey {
    pub fn new(owner: OwnerId, id: FragmentId) -> Self {
        Self { owner, id }
    }
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.id)
    }
}
