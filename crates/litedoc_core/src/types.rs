//! Core type definitions for LiteDoc.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Unique identifier for a transaction.
///
/// Transaction IDs are monotonically increasing within one open database
/// and are only used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Sequence number of a saved revision.
///
/// Sequence numbers are assigned per database and strictly increase with
/// every saved revision, so a later write always has a higher sequence.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    /// Creates a new sequence number.
    #[must_use]
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Returns the raw sequence value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of digest bytes kept in a revision ID.
const REVISION_DIGEST_LEN: usize = 20;

/// Revision identifier of the form `<generation>-<hex digest>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    /// Derives the ID of a new revision.
    ///
    /// The generation is one more than the parent's; the digest covers the
    /// parent ID, the deletion flag and the canonical body bytes.
    #[must_use]
    pub fn derive(parent: Option<&RevisionId>, deleted: bool, canonical_body: &[u8]) -> Self {
        let generation = parent.map_or(0, RevisionId::generation) + 1;
        let mut hasher = Sha256::new();
        if let Some(parent) = parent {
            hasher.update(parent.0.as_bytes());
        }
        hasher.update([u8::from(deleted)]);
        hasher.update(canonical_body);
        let digest = hasher.finalize();
        Self(format!(
            "{generation}-{}",
            hex::encode(&digest[..REVISION_DIGEST_LEN])
        ))
    }

    /// Parses a revision ID, validating its shape.
    pub fn parse(s: &str) -> CoreResult<Self> {
        match s.split_once('-') {
            Some((generation, digest))
                if generation.parse::<u64>().is_ok_and(|g| g > 0)
                    && !digest.is_empty()
                    && digest.bytes().all(|b| b.is_ascii_hexdigit()) =>
            {
                Ok(Self(s.to_string()))
            }
            _ => Err(CoreError::invalid_format(format!(
                "invalid revision ID: {s:?}"
            ))),
        }
    }

    /// Returns the generation (number of ancestors plus one).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.0
            .split_once('-')
            .and_then(|(g, _)| g.parse().ok())
            .unwrap_or(0)
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Flags attached to a revision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionFlags(u8);

impl RevisionFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// The revision is a tombstone.
    pub const DELETED: Self = Self(0x01);
    /// The revision body references blobs.
    pub const HAS_ATTACHMENTS: Self = Self(0x02);

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets every flag in `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl BitOr for RevisionFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for RevisionFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

/// Name of the default scope and of the default collection.
pub const DEFAULT_NAME: &str = "_default";

/// Maximum length of a scope or collection name.
const MAX_NAME_LEN: usize = 251;

/// Identifies a collection by scope and name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionSpec {
    scope: String,
    name: String,
}

impl CollectionSpec {
    /// Creates a spec after validating both names.
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> CoreResult<Self> {
        let scope = scope.into();
        let name = name.into();
        validate_name(&scope)?;
        validate_name(&name)?;
        Ok(Self { scope, name })
    }

    /// The always-present `_default/_default` collection.
    #[must_use]
    pub fn default_collection() -> Self {
        Self {
            scope: DEFAULT_NAME.to_string(),
            name: DEFAULT_NAME.to_string(),
        }
    }

    /// Parses `name` (default scope) or `scope/name`.
    pub fn from_path(path: &str) -> CoreResult<Self> {
        match path.split_once('/') {
            Some((scope, name)) => Self::new(scope, name),
            None => Self::new(DEFAULT_NAME, path),
        }
    }

    /// Returns the scope name.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` for `_default/_default`.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.scope == DEFAULT_NAME && self.name == DEFAULT_NAME
    }
}

impl Default for CollectionSpec {
    fn default() -> Self {
        Self::default_collection()
    }
}

impl fmt::Display for CollectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scope, self.name)
    }
}

fn validate_name(name: &str) -> CoreResult<()> {
    let reject = |reason| {
        Err(CoreError::InvalidCollectionName {
            name: name.to_string(),
            reason,
        })
    };
    if name.is_empty() {
        return reject("name is empty");
    }
    if name.len() > MAX_NAME_LEN {
        return reject("name is longer than 251 characters");
    }
    if name != DEFAULT_NAME && (name.starts_with('_') || name.starts_with('%')) {
        return reject("name may not start with '_' or '%'");
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'%'))
    {
        return reject("name may only contain letters, digits, '_', '-' and '%'");
    }
    Ok(())
}
