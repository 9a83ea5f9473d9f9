//! Core data model shared across the crawl, dedup, and unify stages
//!
//! This module defines the types that flow through the pipeline:
//! - [`Query`]: one paginated result set (category/subcategory pair)
//! - [`Record`]: a raw scraped posting with assigned identity fields
//! - [`Fingerprint`]: content-derived dedup key
//! - [`CanonicalId`]: stable identifier for the surviving copy
//! - [`IdentityBasis`]: which input the fingerprint was derived from

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one paginated result set: an (area/category, subcategory) pair.
///
/// Queries are immutable once issued; the crawl plan is a fixed sequence
/// of them and checkpoint positions index into that sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    pub category: String,
    pub subcategory: String,
}

impl Query {
    pub fn new(category: impl Into<String>, subcategory: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
        }
    }

    /// Stable identifier used in checkpoint completed-sets and filenames
    pub fn id(&self) -> String {
        format!("{}/{}", self.category, self.subcategory)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.subcategory)
    }
}

/// Which record field the fingerprint was derived from.
///
/// `Body` is the normal case. `Url` is the fallback when the body is
/// absent or too short to be a meaningful dedup key. `Synthetic` is the
/// last resort (sequence-index digest) and marks the record as
/// low-confidence for identity purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityBasis {
    Body,
    Url,
    Synthetic,
}

impl IdentityBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Url => "url",
            Self::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for IdentityBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Hex-encoded SHA-256 digest of a record's normalized identity input.
///
/// A pure function of content: recomputing for the same normalized
/// input always yields the same value. Two records with equal
/// fingerprints are considered the same posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wraps an already hex-encoded digest
    pub fn from_hex(hex: String) -> Self {
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 hex characters, used in canonical identifiers.
    ///
    /// Truncation collisions across different fingerprints are a known,
    /// bounded-probability edge case and are not corrected.
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable composite identifier for a canonical record:
/// `{source}-{YYYYMMDD}-{first 8 hex of fingerprint}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(String);

impl CanonicalId {
    /// Derives the identifier from its three components
    pub fn derive(source: &str, crawl_date: NaiveDate, fingerprint: &Fingerprint) -> Self {
        Self(format!(
            "{}-{}-{}",
            source,
            crawl_date.format("%Y%m%d"),
            fingerprint.short()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A raw scraped posting.
///
/// Produced by external per-site extraction; only `body` (and `url` as
/// fallback) participate in identity. The `id`, `fingerprint`, and
/// `identity_basis` fields are assigned by the deduplicator on
/// admission. Unknown input fields survive round trips through the
/// flattened `extra` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CanonicalId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_basis: Option<IdentityBasis>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    /// Creates a record with only a body, for tests and synthetic input
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }

    /// The source label used in per-source duplicate accounting
    pub fn source_label(&self) -> &str {
        self.source.as_deref().unwrap_or("unknown")
    }
}

impl Default for Record {
    fn default() -> Self {
        Self {
            id: None,
            fingerprint: None,
            identity_basis: None,
            title: None,
            company: None,
            location: None,
            source: None,
            url: None,
            category: None,
            body: None,
            extra: serde_json::Map::new(),
        }
    }
}
