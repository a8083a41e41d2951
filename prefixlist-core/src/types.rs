use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─── Address family ───────────────────────────────────────────

/// IP address family of a prefix list. Fixed at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    #[serde(rename = "IPv4")]
    Ipv4,
    #[serde(rename = "IPv6")]
    Ipv6,
}

impl AddressFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ipv4 => "IPv4",
            Self::Ipv6 => "IPv6",
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AddressFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IPv4" => Ok(Self::Ipv4),
            "IPv6" => Ok(Self::Ipv6),
            _ => Err(format!("Unknown address family: {}", s)),
        }
    }
}

// ─── Members ──────────────────────────────────────────────────

/// One CIDR block in a prefix list. The cidr is unique within a list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    pub cidr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entry {
    pub fn new(cidr: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            cidr: cidr.into(),
            description: Some(description.into()),
        }
    }

    /// Entry without a description.
    pub fn bare(cidr: impl Into<String>) -> Self {
        Self {
            cidr: cidr.into(),
            description: None,
        }
    }
}

/// Resource tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

// ─── Resource model ───────────────────────────────────────────

/// Declared (or assembled) state of a prefix list.
///
/// The first five fields are the caller's desired state. `id`, `version`,
/// `owner_id` and `arn` are computed by the control plane and only filled in
/// on results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefixList {
    #[serde(rename = "prefixListName")]
    pub name: String,
    pub max_entries: u32,
    pub address_family: AddressFamily,
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub tags: Vec<Tag>,

    #[serde(rename = "prefixListId", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
}

impl PrefixList {
    pub fn new(name: impl Into<String>, max_entries: u32, address_family: AddressFamily) -> Self {
        Self {
            name: name.into(),
            max_entries,
            address_family,
            entries: Vec::new(),
            tags: Vec::new(),
            id: None,
            version: None,
            owner_id: None,
            arn: None,
        }
    }

    pub fn with_entries(mut self, entries: Vec<Entry>) -> Self {
        self.entries = entries;
        self
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Assemble a model from server-reported state plus its drained entries.
    pub fn from_observed(observed: &ManagedPrefixList, entries: Vec<Entry>) -> Self {
        Self {
            name: observed.name.clone(),
            max_entries: observed.max_entries,
            address_family: observed.address_family,
            entries,
            tags: observed.tags.clone(),
            id: Some(observed.id.clone()),
            version: Some(observed.version),
            owner_id: Some(observed.owner_id.clone()),
            arn: Some(observed.arn.clone()),
        }
    }
}

/// Server-reported prefix list, as returned by describe/create/modify.
///
/// Entries are not part of this record; they are read through the paginated
/// entry listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedPrefixList {
    pub id: String,
    pub name: String,
    pub max_entries: u32,
    pub address_family: AddressFamily,
    /// Incremented by every successful entry modification.
    pub version: u64,
    pub owner_id: String,
    pub arn: String,
    /// Raw control plane status string, e.g. `modify-in-progress`.
    pub state: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

// ─── Pagination ───────────────────────────────────────────────

/// One page of a token-paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Absent or empty means this was the last page.
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    pub fn with_token(items: Vec<T>, token: impl Into<String>) -> Self {
        Self {
            items,
            next_token: Some(token.into()),
        }
    }
}
