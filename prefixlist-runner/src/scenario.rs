//! Scenario files: an ordered list of handler steps.
//!
//! ```yaml
//! steps:
//!   - action: create
//!     resource:
//!       prefixListName: office
//!       maxEntries: 5
//!       addressFamily: IPv4
//!       entries:
//!         - { cidr: 10.0.0.0/16, description: hq }
//!   - action: read
//!   - action: delete
//! ```
//!
//! Steps after a `create` target the created list unless they name an id.

use std::path::Path;

use anyhow::{Context, Result};
use prefixlist_core::PrefixList;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Step {
    Create {
        resource: PrefixList,
    },
    Update {
        resource: PrefixList,
    },
    Read {
        #[serde(default, rename = "prefixListId")]
        prefix_list_id: Option<String>,
    },
    List,
    Delete {
        #[serde(default, rename = "prefixListId")]
        prefix_list_id: Option<String>,
    },
}

impl Step {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Read { .. } => "read",
            Self::List => "list",
            Self::Delete { .. } => "delete",
        }
    }
}

impl Scenario {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let scenario: Self = serde_yaml::from_str(yaml).context("invalid scenario")?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_yaml(&yaml).with_context(|| format!("parsing scenario {}", path.display()))
    }
}
