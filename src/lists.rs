// 📋 Reference Lists - authorization lists as data
// Allow-lists and deny-lists of BICs / QXBANs, re-read from disk on every check

use crate::config::ListPaths;
use crate::error::{VerificationError, VerificationResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;

// ============================================================================
// LIST KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// Authorized receiver BICs
    ReceiverBic,
    /// Authorized receiver QXBANs
    ReceiverAccount,
    /// Authorized sender BICs
    SenderBic,
    /// Blacklisted sender QXBANs
    SenderBlacklist,
    /// Valid priority codes (plus a default)
    Priority,
}

impl ListKind {
    pub fn name(&self) -> &'static str {
        match self {
            ListKind::ReceiverBic => "receiver BIC",
            ListKind::ReceiverAccount => "receiver QXBAN",
            ListKind::SenderBic => "sender BIC",
            ListKind::SenderBlacklist => "sender blacklist",
            ListKind::Priority => "priority",
        }
    }

    /// Key holding the entries inside the list file
    pub fn key(&self) -> &'static str {
        match self {
            ListKind::ReceiverBic | ListKind::SenderBic => "bicList",
            ListKind::ReceiverAccount | ListKind::SenderBlacklist => "qxbanList",
            ListKind::Priority => "priorityList",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// REFERENCE LIST
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceList {
    pub kind: ListKind,
    pub entries: Vec<String>,
}

impl ReferenceList {
    pub fn new(kind: ListKind, entries: Vec<String>) -> Self {
        ReferenceList { kind, entries }
    }

    /// Exact, case-sensitive membership
    pub fn contains(&self, value: &str) -> bool {
        self.entries.iter().any(|entry| entry == value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriorityList {
    pub list: ReferenceList,
    pub default: String,
}

impl PriorityList {
    pub fn contains(&self, priority: &str) -> bool {
        self.list.contains(priority)
    }
}

// ============================================================================
// LIST PROVIDER
// ============================================================================

/// Source of reference lists. A failed load is an error, never an empty list.
pub trait ListProvider {
    fn load(&self, kind: ListKind) -> VerificationResult<ReferenceList>;

    fn load_priority(&self) -> VerificationResult<PriorityList>;
}

/// On-disk list file. Every key is optional here; the provider decides which one is required.
#[derive(Debug, Deserialize)]
struct ListDocument {
    #[serde(rename = "bicList")]
    bic_list: Option<Vec<String>>,

    #[serde(rename = "qxbanList")]
    qxban_list: Option<Vec<String>>,

    #[serde(rename = "priorityList")]
    priority_list: Option<Vec<String>>,

    #[serde(rename = "priorityDefault")]
    priority_default: Option<String>,
}

impl ListDocument {
    fn entries(&mut self, kind: ListKind) -> Option<Vec<String>> {
        match kind {
            ListKind::ReceiverBic | ListKind::SenderBic => self.bic_list.take(),
            ListKind::ReceiverAccount | ListKind::SenderBlacklist => self.qxban_list.take(),
            ListKind::Priority => self.priority_list.take(),
        }
    }
}

/// Reads one JSON file per list. No caching: each call sees the file as it is now.
#[derive(Debug, Clone)]
pub struct FileListProvider {
    paths: ListPaths,
}

impl FileListProvider {
    pub fn new(paths: ListPaths) -> Self {
        FileListProvider { paths }
    }

    fn read_document(&self, kind: ListKind) -> VerificationResult<ListDocument> {
        let path = self.paths.path(kind);

        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!(list = %kind, path = ?path, "Reference list unreadable");
            VerificationError::ListRead {
                list: kind,
                path: path.to_path_buf(),
                source,
            }
        })?;

        serde_json::from_str(&content).map_err(|source| {
            tracing::warn!(list = %kind, path = ?path, "Reference list malformed");
            VerificationError::ListParse {
                list: kind,
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

impl ListProvider for FileListProvider {
    fn load(&self, kind: ListKind) -> VerificationResult<ReferenceList> {
        let mut document = self.read_document(kind)?;
        let entries = document
            .entries(kind)
            .ok_or(VerificationError::ListKeyMissing {
                list: kind,
                key: kind.key(),
            })?;

        tracing::debug!(list = %kind, entries = entries.len(), "Loaded reference list");
        Ok(ReferenceList::new(kind, entries))
    }

    fn load_priority(&self) -> VerificationResult<PriorityList> {
        let kind = ListKind::Priority;
        let mut document = self.read_document(kind)?;

        let entries = document
            .entries(kind)
            .ok_or(VerificationError::ListKeyMissing {
                list: kind,
                key: kind.key(),
            })?;
        let default = document
            .priority_default
            .take()
            .ok_or(VerificationError::ListKeyMissing {
                list: kind,
                key: "priorityDefault",
            })?;

        Ok(PriorityList {
            list: ReferenceList::new(kind, entries),
            default,
        })
    }
}

/// Lists held in memory, for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct InMemoryListProvider {
    lists: HashMap<ListKind, Vec<String>>,
    priority_default: Option<String>,
}

impl InMemoryListProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the entries of one list
    pub fn with_list<I, S>(mut self, kind: ListKind, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lists
            .insert(kind, entries.into_iter().map(Into::into).collect());
        self
    }

    /// Builder: set the fallback priority
    pub fn with_priority_default(mut self, default: impl Into<String>) -> Self {
        self.priority_default = Some(default.into());
        self
    }
}

impl ListProvider for InMemoryListProvider {
    fn load(&self, kind: ListKind) -> VerificationResult<ReferenceList> {
        self.lists
            .get(&kind)
            .map(|entries| ReferenceList::new(kind, entries.clone()))
            .ok_or(VerificationError::ListKeyMissing {
                list: kind,
                key: kind.key(),
            })
    }

    fn load_priority(&self) -> VerificationResult<PriorityList> {
        let list = self.load(ListKind::Priority)?;
        let default = self
            .priority_default
            .clone()
            .ok_or(VerificationError::ListKeyMissing {
                list: ListKind::Priority,
                key: "priorityDefault",
            })?;

        Ok(PriorityList { list, default })
    }
}

// ============================================================================
// TESTS
// ============================================================================
