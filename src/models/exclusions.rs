use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::ContentType;

/// The three per-user, per-content-type lists driving exclusion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Seen,
    ToWatch,
    Rejected,
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::Seen => "seen",
            ListKind::ToWatch => "to_watch",
            ListKind::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "seen" => Some(ListKind::Seen),
            "to_watch" => Some(ListKind::ToWatch),
            "rejected" => Some(ListKind::Rejected),
            _ => None,
        }
    }
}

/// Optional metadata carried by seen/watch-list entries, used by history views
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntryMeta {
    pub poster_url: Option<String>,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub viewed_at: Option<DateTime<Utc>>,
}

/// Per-content-type swipe lists for one user
///
/// `seen` and `to_watch` keep per-entry metadata for history rendering;
/// `rejected` only needs membership. Keys are normalized titles.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TitleLists {
    #[serde(default)]
    pub seen: BTreeMap<String, EntryMeta>,
    #[serde(default)]
    pub to_watch: BTreeMap<String, EntryMeta>,
    #[serde(default)]
    pub rejected: BTreeSet<String>,
}

impl TitleLists {
    /// `seen` and `rejected` act as a single exclusion for re-querying;
    /// `to_watch` deliberately does not exclude an item from suggestion.
    pub fn combined_exclusions(&self) -> HashSet<String> {
        self.seen
            .keys()
            .chain(self.rejected.iter())
            .cloned()
            .collect()
    }

    /// Marks a title seen, taking it off the watch list if present.
    ///
    /// Returns the watch-list entry that was displaced, if any.
    pub fn mark_seen(&mut self, title: &str, meta: EntryMeta) -> Option<EntryMeta> {
        let displaced = self.to_watch.remove(title);
        self.seen.insert(title.to_string(), meta);
        displaced
    }

    pub fn add_to_watch(&mut self, title: &str, meta: EntryMeta) {
        self.to_watch.insert(title.to_string(), meta);
    }

    pub fn reject(&mut self, title: &str) {
        self.rejected.insert(title.to_string());
    }

    /// Single-item removal from one of the three lists
    pub fn remove(&mut self, list: ListKind, title: &str) -> bool {
        match list {
            ListKind::Seen => self.seen.remove(title).is_some(),
            ListKind::ToWatch => self.to_watch.remove(title).is_some(),
            ListKind::Rejected => self.rejected.remove(title),
        }
    }

    /// Full-list clear, the only bulk removal operation
    pub fn clear(&mut self, list: ListKind) {
        match list {
            ListKind::Seen => self.seen.clear(),
            ListKind::ToWatch => self.to_watch.clear(),
            ListKind::Rejected => self.rejected.clear(),
        }
    }

    pub fn contains(&self, list: ListKind, title: &str) -> bool {
        match list {
            ListKind::Seen => self.seen.contains_key(title),
            ListKind::ToWatch => self.to_watch.contains_key(title),
            ListKind::Rejected => self.rejected.contains(title),
        }
    }
}

/// The persisted per-user document: one set of lists per content type
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(default)]
    pub movie: TitleLists,
    #[serde(default)]
    pub series: TitleLists,
}

impl UserProfile {
    pub fn lists(&self, content_type: ContentType) -> &TitleLists {
        match content_type {
            ContentType::Movie => &self.movie,
            ContentType::Series => &self.series,
        }
    }

    pub fn lists_mut(&mut self, content_type: ContentType) -> &mut TitleLists {
        match content_type {
            ContentType::Movie => &mut self.movie,
            ContentType::Series => &mut self.series,
        }
    }
}
