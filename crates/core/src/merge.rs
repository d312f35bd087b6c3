//! List merge engine.
//!
//! Merge rules for embedded user lists:
//! 1. Append: existing entries first, then the incoming ones in input order.
//!    Keys are not de-duplicated.
//! 2. Reconcile: an incoming entry whose key matches an existing one
//!    overwrites that entry's mutable fields in place. Unmatched incoming
//!    entries are appended once, after the pass, in input order. A list that
//!    is absent or empty cannot be reconciled; it must be replaced.
//! 3. Remove: a single non-blank key wins over a key set; with neither,
//!    nothing is removed. The result is always written back.
//!
//! Absent and empty documents are the same thing for rules 1 and 3.

use std::collections::HashSet;

use crate::codec::{EmbeddedDoc, ListDoc};
use crate::types::{is_blank_key, Keyed, Reconcile};

/// `existing ++ delta`.
pub fn append<T>(existing: EmbeddedDoc<T>, delta: Vec<T>) -> ListDoc<T> {
    let mut list = existing.into_list();
    list.extend(delta);
    ListDoc::new(list)
}

/// Outcome of a reconcile pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<T> {
    pub doc: ListDoc<T>,
    /// Existing entries overwritten in place.
    pub updated: usize,
    /// Incoming entries that matched nothing and were appended.
    pub appended: usize,
}

/// Reconcile `delta` into `existing`. `None` when there is nothing to reconcile against.
pub fn reconcile<T: Reconcile>(existing: EmbeddedDoc<T>, delta: Vec<T>) -> Option<Reconciled<T>> {
    let EmbeddedDoc::Populated(mut list) = existing else {
        return None;
    };

    let mut updated = 0;
    let mut unmatched = Vec::new();
    for incoming in delta {
        match list.iter_mut().find(|entry| entry.key() == incoming.key()) {
            Some(entry) => {
                entry.reconcile_from(&incoming);
                updated += 1;
            }
            None => unmatched.push(incoming),
        }
    }

    let appended = unmatched.len();
    list.extend(unmatched);
    Some(Reconciled {
        doc: ListDoc::new(list),
        updated,
        appended,
    })
}

/// Which entries a remove targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveSelector {
    Key(String),
    Keys(HashSet<String>),
    Nothing,
}

impl RemoveSelector {
    /// Build a selector from the single-key / key-set pair callers send.
    ///
    /// A blank single key (empty, `null`, `undefined`) defers to the key set.
    pub fn from_request(key: &str, keys: &[String]) -> Self {
        if !is_blank_key(key) {
            Self::Key(key.to_string())
        } else if !keys.is_empty() {
            Self::Keys(keys.iter().cloned().collect())
        } else {
            Self::Nothing
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Key(k) => k == key,
            Self::Keys(ks) => ks.contains(key),
            Self::Nothing => false,
        }
    }
}

/// Drop every entry the selector matches. Absent input yields an empty document.
pub fn remove<T: Keyed>(existing: EmbeddedDoc<T>, selector: &RemoveSelector) -> ListDoc<T> {
    let mut list = existing.into_list();
    list.retain(|entry| !selector.matches(entry.key()));
    ListDoc::new(list)
}
