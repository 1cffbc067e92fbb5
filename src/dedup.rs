//! Duplicate document scrubbing.
//!
//! Two documents are duplicates when they index the same set of non-stop
//! terms, regardless of term frequencies or order. The scrubber keeps the
//! lowest id of each group and removes the rest.

use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use crate::engine::SearchEngine;
use crate::models::DocumentId;

/// Remove every document whose term set duplicates an earlier document's.
///
/// Documents are scanned in ascending id order, so the first id seen for
/// each distinct term set survives. Returns the removed ids.
pub fn remove_duplicates(engine: &mut SearchEngine) -> Vec<DocumentId> {
    let mut originals: BTreeMap<BTreeSet<&str>, DocumentId> = BTreeMap::new();
    let mut duplicates = Vec::new();
    for document_id in engine.document_ids() {
        let signature: BTreeSet<&str> = engine
            .word_frequencies(document_id)
            .into_keys()
            .collect();
        if originals.contains_key(&signature) {
            duplicates.push(document_id);
        } else {
            originals.insert(signature, document_id);
        }
    }

    for &document_id in &duplicates {
        info!(document_id, "removing duplicate document");
        engine.remove_document(document_id);
    }
    duplicates
}
