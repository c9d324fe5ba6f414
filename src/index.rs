//! Derived tag index over the note collection.
//!
//! The index maintains tag → note-ID memberships, category roll-ups, and the
//! pinned-tag set. It is always exactly the union of `note.tags` across the
//! stored notes: rebuilt wholesale on a bulk replace, patched incrementally
//! on single-note edits. It never filters; pins affect sort order only.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Note, NoteId};
use crate::tags::category_from_tag;

/// Mutable derived mapping from tags to the notes that carry them.
///
/// # Examples
///
/// ```
/// use jot::index::TagIndex;
/// use jot::{NoteBuilder, NoteId};
///
/// let note = NoteBuilder::new()
///     .id(NoteId::from_string("n1"))
///     .markdown("Buy milk\n\n#groceries")
///     .tags(vec!["#groceries".to_string()])
///     .build();
///
/// let mut index = TagIndex::new();
/// index.set_notes(&[note]);
///
/// assert_eq!(index.note_ids_with_tag("#groceries"), [NoteId::from_string("n1")]);
/// assert_eq!(index.categories(), ["#groceries"]);
/// ```
#[derive(Debug, Default)]
pub struct TagIndex {
    tags_to_note_ids: BTreeMap<String, Vec<NoteId>>,
    pinned: BTreeSet<String>,
}

impl TagIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the index and rebuilds it from the given notes.
    ///
    /// Membership order of note IDs follows the note iteration order; the
    /// resulting memberships are identical regardless of the order tags
    /// appear within each note.
    pub fn set_notes(&mut self, notes: &[Note]) {
        self.tags_to_note_ids.clear();

        for note in notes {
            for tag in &note.tags {
                self.tags_to_note_ids.entry(tag.clone()).or_default();
            }
        }

        for note in notes {
            for (tag, note_ids) in self.tags_to_note_ids.iter_mut() {
                if note.tags.contains(tag) && !note_ids.contains(&note.id) {
                    note_ids.push(note.id.clone());
                }
            }
        }
    }

    /// Patches the index for a single note whose tag set changed.
    ///
    /// For every known tag, the note is added to or removed from the
    /// membership to match `new_tags`; tags left with no notes are deleted
    /// entirely. Tags in `new_tags` not yet known get a fresh entry holding
    /// exactly this note. Idempotent for an unchanged tag set.
    pub fn update_note_tags(&mut self, note_id: &NoteId, new_tags: &[String]) {
        let known: Vec<String> = self.tags_to_note_ids.keys().cloned().collect();

        for tag in known {
            let note_ids = self
                .tags_to_note_ids
                .get_mut(&tag)
                .expect("tag key came from the map");

            if new_tags.contains(&tag) {
                if !note_ids.contains(note_id) {
                    note_ids.push(note_id.clone());
                }
            } else if let Some(position) = note_ids.iter().position(|id| id == note_id) {
                note_ids.remove(position);
            }

            if note_ids.is_empty() {
                self.tags_to_note_ids.remove(&tag);
            }
        }

        for tag in new_tags {
            if !self.tags_to_note_ids.contains_key(tag) {
                self.tags_to_note_ids
                    .insert(tag.clone(), vec![note_id.clone()]);
            }
        }
    }

    /// Removes a tag entry outright.
    ///
    /// The caller is responsible for also stripping the tag from the note
    /// content; this only drops the derived mapping.
    pub fn delete_tag(&mut self, tag: &str) {
        self.tags_to_note_ids.remove(tag);
    }

    /// All known tags.
    pub fn tags(&self) -> Vec<String> {
        self.tags_to_note_ids.keys().cloned().collect()
    }

    /// Unique lower-cased category prefixes across all known tags.
    pub fn categories(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .tags_to_note_ids
            .keys()
            .map(|tag| category_from_tag(tag))
            .collect();
        set.into_iter().collect()
    }

    /// Category → note IDs, the duplicate-suppressed union over all tags
    /// sharing that category.
    pub fn categories_to_note_ids(&self) -> BTreeMap<String, Vec<NoteId>> {
        let mut map: BTreeMap<String, Vec<NoteId>> = BTreeMap::new();
        for category in self.categories() {
            map.insert(category, Vec::new());
        }

        for (tag, note_ids) in &self.tags_to_note_ids {
            let category = category_from_tag(tag);
            if let Some(category_note_ids) = map.get_mut(&category) {
                for note_id in note_ids {
                    if !category_note_ids.contains(note_id) {
                        category_note_ids.push(note_id.clone());
                    }
                }
            }
        }

        map
    }

    /// Note IDs carrying the given tag, in note iteration order.
    pub fn note_ids_with_tag(&self, tag: &str) -> Vec<NoteId> {
        self.tags_to_note_ids.get(tag).cloned().unwrap_or_default()
    }

    /// Note IDs in the given category.
    pub fn note_ids_with_category(&self, category: &str) -> Vec<NoteId> {
        self.categories_to_note_ids()
            .get(category)
            .cloned()
            .unwrap_or_default()
    }

    /// Tags sorted pinned-first, then by descending note count.
    pub fn tags_sorted_by_count(&self) -> Vec<String> {
        let mut tags = self.tags();
        tags.sort_by(|a, b| match (self.is_pinned(a), self.is_pinned(b)) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => self
                .note_ids_with_tag(b)
                .len()
                .cmp(&self.note_ids_with_tag(a).len()),
        });
        tags
    }

    /// Tags sorted pinned-first, then ascending lexicographic.
    pub fn tags_sorted_by_alphabetical(&self) -> Vec<String> {
        let mut tags = self.tags();
        tags.sort_by(|a, b| match (self.is_pinned(a), self.is_pinned(b)) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a.cmp(b),
        });
        tags
    }

    /// Categories sorted pinned-first, then by descending note count.
    pub fn categories_sorted_by_count(&self) -> Vec<String> {
        let rollup = self.categories_to_note_ids();
        let count = |category: &str| rollup.get(category).map_or(0, Vec::len);

        let mut categories = self.categories();
        categories.sort_by(|a, b| match (self.is_pinned(a), self.is_pinned(b)) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => count(b).cmp(&count(a)),
        });
        categories
    }

    /// Currently pinned tags.
    ///
    /// A tag may be pinned while having no notes; pins never filter.
    pub fn pinned_tags(&self) -> Vec<String> {
        self.pinned.iter().cloned().collect()
    }

    /// Replaces the pinned-tag set (used when loading a project).
    pub fn set_pinned_tags(&mut self, tags: &[String]) {
        self.pinned = tags.iter().cloned().collect();
    }

    /// Pins a tag.
    pub fn pin_tag(&mut self, tag: &str) {
        self.pinned.insert(tag.to_string());
    }

    /// Unpins a tag.
    pub fn unpin_tag(&mut self, tag: &str) {
        self.pinned.remove(tag);
    }

    /// Whether the tag is pinned, independent of note membership.
    pub fn is_pinned(&self, tag: &str) -> bool {
        self.pinned.contains(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteBuilder;

    fn note(id: &str, tags: &[&str]) -> Note {
        NoteBuilder::new()
            .id(NoteId::from_string(id))
            .markdown(format!("note {id}\n\n{}", tags.join(" ")))
            .tags(tags.iter().map(|t| t.to_string()).collect())
            .build()
    }

    #[test]
    fn set_notes_builds_exact_union_of_note_tags() {
        let notes = vec![
            note("n1", &["#a", "#b"]),
            note("n2", &["#b"]),
            note("n3", &[]),
        ];

        let mut index = TagIndex::new();
        index.set_notes(&notes);

        assert_eq!(index.tags(), ["#a", "#b"]);
        assert_eq!(index.note_ids_with_tag("#a"), [NoteId::from_string("n1")]);
        assert_eq!(
            index.note_ids_with_tag("#b"),
            [NoteId::from_string("n1"), NoteId::from_string("n2")]
        );
        assert!(index.note_ids_with_tag("#missing").is_empty());
    }

    #[test]
    fn set_notes_is_order_independent() {
        let forward = vec![note("n1", &["#a"]), note("n2", &["#a", "#b"])];
        let reversed: Vec<Note> = forward.iter().rev().cloned().collect();

        let mut index_forward = TagIndex::new();
        index_forward.set_notes(&forward);
        let mut index_reversed = TagIndex::new();
        index_reversed.set_notes(&reversed);

        assert_eq!(index_forward.tags(), index_reversed.tags());
        for tag in index_forward.tags() {
            let mut a = index_forward.note_ids_with_tag(&tag);
            let mut b = index_reversed.note_ids_with_tag(&tag);
            a.sort();
            b.sort();
            assert_eq!(a, b, "membership mismatch for {tag}");
        }
    }

    #[test]
    fn update_note_tags_adds_and_removes_memberships() {
        let mut index = TagIndex::new();
        index.set_notes(&[note("n1", &["#a", "#b"]), note("n2", &["#b"])]);

        // n1 drops #a, keeps #b, gains #c.
        index.update_note_tags(
            &NoteId::from_string("n1"),
            &["#b".to_string(), "#c".to_string()],
        );

        assert_eq!(index.tags(), ["#b", "#c"]);
        assert_eq!(
            index.note_ids_with_tag("#b"),
            [NoteId::from_string("n1"), NoteId::from_string("n2")]
        );
        assert_eq!(index.note_ids_with_tag("#c"), [NoteId::from_string("n1")]);
    }

    #[test]
    fn update_note_tags_deletes_emptied_tags() {
        let mut index = TagIndex::new();
        index.set_notes(&[note("n1", &["#only"])]);

        index.update_note_tags(&NoteId::from_string("n1"), &[]);

        assert!(index.tags().is_empty());
    }

    #[test]
    fn update_note_tags_is_idempotent() {
        let mut index = TagIndex::new();
        index.set_notes(&[note("n1", &["#a"]), note("n2", &["#a", "#b"])]);

        let same = vec!["#a".to_string()];
        index.update_note_tags(&NoteId::from_string("n1"), &same);
        let first: Vec<(String, Vec<NoteId>)> = index
            .tags()
            .into_iter()
            .map(|t| (t.clone(), index.note_ids_with_tag(&t)))
            .collect();

        index.update_note_tags(&NoteId::from_string("n1"), &same);
        let second: Vec<(String, Vec<NoteId>)> = index
            .tags()
            .into_iter()
            .map(|t| (t.clone(), index.note_ids_with_tag(&t)))
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn delete_tag_drops_entry_outright() {
        let mut index = TagIndex::new();
        index.set_notes(&[note("n1", &["#a", "#b"])]);

        index.delete_tag("#a");

        assert_eq!(index.tags(), ["#b"]);
    }

    #[test]
    fn categories_roll_up_hierarchical_tags() {
        let mut index = TagIndex::new();
        index.set_notes(&[
            note("n1", &["#food/recipes"]),
            note("n2", &["#food/restaurants"]),
            note("n3", &["#Journal"]),
        ]);

        assert_eq!(index.categories(), ["#food", "#journal"]);

        let rollup = index.categories_to_note_ids();
        assert_eq!(
            rollup["#food"],
            [NoteId::from_string("n1"), NoteId::from_string("n2")]
        );
        assert_eq!(rollup["#journal"], [NoteId::from_string("n3")]);
    }

    #[test]
    fn category_rollup_suppresses_duplicate_note_ids() {
        // One note carrying two tags of the same category appears once.
        let mut index = TagIndex::new();
        index.set_notes(&[note("n1", &["#food/recipes", "#food/restaurants"])]);

        assert_eq!(
            index.note_ids_with_category("#food"),
            [NoteId::from_string("n1")]
        );
    }

    #[test]
    fn pinned_tags_sort_first_regardless_of_count() {
        let mut index = TagIndex::new();
        index.set_notes(&[
            note("n1", &["#a"]),
            note("n2", &["#b"]),
            note("n3", &["#b"]),
            note("n4", &["#b"]),
            note("n5", &["#b"]),
            note("n6", &["#b"]),
            note("n7", &["#c"]),
            note("n8", &["#c"]),
        ]);
        index.pin_tag("#a");

        // A pinned count 1, B unpinned count 5, C unpinned count 2.
        assert_eq!(index.tags_sorted_by_count(), ["#a", "#b", "#c"]);
    }

    #[test]
    fn alphabetical_sort_puts_pins_first() {
        let mut index = TagIndex::new();
        index.set_notes(&[note("n1", &["#zebra", "#apple", "#mango"])]);
        index.pin_tag("#zebra");

        assert_eq!(
            index.tags_sorted_by_alphabetical(),
            ["#zebra", "#apple", "#mango"]
        );
    }

    #[test]
    fn categories_sorted_by_count_descending() {
        let mut index = TagIndex::new();
        index.set_notes(&[
            note("n1", &["#food/recipes"]),
            note("n2", &["#food/restaurants"]),
            note("n3", &["#journal"]),
        ]);

        assert_eq!(index.categories_sorted_by_count(), ["#food", "#journal"]);
    }

    #[test]
    fn pin_state_is_independent_of_membership() {
        let mut index = TagIndex::new();
        index.pin_tag("#empty");

        assert!(index.is_pinned("#empty"));
        assert_eq!(index.pinned_tags(), ["#empty"]);
        assert!(index.note_ids_with_tag("#empty").is_empty());

        index.unpin_tag("#empty");
        assert!(!index.is_pinned("#empty"));
    }
}
