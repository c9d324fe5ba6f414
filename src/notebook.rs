//! The note store: canonical note collection plus derived tag state.
//!
//! Every mutation passes through [`Notebook`]: tags and body are re-derived
//! from markdown, the tag index is patched, and the project store is asked to
//! persist. Reads go through the query surface (`displayed_notes`, tag and
//! category views) so the UI never touches raw collections.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;

use crate::index::TagIndex;
use crate::markdown::parse_note_content;
use crate::models::{Author, Note, NoteBuilder, NoteId, TagSummaryItem};
use crate::storage::ProjectStore;
use crate::tags::{extract_tags_from_text, note_markdown, strip_leading_hash};

/// Single source of truth for the note collection.
///
/// Owns the notes, the derived [`TagIndex`], tag summaries, and the display
/// filters. Collaborators are constructor-injected; there is no ambient
/// registry. Operations on unknown note IDs are silent no-ops.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use jot::notebook::Notebook;
/// use jot::storage::SqliteStore;
/// use jot::Author;
///
/// # fn main() -> anyhow::Result<()> {
/// let store = Arc::new(SqliteStore::in_memory("p1")?);
/// let mut notebook = Notebook::new(store);
///
/// let id = notebook.add_note("Buy milk #groceries", Author::User, "")?;
/// assert_eq!(notebook.get_note(&id).unwrap().tags, ["#groceries"]);
/// # Ok(())
/// # }
/// ```
pub struct Notebook {
    notes: Vec<Note>,
    index: TagIndex,
    tag_summaries: BTreeMap<String, String>,
    selected_tag: Option<String>,
    ids_to_display: Vec<NoteId>,
    store: Arc<dyn ProjectStore>,
}

impl Notebook {
    /// Creates an empty notebook persisting through the given store.
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self {
            notes: Vec::new(),
            index: TagIndex::new(),
            tag_summaries: BTreeMap::new(),
            selected_tag: None,
            ids_to_display: Vec::new(),
            store,
        }
    }

    fn save(&self) -> Result<()> {
        self.store.save_notes(&self.notes)?;
        self.store.save_pinned_tags(&self.index.pinned_tags())?;
        self.store.save_tag_summaries(&self.tag_summaries_list())?;
        Ok(())
    }

    /// All notes in insertion order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Looks up a note by ID.
    pub fn get_note(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| &note.id == id)
    }

    fn get_note_mut(&mut self, id: &NoteId) -> Option<&mut Note> {
        self.notes.iter_mut().find(|note| &note.id == id)
    }

    /// Read-only view of the derived tag index.
    pub fn index(&self) -> &TagIndex {
        &self.index
    }

    /// Replaces the whole note collection and rebuilds the index.
    ///
    /// Used when loading or importing a project; does not persist by itself.
    pub fn set_notes(&mut self, notes: Vec<Note>) {
        self.notes = notes;
        self.index.set_notes(&self.notes);
    }

    /// Appends imported notes to the existing collection and persists.
    pub fn import_notes(&mut self, notes: Vec<Note>) -> Result<()> {
        self.notes.extend(notes);
        self.index.set_notes(&self.notes);
        self.save()
    }

    /// Replaces notes, pinned tags, and tag summaries wholesale and persists.
    /// Used when loading a whole project from an export document.
    pub fn restore(
        &mut self,
        notes: Vec<Note>,
        pinned_tags: &[String],
        tag_summaries: Vec<TagSummaryItem>,
    ) -> Result<()> {
        self.notes = notes;
        self.index.set_notes(&self.notes);
        self.index.set_pinned_tags(pinned_tags);
        self.set_tag_summaries(tag_summaries);
        self.save()
    }

    /// Clears all notes and tag summaries.
    pub fn clear_notes(&mut self) -> Result<()> {
        self.notes.clear();
        self.tag_summaries.clear();
        self.index.set_notes(&[]);
        self.save()
    }

    /// Creates a note from raw content: extracts tags, derives body blocks,
    /// stores canonical markdown, and patches the index.
    pub fn add_note(&mut self, content: &str, author: Author, title: &str) -> Result<NoteId> {
        let extraction = extract_tags_from_text(content);
        let body = parse_note_content(&extraction.text);
        let markdown = note_markdown(&extraction.text, &extraction.tags);

        let note = NoteBuilder::new()
            .author(author)
            .title(title)
            .markdown(markdown)
            .tags(extraction.tags.clone())
            .body(body)
            .build();
        let id = note.id.clone();

        self.notes.push(note);
        self.index.update_note_tags(&id, &extraction.tags);

        self.save()?;
        Ok(id)
    }

    /// Stores an already-structured note as-is (import path; no extraction).
    pub fn add_imported_note(&mut self, note: Note) -> Result<NoteId> {
        let id = note.id.clone();
        let tags = note.tags.clone();

        self.notes.push(note);
        self.index.update_note_tags(&id, &tags);

        self.save()?;
        Ok(id)
    }

    /// Replaces a note's content, re-deriving tags/body/markdown and bumping
    /// the modified timestamp. Unknown IDs are a no-op.
    pub fn update_note_body(&mut self, id: &NoteId, content: &str) -> Result<()> {
        let extraction = extract_tags_from_text(content);

        if let Some(note) = self.get_note_mut(id) {
            note.body = parse_note_content(&extraction.text);
            note.markdown = note_markdown(&extraction.text, &extraction.tags);
            note.tags = extraction.tags.clone();
            note.date_modified = time::OffsetDateTime::now_utc();

            self.index.update_note_tags(id, &extraction.tags);
        }

        self.save()
    }

    /// Sets a note's title. Unknown IDs are a no-op.
    pub fn update_note_title(&mut self, id: &NoteId, title: &str) -> Result<()> {
        if let Some(note) = self.get_note_mut(id) {
            note.title = title.to_string();
        }
        self.save()
    }

    /// Sets a note's creation date. Unknown IDs are a no-op.
    pub fn update_note_date_created(&mut self, id: &NoteId, date: time::OffsetDateTime) -> Result<()> {
        if let Some(note) = self.get_note_mut(id) {
            note.date_created = date;
        }
        self.save()
    }

    /// Sets a note's modification date. Unknown IDs are a no-op.
    pub fn update_note_date_modified(&mut self, id: &NoteId, date: time::OffsetDateTime) -> Result<()> {
        if let Some(note) = self.get_note_mut(id) {
            note.date_modified = date;
        }
        self.save()
    }

    /// Appends tags to an existing note, additively: existing tags are kept,
    /// the markdown gains the new tags on a fresh line, and the index is
    /// patched. Unknown IDs are a no-op.
    pub fn add_tags_to_note(&mut self, id: &NoteId, tags: &[String]) -> Result<()> {
        let updated = if let Some(note) = self.get_note_mut(id) {
            note.markdown.push('\n');
            note.markdown.push_str(&tags.join(" "));
            note.tags.extend(tags.iter().cloned());
            Some(note.tags.clone())
        } else {
            None
        };

        if let Some(all_tags) = updated {
            self.index.update_note_tags(id, &all_tags);
        }

        self.save()
    }

    /// Deletes a note. Its tag memberships are cleared from the index first
    /// so no dangling references remain; tags left empty disappear.
    pub fn delete_note(&mut self, id: &NoteId) -> Result<()> {
        if let Some(position) = self.notes.iter().position(|note| &note.id == id) {
            if !self.notes[position].tags.is_empty() {
                self.index.update_note_tags(id, &[]);
            }
            self.notes.remove(position);
        }

        self.save()
    }

    /// Deletes a tag across the whole notebook: strips it from every note's
    /// tag list and markdown, then drops the index entry.
    pub fn delete_tag(&mut self, tag: &str) -> Result<()> {
        for note in &mut self.notes {
            if let Some(position) = note.tags.iter().position(|t| t == tag) {
                note.tags.remove(position);

                // Keep markdown canonical: tag-free text followed by the
                // remaining tags.
                let extraction = extract_tags_from_text(&note.markdown);
                note.markdown = note_markdown(&extraction.text, &note.tags);
            }
        }

        self.index.delete_tag(tag);
        self.save()
    }

    // --- Display filtering ---

    /// Sets the explicit allow-list of note IDs to display. Takes precedence
    /// over the selected-tag filter while non-empty.
    pub fn set_ids_to_display(&mut self, ids: Vec<NoteId>) {
        self.ids_to_display = ids;
    }

    /// Sets or clears the selected tag filter.
    pub fn set_selected_tag(&mut self, tag: Option<String>) {
        self.selected_tag = tag;
    }

    /// The currently selected tag, if any.
    pub fn selected_tag(&self) -> Option<&str> {
        self.selected_tag.as_deref()
    }

    /// The filtered note view: the ID allow-list when non-empty, else notes
    /// matching the selected tag's category prefix, else every note.
    pub fn displayed_notes(&self) -> Vec<&Note> {
        if !self.ids_to_display.is_empty() {
            return self
                .notes
                .iter()
                .filter(|note| self.ids_to_display.contains(&note.id))
                .collect();
        }

        if let Some(selected) = self.selected_tag.as_deref() {
            let prefix = strip_leading_hash(selected).to_lowercase();
            return self
                .notes
                .iter()
                .filter(|note| {
                    note.tags
                        .iter()
                        .any(|tag| strip_leading_hash(tag).to_lowercase().starts_with(&prefix))
                })
                .collect();
        }

        self.notes.iter().collect()
    }

    // --- Tag and category views ---

    /// All tags, alphabetical with pins first.
    pub fn tags(&self) -> Vec<String> {
        self.index.tags_sorted_by_alphabetical()
    }

    /// All categories, by descending note count with pins first.
    pub fn categories(&self) -> Vec<String> {
        self.index.categories_sorted_by_count()
    }

    /// Tags sharing the selected tag's prefix, by descending note count.
    pub fn related_tags(&self) -> Vec<String> {
        let Some(selected) = self.selected_tag.as_deref() else {
            return Vec::new();
        };
        let prefix = strip_leading_hash(selected);

        let mut related: Vec<String> = self
            .tags()
            .into_iter()
            .filter(|tag| strip_leading_hash(tag).starts_with(prefix))
            .collect();
        related.sort_by(|a, b| self.tag_count(b).cmp(&self.tag_count(a)));
        related
    }

    /// Tags whose lower-cased form starts with the given category.
    pub fn tags_with_category(&self, category: &str) -> Vec<String> {
        let prefix = strip_leading_hash(category).to_lowercase();
        self.tags()
            .into_iter()
            .filter(|tag| strip_leading_hash(tag).to_lowercase().starts_with(&prefix))
            .collect()
    }

    /// Number of notes carrying the tag.
    pub fn tag_count(&self, tag: &str) -> usize {
        self.index.note_ids_with_tag(tag).len()
    }

    /// Number of notes in the category.
    pub fn category_count(&self, category: &str) -> usize {
        self.index.note_ids_with_category(category).len()
    }

    /// Note IDs carrying the tag.
    pub fn note_ids_with_tag(&self, tag: &str) -> Vec<NoteId> {
        self.index.note_ids_with_tag(tag)
    }

    /// Note IDs in the category.
    pub fn note_ids_with_category(&self, category: &str) -> Vec<NoteId> {
        self.index.note_ids_with_category(category)
    }

    // --- Pinned tags ---

    /// Pins a tag (display ordering only, never filtering).
    pub fn pin_tag(&mut self, tag: &str) -> Result<()> {
        self.index.pin_tag(tag);
        self.save()
    }

    /// Unpins a tag.
    pub fn unpin_tag(&mut self, tag: &str) -> Result<()> {
        self.index.unpin_tag(tag);
        self.save()
    }

    /// Replaces the pinned-tag set (load path; does not persist by itself).
    pub fn set_pinned_tags(&mut self, tags: &[String]) {
        self.index.set_pinned_tags(tags);
    }

    // --- Tag summaries ---

    /// The generated summary for a tag, or empty when none exists.
    pub fn tag_summary(&self, tag: &str) -> String {
        self.tag_summaries.get(tag).cloned().unwrap_or_default()
    }

    /// Sets (or invalidates, with an empty string) a tag's summary.
    pub fn set_tag_summary(&mut self, tag: &str, summary: &str) -> Result<()> {
        self.tag_summaries
            .insert(tag.to_string(), summary.to_string());
        self.save()
    }

    /// Tag summaries as a persistable list.
    pub fn tag_summaries_list(&self) -> Vec<TagSummaryItem> {
        self.tag_summaries
            .iter()
            .map(|(tag, summary)| TagSummaryItem {
                tag: tag.clone(),
                summary: summary.clone(),
            })
            .collect()
    }

    /// Replaces all tag summaries (load path; does not persist by itself).
    pub fn set_tag_summaries(&mut self, items: Vec<TagSummaryItem>) {
        self.tag_summaries = items
            .into_iter()
            .map(|item| (item.tag, item.summary))
            .collect();
    }

    /// The raw tag → summary map, used as fallback chat context.
    pub fn tag_summary_map(&self) -> &BTreeMap<String, String> {
        &self.tag_summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentBlock;
    use crate::storage::SqliteStore;

    fn notebook() -> Notebook {
        let store = Arc::new(SqliteStore::in_memory("test").unwrap());
        Notebook::new(store)
    }

    #[test]
    fn add_note_extracts_tags_and_derives_body() {
        let mut notebook = notebook();

        let id = notebook
            .add_note("Buy milk #groceries", Author::User, "")
            .unwrap();

        let note = notebook.get_note(&id).unwrap();
        assert_eq!(note.tags, ["#groceries"]);
        assert_eq!(note.markdown, "Buy milk\n\n#groceries");
        assert_eq!(note.body, vec![ContentBlock::text("<p>Buy milk</p>")]);

        assert_eq!(notebook.note_ids_with_tag("#groceries"), [id.clone()]);
        assert_eq!(notebook.note_ids_with_category("#groceries"), [id]);
    }

    #[test]
    fn stored_tags_always_match_re_extraction_of_markdown() {
        let mut notebook = notebook();
        let id = notebook
            .add_note("# Heading 1#tag", Author::User, "")
            .unwrap();

        let note = notebook.get_note(&id).unwrap();
        let re_extracted = extract_tags_from_text(&note.markdown);
        assert_eq!(re_extracted.tags, note.tags);
        assert_eq!(note.tags, ["#tag"]);
    }

    #[test]
    fn update_note_body_re_derives_everything() {
        let mut notebook = notebook();
        let id = notebook.add_note("Old text #old", Author::User, "").unwrap();

        notebook.update_note_body(&id, "New text #new").unwrap();

        let note = notebook.get_note(&id).unwrap();
        assert_eq!(note.tags, ["#new"]);
        assert_eq!(note.markdown, "New text\n\n#new");
        assert!(notebook.note_ids_with_tag("#old").is_empty());
        assert_eq!(notebook.note_ids_with_tag("#new"), [id]);
    }

    #[test]
    fn update_note_body_on_unknown_id_is_a_no_op() {
        let mut notebook = notebook();
        notebook
            .update_note_body(&NoteId::from_string("ghost"), "text")
            .unwrap();
        assert!(notebook.notes().is_empty());
    }

    #[test]
    fn add_tags_to_note_is_additive() {
        let mut notebook = notebook();
        let id = notebook
            .add_note("Pasta recipe #food", Author::User, "")
            .unwrap();

        notebook
            .add_tags_to_note(&id, &["#food/italian".to_string()])
            .unwrap();

        let note = notebook.get_note(&id).unwrap();
        assert_eq!(note.tags, ["#food", "#food/italian"]);
        assert!(note.markdown.ends_with("#food/italian"));
        assert_eq!(notebook.note_ids_with_tag("#food/italian"), [id]);
    }

    #[test]
    fn delete_note_clears_tag_memberships_first() {
        let mut notebook = notebook();
        let keep = notebook.add_note("keep #shared", Author::User, "").unwrap();
        let gone = notebook
            .add_note("gone #shared #solo", Author::User, "")
            .unwrap();

        notebook.delete_note(&gone).unwrap();

        assert!(notebook.get_note(&gone).is_none());
        assert_eq!(notebook.note_ids_with_tag("#shared"), [keep]);
        // A tag that only the deleted note had disappears entirely.
        assert!(!notebook.tags().contains(&"#solo".to_string()));
    }

    #[test]
    fn delete_tag_strips_tag_from_notes_and_markdown() {
        let mut notebook = notebook();
        let id = notebook
            .add_note("Dinner ideas #food #todo", Author::User, "")
            .unwrap();

        notebook.delete_tag("#todo").unwrap();

        let note = notebook.get_note(&id).unwrap();
        assert_eq!(note.tags, ["#food"]);
        assert_eq!(note.markdown, "Dinner ideas\n\n#food");
        assert!(!notebook.tags().contains(&"#todo".to_string()));
    }

    #[test]
    fn displayed_notes_unfiltered_returns_everything() {
        let mut notebook = notebook();
        notebook.add_note("one #a", Author::User, "").unwrap();
        notebook.add_note("two #b", Author::User, "").unwrap();

        assert_eq!(notebook.displayed_notes().len(), 2);
    }

    #[test]
    fn displayed_notes_allow_list_takes_precedence() {
        let mut notebook = notebook();
        let shown = notebook.add_note("one #a", Author::User, "").unwrap();
        notebook.add_note("two #b", Author::User, "").unwrap();

        notebook.set_selected_tag(Some("#b".to_string()));
        notebook.set_ids_to_display(vec![shown.clone()]);

        let displayed = notebook.displayed_notes();
        assert_eq!(displayed.len(), 1);
        assert_eq!(displayed[0].id, shown);
    }

    #[test]
    fn displayed_notes_selected_tag_matches_category_prefix() {
        let mut notebook = notebook();
        let recipes = notebook
            .add_note("carbonara #Food/Recipes", Author::User, "")
            .unwrap();
        notebook.add_note("run #exercise", Author::User, "").unwrap();

        notebook.set_selected_tag(Some("#food".to_string()));

        let displayed = notebook.displayed_notes();
        assert_eq!(displayed.len(), 1);
        assert_eq!(displayed[0].id, recipes);
    }

    #[test]
    fn set_notes_rebuilds_index_wholesale() {
        let mut notebook = notebook();
        notebook.add_note("stale #old", Author::User, "").unwrap();

        let replacement = NoteBuilder::new()
            .id(NoteId::from_string("n1"))
            .markdown("fresh\n\n#new")
            .tags(vec!["#new".to_string()])
            .build();
        notebook.set_notes(vec![replacement]);

        assert_eq!(notebook.tags(), ["#new"]);
        assert!(notebook.note_ids_with_tag("#old").is_empty());
    }

    #[test]
    fn clear_notes_also_clears_summaries() {
        let mut notebook = notebook();
        notebook.add_note("x #a", Author::User, "").unwrap();
        notebook.set_tag_summary("a", "a summary").unwrap();

        notebook.clear_notes().unwrap();

        assert!(notebook.notes().is_empty());
        assert!(notebook.tags().is_empty());
        assert!(notebook.tag_summary("a").is_empty());
    }

    #[test]
    fn tag_summary_lifecycle() {
        let mut notebook = notebook();
        assert!(notebook.tag_summary("food").is_empty());

        notebook.set_tag_summary("food", "All about food").unwrap();
        assert_eq!(notebook.tag_summary("food"), "All about food");

        // Invalidation before regeneration sets the summary to empty.
        notebook.set_tag_summary("food", "").unwrap();
        assert!(notebook.tag_summary("food").is_empty());
    }

    #[test]
    fn related_tags_share_selected_prefix() {
        let mut notebook = notebook();
        notebook.add_note("a #food/recipes", Author::User, "").unwrap();
        notebook.add_note("b #food/recipes", Author::User, "").unwrap();
        notebook.add_note("c #food", Author::User, "").unwrap();
        notebook.add_note("d #exercise", Author::User, "").unwrap();

        notebook.set_selected_tag(Some("#food".to_string()));

        assert_eq!(notebook.related_tags(), ["#food/recipes", "#food"]);
    }

    #[test]
    fn notebook_state_persists_through_store() {
        let store = Arc::new(SqliteStore::in_memory("p1").unwrap());
        let mut notebook = Notebook::new(store.clone());
        notebook.add_note("Buy milk #groceries", Author::User, "").unwrap();
        notebook.pin_tag("#groceries").unwrap();

        let saved_notes = store.load_notes().unwrap().unwrap();
        assert_eq!(saved_notes.len(), 1);
        assert_eq!(store.load_pinned_tags().unwrap().unwrap(), ["#groceries"]);
    }
}
