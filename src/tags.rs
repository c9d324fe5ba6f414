//! Tag extraction and tag string helpers.
//!
//! Tags are `#`-prefixed labels embedded in freeform markdown, optionally
//! hierarchical (`#category/subtag`). Extraction is a single linear pass that
//! splits a text into its tag tokens and the remaining tag-free text.

/// Result of extracting tags out of a body of text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagExtraction {
    /// Extracted tags in encounter order, `#` prefix included.
    pub tags: Vec<String>,
    /// The input with tag tokens excised, trimmed of surrounding whitespace.
    pub text: String,
}

/// Extracts all `#`-prefixed tags from the given text.
///
/// Scanning rules, which the tests below pin down:
/// - a tag starts at `#` only when no tag is in progress and the next
///   character is not `/` (so a literal `#/` run is left in the text);
/// - inside a tag, a further `#` is emitted as a literal `#` into the output
///   text rather than starting a new tag;
/// - a tag ends at a space, newline or end of input;
/// - a bare `#` with nothing accumulated is discarded, not treated as a tag;
/// - at most one whitespace character survives where a tag was excised.
///
/// Markdown headings survive because `# ` terminates immediately as a bare
/// `#`, putting the marker back into the text; a tag stuck to a heading
/// (`# Heading 1#tag`) is still found.
///
/// # Examples
///
/// ```
/// use jot::tags::extract_tags_from_text;
///
/// let result = extract_tags_from_text("Buy milk #groceries");
/// assert_eq!(result.tags, ["#groceries"]);
/// assert_eq!(result.text, "Buy milk");
/// ```
pub fn extract_tags_from_text(text: &str) -> TagExtraction {
    let chars: Vec<char> = text.chars().collect();
    let mut tags: Vec<String> = Vec::new();
    let mut current_tag = String::new();
    let mut text_without_tags = String::new();

    for (index, &c) in chars.iter().enumerate() {
        let tag_started = !current_tag.is_empty();
        let start_new_tag = !tag_started && c == '#' && chars.get(index + 1) != Some(&'/');

        if start_new_tag {
            current_tag.push('#');
        } else if tag_started {
            if c == '#' {
                text_without_tags.push('#');
            } else if c == ' ' || c == '\n' {
                if current_tag != "#" {
                    tags.push(std::mem::take(&mut current_tag));
                    // Only re-add the separator if the text does not already
                    // end in whitespace, so an excised tag leaves at most one.
                    if text_without_tags.trim_end().len() == text_without_tags.len() {
                        text_without_tags.push(c);
                    }
                } else {
                    text_without_tags.push_str(&current_tag);
                    text_without_tags.push(c);
                }
                current_tag.clear();
            } else {
                current_tag.push(c);
            }
        } else {
            text_without_tags.push(c);
        }
    }

    // A trailing bare "#" is discarded like a mid-text one.
    if !current_tag.is_empty() && current_tag != "#" {
        tags.push(current_tag);
    }

    TagExtraction {
        tags,
        text: text_without_tags.trim().to_string(),
    }
}

/// Returns the category of a tag: the portion before the first `/`
/// (or the whole tag when not hierarchical), lower-cased.
///
/// # Examples
///
/// ```
/// use jot::tags::category_from_tag;
///
/// assert_eq!(category_from_tag("#Food/Recipes"), "#food");
/// assert_eq!(category_from_tag("#journal"), "#journal");
/// ```
pub fn category_from_tag(tag: &str) -> String {
    let first_word = tag.split('/').next().unwrap_or(tag);
    first_word.to_lowercase()
}

/// Removes the leading `#` from a tag, if present.
pub fn strip_leading_hash(tag: &str) -> &str {
    tag.strip_prefix('#').unwrap_or(tag)
}

/// Re-joins tag-free text and tags into canonical note markdown:
/// the text, a blank line, then the tags separated by spaces.
pub fn note_markdown(text_without_tags: &str, tags: &[String]) -> String {
    format!("{}\n\n{}", text_without_tags, tags.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_list_is_empty_and_text_unchanged_when_there_are_no_tags() {
        let text = "No tags are present in this text";
        let result = extract_tags_from_text(text);

        assert!(result.tags.is_empty());
        assert_eq!(result.text, text);
    }

    #[test]
    fn extracts_one_tag_from_end_of_text() {
        let text_without_tag = "This is the part without the tag";

        // With whitespace
        let result = extract_tags_from_text(&format!("{text_without_tag} #tag"));
        assert_eq!(result.tags, ["#tag"]);
        assert_eq!(result.text, text_without_tag);

        // Without whitespace
        let result = extract_tags_from_text(&format!("{text_without_tag}#tag"));
        assert_eq!(result.tags, ["#tag"]);
        assert_eq!(result.text, text_without_tag);
    }

    #[test]
    fn extracts_one_tag_from_start_of_text() {
        let text_without_tag = "This is the part without the tag";

        let result = extract_tags_from_text(&format!("#tag {text_without_tag}"));
        assert_eq!(result.tags, ["#tag"]);
        assert_eq!(result.text, text_without_tag);
    }

    #[test]
    fn extracts_one_tag_from_middle_of_text() {
        let text_start = "This is the part";
        let text_end = " without the tag";

        // With whitespace
        let result = extract_tags_from_text(&format!("{text_start} #tag{text_end}"));
        assert_eq!(result.tags, ["#tag"]);
        assert_eq!(result.text, format!("{text_start}{text_end}"));

        // Without whitespace
        let result = extract_tags_from_text(&format!("{text_start}#tag{text_end}"));
        assert_eq!(result.tags, ["#tag"]);
        assert_eq!(result.text, format!("{text_start}{text_end}"));
    }

    #[test]
    fn ignores_hashes_that_are_markdown_heading_syntax() {
        let result = extract_tags_from_text("# Heading 1#tag");
        assert_eq!(result.tags, ["#tag"]);
        assert_eq!(result.text, "# Heading 1");
    }

    #[test]
    fn extracts_multiple_tags_in_encounter_order() {
        let result = extract_tags_from_text("Buy milk #groceries #todo/shopping");
        assert_eq!(result.tags, ["#groceries", "#todo/shopping"]);
        assert_eq!(result.text, "Buy milk");
    }

    #[test]
    fn tag_terminated_by_newline() {
        // The space before the tag survives; the terminating newline is
        // dropped because the text already ends in whitespace.
        let result = extract_tags_from_text("line one #tag\nline two");
        assert_eq!(result.tags, ["#tag"]);
        assert_eq!(result.text, "line one line two");
    }

    #[test]
    fn bare_hash_is_discarded() {
        let result = extract_tags_from_text("a # b");
        assert!(result.tags.is_empty());
        assert_eq!(result.text, "a # b");

        // Trailing bare hash is discarded too.
        let result = extract_tags_from_text("a #");
        assert!(result.tags.is_empty());
        assert_eq!(result.text, "a");
    }

    #[test]
    fn hash_slash_does_not_start_a_tag() {
        let result = extract_tags_from_text("see #/notes/path");
        assert!(result.tags.is_empty());
        assert_eq!(result.text, "see #/notes/path");
    }

    #[test]
    fn double_hash_inside_tag_becomes_literal_text() {
        // Once a tag has started, a second '#' is pushed into the text.
        let result = extract_tags_from_text("a ##tag");
        assert_eq!(result.tags, ["#tag"]);
        assert_eq!(result.text, "a #");
    }

    #[test]
    fn roundtrip_markdown_re_derives_same_tags() {
        let extraction = extract_tags_from_text("Buy milk #groceries #todo/shopping");
        let markdown = note_markdown(&extraction.text, &extraction.tags);

        let again = extract_tags_from_text(&markdown);
        assert_eq!(again.tags, extraction.tags);
        assert_eq!(again.text, extraction.text);
    }

    #[test]
    fn category_is_prefix_before_slash_lowercased() {
        assert_eq!(category_from_tag("#Food/Recipes"), "#food");
        assert_eq!(category_from_tag("#food"), "#food");
        assert_eq!(category_from_tag("#Food"), "#food");
    }

    #[test]
    fn strip_leading_hash_handles_both_forms() {
        assert_eq!(strip_leading_hash("#tag"), "tag");
        assert_eq!(strip_leading_hash("tag"), "tag");
    }
}
