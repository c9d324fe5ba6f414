//! Markdown parsing into note content blocks.
//!
//! A note body is a sequence of [`ContentBlock`]s: checkbox lists become
//! structured [`ContentBlock::List`] blocks, and everything between them is
//! rendered to HTML as a single [`ContentBlock::Text`] block. Full
//! markdown-to-HTML rendering is an external concern; `render_html` is a
//! small reference renderer covering the shapes notes actually contain
//! (paragraphs, headings, plain lists, raw HTML passthrough).

use crate::models::{ContentBlock, ListItem};

/// Parses tag-free note text into a sequence of content blocks.
///
/// Contiguous checkbox lines (`- [ ] item` / `- [x] item`) form a list
/// block; every other run of lines is rendered to one text block. Empty
/// input yields an empty body.
///
/// # Examples
///
/// ```
/// use jot::markdown::parse_note_content;
/// use jot::ContentBlock;
/// use jot::models::ListItem;
///
/// let body = parse_note_content("Buy milk");
/// assert_eq!(body, vec![ContentBlock::text("<p>Buy milk</p>")]);
///
/// let body = parse_note_content("- [ ] Eggs\n- [x] Milk");
/// assert_eq!(
///     body,
///     vec![ContentBlock::list(vec![
///         ListItem::new("Eggs", false),
///         ListItem::new("Milk", true),
///     ])]
/// );
/// ```
pub fn parse_note_content(text: &str) -> Vec<ContentBlock> {
    let mut blocks: Vec<ContentBlock> = Vec::new();
    let mut text_run: Vec<&str> = Vec::new();
    let mut list_run: Vec<ListItem> = Vec::new();

    let flush_text = |run: &mut Vec<&str>, blocks: &mut Vec<ContentBlock>| {
        let chunk = run.join("\n");
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            blocks.push(ContentBlock::text(render_html(chunk)));
        }
        run.clear();
    };

    let flush_list = |run: &mut Vec<ListItem>, blocks: &mut Vec<ContentBlock>| {
        if !run.is_empty() {
            blocks.push(ContentBlock::list(std::mem::take(run)));
        }
    };

    for line in text.lines() {
        if let Some(item) = parse_checkbox_line(line) {
            flush_text(&mut text_run, &mut blocks);
            list_run.push(item);
        } else {
            flush_list(&mut list_run, &mut blocks);
            text_run.push(line);
        }
    }

    flush_text(&mut text_run, &mut blocks);
    flush_list(&mut list_run, &mut blocks);

    blocks
}

/// Parses a single `- [ ]` / `- [x]` checkbox line, if the line is one.
fn parse_checkbox_line(line: &str) -> Option<ListItem> {
    let trimmed = line.trim_start();
    let rest = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))?;

    let (is_checked, text) = if let Some(text) = rest.strip_prefix("[ ]") {
        (false, text)
    } else if let Some(text) = rest.strip_prefix("[x]").or_else(|| rest.strip_prefix("[X]")) {
        (true, text)
    } else {
        return None;
    };

    Some(ListItem::new(text.trim(), is_checked))
}

/// Renders a markdown chunk to HTML.
///
/// Reference renderer: paragraphs, ATX headings, unordered lists, and raw
/// HTML passthrough. Inline markup is left untouched inside the generated
/// elements, matching how note previews consume the text blocks.
pub fn render_html(markdown: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for chunk in split_on_blank_lines(markdown) {
        let trimmed = chunk.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with('<') {
            // Raw HTML blocks pass through unchanged.
            parts.push(trimmed.to_string());
        } else if let Some(heading) = render_heading(trimmed) {
            parts.push(heading);
        } else if is_plain_list(trimmed) {
            parts.push(render_list(trimmed));
        } else {
            parts.push(format!("<p>{trimmed}</p>"));
        }
    }

    parts.join("\n")
}

fn split_on_blank_lines(text: &str) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                chunks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }

    chunks
}

fn render_heading(chunk: &str) -> Option<String> {
    let level = chunk.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = chunk[level..].strip_prefix(' ')?;
    Some(format!("<h{level}>{}</h{level}>", rest.trim()))
}

fn is_plain_list(chunk: &str) -> bool {
    chunk
        .lines()
        .all(|line| line.trim_start().starts_with("- ") || line.trim_start().starts_with("* "))
}

fn render_list(chunk: &str) -> String {
    let items: Vec<String> = chunk
        .lines()
        .map(|line| {
            let item = line.trim_start();
            let item = item
                .strip_prefix("- ")
                .or_else(|| item.strip_prefix("* "))
                .unwrap_or(item);
            format!("<li>{}</li>", item.trim())
        })
        .collect();

    format!("<ul>\n{}\n</ul>", items.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_markdown_converts_to_empty_body() {
        assert!(parse_note_content("").is_empty());
        assert!(parse_note_content("  \n ").is_empty());
    }

    #[test]
    fn markdown_paragraph_converts_to_text_block() {
        let body = parse_note_content("Paragraph");
        assert_eq!(body, vec![ContentBlock::text("<p>Paragraph</p>")]);
    }

    #[test]
    fn raw_html_passes_through_as_text_block() {
        let markdown = "<h1>Heading</h1><ul><li>Item 1</li><li>Item 2</li></ul>";
        let body = parse_note_content(markdown);
        assert_eq!(body, vec![ContentBlock::text(markdown)]);
    }

    #[test]
    fn checkbox_only_content_converts_to_list_block() {
        let body = parse_note_content("- [ ] Unchecked\n- [x] Checked");
        assert_eq!(
            body,
            vec![ContentBlock::list(vec![
                ListItem::new("Unchecked", false),
                ListItem::new("Checked", true),
            ])]
        );
    }

    #[test]
    fn text_and_checkboxes_convert_to_interleaved_blocks() {
        let markdown = "- [ ] Unchecked\n- [x] Checked\n\nParagraph\n- [x] Checked\n- [ ] Unchecked";

        let body = parse_note_content(markdown);
        assert_eq!(
            body,
            vec![
                ContentBlock::list(vec![
                    ListItem::new("Unchecked", false),
                    ListItem::new("Checked", true),
                ]),
                ContentBlock::text("<p>Paragraph</p>"),
                ContentBlock::list(vec![
                    ListItem::new("Checked", true),
                    ListItem::new("Unchecked", false),
                ]),
            ]
        );
    }

    #[test]
    fn heading_renders_as_heading_element() {
        assert_eq!(render_html("# Title"), "<h1>Title</h1>");
        assert_eq!(render_html("### Sub"), "<h3>Sub</h3>");
        // No space after the marker means no heading.
        assert_eq!(render_html("#tagless"), "<p>#tagless</p>");
    }

    #[test]
    fn plain_list_renders_as_unordered_list() {
        assert_eq!(
            render_html("- one\n- two"),
            "<ul>\n<li>one</li>\n<li>two</li>\n</ul>"
        );
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        assert_eq!(render_html("a\n\nb"), "<p>a</p>\n<p>b</p>");
    }
}
