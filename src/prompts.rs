//! Prompt construction and response parsing for every model interaction.
//!
//! Each operation is a pure pair: a `make_*_prompt` function assembling the
//! prompt text plus stop token, and a `parse_*_response` function turning the
//! raw model text into structured data. Nothing here touches the network or
//! any state, which keeps the pairs trivially testable.

use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::models::{ChatMessage, Note};

/// Tags injected by the app itself, never suggested back to the model.
const SYSTEM_TAGS: &[&str] = &["#chatHistory"];

/// Starter tags offered alongside the project's own when none exist yet.
const DEFAULT_TAGS: &[&str] = &["#readingList", "#journal", "#todo"];

/// A prompt ready to send: the text and the token generation stops at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub stop_token: String,
}

const DATE_FORMAT: &[FormatItem<'static>] = format_description!(
    "[month repr:short] [day padding:none], [hour repr:12 padding:none]:[minute] [period]"
);

/// Formats a timestamp the way notes are dated inside prompts, for example
/// `Mar 4, 2:05 PM`.
pub fn format_prompt_date(date: OffsetDateTime) -> String {
    date.format(DATE_FORMAT).unwrap_or_default()
}

/// Strips a single leading and trailing delimiter (if present), splits on
/// commas, trims whitespace, and drops empty entries.
fn parse_delimited_list(response: &str, open: char, close: char) -> Vec<String> {
    if response.is_empty() {
        return Vec::new();
    }

    let mut response = response;
    if let Some(rest) = response.strip_prefix(open) {
        response = rest;
    }
    if let Some(rest) = response.strip_suffix(close) {
        response = rest;
    }

    response
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builds the tag-suggestion prompt: existing tags merged with the defaults,
/// minus system tags and duplicates, followed by the note content.
pub fn make_tags_from_content_prompt(content: &str, tags: &[String], title: &str) -> Prompt {
    let mut prompt_tags: Vec<&str> = Vec::new();
    for tag in tags.iter().map(String::as_str).chain(DEFAULT_TAGS.iter().copied()) {
        if SYSTEM_TAGS.contains(&tag) || prompt_tags.contains(&tag) {
            continue;
        }
        prompt_tags.push(tag);
    }

    let text = format!(
        "\n[Current Tags]\n{{ {tags} }}\n\n[Note]\n{title}\n{content}\n\n[Instructions]\n\
Based on the content in New Note select 1-3 of most relevant subject matter Tags that best \
represents the note content. Try to use Current Tags but create new tags if necessary. Don't \
repeat content tags that are close to one another. Don't use overly specific tags just for this \
note.\nFor short, couple line, notes try to use only one tag, but for longer notes use more tags. \
Alway use camel casing for tags, and always use singular (not plural) tags. \n\n\
Make all of these hierarchical tags, in the format #category/tag.\n\n\
Please answer with the following format: {{ #category/tag1, #category/tag2, ... }}\n\n\
[Content Tags]\n{{",
        tags = prompt_tags.join(", "),
    );

    Prompt {
        text,
        stop_token: "}".to_string(),
    }
}

/// Tag list out of a `{ #a, #b }` style response.
pub fn parse_tags_from_content_response(response: &str) -> Vec<String> {
    parse_delimited_list(response, '{', '}')
}

/// Builds the note-selection prompt: every note with its ID, title, creation
/// date, and markdown, followed by the latest chat request.
pub fn make_relevant_notes_prompt(chats: &[ChatMessage], notes: &[Note]) -> Prompt {
    let last_chat = chats.last().map(|chat| chat.body.as_str()).unwrap_or("");

    let mut notes_string = String::new();
    for note in notes {
        notes_string.push_str(&format!(
            "-- Note {id} -- \n{title} \n {date} \n {markdown} \n\n",
            id = note.id,
            title = note.title,
            date = format_prompt_date(note.date_created),
            markdown = note.markdown,
        ));
    }

    let text = format!(
        "[All Notes]\n{notes_string}\n\n[Chat Request]\n{last_chat}\n\n[Instructions]\n\
Look at All Notes and Chat Request above and pick any number of Relevant Notes that match the \
Chat Request. \nAnswer with an ordered list: {{ \"Note 42234\", \"Note 195654-2123\", ... }}\n\
If none of the notes are relevant, it's okay to answer {{ }}. Don't include the content of the \
note, just the Note ID in the response.\n\n[Relevant Notes]\n{{",
    );

    Prompt {
        text,
        stop_token: "}".to_string(),
    }
}

/// Note IDs out of a `{ "Note id1", "Note id2" }` style response. Strips the
/// `Note ` prefix and any quote characters from each entry.
pub fn parse_relevant_notes_response(response: &str) -> Vec<String> {
    parse_delimited_list(response, '{', '}')
        .into_iter()
        .map(|value| value.replacen("Note ", "", 1).replace('"', ""))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Builds the grounded chat prompt: the running conversation, the relevant
/// note texts (falling back to tag summaries when none were selected), and
/// the latest user request.
pub fn make_chat_prompt_from_relevant_notes(
    chats: &[ChatMessage],
    note_texts: &[String],
    tag_summaries: &std::collections::BTreeMap<String, String>,
) -> Prompt {
    let mut chat_string = String::new();
    for chat in chats {
        let speaker = match chat.author {
            crate::models::Author::System => "Model: ",
            crate::models::Author::User => "User: ",
        };
        chat_string.push_str(&format!("{speaker}{}\n\n", chat.body));
    }

    let mut notes_string = String::new();
    for text in note_texts {
        notes_string.push_str(&format!("-- Note -- \n{text} \n\n"));
    }
    if notes_string.is_empty() {
        for (tag, summary) in tag_summaries {
            notes_string.push_str(&format!("-- {tag} -- \n {summary}"));
        }
    }

    let last_chat = chats.last().map(|chat| chat.body.as_str()).unwrap_or("");

    let text = format!(
        "[Instructions]\nAnswer the latest users request throughly and contextually based on \
Relevant Notes, previous conversation, and general knowledge (in this order). Answer questions \
with short markdown responses.\n\n[Previous Conversation]\n{chat_string}\n[Relevant Notes]\n\
{notes_string}\n[User Request]\nUser: {last_chat}\n\nModel:",
    );

    Prompt {
        text,
        stop_token: "User:".to_string(),
    }
}

/// Builds the tag-summary prompt: a worked `#grocery` example followed by the
/// tag's notes, asking for a markdown summary with note-ID backlinks.
pub fn make_tag_summary_prompt(notes: &[Note], tag: &str) -> Prompt {
    let mut notes_string = String::new();
    for note in notes {
        notes_string.push_str(&format!(
            "-- Note {id} -- \n{title} \n{markdown} \n\n",
            id = note.id,
            title = note.title,
            markdown = note.markdown,
        ));
    }

    let text = format!(
        "[EXAMPLE]\n\n[Instructions]\nYou're a summary agent that looks at the #history Notes \
and make a high-level summary across the notes that includes details about the topic, including \
details extracted from each note. Write a brief and concise few sentences in the Tag Summary \
because the full note will be shown after the summary. Use markdown to make the notes more \
readable.\n\n[#grocery Notes]\n-- Note 0a7f6708-8f32-49c6-9c60-32fc3f2e8503 --\nRegular Items:\n\
\n- Fresh Fruit\n\nLast Minute Additions:\n\n- Mixed Drinks\n#grocery\n\n\
-- Note 00c5b342-c878-472e-8836-c268f822e3a1 --\n\n- Remember to check for ripe and fresh \
fruit.\n- Pick up your favorite flavor of cottage cheese.\n\n#shopping #grocery\n\n\
[#grocery Summary] \n{{ These notes contain regular **grocery items** and some last minute \
additions. \nItems include:\n- Fresh Fruit \
[(note)](#/notes/?noteId=00c5b342-c878-472e-8836-c268f822e3a1)\n- Cottage Cheese \
[(note)](#/notes/?noteId=00c5b342-c878-472e-8836-c268f822e3a1) \n- Mixed drinks \
[(note)](#/notes/?noteId=0a7f6708-8f32-49c6-9c60-32fc3f2e8503) }}\n\n[EXAMPLE]\n\n\
[Instructions]\nYou're a summary agent that looks at the #{tag} Notes and make a high-level \
summary across the notes that includes details about the topic, including details extracted \
from each note. Write a brief and concise few sentences in the Tag Summary because the full \
note will be shown after the summary. Use markdown to make the notes more readable, bolding \
the most important and meaningful words, key words, proper nouns.\n\nInclude the relevant note \
ids as markdown links.\n\n[#{tag} Notes]\n{notes_string}[#{tag} Summary] \n{{",
    );

    Prompt {
        text,
        stop_token: "}".to_string(),
    }
}

/// Summary text out of a `{ ... }` style response.
pub fn parse_tag_summary_response(response: &str) -> String {
    let mut response = response;
    if let Some(rest) = response.strip_prefix('{') {
        response = rest;
    }
    if let Some(rest) = response.strip_suffix('}') {
        response = rest;
    }
    response.to_string()
}

/// Builds the short-title prompt for a body of content.
pub fn make_title_from_content_prompt(content: &str) -> Prompt {
    let text = format!(
        "\n[Note]\n{content}\n\n[Instructions]\nBased on the content in New Note, please \
generate a suitable title that is 1-6 words long.\n\n[Title]\n{{",
    );

    Prompt {
        text,
        stop_token: "}".to_string(),
    }
}

/// Builds the relevant-tags prompt for a free-text query.
pub fn make_relevant_tags_prompt(query: &str, tags: &[String]) -> Prompt {
    let text = format!(
        "Here are all existing tags: {tags}.\n  What are the top 2-3 relevant existing tags \
for this query: {query}\n  Please format them in this format: [#tag1,#tag2]\n  The relevant \
tags are: [\n  ",
        tags = tags.join(", "),
    );

    Prompt {
        text,
        stop_token: "]".to_string(),
    }
}

/// Tag list out of a `[#a,#b]` style response.
pub fn parse_relevant_tags_response(response: &str) -> Vec<String> {
    parse_delimited_list(response, '[', ']')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, ChatId, ChatMessage, NoteBuilder, NoteId};
    use time::macros::datetime;

    fn message(author: Author, body: &str) -> ChatMessage {
        ChatMessage {
            id: ChatId::generate(),
            author,
            body: body.to_string(),
            date_created: OffsetDateTime::now_utc(),
            referenced_note_ids: None,
            created_note_id: None,
        }
    }

    #[test]
    fn format_prompt_date_is_short_and_twelve_hour() {
        let date = datetime!(2024-03-04 14:05 UTC);
        assert_eq!(format_prompt_date(date), "Mar 4, 2:05 PM");
    }

    #[test]
    fn tags_prompt_merges_defaults_and_filters_system_tags() {
        let tags = vec![
            "#food".to_string(),
            "#chatHistory".to_string(),
            "#todo".to_string(),
        ];
        let prompt = make_tags_from_content_prompt("note body", &tags, "");

        assert!(prompt.text.contains("{ #food, #todo, #readingList, #journal }"));
        assert!(!prompt.text.contains("#chatHistory"));
        assert_eq!(prompt.stop_token, "}");
    }

    #[test]
    fn tags_prompt_includes_title_and_content() {
        let prompt = make_tags_from_content_prompt("the body", &[], "The Title");
        assert!(prompt.text.contains("[Note]\nThe Title\nthe body"));
    }

    #[test]
    fn parse_tags_response_strips_braces_and_trims() {
        assert_eq!(
            parse_tags_from_content_response(" #food/recipes, #home/chores }"),
            ["#food/recipes", "#home/chores"]
        );
    }

    #[test]
    fn parse_tags_response_empty_input_is_empty() {
        assert!(parse_tags_from_content_response("").is_empty());
        assert!(parse_tags_from_content_response("{ }").is_empty());
    }

    #[test]
    fn relevant_notes_prompt_lists_every_note_with_id() {
        let note = NoteBuilder::new()
            .id(NoteId::from_string("n-42"))
            .title("Milk")
            .markdown("Buy milk\n\n#groceries")
            .build();
        let chats = vec![message(Author::User, "what should I buy?")];

        let prompt = make_relevant_notes_prompt(&chats, &[note]);

        assert!(prompt.text.contains("-- Note n-42 --"));
        assert!(prompt.text.contains("[Chat Request]\nwhat should I buy?"));
        assert_eq!(prompt.stop_token, "}");
    }

    #[test]
    fn parse_relevant_notes_response_strips_note_prefix_and_quotes() {
        assert_eq!(
            parse_relevant_notes_response(" \"Note 42234\", \"Note 195654-2123\" }"),
            ["42234", "195654-2123"]
        );
    }

    #[test]
    fn parse_relevant_notes_response_empty_is_empty() {
        assert!(parse_relevant_notes_response("").is_empty());
        assert!(parse_relevant_notes_response(" }").is_empty());
    }

    #[test]
    fn chat_prompt_labels_speakers_and_stops_on_user() {
        let chats = vec![
            message(Author::User, "hello"),
            message(Author::System, "hi"),
            message(Author::User, "what did I note about milk?"),
        ];
        let notes = vec!["Buy milk\n\n#groceries".to_string()];

        let prompt =
            make_chat_prompt_from_relevant_notes(&chats, &notes, &Default::default());

        assert!(prompt.text.contains("User: hello"));
        assert!(prompt.text.contains("Model: hi"));
        assert!(prompt.text.contains("-- Note -- \nBuy milk"));
        assert!(prompt
            .text
            .ends_with("User: what did I note about milk?\n\nModel:"));
        assert_eq!(prompt.stop_token, "User:");
    }

    #[test]
    fn chat_prompt_falls_back_to_tag_summaries() {
        let chats = vec![message(Author::User, "anything about food?")];
        let mut summaries = std::collections::BTreeMap::new();
        summaries.insert("food".to_string(), "Notes about food.".to_string());

        let prompt = make_chat_prompt_from_relevant_notes(&chats, &[], &summaries);

        assert!(prompt.text.contains("-- food -- \n Notes about food."));
    }

    #[test]
    fn tag_summary_prompt_embeds_tag_and_notes() {
        let note = NoteBuilder::new()
            .id(NoteId::from_string("n-1"))
            .title("Carbonara")
            .markdown("Pasta with eggs\n\n#food/recipes")
            .build();

        let prompt = make_tag_summary_prompt(&[note], "food");

        assert!(prompt.text.contains("[#food Notes]"));
        assert!(prompt.text.contains("-- Note n-1 --"));
        // The worked example stays intact.
        assert!(prompt.text.contains("[#grocery Notes]"));
    }

    #[test]
    fn parse_tag_summary_response_strips_braces_only() {
        assert_eq!(
            parse_tag_summary_response("{ A **summary**. }"),
            " A **summary**. "
        );
        assert_eq!(parse_tag_summary_response("plain"), "plain");
    }

    #[test]
    fn title_prompt_wraps_content() {
        let prompt = make_title_from_content_prompt("A long reflection on sourdough");
        assert!(prompt.text.contains("[Note]\nA long reflection on sourdough"));
        assert!(prompt.text.contains("1-6 words long"));
        assert_eq!(prompt.stop_token, "}");
    }

    #[test]
    fn parse_relevant_tags_response_strips_brackets() {
        assert_eq!(
            parse_relevant_tags_response("#food,#home]"),
            ["#food", "#home"]
        );
        assert!(parse_relevant_tags_response("").is_empty());
    }
}
