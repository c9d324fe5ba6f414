use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use jot::assistant::{Assistant, StderrNotifier};
use jot::export::{
    convert_keep_to_note, convert_markdown_to_note, export_project, import_notes, import_project,
    KeepNote, ProjectExport,
};
use jot::gemini::GeminiClientBuilder;
use jot::models::ProjectMetadata;
use jot::prompts::format_prompt_date;
use jot::seed;
use jot::{Author, ChatId, ChatLog, NoteId, Notebook, ProjectStore, PromptHistory, SqliteStore};

/// jot - tag-first notetaking with model-assisted organization
#[derive(Parser)]
#[command(name = "jot")]
#[command(about = "A notetaking tool with hierarchical tags and chat over your notes")]
#[command(version)]
struct Cli {
    /// Project to operate on
    #[arg(long, global = true, default_value = "default", value_name = "PROJECT")]
    project: String,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Add a new note, generating tags when the content has none
    Add(AddCommand),
    /// List notes, optionally filtered by tag
    List(ListCommand),
    /// Show a single note's markdown
    Show(ShowCommand),
    /// Delete a note
    Delete(DeleteCommand),
    /// List tags with note counts
    Tags,
    /// Pin a tag to the top of tag listings
    Pin(TagCommand),
    /// Unpin a tag
    Unpin(TagCommand),
    /// Delete a tag from every note
    DeleteTag(TagCommand),
    /// Send a chat message answered from your notes
    Chat(ChatCommand),
    /// Turn a chat message into a note
    SaveChat(ChatIdCommand),
    /// Remove a chat message and everything after it
    UndoChat(ChatIdCommand),
    /// Show the chat transcript
    Transcript,
    /// Generate tags for untagged notes
    TagAll(TagAllCommand),
    /// Regenerate tag summaries
    Summarize(SummarizeCommand),
    /// Export the project to a JSON file
    Export(FileCommand),
    /// Import a project export (replaces the current project)
    Import(ImportCommand),
    /// Import notes from a Google Keep JSON export
    ImportKeep(FileCommand),
    /// Import a markdown file as a note
    ImportMarkdown(ImportMarkdownCommand),
}

#[derive(Parser)]
struct AddCommand {
    /// The content of the note
    #[arg(value_name = "CONTENT")]
    content: String,

    /// Title for the note
    #[arg(short, long, default_value = "")]
    title: String,

    /// Store the note as-is without generating tags
    #[arg(long)]
    plain: bool,
}

#[derive(Parser)]
struct ListCommand {
    /// Only show notes under this tag or category
    #[arg(short, long, value_name = "TAG")]
    tag: Option<String>,
}

#[derive(Parser)]
struct ShowCommand {
    /// The note ID
    #[arg(value_name = "NOTE_ID")]
    id: String,
}

#[derive(Parser)]
struct DeleteCommand {
    /// The note ID
    #[arg(value_name = "NOTE_ID")]
    id: String,
}

#[derive(Parser)]
struct TagCommand {
    /// The tag, with or without its leading '#'
    #[arg(value_name = "TAG")]
    tag: String,
}

#[derive(Parser)]
struct ChatCommand {
    /// The message to send
    #[arg(value_name = "MESSAGE")]
    message: String,
}

#[derive(Parser)]
struct ChatIdCommand {
    /// The chat message ID
    #[arg(value_name = "CHAT_ID")]
    id: String,
}

#[derive(Parser)]
struct TagAllCommand {
    /// Also regenerate tags for notes that already have some
    #[arg(long)]
    all: bool,
}

#[derive(Parser)]
struct SummarizeCommand {
    /// Summarize only this tag; omit to cover every tag
    #[arg(value_name = "TAG")]
    tag: Option<String>,

    /// Also regenerate summaries that already exist
    #[arg(long)]
    all: bool,
}

#[derive(Parser)]
struct FileCommand {
    /// Path to the JSON file
    #[arg(value_name = "FILE")]
    path: PathBuf,
}

#[derive(Parser)]
struct ImportCommand {
    /// Path to the JSON file
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Merge the file's notes into the project instead of replacing it
    #[arg(long)]
    merge: bool,
}

#[derive(Parser)]
struct ImportMarkdownCommand {
    /// Path to the markdown file
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Title for the imported note
    #[arg(short, long, default_value = "")]
    title: String,
}

fn main() {
    // Pick up GEMINI_API_KEY and friends from a local .env if present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e}");
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs internal error).
fn is_user_error(error: &anyhow::Error) -> bool {
    let error_msg = error.to_string();
    error_msg.contains("cannot be empty")
        || error_msg.contains("No API key")
        || error_msg.contains("no note with id")
        || error_msg.contains("no chat message with id")
}

/// A project loaded into memory: every state holder plus its metadata.
struct Project {
    notebook: Notebook,
    chat_log: ChatLog,
    history: PromptHistory,
    metadata: ProjectMetadata,
    store: Arc<SqliteStore>,
}

fn run(cli: &Cli) -> Result<()> {
    let db_path = get_database_path()?;
    ensure_database_directory(&db_path)?;
    let store = Arc::new(
        SqliteStore::open(&db_path, cli.project.clone()).context("Failed to open database")?,
    );
    let mut project = load_project(store)?;

    match &cli.command {
        Commands::Add(cmd) => handle_add(&mut project, cmd),
        Commands::List(cmd) => handle_list(&mut project, cmd),
        Commands::Show(cmd) => handle_show(&project, cmd),
        Commands::Delete(cmd) => handle_delete(&mut project, cmd),
        Commands::Tags => handle_tags(&project),
        Commands::Pin(cmd) => project.notebook.pin_tag(&hashed(&cmd.tag)),
        Commands::Unpin(cmd) => project.notebook.unpin_tag(&hashed(&cmd.tag)),
        Commands::DeleteTag(cmd) => project.notebook.delete_tag(&hashed(&cmd.tag)),
        Commands::Chat(cmd) => handle_chat(&mut project, cmd),
        Commands::SaveChat(cmd) => handle_save_chat(&mut project, cmd),
        Commands::UndoChat(cmd) => handle_undo_chat(&mut project, cmd),
        Commands::Transcript => handle_transcript(&project),
        Commands::TagAll(cmd) => handle_tag_all(&mut project, cmd),
        Commands::Summarize(cmd) => handle_summarize(&mut project, cmd),
        Commands::Export(cmd) => handle_export(&project, cmd),
        Commands::Import(cmd) => handle_import(&mut project, cmd),
        Commands::ImportKeep(cmd) => handle_import_keep(&mut project, cmd),
        Commands::ImportMarkdown(cmd) => handle_import_markdown(&mut project, cmd),
    }
}

/// Loads the project's state from storage, seeding onboarding content on
/// first use.
fn load_project(store: Arc<SqliteStore>) -> Result<Project> {
    let mut notebook = Notebook::new(store.clone());
    let mut chat_log = ChatLog::new(store.clone());
    let mut history = PromptHistory::new(store.clone());

    let metadata = match store.load_metadata()? {
        Some(metadata) => {
            notebook.set_notes(store.load_notes()?.unwrap_or_default());
            notebook.set_pinned_tags(&store.load_pinned_tags()?.unwrap_or_default());
            notebook.set_tag_summaries(store.load_tag_summaries()?.unwrap_or_default());
            chat_log.set_messages(store.load_chat()?.unwrap_or_default());
            history.set_calls(store.load_prompt_history()?.unwrap_or_default());
            metadata
        }
        None => {
            let metadata = ProjectMetadata::blank();
            notebook.restore(
                seed::onboarding_notes(),
                &[],
                vec![seed::onboarding_tag_summary()],
            )?;
            chat_log.restore(seed::onboarding_chat())?;
            store.save_metadata(&metadata)?;
            metadata
        }
    };

    Ok(Project {
        notebook,
        chat_log,
        history,
        metadata,
        store,
    })
}

/// Builds the model-backed assistant from the environment.
fn build_assistant() -> Result<Assistant> {
    let client = GeminiClientBuilder::new()
        .build()
        .context("Failed to create model client")?;
    Ok(Assistant::new(Arc::new(client), Arc::new(StderrNotifier)))
}

fn hashed(tag: &str) -> String {
    if tag.starts_with('#') {
        tag.to_string()
    } else {
        format!("#{tag}")
    }
}

fn handle_add(project: &mut Project, cmd: &AddCommand) -> Result<()> {
    if cmd.content.trim().is_empty() {
        anyhow::bail!("Note content cannot be empty");
    }

    let id = if cmd.plain {
        project
            .notebook
            .add_note(&cmd.content, Author::User, &cmd.title)?
    } else {
        let assistant = build_assistant()?;
        assistant.add_note_with_generated_tags(
            &mut project.notebook,
            &mut project.history,
            &cmd.content,
            &cmd.title,
        )?
    };

    let note = project
        .notebook
        .get_note(&id)
        .context("note was not stored")?;
    print!("Note created (id: {id})");
    if !note.tags.is_empty() {
        print!(" with tags: {}", note.tags.join(", "));
    }
    println!();
    Ok(())
}

fn handle_list(project: &mut Project, cmd: &ListCommand) -> Result<()> {
    project
        .notebook
        .set_selected_tag(cmd.tag.as_deref().map(hashed));

    for note in project.notebook.displayed_notes() {
        let heading = if note.title.is_empty() {
            note.markdown.lines().next().unwrap_or("").to_string()
        } else {
            note.title.clone()
        };
        println!(
            "{}  {}  {}  [{}]",
            note.id,
            format_prompt_date(note.date_created),
            heading,
            note.tags.join(" ")
        );
    }
    Ok(())
}

fn handle_show(project: &Project, cmd: &ShowCommand) -> Result<()> {
    let id = NoteId::from_string(cmd.id.clone());
    let note = project
        .notebook
        .get_note(&id)
        .with_context(|| format!("no note with id {}", cmd.id))?;

    if !note.title.is_empty() {
        println!("{}\n", note.title);
    }
    println!("{}", note.markdown);
    Ok(())
}

fn handle_delete(project: &mut Project, cmd: &DeleteCommand) -> Result<()> {
    let id = NoteId::from_string(cmd.id.clone());
    if project.notebook.get_note(&id).is_none() {
        anyhow::bail!("no note with id {}", cmd.id);
    }
    project.notebook.delete_note(&id)?;
    println!("Note deleted (id: {})", cmd.id);
    Ok(())
}

fn handle_tags(project: &Project) -> Result<()> {
    for tag in project.notebook.tags() {
        let count = project.notebook.tag_count(&tag);
        let summary = project
            .notebook
            .tag_summary(jot::tags::strip_leading_hash(&tag));
        if summary.is_empty() {
            println!("{tag}  ({count})");
        } else {
            println!("{tag}  ({count})  {}", summary.trim());
        }
    }
    Ok(())
}

fn handle_chat(project: &mut Project, cmd: &ChatCommand) -> Result<()> {
    if cmd.message.trim().is_empty() {
        anyhow::bail!("Chat message cannot be empty");
    }

    let assistant = build_assistant()?;
    let message_id = project
        .chat_log
        .add_message(Author::User, &cmd.message, None)?;

    assistant.run_chat_with_relevant_notes(
        &mut project.notebook,
        &mut project.chat_log,
        &mut project.history,
    )?;

    if let Some(reply) = project.chat_log.messages().last() {
        println!("{}", reply.body);
        if let Some(ids) = &reply.referenced_note_ids
            && !ids.is_empty()
        {
            let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
            println!("(from notes: {})", ids.join(", "));
        }
    }
    println!("(message id: {message_id})");
    Ok(())
}

fn handle_save_chat(project: &mut Project, cmd: &ChatIdCommand) -> Result<()> {
    let chat_id = ChatId::from_string(cmd.id.clone());
    let body = project
        .chat_log
        .get_message(&chat_id)
        .map(|message| message.body.clone())
        .with_context(|| format!("no chat message with id {}", cmd.id))?;

    let assistant = build_assistant()?;
    let note_id =
        assistant.create_note_from_chat(&mut project.notebook, &mut project.history, &body)?;
    project.chat_log.add_created_note_id(&chat_id, &note_id)?;

    println!("Note created (id: {note_id})");
    Ok(())
}

fn handle_undo_chat(project: &mut Project, cmd: &ChatIdCommand) -> Result<()> {
    let chat_id = ChatId::from_string(cmd.id.clone());
    if project.chat_log.get_message(&chat_id).is_none() {
        anyhow::bail!("no chat message with id {}", cmd.id);
    }
    project.chat_log.remove_exchanges(&chat_id)?;
    println!("Chat rewound");
    Ok(())
}

fn handle_transcript(project: &Project) -> Result<()> {
    for message in project.chat_log.messages() {
        let speaker = match message.author {
            Author::User => "you",
            Author::System => "jot",
        };
        println!(
            "[{}] {} {}: {}",
            message.id,
            format_prompt_date(message.date_created),
            speaker,
            message.body
        );
    }
    Ok(())
}

fn handle_tag_all(project: &mut Project, cmd: &TagAllCommand) -> Result<()> {
    let assistant = build_assistant()?;
    assistant.tag_all_notes(&mut project.notebook, &mut project.history, !cmd.all)
}

fn handle_summarize(project: &mut Project, cmd: &SummarizeCommand) -> Result<()> {
    let assistant = build_assistant()?;
    match &cmd.tag {
        Some(tag) => {
            assistant.update_tag_summary(&mut project.notebook, &mut project.history, tag)?;
            let summary = project
                .notebook
                .tag_summary(jot::tags::strip_leading_hash(tag));
            println!("{}", summary.trim());
            Ok(())
        }
        None => assistant.summarize_all_tags(&mut project.notebook, &mut project.history, !cmd.all),
    }
}

fn handle_export(project: &Project, cmd: &FileCommand) -> Result<()> {
    let document = export_project(
        &project.notebook,
        &project.chat_log,
        &project.history,
        &project.metadata,
    );
    let json = serde_json::to_string_pretty(&document)?;
    std::fs::write(&cmd.path, json)
        .with_context(|| format!("Failed to write {}", cmd.path.display()))?;
    println!("Project exported to {}", cmd.path.display());
    Ok(())
}

fn handle_import(project: &mut Project, cmd: &ImportCommand) -> Result<()> {
    let json = std::fs::read_to_string(&cmd.path)
        .with_context(|| format!("Failed to read {}", cmd.path.display()))?;
    let document: ProjectExport =
        serde_json::from_str(&json).context("Failed to parse project export")?;

    if cmd.merge {
        import_notes(document, &mut project.notebook)?;
    } else if let Some(mut metadata) = import_project(
        document,
        &mut project.notebook,
        &mut project.chat_log,
        &mut project.history,
    )? {
        // The imported metadata adopts the current project's identity.
        metadata.id = project.metadata.id.clone();
        project.store.save_metadata(&metadata)?;
        project.metadata = metadata;
    }

    println!("Imported {} notes", project.notebook.notes().len());
    Ok(())
}

fn handle_import_keep(project: &mut Project, cmd: &FileCommand) -> Result<()> {
    let json = std::fs::read_to_string(&cmd.path)
        .with_context(|| format!("Failed to read {}", cmd.path.display()))?;
    let keep: KeepNote = serde_json::from_str(&json).context("Failed to parse Keep note")?;

    let note = convert_keep_to_note(keep);
    let id = project.notebook.add_imported_note(note)?;
    println!("Note created (id: {id})");
    Ok(())
}

fn handle_import_markdown(project: &mut Project, cmd: &ImportMarkdownCommand) -> Result<()> {
    let markdown = std::fs::read_to_string(&cmd.path)
        .with_context(|| format!("Failed to read {}", cmd.path.display()))?;

    let note = convert_markdown_to_note(&markdown, &cmd.title, time::OffsetDateTime::now_utc());
    let id = project.notebook.add_imported_note(note)?;
    println!("Note created (id: {id})");
    Ok(())
}

/// Gets the cross-platform database path.
///
/// Returns the path as `{data_dir}/jot/jot.db` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
fn get_database_path() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join("jot").join("jot.db"))
}

/// Ensures the parent directory of the database file exists.
fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    Ok(())
}
