//! Notes command - note management.

use anyhow::{Context as _, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::{Args, Subcommand};
use memorybank_client::types::{Note, NoteCreateRequest};
use memorybank_core::annotation::PageRasterStore;
use memorybank_render::placeholder_thumbnail;
use std::path::{Path, PathBuf};

use super::Context;
use crate::notify::{Notifier, Toast};

/// Arguments for the notes command.
#[derive(Args, Debug)]
pub struct NotesArgs {
    #[command(subcommand)]
    pub command: NotesCommand,
}

#[derive(Subcommand, Debug)]
pub enum NotesCommand {
    /// List all notes
    List {
        /// Maximum notes to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show a specific note
    Show {
        /// Note ID
        id: String,
    },

    /// Upload a PDF as a new note
    Create {
        /// PDF file
        pdf: PathBuf,
    },

    /// Delete a note
    Delete {
        /// Note ID
        id: String,
    },
}

/// Run the notes command.
pub async fn run(args: NotesArgs, ctx: &Context) -> Result<()> {
    match args.command {
        NotesCommand::List { limit } => list(limit, ctx).await,
        NotesCommand::Show { id } => show(&id, ctx).await,
        NotesCommand::Create { pdf } => create(&pdf, ctx).await,
        NotesCommand::Delete { id } => delete(&id, ctx).await,
    }
}

async fn list(limit: usize, ctx: &Context) -> Result<()> {
    let (client, _) = ctx.signed_in_client("notes list")?;
    let notes = client.notes().list().await?;
    if ctx.print_json(&notes)? {
        return Ok(());
    }

    println!("Notes");
    println!("{}", "─".repeat(50));
    if notes.is_empty() {
        println!("No notes yet");
        return Ok(());
    }
    for note in notes.iter().take(limit) {
        let concepts: Vec<&str> = note.concepts.iter().map(|c| c.name.as_str()).collect();
        println!(
            "[{}] {}  {}",
            note.id,
            note.created_at,
            truncate(note.description.as_deref().unwrap_or("(no description)"), 40)
        );
        if ctx.verbose && !concepts.is_empty() {
            println!("    {}", concepts.join(", "));
        }
    }
    if notes.len() > limit {
        println!("... and {} more", notes.len() - limit);
    }
    Ok(())
}

async fn show(id: &str, ctx: &Context) -> Result<()> {
    let (client, _) = ctx.signed_in_client("notes show")?;
    let note = client.notes().get(id).await?;
    if ctx.print_json(&note)? {
        return Ok(());
    }
    print_note(&note, &client.notes().pdf_url(id)?.to_string());
    Ok(())
}

fn print_note(note: &Note, pdf_url: &str) {
    let pages = note
        .drawing_data
        .as_deref()
        .map(PageRasterStore::deserialize_all)
        .unwrap_or_default();
    let annotated: Vec<String> = pages.pages().map(|p| p.to_string()).collect();

    println!("Note {}", note.id);
    println!("{}", "─".repeat(50));
    if let Some(description) = &note.description {
        println!("{}", description);
    }
    println!("Created:   {}", note.created_at);
    println!("Updated:   {}", note.updated_at);
    if note.pdf_url.is_some() {
        println!("PDF:       {}", pdf_url);
    }
    if annotated.is_empty() {
        println!("Annotated: none");
    } else {
        println!("Annotated: pages {}", annotated.join(", "));
    }
    if !note.concepts.is_empty() {
        println!("\nConcepts");
        for concept in &note.concepts {
            println!("  {} ({})", concept.name, concept.confidence);
        }
    }
    if !note.relations.is_empty() {
        println!("\nRelations");
        for relation in &note.relations {
            println!("  {} -[{}]-> {}", relation.from, relation.relation, relation.to);
        }
    }
}

/// Read a PDF and encode it for upload.
pub fn encode_pdf(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if !bytes.starts_with(b"%PDF-") {
        bail!("{} is not a PDF file", path.display());
    }
    Ok(BASE64.encode(bytes))
}

async fn create(pdf: &Path, ctx: &Context) -> Result<()> {
    let (client, _) = ctx.signed_in_client("notes create")?;
    let request = NoteCreateRequest {
        pdf_file: Some(encode_pdf(pdf)?),
        thumbnail: placeholder_thumbnail()?,
        ..Default::default()
    };
    let note = client.notes().create(&request).await?;
    if !ctx.print_json(&note)? {
        ctx.notifier
            .notify(Toast::success(format!("Note created: {}", note.id)));
    }
    Ok(())
}

async fn delete(id: &str, ctx: &Context) -> Result<()> {
    let (client, _) = ctx.signed_in_client("notes delete")?;
    let response = client.notes().delete(id).await?;
    if !response.success {
        bail!(
            "Failed to delete note {}: {}",
            id,
            response.message.as_deref().unwrap_or("server refused")
        );
    }
    if !ctx.print_json(&serde_json::json!({ "deleted": id }))? {
        ctx.notifier.notify(Toast::success(format!("Note deleted: {}", id)));
    }
    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max_chars {
        s
    } else {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("line one\nline two", 12), "line one ...");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }

    #[test]
    fn test_encode_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lecture.pdf");
        std::fs::write(&path, b"%PDF-1.7\n").unwrap();
        let encoded = encode_pdf(&path).unwrap();
        assert_eq!(BASE64.decode(encoded).unwrap(), b"%PDF-1.7\n");
    }

    #[test]
    fn test_encode_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        assert!(encode_pdf(&path).is_err());
        assert!(encode_pdf(&dir.path().join("missing.pdf")).is_err());
    }
}
