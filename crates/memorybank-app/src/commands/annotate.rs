//! Annotate command - replay recorded input into a note and save it.

use anyhow::{Context as _, Result, bail};
use clap::Args;
use memorybank_core::presentation::ExclusivePresentation;
use std::path::PathBuf;

use super::Context;
use crate::annotate::{AnnotationController, AnnotationScript, PdfState, ScriptStep};

/// Arguments for the annotate command.
#[derive(Args, Debug)]
pub struct AnnotateArgs {
    /// Note ID
    pub note_id: String,

    /// JSON input script to replay
    #[arg(short, long)]
    pub events: PathBuf,

    /// Page count of the note's PDF (overrides the script)
    #[arg(long)]
    pub pages: Option<u32>,

    /// How many times to retry a failed PDF download
    #[arg(long, default_value = "1")]
    pub pdf_retries: u32,

    /// Replay without the final save
    #[arg(long)]
    pub no_save: bool,
}

/// Run the annotate command.
pub async fn run(args: AnnotateArgs, ctx: &Context) -> Result<()> {
    let json = std::fs::read_to_string(&args.events)
        .with_context(|| format!("Failed to read {}", args.events.display()))?;
    let script = AnnotationScript::from_json(&json)
        .with_context(|| format!("Invalid input script {}", args.events.display()))?;

    let (client, _) = ctx.signed_in_client("annotate")?;
    let page_count = args.pages.unwrap_or(script.page_count);
    let config = ctx.config.session_config(page_count);

    // Toasts raised while the note is open are shown once it closes
    let _exclusive = ExclusivePresentation::acquire(ctx.notifier.as_ref());

    let mut controller =
        AnnotationController::open(client, &args.note_id, config, ctx.notifier.clone()).await?;

    let mut retries = args.pdf_retries;
    controller.load_pdf().await;
    while controller.pdf_state().can_retry() && retries > 0 {
        retries -= 1;
        controller.retry_pdf().await;
    }
    if let PdfState::Failed(message) = controller.pdf_state() {
        bail!("Could not load the PDF of note {}: {}", args.note_id, message);
    }
    log::info!(
        "PDF loaded ({} bytes)",
        controller.pdf_state().bytes().map_or(0, <[u8]>::len)
    );

    let mut summary = controller.replay(&script).await?;
    let saved_last = matches!(script.steps.last(), Some(ScriptStep::Save));
    if !args.no_save && !saved_last {
        controller.save().await?;
        summary.saves += 1;
    }

    let report = serde_json::json!({
        "note": args.note_id,
        "steps": summary.steps,
        "strokes": summary.strokes,
        "saves": summary.saves,
        "page": summary.page,
        "annotated_pages": controller.session().store().pages().collect::<Vec<_>>(),
    });
    if !ctx.print_json(&report)? {
        println!(
            "Replayed {} steps on note {}: {} strokes, {} saves, ended on page {}",
            summary.steps, args.note_id, summary.strokes, summary.saves, summary.page
        );
    }
    Ok(())
}
