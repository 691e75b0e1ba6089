//! Export-page command - write one annotated page as PNG.

use anyhow::{Result, anyhow};
use clap::Args;
use memorybank_core::annotation::PageRasterStore;
use memorybank_render::export_page_png;
use std::path::PathBuf;

use super::Context;
use crate::notify::{Notifier, Toast};

/// Arguments for the export-page command.
#[derive(Args, Debug)]
pub struct ExportPageArgs {
    /// Note ID
    pub note_id: String,

    /// Page number (1-based)
    #[arg(short, long, default_value = "1")]
    pub page: u32,

    /// Output PNG file
    #[arg(short, long)]
    pub out: PathBuf,
}

/// Run the export-page command.
pub async fn run(args: ExportPageArgs, ctx: &Context) -> Result<()> {
    let (client, _) = ctx.signed_in_client("export-page")?;
    let note = client.notes().get(&args.note_id).await?;
    let store = note
        .drawing_data
        .as_deref()
        .map(PageRasterStore::deserialize_all)
        .unwrap_or_default();
    let snapshot = store
        .get(args.page)
        .ok_or_else(|| anyhow!("Page {} of note {} has no annotations", args.page, args.note_id))?;

    export_page_png(snapshot, &args.out)?;
    let summary = serde_json::json!({
        "note": args.note_id,
        "page": args.page,
        "out": args.out.display().to_string(),
    });
    if !ctx.print_json(&summary)? {
        ctx.notifier.notify(Toast::success(format!(
            "Page {} written to {}",
            args.page,
            args.out.display()
        )));
    }
    Ok(())
}
