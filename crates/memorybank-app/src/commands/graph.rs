//! Graph command - render the knowledge graph to SVG.

use anyhow::{Context as _, Result, bail};
use clap::Args;
use kurbo::Point;
use memorybank_core::graph::{GraphHandler, GraphNode, GraphView};
use memorybank_render::{GraphRenderer, RenderContext, SvgRenderer};
use std::path::PathBuf;

use super::Context;
use crate::notify::{Notifier, Toast};

/// Arguments for the graph command.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Show the subgraph around one concept
    #[arg(long)]
    pub concept: Option<String>,

    /// Output SVG file
    #[arg(short, long)]
    pub out: PathBuf,

    /// Maximum layout iterations
    #[arg(long, default_value = "300")]
    pub ticks: usize,

    /// Omit relation labels on edges
    #[arg(long)]
    pub no_edge_labels: bool,

    /// Click the node at screen position X,Y after layout
    #[arg(long, value_parser = parse_point)]
    pub click: Option<Point>,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got `{}`", s))?;
    let x = x.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(Point::new(x, y))
}

/// Prints what a node click would open.
#[derive(Debug, Default)]
pub struct ClickReport {
    pub opened: Option<String>,
}

impl GraphHandler for ClickReport {
    fn on_navigate(&mut self, note_id: &str) {
        self.opened = Some(format!("note {}", note_id));
    }

    fn on_select(&mut self, node: &GraphNode) {
        self.opened = Some(format!("concept {}", node.name));
    }
}

/// Run the graph command.
pub async fn run(args: GraphArgs, ctx: &Context) -> Result<()> {
    let (client, _) = ctx.signed_in_client("graph")?;
    let graph = match &args.concept {
        Some(name) => client.graph().concept_graph(name).await?.into_graph(),
        None => client.graph().graph().await?,
    };
    if graph.is_empty() {
        ctx.notifier
            .notify(Toast::info("No concepts yet. Upload notes to build the graph"));
    }

    let mut view = GraphView::new(graph, ctx.config.graph_size);
    let ticks = view.settle(args.ticks);
    log::debug!("Layout settled after {} ticks", ticks);

    let render_ctx = RenderContext::new(&view).with_edge_labels(!args.no_edge_labels);
    let svg = SvgRenderer::new().render_graph(&render_ctx);
    std::fs::write(&args.out, svg)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    let mut report = ClickReport::default();
    if let Some(point) = args.click {
        if view.click(point, &mut report).is_none() {
            bail!("No node at {},{}", point.x, point.y);
        }
    }

    let summary = serde_json::json!({
        "nodes": view.graph().nodes.len(),
        "edges": view.graph().edges.len(),
        "out": args.out.display().to_string(),
        "opened": report.opened,
    });
    if !ctx.print_json(&summary)? {
        ctx.notifier.notify(Toast::success(format!(
            "Graph with {} nodes written to {}",
            view.graph().nodes.len(),
            args.out.display()
        )));
        if let Some(opened) = &report.opened {
            println!("Open {}", opened);
        }
    }
    Ok(())
}
