//! SVG graph renderer.
//!
//! Produces a standalone SVG document: edges underneath, relation labels at
//! edge midpoints, then node circles with their labels and hover titles.

use crate::renderer::{GraphRenderer, RenderContext};
use memorybank_core::InkColor;
use memorybank_core::graph::{GraphView, LayoutEngine, NodeStyle};
use std::fmt::{self, Write};

const EDGE_COLOR: &str = "#999";
const EDGE_OPACITY: f64 = 0.6;
const EDGE_WIDTH: f64 = 2.0;
const EDGE_LABEL_COLOR: &str = "#666";
const EDGE_LABEL_SIZE: f64 = 10.0;
const NODE_STROKE: &str = "#fff";
const NODE_STROKE_WIDTH: f64 = 1.5;
const NODE_LABEL_SIZE: f64 = 12.0;

/// Renders a graph view to SVG markup.
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    /// Emit newlines between elements.
    pub pretty: bool,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render with default context settings.
    pub fn render<L: LayoutEngine>(&mut self, view: &GraphView<L>) -> String {
        self.render_graph(&RenderContext::new(view))
    }

    /// Write the SVG document for `ctx` into `out`.
    pub fn write_svg<L: LayoutEngine, W: Write>(
        &self,
        ctx: &RenderContext<'_, L>,
        out: &mut W,
    ) -> fmt::Result {
        let view = ctx.view;
        let size = ctx.viewport_size;
        let background = InkColor::from(ctx.background_color).to_hex();
        let t = view.camera.transform().as_coeffs();

        write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="100%" height="100%">"#,
            fmt_num(size.width),
            fmt_num(size.height)
        )?;
        self.newline(out)?;
        write!(out, r#"<rect width="100%" height="100%" fill="{background}"/>"#)?;
        self.newline(out)?;
        write!(
            out,
            r#"<g transform="matrix({} {} {} {} {} {})">"#,
            fmt_num(t[0]),
            fmt_num(t[1]),
            fmt_num(t[2]),
            fmt_num(t[3]),
            fmt_num(t[4]),
            fmt_num(t[5])
        )?;
        self.newline(out)?;

        write!(
            out,
            r#"<g stroke="{EDGE_COLOR}" stroke-opacity="{EDGE_OPACITY}">"#
        )?;
        for (_, a, b) in view.edges() {
            write!(
                out,
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke-width="{EDGE_WIDTH}"/>"#,
                fmt_num(a.x),
                fmt_num(a.y),
                fmt_num(b.x),
                fmt_num(b.y)
            )?;
        }
        out.write_str("</g>")?;
        self.newline(out)?;

        if ctx.edge_labels {
            out.write_str("<g>")?;
            for (edge, a, b) in view.edges() {
                let mid = a.midpoint(b);
                write!(
                    out,
                    r#"<text x="{}" y="{}" font-size="{EDGE_LABEL_SIZE}" fill="{EDGE_LABEL_COLOR}" text-anchor="middle">{}</text>"#,
                    fmt_num(mid.x),
                    fmt_num(mid.y),
                    escape_xml(&edge.relation)
                )?;
            }
            out.write_str("</g>")?;
            self.newline(out)?;
        }

        write!(
            out,
            r#"<g stroke="{NODE_STROKE}" stroke-width="{NODE_STROKE_WIDTH}">"#
        )?;
        for (node, p) in view.nodes() {
            let style = NodeStyle::for_kind(node.kind);
            write!(
                out,
                r#"<circle cx="{}" cy="{}" r="{}" fill="{}" style="cursor: pointer" data-id="{}"><title>{}</title></circle>"#,
                fmt_num(p.x),
                fmt_num(p.y),
                fmt_num(style.radius),
                style.fill.to_hex(),
                escape_xml(&node.id),
                escape_xml(&node.tooltip())
            )?;
        }
        out.write_str("</g>")?;
        self.newline(out)?;

        out.write_str("<g>")?;
        for (node, p) in view.nodes() {
            write!(
                out,
                r#"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="central" font-size="{NODE_LABEL_SIZE}" fill="{NODE_STROKE}" style="pointer-events: none">{}</text>"#,
                fmt_num(p.x),
                fmt_num(p.y),
                escape_xml(&node.label())
            )?;
        }
        out.write_str("</g>")?;
        self.newline(out)?;

        out.write_str("</g></svg>")?;
        self.newline(out)?;
        Ok(())
    }

    fn newline<W: Write>(&self, out: &mut W) -> fmt::Result {
        if self.pretty {
            out.write_char('\n')?;
        }
        Ok(())
    }
}

impl GraphRenderer for SvgRenderer {
    type Output = String;

    fn render_graph<L: LayoutEngine>(&mut self, ctx: &RenderContext<'_, L>) -> String {
        let mut out = String::new();
        if let Err(e) = self.write_svg(ctx, &mut out) {
            log::error!("Failed to format graph SVG: {}", e);
        }
        log::debug!(
            "Rendered graph SVG: {} nodes, {} edges",
            ctx.view.graph().nodes.len(),
            ctx.view.graph().edges.len()
        );
        out
    }
}

/// Two decimals, trailing zeros trimmed.
fn fmt_num(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
