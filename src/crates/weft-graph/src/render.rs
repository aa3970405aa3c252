//! Multi-format graph rendering
//!
//! Renders the immutable graph for operators: SVG for the gateway's `/graph`
//! endpoint, DOT for graphviz tooling, Mermaid for markdown. The SVG layout
//! places one column per scheduler wave, so the picture reads left to right
//! in execution order.

use std::collections::HashMap;

use crate::error::Result;
use crate::graph::{Graph, VIRTUAL_SINK, VIRTUAL_SOURCE};
use crate::schedule;

const NODE_RADIUS: i32 = 36;
const COL_SPACING: i32 = 180;
const ROW_SPACING: i32 = 110;
const MARGIN: i32 = 100;

/// Output format for [`render`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFormat {
    /// Standalone SVG document
    Svg,
    /// DOT format for Graphviz
    Dot,
    /// Mermaid diagram format
    Mermaid,
}

impl RenderFormat {
    /// MIME type for serving the rendered output over HTTP
    pub fn content_type(&self) -> &'static str {
        match self {
            RenderFormat::Svg => "image/svg+xml",
            RenderFormat::Dot => "text/vnd.graphviz",
            RenderFormat::Mermaid => "text/plain; charset=utf-8",
        }
    }
}

/// Options controlling the rendered output
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Output format
    pub format: RenderFormat,
    /// Diagram title; the graph's name is used when unset
    pub title: Option<String>,
    /// Whether to draw the virtual entry/exit markers
    pub show_virtual: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: RenderFormat::Svg,
            title: None,
            show_virtual: false,
        }
    }
}

impl RenderOptions {
    /// SVG output
    pub fn svg() -> Self {
        Self {
            format: RenderFormat::Svg,
            ..Self::default()
        }
    }

    /// DOT output
    pub fn dot() -> Self {
        Self {
            format: RenderFormat::Dot,
            ..Self::default()
        }
    }

    /// Mermaid output
    pub fn mermaid() -> Self {
        Self {
            format: RenderFormat::Mermaid,
            ..Self::default()
        }
    }

    /// Set the diagram title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Draw the virtual entry/exit markers as well
    pub fn with_virtual_markers(mut self) -> Self {
        self.show_virtual = true;
        self
    }
}

/// Render the graph in the requested format
pub fn render(graph: &Graph, options: &RenderOptions) -> Result<String> {
    match options.format {
        RenderFormat::Svg => render_svg(graph, options),
        RenderFormat::Dot => Ok(render_dot(graph, options)),
        RenderFormat::Mermaid => Ok(render_mermaid(graph, options)),
    }
}

fn title_of<'a>(graph: &'a Graph, options: &'a RenderOptions) -> &'a str {
    options.title.as_deref().unwrap_or(&graph.name)
}

fn render_dot(graph: &Graph, options: &RenderOptions) -> String {
    let mut output = String::new();

    output.push_str("digraph G {\n");
    output.push_str("    rankdir=LR;\n");
    output.push_str("    node [shape=box, style=rounded];\n");
    output.push_str("    labelloc=\"t\";\n");
    output.push_str(&format!("    label=\"{}\";\n", escape_dot(title_of(graph, options))));

    if options.show_virtual {
        output.push_str(&format!(
            "    \"{VIRTUAL_SOURCE}\" [shape=circle, style=filled, fillcolor=palegreen];\n"
        ));
        output.push_str(&format!(
            "    \"{VIRTUAL_SINK}\" [shape=circle, style=filled, fillcolor=lightcoral];\n"
        ));
    }

    for node in &graph.nodes {
        output.push_str(&format!(
            "    \"{}\" [label=\"{}\"];\n",
            escape_dot(&node.name),
            escape_dot(&node.name)
        ));
    }

    for edge in &graph.edges {
        let virtual_edge =
            Graph::is_virtual(&edge.source) || Graph::is_virtual(&edge.destination);
        if virtual_edge && !options.show_virtual {
            continue;
        }
        let style = if virtual_edge { " [style=dashed]" } else { "" };
        output.push_str(&format!(
            "    \"{}\" -> \"{}\"{};\n",
            escape_dot(&edge.source),
            escape_dot(&edge.destination),
            style
        ));
    }

    output.push_str("}\n");
    output
}

fn render_mermaid(graph: &Graph, options: &RenderOptions) -> String {
    let mut output = String::new();

    output.push_str(&format!("%% {}\n", title_of(graph, options)));
    output.push_str("graph LR\n");

    for node in &graph.nodes {
        output.push_str(&format!(
            "    {}[\"{}\"]\n",
            mermaid_id(&node.name),
            escape_mermaid(&node.name)
        ));
    }
    if options.show_virtual {
        output.push_str(&format!(
            "    {}(({}))\n",
            mermaid_id(VIRTUAL_SOURCE),
            VIRTUAL_SOURCE
        ));
        output.push_str(&format!(
            "    {}(({}))\n",
            mermaid_id(VIRTUAL_SINK),
            VIRTUAL_SINK
        ));
    }

    for edge in &graph.edges {
        let virtual_edge =
            Graph::is_virtual(&edge.source) || Graph::is_virtual(&edge.destination);
        if virtual_edge && !options.show_virtual {
            continue;
        }
        let arrow = if virtual_edge { "-.->" } else { "-->" };
        output.push_str(&format!(
            "    {} {} {}\n",
            mermaid_id(&edge.source),
            arrow,
            mermaid_id(&edge.destination)
        ));
    }

    output
}

/// SVG with one column per scheduler wave
fn render_svg(graph: &Graph, options: &RenderOptions) -> Result<String> {
    let waves = schedule::execution_waves(graph)?;

    let mut positions: HashMap<String, (i32, i32)> = HashMap::new();
    let mut max_rows = 1;
    for (col, wave) in waves.iter().enumerate() {
        max_rows = max_rows.max(wave.len());
        for (row, name) in wave.iter().enumerate() {
            let x = MARGIN + (col as i32 + i32::from(options.show_virtual)) * COL_SPACING;
            let y = MARGIN + row as i32 * ROW_SPACING;
            positions.insert(name.clone(), (x, y));
        }
    }

    if options.show_virtual {
        positions.insert(VIRTUAL_SOURCE.to_string(), (MARGIN, MARGIN));
        let sink_x = MARGIN + (waves.len() as i32 + 1) * COL_SPACING;
        positions.insert(VIRTUAL_SINK.to_string(), (sink_x, MARGIN));
    }

    let columns = waves.len() as i32 + if options.show_virtual { 2 } else { 0 };
    let width = 2 * MARGIN + (columns.max(1) - 1) * COL_SPACING;
    let height = 2 * MARGIN + (max_rows as i32 - 1) * ROW_SPACING;

    let mut output = String::new();
    output.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    ));
    output.push_str(
        "  <defs>\n    <marker id=\"arrow\" markerWidth=\"10\" markerHeight=\"8\" refX=\"9\" refY=\"4\" orient=\"auto\">\n      <path d=\"M0,0 L10,4 L0,8 z\" fill=\"#555\"/>\n    </marker>\n  </defs>\n",
    );
    output.push_str(&format!(
        "  <text x=\"{}\" y=\"40\" text-anchor=\"middle\" font-size=\"20\" font-family=\"sans-serif\">{}</text>\n",
        width / 2,
        escape_xml(title_of(graph, options))
    ));

    for edge in &graph.edges {
        let (Some(&(x1, y1)), Some(&(x2, y2))) =
            (positions.get(&edge.source), positions.get(&edge.destination))
        else {
            continue;
        };
        let virtual_edge =
            Graph::is_virtual(&edge.source) || Graph::is_virtual(&edge.destination);
        let dash = if virtual_edge { " stroke-dasharray=\"6,4\"" } else { "" };
        output.push_str(&format!(
            "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#555\" stroke-width=\"1.5\" marker-end=\"url(#arrow)\"{}/>\n",
            x1 + NODE_RADIUS,
            y1,
            x2 - NODE_RADIUS,
            y2,
            dash
        ));
    }

    for node in &graph.nodes {
        let Some(&(x, y)) = positions.get(&node.name) else {
            continue;
        };
        output.push_str(&format!(
            "  <circle cx=\"{x}\" cy=\"{y}\" r=\"{NODE_RADIUS}\" fill=\"#f4f4f4\" stroke=\"#7c7c7c\" stroke-width=\"2\"/>\n"
        ));
        output.push_str(&format!(
            "  <text x=\"{x}\" y=\"{}\" text-anchor=\"middle\" font-size=\"13\" font-family=\"sans-serif\">{}</text>\n",
            y + 4,
            escape_xml(&node.name)
        ));
    }

    if options.show_virtual {
        for marker in [VIRTUAL_SOURCE, VIRTUAL_SINK] {
            let Some(&(x, y)) = positions.get(marker) else {
                continue;
            };
            output.push_str(&format!(
                "  <circle cx=\"{x}\" cy=\"{y}\" r=\"10\" fill=\"#e8e8e8\" stroke=\"#7c7c7c\" stroke-dasharray=\"3,2\"/>\n"
            ));
            output.push_str(&format!(
                "  <text x=\"{x}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" font-family=\"sans-serif\">{}</text>\n",
                y - 16,
                escape_xml(marker)
            ));
        }
    }

    output.push_str("</svg>\n");
    Ok(output)
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn escape_dot(input: &str) -> String {
    input.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_mermaid(input: &str) -> String {
    input.replace('"', "#quot;")
}

fn mermaid_id(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
