//! SVG export backend.

use crate::color::svg_paint;
use crate::export::{ExportError, ExportRequest, ExportResult, ExportService};
use crate::scene::{Label, PathStyle, Scene, SceneItem, build_scene};
use flowsketch_core::ExportFormat;
use flowsketch_core::storage::BoxFuture;
use kurbo::Rect;
use std::fmt::{self, Write as _};

/// Font size used for shape labels.
pub const LABEL_FONT_SIZE: f64 = 16.0;
const LINE_HEIGHT: f64 = 1.25;

/// Writes diagrams as standalone SVG documents. Other formats are rejected.
#[derive(Debug, Clone, Default)]
pub struct SvgExporter {
    font_family: Option<String>,
}

impl SvgExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    /// Render `scene` cropped to `bounds`.
    ///
    /// Fails when `bounds` is not a finite region with positive size.
    pub fn render(&self, scene: &Scene, bounds: Rect) -> ExportResult<String> {
        if !bounds.is_finite() || bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(ExportError::RenderFailed(format!("invalid export bounds {bounds:?}")));
        }
        let mut out = String::new();
        self.write_document(&mut out, scene, bounds)
            .map_err(|e| ExportError::RenderFailed(e.to_string()))?;
        Ok(out)
    }

    fn write_document(&self, out: &mut String, scene: &Scene, bounds: Rect) -> fmt::Result {
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="{x} {y} {w} {h}">"#,
            x = fmt_num(bounds.x0),
            y = fmt_num(bounds.y0),
            w = fmt_num(bounds.width()),
            h = fmt_num(bounds.height()),
        )?;
        let (bg, bg_opacity) = svg_paint(scene.background);
        writeln!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{bg}"{}/>"#,
            fmt_num(bounds.x0),
            fmt_num(bounds.y0),
            fmt_num(bounds.width()),
            fmt_num(bounds.height()),
            opacity_attr("fill-opacity", bg_opacity),
        )?;
        for item in &scene.items {
            self.write_item(out, item)?;
        }
        out.push_str("</svg>\n");
        Ok(())
    }

    fn write_item(&self, out: &mut String, item: &SceneItem) -> fmt::Result {
        if !item.path.elements().is_empty() {
            writeln!(
                out,
                r#"<path d="{}"{}/>"#,
                item.path.to_svg(),
                style_attrs(&item.style)
            )?;
        }
        match &item.label {
            Some(label) => self.write_label(out, label),
            None => Ok(()),
        }
    }

    fn write_label(&self, out: &mut String, label: &Label) -> fmt::Result {
        let lines: Vec<&str> = label.text.lines().collect();
        if lines.is_empty() {
            return Ok(());
        }
        let (fill, opacity) = svg_paint(label.color);
        let line_step = LABEL_FONT_SIZE * LINE_HEIGHT;
        let first_y = label.center.y - line_step * (lines.len() as f64 - 1.0) / 2.0;
        let family = self.font_family.as_deref().unwrap_or("sans-serif");
        write!(
            out,
            r#"<text x="{}" y="{}" font-family="{}" font-size="{}" text-anchor="middle" dominant-baseline="middle" fill="{fill}"{}>"#,
            fmt_num(label.center.x),
            fmt_num(first_y),
            escape_xml(family),
            fmt_num(LABEL_FONT_SIZE),
            opacity_attr("fill-opacity", opacity),
        )?;
        for (i, line) in lines.iter().enumerate() {
            let dy = if i == 0 { 0.0 } else { line_step };
            write!(
                out,
                r#"<tspan x="{}" dy="{}">{}</tspan>"#,
                fmt_num(label.center.x),
                fmt_num(dy),
                escape_xml(line)
            )?;
        }
        out.push_str("</text>\n");
        Ok(())
    }
}

impl ExportService for SvgExporter {
    fn export(&self, request: &ExportRequest) -> BoxFuture<'_, ExportResult<Vec<u8>>> {
        let result = match request.format {
            ExportFormat::Svg => {
                let scene = build_scene(&request.state, 0.0, f64::INFINITY);
                if scene.items.is_empty() {
                    Err(ExportError::EmptyDiagram)
                } else {
                    self.render(&scene, request.bounds).map(String::into_bytes)
                }
            }
            format => Err(ExportError::UnsupportedFormat(format)),
        };
        Box::pin(async move { result })
    }
}

fn style_attrs(style: &PathStyle) -> String {
    let mut attrs = String::new();
    match style.fill {
        Some(color) => {
            let (fill, opacity) = svg_paint(color);
            let _ = write!(attrs, r#" fill="{fill}"{}"#, opacity_attr("fill-opacity", opacity));
        }
        None => attrs.push_str(r#" fill="none""#),
    }
    if let Some(color) = style.stroke {
        let (stroke, opacity) = svg_paint(color);
        let _ = write!(
            attrs,
            r#" stroke="{stroke}" stroke-width="{}" stroke-linecap="round" stroke-linejoin="round"{}"#,
            fmt_num(style.stroke_width),
            opacity_attr("stroke-opacity", opacity)
        );
        if !style.dash.is_empty() {
            let dash: Vec<String> = style.dash.iter().map(|d| fmt_num(*d)).collect();
            let _ = write!(attrs, r#" stroke-dasharray="{}""#, dash.join(" "));
        }
    }
    attrs
}

fn opacity_attr(name: &str, opacity: f64) -> String {
    if opacity >= 1.0 {
        String::new()
    } else {
        format!(r#" {name}="{}""#, fmt_num(opacity))
    }
}

/// Compact number formatting: at most three decimals, no trailing zeros.
fn fmt_num(value: f64) -> String {
    let s = format!("{value:.3}");
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
            c => out.push(c),
        }
    }
    out
}
