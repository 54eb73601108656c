//! FlowSketch Render Library
//!
//! Turns a diagram snapshot into a paintable scene and exports it.
//! The built-in backend writes SVG; raster and PDF backends plug in through
//! [`ExportService`].

pub mod color;
mod export;
pub mod scene;
mod svg;

pub use color::{parse_css_color, try_parse_css_color};
pub use export::{
    ExportError, ExportRequest, ExportResult, ExportService, export_diagram, export_file_name,
    prepare_export,
};
pub use scene::{Label, PathStyle, Scene, SceneItem, build_scene};
pub use svg::SvgExporter;
