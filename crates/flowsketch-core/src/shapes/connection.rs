//! Directed, styled edges between shapes.

use super::ShapeId;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for connections.
pub type ConnectionId = Uuid;

/// How the connector line is stroked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    /// Solid stroke routed as a cubic curve.
    Curved,
}

impl LineStyle {
    /// Dash pattern for the stroke, empty for continuous lines.
    pub fn dash_pattern(self) -> &'static [f64] {
        match self {
            LineStyle::Solid | LineStyle::Curved => &[],
            LineStyle::Dashed => &[8.0, 6.0],
            LineStyle::Dotted => &[2.0, 4.0],
        }
    }
}

/// Which ends of the connector carry an arrowhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowStyle {
    None,
    Start,
    #[default]
    End,
    Both,
}

impl ArrowStyle {
    pub fn at_start(self) -> bool {
        matches!(self, ArrowStyle::Start | ArrowStyle::Both)
    }

    pub fn at_end(self) -> bool {
        matches!(self, ArrowStyle::End | ArrowStyle::Both)
    }
}

/// A directed edge between two shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub from: ShapeId,
    pub to: ShapeId,
    /// Manual waypoints. Not used by routing yet.
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default)]
    pub line_style: LineStyle,
    #[serde(default)]
    pub arrow_style: ArrowStyle,
}

impl Connection {
    /// Create a solid connection with an arrowhead at the target.
    pub fn new(from: ShapeId, to: ShapeId) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to,
            points: Vec::new(),
            line_style: LineStyle::default(),
            arrow_style: ArrowStyle::default(),
        }
    }

    /// Whether either endpoint is `shape`.
    pub fn touches(&self, shape: ShapeId) -> bool {
        self.from == shape || self.to == shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style() {
        let conn = Connection::new(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(conn.line_style, LineStyle::Solid);
        assert_eq!(conn.arrow_style, ArrowStyle::End);
    }

    #[test]
    fn test_style_json_names() {
        let mut conn = Connection::new(Uuid::new_v4(), Uuid::new_v4());
        conn.line_style = LineStyle::Curved;
        conn.arrow_style = ArrowStyle::Both;
        let json = serde_json::to_value(&conn).unwrap();
        assert_eq!(json["lineStyle"], "curved");
        assert_eq!(json["arrowStyle"], "both");
    }

    #[test]
    fn test_missing_styles_default() {
        let json = format!(
            r#"{{"id":"{}","from":"{}","to":"{}"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        let conn: Connection = serde_json::from_str(&json).unwrap();
        assert!(conn.points.is_empty());
        assert_eq!(conn.arrow_style, ArrowStyle::End);
    }
}
