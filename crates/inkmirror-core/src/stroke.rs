//! Strokes and drawings.

use crate::path::{self, PathCommand};
use kurbo::{BezPath, Point};
use serde::{Deserialize, Serialize};

/// One continuous drawn line, stored as its path description.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stroke(String);

impl Stroke {
    /// Wrap a path description as received from a remote peer.
    ///
    /// Remote text is not validated; malformed commands are skipped when
    /// the stroke is rendered or measured.
    pub fn from_description(description: impl Into<String>) -> Self {
        Self(description.into())
    }

    /// The path description.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Well-formed commands of this stroke, in order.
    pub fn commands(&self) -> path::Commands<'_> {
        path::commands(&self.0)
    }

    /// Every point named by a well-formed command.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.commands().map(|cmd| cmd.point())
    }

    /// Convert to a kurbo path for rendering.
    pub fn to_path(&self) -> BezPath {
        let mut bez = BezPath::new();
        let mut open = false;
        for cmd in self.commands() {
            match cmd {
                PathCommand::MoveTo(p) => {
                    bez.move_to(p);
                    open = true;
                }
                // A line without a preceding move starts a subpath there.
                PathCommand::LineTo(p) if !open => {
                    bez.move_to(p);
                    open = true;
                }
                PathCommand::LineTo(p) => bez.line_to(p),
            }
        }
        bez
    }
}

impl AsRef<str> for Stroke {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Stroke {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered sequence of strokes, back to front.
///
/// Serializes as the remote snapshot shape `{ "paths": [...] }`. A missing
/// `paths` field reads as an empty drawing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drawing {
    #[serde(rename = "paths", default)]
    strokes: Vec<Stroke>,
}

impl Drawing {
    /// An empty drawing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a drawing from path descriptions.
    pub fn from_descriptions<I, S>(descriptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            strokes: descriptions
                .into_iter()
                .map(Stroke::from_description)
                .collect(),
        }
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Append a stroke as the new last element.
    pub fn push(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    /// Remove and return the last stroke.
    pub fn pop(&mut self) -> Option<Stroke> {
        self.strokes.pop()
    }

    /// Remove every stroke.
    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    /// Every well-formed point across every stroke.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.strokes.iter().flat_map(Stroke::points)
    }

    /// Serialize to the wire JSON shape.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from the wire JSON shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl FromIterator<Stroke> for Drawing {
    fn from_iter<T: IntoIterator<Item = Stroke>>(iter: T) -> Self {
        Self {
            strokes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Drawing {
    type Item = &'a Stroke;
    type IntoIter = std::slice::Iter<'a, Stroke>;

    fn into_iter(self) -> Self::IntoIter {
        self.strokes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    #[test]
    fn test_snapshot_json_shape() {
        let drawing = Drawing::from_descriptions(["M1 2 L3 4", "M5 6"]);
        let json = drawing.to_json().unwrap();
        assert_eq!(json, r#"{"paths":["M1 2 L3 4","M5 6"]}"#);
    }

    #[test]
    fn test_missing_paths_is_empty() {
        let drawing = Drawing::from_json("{}").unwrap();
        assert!(drawing.is_empty());
    }

    #[test]
    fn test_to_path() {
        let stroke = Stroke::from_description("M1 2 L3 4 L5 6");
        let path = stroke.to_path();
        let els: Vec<PathEl> = path.elements().to_vec();
        assert_eq!(
            els,
            vec![
                PathEl::MoveTo(Point::new(1.0, 2.0)),
                PathEl::LineTo(Point::new(3.0, 4.0)),
                PathEl::LineTo(Point::new(5.0, 6.0)),
            ]
        );
    }

    #[test]
    fn test_to_path_without_move() {
        let stroke = Stroke::from_description("L3 4 L5 6");
        let els: Vec<PathEl> = stroke.to_path().elements().to_vec();
        assert_eq!(els[0], PathEl::MoveTo(Point::new(3.0, 4.0)));
        assert_eq!(els.len(), 2);
    }

    #[test]
    fn test_points_across_strokes() {
        let drawing = Drawing::from_descriptions(["M1 2 L3 4", "garbage", "M5 6"]);
        let points: Vec<Point> = drawing.points().collect();
        assert_eq!(points.len(), 3);
        assert_eq!(points[2], Point::new(5.0, 6.0));
    }
}
