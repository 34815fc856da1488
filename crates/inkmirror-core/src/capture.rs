//! Stroke capture: turning pointer samples into path descriptions.

use crate::path::push_command;
use crate::stroke::{Drawing, Stroke};

/// Accumulates the samples of one in-progress stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct PathBuffer {
    description: String,
}

impl PathBuffer {
    /// Begin a stroke at `(x, y)`: `M<x> <y>`.
    pub fn start(x: f64, y: f64) -> Self {
        let mut description = String::with_capacity(64);
        push_command(&mut description, 'M', x, y);
        Self { description }
    }

    /// Extend the stroke to `(x, y)`: appends ` L<x> <y>`.
    pub fn extend(&mut self, x: f64, y: f64) {
        self.description.push(' ');
        push_command(&mut self.description, 'L', x, y);
    }

    /// The description accumulated so far.
    pub fn as_str(&self) -> &str {
        &self.description
    }

    /// Finish the stroke.
    pub fn finish(self) -> Stroke {
        Stroke::from_description(self.description)
    }
}

/// Completed strokes plus the one being drawn.
#[derive(Debug, Clone, Default)]
pub struct StrokeStore {
    drawing: Drawing,
    current: Option<PathBuffer>,
}

impl StrokeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new stroke. An unfinished stroke is discarded.
    pub fn start(&mut self, x: f64, y: f64) {
        if self.current.is_some() {
            log::debug!("touch-down while stroking; discarding unfinished stroke");
        }
        self.current = Some(PathBuffer::start(x, y));
    }

    /// Extend the in-progress stroke. Does nothing when no stroke is open.
    pub fn extend(&mut self, x: f64, y: f64) {
        if let Some(buffer) = self.current.as_mut() {
            buffer.extend(x, y);
        }
    }

    /// Move the in-progress stroke into the drawing as its last element.
    ///
    /// Returns false when there was nothing to finish.
    pub fn end(&mut self) -> bool {
        match self.current.take() {
            Some(buffer) => {
                self.drawing.push(buffer.finish());
                true
            }
            None => false,
        }
    }

    /// Drop the in-progress stroke, if any.
    pub fn discard(&mut self) -> bool {
        self.current.take().is_some()
    }

    /// Remove the most recently completed stroke.
    pub fn undo(&mut self) -> Option<Stroke> {
        self.drawing.pop()
    }

    /// Remove every completed stroke. The in-progress stroke is kept.
    pub fn clear(&mut self) {
        self.drawing.clear();
    }

    /// Completed strokes in drawing order.
    pub fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    /// The stroke being drawn, if any.
    pub fn current(&self) -> Option<&PathBuffer> {
        self.current.as_ref()
    }

    pub fn is_stroking(&self) -> bool {
        self.current.is_some()
    }
}
