//! Path-description grammar.
//!
//! A stroke is stored as a compact SVG-like string: `M<x> <y>( L<x> <y>)*`.
//! Formatting lives here so every writer produces the same text, and the
//! scanner is shared by the renderer and the preview fitting.

use kurbo::Point;
use std::fmt::Write;

/// A single drawing command parsed from a path description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Start a stroke at a point.
    MoveTo(Point),
    /// Extend the current stroke to a point.
    LineTo(Point),
}

impl PathCommand {
    /// The point this command targets.
    pub fn point(&self) -> Point {
        match *self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => p,
        }
    }
}

/// Append a coordinate using the shortest round-trip form (`10`, `10.5`).
pub(crate) fn push_number(out: &mut String, value: f64) {
    // Collapse -0 so the output never carries a sign the grammar rejects.
    let value = if value == 0.0 { 0.0 } else { value };
    let _ = write!(out, "{}", value);
}

/// Append a command letter followed by a coordinate pair.
pub(crate) fn push_command(out: &mut String, letter: char, x: f64, y: f64) {
    out.push(letter);
    push_number(out, x);
    out.push(' ');
    push_number(out, y);
}

/// Iterate over the well-formed commands of a path description.
///
/// Anything that is not `M`/`L` followed by two unsigned decimals separated
/// by a single space is skipped.
pub fn commands(description: &str) -> Commands<'_> {
    Commands {
        bytes: description.as_bytes(),
        pos: 0,
    }
}

/// Iterator returned by [`commands`].
pub struct Commands<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Iterator for Commands<'_> {
    type Item = PathCommand;

    fn next(&mut self) -> Option<PathCommand> {
        while self.pos < self.bytes.len() {
            let start = self.pos;
            let letter = self.bytes[start];
            if letter != b'M' && letter != b'L' {
                self.pos += 1;
                continue;
            }

            match scan_pair(self.bytes, start + 1) {
                Some((x, y, end)) => {
                    self.pos = end;
                    let point = Point::new(x, y);
                    return Some(if letter == b'M' {
                        PathCommand::MoveTo(point)
                    } else {
                        PathCommand::LineTo(point)
                    });
                }
                None => {
                    log::trace!("skipping malformed path command at byte {}", start);
                    self.pos += 1;
                }
            }
        }
        None
    }
}

/// Scan `<number> <number>` starting at `pos`.
fn scan_pair(bytes: &[u8], pos: usize) -> Option<(f64, f64, usize)> {
    let (x, after_x) = scan_number(bytes, pos)?;
    if bytes.get(after_x) != Some(&b' ') {
        return None;
    }
    let (y, after_y) = scan_number(bytes, after_x + 1)?;
    Some((x, y, after_y))
}

/// Scan an unsigned decimal: digits, optionally followed by `.` and digits.
fn scan_number(bytes: &[u8], pos: usize) -> Option<(f64, usize)> {
    let mut end = pos;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == pos {
        return None;
    }

    if bytes.get(end) == Some(&b'.') && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    // The slice is ASCII digits and at most one dot.
    let text = std::str::from_utf8(&bytes[pos..end]).ok()?;
    let value = text.parse::<f64>().ok()?;
    Some((value, end))
}
