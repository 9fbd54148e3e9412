use std::ops::Range;

use crate::errors::AnnotationError;
use crate::types::{Entity, EntityRecord, Span};

/// Converts an entity record's raw offsets into a validated [`Entity`].
///
/// Offsets in `.ann` files count Unicode scalar values, so the merger keeps a
/// table of byte positions for every character boundary of the text.
pub struct SpanMerger<'a> {
    text: &'a str,
    /// `boundaries[i]` is the byte offset of character `i`; the last entry is `text.len()`.
    boundaries: Vec<usize>,
    separator: &'a str,
}

impl<'a> SpanMerger<'a> {
    /// Creates a merger over `text`. Discontinuous fragments are joined with
    /// `separator` before comparison with the literal text.
    pub fn new(text: &'a str, separator: &'a str) -> Self {
        let boundaries = text
            .char_indices()
            .map(|(byte, _)| byte)
            .chain(std::iter::once(text.len()))
            .collect();
        Self {
            text,
            boundaries,
            separator,
        }
    }

    /// Length of the text in characters.
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Returns the text covered by `span`, or `None` if it is out of bounds.
    pub fn slice(&self, span: Span) -> Option<&'a str> {
        if span.start > span.end {
            return None;
        }
        let start = *self.boundaries.get(span.start)?;
        let end = *self.boundaries.get(span.end)?;
        self.text.get(start..end)
    }

    /// Sorts, bounds-checks and overlap-checks the record's spans, then
    /// verifies that the text at those offsets equals the literal text field.
    pub fn merge(&self, record: EntityRecord) -> Result<Entity, AnnotationError> {
        let EntityRecord {
            line,
            id,
            entity_type,
            spans: raw_spans,
            text,
        } = record;

        if raw_spans.is_empty() {
            return Err(AnnotationError::LineFormat {
                line,
                raw: id,
                message: "entity without spans".to_string(),
            });
        }

        let len = self.char_len();
        let mut spans: Vec<Span> = Vec::with_capacity(raw_spans.len());
        for (start, end) in raw_spans {
            if start > end || end > len {
                return Err(AnnotationError::OutOfBounds {
                    line,
                    id,
                    start,
                    end,
                    len,
                });
            }
            spans.push(Span::new(start, end));
        }
        spans.sort();

        for pair in spans.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(AnnotationError::Overlap {
                    line,
                    id,
                    first: (pair[0].start, pair[0].end),
                    second: (pair[1].start, pair[1].end),
                });
            }
        }

        let found = spans
            .iter()
            .filter_map(|s| self.slice(*s))
            .collect::<Vec<_>>()
            .join(self.separator);
        if found != text {
            return Err(AnnotationError::TextMismatch {
                line,
                id,
                expected: text,
                found,
            });
        }

        Ok(Entity {
            id,
            entity_type,
            spans,
            text,
        })
    }
}

/// Maps a character-offset span onto a byte range of `text`.
pub fn byte_range(text: &str, span: Span) -> Option<Range<usize>> {
    if span.start > span.end {
        return None;
    }
    let mut boundaries = text
        .char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()));
    let start = boundaries.nth(span.start)?;
    let end = if span.end == span.start {
        start
    } else {
        boundaries.nth(span.end - span.start - 1)?
    };
    Some(start..end)
}
