//! Syntactic parser for brat standoff annotation lines.
//!
//! Each line is turned into a [`Record`] independently of its siblings; no
//! reference is looked up and no offset is checked against the text here.
use std::collections::HashSet;

use crate::errors::AnnotationError;
use crate::types::{
    AnnotationKind, AttributeRecord, EntityRecord, EquivalenceRecord, EventRecord,
    NormalizationRecord, NoteRecord, Record, RelationRecord,
};

/// Splits `.ann` content into records, skipping blank lines, comments and
/// ignored annotation kinds.
#[derive(Debug, Clone, Default)]
pub struct LineParser {
    ignored: HashSet<AnnotationKind>,
}

type LineResult<T> = std::result::Result<T, AnnotationError>;

impl LineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser that skips lines of the given kinds.
    pub fn with_ignored(ignored: HashSet<AnnotationKind>) -> Self {
        Self { ignored }
    }

    /// Parses every line of `source`, collecting one outcome per annotation
    /// line in file order.
    pub fn parse_all(&self, source: &str) -> Vec<LineResult<Record>> {
        source
            .lines()
            .enumerate()
            .filter_map(|(i, raw)| self.parse_line(i + 1, raw).transpose())
            .collect()
    }

    /// Parses a single line. `line` is the 1-based line number.
    ///
    /// Returns `Ok(None)` for blank lines, comments and ignored kinds.
    pub fn parse_line(&self, line: usize, raw: &str) -> LineResult<Option<Record>> {
        let text = raw.trim_end_matches(['\r', '\n']);
        if text.trim().is_empty() {
            return Ok(None);
        }
        if text.starts_with('#') && !is_note_line(text) {
            return Ok(None);
        }

        let mut fields = text.splitn(3, '\t');
        let id = fields.next().unwrap_or_default();
        let header = fields.next();
        let rest = fields.next();

        let kind = AnnotationKind::of_id(id)
            .ok_or_else(|| malformed(line, raw, "unknown annotation prefix"))?;
        if self.ignored.contains(&kind) {
            return Ok(None);
        }
        validate_id(kind, id).map_err(|msg| malformed(line, raw, msg))?;

        let header = header
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| malformed(line, raw, "missing annotation field"))?;

        let record = match kind {
            AnnotationKind::Entity => Record::Entity(parse_entity(line, raw, id, header, rest)?),
            AnnotationKind::Relation => {
                expect_no_trailing(line, raw, rest)?;
                Record::Relation(parse_relation(line, raw, id, header)?)
            }
            AnnotationKind::Equivalence => {
                expect_no_trailing(line, raw, rest)?;
                Record::Equivalence(parse_equivalence(line, raw, header)?)
            }
            AnnotationKind::Event => {
                expect_no_trailing(line, raw, rest)?;
                Record::Event(parse_event(line, raw, id, header)?)
            }
            AnnotationKind::Attribute | AnnotationKind::Modification => {
                expect_no_trailing(line, raw, rest)?;
                Record::Attribute(parse_attribute(line, raw, id, header)?)
            }
            AnnotationKind::Normalization => {
                Record::Normalization(parse_normalization(line, raw, id, header, rest)?)
            }
            AnnotationKind::Note => Record::Note(parse_note(line, raw, id, header, rest)?),
        };

        Ok(Some(record))
    }
}

// ------------------------------------------------------------------
// Per-kind parsers
// ------------------------------------------------------------------

/// `T1\tType 0 5;8 12\ttext`
fn parse_entity(
    line: usize,
    raw: &str,
    id: &str,
    header: &str,
    text: Option<&str>,
) -> LineResult<EntityRecord> {
    let (entity_type, span_list) = header
        .split_once(' ')
        .ok_or_else(|| malformed(line, raw, "entity without offsets"))?;
    if entity_type.is_empty() {
        return Err(malformed(line, raw, "empty entity type"));
    }

    let mut spans = Vec::new();
    for fragment in span_list.split(';') {
        let mut offsets = fragment.split_whitespace();
        let (Some(start), Some(end), None) = (offsets.next(), offsets.next(), offsets.next()) else {
            return Err(malformed(line, raw, "span must be a `start end` pair"));
        };
        let start = parse_offset(line, raw, start)?;
        let end = parse_offset(line, raw, end)?;
        spans.push((start, end));
    }

    let text = text.ok_or_else(|| malformed(line, raw, "entity without text field"))?;

    Ok(EntityRecord {
        line,
        id: id.to_string(),
        entity_type: entity_type.to_string(),
        spans,
        text: text.to_string(),
    })
}

/// `R1\tType Arg1:T1 Arg2:T2`
fn parse_relation(line: usize, raw: &str, id: &str, header: &str) -> LineResult<RelationRecord> {
    let mut tokens = header.split_whitespace();
    let relation_type = tokens.next().unwrap_or_default();
    let args = tokens
        .map(|t| parse_argument(line, raw, t))
        .collect::<LineResult<Vec<_>>>()?;
    if args.is_empty() {
        return Err(malformed(line, raw, "relation without arguments"));
    }

    Ok(RelationRecord {
        line,
        id: id.to_string(),
        relation_type: relation_type.to_string(),
        args,
    })
}

/// `*\tEquiv T1 T2 T3`
fn parse_equivalence(line: usize, raw: &str, header: &str) -> LineResult<EquivalenceRecord> {
    let mut tokens = header.split_whitespace();
    let relation_type = tokens.next().unwrap_or_default();
    let members: Vec<String> = tokens.map(str::to_string).collect();
    if members.len() < 2 {
        return Err(malformed(line, raw, "equivalence needs at least two members"));
    }
    if members.iter().any(|m| m.contains(':')) {
        return Err(malformed(line, raw, "equivalence members must be plain identifiers"));
    }

    Ok(EquivalenceRecord {
        line,
        relation_type: relation_type.to_string(),
        members,
    })
}

/// `E1\tType:T3 Theme:T1 Cause:E2`
fn parse_event(line: usize, raw: &str, id: &str, header: &str) -> LineResult<EventRecord> {
    let mut tokens = header.split_whitespace();
    let head = tokens.next().unwrap_or_default();
    let (event_type, trigger) = head
        .split_once(':')
        .filter(|(t, r)| !t.is_empty() && !r.is_empty())
        .ok_or_else(|| malformed(line, raw, "event must start with `Type:Trigger`"))?;
    let args = tokens
        .map(|t| parse_argument(line, raw, t))
        .collect::<LineResult<Vec<_>>>()?;

    Ok(EventRecord {
        line,
        id: id.to_string(),
        event_type: event_type.to_string(),
        trigger: trigger.to_string(),
        args,
    })
}

/// `A1\tNegation E1` or `A2\tConfidence E1 High`
fn parse_attribute(line: usize, raw: &str, id: &str, header: &str) -> LineResult<AttributeRecord> {
    let tokens: Vec<&str> = header.split_whitespace().collect();
    let (attribute_type, target, value) = match tokens.as_slice() {
        [t, target] => (*t, *target, None),
        [t, target, value] => (*t, *target, Some(value.to_string())),
        _ => return Err(malformed(line, raw, "attribute must be `Type Target [Value]`")),
    };

    Ok(AttributeRecord {
        line,
        id: id.to_string(),
        attribute_type: attribute_type.to_string(),
        target: target.to_string(),
        value,
    })
}

/// `N1\tReference T1 Wikipedia:534366\tBarack Obama`
fn parse_normalization(
    line: usize,
    raw: &str,
    id: &str,
    header: &str,
    text: Option<&str>,
) -> LineResult<NormalizationRecord> {
    let tokens: Vec<&str> = header.split_whitespace().collect();
    let [normalization_type, target, reference] = tokens.as_slice() else {
        return Err(malformed(line, raw, "normalization must be `Type Target Resource:Entry`"));
    };
    let (resource, entry) = reference
        .split_once(':')
        .filter(|(r, e)| !r.is_empty() && !e.is_empty())
        .ok_or_else(|| malformed(line, raw, "normalization reference must be `Resource:Entry`"))?;

    Ok(NormalizationRecord {
        line,
        id: id.to_string(),
        normalization_type: normalization_type.to_string(),
        target: target.to_string(),
        resource: resource.to_string(),
        entry: entry.to_string(),
        text: text.filter(|t| !t.is_empty()).map(str::to_string),
    })
}

/// `#1\tAnnotatorNotes T1\tfree text`
fn parse_note(
    line: usize,
    raw: &str,
    id: &str,
    header: &str,
    text: Option<&str>,
) -> LineResult<NoteRecord> {
    let tokens: Vec<&str> = header.split_whitespace().collect();
    let [note_type, target] = tokens.as_slice() else {
        return Err(malformed(line, raw, "note must be `Type Target`"));
    };

    Ok(NoteRecord {
        line,
        id: id.to_string(),
        note_type: note_type.to_string(),
        target: target.to_string(),
        text: text.unwrap_or_default().to_string(),
    })
}

// ------------------------------------------------------------------
// Helpers
// ------------------------------------------------------------------

fn malformed(line: usize, raw: &str, message: &str) -> AnnotationError {
    AnnotationError::LineFormat {
        line,
        raw: raw.to_string(),
        message: message.to_string(),
    }
}

fn parse_offset(line: usize, raw: &str, token: &str) -> LineResult<usize> {
    token
        .parse::<usize>()
        .map_err(|_| malformed(line, raw, &format!("offset '{}' is not a non-negative integer", token)))
}

fn parse_argument(line: usize, raw: &str, token: &str) -> LineResult<(String, String)> {
    token
        .split_once(':')
        .filter(|(role, reference)| !role.is_empty() && !reference.is_empty())
        .map(|(role, reference)| (role.to_string(), reference.to_string()))
        .ok_or_else(|| malformed(line, raw, &format!("argument '{}' must be `Role:Id`", token)))
}

/// Relation, event and attribute lines may carry a trailing empty field.
fn expect_no_trailing(line: usize, raw: &str, rest: Option<&str>) -> LineResult<()> {
    match rest {
        Some(extra) if !extra.trim().is_empty() => {
            Err(malformed(line, raw, "unexpected trailing field"))
        }
        _ => Ok(()),
    }
}

fn validate_id(kind: AnnotationKind, id: &str) -> std::result::Result<(), &'static str> {
    if kind == AnnotationKind::Equivalence {
        return if id == "*" {
            Ok(())
        } else {
            Err("equivalence identifier must be `*`")
        };
    }
    let suffix = &id[kind.prefix().len()..];
    if suffix.is_empty() {
        return Err("identifier has no suffix");
    }
    if suffix.chars().any(|c| c.is_whitespace() || c == ':') {
        return Err("identifier contains whitespace or ':'");
    }
    Ok(())
}

/// A `#` line is a note when it looks like `#<id>\t<Type> <Target>...`;
/// anything else starting with `#` is a comment.
fn is_note_line(text: &str) -> bool {
    match text.split_once('\t') {
        Some((id, _)) => id.len() > 1 && !id.chars().any(char::is_whitespace),
        None => false,
    }
}
