use serde::{Deserialize, Serialize};

/// Kinds of annotation lines, keyed by their identifier prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    Entity,
    Relation,
    Equivalence,
    Event,
    Attribute,
    Modification,
    Normalization,
    Note,
}

#[allow(clippy::should_implement_trait)]
impl AnnotationKind {
    /// Returns the identifier prefix used for this kind in `.ann` files.
    pub fn prefix(&self) -> &'static str {
        match self {
            AnnotationKind::Entity => "T",
            AnnotationKind::Relation => "R",
            AnnotationKind::Equivalence => "*",
            AnnotationKind::Event => "E",
            AnnotationKind::Attribute => "A",
            AnnotationKind::Modification => "M",
            AnnotationKind::Normalization => "N",
            AnnotationKind::Note => "#",
        }
    }

    /// Parses an identifier prefix into an `AnnotationKind`, returning `None`
    /// for unrecognized values.
    pub fn from_str(s: &str) -> Option<AnnotationKind> {
        match s {
            "T" => Some(AnnotationKind::Entity),
            "R" => Some(AnnotationKind::Relation),
            "*" => Some(AnnotationKind::Equivalence),
            "E" => Some(AnnotationKind::Event),
            "A" => Some(AnnotationKind::Attribute),
            "M" => Some(AnnotationKind::Modification),
            "N" => Some(AnnotationKind::Normalization),
            "#" => Some(AnnotationKind::Note),
            _ => None,
        }
    }

    /// Classifies an annotation identifier by its first character.
    pub fn of_id(id: &str) -> Option<AnnotationKind> {
        let first = id.get(..1)?;
        AnnotationKind::from_str(first)
    }

    pub fn all() -> [AnnotationKind; 8] {
        [
            AnnotationKind::Entity,
            AnnotationKind::Relation,
            AnnotationKind::Equivalence,
            AnnotationKind::Event,
            AnnotationKind::Attribute,
            AnnotationKind::Modification,
            AnnotationKind::Normalization,
            AnnotationKind::Note,
        ]
    }
}

// ---------------------------------------------------------------------------
// Raw records (output of the line parser, before resolution)
// ---------------------------------------------------------------------------

/// A `T` line: an entity with its raw span list and literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    pub line: usize,
    pub id: String,
    pub entity_type: String,
    pub spans: Vec<(usize, usize)>,
    pub text: String,
}

/// An `R` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRecord {
    pub line: usize,
    pub id: String,
    pub relation_type: String,
    /// `(role, referenced id)` pairs in line order.
    pub args: Vec<(String, String)>,
}

/// A `*` line listing mutually equivalent entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceRecord {
    pub line: usize,
    pub relation_type: String,
    pub members: Vec<String>,
}

/// An `E` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub line: usize,
    pub id: String,
    pub event_type: String,
    pub trigger: String,
    pub args: Vec<(String, String)>,
}

/// An `A` or `M` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRecord {
    pub line: usize,
    pub id: String,
    pub attribute_type: String,
    pub target: String,
    pub value: Option<String>,
}

/// An `N` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationRecord {
    pub line: usize,
    pub id: String,
    pub normalization_type: String,
    pub target: String,
    pub resource: String,
    pub entry: String,
    pub text: Option<String>,
}

/// A `#` line carrying an annotator note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub line: usize,
    pub id: String,
    pub note_type: String,
    pub target: String,
    pub text: String,
}

/// One parsed annotation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Entity(EntityRecord),
    Relation(RelationRecord),
    Equivalence(EquivalenceRecord),
    Event(EventRecord),
    Attribute(AttributeRecord),
    Normalization(NormalizationRecord),
    Note(NoteRecord),
}

impl Record {
    pub fn line(&self) -> usize {
        match self {
            Record::Entity(r) => r.line,
            Record::Relation(r) => r.line,
            Record::Equivalence(r) => r.line,
            Record::Event(r) => r.line,
            Record::Attribute(r) => r.line,
            Record::Normalization(r) => r.line,
            Record::Note(r) => r.line,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved annotations
// ---------------------------------------------------------------------------

/// A half-open `[start, end)` range of character offsets into the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Index of an entity within its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub(crate) usize);

/// Index of an event within its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventHandle(pub(crate) usize);

impl EntityHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl EventHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A resolved reference: relation and event arguments, attribute and note
/// targets all point at either an entity or an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Entity(EntityHandle),
    Event(EventHandle),
}

/// A role-labelled argument of a relation or event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub role: String,
    pub target: Target,
}

/// An entity, possibly discontinuous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: String,
    pub entity_type: String,
    /// Ordered by start offset, non-overlapping, never empty.
    pub spans: Vec<Span>,
    /// The literal text recorded on the annotation line.
    pub text: String,
}

impl Entity {
    pub fn is_discontinuous(&self) -> bool {
        self.spans.len() > 1
    }

    /// Start offset of the first span.
    pub fn start(&self) -> usize {
        self.spans.first().map(|s| s.start).unwrap_or_default()
    }

    /// End offset of the last span.
    pub fn end(&self) -> usize {
        self.spans.last().map(|s| s.end).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub id: String,
    pub relation_type: String,
    pub args: Vec<Argument>,
    /// Set for the binary relations expanded from a `*` equivalence line.
    pub equivalence: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub event_type: String,
    pub trigger: EntityHandle,
    pub args: Vec<Argument>,
}

/// A binary or valued attribute (`A` / `M` lines).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub id: String,
    pub attribute_type: String,
    pub target: Target,
    pub value: Option<String>,
}

/// A link from an annotation to an entry of an external resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalization {
    pub id: String,
    pub normalization_type: String,
    pub target: Target,
    pub resource: String,
    pub entry: String,
    pub text: Option<String>,
}

/// A free-text annotator note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub note_type: String,
    pub target: Target,
    pub text: String,
}
