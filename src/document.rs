use crate::extraction::byte_range;
use crate::resolution::ResolvedAnnotations;
use crate::types::*;

/// A parsed document: its text and every annotation that survived parsing,
/// resolution and the error policy.
///
/// A `Document` owns all of its annotations. Cross-references between them
/// are handles into the document's own collections, so a handle is only
/// meaningful for the document that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: String,
    text: String,
    entities: Vec<Entity>,
    relations: Vec<Relation>,
    events: Vec<Event>,
    attributes: Vec<Attribute>,
    normalizations: Vec<Normalization>,
    notes: Vec<Note>,
}

impl Document {
    /// Combines the document text with its resolved annotations. No further
    /// validation happens here.
    pub fn assemble(id: impl Into<String>, text: String, annotations: ResolvedAnnotations) -> Self {
        let ResolvedAnnotations {
            entities,
            relations,
            events,
            attributes,
            normalizations,
            notes,
        } = annotations;
        Self {
            id: id.into(),
            text,
            entities,
            relations,
            events,
            attributes,
            normalizations,
            notes,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn normalizations(&self) -> &[Normalization] {
        &self.normalizations
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Returns the entity behind a handle produced by this document.
    ///
    /// # Panics
    ///
    /// Panics if the handle belongs to another document with more entities.
    pub fn entity(&self, handle: EntityHandle) -> &Entity {
        &self.entities[handle.index()]
    }

    /// Returns the event behind a handle produced by this document.
    ///
    /// # Panics
    ///
    /// Panics if the handle belongs to another document with more events.
    pub fn event(&self, handle: EventHandle) -> &Event {
        &self.events[handle.index()]
    }

    /// Identifier of the entity or event a target points at.
    pub fn target_id(&self, target: Target) -> &str {
        match target {
            Target::Entity(handle) => &self.entity(handle).id,
            Target::Event(handle) => &self.event(handle).id,
        }
    }

    pub fn find_entity(&self, id: &str) -> Option<EntityHandle> {
        self.entities
            .iter()
            .position(|e| e.id == id)
            .map(EntityHandle)
    }

    pub fn find_event(&self, id: &str) -> Option<EventHandle> {
        self.events.iter().position(|e| e.id == id).map(EventHandle)
    }

    pub fn find_relation(&self, id: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.id == id)
    }

    /// Text covered by a span, or `None` if the span lies outside the text.
    pub fn span_text(&self, span: Span) -> Option<&str> {
        byte_range(&self.text, span).and_then(|range| self.text.get(range))
    }

    /// Text of every fragment of an entity, in span order.
    pub fn fragments(&self, entity: &Entity) -> Vec<&str> {
        entity
            .spans
            .iter()
            .filter_map(|span| self.span_text(*span))
            .collect()
    }

    /// Attributes attached to the given entity or event.
    pub fn attributes_of(&self, target: Target) -> impl Iterator<Item = &Attribute> + '_ {
        self.attributes.iter().filter(move |a| a.target == target)
    }

    /// Normalizations attached to the given entity or event.
    pub fn normalizations_of(&self, target: Target) -> impl Iterator<Item = &Normalization> + '_ {
        self.normalizations
            .iter()
            .filter(move |n| n.target == target)
    }

    /// Notes attached to the given entity or event.
    pub fn notes_of(&self, target: Target) -> impl Iterator<Item = &Note> + '_ {
        self.notes.iter().filter(move |n| n.target == target)
    }
}
