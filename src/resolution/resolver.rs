use std::collections::HashMap;

use tracing::debug;

use crate::errors::{AnnotationError, Result};
use crate::policy::PolicyContext;
use crate::types::*;

/// Records of one document waiting for cross-reference resolution.
///
/// Entities have already been through the span merger and carry the line
/// they were parsed from.
#[derive(Debug, Default)]
pub struct PendingAnnotations {
    pub entities: Vec<(usize, Entity)>,
    /// Line and id of entity records rejected before resolution. They still
    /// claim their identifier.
    pub dropped_entities: Vec<(usize, String)>,
    pub relations: Vec<RelationRecord>,
    pub equivalences: Vec<EquivalenceRecord>,
    pub events: Vec<EventRecord>,
    pub attributes: Vec<AttributeRecord>,
    pub normalizations: Vec<NormalizationRecord>,
    pub notes: Vec<NoteRecord>,
}

/// Fully linked annotations of one document, in file order.
#[derive(Debug, Default)]
pub struct ResolvedAnnotations {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
    pub events: Vec<Event>,
    pub attributes: Vec<Attribute>,
    pub normalizations: Vec<Normalization>,
    pub notes: Vec<Note>,
}

/// What an identifier names, by position in the pending record lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Entity(usize),
    Relation(usize),
    Event(usize),
    /// Defined only by a record that was already rejected.
    Dropped,
    Ambiguous,
}

#[derive(Debug, Clone, Copy)]
enum RawTarget {
    Entity(usize),
    Event(usize),
}

#[derive(Debug, Clone)]
enum Failure {
    Cycle(Vec<String>),
    Unresolved,
}

#[derive(Debug)]
enum EventState {
    Unvisited,
    Visiting,
    Resolved {
        trigger: usize,
        args: Vec<(String, RawTarget)>,
    },
    Failed(Failure),
}

/// Links the records of one document through an identifier index.
///
/// Resolution runs in passes: index every entity, relation and event id;
/// resolve events in dependency order with cycle detection; resolve
/// relations and equivalences; resolve attributes, normalizations and notes.
/// Every failure is routed through the caller's [`PolicyContext`].
pub struct ReferenceResolver {
    pending: PendingAnnotations,
}

impl ReferenceResolver {
    pub fn new(pending: PendingAnnotations) -> Self {
        Self { pending }
    }

    pub fn resolve(self, ctx: &mut PolicyContext) -> Result<ResolvedAnnotations> {
        let PendingAnnotations {
            entities,
            dropped_entities,
            relations,
            equivalences,
            events,
            attributes,
            normalizations,
            notes,
        } = self.pending;

        let index = build_index(&entities, &dropped_entities, &relations, &events, ctx)?;

        let mut graph = EventGraph {
            events: &events,
            index: &index,
            states: events.iter().map(|_| EventState::Unvisited).collect(),
            stack: Vec::new(),
        };
        for (j, event) in events.iter().enumerate() {
            if index.get(&event.id) == Some(&Slot::Event(j)) {
                graph.visit(j, ctx)?;
            }
        }
        let states = graph.states;

        let entity_handles: Vec<Option<EntityHandle>> = assign_handles(
            entities
                .iter()
                .enumerate()
                .map(|(i, (_, entity))| index.get(&entity.id) == Some(&Slot::Entity(i))),
            EntityHandle,
        );
        let event_handles: Vec<Option<EventHandle>> = assign_handles(
            states
                .iter()
                .map(|state| matches!(state, EventState::Resolved { .. })),
            EventHandle,
        );

        let linker = Linker {
            index: &index,
            events: &events,
            states: &states,
            entity_handles: &entity_handles,
            event_handles: &event_handles,
        };

        let mut resolved_relations = Vec::with_capacity(relations.len());
        for (i, record) in relations.into_iter().enumerate() {
            if index.get(&record.id) != Some(&Slot::Relation(i)) {
                continue;
            }
            let args = linker.resolve_arguments(record.line, &record.id, &record.args);
            if let Some(args) = ctx.check(args)? {
                resolved_relations.push(Relation {
                    id: record.id,
                    relation_type: record.relation_type,
                    args,
                    equivalence: false,
                });
            }
        }

        for record in equivalences {
            let members = record
                .members
                .iter()
                .map(|m| linker.resolve_entity(record.line, "*", m))
                .collect::<std::result::Result<Vec<_>, _>>();
            let Some(members) = ctx.check(members)? else {
                continue;
            };
            for (a, first) in members.iter().enumerate() {
                for (b, second) in members.iter().enumerate().skip(a + 1) {
                    resolved_relations.push(Relation {
                        id: format!("Equiv:{}-{}", record.members[a], record.members[b]),
                        relation_type: record.relation_type.clone(),
                        args: vec![
                            Argument {
                                role: "Arg1".to_string(),
                                target: Target::Entity(*first),
                            },
                            Argument {
                                role: "Arg2".to_string(),
                                target: Target::Entity(*second),
                            },
                        ],
                        equivalence: true,
                    });
                }
            }
        }

        let mut resolved_attributes = Vec::with_capacity(attributes.len());
        for record in attributes {
            let target = linker.resolve_target(record.line, &record.id, &record.target);
            if let Some(target) = ctx.check(target)? {
                resolved_attributes.push(Attribute {
                    id: record.id,
                    attribute_type: record.attribute_type,
                    target,
                    value: record.value,
                });
            }
        }

        let mut resolved_normalizations = Vec::with_capacity(normalizations.len());
        for record in normalizations {
            let target = linker.resolve_target(record.line, &record.id, &record.target);
            if let Some(target) = ctx.check(target)? {
                resolved_normalizations.push(Normalization {
                    id: record.id,
                    normalization_type: record.normalization_type,
                    target,
                    resource: record.resource,
                    entry: record.entry,
                    text: record.text,
                });
            }
        }

        let mut resolved_notes = Vec::with_capacity(notes.len());
        for record in notes {
            let target = linker.resolve_target(record.line, &record.id, &record.target);
            if let Some(target) = ctx.check(target)? {
                resolved_notes.push(Note {
                    id: record.id,
                    note_type: record.note_type,
                    target,
                    text: record.text,
                });
            }
        }

        // Resolved states only hold indices of surviving entities and events,
        // so every handle lookup below succeeds.
        let resolved_events: Vec<Event> = events
            .into_iter()
            .zip(states)
            .filter_map(|(record, state)| match state {
                EventState::Resolved { trigger, args } => Some(Event {
                    id: record.id,
                    event_type: record.event_type,
                    trigger: entity_handles[trigger]?,
                    args: args
                        .into_iter()
                        .map(|(role, raw)| {
                            Some(Argument {
                                role,
                                target: to_target(raw, &entity_handles, &event_handles)?,
                            })
                        })
                        .collect::<Option<Vec<_>>>()?,
                }),
                _ => None,
            })
            .collect();

        let resolved_entities: Vec<Entity> = entities
            .into_iter()
            .zip(&entity_handles)
            .filter_map(|((_, entity), handle)| handle.is_some().then_some(entity))
            .collect();

        debug!(
            entities = resolved_entities.len(),
            relations = resolved_relations.len(),
            events = resolved_events.len(),
            "resolved annotations"
        );

        Ok(ResolvedAnnotations {
            entities: resolved_entities,
            relations: resolved_relations,
            events: resolved_events,
            attributes: resolved_attributes,
            normalizations: resolved_normalizations,
            notes: resolved_notes,
        })
    }
}

// ------------------------------------------------------------------
// Identifier index
// ------------------------------------------------------------------

/// Indexes every entity, relation and event id. Ids defined more than once
/// map to `Slot::Ambiguous`, and each defining record is reported.
fn build_index(
    entities: &[(usize, Entity)],
    dropped_entities: &[(usize, String)],
    relations: &[RelationRecord],
    events: &[EventRecord],
    ctx: &mut PolicyContext,
) -> Result<HashMap<String, Slot>> {
    let mut definitions: Vec<(usize, &str, Slot)> = Vec::new();
    for (i, (line, entity)) in entities.iter().enumerate() {
        definitions.push((*line, &entity.id, Slot::Entity(i)));
    }
    for (line, id) in dropped_entities {
        definitions.push((*line, id, Slot::Dropped));
    }
    for (i, relation) in relations.iter().enumerate() {
        definitions.push((relation.line, &relation.id, Slot::Relation(i)));
    }
    for (j, event) in events.iter().enumerate() {
        definitions.push((event.line, &event.id, Slot::Event(j)));
    }
    definitions.sort_by_key(|(line, _, _)| *line);

    let mut index: HashMap<String, Slot> = HashMap::with_capacity(definitions.len());
    for (_, id, slot) in &definitions {
        index
            .entry(id.to_string())
            .and_modify(|existing| *existing = Slot::Ambiguous)
            .or_insert(*slot);
    }

    // Rejected records have already been reported.
    for (line, id, slot) in &definitions {
        if *slot != Slot::Dropped && index.get(*id) == Some(&Slot::Ambiguous) {
            ctx.report(AnnotationError::AmbiguousId {
                line: *line,
                id: id.to_string(),
            })?;
        }
    }

    Ok(index)
}

/// Numbers the kept records consecutively, in order.
fn assign_handles<H>(keep: impl Iterator<Item = bool>, handle: fn(usize) -> H) -> Vec<Option<H>> {
    let mut next = 0;
    keep.map(|kept| {
        kept.then(|| {
            next += 1;
            handle(next - 1)
        })
    })
    .collect()
}

fn to_target(
    raw: RawTarget,
    entity_handles: &[Option<EntityHandle>],
    event_handles: &[Option<EventHandle>],
) -> Option<Target> {
    match raw {
        RawTarget::Entity(i) => entity_handles[i].map(Target::Entity),
        RawTarget::Event(j) => event_handles[j].map(Target::Event),
    }
}

fn describe(slot: Slot) -> &'static str {
    match slot {
        Slot::Entity(_) => "an entity",
        Slot::Relation(_) => "a relation",
        Slot::Event(_) => "an event",
        Slot::Dropped => "a rejected annotation",
        Slot::Ambiguous => "an ambiguous identifier",
    }
}

fn reference_error(
    line: usize,
    owner: &str,
    reference: &str,
    slot: Option<Slot>,
    expected: &str,
) -> AnnotationError {
    match slot {
        Some(Slot::Ambiguous) => AnnotationError::AmbiguousId {
            line,
            id: reference.to_string(),
        },
        Some(Slot::Dropped) => AnnotationError::DanglingReference {
            line,
            id: owner.to_string(),
            reference: reference.to_string(),
            reason: "annotation was rejected".to_string(),
        },
        None => AnnotationError::DanglingReference {
            line,
            id: owner.to_string(),
            reference: reference.to_string(),
            reason: "no annotation with this identifier".to_string(),
        },
        Some(found) => AnnotationError::DanglingReference {
            line,
            id: owner.to_string(),
            reference: reference.to_string(),
            reason: format!("expected {}, found {}", expected, describe(found)),
        },
    }
}

fn dependency_error(line: usize, owner: &str, reference: &str, failure: &Failure) -> AnnotationError {
    match failure {
        Failure::Cycle(cycle) => AnnotationError::CyclicReference {
            line,
            id: owner.to_string(),
            cycle: cycle.clone(),
        },
        Failure::Unresolved => AnnotationError::DanglingReference {
            line,
            id: owner.to_string(),
            reference: reference.to_string(),
            reason: "event could not be resolved".to_string(),
        },
    }
}

// ------------------------------------------------------------------
// Event dependency graph
// ------------------------------------------------------------------

/// An event on the current DFS path, with the arguments linked so far.
struct Frame {
    ev: usize,
    trigger: usize,
    next_arg: usize,
    args: Vec<(String, RawTarget)>,
}

enum Step {
    Link(RawTarget),
    Descend(usize),
    Fail(AnnotationError, Failure),
}

/// Depth-first walk over event-to-event argument edges, driven by an explicit
/// frame stack so arbitrarily long event chains cannot exhaust the thread
/// stack. `Visiting` marks the events on the current path; reaching one again
/// closes a cycle.
struct EventGraph<'r> {
    events: &'r [EventRecord],
    index: &'r HashMap<String, Slot>,
    states: Vec<EventState>,
    stack: Vec<Frame>,
}

impl EventGraph<'_> {
    fn visit(&mut self, root: usize, ctx: &mut PolicyContext) -> Result<()> {
        if !matches!(self.states[root], EventState::Unvisited) {
            return Ok(());
        }
        self.enter(root, ctx)?;

        loop {
            let Some(frame) = self.stack.last() else {
                return Ok(());
            };
            let events = self.events;
            let record = &events[frame.ev];
            let Some((role, reference)) = record.args.get(frame.next_arg) else {
                if let Some(done) = self.stack.pop() {
                    self.states[done.ev] = EventState::Resolved {
                        trigger: done.trigger,
                        args: done.args,
                    };
                }
                continue;
            };

            match self.step(record, reference) {
                Step::Link(target) => {
                    if let Some(frame) = self.stack.last_mut() {
                        frame.args.push((role.clone(), target));
                        frame.next_arg += 1;
                    }
                }
                // The same argument is looked at again once `j` has settled.
                Step::Descend(j) => self.enter(j, ctx)?,
                Step::Fail(error, failure) => {
                    if let Some(failed) = self.stack.pop() {
                        self.states[failed.ev] = EventState::Failed(failure);
                    }
                    ctx.report(error)?;
                }
            }
        }
    }

    /// Marks `ev` as visiting and pushes its frame, or fails it right away
    /// when its trigger is not an entity.
    fn enter(&mut self, ev: usize, ctx: &mut PolicyContext) -> Result<()> {
        let events = self.events;
        let record = &events[ev];
        match self.index.get(&record.trigger).copied() {
            Some(Slot::Entity(i)) => {
                self.states[ev] = EventState::Visiting;
                self.stack.push(Frame {
                    ev,
                    trigger: i,
                    next_arg: 0,
                    args: Vec::with_capacity(record.args.len()),
                });
                Ok(())
            }
            other => {
                let error = reference_error(record.line, &record.id, &record.trigger, other, "an entity");
                self.states[ev] = EventState::Failed(Failure::Unresolved);
                ctx.report(error)
            }
        }
    }

    fn step(&self, record: &EventRecord, reference: &str) -> Step {
        match self.index.get(reference).copied() {
            Some(Slot::Entity(i)) => Step::Link(RawTarget::Entity(i)),
            Some(Slot::Event(j)) => match &self.states[j] {
                EventState::Unvisited => Step::Descend(j),
                EventState::Resolved { .. } => Step::Link(RawTarget::Event(j)),
                EventState::Failed(failure) => Step::Fail(
                    dependency_error(record.line, &record.id, reference, failure),
                    failure.clone(),
                ),
                EventState::Visiting => {
                    let start = self.stack.iter().position(|f| f.ev == j).unwrap_or(0);
                    let mut cycle: Vec<String> = self.stack[start..]
                        .iter()
                        .map(|f| self.events[f.ev].id.clone())
                        .collect();
                    cycle.push(self.events[j].id.clone());
                    let error = AnnotationError::CyclicReference {
                        line: record.line,
                        id: record.id.clone(),
                        cycle: cycle.clone(),
                    };
                    Step::Fail(error, Failure::Cycle(cycle))
                }
            },
            other => Step::Fail(
                reference_error(record.line, &record.id, reference, other, "an entity or event"),
                Failure::Unresolved,
            ),
        }
    }
}

// ------------------------------------------------------------------
// Target resolution once events are settled
// ------------------------------------------------------------------

struct Linker<'r> {
    index: &'r HashMap<String, Slot>,
    events: &'r [EventRecord],
    states: &'r [EventState],
    entity_handles: &'r [Option<EntityHandle>],
    event_handles: &'r [Option<EventHandle>],
}

impl Linker<'_> {
    fn resolve_target(
        &self,
        line: usize,
        owner: &str,
        reference: &str,
    ) -> std::result::Result<Target, AnnotationError> {
        let raw = match self.index.get(reference).copied() {
            Some(Slot::Entity(i)) => RawTarget::Entity(i),
            Some(Slot::Event(j)) => match &self.states[j] {
                EventState::Resolved { .. } => RawTarget::Event(j),
                EventState::Failed(failure) => {
                    return Err(dependency_error(line, owner, reference, failure))
                }
                _ => {
                    return Err(dependency_error(
                        line,
                        owner,
                        &self.events[j].id,
                        &Failure::Unresolved,
                    ))
                }
            },
            other => {
                return Err(reference_error(
                    line,
                    owner,
                    reference,
                    other,
                    "an entity or event",
                ))
            }
        };
        to_target(raw, self.entity_handles, self.event_handles)
            .ok_or_else(|| dependency_error(line, owner, reference, &Failure::Unresolved))
    }

    fn resolve_entity(
        &self,
        line: usize,
        owner: &str,
        reference: &str,
    ) -> std::result::Result<EntityHandle, AnnotationError> {
        match self.index.get(reference).copied() {
            Some(Slot::Entity(i)) => self.entity_handles[i]
                .ok_or_else(|| dependency_error(line, owner, reference, &Failure::Unresolved)),
            other => Err(reference_error(line, owner, reference, other, "an entity")),
        }
    }

    fn resolve_arguments(
        &self,
        line: usize,
        owner: &str,
        args: &[(String, String)],
    ) -> std::result::Result<Vec<Argument>, AnnotationError> {
        args.iter()
            .map(|(role, reference)| {
                Ok(Argument {
                    role: role.clone(),
                    target: self.resolve_target(line, owner, reference)?,
                })
            })
            .collect()
    }
}
