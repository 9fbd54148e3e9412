use crate::document::Document;
use crate::types::Argument;

/// Renders a document's annotations back into brat standoff syntax.
///
/// Entities come first, then relations, equivalences, events, attributes,
/// normalizations and notes, each in document order. Equivalence relations
/// are written as binary `*` lines.
pub fn to_standoff(document: &Document) -> String {
    let mut out = String::new();

    for entity in document.entities() {
        let spans: Vec<String> = entity
            .spans
            .iter()
            .map(|s| format!("{} {}", s.start, s.end))
            .collect();
        out.push_str(&format!(
            "{}\t{} {}\t{}\n",
            entity.id,
            entity.entity_type,
            spans.join(";"),
            entity.text
        ));
    }

    for relation in document.relations().iter().filter(|r| !r.equivalence) {
        out.push_str(&format!(
            "{}\t{} {}\n",
            relation.id,
            relation.relation_type,
            join_args(document, &relation.args)
        ));
    }

    for relation in document.relations().iter().filter(|r| r.equivalence) {
        let members: Vec<&str> = relation
            .args
            .iter()
            .map(|a| document.target_id(a.target))
            .collect();
        out.push_str(&format!("*\t{} {}\n", relation.relation_type, members.join(" ")));
    }

    for event in document.events() {
        let trigger = &document.entity(event.trigger).id;
        out.push_str(&format!("{}\t{}:{}", event.id, event.event_type, trigger));
        if !event.args.is_empty() {
            out.push(' ');
            out.push_str(&join_args(document, &event.args));
        }
        out.push('\n');
    }

    for attribute in document.attributes() {
        out.push_str(&format!(
            "{}\t{} {}",
            attribute.id,
            attribute.attribute_type,
            document.target_id(attribute.target)
        ));
        if let Some(ref value) = attribute.value {
            out.push_str(&format!(" {}", value));
        }
        out.push('\n');
    }

    for normalization in document.normalizations() {
        out.push_str(&format!(
            "{}\t{} {} {}:{}\t{}\n",
            normalization.id,
            normalization.normalization_type,
            document.target_id(normalization.target),
            normalization.resource,
            normalization.entry,
            normalization.text.as_deref().unwrap_or_default()
        ));
    }

    for note in document.notes() {
        out.push_str(&format!(
            "{}\t{} {}\t{}\n",
            note.id,
            note.note_type,
            document.target_id(note.target),
            note.text
        ));
    }

    out
}

fn join_args(document: &Document, args: &[Argument]) -> String {
    args.iter()
        .map(|a| format!("{}:{}", a.role, document.target_id(a.target)))
        .collect::<Vec<_>>()
        .join(" ")
}
