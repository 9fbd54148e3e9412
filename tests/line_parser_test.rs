use std::collections::HashSet;

use bratparse::errors::{AnnotationError, ErrorKind};
use bratparse::extraction::LineParser;
use bratparse::types::*;

fn parse(raw: &str) -> Result<Option<Record>, AnnotationError> {
    LineParser::new().parse_line(1, raw)
}

#[test]
fn test_entity_line() {
    let record = parse("T1\tProtein 10 14\tTP53").unwrap().unwrap();
    assert_eq!(
        record,
        Record::Entity(EntityRecord {
            line: 1,
            id: "T1".to_string(),
            entity_type: "Protein".to_string(),
            spans: vec![(10, 14)],
            text: "TP53".to_string(),
        })
    );
}

#[test]
fn test_discontinuous_entity_line() {
    let Some(Record::Entity(entity)) = parse("T2\tDrug 0 5;9 15\tsmall molecule").unwrap() else {
        panic!("expected entity");
    };
    assert_eq!(entity.spans, vec![(0, 5), (9, 15)]);
    assert_eq!(entity.text, "small molecule");
}

#[test]
fn test_entity_text_keeps_tabs_and_crlf_is_trimmed() {
    let Some(Record::Entity(entity)) = parse("T1\tX 0 3\ta\tb\r").unwrap() else {
        panic!("expected entity");
    };
    assert_eq!(entity.text, "a\tb");
}

#[test]
fn test_entity_errors() {
    for raw in [
        "T1\tProtein\tTP53",
        "T1\tProtein 10\tTP53",
        "T1\tProtein -1 4\tTP53",
        "T1\tProtein a b\tTP53",
        "T1\tProtein 1 2 3\tTP53",
        "T1\tProtein 10 14",
        "T\tProtein 10 14\tTP53",
    ] {
        let err = parse(raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LineFormat, "{}", raw);
    }
}

#[test]
fn test_relation_line() {
    let Some(Record::Relation(relation)) = parse("R1\tBinds Arg1:T1 Arg2:T2").unwrap() else {
        panic!("expected relation");
    };
    assert_eq!(relation.relation_type, "Binds");
    assert_eq!(
        relation.args,
        vec![
            ("Arg1".to_string(), "T1".to_string()),
            ("Arg2".to_string(), "T2".to_string())
        ]
    );
}

#[test]
fn test_relation_allows_empty_trailing_field() {
    assert!(parse("R1\tBinds Arg1:T1 Arg2:T2\t").unwrap().is_some());
    assert!(parse("R1\tBinds Arg1:T1 Arg2:T2\tjunk").is_err());
}

#[test]
fn test_relation_errors() {
    assert!(parse("R1\tBinds").is_err());
    assert!(parse("R1\tBinds Arg1T1").is_err());
    assert!(parse("R1\tBinds :T1").is_err());
    assert!(parse("R1").is_err());
}

#[test]
fn test_equivalence_line() {
    let Some(Record::Equivalence(equiv)) = parse("*\tEquiv T1 T2 T3").unwrap() else {
        panic!("expected equivalence");
    };
    assert_eq!(equiv.relation_type, "Equiv");
    assert_eq!(equiv.members, vec!["T1", "T2", "T3"]);
    assert!(parse("*\tEquiv T1").is_err());
    assert!(parse("*\tEquiv Arg1:T1 T2").is_err());
}

#[test]
fn test_event_line() {
    let Some(Record::Event(event)) = parse("E1\tPhosphorylation:T3 Theme:T1 Cause:E2").unwrap()
    else {
        panic!("expected event");
    };
    assert_eq!(event.event_type, "Phosphorylation");
    assert_eq!(event.trigger, "T3");
    assert_eq!(event.args.len(), 2);
    assert_eq!(event.args[1], ("Cause".to_string(), "E2".to_string()));
}

#[test]
fn test_event_without_arguments() {
    let Some(Record::Event(event)) = parse("E1\tGene_expression:T3").unwrap() else {
        panic!("expected event");
    };
    assert!(event.args.is_empty());
    assert!(parse("E1\tGene_expression").is_err());
    assert!(parse("E1\t:T3").is_err());
}

#[test]
fn test_attribute_lines() {
    let Some(Record::Attribute(binary)) = parse("A1\tNegation E1").unwrap() else {
        panic!("expected attribute");
    };
    assert_eq!(binary.target, "E1");
    assert_eq!(binary.value, None);

    let Some(Record::Attribute(valued)) = parse("M2\tConfidence E1 High").unwrap() else {
        panic!("expected attribute");
    };
    assert_eq!(valued.id, "M2");
    assert_eq!(valued.value.as_deref(), Some("High"));

    assert!(parse("A1\tNegation").is_err());
    assert!(parse("A1\tNegation E1 High Extra").is_err());
}

#[test]
fn test_normalization_line() {
    let Some(Record::Normalization(norm)) =
        parse("N1\tReference T1 Wikipedia:534366\tBarack Obama").unwrap()
    else {
        panic!("expected normalization");
    };
    assert_eq!(norm.resource, "Wikipedia");
    assert_eq!(norm.entry, "534366");
    assert_eq!(norm.text.as_deref(), Some("Barack Obama"));
    assert!(parse("N1\tReference T1 Wikipedia").is_err());
}

#[test]
fn test_note_and_comment_lines() {
    let Some(Record::Note(note)) = parse("#1\tAnnotatorNotes T1\tcheck this").unwrap() else {
        panic!("expected note");
    };
    assert_eq!(note.target, "T1");
    assert_eq!(note.text, "check this");

    assert_eq!(parse("# a free comment").unwrap(), None);
    assert_eq!(parse("#").unwrap(), None);
}

#[test]
fn test_blank_and_unknown_lines() {
    assert_eq!(parse("").unwrap(), None);
    assert_eq!(parse("   ").unwrap(), None);
    let err = parse("X1\tFoo T1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LineFormat);
    assert_eq!(err.line(), 1);
}

#[test]
fn test_ignored_kinds_are_skipped() {
    let parser = LineParser::with_ignored(HashSet::from([AnnotationKind::Attribute]));
    assert_eq!(parser.parse_line(1, "A1\tNegation E1").unwrap(), None);
    assert_eq!(parser.parse_line(1, "A1\tmalformed").unwrap(), None);
    assert!(parser.parse_line(1, "M1\tNegation E1").unwrap().is_some());
}

#[test]
fn test_parse_all_numbers_lines() {
    let source = "T1\tProtein 0 4\tTP53\n\n# comment\nR1\tBinds\nE1\tBinding:T1\n";
    let outcomes = LineParser::new().parse_all(source);
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].as_ref().unwrap().line(), 1);
    assert_eq!(outcomes[1].as_ref().unwrap_err().line(), 4);
    assert_eq!(outcomes[2].as_ref().unwrap().line(), 5);
}
