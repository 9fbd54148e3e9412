use std::fs;
use std::path::Path;

use bratparse::config::{save_config, get_config_path, load_config, ParserConfig};
use bratparse::errors::{BratError, ErrorKind};
use bratparse::{parse, BratParser, ErrorPolicy};
use tempfile::TempDir;

fn write_doc(dir: &Path, name: &str, text: &str, ann: &str) {
    fs::write(dir.join(format!("{}.txt", name)), text).unwrap();
    fs::write(dir.join(format!("{}.ann", name)), ann).unwrap();
}

fn parser(policy: ErrorPolicy) -> BratParser {
    BratParser::new(ParserConfig::with_policy(policy)).unwrap()
}

#[test]
fn test_single_entity_document() {
    let dir = TempDir::new().unwrap();
    write_doc(
        dir.path(),
        "doc1",
        "Mutations in TP53 are common.",
        "T1\tProtein 13 17\tTP53\n",
    );

    let docs = parse(dir.path(), ErrorPolicy::Raise).unwrap();
    assert_eq!(docs.len(), 1);
    let entity = &docs[0].entities()[0];
    assert_eq!(docs[0].id(), "doc1");
    assert_eq!(entity.id, "T1");
    assert_eq!(entity.entity_type, "Protein");
    assert_eq!(docs[0].span_text(entity.spans[0]), Some("TP53"));
}

#[test]
fn test_missing_pair_ignore_and_raise() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), "doc1", "TP53", "T1\tProtein 0 4\tTP53\n");
    fs::write(dir.path().join("doc2.ann"), "T1\tProtein 0 4\tTP53\n").unwrap();

    let docs = parse(dir.path(), ErrorPolicy::Ignore).unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id(), "doc1");

    let err = parse(dir.path(), ErrorPolicy::Raise).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::MissingPair));
    let BratError::MissingPair { key, missing } = err else {
        panic!("expected missing pair");
    };
    assert_eq!(key, "doc2");
    assert_eq!(missing, "txt");
}

#[test]
fn test_missing_pair_warn_diagnostic() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), "doc1", "TP53", "T1\tProtein 0 4\tTP53\n");
    fs::write(dir.path().join("doc3.txt"), "no annotations").unwrap();

    let corpus = parser(ErrorPolicy::Warn).parse(dir.path()).unwrap();
    assert_eq!(corpus.documents.len(), 1);
    assert_eq!(corpus.diagnostics.len(), 1);
    assert_eq!(corpus.diagnostics[0].document, "doc3");
    assert_eq!(corpus.diagnostics[0].kind, ErrorKind::MissingPair);
}

#[test]
fn test_documents_sorted_and_nested_keys() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("train")).unwrap();
    write_doc(dir.path(), "b", "x", "");
    write_doc(dir.path(), "a", "x", "");
    write_doc(&dir.path().join("train"), "c", "x", "");

    for parallel in [true, false] {
        let mut config = ParserConfig::default();
        config.parallel = parallel;
        let corpus = BratParser::new(config).unwrap().parse(dir.path()).unwrap();
        let ids: Vec<&str> = corpus.documents.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["a", "b", "train/c"]);
    }
}

#[test]
fn test_hidden_and_excluded_files_skipped() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(".cache")).unwrap();
    fs::create_dir_all(dir.path().join("drafts")).unwrap();
    write_doc(dir.path(), "doc1", "x", "");
    write_doc(&dir.path().join(".cache"), "doc2", "x", "");
    write_doc(&dir.path().join("drafts"), "doc3", "x", "");

    let mut config = ParserConfig::default();
    config.exclude.push("drafts/**".to_string());
    let corpus = BratParser::new(config).unwrap().parse(dir.path()).unwrap();
    assert_eq!(corpus.documents.len(), 1);
}

#[test]
fn test_parse_single_file_or_basename() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), "doc1", "TP53", "T1\tProtein 0 4\tTP53\n");
    write_doc(dir.path(), "doc2", "MDM2", "T1\tProtein 0 4\tMDM2\n");

    let by_ann = parse(dir.path().join("doc1.ann"), ErrorPolicy::Raise).unwrap();
    assert_eq!(by_ann.len(), 1);
    assert_eq!(by_ann[0].id(), "doc1");

    let by_base = parse(dir.path().join("doc2"), ErrorPolicy::Raise).unwrap();
    assert_eq!(by_base[0].entities()[0].text, "MDM2");

    assert!(parse(dir.path().join("doc9"), ErrorPolicy::Ignore).is_err());
}

#[test]
fn test_raise_aborts_corpus_on_bad_document() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), "good", "TP53", "T1\tProtein 0 4\tTP53\n");
    write_doc(dir.path(), "bad", "TP53", "T1\tProtein 0 4\tTP63\n");

    let err = parse(dir.path(), ErrorPolicy::Raise).unwrap_err();
    let BratError::Annotation { document, source } = err else {
        panic!("expected annotation error");
    };
    assert_eq!(document, "bad");
    assert_eq!(source.kind(), ErrorKind::TextMismatch);

    let docs = parse(dir.path(), ErrorPolicy::Ignore).unwrap();
    assert_eq!(docs.len(), 2);
    let bad = docs.iter().find(|d| d.id() == "bad").unwrap();
    assert!(bad.entities().is_empty());
}

#[test]
fn test_oversized_file_is_file_error() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), "doc1", "TP53 TP53 TP53", "");

    let mut config = ParserConfig::with_policy(ErrorPolicy::Warn);
    config.max_file_size = 4;
    let corpus = BratParser::new(config.clone()).unwrap().parse(dir.path()).unwrap();
    assert!(corpus.documents.is_empty());
    assert_eq!(corpus.diagnostics[0].kind, ErrorKind::File);

    config.error_policy = ErrorPolicy::Raise;
    let err = BratParser::new(config).unwrap().parse(dir.path()).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::File));
}

#[test]
fn test_duplicate_spans_opt_in() {
    let dir = TempDir::new().unwrap();
    write_doc(
        dir.path(),
        "doc1",
        "TP53",
        "T1\tProtein 0 4\tTP53\nT2\tGene 0 4\tTP53\n",
    );

    let docs = parse(dir.path(), ErrorPolicy::Raise).unwrap();
    assert_eq!(docs[0].entities().len(), 2);

    let mut config = ParserConfig::with_policy(ErrorPolicy::Warn);
    config.reject_duplicate_spans = true;
    let corpus = BratParser::new(config).unwrap().parse(dir.path()).unwrap();
    assert_eq!(corpus.documents[0].entities().len(), 1);
    assert_eq!(corpus.diagnostics[0].kind, ErrorKind::DuplicateSpan);
    assert_eq!(corpus.diagnostics[0].line, Some(2));
}

#[test]
fn test_ignore_types_and_custom_extensions() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("doc1.text"), "TP53").unwrap();
    fs::write(
        dir.path().join("doc1.brat"),
        "T1\tProtein 0 4\tTP53\nA1\tNegation T1\nN1\tReference T9 X:1\n",
    )
    .unwrap();

    let mut config = ParserConfig::default();
    config.text_extension = "text".to_string();
    config.annotation_extension = ".brat".to_string();
    config.ignore_types = vec!["A".to_string(), "N".to_string()];
    save_config(&get_config_path(dir.path()), &config).unwrap();

    let loaded = load_config(&get_config_path(dir.path())).unwrap();
    let corpus = BratParser::new(loaded).unwrap().parse(dir.path()).unwrap();
    let doc = &corpus.documents[0];
    assert_eq!(doc.entities().len(), 1);
    assert!(doc.attributes().is_empty());
    assert!(doc.normalizations().is_empty());
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = ParserConfig::default();
    config.ignore_types = vec!["Q".to_string()];
    assert!(BratParser::new(config).is_err());
}

#[test]
fn test_missing_pair_names_extension_without_dot() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("doc1.txt"), "TP53").unwrap();
    fs::write(dir.path().join("doc2.brat"), "").unwrap();

    let mut config = ParserConfig::with_policy(ErrorPolicy::Warn);
    config.annotation_extension = ".brat".to_string();
    let corpus = BratParser::new(config.clone()).unwrap().parse(dir.path()).unwrap();
    assert!(corpus.documents.is_empty());
    let messages: Vec<String> = corpus.diagnostics.iter().map(|d| d.message.clone()).collect();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].contains("doc1 has no .brat file"), "{}", messages[0]);
    assert!(messages[1].contains("doc2 has no .txt file"), "{}", messages[1]);

    config.error_policy = ErrorPolicy::Raise;
    let err = BratParser::new(config).unwrap().parse(dir.path()).unwrap_err();
    let BratError::MissingPair { key, missing } = err else {
        panic!("expected missing pair");
    };
    assert_eq!(key, "doc1");
    assert_eq!(missing, "brat");
}
