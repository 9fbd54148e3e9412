use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::ParserConfig;
use crate::document::Document;
use crate::errors::{AnnotationError, BratError, Result};
use crate::extraction::{LineParser, SpanMerger};
use crate::pairing::collect_pairs;
use crate::policy::{Diagnostic, ErrorPolicy, PolicyContext};
use crate::resolution::{PendingAnnotations, ReferenceResolver};
use crate::types::{Record, Span};

/// One document and the diagnostics produced while parsing it.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of parsing a directory or document pair.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    /// Documents sorted by identifier.
    pub documents: Vec<Document>,
    /// Everything dropped under the `warn` policy, per document and line.
    pub diagnostics: Vec<Diagnostic>,
    /// Time taken in milliseconds.
    pub duration_ms: u64,
}

/// Parses brat documents according to a [`ParserConfig`].
///
/// The parser holds no per-document state, so one instance can be shared by
/// the rayon workers that parse a corpus.
pub struct BratParser {
    config: ParserConfig,
    line_parser: LineParser,
}

/// A text/annotation pair with both files present.
struct PairedFiles<'p> {
    key: &'p str,
    text: &'p Path,
    annotation: &'p Path,
}

/// Parses every document pair under `path` with a default configuration and
/// the given error policy.
pub fn parse(path: impl AsRef<Path>, policy: ErrorPolicy) -> Result<Vec<Document>> {
    let parser = BratParser::new(ParserConfig::with_policy(policy))?;
    Ok(parser.parse(path.as_ref())?.documents)
}

impl BratParser {
    /// Creates a parser, rejecting invalid configurations.
    pub fn new(config: ParserConfig) -> Result<Self> {
        config.validate()?;
        let line_parser = LineParser::with_ignored(config.ignored_kinds());
        Ok(Self {
            config,
            line_parser,
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses a directory, a single document file, or a basename.
    ///
    /// Unpaired and unreadable files go through the error policy: under
    /// `raise` the first one (in identifier order) aborts the whole build.
    pub fn parse(&self, path: &Path) -> Result<Corpus> {
        let start = Instant::now();
        let policy = self.config.error_policy;
        let mut corpus_ctx = PolicyContext::new(policy, path.display().to_string());

        let pairs = collect_pairs(path, &self.config)?;
        let mut complete: Vec<PairedFiles<'_>> = Vec::with_capacity(pairs.len());
        for pair in &pairs {
            let missing = match (&pair.text, &pair.annotation) {
                (Some(text), Some(annotation)) => {
                    complete.push(PairedFiles {
                        key: &pair.key,
                        text,
                        annotation,
                    });
                    continue;
                }
                (None, _) => &self.config.text_extension,
                (Some(_), None) => &self.config.annotation_extension,
            };
            let error = BratError::MissingPair {
                key: pair.key.clone(),
                missing: missing.trim_start_matches('.').to_string(),
            };
            corpus_ctx.report_file(&pair.key, error)?;
        }

        let parse_one =
            |files: &PairedFiles<'_>| self.parse_pair(files.key, files.text, files.annotation);
        let outcomes: Vec<Result<ParsedDocument>> = if self.config.parallel {
            complete.par_iter().map(parse_one).collect()
        } else {
            complete.iter().map(parse_one).collect()
        };

        let mut documents = Vec::with_capacity(outcomes.len());
        let mut diagnostics = Vec::new();
        for (files, outcome) in complete.iter().zip(outcomes) {
            match outcome {
                Ok(parsed) => {
                    diagnostics.extend(parsed.diagnostics);
                    documents.push(parsed.document);
                }
                Err(error @ BratError::File { .. }) => corpus_ctx.report_file(files.key, error)?,
                Err(error) => return Err(error),
            }
        }

        diagnostics.extend(corpus_ctx.into_diagnostics());
        diagnostics.sort_by(|a, b| (&a.document, a.line).cmp(&(&b.document, b.line)));
        documents.sort_by(|a, b| a.id().cmp(b.id()));

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            documents = documents.len(),
            diagnostics = diagnostics.len(),
            duration_ms,
            "parsed corpus {}",
            path.display()
        );

        Ok(Corpus {
            documents,
            diagnostics,
            duration_ms,
        })
    }

    /// Reads and parses one text/annotation file pair.
    pub fn parse_pair(&self, id: &str, text_path: &Path, ann_path: &Path) -> Result<ParsedDocument> {
        let text = self.read_file(text_path)?;
        let annotations = self.read_file(ann_path)?;
        self.parse_document(id, text, &annotations)
    }

    /// Parses annotation content over a document text already in memory.
    ///
    /// Under `raise` the first failing record aborts with an error; otherwise
    /// failing records are left out of the returned document.
    pub fn parse_document(&self, id: &str, text: String, annotations: &str) -> Result<ParsedDocument> {
        let mut ctx = PolicyContext::new(self.config.error_policy, id);
        let merger = SpanMerger::new(&text, &self.config.fragment_separator);
        let mut pending = PendingAnnotations::default();

        for outcome in self.line_parser.parse_all(annotations) {
            let Some(record) = ctx.check(outcome)? else {
                continue;
            };
            match record {
                Record::Entity(record) => {
                    let (line, id) = (record.line, record.id.clone());
                    match ctx.check(merger.merge(record))? {
                        Some(entity) => pending.entities.push((line, entity)),
                        None => pending.dropped_entities.push((line, id)),
                    }
                }
                Record::Relation(record) => pending.relations.push(record),
                Record::Equivalence(record) => pending.equivalences.push(record),
                Record::Event(record) => pending.events.push(record),
                Record::Attribute(record) => pending.attributes.push(record),
                Record::Normalization(record) => pending.normalizations.push(record),
                Record::Note(record) => pending.notes.push(record),
            }
        }

        if self.config.reject_duplicate_spans {
            reject_duplicate_spans(&mut pending, &mut ctx)?;
        }

        let resolved = ReferenceResolver::new(pending).resolve(&mut ctx)?;
        debug!(document = id, dropped = ctx.dropped(), "parsed document");

        let mut diagnostics = ctx.into_diagnostics();
        diagnostics.sort_by_key(|d| d.line);

        Ok(ParsedDocument {
            document: Document::assemble(id, text, resolved),
            diagnostics,
        })
    }

    fn read_file(&self, path: &Path) -> Result<String> {
        let metadata = fs::metadata(path).map_err(|e| file_error(path, e))?;
        if metadata.len() > self.config.max_file_size {
            return Err(BratError::File {
                message: format!(
                    "file is {} bytes, larger than the {} byte limit",
                    metadata.len(),
                    self.config.max_file_size
                ),
                path: path.display().to_string(),
            });
        }
        fs::read_to_string(path).map_err(|e| file_error(path, e))
    }
}

fn file_error(path: &Path, error: std::io::Error) -> BratError {
    BratError::File {
        message: format!("failed to read file: {}", error),
        path: path.display().to_string(),
    }
}

/// Drops every entity whose span list repeats an earlier entity's.
fn reject_duplicate_spans(pending: &mut PendingAnnotations, ctx: &mut PolicyContext) -> Result<()> {
    let mut seen: HashMap<Vec<Span>, String> = HashMap::new();
    let entities = std::mem::take(&mut pending.entities);
    for (line, entity) in entities {
        if let Some(original) = seen.get(&entity.spans) {
            ctx.report(AnnotationError::DuplicateSpan {
                line,
                id: entity.id.clone(),
                original: original.clone(),
            })?;
            pending.dropped_entities.push((line, entity.id));
            continue;
        }
        seen.insert(entity.spans.clone(), entity.id.clone());
        pending.entities.push((line, entity));
    }
    Ok(())
}
