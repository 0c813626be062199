//! Batch Partitioner Integration Tests
//!
//! Runs the validator against an ontology loaded from an N-Triples file and
//! checks the partition outputs on disk, in N-Triples and Turtle.

use std::path::Path;
use std::sync::Arc;

use akg_core::{vocab, AkgError, Triple};
use akg_ontology::Ontology;
use akg_validator::{BatchPartitioner, PartitionSummary, TripleValidator};

const EX: &str = "http://example.org/";

fn ex(name: &str) -> String {
    format!("{EX}{name}")
}

fn statement(s: &str, p: &str, o: &str) -> String {
    format!("<{s}> <{p}> <{o}> .\n")
}

/// People ontology: Person is-a Agent, worksAt: Agent -> Organization
fn write_ontology(dir: &Path) -> Ontology {
    let doc = [
        statement(&ex("Person"), vocab::RDFS_SUBCLASS_OF, &ex("Agent")),
        statement(&ex("worksAt"), vocab::RDFS_DOMAIN, &ex("Agent")),
        statement(&ex("worksAt"), vocab::RDFS_RANGE, &ex("Organization")),
        statement(&ex("aliceX"), vocab::RDF_TYPE, &ex("Person")),
        statement(&ex("AcmeCorp"), vocab::RDF_TYPE, &ex("Organization")),
    ]
    .concat();
    let path = dir.join("graph.nt");
    std::fs::write(&path, doc).unwrap();
    Ontology::load(&path).unwrap()
}

fn partitioner(dir: &Path) -> BatchPartitioner {
    let ontology = Arc::new(write_ontology(dir));
    BatchPartitioner::new(TripleValidator::new(ontology))
}

// =============================================================================
// Validator against a loaded ontology
// =============================================================================

#[test]
fn test_typed_subject_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let partitioner = partitioner(dir.path());

    let triple = Triple::from_iris(ex("aliceX"), ex("worksAt"), ex("AcmeCorp"));
    assert!(partitioner.validator().validate(&triple));
}

#[test]
fn test_untyped_nodes_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let partitioner = partitioner(dir.path());

    let triple = Triple::from_iris(ex("randomNode"), ex("worksAt"), ex("randomOther"));
    assert!(!partitioner.validator().validate(&triple));
}

// =============================================================================
// File partitioning
// =============================================================================

#[test]
fn test_partition_files() {
    let dir = tempfile::tempdir().unwrap();
    let partitioner = partitioner(dir.path());

    let input = dir.path().join("candidates.nt");
    let accepted = dir.path().join("accepted.nt");
    let rejected = dir.path().join("rejected.nt");
    let candidates = [
        statement(&ex("aliceX"), &ex("worksAt"), &ex("AcmeCorp")),
        statement(&ex("randomNode"), &ex("worksAt"), &ex("randomOther")),
        statement(&ex("bob"), &ex("worksAt"), &ex("AcmeCorp")),
    ]
    .concat();
    std::fs::write(&input, candidates).unwrap();

    let summary = partitioner.partition(&input, &accepted, &rejected).unwrap();
    assert_eq!(
        summary,
        PartitionSummary {
            total: 3,
            accepted: 2,
            rejected: 1
        }
    );

    let accepted = std::fs::read_to_string(&accepted).unwrap();
    assert_eq!(
        accepted,
        [
            statement(&ex("aliceX"), &ex("worksAt"), &ex("AcmeCorp")),
            statement(&ex("bob"), &ex("worksAt"), &ex("AcmeCorp")),
        ]
        .concat()
    );
    let rejected = std::fs::read_to_string(&rejected).unwrap();
    assert_eq!(
        rejected,
        statement(&ex("randomNode"), &ex("worksAt"), &ex("randomOther"))
    );
}

#[test]
fn test_empty_input_creates_empty_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let partitioner = partitioner(dir.path());

    let input = dir.path().join("empty.nt");
    std::fs::write(&input, "").unwrap();
    let accepted = dir.path().join("accepted.nt");
    let rejected = dir.path().join("rejected.nt");

    let summary = partitioner.partition(&input, &accepted, &rejected).unwrap();
    assert_eq!(summary.total, 0);
    assert_eq!(std::fs::read_to_string(&accepted).unwrap(), "");
    assert_eq!(std::fs::read_to_string(&rejected).unwrap(), "");
}

#[test]
fn test_missing_input_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let partitioner = partitioner(dir.path());

    let accepted = dir.path().join("accepted.nt");
    let rejected = dir.path().join("rejected.nt");
    let result = partitioner.partition(dir.path().join("missing.nt"), &accepted, &rejected);

    assert!(matches!(result, Err(AkgError::Io { .. })));
    assert!(!accepted.exists());
    assert!(!rejected.exists());
}

#[test]
fn test_unwritable_rejected_path_keeps_previous_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let partitioner = partitioner(dir.path());

    let input = dir.path().join("candidates.nt");
    std::fs::write(&input, statement(&ex("aliceX"), &ex("worksAt"), &ex("x"))).unwrap();
    let accepted = dir.path().join("accepted.nt");
    let previous = statement(&ex("bob"), &ex("worksAt"), &ex("AcmeCorp"));
    std::fs::write(&accepted, &previous).unwrap();
    let rejected = dir.path().join("no-such-dir").join("rejected.nt");

    let result = partitioner.partition(&input, &accepted, &rejected);
    assert!(matches!(result, Err(AkgError::Io { .. })));
    assert_eq!(std::fs::read_to_string(&accepted).unwrap(), previous);

    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["accepted.nt", "candidates.nt", "graph.nt"]);
}

#[test]
fn test_turtle_input_gives_turtle_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let partitioner = partitioner(dir.path());

    let input = dir.path().join("candidates.ttl");
    std::fs::write(
        &input,
        "@prefix ex: <http://example.org/> .\n\
         ex:aliceX ex:worksAt ex:AcmeCorp .\n\
         ex:randomNode ex:worksAt ex:randomOther .\n",
    )
    .unwrap();
    let accepted = dir.path().join("accepted.ttl");
    let rejected = dir.path().join("rejected.ttl");

    let summary = partitioner.partition(&input, &accepted, &rejected).unwrap();
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.rejected, 1);
    assert_eq!(
        akg_parser::read_triples(&accepted).unwrap(),
        vec![Triple::from_iris(ex("aliceX"), ex("worksAt"), ex("AcmeCorp"))]
    );
    assert_eq!(
        akg_parser::read_triples(&rejected).unwrap(),
        vec![Triple::from_iris(ex("randomNode"), ex("worksAt"), ex("randomOther"))]
    );
}

#[test]
fn test_output_named_for_other_format_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let partitioner = partitioner(dir.path());

    let input = dir.path().join("candidates.ttl");
    std::fs::write(&input, "").unwrap();
    let accepted = dir.path().join("accepted.nt");
    let rejected = dir.path().join("rejected.ttl");

    let result = partitioner.partition(&input, &accepted, &rejected);
    assert!(matches!(result, Err(AkgError::Config(_))));
    assert!(!accepted.exists());
    assert!(!rejected.exists());
}

#[test]
fn test_malformed_input_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let partitioner = partitioner(dir.path());

    let input = dir.path().join("broken.nt");
    std::fs::write(&input, "<http://example.org/a> not-a-triple\n").unwrap();
    let result = partitioner.partition(
        &input,
        dir.path().join("accepted.nt"),
        dir.path().join("rejected.nt"),
    );
    assert!(matches!(result, Err(AkgError::Parse(_))));
}
