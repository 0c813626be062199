//! AKG Parser - Triple file parsing and serialization
//!
//! The ontology, the candidate triples and both partition outputs are RDF
//! files in N-Triples or Turtle, chosen by file extension. Parsing and
//! serialization go through `oxttl`; terms are checked with `oxrdf`, so a
//! file this crate writes can always be read back.
//!
//! Reading produces triples in statement order. Writing goes to a temporary
//! file in the destination directory that is renamed into place once fully
//! flushed, so an interrupted write never leaves a destination that looks
//! complete. [`write_all`] extends this to several files at once.

pub mod codec;

pub use codec::{parse_str, to_string};

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use akg_core::{AkgError, Triple};
use tempfile::NamedTempFile;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while reading or writing triple files
#[derive(Error, Debug)]
pub enum ParserError {
    /// File format is not supported
    #[error("Unsupported triple format: {0}")]
    UnsupportedFormat(String),

    /// IO error while reading or writing the file
    #[error("IO error on file: {path}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed document
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// A term that RDF cannot represent, such as an unchecked IRI
    #[error("Invalid term: {0}")]
    InvalidTerm(String),
}

pub type Result<T> = std::result::Result<T, ParserError>;

impl From<ParserError> for AkgError {
    fn from(err: ParserError) -> Self {
        match err {
            ParserError::IoError { path, source } => AkgError::Io { path, source },
            other => AkgError::Parse(other.to_string()),
        }
    }
}

// ============================================================================
// Format detection
// ============================================================================

/// Supported RDF serializations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripleFormat {
    NTriples,
    Turtle,
}

impl TripleFormat {
    /// Format named by the file extension, if it names one
    ///
    /// RDF/XML, JSON-LD and quad formats are recognised only to be refused.
    pub fn detect(path: &Path) -> Result<Option<Self>> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());
        match extension.as_deref() {
            Some("nt") | Some("ntriples") => Ok(Some(Self::NTriples)),
            Some("ttl") | Some("turtle") => Ok(Some(Self::Turtle)),
            Some(ext @ ("rdf" | "owl" | "xml" | "jsonld" | "nq" | "trig")) => Err(
                ParserError::UnsupportedFormat(format!(
                    "{} (.{ext}); convert it to Turtle or N-Triples first",
                    path.display()
                )),
            ),
            _ => Ok(None),
        }
    }

    /// Format of a file; paths without a known extension are N-Triples
    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::detect(path)?.unwrap_or(Self::NTriples))
    }
}

impl std::fmt::Display for TripleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NTriples => write!(f, "n-triples"),
            Self::Turtle => write!(f, "turtle"),
        }
    }
}

// ============================================================================
// File I/O
// ============================================================================

/// Read every triple of an N-Triples or Turtle file, in statement order
pub fn read_triples(path: impl AsRef<Path>) -> Result<Vec<Triple>> {
    let path = path.as_ref();
    let format = TripleFormat::from_path(path)?;

    let content = std::fs::read(path).map_err(|e| ParserError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let triples = codec::parse_slice(&content, format).map_err(|e| match e {
        ParserError::Syntax(message) => {
            ParserError::Syntax(format!("{}: {message}", path.display()))
        }
        other => other,
    })?;
    tracing::debug!(
        "Read {} triples from {} ({format})",
        triples.len(),
        path.display()
    );
    Ok(triples)
}

/// Write triples to a file in the format its extension names, replacing it
/// atomically
pub fn write_triples(path: impl AsRef<Path>, triples: &[Triple]) -> Result<()> {
    let path = path.as_ref();
    stage_triples(path, triples, TripleFormat::from_path(path)?)?.commit()
}

/// Write several files so that no destination is replaced unless every one
/// of them was written in full
///
/// All files are staged first; destinations are renamed into place only
/// after the last one has been flushed. A failed stage removes every
/// temporary file and leaves all destinations untouched.
pub fn write_all(outputs: &[(&Path, &[Triple])], format: TripleFormat) -> Result<()> {
    let staged = outputs
        .iter()
        .map(|(path, triples)| stage_triples(path, triples, format))
        .collect::<Result<Vec<_>>>()?;

    for file in staged {
        file.commit()?;
    }
    Ok(())
}

/// Triples flushed to a temporary file next to their destination
///
/// Dropping it without [`StagedTriples::commit`] removes the temporary file.
#[derive(Debug)]
pub struct StagedTriples {
    file: NamedTempFile,
    path: PathBuf,
    count: usize,
}

impl StagedTriples {
    /// Destination the triples will be renamed to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename the temporary file over the destination
    pub fn commit(self) -> Result<()> {
        let Self { file, path, count } = self;
        file.persist(&path).map_err(|e| ParserError::IoError {
            path: path.clone(),
            source: e.error,
        })?;
        tracing::debug!("Wrote {count} triples to {}", path.display());
        Ok(())
    }
}

/// Serialize `triples` into a temporary file beside `path`
///
/// Nothing touches the file system if a triple cannot be represented.
pub fn stage_triples(
    path: impl AsRef<Path>,
    triples: &[Triple],
    format: TripleFormat,
) -> Result<StagedTriples> {
    let path = path.as_ref();
    let converted = codec::convert_all(triples)?;

    let io_err = |source: std::io::Error| ParserError::IoError {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file = NamedTempFile::new_in(dir).map_err(io_err)?;

    let mut writer = BufWriter::new(file.as_file());
    codec::serialize(&mut writer, &converted, format)
        .and_then(|_| writer.flush())
        .map_err(io_err)?;
    drop(writer);
    file.as_file().sync_all().map_err(io_err)?;

    Ok(StagedTriples {
        file,
        path: path.to_path_buf(),
        count: triples.len(),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use akg_core::{Literal, Term};

    fn sample() -> Vec<Triple> {
        vec![
            Triple::from_iris(
                "http://example.org/alice",
                "http://example.org/worksAt",
                "http://example.org/Acme",
            ),
            Triple::new(
                Term::iri("http://example.org/alice"),
                "http://example.org/name",
                Term::Literal(Literal::lang("Alice \"Al\" Smith", "en")),
            )
            .unwrap(),
        ]
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            TripleFormat::from_path(Path::new("graph.nt")).unwrap(),
            TripleFormat::NTriples
        );
        assert_eq!(
            TripleFormat::from_path(Path::new("graph.TTL")).unwrap(),
            TripleFormat::Turtle
        );
        assert_eq!(
            TripleFormat::from_path(Path::new("candidates")).unwrap(),
            TripleFormat::NTriples
        );
        assert_eq!(TripleFormat::detect(Path::new("candidates")).unwrap(), None);
        assert!(matches!(
            TripleFormat::from_path(Path::new("graph.owl")),
            Err(ParserError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["out.nt", "out.ttl"] {
            let path = dir.path().join(name);
            write_triples(&path, &sample()).unwrap();
            assert_eq!(read_triples(&path).unwrap(), sample(), "{name}");
        }
        assert_eq!(file_names(dir.path()), vec!["out.nt", "out.ttl"]);
    }

    #[test]
    fn test_read_turtle_ontology() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.ttl");
        std::fs::write(
            &path,
            "@prefix ex: <http://ex.org/> .\nex:Person rdfs:subClassOf ex:Agent .\n",
        )
        .unwrap();

        let triples = read_triples(&path).unwrap();
        assert_eq!(triples.len(), 1);
        assert_eq!(triples[0].subject(), &Term::iri("http://ex.org/Person"));
    }

    #[test]
    fn test_entity_iri_from_remote_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.nt");
        let triple = Triple::try_from_iris(
            "http://dbpedia.org/resource/A|B",
            "http://dbpedia.org/ontology/birthPlace",
            "http://dbpedia.org/resource/Ulm",
        )
        .unwrap();

        write_triples(&path, &[triple.clone()]).unwrap();
        assert_eq!(read_triples(&path).unwrap(), vec![triple]);
    }

    #[test]
    fn test_unchecked_iri_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.nt");
        let triple = Triple::from_iris(
            "http://dbpedia.org/resource/A|B",
            "http://dbpedia.org/ontology/birthPlace",
            "http://dbpedia.org/resource/Ulm",
        );

        let result = write_triples(&path, &[triple]);
        assert!(matches!(result, Err(ParserError::InvalidTerm(_))));
        assert!(file_names(dir.path()).is_empty());
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let result = read_triples("/nonexistent/dir/in.nt");
        assert!(matches!(result, Err(ParserError::IoError { .. })));
    }

    #[test]
    fn test_syntax_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.nt");
        std::fs::write(&path, "<http://ex.org/a> not-a-triple\n").unwrap();

        match read_triples(&path) {
            Err(ParserError::Syntax(message)) => assert!(message.contains("broken.nt")),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_write_into_missing_directory_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.nt");

        let result = write_triples(&path, &sample());
        assert!(matches!(result, Err(ParserError::IoError { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_all_keeps_previous_outputs_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("accepted.nt");
        let second = dir.path().join("missing").join("rejected.nt");
        std::fs::write(&first, "previous run\n").unwrap();

        let triples = sample();
        let result = write_all(
            &[(first.as_path(), &triples), (second.as_path(), &triples)],
            TripleFormat::NTriples,
        );

        assert!(matches!(result, Err(ParserError::IoError { .. })));
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "previous run\n");
        assert_eq!(file_names(dir.path()), vec!["accepted.nt"]);
    }

    #[test]
    fn test_dropped_stage_removes_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.nt");

        let staged = stage_triples(&path, &sample(), TripleFormat::NTriples).unwrap();
        assert_eq!(staged.path(), path.as_path());
        assert_eq!(file_names(dir.path()).len(), 1);
        drop(staged);

        assert!(file_names(dir.path()).is_empty());
    }

    #[test]
    fn test_error_conversion() {
        let err: AkgError = ParserError::Syntax("bad".to_string()).into();
        assert!(matches!(err, AkgError::Parse(_)));
    }
}
