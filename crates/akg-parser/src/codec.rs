//! Conversion between AKG triples and the oxrdf model, plus the oxttl
//! parsers and serializers for N-Triples and Turtle.

use std::io::Write;

use akg_core::{vocab, Literal, Term, Triple};
use oxttl::{NTriplesParser, NTriplesSerializer, TurtleParser, TurtleSerializer};

use crate::{ParserError, Result, TripleFormat};

/// Prefixes a Turtle document may use without declaring them
const WELL_KNOWN_PREFIXES: [(&str, &str); 4] = [
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
];

/// Parse a document in the given format, keeping statement order
pub fn parse_str(input: &str, format: TripleFormat) -> Result<Vec<Triple>> {
    parse_slice(input.as_bytes(), format)
}

pub(crate) fn parse_slice(input: &[u8], format: TripleFormat) -> Result<Vec<Triple>> {
    match format {
        TripleFormat::NTriples => collect(NTriplesParser::new().for_reader(input)),
        TripleFormat::Turtle => {
            let mut parser = TurtleParser::new();
            for (name, iri) in WELL_KNOWN_PREFIXES {
                parser = parser
                    .with_prefix(name, iri)
                    .map_err(|e| ParserError::InvalidTerm(e.to_string()))?;
            }
            collect(parser.for_reader(input))
        }
    }
}

fn collect<E: std::fmt::Display>(
    parsed: impl Iterator<Item = std::result::Result<oxrdf::Triple, E>>,
) -> Result<Vec<Triple>> {
    parsed
        .map(|triple| {
            triple
                .map_err(|e| ParserError::Syntax(e.to_string()))
                .and_then(from_rdf)
        })
        .collect()
}

/// Serialize triples as a document in the given format
///
/// Fails without output if any triple cannot be represented, e.g. an IRI
/// that was never checked.
pub fn to_string(triples: &[Triple], format: TripleFormat) -> Result<String> {
    let converted = convert_all(triples)?;
    let mut out = Vec::new();
    serialize(&mut out, &converted, format)
        .map_err(|e| ParserError::InvalidTerm(e.to_string()))?;
    String::from_utf8(out).map_err(|e| ParserError::InvalidTerm(e.to_string()))
}

pub(crate) fn convert_all(triples: &[Triple]) -> Result<Vec<oxrdf::Triple>> {
    triples.iter().map(to_rdf).collect()
}

pub(crate) fn serialize<W: Write>(
    writer: &mut W,
    triples: &[oxrdf::Triple],
    format: TripleFormat,
) -> std::io::Result<()> {
    match format {
        TripleFormat::NTriples => {
            let mut serializer = NTriplesSerializer::new().for_writer(writer);
            for triple in triples {
                serializer.serialize_triple(triple)?;
            }
            serializer.finish();
        }
        TripleFormat::Turtle => {
            let mut serializer = TurtleSerializer::new().for_writer(writer);
            for triple in triples {
                serializer.serialize_triple(triple)?;
            }
            serializer.finish()?;
        }
    }
    Ok(())
}

// ============================================================================
// Term conversion
// ============================================================================

fn from_rdf(triple: oxrdf::Triple) -> Result<Triple> {
    let subject = term_from_rdf(oxrdf::Term::from(triple.subject))?;
    let object = term_from_rdf(triple.object)?;
    Triple::new(subject, triple.predicate.into_string(), object)
        .map_err(|e| ParserError::InvalidTerm(e.to_string()))
}

fn term_from_rdf(term: oxrdf::Term) -> Result<Term> {
    match term {
        oxrdf::Term::NamedNode(node) => Ok(Term::Iri(node.into_string())),
        oxrdf::Term::BlankNode(node) => Ok(Term::Blank(node.as_str().to_string())),
        oxrdf::Term::Literal(literal) => Ok(Term::Literal(literal_from_rdf(&literal))),
        #[allow(unreachable_patterns)]
        other => Err(ParserError::InvalidTerm(format!(
            "quoted triple {other} is not supported"
        ))),
    }
}

fn literal_from_rdf(literal: &oxrdf::Literal) -> Literal {
    if let Some(language) = literal.language() {
        return Literal::lang(literal.value(), language);
    }
    match literal.datatype().as_str() {
        vocab::XSD_STRING => Literal::plain(literal.value()),
        datatype => Literal::typed(literal.value(), datatype),
    }
}

fn to_rdf(triple: &Triple) -> Result<oxrdf::Triple> {
    let predicate = named_node(triple.predicate())?;
    let object = term_to_rdf(triple.object())?;
    match triple.subject() {
        Term::Iri(iri) => Ok(oxrdf::Triple::new(named_node(iri)?, predicate, object)),
        Term::Blank(label) => Ok(oxrdf::Triple::new(blank_node(label)?, predicate, object)),
        Term::Literal(_) => Err(ParserError::InvalidTerm(format!(
            "literal subject in {triple}"
        ))),
    }
}

fn term_to_rdf(term: &Term) -> Result<oxrdf::Term> {
    Ok(match term {
        Term::Iri(iri) => named_node(iri)?.into(),
        Term::Blank(label) => blank_node(label)?.into(),
        Term::Literal(literal) => literal_to_rdf(literal)?.into(),
    })
}

fn literal_to_rdf(literal: &Literal) -> Result<oxrdf::Literal> {
    let lexical = literal.lexical.as_str();
    match (&literal.language, &literal.datatype) {
        (Some(language), _) => {
            oxrdf::Literal::new_language_tagged_literal(lexical, language.as_str()).map_err(|e| {
                ParserError::InvalidTerm(format!("language tag {language:?}: {e}"))
            })
        }
        (None, Some(datatype)) => Ok(oxrdf::Literal::new_typed_literal(
            lexical,
            named_node(datatype)?,
        )),
        (None, None) => Ok(oxrdf::Literal::new_simple_literal(lexical)),
    }
}

fn named_node(iri: &str) -> Result<oxrdf::NamedNode> {
    oxrdf::NamedNode::new(iri).map_err(|e| ParserError::InvalidTerm(format!("IRI <{iri}>: {e}")))
}

fn blank_node(label: &str) -> Result<oxrdf::BlankNode> {
    oxrdf::BlankNode::new(label)
        .map_err(|e| ParserError::InvalidTerm(format!("blank node _:{label}: {e}")))
}
