//! Batch partitioning of candidate triples
//!
//! Splits a triple file into an accepted file and a rejected file using a
//! [`TripleValidator`]. Every input triple lands in exactly one output and
//! relative input order is kept in both.

use std::path::Path;

use akg_core::{AkgError, Result, Triple};
use akg_parser::TripleFormat;
use serde::Serialize;

use crate::TripleValidator;

/// In-memory result of partitioning a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub accepted: Vec<Triple>,
    pub rejected: Vec<Triple>,
}

impl Partition {
    pub fn summary(&self) -> PartitionSummary {
        PartitionSummary {
            total: self.accepted.len() + self.rejected.len(),
            accepted: self.accepted.len(),
            rejected: self.rejected.len(),
        }
    }

    /// Write both sides in `format`, replacing either file only if both
    /// were written in full
    ///
    /// An output whose extension names a different format is refused before
    /// anything is written.
    pub fn write(
        &self,
        accepted: &Path,
        rejected: &Path,
        format: TripleFormat,
    ) -> Result<PartitionSummary> {
        for path in [accepted, rejected] {
            match TripleFormat::detect(path)? {
                Some(named) if named != format => {
                    return Err(AkgError::Config(format!(
                        "{} names {named} but the batch is written as {format}",
                        path.display()
                    )));
                }
                _ => {}
            }
        }

        akg_parser::write_all(
            &[(accepted, &self.accepted), (rejected, &self.rejected)],
            format,
        )?;
        Ok(self.summary())
    }
}

/// Counts reported after a file partition run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PartitionSummary {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
}

/// Routes each triple of a batch to the accepted or rejected side
#[derive(Clone)]
pub struct BatchPartitioner {
    validator: TripleValidator,
}

impl BatchPartitioner {
    pub fn new(validator: TripleValidator) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &TripleValidator {
        &self.validator
    }

    /// Partition triples already in memory
    pub fn partition_triples(&self, triples: &[Triple]) -> Partition {
        let mut partition = Partition::default();
        for triple in triples {
            if self.validator.validate(triple) {
                partition.accepted.push(triple.clone());
            } else {
                partition.rejected.push(triple.clone());
            }
        }
        partition
    }

    /// Read `input`, validate every triple, and write both output files in
    /// the input's format
    ///
    /// If reading or writing fails, neither output file is replaced.
    pub fn partition(
        &self,
        input: impl AsRef<Path>,
        accepted: impl AsRef<Path>,
        rejected: impl AsRef<Path>,
    ) -> Result<PartitionSummary> {
        let (input, accepted, rejected) = (input.as_ref(), accepted.as_ref(), rejected.as_ref());

        let format = TripleFormat::from_path(input)?;
        let triples = akg_parser::read_triples(input)?;
        tracing::info!("Partitioning {} triples from {}", triples.len(), input.display());

        let summary = self
            .partition_triples(&triples)
            .write(accepted, rejected, format)?;
        tracing::info!(
            "Partition complete: {} accepted -> {}, {} rejected -> {}",
            summary.accepted,
            accepted.display(),
            summary.rejected,
            rejected.display()
        );
        Ok(summary)
    }
}
