//! Lookup keys for the annotation relations.
//!
//! Genomic-level relations (CADD, allele frequency, known variants) are
//! keyed by chromosome, position, reference and alternate base. Protein-level
//! relations key off the accession and residue, with or without the mutant
//! amino acid.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::codon::AminoAcid;
use crate::models::base::Base;

/// Key of a genomic-level annotation row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GenomicKey {
    pub chromosome: String,
    pub position: u32,
    pub reference: Base,
    pub alternate: Base,
}

impl Display for GenomicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.chromosome, self.position, self.reference, self.alternate
        )
    }
}

/// Key of a residue-level annotation row (no mutant amino acid).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResidueKey {
    pub accession: String,
    pub protein_position: u32,
}

/// Key of a protein-level annotation row for one substitution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProteinKey {
    pub accession: String,
    pub protein_position: u32,
    pub mutant_aa: AminoAcid,
}

/// A residue range of one accession covered by a structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidueRange {
    pub accession: String,
    pub start: u32,
    pub end: u32,
}

impl ResidueRange {
    pub fn contains(&self, accession: &str, protein_position: u32) -> bool {
        self.accession == accession && (self.start..=self.end).contains(&protein_position)
    }
}
