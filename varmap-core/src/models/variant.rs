use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::codon::{AminoAcid, CodonPos};
use crate::models::base::Base;
use crate::models::request::AmClass;

/// Annotation scores attached to a result row. A score is `None` when the
/// variant has no row in that relation (or the relation was never joined).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantScores {
    pub cadd: Option<f64>,
    pub allele_freq: Option<f64>,
    pub am: Option<f64>,
    pub am_class: Option<AmClass>,
    pub esm1b: Option<f64>,
    pub popeve: Option<f64>,
    pub conservation: Option<f64>,
    pub foldx_ddg: Option<f64>,
}

///
/// One genomic variant in a result page.
///
/// Canonical display form is "chr pos ref alt".
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomicVariant {
    pub chromosome: String,
    pub position: u32,
    pub reference_base: Base,
    pub alternate_base: Base,
    pub accession: String,
    pub protein_position: u32,
    pub codon_position: CodonPos,
    pub mutant_amino_acid: Option<AminoAcid>,
    pub scores: VariantScores,
}

impl Display for GenomicVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.chromosome, self.position, self.reference_base, self.alternate_base
        )
    }
}
