use serde::{Deserialize, Serialize};

use crate::codon::{AminoAcid, Codon, CodonPos, substitute};
use crate::models::base::Base;
use crate::models::keys::{GenomicKey, ResidueKey};

///
/// One row of the genome-to-protein coordinate mapping.
///
/// Every mapped genomic position appears once per transcript it codes in;
/// the SNV candidate space is this record times its three non-reference
/// alternate bases.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackboneRecord {
    pub chromosome: String,
    pub genomic_position: u32,
    pub reference_base: Base,
    pub accession: String,
    pub gene_name: String,
    pub ensembl_gene: String,
    pub ensembl_transcript: String,
    pub ensembl_protein: String,
    pub protein_position: u32,
    pub reference_codon: Codon,
    pub codon_position: CodonPos,
    pub reverse_strand: bool,
}

impl BackboneRecord {
    /// The three candidate alternate alleles at this position.
    pub fn alternates(&self) -> impl Iterator<Item = Base> {
        self.reference_base.alternates()
    }

    /// Genomic annotation key for one candidate alternate.
    pub fn genomic_key(&self, alternate: Base) -> GenomicKey {
        GenomicKey {
            chromosome: self.chromosome.clone(),
            position: self.genomic_position,
            reference: self.reference_base,
            alternate,
        }
    }

    pub fn residue_key(&self) -> ResidueKey {
        ResidueKey {
            accession: self.accession.clone(),
            protein_position: self.protein_position,
        }
    }

    /// The amino acid this record's residue mutates to under a candidate
    /// alternate base.
    pub fn mutant_amino_acid(&self, alternate: Base) -> AminoAcid {
        substitute(
            self.reference_codon,
            self.codon_position,
            alternate,
            self.reverse_strand,
        )
    }

    /// The amino acid encoded by the unmodified reference codon.
    pub fn reference_amino_acid(&self) -> AminoAcid {
        self.reference_codon.translate()
    }
}
