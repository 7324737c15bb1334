//! The abstract relational backend the engine plans against.
//!
//! A [`VariantStore`] exposes the backbone mapping and the annotation
//! relations by key. The engine only ever issues selective operations
//! through this trait: predicate-driven backbone scans, point fetches by
//! genomic or residue key, and per-category seed scans. Nothing here can
//! enumerate the unrestricted positions × alternates cross product.

use varmap_core::QueryError;
use varmap_core::models::backbone::BackboneRecord;
use varmap_core::models::keys::{GenomicKey, ProteinKey, ResidueKey, ResidueRange};
use varmap_core::models::request::AmClass;

use crate::filters::CompiledFilter;
use crate::predicate::BackbonePredicate;

/// An AlphaMissense row: continuous score plus its pathogenicity call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmRecord {
    pub score: f64,
    pub class: AmClass,
}

/// Keys produced by narrowing one annotation relation with a restricting
/// filter, before the backbone join. The key shape follows the relation:
/// genomic-level, residue-level, or protein-level (mutant amino acid).
#[derive(Debug, Clone, PartialEq)]
pub enum SeedKeys {
    Genomic(Vec<GenomicKey>),
    Residue(Vec<ResidueKey>),
    Protein(Vec<ProteinKey>),
}

impl SeedKeys {
    pub fn len(&self) -> usize {
        match self {
            SeedKeys::Genomic(keys) => keys.len(),
            SeedKeys::Residue(keys) => keys.len(),
            SeedKeys::Protein(keys) => keys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait VariantStore {
    /// Backbone rows matching an identifier predicate. The backend is
    /// expected to evaluate membership atoms through its own indexes and to
    /// lower `PdbIn`/`RefseqIn` atoms through the coverage relation and the
    /// RefSeq crosswalk. Row order must be deterministic across calls.
    fn scan_backbone(&self, predicate: &BackbonePredicate)
    -> Result<Vec<BackboneRecord>, QueryError>;

    /// Backbone rows at one genomic position.
    fn backbone_at(&self, chromosome: &str, position: u32)
    -> Result<Vec<BackboneRecord>, QueryError>;

    /// Backbone rows mapping one residue.
    fn backbone_at_residue(&self, key: &ResidueKey) -> Result<Vec<BackboneRecord>, QueryError>;

    /// Narrow one annotation relation to the keys satisfying a restricting
    /// filter. This is the first step of a filter-first plan.
    fn seed_keys(&self, filter: &CompiledFilter) -> Result<SeedKeys, QueryError>;

    fn cadd(&self, key: &GenomicKey) -> Result<Option<f64>, QueryError>;

    fn allele_freq(&self, key: &GenomicKey) -> Result<Option<f64>, QueryError>;

    /// Whether the variant appears in the reference variant catalogue.
    fn is_known_variant(&self, key: &GenomicKey) -> Result<bool, QueryError>;

    fn alpha_missense(&self, key: &ProteinKey) -> Result<Option<AmRecord>, QueryError>;

    fn esm1b(&self, key: &ProteinKey) -> Result<Option<f64>, QueryError>;

    fn popeve(&self, key: &ProteinKey) -> Result<Option<f64>, QueryError>;

    fn foldx_ddg(&self, key: &ProteinKey) -> Result<Option<f64>, QueryError>;

    fn conservation(&self, key: &ResidueKey) -> Result<Option<f64>, QueryError>;

    fn has_structure(&self, key: &ResidueKey) -> Result<bool, QueryError>;

    fn in_pocket(&self, key: &ResidueKey) -> Result<bool, QueryError>;

    fn at_interface(&self, key: &ResidueKey) -> Result<bool, QueryError>;

    /// Residue ranges of the accessions a structure id covers.
    fn pdb_coverage(&self, pdb_id: &str) -> Result<Vec<ResidueRange>, QueryError>;

    /// Accessions a RefSeq id maps to. An id with a version suffix matches
    /// that version exactly; a bare id matches all versions.
    fn refseq_accessions(&self, refseq: &str) -> Result<Vec<String>, QueryError>;
}
