//! Collapses plan output into canonical variant rows.
//!
//! The backbone maps one genomic position once per transcript, so plan
//! output can carry the same variant twice when transcripts agree on the
//! residue. Pagination counts rows, so duplicates must collapse here,
//! before sorting and paging, or page totals and contents would be wrong.

use std::collections::HashSet;

use varmap_core::models::base::Base;
use varmap_core::models::variant::GenomicVariant;

use crate::engine::CandidateRow;

type RowKey = (String, u32, Base, Base, u32, u8);

/// Deduplicate on (chromosome, position, ref, alt, protein position, codon
/// position), keeping the first occurrence, and shape rows into
/// [`GenomicVariant`]s.
pub(crate) fn collapse(candidates: Vec<CandidateRow>) -> Vec<GenomicVariant> {
    let mut seen: HashSet<RowKey> = HashSet::with_capacity(candidates.len());
    let mut variants = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let key = (
            candidate.backbone.chromosome.clone(),
            candidate.backbone.genomic_position,
            candidate.backbone.reference_base,
            candidate.alternate,
            candidate.backbone.protein_position,
            candidate.backbone.codon_position.get(),
        );
        if seen.insert(key) {
            variants.push(candidate.into_variant());
        }
    }
    variants
}
