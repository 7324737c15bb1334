//! Plan execution: candidate expansion, annotation joins, paging.
//!
//! One engine call builds one plan and runs it to completion against the
//! store. The engine is stateless per invocation and holds only a shared
//! reference to the read-only store, so concurrent callers are safe. It
//! never retries; a store failure is fatal for the current request.

use log::{debug, warn};

use varmap_core::QueryError;
use varmap_core::codon::AminoAcid;
use varmap_core::models::backbone::BackboneRecord;
use varmap_core::models::base::Base;
use varmap_core::models::keys::{GenomicKey, ProteinKey, ResidueKey};
use varmap_core::models::request::{Page, SearchRequest, SortSpec, StabilityClass};
use varmap_core::models::variant::{GenomicVariant, VariantScores};

use crate::filters::{CompiledFilter, FilterCategory, FilterPredicate};
use crate::materialize;
use crate::page;
use crate::plan::Plan;
use crate::predicate::BackbonePredicate;
use crate::store::{SeedKeys, VariantStore};

/// Interactive totals above this suggest the filter combination is broader
/// than the caller intended.
pub const BROAD_FILTER_WARNING_THRESHOLD: usize = 100_000;

/// Chunk size for unbounded retrieval.
pub const EXPORT_PAGE_SIZE: usize = 10_000;

/// One backbone row paired with one candidate alternate allele, carrying
/// the annotation values attached by joins so far. The memoized mutant
/// amino acid is the codon-substitution column every protein-level join
/// keys off.
#[derive(Debug, Clone)]
pub(crate) struct CandidateRow {
    pub(crate) backbone: BackboneRecord,
    pub(crate) alternate: Base,
    pub(crate) mutant_aa: Option<AminoAcid>,
    pub(crate) scores: VariantScores,
}

impl CandidateRow {
    pub(crate) fn new(backbone: BackboneRecord, alternate: Base) -> Self {
        CandidateRow {
            backbone,
            alternate,
            mutant_aa: None,
            scores: VariantScores::default(),
        }
    }

    fn genomic_key(&self) -> GenomicKey {
        self.backbone.genomic_key(self.alternate)
    }

    fn residue_key(&self) -> ResidueKey {
        self.backbone.residue_key()
    }

    /// The mutant amino acid, derived through the codon substitution
    /// resolver on first use.
    fn mutant(&mut self) -> AminoAcid {
        match self.mutant_aa {
            Some(aa) => aa,
            None => {
                let aa = self.backbone.mutant_amino_acid(self.alternate);
                self.mutant_aa = Some(aa);
                aa
            }
        }
    }

    fn protein_key(&mut self) -> ProteinKey {
        let mutant_aa = self.mutant();
        ProteinKey {
            accession: self.backbone.accession.clone(),
            protein_position: self.backbone.protein_position,
            mutant_aa,
        }
    }

    pub(crate) fn into_variant(self) -> GenomicVariant {
        GenomicVariant {
            chromosome: self.backbone.chromosome,
            position: self.backbone.genomic_position,
            reference_base: self.backbone.reference_base,
            alternate_base: self.alternate,
            accession: self.backbone.accession,
            protein_position: self.backbone.protein_position,
            codon_position: self.backbone.codon_position,
            mutant_amino_acid: self.mutant_aa,
            scores: self.scores,
        }
    }
}

/// Executes search requests against a [`VariantStore`].
pub struct SearchEngine<'a, S> {
    store: &'a S,
}

impl<'a, S: VariantStore> SearchEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        SearchEngine { store }
    }

    /// Interactive retrieval: count with the equivalent predicate first,
    /// short-circuit on an empty result, then fetch the requested page.
    pub fn search(&self, request: &SearchRequest) -> Result<Page<GenomicVariant>, QueryError> {
        if request.page == 0 {
            return Err(QueryError::InvalidPage(request.page));
        }
        if request.page_size == 0 {
            return Err(QueryError::InvalidPageSize);
        }

        let plan = Plan::build(request)?;
        debug!("executing {}", plan);

        let total = self.count(&plan)?;
        if total == 0 {
            return Ok(Page::empty(request.page, request.page_size));
        }
        if plan.is_filter_only() && total > BROAD_FILTER_WARNING_THRESHOLD {
            warn!(
                "filter-only query matches {} variants, filter combination is likely broader than intended",
                total
            );
        }

        let content = self.fetch_page(&plan, &request.sort, request.page, request.page_size)?;
        Ok(Page {
            content,
            page: request.page,
            page_size: request.page_size,
            total_elements: total,
        })
    }

    /// Unbounded retrieval for export: no count, pages are fetched
    /// mechanically until an empty one comes back. The request's own
    /// page/pageSize are ignored.
    pub fn export(&self, request: &SearchRequest) -> Result<Vec<GenomicVariant>, QueryError> {
        let plan = Plan::build(request)?;
        debug!("exporting {}", plan);

        let mut rows = Vec::new();
        let mut page_number = 1;
        loop {
            let chunk = self.fetch_page(&plan, &request.sort, page_number, EXPORT_PAGE_SIZE)?;
            if chunk.is_empty() {
                break;
            }
            rows.extend(chunk);
            page_number += 1;
        }
        Ok(rows)
    }

    fn count(&self, plan: &Plan) -> Result<usize, QueryError> {
        Ok(self.execute(plan)?.len())
    }

    fn fetch_page(
        &self,
        plan: &Plan,
        sort: &SortSpec,
        page_number: usize,
        page_size: usize,
    ) -> Result<Vec<GenomicVariant>, QueryError> {
        let mut rows = self.execute(plan)?;
        page::sort_rows(&mut rows, sort);
        Ok(page::paginate(rows, page_number, page_size))
    }

    fn execute(&self, plan: &Plan) -> Result<Vec<GenomicVariant>, QueryError> {
        let (mut candidates, pending) = match plan {
            Plan::IdentifierFirst { predicate, joins } => {
                let candidates = self.scan_candidates(predicate)?;
                let pending: Vec<&CompiledFilter> = joins.iter().collect();
                (candidates, pending)
            }
            Plan::FilterFirst { seed, rest } => {
                let candidates = self.seed_candidates(seed)?;
                // the seed is joined again so its score lands on the row;
                // its predicate is already satisfied by construction
                let mut pending: Vec<&CompiledFilter> = vec![seed];
                pending.extend(rest.iter());
                (candidates, pending)
            }
        };

        if plan.needs_mutant_aa() {
            for candidate in &mut candidates {
                candidate.mutant();
            }
        }

        for filter in pending {
            self.apply_filter(&mut candidates, filter)?;
        }

        Ok(materialize::collapse(candidates))
    }

    /// Identifier-first entry: selective backbone scan, then the 3-alternate
    /// expansion. Alternates never include the reference base, which is the
    /// "alternate ≠ reference" clause of the identifier predicate.
    fn scan_candidates(
        &self,
        predicate: &BackbonePredicate,
    ) -> Result<Vec<CandidateRow>, QueryError> {
        let records = self.store.scan_backbone(predicate)?;
        debug!("identifier predicate matched {} backbone row(s)", records.len());
        let mut candidates = Vec::with_capacity(records.len() * 3);
        for record in records {
            let alternates: Vec<Base> = record.alternates().collect();
            for alternate in alternates {
                candidates.push(CandidateRow::new(record.clone(), alternate));
            }
        }
        Ok(candidates)
    }

    /// Filter-first entry: narrow the seed relation to its matching keys
    /// and join the backbone against them, so the alternate expansion only
    /// happens for rows that can possibly satisfy the seed filter.
    fn seed_candidates(&self, seed: &CompiledFilter) -> Result<Vec<CandidateRow>, QueryError> {
        let keys = self.store.seed_keys(seed)?;
        debug!("seed relation {} narrowed to {} key(s)", seed.category, keys.len());

        let mut candidates = Vec::new();
        match keys {
            SeedKeys::Genomic(keys) => {
                for key in keys {
                    if key.alternate == key.reference {
                        continue;
                    }
                    for record in self.store.backbone_at(&key.chromosome, key.position)? {
                        if record.reference_base == key.reference {
                            candidates.push(CandidateRow::new(record, key.alternate));
                        }
                    }
                }
            }
            SeedKeys::Residue(keys) => {
                for key in keys {
                    for record in self.store.backbone_at_residue(&key)? {
                        let alternates: Vec<Base> = record.alternates().collect();
                        for alternate in alternates {
                            candidates.push(CandidateRow::new(record.clone(), alternate));
                        }
                    }
                }
            }
            SeedKeys::Protein(keys) => {
                for key in keys {
                    let residue = ResidueKey {
                        accession: key.accession.clone(),
                        protein_position: key.protein_position,
                    };
                    for record in self.store.backbone_at_residue(&residue)? {
                        // only the alternates whose substitution yields the
                        // seed's mutant amino acid can satisfy the filter
                        let alternates: Vec<Base> = record.alternates().collect();
                        for alternate in alternates {
                            if record.mutant_amino_acid(alternate) == key.mutant_aa {
                                let mut candidate = CandidateRow::new(record.clone(), alternate);
                                candidate.mutant_aa = Some(key.mutant_aa);
                                candidates.push(candidate);
                            }
                        }
                    }
                }
            }
        }
        Ok(candidates)
    }

    /// Apply one annotation join: attach the relation's value to each
    /// candidate and, for INNER joins, drop candidates failing the
    /// predicate. LEFT joins only attach.
    fn apply_filter(
        &self,
        candidates: &mut Vec<CandidateRow>,
        filter: &CompiledFilter,
    ) -> Result<(), QueryError> {
        let restricting = filter.is_restricting();
        let mut kept = Vec::with_capacity(candidates.len());

        for mut candidate in candidates.drain(..) {
            let keep = match filter.category {
                FilterCategory::Cadd => {
                    let score = self.store.cadd(&candidate.genomic_key())?;
                    candidate.scores.cadd = score;
                    !restricting || score_passes(filter, score)
                }
                FilterCategory::AlleleFreq => {
                    let frequency = self.store.allele_freq(&candidate.genomic_key())?;
                    candidate.scores.allele_freq = frequency;
                    !restricting || score_passes(filter, frequency)
                }
                FilterCategory::Am => {
                    let row = self.store.alpha_missense(&candidate.protein_key())?;
                    candidate.scores.am = row.map(|r| r.score);
                    candidate.scores.am_class = row.map(|r| r.class);
                    if !restricting {
                        true
                    } else {
                        match &filter.predicate {
                            Some(FilterPredicate::AmClasses(classes)) => {
                                row.is_some_and(|r| classes.contains(&r.class))
                            }
                            _ => row.is_some(),
                        }
                    }
                }
                FilterCategory::Esm1b => {
                    let score = self.store.esm1b(&candidate.protein_key())?;
                    candidate.scores.esm1b = score;
                    !restricting || score_passes(filter, score)
                }
                FilterCategory::PopEve => {
                    let score = self.store.popeve(&candidate.protein_key())?;
                    candidate.scores.popeve = score;
                    !restricting || score_passes(filter, score)
                }
                FilterCategory::Stability => {
                    let ddg = self.store.foldx_ddg(&candidate.protein_key())?;
                    candidate.scores.foldx_ddg = ddg;
                    if !restricting {
                        true
                    } else {
                        match &filter.predicate {
                            Some(FilterPredicate::StabilityClasses(classes)) => {
                                ddg.is_some_and(|d| classes.contains(&StabilityClass::from_ddg(d)))
                            }
                            _ => ddg.is_some(),
                        }
                    }
                }
                FilterCategory::Conservation => {
                    let score = self.store.conservation(&candidate.residue_key())?;
                    candidate.scores.conservation = score;
                    !restricting || score_passes(filter, score)
                }
                FilterCategory::Coverage => {
                    let covered = self.store.has_structure(&candidate.residue_key())?;
                    !restricting || covered
                }
                FilterCategory::Pocket => {
                    let hit = self.store.in_pocket(&candidate.residue_key())?;
                    !restricting || hit
                }
                FilterCategory::Interaction => {
                    let hit = self.store.at_interface(&candidate.residue_key())?;
                    !restricting || hit
                }
                FilterCategory::Known => {
                    let known = self.store.is_known_variant(&candidate.genomic_key())?;
                    !restricting || known
                }
            };
            if keep {
                kept.push(candidate);
            }
        }

        *candidates = kept;
        Ok(())
    }
}

fn score_passes(filter: &CompiledFilter, score: Option<f64>) -> bool {
    match (&filter.predicate, score) {
        (Some(predicate), Some(score)) => predicate.accepts_score(score),
        (Some(_), None) => false,
        (None, _) => true,
    }
}
