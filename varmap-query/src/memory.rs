//! Hash-indexed [`VariantStore`] implementation.
//!
//! Holds the backbone mapping and every annotation relation in keyed maps,
//! which makes the engine's strategy logic testable without a live
//! database. Insert methods keep the indexes consistent; the loader module
//! fills a store from a TSV data directory.

use std::collections::{HashMap, HashSet};

use varmap_core::QueryError;
use varmap_core::models::backbone::BackboneRecord;
use varmap_core::models::keys::{GenomicKey, ProteinKey, ResidueKey, ResidueRange};
use varmap_core::models::request::{AmClass, StabilityClass};

use crate::filters::{CompiledFilter, FilterCategory, FilterPredicate};
use crate::identifier::base_id;
use crate::predicate::BackbonePredicate;
use crate::store::{AmRecord, SeedKeys, VariantStore};

#[derive(Debug, Clone)]
struct RefseqMapping {
    version: Option<u32>,
    accession: String,
}

/// In-memory relational backend.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    backbone: Vec<BackboneRecord>,
    by_position: HashMap<(String, u32), Vec<usize>>,
    by_residue: HashMap<ResidueKey, Vec<usize>>,

    cadd: HashMap<GenomicKey, f64>,
    allele_freq: HashMap<GenomicKey, f64>,
    known: HashSet<GenomicKey>,
    alpha_missense: HashMap<ProteinKey, AmRecord>,
    esm1b: HashMap<ProteinKey, f64>,
    popeve: HashMap<ProteinKey, f64>,
    foldx: HashMap<ProteinKey, f64>,
    conservation: HashMap<ResidueKey, f64>,
    coverage_by_accession: HashMap<String, Vec<(u32, u32)>>,
    coverage_by_pdb: HashMap<String, Vec<ResidueRange>>,
    pocket: HashSet<ResidueKey>,
    interaction: HashSet<ResidueKey>,
    refseq: HashMap<String, Vec<RefseqMapping>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backbone_len(&self) -> usize {
        self.backbone.len()
    }

    pub fn add_backbone(&mut self, record: BackboneRecord) {
        let index = self.backbone.len();
        self.by_position
            .entry((record.chromosome.clone(), record.genomic_position))
            .or_default()
            .push(index);
        self.by_residue
            .entry(record.residue_key())
            .or_default()
            .push(index);
        self.backbone.push(record);
    }

    pub fn set_cadd(&mut self, key: GenomicKey, score: f64) {
        self.cadd.insert(key, score);
    }

    pub fn set_allele_freq(&mut self, key: GenomicKey, frequency: f64) {
        self.allele_freq.insert(key, frequency);
    }

    pub fn add_known_variant(&mut self, key: GenomicKey) {
        self.known.insert(key);
    }

    pub fn set_alpha_missense(&mut self, key: ProteinKey, score: f64, class: AmClass) {
        self.alpha_missense.insert(key, AmRecord { score, class });
    }

    pub fn set_esm1b(&mut self, key: ProteinKey, score: f64) {
        self.esm1b.insert(key, score);
    }

    pub fn set_popeve(&mut self, key: ProteinKey, score: f64) {
        self.popeve.insert(key, score);
    }

    pub fn set_foldx_ddg(&mut self, key: ProteinKey, ddg: f64) {
        self.foldx.insert(key, ddg);
    }

    pub fn set_conservation(&mut self, key: ResidueKey, score: f64) {
        self.conservation.insert(key, score);
    }

    pub fn add_structure_coverage(&mut self, pdb_id: &str, range: ResidueRange) {
        self.coverage_by_accession
            .entry(range.accession.clone())
            .or_default()
            .push((range.start, range.end));
        self.coverage_by_pdb
            .entry(pdb_id.to_ascii_uppercase())
            .or_default()
            .push(range);
    }

    pub fn add_pocket(&mut self, key: ResidueKey) {
        self.pocket.insert(key);
    }

    pub fn add_interaction(&mut self, key: ResidueKey) {
        self.interaction.insert(key);
    }

    pub fn add_refseq_mapping(&mut self, refseq_id: &str, accession: &str) {
        let (base, version) = split_refseq(refseq_id);
        self.refseq
            .entry(base.to_ascii_uppercase())
            .or_default()
            .push(RefseqMapping {
                version,
                accession: accession.to_string(),
            });
    }

    /// Rewrite store-dependent atoms into plain backbone constraints:
    /// structure ids become residue ranges, RefSeq ids become accessions.
    /// Ids that resolve to nothing collapse to an empty match.
    fn lower(&self, predicate: &BackbonePredicate) -> Result<BackbonePredicate, QueryError> {
        Ok(match predicate {
            BackbonePredicate::PdbIn(ids) => {
                let mut ranges = Vec::new();
                for id in ids {
                    ranges.extend(self.pdb_coverage(id)?);
                }
                if ranges.is_empty() {
                    BackbonePredicate::Never
                } else {
                    BackbonePredicate::ResidueIn(ranges)
                }
            }
            BackbonePredicate::RefseqIn(ids) => {
                let mut accessions = Vec::new();
                for id in ids {
                    accessions.extend(self.refseq_accessions(id)?);
                }
                accessions.sort();
                accessions.dedup();
                if accessions.is_empty() {
                    BackbonePredicate::Never
                } else {
                    BackbonePredicate::AccessionIn(accessions)
                }
            }
            BackbonePredicate::And(parts) => {
                let lowered: Result<Vec<_>, _> = parts.iter().map(|p| self.lower(p)).collect();
                BackbonePredicate::and(lowered?)
            }
            BackbonePredicate::Or(parts) => {
                let lowered: Result<Vec<_>, _> = parts.iter().map(|p| self.lower(p)).collect();
                BackbonePredicate::or(lowered?)
            }
            other => other.clone(),
        })
    }

    fn backbone_rows(&self, indexes: &[usize]) -> Vec<BackboneRecord> {
        // index order is insertion order, already deterministic
        indexes.iter().map(|i| self.backbone[*i].clone()).collect()
    }
}

fn split_refseq(id: &str) -> (&str, Option<u32>) {
    match id.split_once('.') {
        Some((base, suffix)) => (base, suffix.parse().ok()),
        None => (id, None),
    }
}

fn membership(values: &[String], column: &str) -> bool {
    values.iter().any(|v| v.eq_ignore_ascii_case(column))
}

fn ensembl_membership(values: &[String], column: &str) -> bool {
    values
        .iter()
        .any(|v| base_id(v).eq_ignore_ascii_case(base_id(column)))
}

fn record_matches(record: &BackboneRecord, predicate: &BackbonePredicate) -> bool {
    match predicate {
        BackbonePredicate::Always => true,
        BackbonePredicate::Never => false,
        BackbonePredicate::AccessionIn(vs) => membership(vs, &record.accession),
        BackbonePredicate::GeneIn(vs) => membership(vs, &record.gene_name),
        BackbonePredicate::EnsemblGeneIn(vs) => ensembl_membership(vs, &record.ensembl_gene),
        BackbonePredicate::EnsemblTranscriptIn(vs) => {
            ensembl_membership(vs, &record.ensembl_transcript)
        }
        BackbonePredicate::EnsemblProteinIn(vs) => {
            ensembl_membership(vs, &record.ensembl_protein)
        }
        BackbonePredicate::ResidueIn(ranges) => ranges
            .iter()
            .any(|r| r.contains(&record.accession, record.protein_position)),
        // these are rewritten by lower() before evaluation
        BackbonePredicate::PdbIn(_) | BackbonePredicate::RefseqIn(_) => false,
        BackbonePredicate::And(parts) => parts.iter().all(|p| record_matches(record, p)),
        BackbonePredicate::Or(parts) => parts.iter().any(|p| record_matches(record, p)),
    }
}

fn band_match(filter: &CompiledFilter, score: f64) -> bool {
    filter
        .predicate
        .as_ref()
        .is_none_or(|p| p.accepts_score(score))
}

impl VariantStore for InMemoryStore {
    fn scan_backbone(
        &self,
        predicate: &BackbonePredicate,
    ) -> Result<Vec<BackboneRecord>, QueryError> {
        let lowered = self.lower(predicate)?;
        Ok(self
            .backbone
            .iter()
            .filter(|r| record_matches(r, &lowered))
            .cloned()
            .collect())
    }

    fn backbone_at(
        &self,
        chromosome: &str,
        position: u32,
    ) -> Result<Vec<BackboneRecord>, QueryError> {
        Ok(self
            .by_position
            .get(&(chromosome.to_string(), position))
            .map(|indexes| self.backbone_rows(indexes))
            .unwrap_or_default())
    }

    fn backbone_at_residue(&self, key: &ResidueKey) -> Result<Vec<BackboneRecord>, QueryError> {
        Ok(self
            .by_residue
            .get(key)
            .map(|indexes| self.backbone_rows(indexes))
            .unwrap_or_default())
    }

    fn seed_keys(&self, filter: &CompiledFilter) -> Result<SeedKeys, QueryError> {
        let keys = match filter.category {
            FilterCategory::Cadd => {
                let mut keys: Vec<GenomicKey> = self
                    .cadd
                    .iter()
                    .filter(|(_, score)| band_match(filter, **score))
                    .map(|(key, _)| key.clone())
                    .collect();
                keys.sort();
                SeedKeys::Genomic(keys)
            }
            FilterCategory::AlleleFreq => {
                let mut keys: Vec<GenomicKey> = self
                    .allele_freq
                    .iter()
                    .filter(|(_, freq)| band_match(filter, **freq))
                    .map(|(key, _)| key.clone())
                    .collect();
                keys.sort();
                SeedKeys::Genomic(keys)
            }
            FilterCategory::Known => {
                let mut keys: Vec<GenomicKey> = self.known.iter().cloned().collect();
                keys.sort();
                SeedKeys::Genomic(keys)
            }
            FilterCategory::Am => {
                let classes = match &filter.predicate {
                    Some(FilterPredicate::AmClasses(classes)) => Some(classes),
                    _ => None,
                };
                let mut keys: Vec<ProteinKey> = self
                    .alpha_missense
                    .iter()
                    .filter(|(_, rec)| classes.is_none_or(|cs| cs.contains(&rec.class)))
                    .map(|(key, _)| key.clone())
                    .collect();
                keys.sort();
                SeedKeys::Protein(keys)
            }
            FilterCategory::Esm1b => {
                let mut keys: Vec<ProteinKey> = self
                    .esm1b
                    .iter()
                    .filter(|(_, score)| band_match(filter, **score))
                    .map(|(key, _)| key.clone())
                    .collect();
                keys.sort();
                SeedKeys::Protein(keys)
            }
            FilterCategory::PopEve => {
                let mut keys: Vec<ProteinKey> = self
                    .popeve
                    .iter()
                    .filter(|(_, score)| band_match(filter, **score))
                    .map(|(key, _)| key.clone())
                    .collect();
                keys.sort();
                SeedKeys::Protein(keys)
            }
            FilterCategory::Stability => {
                let classes = match &filter.predicate {
                    Some(FilterPredicate::StabilityClasses(classes)) => Some(classes),
                    _ => None,
                };
                let mut keys: Vec<ProteinKey> = self
                    .foldx
                    .iter()
                    .filter(|(_, ddg)| {
                        classes.is_none_or(|cs| cs.contains(&StabilityClass::from_ddg(**ddg)))
                    })
                    .map(|(key, _)| key.clone())
                    .collect();
                keys.sort();
                SeedKeys::Protein(keys)
            }
            FilterCategory::Conservation => {
                let mut keys: Vec<ResidueKey> = self
                    .conservation
                    .iter()
                    .filter(|(_, score)| band_match(filter, **score))
                    .map(|(key, _)| key.clone())
                    .collect();
                keys.sort();
                SeedKeys::Residue(keys)
            }
            FilterCategory::Pocket => {
                let mut keys: Vec<ResidueKey> = self.pocket.iter().cloned().collect();
                keys.sort();
                SeedKeys::Residue(keys)
            }
            FilterCategory::Interaction => {
                let mut keys: Vec<ResidueKey> = self.interaction.iter().cloned().collect();
                keys.sort();
                SeedKeys::Residue(keys)
            }
            FilterCategory::Coverage => {
                let mut keys: HashSet<ResidueKey> = HashSet::new();
                for (accession, ranges) in &self.coverage_by_accession {
                    for (start, end) in ranges {
                        for protein_position in *start..=*end {
                            keys.insert(ResidueKey {
                                accession: accession.clone(),
                                protein_position,
                            });
                        }
                    }
                }
                let mut keys: Vec<ResidueKey> = keys.into_iter().collect();
                keys.sort();
                SeedKeys::Residue(keys)
            }
        };
        Ok(keys)
    }

    fn cadd(&self, key: &GenomicKey) -> Result<Option<f64>, QueryError> {
        Ok(self.cadd.get(key).copied())
    }

    fn allele_freq(&self, key: &GenomicKey) -> Result<Option<f64>, QueryError> {
        Ok(self.allele_freq.get(key).copied())
    }

    fn is_known_variant(&self, key: &GenomicKey) -> Result<bool, QueryError> {
        Ok(self.known.contains(key))
    }

    fn alpha_missense(&self, key: &ProteinKey) -> Result<Option<AmRecord>, QueryError> {
        Ok(self.alpha_missense.get(key).copied())
    }

    fn esm1b(&self, key: &ProteinKey) -> Result<Option<f64>, QueryError> {
        Ok(self.esm1b.get(key).copied())
    }

    fn popeve(&self, key: &ProteinKey) -> Result<Option<f64>, QueryError> {
        Ok(self.popeve.get(key).copied())
    }

    fn foldx_ddg(&self, key: &ProteinKey) -> Result<Option<f64>, QueryError> {
        Ok(self.foldx.get(key).copied())
    }

    fn conservation(&self, key: &ResidueKey) -> Result<Option<f64>, QueryError> {
        Ok(self.conservation.get(key).copied())
    }

    fn has_structure(&self, key: &ResidueKey) -> Result<bool, QueryError> {
        Ok(self
            .coverage_by_accession
            .get(&key.accession)
            .is_some_and(|ranges| {
                ranges
                    .iter()
                    .any(|(start, end)| (*start..=*end).contains(&key.protein_position))
            }))
    }

    fn in_pocket(&self, key: &ResidueKey) -> Result<bool, QueryError> {
        Ok(self.pocket.contains(key))
    }

    fn at_interface(&self, key: &ResidueKey) -> Result<bool, QueryError> {
        Ok(self.interaction.contains(key))
    }

    fn pdb_coverage(&self, pdb_id: &str) -> Result<Vec<ResidueRange>, QueryError> {
        Ok(self
            .coverage_by_pdb
            .get(&pdb_id.to_ascii_uppercase())
            .cloned()
            .unwrap_or_default())
    }

    fn refseq_accessions(&self, refseq: &str) -> Result<Vec<String>, QueryError> {
        let (base, version) = split_refseq(refseq.trim());
        let Some(mappings) = self.refseq.get(&base.to_ascii_uppercase()) else {
            return Ok(Vec::new());
        };
        let mut accessions: Vec<String> = mappings
            .iter()
            .filter(|m| match version {
                Some(v) => m.version == Some(v),
                None => true,
            })
            .map(|m| m.accession.clone())
            .collect();
        accessions.sort();
        accessions.dedup();
        Ok(accessions)
    }
}
