//! Compiles typed search terms into a backbone predicate.
//!
//! Values of one type OR-combine, the typed groups AND-combine. A value
//! that fails to parse (bad Ensembl or RefSeq shape) compiles to an
//! always-false fragment rather than an error, so one typo in a batch does
//! not suppress its valid siblings. The "alternate ≠ reference" clause the
//! full predicate is ANDed with is enforced structurally by the candidate
//! expander, which only ever generates the three non-reference alternates.

use std::fmt::{self, Display};

use log::debug;

use varmap_core::models::request::{SearchTerm, SearchTermType};

use crate::predicate::BackbonePredicate;

/// The four Ensembl stable-id namespaces accepted in search terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsemblNamespace {
    Gene,
    Transcript,
    Protein,
    Exon,
}

impl EnsemblNamespace {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "ENSG" => Some(EnsemblNamespace::Gene),
            "ENST" => Some(EnsemblNamespace::Transcript),
            "ENSP" => Some(EnsemblNamespace::Protein),
            "ENSE" => Some(EnsemblNamespace::Exon),
            _ => None,
        }
    }
}

/// A parsed Ensembl stable id: namespace prefix, 11-digit number, optional
/// version suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsemblId {
    pub namespace: EnsemblNamespace,
    pub stable_id: String,
    pub version: Option<u32>,
}

impl Display for EnsemblId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stable_id)
    }
}

/// Parse an Ensembl stable id. Returns `None` for anything that does not
/// match `ENS[GTPE]` + 11 digits + optional `.version`.
pub fn parse_ensembl(value: &str) -> Option<EnsemblId> {
    let upper = value.trim().to_ascii_uppercase();
    if !upper.is_ascii() || upper.len() < 15 {
        return None;
    }
    let (prefix, rest) = upper.split_at(4);
    let namespace = EnsemblNamespace::from_prefix(prefix)?;
    let (digits, version) = match rest.split_once('.') {
        Some((digits, suffix)) => (digits, Some(suffix.parse::<u32>().ok()?)),
        None => (rest, None),
    };
    if digits.len() != 11 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(EnsemblId {
        namespace,
        stable_id: format!("{}{}", prefix, digits),
        version,
    })
}

/// Strip a trailing `.version` from a stable id for version-insensitive
/// comparison.
pub fn base_id(id: &str) -> &str {
    match id.split_once('.') {
        Some((base, _)) => base,
        None => id,
    }
}

/// Compile search terms into one backbone predicate.
pub fn compile_terms(terms: &[SearchTerm]) -> BackbonePredicate {
    let mut groups: Vec<BackbonePredicate> = Vec::new();

    let values_of = |term_type: SearchTermType| -> Vec<String> {
        terms
            .iter()
            .filter(|t| t.term_type == term_type)
            .map(|t| t.value.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    };

    let accessions: Vec<String> = values_of(SearchTermType::Uniprot)
        .into_iter()
        .map(|v| v.to_ascii_uppercase())
        .collect();
    if !accessions.is_empty() {
        groups.push(BackbonePredicate::AccessionIn(accessions));
    }

    let genes: Vec<String> = values_of(SearchTermType::Gene)
        .into_iter()
        .map(|v| v.to_ascii_uppercase())
        .collect();
    if !genes.is_empty() {
        groups.push(BackbonePredicate::GeneIn(genes));
    }

    let ensembl_values = values_of(SearchTermType::Ensembl);
    if !ensembl_values.is_empty() {
        groups.push(compile_ensembl_group(&ensembl_values));
    }

    let pdb_ids: Vec<String> = values_of(SearchTermType::Pdb)
        .into_iter()
        .map(|v| v.to_ascii_uppercase())
        .collect();
    if !pdb_ids.is_empty() {
        groups.push(BackbonePredicate::PdbIn(pdb_ids));
    }

    let refseq_ids = values_of(SearchTermType::Refseq);
    if !refseq_ids.is_empty() {
        groups.push(BackbonePredicate::RefseqIn(refseq_ids));
    }

    BackbonePredicate::and(groups)
}

/// OR-combine one type group of Ensembl values, split by namespace.
/// Unparseable values and exon ids (which no backbone column carries)
/// contribute always-false fragments.
fn compile_ensembl_group(values: &[String]) -> BackbonePredicate {
    let mut genes = Vec::new();
    let mut transcripts = Vec::new();
    let mut proteins = Vec::new();

    for value in values {
        match parse_ensembl(value) {
            Some(id) => match id.namespace {
                EnsemblNamespace::Gene => genes.push(id.stable_id),
                EnsemblNamespace::Transcript => transcripts.push(id.stable_id),
                EnsemblNamespace::Protein => proteins.push(id.stable_id),
                EnsemblNamespace::Exon => {
                    debug!("ensembl exon id {} matches no mapping column, skipping", id);
                }
            },
            None => {
                debug!("unparseable ensembl id {:?} compiles to an empty match", value);
            }
        }
    }

    let mut alternatives = Vec::new();
    if !genes.is_empty() {
        alternatives.push(BackbonePredicate::EnsemblGeneIn(genes));
    }
    if !transcripts.is_empty() {
        alternatives.push(BackbonePredicate::EnsemblTranscriptIn(transcripts));
    }
    if !proteins.is_empty() {
        alternatives.push(BackbonePredicate::EnsemblProteinIn(proteins));
    }
    BackbonePredicate::or(alternatives)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("ENSG00000142192", EnsemblNamespace::Gene, None)]
    #[case("ENST00000346798.8", EnsemblNamespace::Transcript, Some(8))]
    #[case("ensp00000284981", EnsemblNamespace::Protein, None)]
    #[case("ENSE00003527801", EnsemblNamespace::Exon, None)]
    fn test_parse_ensembl_valid(
        #[case] value: &str,
        #[case] namespace: EnsemblNamespace,
        #[case] version: Option<u32>,
    ) {
        let id = parse_ensembl(value).unwrap();
        assert_eq!(id.namespace, namespace);
        assert_eq!(id.version, version);
        assert_eq!(id.stable_id.len(), 15);
    }

    #[rstest]
    #[case("ENSG0000014219")] // 10 digits
    #[case("ENSG000001421921")] // 12 digits
    #[case("ENSX00000142192")] // bad namespace
    #[case("ENST00000346798.")] // empty version
    #[case("ENST00000346798.v8")] // non-numeric version
    #[case("TP53")]
    #[case("")]
    fn test_parse_ensembl_invalid(#[case] value: &str) {
        assert_eq!(parse_ensembl(value), None);
    }

    #[test]
    fn test_same_type_values_or_combine() {
        let terms = vec![
            SearchTerm::uniprot("P12345"),
            SearchTerm::uniprot("Q9NUW8"),
        ];
        assert_eq!(
            compile_terms(&terms),
            BackbonePredicate::AccessionIn(vec!["P12345".to_string(), "Q9NUW8".to_string()])
        );
    }

    #[test]
    fn test_types_and_combine() {
        let terms = vec![SearchTerm::uniprot("P05067"), SearchTerm::gene("app")];
        assert_eq!(
            compile_terms(&terms),
            BackbonePredicate::And(vec![
                BackbonePredicate::AccessionIn(vec!["P05067".to_string()]),
                BackbonePredicate::GeneIn(vec!["APP".to_string()]),
            ])
        );
    }

    #[test]
    fn test_invalid_ensembl_degrades_to_sibling_matches() {
        let terms = vec![
            SearchTerm::ensembl("not-an-id"),
            SearchTerm::ensembl("ENST00000346798"),
        ];
        assert_eq!(
            compile_terms(&terms),
            BackbonePredicate::EnsemblTranscriptIn(vec!["ENST00000346798".to_string()])
        );
    }

    #[test]
    fn test_all_invalid_ensembl_matches_nothing() {
        let terms = vec![SearchTerm::ensembl("bogus"), SearchTerm::ensembl("ENSE00003527801")];
        assert_eq!(compile_terms(&terms), BackbonePredicate::Never);
    }

    #[test]
    fn test_no_terms_compile_to_always() {
        assert_eq!(compile_terms(&[]), BackbonePredicate::Always);
    }
}
