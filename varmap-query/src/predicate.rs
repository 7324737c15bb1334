//! Composable predicate tree over the backbone mapping.
//!
//! Identifier terms compile into this value type instead of query strings,
//! so plan construction is pure and the backend decides how to evaluate
//! each atom. `PdbIn` and `RefseqIn` are deliberately unresolved here: they
//! need the structure-coverage relation and the RefSeq crosswalk, which the
//! store lowers them through at execution time.

use std::fmt::{self, Display};

use varmap_core::models::keys::ResidueRange;

#[derive(Debug, Clone, PartialEq)]
pub enum BackbonePredicate {
    /// Matches every backbone row.
    Always,
    /// Matches nothing. Malformed identifier values compile to this so the
    /// rest of their OR-group still returns rows.
    Never,
    AccessionIn(Vec<String>),
    GeneIn(Vec<String>),
    EnsemblGeneIn(Vec<String>),
    EnsemblTranscriptIn(Vec<String>),
    EnsemblProteinIn(Vec<String>),
    /// Structure ids, lowered through the coverage relation into
    /// [`BackbonePredicate::ResidueIn`] by the backend.
    PdbIn(Vec<String>),
    /// RefSeq ids, lowered through the crosswalk into
    /// [`BackbonePredicate::AccessionIn`] by the backend.
    RefseqIn(Vec<String>),
    /// Accession plus residue-range constraints (the lowered form of a
    /// structure id).
    ResidueIn(Vec<ResidueRange>),
    And(Vec<BackbonePredicate>),
    Or(Vec<BackbonePredicate>),
}

impl BackbonePredicate {
    /// Conjunction with the usual simplifications: `Always` operands drop
    /// out, a `Never` operand collapses the whole conjunction.
    pub fn and(predicates: Vec<BackbonePredicate>) -> BackbonePredicate {
        let mut kept = Vec::with_capacity(predicates.len());
        for p in predicates {
            match p {
                BackbonePredicate::Always => {}
                BackbonePredicate::Never => return BackbonePredicate::Never,
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => BackbonePredicate::Always,
            1 => kept.into_iter().next().unwrap_or(BackbonePredicate::Always),
            _ => BackbonePredicate::And(kept),
        }
    }

    /// Disjunction: `Never` operands drop out, an `Always` operand collapses
    /// the whole disjunction. An empty disjunction matches nothing.
    pub fn or(predicates: Vec<BackbonePredicate>) -> BackbonePredicate {
        let mut kept = Vec::with_capacity(predicates.len());
        for p in predicates {
            match p {
                BackbonePredicate::Never => {}
                BackbonePredicate::Always => return BackbonePredicate::Always,
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => BackbonePredicate::Never,
            1 => kept.into_iter().next().unwrap_or(BackbonePredicate::Never),
            _ => BackbonePredicate::Or(kept),
        }
    }

    pub fn is_never(&self) -> bool {
        matches!(self, BackbonePredicate::Never)
    }
}

fn write_membership(f: &mut fmt::Formatter<'_>, column: &str, values: &[String]) -> fmt::Result {
    write!(f, "{} IN ({})", column, values.join(", "))
}

impl Display for BackbonePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackbonePredicate::Always => write!(f, "TRUE"),
            BackbonePredicate::Never => write!(f, "FALSE"),
            BackbonePredicate::AccessionIn(vs) => write_membership(f, "accession", vs),
            BackbonePredicate::GeneIn(vs) => write_membership(f, "gene", vs),
            BackbonePredicate::EnsemblGeneIn(vs) => write_membership(f, "ensembl_gene", vs),
            BackbonePredicate::EnsemblTranscriptIn(vs) => {
                write_membership(f, "ensembl_transcript", vs)
            }
            BackbonePredicate::EnsemblProteinIn(vs) => write_membership(f, "ensembl_protein", vs),
            BackbonePredicate::PdbIn(vs) => write_membership(f, "pdb", vs),
            BackbonePredicate::RefseqIn(vs) => write_membership(f, "refseq", vs),
            BackbonePredicate::ResidueIn(ranges) => {
                let parts: Vec<String> = ranges
                    .iter()
                    .map(|r| format!("{}:{}-{}", r.accession, r.start, r.end))
                    .collect();
                write!(f, "residue IN ({})", parts.join(", "))
            }
            BackbonePredicate::And(ps) => {
                let parts: Vec<String> = ps.iter().map(|p| p.to_string()).collect();
                write!(f, "({})", parts.join(" AND "))
            }
            BackbonePredicate::Or(ps) => {
                let parts: Vec<String> = ps.iter().map(|p| p.to_string()).collect();
                write!(f, "({})", parts.join(" OR "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn accession(value: &str) -> BackbonePredicate {
        BackbonePredicate::AccessionIn(vec![value.to_string()])
    }

    #[test]
    fn test_and_simplification() {
        assert_eq!(BackbonePredicate::and(vec![]), BackbonePredicate::Always);
        assert_eq!(
            BackbonePredicate::and(vec![BackbonePredicate::Always, accession("P05067")]),
            accession("P05067")
        );
        assert_eq!(
            BackbonePredicate::and(vec![accession("P05067"), BackbonePredicate::Never]),
            BackbonePredicate::Never
        );
    }

    #[test]
    fn test_or_simplification() {
        assert_eq!(BackbonePredicate::or(vec![]), BackbonePredicate::Never);
        assert_eq!(
            BackbonePredicate::or(vec![BackbonePredicate::Never, accession("P05067")]),
            accession("P05067")
        );
        assert_eq!(
            BackbonePredicate::or(vec![accession("P05067"), BackbonePredicate::Always]),
            BackbonePredicate::Always
        );
    }

    #[test]
    fn test_display_reads_like_a_where_clause() {
        let p = BackbonePredicate::and(vec![
            BackbonePredicate::AccessionIn(vec!["P05067".to_string(), "Q9NUW8".to_string()]),
            BackbonePredicate::GeneIn(vec!["TP53".to_string()]),
        ]);
        assert_eq!(
            p.to_string(),
            "(accession IN (P05067, Q9NUW8) AND gene IN (TP53))"
        );
    }
}
