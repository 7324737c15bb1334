//! Deterministic ordering and paging of result rows.
//!
//! The requested sort key compares first, with rows lacking the score
//! (LEFT-joined annotations) ordered last in both directions. The
//! tie-break chain makes the full ordering total, so sequential pages
//! partition the result set with no duplicates and no omissions.

use std::cmp::Ordering;

use varmap_core::models::chromosome::compare_chromosomes;
use varmap_core::models::request::{SortKey, SortOrder, SortSpec};
use varmap_core::models::variant::GenomicVariant;

fn sort_score(variant: &GenomicVariant, key: SortKey) -> Option<f64> {
    match key {
        SortKey::None => None,
        SortKey::Cadd => variant.scores.cadd,
        SortKey::Am => variant.scores.am,
        SortKey::Popeve => variant.scores.popeve,
        SortKey::Esm1b => variant.scores.esm1b,
    }
}

fn compare_scores(a: Option<f64>, b: Option<f64>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ordering = x.total_cmp(&y);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        }
        // missing scores order last regardless of direction
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn tie_break(a: &GenomicVariant, b: &GenomicVariant) -> Ordering {
    compare_chromosomes(&a.chromosome, &b.chromosome)
        .then_with(|| a.position.cmp(&b.position))
        .then_with(|| a.protein_position.cmp(&b.protein_position))
        .then_with(|| a.codon_position.cmp(&b.codon_position))
        .then_with(|| a.alternate_base.cmp(&b.alternate_base))
}

pub(crate) fn sort_rows(rows: &mut [GenomicVariant], sort: &SortSpec) {
    rows.sort_by(|a, b| {
        let primary = match sort.key {
            SortKey::None => Ordering::Equal,
            key => compare_scores(sort_score(a, key), sort_score(b, key), sort.order),
        };
        primary.then_with(|| tie_break(a, b))
    });
}

/// Slice out one 1-based page.
pub(crate) fn paginate(
    rows: Vec<GenomicVariant>,
    page: usize,
    page_size: usize,
) -> Vec<GenomicVariant> {
    rows.into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    use varmap_core::codon::CodonPos;
    use varmap_core::models::base::Base;
    use varmap_core::models::variant::VariantScores;

    fn variant(chromosome: &str, position: u32, cadd: Option<f64>) -> GenomicVariant {
        GenomicVariant {
            chromosome: chromosome.to_string(),
            position,
            reference_base: Base::G,
            alternate_base: Base::A,
            accession: "P04637".to_string(),
            protein_position: 1,
            codon_position: CodonPos::new(1).unwrap(),
            mutant_amino_acid: None,
            scores: VariantScores {
                cadd,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_default_order_is_karyotype_then_position() {
        let mut rows = vec![
            variant("10", 5, None),
            variant("2", 9, None),
            variant("2", 3, None),
        ];
        sort_rows(&mut rows, &SortSpec::default());
        let order: Vec<(String, u32)> = rows
            .iter()
            .map(|v| (v.chromosome.clone(), v.position))
            .collect();
        assert_eq!(
            order,
            vec![
                ("2".to_string(), 3),
                ("2".to_string(), 9),
                ("10".to_string(), 5)
            ]
        );
    }

    #[test]
    fn test_desc_sort_orders_nulls_last() {
        let mut rows = vec![
            variant("1", 1, Some(12.0)),
            variant("1", 2, None),
            variant("1", 3, Some(31.5)),
        ];
        sort_rows(&mut rows, &SortSpec::descending(SortKey::Cadd));
        let scores: Vec<Option<f64>> = rows.iter().map(|v| v.scores.cadd).collect();
        assert_eq!(scores, vec![Some(31.5), Some(12.0), None]);
    }

    #[test]
    fn test_asc_sort_also_orders_nulls_last() {
        let mut rows = vec![variant("1", 1, None), variant("1", 2, Some(5.0))];
        sort_rows(&mut rows, &SortSpec::ascending(SortKey::Cadd));
        let scores: Vec<Option<f64>> = rows.iter().map(|v| v.scores.cadd).collect();
        assert_eq!(scores, vec![Some(5.0), None]);
    }

    #[test]
    fn test_pages_partition_the_rows() {
        let rows: Vec<GenomicVariant> = (1..=7).map(|p| variant("1", p, None)).collect();
        let mut collected = Vec::new();
        for page in 1..=4 {
            collected.extend(paginate(rows.clone(), page, 3));
        }
        assert_eq!(collected, rows);
    }
}
