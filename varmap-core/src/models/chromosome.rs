//! Karyotype ordering for chromosome names.

use std::cmp::Ordering;

/// Rank of a chromosome in karyotype order: 1..22, X, Y, MT. Accepts an
/// optional "chr" prefix. Unrecognised names sort after all known ones.
pub fn karyotype_rank(chromosome: &str) -> u32 {
    let name = chromosome
        .strip_prefix("chr")
        .or_else(|| chromosome.strip_prefix("CHR"))
        .unwrap_or(chromosome);
    match name {
        "X" | "x" => 23,
        "Y" | "y" => 24,
        "MT" | "M" | "mt" | "m" => 25,
        other => match other.parse::<u32>() {
            Ok(n) if (1..=22).contains(&n) => n,
            _ => u32::MAX,
        },
    }
}

/// Total order over chromosome names: karyotype rank first, then the raw
/// name so unknown contigs still sort deterministically.
pub fn compare_chromosomes(a: &str, b: &str) -> Ordering {
    karyotype_rank(a)
        .cmp(&karyotype_rank(b))
        .then_with(|| a.cmp(b))
}
