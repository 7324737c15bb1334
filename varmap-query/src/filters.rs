//! Compiles annotation filters into join decisions.
//!
//! Each active category becomes a [`CompiledFilter`]: the annotation
//! relation to reach, whether the join restricts the result set (INNER) or
//! only carries a sort key (LEFT), and the restricting predicate if any.
//! A LEFT join never drops rows, so sorting by an unfiltered score does not
//! silently lose variants lacking that annotation.

use std::fmt::{self, Display};

use varmap_core::models::request::{
    AmClass, FilterSpec, ScoreBand, SortKey, SortSpec, StabilityClass,
};

/// The ten annotation relations plus the known-variant lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterCategory {
    Cadd,
    AlleleFreq,
    Am,
    Esm1b,
    PopEve,
    Stability,
    Conservation,
    Coverage,
    Pocket,
    Interaction,
    Known,
}

impl FilterCategory {
    /// Static selectivity ranking used to choose the filter-first seed.
    /// Allele frequency and PopEVE cut hardest, the structural flags and
    /// the known-variant catalogue barely cut at all.
    pub const SELECTIVITY: [FilterCategory; 11] = [
        FilterCategory::AlleleFreq,
        FilterCategory::PopEve,
        FilterCategory::Cadd,
        FilterCategory::Am,
        FilterCategory::Esm1b,
        FilterCategory::Stability,
        FilterCategory::Conservation,
        FilterCategory::Pocket,
        FilterCategory::Interaction,
        FilterCategory::Coverage,
        FilterCategory::Known,
    ];

    /// Join order for identifier-first plans: genomic-level relations
    /// first, then protein-level relations keyed through the codon
    /// substitution column, then structural context, then the known-variant
    /// lookup.
    pub const JOIN_ORDER: [FilterCategory; 11] = [
        FilterCategory::Cadd,
        FilterCategory::AlleleFreq,
        FilterCategory::Am,
        FilterCategory::Esm1b,
        FilterCategory::PopEve,
        FilterCategory::Stability,
        FilterCategory::Conservation,
        FilterCategory::Coverage,
        FilterCategory::Pocket,
        FilterCategory::Interaction,
        FilterCategory::Known,
    ];

    /// Whether reaching this relation requires the mutant amino acid from
    /// the codon substitution resolver.
    pub fn needs_mutant_aa(self) -> bool {
        matches!(
            self,
            FilterCategory::Am
                | FilterCategory::Esm1b
                | FilterCategory::PopEve
                | FilterCategory::Stability
        )
    }

    fn selectivity_rank(self) -> usize {
        Self::SELECTIVITY
            .iter()
            .position(|c| *c == self)
            .unwrap_or(usize::MAX)
    }

    fn join_rank(self) -> usize {
        Self::JOIN_ORDER
            .iter()
            .position(|c| *c == self)
            .unwrap_or(usize::MAX)
    }
}

impl Display for FilterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterCategory::Cadd => "cadd",
            FilterCategory::AlleleFreq => "allele_freq",
            FilterCategory::Am => "alpha_missense",
            FilterCategory::Esm1b => "esm1b",
            FilterCategory::PopEve => "popeve",
            FilterCategory::Stability => "stability",
            FilterCategory::Conservation => "conservation",
            FilterCategory::Coverage => "structure_coverage",
            FilterCategory::Pocket => "pocket",
            FilterCategory::Interaction => "interaction",
            FilterCategory::Known => "known_variants",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Restricting join: rows without a matching annotation drop out.
    Inner,
    /// Sort-support join: attaches the score, never drops rows.
    Left,
}

/// The restricting condition of one compiled filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPredicate {
    /// Score lands in at least one band (CADD, allele freq, PopEVE).
    Bands(Vec<ScoreBand>),
    /// Score within optional bounds (conservation, ESM1b).
    Range { min: Option<f64>, max: Option<f64> },
    AmClasses(Vec<AmClass>),
    StabilityClasses(Vec<StabilityClass>),
    /// The row must simply exist in the relation (known variants,
    /// structural context flags).
    Present,
}

impl FilterPredicate {
    pub fn accepts_score(&self, score: f64) -> bool {
        match self {
            FilterPredicate::Bands(bands) => bands.iter().any(|b| b.contains(score)),
            FilterPredicate::Range { min, max } => {
                min.is_none_or(|m| score >= m) && max.is_none_or(|m| score <= m)
            }
            FilterPredicate::AmClasses(_)
            | FilterPredicate::StabilityClasses(_)
            | FilterPredicate::Present => false,
        }
    }
}

/// One annotation join the plan will perform.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    pub category: FilterCategory,
    pub join: JoinKind,
    pub predicate: Option<FilterPredicate>,
}

impl CompiledFilter {
    pub fn restricting(category: FilterCategory, predicate: FilterPredicate) -> Self {
        CompiledFilter {
            category,
            join: JoinKind::Inner,
            predicate: Some(predicate),
        }
    }

    pub fn sort_only(category: FilterCategory) -> Self {
        CompiledFilter {
            category,
            join: JoinKind::Left,
            predicate: None,
        }
    }

    pub fn is_restricting(&self) -> bool {
        self.join == JoinKind::Inner
    }
}

impl Display for CompiledFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.join {
            JoinKind::Inner => write!(f, "inner join {}", self.category),
            JoinKind::Left => write!(f, "left join {} (sort only)", self.category),
        }
    }
}

/// The relation a sort key is carried by, if any.
pub fn sort_category(key: SortKey) -> Option<FilterCategory> {
    match key {
        SortKey::None => None,
        SortKey::Cadd => Some(FilterCategory::Cadd),
        SortKey::Am => Some(FilterCategory::Am),
        SortKey::Popeve => Some(FilterCategory::PopEve),
        SortKey::Esm1b => Some(FilterCategory::Esm1b),
    }
}

/// Compile every active filter category, plus a sort-only LEFT join when
/// the sort key's relation is not already joined. Output is in
/// [`FilterCategory::JOIN_ORDER`].
pub fn compile_filters(filters: &FilterSpec, sort: &SortSpec) -> Vec<CompiledFilter> {
    let mut compiled: Vec<CompiledFilter> = Vec::new();

    if !filters.cadd.is_empty() {
        compiled.push(CompiledFilter::restricting(
            FilterCategory::Cadd,
            FilterPredicate::Bands(filters.cadd.clone()),
        ));
    }
    if !filters.allele_freq.is_empty() {
        compiled.push(CompiledFilter::restricting(
            FilterCategory::AlleleFreq,
            FilterPredicate::Bands(filters.allele_freq.clone()),
        ));
    }
    if !filters.am.is_empty() {
        compiled.push(CompiledFilter::restricting(
            FilterCategory::Am,
            FilterPredicate::AmClasses(filters.am.clone()),
        ));
    }
    if filters.esm1b_min.is_some() || filters.esm1b_max.is_some() {
        compiled.push(CompiledFilter::restricting(
            FilterCategory::Esm1b,
            FilterPredicate::Range {
                min: filters.esm1b_min,
                max: filters.esm1b_max,
            },
        ));
    }
    if !filters.popeve.is_empty() {
        compiled.push(CompiledFilter::restricting(
            FilterCategory::PopEve,
            FilterPredicate::Bands(filters.popeve.clone()),
        ));
    }
    if !filters.stability.is_empty() {
        compiled.push(CompiledFilter::restricting(
            FilterCategory::Stability,
            FilterPredicate::StabilityClasses(filters.stability.clone()),
        ));
    }
    if filters.conservation_min.is_some() || filters.conservation_max.is_some() {
        compiled.push(CompiledFilter::restricting(
            FilterCategory::Conservation,
            FilterPredicate::Range {
                min: filters.conservation_min,
                max: filters.conservation_max,
            },
        ));
    }
    if filters.experimental_model {
        compiled.push(CompiledFilter::restricting(
            FilterCategory::Coverage,
            FilterPredicate::Present,
        ));
    }
    if filters.pocket {
        compiled.push(CompiledFilter::restricting(
            FilterCategory::Pocket,
            FilterPredicate::Present,
        ));
    }
    if filters.interact {
        compiled.push(CompiledFilter::restricting(
            FilterCategory::Interaction,
            FilterPredicate::Present,
        ));
    }
    if filters.known {
        compiled.push(CompiledFilter::restricting(
            FilterCategory::Known,
            FilterPredicate::Present,
        ));
    }

    if let Some(category) = sort_category(sort.key) {
        if !compiled.iter().any(|f| f.category == category) {
            compiled.push(CompiledFilter::sort_only(category));
        }
    }

    compiled.sort_by_key(|f| f.category.join_rank());
    compiled
}

/// Pick the seed for a filter-first plan: the restricting filter whose
/// category ranks first in the static selectivity order.
pub fn pick_seed(compiled: &[CompiledFilter]) -> Option<usize> {
    compiled
        .iter()
        .enumerate()
        .filter(|(_, f)| f.is_restricting())
        .min_by_key(|(_, f)| f.category.selectivity_rank())
        .map(|(i, _)| i)
}
