//! Request and response value types for the search engine.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// The kind of biological identifier a search term carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchTermType {
    Uniprot,
    Gene,
    Ensembl,
    Pdb,
    Refseq,
}

/// A typed search term. Terms of the same type OR-combine; terms of
/// different types AND-combine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTerm {
    #[serde(rename = "type")]
    pub term_type: SearchTermType,
    pub value: String,
}

impl SearchTerm {
    pub fn new(term_type: SearchTermType, value: impl Into<String>) -> Self {
        SearchTerm {
            term_type,
            value: value.into(),
        }
    }

    pub fn uniprot(value: impl Into<String>) -> Self {
        Self::new(SearchTermType::Uniprot, value)
    }

    pub fn gene(value: impl Into<String>) -> Self {
        Self::new(SearchTermType::Gene, value)
    }

    pub fn ensembl(value: impl Into<String>) -> Self {
        Self::new(SearchTermType::Ensembl, value)
    }

    pub fn pdb(value: impl Into<String>) -> Self {
        Self::new(SearchTermType::Pdb, value)
    }

    pub fn refseq(value: impl Into<String>) -> Self {
        Self::new(SearchTermType::Refseq, value)
    }
}

/// A half-open score band [min, max). An absent end is unbounded, which is
/// how the open-ended PopEVE bands are spelled without IEEE infinities in
/// JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBand {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ScoreBand {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        ScoreBand { min, max }
    }

    pub fn between(min: f64, max: f64) -> Self {
        ScoreBand {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_least(min: f64) -> Self {
        ScoreBand {
            min: Some(min),
            max: None,
        }
    }

    pub fn below(max: f64) -> Self {
        ScoreBand {
            min: None,
            max: Some(max),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value < max)
    }
}

/// AlphaMissense pathogenicity class, encoded -1/0/1 in the relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmClass {
    LikelyBenign,
    Ambiguous,
    LikelyPathogenic,
}

impl AmClass {
    pub fn code(self) -> i8 {
        match self {
            AmClass::LikelyBenign => -1,
            AmClass::Ambiguous => 0,
            AmClass::LikelyPathogenic => 1,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(AmClass::LikelyBenign),
            0 => Some(AmClass::Ambiguous),
            1 => Some(AmClass::LikelyPathogenic),
            _ => None,
        }
    }
}

/// Predicted effect of a substitution on fold stability, derived from the
/// FoldX ddG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StabilityClass {
    LikelyDestabilising,
    UnlikelyDestabilising,
}

/// ddG at or above this is called likely destabilising (kcal/mol).
pub const FOLDX_DDG_THRESHOLD: f64 = 2.0;

impl StabilityClass {
    pub fn from_ddg(ddg: f64) -> Self {
        if ddg >= FOLDX_DDG_THRESHOLD {
            StabilityClass::LikelyDestabilising
        } else {
            StabilityClass::UnlikelyDestabilising
        }
    }
}

/// Annotation filters. A list field is inactive when empty; a boolean is
/// inactive when false; a bound is inactive when `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Keep only variants present in the reference variant catalogue.
    pub known: bool,
    pub cadd: Vec<ScoreBand>,
    pub am: Vec<AmClass>,
    pub popeve: Vec<ScoreBand>,
    pub allele_freq: Vec<ScoreBand>,
    pub conservation_min: Option<f64>,
    pub conservation_max: Option<f64>,
    pub esm1b_min: Option<f64>,
    pub esm1b_max: Option<f64>,
    /// Keep only residues covered by an experimental structure.
    pub experimental_model: bool,
    /// Keep only residues in a predicted pocket.
    pub pocket: bool,
    /// Keep only residues at a predicted interaction interface.
    pub interact: bool,
    pub stability: Vec<StabilityClass>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        !self.known
            && self.cadd.is_empty()
            && self.am.is_empty()
            && self.popeve.is_empty()
            && self.allele_freq.is_empty()
            && self.conservation_min.is_none()
            && self.conservation_max.is_none()
            && self.esm1b_min.is_none()
            && self.esm1b_max.is_none()
            && !self.experimental_model
            && !self.pocket
            && !self.interact
            && self.stability.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    None,
    Cadd,
    Am,
    Popeve,
    Esm1b,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSpec {
    pub key: SortKey,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn ascending(key: SortKey) -> Self {
        SortSpec {
            key,
            order: SortOrder::Asc,
        }
    }

    pub fn descending(key: SortKey) -> Self {
        SortSpec {
            key,
            order: SortOrder::Desc,
        }
    }
}

/// A retrieval request: typed identifiers, annotation filters, sort and
/// 1-based paging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub search_terms: Vec<SearchTerm>,
    pub filters: FilterSpec,
    pub sort: SortSpec,
    pub page: usize,
    pub page_size: usize,
}

impl Default for SearchRequest {
    fn default() -> Self {
        SearchRequest {
            search_terms: Vec::new(),
            filters: FilterSpec::default(),
            sort: SortSpec::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One interactive result page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_elements: usize,
}

impl<T> Page<T> {
    pub fn empty(page: usize, page_size: usize) -> Self {
        Page {
            content: Vec::new(),
            page,
            page_size,
            total_elements: 0,
        }
    }
}

/// Named CADD bands, for callers that prefer labels over raw bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaddCategory {
    LikelyBenign,
    PotentiallyDeleterious,
    QuiteLikelyDeleterious,
    ProbablyDeleterious,
    HighlyLikelyDeleterious,
}

impl CaddCategory {
    pub fn band(self) -> ScoreBand {
        match self {
            CaddCategory::LikelyBenign => ScoreBand::below(15.0),
            CaddCategory::PotentiallyDeleterious => ScoreBand::between(15.0, 20.0),
            CaddCategory::QuiteLikelyDeleterious => ScoreBand::between(20.0, 25.0),
            CaddCategory::ProbablyDeleterious => ScoreBand::between(25.0, 30.0),
            CaddCategory::HighlyLikelyDeleterious => ScoreBand::at_least(30.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CaddCategory::LikelyBenign => "likely_benign",
            CaddCategory::PotentiallyDeleterious => "potentially_deleterious",
            CaddCategory::QuiteLikelyDeleterious => "quite_likely_deleterious",
            CaddCategory::ProbablyDeleterious => "probably_deleterious",
            CaddCategory::HighlyLikelyDeleterious => "highly_likely_deleterious",
        }
    }
}

impl FromStr for CaddCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "likely_benign" => Ok(CaddCategory::LikelyBenign),
            "potentially_deleterious" => Ok(CaddCategory::PotentiallyDeleterious),
            "quite_likely_deleterious" => Ok(CaddCategory::QuiteLikelyDeleterious),
            "probably_deleterious" => Ok(CaddCategory::ProbablyDeleterious),
            "highly_likely_deleterious" => Ok(CaddCategory::HighlyLikelyDeleterious),
            _ => Err(format!("unknown CADD category: {}", s)),
        }
    }
}

/// Named allele-frequency bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlleleFreqCategory {
    VeryRare,
    Rare,
    LowFrequency,
    Common,
}

impl AlleleFreqCategory {
    pub fn band(self) -> ScoreBand {
        match self {
            AlleleFreqCategory::VeryRare => ScoreBand::below(1e-4),
            AlleleFreqCategory::Rare => ScoreBand::between(1e-4, 0.01),
            AlleleFreqCategory::LowFrequency => ScoreBand::between(0.01, 0.05),
            AlleleFreqCategory::Common => ScoreBand::at_least(0.05),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AlleleFreqCategory::VeryRare => "very_rare",
            AlleleFreqCategory::Rare => "rare",
            AlleleFreqCategory::LowFrequency => "low_frequency",
            AlleleFreqCategory::Common => "common",
        }
    }
}

impl FromStr for AlleleFreqCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "very_rare" => Ok(AlleleFreqCategory::VeryRare),
            "rare" => Ok(AlleleFreqCategory::Rare),
            "low_frequency" => Ok(AlleleFreqCategory::LowFrequency),
            "common" => Ok(AlleleFreqCategory::Common),
            _ => Err(format!("unknown allele frequency category: {}", s)),
        }
    }
}

/// Named PopEVE bands. The outer bands are open-ended, which is why
/// [`ScoreBand`] ends are optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopEveClass {
    LikelyPathogenic,
    Ambiguous,
    LikelyBenign,
}

impl PopEveClass {
    pub fn band(self) -> ScoreBand {
        match self {
            PopEveClass::LikelyPathogenic => ScoreBand::below(-4.6),
            PopEveClass::Ambiguous => ScoreBand::between(-4.6, -2.5),
            PopEveClass::LikelyBenign => ScoreBand::at_least(-2.5),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PopEveClass::LikelyPathogenic => "likely_pathogenic",
            PopEveClass::Ambiguous => "ambiguous",
            PopEveClass::LikelyBenign => "likely_benign",
        }
    }
}

impl FromStr for PopEveClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "likely_pathogenic" => Ok(PopEveClass::LikelyPathogenic),
            "ambiguous" => Ok(PopEveClass::Ambiguous),
            "likely_benign" => Ok(PopEveClass::LikelyBenign),
            _ => Err(format!("unknown PopEVE class: {}", s)),
        }
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::None => write!(f, "none"),
            SortKey::Cadd => write!(f, "cadd"),
            SortKey::Am => write!(f, "am"),
            SortKey::Popeve => write!(f, "popeve"),
            SortKey::Esm1b => write!(f, "esm1b"),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(SortKey::None),
            "cadd" => Ok(SortKey::Cadd),
            "am" => Ok(SortKey::Am),
            "popeve" => Ok(SortKey::Popeve),
            "esm1b" => Ok(SortKey::Esm1b),
            _ => Err(format!("unknown sort key: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case(ScoreBand::between(25.0, 30.0), 25.0, true)]
    #[case(ScoreBand::between(25.0, 30.0), 29.999, true)]
    #[case(ScoreBand::between(25.0, 30.0), 30.0, false)]
    #[case(ScoreBand::between(25.0, 30.0), 24.999, false)]
    #[case(ScoreBand::at_least(-2.5), 1e9, true)]
    #[case(ScoreBand::below(-4.6), -1e9, true)]
    #[case(ScoreBand::below(-4.6), -4.6, false)]
    fn test_band_is_half_open(#[case] band: ScoreBand, #[case] value: f64, #[case] hit: bool) {
        assert_eq!(band.contains(value), hit);
    }

    #[test]
    fn test_empty_filter_spec_is_inactive() {
        assert!(FilterSpec::default().is_empty());
        let spec = FilterSpec {
            known: true,
            ..Default::default()
        };
        assert!(!spec.is_empty());
    }

    #[test]
    fn test_stability_class_threshold() {
        assert_eq!(
            StabilityClass::from_ddg(2.0),
            StabilityClass::LikelyDestabilising
        );
        assert_eq!(
            StabilityClass::from_ddg(1.99),
            StabilityClass::UnlikelyDestabilising
        );
    }

    #[test]
    fn test_am_class_codes_round_trip() {
        for class in [
            AmClass::LikelyBenign,
            AmClass::Ambiguous,
            AmClass::LikelyPathogenic,
        ] {
            assert_eq!(AmClass::from_code(class.code()), Some(class));
        }
        assert_eq!(AmClass::from_code(2), None);
    }

    #[test]
    fn test_popeve_classes_tile_the_line() {
        for value in [-1e12, -4.6, -4.59, -2.5, 0.0, 1e12] {
            let hits = [
                PopEveClass::LikelyPathogenic,
                PopEveClass::Ambiguous,
                PopEveClass::LikelyBenign,
            ]
            .iter()
            .filter(|c| c.band().contains(value))
            .count();
            assert_eq!(hits, 1, "value {} must land in exactly one class", value);
        }
    }

    #[test]
    fn test_search_request_serde_shape() {
        let json = r#"{
            "search_terms": [{"type": "UNIPROT", "value": "P05067"}],
            "filters": {"cadd": [{"min": 25.0, "max": 30.0}]},
            "page": 1,
            "page_size": 10
        }"#;
        let request: SearchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.search_terms, vec![SearchTerm::uniprot("P05067")]);
        assert_eq!(request.filters.cadd, vec![ScoreBand::between(25.0, 30.0)]);
        assert_eq!(request.sort, SortSpec::default());
        assert_eq!(request.page_size, 10);
    }
}
