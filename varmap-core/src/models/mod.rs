pub mod backbone;
pub mod base;
pub mod chromosome;
pub mod keys;
pub mod request;
pub mod variant;

pub use backbone::BackboneRecord;
pub use base::Base;
pub use keys::{GenomicKey, ProteinKey, ResidueKey, ResidueRange};
pub use request::{
    AlleleFreqCategory, AmClass, CaddCategory, FilterSpec, Page, PopEveClass, ScoreBand,
    SearchRequest, SearchTerm, SearchTermType, SortKey, SortOrder, SortSpec, StabilityClass,
};
pub use variant::{GenomicVariant, VariantScores};
