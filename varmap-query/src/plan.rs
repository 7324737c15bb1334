//! Strategy selection: the two terminal plan shapes.
//!
//! A request with identifier terms narrows the backbone first (identifiers
//! resolve to one gene, structure or transcript family, so the scan is
//! highly selective) and applies filters as joins afterwards. A request
//! with filters only narrows the most selective restricting relation into
//! a seed key set first, so the 3-alternate expansion only happens for
//! backbone rows that can possibly satisfy a filter. A request with
//! neither is rejected before any relation is touched.

use std::fmt::{self, Display};

use varmap_core::QueryError;
use varmap_core::models::request::SearchRequest;

use crate::filters::{CompiledFilter, compile_filters, pick_seed};
use crate::identifier::compile_terms;
use crate::predicate::BackbonePredicate;

#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// Narrow the seed relation, join backbone against the seed keys, then
    /// apply the remaining joins.
    FilterFirst {
        seed: CompiledFilter,
        rest: Vec<CompiledFilter>,
    },
    /// Scan backbone under the identifier predicate, expand alternates,
    /// then apply all filter joins.
    IdentifierFirst {
        predicate: BackbonePredicate,
        joins: Vec<CompiledFilter>,
    },
}

impl Plan {
    pub fn build(request: &SearchRequest) -> Result<Plan, QueryError> {
        let compiled = compile_filters(&request.filters, &request.sort);

        if request.search_terms.is_empty() {
            let Some(seed_index) = pick_seed(&compiled) else {
                return Err(QueryError::UnconstrainedQuery);
            };
            let mut rest = compiled;
            let seed = rest.remove(seed_index);
            return Ok(Plan::FilterFirst { seed, rest });
        }

        Ok(Plan::IdentifierFirst {
            predicate: compile_terms(&request.search_terms),
            joins: compiled,
        })
    }

    /// Whether executing this plan needs the mutant amino acid column from
    /// the codon substitution resolver (any protein-level filter or sort
    /// key).
    pub fn needs_mutant_aa(&self) -> bool {
        self.all_filters().any(|f| f.category.needs_mutant_aa())
    }

    /// Filter-only plans are the ones worth flagging when their totals get
    /// implausibly large.
    pub fn is_filter_only(&self) -> bool {
        matches!(self, Plan::FilterFirst { .. })
    }

    fn all_filters(&self) -> impl Iterator<Item = &CompiledFilter> {
        let (seed, joins) = match self {
            Plan::FilterFirst { seed, rest } => (Some(seed), rest),
            Plan::IdentifierFirst { joins, .. } => (None, joins),
        };
        seed.into_iter().chain(joins.iter())
    }
}

impl Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plan::FilterFirst { seed, rest } => write!(
                f,
                "filter-first plan seeded by {} with {} further join(s)",
                seed.category,
                rest.len()
            ),
            Plan::IdentifierFirst { predicate, joins } => write!(
                f,
                "identifier-first plan over {} with {} join(s)",
                predicate,
                joins.len()
            ),
        }
    }
}
