//! Core library for varmap: genomic variant to protein consequence mapping.
//!
//! This crate holds the data models shared across the varmap workspace
//! (nucleotide bases, codons, backbone mapping records, result variants,
//! request/response value types) plus the codon substitution resolver that
//! bridges genomic-level alternate bases and protein-level scores.
//!
//! Query planning and execution live in `varmap-query`; this crate has no
//! opinion on storage or retrieval.

pub mod codon;
pub mod errors;
pub mod models;

// re-exports
pub use self::codon::{AminoAcid, Codon, CodonPos, RnaBase, substitute};
pub use self::errors::QueryError;
