use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error(
        "refusing a database-wide scan: supply at least one search term or one active annotation filter"
    )]
    UnconstrainedQuery,

    #[error("page numbers are 1-based, got: {0}")]
    InvalidPage(usize),

    #[error("page size must be at least 1")]
    InvalidPageSize,

    #[error("not a nucleotide base: {0}")]
    InvalidBase(String),

    #[error("not a codon: {0}")]
    InvalidCodon(String),

    #[error("codon position must be 1, 2 or 3, got: {0}")]
    InvalidCodonPosition(u8),

    #[error("not an amino acid code: {0}")]
    InvalidAminoAcid(String),

    #[error("malformed record at {path}:{line}: {reason}")]
    MalformedRecord {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("backbone relation is empty or missing: {0}")]
    MissingBackbone(String),

    #[error("store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
