use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::codon::RnaBase;
use crate::errors::QueryError;

///
/// A nucleotide base on the forward genomic strand.
///
/// The variant ordering (A < C < G < T) is the tie-break order used for
/// deterministic pagination.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Base {
    A,
    C,
    G,
    T,
}

impl Base {
    pub const ALL: [Base; 4] = [Base::A, Base::C, Base::G, Base::T];

    /// Watson-Crick complement (A↔T, G↔C).
    pub fn complement(self) -> Base {
        match self {
            Base::A => Base::T,
            Base::C => Base::G,
            Base::G => Base::C,
            Base::T => Base::A,
        }
    }

    /// The base as read on an RNA transcript (T→U).
    pub fn transcribe(self) -> RnaBase {
        match self {
            Base::A => RnaBase::A,
            Base::C => RnaBase::C,
            Base::G => RnaBase::G,
            Base::T => RnaBase::U,
        }
    }

    /// The three single-nucleotide substitutions possible at a position
    /// holding this reference base.
    pub fn alternates(self) -> impl Iterator<Item = Base> {
        Base::ALL.into_iter().filter(move |b| *b != self)
    }

    pub fn from_char(c: char) -> Result<Self, QueryError> {
        match c.to_ascii_uppercase() {
            'A' => Ok(Base::A),
            'C' => Ok(Base::C),
            'G' => Ok(Base::G),
            'T' => Ok(Base::T),
            other => Err(QueryError::InvalidBase(other.to_string())),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Base::A => 'A',
            Base::C => 'C',
            Base::G => 'G',
            Base::T => 'T',
        }
    }
}

impl FromStr for Base {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Base::from_char(c),
            _ => Err(QueryError::InvalidBase(s.to_string())),
        }
    }
}

impl Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}
