//! Codon substitution: deriving the amino acid encoded once one base of a
//! codon is changed.
//!
//! Codons are read on the coding strand, so for mappings on the reverse
//! genomic strand the candidate alternate base must be complemented before
//! substitution. [`substitute`] is the single entry point used by the query
//! engine wherever a genomic alternate needs to be compared against a
//! protein-level score keyed by mutant amino acid.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::QueryError;
use crate::models::base::Base;

/// A nucleotide of the RNA alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RnaBase {
    A,
    C,
    G,
    U,
}

impl RnaBase {
    pub fn from_char(c: char) -> Result<Self, QueryError> {
        // DNA-spelled codons (with T) are accepted and read as RNA.
        match c.to_ascii_uppercase() {
            'A' => Ok(RnaBase::A),
            'C' => Ok(RnaBase::C),
            'G' => Ok(RnaBase::G),
            'U' | 'T' => Ok(RnaBase::U),
            other => Err(QueryError::InvalidBase(other.to_string())),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            RnaBase::A => 'A',
            RnaBase::C => 'C',
            RnaBase::G => 'G',
            RnaBase::U => 'U',
        }
    }
}

impl Display for RnaBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// A codon of three RNA bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Codon([RnaBase; 3]);

impl Codon {
    pub fn new(bases: [RnaBase; 3]) -> Self {
        Codon(bases)
    }

    pub fn bases(self) -> [RnaBase; 3] {
        self.0
    }

    /// Translate through the standard RNA codon table.
    pub fn translate(self) -> AminoAcid {
        use AminoAcid::*;
        use RnaBase::*;
        match (self.0[0], self.0[1], self.0[2]) {
            (U, U, U) | (U, U, C) => Phe,
            (U, U, A) | (U, U, G) => Leu,
            (C, U, _) => Leu,
            (A, U, U) | (A, U, C) | (A, U, A) => Ile,
            (A, U, G) => Met,
            (G, U, _) => Val,
            (U, C, _) => Ser,
            (C, C, _) => Pro,
            (A, C, _) => Thr,
            (G, C, _) => Ala,
            (U, A, U) | (U, A, C) => Tyr,
            (U, A, A) | (U, A, G) => Ter,
            (C, A, U) | (C, A, C) => His,
            (C, A, A) | (C, A, G) => Gln,
            (A, A, U) | (A, A, C) => Asn,
            (A, A, A) | (A, A, G) => Lys,
            (G, A, U) | (G, A, C) => Asp,
            (G, A, A) | (G, A, G) => Glu,
            (U, G, U) | (U, G, C) => Cys,
            (U, G, A) => Ter,
            (U, G, G) => Trp,
            (C, G, _) => Arg,
            (A, G, U) | (A, G, C) => Ser,
            (A, G, A) | (A, G, G) => Arg,
            (G, G, _) => Gly,
        }
    }
}

impl FromStr for Codon {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(a), Some(b), Some(c), None) =
            (chars.next(), chars.next(), chars.next(), chars.next())
        else {
            return Err(QueryError::InvalidCodon(s.to_string()));
        };
        Ok(Codon([
            RnaBase::from_char(a)?,
            RnaBase::from_char(b)?,
            RnaBase::from_char(c)?,
        ]))
    }
}

impl TryFrom<String> for Codon {
    type Error = QueryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Codon> for String {
    fn from(codon: Codon) -> String {
        codon.to_string()
    }
}

impl Display for Codon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.0[0], self.0[1], self.0[2])
    }
}

/// Position of a mapped genomic base within its codon (1, 2 or 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CodonPos(u8);

impl CodonPos {
    pub fn new(pos: u8) -> Result<Self, QueryError> {
        match pos {
            1..=3 => Ok(CodonPos(pos)),
            other => Err(QueryError::InvalidCodonPosition(other)),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl TryFrom<u8> for CodonPos {
    type Error = QueryError;

    fn try_from(pos: u8) -> Result<Self, Self::Error> {
        CodonPos::new(pos)
    }
}

impl From<CodonPos> for u8 {
    fn from(pos: CodonPos) -> u8 {
        pos.0
    }
}

impl Display for CodonPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The twenty standard residues plus the translation stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AminoAcid {
    Ala,
    Arg,
    Asn,
    Asp,
    Cys,
    Gln,
    Glu,
    Gly,
    His,
    Ile,
    Leu,
    Lys,
    Met,
    Phe,
    Pro,
    Ser,
    Thr,
    Trp,
    Tyr,
    Val,
    Ter,
}

impl AminoAcid {
    pub fn one_letter(self) -> char {
        match self {
            AminoAcid::Ala => 'A',
            AminoAcid::Arg => 'R',
            AminoAcid::Asn => 'N',
            AminoAcid::Asp => 'D',
            AminoAcid::Cys => 'C',
            AminoAcid::Gln => 'Q',
            AminoAcid::Glu => 'E',
            AminoAcid::Gly => 'G',
            AminoAcid::His => 'H',
            AminoAcid::Ile => 'I',
            AminoAcid::Leu => 'L',
            AminoAcid::Lys => 'K',
            AminoAcid::Met => 'M',
            AminoAcid::Phe => 'F',
            AminoAcid::Pro => 'P',
            AminoAcid::Ser => 'S',
            AminoAcid::Thr => 'T',
            AminoAcid::Trp => 'W',
            AminoAcid::Tyr => 'Y',
            AminoAcid::Val => 'V',
            AminoAcid::Ter => '*',
        }
    }

    pub fn three_letter(self) -> &'static str {
        match self {
            AminoAcid::Ala => "Ala",
            AminoAcid::Arg => "Arg",
            AminoAcid::Asn => "Asn",
            AminoAcid::Asp => "Asp",
            AminoAcid::Cys => "Cys",
            AminoAcid::Gln => "Gln",
            AminoAcid::Glu => "Glu",
            AminoAcid::Gly => "Gly",
            AminoAcid::His => "His",
            AminoAcid::Ile => "Ile",
            AminoAcid::Leu => "Leu",
            AminoAcid::Lys => "Lys",
            AminoAcid::Met => "Met",
            AminoAcid::Phe => "Phe",
            AminoAcid::Pro => "Pro",
            AminoAcid::Ser => "Ser",
            AminoAcid::Thr => "Thr",
            AminoAcid::Trp => "Trp",
            AminoAcid::Tyr => "Tyr",
            AminoAcid::Val => "Val",
            AminoAcid::Ter => "Ter",
        }
    }

    pub fn from_one_letter(c: char) -> Result<Self, QueryError> {
        match c.to_ascii_uppercase() {
            'A' => Ok(AminoAcid::Ala),
            'R' => Ok(AminoAcid::Arg),
            'N' => Ok(AminoAcid::Asn),
            'D' => Ok(AminoAcid::Asp),
            'C' => Ok(AminoAcid::Cys),
            'Q' => Ok(AminoAcid::Gln),
            'E' => Ok(AminoAcid::Glu),
            'G' => Ok(AminoAcid::Gly),
            'H' => Ok(AminoAcid::His),
            'I' => Ok(AminoAcid::Ile),
            'L' => Ok(AminoAcid::Leu),
            'K' => Ok(AminoAcid::Lys),
            'M' => Ok(AminoAcid::Met),
            'F' => Ok(AminoAcid::Phe),
            'P' => Ok(AminoAcid::Pro),
            'S' => Ok(AminoAcid::Ser),
            'T' => Ok(AminoAcid::Thr),
            'W' => Ok(AminoAcid::Trp),
            'Y' => Ok(AminoAcid::Tyr),
            'V' => Ok(AminoAcid::Val),
            '*' => Ok(AminoAcid::Ter),
            other => Err(QueryError::InvalidAminoAcid(other.to_string())),
        }
    }
}

impl FromStr for AminoAcid {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => AminoAcid::from_one_letter(c),
            _ => Err(QueryError::InvalidAminoAcid(s.to_string())),
        }
    }
}

impl Display for AminoAcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.one_letter())
    }
}

/// Resolve the mutant amino acid produced by a single-nucleotide
/// substitution within a reference codon.
///
/// `alternate` is the candidate base as written on the forward genomic
/// strand. For reverse-strand mappings it is complemented first, because the
/// reference codon follows the coding strand.
pub fn substitute(
    reference_codon: Codon,
    codon_position: CodonPos,
    alternate: Base,
    reverse_strand: bool,
) -> AminoAcid {
    let coding = if reverse_strand {
        alternate.complement()
    } else {
        alternate
    };
    let mut bases = reference_codon.bases();
    bases[codon_position.index()] = coding.transcribe();
    Codon::new(bases).translate()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn codon(s: &str) -> Codon {
        s.parse().unwrap()
    }

    fn pos(p: u8) -> CodonPos {
        CodonPos::new(p).unwrap()
    }

    #[rstest]
    #[case("AUG", AminoAcid::Met)]
    #[case("UGG", AminoAcid::Trp)]
    #[case("UAA", AminoAcid::Ter)]
    #[case("UAG", AminoAcid::Ter)]
    #[case("UGA", AminoAcid::Ter)]
    #[case("GCU", AminoAcid::Ala)]
    #[case("CGA", AminoAcid::Arg)]
    #[case("AGA", AminoAcid::Arg)]
    #[case("UCG", AminoAcid::Ser)]
    #[case("AGC", AminoAcid::Ser)]
    #[case("AUA", AminoAcid::Ile)]
    fn test_translate(#[case] input: &str, #[case] expected: AminoAcid) {
        assert_eq!(codon(input).translate(), expected);
    }

    #[test]
    fn test_codon_accepts_dna_spelling() {
        assert_eq!(codon("ATG"), codon("AUG"));
        assert_eq!(codon("atg").translate(), AminoAcid::Met);
    }

    #[rstest]
    #[case("")]
    #[case("AU")]
    #[case("AUGC")]
    #[case("AXG")]
    fn test_codon_rejects_bad_strings(#[case] input: &str) {
        assert!(input.parse::<Codon>().is_err());
    }

    #[test]
    fn test_forward_substitution() {
        // AUG with G>A at position 3 reads AUA = Ile
        let aa = substitute(codon("AUG"), pos(3), Base::A, false);
        assert_eq!(aa, AminoAcid::Ile);
    }

    #[test]
    fn test_reverse_strand_complements_before_lookup() {
        // Candidate C complements to G; AUG position 1 becomes GUG = Val
        let aa = substitute(codon("AUG"), pos(1), Base::C, true);
        assert_eq!(aa, AminoAcid::Val);
    }

    #[test]
    fn test_substitution_can_introduce_stop() {
        // UAC (Tyr) with C>A at position 3 reads UAA = stop
        let aa = substitute(codon("UAC"), pos(3), Base::A, false);
        assert_eq!(aa, AminoAcid::Ter);
    }

    #[test]
    fn test_codon_pos_bounds() {
        assert!(CodonPos::new(0).is_err());
        assert!(CodonPos::new(4).is_err());
        assert_eq!(CodonPos::new(2).unwrap().get(), 2);
    }

    #[test]
    fn test_amino_acid_codes() {
        assert_eq!(AminoAcid::Val.one_letter(), 'V');
        assert_eq!(AminoAcid::Val.three_letter(), "Val");
        assert_eq!("V".parse::<AminoAcid>().unwrap(), AminoAcid::Val);
        assert_eq!("*".parse::<AminoAcid>().unwrap(), AminoAcid::Ter);
    }
}
