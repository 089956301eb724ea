//! Nuclease varieties, the effects a variant can have on their recognition
//! sites, and how strictly those effects are interpreted.

use std::str::FromStr;

pub mod columns;

pub use columns::Columns;

/// An error associated with parsing a nuclease identifier.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The identifier does not name a known nuclease.
    UnknownNuclease(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::UnknownNuclease(value) => write!(f, "unknown nuclease: {value}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// A Cas-family enzyme and recognition sequence combination.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum NucleaseId {
    /// Cpf1 (Cas12a), `TTTV` PAM.
    Cpf1,
    /// SpCas9, `NGG` PAM.
    SpCas9,
    /// SpCas9 VRER variant, `NGCG` PAM.
    SpCas9Vrer,
    /// SpCas9 EQR variant, `NGAG` PAM.
    SpCas9Eqr,
    /// SpCas9 VQR variant, `NGAN` PAM.
    SpCas9Vqr1,
    /// SpCas9 VQR variant, `NGNG` PAM.
    SpCas9Vqr2,
    /// StCas9, `NNAGAAW` PAM.
    StCas9,
    /// StCas9, `NNGGGNG` PAM.
    StCas92,
    /// SaCas9, `NNGRRT` PAM.
    SaCas9,
    /// SaCas9 KKH variant, `NNNRRT` PAM.
    SaCas9Kkh,
    /// NmCas9, `NNNNGATT` PAM.
    NmCas9,
    /// CjCas9, `NNNNRYAC` PAM.
    CjCas9,
}

impl NucleaseId {
    /// Every known nuclease, in a stable order.
    pub const ALL: [NucleaseId; 12] = [
        NucleaseId::Cpf1,
        NucleaseId::SpCas9,
        NucleaseId::SpCas9Vrer,
        NucleaseId::SpCas9Eqr,
        NucleaseId::SpCas9Vqr1,
        NucleaseId::SpCas9Vqr2,
        NucleaseId::StCas9,
        NucleaseId::StCas92,
        NucleaseId::SaCas9,
        NucleaseId::SaCas9Kkh,
        NucleaseId::NmCas9,
        NucleaseId::CjCas9,
    ];

    /// Gets the conventional name of the nuclease.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::nuclease::NucleaseId;
    ///
    /// assert_eq!(NucleaseId::SaCas9Kkh.name(), "SaCas9_KKH");
    /// ```
    pub fn name(&self) -> &'static str {
        match self {
            NucleaseId::Cpf1 => "cpf1",
            NucleaseId::SpCas9 => "SpCas9",
            NucleaseId::SpCas9Vrer => "SpCas9_VRER",
            NucleaseId::SpCas9Eqr => "SpCas9_EQR",
            NucleaseId::SpCas9Vqr1 => "SpCas9_VQR_1",
            NucleaseId::SpCas9Vqr2 => "SpCas9_VQR_2",
            NucleaseId::StCas9 => "StCas9",
            NucleaseId::StCas92 => "StCas9_2",
            NucleaseId::SaCas9 => "SaCas9",
            NucleaseId::SaCas9Kkh => "SaCas9_KKH",
            NucleaseId::NmCas9 => "nmCas9",
            NucleaseId::CjCas9 => "cjCas9",
        }
    }
}

impl std::fmt::Display for NucleaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for NucleaseId {
    type Err = ParseError;

    /// Parses a nuclease from its conventional name.
    ///
    /// Matching is case-insensitive, so `spcas9` and `SpCas9` are equivalent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NucleaseId::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::UnknownNuclease(s.into()))
    }
}

/// An effect a variant can have on a nuclease recognition site.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Effect {
    /// The alternate allele creates a recognition site.
    Makes,

    /// The alternate allele destroys a recognition site present on the
    /// reference allele.
    Breaks,

    /// The variant lies near, but does not alter, a recognition site.
    NearPam,
}

impl Effect {
    /// Every effect, in a stable order.
    pub const ALL: [Effect; 3] = [Effect::Makes, Effect::Breaks, Effect::NearPam];
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::Makes => write!(f, "makes"),
            Effect::Breaks => write!(f, "breaks"),
            Effect::NearPam => write!(f, "near PAM"),
        }
    }
}

/// Which effects participate in deciding targetability.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Strictness {
    /// Only variants that create or destroy a recognition site count.
    Strict,

    /// Variants near a recognition site count as well.
    #[default]
    Relaxed,
}

impl Strictness {
    /// Whether the given effect participates at this strictness.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::nuclease::Effect;
    /// use excisionfinder::nuclease::Strictness;
    ///
    /// assert!(Strictness::Relaxed.includes(Effect::NearPam));
    /// assert!(!Strictness::Strict.includes(Effect::NearPam));
    /// assert!(Strictness::Strict.includes(Effect::Breaks));
    /// ```
    pub fn includes(&self, effect: Effect) -> bool {
        !matches!((self, effect), (Strictness::Strict, Effect::NearPam))
    }
}

impl std::fmt::Display for Strictness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strictness::Strict => write!(f, "strict"),
            Strictness::Relaxed => write!(f, "relaxed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_parsing() -> Result<(), Box<dyn std::error::Error>> {
        for id in NucleaseId::ALL {
            assert_eq!(id.name().parse::<NucleaseId>()?, id);
        }

        assert_eq!("spcas9_vqr_1".parse::<NucleaseId>()?, NucleaseId::SpCas9Vqr1);
        Ok(())
    }

    #[test]
    fn test_unknown_nuclease() {
        let err = "Cas13".parse::<NucleaseId>().unwrap_err();
        assert_eq!(err.to_string(), "unknown nuclease: Cas13");
    }
}
