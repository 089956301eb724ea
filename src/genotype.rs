//! Genotypes of individuals at a single position.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

pub mod table;

pub use table::Table;

/// The separator between the alleles of a phased genotype.
pub const PHASED_SEPARATOR: &str = "|";

/// The separator between the alleles of an unphased genotype.
pub const UNPHASED_SEPARATOR: &str = "/";

/// The value used for a missing allele.
pub const MISSING_ALLELE: &str = ".";

/// A diploid genotype such as `A|G` or `A/G`.
static REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^|/\s]+)([|/])([^|/\s]+)$").unwrap());

/// An error associated with parsing a [`Genotype`].
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The value is not a diploid genotype.
    Invalid(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Invalid(value) => write!(f, "invalid genotype: {value}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Which of the two haplotypes of an individual.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Haplotype {
    /// The first haplotype.
    First,

    /// The second haplotype.
    Second,
}

impl Haplotype {
    /// Both haplotypes, in order.
    pub const BOTH: [Haplotype; 2] = [Haplotype::First, Haplotype::Second];
}

impl std::fmt::Display for Haplotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Haplotype::First => write!(f, "hap1"),
            Haplotype::Second => write!(f, "hap2"),
        }
    }
}

/// The alleles carried on each haplotype of an individual at one position.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Genotype {
    /// The allele on the first haplotype.
    hap1: String,

    /// The allele on the second haplotype.
    hap2: String,

    /// Whether the alleles are assigned to haplotypes.
    phased: bool,
}

impl Genotype {
    /// Creates a new phased genotype.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::genotype::Genotype;
    ///
    /// let genotype = Genotype::phased("A", "G");
    /// assert_eq!(genotype.hap1(), "A");
    /// assert_eq!(genotype.hap2(), "G");
    /// assert!(genotype.is_phased());
    /// assert!(genotype.is_heterozygous());
    /// ```
    pub fn phased(hap1: impl Into<String>, hap2: impl Into<String>) -> Self {
        Self {
            hap1: hap1.into(),
            hap2: hap2.into(),
            phased: true,
        }
    }

    /// Creates a new unphased genotype.
    pub fn unphased(hap1: impl Into<String>, hap2: impl Into<String>) -> Self {
        Self {
            hap1: hap1.into(),
            hap2: hap2.into(),
            phased: false,
        }
    }

    /// Gets the allele on the first haplotype.
    pub fn hap1(&self) -> &str {
        &self.hap1
    }

    /// Gets the allele on the second haplotype.
    pub fn hap2(&self) -> &str {
        &self.hap2
    }

    /// Gets the allele on a haplotype.
    pub fn allele(&self, haplotype: Haplotype) -> &str {
        match haplotype {
            Haplotype::First => &self.hap1,
            Haplotype::Second => &self.hap2,
        }
    }

    /// Whether the alleles are assigned to haplotypes.
    pub fn is_phased(&self) -> bool {
        self.phased
    }

    /// Whether the two haplotypes carry different alleles.
    pub fn is_heterozygous(&self) -> bool {
        self.hap1 != self.hap2
    }
}

impl std::fmt::Display for Genotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let separator = match self.phased {
            true => PHASED_SEPARATOR,
            false => UNPHASED_SEPARATOR,
        };

        write!(f, "{}{}{}", self.hap1, separator, self.hap2)
    }
}

impl FromStr for Genotype {
    type Err = ParseError;

    /// Parses a genotype.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::genotype::Genotype;
    ///
    /// let genotype = "A|AT".parse::<Genotype>()?;
    /// assert_eq!(genotype, Genotype::phased("A", "AT"));
    ///
    /// let genotype = "C/T".parse::<Genotype>()?;
    /// assert!(!genotype.is_phased());
    ///
    /// assert!("A".parse::<Genotype>().is_err());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let groups = REGEX
            .captures(s.trim())
            .ok_or_else(|| ParseError::Invalid(s.into()))?;

        // SAFETY: each of these groups is required by the regex, so they will
        // always be present when the regex matches.
        let hap1 = groups.get(1).unwrap().as_str();
        let separator = groups.get(2).unwrap().as_str();
        let hap2 = groups.get(3).unwrap().as_str();

        Ok(match separator {
            PHASED_SEPARATOR => Genotype::phased(hap1, hap2),
            _ => Genotype::unphased(hap1, hap2),
        })
    }
}

/// Parses a genotype field, treating missing calls as [`None`].
///
/// A call is missing if the field is empty, is `.`, or has `.` for either
/// allele.
///
/// # Examples
///
/// ```
/// use excisionfinder::genotype;
/// use excisionfinder::genotype::Genotype;
///
/// assert_eq!(genotype::parse_call("T|C")?, Some(Genotype::phased("T", "C")));
/// assert_eq!(genotype::parse_call(".|.")?, None);
/// assert_eq!(genotype::parse_call(".")?, None);
/// assert_eq!(genotype::parse_call("")?, None);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse_call(value: &str) -> Result<Option<Genotype>, ParseError> {
    let value = value.trim();

    if value.is_empty() || value == MISSING_ALLELE {
        return Ok(None);
    }

    let genotype = value.parse::<Genotype>()?;

    if genotype.hap1 == MISSING_ALLELE || genotype.hap2 == MISSING_ALLELE {
        return Ok(None);
    }

    Ok(Some(genotype))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homozygous_genotype() -> Result<(), Box<dyn std::error::Error>> {
        let genotype = "G|G".parse::<Genotype>()?;
        assert!(!genotype.is_heterozygous());
        assert_eq!(genotype.allele(Haplotype::Second), "G");
        Ok(())
    }

    #[test]
    fn test_haplotype_names() {
        let genotype = Genotype::phased("A", "G");

        let alleles = Haplotype::BOTH
            .iter()
            .map(|haplotype| format!("{haplotype}={}", genotype.allele(*haplotype)))
            .collect::<Vec<_>>();

        assert_eq!(alleles, vec!["hap1=A", "hap2=G"]);
    }

    #[test]
    fn test_invalid_genotypes() {
        let err = "A|G|T".parse::<Genotype>().unwrap_err();
        assert_eq!(err.to_string(), "invalid genotype: A|G|T");

        assert!("A G".parse::<Genotype>().is_err());
        assert!(parse_call("0|").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Genotype::phased("A", "G").to_string(), "A|G");
        assert_eq!(Genotype::unphased("A", "G").to_string(), "A/G");
    }

    #[test]
    fn test_partially_missing_call() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(parse_call("A|.")?, None);
        Ok(())
    }
}
