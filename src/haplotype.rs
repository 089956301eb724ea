//! Resolving which haplotype of an individual a nuclease can cut at a
//! heterozygous site.
//!
//! Resolution happens in two steps. First, the individual's genotype at a
//! position is matched against the targetability records at that position to
//! determine the allele [`Configuration`]: which haplotype carries the
//! reference allele and which record describes each alternate allele. This
//! step is independent of the nuclease and is captured by a [`Site`]. Second,
//! for a particular nuclease and [`Strictness`], the effects of each
//! alternate allele are mapped onto the two haplotypes ([`Site::resolve()`]).
//!
//! | Configuration | First haplotype | Second haplotype |
//! |---------------|-----------------|------------------|
//! | `RefAltHap1`  | reference       | alternate        |
//! | `RefAltHap2`  | alternate       | reference        |
//! | `AltAlt`      | alternate       | other alternate  |
//! | `Unresolved`  | ?               | ?                |
//!
//! Unresolved sites are never targetable.

use omics::coordinate::position::Number;

use crate::genotype::Genotype;
use crate::genotype::Haplotype;
use crate::nuclease::NucleaseId;
use crate::nuclease::Strictness;
use crate::variant;
use crate::variant::Record;

/// The allele configuration of a heterozygous individual at one position.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Configuration {
    /// The first haplotype carries the reference allele and the second
    /// carries an annotated alternate allele.
    RefAltHap1,

    /// The first haplotype carries an annotated alternate allele and the
    /// second carries the reference allele.
    RefAltHap2,

    /// Both haplotypes carry distinct alternate alleles, at least one of
    /// which is annotated.
    AltAlt,

    /// The alleles could not be matched against the annotations.
    Unresolved,
}

impl std::fmt::Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Configuration::RefAltHap1 => write!(f, "ref/alt (reference on haplotype 1)"),
            Configuration::RefAltHap2 => write!(f, "alt/ref (reference on haplotype 2)"),
            Configuration::AltAlt => write!(f, "alt/alt"),
            Configuration::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Whether each haplotype is targetable at a site for one nuclease.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Resolution {
    /// Whether the first haplotype is targetable.
    hap1: bool,

    /// Whether the second haplotype is targetable.
    hap2: bool,
}

impl Resolution {
    /// Creates a new resolution.
    pub fn new(hap1: bool, hap2: bool) -> Self {
        Self { hap1, hap2 }
    }

    /// Whether the first haplotype is targetable.
    pub fn hap1(&self) -> bool {
        self.hap1
    }

    /// Whether the second haplotype is targetable.
    pub fn hap2(&self) -> bool {
        self.hap2
    }

    /// Whether a particular haplotype is targetable.
    pub fn get(&self, haplotype: Haplotype) -> bool {
        match haplotype {
            Haplotype::First => self.hap1,
            Haplotype::Second => self.hap2,
        }
    }

    /// Whether either haplotype is targetable.
    pub fn any(&self) -> bool {
        self.hap1 || self.hap2
    }
}

/// A heterozygous genotype matched against the targetability records at its
/// position.
#[derive(Clone, Copy, Debug)]
pub struct Site<'a> {
    /// The allele configuration.
    configuration: Configuration,

    /// The record describing the alternate allele on the first haplotype.
    hap1: Option<&'a Record>,

    /// The record describing the alternate allele on the second haplotype.
    hap2: Option<&'a Record>,

    /// The number of alleles that matched neither a reference allele nor an
    /// annotated alternate allele.
    missing_alleles: usize,
}

impl<'a> Site<'a> {
    /// Classifies a genotype against the records at its position.
    ///
    /// An allele is the reference allele when it equals the reference of the
    /// record annotating the other haplotype's allele. An allele is an
    /// annotated alternate allele when some record at the position has it as
    /// its alternate allele. Homozygous genotypes are never resolved.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::genotype::Genotype;
    /// use excisionfinder::haplotype::Configuration;
    /// use excisionfinder::haplotype::Site;
    /// use excisionfinder::variant::Record;
    ///
    /// let records = vec![Record::new(100, "A", "G"), Record::new(100, "A", "T")];
    ///
    /// let site = Site::classify(&Genotype::phased("A", "G"), &records);
    /// assert_eq!(site.configuration(), Configuration::RefAltHap1);
    ///
    /// let site = Site::classify(&Genotype::phased("T", "A"), &records);
    /// assert_eq!(site.configuration(), Configuration::RefAltHap2);
    ///
    /// let site = Site::classify(&Genotype::phased("T", "G"), &records);
    /// assert_eq!(site.configuration(), Configuration::AltAlt);
    ///
    /// let site = Site::classify(&Genotype::phased("A", "C"), &records);
    /// assert_eq!(site.configuration(), Configuration::Unresolved);
    /// assert_eq!(site.missing_alleles(), 1);
    /// ```
    pub fn classify(genotype: &Genotype, records: &'a [Record]) -> Self {
        let find = |allele: &str| records.iter().find(|record| record.alternate() == allele);
        let is_reference =
            |allele: &str| records.iter().any(|record| record.reference() == allele);

        let hap1 = find(genotype.hap1());
        let hap2 = find(genotype.hap2());

        let missing_alleles = [genotype.hap1(), genotype.hap2()]
            .into_iter()
            .filter(|allele| find(*allele).is_none() && !is_reference(*allele))
            .count();

        let configuration = if !genotype.is_heterozygous() {
            Configuration::Unresolved
        } else if hap2.is_some_and(|record| record.reference() == genotype.hap1()) {
            Configuration::RefAltHap1
        } else if hap1.is_some_and(|record| record.reference() == genotype.hap2()) {
            Configuration::RefAltHap2
        } else if (hap1.is_some() || hap2.is_some())
            && !is_reference(genotype.hap1())
            && !is_reference(genotype.hap2())
        {
            Configuration::AltAlt
        } else {
            Configuration::Unresolved
        };

        Self {
            configuration,
            hap1,
            hap2,
            missing_alleles,
        }
    }

    /// Gets the allele configuration.
    pub fn configuration(&self) -> Configuration {
        self.configuration
    }

    /// Gets the number of alleles that matched neither a reference allele nor
    /// an annotated alternate allele.
    pub fn missing_alleles(&self) -> usize {
        self.missing_alleles
    }

    /// Resolves which haplotypes a nuclease can target at this site.
    ///
    /// For a single alternate allele, the effects of that allele decide which
    /// of the alternate-bearing and reference-bearing haplotypes are
    /// targetable (see [`variant::Effects::targets()`]). When both haplotypes
    /// carry alternate alleles, each allele's record is evaluated with its own
    /// haplotype in the alternate role and the results are combined: a
    /// haplotype is targetable if either record makes it so.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::genotype::Genotype;
    /// use excisionfinder::haplotype::Resolution;
    /// use excisionfinder::haplotype::Site;
    /// use excisionfinder::nuclease::NucleaseId;
    /// use excisionfinder::nuclease::Strictness;
    /// use excisionfinder::variant::Effects;
    /// use excisionfinder::variant::Record;
    ///
    /// let records = vec![
    ///     Record::new(100, "A", "G")
    ///         .with_effects(NucleaseId::SpCas9, Effects::new(true, false, false)),
    /// ];
    ///
    /// let site = Site::classify(&Genotype::phased("A", "G"), &records);
    /// assert_eq!(
    ///     site.resolve(NucleaseId::SpCas9, Strictness::Strict),
    ///     Resolution::new(false, true)
    /// );
    /// ```
    pub fn resolve(&self, nuclease: NucleaseId, strictness: Strictness) -> Resolution {
        let targets = |record: Option<&Record>| {
            record
                .map(|record| record.effects(nuclease).targets(strictness))
                .unwrap_or_default()
        };

        match self.configuration {
            Configuration::RefAltHap1 => {
                let targets = targets(self.hap2);
                Resolution::new(targets.reference(), targets.alternate())
            }
            Configuration::RefAltHap2 => {
                let targets = targets(self.hap1);
                Resolution::new(targets.alternate(), targets.reference())
            }
            Configuration::AltAlt => {
                let first = targets(self.hap1);
                let second = targets(self.hap2);

                Resolution::new(
                    first.alternate() || second.reference(),
                    first.reference() || second.alternate(),
                )
            }
            Configuration::Unresolved => Resolution::default(),
        }
    }
}

/// Resolves which haplotypes a nuclease can target for a genotype at a
/// position of a targetability table.
///
/// This is a shorthand for [`Site::classify()`] followed by
/// [`Site::resolve()`].
pub fn resolve(
    position: Number,
    genotype: &Genotype,
    table: &variant::Table,
    nuclease: NucleaseId,
    strictness: Strictness,
) -> Resolution {
    Site::classify(genotype, table.records_at(position)).resolve(nuclease, strictness)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::Effects;

    fn record(alternate: &str, effects: Effects) -> Record {
        Record::new(100, "A", alternate).with_effects(NucleaseId::SaCas9, effects)
    }

    #[test]
    fn test_breaks_targets_reference_haplotype() {
        let records = vec![record("G", Effects::new(false, true, false))];

        let hap2_alt = Site::classify(&Genotype::phased("A", "G"), &records);
        assert_eq!(
            hap2_alt.resolve(NucleaseId::SaCas9, Strictness::Strict),
            Resolution::new(true, false)
        );

        let hap1_alt = Site::classify(&Genotype::phased("G", "A"), &records);
        assert_eq!(
            hap1_alt.resolve(NucleaseId::SaCas9, Strictness::Strict),
            Resolution::new(false, true)
        );
    }

    #[test]
    fn test_makes_targets_alternate_haplotype() {
        let records = vec![record("G", Effects::new(true, false, false))];

        let site = Site::classify(&Genotype::phased("G", "A"), &records);
        assert_eq!(site.configuration(), Configuration::RefAltHap2);
        assert_eq!(
            site.resolve(NucleaseId::SaCas9, Strictness::Relaxed),
            Resolution::new(true, false)
        );
    }

    #[test]
    fn test_near_pam_depends_on_strictness() {
        let records = vec![record("G", Effects::new(false, false, true))];
        let site = Site::classify(&Genotype::phased("A", "G"), &records);

        assert_eq!(
            site.resolve(NucleaseId::SaCas9, Strictness::Strict),
            Resolution::new(false, false)
        );
        assert_eq!(
            site.resolve(NucleaseId::SaCas9, Strictness::Relaxed),
            Resolution::new(true, true)
        );
    }

    #[test]
    fn test_alt_alt_combines_both_records() {
        let records = vec![
            record("G", Effects::new(true, false, false)),
            record("T", Effects::new(true, false, false)),
        ];

        let site = Site::classify(&Genotype::phased("G", "T"), &records);
        assert_eq!(site.configuration(), Configuration::AltAlt);

        // The first record alone gives (true, false), the second alone gives
        // (false, true).
        assert_eq!(
            site.resolve(NucleaseId::SaCas9, Strictness::Strict),
            Resolution::new(true, true)
        );
    }

    #[test]
    fn test_alt_alt_with_breaking_allele() {
        let records = vec![
            record("G", Effects::new(false, true, false)),
            record("T", Effects::default()),
        ];

        let site = Site::classify(&Genotype::phased("G", "T"), &records);
        assert_eq!(
            site.resolve(NucleaseId::SaCas9, Strictness::Strict),
            Resolution::new(false, true)
        );
    }

    #[test]
    fn test_alt_alt_with_one_unannotated_allele() {
        let records = vec![record("G", Effects::new(true, false, false))];

        let site = Site::classify(&Genotype::phased("C", "G"), &records);
        assert_eq!(site.configuration(), Configuration::AltAlt);
        assert_eq!(site.missing_alleles(), 1);
        assert_eq!(
            site.resolve(NucleaseId::SaCas9, Strictness::Strict),
            Resolution::new(false, true)
        );
    }

    #[test]
    fn test_unresolved_sites_are_not_targetable() {
        let records = vec![record("G", Effects::new(true, true, true))];

        // The alternate allele has no record.
        let site = Site::classify(&Genotype::phased("A", "T"), &records);
        assert_eq!(site.configuration(), Configuration::Unresolved);
        assert!(!site.resolve(NucleaseId::SaCas9, Strictness::Relaxed).any());

        // There are no records at all.
        let site = Site::classify(&Genotype::phased("A", "G"), &[]);
        assert_eq!(site.configuration(), Configuration::Unresolved);
        assert_eq!(site.missing_alleles(), 2);
        assert!(!site.resolve(NucleaseId::SaCas9, Strictness::Relaxed).any());

        // Homozygous genotypes are never resolved.
        let site = Site::classify(&Genotype::phased("G", "G"), &records);
        assert_eq!(site.configuration(), Configuration::Unresolved);
    }

    #[test]
    fn test_resolve_from_table() {
        let table = variant::Table::from_records(vec![record("G", Effects::new(true, false, false))]);

        assert_eq!(
            resolve(
                100,
                &Genotype::phased("A", "G"),
                &table,
                NucleaseId::SaCas9,
                Strictness::Strict
            ),
            Resolution::new(false, true)
        );
        assert_eq!(
            resolve(
                100,
                &Genotype::phased("A", "G"),
                &table,
                NucleaseId::SpCas9,
                Strictness::Strict
            ),
            Resolution::new(false, false)
        );
    }
}
