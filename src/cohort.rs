//! Per-individual targetability across a cohort.
//!
//! An individual is targetable by a nuclease in one of two ways, depending on
//! the [`Mode`]:
//!
//! * [`Mode::Pair`]: two heterozygous sites on the _same_ haplotype are both
//!   cuttable on that haplotype and together form a targetable pair (see
//!   [`crate::pair`]). Cutting at both sites excises coding sequence from one
//!   allele while leaving the other intact.
//! * [`Mode::SingleCut`]: a single heterozygous site within a coding exon is
//!   cuttable on either haplotype.
//!
//! Individuals carrying fewer heterozygous sites than required are set aside
//! before any evaluation and reported separately.

use omics::coordinate::position::Number;
use rayon::prelude::*;
use tracing::trace;

use crate::gene::Structure;
use crate::genotype;
use crate::genotype::Genotype;
use crate::genotype::Haplotype;
use crate::haplotype::Configuration;
use crate::haplotype::Resolution;
use crate::haplotype::Site;
use crate::nuclease::NucleaseId;
use crate::nuclease::Strictness;
use crate::pair::Pairs;
use crate::variant;

/// How an individual is considered targetable.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Mode {
    /// Two cuts on the same haplotype that together excise coding sequence.
    #[default]
    Pair,

    /// One cut within a coding exon.
    SingleCut,
}

impl Mode {
    /// The default minimum number of heterozygous sites an individual needs
    /// to be evaluated in this mode.
    pub fn default_min_het_count(&self) -> usize {
        match self {
            Mode::Pair => 2,
            Mode::SingleCut => 1,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Pair => write!(f, "pair"),
            Mode::SingleCut => write!(f, "single-cut"),
        }
    }
}

/// Counts of genotype calls that could not contribute to targetability.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Audit {
    /// Heterozygous calls whose alleles could not be matched against the
    /// targetability records.
    pub unresolved: usize,

    /// Alleles that matched neither a reference allele nor an annotated
    /// alternate allele.
    pub missing_alleles: usize,

    /// Unphased heterozygous calls skipped because a haplotype could not be
    /// assigned.
    pub unphased: usize,
}

impl Audit {
    /// Whether nothing was counted.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

impl std::ops::Add for Audit {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            unresolved: self.unresolved + rhs.unresolved,
            missing_alleles: self.missing_alleles + rhs.missing_alleles,
            unphased: self.unphased + rhs.unphased,
        }
    }
}

impl std::iter::Sum for Audit {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |a, b| a + b)
    }
}

/// An individual carrying enough heterozygous sites to be evaluated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sample {
    /// The column index of the individual in the genotype table.
    index: usize,

    /// The name of the individual.
    name: String,

    /// The heterozygous positions, sorted ascending.
    heterozygous: Vec<Number>,
}

impl Sample {
    /// Gets the column index of the individual in the genotype table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Gets the name of the individual.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the heterozygous positions, sorted ascending.
    pub fn heterozygous(&self) -> &[Number] {
        &self.heterozygous
    }
}

/// Splits the individuals of a genotype table into those with at least
/// `min_het_count` heterozygous sites and the names of those without.
///
/// # Examples
///
/// ```
/// use excisionfinder::cohort;
/// use excisionfinder::genotype::Genotype;
/// use excisionfinder::genotype::Table;
///
/// let table = Table::from_rows(
///     vec![String::from("HG00096"), String::from("HG00097")],
///     vec![
///         (100, vec![Some(Genotype::phased("A", "G")), Some(Genotype::phased("A", "G"))]),
///         (200, vec![Some(Genotype::phased("C", "T")), Some(Genotype::phased("C", "C"))]),
///     ],
/// );
///
/// let (eligible, insufficient) = cohort::partition(&table, 2);
/// assert_eq!(eligible.len(), 1);
/// assert_eq!(eligible[0].name(), "HG00096");
/// assert_eq!(eligible[0].heterozygous(), &[100, 200]);
/// assert_eq!(insufficient, vec![String::from("HG00097")]);
/// ```
pub fn partition(genotypes: &genotype::Table, min_het_count: usize) -> (Vec<Sample>, Vec<String>) {
    let mut eligible = Vec::new();
    let mut insufficient = Vec::new();

    for (index, name) in genotypes.samples().iter().enumerate() {
        let heterozygous = genotypes.heterozygous_positions(index);

        if heterozygous.len() >= min_het_count {
            eligible.push(Sample {
                index,
                name: name.clone(),
                heterozygous,
            });
        } else {
            insufficient.push(name.clone());
        }
    }

    (eligible, insufficient)
}

/// Whether an individual is targetable by each nuclease.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// The name of the individual.
    sample: String,

    /// Whether each nuclease can target the individual, in the order the
    /// nucleases were requested.
    targetable: Vec<(NucleaseId, bool)>,
}

impl Record {
    /// Gets the name of the individual.
    pub fn sample(&self) -> &str {
        &self.sample
    }

    /// Gets whether a nuclease can target the individual.
    ///
    /// Returns [`None`] when the nuclease was not evaluated.
    pub fn get(&self, nuclease: NucleaseId) -> Option<bool> {
        self.targetable
            .iter()
            .find(|(id, _)| *id == nuclease)
            .map(|(_, targetable)| *targetable)
    }

    /// Returns an iterator over each evaluated nuclease and whether it can
    /// target the individual.
    pub fn iter(&self) -> impl Iterator<Item = (NucleaseId, bool)> + '_ {
        self.targetable.iter().copied()
    }

    /// Whether any nuclease can target the individual.
    pub fn any(&self) -> bool {
        self.targetable.iter().any(|(_, targetable)| *targetable)
    }
}

/// Which haplotypes of an individual each nuclease can cut at one
/// heterozygous site.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Call {
    /// The name of the individual.
    sample: String,

    /// The position of the site.
    position: Number,

    /// The genotype of the individual at the site.
    genotype: Genotype,

    /// The resolution for each nuclease, in the order the nucleases were
    /// requested.
    resolutions: Vec<(NucleaseId, Resolution)>,
}

impl Call {
    /// Gets the name of the individual.
    pub fn sample(&self) -> &str {
        &self.sample
    }

    /// Gets the position of the site.
    pub fn position(&self) -> Number {
        self.position
    }

    /// Gets the genotype of the individual at the site.
    pub fn genotype(&self) -> &Genotype {
        &self.genotype
    }

    /// Gets which haplotypes a nuclease can cut at the site.
    ///
    /// Returns [`None`] when the nuclease was not evaluated.
    pub fn get(&self, nuclease: NucleaseId) -> Option<Resolution> {
        self.resolutions
            .iter()
            .find(|(id, _)| *id == nuclease)
            .map(|(_, resolution)| *resolution)
    }

    /// Whether a nuclease can cut a particular haplotype at the site.
    pub fn cuts(&self, nuclease: NucleaseId, haplotype: Haplotype) -> bool {
        self.get(nuclease)
            .is_some_and(|resolution| resolution.get(haplotype))
    }

    /// Returns an iterator over each evaluated nuclease and its resolution.
    pub fn iter(&self) -> impl Iterator<Item = (NucleaseId, Resolution)> + '_ {
        self.resolutions.iter().copied()
    }
}

/// The records of every evaluated individual along with the calls behind
/// them and an audit of what could not be evaluated.
#[derive(Clone, Debug, Default)]
pub struct Aggregation {
    /// The records, in the order of the evaluated individuals.
    records: Vec<Record>,

    /// The calls at every evaluated site, grouped by individual and sorted
    /// by position within each individual.
    calls: Vec<Call>,

    /// The combined audit of every individual.
    audit: Audit,
}

impl Aggregation {
    /// Gets the records, in the order of the evaluated individuals.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Gets the calls at every evaluated site.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Gets the combined audit of every individual.
    pub fn audit(&self) -> Audit {
        self.audit
    }

    /// Consumes `self` and returns the records, calls, and audit.
    pub fn into_parts(self) -> (Vec<Record>, Vec<Call>, Audit) {
        (self.records, self.calls, self.audit)
    }
}

impl FromIterator<(Record, Vec<Call>, Audit)> for Aggregation {
    fn from_iter<I: IntoIterator<Item = (Record, Vec<Call>, Audit)>>(iter: I) -> Self {
        let mut records = Vec::new();
        let mut calls = Vec::new();
        let mut audits = Vec::new();

        for (record, sample_calls, audit) in iter {
            records.push(record);
            calls.extend(sample_calls);
            audits.push(audit);
        }

        Self {
            records,
            calls,
            audit: audits.into_iter().sum(),
        }
    }
}

/// Evaluates individuals of a cohort against one gene.
#[derive(Clone, Copy, Debug)]
pub struct Aggregator<'a> {
    /// The gene structure.
    structure: &'a Structure,

    /// The targetability records within the gene's region.
    variants: &'a variant::Table,

    /// The genotypes within the gene's region.
    genotypes: &'a genotype::Table,

    /// The nucleases to evaluate, in output order.
    nucleases: &'a [NucleaseId],

    /// Which effects participate in targetability.
    strictness: Strictness,
}

impl<'a> Aggregator<'a> {
    /// Creates a new aggregator.
    pub fn new(
        structure: &'a Structure,
        variants: &'a variant::Table,
        genotypes: &'a genotype::Table,
        nucleases: &'a [NucleaseId],
        strictness: Strictness,
    ) -> Self {
        Self {
            structure,
            variants,
            genotypes,
            nucleases,
            strictness,
        }
    }

    /// Evaluates each individual for a pair of same-haplotype cuts.
    ///
    /// Only heterozygous sites participating in at least one of `pairs` are
    /// considered. Unphased calls at those sites are skipped. Individuals are
    /// evaluated in parallel, but the records keep the order of `samples`.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::cohort;
    /// use excisionfinder::cohort::Aggregator;
    /// use excisionfinder::gene::Exon;
    /// use excisionfinder::gene::Structure;
    /// use excisionfinder::genotype;
    /// use excisionfinder::genotype::Genotype;
    /// use excisionfinder::nuclease::NucleaseId;
    /// use excisionfinder::nuclease::Strictness;
    /// use excisionfinder::pair::Pairs;
    /// use excisionfinder::variant;
    /// use excisionfinder::variant::Effects;
    /// use excisionfinder::variant::Record;
    ///
    /// let structure = Structure::try_new("chr1", 100, 150, vec![Exon::try_new(100, 150)?])?;
    ///
    /// let makes = Effects::new(true, false, false);
    /// let variants = variant::Table::from_records(vec![
    ///     Record::new(80, "A", "G").with_effects(NucleaseId::SpCas9, makes),
    ///     Record::new(200, "C", "T").with_effects(NucleaseId::SpCas9, makes),
    /// ]);
    ///
    /// let genotypes = genotype::Table::from_rows(
    ///     vec![String::from("cis"), String::from("trans")],
    ///     vec![
    ///         (80, vec![Some(Genotype::phased("A", "G")), Some(Genotype::phased("A", "G"))]),
    ///         (200, vec![Some(Genotype::phased("C", "T")), Some(Genotype::phased("T", "C"))]),
    ///     ],
    /// );
    ///
    /// let pairs = Pairs::generate([80, 200], 10_000, &structure);
    /// let (samples, _) = cohort::partition(&genotypes, 2);
    ///
    /// let nucleases = [NucleaseId::SpCas9];
    /// let aggregation = Aggregator::new(&structure, &variants, &genotypes, &nucleases, Strictness::Strict)
    ///     .pairs(&samples, &pairs, 10_000);
    ///
    /// let records = aggregation.records();
    /// assert_eq!(records[0].get(NucleaseId::SpCas9), Some(true));
    /// assert_eq!(records[1].get(NucleaseId::SpCas9), Some(false));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn pairs(&self, samples: &[Sample], pairs: &Pairs, window: Number) -> Aggregation {
        samples
            .par_iter()
            .map(|sample| self.evaluate_pairs(sample, pairs, window))
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    }

    /// Evaluates each individual for a single cut within a coding exon.
    ///
    /// Only heterozygous sites within coding exons are considered. The phase
    /// of a call does not matter since either haplotype suffices. Individuals
    /// are evaluated in parallel, but the records keep the order of
    /// `samples`.
    pub fn single_cut(&self, samples: &[Sample]) -> Aggregation {
        samples
            .par_iter()
            .map(|sample| self.evaluate_single_cut(sample))
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    }

    /// Classifies an individual's genotype at each of the given positions,
    /// tallying any that cannot be resolved.
    fn classify<'b>(
        &'b self,
        sample: &Sample,
        positions: impl Iterator<Item = Number>,
        require_phase: bool,
        audit: &mut Audit,
    ) -> Vec<(Number, &'b Genotype, Site<'b>)> {
        let mut sites = Vec::new();

        for position in positions {
            let genotype = match self.genotypes.get(position, sample.index) {
                Some(genotype) => genotype,
                None => continue,
            };

            if require_phase && !genotype.is_phased() {
                trace!(
                    "{}: skipping unphased call {} at {}",
                    sample.name,
                    genotype,
                    position
                );
                audit.unphased += 1;
                continue;
            }

            let site = Site::classify(genotype, self.variants.records_at(position));
            audit.missing_alleles += site.missing_alleles();

            if site.configuration() == Configuration::Unresolved {
                trace!(
                    "{}: unresolved call {} at {}",
                    sample.name,
                    genotype,
                    position
                );
                audit.unresolved += 1;
            }

            sites.push((position, genotype, site));
        }

        sites
    }

    /// Resolves each classified site of an individual for every nuclease.
    fn calls(&self, sample: &Sample, sites: Vec<(Number, &Genotype, Site<'_>)>) -> Vec<Call> {
        sites
            .into_iter()
            .map(|(position, genotype, site)| Call {
                sample: sample.name.clone(),
                position,
                genotype: genotype.clone(),
                resolutions: self
                    .nucleases
                    .iter()
                    .map(|nuclease| (*nuclease, site.resolve(*nuclease, self.strictness)))
                    .collect(),
            })
            .collect()
    }

    /// Evaluates one individual for a pair of same-haplotype cuts.
    fn evaluate_pairs(
        &self,
        sample: &Sample,
        pairs: &Pairs,
        window: Number,
    ) -> (Record, Vec<Call>, Audit) {
        let mut audit = Audit::default();

        let positions = sample
            .heterozygous
            .iter()
            .copied()
            .filter(|position| pairs.positions().binary_search(position).is_ok());

        let sites = self.classify(sample, positions, true, &mut audit);
        let calls = self.calls(sample, sites);

        let targetable = self
            .nucleases
            .iter()
            .map(|nuclease| {
                let targetable = Haplotype::BOTH.iter().any(|haplotype| {
                    let cuttable = calls
                        .iter()
                        .filter(|call| call.cuts(*nuclease, *haplotype))
                        .map(Call::position)
                        .collect::<Vec<_>>();

                    pairs.any_within(&cuttable, window)
                });

                (*nuclease, targetable)
            })
            .collect();

        let record = Record {
            sample: sample.name.clone(),
            targetable,
        };

        (record, calls, audit)
    }

    /// Evaluates one individual for a single cut within a coding exon.
    fn evaluate_single_cut(&self, sample: &Sample) -> (Record, Vec<Call>, Audit) {
        let mut audit = Audit::default();

        let positions = sample
            .heterozygous
            .iter()
            .copied()
            .filter(|position| self.structure.is_coding(*position));

        let sites = self.classify(sample, positions, false, &mut audit);
        let calls = self.calls(sample, sites);

        let targetable = self
            .nucleases
            .iter()
            .map(|nuclease| {
                let targetable = calls
                    .iter()
                    .any(|call| call.get(*nuclease).is_some_and(|resolution| resolution.any()));

                (*nuclease, targetable)
            })
            .collect();

        let record = Record {
            sample: sample.name.clone(),
            targetable,
        };

        (record, calls, audit)
    }
}
