//! Analyzing a gene across a cohort.
//!
//! [`analyze_gene()`] is the entry point for a single gene whose structure
//! and input tables are already in hand. [`analyze_transcript()`] starts one
//! step earlier from an annotation record, building the gene structure and
//! selecting the variants within the transcript's region.
//!
//! Each analysis either produces a record per evaluated individual or ends
//! early with a [`Dropout`]. Dropouts are expected outcomes for genes that
//! cannot be analyzed and never interrupt the analysis of other genes.

use nonempty::NonEmpty;
use omics::coordinate::position::Number;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::cohort;
use crate::cohort::Aggregator;
use crate::cohort::Audit;
use crate::cohort::Mode;
use crate::gene;
use crate::gene::annotation;
use crate::gene::Structure;
use crate::genotype;
use crate::nuclease::NucleaseId;
use crate::nuclease::Strictness;
use crate::pair::Pairs;
use crate::variant;

/// The default maximum distance between the two cuts of a pair.
pub const DEFAULT_WINDOW: Number = 10_000;

/// An error related to a [`Config`].
#[derive(Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// The window must be greater than zero.
    InvalidWindow(Number),

    /// The minimum number of heterozygous sites must be at least one.
    InvalidMinimumHeterozygousCount(usize),

    /// No nucleases were requested.
    NoNucleases,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidWindow(window) => {
                write!(f, "invalid window: {window} (must be greater than zero)")
            }
            ConfigError::InvalidMinimumHeterozygousCount(count) => write!(
                f,
                "invalid minimum heterozygous count: {count} (must be at least one)"
            ),
            ConfigError::NoNucleases => write!(f, "no nucleases requested"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A [`Result`](std::result::Result) with a [`ConfigError`].
type Result<T> = std::result::Result<T, ConfigError>;

/// The settings shared by the analysis of every gene.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// The nucleases to evaluate, in output order and without duplicates.
    nucleases: NonEmpty<NucleaseId>,

    /// Which effects participate in targetability.
    strictness: Strictness,

    /// How individuals are considered targetable.
    mode: Mode,

    /// The minimum number of heterozygous sites an individual needs, if set
    /// explicitly.
    min_het_count: Option<usize>,

    /// The maximum distance between the two cuts of a pair.
    window: Number,

    /// The distance added on either side of a transcript when selecting its
    /// variants.
    padding: Number,
}

impl Config {
    /// Creates a new configuration for the given nucleases.
    ///
    /// Duplicate nucleases are removed, keeping the first occurrence.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::analysis::Config;
    /// use excisionfinder::cohort::Mode;
    /// use excisionfinder::nuclease::NucleaseId;
    /// use excisionfinder::nuclease::Strictness;
    ///
    /// let config = Config::try_new([NucleaseId::SaCas9, NucleaseId::SpCas9, NucleaseId::SaCas9])?
    ///     .with_strictness(Strictness::Strict)
    ///     .with_window(5_000)?;
    ///
    /// assert_eq!(config.nucleases().len(), 2);
    /// assert_eq!(config.nucleases().first(), &NucleaseId::SaCas9);
    /// assert_eq!(config.mode(), Mode::Pair);
    /// assert_eq!(config.min_het_count(), 2);
    /// assert_eq!(config.window(), 5_000);
    ///
    /// let config = config.with_mode(Mode::SingleCut);
    /// assert_eq!(config.min_het_count(), 1);
    ///
    /// assert!(Config::try_new(Vec::<NucleaseId>::new()).is_err());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(nucleases: impl IntoIterator<Item = NucleaseId>) -> Result<Self> {
        let mut unique = Vec::new();

        for nuclease in nucleases {
            if !unique.contains(&nuclease) {
                unique.push(nuclease);
            }
        }

        let nucleases = NonEmpty::from_vec(unique).ok_or(ConfigError::NoNucleases)?;

        Ok(Self {
            nucleases,
            strictness: Strictness::default(),
            mode: Mode::default(),
            min_het_count: None,
            window: DEFAULT_WINDOW,
            padding: 0,
        })
    }

    /// Sets which effects participate in targetability.
    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Sets how individuals are considered targetable.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the minimum number of heterozygous sites an individual needs.
    pub fn with_min_het_count(mut self, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(ConfigError::InvalidMinimumHeterozygousCount(count));
        }

        self.min_het_count = Some(count);
        Ok(self)
    }

    /// Sets the maximum distance between the two cuts of a pair.
    pub fn with_window(mut self, window: Number) -> Result<Self> {
        if window == 0 {
            return Err(ConfigError::InvalidWindow(window));
        }

        self.window = window;
        Ok(self)
    }

    /// Sets the distance added on either side of a transcript when selecting
    /// its variants.
    pub fn with_padding(mut self, padding: Number) -> Self {
        self.padding = padding;
        self
    }

    /// Gets the nucleases to evaluate, in output order.
    pub fn nucleases(&self) -> &NonEmpty<NucleaseId> {
        &self.nucleases
    }

    /// Gets which effects participate in targetability.
    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// Gets how individuals are considered targetable.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Gets the minimum number of heterozygous sites an individual needs.
    ///
    /// Unless set explicitly, this is the default for the mode (see
    /// [`Mode::default_min_het_count()`]).
    pub fn min_het_count(&self) -> usize {
        self.min_het_count
            .unwrap_or_else(|| self.mode.default_min_het_count())
    }

    /// Gets the maximum distance between the two cuts of a pair.
    pub fn window(&self) -> Number {
        self.window
    }

    /// Gets the distance added on either side of a transcript when selecting
    /// its variants.
    pub fn padding(&self) -> Number {
        self.padding
    }
}

/// Why a gene was not analyzed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Dropout {
    /// No transcript is annotated for the gene.
    NoTranscript,

    /// The canonical transcript has no coding exons.
    NoCodingExons,

    /// No targetability records fall within the gene's region.
    NoAnnotatedVariants,

    /// No individual carries enough heterozygous sites.
    InsufficientHeterozygousSamples,

    /// No pair of heterozygous sites excises coding sequence.
    NoTargetablePairs,
}

impl std::fmt::Display for Dropout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dropout::NoTranscript => write!(f, "no transcript"),
            Dropout::NoCodingExons => write!(f, "no coding exons"),
            Dropout::NoAnnotatedVariants => write!(f, "no annotated variants"),
            Dropout::InsufficientHeterozygousSamples => {
                write!(f, "insufficient heterozygous samples")
            }
            Dropout::NoTargetablePairs => write!(f, "no targetable pairs"),
        }
    }
}

/// The outcome of analyzing one gene.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Report {
    /// The gene.
    gene: String,

    /// A record for each evaluated individual.
    records: Vec<cohort::Record>,

    /// Which haplotypes each nuclease can cut at the sites behind the
    /// records.
    calls: Vec<cohort::Call>,

    /// The individuals without enough heterozygous sites.
    insufficient: Vec<String>,

    /// Counts of calls that could not contribute to targetability.
    audit: Audit,

    /// Why the gene was not analyzed, if it was not.
    dropout: Option<Dropout>,
}

impl Report {
    /// Creates a report for a gene that was not analyzed.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::analysis::Dropout;
    /// use excisionfinder::analysis::Report;
    ///
    /// let report = Report::dropped("TP53", Dropout::NoTranscript);
    /// assert_eq!(report.gene(), "TP53");
    /// assert_eq!(report.dropout(), Some(Dropout::NoTranscript));
    /// assert!(report.records().is_empty());
    /// ```
    pub fn dropped(gene: impl Into<String>, dropout: Dropout) -> Self {
        Self {
            gene: gene.into(),
            records: Vec::new(),
            calls: Vec::new(),
            insufficient: Vec::new(),
            audit: Audit::default(),
            dropout: Some(dropout),
        }
    }

    /// Gets the gene.
    pub fn gene(&self) -> &str {
        &self.gene
    }

    /// Gets a record for each evaluated individual.
    pub fn records(&self) -> &[cohort::Record] {
        &self.records
    }

    /// Gets which haplotypes each nuclease can cut at the sites behind the
    /// records, grouped by individual.
    pub fn calls(&self) -> &[cohort::Call] {
        &self.calls
    }

    /// Gets the individuals without enough heterozygous sites.
    pub fn insufficient(&self) -> &[String] {
        &self.insufficient
    }

    /// Gets the counts of calls that could not contribute to targetability.
    pub fn audit(&self) -> Audit {
        self.audit
    }

    /// Gets why the gene was not analyzed, if it was not.
    pub fn dropout(&self) -> Option<Dropout> {
        self.dropout
    }
}

/// Analyzes a gene across a cohort.
///
/// `variants` and `genotypes` should hold only the positions within the
/// gene's region. The analysis proceeds as follows, ending early with a
/// [`Dropout`] when a step leaves nothing to evaluate:
///
/// 1. Individuals with fewer than [`Config::min_het_count()`] heterozygous
///    sites are set aside.
/// 2. In [`Mode::Pair`], every targetable pair of heterozygous sites carried
///    by the remaining individuals is enumerated (see [`Pairs::generate()`]).
/// 3. Each remaining individual is evaluated for each nuclease (see
///    [`Aggregator`]).
///
/// # Examples
///
/// ```
/// use excisionfinder::analysis;
/// use excisionfinder::analysis::Config;
/// use excisionfinder::gene::Exon;
/// use excisionfinder::gene::Structure;
/// use excisionfinder::genotype;
/// use excisionfinder::genotype::Genotype;
/// use excisionfinder::nuclease::NucleaseId;
/// use excisionfinder::variant;
/// use excisionfinder::variant::Effects;
/// use excisionfinder::variant::Record;
///
/// let structure = Structure::try_new("chr1", 100, 150, vec![Exon::try_new(100, 150)?])?;
///
/// let makes = Effects::new(true, false, false);
/// let variants = variant::Table::from_records(vec![
///     Record::new(80, "A", "G").with_effects(NucleaseId::SaCas9, makes),
///     Record::new(200, "C", "T").with_effects(NucleaseId::SaCas9, makes),
/// ]);
///
/// let genotypes = genotype::Table::from_rows(
///     vec![String::from("HG00096")],
///     vec![
///         (80, vec![Some(Genotype::phased("G", "A"))]),
///         (200, vec![Some(Genotype::phased("T", "C"))]),
///     ],
/// );
///
/// let config = Config::try_new([NucleaseId::SaCas9])?;
/// let report = analysis::analyze_gene("GENE1", &structure, &variants, &genotypes, &config);
///
/// assert_eq!(report.dropout(), None);
/// assert_eq!(report.records()[0].get(NucleaseId::SaCas9), Some(true));
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn analyze_gene(
    gene: &str,
    structure: &Structure,
    variants: &variant::Table,
    genotypes: &genotype::Table,
    config: &Config,
) -> Report {
    debug!(
        "{gene}: {} coding exons ({} bp)",
        structure.coding_exons().len(),
        structure.coding_position_count()
    );

    if variants.is_empty() {
        info!("{gene}: no annotated variants");
        return Report::dropped(gene, Dropout::NoAnnotatedVariants);
    }

    debug!("{gene}: {} annotated variants", variants.len());

    let (samples, insufficient) = cohort::partition(genotypes, config.min_het_count());

    debug!(
        "{gene}: {} of {} samples have at least {} heterozygous sites",
        samples.len(),
        genotypes.samples().len(),
        config.min_het_count()
    );

    let dropped = |dropout: Dropout| {
        info!("{gene}: {dropout}");

        Report {
            insufficient: insufficient.clone(),
            ..Report::dropped(gene, dropout)
        }
    };

    if samples.is_empty() {
        return dropped(Dropout::InsufficientHeterozygousSamples);
    }

    let nucleases = config.nucleases().iter().copied().collect::<Vec<_>>();
    let aggregator = Aggregator::new(
        structure,
        variants,
        genotypes,
        &nucleases,
        config.strictness(),
    );

    let aggregation = match config.mode() {
        Mode::Pair => {
            let candidates = samples
                .iter()
                .flat_map(|sample| sample.heterozygous().iter().copied());
            let pairs = Pairs::generate(candidates, config.window(), structure);

            debug!("{gene}: {} targetable pairs", pairs.len());

            if pairs.is_empty() {
                return dropped(Dropout::NoTargetablePairs);
            }

            aggregator.pairs(&samples, &pairs, config.window())
        }
        Mode::SingleCut => aggregator.single_cut(&samples),
    };

    let (records, calls, audit) = aggregation.into_parts();

    if !audit.is_clean() {
        warn!(
            "{gene}: {} unresolved calls, {} unannotated alleles, {} unphased calls",
            audit.unresolved, audit.missing_alleles, audit.unphased
        );
    }

    info!(
        "{gene}: {} of {} evaluated samples are targetable",
        records.iter().filter(|record| record.any()).count(),
        records.len()
    );

    Report {
        gene: gene.to_string(),
        records,
        calls,
        insufficient,
        audit,
        dropout: None,
    }
}

/// Analyzes the gene described by a transcript annotation across a cohort.
///
/// The gene structure is built from the annotation and the tables are
/// restricted to the transcript's region extended by
/// [`Config::padding()`] before calling [`analyze_gene()`]. A transcript
/// without coding exons is reported as a [`Dropout::NoCodingExons`], while
/// any other problem with its structure is an error.
///
/// # Examples
///
/// ```
/// use excisionfinder::analysis;
/// use excisionfinder::analysis::Config;
/// use excisionfinder::analysis::Dropout;
/// use excisionfinder::gene::annotation::Record;
/// use excisionfinder::genotype;
/// use excisionfinder::nuclease::NucleaseId;
/// use excisionfinder::variant;
///
/// let record = "NR_046018\tchr1\t11873\t14409\t14409\t14409\t3\t11873,12612,13220,\t12227,12721,14409,\tDDX11L1\t2536"
///     .parse::<Record>()?;
///
/// let config = Config::try_new([NucleaseId::SpCas9])?;
/// let report = analysis::analyze_transcript(
///     &record,
///     &variant::Table::default(),
///     &genotype::Table::default(),
///     &config,
/// )?;
///
/// assert_eq!(report.gene(), "DDX11L1");
/// assert_eq!(report.dropout(), Some(Dropout::NoCodingExons));
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn analyze_transcript(
    record: &annotation::Record,
    variants: &variant::Table,
    genotypes: &genotype::Table,
    config: &Config,
) -> std::result::Result<Report, gene::builder::Error> {
    let gene = record.gene_name();

    let structure = match record.structure() {
        Ok(structure) => structure,
        Err(gene::builder::Error::Structure(gene::Error::NoCodingExons)) => {
            info!("{gene}: no coding exons in {}", record.name());
            return Ok(Report::dropped(gene, Dropout::NoCodingExons));
        }
        Err(err) => return Err(err),
    };

    let (start, end) = record.region(config.padding());
    debug!("{gene}: using {} ({}:{start}-{end})", record.name(), record.chromosome());

    Ok(analyze_gene(
        gene,
        &structure,
        &variants.subset(start, end),
        &genotypes.subset(start, end),
        config,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::Exon;
    use crate::genotype::Genotype;
    use crate::variant::Effects;

    /// A gene with coding exons at `[1000, 1100]` and `[2000, 2100]`.
    fn structure() -> Structure {
        Structure::try_new(
            "chr1",
            1000,
            2100,
            vec![
                Exon::try_new(1000, 1100).unwrap(),
                Exon::try_new(2000, 2100).unwrap(),
            ],
        )
        .unwrap()
    }

    fn variants(positions: &[Number]) -> variant::Table {
        variant::Table::from_records(positions.iter().map(|position| {
            variant::Record::new(*position, "A", "G")
                .with_effects(NucleaseId::SaCas9, Effects::new(true, false, false))
        }))
    }

    fn genotypes(samples: &[&str], rows: &[(Number, &[&str])]) -> genotype::Table {
        genotype::Table::from_rows(
            samples.iter().map(|sample| sample.to_string()).collect(),
            rows.iter().map(|(position, calls)| {
                (
                    *position,
                    calls
                        .iter()
                        .map(|call| genotype::parse_call(call).unwrap())
                        .collect(),
                )
            }),
        )
    }

    fn config() -> Config {
        Config::try_new([NucleaseId::SaCas9, NucleaseId::SpCas9]).unwrap()
    }

    #[test]
    fn test_config_errors() {
        assert_eq!(
            Config::try_new(Vec::<NucleaseId>::new()).unwrap_err().to_string(),
            "no nucleases requested"
        );

        assert_eq!(
            config().with_window(0).unwrap_err().to_string(),
            "invalid window: 0 (must be greater than zero)"
        );

        assert_eq!(
            config().with_min_het_count(0).unwrap_err().to_string(),
            "invalid minimum heterozygous count: 0 (must be at least one)"
        );
    }

    #[test]
    fn test_explicit_min_het_count_survives_mode_change()
    -> std::result::Result<(), Box<dyn std::error::Error>> {
        let config = config().with_min_het_count(3)?.with_mode(Mode::SingleCut);
        assert_eq!(config.min_het_count(), 3);
        Ok(())
    }

    #[test]
    fn test_no_annotated_variants() {
        let genotypes = genotypes(&["HG00096"], &[(900, &["A|G"]), (1500, &["A|G"])]);

        let report = analyze_gene(
            "GENE1",
            &structure(),
            &variant::Table::default(),
            &genotypes,
            &config(),
        );

        assert_eq!(report.dropout(), Some(Dropout::NoAnnotatedVariants));
    }

    #[test]
    fn test_insufficient_heterozygous_samples() {
        let genotypes = genotypes(
            &["HG00096", "HG00097"],
            &[(900, &["A|G", "A|A"]), (1500, &["A|A", "G|G"])],
        );

        let report = analyze_gene(
            "GENE1",
            &structure(),
            &variants(&[900, 1500]),
            &genotypes,
            &config(),
        );

        assert_eq!(
            report.dropout(),
            Some(Dropout::InsufficientHeterozygousSamples)
        );
        assert_eq!(report.insufficient(), &["HG00096", "HG00097"]);
        assert!(report.records().is_empty());
    }

    #[test]
    fn test_no_targetable_pairs() {
        // Both sites sit within the same intron.
        let genotypes = genotypes(&["HG00096"], &[(1200, &["A|G"]), (1300, &["G|A"])]);

        let report = analyze_gene(
            "GENE1",
            &structure(),
            &variants(&[1200, 1300]),
            &genotypes,
            &config(),
        );

        assert_eq!(report.dropout(), Some(Dropout::NoTargetablePairs));
    }

    #[test]
    fn test_pairs_outside_the_window_are_not_targetable()
    -> std::result::Result<(), Box<dyn std::error::Error>> {
        let structure = Structure::try_new(
            "chr1",
            20_000,
            20_100,
            vec![Exon::try_new(20_000, 20_100)?],
        )?;

        let genotypes = genotypes(&["HG00096"], &[(10_000, &["G|A"]), (25_000, &["G|A"])]);
        let variants = variants(&[10_000, 25_000]);

        let report = analyze_gene("GENE1", &structure, &variants, &genotypes, &config());
        assert_eq!(report.dropout(), Some(Dropout::NoTargetablePairs));

        let config = config().with_window(15_000)?;
        let report = analyze_gene("GENE1", &structure, &variants, &genotypes, &config);
        assert_eq!(report.dropout(), None);
        assert_eq!(report.records()[0].get(NucleaseId::SaCas9), Some(true));

        Ok(())
    }

    #[test]
    fn test_successful_analysis() {
        let genotypes = genotypes(
            &["HG00096", "HG00097", "HG00099"],
            &[
                (900, &["G|A", "G|A", "A|A"]),
                (1500, &["G|A", "A|G", "A|G"]),
            ],
        );

        let report = analyze_gene(
            "GENE1",
            &structure(),
            &variants(&[900, 1500]),
            &genotypes,
            &config(),
        );

        assert_eq!(report.dropout(), None);
        assert_eq!(report.insufficient(), &["HG00099"]);

        let records = report.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sample(), "HG00096");
        assert_eq!(
            records[0].iter().collect::<Vec<_>>(),
            vec![(NucleaseId::SaCas9, true), (NucleaseId::SpCas9, false)]
        );
        assert!(records[0].any());
        assert_eq!(records[1].sample(), "HG00097");
        assert!(!records[1].any());

        let calls = report
            .calls()
            .iter()
            .map(|call| {
                let resolution = call.get(NucleaseId::SaCas9).unwrap_or_default();
                (call.sample(), call.position(), resolution.hap1(), resolution.hap2())
            })
            .collect::<Vec<_>>();

        assert_eq!(
            calls,
            vec![
                ("HG00096", 900, true, false),
                ("HG00096", 1500, true, false),
                ("HG00097", 900, true, false),
                ("HG00097", 1500, false, true),
            ]
        );
    }

    #[test]
    fn test_single_cut_mode() {
        let genotypes = genotypes(&["HG00096", "HG00097"], &[(1050, &["A|G", "A|A"])]);
        let config = config().with_mode(Mode::SingleCut);

        let report = analyze_gene(
            "GENE1",
            &structure(),
            &variants(&[1050]),
            &genotypes,
            &config,
        );

        assert_eq!(report.dropout(), None);
        assert_eq!(report.records().len(), 1);
        assert_eq!(report.records()[0].get(NucleaseId::SaCas9), Some(true));
        assert_eq!(report.insufficient(), &["HG00097"]);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let genotypes = genotypes(
            &["HG00096", "HG00097"],
            &[
                (900, &["G|A", "A|G"]),
                (1050, &["A|G", "G|A"]),
                (1500, &["G|A", "A|G"]),
                (2050, &["A|G", "A/G"]),
            ],
        );
        let variants = variants(&[900, 1050, 1500, 2050]);

        let first = analyze_gene("GENE1", &structure(), &variants, &genotypes, &config());
        let second = analyze_gene("GENE1", &structure(), &variants, &genotypes, &config());

        assert_eq!(first, second);
        assert_eq!(first.audit().unphased, 1);
    }

    #[test]
    fn test_analyze_transcript_selects_region()
    -> std::result::Result<(), Box<dyn std::error::Error>> {
        let record = "NM_1\tchr1\t950\t2150\t1000\t2100\t2\t950,2000,\t1100,2150,\tGENE1\t1200"
            .parse::<annotation::Record>()?;

        // The site at 100 lies outside of the transcript.
        let genotypes = genotypes(&["HG00096"], &[(100, &["G|A"]), (1500, &["G|A"])]);
        let variants = variants(&[100, 1500]);

        let report = analyze_transcript(&record, &variants, &genotypes, &config())?;
        assert_eq!(report.gene(), "GENE1");
        assert_eq!(
            report.dropout(),
            Some(Dropout::InsufficientHeterozygousSamples)
        );

        let config = config().with_padding(1_000);
        let report = analyze_transcript(&record, &variants, &genotypes, &config)?;
        assert_eq!(report.dropout(), None);
        assert_eq!(report.records()[0].get(NucleaseId::SaCas9), Some(true));

        Ok(())
    }
}
