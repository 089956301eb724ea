//! A binary to find individuals in a cohort who can be targeted for
//! allele-specific excision of each gene on a chromosome.
//!
//! ```shell
//! cargo run --release --bin=excisionfinder --features=binaries -- \
//!     refGene.txt.gz chr22_targ.tsv.gz chr22_gens.tsv.gz chr22 \
//!     --nucleases SpCas9,SaCas9 --output chr22_results.tsv
//! ```
//!
//! For every requested gene (or every gene annotated on the chromosome), the
//! canonical transcript is selected from the annotations and analyzed against
//! the targetability records and phased genotypes. Results are written as a
//! tab-delimited table with one row per gene and evaluated individual:
//!
//! ```text
//! gene  sample   targ_SpCas9  targ_SaCas9  targ_all
//! TP53  HG00096  true         false        true
//! ```
//!
//! Genes that could not be analyzed are logged and, if requested, written to
//! a separate table along with the reason. Optional tables hold which
//! haplotypes each nuclease can cut at every evaluated site (`--haplotypes`),
//! the individuals set aside for carrying too few heterozygous sites
//! (`--insufficient`), and per-gene counts of evaluated individuals and of
//! calls that could not be evaluated (`--summary`).

use std::collections::BTreeSet;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use excisionfinder::analysis;
use excisionfinder::analysis::Config;
use excisionfinder::analysis::DEFAULT_WINDOW;
use excisionfinder::analysis::Dropout;
use excisionfinder::analysis::Report;
use excisionfinder::cohort::Mode;
use excisionfinder::gene::annotation;
use excisionfinder::genotype;
use excisionfinder::genotype::Haplotype;
use excisionfinder::nuclease::Columns;
use excisionfinder::nuclease::NucleaseId;
use excisionfinder::nuclease::Strictness;
use excisionfinder::variant;
use excisionfinder::Reader;
use flate2::read::GzDecoder;
use omics::coordinate::position::Number;
use rayon::prelude::*;
use tracing::info;
use tracing::warn;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

/// The prefix commonly prepended to chromosome names.
const CHROMOSOME_PREFIX: &str = "chr";

////////////////////////////////////////////////////////////////////////////////////////
// Input
////////////////////////////////////////////////////////////////////////////////////////

/// Opens a tab-delimited file, decompressing it if its name ends in `.gz`.
fn open(path: &Path) -> Result<Reader<Box<dyn BufRead>>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    let inner: Box<dyn BufRead> = match path.extension().and_then(|ext| ext.to_str()) {
        Some("gz") => Box::new(BufReader::new(GzDecoder::new(file))),
        _ => Box::new(BufReader::new(file)),
    };

    Ok(Reader::new(inner))
}

/// Reads a set of positions, one per line.
///
/// Only the first column of each line is considered.
fn read_positions(path: &Path) -> Result<HashSet<Number>> {
    let mut reader = open(path)?;
    let mut positions = HashSet::new();

    for result in reader.records() {
        let (line_no, line) = result.with_context(|| format!("reading {}", path.display()))?;
        let field = line.split(excisionfinder::reader::DELIMITER).next().unwrap_or_default();

        let position = field.trim().parse::<Number>().with_context(|| {
            format!("{}: invalid position on line {line_no}: {field}", path.display())
        })?;

        positions.insert(position);
    }

    Ok(positions)
}

/// Whether two chromosome names refer to the same chromosome, ignoring any
/// `chr` prefix and case.
fn same_chromosome(a: &str, b: &str) -> bool {
    fn strip(name: &str) -> &str {
        let name = name.trim();

        match name.get(..CHROMOSOME_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(CHROMOSOME_PREFIX) => {
                &name[CHROMOSOME_PREFIX.len()..]
            }
            _ => name,
        }
    }

    strip(a).eq_ignore_ascii_case(strip(b))
}

////////////////////////////////////////////////////////////////////////////////////////
// Output
////////////////////////////////////////////////////////////////////////////////////////

/// Creates an output, writing to standard output when no path is given.
fn create(path: Option<&Path>) -> Result<BufWriter<Box<dyn Write>>> {
    let inner: Box<dyn Write> = match path {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    };

    Ok(BufWriter::new(inner))
}

/// Writes the header of the results table.
fn write_header<W: Write>(writer: &mut W, config: &Config) -> std::io::Result<()> {
    write!(writer, "gene\tsample")?;

    for nuclease in config.nucleases().iter() {
        write!(writer, "\ttarg_{nuclease}")?;
    }

    writeln!(writer, "\ttarg_all")
}

/// Writes one row per evaluated individual of a report.
fn write_report<W: Write>(writer: &mut W, report: &Report, config: &Config) -> std::io::Result<()> {
    for record in report.records() {
        write!(writer, "{}\t{}", report.gene(), record.sample())?;

        for nuclease in config.nucleases().iter() {
            write!(writer, "\t{}", record.get(*nuclease).unwrap_or(false))?;
        }

        writeln!(writer, "\t{}", record.any())?;
    }

    Ok(())
}

/// Writes the header of the per-haplotype table.
fn write_haplotypes_header<W: Write>(writer: &mut W, config: &Config) -> std::io::Result<()> {
    write!(writer, "gene\tsample\tpos")?;

    for haplotype in Haplotype::BOTH {
        write!(writer, "\t{haplotype}")?;
    }

    for nuclease in config.nucleases().iter() {
        for haplotype in Haplotype::BOTH {
            write!(writer, "\t{haplotype}_{nuclease}")?;
        }
    }

    writeln!(writer)
}

/// Writes one row per evaluated heterozygous site of each individual in a
/// report, with the allele on and cuttability of each haplotype.
fn write_haplotypes<W: Write>(
    writer: &mut W,
    report: &Report,
    config: &Config,
) -> std::io::Result<()> {
    for call in report.calls() {
        write!(writer, "{}\t{}\t{}", report.gene(), call.sample(), call.position())?;

        for haplotype in Haplotype::BOTH {
            write!(writer, "\t{}", call.genotype().allele(haplotype))?;
        }

        for nuclease in config.nucleases().iter() {
            for haplotype in Haplotype::BOTH {
                write!(writer, "\t{}", call.cuts(*nuclease, haplotype))?;
            }
        }

        writeln!(writer)?;
    }

    Ok(())
}

/// Writes the header of the insufficient individuals table.
fn write_insufficient_header<W: Write>(writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "gene\tsample")
}

/// Writes one row per individual set aside for having too few heterozygous
/// sites.
fn write_insufficient<W: Write>(writer: &mut W, report: &Report) -> std::io::Result<()> {
    for sample in report.insufficient() {
        writeln!(writer, "{}\t{sample}", report.gene())?;
    }

    Ok(())
}

/// Writes the header of the per-gene summary table.
fn write_summary_header<W: Write>(writer: &mut W) -> std::io::Result<()> {
    writeln!(
        writer,
        "gene\tevaluated\ttargetable\tinsufficient\tunresolved\tmissing_alleles\tunphased\tdropout"
    )
}

/// Writes the summary row of a report.
fn write_summary<W: Write>(writer: &mut W, report: &Report) -> std::io::Result<()> {
    let audit = report.audit();
    let dropout = report
        .dropout()
        .map(|dropout| dropout.to_string())
        .unwrap_or_default();

    writeln!(
        writer,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{dropout}",
        report.gene(),
        report.records().len(),
        report.records().iter().filter(|record| record.any()).count(),
        report.insufficient().len(),
        audit.unresolved,
        audit.missing_alleles,
        audit.unphased,
    )
}

////////////////////////////////////////////////////////////////////////////////////////
// Main
////////////////////////////////////////////////////////////////////////////////////////

/// Finds individuals who can be targeted for allele-specific excision.
#[derive(Parser)]
struct Args {
    /// The transcript annotations (refGene-style, optionally gzipped).
    annotations: PathBuf,

    /// The variant targetability table for the chromosome (optionally
    /// gzipped).
    targetability: PathBuf,

    /// The phased genotypes for the chromosome (optionally gzipped).
    genotypes: PathBuf,

    /// The chromosome to analyze (e.g., `chr22` or `22`).
    chromosome: String,

    /// The nucleases to evaluate, comma-separated (e.g., `SpCas9,SaCas9`).
    #[arg(short, long, value_delimiter = ',', required = true)]
    nucleases: Vec<NucleaseId>,

    /// A gene to analyze. May be repeated. Every gene annotated on the
    /// chromosome is analyzed by default.
    #[arg(short, long = "gene")]
    genes: Vec<String>,

    /// The maximum distance between the two cuts of a pair.
    #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
    window: Number,

    /// The distance added on either side of a transcript when selecting its
    /// variants.
    #[arg(short, long, default_value_t = 0)]
    padding: Number,

    /// Only consider variants that create or destroy a recognition site.
    #[arg(short, long, default_value_t = false)]
    strict: bool,

    /// Consider individuals targetable with a single cut within a coding
    /// exon.
    #[arg(long, default_value_t = false)]
    single_cut: bool,

    /// The minimum number of heterozygous sites an individual needs (2 for
    /// pairs and 1 for single cuts by default).
    #[arg(short, long)]
    min_hets: Option<usize>,

    /// A file of allowed positions, one per line. Variants at any other
    /// position are ignored.
    #[arg(long)]
    positions: Option<PathBuf>,

    /// Where to write the results. Defaults to standard output.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Where to write the genes that could not be analyzed.
    #[arg(short, long)]
    dropouts: Option<PathBuf>,

    /// Where to write which haplotypes each nuclease can cut at every
    /// evaluated heterozygous site.
    #[arg(long)]
    haplotypes: Option<PathBuf>,

    /// Where to write the individuals without enough heterozygous sites.
    #[arg(long)]
    insufficient: Option<PathBuf>,

    /// Where to write a summary of each gene, including counts of calls
    /// that could not be evaluated.
    #[arg(long)]
    summary: Option<PathBuf>,

    /// The number of threads to use. Defaults to the number of logical CPUs.
    #[arg(short, long)]
    threads: Option<usize>,

    #[command(flatten)]
    verbose: Verbosity,
}

impl Args {
    /// Builds the analysis configuration.
    fn config(&self) -> Result<Config> {
        let mut config = Config::try_new(self.nucleases.iter().copied())?
            .with_window(self.window)?
            .with_padding(self.padding);

        if self.strict {
            config = config.with_strictness(Strictness::Strict);
        }

        if self.single_cut {
            config = config.with_mode(Mode::SingleCut);
        }

        if let Some(count) = self.min_hets {
            config = config.with_min_het_count(count)?;
        }

        Ok(config)
    }
}

fn find(args: &Args) -> Result<()> {
    let config = args.config().context("configuring analysis")?;

    info!(
        "evaluating {} nucleases ({}, {} mode, window of {} bp)",
        config.nucleases().len(),
        config.strictness(),
        config.mode(),
        config.window()
    );

    if let Some(threads) = args.threads {
        if threads == 0 {
            bail!("the number of threads must be greater than zero");
        }

        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring thread pool")?;
    }

    let annotations = annotation::read_all(&mut open(&args.annotations)?)
        .with_context(|| format!("reading annotations from {}", args.annotations.display()))?
        .into_iter()
        .filter(|record| same_chromosome(record.chromosome(), &args.chromosome))
        .collect::<Vec<_>>();

    info!(
        "annotations: {} transcripts on {}",
        annotations.len(),
        args.chromosome
    );

    let genes = match args.genes.is_empty() {
        true => annotations
            .iter()
            .map(|record| record.gene_name().to_string())
            .collect::<BTreeSet<_>>(),
        false => args.genes.iter().cloned().collect::<BTreeSet<_>>(),
    }
    .into_iter()
    .collect::<Vec<_>>();

    let nucleases = config.nucleases().iter().copied().collect::<Vec<_>>();
    let mut variants =
        variant::Table::try_from_reader(&mut open(&args.targetability)?, &Columns::default(), &nucleases)
            .with_context(|| {
                format!(
                    "reading targetability records from {}",
                    args.targetability.display()
                )
            })?;

    let mut genotypes = genotype::Table::try_from_reader(&mut open(&args.genotypes)?)
        .with_context(|| format!("reading genotypes from {}", args.genotypes.display()))?;

    if let Some(path) = &args.positions {
        let allowed = read_positions(path)?;
        info!("positions: restricting to {} positions", allowed.len());

        variants.retain_positions(&allowed);
        genotypes.retain_positions(&allowed);
    }

    info!(
        "targetability: {} records at {} positions",
        variants.len(),
        variants.positions().len()
    );
    info!(
        "genotypes: {} samples at {} positions",
        genotypes.samples().len(),
        genotypes.positions().len()
    );

    let reports = genes
        .par_iter()
        .map(|gene| match annotation::canonical(&annotations, gene) {
            Some(record) => analysis::analyze_transcript(record, &variants, &genotypes, &config)
                .with_context(|| format!("{gene}: analyzing {}", record.name())),
            None => {
                info!("{gene}: {}", Dropout::NoTranscript);
                Ok(Report::dropped(gene.as_str(), Dropout::NoTranscript))
            }
        })
        .collect::<Vec<_>>();

    let mut output = create(args.output.as_deref())?;
    write_header(&mut output, &config).context("writing results")?;

    let mut haplotypes = args
        .haplotypes
        .as_deref()
        .map(|path| create(Some(path)))
        .transpose()?;
    let mut insufficient = args
        .insufficient
        .as_deref()
        .map(|path| create(Some(path)))
        .transpose()?;
    let mut summary = args
        .summary
        .as_deref()
        .map(|path| create(Some(path)))
        .transpose()?;

    if let Some(writer) = haplotypes.as_mut() {
        write_haplotypes_header(writer, &config).context("writing haplotypes")?;
    }

    if let Some(writer) = insufficient.as_mut() {
        write_insufficient_header(writer).context("writing insufficient individuals")?;
    }

    if let Some(writer) = summary.as_mut() {
        write_summary_header(writer).context("writing summary")?;
    }

    let mut dropouts = Vec::new();

    for (gene, result) in genes.iter().zip(reports) {
        let report = match result {
            Ok(report) => report,
            Err(err) => {
                warn!("{err:#}");
                dropouts.push((gene.clone(), err.root_cause().to_string()));
                continue;
            }
        };

        if let Some(writer) = insufficient.as_mut() {
            write_insufficient(writer, &report).context("writing insufficient individuals")?;
        }

        if let Some(writer) = summary.as_mut() {
            write_summary(writer, &report).context("writing summary")?;
        }

        match report.dropout() {
            Some(dropout) => dropouts.push((gene.clone(), dropout.to_string())),
            None => {
                write_report(&mut output, &report, &config).context("writing results")?;

                if let Some(writer) = haplotypes.as_mut() {
                    write_haplotypes(writer, &report, &config).context("writing haplotypes")?;
                }
            }
        }
    }

    output.flush().context("writing results")?;

    for (writer, name) in [
        (haplotypes.as_mut(), "haplotypes"),
        (insufficient.as_mut(), "insufficient individuals"),
        (summary.as_mut(), "summary"),
    ] {
        if let Some(writer) = writer {
            writer.flush().with_context(|| format!("writing {name}"))?;
        }
    }

    info!(
        "analyzed {} genes ({} dropped out)",
        genes.len() - dropouts.len(),
        dropouts.len()
    );

    if let Some(path) = &args.dropouts {
        let mut writer = create(Some(path))?;
        writeln!(writer, "gene\treason")?;

        for (gene, reason) in &dropouts {
            writeln!(writer, "{gene}\t{reason}")?;
        }

        writer
            .flush()
            .with_context(|| format!("writing dropouts to {}", path.display()))?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(args.verbose.log_level_filter().as_trace())
            .with_writer(std::io::stderr)
            .init(),
    };

    find(&args)
}

#[cfg(test)]
mod tests {
    use excisionfinder::cohort;
    use excisionfinder::cohort::Aggregator;
    use excisionfinder::gene::Exon;
    use excisionfinder::gene::Structure;
    use excisionfinder::genotype::Genotype;
    use excisionfinder::variant::Effects;

    use super::*;

    #[test]
    fn chromosome_names() {
        assert!(same_chromosome("chr22", "22"));
        assert!(same_chromosome("22", "CHR22"));
        assert!(same_chromosome("chrX", "x"));
        assert!(!same_chromosome("chr2", "chr22"));
        assert!(!same_chromosome("c", "chr1"));
    }

    #[test]
    fn results_table() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let config = Config::try_new([NucleaseId::SaCas9, NucleaseId::SpCas9])?;

        let structure = Structure::try_new("chr1", 100, 150, vec![Exon::try_new(100, 150)?])?;
        let variants = variant::Table::from_records(vec![
            variant::Record::new(120, "A", "G")
                .with_effects(NucleaseId::SaCas9, Effects::new(true, false, false)),
        ]);
        let genotypes = genotype::Table::from_rows(
            vec![String::from("HG00096")],
            vec![(120, vec![Some(Genotype::phased("A", "G"))])],
        );

        let config = config.with_mode(Mode::SingleCut);
        let report = analysis::analyze_gene("GENE1", &structure, &variants, &genotypes, &config);

        let mut buffer = Vec::new();
        write_header(&mut buffer, &config)?;
        write_report(&mut buffer, &report, &config)?;

        assert_eq!(
            String::from_utf8(buffer)?,
            "gene\tsample\ttarg_SaCas9\ttarg_SpCas9\ttarg_all\n\
             GENE1\tHG00096\ttrue\tfalse\ttrue\n"
        );

        // The report agrees with evaluating the cohort directly.
        let (samples, _) = cohort::partition(&genotypes, 1);
        let nucleases = [NucleaseId::SaCas9, NucleaseId::SpCas9];
        let aggregation =
            Aggregator::new(&structure, &variants, &genotypes, &nucleases, Strictness::Relaxed)
                .single_cut(&samples);
        assert_eq!(aggregation.records(), report.records());

        Ok(())
    }

    #[test]
    fn haplotype_and_audit_tables() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let config = Config::try_new([NucleaseId::SaCas9])?;

        let structure = Structure::try_new("chr1", 1000, 1100, vec![Exon::try_new(1000, 1100)?])?;
        let makes = Effects::new(true, false, false);
        let variants = variant::Table::from_records(vec![
            variant::Record::new(900, "A", "G").with_effects(NucleaseId::SaCas9, makes),
            variant::Record::new(1200, "C", "T").with_effects(NucleaseId::SaCas9, makes),
        ]);
        let genotypes = genotype::Table::from_rows(
            vec![
                String::from("HG00096"),
                String::from("HG00097"),
                String::from("HG00098"),
            ],
            vec![
                (
                    900,
                    vec![
                        Some(Genotype::phased("G", "A")),
                        Some(Genotype::phased("G", "A")),
                        Some(Genotype::unphased("A", "G")),
                    ],
                ),
                (
                    1200,
                    vec![
                        Some(Genotype::phased("T", "C")),
                        Some(Genotype::phased("C", "C")),
                        Some(Genotype::phased("T", "C")),
                    ],
                ),
            ],
        );

        let report = analysis::analyze_gene("GENE1", &structure, &variants, &genotypes, &config);

        let mut buffer = Vec::new();
        write_haplotypes_header(&mut buffer, &config)?;
        write_haplotypes(&mut buffer, &report, &config)?;
        assert_eq!(
            String::from_utf8(buffer)?,
            "gene\tsample\tpos\thap1\thap2\thap1_SaCas9\thap2_SaCas9\n\
             GENE1\tHG00096\t900\tG\tA\ttrue\tfalse\n\
             GENE1\tHG00096\t1200\tT\tC\ttrue\tfalse\n\
             GENE1\tHG00098\t1200\tT\tC\ttrue\tfalse\n"
        );

        let mut buffer = Vec::new();
        write_insufficient_header(&mut buffer)?;
        write_insufficient(&mut buffer, &report)?;
        assert_eq!(String::from_utf8(buffer)?, "gene\tsample\nGENE1\tHG00097\n");

        let mut buffer = Vec::new();
        write_summary_header(&mut buffer)?;
        write_summary(&mut buffer, &report)?;
        write_summary(&mut buffer, &Report::dropped("GENE2", Dropout::NoTranscript))?;
        assert_eq!(
            String::from_utf8(buffer)?,
            "gene\tevaluated\ttargetable\tinsufficient\tunresolved\tmissing_alleles\tunphased\tdropout\n\
             GENE1\t2\t1\t1\t0\t0\t1\t\n\
             GENE2\t0\t0\t0\t0\t0\t0\tno transcript\n"
        );

        Ok(())
    }
}
