//! A table of phased genotypes for a cohort.
//!
//! Tables are tab-delimited with a header line. The first column holds the
//! position and every following column holds the genotypes of one sample.
//!
//! ```text
//! pos     HG00096  HG00097  HG00099
//! 100045  A|G      A|A      G|A
//! 100310  C|C      T|C      .|.
//! ```

use std::collections::HashMap;
use std::collections::HashSet;
use std::io::BufRead;
use std::num::ParseIntError;

use omics::coordinate::position::Number;

use crate::genotype;
use crate::genotype::Genotype;
use crate::reader;
use crate::reader::Reader;
use crate::reader::DELIMITER;

/// An error associated with parsing a genotype line.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// An incorrect number of fields in the line.
    IncorrectNumberOfFields(usize, usize),

    /// An invalid position.
    InvalidPosition(ParseIntError),

    /// An invalid genotype for a sample.
    InvalidGenotype(String, genotype::ParseError),

    /// The position was already seen earlier in the table.
    DuplicatePosition(Number),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IncorrectNumberOfFields(expected, found) => write!(
                f,
                "invalid number of fields: expected {expected} fields, found {found} fields"
            ),
            ParseError::InvalidPosition(err) => write!(f, "invalid position: {err}"),
            ParseError::InvalidGenotype(sample, err) => write!(f, "sample {sample}: {err}"),
            ParseError::DuplicatePosition(position) => {
                write!(f, "duplicate position: {position}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// An error related to a [`Table`].
#[derive(Debug)]
pub enum Error {
    /// An error from the underlying reader.
    Reader(reader::Error),

    /// The header has no sample columns.
    NoSamples,

    /// A line could not be parsed.
    Parse(ParseError, usize),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Reader(err) => write!(f, "reader error: {err}"),
            Error::NoSamples => write!(f, "no sample columns in header"),
            Error::Parse(err, line_no) => write!(f, "parse error on line {line_no}: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// The genotype calls of every sample at a position, in sample order.
pub type Calls = Vec<Option<Genotype>>;

/// A table of genotypes indexed by position and sample.
#[derive(Clone, Debug, Default)]
pub struct Table {
    /// The sample names, in column order.
    samples: Vec<String>,

    /// The calls at each position.
    inner: HashMap<Number, Calls>,

    /// Every position in the table, sorted ascending.
    positions: Vec<Number>,
}

impl Table {
    /// Creates a table from sample names and the calls at each position.
    ///
    /// Each entry of `rows` must hold one call per sample. Later rows replace
    /// earlier rows at the same position.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::genotype::Genotype;
    /// use excisionfinder::genotype::Table;
    ///
    /// let table = Table::from_rows(
    ///     vec![String::from("HG00096"), String::from("HG00097")],
    ///     vec![
    ///         (300, vec![Some(Genotype::phased("C", "T")), None]),
    ///         (100, vec![Some(Genotype::phased("A", "G")), Some(Genotype::phased("A", "A"))]),
    ///     ],
    /// );
    ///
    /// assert_eq!(table.positions(), &[100, 300]);
    /// assert_eq!(table.get(100, 0), Some(&Genotype::phased("A", "G")));
    /// assert_eq!(table.get(300, 1), None);
    /// assert_eq!(table.heterozygous_positions(0), vec![100, 300]);
    /// assert!(table.heterozygous_positions(1).is_empty());
    /// ```
    pub fn from_rows(samples: Vec<String>, rows: impl IntoIterator<Item = (Number, Calls)>) -> Self {
        let inner = rows.into_iter().collect::<HashMap<_, _>>();

        let mut positions = inner.keys().copied().collect::<Vec<_>>();
        positions.sort_unstable();

        Self {
            samples,
            inner,
            positions,
        }
    }

    /// Reads a table.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::genotype::Genotype;
    /// use excisionfinder::genotype::Table;
    ///
    /// let data = b"pos\tHG00096\tHG00097\n100\tA|G\t.|.\n250\tC|C\tCT|C\n";
    /// let mut reader = excisionfinder::Reader::new(&data[..]);
    ///
    /// let table = Table::try_from_reader(&mut reader)?;
    ///
    /// assert_eq!(table.samples(), &["HG00096", "HG00097"]);
    /// assert_eq!(table.get(100, 1), None);
    /// assert_eq!(table.get(250, 1), Some(&Genotype::phased("CT", "C")));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_from_reader<T>(reader: &mut Reader<T>) -> Result<Self>
    where
        T: BufRead,
    {
        let header = reader.header().map_err(Error::Reader)?;

        if header.len() < 2 {
            return Err(Error::NoSamples);
        }

        let samples = header[1..].to_vec();
        let mut rows = HashMap::<Number, Calls>::new();

        for result in reader.records() {
            let (line_no, line) = result.map_err(Error::Reader)?;
            let fields = line.split(DELIMITER).collect::<Vec<_>>();

            if fields.len() != header.len() {
                return Err(Error::Parse(
                    ParseError::IncorrectNumberOfFields(header.len(), fields.len()),
                    line_no,
                ));
            }

            let position = fields[0]
                .trim()
                .parse::<Number>()
                .map_err(|err| Error::Parse(ParseError::InvalidPosition(err), line_no))?;

            let calls = fields[1..]
                .iter()
                .zip(&samples)
                .map(|(field, sample)| {
                    genotype::parse_call(field)
                        .map_err(|err| ParseError::InvalidGenotype(sample.clone(), err))
                })
                .collect::<std::result::Result<Calls, _>>()
                .map_err(|err| Error::Parse(err, line_no))?;

            if rows.insert(position, calls).is_some() {
                return Err(Error::Parse(
                    ParseError::DuplicatePosition(position),
                    line_no,
                ));
            }
        }

        Ok(Self::from_rows(samples, rows))
    }

    /// Gets the sample names, in column order.
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Gets every position in the table, sorted ascending.
    pub fn positions(&self) -> &[Number] {
        &self.positions
    }

    /// Whether the table has no positions.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Gets the call for the sample at `sample` (its column index) at a
    /// position. Missing calls are [`None`].
    pub fn get(&self, position: Number, sample: usize) -> Option<&Genotype> {
        self.inner
            .get(&position)
            .and_then(|calls| calls.get(sample))
            .and_then(Option::as_ref)
    }

    /// Gets the positions, sorted ascending, at which the sample at `sample`
    /// (its column index) is heterozygous.
    pub fn heterozygous_positions(&self, sample: usize) -> Vec<Number> {
        self.positions
            .iter()
            .copied()
            .filter(|position| {
                self.get(*position, sample)
                    .map(Genotype::is_heterozygous)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Gets the subset of the table within the closed range `[start, end]`.
    pub fn subset(&self, start: Number, end: Number) -> Self {
        let from = self.positions.partition_point(|position| *position < start);
        let to = self.positions.partition_point(|position| *position <= end);

        let positions = self.positions[from..to.max(from)].to_vec();
        let inner = positions
            .iter()
            .map(|position| (*position, self.inner[position].clone()))
            .collect();

        Self {
            samples: self.samples.clone(),
            inner,
            positions,
        }
    }

    /// Keeps only the calls at the given positions.
    pub fn retain_positions(&mut self, allowed: &HashSet<Number>) {
        self.inner.retain(|position, _| allowed.contains(position));
        self.positions.retain(|position| allowed.contains(position));
    }
}
