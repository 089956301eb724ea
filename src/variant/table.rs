//! A position-indexed table of variant targetability records.
//!
//! Tables are tab-delimited with a header line. The `pos`, `ref`, and `alt`
//! columns are required, along with one column per `(nuclease, effect)`
//! combination requested, named according to a [`Columns`] mapping. Any other
//! columns are ignored.
//!
//! ```text
//! chrom  pos     ref  alt  makes_SpCas9  breaks_SpCas9  var_near_SpCas9
//! chr1   100045  A    G    True          False          False
//! ```

use std::collections::HashMap;
use std::collections::HashSet;
use std::io::BufRead;
use std::num::ParseIntError;

use omics::coordinate::position::Number;

use crate::nuclease::Columns;
use crate::nuclease::Effect;
use crate::nuclease::NucleaseId;
use crate::reader;
use crate::reader::Reader;
use crate::reader::DELIMITER;
use crate::variant::Record;

/// The name of the position column.
pub const POSITION_COLUMN: &str = "pos";

/// The name of the reference allele column.
pub const REFERENCE_COLUMN: &str = "ref";

/// The name of the alternate allele column.
pub const ALTERNATE_COLUMN: &str = "alt";

/// An error associated with parsing a targetability line.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// An incorrect number of fields in the line.
    IncorrectNumberOfFields(usize, usize),

    /// An invalid position.
    InvalidPosition(ParseIntError),

    /// A flag column held something other than a boolean.
    InvalidFlag(String, String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IncorrectNumberOfFields(expected, found) => write!(
                f,
                "invalid number of fields: expected {expected} fields, found {found} fields"
            ),
            ParseError::InvalidPosition(err) => write!(f, "invalid position: {err}"),
            ParseError::InvalidFlag(column, value) => {
                write!(f, "invalid flag in column {column}: {value}")
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

    /// A required column is not present in the header.
    MissingColumn(String),

    /// A line could not be parsed.
    Parse(ParseError, usize),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Reader(err) => write!(f, "reader error: {err}"),
            Error::MissingColumn(column) => write!(f, "missing column: {column}"),
            Error::Parse(err, line_no) => write!(f, "parse error on line {line_no}: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// A table of targetability records indexed by position.
#[derive(Clone, Debug, Default)]
pub struct Table {
    /// The records at each position.
    inner: HashMap<Number, Vec<Record>>,

    /// Every position with at least one record, sorted ascending.
    positions: Vec<Number>,
}

impl Table {
    /// Creates a table from a set of records.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::variant::Record;
    /// use excisionfinder::variant::Table;
    ///
    /// let table = Table::from_records(vec![
    ///     Record::new(200, "C", "T"),
    ///     Record::new(100, "A", "G"),
    ///     Record::new(100, "A", "T"),
    /// ]);
    ///
    /// assert_eq!(table.len(), 3);
    /// assert_eq!(table.positions(), &[100, 200]);
    /// assert_eq!(table.records_at(100).len(), 2);
    /// assert_eq!(table.records_at(100)[1].alternate(), "T");
    /// assert!(table.records_at(150).is_empty());
    /// ```
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut inner = HashMap::<Number, Vec<Record>>::new();

        for record in records {
            inner.entry(record.position()).or_default().push(record);
        }

        let mut positions = inner.keys().copied().collect::<Vec<_>>();
        positions.sort_unstable();

        Self { inner, positions }
    }

    /// Reads a table, keeping the effects of the requested nucleases.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::nuclease::Columns;
    /// use excisionfinder::nuclease::NucleaseId;
    /// use excisionfinder::variant::Effects;
    /// use excisionfinder::variant::Table;
    ///
    /// let data = b"pos\tref\talt\tmakes_SpCas9\tbreaks_SpCas9\tvar_near_SpCas9\n\
    ///              100\tA\tG\tTrue\tFalse\tFalse\n\
    ///              250\tC\tCT\t0\t1\t0\n";
    /// let mut reader = excisionfinder::Reader::new(&data[..]);
    ///
    /// let table = Table::try_from_reader(&mut reader, &Columns::default(), &[NucleaseId::SpCas9])?;
    ///
    /// assert_eq!(table.positions(), &[100, 250]);
    /// assert_eq!(
    ///     table.records_at(250)[0].effects(NucleaseId::SpCas9),
    ///     Effects::new(false, true, false)
    /// );
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_from_reader<T>(
        reader: &mut Reader<T>,
        columns: &Columns,
        nucleases: &[NucleaseId],
    ) -> Result<Self>
    where
        T: BufRead,
    {
        let header = reader.header().map_err(Error::Reader)?;

        let index_of = |name: &str| {
            header
                .iter()
                .position(|column| column == name)
                .ok_or_else(|| Error::MissingColumn(name.into()))
        };

        let position = index_of(POSITION_COLUMN)?;
        let reference = index_of(REFERENCE_COLUMN)?;
        let alternate = index_of(ALTERNATE_COLUMN)?;

        let mut flags = Vec::new();

        for nuclease in nucleases {
            for effect in Effect::ALL {
                let name = columns
                    .get(*nuclease, effect)
                    .ok_or_else(|| Error::MissingColumn(format!("{effect} ({nuclease})")))?;
                flags.push((*nuclease, effect, index_of(name)?));
            }
        }

        let mut records = Vec::new();

        for result in reader.records() {
            let (line_no, line) = result.map_err(Error::Reader)?;
            let fields = line.split(DELIMITER).collect::<Vec<_>>();

            if fields.len() != header.len() {
                return Err(Error::Parse(
                    ParseError::IncorrectNumberOfFields(header.len(), fields.len()),
                    line_no,
                ));
            }

            let pos = fields[position]
                .trim()
                .parse::<Number>()
                .map_err(|err| Error::Parse(ParseError::InvalidPosition(err), line_no))?;

            let mut record = Record::new(pos, fields[reference], fields[alternate]);

            for (nuclease, effect, i) in &flags {
                let value = parse_flag(fields[*i]).ok_or_else(|| {
                    Error::Parse(
                        ParseError::InvalidFlag(header[*i].clone(), fields[*i].into()),
                        line_no,
                    )
                })?;

                let mut effects = record.effects(*nuclease);
                effects.set(*effect, value);
                record = record.with_effects(*nuclease, effects);
            }

            records.push(record);
        }

        Ok(Self::from_records(records))
    }

    /// Gets the number of records.
    pub fn len(&self) -> usize {
        self.inner.values().map(Vec::len).sum()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Gets every position with at least one record, sorted ascending.
    pub fn positions(&self) -> &[Number] {
        &self.positions
    }

    /// Gets the records at a position.
    pub fn records_at(&self, position: Number) -> &[Record] {
        self.inner
            .get(&position)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Gets the subset of the table within the closed range `[start, end]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::variant::Record;
    /// use excisionfinder::variant::Table;
    ///
    /// let table = Table::from_records(vec![
    ///     Record::new(100, "A", "G"),
    ///     Record::new(200, "C", "T"),
    ///     Record::new(300, "G", "A"),
    /// ]);
    ///
    /// let subset = table.subset(150, 300);
    /// assert_eq!(subset.positions(), &[200, 300]);
    /// ```
    pub fn subset(&self, start: Number, end: Number) -> Self {
        let from = self.positions.partition_point(|position| *position < start);
        let to = self.positions.partition_point(|position| *position <= end);

        let positions = self.positions[from..to.max(from)].to_vec();
        let inner = positions
            .iter()
            .map(|position| (*position, self.inner[position].clone()))
            .collect();

        Self { inner, positions }
    }

    /// Keeps only the records at the given positions.
    pub fn retain_positions(&mut self, allowed: &HashSet<Number>) {
        self.inner.retain(|position, _| allowed.contains(position));
        self.positions.retain(|position| allowed.contains(position));
    }
}

/// Parses a boolean flag.
///
/// Accepts `true`/`false` in any case (and their `t`/`f` abbreviations) as
/// well as numbers, where anything other than zero is `true`. An empty field
/// is `false`.
fn parse_flag(value: &str) -> Option<bool> {
    let value = value.trim();

    if value.is_empty() {
        return Some(false);
    }

    match value.to_ascii_lowercase().as_str() {
        "true" | "t" => Some(true),
        "false" | "f" => Some(false),
        other => other.parse::<f64>().ok().map(|number| number != 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::Effects;

    const HEADER: &str = "chrom\tpos\tref\talt\tmakes_SaCas9\tbreaks_SaCas9\tvar_near_SaCas9";

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("True"), Some(true));
        assert_eq!(parse_flag("FALSE"), Some(false));
        assert_eq!(parse_flag("1.0"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag(""), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_missing_nuclease_column() {
        let data = format!("{HEADER}\n");
        let mut reader = Reader::new(data.as_bytes());

        let err = Table::try_from_reader(&mut reader, &Columns::default(), &[NucleaseId::SpCas9])
            .unwrap_err();
        assert_eq!(err.to_string(), "missing column: makes_SpCas9");
    }

    #[test]
    fn test_missing_mapping() {
        let data = format!("{HEADER}\n");
        let mut reader = Reader::new(data.as_bytes());

        let err = Table::try_from_reader(&mut reader, &Columns::empty(), &[NucleaseId::SaCas9])
            .unwrap_err();
        assert_eq!(err.to_string(), "missing column: makes (SaCas9)");
    }

    #[test]
    fn test_invalid_flag() {
        let data = format!("{HEADER}\nchr1\t100\tA\tG\tyes?\t0\t0\n");
        let mut reader = Reader::new(data.as_bytes());

        let err = Table::try_from_reader(&mut reader, &Columns::default(), &[NucleaseId::SaCas9])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "parse error on line 2: invalid flag in column makes_SaCas9: yes?"
        );
    }

    #[test]
    fn test_multiallelic_positions() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let data = format!(
            "{HEADER}\nchr1\t100\tA\tG\t1\t0\t0\nchr1\t100\tA\tT\t0\t1\t0\nchr1\t180\tC\tA\t0\t0\t1\n"
        );
        let mut reader = Reader::new(data.as_bytes());

        let table =
            Table::try_from_reader(&mut reader, &Columns::default(), &[NucleaseId::SaCas9])?;

        assert_eq!(table.len(), 3);
        assert!(table.records_at(101).is_empty());

        let records = table.records_at(100);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|record| record.reference() == "A"));
        assert_eq!(records[1].alternate(), "T");
        assert_eq!(
            records[1].effects(NucleaseId::SaCas9),
            Effects::new(false, true, false)
        );
        assert_eq!(
            table.records_at(180)[0].effects(NucleaseId::SaCas9),
            Effects::new(false, false, true)
        );

        Ok(())
    }

    #[test]
    fn test_retain_positions() {
        let mut table = Table::from_records(vec![
            Record::new(100, "A", "G"),
            Record::new(200, "C", "T"),
        ]);

        table.retain_positions(&HashSet::from([200]));

        assert_eq!(table.positions(), &[200]);
        assert!(table.records_at(100).is_empty());
        assert!(!table.is_empty());
    }
}
