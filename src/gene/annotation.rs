//! Gene annotation records and canonical transcript selection.
//!
//! Annotations are tab-delimited, one transcript per line, with the columns
//!
//! ```text
//! name  chrom  txStart  txEnd  cdsStart  cdsEnd  exonCount  exonStarts  exonEnds  gene_name  size
//! ```
//!
//! where `exonStarts` and `exonEnds` are comma-separated lists (usually with a
//! trailing comma) and `size` is the length of the transcript. The first line
//! of a file is a header and is skipped.

use std::io::BufRead;
use std::num::ParseIntError;
use std::str::FromStr;

use omics::coordinate::position::Number;

use crate::gene;
use crate::gene::Builder;
use crate::gene::Exon;
use crate::gene::Structure;
use crate::reader;
use crate::reader::Reader;
use crate::reader::DELIMITER;

/// The delimiter between entries of an exon list.
const EXON_LIST_DELIMITER: char = ',';

/// The number of expected fields in an annotation record.
pub const NUM_ANNOTATION_FIELDS: usize = 11;

/// An error associated with parsing an annotation record.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// An incorrect number of fields in the annotation line.
    IncorrectNumberOfFields(usize),

    /// A coordinate or count field could not be parsed.
    InvalidNumber(&'static str, ParseIntError),

    /// The number of exon starts, exon ends, and the exon count disagree.
    ExonCountMismatch(usize, usize, usize),

    /// An exon was malformed.
    InvalidExon(gene::Error),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IncorrectNumberOfFields(n) => write!(
                f,
                "invalid number of fields in annotation: expected {NUM_ANNOTATION_FIELDS} fields, \
                 found {n} fields"
            ),
            ParseError::InvalidNumber(field, err) => write!(f, "invalid {field}: {err}"),
            ParseError::ExonCountMismatch(count, starts, ends) => write!(
                f,
                "exon count mismatch: exonCount is {count}, found {starts} starts and {ends} ends"
            ),
            ParseError::InvalidExon(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// An error related to reading annotation records.
#[derive(Debug)]
pub enum Error {
    /// An error from the underlying reader.
    Reader(reader::Error),

    /// A record could not be parsed on the given line.
    Parse(ParseError, usize),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Reader(err) => write!(f, "reader error: {err}"),
            Error::Parse(err, line_no) => write!(f, "parse error on line {line_no}: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A transcript annotation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// The transcript name.
    name: String,

    /// The chromosome.
    chromosome: String,

    /// The transcript start.
    transcript_start: Number,

    /// The transcript end.
    transcript_end: Number,

    /// The coding sequence start.
    coding_start: Number,

    /// The coding sequence end.
    coding_end: Number,

    /// The exons.
    exons: Vec<Exon>,

    /// The gene name.
    gene_name: String,

    /// The size of the transcript.
    size: Number,
}

impl Record {
    /// Gets the transcript name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the chromosome.
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    /// Gets the transcript start.
    pub fn transcript_start(&self) -> Number {
        self.transcript_start
    }

    /// Gets the transcript end.
    pub fn transcript_end(&self) -> Number {
        self.transcript_end
    }

    /// Gets the coding sequence start.
    pub fn coding_start(&self) -> Number {
        self.coding_start
    }

    /// Gets the coding sequence end.
    pub fn coding_end(&self) -> Number {
        self.coding_end
    }

    /// Gets the exons.
    pub fn exons(&self) -> &[Exon] {
        &self.exons
    }

    /// Gets the gene name.
    pub fn gene_name(&self) -> &str {
        &self.gene_name
    }

    /// Gets the size of the transcript.
    pub fn size(&self) -> Number {
        self.size
    }

    /// Gets the region in which variants are considered for this transcript:
    /// the transcript itself, extended by `padding` on both sides.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::gene::annotation::Record;
    ///
    /// let record = "NM_1\tchr1\t100\t1000\t120\t940\t2\t100,900,\t150,1000,\tGENE\t900"
    ///     .parse::<Record>()?;
    ///
    /// assert_eq!(record.region(50), (50, 1050));
    /// assert_eq!(record.region(500), (0, 1500));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn region(&self, padding: Number) -> (Number, Number) {
        (
            self.transcript_start.saturating_sub(padding),
            self.transcript_end.saturating_add(padding),
        )
    }

    /// Attempts to resolve the coding [`Structure`] of this transcript.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::gene::annotation::Record;
    ///
    /// let record = "NM_1\tchr1\t100\t1000\t120\t940\t2\t100,900,\t150,1000,\tGENE\t900"
    ///     .parse::<Record>()?;
    ///
    /// let structure = record.structure()?;
    /// assert_eq!(structure.coding_exon_starts(), &[120, 900]);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn structure(&self) -> Result<Structure, gene::builder::Error> {
        self.exons
            .iter()
            .fold(
                Builder::default()
                    .chromosome(self.chromosome.clone())?
                    .coding_region(self.coding_start, self.coding_end)?,
                |builder, exon| builder.push_exon(*exon),
            )
            .try_build()
    }
}

impl FromStr for Record {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s.split(DELIMITER).collect::<Vec<_>>();

        if fields.len() != NUM_ANNOTATION_FIELDS {
            return Err(ParseError::IncorrectNumberOfFields(fields.len()));
        }

        let number = |field: &'static str, value: &str| {
            value
                .trim()
                .parse::<Number>()
                .map_err(|err| ParseError::InvalidNumber(field, err))
        };

        let list = |field: &'static str, value: &str| {
            value
                .split(EXON_LIST_DELIMITER)
                .filter(|entry| !entry.trim().is_empty())
                .map(|entry| number(field, entry))
                .collect::<Result<Vec<_>, _>>()
        };

        let exon_count = fields[6]
            .trim()
            .parse::<usize>()
            .map_err(|err| ParseError::InvalidNumber("exonCount", err))?;
        let starts = list("exonStarts", fields[7])?;
        let ends = list("exonEnds", fields[8])?;

        if starts.len() != exon_count || ends.len() != exon_count {
            return Err(ParseError::ExonCountMismatch(
                exon_count,
                starts.len(),
                ends.len(),
            ));
        }

        let exons = starts
            .into_iter()
            .zip(ends)
            .map(|(start, end)| Exon::try_new(start, end))
            .collect::<Result<Vec<_>, _>>()
            .map_err(ParseError::InvalidExon)?;

        Ok(Record {
            name: fields[0].into(),
            chromosome: fields[1].into(),
            transcript_start: number("txStart", fields[2])?,
            transcript_end: number("txEnd", fields[3])?,
            coding_start: number("cdsStart", fields[4])?,
            coding_end: number("cdsEnd", fields[5])?,
            exons,
            gene_name: fields[9].into(),
            size: number("size", fields[10])?,
        })
    }
}

/// Reads every annotation record, skipping the header line.
///
/// # Examples
///
/// ```
/// use excisionfinder::gene::annotation;
///
/// let data = b"name\tchrom\ttxStart\ttxEnd\tcdsStart\tcdsEnd\texonCount\texonStarts\texonEnds\tgene_name\tsize\n\
///              NM_1\tchr1\t100\t1000\t120\t940\t2\t100,900,\t150,1000,\tGENE\t900\n";
/// let mut reader = excisionfinder::Reader::new(&data[..]);
///
/// let records = annotation::read_all(&mut reader)?;
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].gene_name(), "GENE");
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn read_all<T>(reader: &mut Reader<T>) -> Result<Vec<Record>, Error>
where
    T: BufRead,
{
    reader.header().map_err(Error::Reader)?;

    reader
        .records()
        .map(|result| {
            let (line_no, line) = result.map_err(Error::Reader)?;
            line.parse::<Record>()
                .map_err(|err| Error::Parse(err, line_no))
        })
        .collect()
}

/// Selects the canonical transcript for a gene: the largest transcript with
/// that gene name. The first of equally sized transcripts wins.
///
/// # Examples
///
/// ```
/// use excisionfinder::gene::annotation;
/// use excisionfinder::gene::annotation::Record;
///
/// let records = [
///     "NM_1\tchr1\t100\t1000\t120\t940\t2\t100,900,\t150,1000,\tGENE\t900",
///     "NM_2\tchr1\t100\t2000\t120\t940\t2\t100,900,\t150,1000,\tGENE\t1900",
///     "NM_3\tchr1\t100\t3000\t120\t940\t2\t100,900,\t150,1000,\tOTHER\t2900",
/// ]
/// .iter()
/// .map(|line| line.parse::<Record>())
/// .collect::<Result<Vec<_>, _>>()?;
///
/// let canonical = annotation::canonical(&records, "GENE").unwrap();
/// assert_eq!(canonical.name(), "NM_2");
/// assert!(annotation::canonical(&records, "MISSING").is_none());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn canonical<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    gene_name: &str,
) -> Option<&'a Record> {
    records
        .into_iter()
        .filter(|record| record.gene_name == gene_name)
        .fold(None, |best: Option<&Record>, record| match best {
            Some(best) if best.size >= record.size => Some(best),
            _ => Some(record),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "NM_000546\tchr17\t7571719\t7590868\t7572926\t7579912\t3\t\
                        7571719,7577498,7579838,\t7573008,7577608,7579940,\tTP53\t19149";

    #[test]
    fn test_parsing_annotation_record() -> Result<(), Box<dyn std::error::Error>> {
        let record = LINE.parse::<Record>()?;

        assert_eq!(record.name(), "NM_000546");
        assert_eq!(record.chromosome(), "chr17");
        assert_eq!(record.transcript_start(), 7571719);
        assert_eq!(record.transcript_end(), 7590868);
        assert_eq!(record.coding_start(), 7572926);
        assert_eq!(record.coding_end(), 7579912);
        assert_eq!(record.exons().len(), 3);
        assert_eq!(record.exons()[1], Exon::try_new(7577498, 7577608)?);
        assert_eq!(record.gene_name(), "TP53");
        assert_eq!(record.size(), 19149);

        let structure = record.structure()?;
        assert_eq!(
            structure.coding_exon_starts(),
            &[7572926, 7577498, 7579838]
        );
        assert_eq!(structure.coding_exons().last().end(), 7579912);

        Ok(())
    }

    #[test]
    fn test_invalid_number_of_fields() {
        let err = "NM_1\tchr1\t100".parse::<Record>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid number of fields in annotation: expected 11 fields, found 3 fields"
        );
    }

    #[test]
    fn test_invalid_coordinate() {
        let err = "NM_1\tchr1\t?\t1000\t120\t940\t2\t100,900,\t150,1000,\tGENE\t900"
            .parse::<Record>()
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid txStart: invalid digit found in string");
    }

    #[test]
    fn test_exon_count_mismatch() {
        let err = "NM_1\tchr1\t100\t1000\t120\t940\t3\t100,900,\t150,1000,\tGENE\t900"
            .parse::<Record>()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "exon count mismatch: exonCount is 3, found 2 starts and 2 ends"
        );
    }

    #[test]
    fn test_noncoding_transcript_has_no_structure() -> Result<(), Box<dyn std::error::Error>> {
        let record = "NR_1\tchr1\t100\t1000\t1000\t1000\t2\t100,900,\t150,1000,\tLNC\t900"
            .parse::<Record>()?;

        let err = record.structure().unwrap_err();
        assert_eq!(
            err,
            gene::builder::Error::Structure(gene::Error::NoCodingExons)
        );

        Ok(())
    }

    #[test]
    fn test_read_all_reports_line_numbers() {
        let data = format!("#header\n{LINE}\nNM_1\tchr1\n");
        let mut reader = Reader::new(data.as_bytes());

        let err = read_all(&mut reader).unwrap_err();
        assert_eq!(
            err.to_string(),
            "parse error on line 3: invalid number of fields in annotation: expected 11 fields, \
             found 2 fields"
        );
    }
}
