//! A line-oriented reader for the tab-delimited tables consumed by the crate.
//!
//! Gene annotations, variant targetability tables, and phased genotype tables
//! are all tab-delimited text. This reader handles the parts they share: line
//! endings, blank lines, `#` comments, and tracking line numbers so parse
//! errors can point back at the input.

use std::io::BufRead;
use std::io::{self};
use std::iter;

/// The new line character.
const NEW_LINE: char = '\n';

/// The carriage return character.
const CARRIAGE_RETURN: char = '\r';

/// The prefix of a comment line.
pub const COMMENT_PREFIX: char = '#';

/// The delimiter between fields within a line.
pub const DELIMITER: char = '\t';

/// An error related to a [`Reader`].
#[derive(Debug)]
pub enum Error {
    /// An I/O error.
    Io(io::Error),

    /// The input ended before a header line was found.
    MissingHeader,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "i/o error: {err}"),
            Error::MissingHeader => write!(f, "missing header line"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// A tab-delimited table reader.
#[derive(Clone, Debug)]
pub struct Reader<T>
where
    T: BufRead,
{
    /// The inner reader.
    inner: T,

    /// The number of lines read so far.
    line_no: usize,
}

impl<T> Reader<T>
where
    T: BufRead,
{
    /// Creates a table reader.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"pos\tHG00096\n100\tA|G\n";
    /// let reader = excisionfinder::Reader::new(&data[..]);
    /// assert_eq!(reader.line_no(), 0);
    /// ```
    pub fn new(inner: T) -> Self {
        Self::from(inner)
    }

    /// Gets a reference to the inner reader.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Consumes self and returns the inner reader.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Gets the number of lines read so far.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Reads a raw, textual line from the underlying reader.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io;
    ///
    /// let data = b"pos\tHG00096\r\n100\tA|G";
    /// let mut reader = excisionfinder::Reader::new(&data[..]);
    ///
    /// let mut buffer = String::new();
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 13);
    /// assert_eq!(buffer, "pos\tHG00096");
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 7);
    /// assert_eq!(buffer, "100\tA|G");
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 0);
    /// assert_eq!(reader.line_no(), 2);
    ///
    /// # Ok::<(), io::Error>(())
    /// ```
    pub fn read_line_raw(&mut self, buffer: &mut String) -> io::Result<usize> {
        let read = read_line(&mut self.inner, buffer)?;

        if read > 0 {
            self.line_no += 1;
        }

        Ok(read)
    }

    /// Reads the header line and splits it into column names.
    ///
    /// Blank lines before the header are skipped and a single leading `#` is
    /// stripped from the header itself.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"\n#pos\tHG00096\tHG00097\n100\tA|G\tA|A\n";
    /// let mut reader = excisionfinder::Reader::new(&data[..]);
    ///
    /// let header = reader.header()?;
    /// assert_eq!(header, vec!["pos", "HG00096", "HG00097"]);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn header(&mut self) -> Result<Vec<String>> {
        let mut buffer = String::new();

        loop {
            match self.read_line_raw(&mut buffer).map_err(Error::Io)? {
                0 => return Err(Error::MissingHeader),
                _ if buffer.trim().is_empty() => continue,
                _ => {
                    let line = buffer.strip_prefix(COMMENT_PREFIX).unwrap_or(&buffer);
                    return Ok(line.split(DELIMITER).map(String::from).collect());
                }
            }
        }
    }

    /// Returns an iterator over the data lines in the underlying reader along
    /// with their line numbers.
    ///
    /// Blank lines and comment lines are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"# comment\n100\tA|G\n\n200\tC|C\n";
    /// let mut reader = excisionfinder::Reader::new(&data[..]);
    ///
    /// let records = reader.records().collect::<Result<Vec<_>, _>>()?;
    /// assert_eq!(
    ///     records,
    ///     vec![(2, String::from("100\tA|G")), (4, String::from("200\tC|C"))]
    /// );
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn records(&mut self) -> impl Iterator<Item = Result<(usize, String)>> + '_ {
        let mut buffer = String::new();

        iter::from_fn(move || loop {
            match self.read_line_raw(&mut buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    if buffer.trim().is_empty() || buffer.starts_with(COMMENT_PREFIX) {
                        continue;
                    }

                    return Some(Ok((self.line_no, buffer.clone())));
                }
                Err(err) => return Some(Err(Error::Io(err))),
            }
        })
    }
}

impl<T> From<T> for Reader<T>
where
    T: BufRead,
{
    fn from(inner: T) -> Self {
        Self { inner, line_no: 0 }
    }
}

/// Reads a line from a buffered reader.
///
/// This method is copied almost directly from noodles-gtf.
fn read_line<T>(reader: &mut T, buffer: &mut String) -> io::Result<usize>
where
    T: BufRead,
{
    buffer.clear();

    match reader.read_line(buffer) {
        Ok(0) => Ok(0),
        Ok(n) => {
            if buffer.ends_with(NEW_LINE) {
                buffer.pop();

                if buffer.ends_with(CARRIAGE_RETURN) {
                    buffer.pop();
                }
            }

            Ok(n)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_read_line() {
        let data = b"hello\r\nworld!";
        let mut cursor = io::Cursor::new(data);

        let mut buffer = String::new();
        let len = read_line(&mut cursor, &mut buffer).unwrap();
        assert_eq!(buffer, "hello");
        assert_eq!(len, 7);

        let len = read_line(&mut cursor, &mut buffer).unwrap();
        assert_eq!(buffer, "world!");
        assert_eq!(len, 6);
    }

    #[test]
    fn test_missing_header() {
        let data = b"\n\n";
        let mut reader = Reader::new(&data[..]);

        let err = reader.header().unwrap_err();
        assert_eq!(err.to_string(), "missing header line");
    }

    #[test]
    fn test_records_track_line_numbers_after_header()
    -> std::result::Result<(), Box<dyn std::error::Error>> {
        let data = b"pos\tHG00096\n100\tA|G\n# skipped\n300\tT|A";
        let mut reader = Reader::new(&data[..]);

        reader.header()?;
        let records = reader.records().collect::<Result<Vec<_>>>()?;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, 2);
        assert_eq!(records[1], (4, String::from("300\tT|A")));

        Ok(())
    }
}
