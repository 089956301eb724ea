//! The coding structure of a gene.
//!
//! A [`Structure`] is resolved once per gene from the exons of its canonical
//! transcript and the bounds of that transcript's coding sequence. Exons are
//! clipped to the coding sequence, so the structure only ever describes
//! translated sequence:
//!
//! ```text
//!            cds start                                   cds end
//!               v                                           v
//! ====[ exon 1 ]====[ exon 2 ]======[ exon 3 ]=====[ exon 4   ]====
//!         |-----|   |--------|      |--------|     |--------|
//!          coding     coding          coding         coding
//! ```
//!
//! All coordinates are closed ranges: an exon `[start, end]` includes both
//! `start` and `end`.

use nonempty::NonEmpty;
use omics::coordinate::position::Number;
use rust_lapper as lapper;

pub mod annotation;
pub mod builder;

pub use builder::Builder;

/// An error related to a [`Structure`].
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// An exon ends before it starts.
    InvalidExon(Number, Number),

    /// Two exons overlap each other.
    OverlappingExons(Exon, Exon),

    /// No exon overlaps the coding sequence, so the gene cannot be analyzed.
    NoCodingExons,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidExon(start, end) => {
                write!(f, "invalid exon: end ({end}) is before start ({start})")
            }
            Error::OverlappingExons(a, b) => write!(f, "overlapping exons: {a} and {b}"),
            Error::NoCodingExons => write!(f, "no coding exons"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// An exon spanning the closed range `[start, end]`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Exon {
    /// The first position within the exon.
    start: Number,

    /// The last position within the exon.
    end: Number,
}

impl Exon {
    /// Attempts to create a new [`Exon`].
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::gene::Exon;
    ///
    /// let exon = Exon::try_new(100, 150)?;
    /// assert_eq!(exon.start(), 100);
    /// assert_eq!(exon.end(), 150);
    /// assert_eq!(exon.len(), 51);
    ///
    /// assert!(Exon::try_new(150, 100).is_err());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(start: Number, end: Number) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidExon(start, end));
        }

        Ok(Self { start, end })
    }

    /// Gets the first position within the exon.
    pub fn start(&self) -> Number {
        self.start
    }

    /// Gets the last position within the exon.
    pub fn end(&self) -> Number {
        self.end
    }

    /// Gets the number of positions within the exon.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> Number {
        self.end - self.start + 1
    }

    /// Whether the exon contains the position.
    pub fn contains(&self, position: Number) -> bool {
        self.start <= position && position <= self.end
    }

    /// Clips the exon to `[start, end]`, returning [`None`] if nothing is left.
    fn clip(&self, start: Number, end: Number) -> Option<Self> {
        let start = self.start.max(start);
        let end = self.end.min(end);

        (start <= end).then_some(Self { start, end })
    }
}

impl std::fmt::Display for Exon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// The coding structure of a gene.
#[derive(Clone, Debug)]
pub struct Structure {
    /// The chromosome the gene sits on.
    chromosome: String,

    /// The coding exons, sorted by start position.
    coding_exons: NonEmpty<Exon>,

    /// The start positions of the coding exons, sorted ascending.
    coding_exon_starts: Vec<Number>,

    /// An interval lookup over the coding exons.
    ///
    /// The lapper works on half-open intervals, so each exon is stored as
    /// `[start, end + 1)`.
    lookup: lapper::Lapper<Number, usize>,
}

impl Structure {
    /// Attempts to resolve the coding structure of a transcript from its
    /// coding sequence bounds and its exons.
    ///
    /// Exons are sorted and clipped to `[coding_start, coding_end]`. In the
    /// usual case, this trims the start of the first exon and the end of the
    /// last exon while the interior exons pass through unchanged. Exons that
    /// fall entirely outside of the coding sequence are removed. A transcript
    /// where `coding_start >= coding_end` is non-coding.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::gene::Exon;
    /// use excisionfinder::gene::Structure;
    ///
    /// let exons = vec![
    ///     Exon::try_new(50, 150)?,
    ///     Exon::try_new(500, 560)?,
    ///     Exon::try_new(900, 1000)?,
    /// ];
    ///
    /// let structure = Structure::try_new("chr1", 100, 970, exons)?;
    /// assert_eq!(structure.coding_exon_starts(), &[100, 500, 900]);
    /// assert_eq!(structure.coding_exons().last().end(), 970);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(
        chromosome: impl Into<String>,
        coding_start: Number,
        coding_end: Number,
        exons: impl IntoIterator<Item = Exon>,
    ) -> Result<Self> {
        if coding_start >= coding_end {
            return Err(Error::NoCodingExons);
        }

        let mut exons = exons.into_iter().collect::<Vec<_>>();
        exons.sort();

        for window in exons.windows(2) {
            if window[1].start <= window[0].end {
                return Err(Error::OverlappingExons(window[0], window[1]));
            }
        }

        let coding = exons
            .iter()
            .filter_map(|exon| exon.clip(coding_start, coding_end))
            .collect::<Vec<_>>();

        let coding_exons = NonEmpty::from_vec(coding).ok_or(Error::NoCodingExons)?;
        let coding_exon_starts = coding_exons.iter().map(Exon::start).collect::<Vec<_>>();

        let lookup = lapper::Lapper::new(
            coding_exons
                .iter()
                .enumerate()
                .map(|(i, exon)| lapper::Interval {
                    start: exon.start,
                    stop: exon.end + 1,
                    val: i,
                })
                .collect(),
        );

        Ok(Self {
            chromosome: chromosome.into(),
            coding_exons,
            coding_exon_starts,
            lookup,
        })
    }

    /// Gets the chromosome the gene sits on.
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    /// Gets the coding exons, sorted by start position.
    pub fn coding_exons(&self) -> &NonEmpty<Exon> {
        &self.coding_exons
    }

    /// Gets the start positions of the coding exons, sorted ascending.
    pub fn coding_exon_starts(&self) -> &[Number] {
        &self.coding_exon_starts
    }

    /// Whether the position lies within a coding exon.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::gene::Exon;
    /// use excisionfinder::gene::Structure;
    ///
    /// let exons = vec![Exon::try_new(100, 150)?, Exon::try_new(500, 560)?];
    /// let structure = Structure::try_new("chr1", 100, 560, exons)?;
    ///
    /// assert!(structure.is_coding(100));
    /// assert!(structure.is_coding(150));
    /// assert!(!structure.is_coding(151));
    /// assert!(structure.is_coding(560));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn is_coding(&self, position: Number) -> bool {
        self.lookup
            .find(position, position.saturating_add(1))
            .next()
            .is_some()
    }

    /// Gets the start of the first coding exon that begins strictly after the
    /// position, if there is one.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::gene::Exon;
    /// use excisionfinder::gene::Structure;
    ///
    /// let exons = vec![Exon::try_new(100, 150)?, Exon::try_new(500, 560)?];
    /// let structure = Structure::try_new("chr1", 100, 560, exons)?;
    ///
    /// assert_eq!(structure.next_coding_exon_start(80), Some(100));
    /// assert_eq!(structure.next_coding_exon_start(100), Some(500));
    /// assert_eq!(structure.next_coding_exon_start(500), None);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn next_coding_exon_start(&self, position: Number) -> Option<Number> {
        let i = self
            .coding_exon_starts
            .partition_point(|start| *start <= position);

        self.coding_exon_starts.get(i).copied()
    }

    /// Returns an iterator over every coding position, in ascending order.
    pub fn coding_positions(&self) -> impl Iterator<Item = Number> + '_ {
        self.coding_exons
            .iter()
            .flat_map(|exon| exon.start..=exon.end)
    }

    /// Gets the number of coding positions.
    pub fn coding_position_count(&self) -> Number {
        self.coding_exons.iter().map(Exon::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exons(ranges: &[(Number, Number)]) -> Vec<Exon> {
        ranges
            .iter()
            .map(|(start, end)| Exon::try_new(*start, *end).unwrap())
            .collect()
    }

    #[test]
    fn test_first_and_last_exons_are_clipped() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let structure = Structure::try_new(
            "chr1",
            120,
            940,
            exons(&[(900, 970), (100, 150), (500, 560)]),
        )?;

        let coding = structure.coding_exons().iter().copied().collect::<Vec<_>>();
        assert_eq!(coding, exons(&[(120, 150), (500, 560), (900, 940)]));
        assert_eq!(structure.coding_exon_starts(), &[120, 500, 900]);
        assert_eq!(structure.chromosome(), "chr1");

        Ok(())
    }

    #[test]
    fn test_single_exon_is_clipped_on_both_ends(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let structure = Structure::try_new("chr1", 110, 130, exons(&[(100, 150)]))?;

        assert_eq!(structure.coding_exons().len(), 1);
        assert_eq!(*structure.coding_exons().first(), Exon::try_new(110, 130)?);

        Ok(())
    }

    #[test]
    fn test_untranslated_exons_are_dropped() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let structure = Structure::try_new(
            "chr1",
            500,
            560,
            exons(&[(100, 150), (500, 560), (900, 970)]),
        )?;

        assert_eq!(structure.coding_exon_starts(), &[500]);
        assert!(!structure.is_coding(120));

        Ok(())
    }

    #[test]
    fn test_coding_positions_match_exon_lengths(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let structure = Structure::try_new(
            "chr1",
            100,
            970,
            exons(&[(100, 150), (500, 560), (900, 970)]),
        )?;

        let positions = structure.coding_positions().collect::<Vec<_>>();
        assert_eq!(positions.len() as Number, structure.coding_position_count());
        assert_eq!(structure.coding_position_count(), 51 + 61 + 71);

        for start in structure.coding_exon_starts() {
            assert!(structure.is_coding(*start));
        }

        assert!(positions.iter().all(|position| structure.is_coding(*position)));
        assert!(!structure.is_coding(99));
        assert!(!structure.is_coding(971));

        Ok(())
    }

    #[test]
    fn test_no_coding_exons() {
        let err = Structure::try_new("chr1", 100, 100, exons(&[(50, 150)])).unwrap_err();
        assert_eq!(err, Error::NoCodingExons);

        let err = Structure::try_new("chr1", 200, 300, exons(&[(50, 150)])).unwrap_err();
        assert_eq!(err.to_string(), "no coding exons");

        let err = Structure::try_new("chr1", 200, 300, Vec::new()).unwrap_err();
        assert_eq!(err, Error::NoCodingExons);
    }

    #[test]
    fn test_overlapping_exons() {
        let err = Structure::try_new("chr1", 100, 300, exons(&[(100, 200), (150, 300)])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "overlapping exons: [100, 200] and [150, 300]"
        );
    }

    #[test]
    fn test_invalid_exon() {
        let err = Exon::try_new(10, 5).unwrap_err();
        assert_eq!(err.to_string(), "invalid exon: end (5) is before start (10)");
    }
}
