//! A builder for a gene [`Structure`].

use omics::coordinate::position::Number;

use crate::gene;
use crate::gene::Exon;
use crate::gene::Structure;

/// An error that occurs when a required field was never provided to the
/// [`Builder`].
#[derive(Debug, Eq, PartialEq)]
pub enum MissingError {
    /// No chromosome was provided to the [`Builder`].
    Chromosome,

    /// No coding region was provided to the [`Builder`].
    CodingRegion,
}

impl std::fmt::Display for MissingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingError::Chromosome => write!(f, "chromosome"),
            MissingError::CodingRegion => write!(f, "coding region"),
        }
    }
}

impl std::error::Error for MissingError {}

/// An error that occurs when a singular field was provided multiple times to
/// the [`Builder`].
#[derive(Debug, Eq, PartialEq)]
pub enum MultipleError {
    /// The chromosome was provided multiple times to the [`Builder`].
    Chromosome,

    /// The coding region was provided multiple times to the [`Builder`].
    CodingRegion,
}

impl std::fmt::Display for MultipleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MultipleError::Chromosome => write!(f, "chromosome"),
            MultipleError::CodingRegion => write!(f, "coding region"),
        }
    }
}

impl std::error::Error for MultipleError {}

/// An error related to a [`Builder`].
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// An error where a required field was never provided to the [`Builder`].
    Missing(MissingError),

    /// An error where a singular field was provided to the [`Builder`] more
    /// than once.
    Multiple(MultipleError),

    /// The provided fields did not describe a valid [`Structure`].
    Structure(gene::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Missing(err) => write!(f, "missing required field: {err}"),
            Error::Multiple(err) => write!(f, "singular field set multiple times: {err}"),
            Error::Structure(err) => write!(f, "invalid gene structure: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// A builder for a [`Structure`].
#[derive(Debug, Default)]
pub struct Builder {
    /// The chromosome.
    chromosome: Option<String>,

    /// The start and end of the coding sequence.
    coding_region: Option<(Number, Number)>,

    /// The exons of the transcript.
    exons: Vec<Exon>,
}

impl Builder {
    /// Sets the chromosome for the [`Builder`].
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::gene::Builder;
    ///
    /// let builder = Builder::default().chromosome("chr7")?;
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn chromosome(mut self, chromosome: impl Into<String>) -> Result<Self> {
        if self.chromosome.is_some() {
            return Err(Error::Multiple(MultipleError::Chromosome));
        }

        self.chromosome = Some(chromosome.into());
        Ok(self)
    }

    /// Sets the start and end of the coding sequence for the [`Builder`].
    pub fn coding_region(mut self, start: Number, end: Number) -> Result<Self> {
        if self.coding_region.is_some() {
            return Err(Error::Multiple(MultipleError::CodingRegion));
        }

        self.coding_region = Some((start, end));
        Ok(self)
    }

    /// Pushes an [`Exon`] into the [`Builder`].
    pub fn push_exon(mut self, exon: Exon) -> Self {
        self.exons.push(exon);
        self
    }

    /// Consumes `self` to attempt to build a [`Structure`].
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::gene::Builder;
    /// use excisionfinder::gene::Exon;
    ///
    /// let structure = Builder::default()
    ///     .chromosome("chr7")?
    ///     .coding_region(120, 940)?
    ///     .push_exon(Exon::try_new(100, 150)?)
    ///     .push_exon(Exon::try_new(500, 560)?)
    ///     .push_exon(Exon::try_new(900, 970)?)
    ///     .try_build()?;
    ///
    /// assert_eq!(structure.coding_exon_starts(), &[120, 500, 900]);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_build(self) -> Result<Structure> {
        let chromosome = self
            .chromosome
            .ok_or(Error::Missing(MissingError::Chromosome))?;

        let (start, end) = self
            .coding_region
            .ok_or(Error::Missing(MissingError::CodingRegion))?;

        Structure::try_new(chromosome, start, end, self.exons).map_err(Error::Structure)
    }
}
