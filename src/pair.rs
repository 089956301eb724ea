//! Deciding whether cutting at two positions excises coding sequence.

use omics::coordinate::position::Number;

use crate::gene::Structure;

pub mod combinations;

pub use combinations::Pairs;

/// An unordered pair of distinct positions, stored with the lower position
/// first.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Pair {
    /// The lower position.
    low: Number,

    /// The higher position.
    high: Number,
}

impl Pair {
    /// Creates a new pair from two positions in either order.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::pair::Pair;
    ///
    /// let pair = Pair::new(500, 80);
    /// assert_eq!(pair.low(), 80);
    /// assert_eq!(pair.high(), 500);
    /// assert_eq!(pair, Pair::new(80, 500));
    /// ```
    pub fn new(a: Number, b: Number) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    /// Gets the lower position.
    pub fn low(&self) -> Number {
        self.low
    }

    /// Gets the higher position.
    pub fn high(&self) -> Number {
        self.high
    }

    /// Gets the distance between the two positions.
    pub fn span(&self) -> Number {
        self.high - self.low
    }

    /// Whether cutting at both positions excises coding sequence from the
    /// gene (see [`is_targetable()`]).
    pub fn is_targetable(&self, structure: &Structure) -> bool {
        is_targetable(self.low, self.high, structure)
    }
}

impl std::fmt::Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.low, self.high)
    }
}

/// Whether cutting at both positions excises coding sequence from the gene.
///
/// This is the case when either position lies within a coding exon (a cut
/// there disrupts coding sequence directly) or when the first coding exon
/// that begins after the lower position begins at or before the higher
/// position (the excised segment spans it). The result does not depend on the
/// order of the arguments.
///
/// # Examples
///
/// ```
/// use excisionfinder::gene::Exon;
/// use excisionfinder::gene::Structure;
/// use excisionfinder::pair;
///
/// let exons = vec![
///     Exon::try_new(100, 150)?,
///     Exon::try_new(500, 560)?,
///     Exon::try_new(900, 1000)?,
/// ];
/// let structure = Structure::try_new("chr1", 100, 1000, exons)?;
///
/// // 100 is coding.
/// assert!(pair::is_targetable(80, 100, &structure));
///
/// // Both positions precede the first coding exon.
/// assert!(!pair::is_targetable(80, 90, &structure));
///
/// // The excised segment spans the first coding exon.
/// assert!(pair::is_targetable(80, 500, &structure));
/// assert!(pair::is_targetable(500, 80, &structure));
///
/// // Both positions sit within the same intron.
/// assert!(!pair::is_targetable(200, 400, &structure));
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn is_targetable(a: Number, b: Number, structure: &Structure) -> bool {
    let (low, high) = (a.min(b), a.max(b));

    if structure.is_coding(low) || structure.is_coding(high) {
        return true;
    }

    structure
        .next_coding_exon_start(low)
        .map(|start| high >= start)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::Exon;

    fn structure() -> Structure {
        let exons = vec![
            Exon::try_new(100, 150).unwrap(),
            Exon::try_new(500, 560).unwrap(),
            Exon::try_new(900, 1000).unwrap(),
        ];

        Structure::try_new("chr1", 100, 1000, exons).unwrap()
    }

    #[test]
    fn test_symmetry() {
        let structure = structure();

        for (a, b) in [(80, 90), (80, 100), (200, 400), (200, 600), (1100, 1200)] {
            assert_eq!(
                is_targetable(a, b, &structure),
                is_targetable(b, a, &structure)
            );
        }
    }

    #[test]
    fn test_positions_past_the_last_exon() {
        let structure = structure();

        assert!(!is_targetable(1100, 1200, &structure));
        assert!(is_targetable(1000, 1200, &structure));
        assert!(is_targetable(600, 1200, &structure));
    }

    #[test]
    fn test_spanning_an_interior_exon() {
        let structure = structure();

        assert!(is_targetable(200, 600, &structure));
        assert!(!is_targetable(200, 499, &structure));
        assert!(is_targetable(200, 500, &structure));
    }

    #[test]
    fn test_pair() {
        let structure = structure();
        let pair = Pair::new(600, 200);

        assert_eq!(pair.span(), 400);
        assert_eq!(pair.to_string(), "(200, 600)");
        assert!(pair.is_targetable(&structure));
    }
}
