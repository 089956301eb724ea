//! Enumerating targetable pairs of candidate positions.

use std::collections::HashSet;

use omics::coordinate::position::Number;

use crate::gene::Structure;
use crate::pair::Pair;

/// The set of targetable pairs within a gene.
#[derive(Clone, Debug, Default)]
pub struct Pairs {
    /// The pairs, sorted by their lower then higher position.
    pairs: Vec<Pair>,

    /// The pairs, for membership lookups.
    lookup: HashSet<Pair>,

    /// Every position participating in at least one pair, sorted ascending.
    positions: Vec<Number>,
}

impl Pairs {
    /// Enumerates every targetable pair of distinct candidate positions no
    /// more than `window` apart.
    ///
    /// The candidates need not be sorted or unique.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::gene::Exon;
    /// use excisionfinder::gene::Structure;
    /// use excisionfinder::pair::Pairs;
    ///
    /// let exons = vec![Exon::try_new(100, 150)?, Exon::try_new(500, 560)?];
    /// let structure = Structure::try_new("chr1", 100, 560, exons)?;
    ///
    /// let pairs = Pairs::generate([80, 90, 120], 10_000, &structure);
    ///
    /// // (80, 90) excises nothing.
    /// assert_eq!(pairs.len(), 2);
    /// assert!(!pairs.contains(90, 80));
    /// assert!(pairs.contains(120, 80));
    /// assert!(pairs.contains(90, 120));
    /// assert_eq!(pairs.positions(), &[80, 90, 120]);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn generate(
        candidates: impl IntoIterator<Item = Number>,
        window: Number,
        structure: &Structure,
    ) -> Self {
        let mut candidates = candidates.into_iter().collect::<Vec<_>>();
        candidates.sort_unstable();
        candidates.dedup();

        let mut pairs = Vec::new();

        for (i, low) in candidates.iter().enumerate() {
            for high in candidates[i + 1..]
                .iter()
                .take_while(|high| *high - low <= window)
            {
                let pair = Pair::new(*low, *high);

                if pair.is_targetable(structure) {
                    pairs.push(pair);
                }
            }
        }

        Self::from_pairs(pairs)
    }

    /// Creates a set of pairs directly.
    pub fn from_pairs(pairs: impl IntoIterator<Item = Pair>) -> Self {
        let mut pairs = pairs.into_iter().collect::<Vec<_>>();
        pairs.sort_unstable();
        pairs.dedup();

        let lookup = pairs.iter().copied().collect::<HashSet<_>>();

        let mut positions = pairs
            .iter()
            .flat_map(|pair| [pair.low(), pair.high()])
            .collect::<Vec<_>>();
        positions.sort_unstable();
        positions.dedup();

        Self {
            pairs,
            lookup,
            positions,
        }
    }

    /// Gets the number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Whether the two positions, in either order, form a targetable pair.
    pub fn contains(&self, a: Number, b: Number) -> bool {
        self.lookup.contains(&Pair::new(a, b))
    }

    /// Returns an iterator over the pairs, sorted by their lower then higher
    /// position.
    pub fn iter(&self) -> impl Iterator<Item = &Pair> {
        self.pairs.iter()
    }

    /// Gets every position participating in at least one pair, sorted
    /// ascending.
    pub fn positions(&self) -> &[Number] {
        &self.positions
    }

    /// Whether any two of the given positions, sorted ascending, form a
    /// targetable pair.
    ///
    /// Pairs are never wider than the window they were generated with, so
    /// only positions within `window` of each other are compared.
    pub fn any_within(&self, positions: &[Number], window: Number) -> bool {
        positions.iter().enumerate().any(|(i, low)| {
            positions[i + 1..]
                .iter()
                .take_while(|high| *high - low <= window)
                .any(|high| self.contains(*low, *high))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::Exon;

    fn structure() -> Structure {
        let exons = vec![
            Exon::try_new(20_000, 20_100).unwrap(),
            Exon::try_new(30_000, 30_100).unwrap(),
        ];

        Structure::try_new("chr1", 20_000, 30_100, exons).unwrap()
    }

    #[test]
    fn test_window_excludes_distant_pairs() {
        let structure = structure();

        // The two positions are 15 kb apart and span an exon.
        let pairs = Pairs::generate([10_000, 25_000], 10_000, &structure);
        assert!(pairs.is_empty());

        let pairs = Pairs::generate([10_000, 25_000], 20_000, &structure);
        assert_eq!(pairs.len(), 1);
        assert!(pairs.contains(25_000, 10_000));
    }

    #[test]
    fn test_window_is_inclusive() {
        let structure = structure();

        let pairs = Pairs::generate([15_000, 25_000], 10_000, &structure);
        assert!(pairs.contains(15_000, 25_000));
    }

    #[test]
    fn test_duplicates_are_ignored() {
        let structure = structure();

        let pairs = Pairs::generate([20_050, 20_050, 19_000], 10_000, &structure);
        assert_eq!(pairs.len(), 1);
        assert_eq!(
            pairs.iter().copied().collect::<Vec<_>>(),
            vec![Pair::new(19_000, 20_050)]
        );
    }

    #[test]
    fn test_any_within() {
        let structure = structure();
        let pairs = Pairs::generate([19_000, 19_500, 20_050, 25_000], 10_000, &structure);

        assert!(pairs.any_within(&[19_000, 20_050], 10_000));
        assert!(!pairs.any_within(&[19_000, 19_500], 10_000));
        assert!(!pairs.any_within(&[19_000], 10_000));
        assert!(!pairs.any_within(&[], 10_000));
    }
}
