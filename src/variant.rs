//! Variant targetability records.
//!
//! Each record describes one alternate allele at one position along with, for
//! every nuclease, whether that allele creates a recognition site
//! ([`Effect::Makes`]), destroys one present on the reference allele
//! ([`Effect::Breaks`]), or lies near one without altering it
//! ([`Effect::NearPam`]). These are computed upstream of this crate.

use std::collections::HashMap;

use omics::coordinate::position::Number;

use crate::nuclease::Effect;
use crate::nuclease::NucleaseId;
use crate::nuclease::Strictness;

pub mod table;

pub use table::Table;

/// The effects of one alternate allele on one nuclease's recognition sites.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Effects {
    /// Whether the alternate allele creates a recognition site.
    makes: bool,

    /// Whether the alternate allele destroys a recognition site.
    breaks: bool,

    /// Whether the variant is near a recognition site.
    near_pam: bool,
}

impl Effects {
    /// Creates a new set of effects.
    pub fn new(makes: bool, breaks: bool, near_pam: bool) -> Self {
        Self {
            makes,
            breaks,
            near_pam,
        }
    }

    /// Gets whether a particular effect is present.
    pub fn get(&self, effect: Effect) -> bool {
        match effect {
            Effect::Makes => self.makes,
            Effect::Breaks => self.breaks,
            Effect::NearPam => self.near_pam,
        }
    }

    /// Sets whether a particular effect is present.
    pub fn set(&mut self, effect: Effect, value: bool) {
        match effect {
            Effect::Makes => self.makes = value,
            Effect::Breaks => self.breaks = value,
            Effect::NearPam => self.near_pam = value,
        }
    }

    /// Maps these effects to the alleles that become differentially
    /// targetable.
    ///
    /// * A created site can only be cut on the haplotype carrying the
    ///   alternate allele.
    /// * A destroyed site can only be cut on the haplotype carrying the
    ///   reference allele.
    /// * A nearby variant (only considered when [`Strictness::Relaxed`]) is
    ///   assumed to allow targeting either allele.
    ///
    /// The conditions are independent and combine.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::nuclease::Strictness;
    /// use excisionfinder::variant::Effects;
    /// use excisionfinder::variant::Targets;
    ///
    /// let effects = Effects::new(true, false, false);
    /// assert_eq!(
    ///     effects.targets(Strictness::Strict),
    ///     Targets::new(true, false)
    /// );
    ///
    /// let effects = Effects::new(false, false, true);
    /// assert_eq!(effects.targets(Strictness::Strict), Targets::new(false, false));
    /// assert_eq!(effects.targets(Strictness::Relaxed), Targets::new(true, true));
    /// ```
    pub fn targets(&self, strictness: Strictness) -> Targets {
        let mut targets = Targets::default();

        if self.makes {
            targets.alternate = true;
        }

        if self.breaks {
            targets.reference = true;
        }

        if self.near_pam && strictness.includes(Effect::NearPam) {
            targets.alternate = true;
            targets.reference = true;
        }

        targets
    }
}

/// Which alleles at a heterozygous site a nuclease can cut differentially.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Targets {
    /// Whether the haplotype carrying the alternate allele is targetable.
    alternate: bool,

    /// Whether the haplotype carrying the reference allele is targetable.
    reference: bool,
}

impl Targets {
    /// Creates a new set of targets.
    pub fn new(alternate: bool, reference: bool) -> Self {
        Self {
            alternate,
            reference,
        }
    }

    /// Whether the haplotype carrying the alternate allele is targetable.
    pub fn alternate(&self) -> bool {
        self.alternate
    }

    /// Whether the haplotype carrying the reference allele is targetable.
    pub fn reference(&self) -> bool {
        self.reference
    }
}

/// A targetability record for one alternate allele at one position.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// The position.
    position: Number,

    /// The reference allele.
    reference: String,

    /// The alternate allele.
    alternate: String,

    /// The effects for each nuclease.
    effects: HashMap<NucleaseId, Effects>,
}

impl Record {
    /// Creates a new record with no effects for any nuclease.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::nuclease::NucleaseId;
    /// use excisionfinder::variant::Effects;
    /// use excisionfinder::variant::Record;
    ///
    /// let record = Record::new(100, "A", "G")
    ///     .with_effects(NucleaseId::SpCas9, Effects::new(true, false, false));
    ///
    /// assert_eq!(record.position(), 100);
    /// assert_eq!(record.reference(), "A");
    /// assert_eq!(record.alternate(), "G");
    /// assert_eq!(
    ///     record.effects(NucleaseId::SpCas9),
    ///     Effects::new(true, false, false)
    /// );
    /// assert_eq!(record.effects(NucleaseId::SaCas9), Effects::default());
    /// ```
    pub fn new(position: Number, reference: impl Into<String>, alternate: impl Into<String>) -> Self {
        Self {
            position,
            reference: reference.into(),
            alternate: alternate.into(),
            effects: HashMap::new(),
        }
    }

    /// Sets the effects for a nuclease.
    pub fn with_effects(mut self, nuclease: NucleaseId, effects: Effects) -> Self {
        self.effects.insert(nuclease, effects);
        self
    }

    /// Gets the position.
    pub fn position(&self) -> Number {
        self.position
    }

    /// Gets the reference allele.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Gets the alternate allele.
    pub fn alternate(&self) -> &str {
        &self.alternate
    }

    /// Gets the effects for a nuclease.
    ///
    /// A nuclease without recorded effects has none.
    pub fn effects(&self, nuclease: NucleaseId) -> Effects {
        self.effects.get(&nuclease).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_makes_and_breaks_combine() {
        let effects = Effects::new(true, true, false);
        assert_eq!(effects.targets(Strictness::Strict), Targets::new(true, true));
    }

    #[test]
    fn test_breaks_targets_reference_only() {
        let effects = Effects::new(false, true, false);
        let targets = effects.targets(Strictness::Relaxed);

        assert!(targets.reference());
        assert!(!targets.alternate());
    }

    #[test]
    fn test_effects_get_and_set() {
        let mut effects = Effects::default();
        effects.set(Effect::NearPam, true);

        assert!(effects.get(Effect::NearPam));
        assert!(!effects.get(Effect::Makes));
        assert_eq!(effects, Effects::new(false, false, true));
    }
}
