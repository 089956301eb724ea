//! The mapping from a nuclease and effect to a targetability table column.

use std::collections::HashMap;

use crate::nuclease::Effect;
use crate::nuclease::NucleaseId;

/// The column name prefix for [`Effect::Makes`].
const MAKES_PREFIX: &str = "makes_";

/// The column name prefix for [`Effect::Breaks`].
const BREAKS_PREFIX: &str = "breaks_";

/// The column name prefix for [`Effect::NearPam`].
const NEAR_PAM_PREFIX: &str = "var_near_";

/// Maps each `(nuclease, effect)` combination to the name of the column that
/// holds it in a targetability table.
///
/// The [`Default`] mapping follows the `makes_<nuclease>`,
/// `breaks_<nuclease>`, and `var_near_<nuclease>` convention. Individual
/// entries can be overridden with [`Columns::with()`] when a table is laid out
/// differently.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Columns {
    /// The inner mapping.
    inner: HashMap<(NucleaseId, Effect), String>,
}

impl Columns {
    /// Creates an empty mapping.
    pub fn empty() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    /// Sets the column for a `(nuclease, effect)` combination.
    ///
    /// # Examples
    ///
    /// ```
    /// use excisionfinder::nuclease::Columns;
    /// use excisionfinder::nuclease::Effect;
    /// use excisionfinder::nuclease::NucleaseId;
    ///
    /// let columns = Columns::default().with(NucleaseId::SpCas9, Effect::Makes, "creates_spcas9");
    ///
    /// assert_eq!(
    ///     columns.get(NucleaseId::SpCas9, Effect::Makes),
    ///     Some("creates_spcas9")
    /// );
    /// assert_eq!(
    ///     columns.get(NucleaseId::SpCas9, Effect::Breaks),
    ///     Some("breaks_SpCas9")
    /// );
    /// ```
    pub fn with(mut self, nuclease: NucleaseId, effect: Effect, column: impl Into<String>) -> Self {
        self.inner.insert((nuclease, effect), column.into());
        self
    }

    /// Gets the column for a `(nuclease, effect)` combination.
    pub fn get(&self, nuclease: NucleaseId, effect: Effect) -> Option<&str> {
        self.inner.get(&(nuclease, effect)).map(String::as_str)
    }
}

impl Default for Columns {
    fn default() -> Self {
        let mut columns = Self::empty();

        for nuclease in NucleaseId::ALL {
            for effect in Effect::ALL {
                let prefix = match effect {
                    Effect::Makes => MAKES_PREFIX,
                    Effect::Breaks => BREAKS_PREFIX,
                    Effect::NearPam => NEAR_PAM_PREFIX,
                };

                columns = columns.with(nuclease, effect, format!("{prefix}{nuclease}"));
            }
        }

        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_columns_follow_naming_convention() {
        let columns = Columns::default();

        assert_eq!(
            columns.get(NucleaseId::SaCas9Kkh, Effect::NearPam),
            Some("var_near_SaCas9_KKH")
        );
        assert_eq!(columns.get(NucleaseId::Cpf1, Effect::Makes), Some("makes_cpf1"));
        assert_eq!(
            columns.get(NucleaseId::CjCas9, Effect::Breaks),
            Some("breaks_cjCas9")
        );
    }

    #[test]
    fn test_empty_columns() {
        assert_eq!(Columns::empty().get(NucleaseId::SpCas9, Effect::Makes), None);
    }
}
