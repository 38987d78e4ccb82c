use crate::record::{Buildable, FieldKind, FieldValue};
use crate::ExtractError;
use thiserror::Error;

/// Produces the value of exactly one field from an extraction context
pub type Extractor<C> = fn(&C) -> Result<FieldValue, ExtractError>;

/// Errors that can occur while assembling a record
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Field '{0}' is bound more than once in one build plan")]
    DuplicateBinding(&'static str),

    #[error("Extractor for '{field}' produced a {found:?} value, the field holds {expected:?}")]
    KindMismatch {
        field: &'static str,
        expected: FieldKind,
        found: FieldKind,
    },

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Field name → extractor bindings over a context type `C`
///
/// Plans are layered with [`BuildPlan::overlay`]: the overlay's binding for a
/// field replaces the base binding. Binding one field twice within the same
/// layer is a mistake, not an override; it is remembered and reported by
/// [`BuildPlan::build`].
pub struct BuildPlan<C> {
    bindings: Vec<(&'static str, Extractor<C>)>,
    duplicates: Vec<&'static str>,
}

impl<C> Default for BuildPlan<C> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
            duplicates: Vec::new(),
        }
    }
}

impl<C> BuildPlan<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `extractor` to `field`
    pub fn bind(mut self, field: &'static str, extractor: Extractor<C>) -> Self {
        if self.position(field).is_some() {
            self.duplicates.push(field);
        } else {
            self.bindings.push((field, extractor));
        }
        self
    }

    /// Layers `overlay` on top of this plan
    pub fn overlay(mut self, overlay: BuildPlan<C>) -> Self {
        for (field, extractor) in overlay.bindings {
            match self.position(field) {
                Some(index) => self.bindings[index].1 = extractor,
                None => self.bindings.push((field, extractor)),
            }
        }
        self.duplicates.extend(overlay.duplicates);
        self
    }

    pub fn extractor_for(&self, field: &str) -> Option<Extractor<C>> {
        self.position(field).map(|index| self.bindings[index].1)
    }

    /// Bound field names, in binding order
    #[cfg(test)]
    fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.bindings.iter().map(|(field, _)| *field)
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.bindings.iter().position(|(bound, _)| *bound == field)
    }

    /// Assembles an `R` from `context`
    ///
    /// Every field `R` declares is either produced by its bound extractor or
    /// left at its default. Bindings for fields `R` doesn't declare are
    /// ignored, which lets one context feed several record shapes.
    ///
    /// # Errors
    ///
    /// Fails as a whole, never returning a partially assigned record, when:
    /// * the plan binds some field twice in one layer
    /// * an extractor fails
    /// * an extractor's value has a different kind than its field
    pub fn build<R: Buildable>(&self, context: &C) -> Result<R, BuildError> {
        if let Some(&field) = self.duplicates.first() {
            return Err(BuildError::DuplicateBinding(field));
        }

        let mut record = R::default();
        for spec in R::fields() {
            let Some(extractor) = self.extractor_for(spec.name) else {
                continue;
            };

            let value = extractor(context)?;
            if value.kind() != spec.kind {
                return Err(BuildError::KindMismatch {
                    field: spec.name,
                    expected: spec.kind,
                    found: value.kind(),
                });
            }
            (spec.assign)(&mut record, value);
        }

        Ok(record)
    }
}
