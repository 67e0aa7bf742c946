//! Result store for models whose variables are addressed by index tuples.
use super::{IndexPart, IndexedVariable, KeyError};
use anyhow::{Result, ensure};
use std::collections::HashMap;

/// Solved variable values of an indexed model.
///
/// Timesteps are logical: step 1 is the first modelled step. Step 0 may hold initial states (e.g.
/// storage content) but is not part of the modelled horizon.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct IndexedResults {
    values: HashMap<IndexedVariable, HashMap<Vec<IndexPart>, f64>>,
    timesteps: u32,
}

/// Check that an index has the right shape for a variable
fn check_index(variable: IndexedVariable, index: &[IndexPart]) -> Result<(), KeyError> {
    if index.len() != variable.arity() {
        return Err(KeyError::WrongArity {
            variable,
            expected: variable.arity(),
            found: index.len(),
        });
    }

    let names = if variable.is_timed() {
        if !matches!(index[0], IndexPart::Step(_)) {
            return Err(KeyError::MissingStep(variable));
        }
        &index[1..]
    } else {
        index
    };

    if names.iter().any(|part| matches!(part, IndexPart::Step(_))) {
        return Err(KeyError::UnexpectedStep(variable));
    }

    Ok(())
}

impl IndexedResults {
    /// Create an empty store for a model with the given number of modelled timesteps
    pub fn new(timesteps: u32) -> Self {
        Self {
            values: HashMap::new(),
            timesteps,
        }
    }

    /// The number of modelled timesteps
    pub fn timestep_count(&self) -> u32 {
        self.timesteps
    }

    /// Add a solved value to the store
    pub fn insert(
        &mut self,
        variable: IndexedVariable,
        index: Vec<IndexPart>,
        value: f64,
    ) -> Result<()> {
        check_index(variable, &index)?;
        ensure!(
            value.is_finite(),
            "Non-finite value for {variable}: {value}"
        );
        if let IndexPart::Step(step) = index[0] {
            ensure!(
                step <= self.timesteps,
                "Timestep {step} for {variable} is beyond the modelled horizon of {} steps",
                self.timesteps
            );
        }

        let existing = self.values.entry(variable).or_default().insert(index, value);
        ensure!(existing.is_none(), "Duplicate entry for variable {variable}");

        Ok(())
    }

    /// Look up a value, returning `Ok(None)` if the index is well formed but absent
    pub fn lookup(
        &self,
        variable: IndexedVariable,
        index: &[IndexPart],
    ) -> Result<Option<f64>, KeyError> {
        check_index(variable, index)?;

        Ok(self
            .values
            .get(&variable)
            .and_then(|values| values.get(index))
            .copied())
    }
}
