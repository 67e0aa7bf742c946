//! Code for solved models.
use crate::results::{KeyError, ResultKey, ResultStore, StoreFormat};
use crate::topology::Topology;

/// A model which has already been built and solved elsewhere.
///
/// The comparison only ever reads from this.
#[derive(PartialEq, Debug, Clone)]
pub struct SolvedModel {
    /// A short name for the model, used in reports (e.g. "urbs")
    pub name: String,
    /// The model's declared topology
    pub topology: Topology,
    /// Total cost at the optimum
    pub objective: f64,
    /// The solved values
    pub results: ResultStore,
}

impl SolvedModel {
    /// The key scheme used by the model's results
    pub fn format(&self) -> StoreFormat {
        self.results.format()
    }

    /// The number of modelled timesteps
    pub fn timestep_count(&self) -> u32 {
        self.results.timestep_count()
    }

    /// Look up a single solved value. See [`ResultStore::lookup`].
    pub fn lookup(&self, key: &ResultKey) -> Result<Option<f64>, KeyError> {
        self.results.lookup(key)
    }
}
