//! Result store for models whose values are attached to flows between network nodes.
use super::{KeyError, NetworkAttribute, NodeLabel};
use anyhow::{Result, ensure};
use std::collections::HashMap;

/// The results attached to a single flow (or to a node, when there is no target)
#[derive(PartialEq, Debug, Clone, Default)]
struct FlowResults {
    sequences: HashMap<NetworkAttribute, Vec<f64>>,
    scalars: HashMap<NetworkAttribute, f64>,
}

/// Solved values of a network model.
///
/// Sequences are stored by zero-based position in the model's time index, so position `i - 1`
/// holds the value for logical step `i`.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct NetworkResults {
    flows: HashMap<(NodeLabel, Option<NodeLabel>), FlowResults>,
    timesteps: u32,
}

impl NetworkResults {
    /// Create an empty store for a model with the given time index length
    pub fn new(timesteps: u32) -> Self {
        Self {
            flows: HashMap::new(),
            timesteps,
        }
    }

    /// The length of the model's time index
    pub fn timestep_count(&self) -> u32 {
        self.timesteps
    }

    /// Add a complete sequence for a flow
    pub fn insert_sequence(
        &mut self,
        source: NodeLabel,
        target: Option<NodeLabel>,
        attribute: NetworkAttribute,
        values: Vec<f64>,
    ) -> Result<()> {
        ensure!(
            attribute.is_sequence(),
            "Attribute {attribute} is a scalar, not a sequence"
        );
        ensure!(
            values.len() == self.timesteps as usize,
            "Sequence {attribute} for flow ({source}, {}) has {} values but the time index has {}",
            target.as_ref().map_or("None", |t| &*t.0),
            values.len(),
            self.timesteps
        );
        ensure!(
            values.iter().all(|v| v.is_finite()),
            "Non-finite value in sequence {attribute} for flow from {source}"
        );

        let flow = self.flows.entry((source, target)).or_default();
        ensure!(
            flow.sequences.insert(attribute, values).is_none(),
            "Duplicate sequence {attribute}"
        );

        Ok(())
    }

    /// Add a scalar value for a flow
    pub fn insert_scalar(
        &mut self,
        source: NodeLabel,
        target: Option<NodeLabel>,
        attribute: NetworkAttribute,
        value: f64,
    ) -> Result<()> {
        ensure!(
            !attribute.is_sequence(),
            "Attribute {attribute} is a sequence, not a scalar"
        );
        ensure!(
            value.is_finite(),
            "Non-finite value for {attribute} of flow from {source}"
        );

        let flow = self.flows.entry((source, target)).or_default();
        ensure!(
            flow.scalars.insert(attribute, value).is_none(),
            "Duplicate scalar {attribute}"
        );

        Ok(())
    }

    /// Look up a value, returning `Ok(None)` if the key is well formed but absent
    pub fn lookup(
        &self,
        source: &NodeLabel,
        target: Option<&NodeLabel>,
        attribute: NetworkAttribute,
        position: Option<usize>,
    ) -> Result<Option<f64>, KeyError> {
        let position = match (attribute.is_sequence(), position) {
            (true, None) => return Err(KeyError::MissingPosition(attribute)),
            (false, Some(_)) => return Err(KeyError::UnexpectedPosition(attribute)),
            (_, position) => position,
        };

        // HashMap keys are owned, so build one for the query
        let Some(flow) = self.flows.get(&(source.clone(), target.cloned())) else {
            return Ok(None);
        };

        Ok(match position {
            Some(position) => flow
                .sequences
                .get(&attribute)
                .and_then(|seq| seq.get(position))
                .copied(),
            None => flow.scalars.get(&attribute).copied(),
        })
    }
}
