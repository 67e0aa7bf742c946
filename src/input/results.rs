//! Code for reading solved values from CSV files.
use super::{input_err_msg, read_csv};
use crate::results::{
    IndexPart, IndexedResults, IndexedVariable, NetworkAttribute, NetworkResults, NodeLabel,
    ResultStore, StoreFormat,
};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

const VARIABLES_FILE_NAME: &str = "variables.csv";
const FLOWS_FILE_NAME: &str = "flows.csv";

/// The separator between the parts of an index in `variables.csv`
const INDEX_SEPARATOR: char = ';';

#[derive(PartialEq, Debug, Deserialize)]
struct VariableRaw {
    variable: IndexedVariable,
    index: String,
    value: f64,
}

#[derive(PartialEq, Debug, Deserialize)]
struct FlowRaw {
    source: String,
    target: Option<String>,
    attribute: NetworkAttribute,
    step: Option<usize>,
    value: f64,
}

/// Read the solved values of a model in the given format
pub fn read_results(model_dir: &Path, format: StoreFormat, timesteps: u32) -> Result<ResultStore> {
    Ok(match format {
        StoreFormat::Indexed => {
            let file_path = model_dir.join(VARIABLES_FILE_NAME);
            let iter = read_csv(&file_path)?.into_iter();
            ResultStore::Indexed(
                read_variables_from_iter(iter, timesteps)
                    .with_context(|| input_err_msg(&file_path))?,
            )
        }
        StoreFormat::Network => {
            let file_path = model_dir.join(FLOWS_FILE_NAME);
            let iter = read_csv(&file_path)?.into_iter();
            ResultStore::Network(
                read_flows_from_iter(iter, timesteps).with_context(|| input_err_msg(&file_path))?,
            )
        }
    })
}

/// Parse an index of the form `1;Mid;Pump;Elec`, where only timed variables start with a step
fn parse_index(variable: IndexedVariable, index: &str) -> Result<Vec<IndexPart>> {
    let mut parts = index.split(INDEX_SEPARATOR).map(str::trim);
    let mut out = Vec::with_capacity(variable.arity());
    if variable.is_timed() {
        let step = parts.next().unwrap_or_default();
        let step = step
            .parse()
            .with_context(|| format!("Invalid timestep '{step}' for variable {variable}"))?;
        out.push(IndexPart::Step(step));
    }
    for part in parts {
        ensure!(!part.is_empty(), "Empty index part for variable {variable}");
        out.push(part.into());
    }

    Ok(out)
}

fn read_variables_from_iter<I>(iter: I, timesteps: u32) -> Result<IndexedResults>
where
    I: Iterator<Item = VariableRaw>,
{
    let mut results = IndexedResults::new(timesteps);
    for raw in iter {
        let index = parse_index(raw.variable, &raw.index)?;
        results
            .insert(raw.variable, index, raw.value)
            .with_context(|| format!("Invalid entry {}[{}]", raw.variable, raw.index))?;
    }

    Ok(results)
}

type FlowKey = (NodeLabel, Option<NodeLabel>, NetworkAttribute);

fn read_flows_from_iter<I>(iter: I, timesteps: u32) -> Result<NetworkResults>
where
    I: Iterator<Item = FlowRaw>,
{
    let mut results = NetworkResults::new(timesteps);

    // Sequences are given one position per row, so gather them first
    let mut sequences: IndexMap<FlowKey, Vec<Option<f64>>> = IndexMap::new();
    for raw in iter {
        let source = NodeLabel::from(raw.source.as_str());
        let target = raw.target.as_deref().map(NodeLabel::from);
        let Some(step) = raw.step else {
            results.insert_scalar(source, target, raw.attribute, raw.value)?;
            continue;
        };

        ensure!(
            step < timesteps as usize,
            "Position {step} of {} for flow from {source} is beyond the time index",
            raw.attribute
        );
        let sequence = sequences
            .entry((source.clone(), target, raw.attribute))
            .or_insert_with(|| vec![None; timesteps as usize]);
        ensure!(
            sequence[step].replace(raw.value).is_none(),
            "Duplicate value at position {step} of {} for flow from {source}",
            raw.attribute
        );
    }

    for ((source, target, attribute), values) in sequences {
        let values = values
            .into_iter()
            .enumerate()
            .map(|(position, value)| {
                value.with_context(|| {
                    format!("Missing position {position} of {attribute} for flow from {source}")
                })
            })
            .collect::<Result<Vec<_>>>()?;
        results.insert_sequence(source, target, attribute, values)?;
    }

    Ok(results)
}
