//! Code for reading a model's topology from CSV files.
use super::{input_err_msg, read_csv, read_csv_optional};
use crate::id::IDCollection;
use crate::topology::{
    Commodity, CommodityID, CommodityType, Process, SiteID, Storage, Topology, Transmission,
};
use anyhow::{Context, Result, ensure};
use indexmap::IndexSet;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

const SITES_FILE_NAME: &str = "sites.csv";
const COMMODITIES_FILE_NAME: &str = "commodities.csv";
const PROCESSES_FILE_NAME: &str = "processes.csv";
const STORAGES_FILE_NAME: &str = "storages.csv";
const TRANSMISSIONS_FILE_NAME: &str = "transmissions.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct SiteRaw {
    id: String,
}

#[derive(PartialEq, Debug, Deserialize)]
struct CommodityRaw {
    site_id: String,
    id: String,
    #[serde(rename = "type")]
    kind: CommodityType,
}

#[derive(PartialEq, Debug, Deserialize)]
struct ProcessRaw {
    site_id: String,
    id: String,
    input: String,
    output: String,
}

#[derive(PartialEq, Debug, Deserialize)]
struct StorageRaw {
    site_id: String,
    id: String,
    commodity_id: String,
}

#[derive(PartialEq, Debug, Deserialize)]
struct TransmissionRaw {
    site_in: String,
    site_out: String,
    id: String,
    commodity_id: String,
}

/// Read the topology of a model.
///
/// `sites.csv` and `commodities.csv` are required. The files for processes, storages and
/// transmission lines may be omitted if the model has none.
///
/// # Arguments
///
/// * `model_dir` - Folder containing the model's files
pub fn read_topology(model_dir: &Path) -> Result<Topology> {
    let file_path = model_dir.join(SITES_FILE_NAME);
    let sites = read_sites_from_iter(read_csv(&file_path)?.into_iter())
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(COMMODITIES_FILE_NAME);
    let commodities = read_commodities_from_iter(read_csv(&file_path)?.into_iter(), &sites)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(PROCESSES_FILE_NAME);
    let processes = read_processes_from_iter(
        read_csv_optional(&file_path)?.into_iter(),
        &sites,
        &commodities,
    )
    .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(STORAGES_FILE_NAME);
    let storages = read_storages_from_iter(
        read_csv_optional(&file_path)?.into_iter(),
        &sites,
        &commodities,
    )
    .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(TRANSMISSIONS_FILE_NAME);
    let transmissions = read_transmissions_from_iter(
        read_csv_optional(&file_path)?.into_iter(),
        &sites,
        &commodities,
    )
    .with_context(|| input_err_msg(&file_path))?;

    Ok(Topology {
        sites,
        commodities,
        processes,
        storages,
        transmissions,
    })
}

fn read_sites_from_iter<I>(iter: I) -> Result<IndexSet<SiteID>>
where
    I: Iterator<Item = SiteRaw>,
{
    let mut sites = IndexSet::new();
    for raw in iter {
        ensure!(!raw.id.is_empty(), "Site ID cannot be empty");
        ensure!(
            sites.insert(SiteID::from(raw.id.as_str())),
            "Duplicate site ID {}",
            raw.id
        );
    }

    Ok(sites)
}

/// Look up a commodity declared at a site
fn get_commodity(commodities: &[Commodity], site_id: &SiteID, id: &str) -> Result<CommodityID> {
    commodities
        .iter()
        .find(|c| &c.site_id == site_id && c.id.0.as_ref() == id)
        .map(|c| c.id.clone())
        .with_context(|| format!("Commodity {id} is not declared at site {site_id}"))
}

fn read_commodities_from_iter<I>(iter: I, sites: &IndexSet<SiteID>) -> Result<Vec<Commodity>>
where
    I: Iterator<Item = CommodityRaw>,
{
    let mut commodities: Vec<Commodity> = Vec::new();
    for raw in iter {
        let site_id = sites.get_id_by_str(&raw.site_id)?;
        ensure!(
            get_commodity(&commodities, &site_id, &raw.id).is_err(),
            "Commodity {} is declared more than once at site {site_id}",
            raw.id
        );
        commodities.push(Commodity {
            id: raw.id.as_str().into(),
            site_id,
            kind: raw.kind,
        });
    }

    Ok(commodities)
}

fn read_processes_from_iter<I>(
    iter: I,
    sites: &IndexSet<SiteID>,
    commodities: &[Commodity],
) -> Result<Vec<Process>>
where
    I: Iterator<Item = ProcessRaw>,
{
    let mut seen = HashSet::new();
    let mut processes = Vec::new();
    for raw in iter {
        let site_id = sites.get_id_by_str(&raw.site_id)?;
        ensure!(
            seen.insert((site_id.clone(), raw.id.clone())),
            "Process {} is declared more than once at site {site_id}",
            raw.id
        );
        processes.push(Process {
            input: get_commodity(commodities, &site_id, &raw.input)?,
            output: get_commodity(commodities, &site_id, &raw.output)?,
            id: raw.id.as_str().into(),
            site_id,
        });
    }

    Ok(processes)
}

fn read_storages_from_iter<I>(
    iter: I,
    sites: &IndexSet<SiteID>,
    commodities: &[Commodity],
) -> Result<Vec<Storage>>
where
    I: Iterator<Item = StorageRaw>,
{
    let mut seen = HashSet::new();
    let mut storages = Vec::new();
    for raw in iter {
        let site_id = sites.get_id_by_str(&raw.site_id)?;
        ensure!(
            seen.insert((site_id.clone(), raw.id.clone())),
            "Storage {} is declared more than once at site {site_id}",
            raw.id
        );
        storages.push(Storage {
            commodity_id: get_commodity(commodities, &site_id, &raw.commodity_id)?,
            id: raw.id.as_str().into(),
            site_id,
        });
    }

    Ok(storages)
}

fn read_transmissions_from_iter<I>(
    iter: I,
    sites: &IndexSet<SiteID>,
    commodities: &[Commodity],
) -> Result<Vec<Transmission>>
where
    I: Iterator<Item = TransmissionRaw>,
{
    let mut seen = HashSet::new();
    let mut transmissions = Vec::new();
    for raw in iter {
        let site_in = sites.get_id_by_str(&raw.site_in)?;
        let site_out = sites.get_id_by_str(&raw.site_out)?;
        ensure!(
            site_in != site_out,
            "Transmission {} connects site {site_in} to itself",
            raw.id
        );
        ensure!(
            seen.insert((site_in.clone(), site_out.clone(), raw.id.clone())),
            "Transmission {} from {site_in} to {site_out} is declared more than once",
            raw.id
        );
        let commodity_id = get_commodity(commodities, &site_in, &raw.commodity_id)?;
        get_commodity(commodities, &site_out, &raw.commodity_id)?;
        transmissions.push(Transmission {
            id: raw.id.as_str().into(),
            site_in,
            site_out,
            commodity_id,
        });
    }

    Ok(transmissions)
}
