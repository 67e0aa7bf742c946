//! Fixtures for tests

use crate::model::SolvedModel;
use crate::resolver::{EntityId, Quantity, Technology, labels};
use crate::results::{
    IndexPart, IndexedResults, IndexedVariable, NetworkAttribute, NetworkResults, ResultStore,
    StoreFormat,
};
use crate::topology::{Commodity, CommodityType, Process, Storage, Topology, Transmission};
use itertools::Itertools;
use rstest::fixture;
use std::ops::RangeInclusive;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Three sites, each with a coal plant, a wind park and a pumped storage unit, all connected by
/// hvac lines in both directions
#[fixture]
pub fn topology() -> Topology {
    let sites = ["Mid", "South", "North"];
    let mut topology = Topology {
        sites: sites.iter().map(|&s| s.into()).collect(),
        ..Default::default()
    };

    for site in sites {
        for (com, kind) in [
            ("Coal", CommodityType::Stock),
            ("Wind", CommodityType::SupIm),
            ("Elec", CommodityType::Demand),
            ("CO2", CommodityType::Env),
        ] {
            topology.commodities.push(Commodity {
                id: com.into(),
                site_id: site.into(),
                kind,
            });
        }
        for (process, input) in [("Coal plant", "Coal"), ("Wind park", "Wind")] {
            topology.processes.push(Process {
                id: process.into(),
                site_id: site.into(),
                input: input.into(),
                output: "Elec".into(),
            });
        }
        topology.storages.push(Storage {
            id: "Pump".into(),
            site_id: site.into(),
            commodity_id: "Elec".into(),
        });
    }

    for (site_in, site_out) in sites.iter().cartesian_product(sites).filter(|(a, b)| *a != b) {
        topology.transmissions.push(Transmission {
            id: "hvac".into(),
            site_in: (*site_in).into(),
            site_out: site_out.into(),
            commodity_id: "Elec".into(),
        });
    }

    topology
}

/// Builds solved models whose values are generated from a closure over entity, quantity and step
pub struct ModelBuilder {
    name: String,
    topology: Topology,
    timesteps: u32,
    format: StoreFormat,
    objective: f64,
    single_orientation: bool,
    without_lines: bool,
    skipped: Vec<IndexedVariable>,
}

impl ModelBuilder {
    fn new(name: &str, topology: Topology, timesteps: u32, format: StoreFormat) -> Self {
        Self {
            name: name.into(),
            topology,
            timesteps,
            format,
            objective: 1000.0,
            single_orientation: false,
            without_lines: false,
            skipped: Vec::new(),
        }
    }

    /// Start building an indexed model
    pub fn indexed(name: &str, topology: Topology, timesteps: u32) -> Self {
        Self::new(name, topology, timesteps, StoreFormat::Indexed)
    }

    /// Start building a network model
    pub fn network(name: &str, topology: Topology, timesteps: u32) -> Self {
        Self::new(name, topology, timesteps, StoreFormat::Network)
    }

    /// Set the objective value
    pub fn objective(mut self, objective: f64) -> Self {
        self.objective = objective;
        self
    }

    /// Store each corridor under a single line node, named after the first declared site
    pub fn single_orientation(mut self) -> Self {
        self.single_orientation = true;
        self
    }

    /// Leave out all transmission results
    pub fn without_lines(mut self) -> Self {
        self.without_lines = true;
        self
    }

    /// Leave out every value of an indexed variable
    pub fn without_variable(mut self, variable: IndexedVariable) -> Self {
        self.skipped.push(variable);
        self
    }

    /// Build a model in which every value is the same
    pub fn all_equal(self, value: f64) -> SolvedModel {
        self.build(|_, _, _| value)
    }

    /// Build a model, taking values from `value(entity, quantity, step)`
    pub fn build<F>(self, value: F) -> SolvedModel
    where
        F: Fn(&EntityId, Quantity, Option<u32>) -> f64,
    {
        let results = match self.format {
            StoreFormat::Indexed => ResultStore::Indexed(self.build_indexed(&value)),
            StoreFormat::Network => ResultStore::Network(self.build_network(&value)),
        };

        SolvedModel {
            name: self.name,
            topology: self.topology,
            objective: self.objective,
            results,
        }
    }

    fn steps(&self) -> RangeInclusive<u32> {
        1..=self.timesteps
    }

    fn technology(&self, process: &Process) -> Option<Technology> {
        let kind = self
            .topology
            .commodities
            .iter()
            .find(|c| c.site_id == process.site_id && c.id == process.input)?
            .kind;
        match kind {
            CommodityType::Stock => Some(Technology::Stock),
            CommodityType::SupIm => Some(Technology::Intermittent),
            _ => None,
        }
    }

    fn build_indexed<F>(&self, value: &F) -> IndexedResults
    where
        F: Fn(&EntityId, Quantity, Option<u32>) -> f64,
    {
        let mut results = IndexedResults::new(self.timesteps);
        let mut insert = |variable: IndexedVariable,
                          names: Vec<&str>,
                          entity: &EntityId,
                          quantity: Quantity,
                          step: Option<u32>| {
            if self.skipped.contains(&variable) {
                return;
            }
            let index = step
                .map(IndexPart::Step)
                .into_iter()
                .chain(names.into_iter().map(IndexPart::from))
                .collect();
            results
                .insert(variable, index, value(entity, quantity, step))
                .unwrap();
        };

        for storage in &self.topology.storages {
            let id = storage_id(storage);
            let names = vec![&*storage.site_id.0, &*storage.id.0, &*storage.commodity_id.0];
            insert(IndexedVariable::CapStoC, names.clone(), &id, Quantity::Capacity, None);
            insert(IndexedVariable::CapStoP, names.clone(), &id, Quantity::Power, None);
            for step in self.steps() {
                let step = Some(step);
                insert(IndexedVariable::EStoIn, names.clone(), &id, Quantity::In, step);
                insert(IndexedVariable::EStoOut, names.clone(), &id, Quantity::Out, step);
                insert(IndexedVariable::EStoCon, names.clone(), &id, Quantity::Content, step);
            }
        }

        if !self.without_lines {
            for line in &self.topology.transmissions {
                let id = transmission_id(line);
                let (site, other) = (&*line.site_in.0, &*line.site_out.0);
                let (tra, com) = (&*line.id.0, &*line.commodity_id.0);
                insert(
                    IndexedVariable::CapTra,
                    vec![site, other, tra, com],
                    &id,
                    Quantity::Capacity,
                    None,
                );
                for step in self.steps() {
                    let step = Some(step);
                    let forward = vec![site, other, tra, com];
                    insert(IndexedVariable::ETraIn, forward, &id, Quantity::In, step);
                    // Energy arriving at `site` is recorded against the sending site first
                    let reverse = vec![other, site, tra, com];
                    insert(IndexedVariable::ETraOut, reverse, &id, Quantity::Out, step);
                }
            }
        }

        for process in &self.topology.processes {
            let Some(technology) = self.technology(process) else {
                continue;
            };
            let id = process_id(process, technology);
            let (site, pro) = (&*process.site_id.0, &*process.id.0);
            insert(IndexedVariable::CapPro, vec![site, pro], &id, Quantity::Capacity, None);
            for step in self.steps() {
                insert(
                    IndexedVariable::EProOut,
                    vec![site, pro, &*process.output.0],
                    &id,
                    Quantity::Out,
                    Some(step),
                );
            }
        }

        results
    }

    fn build_network<F>(&self, value: &F) -> NetworkResults
    where
        F: Fn(&EntityId, Quantity, Option<u32>) -> f64,
    {
        let mut results = NetworkResults::new(self.timesteps);
        let series = |entity: &EntityId, quantity| {
            self.steps()
                .map(|step| value(entity, quantity, Some(step)))
                .collect_vec()
        };

        for storage in &self.topology.storages {
            let id = storage_id(storage);
            let bus = labels::bus(&storage.commodity_id, &storage.site_id);
            let node = labels::storage(&storage.id, &storage.site_id);
            results
                .insert_scalar(
                    node.clone(),
                    None,
                    NetworkAttribute::Invest,
                    value(&id, Quantity::Capacity, None),
                )
                .unwrap();
            results
                .insert_scalar(
                    bus.clone(),
                    Some(node.clone()),
                    NetworkAttribute::Invest,
                    value(&id, Quantity::Power, None),
                )
                .unwrap();
            results
                .insert_sequence(
                    bus.clone(),
                    Some(node.clone()),
                    NetworkAttribute::Flow,
                    series(&id, Quantity::In),
                )
                .unwrap();
            results
                .insert_sequence(
                    node.clone(),
                    Some(bus),
                    NetworkAttribute::Flow,
                    series(&id, Quantity::Out),
                )
                .unwrap();
            results
                .insert_sequence(
                    node,
                    None,
                    NetworkAttribute::Capacity,
                    series(&id, Quantity::Content),
                )
                .unwrap();
        }

        if !self.without_lines {
            for line in &self.topology.transmissions {
                let id = transmission_id(line);
                let bus = labels::bus(&line.commodity_id, &line.site_in);
                let reversed = self.single_orientation
                    && self.topology.sites.get_index_of(&line.site_in)
                        > self.topology.sites.get_index_of(&line.site_out);
                let node = if reversed {
                    labels::line(&line.site_out, &line.site_in)
                } else {
                    labels::line(&line.site_in, &line.site_out)
                };
                results
                    .insert_scalar(
                        bus.clone(),
                        Some(node.clone()),
                        NetworkAttribute::Invest,
                        value(&id, Quantity::Capacity, None),
                    )
                    .unwrap();
                results
                    .insert_sequence(
                        bus.clone(),
                        Some(node.clone()),
                        NetworkAttribute::Flow,
                        series(&id, Quantity::In),
                    )
                    .unwrap();
                results
                    .insert_sequence(
                        node,
                        Some(bus),
                        NetworkAttribute::Flow,
                        series(&id, Quantity::Out),
                    )
                    .unwrap();
            }
        }

        for process in &self.topology.processes {
            let Some(technology) = self.technology(process) else {
                continue;
            };
            let id = process_id(process, technology);
            let output_bus = labels::bus(&process.output, &process.site_id);
            let (unit, capacity_flow) = match technology {
                Technology::Stock => {
                    let unit = labels::power_plant(&process.input, &process.site_id);
                    let fuel_bus = labels::bus(&process.input, &process.site_id);
                    (unit.clone(), (fuel_bus, unit))
                }
                Technology::Intermittent => {
                    let unit = labels::renewable_source(&process.input, &process.site_id);
                    (unit.clone(), (unit, output_bus.clone()))
                }
            };
            results
                .insert_scalar(
                    capacity_flow.0,
                    Some(capacity_flow.1),
                    NetworkAttribute::Invest,
                    value(&id, Quantity::Capacity, None),
                )
                .unwrap();
            results
                .insert_sequence(
                    unit,
                    Some(output_bus),
                    NetworkAttribute::Flow,
                    series(&id, Quantity::Out),
                )
                .unwrap();
        }

        results
    }
}

fn storage_id(storage: &Storage) -> EntityId {
    EntityId::Storage {
        site: storage.site_id.clone(),
        storage: storage.id.clone(),
        commodity: storage.commodity_id.clone(),
    }
}

fn transmission_id(line: &Transmission) -> EntityId {
    EntityId::Transmission {
        site: line.site_in.clone(),
        other: line.site_out.clone(),
        transmission: line.id.clone(),
        commodity: line.commodity_id.clone(),
    }
}

fn process_id(process: &Process, technology: Technology) -> EntityId {
    EntityId::Process {
        site: process.site_id.clone(),
        process: process.id.clone(),
        technology,
    }
}

