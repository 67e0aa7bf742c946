//! Resolution of comparable entities and their lookup keys in each model.
//!
//! The set of entities is derived from the topology of the first model. For each entity, one key
//! per quantity is resolved against each model, in whichever scheme that model uses. Transmission
//! corridors may be stored in either orientation, so both are tried, except for indexed flows whose
//! tuple order fixes the direction. All knowledge of key shapes and node naming lives in this
//! module.
use crate::model::SolvedModel;
use crate::results::{
    IndexPart, IndexedVariable, NetworkAttribute, NodeLabel, ResultKey, StoreFormat,
};
use crate::topology::{
    CommodityID, Process, ProcessID, SiteID, Storage, StorageID, Transmission, TransmissionID,
};
use anyhow::Result;
use log::{debug, warn};
use std::fmt;

/// Labels of nodes in the network model
pub mod labels {
    use crate::results::NodeLabel;
    use std::fmt::Display;

    /// The bus carrying a commodity at a site
    pub fn bus(commodity: impl Display, site: impl Display) -> NodeLabel {
        format!("b_{commodity}_{site}").into()
    }

    /// A storage unit at a site
    pub fn storage(storage: impl Display, site: impl Display) -> NodeLabel {
        format!("storage_{storage}_{site}").into()
    }

    /// The line carrying energy from one site to another
    pub fn line(from: impl Display, to: impl Display) -> NodeLabel {
        format!("line_{from}_{to}").into()
    }

    /// A power plant, named after the fuel it consumes
    pub fn power_plant(fuel: impl Display, site: impl Display) -> NodeLabel {
        format!("pp_{fuel}_{site}").into()
    }

    /// A renewable source, named after the intermittent supply it converts
    pub fn renewable_source(supply: impl Display, site: impl Display) -> NodeLabel {
        format!("rs_{supply}_{site}").into()
    }
}

/// The kind of a process technology
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, strum::Display)]
pub enum Technology {
    /// Fuelled by a stock commodity
    Stock,
    /// Driven by an intermittent supply
    Intermittent,
}

/// A class of comparable entity
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, strum::Display, strum::EnumIter)]
pub enum EntityClass {
    /// Storage units
    Storage,
    /// Transmission corridors
    Transmission,
    /// Stock-fuelled processes
    Process,
    /// Renewable processes
    Renewable,
    /// The objective function
    Objective,
}

/// A quantity which is compared between the models
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, strum::Display)]
pub enum Quantity {
    /// Installed capacity (MW, or MWh for storage content)
    #[strum(to_string = "CAP")]
    Capacity,
    /// Storage power rating (MW)
    #[strum(to_string = "POW")]
    Power,
    /// Flow into the entity per step
    #[strum(to_string = "IN")]
    In,
    /// Flow out of the entity per step
    #[strum(to_string = "OUT")]
    Out,
    /// Storage state of charge per step
    #[strum(to_string = "CON")]
    Content,
    /// Total system cost
    #[strum(to_string = "OBJ")]
    Cost,
}

/// The canonical identity of a comparable entity
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub enum EntityId {
    /// A storage unit
    Storage {
        /// The site of the storage unit
        site: SiteID,
        /// The storage technology
        storage: StorageID,
        /// The stored commodity
        commodity: CommodityID,
    },
    /// A transmission corridor, seen from one of its ends
    Transmission {
        /// The site from which the corridor is viewed
        site: SiteID,
        /// The site at the other end
        other: SiteID,
        /// The transmission technology
        transmission: TransmissionID,
        /// The transported commodity
        commodity: CommodityID,
    },
    /// A conversion process
    Process {
        /// The site of the process
        site: SiteID,
        /// The process name
        process: ProcessID,
        /// Whether the process is fuelled or intermittent
        technology: Technology,
    },
}

impl EntityId {
    /// The site the entity belongs to
    pub fn site(&self) -> &SiteID {
        match self {
            Self::Storage { site, .. }
            | Self::Transmission { site, .. }
            | Self::Process { site, .. } => site,
        }
    }

    /// The class of the entity
    pub fn class(&self) -> EntityClass {
        match self {
            Self::Storage { .. } => EntityClass::Storage,
            Self::Transmission { .. } => EntityClass::Transmission,
            Self::Process {
                technology: Technology::Stock,
                ..
            } => EntityClass::Process,
            Self::Process {
                technology: Technology::Intermittent,
                ..
            } => EntityClass::Renewable,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage {
                storage, commodity, ..
            } => write!(f, "{storage}.{commodity}"),
            Self::Transmission { site, other, .. } => write!(f, "{site}_{other}"),
            Self::Process { process, .. } => write!(f, "{process}"),
        }
    }
}

/// A lookup key with its time dimension left open
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum KeyTemplate {
    /// An indexed key, without the leading timestep
    Indexed {
        /// The variable
        variable: IndexedVariable,
        /// The index parts following the timestep (if any)
        index: Vec<IndexPart>,
    },
    /// A network key, without the position
    Network {
        /// The node the flow leaves
        source: NodeLabel,
        /// The node the flow enters, if any
        target: Option<NodeLabel>,
        /// The attribute
        attribute: NetworkAttribute,
    },
}

impl KeyTemplate {
    /// Create an indexed template from string-like index parts
    fn indexed<I, S>(variable: IndexedVariable, index: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Indexed {
            variable,
            index: index.into_iter().map(|s| s.as_ref().into()).collect(),
        }
    }

    /// Create a network template
    fn network(source: NodeLabel, target: Option<NodeLabel>, attribute: NetworkAttribute) -> Self {
        Self::Network {
            source,
            target,
            attribute,
        }
    }

    /// Whether the key has a time dimension
    pub fn is_timed(&self) -> bool {
        match self {
            Self::Indexed { variable, .. } => variable.is_timed(),
            Self::Network { attribute, .. } => attribute.is_sequence(),
        }
    }

    /// The complete key for a quantity without a time dimension
    pub fn scalar(&self) -> ResultKey {
        match self {
            Self::Indexed { variable, index } => ResultKey::Indexed {
                variable: *variable,
                index: index.clone(),
            },
            Self::Network {
                source,
                target,
                attribute,
            } => ResultKey::Network {
                source: source.clone(),
                target: target.clone(),
                attribute: *attribute,
                position: None,
            },
        }
    }

    /// The complete key for logical timestep `step` (starting at 1).
    ///
    /// The indexed model addresses the step directly. The network model's sequences are zero-based,
    /// so its value for step `i` sits at position `i - 1`.
    ///
    /// # Panics
    ///
    /// Panics if `step` is 0, which is an initial state rather than a modelled step.
    pub fn at_step(&self, step: u32) -> ResultKey {
        assert!(step >= 1, "Logical timesteps start at 1");
        match self {
            Self::Indexed { variable, index } => ResultKey::Indexed {
                variable: *variable,
                index: std::iter::once(IndexPart::Step(step))
                    .chain(index.iter().cloned())
                    .collect(),
            },
            Self::Network {
                source,
                target,
                attribute,
            } => ResultKey::Network {
                source: source.clone(),
                target: target.clone(),
                attribute: *attribute,
                position: Some((step - 1) as usize),
            },
        }
    }
}

impl fmt::Display for KeyTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_timed() {
            write!(f, "{}", self.at_step(1))
        } else {
            write!(f, "{}", self.scalar())
        }
    }
}

/// A value for each of the two models
#[derive(PartialEq, Clone, Debug)]
pub struct KeyPair<T> {
    /// The value for the first model
    pub a: T,
    /// The value for the second model
    pub b: T,
}

/// The resolved keys for one quantity of an entity
#[derive(PartialEq, Clone, Debug)]
pub struct QuantityKeys {
    /// The quantity
    pub quantity: Quantity,
    /// A key for each model
    pub keys: KeyPair<KeyTemplate>,
}

impl QuantityKeys {
    /// Whether the quantity has a time dimension
    pub fn is_timed(&self) -> bool {
        self.keys.a.is_timed()
    }
}

/// An entity present in both models, with its resolved keys
#[derive(PartialEq, Clone, Debug)]
pub struct ComparisonEntity {
    /// The canonical identity
    pub id: EntityId,
    /// The resolved keys, capacity first
    pub quantities: Vec<QuantityKeys>,
}

/// An entity (or one of its quantities) that could not be resolved in one of the models
#[derive(PartialEq, Clone, Debug)]
pub struct NotFound {
    /// The entity class
    pub class: EntityClass,
    /// The site the entity belongs to
    pub site: SiteID,
    /// The entity's identity
    pub entity: String,
    /// The quantity, if only part of the entity is missing
    pub quantity: Option<Quantity>,
    /// The name of the model in which it is missing
    pub model: String,
}

impl NotFound {
    pub(crate) fn new(id: &EntityId, quantity: Option<Quantity>, model: &SolvedModel) -> Self {
        Self {
            class: id.class(),
            site: id.site().clone(),
            entity: id.to_string(),
            quantity,
            model: model.name.clone(),
        }
    }
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} at {}", self.class, self.entity, self.site)?;
        if let Some(quantity) = self.quantity {
            write!(f, " ({quantity})")?;
        }
        write!(f, " not found in {}", self.model)
    }
}

/// The outcome of resolving the entities of one class at one site
#[derive(PartialEq, Clone, Debug, Default)]
pub struct Resolved {
    /// Entities which can be compared
    pub entities: Vec<ComparisonEntity>,
    /// Entities or quantities which could not be resolved
    pub not_found: Vec<NotFound>,
}

/// The candidate keys for a quantity in one model, in order of preference
struct Candidates {
    quantity: Quantity,
    options: Vec<KeyTemplate>,
}

impl Candidates {
    fn one(quantity: Quantity, key: KeyTemplate) -> Self {
        Self {
            quantity,
            options: vec![key],
        }
    }

    fn either(quantity: Quantity, forward: KeyTemplate, reverse: KeyTemplate) -> Self {
        Self {
            quantity,
            options: vec![forward, reverse],
        }
    }
}

/// Candidate keys for the quantities of a storage unit
fn storage_candidates(format: StoreFormat, storage: &Storage) -> Vec<Candidates> {
    let (site, id, com) = (&storage.site_id, &storage.id, &storage.commodity_id);
    match format {
        StoreFormat::Indexed => {
            let names = [&site.0, &id.0, &com.0];
            let key = |variable| KeyTemplate::indexed(variable, names);
            vec![
                Candidates::one(Quantity::Capacity, key(IndexedVariable::CapStoC)),
                Candidates::one(Quantity::Power, key(IndexedVariable::CapStoP)),
                Candidates::one(Quantity::In, key(IndexedVariable::EStoIn)),
                Candidates::one(Quantity::Out, key(IndexedVariable::EStoOut)),
                Candidates::one(Quantity::Content, key(IndexedVariable::EStoCon)),
            ]
        }
        StoreFormat::Network => {
            let bus = labels::bus(com, site);
            let sto = labels::storage(id, site);
            let charge = |attribute| {
                KeyTemplate::network(bus.clone(), Some(sto.clone()), attribute)
            };
            vec![
                Candidates::one(
                    Quantity::Capacity,
                    KeyTemplate::network(sto.clone(), None, NetworkAttribute::Invest),
                ),
                Candidates::one(Quantity::Power, charge(NetworkAttribute::Invest)),
                Candidates::one(Quantity::In, charge(NetworkAttribute::Flow)),
                Candidates::one(
                    Quantity::Out,
                    KeyTemplate::network(sto.clone(), Some(bus.clone()), NetworkAttribute::Flow),
                ),
                Candidates::one(
                    Quantity::Content,
                    KeyTemplate::network(sto, None, NetworkAttribute::Capacity),
                ),
            ]
        }
    }
}

/// Candidate keys for the quantities of a transmission corridor, viewed from `line.site_in`
fn transmission_candidates(format: StoreFormat, line: &Transmission) -> Vec<Candidates> {
    let (site, other) = (&line.site_in, &line.site_out);
    let (tra, com) = (&line.id, &line.commodity_id);
    match format {
        StoreFormat::Indexed => {
            let forward = [&site.0, &other.0, &tra.0, &com.0];
            let reverse = [&other.0, &site.0, &tra.0, &com.0];
            vec![
                // Capacity is shared by both directions, flows are not
                Candidates::either(
                    Quantity::Capacity,
                    KeyTemplate::indexed(IndexedVariable::CapTra, forward),
                    KeyTemplate::indexed(IndexedVariable::CapTra, reverse),
                ),
                Candidates::one(
                    Quantity::In,
                    KeyTemplate::indexed(IndexedVariable::ETraIn, forward),
                ),
                // Energy arriving at this site leaves the other one
                Candidates::one(
                    Quantity::Out,
                    KeyTemplate::indexed(IndexedVariable::ETraOut, reverse),
                ),
            ]
        }
        StoreFormat::Network => {
            let bus = labels::bus(com, site);
            let forward = labels::line(site, other);
            let reverse = labels::line(other, site);
            let into_line = |line: &NodeLabel, attribute| {
                KeyTemplate::network(bus.clone(), Some(line.clone()), attribute)
            };
            let from_line = |line: &NodeLabel| {
                KeyTemplate::network(line.clone(), Some(bus.clone()), NetworkAttribute::Flow)
            };
            vec![
                Candidates::either(
                    Quantity::Capacity,
                    into_line(&forward, NetworkAttribute::Invest),
                    into_line(&reverse, NetworkAttribute::Invest),
                ),
                Candidates::either(
                    Quantity::In,
                    into_line(&forward, NetworkAttribute::Flow),
                    into_line(&reverse, NetworkAttribute::Flow),
                ),
                Candidates::either(Quantity::Out, from_line(&forward), from_line(&reverse)),
            ]
        }
    }
}

/// Candidate keys for the quantities of a process
fn process_candidates(
    format: StoreFormat,
    process: &Process,
    technology: Technology,
) -> Vec<Candidates> {
    let site = &process.site_id;
    match format {
        StoreFormat::Indexed => vec![
            Candidates::one(
                Quantity::Capacity,
                KeyTemplate::indexed(IndexedVariable::CapPro, [&site.0, &process.id.0]),
            ),
            Candidates::one(
                Quantity::Out,
                KeyTemplate::indexed(
                    IndexedVariable::EProOut,
                    [&site.0, &process.id.0, &process.output.0],
                ),
            ),
        ],
        StoreFormat::Network => {
            let output_bus = labels::bus(&process.output, site);
            let (capacity, unit) = match technology {
                Technology::Stock => {
                    // Investment sits on the fuel input of the plant
                    let unit = labels::power_plant(&process.input, site);
                    let fuel_bus = labels::bus(&process.input, site);
                    let invest = NetworkAttribute::Invest;
                    let capacity = KeyTemplate::network(fuel_bus, Some(unit.clone()), invest);
                    (capacity, unit)
                }
                Technology::Intermittent => {
                    let unit = labels::renewable_source(&process.input, site);
                    (
                        KeyTemplate::network(
                            unit.clone(),
                            Some(output_bus.clone()),
                            NetworkAttribute::Invest,
                        ),
                        unit,
                    )
                }
            };
            vec![
                Candidates::one(Quantity::Capacity, capacity),
                Candidates::one(
                    Quantity::Out,
                    KeyTemplate::network(unit, Some(output_bus), NetworkAttribute::Flow),
                ),
            ]
        }
    }
}

/// Check whether a key exists in a model, probing the first step for timed keys
fn probe(model: &SolvedModel, template: &KeyTemplate) -> Result<bool> {
    let key = if template.is_timed() {
        template.at_step(1)
    } else {
        template.scalar()
    };
    Ok(model.lookup(&key)?.is_some())
}

/// Return the first of the candidate keys which exists in the model
fn probe_first(model: &SolvedModel, candidates: &Candidates) -> Result<Option<KeyTemplate>> {
    // Without any timesteps there is nothing to probe timed keys against
    if model.timestep_count() == 0 && candidates.options[0].is_timed() {
        return Ok(Some(candidates.options[0].clone()));
    }

    for (i, option) in candidates.options.iter().enumerate() {
        if probe(model, option)? {
            if i > 0 {
                debug!(
                    "Resolved {} in {} using reversed key {option}",
                    candidates.quantity, model.name
                );
            }
            return Ok(Some(option.clone()));
        }
    }

    Ok(None)
}

/// Resolves comparable entities between two solved models
pub struct Resolver<'a> {
    a: &'a SolvedModel,
    b: &'a SolvedModel,
}

impl<'a> Resolver<'a> {
    /// Create a resolver for the given pair of models
    pub fn new(a: &'a SolvedModel, b: &'a SolvedModel) -> Self {
        Self { a, b }
    }

    /// Resolve the storage units at a site
    pub fn resolve_storage_entities(&self, site: &SiteID) -> Result<Resolved> {
        let mut out = Resolved::default();
        for storage in self.a.topology.storages_at(site) {
            let id = EntityId::Storage {
                site: site.clone(),
                storage: storage.id.clone(),
                commodity: storage.commodity_id.clone(),
            };
            let declared = self.b.topology.has_storage(site, &storage.id);
            self.resolve_entity(
                id,
                declared,
                |format| storage_candidates(format, storage),
                &mut out,
            )?;
        }

        Ok(out)
    }

    /// Resolve the transmission corridors leaving a site
    pub fn resolve_transmission_entities(&self, site: &SiteID) -> Result<Resolved> {
        let mut out = Resolved::default();
        for line in self.a.topology.corridors_from(site) {
            let id = EntityId::Transmission {
                site: site.clone(),
                other: line.site_out.clone(),
                transmission: line.id.clone(),
                commodity: line.commodity_id.clone(),
            };
            let declared = self
                .b
                .topology
                .has_corridor(&line.site_in, &line.site_out, &line.id);
            self.resolve_entity(
                id,
                declared,
                |format| transmission_candidates(format, line),
                &mut out,
            )?;
        }

        Ok(out)
    }

    /// Resolve the processes at a site fuelled by stock commodities
    pub fn resolve_process_entities(&self, site: &SiteID) -> Result<Resolved> {
        let fuels = self.a.topology.stock_commodities(site);
        self.resolve_processes(site, fuels, Technology::Stock)
    }

    /// Resolve the processes at a site driven by intermittent supplies
    pub fn resolve_renewable_entities(&self, site: &SiteID) -> Result<Resolved> {
        let supplies = self.a.topology.supim_commodities(site);
        self.resolve_processes(site, supplies, Technology::Intermittent)
    }

    fn resolve_processes<'b>(
        &self,
        site: &SiteID,
        inputs: impl Iterator<Item = &'b CommodityID>,
        technology: Technology,
    ) -> Result<Resolved> {
        let mut out = Resolved::default();
        for input in inputs {
            for process in self.a.topology.processes_consuming(site, input) {
                let id = EntityId::Process {
                    site: site.clone(),
                    process: process.id.clone(),
                    technology,
                };
                let declared = self.b.topology.has_process(site, &process.id);
                self.resolve_entity(
                    id,
                    declared,
                    |format| process_candidates(format, process, technology),
                    &mut out,
                )?;
            }
        }

        Ok(out)
    }

    /// Resolve the keys of a single entity in both models.
    ///
    /// The first candidate quantity is the entity's anchor: if it cannot be found in a model (or
    /// the second model does not declare the entity), the whole entity is reported as not found.
    /// Other quantities which cannot be found are reported individually.
    fn resolve_entity<F>(
        &self,
        id: EntityId,
        declared_in_b: bool,
        candidates_for: F,
        out: &mut Resolved,
    ) -> Result<()>
    where
        F: Fn(StoreFormat) -> Vec<Candidates>,
    {
        if !declared_in_b {
            warn!("{} {id} at {} is not declared in {}", id.class(), id.site(), self.b.name);
            out.not_found.push(NotFound::new(&id, None, self.b));
            return Ok(());
        }

        let mut resolved = Vec::with_capacity(2);
        for model in [self.a, self.b] {
            let candidates = candidates_for(model.format());
            let mut keys = Vec::with_capacity(candidates.len());
            for candidate in &candidates {
                keys.push((candidate.quantity, probe_first(model, candidate)?));
            }

            if keys.first().is_none_or(|(_, key)| key.is_none()) {
                warn!("{} {id} at {} not found in {}", id.class(), id.site(), model.name);
                out.not_found.push(NotFound::new(&id, None, model));
                return Ok(());
            }
            resolved.push(keys);
        }

        let keys_b = resolved.pop().unwrap_or_default();
        let keys_a = resolved.pop().unwrap_or_default();
        let mut quantities = Vec::with_capacity(keys_a.len());
        for ((quantity, key_a), (_, key_b)) in keys_a.into_iter().zip(keys_b) {
            match (key_a, key_b) {
                (Some(a), Some(b)) => quantities.push(QuantityKeys {
                    quantity,
                    keys: KeyPair { a, b },
                }),
                (key_a, key_b) => {
                    for (key, model) in [(key_a, self.a), (key_b, self.b)] {
                        if key.is_none() {
                            warn!(
                                "{quantity} of {} {id} at {} not found in {}",
                                id.class(),
                                id.site(),
                                model.name
                            );
                            out.not_found.push(NotFound::new(&id, Some(quantity), model));
                        }
                    }
                }
            }
        }

        out.entities.push(ComparisonEntity { id, quantities });
        Ok(())
    }
}
