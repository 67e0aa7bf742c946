//! The topology of an energy system: its sites and the technologies installed at each of them.
//!
//! Both models being compared declare their own topology. The entities to compare are derived from
//! this data rather than from fixed lists of technology names, so arbitrary scenarios are
//! supported.
use crate::id::define_id_type;
use indexmap::IndexSet;
use serde_string_enum::DeserializeLabeledStringEnum;

define_id_type! {SiteID}
define_id_type! {CommodityID}
define_id_type! {ProcessID}
define_id_type! {StorageID}
define_id_type! {TransmissionID}

/// The role a commodity plays at a site
#[derive(PartialEq, Eq, Clone, Copy, Debug, DeserializeLabeledStringEnum)]
pub enum CommodityType {
    /// A fuel which can be bought in unlimited quantities (e.g. coal)
    #[string = "Stock"]
    Stock,
    /// A commodity with an exogenous demand time series (e.g. electricity)
    #[string = "Demand"]
    Demand,
    /// An intermittent supply with a fixed availability profile (e.g. wind)
    #[string = "SupIm"]
    SupIm,
    /// An environmental commodity such as CO2
    #[string = "Env"]
    Env,
}

/// A commodity available at a particular site
#[derive(PartialEq, Debug, Clone)]
pub struct Commodity {
    /// The commodity's identifier (e.g. "Coal")
    pub id: CommodityID,
    /// The site at which the commodity is available
    pub site_id: SiteID,
    /// The commodity's type
    pub kind: CommodityType,
}

/// A conversion process, e.g. a power plant
#[derive(PartialEq, Debug, Clone)]
pub struct Process {
    /// The process name (e.g. "Coal plant")
    pub id: ProcessID,
    /// The site at which the process is installed
    pub site_id: SiteID,
    /// The commodity consumed by the process
    pub input: CommodityID,
    /// The commodity produced by the process
    pub output: CommodityID,
}

/// A storage unit for a single commodity
#[derive(PartialEq, Debug, Clone)]
pub struct Storage {
    /// The storage technology name (e.g. "Pump")
    pub id: StorageID,
    /// The site at which the storage is installed
    pub site_id: SiteID,
    /// The stored commodity
    pub commodity_id: CommodityID,
}

/// One direction of a transmission corridor between two sites
#[derive(PartialEq, Debug, Clone)]
pub struct Transmission {
    /// The transmission technology (e.g. "hvac")
    pub id: TransmissionID,
    /// The site which feeds the line
    pub site_in: SiteID,
    /// The site which is fed by the line
    pub site_out: SiteID,
    /// The transported commodity
    pub commodity_id: CommodityID,
}

/// The declared topology of a solved model
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Topology {
    /// All sites, in declaration order
    pub sites: IndexSet<SiteID>,
    /// Commodities available at each site
    pub commodities: Vec<Commodity>,
    /// Conversion processes
    pub processes: Vec<Process>,
    /// Storage units
    pub storages: Vec<Storage>,
    /// Transmission lines, one entry per direction
    pub transmissions: Vec<Transmission>,
}

impl Topology {
    /// Whether the topology contains no sites at all
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Iterate over the commodities of the given type available at a site
    pub fn commodities_of_type<'a>(
        &'a self,
        site_id: &'a SiteID,
        kind: CommodityType,
    ) -> impl Iterator<Item = &'a CommodityID> {
        self.commodities
            .iter()
            .filter(move |c| &c.site_id == site_id && c.kind == kind)
            .map(|c| &c.id)
    }

    /// Iterate over the stock commodities (fuels) at a site
    pub fn stock_commodities<'a>(
        &'a self,
        site_id: &'a SiteID,
    ) -> impl Iterator<Item = &'a CommodityID> {
        self.commodities_of_type(site_id, CommodityType::Stock)
    }

    /// Iterate over the intermittent supply commodities at a site
    pub fn supim_commodities<'a>(
        &'a self,
        site_id: &'a SiteID,
    ) -> impl Iterator<Item = &'a CommodityID> {
        self.commodities_of_type(site_id, CommodityType::SupIm)
    }

    /// Iterate over the processes at a site which consume the given commodity
    pub fn processes_consuming<'a>(
        &'a self,
        site_id: &'a SiteID,
        commodity_id: &'a CommodityID,
    ) -> impl Iterator<Item = &'a Process> {
        self.processes
            .iter()
            .filter(move |p| &p.site_id == site_id && &p.input == commodity_id)
    }

    /// Iterate over the storage units at a site
    pub fn storages_at<'a>(&'a self, site_id: &'a SiteID) -> impl Iterator<Item = &'a Storage> {
        self.storages.iter().filter(move |s| &s.site_id == site_id)
    }

    /// Iterate over the transmission lines fed by a site
    pub fn corridors_from<'a>(
        &'a self,
        site_id: &'a SiteID,
    ) -> impl Iterator<Item = &'a Transmission> {
        self.transmissions
            .iter()
            .filter(move |t| &t.site_in == site_id)
    }

    /// Whether the given storage unit is declared at the site
    pub fn has_storage(&self, site_id: &SiteID, storage_id: &StorageID) -> bool {
        self.storages_at(site_id).any(|s| &s.id == storage_id)
    }

    /// Whether the given process is declared at the site
    pub fn has_process(&self, site_id: &SiteID, process_id: &ProcessID) -> bool {
        self.processes
            .iter()
            .any(|p| &p.site_id == site_id && &p.id == process_id)
    }

    /// Whether a corridor between the two sites is declared, in either direction
    pub fn has_corridor(&self, site1: &SiteID, site2: &SiteID, id: &TransmissionID) -> bool {
        self.transmissions.iter().any(|t| {
            &t.id == id
                && ((&t.site_in == site1 && &t.site_out == site2)
                    || (&t.site_in == site2 && &t.site_out == site1))
        })
    }
}
