//! The outcome of a comparison and its console rendering.
use crate::resolver::{EntityClass, NotFound, Quantity};
use crate::tolerance::Tolerance;
use crate::topology::SiteID;
use indexmap::IndexMap;
use std::fmt;

/// The width of the separator line between report sections
const SEPARATOR_WIDTH: usize = 52;

/// A compared value which differs between the two models by at least the tolerance
#[derive(PartialEq, Clone, Debug)]
pub struct Discrepancy {
    /// The logical timestep, or `None` for capacities and the objective
    pub step: Option<u32>,
    /// The class of the entity
    pub class: EntityClass,
    /// The site of the entity, if it has one
    pub site: Option<SiteID>,
    /// The entity's identity
    pub entity: String,
    /// The quantity compared
    pub quantity: Quantity,
    /// The value in the first model
    pub value_a: f64,
    /// The value in the second model
    pub value_b: f64,
    /// `value_a - value_b`
    pub difference: f64,
}

/// A pair of per-step values, kept for plotting
#[derive(PartialEq, Clone, Debug)]
pub struct SeriesPoint {
    /// The class of the entity
    pub class: EntityClass,
    /// The site of the entity
    pub site: SiteID,
    /// The entity's identity
    pub entity: String,
    /// The quantity compared
    pub quantity: Quantity,
    /// The logical timestep
    pub step: u32,
    /// The value in the first model
    pub value_a: f64,
    /// The value in the second model
    pub value_b: f64,
}

/// A pair of capacities, kept for plotting
#[derive(PartialEq, Clone, Debug)]
pub struct CapacityPair {
    /// The class of the entity
    pub class: EntityClass,
    /// The site of the entity
    pub site: SiteID,
    /// The entity's identity
    pub entity: String,
    /// The capacity quantity (content capacity or power)
    pub quantity: Quantity,
    /// The value in the first model
    pub value_a: f64,
    /// The value in the second model
    pub value_b: f64,
}

/// The discrepancies found for one class of entity at one site
#[derive(PartialEq, Clone, Debug)]
pub struct Section {
    /// The class of entity
    pub class: EntityClass,
    /// The site
    pub site: SiteID,
    /// Discrepancies in the order they were found
    pub discrepancies: Vec<Discrepancy>,
}

/// The complete outcome of comparing two models
#[derive(PartialEq, Clone, Debug)]
pub struct Report {
    /// The name of the first model
    pub model_a: String,
    /// The name of the second model
    pub model_b: String,
    /// The tolerance used
    pub tolerance: Tolerance,
    /// One section per class and site, in the order scanned
    pub sections: Vec<Section>,
    /// The objective discrepancy, if the objective was compared and differs
    pub objective: Option<Discrepancy>,
    /// Entities or quantities which could not be compared
    pub not_found: Vec<NotFound>,
    /// The number of value pairs compared, by class and quantity
    pub checks: IndexMap<(EntityClass, Quantity), usize>,
    /// Every compared per-step value pair
    pub series: Vec<SeriesPoint>,
    /// Every compared capacity pair
    pub capacities: Vec<CapacityPair>,
}

impl Report {
    /// Create an empty report
    pub fn new(model_a: &str, model_b: &str, tolerance: Tolerance) -> Self {
        Self {
            model_a: model_a.into(),
            model_b: model_b.into(),
            tolerance,
            sections: Vec::new(),
            objective: None,
            not_found: Vec::new(),
            checks: IndexMap::new(),
            series: Vec::new(),
            capacities: Vec::new(),
        }
    }

    /// Append the contents of another report for the same pair of models
    pub fn merge(&mut self, other: Report) {
        self.sections.extend(other.sections);
        self.not_found.extend(other.not_found);
        for (key, count) in other.checks {
            *self.checks.entry(key).or_default() += count;
        }
        self.series.extend(other.series);
        self.capacities.extend(other.capacities);
        if other.objective.is_some() {
            self.objective = other.objective;
        }
    }

    /// Record that a pair of values was compared
    pub fn count_check(&mut self, class: EntityClass, quantity: Quantity) {
        *self.checks.entry((class, quantity)).or_default() += 1;
    }

    /// The number of value pairs compared for a class and quantity
    pub fn checks_for(&self, class: EntityClass, quantity: Quantity) -> usize {
        self.checks.get(&(class, quantity)).copied().unwrap_or(0)
    }

    /// Iterate over every discrepancy, including the objective
    pub fn discrepancies(&self) -> impl Iterator<Item = &Discrepancy> {
        self.sections
            .iter()
            .flat_map(|section| &section.discrepancies)
            .chain(&self.objective)
    }

    /// Whether the models agree everywhere they could be compared
    pub fn is_clean(&self) -> bool {
        self.discrepancies().next().is_none()
    }
}

fn write_separator(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", "-".repeat(SEPARATOR_WIDTH))
}

fn write_discrepancy(f: &mut fmt::Formatter<'_>, d: &Discrepancy) -> fmt::Result {
    if let Some(step) = d.step {
        write!(f, "{step}")?;
    }
    writeln!(
        f,
        "\t{} {}\t{}\tDiff: {:.1}",
        d.class, d.quantity, d.entity, d.difference
    )
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            write_separator(f)?;
            writeln!(
                f,
                "i\t{} {}\t({} - {})",
                section.class, section.site, self.model_a, self.model_b
            )?;
            for discrepancy in &section.discrepancies {
                write_discrepancy(f, discrepancy)?;
            }
        }

        if let Some(objective) = &self.objective {
            write_separator(f)?;
            writeln!(f, "i\tObjective\t({} - {})", self.model_a, self.model_b)?;
            writeln!(f, "\t{}\t{}", self.model_a, objective.value_a)?;
            writeln!(f, "\t{}\t{}", self.model_b, objective.value_b)?;
            write_discrepancy(f, objective)?;
        }

        if !self.not_found.is_empty() {
            write_separator(f)?;
            writeln!(f, "Not found")?;
            for not_found in &self.not_found {
                writeln!(f, "\t{not_found}")?;
            }
        }

        write_separator(f)
    }
}
