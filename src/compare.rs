//! Comparison of the solved values of two models.
//!
//! Each comparison walks the sites of the first model in declaration order, resolves the entities
//! of one class at each site and compares their capacities and per-step values. Differences are
//! signed (`value_a - value_b`) and only those which meet the tolerance are reported.
use crate::model::SolvedModel;
use crate::report::{CapacityPair, Discrepancy, Report, Section, SeriesPoint};
use crate::resolver::{
    ComparisonEntity, EntityClass, KeyTemplate, NotFound, Quantity, QuantityKeys, Resolved,
    Resolver,
};
use crate::tolerance::{ObjectivePolicy, Tolerance};
use crate::topology::SiteID;
use anyhow::{Result, ensure};
use log::{debug, info, warn};

mod objective;
mod process;
mod storage;
mod transmission;
pub use objective::compare_objectives;
pub use process::compare_processes;
pub use storage::compare_storages;
pub use transmission::compare_transmission;

/// Resolves the entities of one class at a site
type ResolveFn<'a> = fn(&Resolver<'a>, &SiteID) -> Result<Resolved>;

/// Check that two models can be compared at all
pub fn check_preconditions(a: &SolvedModel, b: &SolvedModel) -> Result<()> {
    ensure!(
        !a.topology.is_empty(),
        "Model {} does not declare any sites",
        a.name
    );
    ensure!(
        a.timestep_count() == b.timestep_count(),
        "Models have different numbers of timesteps ({}: {}, {}: {})",
        a.name,
        a.timestep_count(),
        b.name,
        b.timestep_count()
    );

    Ok(())
}

/// Compare every entity class and the objective.
///
/// The sections of the report are ordered by class (storage, transmission, processes, renewables)
/// and then by site.
pub fn compare_all(
    a: &SolvedModel,
    b: &SolvedModel,
    tolerance: Tolerance,
    policy: ObjectivePolicy,
) -> Result<Report> {
    check_preconditions(a, b)?;
    info!(
        "Comparing {} ({}) against {} ({}) with tolerance {tolerance}",
        a.name,
        a.format(),
        b.name,
        b.format()
    );

    let mut report = compare_storages(a, b, tolerance)?;
    report.merge(compare_transmission(a, b, tolerance)?);
    report.merge(compare_processes(a, b, tolerance)?);
    report.count_check(EntityClass::Objective, Quantity::Cost);
    report.objective = compare_objectives(a, b, policy, tolerance);

    let count = report.discrepancies().count();
    if count == 0 {
        info!("No discrepancies found");
    } else {
        warn!("Found {count} discrepancies");
    }
    if !report.not_found.is_empty() {
        warn!(
            "{} entities or quantities could not be compared",
            report.not_found.len()
        );
    }

    Ok(report)
}

/// Compare the entity classes given by `classes` at every site of the first model
fn compare_classes<'a>(
    a: &'a SolvedModel,
    b: &'a SolvedModel,
    tolerance: Tolerance,
    classes: &[(EntityClass, ResolveFn<'a>)],
) -> Result<Report> {
    check_preconditions(a, b)?;

    let resolver = Resolver::new(a, b);
    let mut comparator = Comparator {
        a,
        b,
        tolerance,
        report: Report::new(&a.name, &b.name, tolerance),
    };
    for (class, resolve) in classes {
        for site in &a.topology.sites {
            let resolved = resolve(&resolver, site)?;
            let mut section = Section {
                class: *class,
                site: site.clone(),
                discrepancies: Vec::new(),
            };
            for entity in &resolved.entities {
                comparator.compare_entity(entity, &mut section)?;
            }
            comparator.report.not_found.extend(resolved.not_found);
            debug!(
                "{} {site}: {} entities, {} discrepancies",
                class,
                resolved.entities.len(),
                section.discrepancies.len()
            );
            comparator.report.sections.push(section);
        }
    }

    Ok(comparator.report)
}

/// Compares resolved entities, accumulating the results in a [`Report`]
struct Comparator<'a> {
    a: &'a SolvedModel,
    b: &'a SolvedModel,
    tolerance: Tolerance,
    report: Report,
}

impl Comparator<'_> {
    fn compare_entity(&mut self, entity: &ComparisonEntity, section: &mut Section) -> Result<()> {
        for quantity in &entity.quantities {
            if quantity.is_timed() {
                self.compare_series(entity, quantity, section)?;
            } else {
                self.compare_scalar(entity, quantity, section)?;
            }
        }

        Ok(())
    }

    /// Compare a value without a time dimension, such as a capacity
    fn compare_scalar(
        &mut self,
        entity: &ComparisonEntity,
        quantity: &QuantityKeys,
        section: &mut Section,
    ) -> Result<()> {
        let value_a = self.a.lookup(&quantity.keys.a.scalar())?;
        let value_b = self.b.lookup(&quantity.keys.b.scalar())?;
        let (Some(value_a), Some(value_b)) = (value_a, value_b) else {
            self.missing(entity, quantity, value_a.is_none(), value_b.is_none());
            return Ok(());
        };

        let class = entity.id.class();
        self.report.count_check(class, quantity.quantity);
        self.report.capacities.push(CapacityPair {
            class,
            site: entity.id.site().clone(),
            entity: entity.id.to_string(),
            quantity: quantity.quantity,
            value_a,
            value_b,
        });
        self.check(entity, quantity, None, value_a, value_b, section);

        Ok(())
    }

    /// Compare the values of a quantity at every modelled step.
    ///
    /// The complete series is read from both models before anything is compared, so that a
    /// missing series is reported once and skipped.
    fn compare_series(
        &mut self,
        entity: &ComparisonEntity,
        quantity: &QuantityKeys,
        section: &mut Section,
    ) -> Result<()> {
        let timesteps = self.a.timestep_count();
        if timesteps < 2 {
            debug!(
                "Skipping per-step {} of {} with {timesteps} timestep(s)",
                quantity.quantity, entity.id
            );
            return Ok(());
        }

        let series_a = read_series(self.a, &quantity.keys.a, timesteps)?;
        let series_b = read_series(self.b, &quantity.keys.b, timesteps)?;
        let (series_a, series_b) = match (series_a, series_b) {
            (Some(series_a), Some(series_b)) => (series_a, series_b),
            (series_a, series_b) => {
                self.missing(entity, quantity, series_a.is_none(), series_b.is_none());
                return Ok(());
            }
        };

        let class = entity.id.class();
        let values = series_a.into_iter().zip(series_b);
        for (step, (value_a, value_b)) in (1..=timesteps).zip(values) {
            self.report.count_check(class, quantity.quantity);
            self.report.series.push(SeriesPoint {
                class,
                site: entity.id.site().clone(),
                entity: entity.id.to_string(),
                quantity: quantity.quantity,
                step,
                value_a,
                value_b,
            });
            self.check(entity, quantity, Some(step), value_a, value_b, section);
        }

        Ok(())
    }

    /// Record a discrepancy if the values differ by at least the tolerance
    fn check(
        &self,
        entity: &ComparisonEntity,
        quantity: &QuantityKeys,
        step: Option<u32>,
        value_a: f64,
        value_b: f64,
        section: &mut Section,
    ) {
        let difference = value_a - value_b;
        if !self.tolerance.is_violated_by(difference) {
            return;
        }

        section.discrepancies.push(Discrepancy {
            step,
            class: entity.id.class(),
            site: Some(entity.id.site().clone()),
            entity: entity.id.to_string(),
            quantity: quantity.quantity,
            value_a,
            value_b,
            difference,
        });
    }

    /// Record that a quantity could not be read from one or both models
    fn missing(
        &mut self,
        entity: &ComparisonEntity,
        quantity: &QuantityKeys,
        missing_a: bool,
        missing_b: bool,
    ) {
        for (model, missing) in [(self.a, missing_a), (self.b, missing_b)] {
            if missing {
                warn!(
                    "{} of {} {} at {} is incomplete in {}",
                    quantity.quantity,
                    entity.id.class(),
                    entity.id,
                    entity.id.site(),
                    model.name
                );
                self.report.not_found.push(NotFound::new(
                    &entity.id,
                    Some(quantity.quantity),
                    model,
                ));
            }
        }
    }
}

/// Read the values of a timed key for steps `1..=timesteps`, or `None` if any is missing
fn read_series(
    model: &SolvedModel,
    key: &KeyTemplate,
    timesteps: u32,
) -> Result<Option<Vec<f64>>> {
    let mut values = Vec::with_capacity(timesteps as usize);
    for step in 1..=timesteps {
        match model.lookup(&key.at_step(step))? {
            Some(value) => values.push(value),
            None => return Ok(None),
        }
    }

    Ok(Some(values))
}
