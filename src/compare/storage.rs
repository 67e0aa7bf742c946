//! Comparison of storage units.
use super::{ResolveFn, compare_classes};
use crate::model::SolvedModel;
use crate::report::Report;
use crate::resolver::{EntityClass, Resolver};
use crate::tolerance::Tolerance;
use anyhow::Result;

/// Compare the content capacity, power, charging, discharging and state of charge of every
/// storage unit
pub fn compare_storages(a: &SolvedModel, b: &SolvedModel, tolerance: Tolerance) -> Result<Report> {
    compare_classes(
        a,
        b,
        tolerance,
        &[(
            EntityClass::Storage,
            Resolver::resolve_storage_entities as ResolveFn,
        )],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{ModelBuilder, topology};
    use crate::resolver::{EntityId, Quantity};
    use crate::topology::Topology;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn is_site(id: &EntityId, site: &str) -> bool {
        id.site().0.as_ref() == site
    }

    #[rstest]
    fn test_capacity_mismatch(topology: Topology) {
        let a = ModelBuilder::indexed("urbs", topology.clone(), 3).all_equal(500.0);
        let b = ModelBuilder::network("oemof", topology, 3).build(|id, quantity, _| {
            if is_site(id, "Mid") && quantity == Quantity::Capacity {
                500.15
            } else {
                500.0
            }
        });

        let report = compare_storages(&a, &b, Tolerance::new(0.1).unwrap()).unwrap();
        let discrepancies = report.discrepancies().collect::<Vec<_>>();
        assert_eq!(discrepancies.len(), 1);
        let d = discrepancies[0];
        assert_eq!(d.step, None);
        assert_eq!(d.quantity, Quantity::Capacity);
        assert_eq!(d.site, Some("Mid".into()));
        assert_approx_eq!(f64, d.value_a, 500.0);
        assert_approx_eq!(f64, d.value_b, 500.15);
        assert_approx_eq!(f64, d.difference, -0.15, epsilon = 1e-9);
    }

    #[rstest]
    #[case(10.25, true)]
    #[case(10.2, false)]
    fn test_tolerance_boundary(topology: Topology, #[case] value: f64, #[case] reported: bool) {
        let a = ModelBuilder::indexed("urbs", topology.clone(), 2).build(|_, quantity, _| {
            if quantity == Quantity::Power {
                value
            } else {
                10.0
            }
        });
        let b = ModelBuilder::network("oemof", topology, 2).all_equal(10.0);

        let report = compare_storages(&a, &b, Tolerance::new(0.25).unwrap()).unwrap();
        assert_eq!(
            report.discrepancies().count(),
            if reported { 3 } else { 0 }
        );
    }

    #[rstest]
    fn test_content_lag(topology: Topology) {
        let content = [10.0, 8.0, 6.0];
        let value = move |_: &EntityId, quantity: Quantity, step: Option<u32>| {
            match (quantity, step) {
                (Quantity::Content, Some(step)) => content[step as usize - 1],
                _ => 1.0,
            }
        };
        let a = ModelBuilder::indexed("urbs", topology.clone(), 3).build(value);
        let b = ModelBuilder::network("oemof", topology.clone(), 3).build(value);

        // Network positions 0, 1, 2 line up with indexed steps 1, 2, 3
        let report = compare_storages(&a, &b, Tolerance::default()).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.checks_for(EntityClass::Storage, Quantity::Content), 9);

        // Reading the network sequence without the offset would see [12, 10, 8]
        let unshifted = ModelBuilder::network("oemof", topology, 3).build(
            move |_: &EntityId, quantity: Quantity, step: Option<u32>| match (quantity, step) {
                (Quantity::Content, Some(step)) => content[step as usize - 1] + 2.0,
                _ => 1.0,
            },
        );
        let report = compare_storages(&a, &unshifted, Tolerance::default()).unwrap();
        assert_eq!(report.discrepancies().count(), 9);
        assert!(
            report
                .discrepancies()
                .all(|d| d.quantity == Quantity::Content && (d.difference + 2.0).abs() < 1e-12)
        );
    }

    #[rstest]
    fn test_missing_entity_isolation(topology: Topology) {
        let a = ModelBuilder::indexed("urbs", topology.clone(), 4).all_equal(1.0);
        let mut reduced = topology;
        reduced.storages.retain(|s| s.site_id.0.as_ref() != "North");
        let b = ModelBuilder::network("oemof", reduced, 4).all_equal(1.0);

        let report = compare_storages(&a, &b, Tolerance::default()).unwrap();
        assert_eq!(report.not_found.len(), 1);
        assert_eq!(report.not_found[0].site, "North".into());
        assert_eq!(report.not_found[0].quantity, None);
        assert!(report.is_clean());
        assert_eq!(report.checks_for(EntityClass::Storage, Quantity::Capacity), 2);
        assert_eq!(report.checks_for(EntityClass::Storage, Quantity::In), 8);
    }

    #[rstest]
    fn test_three_sites_ten_steps(topology: Topology) {
        let a = ModelBuilder::indexed("urbs", topology.clone(), 10)
            .build(|_, _, step| f64::from(step.unwrap_or(100)));
        let b = ModelBuilder::network("oemof", topology, 10)
            .build(|_, _, step| f64::from(step.unwrap_or(100)));

        let report = compare_storages(&a, &b, Tolerance::default()).unwrap();
        assert!(report.is_clean());
        assert!(report.not_found.is_empty());
        assert_eq!(report.checks_for(EntityClass::Storage, Quantity::Capacity), 3);
        assert_eq!(report.checks_for(EntityClass::Storage, Quantity::Power), 3);
        for quantity in [Quantity::In, Quantity::Out, Quantity::Content] {
            assert_eq!(report.checks_for(EntityClass::Storage, quantity), 30);
        }
        assert_eq!(report.series.len(), 90);
    }

    #[rstest]
    fn test_idempotent(topology: Topology) {
        let a = ModelBuilder::indexed("urbs", topology.clone(), 5)
            .build(|_, _, step| f64::from(step.unwrap_or(0)) * 1.5);
        let b = ModelBuilder::network("oemof", topology, 5).all_equal(2.0);

        let first = compare_storages(&a, &b, Tolerance::default()).unwrap();
        let second = compare_storages(&a, &b, Tolerance::default()).unwrap();
        assert!(!first.is_clean());
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(first, second);
    }
}
