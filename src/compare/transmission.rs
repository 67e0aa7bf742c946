//! Comparison of transmission corridors.
use super::{ResolveFn, compare_classes};
use crate::model::SolvedModel;
use crate::report::Report;
use crate::resolver::{EntityClass, Resolver};
use crate::tolerance::Tolerance;
use anyhow::Result;

/// Compare the capacity and the flows in both directions of every transmission corridor.
///
/// Each corridor is visited once from each of its ends. The result does not depend on which
/// orientation either model uses to store a corridor.
pub fn compare_transmission(
    a: &SolvedModel,
    b: &SolvedModel,
    tolerance: Tolerance,
) -> Result<Report> {
    compare_classes(
        a,
        b,
        tolerance,
        &[(
            EntityClass::Transmission,
            Resolver::resolve_transmission_entities as ResolveFn,
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
    use itertools::Itertools;
    use rstest::rstest;

    fn flows(id: &EntityId, quantity: Quantity, step: Option<u32>) -> f64 {
        match (id, quantity, step) {
            (EntityId::Transmission { site, other, .. }, Quantity::Out, Some(step)) => {
                f64::from(step) + site.0.len() as f64 - other.0.len() as f64
            }
            _ => 50.0,
        }
    }

    #[rstest]
    fn test_orientation_invariance(topology: Topology) {
        let a = ModelBuilder::indexed("urbs", topology.clone(), 4).build(flows);
        let b = ModelBuilder::network("oemof", topology.clone(), 4).all_equal(50.0);
        let b_reversed = ModelBuilder::network("oemof", topology, 4)
            .single_orientation()
            .all_equal(50.0);

        let report = compare_transmission(&a, &b, Tolerance::default()).unwrap();
        let reversed = compare_transmission(&a, &b_reversed, Tolerance::default()).unwrap();
        assert!(report.not_found.is_empty());
        assert!(!report.is_clean());
        assert_eq!(report.to_string(), reversed.to_string());
        assert_eq!(report.checks, reversed.checks);
    }

    #[rstest]
    fn test_corridors_visited_from_both_ends(topology: Topology) {
        let a = ModelBuilder::indexed("urbs", topology.clone(), 10).all_equal(50.0);
        let b = ModelBuilder::network("oemof", topology, 10).all_equal(50.0);

        let report = compare_transmission(&a, &b, Tolerance::default()).unwrap();
        assert!(report.is_clean());
        assert_eq!(
            report.checks_for(EntityClass::Transmission, Quantity::Capacity),
            6
        );
        assert_eq!(report.checks_for(EntityClass::Transmission, Quantity::In), 60);
        assert_eq!(report.checks_for(EntityClass::Transmission, Quantity::Out), 60);

        let corridors = report
            .capacities
            .iter()
            .map(|pair| {
                let (site, other) = pair.entity.split_once('_').unwrap();
                if site < other {
                    (site.to_string(), other.to_string())
                } else {
                    (other.to_string(), site.to_string())
                }
            })
            .unique()
            .count();
        assert_eq!(corridors, 3);
    }

    #[rstest]
    fn test_out_flow_discrepancy(topology: Topology) {
        let a = ModelBuilder::indexed("urbs", topology.clone(), 2).all_equal(50.0);
        let b = ModelBuilder::network("oemof", topology, 2).build(|id, quantity, step| {
            match (id, quantity, step) {
                (EntityId::Transmission { site, other, .. }, Quantity::Out, Some(2))
                    if site.0.as_ref() == "South" && other.0.as_ref() == "Mid" =>
                {
                    47.5
                }
                _ => 50.0,
            }
        });

        let report = compare_transmission(&a, &b, Tolerance::default()).unwrap();
        let discrepancies = report.discrepancies().collect_vec();
        assert_eq!(discrepancies.len(), 1);
        assert_eq!(discrepancies[0].entity, "South_Mid");
        assert_eq!(discrepancies[0].step, Some(2));
        assert_approx_eq!(f64, discrepancies[0].difference, 2.5);
    }

    #[rstest]
    fn test_reversed_indexed_flows_not_compared(topology: Topology) {
        let mut declared = topology.clone();
        declared
            .transmissions
            .retain(|t| t.site_in.0.as_ref() == "Mid" && t.site_out.0.as_ref() == "South");
        let mut stored = declared.clone();
        let line = &mut stored.transmissions[0];
        std::mem::swap(&mut line.site_in, &mut line.site_out);
        let mut a = ModelBuilder::indexed("urbs", stored, 3).all_equal(99.0);
        a.topology = declared;
        let b = ModelBuilder::network("oemof", topology, 3).all_equal(50.0);

        let report = compare_transmission(&a, &b, Tolerance::default()).unwrap();
        assert!(
            report
                .discrepancies()
                .all(|d| d.quantity == Quantity::Capacity)
        );
        assert_eq!(report.checks_for(EntityClass::Transmission, Quantity::In), 0);
        assert_eq!(report.checks_for(EntityClass::Transmission, Quantity::Out), 0);
        assert_eq!(
            report.not_found.iter().map(|nf| nf.quantity).collect_vec(),
            [Some(Quantity::In), Some(Quantity::Out)]
        );
    }
}
