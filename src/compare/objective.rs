//! Comparison of objective values.
use crate::model::SolvedModel;
use crate::report::Discrepancy;
use crate::resolver::{EntityClass, Quantity};
use crate::tolerance::{ObjectivePolicy, Tolerance};
use log::info;

/// Compare the total cost of the two models.
///
/// Returns `None` if the objectives are equal under the given policy.
pub fn compare_objectives(
    a: &SolvedModel,
    b: &SolvedModel,
    policy: ObjectivePolicy,
    tolerance: Tolerance,
) -> Option<Discrepancy> {
    let difference = a.objective - b.objective;
    let differs = match policy {
        ObjectivePolicy::Exact => difference != 0.0,
        ObjectivePolicy::Tolerance => tolerance.is_violated_by(difference),
    };
    if !differs {
        info!("Objective values are equal ({})", a.objective);
        return None;
    }

    Some(Discrepancy {
        step: None,
        class: EntityClass::Objective,
        site: None,
        entity: "total".into(),
        quantity: Quantity::Cost,
        value_a: a.objective,
        value_b: b.objective,
        difference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{ModelBuilder, topology};
    use crate::topology::Topology;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn models(topology: Topology, a: f64, b: f64) -> (SolvedModel, SolvedModel) {
        (
            ModelBuilder::indexed("urbs", topology.clone(), 2)
                .objective(a)
                .all_equal(1.0),
            ModelBuilder::network("oemof", topology, 2)
                .objective(b)
                .all_equal(1.0),
        )
    }

    #[rstest]
    #[case(ObjectivePolicy::Exact)]
    #[case(ObjectivePolicy::Tolerance)]
    fn test_equal_objectives(topology: Topology, #[case] policy: ObjectivePolicy) {
        let (a, b) = models(topology, 1.5e6, 1.5e6);
        assert_eq!(compare_objectives(&a, &b, policy, Tolerance::default()), None);
    }

    #[rstest]
    fn test_exact_policy_reports_any_difference(topology: Topology) {
        let (a, b) = models(topology, 1.5e6, 1.5e6 + 0.001);
        let discrepancy =
            compare_objectives(&a, &b, ObjectivePolicy::Exact, Tolerance::default()).unwrap();
        assert_eq!(discrepancy.quantity, Quantity::Cost);
        assert_approx_eq!(f64, discrepancy.difference, -0.001, epsilon = 1e-6);
    }

    #[rstest]
    fn test_tolerance_policy(topology: Topology) {
        let (a, b) = models(topology.clone(), 1.5e6, 1.5e6 + 0.001);
        assert_eq!(
            compare_objectives(&a, &b, ObjectivePolicy::Tolerance, Tolerance::default()),
            None
        );

        let (a, b) = models(topology, 200.0, 100.0);
        let discrepancy =
            compare_objectives(&a, &b, ObjectivePolicy::Tolerance, Tolerance::default()).unwrap();
        assert_approx_eq!(f64, discrepancy.difference, 100.0);
    }
}
