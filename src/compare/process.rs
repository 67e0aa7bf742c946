//! Comparison of conversion processes.
use super::{ResolveFn, compare_classes};
use crate::model::SolvedModel;
use crate::report::Report;
use crate::resolver::{EntityClass, Resolver};
use crate::tolerance::Tolerance;
use anyhow::Result;

/// Compare the capacity and output of every process, first those fuelled by stock commodities and
/// then those driven by intermittent supplies
pub fn compare_processes(
    a: &SolvedModel,
    b: &SolvedModel,
    tolerance: Tolerance,
) -> Result<Report> {
    compare_classes(
        a,
        b,
        tolerance,
        &[
            (
                EntityClass::Process,
                Resolver::resolve_process_entities as ResolveFn,
            ),
            (
                EntityClass::Renewable,
                Resolver::resolve_renewable_entities as ResolveFn,
            ),
        ],
    )
}
