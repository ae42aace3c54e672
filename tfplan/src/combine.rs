//! Recombination of an edited skeleton with the edited dynamic values.

use anyhow::{bail, Result};
use tracing::warn;

use crate::plan::{Backend, Change, Plan, ResourceInstanceChange};

/// Merge the dynamic values of `values` into a copy of `skeleton`.
///
/// Both plans must have come out of the same original, so entries correspond
/// by position. Only non-empty values are taken from `values`; every other
/// field, including anything the user changed in the skeleton, comes from
/// `skeleton`.
pub fn combine(skeleton: &Plan, values: &Plan) -> Result<Plan> {
    let mut merged = skeleton.clone();

    for (name, value) in &values.variables {
        if !value.is_empty() {
            merged.variables.insert(name.clone(), value.clone());
        }
    }

    merge_changes("resource change", &mut merged.resource_changes, &values.resource_changes)?;
    merge_changes("resource drift", &mut merged.resource_drift, &values.resource_drift)?;

    for (index, deferred) in values.deferred_changes.iter().enumerate() {
        let Some(source) = &deferred.change else {
            continue;
        };
        if !has_values(source.change.as_ref()) {
            continue;
        }
        let Some(target) = merged.deferred_changes.get_mut(index) else {
            bail!(
                "deferred change {} ({}) has no counterpart in the edited plan",
                index,
                source.addr
            );
        };
        let target = target.change.get_or_insert_with(Default::default);
        merge_change("deferred change", index, target, source);
    }

    for (index, output) in values.output_changes.iter().enumerate() {
        if !has_values(output.change.as_ref()) {
            continue;
        }
        let Some(target) = merged.output_changes.get_mut(index) else {
            bail!(
                "output change {} ({}) has no counterpart in the edited plan",
                index,
                output.name
            );
        };
        if target.name != output.name {
            warn!(index, skeleton = %target.name, values = %output.name, "output change names differ");
        }
        copy_values(&mut target.change, &output.change);
    }

    if let Some(config) = values.backend.as_ref().and_then(|b| b.config.as_ref()) {
        if !config.is_empty() {
            merged
                .backend
                .get_or_insert_with(Backend::default)
                .config = Some(config.clone());
        }
    }

    Ok(merged)
}

fn has_values(change: Option<&Change>) -> bool {
    change.is_some_and(|c| !c.values.is_empty())
}

fn merge_changes(
    kind: &str,
    merged: &mut [ResourceInstanceChange],
    values: &[ResourceInstanceChange],
) -> Result<()> {
    for (index, source) in values.iter().enumerate() {
        if !has_values(source.change.as_ref()) {
            continue;
        }
        let Some(target) = merged.get_mut(index) else {
            bail!(
                "{} {} ({}) has no counterpart in the edited plan",
                kind,
                index,
                source.addr
            );
        };
        merge_change(kind, index, target, source);
    }
    Ok(())
}

fn merge_change(
    kind: &str,
    index: usize,
    target: &mut ResourceInstanceChange,
    source: &ResourceInstanceChange,
) {
    if target.addr != source.addr {
        warn!(
            kind,
            index,
            skeleton = %target.addr,
            values = %source.addr,
            "addresses differ, merging by position"
        );
    }
    copy_values(&mut target.change, &source.change);
}

fn copy_values(target: &mut Option<Change>, source: &Option<Change>) {
    if let Some(source) = source {
        target.get_or_insert_with(Change::default).values = source.values.clone();
    }
}
