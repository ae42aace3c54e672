//! Decomposition of a plan into the skeleton and the dynamic values.

use anyhow::Result;
use std::fmt;

use crate::plan::{Change, DynamicValue, Plan};

/// Where a dynamic value lives in a [`Plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueLocation<'a> {
    Variable { name: &'a str },
    /// `index` is the position in the change's `values`.
    ResourceChange { addr: &'a str, index: usize },
    ResourceDrift { addr: &'a str, index: usize },
    DeferredChange { addr: &'a str, index: usize },
    OutputChange { name: &'a str, index: usize },
    BackendConfig,
}

impl ValueLocation<'_> {
    /// A short tag identifying the location, used in file names and errors.
    pub fn description(&self) -> String {
        match self {
            ValueLocation::Variable { name } => format!("plan_variable_{}", name),
            ValueLocation::ResourceChange { addr, index } => {
                format!("resource_change_{}_{}", addr, index)
            }
            ValueLocation::ResourceDrift { addr, index } => {
                format!("resource_drift_{}_{}", addr, index)
            }
            ValueLocation::DeferredChange { addr, index } => {
                format!("deferred_change_{}_{}", addr, index)
            }
            ValueLocation::OutputChange { name, index } => {
                format!("output_change_{}_{}", name, index)
            }
            ValueLocation::BackendConfig => "backend_config".to_string(),
        }
    }
}

impl fmt::Display for ValueLocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Copy `plan` with every dynamic value cleared.
///
/// Variable keys are kept with empty values and the backend keeps an empty
/// config when it had one, so the skeleton still shows where the values go.
pub fn split_skeleton(plan: &Plan) -> Plan {
    let mut skeleton = plan.clone();

    for value in skeleton.variables.values_mut() {
        value.msgpack.clear();
    }

    let changes = skeleton
        .resource_changes
        .iter_mut()
        .chain(skeleton.resource_drift.iter_mut())
        .filter_map(|rc| rc.change.as_mut())
        .chain(
            skeleton
                .deferred_changes
                .iter_mut()
                .filter_map(|d| d.change.as_mut())
                .filter_map(|rc| rc.change.as_mut()),
        )
        .chain(
            skeleton
                .output_changes
                .iter_mut()
                .filter_map(|o| o.change.as_mut()),
        );
    for change in changes {
        change.values.clear();
    }

    if let Some(config) = skeleton.backend.as_mut().and_then(|b| b.config.as_mut()) {
        config.msgpack.clear();
    }

    skeleton
}

/// Copy `plan`, passing every non-empty dynamic value of the copy through
/// `edit` in discovery order.
pub fn split_values<F>(plan: &Plan, edit: &mut F) -> Result<Plan>
where
    F: FnMut(ValueLocation<'_>, &mut DynamicValue) -> Result<()>,
{
    let mut values = plan.clone();
    for_each_value(&mut values, edit)?;
    Ok(values)
}

/// Visit the dynamic values of `plan`: variables in key order, then resource
/// changes, drift, deferred changes, output changes and the backend config.
pub(crate) fn for_each_value<F>(plan: &mut Plan, edit: &mut F) -> Result<()>
where
    F: FnMut(ValueLocation<'_>, &mut DynamicValue) -> Result<()>,
{
    for (name, value) in plan.variables.iter_mut() {
        if !value.is_empty() {
            edit(ValueLocation::Variable { name }, value)?;
        }
    }

    for rc in plan.resource_changes.iter_mut() {
        let addr = rc.addr.as_str();
        for_each_change_value(rc.change.as_mut(), |index, value| {
            edit(ValueLocation::ResourceChange { addr, index }, value)
        })?;
    }

    for rc in plan.resource_drift.iter_mut() {
        let addr = rc.addr.as_str();
        for_each_change_value(rc.change.as_mut(), |index, value| {
            edit(ValueLocation::ResourceDrift { addr, index }, value)
        })?;
    }

    for rc in plan.deferred_changes.iter_mut().filter_map(|d| d.change.as_mut()) {
        let addr = rc.addr.as_str();
        for_each_change_value(rc.change.as_mut(), |index, value| {
            edit(ValueLocation::DeferredChange { addr, index }, value)
        })?;
    }

    for output in plan.output_changes.iter_mut() {
        let name = output.name.as_str();
        for_each_change_value(output.change.as_mut(), |index, value| {
            edit(ValueLocation::OutputChange { name, index }, value)
        })?;
    }

    if let Some(config) = plan.backend.as_mut().and_then(|b| b.config.as_mut()) {
        if !config.is_empty() {
            edit(ValueLocation::BackendConfig, config)?;
        }
    }

    Ok(())
}

fn for_each_change_value(
    change: Option<&mut Change>,
    mut edit: impl FnMut(usize, &mut DynamicValue) -> Result<()>,
) -> Result<()> {
    let Some(change) = change else {
        return Ok(());
    };
    for (index, value) in change.values.iter_mut().enumerate() {
        if !value.is_empty() {
            edit(index, value)?;
        }
    }
    Ok(())
}
