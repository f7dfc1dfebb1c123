//! Workflow step graphs
//!
//! Each flow declares its steps and the transitions allowed out of each one.
//! Moving along an undeclared edge is an `InvalidStateTransition`.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::utils::errors::{GearError, Result};
use super::context::FlowContext;

/// Steps shared by both flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    Scan,
    ConfirmItem,
    Photo,
    Cart,
    Processing,
    Success,
}

impl FlowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStep::Scan => "scan",
            FlowStep::ConfirmItem => "confirm_item",
            FlowStep::Photo => "photo",
            FlowStep::Cart => "cart",
            FlowStep::Processing => "processing",
            FlowStep::Success => "success",
        }
    }
}

impl std::fmt::Display for FlowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which workflow a context belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    /// Multi-item cart with condition photos
    Cart,
    /// One item or quantity per scan
    QuickScan,
}

/// Step graph of one flow
#[derive(Debug, Clone)]
pub struct FlowDefinition {
    pub kind: FlowKind,
    pub initial_step: FlowStep,
    /// Allowed next steps per step
    pub steps: HashMap<FlowStep, Vec<FlowStep>>,
}

impl FlowDefinition {
    pub fn allows(&self, from: FlowStep, to: FlowStep) -> bool {
        self.steps
            .get(&from)
            .map(|next| next.contains(&to))
            .unwrap_or(false)
    }
}

/// Flow manager holding every step graph
#[derive(Debug, Clone)]
pub struct FlowManager {
    flows: HashMap<FlowKind, FlowDefinition>,
}

impl Default for FlowManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowManager {
    /// Create a new flow manager with both default flows
    pub fn new() -> Self {
        let mut manager = Self {
            flows: HashMap::new(),
        };
        manager.register_flow(create_cart_flow());
        manager.register_flow(create_quick_scan_flow());
        manager
    }

    pub fn register_flow(&mut self, flow: FlowDefinition) {
        self.flows.insert(flow.kind, flow);
    }

    pub fn get_flow(&self, kind: FlowKind) -> Option<&FlowDefinition> {
        self.flows.get(&kind)
    }

    /// Move the context to `to` if the flow allows it
    pub fn transition(&self, context: &mut FlowContext, to: FlowStep) -> Result<()> {
        let flow = self
            .get_flow(context.kind)
            .ok_or_else(|| GearError::InvalidInput(format!("Unknown flow: {:?}", context.kind)))?;

        if !flow.allows(context.step, to) {
            return Err(GearError::InvalidStateTransition {
                from: context.step.to_string(),
                to: to.to_string(),
            });
        }

        tracing::debug!(flow = ?context.kind, from = %context.step, to = %to, "Flow step changed");
        context.step = to;
        Ok(())
    }

    /// Fail unless the context is currently at `step`
    pub fn require_step(&self, context: &FlowContext, step: FlowStep, action: &str) -> Result<()> {
        if context.step != step {
            return Err(GearError::InvalidStateTransition {
                from: context.step.to_string(),
                to: action.to_string(),
            });
        }
        Ok(())
    }
}

/// Scan → ConfirmItem → Photo → Scan … → Cart → Processing → Success
fn create_cart_flow() -> FlowDefinition {
    let mut steps = HashMap::new();
    steps.insert(FlowStep::Scan, vec![FlowStep::ConfirmItem, FlowStep::Cart]);
    steps.insert(FlowStep::ConfirmItem, vec![FlowStep::Photo, FlowStep::Scan]);
    steps.insert(FlowStep::Photo, vec![FlowStep::Scan]);
    steps.insert(FlowStep::Cart, vec![FlowStep::Scan, FlowStep::Processing]);
    steps.insert(FlowStep::Processing, vec![FlowStep::Success, FlowStep::Cart]);
    steps.insert(FlowStep::Success, vec![FlowStep::Scan]);

    FlowDefinition {
        kind: FlowKind::Cart,
        initial_step: FlowStep::Scan,
        steps,
    }
}

/// Scan → ConfirmItem → Processing → Success | ConfirmItem
fn create_quick_scan_flow() -> FlowDefinition {
    let mut steps = HashMap::new();
    steps.insert(FlowStep::Scan, vec![FlowStep::ConfirmItem]);
    steps.insert(FlowStep::ConfirmItem, vec![FlowStep::Processing, FlowStep::Scan]);
    steps.insert(FlowStep::Processing, vec![FlowStep::Success, FlowStep::ConfirmItem]);
    steps.insert(FlowStep::Success, vec![FlowStep::Scan]);

    FlowDefinition {
        kind: FlowKind::QuickScan,
        initial_step: FlowStep::Scan,
        steps,
    }
}
