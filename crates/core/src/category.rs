//! Named groups of nodes sharing resource requests and allocation policy.

use crate::resource::ResourceRequest;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationMode {
    MaxThroughput,
    MinWaste,
    Fixed,
}

crate::simple_display! {
    AllocationMode {
        MaxThroughput => "max-throughput",
        MinWaste => "min-waste",
        Fixed => "fixed",
    }
}

pub type VarScope = IndexMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: SmolStr,
    pub resources: ResourceRequest,
    pub allocation_mode: AllocationMode,
    pub scope: VarScope,
}

impl Category {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            resources: ResourceRequest::new(),
            allocation_mode: AllocationMode::MaxThroughput,
            scope: VarScope::new(),
        }
    }
}

pub const DEFAULT_CATEGORY: &str = "default";

#[cfg(test)]
#[path = "category_tests.rs"]
mod tests;
