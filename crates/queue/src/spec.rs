//! Submission-time job description.

use flowctl_core::{FileRef, ResourceRequest};
use indexmap::IndexMap;

/// Everything a backend needs to submit one job: `local=remote` renames
/// for inputs/outputs, an environment map exported into the job, and an
/// optional resource request that backends are free to ignore in whole
/// or in part.
#[derive(Debug, Clone, Default)]
pub struct JobSpec {
    pub command: String,
    pub input_files: Vec<FileRef>,
    pub output_files: Vec<FileRef>,
    pub env: IndexMap<String, String>,
    pub resources: ResourceRequest,
}

impl JobSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    flowctl_core::setters! {
        into { command: String }
    }

    pub fn with_inputs(mut self, files: Vec<FileRef>) -> Self {
        self.input_files = files;
        self
    }

    pub fn with_outputs(mut self, files: Vec<FileRef>) -> Self {
        self.output_files = files;
        self
    }

    pub fn with_resources(mut self, resources: ResourceRequest) -> Self {
        self.resources = resources;
        self
    }
}
