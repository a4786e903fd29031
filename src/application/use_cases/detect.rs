use std::sync::Arc;

use crate::application::dto::MatchResult;
use crate::application::provider::DataSetProvider;
use crate::application::use_cases::{match_user_agent, project_properties, resolve_profiles};
use crate::domain::DataSet;

/// Match, resolve and project in one call
pub fn detect(dataset: &DataSet, input: &str) -> MatchResult {
    let matched = match_user_agent(dataset, input);
    let profiles = resolve_profiles(dataset, &matched);
    let projection = project_properties(dataset, &profiles);

    MatchResult {
        profile_ids: profiles.profile_ids(),
        device_id: profiles.device_id(),
        properties: projection.entries,
        partial: projection.partial,
        difference: matched.difference,
        method: matched.method,
        metrics: matched.metrics,
    }
}

/// Use case: detect a device against the provider's active dataset
pub struct DetectDeviceUseCase {
    provider: Arc<DataSetProvider>,
}

impl DetectDeviceUseCase {
    pub fn new(provider: Arc<DataSetProvider>) -> Self {
        Self { provider }
    }

    pub fn execute(&self, input: &str) -> MatchResult {
        let dataset = self.provider.current();
        detect(&dataset, input)
    }

    /// Detect several inputs against one dataset snapshot
    pub fn execute_batch<'a, I>(&self, inputs: I) -> Vec<MatchResult>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let dataset = self.provider.current();
        inputs.into_iter().map(|input| detect(&dataset, input)).collect()
    }
}
