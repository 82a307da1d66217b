use serde::Deserialize;
use thiserror::Error;

/// One channel-access policy under comparison.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolicySpec {
    /// Numeric code carried in the log description (`cb` sub-field).
    pub code: u32,
    /// Short label used in report headers.
    pub label: String,
}

/// Study-wide constants. The defaults match the central-scenario
/// channel-bonding study.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudyConfig {
    /// Expected number of scenarios per (policy, load) cell.
    pub num_scenarios: u32,
    /// Ordered set of offered-load levels.
    pub traffic_loads: Vec<u32>,
    pub policies: Vec<PolicySpec>,
    /// Time units over which `packets_generated` was counted.
    pub sim_time: f64,
    /// Relative width of the load-accomplishment tolerance band.
    pub throughput_delta_factor: f64,
    /// Minimum delay difference (time units) for a win in the pairwise
    /// comparison; smaller differences are draws.
    pub delay_delta: f64,
    /// First policy of the designated comparison pair, by code.
    pub compare_p1: u32,
    /// Second policy of the designated comparison pair, by code.
    pub compare_p2: u32,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            num_scenarios: 200,
            traffic_loads: vec![1, 20, 40, 60, 80, 100, 120, 140, 160, 180, 200, 220, 240],
            policies: vec![
                PolicySpec { code: 0, label: "OP".to_string() },
                PolicySpec { code: 2, label: "SCB".to_string() },
                PolicySpec { code: 4, label: "AM".to_string() },
                PolicySpec { code: 6, label: "PU".to_string() },
            ],
            sim_time: 25.0,
            throughput_delta_factor: 0.05,
            delay_delta: 1.0,
            compare_p1: 4,
            compare_p2: 6,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("num_scenarios must be positive")]
    ZeroScenarios,
    #[error("sim_time must be positive")]
    NonPositiveSimTime,
    #[error("traffic_loads must not be empty")]
    NoLoads,
    #[error("duplicate traffic load {0}")]
    DuplicateLoad(u32),
    #[error("policies must not be empty")]
    NoPolicies,
    #[error("duplicate policy code {0}")]
    DuplicatePolicyCode(u32),
    #[error("duplicate policy label `{0}`")]
    DuplicatePolicyLabel(String),
    #[error("comparison policy code {0} is not a configured policy")]
    UnknownComparePolicy(u32),
}

impl StudyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_scenarios == 0 {
            return Err(ConfigError::ZeroScenarios);
        }
        if self.sim_time <= 0.0 {
            return Err(ConfigError::NonPositiveSimTime);
        }
        if self.traffic_loads.is_empty() {
            return Err(ConfigError::NoLoads);
        }
        let mut seen_loads = Vec::new();
        for &load in &self.traffic_loads {
            if seen_loads.contains(&load) {
                return Err(ConfigError::DuplicateLoad(load));
            }
            seen_loads.push(load);
        }
        if self.policies.is_empty() {
            return Err(ConfigError::NoPolicies);
        }
        for (i, policy) in self.policies.iter().enumerate() {
            for earlier in &self.policies[..i] {
                if earlier.code == policy.code {
                    return Err(ConfigError::DuplicatePolicyCode(policy.code));
                }
                if earlier.label == policy.label {
                    return Err(ConfigError::DuplicatePolicyLabel(policy.label.clone()));
                }
            }
        }
        for pair_code in [self.compare_p1, self.compare_p2] {
            if self.policy(pair_code).is_none() {
                return Err(ConfigError::UnknownComparePolicy(pair_code));
            }
        }
        Ok(())
    }

    pub fn policy(&self, code: u32) -> Option<&PolicySpec> {
        self.policies.iter().find(|p| p.code == code)
    }

    /// Label for a policy code; falls back to the bare code for records
    /// whose policy is not part of the configured study.
    pub fn policy_label(&self, code: u32) -> String {
        match self.policy(code) {
            Some(p) => p.label.clone(),
            None => code.to_string(),
        }
    }
}
