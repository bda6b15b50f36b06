//! Study domain entities

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::filter::Filter;

// ============================================================================
// Param
// ============================================================================

/// A named parameter delivered to clients in an experiment group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Param {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

// ============================================================================
// FeatureAssociation
// ============================================================================

/// Feature flags an experiment group turns on or off
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureAssociation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enable_feature: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disable_feature: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forcing_feature_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forcing_feature_off: Option<String>,
}

impl FeatureAssociation {
    /// Add a feature to enable
    pub fn with_enable_feature(mut self, feature: impl Into<String>) -> Self {
        self.enable_feature.push(feature.into());
        self
    }

    /// Add a feature to disable
    pub fn with_disable_feature(mut self, feature: impl Into<String>) -> Self {
        self.disable_feature.push(feature.into());
        self
    }

    /// Force a feature on for clients carrying the group's forcing switch
    pub fn with_forcing_feature_on(mut self, feature: impl Into<String>) -> Self {
        self.forcing_feature_on = Some(feature.into());
        self
    }

    /// Force a feature off for clients carrying the group's forcing switch
    pub fn with_forcing_feature_off(mut self, feature: impl Into<String>) -> Self {
        self.forcing_feature_off = Some(feature.into());
        self
    }

    pub fn has_forcing_feature_on(&self) -> bool {
        self.forcing_feature_on.is_some()
    }

    pub fn has_forcing_feature_off(&self) -> bool {
        self.forcing_feature_off.is_some()
    }

    /// Whether the association enables or disables anything
    pub fn changes_features(&self) -> bool {
        !self.enable_feature.is_empty() || !self.disable_feature.is_empty()
    }

    /// Every feature name mentioned, in declaration order
    pub fn all_feature_names(&self) -> impl Iterator<Item = &str> {
        self.enable_feature
            .iter()
            .chain(&self.disable_feature)
            .chain(&self.forcing_feature_on)
            .chain(&self.forcing_feature_off)
            .map(String::as_str)
    }
}

// ============================================================================
// Experiment
// ============================================================================

/// One weighted group of a study
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability_weight: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_association: Option<FeatureAssociation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forcing_flag: Option<String>,
    #[serde(default, rename = "param", skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_web_experiment_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_web_trigger_experiment_id: Option<u64>,
}

impl Experiment {
    /// Create a new group with no weight set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    // Builder methods

    pub fn with_probability_weight(mut self, weight: u32) -> Self {
        self.probability_weight = Some(weight);
        self
    }

    pub fn with_feature_association(mut self, association: FeatureAssociation) -> Self {
        self.feature_association = Some(association);
        self
    }

    /// Enable a feature, creating the association if needed
    pub fn with_enable_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature_association = Some(
            self.feature_association
                .take()
                .unwrap_or_default()
                .with_enable_feature(feature),
        );
        self
    }

    /// Disable a feature, creating the association if needed
    pub fn with_disable_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature_association = Some(
            self.feature_association
                .take()
                .unwrap_or_default()
                .with_disable_feature(feature),
        );
        self
    }

    pub fn with_forcing_flag(mut self, flag: impl Into<String>) -> Self {
        self.forcing_flag = Some(flag.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push(Param::new(name, value));
        self
    }

    pub fn with_google_web_experiment_id(mut self, id: u64) -> Self {
        self.google_web_experiment_id = Some(id);
        self
    }

    pub fn with_google_web_trigger_experiment_id(mut self, id: u64) -> Self {
        self.google_web_trigger_experiment_id = Some(id);
        self
    }

    // Predicates and accessors

    /// Whether a weight was given, zero included
    pub fn has_probability_weight(&self) -> bool {
        self.probability_weight.is_some()
    }

    /// Weight with an absent value counted as zero
    pub fn weight(&self) -> u32 {
        self.probability_weight.unwrap_or(0)
    }

    pub fn has_forcing_flag(&self) -> bool {
        self.forcing_flag.is_some()
    }

    pub fn has_google_web_experiment_id(&self) -> bool {
        self.google_web_experiment_id.is_some()
    }

    pub fn has_google_web_trigger_experiment_id(&self) -> bool {
        self.google_web_trigger_experiment_id.is_some()
    }

    pub fn enabled_features(&self) -> &[String] {
        self.feature_association
            .as_ref()
            .map(|a| a.enable_feature.as_slice())
            .unwrap_or_default()
    }

    pub fn disabled_features(&self) -> &[String] {
        self.feature_association
            .as_ref()
            .map(|a| a.disable_feature.as_slice())
            .unwrap_or_default()
    }

    /// Whether the group leaves every feature in its default state
    pub fn keeps_default_features(&self) -> bool {
        !self
            .feature_association
            .as_ref()
            .is_some_and(FeatureAssociation::changes_features)
    }
}

// ============================================================================
// LayerReference
// ============================================================================

/// Reference to a layer member; layers are not supported in authored studies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerReference {
    #[serde(default)]
    pub layer_id: u32,
    #[serde(default)]
    pub layer_member_id: u32,
}

// ============================================================================
// Study
// ============================================================================

/// A named rollout configuration split into weighted experiment groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Study {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "experiment")]
    pub experiments: Vec<Experiment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<LayerReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_experiment_name: Option<String>,
}

impl Study {
    /// Create an empty study
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    // Builder methods

    pub fn with_experiment(mut self, experiment: Experiment) -> Self {
        self.experiments.push(experiment);
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_layer(mut self, layer: LayerReference) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn with_default_experiment_name(mut self, name: impl Into<String>) -> Self {
        self.default_experiment_name = Some(name.into());
        self
    }

    // Accessors

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    pub fn has_layer(&self) -> bool {
        self.layer.is_some()
    }

    /// Find a group by name
    pub fn experiment(&self, name: &str) -> Option<&Experiment> {
        self.experiments.iter().find(|e| e.name == name)
    }

    /// Sum of all group weights
    pub fn total_weight(&self) -> u64 {
        self.experiments.iter().map(|e| u64::from(e.weight())).sum()
    }

    /// Features enabled or disabled by any group
    pub fn affected_features(&self) -> BTreeSet<&str> {
        self.experiments
            .iter()
            .flat_map(|e| e.enabled_features().iter().chain(e.disabled_features()))
            .map(String::as_str)
            .collect()
    }
}
