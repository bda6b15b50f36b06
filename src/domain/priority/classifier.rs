//! Audience-reach classification of a study

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::blocklist::Blocklists;
use crate::domain::study::{Channel, Experiment, Filter, Platform, Study};
use crate::domain::version::{Version, VersionOptions};

/// Group names following this convention keep the client's default behavior
static DEFAULT_GROUP_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"Default|Control_").unwrap());

/// Study names following this convention are emergency kill switches
const KILL_SWITCH_MARKER: &str = "KillSwitch";

// ============================================================================
// StudyPriority
// ============================================================================

/// Reach tier of a study, in ascending order of interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StudyPriority {
    #[serde(rename = "NON_INTERESTING")]
    NonInteresting,
    #[serde(rename = "BLOCKLISTED")]
    Blocklisted,
    #[serde(rename = "STABLE_MIN")]
    StableMin,
    #[serde(rename = "STABLE_50")]
    Stable50,
    #[serde(rename = "STABLE_ALL")]
    StableAll,
    #[serde(rename = "STABLE_ALL_EMERGENCY")]
    StableAllEmergency,
}

impl StudyPriority {
    pub const ALL: [StudyPriority; 6] = [
        Self::NonInteresting,
        Self::Blocklisted,
        Self::StableMin,
        Self::Stable50,
        Self::StableAll,
        Self::StableAllEmergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NonInteresting => "non-interesting",
            Self::Blocklisted => "blocklisted",
            Self::StableMin => "stable-min",
            Self::Stable50 => "stable-50%",
            Self::StableAll => "stable-100%",
            Self::StableAllEmergency => "stable-emergency",
        }
    }

    /// Human summary for reports
    pub fn description(&self) -> &'static str {
        match self {
            Self::NonInteresting => "Does not reach stable users on a supported platform",
            Self::Blocklisted => "Study or one of its features is blocklisted",
            Self::StableMin => "Changes features for a minority of stable users",
            Self::Stable50 => "Changes features for at least half of stable users",
            Self::StableAll => "One group changes features for most stable users",
            Self::StableAllEmergency => "Emergency kill switch reaching most stable users",
        }
    }
}

impl fmt::Display for StudyPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StudyPriority {
    type Err = String;

    /// Accepts the display text (`stable-50%`) or the tier name (`STABLE_50`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| {
                p.as_str().eq_ignore_ascii_case(wanted)
                    || tier_name(*p).eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(StudyPriority::as_str).collect();
                format!(
                    "Unknown priority: {} (expected one of: {})",
                    s,
                    known.join(", ")
                )
            })
    }
}

fn tier_name(priority: StudyPriority) -> &'static str {
    match priority {
        StudyPriority::NonInteresting => "NON_INTERESTING",
        StudyPriority::Blocklisted => "BLOCKLISTED",
        StudyPriority::StableMin => "STABLE_MIN",
        StudyPriority::Stable50 => "STABLE_50",
        StudyPriority::StableAll => "STABLE_ALL",
        StudyPriority::StableAllEmergency => "STABLE_ALL_EMERGENCY",
    }
}

// ============================================================================
// StudyChannelTarget
// ============================================================================

/// Most widely deployed channel a study reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudyChannelTarget {
    DevOrCanary,
    Beta,
    Stable,
}

impl StudyChannelTarget {
    pub fn of(filter: Option<&Filter>) -> Self {
        match filter {
            Some(f) if f.has_channel(Channel::Stable) => Self::Stable,
            Some(f) if f.has_channel(Channel::Beta) => Self::Beta,
            _ => Self::DevOrCanary,
        }
    }
}

// ============================================================================
// Options and details
// ============================================================================

/// Inputs of classification that come from configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProcessingOptions {
    /// Studies capped below this major version are outdated; 0 disables the check
    #[serde(default)]
    pub min_major_version: u32,
    #[serde(default = "Platform::default_supported")]
    pub supported_platforms: Vec<Platform>,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            min_major_version: 0,
            supported_platforms: Platform::default_supported(),
        }
    }
}

impl ProcessingOptions {
    pub fn with_min_major_version(mut self, version: u32) -> Self {
        self.min_major_version = version;
        self
    }

    pub fn with_supported_platforms(mut self, platforms: Vec<Platform>) -> Self {
        self.supported_platforms = platforms;
        self
    }

    pub fn is_supported(&self, platform: Platform) -> bool {
        self.supported_platforms.contains(&platform)
    }
}

/// Facts derived from a study that drive its priority
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityDetails {
    pub is_emergency: bool,
    pub is_outdated: bool,
    pub is_blocklisted: bool,
    pub has_no_supported_platform: bool,
    pub channel_target: StudyChannelTarget,
    pub total_weight: u64,
    pub total_non_default_weight: u64,
    pub max_non_default_weight: u64,
    /// Index of the largest non-default group, first one wins on ties
    pub max_non_default_index: Option<usize>,
}

impl PriorityDetails {
    pub fn new(study: &Study, options: &ProcessingOptions, blocklists: &Blocklists) -> Self {
        let filter = study.filter.as_ref();
        let platforms = filter.map(|f| f.platform.as_slice()).unwrap_or_default();

        let mut details = Self {
            is_emergency: study.name.contains(KILL_SWITCH_MARKER),
            is_outdated: is_outdated(study, options.min_major_version),
            is_blocklisted: blocklists.is_blocklisted(study),
            has_no_supported_platform: !platforms.iter().any(|p| options.is_supported(*p)),
            channel_target: StudyChannelTarget::of(filter),
            total_weight: 0,
            total_non_default_weight: 0,
            max_non_default_weight: 0,
            max_non_default_index: None,
        };

        for (index, experiment) in study.experiments.iter().enumerate() {
            let weight = u64::from(experiment.weight());
            details.total_weight += weight;

            if !is_non_default(experiment) {
                continue;
            }
            details.total_non_default_weight += weight;
            if weight > details.max_non_default_weight {
                details.max_non_default_weight = weight;
                details.max_non_default_index = Some(index);
            }
        }

        details
    }

    /// Whether a single non-default group holds more than half the weight
    pub fn has_majority_group(&self) -> bool {
        2 * self.max_non_default_weight > self.total_weight
    }

    pub fn priority(&self) -> StudyPriority {
        if self.is_blocklisted {
            return StudyPriority::Blocklisted;
        }

        if self.has_no_supported_platform || self.channel_target < StudyChannelTarget::Stable {
            return StudyPriority::NonInteresting;
        }

        if self.has_majority_group() {
            return if self.is_emergency {
                StudyPriority::StableAllEmergency
            } else {
                StudyPriority::StableAll
            };
        }

        if self.total_non_default_weight == 0 {
            return StudyPriority::NonInteresting;
        }

        if 2 * self.total_non_default_weight >= self.total_weight {
            StudyPriority::Stable50
        } else {
            StudyPriority::StableMin
        }
    }
}

fn is_non_default(experiment: &Experiment) -> bool {
    !DEFAULT_GROUP_PATTERN.is_match(&experiment.name) && !experiment.keeps_default_features()
}

/// Whether the study's max version is below the given major version
fn is_outdated(study: &Study, min_major_version: u32) -> bool {
    let Some(max_version) = study.filter.as_ref().and_then(|f| f.max_version.as_deref()) else {
        return false;
    };

    match Version::parse(max_version, VersionOptions::default()) {
        Ok(max) => max < Version::new(vec![min_major_version], false),
        Err(e) => {
            tracing::warn!(
                study = %study.name,
                max_version = %max_version,
                error = %e,
                "Cannot tell whether study is outdated"
            );
            false
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Result of classifying one study
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub priority: StudyPriority,
    pub is_outdated: bool,
    pub is_blocklisted: bool,
    pub affected_features: BTreeSet<String>,
    #[serde(skip)]
    pub details: PriorityDetails,
}

/// Classify a study; outdated-ness is reported beside the priority, not folded in
pub fn classify(study: &Study, options: &ProcessingOptions, blocklists: &Blocklists) -> Classification {
    let details = PriorityDetails::new(study, options, blocklists);

    Classification {
        priority: details.priority(),
        is_outdated: details.is_outdated,
        is_blocklisted: details.is_blocklisted,
        affected_features: study
            .affected_features()
            .into_iter()
            .map(str::to_string)
            .collect(),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::priority::Blocklist;

    fn stable_windows() -> Filter {
        Filter::default()
            .with_channels([Channel::Stable])
            .with_platforms([Platform::Windows])
    }

    fn study_with_groups(groups: &[(&str, u32, bool)], filter: Filter) -> Study {
        let mut study = Study::new("SomeStudy").with_filter(filter);
        for (name, weight, changes) in groups {
            let mut experiment = Experiment::new(*name).with_probability_weight(*weight);
            if *changes {
                experiment = experiment.with_enable_feature("SomeFeature");
            }
            study = study.with_experiment(experiment);
        }
        study
    }

    fn priority_of(study: &Study) -> StudyPriority {
        classify(study, &ProcessingOptions::default(), &Blocklists::default()).priority
    }

    mod tiers {
        use super::*;

        #[test]
        fn test_majority_group_on_stable_and_beta() {
            let groups = [("Enabled", 60, true), ("Default", 40, false)];
            let study = study_with_groups(&groups, stable_windows());
            assert_eq!(priority_of(&study), StudyPriority::StableAll);

            let beta = study_with_groups(
                &groups,
                stable_windows().with_channels([Channel::Beta]),
            );
            assert_eq!(priority_of(&beta), StudyPriority::NonInteresting);
        }

        #[test]
        fn test_kill_switch_is_emergency() {
            let mut study = study_with_groups(&[("Enabled", 100, true)], stable_windows());
            study.name = "BraveKillSwitchStudy".to_string();
            assert_eq!(priority_of(&study), StudyPriority::StableAllEmergency);
        }

        #[test]
        fn test_half_split_is_stable_50() {
            let study = study_with_groups(
                &[("A", 25, true), ("B", 25, true), ("Default", 50, false)],
                stable_windows(),
            );
            assert_eq!(priority_of(&study), StudyPriority::Stable50);
        }

        #[test]
        fn test_small_rollout_is_stable_min() {
            let study = study_with_groups(
                &[("Enabled", 10, true), ("Default", 90, false)],
                stable_windows(),
            );
            assert_eq!(priority_of(&study), StudyPriority::StableMin);
        }

        #[test]
        fn test_exactly_half_in_one_group_is_not_majority() {
            let study = study_with_groups(
                &[("Enabled", 50, true), ("Default", 50, false)],
                stable_windows(),
            );
            assert_eq!(priority_of(&study), StudyPriority::Stable50);
        }

        #[test]
        fn test_only_default_groups_is_non_interesting() {
            let study = study_with_groups(
                &[("Default", 50, true), ("Control_A", 50, true)],
                stable_windows(),
            );
            assert_eq!(priority_of(&study), StudyPriority::NonInteresting);

            let trivial = study_with_groups(&[("Enabled", 100, false)], stable_windows());
            assert_eq!(priority_of(&trivial), StudyPriority::NonInteresting);
        }

        #[test]
        fn test_unsupported_platform_is_non_interesting() {
            let study = study_with_groups(
                &[("Enabled", 100, true)],
                stable_windows().with_platforms([Platform::Ios]),
            );
            assert_eq!(priority_of(&study), StudyPriority::NonInteresting);

            let no_filter = Study::new("S")
                .with_experiment(Experiment::new("Enabled").with_probability_weight(100));
            assert_eq!(priority_of(&no_filter), StudyPriority::NonInteresting);
        }

        #[test]
        fn test_custom_supported_platforms() {
            let study = study_with_groups(
                &[("Enabled", 100, true)],
                stable_windows().with_platforms([Platform::Ios]),
            );
            let options =
                ProcessingOptions::default().with_supported_platforms(vec![Platform::Ios]);
            let result = classify(&study, &options, &Blocklists::default());
            assert_eq!(result.priority, StudyPriority::StableAll);
        }

        #[test]
        fn test_blocklisted_wins() {
            let study = study_with_groups(&[("Enabled", 100, true)], stable_windows());
            let lists = Blocklists::new(
                Blocklist::default(),
                Blocklist::new(["SomeFeature"]).unwrap(),
            );
            let result = classify(&study, &ProcessingOptions::default(), &lists);
            assert_eq!(result.priority, StudyPriority::Blocklisted);
            assert!(result.is_blocklisted);
        }

        #[test]
        fn test_priorities_are_ordered() {
            assert!(StudyPriority::NonInteresting < StudyPriority::Blocklisted);
            assert!(StudyPriority::Blocklisted < StudyPriority::StableMin);
            assert!(StudyPriority::StableAll < StudyPriority::StableAllEmergency);
        }
    }

    mod details {
        use super::*;

        #[test]
        fn test_channel_target() {
            let target = |channels: &[Channel]| {
                StudyChannelTarget::of(Some(
                    &Filter::default().with_channels(channels.iter().copied()),
                ))
            };
            assert_eq!(target(&[Channel::Beta, Channel::Stable]), StudyChannelTarget::Stable);
            assert_eq!(target(&[Channel::Beta, Channel::Dev]), StudyChannelTarget::Beta);
            assert_eq!(target(&[Channel::Canary]), StudyChannelTarget::DevOrCanary);
            assert_eq!(StudyChannelTarget::of(None), StudyChannelTarget::DevOrCanary);
        }

        #[test]
        fn test_weights_and_largest_group() {
            let study = study_with_groups(
                &[("Default", 20, true), ("A", 30, true), ("B", 30, true), ("C", 20, false)],
                stable_windows(),
            );
            let details =
                PriorityDetails::new(&study, &ProcessingOptions::default(), &Blocklists::default());
            assert_eq!(details.total_weight, 100);
            assert_eq!(details.total_non_default_weight, 60);
            assert_eq!(details.max_non_default_weight, 30);
            assert_eq!(details.max_non_default_index, Some(1));
        }

        #[test]
        fn test_outdated_is_orthogonal_to_priority() {
            let filter = stable_windows().with_version_range(None, Some("119.1.60.0"));
            let study = study_with_groups(&[("Enabled", 100, true)], filter);
            let options = ProcessingOptions::default().with_min_major_version(120);

            let result = classify(&study, &options, &Blocklists::default());
            assert!(result.is_outdated);
            assert_eq!(result.priority, StudyPriority::StableAll);
        }

        #[test]
        fn test_outdated_boundaries() {
            let options = ProcessingOptions::default().with_min_major_version(120);
            for (max, outdated) in [
                (Some("120.0"), false),
                (Some("120.*"), false),
                (Some("119.*"), true),
                (Some("not-a-version"), false),
                (None, false),
            ] {
                let study = study_with_groups(
                    &[("Enabled", 100, true)],
                    stable_windows().with_version_range(None, max),
                );
                let result = classify(&study, &options, &Blocklists::default());
                assert_eq!(result.is_outdated, outdated, "{max:?}");
            }
        }

        #[test]
        fn test_affected_features() {
            let study = Study::new("S")
                .with_experiment(Experiment::new("A").with_enable_feature("X"))
                .with_experiment(Experiment::new("B").with_disable_feature("Y"));
            let result = classify(&study, &ProcessingOptions::default(), &Blocklists::default());
            let features: Vec<&str> = result.affected_features.iter().map(String::as_str).collect();
            assert_eq!(features, vec!["X", "Y"]);
        }
    }

    mod presentation {
        use super::*;

        #[test]
        fn test_display_and_parse() {
            for priority in StudyPriority::ALL {
                let parsed: StudyPriority = priority.to_string().parse().unwrap();
                assert_eq!(parsed, priority);
            }
            assert_eq!("STABLE_50".parse::<StudyPriority>(), Ok(StudyPriority::Stable50));
            assert_eq!(StudyPriority::StableAll.to_string(), "stable-100%");
            assert!("sometimes".parse::<StudyPriority>().is_err());
        }

        #[test]
        fn test_serializes_tier_name() {
            let json = serde_json::to_string(&StudyPriority::StableAllEmergency).unwrap();
            assert_eq!(json, "\"STABLE_ALL_EMERGENCY\"");
        }

        #[test]
        fn test_every_tier_has_distinct_description() {
            let descriptions: std::collections::HashSet<_> =
                StudyPriority::ALL.iter().map(StudyPriority::description).collect();
            assert_eq!(descriptions.len(), StudyPriority::ALL.len());
            assert!(StudyPriority::Blocklisted.description().contains("blocklisted"));
        }
    }
}
