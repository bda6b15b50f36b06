//! Pairwise overlap detection between studies touching the same feature
//!
//! Two studies overlap when every filter dimension of the first can match a
//! client that the same dimension of the second also matches. A single
//! disjoint dimension is enough to keep them apart.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::study::{Filter, Study, StudyScope, TargetSet};

/// Two studies that can enable or disable one feature for the same client
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Feature {feature} overlaps in studies {first} and {second}. Check your filters:\n{rendered}")]
pub struct OverlapError {
    pub feature: String,
    pub first: String,
    pub second: String,
    /// Both studies as a pretty-printed JSON array
    pub rendered: String,
}

impl OverlapError {
    pub fn new(feature: impl Into<String>, first: &Study, second: &Study) -> Self {
        Self {
            feature: feature.into(),
            first: first.name.clone(),
            second: second.name.clone(),
            rendered: render_studies(&[first, second]),
        }
    }
}

fn render_studies(studies: &[&Study]) -> String {
    serde_json::to_string_pretty(studies)
        .unwrap_or_else(|e| format!("<studies could not be rendered: {}>", e))
}

// ============================================================================
// Per-dimension predicates
// ============================================================================

/// Ranges are compared on their derived scopes, sets and scalars on the filter
pub fn studies_overlap(first: &StudyScope<'_>, second: &StudyScope<'_>) -> bool {
    if !first.dates.intersects(&second.dates)
        || !first.versions.intersects(&second.versions)
        || !first.os_versions.intersects(&second.os_versions)
    {
        return false;
    }

    let unfiltered = Filter::default();
    let a = first.filter().unwrap_or(&unfiltered);
    let b = second.filter().unwrap_or(&unfiltered);

    plain_sets_intersect(&a.channel, &b.channel)
        && plain_sets_intersect(&a.platform, &b.platform)
        && target_sets_intersect(a.locales(), b.locales())
        && target_sets_intersect(a.countries(), b.countries())
        && target_sets_intersect(a.form_factors(), b.form_factors())
        && target_sets_intersect(a.hardware_classes(), b.hardware_classes())
        && target_sets_intersect(a.cpu_architectures(), b.cpu_architectures())
        && target_sets_intersect(a.google_groups(), b.google_groups())
        && scalars_intersect(a.is_low_end_device, b.is_low_end_device)
        && scalars_intersect(a.is_enterprise, b.is_enterprise)
        && scalars_intersect(a.policy_restriction, b.policy_restriction)
}

/// Whether two studies can match the same client
pub fn overlaps(first: &Study, second: &Study) -> bool {
    studies_overlap(&StudyScope::new(first), &StudyScope::new(second))
}

/// An empty set matches every client
pub fn plain_sets_intersect<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.is_empty() || b.is_empty() || a.iter().any(|value| b.contains(value))
}

/// What a non-empty include/exclude pair admits
enum Targeting<'a, T> {
    Only(&'a [T]),
    AllBut(&'a [T]),
}

impl<'a, T> Targeting<'a, T> {
    /// An include list wins over an exclude list set alongside it
    fn of(set: TargetSet<'a, T>) -> Self {
        if set.include.is_empty() {
            Self::AllBut(set.exclude)
        } else {
            Self::Only(set.include)
        }
    }
}

pub fn target_sets_intersect<T: PartialEq>(a: TargetSet<'_, T>, b: TargetSet<'_, T>) -> bool {
    if a.is_unrestricted() || b.is_unrestricted() {
        return true;
    }

    match (Targeting::of(a), Targeting::of(b)) {
        (Targeting::Only(x), Targeting::Only(y)) => x.iter().any(|value| y.contains(value)),
        (Targeting::Only(included), Targeting::AllBut(excluded))
        | (Targeting::AllBut(excluded), Targeting::Only(included)) => {
            included.iter().any(|value| !excluded.contains(value))
        }
        (Targeting::AllBut(_), Targeting::AllBut(_)) => true,
    }
}

/// An unset scalar matches every client
pub fn scalars_intersect<T: PartialEq>(a: Option<T>, b: Option<T>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

// ============================================================================
// Batch detection
// ============================================================================

/// Report every pair of studies sharing a feature whose filters overlap
///
/// Features are visited in name order and pairs in batch order, so the output
/// is stable for a given input.
pub fn find_overlaps<'a>(studies: impl IntoIterator<Item = &'a Study>) -> Vec<OverlapError> {
    let scopes: Vec<StudyScope<'a>> = studies.into_iter().map(StudyScope::new).collect();

    let mut by_feature: BTreeMap<&'a str, Vec<usize>> = BTreeMap::new();
    for (index, scope) in scopes.iter().enumerate() {
        for feature in scope.study.affected_features() {
            by_feature.entry(feature).or_default().push(index);
        }
    }

    let mut errors = Vec::new();
    for (feature, members) in &by_feature {
        for (position, &i) in members.iter().enumerate() {
            for &j in &members[position + 1..] {
                if studies_overlap(&scopes[i], &scopes[j]) {
                    tracing::debug!(
                        feature = %feature,
                        first = %scopes[i].study.name,
                        second = %scopes[j].study.name,
                        "Overlapping studies"
                    );
                    errors.push(OverlapError::new(
                        *feature,
                        scopes[i].study,
                        scopes[j].study,
                    ));
                }
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::study::{
        Channel, CpuArchitecture, Experiment, FormFactor, Platform, PolicyRestriction,
    };

    fn study(name: &str, feature: &str, filter: Filter) -> Study {
        Study::new(name)
            .with_experiment(
                Experiment::new("Enabled")
                    .with_probability_weight(100)
                    .with_enable_feature(feature),
            )
            .with_filter(filter)
    }

    fn locales(include: &[&str], exclude: &[&str]) -> Filter {
        Filter {
            locale: include.iter().map(|s| s.to_string()).collect(),
            exclude_locale: exclude.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn assert_symmetric(a: &Study, b: &Study, expected: bool) {
        assert_eq!(overlaps(a, b), expected, "{} vs {}", a.name, b.name);
        assert_eq!(overlaps(b, a), expected, "{} vs {}", b.name, a.name);
    }

    mod dimensions {
        use super::*;

        #[test]
        fn test_empty_filters_always_overlap() {
            let a = study("A", "F", Filter::default());
            let b = Study::new("B").with_experiment(Experiment::new("x").with_enable_feature("F"));
            assert_symmetric(&a, &b, true);
        }

        #[test]
        fn test_include_vs_exclude_covering_it() {
            let a = study("A", "F", locales(&["en", "fr"], &[]));
            let b = study("B", "F", locales(&[], &["en", "fr"]));
            assert_symmetric(&a, &b, false);
        }

        #[test]
        fn test_include_vs_exclude_leaving_a_gap() {
            let a = study("A", "F", locales(&["en"], &[]));
            let b = study("B", "F", locales(&[], &["fr"]));
            assert_symmetric(&a, &b, true);
        }

        #[test]
        fn test_include_sets() {
            let a = study("A", "F", locales(&["en", "de"], &[]));
            let b = study("B", "F", locales(&["de"], &[]));
            let c = study("C", "F", locales(&["fr"], &[]));
            assert_symmetric(&a, &b, true);
            assert_symmetric(&a, &c, false);
        }

        #[test]
        fn test_exclude_only_sets_overlap() {
            let a = study("A", "F", locales(&[], &["en"]));
            let b = study("B", "F", locales(&[], &["en", "fr"]));
            assert_symmetric(&a, &b, true);
        }

        #[test]
        fn test_include_wins_over_exclude_on_the_same_side() {
            let a = study("A", "F", locales(&["en"], &["en"]));
            let b = study("B", "F", locales(&["fr"], &[]));
            assert_symmetric(&a, &b, false);
        }

        #[test]
        fn test_every_include_exclude_category_is_checked() {
            let filters = [
                (
                    Filter {
                        country: vec!["us".to_string()],
                        ..Default::default()
                    },
                    Filter {
                        exclude_country: vec!["us".to_string()],
                        ..Default::default()
                    },
                ),
                (
                    Filter {
                        form_factor: vec![FormFactor::Phone],
                        ..Default::default()
                    },
                    Filter {
                        form_factor: vec![FormFactor::Desktop],
                        ..Default::default()
                    },
                ),
                (
                    Filter {
                        hardware_class: vec!["a".to_string()],
                        ..Default::default()
                    },
                    Filter {
                        hardware_class: vec!["b".to_string()],
                        ..Default::default()
                    },
                ),
                (
                    Filter {
                        cpu_architecture: vec![CpuArchitecture::Arm64],
                        ..Default::default()
                    },
                    Filter {
                        exclude_cpu_architecture: vec![CpuArchitecture::Arm64],
                        ..Default::default()
                    },
                ),
                (
                    Filter {
                        google_group: vec![1],
                        ..Default::default()
                    },
                    Filter {
                        google_group: vec![2],
                        ..Default::default()
                    },
                ),
            ];

            for (first, second) in filters {
                let a = study("A", "F", first);
                let b = study("B", "F", second);
                assert_symmetric(&a, &b, false);
            }
        }

        #[test]
        fn test_channels_and_platforms() {
            let stable_windows = Filter::default()
                .with_channels([Channel::Stable])
                .with_platforms([Platform::Windows]);
            let stable_mac = Filter::default()
                .with_channels([Channel::Stable])
                .with_platforms([Platform::Mac]);
            let beta_any = Filter::default().with_channels([Channel::Beta]);
            let any_windows = Filter::default().with_platforms([Platform::Windows]);

            let a = study("A", "F", stable_windows);
            assert_symmetric(&a, &study("B", "F", stable_mac), false);
            assert_symmetric(&a, &study("C", "F", beta_any), false);
            assert_symmetric(&a, &study("D", "F", any_windows), true);
        }

        #[test]
        fn test_scalars() {
            let low_end = Filter {
                is_low_end_device: Some(true),
                ..Default::default()
            };
            let high_end = Filter {
                is_low_end_device: Some(false),
                ..Default::default()
            };
            let critical = Filter {
                policy_restriction: Some(PolicyRestriction::Critical),
                ..Default::default()
            };

            let a = study("A", "F", low_end.clone());
            assert_symmetric(&a, &study("B", "F", high_end), false);
            assert_symmetric(&a, &study("C", "F", low_end), true);
            assert_symmetric(&a, &study("D", "F", Filter::default()), true);
            assert_symmetric(&a, &study("E", "F", critical), true);
        }

        #[test]
        fn test_date_and_version_ranges() {
            let early = Filter::default().with_date_range(Some(0), Some(100));
            let late = Filter::default().with_date_range(Some(101), None);
            assert_symmetric(&study("A", "F", early), &study("B", "F", late), false);

            let old = Filter::default().with_version_range(None, Some("1.9.*"));
            let new = Filter::default().with_version_range(Some("1.10"), None);
            let touching = Filter::default().with_version_range(Some("1.9.100"), None);
            let a = study("A", "F", old);
            assert_symmetric(&a, &study("B", "F", new), false);
            assert_symmetric(&a, &study("C", "F", touching), true);

            let os_old = Filter {
                max_os_version: Some("10.0".to_string()),
                ..Default::default()
            };
            let os_new = Filter {
                min_os_version: Some("11.0".to_string()),
                ..Default::default()
            };
            assert_symmetric(&study("A", "F", os_old), &study("B", "F", os_new), false);
        }

        #[test]
        fn test_malformed_version_is_unbounded() {
            let broken = Filter::default().with_version_range(Some("1.x"), None);
            let old = Filter::default().with_version_range(None, Some("0.5"));
            assert_symmetric(&study("A", "F", broken), &study("B", "F", old), true);
        }

        #[test]
        fn test_valid_bound_applies_beside_malformed_one() {
            let half_broken =
                Filter::default().with_version_range(Some("x.1"), Some("100.1.0.0"));
            let newer = Filter::default().with_version_range(Some("120.1.0.0"), None);
            let older = Filter::default().with_version_range(None, Some("90.1.0.0"));

            assert_symmetric(
                &study("A", "F", half_broken.clone()),
                &study("B", "F", newer),
                false,
            );
            assert_symmetric(&study("A", "F", half_broken), &study("B", "F", older), true);
        }
    }

    mod batch {
        use super::*;

        fn windows_stable(name: &str, platforms: &[Platform]) -> Study {
            study(
                name,
                "FeatureX",
                Filter::default()
                    .with_channels([Channel::Stable])
                    .with_platforms(platforms.iter().copied()),
            )
        }

        #[test]
        fn test_shared_feature_with_overlapping_platforms() {
            let studies = [
                windows_stable("StudyA", &[Platform::Windows]),
                windows_stable("StudyB", &[Platform::Windows, Platform::Mac]),
            ];

            let errors = find_overlaps(&studies);
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].feature, "FeatureX");
            assert_eq!(errors[0].first, "StudyA");
            assert_eq!(errors[0].second, "StudyB");

            let message = errors[0].to_string();
            assert!(message.contains("Feature FeatureX overlaps"));
            assert!(message.contains("\"name\": \"StudyA\""));
            assert!(message.contains("\"name\": \"StudyB\""));
        }

        #[test]
        fn test_shared_feature_with_disjoint_platforms() {
            let studies = [
                windows_stable("StudyA", &[Platform::Windows]),
                windows_stable("StudyB", &[Platform::Mac]),
            ];
            assert!(find_overlaps(&studies).is_empty());
        }

        #[test]
        fn test_different_features_never_conflict() {
            let studies = [
                study("A", "FeatureX", Filter::default()),
                study("B", "FeatureY", Filter::default()),
            ];
            assert!(find_overlaps(&studies).is_empty());
        }

        #[test]
        fn test_disabled_features_are_grouped_too() {
            let a = study("A", "FeatureX", Filter::default());
            let b = Study::new("B").with_experiment(
                Experiment::new("Off")
                    .with_probability_weight(100)
                    .with_disable_feature("FeatureX"),
            );
            assert_eq!(find_overlaps([&a, &b]).len(), 1);
        }

        #[test]
        fn test_one_error_per_pair_and_feature() {
            let studies: Vec<Study> = ["A", "B", "C"]
                .iter()
                .map(|name| study(name, "F", Filter::default()))
                .collect();
            let errors = find_overlaps(&studies);
            let pairs: Vec<(&str, &str)> = errors
                .iter()
                .map(|e| (e.first.as_str(), e.second.as_str()))
                .collect();
            assert_eq!(pairs, vec![("A", "B"), ("A", "C"), ("B", "C")]);
        }

        #[test]
        fn test_feature_used_twice_in_one_study_is_not_a_self_overlap() {
            let a = Study::new("A")
                .with_experiment(Experiment::new("On").with_enable_feature("F"))
                .with_experiment(Experiment::new("Off").with_disable_feature("F"));
            assert!(find_overlaps([&a]).is_empty());
        }
    }
}
