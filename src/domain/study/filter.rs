//! Study filter: the population a study applies to

use std::fmt;

use serde::{Deserialize, Serialize};

use super::date_format;

// ============================================================================
// Enumerations
// ============================================================================

/// Release channel of a client installation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "UNKNOWN")]
    Unknown,
    #[serde(rename = "CANARY", alias = "NIGHTLY")]
    Canary,
    #[serde(rename = "DEV")]
    Dev,
    #[serde(rename = "BETA")]
    Beta,
    #[serde(rename = "STABLE", alias = "RELEASE")]
    Stable,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Canary => write!(f, "CANARY"),
            Self::Dev => write!(f, "DEV"),
            Self::Beta => write!(f, "BETA"),
            Self::Stable => write!(f, "STABLE"),
        }
    }
}

/// Operating system platform of a client installation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "WINDOWS", alias = "PLATFORM_WINDOWS")]
    Windows,
    #[serde(rename = "MAC", alias = "PLATFORM_MAC")]
    Mac,
    #[serde(rename = "LINUX", alias = "PLATFORM_LINUX")]
    Linux,
    #[serde(rename = "CHROMEOS", alias = "PLATFORM_CHROMEOS")]
    ChromeOs,
    #[serde(rename = "ANDROID", alias = "PLATFORM_ANDROID")]
    Android,
    #[serde(rename = "IOS", alias = "PLATFORM_IOS")]
    Ios,
    #[serde(rename = "ANDROID_WEBVIEW", alias = "PLATFORM_ANDROID_WEBVIEW")]
    AndroidWebview,
    #[serde(rename = "FUCHSIA", alias = "PLATFORM_FUCHSIA")]
    Fuchsia,
    #[serde(rename = "ANDROID_WEBLAYER", alias = "PLATFORM_ANDROID_WEBLAYER")]
    AndroidWeblayer,
    #[serde(rename = "CHROMEOS_LACROS", alias = "PLATFORM_CHROMEOS_LACROS")]
    ChromeOsLacros,
}

impl Platform {
    /// Platforms a study must target at least one of to be interesting
    pub fn default_supported() -> Vec<Platform> {
        vec![
            Platform::Android,
            Platform::Linux,
            Platform::Mac,
            Platform::Windows,
        ]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "WINDOWS",
            Self::Mac => "MAC",
            Self::Linux => "LINUX",
            Self::ChromeOs => "CHROMEOS",
            Self::Android => "ANDROID",
            Self::Ios => "IOS",
            Self::AndroidWebview => "ANDROID_WEBVIEW",
            Self::Fuchsia => "FUCHSIA",
            Self::AndroidWeblayer => "ANDROID_WEBLAYER",
            Self::ChromeOsLacros => "CHROMEOS_LACROS",
        };
        write!(f, "{}", name)
    }
}

/// Device form factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormFactor {
    Desktop,
    Phone,
    Tablet,
    Kiosk,
    MeetDevice,
    Tv,
    Automotive,
    Foldable,
}

/// CPU architecture of the client binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CpuArchitecture {
    #[serde(rename = "X86_64")]
    X86_64,
    #[serde(rename = "ARM64")]
    Arm64,
    #[serde(rename = "X86_32")]
    X86_32,
    #[serde(rename = "ARM32")]
    Arm32,
    #[serde(rename = "TRANSLATED_X86_64")]
    TranslatedX86_64,
}

/// Enterprise policy restriction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyRestriction {
    None,
    Critical,
    CriticalOnly,
}

// ============================================================================
// TargetSet
// ============================================================================

/// Include/exclude pair for one filter category
///
/// An empty pair matches every client. A non-empty include list matches only
/// the listed values; a non-empty exclude list matches everything else.
#[derive(Debug, Clone, Copy)]
pub struct TargetSet<'a, T> {
    pub include: &'a [T],
    pub exclude: &'a [T],
}

impl<'a, T> TargetSet<'a, T> {
    pub fn new(include: &'a [T], exclude: &'a [T]) -> Self {
        Self { include, exclude }
    }

    /// Neither list is set, so every client matches
    pub fn is_unrestricted(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

// ============================================================================
// Filter
// ============================================================================

/// Population predicates scoping a study
///
/// Version bounds are kept as the authored strings; they are parsed when
/// ranges are derived so that a malformed value becomes a diagnostic for this
/// one study rather than a decoding failure for the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "date_format")]
    pub start_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "date_format")]
    pub end_date: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_os_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_os_version: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channel: Vec<Channel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platform: Vec<Platform>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locale: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_locale: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub country: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_country: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub form_factor: Vec<FormFactor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_form_factor: Vec<FormFactor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hardware_class: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_hardware_class: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cpu_architecture: Vec<CpuArchitecture>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_cpu_architecture: Vec<CpuArchitecture>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub google_group: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_google_group: Vec<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_low_end_device: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enterprise: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_restriction: Option<PolicyRestriction>,
}

impl Filter {
    /// Restrict to the given channels
    pub fn with_channels(mut self, channels: impl IntoIterator<Item = Channel>) -> Self {
        self.channel = channels.into_iter().collect();
        self
    }

    /// Restrict to the given platforms
    pub fn with_platforms(mut self, platforms: impl IntoIterator<Item = Platform>) -> Self {
        self.platform = platforms.into_iter().collect();
        self
    }

    /// Set the inclusive version bounds
    pub fn with_version_range(mut self, min: Option<&str>, max: Option<&str>) -> Self {
        self.min_version = min.map(str::to_string);
        self.max_version = max.map(str::to_string);
        self
    }

    /// Set the inclusive date bounds, in unix seconds
    pub fn with_date_range(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn has_start_date(&self) -> bool {
        self.start_date.is_some()
    }

    pub fn has_end_date(&self) -> bool {
        self.end_date.is_some()
    }

    pub fn has_channel(&self, channel: Channel) -> bool {
        self.channel.contains(&channel)
    }

    pub fn locales(&self) -> TargetSet<'_, String> {
        TargetSet::new(&self.locale, &self.exclude_locale)
    }

    pub fn countries(&self) -> TargetSet<'_, String> {
        TargetSet::new(&self.country, &self.exclude_country)
    }

    pub fn form_factors(&self) -> TargetSet<'_, FormFactor> {
        TargetSet::new(&self.form_factor, &self.exclude_form_factor)
    }

    pub fn hardware_classes(&self) -> TargetSet<'_, String> {
        TargetSet::new(&self.hardware_class, &self.exclude_hardware_class)
    }

    pub fn cpu_architectures(&self) -> TargetSet<'_, CpuArchitecture> {
        TargetSet::new(&self.cpu_architecture, &self.exclude_cpu_architecture)
    }

    pub fn google_groups(&self) -> TargetSet<'_, i64> {
        TargetSet::new(&self.google_group, &self.exclude_google_group)
    }
}
