use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::breakpoints::Aqi;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Good,
    Moderate,
    Poor,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    Hazardous,
    Unknown,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Good => "Good",
            Category::Moderate => "Moderate",
            Category::Poor => "Poor",
            Category::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            Category::Unhealthy => "Unhealthy",
            Category::VeryUnhealthy => "Very Unhealthy",
            Category::Hazardous => "Hazardous",
            Category::Unknown => "Unknown",
        }
    }

    /// Coloured marker used by the dashboard listing.
    pub fn indicator(self) -> &'static str {
        match self {
            Category::Good => "🟢",
            Category::Moderate => "🟡",
            Category::Poor | Category::UnhealthyForSensitiveGroups => "🟠",
            Category::Unhealthy => "🔴",
            Category::VeryUnhealthy => "🟣",
            Category::Hazardous => "⚫",
            Category::Unknown => "⚪",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        const ALL: [Category; 8] = [
            Category::Good,
            Category::Moderate,
            Category::Poor,
            Category::UnhealthyForSensitiveGroups,
            Category::Unhealthy,
            Category::VeryUnhealthy,
            Category::Hazardous,
            Category::Unknown,
        ];
        let label = label.trim();
        ALL.into_iter().find(|c| c.label().eq_ignore_ascii_case(label))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Named built-in schemes, selectable from settings and the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SchemeKind {
    ThreeLevel,
    #[default]
    SixLevel,
    SixLevelShort,
}

impl SchemeKind {
    pub fn scheme(self) -> ClassificationScheme {
        match self {
            SchemeKind::ThreeLevel => ClassificationScheme::three_level(),
            SchemeKind::SixLevel => ClassificationScheme::six_level(),
            SchemeKind::SixLevelShort => ClassificationScheme::six_level_short(),
        }
    }
}

/// Ordered AQI upper bounds with the category each range maps to. Anything
/// above the last bound gets `above`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationScheme {
    name: String,
    bands: Vec<(u16, Category)>,
    above: Category,
}

impl ClassificationScheme {
    pub fn new(
        name: impl Into<String>,
        mut bands: Vec<(u16, Category)>,
        above: Category,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if bands.is_empty() {
            return Err(ConfigError::EmptyScheme(name));
        }
        bands.sort_by_key(|(upper, _)| *upper);
        if let Some(pair) = bands.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(ConfigError::DuplicateBound {
                name,
                bound: pair[0].0,
            });
        }
        Ok(Self { name, bands, above })
    }

    pub fn three_level() -> Self {
        Self {
            name: "three-level".into(),
            bands: vec![(50, Category::Good), (100, Category::Moderate)],
            above: Category::Poor,
        }
    }

    pub fn six_level() -> Self {
        Self::six_level_with("six-level", Category::UnhealthyForSensitiveGroups)
    }

    /// Six levels, with 101-150 labelled "Poor".
    pub fn six_level_short() -> Self {
        Self::six_level_with("six-level-short", Category::Poor)
    }

    fn six_level_with(name: &str, sensitive: Category) -> Self {
        Self {
            name: name.into(),
            bands: vec![
                (50, Category::Good),
                (100, Category::Moderate),
                (150, sensitive),
                (200, Category::Unhealthy),
                (300, Category::VeryUnhealthy),
            ],
            above: Category::Hazardous,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classify(&self, aqi: Option<Aqi>) -> Category {
        let Some(aqi) = aqi else {
            return Category::Unknown;
        };
        self.bands
            .iter()
            .find(|(upper, _)| aqi.value() <= *upper)
            .map(|(_, category)| *category)
            .unwrap_or(self.above)
    }
}

impl Default for ClassificationScheme {
    fn default() -> Self {
        Self::six_level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn six(v: i64) -> Category {
        ClassificationScheme::six_level().classify(Aqi::new(v))
    }

    #[test]
    fn six_level_ranges() {
        assert_eq!(six(0), Category::Good);
        assert_eq!(six(50), Category::Good);
        assert_eq!(six(51), Category::Moderate);
        assert_eq!(six(100), Category::Moderate);
        assert_eq!(six(101), Category::UnhealthyForSensitiveGroups);
        assert_eq!(six(150), Category::UnhealthyForSensitiveGroups);
        assert_eq!(six(151), Category::Unhealthy);
        assert_eq!(six(200), Category::Unhealthy);
        assert_eq!(six(201), Category::VeryUnhealthy);
        assert_eq!(six(300), Category::VeryUnhealthy);
        assert_eq!(six(301), Category::Hazardous);
        assert_eq!(six(500), Category::Hazardous);
    }

    #[test]
    fn three_level_collapses_upper_ranges() {
        let s = ClassificationScheme::three_level();
        assert_eq!(s.classify(Aqi::new(50)), Category::Good);
        assert_eq!(s.classify(Aqi::new(51)), Category::Moderate);
        assert_eq!(s.classify(Aqi::new(101)), Category::Poor);
        assert_eq!(s.classify(Aqi::new(500)), Category::Poor);
    }

    #[test]
    fn short_labels_use_poor() {
        let s = ClassificationScheme::six_level_short();
        assert_eq!(s.classify(Aqi::new(120)), Category::Poor);
        assert_eq!(s.classify(Aqi::new(180)), Category::Unhealthy);
    }

    #[test]
    fn missing_aqi_is_unknown() {
        assert_eq!(ClassificationScheme::six_level().classify(None), Category::Unknown);
        assert_eq!(ClassificationScheme::three_level().classify(None), Category::Unknown);
    }

    #[test]
    fn custom_scheme_sorts_bands() {
        let s = ClassificationScheme::new(
            "custom",
            vec![(100, Category::Moderate), (50, Category::Good)],
            Category::Poor,
        )
        .unwrap();
        assert_eq!(s.classify(Aqi::new(40)), Category::Good);
        assert!(ClassificationScheme::new("empty", Vec::new(), Category::Poor).is_err());
    }

    #[test]
    fn custom_scheme_rejects_repeated_bound() {
        let err = ClassificationScheme::new(
            "twice",
            vec![(50, Category::Good), (100, Category::Moderate), (50, Category::Poor)],
            Category::Hazardous,
        );
        assert!(matches!(
            err,
            Err(ConfigError::DuplicateBound { bound: 50, .. })
        ));
    }

    #[test]
    fn labels_round_trip() {
        assert_eq!(
            Category::from_label("unhealthy for sensitive groups"),
            Some(Category::UnhealthyForSensitiveGroups)
        );
        assert_eq!(Category::from_label("Smoggy"), None);
    }
}
