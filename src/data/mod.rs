//! Data-access boundary.
//!
//! The core never reads raw sensor files or computes statistics itself; it
//! consumes pre-computed per-zone summaries through the [`ZoneSource`] trait.
//! [`StaticZoneSource`] is the in-process implementation fed from the `zones:`
//! section of the configuration file.

use serde::{Deserialize, Serialize};

/// A summary statistic as delivered by the data-access collaborator.
///
/// Some upstream pipelines report a single scalar per column, others report
/// one value per sub-column. Both shapes deserialize transparently and are
/// reduced to a single scalar before rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Scalar(f64),
    Series(Vec<f64>),
}

impl StatValue {
    /// Mean reduction (mean-of-means for series).
    pub fn mean(&self) -> f64 {
        match self {
            StatValue::Scalar(v) => *v,
            StatValue::Series(vs) if vs.is_empty() => 0.0,
            StatValue::Series(vs) => vs.iter().sum::<f64>() / vs.len() as f64,
        }
    }

    /// Min reduction (min-of-mins for series).
    pub fn min(&self) -> f64 {
        match self {
            StatValue::Scalar(v) => *v,
            StatValue::Series(vs) => vs.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }

    /// Max reduction (max-of-maxes for series).
    pub fn max(&self) -> f64 {
        match self {
            StatValue::Scalar(v) => *v,
            StatValue::Series(vs) => vs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableStats {
    pub mean: StatValue,
    pub min: StatValue,
    pub max: StatValue,
    pub std: StatValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    #[serde(flatten)]
    pub stats: VariableStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableConfig {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeframe {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timeframe: Option<Timeframe>,
    #[serde(default)]
    pub variables: Vec<VariableConfig>,
}

/// Zone name plus the persona description used by responders.
#[derive(Debug, Clone)]
pub struct ZoneMeta {
    pub name: String,
    pub description: String,
}

/// Read-only view over per-zone metadata and summary statistics.
///
/// Zone order is registration order and is semantically meaningful: the
/// corpus builder and the keyword scan both iterate zones in this order.
pub trait ZoneSource: Send + Sync {
    /// Registered zones, in registration order.
    fn zones(&self) -> Vec<ZoneMeta>;

    /// Variable names declared for a zone, in declared order.
    fn variables(&self, zone: &str) -> Vec<String>;

    /// Per-column summary statistics for one variable, or `None` when no
    /// summary was computed.
    fn variable_summary(&self, zone: &str, variable: &str) -> Option<Vec<(String, VariableStats)>>;

    /// Date range covered by the zone's data, when known.
    fn data_timeframe(&self, zone: &str) -> Option<Timeframe>;
}

/// `ZoneSource` backed by configuration data, fixed at startup.
pub struct StaticZoneSource {
    zones: Vec<ZoneConfig>,
}

impl StaticZoneSource {
    pub fn new(zones: Vec<ZoneConfig>) -> Self {
        Self { zones }
    }

    fn zone(&self, name: &str) -> Option<&ZoneConfig> {
        self.zones.iter().find(|z| z.name == name)
    }
}

impl ZoneSource for StaticZoneSource {
    fn zones(&self) -> Vec<ZoneMeta> {
        self.zones
            .iter()
            .map(|z| ZoneMeta {
                name: z.name.clone(),
                description: z.description.clone(),
            })
            .collect()
    }

    fn variables(&self, zone: &str) -> Vec<String> {
        self.zone(zone)
            .map(|z| z.variables.iter().map(|v| v.name.clone()).collect())
            .unwrap_or_default()
    }

    fn variable_summary(&self, zone: &str, variable: &str) -> Option<Vec<(String, VariableStats)>> {
        let var = self
            .zone(zone)?
            .variables
            .iter()
            .find(|v| v.name == variable)?;
        if var.columns.is_empty() {
            return None;
        }
        Some(
            var.columns
                .iter()
                .map(|c| (c.column.clone(), c.stats.clone()))
                .collect(),
        )
    }

    fn data_timeframe(&self, zone: &str) -> Option<Timeframe> {
        self.zone(zone)?.timeframe.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_stats(mean: f64, min: f64, max: f64, std: f64) -> VariableStats {
        VariableStats {
            mean: StatValue::Scalar(mean),
            min: StatValue::Scalar(min),
            max: StatValue::Scalar(max),
            std: StatValue::Scalar(std),
        }
    }

    #[test]
    fn stat_value_reduces_series_to_scalars() {
        let mean = StatValue::Series(vec![10.0, 20.0, 30.0]);
        assert!((mean.mean() - 20.0).abs() < 1e-9);

        let min = StatValue::Series(vec![5.0, 3.0, 9.0]);
        assert!((min.min() - 3.0).abs() < 1e-9);

        let max = StatValue::Series(vec![5.0, 3.0, 9.0]);
        assert!((max.max() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn stat_value_scalar_passthrough() {
        let v = StatValue::Scalar(42.5);
        assert_eq!(v.mean(), 42.5);
        assert_eq!(v.min(), 42.5);
        assert_eq!(v.max(), 42.5);
    }

    #[test]
    fn static_source_preserves_zone_order() {
        let source = StaticZoneSource::new(vec![
            ZoneConfig {
                name: "Ocean".to_string(),
                description: "Saltwater zone".to_string(),
                timeframe: None,
                variables: vec![],
            },
            ZoneConfig {
                name: "Desert".to_string(),
                description: "Arid zone".to_string(),
                timeframe: None,
                variables: vec![],
            },
        ]);

        let names: Vec<String> = source.zones().into_iter().map(|z| z.name).collect();
        assert_eq!(names, vec!["Ocean", "Desert"]);
    }

    #[test]
    fn summary_is_none_for_missing_variable_or_empty_columns() {
        let source = StaticZoneSource::new(vec![ZoneConfig {
            name: "Desert".to_string(),
            description: String::new(),
            timeframe: None,
            variables: vec![
                VariableConfig {
                    name: "Temperature".to_string(),
                    columns: vec![ColumnSummary {
                        column: "temp_c".to_string(),
                        stats: scalar_stats(30.0, 20.0, 40.0, 5.0),
                    }],
                },
                VariableConfig {
                    name: "Wind speed".to_string(),
                    columns: vec![],
                },
            ],
        }]);

        assert!(source.variable_summary("Desert", "Temperature").is_some());
        assert!(source.variable_summary("Desert", "Wind speed").is_none());
        assert!(source.variable_summary("Desert", "Humidity").is_none());
        assert!(source.variable_summary("Ocean", "Temperature").is_none());
    }

    #[test]
    fn zone_config_parses_from_yaml_with_series_stats() {
        let yaml = r#"
name: Rainforest
description: Humid tropical zone
timeframe:
  start: "2025-02-01"
  end: "2025-02-28"
variables:
  - name: Temperature
    columns:
      - column: temp_c
        mean: [22.1, 24.3]
        min: 18.0
        max: [26.0, 29.5]
        std: [1.2, 1.6]
"#;
        let zone: ZoneConfig = serde_yaml::from_str(yaml).expect("zone config should parse");
        assert_eq!(zone.variables.len(), 1);
        let stats = &zone.variables[0].columns[0].stats;
        assert!((stats.mean.mean() - 23.2).abs() < 1e-9);
        assert!((stats.max.max() - 29.5).abs() < 1e-9);
    }
}
