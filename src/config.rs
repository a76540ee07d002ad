use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Layout of the whole strip: how many leds it has and which pixel ranges
/// belong to which CI pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripConfig {
    #[serde(default = "default_led_count")]
    pub led_count: usize,

    /// Check the pulsate cancellation token only between full breathe cycles,
    /// like the original firmware did.
    #[serde(default)]
    pub coarse_pulse_cancel: bool,

    #[serde(default = "default_pipelines")]
    pub pipelines: Vec<PipelineConfig>,
}

/// One pipeline's reserved pixel range and its stage table. The stage keys
/// need to be case-sensitive matches of the CI server's build names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub offset: usize,
    pub stage_width: usize,
    pub stages: BTreeMap<String, usize>,

    /// Stage names carrying this prefix are routed to this pipeline.
    #[serde(default)]
    pub name_prefix: Option<String>,
}

impl StripConfig {
    pub fn load_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path.as_ref()).context("read strip config file")?;
        let config = serde_json::from_str::<StripConfig>(&text).context("parse strip config")?;
        Ok(config)
    }
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            led_count: default_led_count(),
            coarse_pulse_cancel: false,
            pipelines: default_pipelines(),
        }
    }
}

fn default_led_count() -> usize {
    32
}

fn default_pipelines() -> Vec<PipelineConfig> {
    let stages = |names: &[(&str, usize)]| {
        names
            .iter()
            .map(|(name, segment)| (name.to_string(), *segment))
            .collect::<BTreeMap<_, _>>()
    };

    vec![
        PipelineConfig {
            offset: 0,
            stage_width: 4,
            stages: stages(&[
                ("Prepare", 0),
                ("Unit Tests", 1),
                ("Integration Tests", 2),
                ("Deploy Test", 3),
                ("Deploy to QA", 4),
                ("Deploy to Production", 5),
            ]),
            name_prefix: None,
        },
        PipelineConfig {
            offset: 20,
            stage_width: 4,
            stages: stages(&[
                ("DT - Prepare", 0),
                ("DT - Unit Test", 1),
                ("DT - Deploy Test", 2),
                ("DT - Deploy QA", 3),
            ]),
            name_prefix: Some("DT".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pipelines_cover_disjoint_ranges() {
        let config = StripConfig::default();
        assert_eq!(config.led_count, 32);
        assert_eq!(config.pipelines.len(), 2);

        let first = &config.pipelines[0];
        let second = &config.pipelines[1];
        let first_end = first.offset + first.stage_width * (first.stages.len() - 1);
        assert!(first_end <= second.offset);

        let second_end = second.offset + second.stage_width * (second.stages.len() - 1);
        assert!(second_end <= config.led_count);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = StripConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back = serde_json::from_str::<StripConfig>(&json).unwrap();
        assert_eq!(back.pipelines[1].name_prefix.as_deref(), Some("DT"));
        assert_eq!(back.pipelines[0].stages["Unit Tests"], 1);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = serde_json::from_str::<StripConfig>("{}").unwrap();
        assert_eq!(config.led_count, 32);
        assert!(!config.coarse_pulse_cancel);
        assert_eq!(config.pipelines.len(), 2);
    }
}
