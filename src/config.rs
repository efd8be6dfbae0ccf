use crate::layout::Grid;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Routing constants. The relative values matter: slots, loops and the grid
/// are all tuned against each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Grid unit; every bend point is a multiple of it.
    pub grid_size: i32,
    /// Distance between adjacent attachment slots on a node face.
    pub slot_spacing: i32,
    /// Largest slot magnitude handed out before edges start sharing slots.
    pub max_slot: i32,
    /// How far a self-loop extends outside its node.
    pub self_edge_size: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            slot_spacing: 10,
            max_slot: 3,
            self_edge_size: 20,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: i32 },
    #[error("maxSlot must be between 0 and 3, got {0}")]
    SlotCap(i32),
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("gridSize", self.grid_size),
            ("slotSpacing", self.slot_spacing),
            ("selfEdgeSize", self.self_edge_size),
        ] {
            if value <= 0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if !(0..=crate::layout::NodeIndex::MAX_MAGNITUDE).contains(&self.max_slot) {
            return Err(ConfigError::SlotCap(self.max_slot));
        }
        Ok(())
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.grid_size)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    grid_size: Option<i32>,
    slot_spacing: Option<i32>,
    max_slot: Option<i32>,
    self_edge_size: Option<i32>,
}

/// Parses a JSON5 config document and merges it over the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<LayoutConfig> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = LayoutConfig::default();
    if let Some(v) = parsed.grid_size {
        config.grid_size = v;
    }
    if let Some(v) = parsed.slot_spacing {
        config.slot_spacing = v;
    }
    if let Some(v) = parsed.max_slot {
        config.max_slot = v;
    }
    if let Some(v) = parsed.self_edge_size {
        config.self_edge_size = v;
    }
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}
