//! Grid configuration: dimensions, per-era templates, overrides and presets

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::era::EraVariant;
use crate::error::ConfigError;
use crate::preset::CellPreset;

fn default_name() -> String {
    "construction_site".to_string()
}

fn default_max_uses() -> u32 {
    10
}

fn default_damage_chance() -> f32 {
    0.25
}

fn default_max_temperature() -> f32 {
    100.0
}

fn default_cooling_rate() -> f32 {
    2.0
}

fn default_max_battery() -> f32 {
    100.0
}

fn default_battery_drain_rate() -> f32 {
    1.0
}

fn default_battery_damage_threshold() -> f32 {
    50.0
}

fn default_templates() -> BTreeMap<EraVariant, EraTemplate> {
    EraVariant::ALL
        .into_iter()
        .map(|era| (era, EraTemplate::default()))
        .collect()
}

/// Tuning cloned into every quadrant of an era at grid creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EraTemplate {
    #[serde(default = "default_max_uses")]
    pub max_uses_before_damage: u32,
    #[serde(default = "default_damage_chance")]
    pub damage_chance: f32,
    #[serde(default = "default_max_temperature")]
    pub max_temperature: f32,
    /// Degrees lost per second.
    #[serde(default = "default_cooling_rate")]
    pub cooling_rate: f32,
    #[serde(default = "default_max_battery")]
    pub max_battery: f32,
    /// Charge lost per second.
    #[serde(default = "default_battery_drain_rate")]
    pub battery_drain_rate: f32,
    #[serde(default = "default_battery_damage_threshold")]
    pub battery_damage_threshold: f32,
}

impl Default for EraTemplate {
    fn default() -> Self {
        Self {
            max_uses_before_damage: default_max_uses(),
            damage_chance: default_damage_chance(),
            max_temperature: default_max_temperature(),
            cooling_rate: default_cooling_rate(),
            max_battery: default_max_battery(),
            battery_drain_rate: default_battery_drain_rate(),
            battery_damage_threshold: default_battery_damage_threshold(),
        }
    }
}

impl EraTemplate {
    pub fn validate(&self, era: EraVariant) -> Result<(), ConfigError> {
        let fail = |msg: &str| {
            Err(ConfigError::Validation(format!(
                "{} template: {msg}",
                era.as_str()
            )))
        };
        if self.max_uses_before_damage == 0 {
            return fail("max_uses_before_damage must be greater than zero");
        }
        if !(0.0..=1.0).contains(&self.damage_chance) {
            return fail("damage_chance must lie within 0..=1");
        }
        let non_negative = [
            self.max_temperature,
            self.cooling_rate,
            self.max_battery,
            self.battery_drain_rate,
            self.battery_damage_threshold,
        ];
        if non_negative.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return fail("temperatures, charges and rates must be finite and non-negative");
        }
        if self.battery_damage_threshold > self.max_battery {
            return fail("battery_damage_threshold exceeds max_battery");
        }
        Ok(())
    }
}

/// Pins a single cell to a different era than the grid default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraOverride {
    pub x: i32,
    pub z: i32,
    pub era: EraVariant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub seed: u64,
    pub width: usize,
    pub length: usize,
    pub default_era: EraVariant,
    #[serde(default = "default_templates")]
    pub eras: BTreeMap<EraVariant, EraTemplate>,
    #[serde(default)]
    pub cells: Vec<EraOverride>,
    #[serde(default)]
    pub presets: Vec<CellPreset>,
}

impl GridConfig {
    /// A grid of one era with default templates for every era.
    pub fn single_era(width: usize, length: usize, era: EraVariant) -> Self {
        Self {
            name: default_name(),
            seed: 0,
            width,
            length,
            default_era: era,
            eras: default_templates(),
            cells: Vec::new(),
            presets: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_template(mut self, era: EraVariant, template: EraTemplate) -> Self {
        self.eras.insert(era, template);
        self
    }

    pub fn with_era_at(mut self, x: i32, z: i32, era: EraVariant) -> Self {
        self.cells.push(EraOverride { x, z, era });
        self
    }

    pub fn with_preset(mut self, preset: CellPreset) -> Self {
        self.presets.push(preset);
        self
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: GridConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn contains(&self, x: i32, z: i32) -> bool {
        x >= 0 && z >= 0 && (x as usize) < self.width && (z as usize) < self.length
    }

    /// Era of the cell at `(x, z)`; later overrides win.
    pub fn era_at(&self, x: i32, z: i32) -> EraVariant {
        self.cells
            .iter()
            .rev()
            .find(|cell| cell.x == x && cell.z == z)
            .map(|cell| cell.era)
            .unwrap_or(self.default_era)
    }

    pub fn template(&self, era: EraVariant) -> Result<EraTemplate, ConfigError> {
        self.eras
            .get(&era)
            .copied()
            .ok_or(ConfigError::MissingEraTemplate(era))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.length == 0 {
            return Err(ConfigError::Validation(
                "grid width and length must be greater than zero".into(),
            ));
        }
        if i32::try_from(self.width).is_err() || i32::try_from(self.length).is_err() {
            return Err(ConfigError::Validation(
                "grid dimensions exceed the addressable coordinate range".into(),
            ));
        }

        self.template(self.default_era)?;
        for cell in &self.cells {
            if !self.contains(cell.x, cell.z) {
                return Err(ConfigError::Validation(format!(
                    "era override at ({}, {}) is outside the grid",
                    cell.x, cell.z
                )));
            }
            self.template(cell.era)?;
        }

        for (era, template) in &self.eras {
            template.validate(*era)?;
        }

        for preset in &self.presets {
            preset.validate(self)?;
        }

        Ok(())
    }
}

pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<GridConfig> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read grid config {}", path.display()))?;
        let config = GridConfig::from_yaml_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }
}
