/*
 * This file is part of ecfan.
 *
 * Copyright (C) 2025 ecfan contributors
 *
 * ecfan is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * ecfan is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with ecfan. If not, see <https://www.gnu.org/licenses/>.
 */

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ec::DEFAULT_EC_PATH;
use crate::error::{EcfanError, Result};
use crate::register::BYTE_MAX;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ModeConfig {
    pub register: usize,
    pub manual: u8,
    pub auto: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RangeConfig {
    pub register: usize,
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FanConfig {
    pub name: String,
    pub mode: ModeConfig,
    pub write: RangeConfig,
    pub read: RangeConfig,
    /// temperature register, decoded over 0..max_temp
    pub temp: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CoolBoostConfig {
    pub register: usize,
    #[serde(default = "default_true")]
    pub enable_on_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EcConfig {
    #[serde(default = "default_device")]
    pub device: PathBuf,
    #[serde(default = "default_wait_seconds")]
    pub wait_seconds: u64,
    #[serde(default = "default_max_temp")]
    pub max_temp: i32,
    pub cool_boost: CoolBoostConfig,
    pub fans: Vec<FanConfig>,
}

fn default_true() -> bool { true }
fn default_device() -> PathBuf { PathBuf::from(DEFAULT_EC_PATH) }
fn default_wait_seconds() -> u64 { 2 }
fn default_max_temp() -> i32 { 100 }

pub fn config_path() -> PathBuf {
    if let Ok(explicit) = env::var("ECFAN_CONFIG") {
        return PathBuf::from(explicit);
    }
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("ecfan").join("config.json");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join("ecfan")
            .join("config.json");
    }
    system_config_path()
}

pub fn system_config_path() -> PathBuf { PathBuf::from("/etc/ecfan/config.json") }

/// Read, parse and validate a config document.
pub fn load_config(path: &Path) -> Result<EcConfig> {
    let data = fs::read_to_string(path).map_err(|source| EcfanError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: EcConfig = serde_json::from_str(&data)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Fan names double as command tokens, so they may not contain whitespace.
fn is_safe_name(s: &str) -> bool {
    if s.is_empty() || s.len() > 64 { return false; }
    s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

pub fn validate_config(cfg: &EcConfig) -> Result<()> {
    if cfg.fans.is_empty() {
        return Err(EcfanError::invalid_config("fans", "at least one fan is required"));
    }
    if !(1..=BYTE_MAX).contains(&cfg.max_temp) {
        return Err(EcfanError::invalid_config(
            "max_temp",
            format!("must be within 1..={}", BYTE_MAX),
        ));
    }

    let mut seen = HashSet::new();
    for (i, fan) in cfg.fans.iter().enumerate() {
        if !is_safe_name(&fan.name) {
            return Err(EcfanError::invalid_config(
                format!("fans[{}].name", i),
                "use 1-64 letters, digits, '_', '-' or '.'",
            ));
        }
        if !seen.insert(fan.name.as_str()) {
            return Err(EcfanError::invalid_config(
                format!("fans[{}].name", i),
                format!("duplicate fan name '{}'", fan.name),
            ));
        }
        for (part, range) in [("write", &fan.write), ("read", &fan.read)] {
            if ![range.min, range.max].iter().all(|b| (0..=BYTE_MAX).contains(b)) {
                return Err(EcfanError::invalid_config(
                    format!("fans[{}].{}", i, part),
                    format!("min and max must be within 0..={}", BYTE_MAX),
                ));
            }
            if range.min == range.max {
                return Err(EcfanError::invalid_config(
                    format!("fans[{}].{}", i, part),
                    "min and max are equal",
                ));
            }
        }
    }
    Ok(())
}
