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

//! Test utilities and fixtures shared by the unit tests

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{CoolBoostConfig, EcConfig, FanConfig, ModeConfig, RangeConfig};
use crate::console::{Console, Input};
use crate::ec::{EcDevice, RegisterSnapshot, DEFAULT_EC_PATH};
use crate::error::Result;
use crate::fan::Fan;

/// The CPU fan of the reference laptop: inverted write range, partially
/// inverted read range.
pub fn cpu_fan_config() -> FanConfig {
    FanConfig {
        name: "CPU".to_string(),
        mode: ModeConfig { register: 147, manual: 20, auto: 4 },
        write: RangeConfig { register: 148, min: 255, max: 0 },
        read: RangeConfig { register: 149, min: 255, max: 85 },
        temp: 168,
    }
}

/// A second fan with ascending ranges
pub fn gpu_fan_config() -> FanConfig {
    FanConfig {
        name: "GPU".to_string(),
        mode: ModeConfig { register: 150, manual: 1, auto: 0 },
        write: RangeConfig { register: 151, min: 0, max: 255 },
        read: RangeConfig { register: 152, min: 0, max: 200 },
        temp: 169,
    }
}

pub fn sample_config() -> EcConfig {
    EcConfig {
        device: PathBuf::from(DEFAULT_EC_PATH),
        wait_seconds: 1,
        max_temp: 100,
        cool_boost: CoolBoostConfig { register: 236, enable_on_start: true },
        fans: vec![cpu_fan_config()],
    }
}

pub fn two_fan_config() -> EcConfig {
    let mut cfg = sample_config();
    cfg.fans.push(gpu_fan_config());
    cfg
}

pub fn cpu_fan() -> Fan {
    Fan::from_config(&cpu_fan_config(), 100).unwrap()
}

pub fn blank_snapshot() -> RegisterSnapshot {
    RegisterSnapshot::from_bytes(vec![0; 256])
}

/// EC held in memory; counts full-buffer writes.
#[derive(Debug, Clone)]
pub struct MemDevice {
    pub bytes: Vec<u8>,
    pub commits: usize,
}

impl MemDevice {
    pub fn new(len: usize) -> Self {
        Self { bytes: vec![0; len], commits: 0 }
    }
}

impl EcDevice for MemDevice {
    fn read_all(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        assert_eq!(bytes.len(), self.bytes.len(), "partial write");
        self.bytes = bytes.to_vec();
        self.commits += 1;
        Ok(())
    }
}

/// Console fed from a fixed list of inputs. Once the list runs out it
/// reports a closed stdin so loops always terminate.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    pub columns: usize,
    pub inputs: VecDeque<Input>,
    pub shown: Vec<String>,
    pub clears: usize,
    pub slept: Duration,
}

impl ScriptedConsole {
    pub fn new(columns: usize, inputs: &[Input]) -> Self {
        Self {
            columns,
            inputs: inputs.iter().cloned().collect(),
            ..Default::default()
        }
    }
}

impl Console for ScriptedConsole {
    fn columns(&self) -> usize {
        self.columns
    }

    fn clear(&mut self) -> Result<()> {
        self.clears += 1;
        Ok(())
    }

    fn show(&mut self, text: &str) -> Result<()> {
        self.shown.push(text.to_string());
        Ok(())
    }

    fn poll_line(&mut self) -> Result<Input> {
        Ok(self.inputs.pop_front().unwrap_or(Input::Closed))
    }

    fn sleep(&mut self, duration: Duration) {
        self.slept += duration;
    }
}
