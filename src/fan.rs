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

use std::fmt::Write as _;

use crate::config::FanConfig;
use crate::ec::RegisterSnapshot;
use crate::error::{EcfanError, Result};
use crate::register::{FanMode, ModeRegister, RangeRegister, RESOLUTION};
use crate::sparkline::{self, History};

/// Latest sample of a register together with its rendered history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graphed {
    pub sample: u8,
    pub graph: String,
}

#[derive(Debug, Clone)]
pub struct Fan {
    pub name: String,
    pub mode: ModeRegister,
    /// speed command
    pub write: RangeRegister,
    /// observed speed
    pub read: RangeRegister,
    pub temp: RangeRegister,
    read_history: History,
    temp_history: History,
}

impl Fan {
    pub fn new(
        name: impl Into<String>,
        mode: ModeRegister,
        write: RangeRegister,
        read: RangeRegister,
        temp: RangeRegister,
    ) -> Self {
        Self {
            name: name.into(),
            mode,
            write,
            read,
            temp,
            read_history: History::new(),
            temp_history: History::new(),
        }
    }

    /// Build a fan from its config entry. Zero-width ranges are rejected here.
    pub fn from_config(cfg: &FanConfig, max_temp: i32) -> Result<Self> {
        let field = |part: &str| format!("fans.{}.{}", cfg.name, part);
        let write = RangeRegister::new(cfg.write.register, cfg.write.min, cfg.write.max)
            .map_err(|e| EcfanError::invalid_config(field("write"), e.to_string()))?;
        let read = RangeRegister::new(cfg.read.register, cfg.read.min, cfg.read.max)
            .map_err(|e| EcfanError::invalid_config(field("read"), e.to_string()))?;
        let temp = RangeRegister::new(cfg.temp, 0, max_temp)
            .map_err(|e| EcfanError::invalid_config("max_temp", e.to_string()))?;
        let mode = ModeRegister::new(cfg.mode.register, cfg.mode.manual, cfg.mode.auto);
        Ok(Self::new(cfg.name.clone(), mode, write, read, temp))
    }

    /// Addresses this fan reads or writes.
    pub fn addresses(&self) -> [usize; 4] {
        [
            self.mode.view.address,
            self.write.view.address,
            self.read.view.address,
            self.temp.view.address,
        ]
    }

    /// Switch to manual and command `percent` (0..=1) of full speed.
    /// Both writes land in `snapshot`; returns the raw byte written.
    pub fn set_speed(&self, percent: f64, snapshot: &mut RegisterSnapshot) -> Result<u8> {
        if !(0.0..=1.0).contains(&percent) {
            return Err(EcfanError::InvalidArgument(format!(
                "fan speed {} is outside 0..1",
                percent
            )));
        }
        self.mode.set(FanMode::Manual, snapshot)?;
        let level = (percent * RESOLUTION as f64).floor() as i32;
        self.write.write_resolution(level, snapshot)
    }

    pub fn set_mode(&self, mode: FanMode, snapshot: &mut RegisterSnapshot) -> Result<()> {
        self.mode.set(mode, snapshot)
    }

    pub fn current_mode(&self, snapshot: &RegisterSnapshot) -> Result<FanMode> {
        self.mode.current(snapshot)
    }

    /// Observed speed as a whole percentage.
    pub fn speed_percent(&self, raw: u8) -> i32 {
        self.read.range.to_resolution(raw as i32) * 100 / RESOLUTION
    }

    pub fn read_history(&self) -> &[u8] {
        self.read_history.samples()
    }

    pub fn temp_history(&self) -> &[u8] {
        self.temp_history.samples()
    }

    fn make_graph(
        history: &mut History,
        register: &RangeRegister,
        snapshot: &RegisterSnapshot,
        columns: usize,
    ) -> Result<Graphed> {
        let sample = register.read(snapshot)?;
        history.append(sample, columns);
        let graph = sparkline::render(history.samples(), &register.range);
        Ok(Graphed { sample, graph })
    }

    /// Sample both histories and render the fan's block of the view.
    pub fn summary(&mut self, snapshot: &RegisterSnapshot, columns: usize) -> Result<String> {
        let mode = self.current_mode(snapshot)?;
        let speed = Self::make_graph(&mut self.read_history, &self.read, snapshot, columns)?;
        let temp = Self::make_graph(&mut self.temp_history, &self.temp, snapshot, columns)?;

        let mut out = String::new();
        let _ = writeln!(out, "{}", self.name);
        let _ = writeln!(out, "mode: {}", mode);
        let _ = writeln!(out, "fan speed: {}%", self.speed_percent(speed.sample));
        let _ = writeln!(out, "{}", speed.graph);
        let _ = writeln!(out, "temperature: {}°C", temp.sample);
        let _ = writeln!(out, "{}", temp.graph);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparkline::GRAPH_ROWS;
    use crate::test_utils::{cpu_fan, cpu_fan_config, blank_snapshot};

    #[test]
    fn test_from_config_builds_registers() {
        let fan = Fan::from_config(&cpu_fan_config(), 100).unwrap();
        assert_eq!(fan.name, "CPU");
        assert_eq!(fan.mode.view.address, 147);
        assert_eq!(fan.mode.manual_code, 20);
        assert_eq!(fan.mode.auto_code, 4);
        assert_eq!(fan.write.range.min(), 255);
        assert_eq!(fan.write.range.max(), 0);
        assert_eq!(fan.read.view.address, 149);
        assert_eq!(fan.temp.view.address, 168);
        assert_eq!(fan.temp.range.max(), 100);
        assert_eq!(fan.addresses(), [147, 148, 149, 168]);
    }

    #[test]
    fn test_from_config_rejects_zero_width_range() {
        let mut cfg = cpu_fan_config();
        cfg.write.min = 0;
        cfg.write.max = 0;
        let err = Fan::from_config(&cfg, 100).unwrap_err();
        assert!(matches!(err, EcfanError::InvalidConfig { ref field, .. } if field == "fans.CPU.write"));

        let err = Fan::from_config(&cpu_fan_config(), 0).unwrap_err();
        assert!(matches!(err, EcfanError::InvalidConfig { ref field, .. } if field == "max_temp"));
    }

    #[test]
    fn test_set_speed_full_and_stopped_on_inverted_range() {
        let fan = cpu_fan();
        let mut snap = blank_snapshot();

        assert_eq!(fan.set_speed(1.0, &mut snap).unwrap(), 0);
        assert_eq!(snap.get(148).unwrap(), 0);
        assert_eq!(snap.get(147).unwrap(), 20);
        assert_eq!(fan.current_mode(&snap).unwrap(), FanMode::Manual);

        assert_eq!(fan.set_speed(0.0, &mut snap).unwrap(), 255);
        assert_eq!(snap.get(148).unwrap(), 255);
    }

    #[test]
    fn test_set_speed_decodes_close_to_request() {
        let fan = cpu_fan();
        for step in 0..=200 {
            let percent = step as f64 / 200.0;
            let mut snap = blank_snapshot();
            fan.set_speed(percent, &mut snap).unwrap();
            let decoded = fan.write.read_resolution(&snap).unwrap();
            let wanted = (percent * RESOLUTION as f64).round() as i32;
            assert!(
                (decoded - wanted).abs() <= 1,
                "percent {} decoded {} wanted {}",
                percent,
                decoded,
                wanted
            );
        }
    }

    #[test]
    fn test_set_speed_rejects_out_of_range() {
        let fan = cpu_fan();
        let mut snap = blank_snapshot();
        assert!(fan.set_speed(1.5, &mut snap).is_err());
        assert!(fan.set_speed(-0.1, &mut snap).is_err());
        assert!(fan.set_speed(f64::NAN, &mut snap).is_err());
        assert_eq!(snap, blank_snapshot());
    }

    #[test]
    fn test_speed_percent_uses_read_range() {
        let fan = cpu_fan();
        assert_eq!(fan.speed_percent(255), 0);
        assert_eq!(fan.speed_percent(85), 100);
        assert_eq!(fan.speed_percent(170), 50);
    }

    #[test]
    fn test_summary_appends_samples_and_renders() {
        let mut fan = cpu_fan();
        let mut snap = blank_snapshot();
        snap.set(149, 170).unwrap();
        snap.set(168, 55).unwrap();
        snap.set(147, 20).unwrap();

        let out = fan.summary(&snap, 80).unwrap();
        assert!(out.starts_with("CPU\nmode: manual\nfan speed: 50%\n"));
        assert!(out.contains("temperature: 55°C\n"));
        assert_eq!(out.lines().count(), 4 + 2 * GRAPH_ROWS);
        assert_eq!(fan.read_history(), &[170]);
        assert_eq!(fan.temp_history(), &[55]);
    }

    #[test]
    fn test_summary_trims_history_to_terminal_width() {
        let mut fan = cpu_fan();
        let mut snap = blank_snapshot();
        for t in 40..50u8 {
            snap.set(168, t).unwrap();
            fan.summary(&snap, 4).unwrap();
        }
        assert_eq!(fan.temp_history(), &[46, 47, 48, 49]);
        assert_eq!(fan.read_history().len(), 4);
    }
}
