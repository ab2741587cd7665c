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

//! Typed accessors for single EC registers.
//!
//! Accessors hold addresses and decode data only. Every read and write goes
//! through a caller-supplied [`RegisterSnapshot`], so nothing here touches the
//! device.

use std::fmt;

use crate::ec::RegisterSnapshot;
use crate::error::{EcfanError, Result};

/// Quantization steps used for every percent and graph scale.
pub const RESOLUTION: i32 = 50;

/// Largest value a single EC register can hold.
pub const BYTE_MAX: i32 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterView {
    pub address: usize,
}

impl RegisterView {
    pub fn new(address: usize) -> Self {
        Self { address }
    }

    pub fn read(&self, snapshot: &RegisterSnapshot) -> Result<u8> {
        snapshot.get(self.address)
    }

    /// Store `value & 0xFF` in the snapshot.
    pub fn write(&self, value: i32, snapshot: &mut RegisterSnapshot) -> Result<()> {
        snapshot.set(self.address, (value & 0xFF) as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanMode {
    Auto,
    Manual,
}

impl fmt::Display for FanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FanMode::Auto => write!(f, "auto"),
            FanMode::Manual => write!(f, "manual"),
        }
    }
}

/// Mode byte with two discrete codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeRegister {
    pub view: RegisterView,
    pub manual_code: u8,
    pub auto_code: u8,
}

impl ModeRegister {
    pub fn new(address: usize, manual_code: u8, auto_code: u8) -> Self {
        Self { view: RegisterView::new(address), manual_code, auto_code }
    }

    pub fn set(&self, target: FanMode, snapshot: &mut RegisterSnapshot) -> Result<()> {
        let code = match target {
            FanMode::Manual => self.manual_code,
            FanMode::Auto => self.auto_code,
        };
        self.view.write(code as i32, snapshot)
    }

    /// Only an exact match on the manual code counts as manual; every other byte,
    /// including values that are neither code, reads as auto.
    pub fn current(&self, snapshot: &RegisterSnapshot) -> Result<FanMode> {
        if self.view.read(snapshot)? == self.manual_code {
            Ok(FanMode::Manual)
        } else {
            Ok(FanMode::Auto)
        }
    }
}

/// Raw byte span mapped onto `0..=RESOLUTION`. `min` may exceed `max` for
/// inverted encodings (e.g. 255 is stopped, 0 is full speed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeRange {
    min: i32,
    max: i32,
}

impl DecodeRange {
    pub fn new(min: i32, max: i32) -> Result<Self> {
        for bound in [min, max] {
            if !(0..=BYTE_MAX).contains(&bound) {
                return Err(EcfanError::Config(format!(
                    "decode bound {} is outside 0..={}",
                    bound, BYTE_MAX
                )));
            }
        }
        if min == max {
            return Err(EcfanError::Config(format!(
                "decode range {}..{} has zero width",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// `floor((value - min) / (max - min) * RESOLUTION)`
    pub fn to_resolution(&self, value: i32) -> i32 {
        floor_div((value - self.min) * RESOLUTION, self.max - self.min)
    }

    /// Raw value for a resolution step, rounded away from `min` so that
    /// `to_resolution(from_resolution(v)) == v` holds in both directions
    /// whenever the span is at least `RESOLUTION` wide.
    pub fn from_resolution(&self, value: i32) -> i32 {
        let span = self.max - self.min;
        let offset = ceil_div(value.abs() * span.abs(), RESOLUTION);
        self.min + offset * span.signum() * value.signum()
    }
}

fn floor_div(a: i32, b: i32) -> i32 {
    let q = a / b;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

fn ceil_div(a: i32, b: i32) -> i32 {
    (a + b - 1) / b
}

/// Byte register with a decode range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRegister {
    pub view: RegisterView,
    pub range: DecodeRange,
}

impl RangeRegister {
    pub fn new(address: usize, min: i32, max: i32) -> Result<Self> {
        Ok(Self { view: RegisterView::new(address), range: DecodeRange::new(min, max)? })
    }

    pub fn read(&self, snapshot: &RegisterSnapshot) -> Result<u8> {
        self.view.read(snapshot)
    }

    pub fn write(&self, value: i32, snapshot: &mut RegisterSnapshot) -> Result<()> {
        self.view.write(value, snapshot)
    }

    pub fn read_resolution(&self, snapshot: &RegisterSnapshot) -> Result<i32> {
        Ok(self.range.to_resolution(self.read(snapshot)? as i32))
    }

    /// Encode a resolution step into the raw range and store it. Returns the raw byte.
    pub fn write_resolution(&self, value: i32, snapshot: &mut RegisterSnapshot) -> Result<u8> {
        let raw = self.range.from_resolution(value);
        self.write(raw, snapshot)?;
        Ok((raw & 0xFF) as u8)
    }
}
