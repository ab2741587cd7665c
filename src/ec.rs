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

//! Embedded-controller register space.
//!
//! The EC is only ever touched as a whole: one contiguous read fills a
//! [`RegisterSnapshot`], edits happen in memory, and one contiguous write puts
//! the full buffer back. There is no partial-offset write.

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{EcfanError, Result};

/// debugfs node exposed by the `ec_sys` kernel module
pub const DEFAULT_EC_PATH: &str = "/sys/kernel/debug/ec/ec0/io";

/// Byte-range backend holding the EC address space.
#[cfg_attr(test, mockall::automock)]
pub trait EcDevice {
    /// Read the whole address space in one go.
    fn read_all(&self) -> Result<Vec<u8>>;
    /// Write the whole address space back, starting at offset 0.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;
}

/// EC exposed as a file (normally the `ec_sys` debugfs node).
#[derive(Debug, Clone)]
pub struct EcFile {
    path: PathBuf,
}

impl EcFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for EcFile {
    fn default() -> Self {
        Self::new(DEFAULT_EC_PATH)
    }
}

impl EcDevice for EcFile {
    fn read_all(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|source| EcfanError::DeviceRead {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let wrap = |source| EcfanError::DeviceWrite {
            path: self.path.clone(),
            source,
        };
        // No truncate: debugfs nodes reject it and a regular file must keep its size
        let mut file = OpenOptions::new().write(true).open(&self.path).map_err(wrap)?;
        file.seek(SeekFrom::Start(0)).map_err(wrap)?;
        file.write_all(bytes).map_err(wrap)?;
        file.flush().map_err(wrap)
    }
}

/// In-memory copy of the full EC address space taken at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterSnapshot {
    bytes: Vec<u8>,
}

impl RegisterSnapshot {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Read the entire device into a fresh snapshot.
    pub fn load<D: EcDevice + ?Sized>(device: &D) -> Result<Self> {
        device.read_all().map(Self::from_bytes)
    }

    /// Flush the entire buffer back to the device.
    pub fn commit<D: EcDevice + ?Sized>(&self, device: &mut D) -> Result<()> {
        device.write_all(&self.bytes)
    }

    pub fn get(&self, address: usize) -> Result<u8> {
        self.bytes
            .get(address)
            .copied()
            .ok_or(EcfanError::RegisterOutOfRange { address, len: self.bytes.len() })
    }

    pub fn set(&mut self, address: usize, value: u8) -> Result<()> {
        let len = self.bytes.len();
        match self.bytes.get_mut(address) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(EcfanError::RegisterOutOfRange { address, len }),
        }
    }

    pub fn contains(&self, address: usize) -> bool {
        address < self.bytes.len()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
