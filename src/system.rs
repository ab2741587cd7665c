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

use std::process::Command;

use crate::error::{EcfanError, Result};

pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Grants and revokes raw write access to the EC device.
#[cfg_attr(test, mockall::automock)]
pub trait WriteAccess {
    fn enable(&mut self) -> Result<()>;
    fn disable(&mut self) -> Result<()>;
}

/// Reloads the `ec_sys` kernel module with or without `write_support`.
#[derive(Debug, Default)]
pub struct EcSysModule {
    enabled: bool,
}

impl EcSysModule {
    pub fn new() -> Self {
        Self::default()
    }

    fn modprobe(args: &[&str]) -> Result<()> {
        let output = Command::new("modprobe")
            .args(args)
            .output()
            .map_err(|e| EcfanError::WriteAccess(format!("modprobe: {}", e)))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(EcfanError::WriteAccess(format!(
                "modprobe {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    fn reload(write_support: bool) -> Result<()> {
        // the parameter only applies at load time; a missing module is fine here
        let _ = Self::modprobe(&["-r", "ec_sys"]);
        let param = if write_support { "write_support=1" } else { "write_support=0" };
        Self::modprobe(&["ec_sys", param])
    }
}

impl WriteAccess for EcSysModule {
    fn enable(&mut self) -> Result<()> {
        Self::reload(true)?;
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        Self::reload(false)?;
        self.enabled = false;
        Ok(())
    }
}

/// For setups where write access is managed outside ecfan.
#[derive(Debug, Default)]
pub struct ExternalAccess;

impl WriteAccess for ExternalAccess {
    fn enable(&mut self) -> Result<()> {
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disable_without_enable_is_noop() {
        let mut module = EcSysModule::new();
        assert!(module.disable().is_ok());
    }

    #[test]
    fn test_external_access_never_fails() {
        let mut access = ExternalAccess;
        assert!(access.enable().is_ok());
        assert!(access.disable().is_ok());
    }
}
