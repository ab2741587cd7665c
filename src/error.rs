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

//! Error handling for ecfan
//!
//! A single error type is used across the crate. User input mistakes are kept in
//! their own family (`CommandError`) so the command loop can tell them apart from
//! fatal device or configuration failures.

use std::io;
use std::path::PathBuf;

use crate::commands::CommandError;

/// Result type alias using EcfanError
pub type Result<T> = std::result::Result<T, EcfanError>;

#[derive(thiserror::Error, Debug)]
pub enum EcfanError {
    // ============================================================================
    // I/O and Device Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read EC device {path}: {source}")]
    DeviceRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write EC device {path}: {source}")]
    DeviceWrite {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Register 0x{address:02x} is outside the {len}-byte EC snapshot")]
    RegisterOutOfRange {
        address: usize,
        len: usize,
    },

    #[error("Failed to toggle EC write access: {0}")]
    WriteAccess(String),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    // ============================================================================
    // Argument and Input Errors
    // ============================================================================
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Command(#[from] CommandError),
}

impl EcfanError {
    /// Whether the error came from user input rather than the device or config.
    pub fn is_user_error(&self) -> bool {
        matches!(self, EcfanError::Command(_))
    }

    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        EcfanError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_out_of_range_message() {
        let err = EcfanError::RegisterOutOfRange { address: 0x1f4, len: 256 };
        assert_eq!(err.to_string(), "Register 0x1f4 is outside the 256-byte EC snapshot");
    }

    #[test]
    fn test_command_errors_are_user_errors() {
        let err: EcfanError = CommandError::Unknown("frobnicate".to_string()).into();
        assert!(err.is_user_error());
        assert_eq!(err.to_string(), "unknown command 'frobnicate' (type 'help')");
    }

    #[test]
    fn test_device_errors_are_fatal() {
        let err = EcfanError::DeviceRead {
            path: PathBuf::from("/sys/kernel/debug/ec/ec0/io"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(!err.is_user_error());
        assert!(err.to_string().contains("/sys/kernel/debug/ec/ec0/io"));
    }

    #[test]
    fn test_invalid_config_helper() {
        let err = EcfanError::invalid_config("fans[0].write", "min and max are equal");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for fans[0].write: min and max are equal"
        );
    }
}
