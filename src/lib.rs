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

//! ecfan - laptop fan control over raw embedded-controller registers
//!
//! This library provides the register snapshot model, fan speed mapping,
//! history graphs and the interactive view/command loop.

pub mod commands;
pub mod config;
pub mod console;
pub mod controller;
pub mod ec;
pub mod error;
pub mod fan;
pub mod logger;
pub mod register;
pub mod sparkline;
pub mod system;

#[cfg(test)]
pub mod test_utils;
