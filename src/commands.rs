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

//! Interactive command language.

use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `set <fan> <percent>`: manual speed, percent in 0..1
    Set { fan: String, percent: f64 },
    /// `auto <fan>`
    Auto { fan: String },
    /// `cool_boost <0|1|False>`
    CoolBoost(bool),
    /// `wait <seconds>`: refresh period
    Wait(u64),
    Help,
    Back,
    Quit,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("no command given")]
    Empty,
    #[error("unknown command '{0}' (type 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid speed '{0}' (expected a number between 0 and 1)")]
    InvalidSpeed(String),
    #[error("invalid wait '{0}' (expected whole seconds)")]
    InvalidWait(String),
    #[error("invalid cool boost value '{0}' (expected 0, 1 or False)")]
    InvalidToggle(String),
    #[error("unknown fan '{0}'")]
    UnknownFan(String),
}

pub const HELP: &str = "\
commands:
  set <fan> <percent>    manual speed, percent between 0 and 1
  auto <fan>             hand the fan back to the EC
  cool_boost <0|1>       toggle cool boost
  wait <seconds>         refresh period of the view
  help                   this list
  back                   return to the view
  q                      quit";

fn usage(cmd: &str) -> &'static str {
    match cmd {
        "set" => "set <fan> <percent>",
        "auto" => "auto <fan>",
        "cool_boost" => "cool_boost <0|1|False>",
        "wait" => "wait <seconds>",
        "help" => "help",
        "back" => "back",
        _ => "q",
    }
}

fn parse_toggle(s: &str) -> Result<bool, CommandError> {
    match s.to_ascii_lowercase().as_str() {
        "0" | "false" | "off" => Ok(false),
        "1" | "true" | "on" => Ok(true),
        _ => Err(CommandError::InvalidToggle(s.to_string())),
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return Err(CommandError::Empty);
        };
        let args: Vec<&str> = tokens.collect();

        let cmd = match (name, args.as_slice()) {
            ("set", [fan, percent]) => {
                let percent: f64 = percent
                    .parse()
                    .map_err(|_| CommandError::InvalidSpeed(percent.to_string()))?;
                if !(0.0..=1.0).contains(&percent) {
                    return Err(CommandError::InvalidSpeed(args[1].to_string()));
                }
                Command::Set { fan: fan.to_string(), percent }
            }
            ("auto", [fan]) => Command::Auto { fan: fan.to_string() },
            ("cool_boost", [on]) => Command::CoolBoost(parse_toggle(on)?),
            ("wait", [secs]) => Command::Wait(
                secs.parse::<u64>()
                    .map_err(|_| CommandError::InvalidWait(secs.to_string()))?,
            ),
            ("help", []) => Command::Help,
            ("back", []) => Command::Back,
            ("q" | "quit", []) => Command::Quit,
            ("set" | "auto" | "cool_boost" | "wait" | "help" | "back" | "q" | "quit", _) => {
                return Err(CommandError::Usage(usage(name)))
            }
            (other, _) => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(cmd)
    }
}
