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

//! View/command loop.
//!
//! The controller owns the only snapshot. Every refresh and every command
//! starts from a fresh load, edits land in memory, and a single commit writes
//! the whole buffer back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde_json::json;

use crate::commands::{Command, CommandError, HELP};
use crate::config::EcConfig;
use crate::console::{Console, Input};
use crate::ec::{EcDevice, RegisterSnapshot};
use crate::error::{EcfanError, Result};
use crate::fan::Fan;
use crate::logger::log_event;
use crate::register::{FanMode, RegisterView};
use crate::system::WriteAccess;

/// Granularity of interruptible sleeps.
const SLEEP_SLICE: Duration = Duration::from_millis(100);
/// Delay between input polls while waiting for a command.
const INPUT_POLL: Duration = Duration::from_millis(200);
const PROMPT: &str = "what do you want to do?";
const VIEW_FOOTER: &str = "[enter] command  [q] quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    View,
    Command,
    Quit,
}

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Quit,
    Interrupted,
}

pub struct Controller<D: EcDevice> {
    device: D,
    cool_boost: RegisterView,
    enable_cool_boost_on_start: bool,
    fans: Vec<Fan>,
    snapshot: RegisterSnapshot,
    wait_seconds: u64,
    /// shown once at the top of the next view
    status: Option<String>,
}

impl<D: EcDevice> Controller<D> {
    /// Build fans from config and take the first snapshot. Fails if any
    /// configured register lies outside the device's address space.
    pub fn new(config: &EcConfig, device: D) -> Result<Self> {
        let fans = config
            .fans
            .iter()
            .map(|cfg| Fan::from_config(cfg, config.max_temp))
            .collect::<Result<Vec<_>>>()?;
        let snapshot = RegisterSnapshot::load(&device)?;

        let cool_boost = RegisterView::new(config.cool_boost.register);
        let addresses = fans
            .iter()
            .flat_map(|f| f.addresses())
            .chain(std::iter::once(cool_boost.address));
        for address in addresses {
            if !snapshot.contains(address) {
                return Err(EcfanError::invalid_config(
                    format!("register 0x{:02x}", address),
                    format!("device only exposes {} bytes", snapshot.len()),
                ));
            }
        }

        Ok(Self {
            device,
            cool_boost,
            enable_cool_boost_on_start: config.cool_boost.enable_on_start,
            fans,
            snapshot,
            wait_seconds: config.wait_seconds,
            status: None,
        })
    }

    pub fn fans(&self) -> &[Fan] {
        &self.fans
    }

    pub fn snapshot(&self) -> &RegisterSnapshot {
        &self.snapshot
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn wait_seconds(&self) -> u64 {
        self.wait_seconds
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn cool_boost_on(&self) -> Result<bool> {
        Ok(self.cool_boost.read(&self.snapshot)? != 0)
    }

    pub fn reload(&mut self) -> Result<()> {
        self.snapshot = RegisterSnapshot::load(&self.device)?;
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        self.snapshot.commit(&mut self.device)?;
        log_event("snapshot_commit", json!({ "bytes": self.snapshot.len() }));
        Ok(())
    }

    /// Initial state: cool boost on (when configured) and every fan on auto,
    /// written in one commit.
    pub fn startup(&mut self) -> Result<()> {
        self.reload()?;
        if self.enable_cool_boost_on_start {
            self.cool_boost.write(1, &mut self.snapshot)?;
        }
        for fan in &self.fans {
            fan.set_mode(FanMode::Auto, &mut self.snapshot)?;
        }
        self.commit()
    }

    /// Hand every fan back to the EC.
    pub fn restore_auto(&mut self) -> Result<()> {
        self.reload()?;
        for fan in &self.fans {
            fan.set_mode(FanMode::Auto, &mut self.snapshot)?;
        }
        self.commit()?;
        log_event("restore_auto", json!({ "fans": self.fans.len() }));
        Ok(())
    }

    /// Reload, sample every fan and compose the view text.
    pub fn refresh(&mut self, columns: usize) -> Result<String> {
        self.reload()?;
        let mut out = String::new();
        if let Some(status) = self.status.take() {
            out.push_str(&status);
            out.push('\n');
        }
        let boost = if self.cool_boost_on()? { "ON" } else { "OFF" };
        out.push_str(&format!("cool boost: {}\n", boost));
        for fan in self.fans.iter_mut() {
            out.push_str(&fan.summary(&self.snapshot, columns)?);
        }
        out.push_str(VIEW_FOOTER);
        Ok(out)
    }

    fn report(&mut self, err: &EcfanError) {
        log_event("user_error", json!({ "error": err.to_string() }));
        self.status = Some(format!("error: {}", err));
    }

    /// Parse and run one command line. User mistakes are reported and land
    /// back in View; device failures propagate.
    pub fn dispatch<C: Console>(&mut self, line: &str, console: &mut C) -> Result<State> {
        let outcome = line
            .parse::<Command>()
            .map_err(EcfanError::from)
            .and_then(|cmd| {
                log_event("command", json!({ "line": line }));
                self.execute(cmd, console)
            });
        match outcome {
            Ok(state) => Ok(state),
            Err(e) if e.is_user_error() => {
                self.report(&e);
                Ok(State::View)
            }
            Err(e) => Err(e),
        }
    }

    pub fn execute<C: Console>(&mut self, cmd: Command, console: &mut C) -> Result<State> {
        match cmd {
            Command::Set { fan, percent } => {
                self.reload()?;
                find_fan(&self.fans, fan)?.set_speed(percent, &mut self.snapshot)?;
                self.commit()?;
                Ok(State::View)
            }
            Command::Auto { fan } => {
                self.reload()?;
                find_fan(&self.fans, fan)?.set_mode(FanMode::Auto, &mut self.snapshot)?;
                self.commit()?;
                Ok(State::View)
            }
            Command::CoolBoost(on) => {
                self.reload()?;
                self.cool_boost.write(on as i32, &mut self.snapshot)?;
                self.commit()?;
                Ok(State::View)
            }
            Command::Wait(seconds) => {
                self.wait_seconds = seconds;
                Ok(State::View)
            }
            Command::Help => {
                console.show(HELP)?;
                Ok(State::Command)
            }
            Command::Back => Ok(State::View),
            Command::Quit => Ok(State::Quit),
        }
    }

    /// Sleep for `duration` in short slices. Returns false if interrupted.
    fn pause<C: Console>(console: &mut C, duration: Duration, interrupt: &AtomicBool) -> bool {
        let mut left = duration;
        while !left.is_zero() {
            if interrupt.load(Ordering::SeqCst) {
                return false;
            }
            let step = left.min(SLEEP_SLICE);
            console.sleep(step);
            left -= step;
        }
        !interrupt.load(Ordering::SeqCst)
    }

    pub fn view_step<C: Console>(&mut self, console: &mut C, interrupt: &AtomicBool) -> Result<State> {
        let started = Instant::now();
        let text = self.refresh(console.columns())?;
        console.clear()?;
        console.show(&text)?;

        let wait = Duration::from_secs(self.wait_seconds).saturating_sub(started.elapsed());
        if !Self::pause(console, wait, interrupt) {
            return Ok(State::View);
        }
        match console.poll_line()? {
            Input::Line(line) if line == "q" => Ok(State::Quit),
            Input::Line(_) => {
                console.clear()?;
                Ok(State::Command)
            }
            Input::Pending => Ok(State::View),
            Input::Closed => Ok(State::Quit),
        }
    }

    pub fn command_step<C: Console>(&mut self, console: &mut C, interrupt: &AtomicBool) -> Result<State> {
        console.show(PROMPT)?;
        loop {
            if interrupt.load(Ordering::SeqCst) {
                return Ok(State::Command);
            }
            match console.poll_line()? {
                Input::Line(line) => return self.dispatch(&line, console),
                Input::Pending => console.sleep(INPUT_POLL),
                Input::Closed => return Ok(State::Quit),
            }
        }
    }

    /// Drive the state machine until `q` or an interrupt.
    pub fn run<C: Console>(&mut self, console: &mut C, interrupt: &AtomicBool) -> Result<Exit> {
        let mut state = State::View;
        loop {
            if interrupt.load(Ordering::SeqCst) {
                log_event("interrupt", json!({ "state": format!("{:?}", state) }));
                return Ok(Exit::Interrupted);
            }
            state = match state {
                State::View => self.view_step(console, interrupt)?,
                State::Command => self.command_step(console, interrupt)?,
                State::Quit => return Ok(Exit::Quit),
            };
        }
    }
}

fn find_fan(fans: &[Fan], name: String) -> std::result::Result<&Fan, CommandError> {
    fans.iter()
        .find(|f| f.name == name)
        .ok_or(CommandError::UnknownFan(name))
}

/// Cleanup after the loop. Fans go back to auto unless the user quit
/// normally; write access is always released. The first failure is returned.
pub fn shutdown<D, A>(controller: &mut Controller<D>, access: &mut A, outcome: &Result<Exit>) -> Result<()>
where
    D: EcDevice,
    A: WriteAccess + ?Sized,
{
    let restored = match outcome {
        Ok(Exit::Quit) => Ok(()),
        Ok(Exit::Interrupted) | Err(_) => controller.restore_auto(),
    };
    let released = access.disable();
    restored.and(released)
}
