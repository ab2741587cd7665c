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

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;

use ecfan::config::{config_path, load_config};
use ecfan::console::Terminal;
use ecfan::controller::{self, Controller, Exit};
use ecfan::ec::EcFile;
use ecfan::logger;
use ecfan::system::{self, EcSysModule, ExternalAccess, WriteAccess};

const USAGE: &str = "\
usage: ecfan [--config PATH] [--device PATH] [--logging] [--no-modprobe]

  --config PATH    fan description (default: $ECFAN_CONFIG, ~/.config/ecfan/config.json)
  --device PATH    EC byte range (default: /sys/kernel/debug/ec/ec0/io)
  --logging        append JSON events to /var/log/ecfan/events.json
  --no-modprobe    do not reload ec_sys; write access is managed elsewhere";

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    if !system::is_root() {
        eprintln!("Error: ecfan requires root privileges to access the embedded controller.");
        eprintln!("Please run with: sudo {}", args.first().map(String::as_str).unwrap_or("ecfan"));
        std::process::exit(1);
    }

    let logging_enabled = args.iter().any(|a| a == "--logging");
    if logging_enabled {
        logger::init_logging();
        logger::log_event("startup", serde_json::json!({ "args": args }));
    }

    let config_file = arg_value(&args, "--config")
        .map(PathBuf::from)
        .unwrap_or_else(config_path);
    let mut cfg = load_config(&config_file)
        .with_context(|| format!("loading config {}", config_file.display()))?;
    if let Some(device) = arg_value(&args, "--device") {
        cfg.device = PathBuf::from(device);
    }

    let mut access: Box<dyn WriteAccess> = if args.iter().any(|a| a == "--no-modprobe") {
        Box::new(ExternalAccess)
    } else {
        Box::new(EcSysModule::new())
    };
    access.enable().context("enabling EC write access")?;

    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupt);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        eprintln!("warning: failed to set interrupt handler: {}", e);
    }

    let mut ctl = match Controller::new(&cfg, EcFile::new(&cfg.device)) {
        Ok(ctl) => ctl,
        Err(err) => {
            let _ = access.disable();
            eprintln!("error: {err}");
            logger::log_event("fatal_error", serde_json::json!({ "error": err.to_string() }));
            std::process::exit(1);
        }
    };

    let outcome = ctl.startup().and_then(|_| {
        let mut term = Terminal::new();
        ctl.run(&mut term, &interrupt)
    });
    let cleanup = controller::shutdown(&mut ctl, access.as_mut(), &outcome);

    match outcome {
        Ok(Exit::Interrupted) => println!("\ninterrupted: fans returned to auto"),
        Ok(Exit::Quit) => {}
        Err(err) => {
            eprintln!("error: {err}");
            logger::log_event("fatal_error", serde_json::json!({ "error": err.to_string() }));
            if let Err(e) = cleanup {
                eprintln!("cleanup failed: {e}");
            }
            std::process::exit(1);
        }
    }
    if let Err(e) = cleanup {
        eprintln!("cleanup failed: {e}");
        std::process::exit(1);
    }
    Ok(())
}
