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

//! Terminal side of the command loop: screen clearing, width, and
//! line input polled without blocking.

use std::io::{self, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::thread;
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType};

use crate::error::Result;

const FALLBACK_COLUMNS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// nothing complete yet
    Pending,
    /// stdin reached end of file
    Closed,
}

pub trait Console {
    /// Current terminal width in columns.
    fn columns(&self) -> usize;
    fn clear(&mut self) -> Result<()>;
    fn show(&mut self, text: &str) -> Result<()>;
    /// Return a complete line if one is available, without blocking.
    fn poll_line(&mut self) -> Result<Input>;
    fn sleep(&mut self, duration: Duration);
}

/// Console on the controlling terminal. Input is read straight from the stdin
/// descriptor, and only after `poll` reports it readable, so the descriptor
/// itself stays blocking and stdout is never affected.
pub struct Terminal {
    fd: RawFd,
    pending: Vec<u8>,
}

impl Terminal {
    pub fn new() -> Self {
        Self::with_fd(io::stdin().as_raw_fd())
    }

    fn with_fd(fd: RawFd) -> Self {
        Self { fd, pending: Vec::new() }
    }

    /// True when a read on the descriptor would not block (data or EOF).
    fn readable(&self) -> Result<bool> {
        let mut pfd = libc::pollfd { fd: self.fd, events: libc::POLLIN, revents: 0 };
        let rc = unsafe { libc::poll(&mut pfd, 1, 0) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(err.into());
        }
        Ok(rc > 0 && pfd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0)
    }

    /// One read(2) on the descriptor. `None` when interrupted by a signal.
    fn read_chunk(&self, buf: &mut [u8]) -> Result<Option<usize>> {
        let n = unsafe { libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(None);
            }
            return Err(err.into());
        }
        Ok(Some(n as usize))
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=end).collect();
        Some(String::from_utf8_lossy(&line).trim().to_string())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for Terminal {
    fn columns(&self) -> usize {
        terminal::size()
            .map(|(cols, _)| cols as usize)
            .unwrap_or(FALLBACK_COLUMNS)
    }

    fn clear(&mut self) -> Result<()> {
        execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))?;
        Ok(())
    }

    fn show(&mut self, text: &str) -> Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", text)?;
        out.flush()?;
        Ok(())
    }

    fn poll_line(&mut self) -> Result<Input> {
        if let Some(line) = self.take_line() {
            return Ok(Input::Line(line));
        }
        if !self.readable()? {
            return Ok(Input::Pending);
        }
        let mut buf = [0u8; 256];
        match self.read_chunk(&mut buf)? {
            None => return Ok(Input::Pending),
            Some(0) => {
                // flush a final unterminated line before reporting EOF
                if self.pending.is_empty() {
                    return Ok(Input::Closed);
                }
                self.pending.push(b'\n');
            }
            Some(n) => self.pending.extend_from_slice(&buf[..n]),
        }
        Ok(self.take_line().map(Input::Line).unwrap_or(Input::Pending))
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::os::unix::io::FromRawFd;

    fn detached(pending: &[u8]) -> Terminal {
        Terminal { fd: -1, pending: pending.to_vec() }
    }

    /// Terminal reading the far end of a pipe; the writer is handed back.
    fn piped() -> (Terminal, File, File) {
        let mut fds = [0 as libc::c_int; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let reader = unsafe { File::from_raw_fd(fds[0]) };
        let writer = unsafe { File::from_raw_fd(fds[1]) };
        (Terminal::with_fd(reader.as_raw_fd()), reader, writer)
    }

    #[test]
    fn test_take_line_splits_on_newline() {
        let mut term = detached(b"set CPU 0.5\nback\npartial");
        assert_eq!(term.take_line().as_deref(), Some("set CPU 0.5"));
        assert_eq!(term.take_line().as_deref(), Some("back"));
        assert_eq!(term.take_line(), None);
        assert_eq!(term.pending, b"partial".to_vec());
    }

    #[test]
    fn test_take_line_trims_carriage_return() {
        let mut term = detached(b"  help\r\n");
        assert_eq!(term.take_line().as_deref(), Some("help"));
        assert!(term.pending.is_empty());
    }

    #[test]
    fn test_buffered_line_is_returned_before_reading_stdin() {
        let mut term = detached(b"q\n");
        assert_eq!(term.poll_line().unwrap(), Input::Line("q".to_string()));
    }

    #[test]
    fn test_poll_line_pending_when_nothing_to_read() {
        let (mut term, _reader, _writer) = piped();
        assert!(!term.readable().unwrap());
        assert_eq!(term.poll_line().unwrap(), Input::Pending);
    }

    #[test]
    fn test_poll_line_reads_lines_when_ready() {
        let (mut term, _reader, mut writer) = piped();
        writer.write_all(b"set CPU 1\nba").unwrap();
        assert_eq!(term.poll_line().unwrap(), Input::Line("set CPU 1".to_string()));
        assert_eq!(term.poll_line().unwrap(), Input::Pending);

        writer.write_all(b"ck\n").unwrap();
        assert_eq!(term.poll_line().unwrap(), Input::Line("back".to_string()));
    }

    #[test]
    fn test_poll_line_eof_flushes_partial_then_closes() {
        let (mut term, _reader, mut writer) = piped();
        writer.write_all(b"q").unwrap();
        assert_eq!(term.poll_line().unwrap(), Input::Pending);
        drop(writer);

        assert!(term.readable().unwrap());
        assert_eq!(term.poll_line().unwrap(), Input::Line("q".to_string()));
        assert_eq!(term.poll_line().unwrap(), Input::Closed);
    }

    #[test]
    fn test_poll_does_not_touch_descriptor_flags() {
        let (mut term, reader, _writer) = piped();
        let before = unsafe { libc::fcntl(reader.as_raw_fd(), libc::F_GETFL) };
        term.poll_line().unwrap();
        let after = unsafe { libc::fcntl(reader.as_raw_fd(), libc::F_GETFL) };
        assert_eq!(before, after);
        assert_eq!(after & libc::O_NONBLOCK, 0);
    }
}
