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

//! Bounded sample history and block-character bar graphs.

use crate::register::{DecodeRange, RESOLUTION};

/// Partial-height glyphs, index = eighths filled
const GLYPHS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const FILLER: char = '█';
const LEVELS: i32 = 8;

/// Full-height rows a bar can stack below its partial glyph.
const MAX_FILLERS: usize = (RESOLUTION / LEVELS) as usize;

/// Fixed height of every rendered graph.
pub const GRAPH_ROWS: usize = MAX_FILLERS + 1;

/// Raw register samples, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    samples: Vec<u8>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a sample and keep only the newest `window` entries.
    pub fn append(&mut self, sample: u8, window: usize) {
        self.samples.push(sample);
        if self.samples.len() > window {
            let excess = self.samples.len() - window;
            self.samples.drain(..excess);
        }
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn latest(&self) -> Option<u8> {
        self.samples.last().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// One bar, top row first.
fn column(level: i32) -> [char; GRAPH_ROWS] {
    let level = level.clamp(0, RESOLUTION);
    let fillers = (level / LEVELS) as usize;
    let partial = GLYPHS[(level % LEVELS) as usize];

    let mut col = [' '; GRAPH_ROWS];
    let partial_row = MAX_FILLERS - fillers;
    col[partial_row] = partial;
    for cell in col.iter_mut().skip(partial_row + 1) {
        *cell = FILLER;
    }
    col
}

/// Render raw samples as a bar graph: one column per sample (time runs left to
/// right), `GRAPH_ROWS` rows joined by newlines with the tallest level on top.
/// Levels outside `0..=RESOLUTION` are clamped.
pub fn render(samples: &[u8], range: &DecodeRange) -> String {
    let columns: Vec<[char; GRAPH_ROWS]> = samples
        .iter()
        .map(|&raw| column(range.to_resolution(raw as i32)))
        .collect();

    (0..GRAPH_ROWS)
        .map(|row| columns.iter().map(|col| col[row]).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
