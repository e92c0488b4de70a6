/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! IDX files, the text half of a VobSub pair.

use super::{
    WriteResult,
    super::{
        error::{StreamError, StreamResult},
        palette::{Palette, PaletteEntry, Rgb, DVD_PALETTE_SIZE},
    },
};
use std::io::Write;

/// Ticks of the 90 kHz clock per millisecond.
const TICKS_PER_MS: u64 = 90;

/// One caption's entry in an IDX file.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct IdxEntry {
    /// Start time in 90 kHz ticks, at millisecond precision.
    pub timestamp: u64,
    /// Offset of the caption's first pack in the SUB file.
    pub filepos: u64,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Idx {
    pub screen_width: u16,
    pub screen_height: u16,
    /// Sixteen colors, all opaque; each caption picks four of them.
    pub palette: Palette,
    /// ISO 639 code of the subtitle track.
    pub language: String,
    pub stream_index: u16,
    pub entries: Vec<IdxEntry>,
}

impl Default for Idx {
    fn default() -> Self {
        Self {
            screen_width: 720,
            screen_height: 576,
            palette: Palette::default_dvd(),
            language: "en".to_string(),
            stream_index: 0,
            entries: vec![],
        }
    }
}

/// Parses the contents of an IDX file.
///
/// Only the first track is read; entries following a second `id:` line are ignored. Settings
/// this crate has no use for, such as `scale` or `fadein/out`, are skipped.
pub fn parse_idx(text: &str) -> StreamResult<Idx> {

    let mut idx = Idx::default();
    let mut tracks = 0;

    for (number, line) in text.lines().enumerate() {

        let line = line.trim();
        let number = number + 1;

        if line.is_empty() || line.starts_with('#') {
            continue
        }

        if let Some(size) = line.strip_prefix("size:") {
            let (width, height) = size.trim().split_once('x')
                .and_then(|(width, height)|
                    Some((width.trim().parse::<u16>().ok()?, height.trim().parse::<u16>().ok()?))
                )
                .ok_or(StreamError::InvalidIdx { line: number, field: "size" })?;
            idx.screen_width = width;
            idx.screen_height = height;
        } else if let Some(colors) = line.strip_prefix("palette:") {
            idx.palette = parse_palette(colors)
                .ok_or(StreamError::InvalidIdx { line: number, field: "palette" })?;
        } else if let Some(id) = line.strip_prefix("id:") {
            tracks += 1;
            if tracks > 1 {
                log::debug!("Ignoring track on line {}", number);
                continue
            }
            let (language, index) = id.split_once(',')
                .ok_or(StreamError::InvalidIdx { line: number, field: "id" })?;
            idx.language = language.trim().to_string();
            idx.stream_index = index.trim().strip_prefix("index:")
                .and_then(|index| index.trim().parse().ok())
                .ok_or(StreamError::InvalidIdx { line: number, field: "index" })?;
        } else if let Some(entry) = line.strip_prefix("timestamp:") {
            if tracks > 1 {
                continue
            }
            idx.entries.push(
                parse_entry(entry)
                    .ok_or(StreamError::InvalidIdx { line: number, field: "timestamp" })?
            );
        }
    }

    log::debug!(
        "IDX is {}x{} with {} entries in {:?}",
        idx.screen_width,
        idx.screen_height,
        idx.entries.len(),
        idx.language,
    );

    Ok(idx)
}

fn parse_palette(colors: &str) -> Option<Palette> {

    let entries = colors.split(',')
        .map(|color| {
            let rgb = u32::from_str_radix(color.trim(), 16).ok()?;
            Some(
                PaletteEntry::from_rgb(
                    Rgb {
                        red: (rgb >> 16) as u8,
                        green: (rgb >> 8) as u8,
                        blue: rgb as u8,
                    },
                    0xFF,
                )
            )
        })
        .collect::<Option<Vec<PaletteEntry>>>()?;

    if entries.len() != DVD_PALETTE_SIZE {
        return None
    }

    Some(Palette::from_entries(entries))
}

/// Parses `hh:mm:ss:mmm, filepos: xxxxxxxxx`.
fn parse_entry(entry: &str) -> Option<IdxEntry> {

    let (time, filepos) = entry.split_once(',')?;
    let fields = time.trim().split(':')
        .map(|field| field.parse::<u64>().ok())
        .collect::<Option<Vec<u64>>>()?;
    let filepos = u64::from_str_radix(filepos.trim().strip_prefix("filepos:")?.trim(), 16).ok()?;

    let millis = match fields[..] {
        [hours, minutes, seconds, millis] => hours.checked_mul(60)?
            .checked_add(minutes)?
            .checked_mul(60)?
            .checked_add(seconds)?
            .checked_mul(1000)?
            .checked_add(millis)?,
        _ => return None,
    };

    Some(
        IdxEntry {
            timestamp: millis.checked_mul(TICKS_PER_MS)?,
            filepos,
        }
    )
}

fn format_timestamp(ticks: u64) -> String {

    let millis = ticks / TICKS_PER_MS;

    format!(
        "{:02}:{:02}:{:02}:{:03}",
        millis / 3_600_000,
        millis / 60_000 % 60,
        millis / 1000 % 60,
        millis % 1000,
    )
}

/// Writes `idx` in the layout VobSub players expect.
pub fn write_idx<W: Write>(output: &mut W, idx: &Idx) -> WriteResult<()> {

    let palette = (0..DVD_PALETTE_SIZE)
        .map(|i| {
            let rgb = idx.palette.get(i).copied().unwrap_or_default().rgb();
            format!("{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
        })
        .collect::<Vec<String>>()
        .join(", ");

    writeln!(output, "# VobSub index file, v7 (do not modify this line!)")?;
    writeln!(output, "size: {}x{}", idx.screen_width, idx.screen_height)?;
    writeln!(output, "org: 0, 0")?;
    writeln!(output, "scale: 100%, 100%")?;
    writeln!(output, "alpha: 100%")?;
    writeln!(output, "smooth: OFF")?;
    writeln!(output, "fadein/out: 0, 0")?;
    writeln!(output, "align: OFF at LEFT TOP")?;
    writeln!(output, "time offset: 0")?;
    writeln!(output, "forced subs: OFF")?;
    writeln!(output, "palette: {}", palette)?;
    writeln!(output, "custom colors: OFF, tridx: 0000, colors: 000000, 000000, 000000, 000000")?;
    writeln!(output, "langidx: {}", idx.stream_index)?;
    writeln!(output)?;
    writeln!(output, "id: {}, index: {}", idx.language, idx.stream_index)?;

    for entry in idx.entries.iter() {
        writeln!(
            output,
            "timestamp: {}, filepos: {:09x}",
            format_timestamp(entry.timestamp),
            entry.filepos,
        )?;
    }

    Ok(())
}
