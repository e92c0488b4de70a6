/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Palettes and their color representation.
//!
//! Every supported format stores colors as YCbCr with a separate alpha channel, so that is
//! what a [`PaletteEntry`] holds. RGB is only ever derived from an entry.
//!
//! DVD formats add a second level of indirection. Each caption carries a [`FramePalette`]
//! that picks four entries out of a sixteen-color main palette (stored in the IFO file or IDX
//! index) and assigns each of them an alpha nibble.

#[cfg(test)]
mod tests;

/// The largest number of entries any palette may have.
pub const MAX_PALETTE_SIZE: usize = 256;

/// The number of entries in a DVD main palette.
pub const DVD_PALETTE_SIZE: usize = 16;

const DEFAULT_DVD_PALETTE: [[u8; 3]; DVD_PALETTE_SIZE] = [
    [0x00, 0x00, 0x00], [0xf0, 0xf0, 0xf0], [0xcc, 0xcc, 0xcc], [0x99, 0x99, 0x99],
    [0x33, 0x33, 0xfa], [0x11, 0x11, 0xbb], [0xfa, 0x33, 0x33], [0xbb, 0x11, 0x11],
    [0x33, 0xfa, 0x33], [0x11, 0xbb, 0x11], [0xfa, 0xfa, 0x33], [0xbb, 0xbb, 0x11],
    [0xfa, 0x33, 0xfa], [0xbb, 0x11, 0xbb], [0x33, 0xfa, 0xfa], [0x11, 0xbb, 0xbb],
];

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// One YCbCrA palette color, as it appears on the wire.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PaletteEntry {
    pub y: u8,
    pub cb: u8,
    pub cr: u8,
    pub alpha: u8,
}

impl Default for PaletteEntry {
    fn default() -> Self {
        Self { y: 16, cb: 128, cr: 128, alpha: 0 }
    }
}

impl PaletteEntry {

    pub fn new(y: u8, cb: u8, cr: u8, alpha: u8) -> Self {
        Self { y, cb, cr, alpha }
    }

    /// Converts an RGB color using the BT.601 studio-range matrix.
    pub fn from_rgb(rgb: Rgb, alpha: u8) -> Self {

        let r = rgb.red as f64;
        let g = rgb.green as f64;
        let b = rgb.blue as f64;

        Self {
            y: clamp(16.0 + 0.256788 * r + 0.504129 * g + 0.097906 * b),
            cb: clamp(128.0 - 0.148223 * r - 0.290993 * g + 0.439216 * b),
            cr: clamp(128.0 + 0.439216 * r - 0.367788 * g - 0.071427 * b),
            alpha,
        }
    }

    /// Derives the RGB color of this entry using the BT.601 studio-range matrix.
    pub fn rgb(&self) -> Rgb {

        let y = 1.164383 * (self.y as f64 - 16.0);
        let cb = self.cb as f64 - 128.0;
        let cr = self.cr as f64 - 128.0;

        Rgb {
            red: clamp(y + 1.596027 * cr),
            green: clamp(y - 0.391762 * cb - 0.812968 * cr),
            blue: clamp(y + 2.017232 * cb),
        }
    }
}

fn clamp(value: f64) -> u8 {
    value.round().max(0.0).min(255.0) as u8
}

/// An indexed set of up to 256 colors.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(MAX_PALETTE_SIZE)
    }
}

impl Palette {

    /// Creates a palette of `size` fully transparent black entries. The size is clamped to
    /// `1..=256`.
    pub fn new(size: usize) -> Self {
        Self {
            entries: vec![PaletteEntry::default(); size.max(1).min(MAX_PALETTE_SIZE)],
        }
    }

    /// Creates a palette from existing entries, keeping at most 256 of them.
    pub fn from_entries(mut entries: Vec<PaletteEntry>) -> Self {

        entries.truncate(MAX_PALETTE_SIZE);

        if entries.is_empty() {
            entries.push(PaletteEntry::default());
        }

        Self { entries }
    }

    /// The sixteen-color palette DVD authoring tools fall back to when no IFO is available.
    pub fn default_dvd() -> Self {
        Self {
            entries: DEFAULT_DVD_PALETTE.iter().map(|&[red, green, blue]|
                PaletteEntry::from_rgb(Rgb { red, green, blue }, 0xFF)
            ).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PaletteEntry> {
        self.entries.get(index)
    }

    /// Replaces the entry at `index`, growing the palette if needed. Indices beyond 255 are
    /// ignored.
    pub fn set(&mut self, index: usize, entry: PaletteEntry) {

        if index >= MAX_PALETTE_SIZE {
            return
        }
        if index >= self.entries.len() {
            self.entries.resize(index + 1, PaletteEntry::default());
        }

        self.entries[index] = entry;
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    /// The sum of all alpha values, used to pick the more opaque of two palettes.
    pub fn alpha_sum(&self) -> u32 {
        self.entries.iter().map(|entry| entry.alpha as u32).sum()
    }

    /// The index of the last entry that is not fully transparent.
    pub fn last_visible_index(&self) -> Option<usize> {
        self.entries.iter().rposition(|entry| entry.alpha != 0)
    }
}

/// Four main-palette indices and their alpha nibbles, as carried by each DVD caption.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct FramePalette {
    /// Indices into the sixteen-color main palette.
    pub colors: [u8; 4],
    /// Alpha values from `0` (transparent) to `15` (opaque).
    pub alpha: [u8; 4],
}

impl FramePalette {

    pub fn new(colors: [u8; 4], alpha: [u8; 4]) -> Self {
        Self {
            colors: colors.map(|color| color & 0x0F),
            alpha: alpha.map(|alpha| alpha & 0x0F),
        }
    }

    pub fn alpha_sum(&self) -> u32 {
        self.alpha.iter().map(|&alpha| alpha as u32).sum()
    }

    /// Builds the four-color palette a decoded DVD bitmap is displayed with.
    pub fn resolve(&self, main: &Palette) -> Palette {

        let mut palette = Palette::new(4);

        for i in 0..4 {
            let base = main.get(self.colors[i] as usize).copied().unwrap_or_default();
            palette.set(
                i,
                PaletteEntry {
                    alpha: (self.alpha[i] & 0x0F) * 17,
                    ..base
                },
            );
        }

        palette
    }
}
