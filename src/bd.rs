/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Blu-ray presentation graphics (BD-SUP) streams.
//!
//! # Overview
//!
//! Each caption is written as two display sets. The first one opens an epoch and carries
//! everything needed to show the caption:
//!
//! 1. PCS (epoch start, one composition object)
//! 2. WDS (one window covering the bitmap)
//! 3. PDS (the palette up to its last visible entry)
//! 4. ODS (one or more, depending on the size of the compressed bitmap)
//! 5. END
//!
//! The second one clears the screen again: a PCS without composition objects, a WDS and an
//! END. Segment timestamps are derived from the [`timing`](crate::timing) model.
//!
//! [`BdReader`] goes the other way, indexing a stream into captions whose bitmaps can then be
//! decoded one at a time.

#[cfg(test)]
mod tests;

mod bdread;
mod bdwrite;

pub use bdread::*;
pub use bdwrite::*;

use super::{palette::Palette, picture::Bitmap};

/// The video frame rate a stream is authored for, as coded in each PCS.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FrameRate {
    /// 23.976 frames per second.
    Film,
    /// 24 frames per second.
    Fps24,
    /// 25 frames per second.
    Pal,
    /// 29.97 frames per second.
    Ntsc,
    /// 50 frames per second.
    Pal50,
    /// 59.94 frames per second.
    Ntsc60,
}

impl Default for FrameRate {
    fn default() -> Self { Self::Film }
}

impl FrameRate {

    pub fn code(self) -> u8 {
        match self {
            FrameRate::Film => 0x10,
            FrameRate::Fps24 => 0x20,
            FrameRate::Pal => 0x30,
            FrameRate::Ntsc => 0x40,
            FrameRate::Pal50 => 0x60,
            FrameRate::Ntsc60 => 0x70,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x10 => Some(FrameRate::Film),
            0x20 => Some(FrameRate::Fps24),
            0x30 => Some(FrameRate::Pal),
            0x40 => Some(FrameRate::Ntsc),
            0x60 => Some(FrameRate::Pal50),
            0x70 => Some(FrameRate::Ntsc60),
            _ => None,
        }
    }
}

/// Settings for writing Blu-ray streams.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct BdOptions {
    pub frame_rate: FrameRate,
}

/// Reduces a bitmap to a palette whose last entry is transparent.
///
/// Blu-ray players treat entry 255 of a full palette as transparent no matter what it
/// contains, so a bitmap relying on that entry being visible has to be quantized again before
/// it can be written. Quantization itself is not part of this crate.
pub trait Quantizer {
    fn quantize(&mut self, bitmap: &Bitmap, palette: &Palette) -> (Bitmap, Palette);
}
