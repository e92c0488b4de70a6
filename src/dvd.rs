/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! DVD sub-pictures, framed as SUP packets and paired with an IFO palette.
//!
//! # Overview
//!
//! A sub-picture unit (SPU) holds a four-color bitmap whose even and odd rows are compressed
//! separately, followed by control sequences that say where and for how long the bitmap is
//! shown and which four of the sixteen IFO palette colors it uses.
//!
//! In a SUP file, each SPU is preceded by a ten-byte packet header:
//!
//! | Bytes | Contents                          |
//! |-------|-----------------------------------|
//! | 2     | `"SP"`                            |
//! | 4     | PTS, little-endian                |
//! | 4     | zero                              |
//!
//! The same SPUs also make up VobSub streams, see [`vobsub`](crate::vobsub).


pub mod control;
pub mod ifo;
pub mod spu;
mod supread;
mod supwrite;

pub use supread::*;
pub use supwrite::*;

use super::{error::Warning, palette::FramePalette};
use std::io::Error as IoError;
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for DVD writing operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// The error type for DVD and VobSub writers.
#[derive(ThisError, Debug)]
pub enum WriteError {
    /// The caption could not be written because of an underlying I/O error.
    #[error("caption IO error")]
    IoError {
        #[from]
        source: IoError,
    },
    /// The bitmap's dimensions differ from the ones the caption declares.
    #[error("bitmap size does not match caption size")]
    BitmapSizeMismatch,
    /// DVD captions need at least one pixel.
    #[error("bitmap is empty")]
    EmptyBitmap,
    /// The caption reaches past the 12-bit coordinate range of a control header.
    #[error("caption coordinates exceed 4095")]
    CoordinatesOutOfRange,
    /// A pixel uses a palette index above 3.
    #[error("bitmap uses more than four colors")]
    TooManyColors,
    /// The sub-picture unit would exceed 65,535 bytes.
    #[error("sub-picture unit is too large")]
    SpuTooLarge,
}

/// The magic number every SUP packet begins with (`"SP"`).
pub const PACKET_MAGIC_NUMBER: u16 = 0x5350;

/// The size of the header in front of each SPU in a SUP file.
pub const PACKET_HEADER_SIZE: usize = 10;

/// Settings for reading DVD and VobSub streams.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct DecodeOptions {
    /// Gives captions whose four alpha values are all zero the alpha values of the last
    /// visible caption instead.
    pub fix_zero_alpha: bool,
}

/// State carried from one caption to the next while reading a stream.
#[derive(Clone, Debug, Default)]
pub struct DvdDecodeSession {
    options: DecodeOptions,
    last_alpha: Option<[u8; 4]>,
}

impl DvdDecodeSession {

    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            last_alpha: None,
        }
    }

    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    /// Forgets everything learned from earlier captions.
    pub fn reset(&mut self) {
        self.last_alpha = None;
    }

    /// Checks a caption's alpha values, substituting the last visible ones if the caption is
    /// invisible and the fallback is enabled.
    pub fn resolve_alpha(&mut self, frame_palette: &mut FramePalette) -> Option<Warning> {

        if frame_palette.alpha_sum() != 0 {
            self.last_alpha = Some(frame_palette.alpha);
            return None
        }

        let substituted = match (self.options.fix_zero_alpha, self.last_alpha) {
            (true, Some(alpha)) => {
                frame_palette.alpha = alpha;
                true
            }
            _ => false,
        };

        Some(Warning::InvisibleCaption { substituted })
    }
}
