/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Converts subtitle picture streams between optical disc formats.
//!
//! # Overview
//!
//! Three container formats are supported, all of which carry the same logical content: a
//! sequence of timed, palette-indexed bitmaps positioned on a screen.
//!
//! 1. Blu-ray presentation graphics (BD-SUP), handled by [`bd`].
//! 2. DVD sub-pictures framed with `"SP"` headers and paired with an IFO palette, handled by
//!    [`dvd`].
//! 3. VobSub SUB/IDX pairs, handled by [`vobsub`].
//!
//! Each format is read into [`SubtitlePicture`] values whose pixels are decoded on demand into
//! a [`Bitmap`] and [`Palette`], and each is written from the same three values. Color
//! reduction happens elsewhere; the writers expect bitmaps that are already palette-indexed.

pub mod bd;
pub mod dvd;
pub mod error;
pub mod palette;
pub mod picture;
pub mod rle;
pub mod segment;
pub mod source;
pub mod timing;
pub mod vobsub;

pub use error::{CaptionError, CaptionResult, CaptionWarning, DecodeError, StreamError, Warning};
pub use palette::{FramePalette, Palette, PaletteEntry, Rgb};
pub use picture::{
    BdPicture,
    Bitmap,
    DvdPicture,
    ImageObjectFragment,
    PictureFormat,
    SubtitlePicture,
};
pub use source::{ByteSource, FileBuffer};
