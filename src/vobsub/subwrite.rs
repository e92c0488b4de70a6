/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2022 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{
    WriteResult,
    idx::{write_idx, Idx, IdxEntry},
    ps::packetize,
    super::{
        dvd::spu::encode_spu,
        error::CaptionWarning,
        picture::{Bitmap, SubtitlePicture},
        timing::format_pts,
    },
};
use std::io::Write;

/// Writes captions as a VobSub SUB stream while building up its IDX file.
pub struct VobSubWriter<W> {
    output: W,
    position: u64,
    idx: Idx,
    warnings: Vec<CaptionWarning>,
}

impl<W> VobSubWriter<W> where
    W: Write,
{

    /// Creates a writer whose IDX file takes its screen size, palette and language from `idx`.
    /// Any entries `idx` already has are discarded.
    pub fn new(output: W, mut idx: Idx) -> Self {

        idx.entries.clear();

        Self {
            output,
            position: 0,
            idx,
            warnings: vec![],
        }
    }

    /// The IDX file for the captions written so far.
    pub fn idx(&self) -> &Idx {
        &self.idx
    }

    pub fn warnings(&self) -> &[CaptionWarning] {
        &self.warnings
    }

    /// Writes one caption. Its bitmap may only use indices 0 through 3, which the caption's
    /// frame palette maps onto the IDX palette.
    pub fn write_caption(&mut self, picture: &SubtitlePicture, bitmap: &Bitmap) -> WriteResult<()> {

        let (spu, warning) = encode_spu(picture, bitmap, picture.frame_palette())?;
        let packs = packetize(&spu, picture.start_time)?;
        let caption = self.idx.entries.len();

        self.output.write_all(&packs)?;
        self.idx.entries.push(
            IdxEntry {
                timestamp: picture.start_time,
                filepos: self.position,
            }
        );
        self.position += packs.len() as u64;

        if let Some(warning) = warning {
            log::warn!("Caption {} at {}: {:?}", caption, format_pts(picture.start_time), warning);
            self.warnings.push(CaptionWarning { caption, warning });
        }

        Ok(())
    }

    /// Writes the IDX file to `idx_output` and hands back the SUB stream.
    pub fn finish<I: Write>(mut self, idx_output: &mut I) -> WriteResult<W> {

        self.output.flush()?;
        write_idx(idx_output, &self.idx)?;

        log::info!("Wrote {} VobSub captions", self.idx.entries.len());

        Ok(self.output)
    }
}
