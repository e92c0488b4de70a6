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
    PACKET_MAGIC_NUMBER,
    spu::encode_spu,
    super::{
        error::CaptionWarning,
        picture::{Bitmap, SubtitlePicture},
        timing::{format_pts, pts32},
    },
};
use std::io::Write;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

/// Writes captions as a DVD SUP stream.
///
/// Each caption's four colors come from its frame palette, which indexes the IFO palette that
/// has to accompany the stream.
pub struct SupDvdWriter<W> {
    output: W,
    captions: usize,
    warnings: Vec<CaptionWarning>,
}

impl<W> SupDvdWriter<W> where
    W: Write,
{

    pub fn new(output: W) -> Self {
        Self {
            output,
            captions: 0,
            warnings: vec![],
        }
    }

    /// Warnings raised while writing, such as shortened display durations.
    pub fn warnings(&self) -> &[CaptionWarning] {
        &self.warnings
    }

    /// Writes one caption. Its bitmap may only use indices 0 through 3.
    pub fn write_caption(&mut self, picture: &SubtitlePicture, bitmap: &Bitmap) -> WriteResult<()> {

        let (spu, warning) = encode_spu(picture, bitmap, picture.frame_palette())?;
        let mut packet = Vec::with_capacity(spu.len() + 10);

        packet.write_u16::<BigEndian>(PACKET_MAGIC_NUMBER)?;
        packet.write_u32::<LittleEndian>(pts32(picture.start_time))?;
        packet.write_u32::<LittleEndian>(0)?;
        packet.extend(spu);

        self.output.write_all(&packet)?;

        if let Some(warning) = warning {
            log::warn!(
                "Caption {} at {}: {:?}",
                self.captions,
                format_pts(picture.start_time),
                warning,
            );
            self.warnings.push(CaptionWarning { caption: self.captions, warning });
        }

        self.captions += 1;

        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}
