/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! The parts of a video title set IFO file that describe sub-pictures.
//!
//! Only a handful of fields matter here: the video attributes (which give the screen size), the
//! sub-picture stream count and language, and the sixteen-color palette of the first program
//! chain. Everything else is written as zero.

use super::{
    WriteResult,
    super::{
        error::{StreamError, StreamResult},
        palette::{Palette, PaletteEntry, DVD_PALETTE_SIZE},
        source::ByteSource,
    },
};
use std::io::Write;
use byteorder::{BigEndian, ByteOrder};

pub const MAGIC: &[u8; 12] = b"DVDVIDEO-VTS";

pub const SECTOR_SIZE: usize = 0x800;

const LAST_SECTOR_OFFSET: usize = 0x0C;
const LAST_IFO_SECTOR_OFFSET: usize = 0x1C;
const VERSION_OFFSET: usize = 0x20;
const MAT_END_OFFSET: usize = 0x80;
const PGCI_SECTOR_OFFSET: usize = 0xCC;
const VIDEO_ATTRIBUTES_OFFSET: usize = 0x200;
const SUBPICTURE_COUNT_OFFSET: usize = 0x254;
const SUBPICTURE_ATTRIBUTES_OFFSET: usize = 0x256;
const LANGUAGE_OFFSET: usize = 0x258;
const FIRST_PGC_OFFSET: usize = 0x0C;
const PGC_PALETTE_OFFSET: usize = 0xA4;
const PALETTE_SIZE: usize = DVD_PALETTE_SIZE * 4;

/// Where the single program chain is placed when writing.
const WRITTEN_PGC_OFFSET: usize = 0x10;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum VideoStandard {
    Ntsc,
    Pal,
}

impl VideoStandard {

    pub fn height(self) -> u16 {
        match self {
            VideoStandard::Ntsc => 480,
            VideoStandard::Pal => 576,
        }
    }
}

/// Horizontal (and for the smallest one, vertical) resolution of the video.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Resolution {
    Full,
    Cropped,
    Half,
    Quarter,
}

impl Resolution {

    fn code(self) -> u16 {
        match self {
            Resolution::Full => 0,
            Resolution::Cropped => 1,
            Resolution::Half => 2,
            Resolution::Quarter => 3,
        }
    }

    fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Resolution::Full),
            1 => Some(Resolution::Cropped),
            2 => Some(Resolution::Half),
            3 => Some(Resolution::Quarter),
            _ => None,
        }
    }
}

/// Sub-picture information from an IFO file.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Ifo {
    pub standard: VideoStandard,
    pub resolution: Resolution,
    /// Number of sub-picture streams in the title set.
    pub subpicture_streams: u16,
    /// ISO 639 code of the first sub-picture stream.
    pub language: [u8; 2],
    /// The sixteen-color palette of the first program chain.
    pub palette: Palette,
}

impl Default for Ifo {
    fn default() -> Self {
        Self {
            standard: VideoStandard::Pal,
            resolution: Resolution::Full,
            subpicture_streams: 1,
            language: *b"en",
            palette: Palette::default_dvd(),
        }
    }
}

impl Ifo {

    /// The screen size captions are positioned on.
    pub fn screen_size(&self) -> (u16, u16) {

        let height = self.standard.height();

        match self.resolution {
            Resolution::Full => (720, height),
            Resolution::Cropped => (704, height),
            Resolution::Half => (352, height),
            Resolution::Quarter => (352, height / 2),
        }
    }
}

/// Reads the sub-picture information of an IFO file.
pub fn read_ifo<S: ByteSource>(source: &mut S) -> StreamResult<Ifo> {

    if source.len() < SECTOR_SIZE as u64 {
        return Err(StreamError::TruncatedIfo)
    }
    if source.read_bytes(0, MAGIC.len())? != MAGIC {
        return Err(StreamError::UnrecognizedMagicNumber)
    }

    let attributes = source.read_u16(VIDEO_ATTRIBUTES_OFFSET as u64)?;
    let standard = match (attributes >> 12) & 0x03 {
        0 => VideoStandard::Ntsc,
        1 => VideoStandard::Pal,
        other => {
            log::warn!("Unknown video standard {}, assuming PAL", other);
            VideoStandard::Pal
        }
    };
    let resolution = Resolution::from_code((attributes >> 3) & 0x07).unwrap_or_else(|| {
        log::warn!("Unknown video resolution, assuming full");
        Resolution::Full
    });
    let subpicture_streams = source.read_u16(SUBPICTURE_COUNT_OFFSET as u64)?;
    let language_bytes = source.read_bytes(LANGUAGE_OFFSET as u64, 2)?;
    let language = [language_bytes[0], language_bytes[1]];
    let pgci = source.read_u32(PGCI_SECTOR_OFFSET as u64)? as u64 * SECTOR_SIZE as u64;

    if pgci == 0 || pgci + FIRST_PGC_OFFSET as u64 + 4 > source.len() {
        return Err(StreamError::InvalidIfoPointer("PGCI"))
    }

    let pgc = pgci + source.read_u32(pgci + FIRST_PGC_OFFSET as u64)? as u64;
    let palette_offset = pgc + PGC_PALETTE_OFFSET as u64;

    if palette_offset + PALETTE_SIZE as u64 > source.len() {
        return Err(StreamError::InvalidIfoPointer("PGC"))
    }

    let palette_bytes = source.read_bytes(palette_offset, PALETTE_SIZE)?;
    let palette = Palette::from_entries(
        palette_bytes.chunks_exact(4).map(|entry|
            PaletteEntry::new(entry[1], entry[3], entry[2], 0xFF)
        ).collect()
    );

    log::debug!(
        "IFO has {} sub-picture streams, first in {:?}, {:?} {:?}",
        subpicture_streams,
        String::from_utf8_lossy(&language),
        standard,
        resolution,
    );

    Ok(
        Ifo {
            standard,
            resolution,
            subpicture_streams,
            language,
            palette,
        }
    )
}

/// Allows writing IFO files to a destination.
pub trait WriteIfoExt {
    /// Writes a minimal two-sector IFO file carrying `ifo`.
    fn write_ifo(&mut self, ifo: &Ifo) -> WriteResult<()>;
}

impl<T> WriteIfoExt for T where
    T: Write,
{

    fn write_ifo(&mut self, ifo: &Ifo) -> WriteResult<()> {

        let mut bytes = vec![0u8; 2 * SECTOR_SIZE];
        let standard = match ifo.standard {
            VideoStandard::Ntsc => 0,
            VideoStandard::Pal => 1,
        };

        bytes[0..MAGIC.len()].copy_from_slice(MAGIC);
        BigEndian::write_u32(&mut bytes[LAST_SECTOR_OFFSET..], 1);
        BigEndian::write_u32(&mut bytes[LAST_IFO_SECTOR_OFFSET..], 1);
        BigEndian::write_u16(&mut bytes[VERSION_OFFSET..], 0x0010);
        BigEndian::write_u32(&mut bytes[MAT_END_OFFSET..], 0x03FF);
        BigEndian::write_u32(&mut bytes[PGCI_SECTOR_OFFSET..], 1);
        BigEndian::write_u16(
            &mut bytes[VIDEO_ATTRIBUTES_OFFSET..],
            standard << 12 | ifo.resolution.code() << 3,
        );
        BigEndian::write_u16(&mut bytes[SUBPICTURE_COUNT_OFFSET..], ifo.subpicture_streams);
        bytes[SUBPICTURE_ATTRIBUTES_OFFSET] = 0x01;
        bytes[LANGUAGE_OFFSET..(LANGUAGE_OFFSET + 2)].copy_from_slice(&ifo.language);

        let pgci = SECTOR_SIZE;
        let pgc = pgci + WRITTEN_PGC_OFFSET;

        BigEndian::write_u16(&mut bytes[pgci..], 1);
        BigEndian::write_u32(&mut bytes[(pgci + 4)..], (SECTOR_SIZE - 1) as u32);
        bytes[pgci + 8] = 0x81;
        BigEndian::write_u32(&mut bytes[(pgci + FIRST_PGC_OFFSET)..], WRITTEN_PGC_OFFSET as u32);

        for i in 0..DVD_PALETTE_SIZE {
            let entry = ifo.palette.get(i).copied().unwrap_or_default();
            let offset = pgc + PGC_PALETTE_OFFSET + i * 4;
            bytes[offset..(offset + 4)].copy_from_slice(&[0, entry.y, entry.cr, entry.cb]);
        }

        self.write_all(&bytes)?;

        Ok(())
    }
}
