/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! The format-neutral caption model.


use super::palette::{FramePalette, Palette};

/// A rectangle of palette indices, stored row by row.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Bitmap {
    width: u16,
    height: u16,
    pixels: Vec<u8>,
}

impl Bitmap {

    /// Creates a bitmap with every pixel set to `fill`.
    pub fn new(width: u16, height: u16, fill: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width as usize * height as usize],
        }
    }

    /// Wraps existing pixels. Returns `None` if their count is not `width * height`.
    pub fn from_pixels(width: u16, height: u16, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() == width as usize * height as usize {
            Some(Self { width, height, pixels })
        } else {
            None
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let width = self.width as usize;
        &self.pixels[(y * width)..((y + 1) * width)]
    }

    pub(crate) fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let width = self.width as usize;
        &mut self.pixels[(y * width)..((y + 1) * width)]
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.pixels[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    /// The largest palette index used by any pixel.
    pub fn highest_index(&self) -> u8 {
        self.pixels.iter().copied().max().unwrap_or(0)
    }
}

/// One physical packet's share of a logical buffer that spans several packets.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ImageObjectFragment {
    /// Absolute stream offset of the first byte carried by this packet.
    pub buffer_offset: u64,
    /// Number of bytes carried by this packet.
    pub packet_size: u32,
}

/// Fields only Blu-ray captions have.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BdPicture {
    /// Composition number of the epoch-start PCS. Writers manage this themselves and ignore
    /// the value given here.
    pub composition_number: u16,
    pub object_id: u16,
    pub window_id: u8,
    /// The palette in effect once every palette update of the epoch has been applied.
    pub palette: Palette,
    /// RLE length declared in the first object definition segment.
    pub object_length: u64,
    /// Object definition segment payloads, in stream order.
    pub fragments: Vec<ImageObjectFragment>,
}

/// Fields only DVD and VobSub captions have.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DvdPicture {
    pub frame_palette: FramePalette,
    /// Packets carrying the sub-picture unit, in stream order.
    pub spu_fragments: Vec<ImageObjectFragment>,
    /// Start of the even-row RLE buffer within the sub-picture unit.
    pub even_offset: u16,
    /// Start of the odd-row RLE buffer within the sub-picture unit.
    pub odd_offset: u16,
    /// End of the odd-row RLE buffer within the sub-picture unit.
    pub rle_end: u16,
    /// Number of end sequence links the control header chained together.
    pub chain_links: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PictureFormat {
    Bd(BdPicture),
    Dvd(DvdPicture),
}

/// One caption: where and when a bitmap is shown.
///
/// Times are in 90 kHz ticks.
#[derive(Clone, Debug, PartialEq)]
pub struct SubtitlePicture {
    pub screen_width: u16,
    pub screen_height: u16,
    /// Width of the bitmap in pixels.
    pub width: u16,
    /// Height of the bitmap in pixels.
    pub height: u16,
    /// Horizontal position of the bitmap on the screen.
    pub x: u16,
    /// Vertical position of the bitmap on the screen.
    pub y: u16,
    pub start_time: u64,
    pub end_time: u64,
    pub forced: bool,
    pub format: PictureFormat,
}

impl SubtitlePicture {

    /// Creates a Blu-ray caption showing `bitmap` at `(x, y)`.
    pub fn bd(
        screen_width: u16,
        screen_height: u16,
        bitmap: &Bitmap,
        x: u16,
        y: u16,
        start_time: u64,
        end_time: u64,
    ) -> Self {
        Self {
            screen_width,
            screen_height,
            width: bitmap.width(),
            height: bitmap.height(),
            x,
            y,
            start_time,
            end_time,
            forced: false,
            format: PictureFormat::Bd(BdPicture::default()),
        }
    }

    /// Creates a DVD caption showing `bitmap` at `(x, y)` with the given frame palette.
    #[allow(clippy::too_many_arguments)]
    pub fn dvd(
        screen_width: u16,
        screen_height: u16,
        bitmap: &Bitmap,
        x: u16,
        y: u16,
        start_time: u64,
        end_time: u64,
        frame_palette: FramePalette,
    ) -> Self {
        Self {
            screen_width,
            screen_height,
            width: bitmap.width(),
            height: bitmap.height(),
            x,
            y,
            start_time,
            end_time,
            forced: false,
            format: PictureFormat::Dvd(
                DvdPicture {
                    frame_palette,
                    ..DvdPicture::default()
                }
            ),
        }
    }

    pub fn duration(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }

    pub fn as_bd(&self) -> Option<&BdPicture> {
        match &self.format {
            PictureFormat::Bd(bd) => Some(bd),
            PictureFormat::Dvd(_) => None,
        }
    }

    pub fn as_dvd(&self) -> Option<&DvdPicture> {
        match &self.format {
            PictureFormat::Dvd(dvd) => Some(dvd),
            PictureFormat::Bd(_) => None,
        }
    }

    /// The frame palette of a DVD caption, or a default one for anything else.
    pub fn frame_palette(&self) -> FramePalette {
        match &self.format {
            PictureFormat::Dvd(dvd) => dvd.frame_palette,
            PictureFormat::Bd(_) => FramePalette::new([0, 1, 2, 3], [0, 15, 15, 15]),
        }
    }
}
