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
    BdOptions,
    FrameRate,
    Quantizer,
    super::{
        palette::{Palette, MAX_PALETTE_SIZE},
        picture::{Bitmap, PictureFormat, SubtitlePicture},
        rle,
        segment::{
            CompositionObject,
            CompositionState,
            EndSegment,
            FinalObjectDefinitionSegment,
            InitialObjectDefinitionSegment,
            MiddleObjectDefinitionSegment,
            PaletteDefinitionSegment,
            PaletteEntry as SegmentPaletteEntry,
            PresentationCompositionSegment,
            Segment,
            SingleObjectDefinitionSegment,
            WindowDefinition,
            WindowDefinitionSegment,
            WriteError as SegmentWriteError,
            WriteSegmentExt,
            INITIAL_OBJECT_DATA_SIZE,
            MIDDLE_OBJECT_DATA_SIZE,
        },
        timing::{format_pts, pts32, segment_times},
    },
};
use std::io::{Error as IoError, Write};
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for caption-writing operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// The error type for [BdWriter].
#[derive(ThisError, Debug)]
pub enum WriteError {
    /// The caption could not be written because of an underlying segment error.
    #[error("segment value error")]
    SegmentError {
        #[from]
        source: SegmentWriteError,
    },
    /// The caption could not be written because of an underlying I/O error.
    #[error("caption IO error")]
    IoError {
        #[from]
        source: IoError,
    },
    /// The bitmap's dimensions differ from the ones the caption declares.
    #[error("bitmap size does not match caption size")]
    BitmapSizeMismatch,
    /// Entry 255 of the palette is visible and no [Quantizer] was available to fix that.
    #[error("last palette entry is not transparent")]
    OpaqueLastPaletteEntry,
}

/// Writes captions as a Blu-ray presentation graphics stream.
///
/// Captions must be written in presentation order, since every caption consumes two
/// composition numbers.
pub struct BdWriter<W> {
    output: W,
    options: BdOptions,
    composition_number: u16,
    quantizer: Option<Box<dyn Quantizer>>,
}

impl<W> BdWriter<W> where
    W: Write,
{

    pub fn new(output: W, options: BdOptions) -> Self {
        Self {
            output,
            options,
            composition_number: 0,
            quantizer: None,
        }
    }

    /// Installs the quantizer used for palettes whose last entry is visible.
    pub fn with_quantizer(mut self, quantizer: Box<dyn Quantizer>) -> Self {
        self.quantizer = Some(quantizer);
        self
    }

    /// The composition number the next caption will start with.
    pub fn composition_number(&self) -> u16 {
        self.composition_number
    }

    /// Writes one caption. Nothing reaches the output unless the whole caption could be
    /// generated.
    pub fn write_caption(
        &mut self,
        picture: &SubtitlePicture,
        bitmap: &Bitmap,
        palette: &Palette,
    ) -> WriteResult<()> {

        if bitmap.width() != picture.width || bitmap.height() != picture.height {
            return Err(WriteError::BitmapSizeMismatch)
        }

        let requantized;
        let (bitmap, palette) = if last_entry_visible(palette) {
            match self.quantizer.as_mut() {
                Some(quantizer) => {
                    log::debug!("Requantizing caption at {}", format_pts(picture.start_time));
                    requantized = quantizer.quantize(bitmap, palette);
                    if last_entry_visible(&requantized.1)
                        || requantized.0.width() != picture.width
                        || requantized.0.height() != picture.height {
                        return Err(WriteError::OpaqueLastPaletteEntry)
                    }
                    (&requantized.0, &requantized.1)
                }
                None => {
                    return Err(WriteError::OpaqueLastPaletteEntry)
                }
            }
        } else {
            (bitmap, palette)
        };

        let segments = caption_segments(
            picture,
            bitmap,
            palette,
            self.composition_number,
            self.options.frame_rate,
        );
        let mut buffer = vec![];

        for segment in segments.iter() {
            buffer.write_segment(segment)?;
        }

        self.output.write_all(&buffer)?;
        self.composition_number = self.composition_number.wrapping_add(2);

        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}

fn last_entry_visible(palette: &Palette) -> bool {
    palette.len() == MAX_PALETTE_SIZE
        && palette.get(MAX_PALETTE_SIZE - 1).map_or(false, |entry| entry.alpha != 0)
}

/// The number of middle and final object segments needed after the first one.
pub fn continuation_count(data_len: usize) -> usize {
    let remaining = data_len.saturating_sub(INITIAL_OBJECT_DATA_SIZE);
    (remaining + MIDDLE_OBJECT_DATA_SIZE - 1) / MIDDLE_OBJECT_DATA_SIZE
}

/// Builds the full segment sequence for one caption: the display set that shows it, followed
/// by the display set that clears it.
pub fn caption_segments(
    picture: &SubtitlePicture,
    bitmap: &Bitmap,
    palette: &Palette,
    composition_number: u16,
    frame_rate: FrameRate,
) -> Vec<Segment> {

    let (object_id, window_id) = match &picture.format {
        PictureFormat::Bd(bd) => (bd.object_id, bd.window_id),
        PictureFormat::Dvd(_) => (0, 0),
    };
    let times = segment_times(picture);
    let window = WindowDefinition {
        id: window_id,
        x: picture.x,
        y: picture.y,
        width: bitmap.width(),
        height: bitmap.height(),
    };
    let visible_entries = palette.last_visible_index().map_or(0, |index| index + 1);
    let mut segments = Vec::<Segment>::new();

    segments.push(Segment::PresentationComposition(
        PresentationCompositionSegment {
            pts: pts32(times.start_composition),
            dts: 0,
            width: picture.screen_width,
            height: picture.screen_height,
            frame_rate: frame_rate.code(),
            composition_number,
            composition_state: CompositionState::EpochStart,
            palette_update_id: None,
            composition_objects: vec![
                CompositionObject {
                    object_id,
                    window_id,
                    x: picture.x,
                    y: picture.y,
                    forced: picture.forced,
                    crop: None,
                },
            ],
        }
    ));
    segments.push(Segment::WindowDefinition(
        WindowDefinitionSegment {
            pts: pts32(times.start_window),
            dts: 0,
            windows: vec![window.clone()],
        }
    ));
    segments.push(Segment::PaletteDefinition(
        PaletteDefinitionSegment {
            pts: pts32(times.palette),
            dts: 0,
            id: 0,
            version: 0,
            entries: palette.entries()[..visible_entries].iter().enumerate().map(|(id, entry)|
                SegmentPaletteEntry {
                    id: id as u8,
                    y: entry.y,
                    cr: entry.cr,
                    cb: entry.cb,
                    alpha: entry.alpha,
                }
            ).collect(),
        }
    ));
    segments.extend(object_segments(
        pts32(times.object),
        object_id,
        bitmap.width(),
        bitmap.height(),
        rle::encode(bitmap),
    ));
    segments.push(Segment::End(
        EndSegment {
            pts: pts32(times.start_end),
            dts: 0,
        }
    ));
    segments.push(Segment::PresentationComposition(
        PresentationCompositionSegment {
            pts: pts32(times.end_composition),
            dts: 0,
            width: picture.screen_width,
            height: picture.screen_height,
            frame_rate: frame_rate.code(),
            composition_number: composition_number.wrapping_add(1),
            composition_state: CompositionState::Normal,
            palette_update_id: None,
            composition_objects: vec![],
        }
    ));
    segments.push(Segment::WindowDefinition(
        WindowDefinitionSegment {
            pts: pts32(times.end_window),
            dts: 0,
            windows: vec![window],
        }
    ));
    segments.push(Segment::End(
        EndSegment {
            pts: pts32(times.end_end),
            dts: 0,
        }
    ));

    segments
}

/// Splits compressed object data across as many object definition segments as it needs.
pub fn object_segments(pts: u32, id: u16, width: u16, height: u16, data: Vec<u8>) -> Vec<Segment> {

    let mut segments = Vec::<Segment>::new();
    let mut index = 0;
    let mut size = data.len();

    if size > INITIAL_OBJECT_DATA_SIZE {
        segments.push(Segment::InitialObjectDefinition(
            InitialObjectDefinitionSegment {
                pts,
                dts: 0,
                id,
                version: 0,
                length: data.len() + 4,
                width,
                height,
                data: Vec::from(&data[..INITIAL_OBJECT_DATA_SIZE]),
            }
        ));
        index += INITIAL_OBJECT_DATA_SIZE;
        size -= INITIAL_OBJECT_DATA_SIZE;
        while size > MIDDLE_OBJECT_DATA_SIZE {
            segments.push(Segment::MiddleObjectDefinition(
                MiddleObjectDefinitionSegment {
                    pts,
                    dts: 0,
                    id,
                    version: 0,
                    data: Vec::from(&data[index..(index + MIDDLE_OBJECT_DATA_SIZE)]),
                }
            ));
            index += MIDDLE_OBJECT_DATA_SIZE;
            size -= MIDDLE_OBJECT_DATA_SIZE;
        }
        segments.push(Segment::FinalObjectDefinition(
            FinalObjectDefinitionSegment {
                pts,
                dts: 0,
                id,
                version: 0,
                data: Vec::from(&data[index..]),
            }
        ));
    } else {
        segments.push(Segment::SingleObjectDefinition(
            SingleObjectDefinitionSegment {
                pts,
                dts: 0,
                id,
                version: 0,
                length: data.len() + 4,
                width,
                height,
                data,
            }
        ));
    }

    segments
}
