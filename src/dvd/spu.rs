/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Assembly and disassembly of sub-picture units.
//!
//! | Bytes | Contents                                              |
//! |-------|-------------------------------------------------------|
//! | 2     | size of the whole unit                                |
//! | 2     | offset of the first control sequence                  |
//! | n     | even-row RLE data                                     |
//! | m     | odd-row RLE data                                      |
//! | ...   | control sequences                                     |

use super::{
    DvdDecodeSession,
    WriteError,
    WriteResult,
    control::{parse_control_header, write_control_header, ControlHeader, MAX_COORDINATE},
    super::{
        error::{DecodeError, DecodeResult, Warning},
        palette::FramePalette,
        picture::{Bitmap, DvdPicture, ImageObjectFragment, PictureFormat, SubtitlePicture},
        rle,
        source::ByteSource,
    },
};
use byteorder::{BigEndian, ByteOrder};

/// Offset of the even-row RLE data, right after the two header words.
pub const RLE_OFFSET: usize = 4;

/// Builds the sub-picture unit for a caption. Any warning raised while building the control
/// header is returned alongside.
pub fn encode_spu(
    picture: &SubtitlePicture,
    bitmap: &Bitmap,
    frame_palette: FramePalette,
) -> WriteResult<(Vec<u8>, Option<Warning>)> {

    if bitmap.width() != picture.width || bitmap.height() != picture.height {
        return Err(WriteError::BitmapSizeMismatch)
    }
    if bitmap.width() == 0 || bitmap.height() == 0 {
        return Err(WriteError::EmptyBitmap)
    }
    if picture.x as u32 + picture.width as u32 - 1 > MAX_COORDINATE as u32
        || picture.y as u32 + picture.height as u32 - 1 > MAX_COORDINATE as u32 {
        return Err(WriteError::CoordinatesOutOfRange)
    }
    if bitmap.highest_index() > 3 {
        return Err(WriteError::TooManyColors)
    }

    let (even, odd) = rle::encode_interlaced(bitmap);
    let control_offset = RLE_OFFSET + even.len() + odd.len();

    // The control sequences themselves are 30 or 31 bytes.
    if control_offset + 31 > 0xFFFF {
        return Err(WriteError::SpuTooLarge)
    }

    let header = ControlHeader {
        forced: picture.forced,
        frame_palette,
        x: picture.x,
        y: picture.y,
        width: picture.width,
        height: picture.height,
        even_offset: RLE_OFFSET as u16,
        odd_offset: (RLE_OFFSET + even.len()) as u16,
        duration: Some(picture.duration()),
        chain_links: 1,
    };
    let (control, warning) = write_control_header(&header, control_offset as u16);
    let size = control_offset + control.len();
    let mut spu = vec![0u8; RLE_OFFSET];

    BigEndian::write_u16(&mut spu[0..2], size as u16);
    BigEndian::write_u16(&mut spu[2..4], control_offset as u16);
    spu.extend(even);
    spu.extend(odd);
    spu.extend(control);

    Ok((spu, warning))
}

/// Indexes a caption from its complete sub-picture unit.
///
/// The caption starts at `start_time`; its end time comes from the control header. Warnings
/// are returned in the order they were raised.
pub fn index_spu(
    spu: &[u8],
    start_time: u64,
    screen: (u16, u16),
    spu_fragments: Vec<ImageObjectFragment>,
    session: &mut DvdDecodeSession,
) -> DecodeResult<(SubtitlePicture, Vec<Warning>)> {

    let declared = BigEndian::read_u16(spu.get(0..2).unwrap_or(&[0, 0])) as usize;

    if declared != spu.len() {
        return Err(
            DecodeError::FragmentSizeMismatch {
                declared: declared as u64,
                actual: spu.len() as u64,
            }
        )
    }

    let (header, mut warnings) = parse_control_header(spu)?;
    let mut frame_palette = header.frame_palette;

    if let Some(warning) = session.resolve_alpha(&mut frame_palette) {
        warnings.push(warning);
    }

    let rle_end = BigEndian::read_u16(&spu[2..4]);
    let end_time = match header.duration {
        Some(duration) => start_time + duration,
        None => start_time,
    };

    Ok(
        (
            SubtitlePicture {
                screen_width: screen.0,
                screen_height: screen.1,
                width: header.width,
                height: header.height,
                x: header.x,
                y: header.y,
                start_time,
                end_time,
                forced: header.forced,
                format: PictureFormat::Dvd(
                    DvdPicture {
                        frame_palette,
                        spu_fragments,
                        even_offset: header.even_offset,
                        odd_offset: header.odd_offset,
                        rle_end,
                        chain_links: header.chain_links,
                    }
                ),
            },
            warnings,
        )
    )
}

/// Concatenates the packets carrying a sub-picture unit.
pub fn read_spu<S: ByteSource>(
    source: &mut S,
    fragments: &[ImageObjectFragment],
) -> DecodeResult<Vec<u8>> {

    let mut spu = vec![];

    for fragment in fragments.iter() {
        spu.extend(source.read_bytes(fragment.buffer_offset, fragment.packet_size as usize)?);
    }

    Ok(spu)
}

/// Decodes the bitmap of a caption indexed by [`index_spu`].
pub fn decode_bitmap(spu: &[u8], picture: &SubtitlePicture) -> DecodeResult<Bitmap> {

    let dvd = picture.as_dvd().ok_or(DecodeError::MalformedHeader("not a DVD caption"))?;
    let even_offset = dvd.even_offset as usize;
    let odd_offset = dvd.odd_offset as usize;
    let rle_end = dvd.rle_end as usize;

    if even_offset > odd_offset || odd_offset > rle_end || rle_end > spu.len() {
        return Err(DecodeError::MalformedHeader("RLE offsets point outside of the unit"))
    }

    Ok(
        rle::decode_interlaced(
            &spu[even_offset..odd_offset],
            &spu[odd_offset..rle_end],
            picture.width,
            picture.height,
        )?
    )
}
