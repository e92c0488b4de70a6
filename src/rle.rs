/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Run-length coding of palette-indexed bitmaps.
//!
//! # Overview
//!
//! Each scanline is split into runs of identical palette indices. A run is written as:
//!
//! | Run                        | Bytes                                     |
//! |----------------------------|-------------------------------------------|
//! | color ≠ 0, length 1 or 2   | `C` or `C C`                              |
//! | color 0, length < 64       | `00 LL`                                   |
//! | color 0, length < 16,384   | `00 (40 \| LL >> 8) LL`                   |
//! | color ≠ 0, length < 64     | `00 (80 \| LL) C`                         |
//! | color ≠ 0, length < 16,384 | `00 (C0 \| LL >> 8) LL C`                 |
//!
//! Runs longer than 16,383 pixels are split. Every scanline ends with `00 00`.
//!
//! Blu-ray objects encode all rows into a single buffer. DVD sub-pictures encode the even
//! rows and the odd rows into two separate buffers, one per interlaced field.

#[cfg(test)]
mod tests;

use super::picture::Bitmap;
use thiserror::Error as ThisError;

/// The longest run a single escape sequence can describe.
pub const MAX_RUN: usize = 0x3FFF;

/// A specialized [`Result`](std::result::Result) type for RLE decoding.
pub type RleResult<T> = Result<T, RleError>;

/// The error type for RLE decoding.
#[derive(ThisError, Debug, Eq, PartialEq)]
pub enum RleError {
    /// The buffer ends partway through an escape sequence.
    #[error("RLE data ends within an escape sequence")]
    Truncated,
    /// A scanline decodes to more pixels than the bitmap is wide.
    #[error("RLE line {line} is longer than the bitmap width")]
    LineTooLong {
        /// Zero-based index of the line within its buffer.
        line: usize,
    },
}

/// Encodes every row of a bitmap into one buffer.
pub fn encode(bitmap: &Bitmap) -> Vec<u8> {
    encode_rows(bitmap, 0..bitmap.height() as usize)
}

/// Encodes the even rows and the odd rows of a bitmap into two buffers.
pub fn encode_interlaced(bitmap: &Bitmap) -> (Vec<u8>, Vec<u8>) {
    (
        encode_rows(bitmap, (0..bitmap.height() as usize).step_by(2)),
        encode_rows(bitmap, (1..bitmap.height() as usize).step_by(2)),
    )
}

fn encode_rows<I>(bitmap: &Bitmap, rows: I) -> Vec<u8> where
    I: Iterator<Item = usize>,
{

    let mut output = Vec::<u8>::new();

    for y in rows {

        let line = bitmap.row(y);
        let mut color = 0_u8;
        let mut count = 0_usize;

        for &next_color in line {
            if next_color == color && count < MAX_RUN {
                count += 1;
            } else {
                if count > 0 {
                    output_rle_sequence(&mut output, color, count);
                }
                color = next_color;
                count = 1;
            }
        }

        if count > 0 {
            output_rle_sequence(&mut output, color, count);
        }

        output.push(0x00);
        output.push(0x00);
    }

    output
}

fn output_rle_sequence(output: &mut Vec<u8>, color: u8, count: usize) {

    if color == 0x00 {
        match count {
            1 ..= 63 => {
                output.push(0x00);
                output.push(count as u8);
            }
            _ => {
                output.push(0x00);
                output.push(0x40 | (count >> 8) as u8);
                output.push((count & 0xFF) as u8);
            }
        }
    } else {
        match count {
            1 => {
                output.push(color);
            }
            2 => {
                output.push(color);
                output.push(color);
            }
            3 ..= 63 => {
                output.push(0x00);
                output.push(0x80 | count as u8);
                output.push(color);
            }
            _ => {
                output.push(0x00);
                output.push(0xC0 | (count >> 8) as u8);
                output.push((count & 0xFF) as u8);
                output.push(color);
            }
        }
    }
}

/// Decodes a single-buffer bitmap.
pub fn decode(data: &[u8], width: u16, height: u16) -> RleResult<Bitmap> {

    let mut bitmap = Bitmap::new(width, height, 0);

    decode_rows(data, &mut bitmap, 0..height as usize)?;

    Ok(bitmap)
}

/// Decodes a bitmap from its even-row and odd-row buffers.
pub fn decode_interlaced(even: &[u8], odd: &[u8], width: u16, height: u16) -> RleResult<Bitmap> {

    let mut bitmap = Bitmap::new(width, height, 0);

    decode_rows(even, &mut bitmap, (0..height as usize).step_by(2))?;
    decode_rows(odd, &mut bitmap, (1..height as usize).step_by(2))?;

    Ok(bitmap)
}

/// Fills the given rows of `bitmap` from `data`. Rows the data runs out before stay at index
/// zero, as does the tail of any row that ends early.
fn decode_rows<I>(data: &[u8], bitmap: &mut Bitmap, rows: I) -> RleResult<()> where
    I: Iterator<Item = usize>,
{

    let mut input = data.iter().copied();

    for (line, y) in rows.enumerate() {

        let row = bitmap.row_mut(y);
        let mut x = 0_usize;

        loop {

            let byte = match input.next() {
                Some(byte) => byte,
                None => return Ok(()),
            };
            let (color, count) = if byte != 0x00 {
                (byte, 1)
            } else {
                let flags = input.next().ok_or(RleError::Truncated)?;
                let short = (flags & 0x3F) as usize;
                let count = if flags & 0x40 != 0 {
                    (short << 8) | input.next().ok_or(RleError::Truncated)? as usize
                } else {
                    short
                };
                let color = if flags & 0x80 != 0 {
                    input.next().ok_or(RleError::Truncated)?
                } else {
                    0
                };

                if flags == 0x00 {
                    break
                }

                (color, count)
            };

            if x + count > row.len() {
                return Err(RleError::LineTooLong { line })
            }

            row[x..(x + count)].fill(color);
            x += count;
        }
    }

    Ok(())
}
