/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! The slice of the MPEG-2 program stream format that VobSub files use.

use super::super::{
    error::{DecodeError, DecodeResult},
    source::ByteSource,
};
use std::io::Result as IoResult;
use byteorder::{BigEndian, WriteBytesExt};

pub const PACK_SIZE: usize = 2048;
pub const PACK_HEADER_SIZE: usize = 14;

pub const PACK_START_CODE: u32 = 0x0000_01BA;
pub const PRIVATE_STREAM_1: u32 = 0x0000_01BD;
pub const PADDING_STREAM: u32 = 0x0000_01BE;

/// Sub-stream id of the first subtitle track.
pub const SUBSTREAM_ID: u8 = 0x20;

/// Payload bytes in a pack whose PES header carries a PTS.
pub const FIRST_PAYLOAD_SIZE: usize = 2019;
/// Payload bytes in a pack whose PES header carries nothing.
pub const PAYLOAD_SIZE: usize = 2024;

const MUX_RATE: [u8; 3] = [0x01, 0x89, 0xC3];
const MIN_STREAM_ID: u32 = 0xBC;
const PTS_SIZE: usize = 5;
const PADDING_HEADER_SIZE: usize = 6;

/// A private stream 1 packet found inside a pack.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PesPayload {
    /// Offset of the sub-stream payload, after the sub-stream id.
    pub offset: u64,
    pub len: usize,
    pub pts: Option<u64>,
    pub substream: u8,
}

/// Encodes a 33-bit timestamp as a PES PTS field with the `0010` prefix.
pub fn encode_pts(pts: u64) -> [u8; PTS_SIZE] {
    [
        0x21 | ((pts >> 29) & 0x0E) as u8,
        (pts >> 22) as u8,
        0x01 | ((pts >> 14) & 0xFE) as u8,
        (pts >> 7) as u8,
        0x01 | ((pts << 1) & 0xFE) as u8,
    ]
}

pub fn decode_pts(bytes: &[u8; PTS_SIZE]) -> u64 {
    ((bytes[0] as u64 >> 1) & 0x07) << 30
        | (bytes[1] as u64) << 22
        | (bytes[2] as u64 >> 1) << 15
        | (bytes[3] as u64) << 7
        | (bytes[4] as u64 >> 1)
}

fn write_pack_header(bytes: &mut Vec<u8>, scr: u64) -> IoResult<()> {

    bytes.write_u32::<BigEndian>(PACK_START_CODE)?;
    bytes.extend_from_slice(&[
        0x44 | ((scr >> 27) & 0x38) as u8 | ((scr >> 28) & 0x03) as u8,
        (scr >> 20) as u8,
        0x04 | ((scr >> 12) & 0xF8) as u8 | ((scr >> 13) & 0x03) as u8,
        (scr >> 5) as u8,
        0x04 | ((scr & 0x1F) << 3) as u8,
        0x01,
    ]);
    bytes.extend_from_slice(&MUX_RATE);
    bytes.write_u8(0xF8)?;

    Ok(())
}

/// Splits an SPU into packs. The returned length is always a multiple of [`PACK_SIZE`].
pub fn packetize(spu: &[u8], pts: u64) -> IoResult<Vec<u8>> {

    let mut bytes = Vec::with_capacity((spu.len() / PAYLOAD_SIZE + 1) * PACK_SIZE);
    let mut rest = spu;
    let mut first = true;

    loop {

        let capacity = if first { FIRST_PAYLOAD_SIZE } else { PAYLOAD_SIZE };
        let (chunk, tail) = rest.split_at(rest.len().min(capacity));
        let gap = capacity - chunk.len();
        let stuffing = if gap < PADDING_HEADER_SIZE { gap } else { 0 };
        let header_data_len = if first { PTS_SIZE } else { 0 } + stuffing;

        write_pack_header(&mut bytes, pts)?;
        bytes.write_u32::<BigEndian>(PRIVATE_STREAM_1)?;
        bytes.write_u16::<BigEndian>((3 + header_data_len + 1 + chunk.len()) as u16)?;
        bytes.write_u8(0x81)?;
        bytes.write_u8(if first { 0x80 } else { 0x00 })?;
        bytes.write_u8(header_data_len as u8)?;

        if first {
            bytes.extend_from_slice(&encode_pts(pts));
        }

        bytes.resize(bytes.len() + stuffing, 0xFF);
        bytes.write_u8(SUBSTREAM_ID)?;
        bytes.extend_from_slice(chunk);

        if gap >= PADDING_HEADER_SIZE {
            bytes.write_u32::<BigEndian>(PADDING_STREAM)?;
            bytes.write_u16::<BigEndian>((gap - PADDING_HEADER_SIZE) as u16)?;
            bytes.resize(bytes.len() + gap - PADDING_HEADER_SIZE, 0xFF);
        }

        rest = tail;
        first = false;

        if rest.is_empty() {
            break
        }
    }

    Ok(bytes)
}

/// Reads the pack at `offset`, returning its first private stream 1 packet (if any) along with
/// the offset right after the pack's last packet.
pub fn read_pack<S: ByteSource>(
    source: &mut S,
    offset: u64,
) -> DecodeResult<(Option<PesPayload>, u64)> {

    let len = source.len();

    if source.read_u32(offset)? != PACK_START_CODE {
        return Err(DecodeError::MalformedHeader("missing pack header"))
    }

    let marker = source.read_u8(offset + 4)?;
    let mut position = if marker & 0xC0 == 0x40 {
        offset + PACK_HEADER_SIZE as u64 + (source.read_u8(offset + 13)? & 0x07) as u64
    } else if marker & 0xF0 == 0x20 {
        // MPEG-1 pack header
        offset + 12
    } else {
        return Err(DecodeError::MalformedHeader("unknown pack header version"))
    };
    let mut payload = None;

    while position + PADDING_HEADER_SIZE as u64 <= len {

        let start_code = source.read_u32(position)?;

        // Anything other than a PES packet ends the pack; the next read diagnoses it.
        if start_code >> 8 != 0x01 || start_code & 0xFF < MIN_STREAM_ID {
            break
        }

        let packet_len = source.read_u16(position + 4)? as u64;
        let next = position + PADDING_HEADER_SIZE as u64 + packet_len;

        if next > len {
            return Err(DecodeError::MalformedHeader("packet runs past the end of the stream"))
        }

        if start_code == PRIVATE_STREAM_1 && payload.is_none() {
            payload = Some(read_private_stream(source, position, next)?);
        }

        position = next;
    }

    Ok((payload, position))
}

fn read_private_stream<S: ByteSource>(
    source: &mut S,
    position: u64,
    next: u64,
) -> DecodeResult<PesPayload> {

    let flags = source.read_u8(position + 7)?;
    let header_data_len = source.read_u8(position + 8)? as u64;
    let substream_offset = position + 9 + header_data_len;

    if substream_offset >= next {
        return Err(DecodeError::MalformedHeader("PES header runs past its packet"))
    }

    let pts = if flags & 0x80 != 0 && header_data_len >= PTS_SIZE as u64 {
        let bytes = source.read_bytes(position + 9, PTS_SIZE)?;
        Some(decode_pts(&[bytes[0], bytes[1], bytes[2], bytes[3], bytes[4]]))
    } else {
        None
    };

    Ok(
        PesPayload {
            offset: substream_offset + 1,
            len: (next - substream_offset - 1) as usize,
            pts,
            substream: source.read_u8(substream_offset)?,
        }
    )
}
