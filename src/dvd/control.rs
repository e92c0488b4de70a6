/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Control sequences of a sub-picture unit.
//!
//! Each control sequence begins with a delay word (in units of 1,024 ticks) and the SPU offset
//! of the next sequence, followed by commands up to a `0xFF` terminator. The last sequence of a
//! chain points at itself. Everything after the first sequence's delay word is the control
//! header; offsets stored in it are relative to the SPU.

use super::super::{
    error::{DecodeError, DecodeResult, Warning},
    palette::FramePalette,
};
use byteorder::{BigEndian, ByteOrder};

pub const CMD_FORCED: u8 = 0x00;
pub const CMD_START_DISPLAY: u8 = 0x01;
pub const CMD_STOP_DISPLAY: u8 = 0x02;
pub const CMD_PALETTE: u8 = 0x03;
pub const CMD_ALPHA: u8 = 0x04;
pub const CMD_COORDINATES: u8 = 0x05;
pub const CMD_RLE_OFFSETS: u8 = 0x06;
pub const CMD_COLOR_CONTRAST: u8 = 0x07;
pub const CMD_END: u8 = 0xFF;

/// Ticks per unit of a control sequence delay.
pub const DELAY_UNIT: u64 = 1024;

/// The most end sequence links followed before giving up on a chain.
pub const MAX_CHAIN_LINKS: usize = 256;

/// Largest coordinate a control header can express.
pub const MAX_COORDINATE: u16 = 0x0FFF;

/// What a control header says about its caption.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ControlHeader {
    pub forced: bool,
    pub frame_palette: FramePalette,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    /// SPU offset of the even-row RLE data.
    pub even_offset: u16,
    /// SPU offset of the odd-row RLE data.
    pub odd_offset: u16,
    /// Display duration in ticks, if an end sequence could be found.
    pub duration: Option<u64>,
    /// Number of end sequence links that were followed.
    pub chain_links: usize,
}

/// Builds the control sequences for a caption, beginning with the first sequence's delay word
/// at SPU offset `control_offset`.
///
/// Both references to the end sequence point at the single sequence terminating the chain.
/// Durations longer than the delay field allows are shortened, which the returned warning
/// reports.
pub fn write_control_header(
    header: &ControlHeader,
    control_offset: u16,
) -> (Vec<u8>, Option<Warning>) {

    let mut bytes = vec![];
    let first_size = 24 + if header.forced { 1 } else { 0 };
    let end_offset = control_offset.wrapping_add(first_size);
    let units = header.duration.unwrap_or(0) / DELAY_UNIT;
    let (delay, warning) = if units > 0xFFFF {
        (0xFFFF, Some(Warning::DurationClamped))
    } else {
        (units as u16, None)
    };
    let x1 = header.x.saturating_add(header.width.saturating_sub(1));
    let y1 = header.y.saturating_add(header.height.saturating_sub(1));

    push_u16(&mut bytes, 0);
    push_u16(&mut bytes, end_offset);

    if header.forced {
        bytes.push(CMD_FORCED);
    }

    bytes.push(CMD_START_DISPLAY);
    bytes.push(CMD_PALETTE);
    bytes.extend(pack_nibbles(header.frame_palette.colors));
    bytes.push(CMD_ALPHA);
    bytes.extend(pack_nibbles(header.frame_palette.alpha));
    bytes.push(CMD_COORDINATES);
    bytes.extend(pack_coordinates(header.x, x1));
    bytes.extend(pack_coordinates(header.y, y1));
    bytes.push(CMD_RLE_OFFSETS);
    push_u16(&mut bytes, header.even_offset);
    push_u16(&mut bytes, header.odd_offset);
    bytes.push(CMD_END);

    push_u16(&mut bytes, delay);
    push_u16(&mut bytes, end_offset);
    bytes.push(CMD_STOP_DISPLAY);
    bytes.push(CMD_END);

    (bytes, warning)
}

fn push_u16(bytes: &mut Vec<u8>, value: u16) {

    let mut word = [0u8; 2];

    BigEndian::write_u16(&mut word, value);
    bytes.extend(word);
}

/// Four nibbles, highest index first.
fn pack_nibbles(values: [u8; 4]) -> [u8; 2] {
    [
        (values[3] & 0x0F) << 4 | (values[2] & 0x0F),
        (values[1] & 0x0F) << 4 | (values[0] & 0x0F),
    ]
}

fn unpack_nibbles(bytes: &[u8]) -> [u8; 4] {
    [bytes[1] & 0x0F, bytes[1] >> 4, bytes[0] & 0x0F, bytes[0] >> 4]
}

/// Two 12-bit values in three bytes.
fn pack_coordinates(start: u16, end: u16) -> [u8; 3] {
    [
        (start >> 4) as u8,
        ((start & 0x0F) << 4) as u8 | ((end >> 8) & 0x0F) as u8,
        end as u8,
    ]
}

fn unpack_coordinates(bytes: &[u8]) -> (u16, u16) {
    (
        (bytes[0] as u16) << 4 | (bytes[1] as u16) >> 4,
        ((bytes[1] & 0x0F) as u16) << 8 | bytes[2] as u16,
    )
}

/// Commands seen while interpreting one control sequence.
#[derive(Default)]
struct CommandState {
    forced: bool,
    stop: bool,
    frame_palette: FramePalette,
    area: Option<(u16, u16, u16, u16)>,
    rle_offsets: Option<(u16, u16)>,
}

/// Interprets the control sequences of a complete sub-picture unit.
///
/// Unknown commands, a chain of several end sequences, an unterminated chain and an end
/// sequence outside of the unit are reported as warnings. A command whose operands are cut off
/// is an error.
pub fn parse_control_header(spu: &[u8]) -> DecodeResult<(ControlHeader, Vec<Warning>)> {

    if spu.len() < 4 {
        return Err(DecodeError::MalformedHeader("sub-picture unit is shorter than its header"))
    }

    let control_offset = BigEndian::read_u16(&spu[2..4]) as usize;

    if control_offset < 4 || control_offset + 4 > spu.len() {
        return Err(DecodeError::MalformedHeader("control offset points outside of the unit"))
    }

    let base = control_offset + 2;
    let buffer = &spu[base..];
    let mut warnings = Vec::<Warning>::new();
    let mut state = CommandState::default();
    let first_link = BigEndian::read_u16(&buffer[0..2]);

    run_commands(buffer, 2, &mut state, &mut warnings)?;

    let mut chain_links = 0;
    let mut delay = None;
    let mut previous = control_offset as u16;
    let mut link = first_link;

    while link != previous {

        if chain_links == MAX_CHAIN_LINKS {
            warnings.push(Warning::ControlChainTooLong);
            break
        }

        let index = match (link as usize).checked_sub(base) {
            Some(index) if index + 4 <= buffer.len() => index,
            _ => {
                warnings.push(Warning::EndSequenceOutOfBounds { offset: link });
                break
            }
        };
        let mut sequence_state = CommandState::default();

        run_commands(buffer, index + 4, &mut sequence_state, &mut warnings)?;

        if !sequence_state.stop {
            log::debug!("End sequence at {:#x} does not stop the display", link);
        }

        chain_links += 1;
        delay = Some(BigEndian::read_u16(&buffer[index..(index + 2)]));
        previous = link;
        link = BigEndian::read_u16(&buffer[(index + 2)..(index + 4)]);
    }

    if chain_links > 1 {
        warnings.push(Warning::IgnoredControlSequences { links: chain_links });
    }

    let (x, y, width, height) = state.area.unwrap_or_default();
    let (even_offset, odd_offset) = state.rle_offsets.unwrap_or((4, 4));

    if even_offset < 4 || odd_offset < even_offset || odd_offset as usize > control_offset {
        return Err(DecodeError::MalformedHeader("RLE offsets point outside of the bitmap data"))
    }

    Ok(
        (
            ControlHeader {
                forced: state.forced,
                frame_palette: state.frame_palette,
                x,
                y,
                width,
                height,
                even_offset,
                odd_offset,
                duration: delay.map(|delay| delay as u64 * DELAY_UNIT),
                chain_links,
            },
            warnings,
        )
    )
}

fn operands(buffer: &[u8], index: usize, len: usize) -> DecodeResult<&[u8]> {
    buffer.get(index..(index + len))
        .ok_or(DecodeError::MalformedHeader("control command is cut off"))
}

fn run_commands(
    buffer: &[u8],
    mut index: usize,
    state: &mut CommandState,
    warnings: &mut Vec<Warning>,
) -> DecodeResult<()> {

    loop {

        let opcode = *buffer.get(index)
            .ok_or(DecodeError::MalformedHeader("control sequence has no terminator"))?;

        index += 1;

        match opcode {
            CMD_FORCED => {
                state.forced = true;
            }
            CMD_START_DISPLAY => {}
            CMD_STOP_DISPLAY => {
                state.stop = true;
            }
            CMD_PALETTE => {
                state.frame_palette.colors = unpack_nibbles(operands(buffer, index, 2)?);
                index += 2;
            }
            CMD_ALPHA => {
                state.frame_palette.alpha = unpack_nibbles(operands(buffer, index, 2)?);
                index += 2;
            }
            CMD_COORDINATES => {
                let bytes = operands(buffer, index, 6)?;
                let (x0, x1) = unpack_coordinates(&bytes[0..3]);
                let (y0, y1) = unpack_coordinates(&bytes[3..6]);
                if x1 < x0 || y1 < y0 {
                    return Err(DecodeError::MalformedHeader("caption area ends before it starts"))
                }
                state.area = Some((x0, y0, x1 - x0 + 1, y1 - y0 + 1));
                index += 6;
            }
            CMD_RLE_OFFSETS => {
                let bytes = operands(buffer, index, 4)?;
                state.rle_offsets = Some(
                    (BigEndian::read_u16(&bytes[0..2]), BigEndian::read_u16(&bytes[2..4]))
                );
                index += 4;
            }
            CMD_COLOR_CONTRAST => {
                let len = BigEndian::read_u16(operands(buffer, index, 2)?) as usize;
                if len < 2 {
                    return Err(DecodeError::MalformedHeader("color update has no length"))
                }
                apply_color_contrast(&operands(buffer, index, len)?[2..], state);
                index += len;
            }
            CMD_END => {
                return Ok(())
            }
            _ => {
                log::warn!("Skipping unsupported control command {:#04x}", opcode);
                warnings.push(Warning::UnsupportedCommand { opcode, index: index - 1 });
            }
        }
    }
}

/// Takes the colors of the first pixel control of a color/contrast update, if they are more
/// opaque than the current ones.
fn apply_color_contrast(body: &[u8], state: &mut CommandState) {

    if body.len() < 10 {
        return
    }

    let update = FramePalette::new(unpack_nibbles(&body[6..8]), unpack_nibbles(&body[8..10]));

    if update.alpha_sum() > state.frame_palette.alpha_sum() {
        state.frame_palette = update;
    }
}
