/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

use super::{
    CompositionObject,
    Crop,
    CompositionState,
    EndSegment,
    FinalObjectDefinitionSegment,
    InitialObjectDefinitionSegment,
    MiddleObjectDefinitionSegment,
    PaletteDefinitionSegment,
    PaletteEntry,
    PresentationCompositionSegment,
    Segment,
    SingleObjectDefinitionSegment,
    WindowDefinition,
    WindowDefinitionSegment,
    HEADER_SIZE,
    KIND_END,
    KIND_ODS,
    KIND_PCS,
    KIND_PDS,
    KIND_WDS,
    MAGIC_NUMBER,
};
use std::io::{Cursor, Error as IoError, Read};
use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use thiserror::Error as ThisError;

pub type SegmentReadResult<T> = Result<T, ReadError>;

#[derive(ThisError, Debug)]
pub enum ReadError {
    #[error("segment IO error")]
    IoError {
        #[from]
        source: IoError,
    },
    #[error("segment has unrecognized magic number")]
    UnrecognizedMagicNumber,
    #[error("segment has unrecognized kind")]
    UnrecognizedKind,
    #[error("presentation composition segment has unrecognized composition state")]
    UnrecognizedCompositionState,
    #[error("presentation composition segment has unrecognized palette update flag")]
    UnrecognizedPaletteUpdateFlag,
    #[error("unrecognized object definition sequence flag")]
    UnrecognizedObjectSequenceFlag,
}

/// The fixed-size part of a segment that precedes its payload.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct SegmentHeader {
    pub pts: u32,
    pub dts: u32,
    pub kind: u8,
    pub size: u16,
}

impl SegmentHeader {

    /// Parses a segment header. The payload size is returned even when the magic number is
    /// wrong, so that callers can skip over the damaged segment.
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Result<Self, (ReadError, Self)> {

        let header = SegmentHeader {
            pts: BigEndian::read_u32(&bytes[2..6]),
            dts: BigEndian::read_u32(&bytes[6..10]),
            kind: bytes[10],
            size: BigEndian::read_u16(&bytes[11..13]),
        };

        if BigEndian::read_u16(&bytes[0..2]) != MAGIC_NUMBER {
            return Err((ReadError::UnrecognizedMagicNumber, header))
        }

        Ok(header)
    }
}

pub trait ReadSegmentExt {
    fn read_segment(&mut self) -> SegmentReadResult<Segment>;
}

impl<T: Read> ReadSegmentExt for T {

    fn read_segment(&mut self) -> SegmentReadResult<Segment> {

        let mut header_bytes = [0u8; HEADER_SIZE];

        self.read_exact(&mut header_bytes)?;

        let header = SegmentHeader::parse(&header_bytes).map_err(|(err, _)| err)?;
        let mut payload = vec![0u8; header.size as usize];

        self.read_exact(&mut payload)?;

        parse_segment(&header, &payload)
    }
}

/// Parses a segment payload according to the kind its header declares.
pub fn parse_segment(header: &SegmentHeader, payload: &[u8]) -> SegmentReadResult<Segment> {

    let pts = header.pts;
    let dts = header.dts;

    Ok(
        match header.kind {
            KIND_PDS => Segment::PaletteDefinition(parse_pds(pts, dts, payload)?),
            KIND_ODS => parse_ods(pts, dts, payload)?,
            KIND_PCS => Segment::PresentationComposition(parse_pcs(pts, dts, payload)?),
            KIND_WDS => Segment::WindowDefinition(parse_wds(pts, dts, payload)?),
            KIND_END => Segment::End(EndSegment { pts, dts }),
            _ => return Err(ReadError::UnrecognizedKind),
        }
    )
}

fn parse_pcs(
    pts: u32,
    dts: u32,
    payload: &[u8],
) -> SegmentReadResult<PresentationCompositionSegment> {

    let mut pos = 11;
    let mut input = Cursor::new(payload);
    let width = input.read_u16::<BigEndian>()?;
    let height = input.read_u16::<BigEndian>()?;
    let frame_rate = input.read_u8()?;

    let composition_number = input.read_u16::<BigEndian>()?;
    let composition_state = match input.read_u8()? {
        0x00 => CompositionState::Normal,
        0x40 => CompositionState::AcquisitionPoint,
        0x80 => CompositionState::EpochStart,
        _ => return Err(ReadError::UnrecognizedCompositionState),
    };
    let palette_update_id = match input.read_u8()? {
        0x00 => {
            input.read_u8()?;
            None
        }
        0x80 => {
            Some(input.read_u8()?)
        }
        _ => {
            return Err(ReadError::UnrecognizedPaletteUpdateFlag)
        }
    };
    let comp_obj_count = input.read_u8()? as usize;
    let mut composition_objects = Vec::new();

    for _ in 0..comp_obj_count {
        if payload.len() - pos >= 8 {

            let object_id = input.read_u16::<BigEndian>()?;
            let window_id = input.read_u8()?;
            let flags = input.read_u8()?;
            let cropped = flags & 0x80 != 0;
            let forced = flags & 0x40 != 0;
            let x = input.read_u16::<BigEndian>()?;
            let y = input.read_u16::<BigEndian>()?;

            pos += 8;

            // For some reason, the U.S. release of Final Fantasy VII: Advent Children Complete
            // declares that the object is cropped, but then the segment's payload ends.
            let crop = if cropped && payload.len() - pos >= 8 {
                pos += 8;
                Some(
                    Crop {
                        x: input.read_u16::<BigEndian>()?,
                        y: input.read_u16::<BigEndian>()?,
                        width: input.read_u16::<BigEndian>()?,
                        height: input.read_u16::<BigEndian>()?,
                    }
                )
            } else {
                None
            };

            composition_objects.push(
                CompositionObject {
                    object_id,
                    window_id,
                    x,
                    y,
                    forced,
                    crop,
                }
            );
        }
    }

    Ok(
        PresentationCompositionSegment {
            pts,
            dts,
            width,
            height,
            frame_rate,
            composition_number,
            composition_state,
            palette_update_id,
            composition_objects,
        }
    )
}

fn parse_wds(
    pts: u32,
    dts: u32,
    payload: &[u8],
) -> SegmentReadResult<WindowDefinitionSegment> {

    let mut input = Cursor::new(payload);
    let mut windows = Vec::new();
    let count = input.read_u8()?;

    for _ in 0..count {
        windows.push(
            WindowDefinition {
                id: input.read_u8()?,
                x: input.read_u16::<BigEndian>()?,
                y: input.read_u16::<BigEndian>()?,
                width: input.read_u16::<BigEndian>()?,
                height: input.read_u16::<BigEndian>()?,
            }
        );
    }

    Ok(
        WindowDefinitionSegment {
            pts,
            dts,
            windows,
        }
    )
}

fn parse_pds(
    pts: u32,
    dts: u32,
    payload: &[u8],
) -> SegmentReadResult<PaletteDefinitionSegment> {

    let mut input = Cursor::new(payload);
    let id = input.read_u8()?;
    let version = input.read_u8()?;
    let count = (payload.len() - 2) / 5;
    let mut entries = Vec::new();

    for _ in 0..count {

        let id = input.read_u8()?;
        let y = input.read_u8()?;
        let cr = input.read_u8()?;
        let cb = input.read_u8()?;
        let alpha = input.read_u8()?;

        entries.push(PaletteEntry { id, y, cr, cb, alpha });
    }

    Ok(
        PaletteDefinitionSegment {
            pts,
            dts,
            id,
            version,
            entries,
        }
    )
}

fn parse_ods(
    pts: u32,
    dts: u32,
    payload: &[u8],
) -> SegmentReadResult<Segment> {

    let mut input = Cursor::new(payload);
    let id = input.read_u16::<BigEndian>()?;
    let version = input.read_u8()?;
    let sequence = input.read_u8()?;

    Ok(
        match sequence {
            0xC0 | 0x80 => {

                let length = input.read_u24::<BigEndian>()? as usize;
                let width = input.read_u16::<BigEndian>()?;
                let height = input.read_u16::<BigEndian>()?;
                let data = Vec::from(&payload[input.position() as usize..]);

                if sequence == 0xC0 {
                    Segment::SingleObjectDefinition(
                        SingleObjectDefinitionSegment {
                            pts,
                            dts,
                            id,
                            version,
                            length,
                            width,
                            height,
                            data,
                        }
                    )
                } else {
                    Segment::InitialObjectDefinition(
                        InitialObjectDefinitionSegment {
                            pts,
                            dts,
                            id,
                            version,
                            length,
                            width,
                            height,
                            data,
                        }
                    )
                }
            }
            0x00 => {
                Segment::MiddleObjectDefinition(
                    MiddleObjectDefinitionSegment {
                        pts,
                        dts,
                        id,
                        version,
                        data: Vec::from(&payload[4..]),
                    }
                )
            }
            0x40 => {
                Segment::FinalObjectDefinition(
                    FinalObjectDefinitionSegment {
                        pts,
                        dts,
                        id,
                        version,
                        data: Vec::from(&payload[4..]),
                    }
                )
            }
            _ => {
                return Err(ReadError::UnrecognizedObjectSequenceFlag)
            }
        }
    )
}
