/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Operates on individual segments.
//!
//! # Overview
//!
//! A segment is the most fundamental data structure within a PGS bitstream. Multiple segments
//! come together in a well-defined manner to form a display set (DS).
//!
//! There are five types that typically appear in this order:
//!
//! 1. Presentation Composition Segment (PCS)
//! 2. Window Definition Segment (WDS)
//! 3. Palette Definition Segment (PDS)
//! 4. Object Definition Segment (ODS)
//! 5. End Segment (ES)
//!
//! Something the fives types have in common is that each one defines both PTS and DTS
//! timestamps.
//!
//! ## Object Definition Segment (ODS)
//!
//! An ODS defines a sequence of pixels with each pixel consisting of a single ID. These IDs map
//! back to the pixel values encountered in earlier PDS segments.
//!
//! A segment's payload is limited in size, so an object whose compressed data does not fit
//! into one segment is split across several. The first one carries the object's dimensions
//! and total length, and the ones that follow carry nothing but data. That gives four kinds of
//! ODS: single, initial, middle and final.

#[cfg(test)]
mod tests;

mod segmentread;
mod segmentwrite;

pub use segmentread::*;
pub use segmentwrite::*;

/// The magic number every segment begins with (`"PG"`).
pub const MAGIC_NUMBER: u16 = 0x5047;

/// The size of the header that precedes every segment payload.
pub const HEADER_SIZE: usize = 13;

/// The largest payload a segment is allowed to carry.
pub const MAX_PAYLOAD_SIZE: usize = 0xFFFC;

/// Data bytes that fit into a single or initial ODS.
pub const INITIAL_OBJECT_DATA_SIZE: usize = 0xFFE4;

/// Data bytes that fit into a middle or final ODS.
pub const MIDDLE_OBJECT_DATA_SIZE: usize = 0xFFEB;

pub const KIND_PDS: u8 = 0x14;
pub const KIND_ODS: u8 = 0x15;
pub const KIND_PCS: u8 = 0x16;
pub const KIND_WDS: u8 = 0x17;
pub const KIND_END: u8 = 0x80;

/// Represents a PGS segment.
#[derive(Clone, Debug, Hash, PartialEq)]
pub enum Segment {
    /// Represents a Presentation Composition Segment (PCS).
    PresentationComposition(PresentationCompositionSegment),
    /// Represents a Window Definition Segment (WDS).
    WindowDefinition(WindowDefinitionSegment),
    /// Represents a Palette Definition Segment (PDS).
    PaletteDefinition(PaletteDefinitionSegment),
    /// Represents an Object Definition Segment (ODS) carrying a whole object.
    SingleObjectDefinition(SingleObjectDefinitionSegment),
    /// Represents the first ODS of an object split across several segments.
    InitialObjectDefinition(InitialObjectDefinitionSegment),
    /// Represents an ODS between the first and last ones of a split object.
    MiddleObjectDefinition(MiddleObjectDefinitionSegment),
    /// Represents the last ODS of an object split across several segments.
    FinalObjectDefinition(FinalObjectDefinitionSegment),
    /// Represents an End Segment (ES).
    End(EndSegment),
}

impl Segment {

    pub fn pts(&self) -> u32 {
        match self {
            Segment::PresentationComposition(pcs) => pcs.pts,
            Segment::WindowDefinition(wds) => wds.pts,
            Segment::PaletteDefinition(pds) => pds.pts,
            Segment::SingleObjectDefinition(ods) => ods.pts,
            Segment::InitialObjectDefinition(ods) => ods.pts,
            Segment::MiddleObjectDefinition(ods) => ods.pts,
            Segment::FinalObjectDefinition(ods) => ods.pts,
            Segment::End(es) => es.pts,
        }
    }

    pub fn dts(&self) -> u32 {
        match self {
            Segment::PresentationComposition(pcs) => pcs.dts,
            Segment::WindowDefinition(wds) => wds.dts,
            Segment::PaletteDefinition(pds) => pds.dts,
            Segment::SingleObjectDefinition(ods) => ods.dts,
            Segment::InitialObjectDefinition(ods) => ods.dts,
            Segment::MiddleObjectDefinition(ods) => ods.dts,
            Segment::FinalObjectDefinition(ods) => ods.dts,
            Segment::End(es) => es.dts,
        }
    }
}

/// Defines the role of a PCS (and thereby the associated DS) within an epoch.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CompositionState {
    /// Indicates that the associated PCS (and the DS it belongs to) defines the start of a new
    /// epoch. As such, the associated DS should contain all other segments necessary to render
    /// a composition onto the screen.
    EpochStart,
    /// Similar to `EpochStart`, except used to refresh the screen with the current composition.
    /// This allows a player to seek past an `EpochStart` and land in the middle of an epoch,
    /// while still being able to show the relevant composition once the `AcquisitionPoint` is
    /// encountered.
    AcquisitionPoint,
    /// This updates the composition that is on the screen. This is typically used to clear the
    /// current composition from the screen by defining a PCS with no composition objects,
    /// thereby effectively closing out the current epoch.
    Normal,
}

impl Default for CompositionState {
    fn default() -> Self { Self::EpochStart }
}

/// Defines a Presentation Composition Segment (PCS).
///
/// A PCS marks the beginning of a display set (DS).
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct PresentationCompositionSegment {
    /// The timestamp indicating when the composition is displayed.
    pub pts: u32,
    /// The timestamp indicating when composition decoding should start. Streams written by
    /// this crate always set it to zero.
    pub dts: u32,
    /// The width of the display in pixels. This value should be consistent within a
    /// presentation.
    pub width: u16,
    /// The height of the display in pixels. This value should be consistent within a
    /// presentation.
    pub height: u16,
    /// The video frame rate code. See [`FrameRate`](crate::bd::FrameRate).
    pub frame_rate: u8,
    pub composition_number: u16,
    pub composition_state: CompositionState,
    pub palette_update_id: Option<u8>,
    pub composition_objects: Vec<CompositionObject>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct CompositionObject {
    pub object_id: u16,
    pub window_id: u8,
    pub x: u16,
    pub y: u16,
    /// Whether the object should be shown even when subtitles are turned off.
    pub forced: bool,
    pub crop: Option<Crop>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Crop {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct WindowDefinitionSegment {
    pub pts: u32,
    pub dts: u32,
    pub windows: Vec<WindowDefinition>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct WindowDefinition {
    pub id: u8,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct PaletteDefinitionSegment {
    pub pts: u32,
    pub dts: u32,
    pub id: u8,
    pub version: u8,
    pub entries: Vec<PaletteEntry>,
}

/// A palette entry as it appears on the wire, tagged with its index.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct PaletteEntry {
    pub id: u8,
    pub y: u8,
    pub cr: u8,
    pub cb: u8,
    pub alpha: u8,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct SingleObjectDefinitionSegment {
    pub pts: u32,
    pub dts: u32,
    pub id: u16,
    pub version: u8,
    /// The declared object data length, which counts the four bytes of width and height.
    pub length: usize,
    pub width: u16,
    pub height: u16,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct InitialObjectDefinitionSegment {
    pub pts: u32,
    pub dts: u32,
    pub id: u16,
    pub version: u8,
    /// The declared object data length across all segments, which counts the four bytes of
    /// width and height.
    pub length: usize,
    pub width: u16,
    pub height: u16,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct MiddleObjectDefinitionSegment {
    pub pts: u32,
    pub dts: u32,
    pub id: u16,
    pub version: u8,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct FinalObjectDefinitionSegment {
    pub pts: u32,
    pub dts: u32,
    pub id: u16,
    pub version: u8,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct EndSegment {
    pub pts: u32,
    pub dts: u32,
}
