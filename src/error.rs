/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Errors and warnings shared by the stream readers.
//!
//! Reading distinguishes three levels of trouble:
//!
//! - A [`StreamError`] means the stream as a whole cannot be used (bad file magic, truncated
//!   IFO). Reading stops.
//! - A [`CaptionError`] means a single caption could not be decoded. The reader records where
//!   the failing caption began and where it resumed, then carries on with the next one.
//! - A [`Warning`] means a caption was decoded, but something about it was unusual enough to
//!   tell the caller about.

use super::{
    picture::SubtitlePicture,
    rle::RleError,
    segment::ReadError as SegmentReadError,
};
use std::io::Error as IoError;
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for decoding a single caption.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// A specialized [`Result`](std::result::Result) type for stream-level operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// The error type for problems confined to one caption.
#[derive(ThisError, Debug)]
pub enum DecodeError {
    /// The caption could not be read because of an underlying I/O error.
    #[error("caption IO error")]
    IoError {
        /// The underlying I/O error.
        #[from]
        source: IoError,
    },
    /// A header has a bad magic number, or one of its offsets points outside of the packet.
    #[error("malformed header: {0}")]
    MalformedHeader(&'static str),
    /// The fragments of an object do not add up to the length its header declares.
    #[error("object fragments total {actual} bytes but {declared} were declared")]
    FragmentSizeMismatch {
        /// The RLE length declared by the object header.
        declared: u64,
        /// The sum of all fragment sizes.
        actual: u64,
    },
    /// The bitmap data could not be run-length decoded.
    #[error("RLE error")]
    RleError {
        #[from]
        source: RleError,
    },
    /// A BD segment could not be parsed.
    #[error("segment error")]
    SegmentError {
        #[from]
        source: SegmentReadError,
    },
}

/// A caption that was skipped, along with where reading continued.
#[derive(ThisError, Debug)]
#[error("caption at offset {offset:#x} skipped, resuming at {resume_at:#x}")]
pub struct CaptionError {
    /// Stream offset of the first packet belonging to the caption.
    pub offset: u64,
    /// Stream offset at which the reader picked up again.
    pub resume_at: u64,
    /// What went wrong.
    #[source]
    pub source: DecodeError,
}

/// The outcome of indexing one caption.
pub type CaptionResult = Result<SubtitlePicture, CaptionError>;

/// The error type for problems that make a whole stream unusable.
#[derive(ThisError, Debug)]
pub enum StreamError {
    /// The stream could not be read because of an underlying I/O error.
    #[error("stream IO error")]
    IoError {
        /// The underlying I/O error.
        #[from]
        source: IoError,
    },
    /// The stream does not begin with the magic number of its format.
    #[error("stream has unrecognized magic number")]
    UnrecognizedMagicNumber,
    /// The IFO file ends before the data it points to.
    #[error("IFO file is truncated")]
    TruncatedIfo,
    /// An IFO table pointer leads outside of the file.
    #[error("IFO file has invalid {0} pointer")]
    InvalidIfoPointer(&'static str),
    /// A line of an IDX file could not be understood.
    #[error("IDX file has invalid {field} on line {line}")]
    InvalidIdx {
        /// One-based line number.
        line: usize,
        /// The setting the line was supposed to carry.
        field: &'static str,
    },
}

/// Something noteworthy about a caption that was nonetheless decoded.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Warning {
    /// A DVD control header contains an opcode the interpreter does not know. It was skipped.
    UnsupportedCommand {
        /// The unknown opcode.
        opcode: u8,
        /// Index of the opcode within the control header.
        index: usize,
    },
    /// A DVD end sequence offset points outside of the control header, so the caption has no
    /// end time.
    EndSequenceOutOfBounds {
        /// The offset as stored, relative to the sub-picture unit.
        offset: u16,
    },
    /// A DVD control header chains several end sequences. Only the last one's duration was
    /// used, so palette fades in between are lost.
    IgnoredControlSequences {
        /// Number of end sequence links visited.
        links: usize,
    },
    /// A DVD end sequence chain did not terminate within the iteration bound.
    ControlChainTooLong,
    /// All four alpha values of a DVD caption are zero.
    InvisibleCaption {
        /// Whether the previous caption's alpha values were substituted.
        substituted: bool,
    },
    /// A display duration was too long for the 16-bit DVD delay field and was shortened.
    DurationClamped,
}

/// A [`Warning`] tied to the caption it was raised for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct CaptionWarning {
    /// Zero-based index of the caption within the stream.
    pub caption: usize,
    /// The warning itself.
    pub warning: Warning,
}
