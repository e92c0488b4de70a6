/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! VobSub streams: DVD sub-picture units packed into an MPEG-2 program stream (the SUB file)
//! and indexed by a text file (the IDX file).
//!
//! # Overview
//!
//! Every SPU is split across one or more 2,048-byte packs. Each pack carries a pack header and
//! a private stream 1 PES packet whose payload begins with the sub-stream id `0x20`. Only the
//! first PES packet of a caption carries a PTS. The last pack of a caption is filled out either
//! with a padding stream or, when the gap is too small for one, with stuffing bytes in the PES
//! header.
//!
//! The IDX file holds the screen size, the sixteen-color palette and, for each caption, its
//! timestamp and the byte offset of its first pack in the SUB file.


pub mod idx;
pub mod ps;
mod subread;
mod subwrite;

pub use subread::*;
pub use subwrite::*;

/// VobSub writers fail for the same reasons DVD ones do.
pub use super::dvd::{WriteError, WriteResult};
