/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Decoder timing budget.
//!
//! A Blu-ray player decodes presentation graphics into a fixed-rate pipeline: the graphics
//! plane and windows are initialized at 256 megabits per second, and objects are decoded at
//! 128 megabits per second, one byte per pixel. A stream must timestamp its segments early
//! enough that a decoder starting at the palette segment has finished with the object before
//! the composition is due on screen. The functions here compute those durations in 90 kHz
//! ticks, always rounding up.


use super::picture::SubtitlePicture;

/// The presentation clock rate.
pub const TICKS_PER_SECOND: u64 = 90_000;

/// Plane and window initialization rate in bits per second.
pub const INIT_BIT_RATE: u64 = 256_000_000;

/// Object decoding rate in bits per second.
pub const DECODE_BIT_RATE: u64 = 128_000_000;

const BITS_PER_PIXEL: u64 = 8;

fn ticks_for_pixels(pixels: u64, bit_rate: u64) -> u64 {
    (pixels * BITS_PER_PIXEL * TICKS_PER_SECOND + bit_rate - 1) / bit_rate
}

/// Time needed to clear the whole graphics plane.
pub fn frame_init_time(screen_width: u16, screen_height: u16) -> u64 {
    ticks_for_pixels(screen_width as u64 * screen_height as u64, INIT_BIT_RATE)
}

/// Time needed to clear one window.
pub fn window_init_time(width: u16, height: u16) -> u64 {
    ticks_for_pixels(width as u64 * height as u64, INIT_BIT_RATE)
}

/// Time needed to decode one object.
pub fn image_decode_time(width: u16, height: u16) -> u64 {
    ticks_for_pixels(width as u64 * height as u64, DECODE_BIT_RATE)
}

/// Presentation timestamps for every segment of one Blu-ray caption.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct SegmentTimes {
    pub start_composition: u64,
    pub start_window: u64,
    pub palette: u64,
    pub object: u64,
    pub start_end: u64,
    pub end_composition: u64,
    pub end_window: u64,
    pub end_end: u64,
}

/// Derives segment timestamps from a caption's display times and dimensions. Timestamps that
/// would fall before zero are clamped to zero.
pub fn segment_times(picture: &SubtitlePicture) -> SegmentTimes {

    let frame_init = frame_init_time(picture.screen_width, picture.screen_height);
    let window_init = window_init_time(picture.width, picture.height);
    let decode = image_decode_time(picture.width, picture.height);
    let palette = picture.start_time.saturating_sub(frame_init + window_init);
    let object = palette + decode;
    let end_window = picture.end_time.saturating_sub(window_init);

    SegmentTimes {
        start_composition: picture.start_time,
        start_window: picture.start_time.saturating_sub(window_init),
        palette,
        object,
        start_end: object,
        end_composition: picture.end_time,
        end_window,
        end_end: end_window,
    }
}

/// Narrows a timestamp to the 32 bits stream headers carry. Times past about 13 hours wrap
/// around.
pub fn pts32(ticks: u64) -> u32 {
    ticks as u32
}

/// Formats a timestamp as `hh:mm:ss.mmm` for log messages.
pub fn format_pts(pts: u64) -> String {

    let ms = pts / 90;

    format!(
        "{:02}:{:02}:{:02}.{:03}",
        ms / 3_600_000,
        (ms / 60_000) % 60,
        (ms / 1000) % 60,
        ms % 1000,
    )
}
