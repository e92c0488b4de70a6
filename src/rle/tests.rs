/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;
use rand::{thread_rng, Rng};

fn checkerboard(width: u16, height: u16, a: u8, b: u8) -> Bitmap {

    let pixels = (0..height as usize).flat_map(|y|
        (0..width as usize).map(move |x| if (x + y) % 2 == 0 { a } else { b })
    ).collect();

    Bitmap::from_pixels(width, height, pixels).unwrap()
}

fn random_bitmap(width: u16, height: u16, colors: u8) -> Bitmap {

    let mut rng = thread_rng();
    let mut pixels = Vec::with_capacity(width as usize * height as usize);

    // Favor runs so that every escape form gets exercised.
    while pixels.len() < width as usize * height as usize {
        let color = rng.gen_range(0..=colors);
        let run = match rng.gen_range(0..4) {
            0 => 1,
            1 => rng.gen_range(2..64),
            2 => rng.gen_range(64..300),
            _ => rng.gen_range(1..4),
        };
        for _ in 0..run {
            pixels.push(color);
        }
    }
    pixels.truncate(width as usize * height as usize);

    Bitmap::from_pixels(width, height, pixels).unwrap()
}

fn cycle(bitmap: &Bitmap) {

    let single = encode(bitmap);
    let (even, odd) = encode_interlaced(bitmap);

    assert_eq!(&decode(&single, bitmap.width(), bitmap.height()).unwrap(), bitmap);
    assert_eq!(
        &decode_interlaced(&even, &odd, bitmap.width(), bitmap.height()).unwrap(),
        bitmap,
    );
}

#[test]
fn test_cycle_solid_color() {
    cycle(&Bitmap::new(100, 20, 7));
    cycle(&Bitmap::new(1, 1, 255));
}

#[test]
fn test_cycle_transparent() {
    cycle(&Bitmap::new(640, 3, 0));
}

#[test]
fn test_cycle_checkerboard() {
    cycle(&checkerboard(33, 9, 0, 1));
    cycle(&checkerboard(32, 8, 5, 200));
}

#[test]
fn test_cycle_random() {
    for _ in 0..20 {
        let mut rng = thread_rng();
        let width = rng.gen_range(1..700);
        let height = rng.gen_range(1..40);
        cycle(&random_bitmap(width, height, 255));
    }
}

#[test]
fn test_cycle_long_lines() {
    cycle(&Bitmap::new(40_000, 2, 0));
    cycle(&Bitmap::new(40_000, 2, 9));
    cycle(&random_bitmap(20_000, 3, 3));
}

#[test]
fn test_cycle_empty() {
    cycle(&Bitmap::new(0, 0, 0));
    cycle(&Bitmap::new(0, 3, 0));
}

#[test]
fn test_short_runs_are_literal() {
    let bitmap = Bitmap::from_pixels(3, 1, vec![4, 5, 5]).unwrap();
    assert_eq!(encode(&bitmap), vec![0x04, 0x05, 0x05, 0x00, 0x00]);
}

#[test]
fn test_escape_forms() {

    let mut pixels = vec![0u8; 10];
    pixels.extend(vec![3u8; 10]);
    pixels.extend(vec![0u8; 300]);
    pixels.extend(vec![9u8; 300]);

    let bitmap = Bitmap::from_pixels(620, 1, pixels).unwrap();

    assert_eq!(
        encode(&bitmap),
        vec![
            0x00, 0x0A,
            0x00, 0x8A, 0x03,
            0x00, 0x41, 0x2C,
            0x00, 0xC1, 0x2C, 0x09,
            0x00, 0x00,
        ],
    );
}

#[test]
fn test_every_line_ends_with_marker() {

    let bitmap = Bitmap::new(12, 4, 0);

    assert_eq!(encode(&bitmap), [0x00_u8, 0x0C, 0x00, 0x00].repeat(4));
}

#[test]
fn test_run_length_is_capped() {

    let bitmap = Bitmap::new(MAX_RUN as u16 * 2 + 5, 1, 1);

    assert_eq!(
        encode(&bitmap),
        vec![
            0x00, 0xFF, 0xFF, 0x01,
            0x00, 0xFF, 0xFF, 0x01,
            0x00, 0x85, 0x01,
            0x00, 0x00,
        ],
    );
}

#[test]
fn test_no_run_exceeds_cap() {

    let bitmap = random_bitmap(50_000, 2, 2);
    let data = encode(&bitmap);
    let mut i = 0;

    while i < data.len() {
        if data[i] != 0 {
            i += 1;
            continue
        }
        let flags = data[i + 1];
        let count = if flags & 0x40 != 0 {
            ((flags as usize & 0x3F) << 8) | data[i + 2] as usize
        } else {
            flags as usize & 0x3F
        };
        assert!(count <= MAX_RUN);
        i += 2 + (flags & 0x40 != 0) as usize + (flags & 0x80 != 0) as usize;
    }
}

#[test]
fn test_short_line_is_padded() {

    let bitmap = decode(&[0x07, 0x00, 0x00, 0x00, 0x83, 0x02, 0x00, 0x00], 5, 2).unwrap();

    assert_eq!(bitmap.pixels(), &[7, 0, 0, 0, 0, 2, 2, 2, 0, 0]);
}

#[test]
fn test_missing_lines_are_transparent() {

    let bitmap = decode(&[0x00, 0x83, 0x02, 0x00, 0x00], 3, 3).unwrap();

    assert_eq!(bitmap.pixels(), &[2, 2, 2, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn test_long_line_is_rejected() {
    assert_eq!(
        decode(&[0x00, 0x02, 0x00, 0x00, 0x00, 0x84, 0x01], 3, 2).unwrap_err(),
        RleError::LineTooLong { line: 1 },
    );
}

#[test]
fn test_truncated_escape_is_rejected() {
    assert_eq!(decode(&[0x01, 0x00], 3, 1).unwrap_err(), RleError::Truncated);
    assert_eq!(decode(&[0x00, 0xC1], 500, 1).unwrap_err(), RleError::Truncated);
    assert_eq!(decode(&[0x00, 0x85], 5, 1).unwrap_err(), RleError::Truncated);
}
