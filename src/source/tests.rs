/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;
use std::io::{Cursor, ErrorKind};
use rand::{thread_rng, Rng};

#[test]
fn test_read_integers() {

    let data = vec![0x53, 0x50, 0x78, 0x56, 0x34, 0x12, 0xAB, 0xCD];
    let mut source = FileBuffer::new(Cursor::new(data)).unwrap();

    assert_eq!(source.len(), 8);
    assert_eq!(source.read_u8(0).unwrap(), 0x53);
    assert_eq!(source.read_u16(0).unwrap(), 0x5350);
    assert_eq!(source.read_u32_le(2).unwrap(), 0x12345678);
    assert_eq!(source.read_u32(4).unwrap(), 0x3412ABCD);
    assert_eq!(source.read_u16(6).unwrap(), 0xABCD);
}

#[test]
fn test_read_past_end() {

    let mut source = FileBuffer::new(Cursor::new(vec![1u8, 2, 3])).unwrap();

    assert_eq!(source.read_bytes(1, 3).unwrap_err().kind(), ErrorKind::UnexpectedEof);
    assert_eq!(source.read_u8(3).unwrap_err().kind(), ErrorKind::UnexpectedEof);
    assert_eq!(source.read_bytes(u64::MAX, 2).unwrap_err().kind(), ErrorKind::UnexpectedEof);
    assert_eq!(source.read_bytes(1, 2).unwrap(), vec![2, 3]);
}

#[test]
fn test_random_access_across_windows() {

    let mut rng = thread_rng();
    let data = (0..(3 * BUFFER_SIZE + 17)).map(|_| rng.gen::<u8>()).collect::<Vec<u8>>();
    let mut source = FileBuffer::new(Cursor::new(data.clone())).unwrap();

    for _ in 0..64 {

        let offset = rng.gen_range(0..data.len());
        let len = rng.gen_range(0..=(data.len() - offset).min(70_000));

        assert_eq!(
            source.read_bytes(offset as u64, len).unwrap(),
            &data[offset..(offset + len)],
        );
    }
}
