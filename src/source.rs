/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Random-access reading of stream files.
//!
//! Every reader in this crate addresses its input by absolute offset rather than by reading
//! sequentially, since captions refer back to byte ranges (object fragments, RLE buffers)
//! that are only decoded later. [`ByteSource`] is that interface; [`FileBuffer`] implements it
//! on top of anything that can [`Read`] and [`Seek`].
//!
//! A source repositions itself on every call, so it takes `&mut self` and must not be shared
//! between threads. Give each worker its own.

#[cfg(test)]
mod tests;

use std::{
    fs::File,
    io::{Error as IoError, ErrorKind, Read, Result as IoResult, Seek, SeekFrom},
    path::Path,
};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

const BUFFER_SIZE: usize = 1024 * 1024;

/// Reads integers and byte ranges at absolute offsets.
pub trait ByteSource {

    /// The total length of the source in bytes.
    fn len(&self) -> u64;

    /// Reads exactly `len` bytes beginning at `offset`.
    fn read_bytes(&mut self, offset: u64, len: usize) -> IoResult<Vec<u8>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_u8(&mut self, offset: u64) -> IoResult<u8> {
        Ok(self.read_bytes(offset, 1)?[0])
    }

    /// Reads a big-endian `u16`.
    fn read_u16(&mut self, offset: u64) -> IoResult<u16> {
        Ok(BigEndian::read_u16(&self.read_bytes(offset, 2)?))
    }

    /// Reads a big-endian `u32`.
    fn read_u32(&mut self, offset: u64) -> IoResult<u32> {
        Ok(BigEndian::read_u32(&self.read_bytes(offset, 4)?))
    }

    /// Reads a little-endian `u32`.
    fn read_u32_le(&mut self, offset: u64) -> IoResult<u32> {
        Ok(LittleEndian::read_u32(&self.read_bytes(offset, 4)?))
    }
}

/// A windowed read cache over a seekable input.
///
/// Reads that fall inside the current window are served from memory. Anything else moves the
/// window so that it starts at the requested offset.
pub struct FileBuffer<R> {
    inner: R,
    len: u64,
    window: Vec<u8>,
    window_start: u64,
}

impl FileBuffer<File> {

    /// Opens a file for random-access reading.
    pub fn open<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        Self::new(File::open(path)?)
    }
}

impl<R> FileBuffer<R> where
    R: Read + Seek,
{

    pub fn new(mut inner: R) -> IoResult<Self> {

        let len = inner.seek(SeekFrom::End(0))?;

        Ok(
            FileBuffer {
                inner,
                len,
                window: Vec::new(),
                window_start: 0,
            }
        )
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill_window(&mut self, offset: u64, min_len: usize) -> IoResult<()> {

        let available = (self.len - offset) as usize;
        let size = BUFFER_SIZE.max(min_len).min(available);

        self.window.resize(size, 0);
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read_exact(&mut self.window)?;
        self.window_start = offset;

        Ok(())
    }
}

impl<R> ByteSource for FileBuffer<R> where
    R: Read + Seek,
{

    fn len(&self) -> u64 {
        self.len
    }

    fn read_bytes(&mut self, offset: u64, len: usize) -> IoResult<Vec<u8>> {

        let end = offset.checked_add(len as u64).filter(|&end| end <= self.len).ok_or_else(||
            IoError::new(
                ErrorKind::UnexpectedEof,
                format!("read of {} bytes at offset {:#x} is past end of input", len, offset),
            )
        )?;
        let window_end = self.window_start + self.window.len() as u64;

        if offset < self.window_start || end > window_end {
            self.fill_window(offset, len)?;
        }

        let start = (offset - self.window_start) as usize;

        Ok(Vec::from(&self.window[start..(start + len)]))
    }
}
