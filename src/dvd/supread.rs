/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

use super::{
    DecodeOptions,
    DvdDecodeSession,
    PACKET_HEADER_SIZE,
    PACKET_MAGIC_NUMBER,
    ifo::Ifo,
    spu::{decode_bitmap, index_spu, read_spu},
    super::{
        error::{
            CaptionError,
            CaptionResult,
            CaptionWarning,
            DecodeError,
            DecodeResult,
            StreamError,
            StreamResult,
        },
        palette::Palette,
        picture::{Bitmap, ImageObjectFragment, SubtitlePicture},
        source::ByteSource,
        timing::format_pts,
    },
};
use std::io::{Error as IoError, ErrorKind};

/// Indexes a DVD SUP stream into captions.
pub struct SupDvdReader<S> {
    source: S,
    ifo: Ifo,
    session: DvdDecodeSession,
    warnings: Vec<CaptionWarning>,
}

impl<S> SupDvdReader<S> where
    S: ByteSource,
{

    /// Opens a stream whose colors come from `ifo`. Fails unless the stream is empty or begins
    /// with a packet magic number.
    pub fn open(mut source: S, ifo: Ifo, options: DecodeOptions) -> StreamResult<Self> {

        if !source.is_empty() && source.read_u16(0)? != PACKET_MAGIC_NUMBER {
            return Err(StreamError::UnrecognizedMagicNumber)
        }

        Ok(
            Self {
                source,
                ifo,
                session: DvdDecodeSession::new(options),
                warnings: vec![],
            }
        )
    }

    pub fn ifo(&self) -> &Ifo {
        &self.ifo
    }

    /// Warnings raised by the last call to [`read_captions`](SupDvdReader::read_captions).
    pub fn warnings(&self) -> &[CaptionWarning] {
        &self.warnings
    }

    /// Walks every packet of the stream. A packet that cannot be interpreted costs only its
    /// own caption.
    pub fn read_captions(&mut self) -> Vec<CaptionResult> {

        let len = self.source.len();
        let mut captions = Vec::<CaptionResult>::new();
        let mut offset = 0;

        self.session.reset();
        self.warnings.clear();

        while offset < len {

            let next = match self.read_packet_size(offset, len) {
                Ok(size) => offset + PACKET_HEADER_SIZE as u64 + size,
                Err(source) => {
                    log::warn!("Truncated packet at {:#x}", offset);
                    captions.push(Err(CaptionError { offset, resume_at: len, source }));
                    break
                }
            };

            match self.read_packet(offset, next, captions.len()) {
                Ok(picture) => captions.push(Ok(picture)),
                Err(source) => {
                    log::warn!("Skipping packet at {:#x}: {}", offset, source);
                    captions.push(Err(CaptionError { offset, resume_at: next, source }));
                }
            }

            offset = next;
        }

        log::info!("Indexed {} DVD captions", captions.len());

        captions
    }

    /// Reads and decodes the bitmap of a caption produced by this reader, along with its
    /// palette resolved against the IFO colors.
    pub fn decode(&mut self, picture: &SubtitlePicture) -> DecodeResult<(Bitmap, Palette)> {

        let dvd = picture.as_dvd().ok_or(DecodeError::MalformedHeader("not a DVD caption"))?;
        let spu = read_spu(&mut self.source, &dvd.spu_fragments)?;
        let bitmap = decode_bitmap(&spu, picture)?;

        Ok((bitmap, dvd.frame_palette.resolve(&self.ifo.palette)))
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    fn read_packet_size(&mut self, offset: u64, len: u64) -> DecodeResult<u64> {

        if len - offset < PACKET_HEADER_SIZE as u64 + 2 {
            return Err(IoError::new(ErrorKind::UnexpectedEof, "truncated packet header").into())
        }

        let size = self.source.read_u16(offset + PACKET_HEADER_SIZE as u64)? as u64;

        if offset + PACKET_HEADER_SIZE as u64 + size > len {
            return Err(IoError::new(ErrorKind::UnexpectedEof, "truncated packet").into())
        }

        Ok(size)
    }

    fn read_packet(&mut self, offset: u64, next: u64, index: usize) -> DecodeResult<SubtitlePicture> {

        if self.source.read_u16(offset)? != PACKET_MAGIC_NUMBER {
            return Err(DecodeError::MalformedHeader("packet has unrecognized magic number"))
        }

        let pts = self.source.read_u32_le(offset + 2)? as u64;
        let spu_offset = offset + PACKET_HEADER_SIZE as u64;
        let fragment = ImageObjectFragment {
            buffer_offset: spu_offset,
            packet_size: (next - spu_offset) as u32,
        };
        let spu = read_spu(&mut self.source, &[fragment])?;
        let (picture, warnings) = index_spu(
            &spu,
            pts,
            self.ifo.screen_size(),
            vec![fragment],
            &mut self.session,
        )?;

        for warning in warnings {
            log::warn!("Caption {} at {}: {:?}", index, format_pts(pts), warning);
            self.warnings.push(CaptionWarning { caption: index, warning });
        }

        Ok(picture)
    }
}
