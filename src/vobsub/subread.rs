/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

use super::{
    idx::{Idx, IdxEntry},
    ps::{read_pack, PACK_START_CODE},
    super::{
        dvd::{
            DecodeOptions,
            DvdDecodeSession,
            spu::{decode_bitmap, index_spu, read_spu},
        },
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

/// Indexes a VobSub SUB stream into captions, guided by its IDX file.
pub struct VobSubReader<S> {
    source: S,
    idx: Idx,
    session: DvdDecodeSession,
    warnings: Vec<CaptionWarning>,
}

impl<S> VobSubReader<S> where
    S: ByteSource,
{

    /// Opens a SUB stream. Fails unless the stream is empty or begins with a pack header.
    pub fn open(mut source: S, idx: Idx, options: DecodeOptions) -> StreamResult<Self> {

        if !source.is_empty() && source.read_u32(0)? != PACK_START_CODE {
            return Err(StreamError::UnrecognizedMagicNumber)
        }

        Ok(
            Self {
                source,
                idx,
                session: DvdDecodeSession::new(options),
                warnings: vec![],
            }
        )
    }

    pub fn idx(&self) -> &Idx {
        &self.idx
    }

    /// Warnings raised by the last call to [`read_captions`](VobSubReader::read_captions).
    pub fn warnings(&self) -> &[CaptionWarning] {
        &self.warnings
    }

    /// Reads the caption behind every IDX entry. A caption that cannot be interpreted costs
    /// only itself; reading resumes at the next entry's file position.
    pub fn read_captions(&mut self) -> Vec<CaptionResult> {

        let len = self.source.len();
        let entries = self.idx.entries.clone();
        let mut captions = Vec::<CaptionResult>::with_capacity(entries.len());

        self.session.reset();
        self.warnings.clear();

        for (index, entry) in entries.iter().enumerate() {

            let resume_at = entries.get(index + 1).map_or(len, |next| next.filepos);

            match self.read_caption(entry, index) {
                Ok(picture) => captions.push(Ok(picture)),
                Err(source) => {
                    log::warn!("Skipping caption at {:#x}: {}", entry.filepos, source);
                    captions.push(Err(CaptionError { offset: entry.filepos, resume_at, source }));
                }
            }
        }

        log::info!("Indexed {} VobSub captions", captions.len());

        captions
    }

    /// Reads and decodes the bitmap of a caption produced by this reader, along with its
    /// palette resolved against the IDX colors.
    pub fn decode(&mut self, picture: &SubtitlePicture) -> DecodeResult<(Bitmap, Palette)> {

        let dvd = picture.as_dvd().ok_or(DecodeError::MalformedHeader("not a DVD caption"))?;
        let spu = read_spu(&mut self.source, &dvd.spu_fragments)?;
        let bitmap = decode_bitmap(&spu, picture)?;

        Ok((bitmap, dvd.frame_palette.resolve(&self.idx.palette)))
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    fn read_caption(&mut self, entry: &IdxEntry, index: usize) -> DecodeResult<SubtitlePicture> {

        let (pts, fragments) = self.collect_fragments(entry.filepos)?;
        let pts = pts.unwrap_or(entry.timestamp);
        let spu = read_spu(&mut self.source, &fragments)?;
        let (picture, warnings) = index_spu(
            &spu,
            pts,
            (self.idx.screen_width, self.idx.screen_height),
            fragments,
            &mut self.session,
        )?;

        for warning in warnings {
            log::warn!("Caption {} at {}: {:?}", index, format_pts(pts), warning);
            self.warnings.push(CaptionWarning { caption: index, warning });
        }

        Ok(picture)
    }

    /// Gathers the PES payloads holding the SPU whose first pack is at `offset`, along with the
    /// PTS of the first one.
    fn collect_fragments(
        &mut self,
        offset: u64,
    ) -> DecodeResult<(Option<u64>, Vec<ImageObjectFragment>)> {

        let len = self.source.len();
        let (first, mut next) = read_pack(&mut self.source, offset)?;
        let first = first.ok_or(DecodeError::MalformedHeader("pack carries no sub-picture"))?;

        if first.len < 2 {
            return Err(DecodeError::MalformedHeader("sub-picture size is cut off"))
        }

        let size = self.source.read_u16(first.offset)? as u64;
        let mut fragments = vec![];
        let mut collected = 0;
        let mut payload = Some(first);

        loop {

            if let Some(payload) = payload.filter(|payload| payload.substream == first.substream) {
                let take = (payload.len as u64).min(size - collected);
                fragments.push(
                    ImageObjectFragment {
                        buffer_offset: payload.offset,
                        packet_size: take as u32,
                    }
                );
                collected += take;
            }

            if collected >= size {
                break
            }
            if next >= len {
                return Err(DecodeError::FragmentSizeMismatch { declared: size, actual: collected })
            }

            let (found, after) = read_pack(&mut self.source, next)?;

            // A timestamp marks the start of the following caption.
            if found.map_or(false, |found| found.pts.is_some()) {
                return Err(DecodeError::FragmentSizeMismatch { declared: size, actual: collected })
            }

            payload = found;
            next = after;
        }

        Ok((first.pts, fragments))
    }
}
