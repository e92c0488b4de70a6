/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

use super::super::{
    error::{CaptionError, CaptionResult, DecodeError, DecodeResult, StreamError, StreamResult},
    palette::{Palette, PaletteEntry},
    picture::{BdPicture, Bitmap, ImageObjectFragment, PictureFormat, SubtitlePicture},
    rle,
    segment::{
        CompositionState,
        PaletteDefinitionSegment,
        PresentationCompositionSegment,
        Segment,
        SegmentHeader,
        parse_segment,
        HEADER_SIZE,
        MAGIC_NUMBER,
    },
    source::ByteSource,
    timing::format_pts,
};
use std::io::{Error as IoError, ErrorKind};

/// Size of the fixed fields in front of the data of a single or initial ODS.
const OBJECT_HEADER_SIZE: u64 = 11;

/// Size of the fixed fields in front of the data of a middle or final ODS.
const CONTINUATION_HEADER_SIZE: u64 = 4;

/// Indexes a Blu-ray presentation graphics stream into captions.
///
/// Indexing only records where each caption's object data lives. Pixels are read and decoded
/// by [`decode`](BdReader::decode) when they are needed.
pub struct BdReader<S> {
    source: S,
}

struct OpenCaption {
    offset: u64,
    picture: SubtitlePicture,
    palette_updates: usize,
    collecting: bool,
}

impl<S> BdReader<S> where
    S: ByteSource,
{

    /// Opens a stream. Fails unless it is empty or begins with a segment magic number.
    pub fn open(mut source: S) -> StreamResult<Self> {

        if !source.is_empty() && source.read_u16(0)? != MAGIC_NUMBER {
            return Err(StreamError::UnrecognizedMagicNumber)
        }

        Ok(Self { source })
    }

    /// Walks every segment of the stream and groups them into captions.
    ///
    /// A segment that cannot be parsed costs only the caption it belongs to; reading resumes
    /// with the segment after it.
    pub fn read_captions(&mut self) -> Vec<CaptionResult> {

        let len = self.source.len();
        let mut captions = Vec::<CaptionResult>::new();
        let mut open: Option<OpenCaption> = None;
        let mut offset = 0;

        while offset < len {

            let header_bytes = match self.read_header(offset, len) {
                Ok(header_bytes) => header_bytes,
                Err(err) => {
                    fail(&mut captions, &mut open, offset, len, err);
                    break
                }
            };
            let (header, header_result) = match SegmentHeader::parse(&header_bytes) {
                Ok(header) => (header, Ok(())),
                Err((err, header)) => (header, Err(err)),
            };
            let payload_offset = offset + HEADER_SIZE as u64;
            let next = payload_offset + header.size as u64;

            if let Err(err) = header_result {
                log::warn!("Bad segment magic number at {:#x}", offset);
                fail(&mut captions, &mut open, offset, next.min(len), err.into());
                offset = next;
                continue
            }

            let segment = self.source.read_bytes(payload_offset, header.size as usize)
                .map_err(DecodeError::from)
                .and_then(|payload| Ok(parse_segment(&header, &payload)?));

            match segment {
                Ok(segment) => {
                    if let Err(err) = handle_segment(&mut captions, &mut open, segment, offset) {
                        fail(&mut captions, &mut open, offset, next, err);
                    }
                }
                Err(err) => {
                    log::warn!("Unreadable segment at {:#x}", offset);
                    fail(&mut captions, &mut open, offset, next.min(len), err);
                }
            }

            offset = next;
        }

        if let Some(caption) = open.take() {
            log::warn!(
                "Caption at {} is never cleared",
                format_pts(caption.picture.start_time),
            );
            captions.push(Ok(caption.picture));
        }

        log::info!("Indexed {} Blu-ray captions", captions.len());

        captions
    }

    /// Reads and decodes the bitmap of a caption produced by this reader.
    pub fn decode(&mut self, picture: &SubtitlePicture) -> DecodeResult<(Bitmap, Palette)> {

        let bd = picture.as_bd().ok_or(DecodeError::MalformedHeader("not a Blu-ray caption"))?;
        let actual: u64 = bd.fragments.iter().map(|fragment| fragment.packet_size as u64).sum();

        if actual != bd.object_length {
            return Err(DecodeError::FragmentSizeMismatch { declared: bd.object_length, actual })
        }

        let mut data = Vec::with_capacity(actual as usize);

        for fragment in bd.fragments.iter() {
            data.extend(
                self.source.read_bytes(fragment.buffer_offset, fragment.packet_size as usize)?
            );
        }

        let bitmap = rle::decode(&data, picture.width, picture.height)?;

        Ok((bitmap, bd.palette.clone()))
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    fn read_header(&mut self, offset: u64, len: u64) -> DecodeResult<[u8; HEADER_SIZE]> {

        if len - offset < HEADER_SIZE as u64 {
            return Err(IoError::new(ErrorKind::UnexpectedEof, "truncated segment header").into())
        }

        let bytes = self.source.read_bytes(offset, HEADER_SIZE)?;

        bytes.as_slice().try_into()
            .map_err(|_| DecodeError::MalformedHeader("short segment header"))
    }
}

/// Abandons the open caption, or reports a stray failure if there is none.
fn fail(
    captions: &mut Vec<CaptionResult>,
    open: &mut Option<OpenCaption>,
    offset: u64,
    resume_at: u64,
    source: DecodeError,
) {

    let offset = match open.take() {
        Some(caption) => caption.offset,
        None => offset,
    };

    captions.push(Err(CaptionError { offset, resume_at, source }));
}

fn handle_segment(
    captions: &mut Vec<CaptionResult>,
    open: &mut Option<OpenCaption>,
    segment: Segment,
    offset: u64,
) -> DecodeResult<()> {

    match segment {
        Segment::PresentationComposition(pcs) => {
            handle_pcs(captions, open, pcs, offset);
        }
        Segment::PaletteDefinition(pds) => {
            if let Some(caption) = open.as_mut() {
                apply_palette(caption, &pds);
            }
        }
        Segment::SingleObjectDefinition(ods) => {
            if let Some(caption) = collecting(open, ods.id) {
                start_object(
                    caption, offset, ods.length, ods.width, ods.height, ods.data.len(),
                )?;
            }
        }
        Segment::InitialObjectDefinition(ods) => {
            if let Some(caption) = collecting(open, ods.id) {
                start_object(
                    caption, offset, ods.length, ods.width, ods.height, ods.data.len(),
                )?;
            }
        }
        Segment::MiddleObjectDefinition(ods) => {
            if let Some(caption) = collecting(open, ods.id) {
                continue_object(caption, offset, ods.data.len());
            }
        }
        Segment::FinalObjectDefinition(ods) => {
            if let Some(caption) = collecting(open, ods.id) {
                continue_object(caption, offset, ods.data.len());
            }
        }
        Segment::End(_) => {
            if let Some(caption) = open.as_mut() {
                caption.collecting = false;
            }
        }
        Segment::WindowDefinition(_) => {}
    }

    Ok(())
}

fn handle_pcs(
    captions: &mut Vec<CaptionResult>,
    open: &mut Option<OpenCaption>,
    pcs: PresentationCompositionSegment,
    offset: u64,
) {

    let pts = pcs.pts as u64;
    let first_object = match pcs.composition_objects.first() {
        Some(object) => object,
        None => {
            if let Some(mut caption) = open.take() {
                caption.picture.end_time = pts;
                captions.push(Ok(caption.picture));
            }
            return
        }
    };

    if let Some(caption) = open.as_mut() {
        if pcs.composition_state != CompositionState::EpochStart {
            log::debug!("Refreshing caption at {}", format_pts(caption.picture.start_time));
            caption.picture.forced |= first_object.forced;
            return
        }
    }

    if let Some(mut caption) = open.take() {
        caption.picture.end_time = pts;
        captions.push(Ok(caption.picture));
    }

    *open = Some(
        OpenCaption {
            offset,
            picture: SubtitlePicture {
                screen_width: pcs.width,
                screen_height: pcs.height,
                width: 0,
                height: 0,
                x: first_object.x,
                y: first_object.y,
                start_time: pts,
                end_time: pts,
                forced: first_object.forced,
                format: PictureFormat::Bd(
                    BdPicture {
                        composition_number: pcs.composition_number,
                        object_id: first_object.object_id,
                        window_id: first_object.window_id,
                        palette: Palette::new(1),
                        object_length: 0,
                        fragments: vec![],
                    }
                ),
            },
            palette_updates: 0,
            collecting: true,
        }
    );
}

/// Applies a palette update if it is the caption's first one, or if it is more opaque than
/// what the caption has so far.
fn apply_palette(caption: &mut OpenCaption, pds: &PaletteDefinitionSegment) {

    if let PictureFormat::Bd(bd) = &mut caption.picture.format {

        let mut palette = bd.palette.clone();

        for entry in pds.entries.iter() {
            palette.set(
                entry.id as usize,
                PaletteEntry::new(entry.y, entry.cb, entry.cr, entry.alpha),
            );
        }

        if caption.palette_updates == 0 || palette.alpha_sum() > bd.palette.alpha_sum() {
            bd.palette = palette;
        } else {
            log::debug!("Ignoring less opaque palette update");
        }

        caption.palette_updates += 1;
    }
}

fn collecting(open: &mut Option<OpenCaption>, object_id: u16) -> Option<&mut OpenCaption> {
    open.as_mut().filter(|caption|
        caption.collecting
            && caption.picture.as_bd().map_or(false, |bd| bd.object_id == object_id)
    )
}

fn start_object(
    caption: &mut OpenCaption,
    offset: u64,
    length: usize,
    width: u16,
    height: u16,
    data_len: usize,
) -> DecodeResult<()> {

    if length < 4 {
        return Err(DecodeError::MalformedHeader("object length shorter than its dimensions"))
    }
    if width > caption.picture.screen_width || height > caption.picture.screen_height {
        return Err(DecodeError::MalformedHeader("object is larger than the screen"))
    }

    caption.picture.width = width;
    caption.picture.height = height;

    if let PictureFormat::Bd(bd) = &mut caption.picture.format {
        bd.object_length = length as u64 - 4;
        bd.fragments = vec![
            ImageObjectFragment {
                buffer_offset: offset + HEADER_SIZE as u64 + OBJECT_HEADER_SIZE,
                packet_size: data_len as u32,
            },
        ];
    }

    Ok(())
}

fn continue_object(caption: &mut OpenCaption, offset: u64, data_len: usize) {
    if let PictureFormat::Bd(bd) = &mut caption.picture.format {
        if bd.fragments.is_empty() {
            log::warn!("Object continuation at {:#x} has no initial segment", offset);
        } else {
            bd.fragments.push(
                ImageObjectFragment {
                    buffer_offset: offset + HEADER_SIZE as u64 + CONTINUATION_HEADER_SIZE,
                    packet_size: data_len as u32,
                }
            );
        }
    }
}
