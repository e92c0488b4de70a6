/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;
use super::super::{
    error::{DecodeError, StreamError},
    palette::{Palette, PaletteEntry, MAX_PALETTE_SIZE},
    picture::{Bitmap, PictureFormat, SubtitlePicture},
    rle,
    segment::{
        CompositionObject,
        CompositionState,
        EndSegment,
        PaletteDefinitionSegment,
        PaletteEntry as SegmentPaletteEntry,
        PresentationCompositionSegment,
        Segment,
        SingleObjectDefinitionSegment,
        WriteSegmentExt,
    },
    source::FileBuffer,
};
use std::io::Cursor;
use rand::{thread_rng, Rng};

struct DropLastEntry;

impl Quantizer for DropLastEntry {

    fn quantize(&mut self, bitmap: &Bitmap, palette: &Palette) -> (Bitmap, Palette) {

        let pixels = bitmap.pixels().iter().map(|&pixel| pixel.min(254)).collect();
        let mut palette = palette.clone();

        palette.set(255, PaletteEntry::default());

        (Bitmap::from_pixels(bitmap.width(), bitmap.height(), pixels).unwrap(), palette)
    }
}

#[test]
fn test_two_by_two_caption() {

    let bitmap = Bitmap::new(2, 2, 1);
    let mut palette = Palette::new(2);

    palette.set(1, PaletteEntry::new(200, 128, 128, 255));

    let picture = SubtitlePicture::bd(1920, 1080, &bitmap, 10, 20, 0, 9000);
    let segments = caption_segments(&picture, &bitmap, &palette, 0, FrameRate::Film);

    assert_eq!(segments.len(), 8);

    match &segments[0] {
        Segment::PresentationComposition(pcs) => {
            assert_eq!(pcs.composition_number, 0);
            assert_eq!(pcs.composition_state, CompositionState::EpochStart);
            assert_eq!(pcs.frame_rate, 0x10);
            assert_eq!(pcs.composition_objects.len(), 1);
            assert_eq!(pcs.composition_objects[0].x, 10);
            assert_eq!(pcs.composition_objects[0].y, 20);
        }
        other => panic!("expected PCS, got {:?}", other),
    }
    match &segments[2] {
        Segment::PaletteDefinition(pds) => {
            assert_eq!(pds.entries.len(), 2);
            assert_eq!(pds.entries[1].y, 200);
            assert_eq!(pds.entries[1].alpha, 255);
        }
        other => panic!("expected PDS, got {:?}", other),
    }
    match &segments[3] {
        Segment::SingleObjectDefinition(ods) => {
            assert_eq!(ods.length, ods.data.len() + 4);
            assert_eq!(rle::decode(&ods.data, 2, 2).unwrap(), bitmap);
        }
        other => panic!("expected ODS, got {:?}", other),
    }
    match &segments[5] {
        Segment::PresentationComposition(pcs) => {
            assert_eq!(pcs.composition_number, 1);
            assert_eq!(pcs.pts, 9000);
            assert!(pcs.composition_objects.is_empty());
        }
        other => panic!("expected PCS, got {:?}", other),
    }
    assert!(matches!(segments[4], Segment::End(_)));
    assert!(matches!(segments[6], Segment::WindowDefinition(_)));
    assert!(matches!(segments[7], Segment::End(_)));
    assert!(segments.iter().all(|segment| segment.dts() == 0));

    let mut writer = BdWriter::new(vec![], BdOptions::default());

    writer.write_caption(&picture, &bitmap, &palette).unwrap();

    let mut reader = BdReader::open(source(writer.into_inner())).unwrap();
    let captions = reader.read_captions();

    assert_eq!(captions.len(), 1);

    let caption = captions[0].as_ref().unwrap();

    assert_eq!((caption.x, caption.y), (10, 20));
    assert_eq!((caption.width, caption.height), (2, 2));
    assert_eq!((caption.start_time, caption.end_time), (0, 9000));
    assert_eq!(reader.decode(caption).unwrap(), (bitmap, palette));
}

#[test]
fn test_frame_rate_codes() {

    for rate in [
        FrameRate::Film,
        FrameRate::Fps24,
        FrameRate::Pal,
        FrameRate::Ntsc,
        FrameRate::Pal50,
        FrameRate::Ntsc60,
    ] {
        assert_eq!(FrameRate::from_code(rate.code()), Some(rate));
    }

    assert_eq!(FrameRate::from_code(0x50), None);
}

#[test]
fn test_fragmented_object() {

    let mut rng = thread_rng();
    let pixels = (0..(500 * 400)).map(|_| rng.gen()).collect::<Vec<u8>>();
    let bitmap = Bitmap::from_pixels(500, 400, pixels).unwrap();
    let mut entries = (0..MAX_PALETTE_SIZE).map(|_|
        PaletteEntry::new(rng.gen(), rng.gen(), rng.gen(), rng.gen_range(1..=255))
    ).collect::<Vec<PaletteEntry>>();

    entries[255].alpha = 0;

    let palette = Palette::from_entries(entries);
    let picture = SubtitlePicture::bd(1920, 1080, &bitmap, 0, 0, 900_000, 990_000);
    let data_len = rle::encode(&bitmap).len();
    let continuations = continuation_count(data_len);
    let segments = caption_segments(&picture, &bitmap, &palette, 0, FrameRate::Film);
    let objects = segments.iter().filter(|segment| matches!(
        segment,
        Segment::SingleObjectDefinition(_)
            | Segment::InitialObjectDefinition(_)
            | Segment::MiddleObjectDefinition(_)
            | Segment::FinalObjectDefinition(_)
    )).count();

    assert!(continuations >= 2);
    assert_eq!(objects, continuations + 1);
    assert!(matches!(segments[3], Segment::InitialObjectDefinition(_)));
    assert!(matches!(segments[3 + continuations], Segment::FinalObjectDefinition(_)));

    match &segments[2] {
        Segment::PaletteDefinition(pds) => assert_eq!(pds.entries.len(), 255),
        other => panic!("expected PDS, got {:?}", other),
    }

    let mut writer = BdWriter::new(vec![], BdOptions::default());

    writer.write_caption(&picture, &bitmap, &palette).unwrap();

    let mut reader = BdReader::open(source(writer.into_inner())).unwrap();
    let captions = reader.read_captions();
    let caption = captions[0].as_ref().unwrap();
    let bd = caption.as_bd().unwrap();

    assert_eq!(bd.fragments.len(), continuations + 1);
    assert_eq!(bd.object_length, data_len as u64);

    let (decoded, _) = reader.decode(caption).unwrap();

    assert_eq!(decoded, bitmap);
}

#[test]
fn test_continuation_count() {

    assert_eq!(continuation_count(0), 0);
    assert_eq!(continuation_count(0xFFE4), 0);
    assert_eq!(continuation_count(0xFFE5), 1);
    assert_eq!(continuation_count(0xFFE4 + 0xFFEB), 1);
    assert_eq!(continuation_count(0xFFE4 + 0xFFEB + 1), 2);
}

#[test]
fn test_composition_numbers_advance() {

    let bitmap = Bitmap::new(4, 2, 1);
    let palette = opaque_palette();
    let mut writer = BdWriter::new(vec![], BdOptions { frame_rate: FrameRate::Pal });

    for i in 0..3 {
        let picture = SubtitlePicture::bd(720, 576, &bitmap, 0, 0, i * 90_000, i * 90_000 + 45_000);
        writer.write_caption(&picture, &bitmap, &palette).unwrap();
    }

    assert_eq!(writer.composition_number(), 6);

    let mut reader = BdReader::open(source(writer.into_inner())).unwrap();
    let numbers = reader.read_captions().into_iter().map(|caption|
        caption.unwrap().as_bd().unwrap().composition_number
    ).collect::<Vec<u16>>();

    assert_eq!(numbers, vec![0, 2, 4]);
}

#[test]
fn test_opaque_last_entry() {

    let bitmap = Bitmap::new(4, 4, 255);
    let palette = Palette::from_entries(vec![PaletteEntry::new(235, 128, 128, 255); 256]);
    let picture = SubtitlePicture::bd(1920, 1080, &bitmap, 0, 0, 0, 90_000);
    let mut writer = BdWriter::new(vec![], BdOptions::default());

    assert!(matches!(
        writer.write_caption(&picture, &bitmap, &palette),
        Err(WriteError::OpaqueLastPaletteEntry),
    ));
    assert_eq!(writer.composition_number(), 0);

    let mut writer = writer.with_quantizer(Box::new(DropLastEntry));

    writer.write_caption(&picture, &bitmap, &palette).unwrap();

    let mut reader = BdReader::open(source(writer.into_inner())).unwrap();
    let captions = reader.read_captions();
    let (decoded, decoded_palette) = reader.decode(captions[0].as_ref().unwrap()).unwrap();

    assert_eq!(decoded, Bitmap::new(4, 4, 254));
    assert_eq!(decoded_palette.len(), 255);
}

#[test]
fn test_bitmap_size_mismatch() {

    let bitmap = Bitmap::new(4, 4, 1);
    let picture = SubtitlePicture::bd(1920, 1080, &Bitmap::new(2, 2, 1), 0, 0, 0, 90_000);
    let mut writer = BdWriter::new(vec![], BdOptions::default());

    assert!(matches!(
        writer.write_caption(&picture, &bitmap, &opaque_palette()),
        Err(WriteError::BitmapSizeMismatch),
    ));
    assert!(writer.into_inner().is_empty());
}

#[test]
fn test_more_opaque_palette_wins() {

    let mut buffer = vec![];
    let data = rle::encode(&Bitmap::new(2, 2, 1));
    let segments = vec![
        Segment::PresentationComposition(
            PresentationCompositionSegment {
                pts: 90_000,
                dts: 0,
                width: 1920,
                height: 1080,
                frame_rate: 0x10,
                composition_number: 7,
                composition_state: CompositionState::EpochStart,
                palette_update_id: None,
                composition_objects: vec![
                    CompositionObject {
                        object_id: 3,
                        window_id: 0,
                        x: 100,
                        y: 200,
                        forced: true,
                        crop: None,
                    },
                ],
            }
        ),
        palette_update(100),
        palette_update(50),
        palette_update(200),
        Segment::SingleObjectDefinition(
            SingleObjectDefinitionSegment {
                pts: 90_000,
                dts: 0,
                id: 3,
                version: 0,
                length: data.len() + 4,
                width: 2,
                height: 2,
                data,
            }
        ),
        Segment::End(EndSegment { pts: 90_000, dts: 0 }),
        Segment::PresentationComposition(
            PresentationCompositionSegment {
                pts: 180_000,
                dts: 0,
                width: 1920,
                height: 1080,
                frame_rate: 0x10,
                composition_number: 8,
                composition_state: CompositionState::Normal,
                palette_update_id: None,
                composition_objects: vec![],
            }
        ),
        Segment::End(EndSegment { pts: 180_000, dts: 0 }),
    ];

    for segment in segments.iter() {
        buffer.write_segment(segment).unwrap();
    }

    let mut reader = BdReader::open(source(buffer)).unwrap();
    let captions = reader.read_captions();
    let caption = captions[0].as_ref().unwrap();

    assert!(caption.forced);
    assert_eq!((caption.start_time, caption.end_time), (90_000, 180_000));

    let (_, palette) = reader.decode(caption).unwrap();

    assert_eq!(palette.get(1).unwrap().alpha, 200);
}

#[test]
fn test_damaged_segment_skips_caption() {

    let bitmap = Bitmap::new(8, 2, 1);
    let palette = opaque_palette();
    let mut writer = BdWriter::new(vec![], BdOptions::default());

    for i in 1..=2 {
        let picture = SubtitlePicture::bd(1920, 1080, &bitmap, 0, 0, i * 90_000, i * 90_000 + 9000);
        writer.write_caption(&picture, &bitmap, &palette).unwrap();
    }

    let mut bytes = writer.into_inner();

    // The WDS follows a 19-byte PCS payload.
    bytes[32] = 0x00;

    let mut reader = BdReader::open(source(bytes)).unwrap();
    let captions = reader.read_captions();

    assert_eq!(captions.len(), 2);

    let err = captions[0].as_ref().unwrap_err();

    assert_eq!(err.offset, 0);
    assert_eq!(err.resume_at, 32 + 13 + 10);
    assert!(matches!(err.source, DecodeError::SegmentError { .. }));
    assert_eq!(captions[1].as_ref().unwrap().start_time, 180_000);
}

#[test]
fn test_object_larger_than_screen() {

    let bitmap = Bitmap::new(2, 2, 1);
    let palette = opaque_palette();
    let mut writer = BdWriter::new(vec![], BdOptions::default());

    for i in 1..=2 {
        let picture = SubtitlePicture::bd(720, 480, &bitmap, 0, 0, i * 90_000, i * 90_000 + 9000);
        writer.write_caption(&picture, &bitmap, &palette).unwrap();
    }

    let mut bytes = writer.into_inner();
    let mut offset = 0;

    // Widen the first ODS to 0xFFFF by 0xFFFF.
    while bytes[offset + 10] != 0x15 {
        offset += 13 + u16::from_be_bytes([bytes[offset + 11], bytes[offset + 12]]) as usize;
    }
    bytes[offset + 20..offset + 24].copy_from_slice(&[0xFF; 4]);

    let mut reader = BdReader::open(source(bytes)).unwrap();
    let captions = reader.read_captions();

    assert_eq!(captions.len(), 2);
    assert!(matches!(
        captions[0].as_ref().unwrap_err().source,
        DecodeError::MalformedHeader(_),
    ));
    assert_eq!(captions[1].as_ref().unwrap().start_time, 180_000);
}

#[test]
fn test_fragment_size_mismatch() {

    let bitmap = Bitmap::new(2, 2, 1);
    let picture = SubtitlePicture::bd(1920, 1080, &bitmap, 0, 0, 0, 9000);
    let mut writer = BdWriter::new(vec![], BdOptions::default());

    writer.write_caption(&picture, &bitmap, &opaque_palette()).unwrap();

    let mut reader = BdReader::open(source(writer.into_inner())).unwrap();
    let mut caption = reader.read_captions().remove(0).unwrap();

    if let PictureFormat::Bd(bd) = &mut caption.format {
        bd.object_length += 1;
    }

    assert!(matches!(
        reader.decode(&caption),
        Err(DecodeError::FragmentSizeMismatch { .. }),
    ));
}

#[test]
fn test_uncleared_caption() {

    let bitmap = Bitmap::new(2, 2, 1);
    let palette = opaque_palette();
    let picture = SubtitlePicture::bd(1920, 1080, &bitmap, 0, 0, 45_000, 90_000);
    let mut buffer = vec![];

    for segment in caption_segments(&picture, &bitmap, &palette, 0, FrameRate::Film)
        .iter()
        .take(5) {
        buffer.write_segment(segment).unwrap();
    }

    let mut reader = BdReader::open(source(buffer)).unwrap();
    let captions = reader.read_captions();
    let caption = captions[0].as_ref().unwrap();

    assert_eq!(caption.start_time, 45_000);
    assert_eq!(caption.end_time, 45_000);
}

#[test]
fn test_bad_stream_magic() {

    let result = BdReader::open(source(b"SP not a blu-ray stream".to_vec()));

    assert!(matches!(result, Err(StreamError::UnrecognizedMagicNumber)));
    assert!(BdReader::open(source(vec![])).unwrap().read_captions().is_empty());
}

fn palette_update(alpha: u8) -> Segment {
    Segment::PaletteDefinition(
        PaletteDefinitionSegment {
            pts: 90_000,
            dts: 0,
            id: 0,
            version: 0,
            entries: vec![
                SegmentPaletteEntry { id: 1, y: 235, cr: 128, cb: 128, alpha },
            ],
        }
    )
}

fn opaque_palette() -> Palette {

    let mut palette = Palette::new(2);

    palette.set(1, PaletteEntry::new(235, 128, 128, 255));

    palette
}

fn source(bytes: Vec<u8>) -> FileBuffer<Cursor<Vec<u8>>> {
    FileBuffer::new(Cursor::new(bytes)).unwrap()
}
