/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::{
    *,
    segmentread::ReadSegmentExt,
    segmentwrite::WriteSegmentExt,
};
use std::io::Cursor;
use rand::{thread_rng, Rng};

#[test]
fn test_pcs_cycle_pui_co() {

    let mut rng = thread_rng();
    let segment = Segment::PresentationComposition(
        PresentationCompositionSegment {
            pts: rng.gen(),
            dts: rng.gen(),
            width: rng.gen(),
            height: rng.gen(),
            frame_rate: rng.gen(),
            composition_number: rng.gen(),
            composition_state: CompositionState::AcquisitionPoint,
            palette_update_id: Some(rng.gen()),
            composition_objects: vec![
                CompositionObject {
                    object_id: rng.gen(),
                    window_id: rng.gen(),
                    x: rng.gen(),
                    y: rng.gen(),
                    forced: true,
                    crop: None,
                },
                CompositionObject {
                    object_id: rng.gen(),
                    window_id: rng.gen(),
                    x: rng.gen(),
                    y: rng.gen(),
                    forced: false,
                    crop: Some(
                        Crop {
                            x: rng.gen(),
                            y: rng.gen(),
                            width: rng.gen(),
                            height: rng.gen(),
                        }
                    ),
                },
            ],
        }
    );

    cycle(&segment);
}

#[test]
fn test_pcs_cycle_no_pui_no_co() {

    let mut rng = thread_rng();
    let segment = Segment::PresentationComposition(
        PresentationCompositionSegment {
            pts: rng.gen(),
            dts: rng.gen(),
            width: rng.gen(),
            height: rng.gen(),
            frame_rate: rng.gen(),
            composition_number: rng.gen(),
            composition_state: CompositionState::Normal,
            palette_update_id: None,
            composition_objects: vec![],
        }
    );

    cycle(&segment);
}

#[test]
fn test_wds_not_empty() {

    let mut rng = thread_rng();
    let segment = Segment::WindowDefinition(
        WindowDefinitionSegment {
            pts: rng.gen(),
            dts: rng.gen(),
            windows: vec![
                WindowDefinition {
                    id: rng.gen(),
                    x: rng.gen(),
                    y: rng.gen(),
                    width: rng.gen(),
                    height: rng.gen(),
                },
                WindowDefinition {
                    id: rng.gen(),
                    x: rng.gen(),
                    y: rng.gen(),
                    width: rng.gen(),
                    height: rng.gen(),
                },
            ],
        }
    );

    cycle(&segment);
}

#[test]
fn test_pds_not_empty() {

    let mut rng = thread_rng();
    let segment = Segment::PaletteDefinition(
        PaletteDefinitionSegment {
            pts: rng.gen(),
            dts: rng.gen(),
            id: rng.gen(),
            version: rng.gen(),
            entries: (0..=255).map(|id|
                PaletteEntry {
                    id,
                    y: rng.gen(),
                    cr: rng.gen(),
                    cb: rng.gen(),
                    alpha: rng.gen(),
                }
            ).collect(),
        }
    );

    cycle(&segment);
}

#[test]
fn test_ods_single() {

    let mut rng = thread_rng();
    let data = (0..1000).map(|_| rng.gen()).collect::<Vec<u8>>();
    let segment = Segment::SingleObjectDefinition(
        SingleObjectDefinitionSegment {
            pts: rng.gen(),
            dts: rng.gen(),
            id: rng.gen(),
            version: rng.gen(),
            length: data.len() + 4,
            width: rng.gen(),
            height: rng.gen(),
            data,
        }
    );

    cycle(&segment);
}

#[test]
fn test_ods_split() {

    let mut rng = thread_rng();
    let initial = Segment::InitialObjectDefinition(
        InitialObjectDefinitionSegment {
            pts: rng.gen(),
            dts: rng.gen(),
            id: rng.gen(),
            version: rng.gen(),
            length: 200_000,
            width: rng.gen(),
            height: rng.gen(),
            data: vec![0xAB; INITIAL_OBJECT_DATA_SIZE],
        }
    );
    let middle = Segment::MiddleObjectDefinition(
        MiddleObjectDefinitionSegment {
            pts: rng.gen(),
            dts: rng.gen(),
            id: rng.gen(),
            version: rng.gen(),
            data: vec![0xCD; MIDDLE_OBJECT_DATA_SIZE],
        }
    );
    let last = Segment::FinalObjectDefinition(
        FinalObjectDefinitionSegment {
            pts: rng.gen(),
            dts: rng.gen(),
            id: rng.gen(),
            version: rng.gen(),
            data: vec![0xEF; 17],
        }
    );

    cycle(&initial);
    cycle(&middle);
    cycle(&last);
}

#[test]
fn test_es() {

    let mut rng = thread_rng();
    let segment = Segment::End(
        EndSegment {
            pts: rng.gen(),
            dts: rng.gen(),
        }
    );

    cycle(&segment);
}

#[test]
fn test_wire_layout() {

    let mut buffer = vec![];

    buffer.write_segment(&Segment::End(EndSegment { pts: 0x01020304, dts: 0 })).unwrap();

    assert_eq!(buffer, vec![0x50, 0x47, 1, 2, 3, 4, 0, 0, 0, 0, 0x80, 0, 0]);

    let mut buffer = vec![];

    buffer.write_segment(&Segment::PresentationComposition(
        PresentationCompositionSegment {
            pts: 0,
            dts: 0,
            width: 1920,
            height: 1080,
            frame_rate: 0x10,
            composition_number: 0,
            composition_state: CompositionState::EpochStart,
            palette_update_id: None,
            composition_objects: vec![
                CompositionObject {
                    object_id: 0,
                    window_id: 0,
                    x: 10,
                    y: 20,
                    forced: true,
                    crop: None,
                },
            ],
        }
    )).unwrap();

    assert_eq!(
        &buffer[HEADER_SIZE..],
        &[0x07, 0x80, 0x04, 0x38, 0x10, 0, 0, 0x80, 0, 0, 1, 0, 0, 0, 0x40, 0, 10, 0, 20],
    );
}

#[test]
fn test_oversized_payload_is_rejected() {

    let mut buffer = vec![];
    let result = buffer.write_segment(&Segment::MiddleObjectDefinition(
        MiddleObjectDefinitionSegment {
            pts: 0,
            dts: 0,
            id: 0,
            version: 0,
            data: vec![0; MAX_PAYLOAD_SIZE],
        }
    ));

    assert!(matches!(result, Err(WriteError::PayloadTooLarge)));
    assert!(buffer.is_empty());
}

#[test]
fn test_bad_magic_number() {

    let bytes = [0x50, 0x48, 0, 0, 0, 1, 0, 0, 0, 0, 0x80, 0, 5];
    let result = Cursor::new(bytes.to_vec()).read_segment();

    assert!(matches!(result, Err(ReadError::UnrecognizedMagicNumber)));

    let (_, header) = SegmentHeader::parse(&bytes).unwrap_err();

    assert_eq!(header.size, 5);
    assert_eq!(header.pts, 1);
}

#[test]
fn test_unrecognized_kind() {

    let bytes = vec![0x50, 0x47, 0, 0, 0, 0, 0, 0, 0, 0, 0x33, 0, 0];

    assert!(matches!(Cursor::new(bytes).read_segment(), Err(ReadError::UnrecognizedKind)));
}

#[test]
fn test_truncated_payload() {

    let bytes = vec![0x50, 0x47, 0, 0, 0, 0, 0, 0, 0, 0, KIND_PDS, 0, 1, 0];

    assert!(matches!(Cursor::new(bytes).read_segment(), Err(ReadError::IoError { .. })));
}

fn cycle(segment: &Segment) {

    let mut buffer = vec![];

    buffer.write_segment(segment).unwrap();

    let mut cursor = Cursor::new(buffer);
    let cycled_segment = cursor.read_segment().unwrap();

    assert_eq!(cycled_segment, *segment);
}
