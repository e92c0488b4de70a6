/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;

#[test]
fn test_primary_colors_survive_conversion() {

    let colors = [
        Rgb { red: 0, green: 0, blue: 0 },
        Rgb { red: 255, green: 255, blue: 255 },
        Rgb { red: 255, green: 0, blue: 0 },
        Rgb { red: 0, green: 255, blue: 0 },
        Rgb { red: 0, green: 0, blue: 255 },
    ];

    for rgb in colors.iter() {

        let cycled = PaletteEntry::from_rgb(*rgb, 0xFF).rgb();

        assert!((cycled.red as i32 - rgb.red as i32).abs() <= 2, "{:?} -> {:?}", rgb, cycled);
        assert!((cycled.green as i32 - rgb.green as i32).abs() <= 2, "{:?} -> {:?}", rgb, cycled);
        assert!((cycled.blue as i32 - rgb.blue as i32).abs() <= 2, "{:?} -> {:?}", rgb, cycled);
    }
}

#[test]
fn test_studio_range_extremes() {
    assert_eq!(PaletteEntry::new(16, 128, 128, 0).rgb(), Rgb { red: 0, green: 0, blue: 0 });
    assert_eq!(
        PaletteEntry::new(235, 128, 128, 0).rgb(),
        Rgb { red: 255, green: 255, blue: 255 },
    );
}

#[test]
fn test_last_visible_index() {

    let mut palette = Palette::new(256);

    assert_eq!(palette.last_visible_index(), None);

    palette.set(1, PaletteEntry::new(200, 128, 128, 255));
    palette.set(7, PaletteEntry::new(100, 128, 128, 1));

    assert_eq!(palette.last_visible_index(), Some(7));
    assert_eq!(palette.alpha_sum(), 256);
}

#[test]
fn test_set_grows_and_ignores_out_of_range() {

    let mut palette = Palette::new(2);

    palette.set(9, PaletteEntry::new(1, 2, 3, 4));
    palette.set(300, PaletteEntry::new(1, 2, 3, 4));

    assert_eq!(palette.len(), 10);
    assert_eq!(palette.get(9), Some(&PaletteEntry::new(1, 2, 3, 4)));
    assert_eq!(palette.get(5), Some(&PaletteEntry::default()));
}

#[test]
fn test_frame_palette_resolves_against_main_palette() {

    let mut main = Palette::new(16);

    main.set(3, PaletteEntry::new(50, 60, 70, 255));
    main.set(12, PaletteEntry::new(80, 90, 100, 255));

    let frame = FramePalette::new([0, 3, 12, 3], [0, 15, 8, 1]);
    let palette = frame.resolve(&main);

    assert_eq!(palette.len(), 4);
    assert_eq!(palette.get(0), Some(&PaletteEntry::new(16, 128, 128, 0)));
    assert_eq!(palette.get(1), Some(&PaletteEntry::new(50, 60, 70, 255)));
    assert_eq!(palette.get(2), Some(&PaletteEntry::new(80, 90, 100, 136)));
    assert_eq!(palette.get(3), Some(&PaletteEntry::new(50, 60, 70, 17)));
    assert_eq!(frame.alpha_sum(), 24);
}

#[test]
fn test_frame_palette_alpha_uses_low_nibble() {

    let frame = FramePalette { colors: [0, 1, 2, 3], alpha: [0xFF, 15, 0xF0, 0x1F] };
    let palette = frame.resolve(&Palette::default_dvd());

    assert_eq!(palette.get(0).unwrap().alpha, 255);
    assert_eq!(palette.get(1).unwrap().alpha, 255);
    assert_eq!(palette.get(2).unwrap().alpha, 0);
    assert_eq!(palette.get(3).unwrap().alpha, 255);
}

#[test]
fn test_default_dvd_palette() {

    let palette = Palette::default_dvd();

    assert_eq!(palette.len(), DVD_PALETTE_SIZE);
    assert_eq!(palette.get(0).unwrap().rgb(), Rgb { red: 0, green: 0, blue: 0 });
    assert!(palette.entries().iter().all(|entry| entry.alpha == 0xFF));
}
