use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const SIDE: usize = 6;

/// Vertical line.
const ORT_LINE: [u8; 36] = [
    0xdc, 0x87, 0x32, 0x07, 0x5c, 0xb2, //
    0xf2, 0x9c, 0x47, 0x1c, 0x72, 0xc7, //
    0xe4, 0x8e, 0x39, 0x0e, 0x64, 0xb9, //
    0xf9, 0xa4, 0x4e, 0x24, 0x79, 0xce, //
    0xeb, 0x95, 0x40, 0x15, 0x6b, 0xc0, //
    0xff, 0xab, 0x55, 0x2b, 0x80, 0xd5,
];

/// Diagonal line running NW to SE.
const DIA_LINE: [u8; 36] = [
    0x07, 0x55, 0x95, 0xc7, 0xeb, 0xff, //
    0x32, 0x1c, 0x6b, 0xa4, 0xd5, 0xf2, //
    0x79, 0x47, 0x0e, 0x5c, 0x9c, 0xce, //
    0xb2, 0x87, 0x39, 0x24, 0x72, 0xab, //
    0xdc, 0xc0, 0x80, 0x4e, 0x15, 0x64, //
    0xf9, 0xe4, 0xb9, 0x8e, 0x40, 0x2b,
];

/// Contour side facing west.
const ORT_CONTOUR: [u8; 36] = [
    0x07, 0x32, 0x5c, 0x87, 0xb2, 0xdc, //
    0x1c, 0x47, 0x72, 0x9c, 0xc7, 0xf2, //
    0x0e, 0x39, 0x64, 0x8e, 0xb9, 0xe4, //
    0x24, 0x4e, 0x79, 0xa4, 0xce, 0xf9, //
    0x15, 0x40, 0x6b, 0x95, 0xc0, 0xeb, //
    0x2b, 0x55, 0x80, 0xab, 0xd5, 0xff,
];

/// Contour side facing south-west.
const DIA_CONTOUR: [u8; 36] = [
    0x72, 0x9c, 0xc0, 0xdc, 0xf2, 0xff, //
    0x4e, 0x87, 0xb2, 0xce, 0xeb, 0xf9, //
    0x32, 0x64, 0x79, 0xa4, 0xc7, 0xe4, //
    0x1c, 0x40, 0x55, 0x8e, 0xb9, 0xd5, //
    0x0e, 0x2b, 0x39, 0x6b, 0x80, 0xab, //
    0x07, 0x15, 0x24, 0x47, 0x5c, 0x95,
];

/// Corner pointing north-west.
const ORT_CORNER: [u8; 36] = [
    0x07, 0x0e, 0x24, 0x47, 0x79, 0xb9, //
    0x15, 0x1c, 0x32, 0x64, 0xa4, 0xe4, //
    0x2b, 0x39, 0x40, 0x55, 0x87, 0xc7, //
    0x4e, 0x6b, 0x5c, 0x72, 0xb2, 0xf2, //
    0x80, 0x9c, 0x8e, 0xab, 0x95, 0xd5, //
    0xc0, 0xeb, 0xce, 0xf9, 0xdc, 0xff,
];

/// Corner pointing west.
const DIA_CORNER: [u8; 36] = [
    0x32, 0x64, 0x8e, 0xb9, 0xdc, 0xf9, //
    0x1c, 0x47, 0x72, 0x9c, 0xc7, 0xeb, //
    0x07, 0x15, 0x55, 0x80, 0xab, 0xd5, //
    0x0e, 0x2b, 0x39, 0x5c, 0x87, 0xb2, //
    0x24, 0x4e, 0x79, 0xa4, 0xce, 0xf2, //
    0x40, 0x6b, 0x95, 0xc0, 0xe4, 0xff,
];

/// Rotate a 6x6 map clockwise by `degrees` (0, 90, 180 or -90).
fn rotate(src: &[u8; 36], degrees: i32) -> [u8; 36] {
    let last = SIDE - 1;
    let mut dest = [0u8; 36];
    for j in 0..SIDE {
        for i in 0..SIDE {
            let (j0, i0) = match degrees {
                0 => (j, i),
                90 => (i, last - j),
                180 => (last - j, last - i),
                -90 => (last - i, j),
                other => panic!("unsupported rotation {other}"),
            };
            dest[j * SIDE + i] = src[j0 * SIDE + i0];
        }
    }
    dest
}

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("weight_maps.rs");
    let mut file = File::create(&dest_path).unwrap();

    // Order follows the wire codes 1..=20 of `TileShape`.
    let table: [(&str, &[u8; 36], i32); 20] = [
        ("NorthLine", &ORT_LINE, 0),
        ("WestLine", &ORT_LINE, -90),
        ("NorthWestLine", &DIA_LINE, 0),
        ("NorthEastLine", &DIA_LINE, -90),
        ("WestSide", &ORT_CONTOUR, 0),
        ("NorthSide", &ORT_CONTOUR, -90),
        ("EastSide", &ORT_CONTOUR, 180),
        ("SouthSide", &ORT_CONTOUR, 90),
        ("NorthEastSide", &DIA_CONTOUR, 180),
        ("SouthEastSide", &DIA_CONTOUR, 90),
        ("SouthWestSide", &DIA_CONTOUR, 0),
        ("NorthWestSide", &DIA_CONTOUR, -90),
        ("WestCorner", &DIA_CORNER, 0),
        ("NorthCorner", &DIA_CORNER, -90),
        ("EastCorner", &DIA_CORNER, 180),
        ("SouthCorner", &DIA_CORNER, 90),
        ("NorthWestCorner", &ORT_CORNER, 0),
        ("NorthEastCorner", &ORT_CORNER, -90),
        ("SouthEastCorner", &ORT_CORNER, 180),
        ("SouthWestCorner", &ORT_CORNER, 90),
    ];

    writeln!(file, "/// Oriented 6x6 weight maps, indexed by tile code minus one.").unwrap();
    writeln!(file, "pub(crate) static WEIGHT_MAPS: [[u8; 36]; 20] = [").unwrap();
    for (name, base, degrees) in table {
        let map = rotate(base, degrees);
        writeln!(file, "    // {name} ({degrees} deg)").unwrap();
        write!(file, "    [").unwrap();
        for (i, value) in map.iter().enumerate() {
            if i % SIDE == 0 {
                write!(file, "\n        ").unwrap();
            }
            write!(file, "0x{value:02x}, ").unwrap();
        }
        writeln!(file, "\n    ],").unwrap();
    }
    writeln!(file, "];").unwrap();

    println!("cargo::rerun-if-changed=build.rs");
}
