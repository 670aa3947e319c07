//! Synthetic raw images.

/// Default resolution handed to every test run.
pub const DPI: &str = "300";

/// `width * height` gray samples of one value.
pub fn flat_gray(width: usize, height: usize, value: u8) -> Vec<u8> {
    vec![value; width * height]
}

/// Gray image where every row is one value from `rows`.
pub fn gray_rows(width: usize, rows: &[u8]) -> Vec<u8> {
    rows.iter().flat_map(|v| vec![*v; width]).collect()
}

/// The 4x4 image with a bright horizontal line through row 2.
pub fn bright_line() -> Vec<u8> {
    gray_rows(4, &[100, 100, 200, 100])
}

/// CMYK image where every channel of a row carries the same value.
pub fn cmyk_rows(width: usize, rows: &[u8]) -> Vec<u8> {
    rows.iter().flat_map(|v| vec![*v; width * 4]).collect()
}

/// Geometry arguments for `engrave run`.
pub fn geometry(width: u32, height: u32) -> Vec<String> {
    vec![
        "-w".to_string(),
        width.to_string(),
        "-h".to_string(),
        height.to_string(),
        "-x".to_string(),
        DPI.to_string(),
        "-y".to_string(),
        DPI.to_string(),
    ]
}
