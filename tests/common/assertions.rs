//! Assertion helpers for tests.

use std::path::Path;

use adaptive_screen::TileShape;
use engrave::codec::ascii85;
use engrave::codec::symbolic::{decode_tile_artifact, TileRecord};
use pretty_assertions::assert_eq;

use super::app::{read_text, RunOutput, TestRun};

/// Assert the invocation exited 0.
pub fn assert_success(output: &RunOutput) {
    assert!(
        output.status.success(),
        "Expected success, got {}. Stderr: {}",
        output.status,
        output.stderr
    );
}

/// Assert the invocation failed and mentioned `needle` on stderr.
pub fn assert_failure(output: &RunOutput, needle: &str) {
    assert!(
        !output.status.success(),
        "Expected failure, got success. Stderr: {}",
        output.stderr
    );
    assert!(
        output.stderr.contains(needle),
        "Expected stderr to mention {needle:?}, got: {}",
        output.stderr
    );
}

/// Assert no temporary artifact is left behind.
pub fn assert_no_temporaries(run: &TestRun) {
    assert_eq!(run.temp_files(), Vec::<String>::new());
}

/// Assert `text` is a complete EPS document.
pub fn assert_eps(text: &str) {
    assert!(
        text.starts_with("%!PS-Adobe-3.0 EPSF-3.0\n"),
        "Not an EPS header: {:?}",
        &text[..text.len().min(40)]
    );
    assert!(text.ends_with("showpage\n%%EOF\n"), "EPS trailer missing");
}

/// Decoded records of a symbolic tile artifact.
pub fn tile_records(path: &Path) -> Vec<TileRecord> {
    decode_tile_artifact(&read_text(path))
        .unwrap_or_else(|e| panic!("Can't decode {}: {e}", path.display()))
        .records
}

/// Shapes of the tile records, in stream order.
pub fn tile_shapes(records: &[TileRecord]) -> Vec<TileShape> {
    records
        .iter()
        .filter_map(|r| match r {
            TileRecord::Tile { shape, .. } => Some(*shape),
            _ => None,
        })
        .collect()
}

/// Raw samples of a symbolic tone artifact.
pub fn tone_samples(path: &Path) -> Vec<u8> {
    let text = read_text(path);
    let start = text.find("image\n").expect("No image data in tone artifact") + "image\n".len();
    ascii85::decode(&text[start..]).expect("Bad ASCII85 in tone artifact")
}
