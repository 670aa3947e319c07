//! Raster output: PNG planes next to a manifest.

mod common;

use common::{fixtures, TestRun};
use pretty_assertions::assert_eq;

fn read_png(path: &std::path::Path) -> (png::OutputInfo, Vec<u8>) {
    let file = std::fs::File::open(path).unwrap();
    let mut decoder = png::Decoder::new(file);
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder.read_info().unwrap();
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).unwrap();
    buf.truncate(info.buffer_size());
    (info, buf)
}

#[test]
fn test_raster_planes_and_manifest() {
    let run = TestRun::new();
    run.write_input("line.raw", &fixtures::bright_line());
    let mut args: Vec<String> = fixtures::geometry(4, 4);
    args.extend(["-t", "raster", "line.raw"].map(String::from));
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = run.run(&args);
    common::assert_success(&output);
    common::assert_no_temporaries(&run);

    let manifest = common::app::read_text(&run.path("line.txt"));
    let files: Vec<&str> = manifest
        .lines()
        .filter(|l| !l.starts_with('#'))
        .filter_map(|l| l.split('\t').nth(3))
        .collect();
    assert_eq!(
        files,
        vec!["line.1.ct.k.png", "line.0.m.k.png", "line.0.s.k.png"]
    );

    let (tone, samples) = read_png(&run.path("line.1.ct.k.png"));
    assert_eq!((tone.width, tone.height), (4, 4));
    assert_eq!(tone.bit_depth, png::BitDepth::Eight);
    assert_eq!(samples.len(), 16);

    for plane in ["line.0.s.k.png", "line.0.m.k.png"] {
        let (info, _) = read_png(&run.path(plane));
        assert_eq!((info.width, info.height), (24, 24), "{plane}");
        assert_eq!(info.bit_depth, png::BitDepth::One, "{plane}");
    }
}

#[test]
fn test_raster_needs_an_output_file() {
    let run = TestRun::new();
    run.write_input("flat.raw", &fixtures::flat_gray(2, 2, 1));
    let mut args: Vec<String> = fixtures::geometry(2, 2);
    args.extend(["-t", "raster", "-o", "-", "flat.raw"].map(String::from));
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = run.run(&args);
    common::assert_failure(&output, "Raster output needs an output file");
}
