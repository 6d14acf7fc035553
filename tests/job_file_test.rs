//! End-to-end test: convert a job file from disk, the way the CLI does.

use std::io::Write;

use jobkit::{convert, JobInput};

#[test]
fn svg_file_converts_to_a_valid_job() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\">\
         <rect width=\"40\" height=\"30\" stroke=\"#ff0000\"/></svg>"
    )
    .unwrap();

    let text = std::fs::read_to_string(file.path()).unwrap();
    let job = convert(JobInput::Text(text), true, 0.08).unwrap();
    job.validate().unwrap();
    assert_eq!(job.items.len(), 1);
    assert_eq!(job.items[0].color.as_deref(), Some("#ff0000"));

    // The wire form round-trips through the native path.
    let json = job.to_json().unwrap();
    let back = convert(JobInput::Text(json), false, 0.08).unwrap();
    assert_eq!(back, job);
}
