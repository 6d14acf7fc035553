//! G-code motion reader.
//!
//! Interprets the linear motion subset of a G-code program: G0 travels
//! break the current path, G1 feeds extend it. The cut polylines become
//! one path def with a colorless item, and the last-seen F/S words form
//! a single pass so the downstream machine program keeps the source's
//! feedrate and intensity.

use std::sync::OnceLock;

use jobkit_core::{Def, Item, JobDocument, Pass, Polyline};
use regex::Regex;

use crate::error::{ImportError, ImportResult};

/// Reads one G-code program per call.
#[derive(Debug, Default)]
pub struct GcodeReader;

impl GcodeReader {
    pub fn new() -> Self {
        Self
    }

    /// Parses a G-code program into a job document.
    pub fn parse(&self, text: &str) -> ImportResult<JobDocument> {
        static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
        static COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
        let words = WORD_REGEX.get_or_init(|| {
            Regex::new(r"(?i)([GXYFS])\s*(-?[0-9]+\.?[0-9]*)").expect("invalid regex pattern")
        });
        let comments =
            COMMENT_REGEX.get_or_init(|| Regex::new(r"\([^)]*\)|;.*").expect("invalid regex pattern"));

        let mut paths: Vec<Polyline> = Vec::new();
        let mut current: Polyline = Vec::new();
        let mut position = [0.0_f64, 0.0];
        // Modal motion mode: persists across lines until changed.
        let mut motion: Option<u32> = None;
        let mut saw_motion_word = false;
        let mut feedrate: Option<String> = None;
        let mut intensity: Option<String> = None;

        for line in text.lines() {
            let line = comments.replace_all(line, "");
            let mut target = position;
            let mut moved = false;
            for caps in words.captures_iter(&line) {
                let letter = caps[1].to_ascii_uppercase();
                let value = &caps[2];
                match letter.as_str() {
                    "G" => {
                        if let Ok(code) = value.parse::<f64>() {
                            let code = code as u32;
                            if code == 0 || code == 1 {
                                motion = Some(code);
                                saw_motion_word = true;
                            }
                        }
                    }
                    "X" => {
                        if let Ok(x) = value.parse::<f64>() {
                            target[0] = x;
                            moved = true;
                        }
                    }
                    "Y" => {
                        if let Ok(y) = value.parse::<f64>() {
                            target[1] = y;
                            moved = true;
                        }
                    }
                    "F" => feedrate = Some(value.to_string()),
                    "S" => intensity = Some(value.to_string()),
                    _ => {}
                }
            }

            if moved {
                match motion {
                    Some(0) => {
                        // Travel: seal the path cut so far and restart
                        // at the new position.
                        flush(&mut paths, &mut current);
                        current.push(target);
                    }
                    Some(1) => {
                        if current.is_empty() {
                            current.push(position);
                        }
                        current.push(target);
                    }
                    _ => {}
                }
                position = target;
            }
        }
        flush(&mut paths, &mut current);

        if !saw_motion_word {
            return Err(ImportError::Gcode("no motion commands found".into()));
        }

        let mut job = JobDocument::new();
        if !paths.is_empty() {
            let def = job.add_def(Def::Path { data: paths });
            let item = job.add_item(Item { def, color: None });
            if feedrate.is_some() || intensity.is_some() {
                job.passes.push(Pass {
                    items: vec![item],
                    feedrate: feedrate.unwrap_or_default(),
                    intensity: intensity.unwrap_or_default(),
                });
            }
        }
        Ok(job)
    }
}

fn flush(paths: &mut Vec<Polyline>, current: &mut Polyline) {
    if current.len() > 1 {
        paths.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_moves_form_one_polyline() {
        let job = GcodeReader::new()
            .parse("G0 X0 Y0\nG1 X10 Y0\nG1 X10 Y10\n")
            .unwrap();
        assert_eq!(job.defs.len(), 1);
        let Def::Path { data } = &job.defs[0] else {
            panic!("expected a path def");
        };
        assert_eq!(data, &vec![vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]]]);
        assert_eq!(job.items.len(), 1);
        assert_eq!(job.items[0].color, None);
    }

    #[test]
    fn travel_moves_split_polylines() {
        let job = GcodeReader::new()
            .parse("G0 X0 Y0\nG1 X5 Y0\nG0 X20 Y20\nG1 X25 Y20\n")
            .unwrap();
        let Def::Path { data } = &job.defs[0] else {
            panic!("expected a path def");
        };
        assert_eq!(data.len(), 2);
        assert_eq!(data[0], vec![[0.0, 0.0], [5.0, 0.0]]);
        assert_eq!(data[1], vec![[20.0, 20.0], [25.0, 20.0]]);
    }

    #[test]
    fn motion_mode_is_modal_across_lines() {
        let job = GcodeReader::new()
            .parse("G1 X1 Y0\nX2\nY3\n")
            .unwrap();
        let Def::Path { data } = &job.defs[0] else {
            panic!("expected a path def");
        };
        assert_eq!(
            data[0],
            vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [2.0, 3.0]]
        );
    }

    #[test]
    fn feedrate_and_intensity_carry_into_a_pass() {
        let job = GcodeReader::new()
            .parse("G1 X5 Y5 F1500 S80\n")
            .unwrap();
        assert_eq!(job.passes.len(), 1);
        assert_eq!(job.passes[0].feedrate, "1500");
        assert_eq!(job.passes[0].intensity, "80");
        assert_eq!(job.passes[0].items, vec![0]);
        assert!(job.validate().is_ok());
    }

    #[test]
    fn comments_are_stripped() {
        let job = GcodeReader::new()
            .parse("G1 X1 Y1 ; move (with comment)\n(full line comment G1 X99)\n")
            .unwrap();
        let Def::Path { data } = &job.defs[0] else {
            panic!("expected a path def");
        };
        assert_eq!(data[0], vec![[0.0, 0.0], [1.0, 1.0]]);
    }

    #[test]
    fn lowercase_words_parse_too() {
        let job = GcodeReader::new().parse("g1 x3 y4\n").unwrap();
        assert_eq!(job.defs.len(), 1);
    }

    #[test]
    fn program_without_motion_is_an_error() {
        let err = GcodeReader::new().parse("M3 S255\nM5\n");
        assert!(matches!(err, Err(ImportError::Gcode(_))));
    }
}
