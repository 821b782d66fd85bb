//! Replay of detections recorded by an external face/eye detector
//!
//! The trace is JSON Lines, one record per frame:
//!
//! ```text
//! {"faces":[{"x":120,"y":80,"width":200,"height":220,"eyes":[{"x":30,"y":40,"width":50,"height":12}]}]}
//! ```
//!
//! Eye boxes are relative to the upper half of their face.

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::rc::Rc;

use camera_capture::{GrayFrame, Region};
use dms::{DetectorError, EyeDetector, FaceDetector};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Failed to read detection trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed detection record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Detection trace is empty")]
    Empty,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FaceRecord {
    #[serde(flatten)]
    bbox: Region,
    #[serde(default)]
    eyes: Vec<Region>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FrameRecord {
    #[serde(default)]
    faces: Vec<FaceRecord>,
}

#[derive(Debug)]
struct Cursor {
    records: Vec<FrameRecord>,
    next: usize,
    looped: bool,
    /// Eyes of the primary face of the record last handed out
    current_eyes: Vec<Region>,
}

/// Detection trace, split into the two detector halves by [`TraceDetector::split`]
#[derive(Debug)]
pub struct TraceDetector {
    cursor: Cursor,
}

impl TraceDetector {
    pub fn open(path: &Path, looped: bool) -> Result<Self, TraceError> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|source| TraceError::Parse {
                line: index + 1,
                source,
            })?;
            records.push(record);
        }

        if records.is_empty() {
            return Err(TraceError::Empty);
        }
        info!("Loaded {} detection records from {}", records.len(), path.display());

        Ok(Self {
            cursor: Cursor {
                records,
                next: 0,
                looped,
                current_eyes: Vec::new(),
            },
        })
    }

    pub fn split(self) -> (TraceFaces, TraceEyes) {
        let shared = Rc::new(RefCell::new(self.cursor));
        (TraceFaces(Rc::clone(&shared)), TraceEyes(shared))
    }
}

/// Face half: advances the trace by one record per frame
#[derive(Debug)]
pub struct TraceFaces(Rc<RefCell<Cursor>>);

/// Eye half: returns the eyes of the record the face half last produced
#[derive(Debug)]
pub struct TraceEyes(Rc<RefCell<Cursor>>);

impl FaceDetector for TraceFaces {
    fn detect_faces(&mut self, _image: &GrayFrame) -> Result<Vec<Region>, DetectorError> {
        let mut cursor = self.0.borrow_mut();
        if cursor.next >= cursor.records.len() {
            if !cursor.looped {
                return Err(DetectorError::Backend(format!(
                    "detection trace exhausted after {} frames",
                    cursor.records.len()
                )));
            }
            cursor.next = 0;
        }

        let record = cursor.records[cursor.next].clone();
        cursor.next += 1;
        cursor.current_eyes = record
            .faces
            .first()
            .map(|face| face.eyes.clone())
            .unwrap_or_default();

        Ok(record.faces.into_iter().map(|face| face.bbox).collect())
    }
}

impl EyeDetector for TraceEyes {
    fn detect_eyes(&mut self, _face: &GrayFrame) -> Result<Vec<Region>, DetectorError> {
        Ok(self.0.borrow().current_eyes.clone())
    }
}
