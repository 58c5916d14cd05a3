// src/recording.rs
//
// Landmark recordings on disk. One CSV row per camera frame:
//
//   t_ms,x0,y0,z0,...,x20,y20,z20
//
// A row with any of the 63 coordinate cells empty or missing is a frame where
// no hand was visible. Columns past the last coordinate are ignored.
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use csv::{ReaderBuilder, StringRecord, Writer};

use crate::error::RecordingError;
use crate::landmarks::{LandmarkFrame, LANDMARK_COUNT};

const COORD_COLUMNS: usize = LANDMARK_COUNT * 3;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub offset: Duration,
    pub frame: Option<LandmarkFrame>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkRecording {
    frames: Vec<RecordedFrame>,
}

impl LandmarkRecording {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Offsets are expected in order; callers building recordings in code
    /// are trusted, only files are checked.
    pub fn push(&mut self, offset: Duration, frame: Option<LandmarkFrame>) {
        self.frames.push(RecordedFrame { offset, frame });
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn duration(&self) -> Duration {
        self.frames.last().map(|f| f.offset).unwrap_or_default()
    }

    pub fn hand_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.frame.is_some()).count()
    }

    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self, RecordingError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RecordingError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut recording = Self::new();
        let mut last = Duration::ZERO;

        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let offset = parse_offset(&record, line)?;
            if offset < last {
                return Err(RecordingError::OutOfOrder { line });
            }
            last = offset;

            let frame = parse_frame(&record, line)?;
            recording.push(offset, frame);
        }

        Ok(recording)
    }

    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<(), RecordingError> {
        let file = File::create(path.as_ref())?;
        self.to_writer(file)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), RecordingError> {
        let mut wtr = Writer::from_writer(writer);

        let mut header = vec!["t_ms".to_string()];
        for i in 0..LANDMARK_COUNT {
            header.push(format!("x{i}"));
            header.push(format!("y{i}"));
            header.push(format!("z{i}"));
        }
        wtr.write_record(&header)?;

        for rec in &self.frames {
            let mut row = Vec::with_capacity(COORD_COLUMNS + 1);
            row.push(format!("{}", rec.offset.as_nanos() as f64 / 1e6));
            match &rec.frame {
                Some(frame) => {
                    for p in frame.points() {
                        row.push(p.x.to_string());
                        row.push(p.y.to_string());
                        row.push(p.z.to_string());
                    }
                }
                None => row.extend(std::iter::repeat(String::new()).take(COORD_COLUMNS)),
            }
            wtr.write_record(&row)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

fn parse_offset(record: &StringRecord, line: u64) -> Result<Duration, RecordingError> {
    let raw = record.get(0).unwrap_or("");
    let invalid = || RecordingError::InvalidTimestamp {
        line,
        value: raw.to_string(),
    };

    let ms: f64 = raw.parse().map_err(|_| invalid())?;
    if !ms.is_finite() || ms < 0.0 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos((ms * 1e6).round() as u64))
}

fn parse_frame(
    record: &StringRecord,
    line: u64,
) -> Result<Option<LandmarkFrame>, RecordingError> {
    // coordinates live in fixed columns; any gap means no hand
    let mut values = Vec::with_capacity(COORD_COLUMNS);
    let mut complete = true;
    for column in 1..=COORD_COLUMNS {
        let cell = match record.get(column) {
            Some(cell) if !cell.is_empty() => cell,
            _ => {
                complete = false;
                continue;
            }
        };
        let v: f64 = cell.parse().map_err(|_| RecordingError::InvalidValue {
            line,
            column,
            value: cell.to_string(),
        })?;
        values.push(v);
    }

    if !complete {
        return Ok(None);
    }

    let points: Vec<[f64; 3]> = values.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
    Ok(LandmarkFrame::from_points(&points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{HandBuilder, Shape};

    #[test]
    fn reads_rows_with_and_without_hands() {
        let frame = HandBuilder::new(Shape::Palm).build();
        let mut recording = LandmarkRecording::new();
        recording.push(Duration::ZERO, Some(frame.clone()));
        recording.push(Duration::from_millis(33), None);

        let mut buf = Vec::new();
        recording.to_writer(&mut buf).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("t_ms,x0,y0,z0,"));

        let parsed = LandmarkRecording::from_reader(text.as_bytes()).expect("read");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.hand_frames(), 1);
        assert_eq!(parsed.duration(), Duration::from_millis(33));
        let back = parsed.frames()[0].frame.as_ref().expect("hand");
        assert!((back.index_tip().y - frame.index_tip().y).abs() < 1e-12);
    }

    #[test]
    fn short_rows_are_frames_without_a_hand() {
        let csv = "t_ms,x0,y0,z0\n0\n16.5,0.1,0.2,0.0\n";
        let parsed = LandmarkRecording::from_reader(csv.as_bytes()).expect("read");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.hand_frames(), 0);
        assert_eq!(parsed.frames()[1].offset, Duration::from_micros(16_500));
    }

    #[test]
    fn blank_coordinate_cell_means_no_hand_even_with_extra_columns() {
        let frame = HandBuilder::new(Shape::Palm).build();
        let mut cells = vec!["0".to_string()];
        for row in frame.to_rows() {
            cells.extend(row.iter().map(|v| v.to_string()));
        }
        cells[5] = String::new();
        cells.push("0.5".to_string());

        let csv = format!("t_ms\n{}\n", cells.join(","));
        let parsed = LandmarkRecording::from_reader(csv.as_bytes()).expect("read");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.hand_frames(), 0);
    }

    #[test]
    fn trailing_columns_do_not_shift_coordinates() {
        let frame = HandBuilder::new(Shape::Point).build();
        let mut cells = vec!["0".to_string()];
        for row in frame.to_rows() {
            cells.extend(row.iter().map(|v| v.to_string()));
        }
        cells.push("note".to_string());

        let csv = format!("t_ms\n{}\n", cells.join(","));
        let parsed = LandmarkRecording::from_reader(csv.as_bytes()).expect("read");
        let back = parsed.frames()[0].frame.as_ref().expect("hand");
        assert_eq!(back.index_tip(), frame.index_tip());
    }

    #[test]
    fn rejects_bad_timestamps_and_values() {
        let bad_ts = "t_ms\n-5\n";
        assert!(matches!(
            LandmarkRecording::from_reader(bad_ts.as_bytes()),
            Err(RecordingError::InvalidTimestamp { .. })
        ));

        let backwards = "t_ms\n10\n5\n";
        assert!(matches!(
            LandmarkRecording::from_reader(backwards.as_bytes()),
            Err(RecordingError::OutOfOrder { .. })
        ));

        let bad_value = "t_ms,x0\n0,abc\n";
        assert!(matches!(
            LandmarkRecording::from_reader(bad_value.as_bytes()),
            Err(RecordingError::InvalidValue { column: 1, .. })
        ));
    }

    #[test]
    fn saves_and_loads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("take.csv");

        let mut recording = LandmarkRecording::new();
        recording.push(Duration::ZERO, Some(HandBuilder::new(Shape::Fist).build()));
        recording.save_csv(&path).expect("save");

        let loaded = LandmarkRecording::load_csv(&path).expect("load");
        assert_eq!(loaded.hand_frames(), 1);
    }
}
