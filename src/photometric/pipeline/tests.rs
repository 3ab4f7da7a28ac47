use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::photometric::common::error::{PhotometricError, Result};
use crate::photometric::field::{IntensityField, NormalMap};
use crate::photometric::io::{IntensityReader, NormalMapFormat, NormalMapWriter, TiffCompression, WriteOptions};
use crate::photometric::pipeline::{INPUT_NAMES, NormalMapPipeline, PipelineConfig, calibrate_files};
use crate::photometric::reconstruct::SENTINEL_COLOR;
use crate::photometric::solver::CalibrationMatrix;

/// Serves fields by file name instead of touching the disk.
struct MockReader {
    should_fail: bool,
    fields: HashMap<String, IntensityField>,
}

impl MockReader {
    fn with_inputs(fields: [IntensityField; 3]) -> Self {
        let fields = INPUT_NAMES
            .iter()
            .zip(fields)
            .map(|(name, field)| (name.to_string(), field))
            .collect();
        Self { should_fail: false, fields }
    }
}

impl IntensityReader for MockReader {
    fn read_gray(&self, _data: &[u8]) -> Result<IntensityField> {
        Err(PhotometricError::LoadError("Mock reader only serves files".to_string()))
    }

    fn read_gray_file(&self, path: &Path) -> Result<IntensityField> {
        if self.should_fail {
            return Err(PhotometricError::LoadError("Mock decode error".to_string()));
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        self.fields
            .get(name)
            .cloned()
            .ok_or_else(|| PhotometricError::LoadError(format!("{name} not found")))
    }
}

struct MockWriter {
    should_fail: bool,
    written: Arc<Mutex<Vec<NormalMap>>>,
}

impl NormalMapWriter for MockWriter {
    fn write_normal_map(&self, map: &NormalMap, output: &mut dyn Write, _options: &WriteOptions) -> Result<()> {
        if self.should_fail {
            return Err(PhotometricError::EncodeError("Mock encode error".to_string()));
        }
        output.write_all(b"mock")?;
        self.written.lock().unwrap().push(map.clone());
        Ok(())
    }

    fn write_field(&self, _field: &IntensityField, _output: &mut dyn Write, _options: &WriteOptions) -> Result<()> {
        unreachable!("pipeline never writes plain fields")
    }
}

fn writer(should_fail: bool) -> (MockWriter, Arc<Mutex<Vec<NormalMap>>>) {
    let written = Arc::new(Mutex::new(Vec::new()));
    (MockWriter { should_fail, written: written.clone() }, written)
}

fn uniform_inputs(width: usize, height: usize, value: u8) -> [IntensityField; 3] {
    [
        IntensityField::filled(width, height, value),
        IntensityField::filled(width, height, value),
        IntensityField::filled(width, height, value),
    ]
}

fn seeded_config() -> PipelineConfig {
    PipelineConfig::builder()
        .threshold(100)
        .iterations(20)
        .search_levels(1)
        .seed(Some(99))
        .initial(Some(CalibrationMatrix::identity()))
        .build()
}

#[test]
fn test_config_builder() {
    let config = PipelineConfig::builder()
        .threshold(40)
        .iterations(500)
        .search_levels(2)
        .format(NormalMapFormat::Tiff)
        .compression(TiffCompression::Lzw)
        .predictor(true)
        .build();

    assert_eq!(config.threshold, 40);
    assert_eq!(config.iterations, 500);
    assert_eq!(config.search_levels, 2);
    assert_eq!(config.seed, None);
    assert!(matches!(config.output.compression, TiffCompression::Lzw));
    assert!(config.output.predictor);
    assert_eq!(config.output_file_name(), "normal_40_500.tiff");

    let search = config.search_config();
    assert_eq!(search.iterations, 500);
}

#[test]
fn test_default_output_name_is_jpeg() {
    let config = PipelineConfig::builder().threshold(7).iterations(3).build();
    assert_eq!(config.output_file_name(), "normal_7_3.jpg");
}

#[test]
fn test_successful_conversion_reconstructs_full_resolution() {
    let [a, b, c] = uniform_inputs(8, 6, 200);
    let (writer, written) = writer(false);
    let pipeline = NormalMapPipeline::with_custom(MockReader::with_inputs(uniform_inputs(1, 1, 0)), writer, seeded_config());

    let mut output = Cursor::new(Vec::new());
    let report = pipeline.process_to_writer(&a, &b, &c, &mut output).unwrap();

    assert_eq!((report.width, report.height), (8, 6));
    assert_eq!(report.valid_pixels, 48);
    assert_eq!(report.iterations_run, 20);
    assert_eq!(written.lock().unwrap().len(), 1);
    assert_eq!(output.into_inner(), b"mock");
    assert!(report.timings.get_step("search").is_some());
}

#[test]
fn test_shadowed_scene_writes_sentinel_map() {
    let [a, b, c] = uniform_inputs(4, 4, 50);
    let (writer, written) = writer(false);
    let pipeline = NormalMapPipeline::with_custom(MockReader::with_inputs(uniform_inputs(1, 1, 0)), writer, seeded_config());

    let report = pipeline.process_to_writer(&a, &b, &c, &mut Cursor::new(Vec::new())).unwrap();

    assert_eq!(report.valid_pixels, 0);
    assert_eq!(report.iterations_run, 0);
    let maps = written.lock().unwrap();
    assert!(maps[0].pixels().iter().all(|&p| p == SENTINEL_COLOR));
}

#[test]
fn test_shadowed_scene_with_singular_seed_still_writes_sentinel_map() {
    let [a, b, c] = uniform_inputs(4, 4, 50);
    let (writer, written) = writer(false);
    let mut config = seeded_config();
    config.initial = Some(CalibrationMatrix::new([[0, 0, 0], [0, 10, 0], [0, 0, 10]]).unwrap());
    config.iterations = 500;
    let pipeline = NormalMapPipeline::with_custom(MockReader::with_inputs(uniform_inputs(1, 1, 0)), writer, config);

    let report = pipeline.process_to_writer(&a, &b, &c, &mut Cursor::new(Vec::new())).unwrap();

    assert!(report.iterations_run > 0 && report.iterations_run < 500);
    assert_eq!(report.search_cost, 0);
    assert!(report.best_matrix.to_light_matrix().invert().is_ok());
    let maps = written.lock().unwrap();
    assert!(maps[0].pixels().iter().all(|&p| p == SENTINEL_COLOR));
}

#[test]
fn test_no_invertible_calibration_is_reported() {
    let [a, b, c] = uniform_inputs(4, 4, 200);
    let (writer, written) = writer(false);
    let mut config = seeded_config();
    config.initial = Some(CalibrationMatrix::new([[0, 0, 0], [0, 10, 0], [0, 0, 10]]).unwrap());
    config.iterations = 0;
    let pipeline = NormalMapPipeline::with_custom(MockReader::with_inputs(uniform_inputs(1, 1, 0)), writer, config);

    let result = pipeline.process_to_writer(&a, &b, &c, &mut Cursor::new(Vec::new()));

    assert!(matches!(result, Err(PhotometricError::NoInvertibleCalibration { iterations: 0 })));
    assert!(written.lock().unwrap().is_empty());
}

#[test]
fn test_dimension_mismatch_fails_before_search() {
    let a = IntensityField::filled(8, 8, 200);
    let b = IntensityField::filled(8, 7, 200);
    let (writer, written) = writer(false);
    let pipeline = NormalMapPipeline::with_custom(MockReader::with_inputs(uniform_inputs(1, 1, 0)), writer, seeded_config());

    let result = pipeline.process_to_writer(&a, &a, &b, &mut Cursor::new(Vec::new()));

    assert!(matches!(result, Err(PhotometricError::DimensionMismatch { .. })));
    assert!(written.lock().unwrap().is_empty());
}

#[test]
fn test_reader_failure() {
    let dir = tempfile::tempdir().unwrap();
    let reader = MockReader { should_fail: true, fields: HashMap::new() };
    let (writer, written) = writer(false);
    let pipeline = NormalMapPipeline::with_custom(reader, writer, seeded_config());

    let result = pipeline.run_folder(dir.path());

    assert!(matches!(result, Err(PhotometricError::LoadError(_))));
    assert!(written.lock().unwrap().is_empty());
}

#[test]
fn test_writer_failure() {
    let dir = tempfile::tempdir().unwrap();
    let (writer, _) = writer(true);
    let pipeline = NormalMapPipeline::with_custom(MockReader::with_inputs(uniform_inputs(4, 4, 200)), writer, seeded_config());

    let result = pipeline.run_folder(dir.path());

    assert!(matches!(result, Err(PhotometricError::EncodeError(_))));
}

#[test]
fn test_run_folder_names_output_by_convention() {
    let dir = tempfile::tempdir().unwrap();
    let (writer, written) = writer(false);
    let pipeline = NormalMapPipeline::with_custom(MockReader::with_inputs(uniform_inputs(4, 4, 200)), writer, seeded_config());

    let report = pipeline.run_folder(dir.path()).unwrap();

    let expected = dir.path().join("normal_100_20.jpg");
    assert_eq!(report.output_path.as_deref(), Some(expected.as_path()));
    assert_eq!(std::fs::read(&expected).unwrap(), b"mock");
    assert_eq!(written.lock().unwrap().len(), 1);
}

#[test]
fn test_calibrate_files_with_mock_reader() {
    let sphere = IntensityField::from_fn(60, 60, |r, c| {
        let (dr, dc) = (r as i64 - 30, c as i64 - 30);
        if dr * dr + dc * dc <= 16 * 16 { 180 } else { 20 }
    });
    let highlight = |row: usize, col: usize| {
        let mut field = IntensityField::filled(60, 60, 10);
        field.set(row, col, 240);
        field
    };

    let mut fields = HashMap::new();
    fields.insert("sphere.jpg".to_string(), sphere);
    fields.insert("a.jpg".to_string(), highlight(32, 30));
    fields.insert("b.jpg".to_string(), highlight(30, 33));
    fields.insert("c.jpg".to_string(), highlight(30, 30));
    let reader = MockReader { should_fail: false, fields };

    let calibration = calibrate_files(
        &reader,
        Path::new("sphere.jpg"),
        [Path::new("a.jpg"), Path::new("b.jpg"), Path::new("c.jpg")],
        100,
    )
    .unwrap();

    assert_eq!((calibration.centroid.row, calibration.centroid.col), (30, 30));
    // box extent 32 -> radius 8
    assert_eq!(calibration.centroid.radius, 8);
    let rows = calibration.lights.rows();
    assert!(rows[0][0] > 0.0 && rows[0][1] == 0.0 && rows[0][2] > 0.0);
    assert!(rows[1][1] > 0.0 && rows[1][0] == 0.0);
    assert_eq!(rows[2], [0.0, 0.0, 240.0]);
}

#[test]
fn test_calibrate_files_empty_mask() {
    let mut fields = HashMap::new();
    fields.insert("sphere.jpg".to_string(), IntensityField::filled(10, 10, 50));
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        fields.insert(name.to_string(), IntensityField::filled(10, 10, 200));
    }
    let reader = MockReader { should_fail: false, fields };

    let result = calibrate_files(
        &reader,
        Path::new("sphere.jpg"),
        [Path::new("a.jpg"), Path::new("b.jpg"), Path::new("c.jpg")],
        100,
    );
    assert!(matches!(result, Err(PhotometricError::EmptyMask)));
}
