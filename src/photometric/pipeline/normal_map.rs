use std::io::Write;
use std::path::Path;

use tracing::{info, instrument, warn};

use crate::photometric::{
    common::error::{PhotometricError, Result},
    field::{IntensityField, NormalMap, downsample},
    io::{ImageFileReader, IntensityReader, NormalMapWriter, StandardNormalMapWriter},
    pipeline::types::{NormalMapReport, PipelineConfig},
    reconstruct::reconstruct,
    search::{CalibrationSearch, SearchOutcome},
    timing::PipelineTimings,
};

/// Photographs expected in an input folder, in light order.
pub const INPUT_NAMES: [&str; 3] = ["final_1.jpg", "final_2.jpg", "final_3.jpg"];

pub struct NormalMapPipeline<R: IntensityReader, W: NormalMapWriter> {
    reader: R,
    writer: W,
    config: PipelineConfig,
}

impl NormalMapPipeline<ImageFileReader, StandardNormalMapWriter> {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            reader: ImageFileReader,
            writer: StandardNormalMapWriter,
            config,
        }
    }
}

impl<R: IntensityReader, W: NormalMapWriter> NormalMapPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: PipelineConfig) -> Self {
        Self {
            reader,
            writer,
            config,
        }
    }

    /// Searches on downsampled copies of the photographs, then reconstructs
    /// the full-resolution map with the best matrix found.
    #[instrument(skip_all, fields(threshold = self.config.threshold, iterations = self.config.iterations))]
    pub fn process(
        &self,
        a: &IntensityField,
        b: &IntensityField,
        c: &IntensityField,
        timings: &mut PipelineTimings,
    ) -> Result<(NormalMap, SearchOutcome)> {
        a.ensure_same_dimensions(b)?;
        a.ensure_same_dimensions(c)?;

        let levels = self.config.search_levels;
        let [sa, sb, sc] = timings.measure("downsample", || {
            let _span = tracing::info_span!("downsample", levels).entered();
            [downsample(a, levels), downsample(b, levels), downsample(c, levels)]
        });
        info!(
            width = sa.width(),
            height = sa.height(),
            "Searching on downsampled images"
        );

        let outcome = timings.measure("search", || -> Result<SearchOutcome> {
            let _span = tracing::info_span!("search").entered();
            let search = CalibrationSearch::new(&sa, &sb, &sc, self.config.threshold)?;
            Ok(search.run(&self.config.search_config()))
        })?;

        if !outcome.found_invertible() {
            warn!("No invertible calibration found; cannot reconstruct");
            return Err(PhotometricError::NoInvertibleCalibration { iterations: outcome.iterations_run });
        }
        info!(matrix = %outcome.best_matrix, cost = outcome.best_cost, "Best calibration");

        let map = timings.measure("reconstruct", || {
            let _span = tracing::info_span!("reconstruct", width = a.width(), height = a.height()).entered();
            reconstruct(a, b, c, self.config.threshold, &outcome.best_matrix.to_light_matrix())
        })?;

        Ok((map, outcome))
    }

    /// Full in-memory run writing the encoded map to `output`.
    pub fn process_to_writer(
        &self,
        a: &IntensityField,
        b: &IntensityField,
        c: &IntensityField,
        output: &mut dyn Write,
    ) -> Result<NormalMapReport> {
        let mut timings = PipelineTimings::new();
        let (map, outcome) = self.process(a, b, c, &mut timings)?;

        timings.measure("encode", || {
            let _span = tracing::info_span!("encode", format = ?self.config.output.format).entered();
            self.writer.write_normal_map(&map, output, &self.config.output)
        })?;

        Ok(Self::report(&map, &outcome, timings))
    }

    pub fn load_inputs(&self, folder: &Path, timings: &mut PipelineTimings) -> Result<[IntensityField; 3]> {
        timings.measure("load", || -> Result<[IntensityField; 3]> {
            let _span = tracing::info_span!("load_inputs").entered();
            let [a, b, c] = INPUT_NAMES.map(|name| self.reader.read_gray_file(&folder.join(name)));
            Ok([a?, b?, c?])
        })
    }

    /// Reads `final_{1,2,3}.jpg` from `folder` and writes
    /// `normal_<threshold>_<iterations>.<ext>` next to them.
    #[instrument(skip(self, folder), fields(folder = %folder.as_ref().display()))]
    pub fn run_folder<P: AsRef<Path>>(&self, folder: P) -> Result<NormalMapReport> {
        let folder = folder.as_ref();
        let mut timings = PipelineTimings::new();

        let [a, b, c] = self.load_inputs(folder, &mut timings)?;
        info!(width = a.width(), height = a.height(), "Inputs loaded");

        let (map, outcome) = self.process(&a, &b, &c, &mut timings)?;

        let output_path = folder.join(self.config.output_file_name());
        timings.measure("write", || -> Result<()> {
            let _span = tracing::info_span!("write_output").entered();
            let mut file = std::fs::File::create(&output_path).map_err(|e| {
                PhotometricError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?;
            self.writer.write_normal_map(&map, &mut file, &self.config.output)
        })?;

        info!(output = %output_path.display(), "Normal map written");
        timings.log_summary();

        let mut report = Self::report(&map, &outcome, timings);
        report.output_path = Some(output_path);
        Ok(report)
    }

    fn report(map: &NormalMap, outcome: &SearchOutcome, timings: PipelineTimings) -> NormalMapReport {
        NormalMapReport {
            best_matrix: outcome.best_matrix,
            search_cost: outcome.best_cost,
            iterations_run: outcome.iterations_run,
            accepted: outcome.improvements.len().saturating_sub(1),
            width: map.width(),
            height: map.height(),
            valid_pixels: map.valid_pixels(),
            output_path: None,
            timings,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PipelineConfig) {
        self.config = config;
    }
}
