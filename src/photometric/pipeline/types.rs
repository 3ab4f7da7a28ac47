//! Pipeline configuration and report types

use std::path::PathBuf;

use crate::photometric::io::types::{NormalMapFormat, TiffCompression, WriteOptions};
use crate::photometric::search::SearchConfig;
use crate::photometric::solver::CalibrationMatrix;
use crate::photometric::timing::PipelineTimings;

/// Configuration for a normal-map run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Pixels at or below this intensity in any photograph are shadowed
    pub threshold: u8,
    /// Search iterations after the initial evaluation
    pub iterations: u64,
    /// Number of 2x halvings applied before searching; the final map is
    /// always reconstructed at full resolution
    pub search_levels: u32,
    /// Seed for the search; `None` uses OS entropy
    pub seed: Option<u64>,
    /// Starting matrix, e.g. rounded from a sphere calibration
    pub initial: Option<CalibrationMatrix>,
    /// Output encoding
    pub output: WriteOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: 0,
            iterations: 1000,
            search_levels: 3,
            seed: None,
            initial: None,
            output: WriteOptions::default(),
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig::builder()
            .iterations(self.iterations)
            .seed(self.seed)
            .initial(self.initial)
            .build()
    }

    /// `normal_<threshold>_<iterations>.<ext>`
    pub fn output_file_name(&self) -> String {
        format!(
            "normal_{}_{}.{}",
            self.threshold,
            self.iterations,
            self.output.format.extension()
        )
    }
}

/// Builder for PipelineConfig
#[derive(Default)]
pub struct PipelineConfigBuilder {
    threshold: Option<u8>,
    iterations: Option<u64>,
    search_levels: Option<u32>,
    seed: Option<Option<u64>>,
    initial: Option<Option<CalibrationMatrix>>,
    format: Option<NormalMapFormat>,
    compression: Option<TiffCompression>,
    predictor: Option<bool>,
}

impl PipelineConfigBuilder {
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn iterations(mut self, iterations: u64) -> Self {
        self.iterations = Some(iterations);
        self
    }

    pub fn search_levels(mut self, levels: u32) -> Self {
        self.search_levels = Some(levels);
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn initial(mut self, initial: Option<CalibrationMatrix>) -> Self {
        self.initial = Some(initial);
        self
    }

    pub fn format(mut self, format: NormalMapFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, enable: bool) -> Self {
        self.predictor = Some(enable);
        self
    }

    pub fn build(self) -> PipelineConfig {
        let default = PipelineConfig::default();
        PipelineConfig {
            threshold: self.threshold.unwrap_or(default.threshold),
            iterations: self.iterations.unwrap_or(default.iterations),
            search_levels: self.search_levels.unwrap_or(default.search_levels),
            seed: self.seed.unwrap_or(default.seed),
            initial: self.initial.unwrap_or(default.initial),
            output: WriteOptions {
                format: self.format.unwrap_or(default.output.format),
                compression: self.compression.unwrap_or(default.output.compression),
                predictor: self.predictor.unwrap_or(default.output.predictor),
            },
        }
    }
}

/// Summary of a completed normal-map run
#[derive(Debug, Clone)]
pub struct NormalMapReport {
    pub best_matrix: CalibrationMatrix,
    /// Cost of the best matrix on the downsampled search images
    pub search_cost: u64,
    pub iterations_run: u64,
    /// Accepted moves, excluding the starting matrix
    pub accepted: usize,
    pub width: usize,
    pub height: usize,
    pub valid_pixels: usize,
    /// Set when the map was written to disk
    pub output_path: Option<PathBuf>,
    pub timings: PipelineTimings,
}
