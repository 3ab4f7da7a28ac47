//! Photometric-stereo reconstruction
//!
//! Light calibration from a reference sphere, per-pixel normal solving from
//! three differently lit photographs, and a greedy local search that refines
//! an imprecise light matrix against a normal-map quality cost.

pub mod common;
pub mod field;
pub mod sphere;
pub mod solver;
pub mod reconstruct;
pub mod cost;
pub mod search;
pub mod needles;
pub mod io;
pub mod pipeline;
pub mod timing;

pub use common::{
    PhotometricError,
    Result,
};

pub use field::{
    IntensityField,
    NormalMap,
    Vector3,
    binarize,
    unit_vector,
    downsample,
};

pub use sphere::{
    SphereCalibration,
    SphereCentroid,
    calibrate_lights,
    find_centroid,
    estimate_light_vector,
};

pub use solver::{
    CalibrationMatrix,
    InverseLightMatrix,
    LightMatrix,
};

pub use reconstruct::{
    SENTINEL_COLOR,
    reconstruct,
};

pub use cost::score;

pub use search::{
    CalibrationSearch,
    Improvement,
    REJECTED_COST,
    RandomSource,
    SearchConfig,
    SearchConfigBuilder,
    SearchOutcome,
    SearchProgress,
    SeededRandom,
};

pub use needles::{
    Needle,
    compute_needles,
    render_needles,
};

pub use io::{
    ImageFileReader,
    IntensityReader,
    NormalMapFormat,
    NormalMapWriter,
    StandardNormalMapWriter,
    TiffCompression,
    WriteOptions,
};

pub use pipeline::{
    NormalMapPipeline,
    NormalMapReport,
    PipelineConfig,
    PipelineConfigBuilder,
    calibrate_files,
};

pub use timing::{PipelineTimings, StepTiming, Timer};
