use std::io::Write;

use crate::photometric::common::error::Result;
use crate::photometric::field::{IntensityField, NormalMap};
use crate::photometric::io::types::WriteOptions;

pub trait NormalMapWriter {
    fn write_normal_map(&self, map: &NormalMap, output: &mut dyn Write, options: &WriteOptions) -> Result<()>;
    fn write_field(&self, field: &IntensityField, output: &mut dyn Write, options: &WriteOptions) -> Result<()>;
}
