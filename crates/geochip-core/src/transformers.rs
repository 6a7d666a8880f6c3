//! Stock raster transformers.

use crate::{Chip, Pixel, RasterError, RasterTransformer};
use std::collections::BTreeMap;

/// Remaps class ids in label chips; ids without a mapping pass through.
#[derive(Clone, Debug)]
pub struct ReclassTransformer {
    lut: [u8; 256],
}

impl ReclassTransformer {
    pub fn new(mapping: &BTreeMap<u8, u8>) -> Self {
        let mut lut = [0u8; 256];
        for (i, v) in lut.iter_mut().enumerate() {
            *v = i as u8;
        }
        for (&from, &to) in mapping {
            lut[from as usize] = to;
        }
        Self { lut }
    }
}

impl RasterTransformer<u8> for ReclassTransformer {
    fn name(&self) -> &str {
        "reclass"
    }

    fn transform(&self, mut chip: Chip<u8>, _: &[usize]) -> Result<Chip<u8>, RasterError> {
        for v in chip.data_mut() {
            *v = self.lut[*v as usize];
        }
        Ok(chip)
    }
}

/// Replaces a nodata value with another value in every channel.
#[derive(Clone, Copy, Debug)]
pub struct NodataTransformer<T> {
    pub nodata: T,
    pub replacement: T,
}

impl<T: Pixel> RasterTransformer<T> for NodataTransformer<T> {
    fn name(&self) -> &str {
        "nodata"
    }

    fn transform(&self, mut chip: Chip<T>, _: &[usize]) -> Result<Chip<T>, RasterError> {
        for v in chip.data_mut() {
            if *v == self.nodata {
                *v = self.replacement;
            }
        }
        Ok(chip)
    }
}

/// Replaces NaN in float chips.
#[derive(Clone, Copy, Debug, Default)]
pub struct NanTransformer {
    pub replacement: f32,
}

impl RasterTransformer<f32> for NanTransformer {
    fn name(&self) -> &str {
        "nan"
    }

    fn transform(&self, mut chip: Chip<f32>, _: &[usize]) -> Result<Chip<f32>, RasterError> {
        for v in chip.data_mut() {
            if v.is_nan() {
                *v = self.replacement;
            }
        }
        Ok(chip)
    }
}
