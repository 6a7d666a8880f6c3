use crate::RasterError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel datatype tag reported by a raster source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Uint8,
    Uint16,
    Int16,
    Uint32,
    Int32,
    Float32,
    Float64,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Uint8 => "uint8",
            DataType::Uint16 => "uint16",
            DataType::Int16 => "int16",
            DataType::Uint32 => "uint32",
            DataType::Int32 => "int32",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
        };
        f.write_str(s)
    }
}

/// Scalar stored in a [`Chip`].
pub trait Pixel: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    const DTYPE: DataType;
}

macro_rules! impl_pixel {
    ($($t:ty => $d:ident),* $(,)?) => {
        $(impl Pixel for $t {
            const DTYPE: DataType = DataType::$d;
        })*
    };
}

impl_pixel!(
    u8 => Uint8,
    u16 => Uint16,
    i16 => Int16,
    u32 => Uint32,
    i32 => Int32,
    f32 => Float32,
    f64 => Float64,
);

/// Pixel array of shape `[height, width, channels]`.
///
/// Row-major with interleaved channels: the value of channel `c` at
/// `(row, col)` lives at `(row * width + col) * channels + c`.
#[derive(Clone, Debug, PartialEq)]
pub struct Chip<T> {
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<T>,
}

impl<T: Pixel> Chip<T> {
    /// Chip with every value set to `value`.
    pub fn filled(height: usize, width: usize, channels: usize, value: T) -> Self {
        Self {
            height,
            width,
            channels,
            data: vec![value; height * width * channels],
        }
    }

    pub fn zeros(height: usize, width: usize, channels: usize) -> Self {
        Self::filled(height, width, channels, T::default())
    }

    /// Wrap an interleaved buffer, checking its length against the shape.
    pub fn from_vec(
        height: usize,
        width: usize,
        channels: usize,
        data: Vec<T>,
    ) -> Result<Self, RasterError> {
        let expected = height * width * channels;
        if data.len() != expected {
            return Err(RasterError::BufferLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            height,
            width,
            channels,
            data,
        })
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `(height, width, channels)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    #[inline]
    fn offset(&self, row: usize, col: usize, channel: usize) -> usize {
        (row * self.width + col) * self.channels + channel
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize, channel: usize) -> Option<T> {
        if row >= self.height || col >= self.width || channel >= self.channels {
            return None;
        }
        Some(self.data[self.offset(row, col, channel)])
    }

    /// Write one value and return the one it replaced; out of range is a
    /// no-op returning `None`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, channel: usize, value: T) -> Option<T> {
        if row >= self.height || col >= self.width || channel >= self.channels {
            return None;
        }
        let idx = self.offset(row, col, channel);
        Some(std::mem::replace(&mut self.data[idx], value))
    }

    /// New chip holding only `order`'s channels, in that order.
    pub fn select_channels(&self, order: &[usize]) -> Result<Self, RasterError> {
        if let Some(&bad) = order.iter().find(|&&c| c >= self.channels) {
            return Err(RasterError::ChannelOutOfRange {
                channel: bad,
                available: self.channels,
            });
        }
        let identity = order.len() == self.channels && order.iter().enumerate().all(|(i, &c)| i == c);
        if identity {
            return Ok(self.clone());
        }
        let mut data = Vec::with_capacity(self.height * self.width * order.len());
        for px in self.data.chunks_exact(self.channels.max(1)) {
            data.extend(order.iter().map(|&c| px[c]));
        }
        Ok(Self {
            height: self.height,
            width: self.width,
            channels: order.len(),
            data,
        })
    }

    /// Number of values equal to `value` across all channels.
    pub fn count_eq(&self, value: T) -> usize {
        self.data.iter().filter(|&&v| v == value).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_checks_length() {
        assert!(Chip::<u8>::from_vec(2, 2, 3, vec![0; 11]).is_err());
        let chip = Chip::<u8>::from_vec(2, 2, 1, vec![1, 2, 3, 4]).expect("chip");
        assert_eq!(chip.get(1, 0, 0), Some(3));
        assert_eq!(chip.get(2, 0, 0), None);
    }

    #[test]
    fn set_returns_previous_value_and_ignores_out_of_range() {
        let mut chip = Chip::<u8>::zeros(2, 3, 2);
        assert_eq!(chip.set(1, 2, 1, 9), Some(0));
        assert_eq!(chip.set(1, 2, 1, 4), Some(9));
        assert_eq!(chip.get(1, 2, 1), Some(4));
        assert_eq!(chip.set(2, 0, 0, 1), None);
        assert_eq!(chip.set(0, 3, 0, 1), None);
        assert_eq!(chip.set(0, 0, 2, 1), None);
        assert_eq!(chip.count_eq(0), 11);
    }

    #[test]
    fn select_channels_reorders_and_drops() {
        // 1x2 pixels, 3 channels
        let chip = Chip::<u16>::from_vec(1, 2, 3, vec![1, 2, 3, 4, 5, 6]).expect("chip");
        let sel = chip.select_channels(&[2, 0]).expect("select");
        assert_eq!(sel.shape(), (1, 2, 2));
        assert_eq!(sel.data(), &[3, 1, 6, 4]);
    }

    #[test]
    fn select_channels_rejects_missing_channel() {
        let chip = Chip::<u8>::zeros(2, 2, 1);
        let err = chip.select_channels(&[0, 1]).unwrap_err();
        assert!(matches!(
            err,
            RasterError::ChannelOutOfRange {
                channel: 1,
                available: 1
            }
        ));
    }

    #[test]
    fn dtype_tags() {
        assert_eq!(<u8 as Pixel>::DTYPE, DataType::Uint8);
        assert_eq!(<f32 as Pixel>::DTYPE.to_string(), "float32");
    }
}
