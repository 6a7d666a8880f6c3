//! Windowed raster access.
//!
//! A [`RasterSource`] produces a `[height, width, channels]` chip for any
//! window in pixel space. Concrete sources only implement the raw read
//! ([`RasterSource::read_window`]); channel selection and the transformer
//! chain are applied uniformly by [`RasterSource::get_chip`].

use crate::{Chip, DataType, Pixel, RasterError, Window};
use log::debug;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Pixel-space transform applied to every chip after channel selection.
///
/// Implementations must keep the spatial shape; `get_chip` rejects a
/// transformer that changes `(height, width)`.
pub trait RasterTransformer<T: Pixel>: Send + Sync {
    /// Short name used in error messages and logs.
    fn name(&self) -> &str;

    /// `channel_order` is the source's selection, i.e. which raw channel each
    /// chip channel came from.
    fn transform(&self, chip: Chip<T>, channel_order: &[usize]) -> Result<Chip<T>, RasterError>;
}

/// Provider of pixel chips for arbitrary windows.
///
/// Sources are immutable after construction and are shared across worker
/// threads; `get_chip` only takes `&self`.
pub trait RasterSource: Send + Sync {
    type Pixel: Pixel;

    /// Pixel-space extent of the scene.
    fn extent(&self) -> Window;

    /// Raw channel indices kept, in output order.
    fn channel_order(&self) -> &[usize];

    /// Channel count before selection.
    fn num_channels_raw(&self) -> usize;

    /// Transformers applied after channel selection, in order.
    fn transformers(&self) -> &[Box<dyn RasterTransformer<Self::Pixel>>];

    /// Raw read: every raw channel for `window`, shape `window.size()`.
    ///
    /// Pixels outside [`RasterSource::extent`] are defined by the implementer.
    fn read_window(&self, window: &Window) -> Result<Chip<Self::Pixel>, RasterError>;

    fn dtype(&self) -> DataType {
        <Self::Pixel as Pixel>::DTYPE
    }

    /// Channel count of chips returned by `get_chip`.
    fn num_channels(&self) -> usize {
        self.channel_order().len()
    }

    /// Raw read with its shape checked against the window; no selection, no transforms.
    fn get_raw_chip(&self, window: &Window) -> Result<Chip<Self::Pixel>, RasterError> {
        let chip = self.read_window(window)?;
        let expected = window.size();
        let got = (chip.height(), chip.width());
        if got != expected {
            return Err(RasterError::ShapeMismatch {
                transformer: "read_window".to_string(),
                expected,
                got,
            });
        }
        Ok(chip)
    }

    /// Chip for `window`: raw read, channel selection, then every transformer.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self), fields(window = %window))
    )]
    fn get_chip(&self, window: &Window) -> Result<Chip<Self::Pixel>, RasterError> {
        let raw = self.get_raw_chip(window)?;
        let mut chip = raw.select_channels(self.channel_order())?;
        let expected = window.size();
        for t in self.transformers() {
            chip = t.transform(chip, self.channel_order())?;
            let got = (chip.height(), chip.width());
            if got != expected {
                return Err(RasterError::ShapeMismatch {
                    transformer: t.name().to_string(),
                    expected,
                    got,
                });
            }
        }
        debug!(
            "read {window}: {} channel(s) of {}",
            chip.channels(),
            self.dtype()
        );
        Ok(chip)
    }
}

/// In-memory raster whose top-left pixel sits at the extent origin.
///
/// Reads outside the extent are zero-filled.
pub struct ArraySource<T: Pixel> {
    data: Chip<T>,
    extent: Window,
    channel_order: Vec<usize>,
    transformers: Vec<Box<dyn RasterTransformer<T>>>,
}

impl<T: Pixel> ArraySource<T> {
    /// Source with extent `(0, 0, width, height)` and every channel selected.
    pub fn new(data: Chip<T>) -> Result<Self, RasterError> {
        let extent = Window::from_size(data.height(), data.width())?;
        let channel_order = (0..data.channels()).collect();
        Ok(Self {
            data,
            extent,
            channel_order,
            transformers: Vec::new(),
        })
    }

    /// Move the extent so its top-left pixel is `(x, y)`.
    pub fn with_origin(mut self, x: i64, y: i64) -> Result<Self, RasterError> {
        let (h, w) = self.extent.size();
        self.extent = Window::from_size(h, w)?.translate(x, y)?;
        Ok(self)
    }

    pub fn with_channel_order(mut self, order: Vec<usize>) -> Result<Self, RasterError> {
        if let Some(&bad) = order.iter().find(|&&c| c >= self.data.channels()) {
            return Err(RasterError::ChannelOutOfRange {
                channel: bad,
                available: self.data.channels(),
            });
        }
        self.channel_order = order;
        Ok(self)
    }

    pub fn with_transformer(mut self, t: impl RasterTransformer<T> + 'static) -> Self {
        self.transformers.push(Box::new(t));
        self
    }
}

impl<T: Pixel> RasterSource for ArraySource<T> {
    type Pixel = T;

    fn extent(&self) -> Window {
        self.extent
    }

    fn channel_order(&self) -> &[usize] {
        &self.channel_order
    }

    fn num_channels_raw(&self) -> usize {
        self.data.channels()
    }

    fn transformers(&self) -> &[Box<dyn RasterTransformer<T>>] {
        &self.transformers
    }

    fn read_window(&self, window: &Window) -> Result<Chip<T>, RasterError> {
        let (h, w) = window.size();
        let channels = self.data.channels();
        let mut out = Chip::zeros(h, w, channels);
        let Some(overlap) = window.intersection(&self.extent) else {
            return Ok(out);
        };

        let row_len = overlap.width() * channels;
        for y in overlap.ymin()..overlap.ymax() {
            let src_row = y.abs_diff(self.extent.ymin()) as usize;
            let src_col = overlap.xmin().abs_diff(self.extent.xmin()) as usize;
            let dst_row = y.abs_diff(window.ymin()) as usize;
            let dst_col = overlap.xmin().abs_diff(window.xmin()) as usize;

            let src_start = (src_row * self.data.width() + src_col) * channels;
            let dst_start = (dst_row * w + dst_col) * channels;
            out.data_mut()[dst_start..dst_start + row_len]
                .copy_from_slice(&self.data.data()[src_start..src_start + row_len]);
        }
        Ok(out)
    }
}

#[cfg(feature = "image")]
impl ArraySource<u8> {
    /// Wrap an 8-bit image, keeping its native channel count (gray, gray+alpha, RGB, RGBA).
    pub fn from_dynamic_image(img: &image::DynamicImage) -> Result<Self, RasterError> {
        let (width, height) = (img.width() as usize, img.height() as usize);
        let (channels, raw) = match img.color().channel_count() {
            1 => (1, img.to_luma8().into_raw()),
            2 => (2, img.to_luma_alpha8().into_raw()),
            3 => (3, img.to_rgb8().into_raw()),
            _ => (4, img.to_rgba8().into_raw()),
        };
        Self::new(Chip::from_vec(height, width, channels, raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WindowError;

    struct Widen;

    impl RasterTransformer<u8> for Widen {
        fn name(&self) -> &str {
            "widen"
        }

        fn transform(&self, chip: Chip<u8>, _: &[usize]) -> Result<Chip<u8>, RasterError> {
            Ok(Chip::zeros(chip.height(), chip.width() + 1, chip.channels()))
        }
    }

    struct AddOne;

    impl RasterTransformer<u8> for AddOne {
        fn name(&self) -> &str {
            "add_one"
        }

        fn transform(&self, mut chip: Chip<u8>, _: &[usize]) -> Result<Chip<u8>, RasterError> {
            chip.data_mut().iter_mut().for_each(|v| *v = v.saturating_add(1));
            Ok(chip)
        }
    }

    struct Double;

    impl RasterTransformer<u8> for Double {
        fn name(&self) -> &str {
            "double"
        }

        fn transform(&self, mut chip: Chip<u8>, _: &[usize]) -> Result<Chip<u8>, RasterError> {
            chip.data_mut().iter_mut().for_each(|v| *v = v.saturating_mul(2));
            Ok(chip)
        }
    }

    fn ramp(h: usize, w: usize, c: usize) -> Chip<u8> {
        let data = (0..h * w * c).map(|v| v as u8).collect();
        Chip::from_vec(h, w, c, data).expect("chip")
    }

    #[test]
    fn window_inside_extent_is_copied() {
        let src = ArraySource::new(ramp(4, 4, 1)).expect("source");
        let chip = src
            .get_chip(&Window::new(1, 1, 3, 3).expect("window"))
            .expect("chip");
        assert_eq!(chip.data(), &[5, 6, 9, 10]);
    }

    #[test]
    fn outside_extent_is_zero_filled() {
        let src = ArraySource::new(Chip::filled(2, 2, 1, 7u8))
            .expect("source")
            .with_origin(10, 10)
            .expect("origin");
        let chip = src
            .get_chip(&Window::new(9, 9, 12, 11).expect("window"))
            .expect("chip");
        assert_eq!(chip.shape(), (2, 3, 1));
        assert_eq!(chip.data(), &[0, 0, 0, 0, 7, 7]);
    }

    #[test]
    fn origin_past_i64_range_is_rejected() {
        let src = ArraySource::new(Chip::filled(2, 2, 1, 7u8)).expect("source");
        assert!(matches!(
            src.with_origin(i64::MAX - 1, 0),
            Err(RasterError::Window(WindowError::Overflow { .. }))
        ));
        let moved = ArraySource::new(Chip::filled(2, 2, 1, 7u8))
            .expect("source")
            .with_origin(i64::MIN, -5)
            .expect("origin");
        assert_eq!(
            moved.extent(),
            Window::new(i64::MIN, -5, i64::MIN + 2, -3).expect("window")
        );
    }

    #[test]
    fn channel_order_applies_before_transformers() {
        let src = ArraySource::new(ramp(1, 1, 3))
            .expect("source")
            .with_channel_order(vec![2, 1])
            .expect("order")
            .with_transformer(AddOne)
            .with_transformer(Double);
        let chip = src
            .get_chip(&Window::new(0, 0, 1, 1).expect("window"))
            .expect("chip");
        assert_eq!(src.num_channels(), 2);
        // (2 + 1) * 2, (1 + 1) * 2
        assert_eq!(chip.data(), &[6, 4]);
    }

    #[test]
    fn transformer_changing_shape_is_rejected() {
        let src = ArraySource::new(ramp(2, 2, 1))
            .expect("source")
            .with_transformer(Widen);
        let err = src
            .get_chip(&Window::new(0, 0, 2, 2).expect("window"))
            .unwrap_err();
        match err {
            RasterError::ShapeMismatch {
                transformer,
                expected,
                got,
            } => {
                assert_eq!(transformer, "widen");
                assert_eq!(expected, (2, 2));
                assert_eq!(got, (2, 3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_channel_order_is_rejected() {
        assert!(ArraySource::new(ramp(1, 1, 2))
            .expect("source")
            .with_channel_order(vec![0, 2])
            .is_err());
    }

    #[test]
    fn shared_reads_across_threads() {
        let src = ArraySource::new(ramp(8, 8, 1)).expect("source");
        let windows = Window::from_size(8, 8)
            .expect("extent")
            .sliding_windows(4, 2)
            .expect("tiles");
        std::thread::scope(|s| {
            for w in &windows {
                let src = &src;
                s.spawn(move || {
                    let a = src.get_chip(w).expect("chip");
                    let b = src.get_chip(w).expect("chip");
                    assert_eq!(a, b);
                });
            }
        });
    }
}
