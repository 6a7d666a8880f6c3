use crate::rasterize;
use geochip_core::{
    Bounds, Chip, ConfigError, CrsTransform, GeometryKind, GeometryTable, RasterError,
    RasterSource, RasterTransformer, VectorSource, VectorSourceError, Window,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, sync::Arc};

/// Configuration errors detected while building a [`RasterizedSource`].
#[derive(thiserror::Error, Debug)]
pub enum RasterizeError {
    #[error(
        "{kind} geometries are not supported by RasterizedSource (row {index}); \
         buffer points and lines into polygons first"
    )]
    UnsupportedGeometry { index: usize, kind: GeometryKind },

    #[error("label geometry at row {index} has no class_id; all label polygons must have a class_id")]
    MissingClassId { index: usize },

    #[error("class_id {class_id} at row {index} does not fit a uint8 label raster")]
    ClassIdOutOfRange { index: usize, class_id: u32 },

    #[error(transparent)]
    VectorSource(#[from] VectorSourceError),
}

/// Rasterization settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterizerConfig {
    /// Class id burned where no geometry covers a pixel.
    pub background_class_id: u8,
    /// Burn every pixel a geometry touches instead of only pixels whose centre it contains.
    pub all_touched: bool,
}

impl Default for RasterizerConfig {
    fn default() -> Self {
        Self {
            background_class_id: 0,
            all_touched: false,
        }
    }
}

impl RasterizerConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Shorthand for [`RasterizedSource::new`].
    pub fn build(
        &self,
        vector_source: &dyn VectorSource,
        extent: Window,
    ) -> Result<RasterizedSource, RasterizeError> {
        RasterizedSource::new(vector_source, *self, extent)
    }
}

/// Raster source whose pixels are synthesized by rasterizing label geometries.
///
/// Chips are single-band `u8` class-id grids. The geometry table is read from
/// the vector source once, validated, and shared read-only by every
/// `get_chip` call.
pub struct RasterizedSource {
    table: Arc<GeometryTable>,
    bounds: Vec<Option<Bounds>>,
    class_ids: Vec<u8>,
    crs: Arc<dyn CrsTransform>,
    config: RasterizerConfig,
    extent: Window,
    channel_order: [usize; 1],
    transformers: Vec<Box<dyn RasterTransformer<u8>>>,
}

impl RasterizedSource {
    /// Materialize and validate the vector source's table.
    pub fn new(
        vector_source: &dyn VectorSource,
        config: RasterizerConfig,
        extent: Window,
    ) -> Result<Self, RasterizeError> {
        let table = vector_source.geometry_table()?;
        Self::from_table(
            Arc::new(table),
            vector_source.crs_transform(),
            config,
            extent,
        )
    }

    /// Build over an already materialized table, e.g. one shared between scenes.
    pub fn from_table(
        table: Arc<GeometryTable>,
        crs: Arc<dyn CrsTransform>,
        config: RasterizerConfig,
        extent: Window,
    ) -> Result<Self, RasterizeError> {
        let class_ids = validate_labels(&table)?;
        let bounds = table.iter().map(|f| f.geometry.bounds()).collect();
        info!(
            "rasterized source over {} geometries, extent {extent}, all_touched={}",
            table.len(),
            config.all_touched
        );
        Ok(Self {
            table,
            bounds,
            class_ids,
            crs,
            config,
            extent,
            channel_order: [0],
            transformers: Vec::new(),
        })
    }

    pub fn with_transformer(mut self, t: impl RasterTransformer<u8> + 'static) -> Self {
        self.transformers.push(Box::new(t));
        self
    }

    pub fn table(&self) -> &Arc<GeometryTable> {
        &self.table
    }

    /// The vector source's transform; this source owns no CRS of its own.
    pub fn crs_transform(&self) -> &Arc<dyn CrsTransform> {
        &self.crs
    }

    pub fn config(&self) -> RasterizerConfig {
        self.config
    }

    pub fn background_class_id(&self) -> u8 {
        self.config.background_class_id
    }

    pub fn all_touched(&self) -> bool {
        self.config.all_touched
    }

    /// Rasterize `window` without channel selection or transformers.
    pub fn rasterize_window(&self, window: &Window) -> Chip<u8> {
        let background = self.config.background_class_id;
        if self.table.is_empty() {
            return Chip::filled(window.height(), window.width(), 1, background);
        }

        let shapes = self
            .table
            .iter()
            .zip(&self.bounds)
            .zip(&self.class_ids)
            .filter(|((f, b), _)| {
                b.is_some_and(|b| b.intersects_window(window)) && f.geometry.intersects_window(window)
            })
            .map(|((f, _), &id)| (&f.geometry, id));

        rasterize(shapes, window, background, self.config.all_touched)
    }
}

impl RasterSource for RasterizedSource {
    type Pixel = u8;

    fn extent(&self) -> Window {
        self.extent
    }

    fn channel_order(&self) -> &[usize] {
        &self.channel_order
    }

    fn num_channels_raw(&self) -> usize {
        1
    }

    fn transformers(&self) -> &[Box<dyn RasterTransformer<u8>>] {
        &self.transformers
    }

    fn read_window(&self, window: &Window) -> Result<Chip<u8>, RasterError> {
        debug!("rasterizing {window}");
        Ok(self.rasterize_window(window))
    }
}

/// Check geometry kinds first, then class ids; returns class ids as `u8`.
fn validate_labels(table: &GeometryTable) -> Result<Vec<u8>, RasterizeError> {
    for (index, f) in table.iter().enumerate() {
        let kind = f.geometry.kind();
        if !kind.is_polygonal() {
            return Err(RasterizeError::UnsupportedGeometry { index, kind });
        }
    }
    table
        .iter()
        .enumerate()
        .map(|(index, f)| {
            let class_id = f.class_id.ok_or(RasterizeError::MissingClassId { index })?;
            u8::try_from(class_id).map_err(|_| RasterizeError::ClassIdOutOfRange { index, class_id })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geochip_core::{
        Geometry, IdentityTransform, InMemoryVectorSource, LabelFeature, Polygon,
        ReclassTransformer,
    };
    use nalgebra::Point2;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn win(xmin: i64, ymin: i64, xmax: i64, ymax: i64) -> Window {
        Window::new(xmin, ymin, xmax, ymax).expect("window")
    }

    fn source(features: Vec<LabelFeature>, config: RasterizerConfig) -> RasterizedSource {
        let vs = InMemoryVectorSource::new(GeometryTable::new(features));
        RasterizedSource::new(&vs, config, win(0, 0, 100, 100)).expect("source")
    }

    struct CountingSource {
        inner: InMemoryVectorSource,
        calls: AtomicUsize,
    }

    impl VectorSource for CountingSource {
        fn geometry_table(&self) -> Result<GeometryTable, VectorSourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.geometry_table()
        }

        fn crs_transform(&self) -> Arc<dyn CrsTransform> {
            self.inner.crs_transform()
        }
    }

    #[test]
    fn full_cover_scenario() {
        let src = source(
            vec![LabelFeature::new(Polygon::rect(0.0, 0.0, 4.0, 4.0), 1)],
            RasterizerConfig::default(),
        );
        let chip = src.get_chip(&win(0, 0, 4, 4)).expect("chip");
        assert_eq!(chip.shape(), (4, 4, 1));
        assert!(chip.data().iter().all(|&v| v == 1));
    }

    #[test]
    fn empty_table_is_background() {
        let src = source(
            Vec::new(),
            RasterizerConfig {
                background_class_id: 5,
                all_touched: true,
            },
        );
        let chip = src.get_chip(&win(-3, 7, 5, 9)).expect("chip");
        assert_eq!(chip.shape(), (2, 8, 1));
        assert_eq!(chip.count_eq(5), 16);
    }

    #[test]
    fn windows_without_geometries_are_background() {
        let src = source(
            vec![LabelFeature::new(Polygon::rect(0.0, 0.0, 4.0, 4.0), 1)],
            RasterizerConfig {
                background_class_id: 2,
                all_touched: false,
            },
        );
        let chip = src.get_chip(&win(40, 40, 48, 44)).expect("chip");
        assert_eq!(chip.count_eq(2), 32);
    }

    #[test]
    fn translating_scene_and_window_together_is_invariant() {
        let tri = || {
            Polygon::new(
                vec![
                    Point2::new(0.3, 0.2),
                    Point2::new(5.7, 1.1),
                    Point2::new(2.2, 4.9),
                ],
                Vec::new(),
            )
        };
        for all_touched in [false, true] {
            let config = RasterizerConfig {
                background_class_id: 0,
                all_touched,
            };
            let base = source(vec![LabelFeature::new(tri(), 3)], config);
            let moved = source(
                vec![LabelFeature::new(
                    Geometry::from(tri()).translate(37.0, 12.0),
                    3,
                )],
                config,
            );
            let a = base.get_chip(&win(0, 0, 6, 6)).expect("chip");
            let b = moved.get_chip(&win(37, 12, 43, 18)).expect("chip");
            assert_eq!(a, b);
            assert!(a.count_eq(3) > 0);
        }
    }

    #[test]
    fn vector_source_is_read_once() {
        let vs = CountingSource {
            inner: InMemoryVectorSource::new(GeometryTable::new(vec![LabelFeature::new(
                Polygon::rect(0.0, 0.0, 2.0, 2.0),
                1,
            )])),
            calls: AtomicUsize::new(0),
        };
        let src = RasterizedSource::new(&vs, RasterizerConfig::default(), win(0, 0, 4, 4))
            .expect("source");
        for w in win(0, 0, 4, 4).sliding_windows(2, 1).expect("tiles") {
            src.get_chip(&w).expect("chip");
        }
        assert_eq!(vs.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn lines_and_points_are_rejected_by_kind() {
        let vs = InMemoryVectorSource::new(GeometryTable::new(vec![
            LabelFeature::new(Polygon::rect(0.0, 0.0, 1.0, 1.0), 1),
            LabelFeature::new(
                Geometry::LineString(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)]),
                1,
            ),
        ]));
        let err = RasterizedSource::new(&vs, RasterizerConfig::default(), win(0, 0, 4, 4))
            .err()
            .expect("must fail");
        assert!(matches!(
            err,
            RasterizeError::UnsupportedGeometry {
                index: 1,
                kind: GeometryKind::LineString
            }
        ));
        assert!(err.to_string().contains("LineString"));
    }

    #[test]
    fn missing_class_id_is_rejected() {
        let vs = InMemoryVectorSource::new(GeometryTable::new(vec![LabelFeature::unlabeled(
            Polygon::rect(0.0, 0.0, 1.0, 1.0),
        )]));
        let err = RasterizedSource::new(&vs, RasterizerConfig::default(), win(0, 0, 4, 4))
            .err()
            .expect("must fail");
        assert!(matches!(err, RasterizeError::MissingClassId { index: 0 }));
        assert!(err.to_string().contains("class_id"));
    }

    #[test]
    fn class_ids_above_u8_are_rejected() {
        let vs = InMemoryVectorSource::new(GeometryTable::new(vec![LabelFeature::new(
            Polygon::rect(0.0, 0.0, 1.0, 1.0),
            256,
        )]));
        assert!(matches!(
            RasterizedSource::new(&vs, RasterizerConfig::default(), win(0, 0, 4, 4)),
            Err(RasterizeError::ClassIdOutOfRange {
                index: 0,
                class_id: 256
            })
        ));
    }

    #[test]
    fn transformers_run_after_rasterization() {
        let src = source(
            vec![LabelFeature::new(Polygon::rect(0.0, 0.0, 2.0, 2.0), 1)],
            RasterizerConfig::default(),
        )
        .with_transformer(ReclassTransformer::new(&BTreeMap::from([(1, 4)])));
        let chip = src.get_chip(&win(0, 0, 2, 2)).expect("chip");
        assert_eq!(chip.count_eq(4), 4);
    }

    #[test]
    fn reports_uint8_single_band() {
        let src = source(Vec::new(), RasterizerConfig::default());
        assert_eq!(src.dtype(), geochip_core::DataType::Uint8);
        assert_eq!(src.channel_order(), &[0]);
        assert_eq!(src.num_channels(), 1);
    }

    #[test]
    fn table_is_shared_not_copied() {
        let table = Arc::new(GeometryTable::new(vec![LabelFeature::new(
            Polygon::rect(0.0, 0.0, 2.0, 2.0),
            1,
        )]));
        let a = RasterizedSource::from_table(
            Arc::clone(&table),
            Arc::new(IdentityTransform),
            RasterizerConfig::default(),
            win(0, 0, 4, 4),
        )
        .expect("source");
        assert!(Arc::ptr_eq(a.table(), &table));
    }

    #[test]
    fn config_round_trips_through_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rasterizer.json");
        let cfg = RasterizerConfig {
            background_class_id: 3,
            all_touched: true,
        };
        cfg.write_json(&path).expect("write");
        assert_eq!(RasterizerConfig::load_json(&path).expect("load"), cfg);
        let partial: RasterizerConfig =
            serde_json::from_str(r#"{"all_touched": true}"#).expect("partial");
        assert_eq!(partial.background_class_id, 0);
    }
}
