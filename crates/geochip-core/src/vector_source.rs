use crate::{CrsTransform, GeometryTable, IdentityTransform};
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum VectorSourceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("vector source failed: {0}")]
    Other(String),
}

/// Provider of a labeled geometry table in pixel coordinates.
pub trait VectorSource: Send + Sync {
    /// Materialize the table. Consumers call this once and keep the result.
    fn geometry_table(&self) -> Result<GeometryTable, VectorSourceError>;

    /// Pixel ↔ map transform of the scene the geometries belong to.
    fn crs_transform(&self) -> Arc<dyn CrsTransform>;
}

/// Vector source over a table already held in memory.
#[derive(Clone, Debug)]
pub struct InMemoryVectorSource {
    table: GeometryTable,
    crs: Arc<dyn CrsTransform>,
    in_map_coords: bool,
}

impl InMemoryVectorSource {
    /// Table in pixel coordinates; pixel and map space coincide.
    pub fn new(table: GeometryTable) -> Self {
        Self {
            table,
            crs: Arc::new(IdentityTransform),
            in_map_coords: false,
        }
    }

    /// Table in map coordinates; converted to pixel space on read.
    pub fn from_map_coords(table: GeometryTable, crs: Arc<dyn CrsTransform>) -> Self {
        Self {
            table,
            crs,
            in_map_coords: true,
        }
    }
}

impl VectorSource for InMemoryVectorSource {
    fn geometry_table(&self) -> Result<GeometryTable, VectorSourceError> {
        if !self.in_map_coords {
            return Ok(self.table.clone());
        }
        let crs = &self.crs;
        Ok(self
            .table
            .map_geometries(|g| g.map_points(|p| crs.map_to_pixel(p))))
    }

    fn crs_transform(&self) -> Arc<dyn CrsTransform> {
        Arc::clone(&self.crs)
    }
}
