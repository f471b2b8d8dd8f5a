//! In-memory raster source for tests and embedding.

use super::{ImageId, Raster, RasterDecoder};
use crate::error::DecodeError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves pre-built rasters by id.
///
/// Unknown ids fail with `DecodeError::NotFound`. Counts every decode so
/// callers can verify cache behaviour.
#[derive(Default)]
pub struct InMemoryDecoder {
    rasters: HashMap<ImageId, Raster>,
    decodes: AtomicUsize,
}

impl InMemoryDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raster under `id`, replacing any previous one
    pub fn insert(&mut self, id: impl Into<ImageId>, raster: Raster) {
        self.rasters.insert(id.into(), raster);
    }

    /// Builder-style `insert`
    pub fn with(mut self, id: impl Into<ImageId>, raster: Raster) -> Self {
        self.insert(id, raster);
        self
    }

    /// Number of `decode` calls served so far, failures included
    pub fn decode_count(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }
}

impl RasterDecoder for InMemoryDecoder {
    fn decode(&self, id: &ImageId) -> Result<Raster, DecodeError> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        self.rasters
            .get(id)
            .cloned()
            .ok_or_else(|| DecodeError::NotFound {
                path: id.path().to_path_buf(),
            })
    }
}
