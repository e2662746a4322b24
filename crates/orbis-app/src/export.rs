//! Writes applied texture sets to disk as PNG files.

use std::path::{Path, PathBuf};

use orbis_planet::{MaterialConsumer, TextureSet};
use orbis_terrain::Raster;

/// Errors raised while baking and exporting textures.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The output directory could not be created.
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A PNG could not be encoded or written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A tier build failed and the sequence stopped.
    #[error("texture sequence stalled after tier {}", applied.map_or("none".to_string(), |r| r.to_string()))]
    Stalled { applied: Option<u32> },

    /// The sequence did not reach its last tier in time.
    #[error("texture sequence did not finish within {0:?}")]
    TimedOut(std::time::Duration),
}

/// A [`MaterialConsumer`] that saves each applied set as four PNGs.
///
/// `apply` cannot fail, so the first write error is parked and picked up by
/// the caller with [`PngExporter::take_error`].
#[derive(Debug)]
pub struct PngExporter {
    directory: PathBuf,
    prefix: String,
    final_resolution: u32,
    write_all_tiers: bool,
    written: Vec<PathBuf>,
    released: usize,
    error: Option<ExportError>,
}

impl PngExporter {
    /// Create `directory` if needed. Only sets at `final_resolution` are
    /// written unless `write_all_tiers` is set.
    pub fn new(
        directory: &Path,
        prefix: &str,
        final_resolution: u32,
        write_all_tiers: bool,
    ) -> Result<Self, ExportError> {
        std::fs::create_dir_all(directory).map_err(|source| ExportError::CreateDir {
            path: directory.to_path_buf(),
            source,
        })?;
        Ok(Self {
            directory: directory.to_path_buf(),
            prefix: prefix.to_string(),
            final_resolution,
            write_all_tiers,
            written: Vec::new(),
            released: 0,
            error: None,
        })
    }

    /// Every file written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Sets handed back through [`MaterialConsumer::release`].
    pub fn released(&self) -> usize {
        self.released
    }

    /// Follow a tier ladder that changed mid-bake.
    pub fn set_final_resolution(&mut self, resolution: u32) {
        self.final_resolution = resolution;
    }

    pub fn take_error(&mut self) -> Option<ExportError> {
        self.error.take()
    }

    /// Save a standalone raster as `<prefix>-<label>.png`.
    pub fn write_raster(&mut self, label: &str, raster: &Raster) -> Result<PathBuf, ExportError> {
        let path = self.directory.join(format!("{}-{label}.png", self.prefix));
        raster.save_png(&path).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        self.written.push(path.clone());
        Ok(path)
    }

    fn write_set(&mut self, textures: &TextureSet) -> Result<(), ExportError> {
        let resolution = textures.resolution;
        let layers = [
            ("height", &textures.triple.height),
            ("specular", &textures.triple.specular),
            ("diffuse", &textures.triple.diffuse),
            ("bump", &textures.bump.raster),
        ];
        for (kind, raster) in layers {
            self.write_raster(&format!("{resolution}-{kind}"), raster)?;
        }
        Ok(())
    }
}

impl MaterialConsumer for PngExporter {
    fn apply(&mut self, textures: &TextureSet) {
        if !self.write_all_tiers && textures.resolution != self.final_resolution {
            return;
        }
        if self.error.is_some() {
            return;
        }
        match self.write_set(textures) {
            Ok(()) => tracing::info!(
                resolution = textures.resolution,
                directory = %self.directory.display(),
                "Wrote texture tier"
            ),
            Err(err) => self.error = Some(err),
        }
    }

    fn release(&mut self, textures: TextureSet) {
        self.released += 1;
        tracing::debug!(
            generation = textures.generation,
            resolution = textures.resolution,
            "Released texture tier"
        );
    }
}
