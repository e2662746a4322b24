//! Background texture builds.
//!
//! Each submitted request moves onto its own named worker thread together
//! with every buffer it needs. The caller keeps a [`BuildHandle`] and polls
//! it without blocking; the finished rasters come back by value through a
//! bounded channel, so no memory is shared across the thread boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, TryRecvError, bounded};

use crate::texture::{BuildError, BuiltTextures, TextureBuildRequest, build_textures};

/// Spawns one background thread per texture build request.
///
/// Cloning is cheap; clones share the in-flight counter.
#[derive(Clone, Debug, Default)]
pub struct TextureBuildWorker {
    in_flight: Arc<AtomicU64>,
}

/// Decrements the in-flight counter when the worker thread ends, including
/// by panic.
struct InFlightGuard(Arc<AtomicU64>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl TextureBuildWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building `request` in the background.
    pub fn submit(&self, request: TextureBuildRequest) -> Result<BuildHandle, BuildError> {
        let (sender, receiver) = bounded(1);
        let generation = request.generation;
        let resolution = request.resolution;

        self.in_flight.fetch_add(1, Ordering::Relaxed);
        let guard = InFlightGuard(Arc::clone(&self.in_flight));

        std::thread::Builder::new()
            .name(format!("texture-build-g{generation}-{resolution}"))
            .spawn(move || {
                let _guard = guard;
                // The handle may have been dropped by a superseding request.
                let _ = sender.send(build_textures(&request));
            })
            .map_err(BuildError::Spawn)?;

        Ok(BuildHandle {
            generation,
            resolution,
            receiver,
        })
    }

    /// Number of builds currently running.
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }
}

/// Completion handle for one submitted build.
#[derive(Debug)]
pub struct BuildHandle {
    generation: u64,
    resolution: u32,
    receiver: Receiver<Result<BuiltTextures, BuildError>>,
}

impl BuildHandle {
    /// Generation the request was tagged with.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Requested resolution.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Poll for the result without blocking.
    ///
    /// Returns `None` while the build is still running. A worker that died
    /// without sending anything reports [`BuildError::WorkerLost`].
    pub fn try_take(&self) -> Option<Result<BuiltTextures, BuildError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(BuildError::WorkerLost)),
        }
    }

    /// Block until the build finishes.
    pub fn wait(self) -> Result<BuiltTextures, BuildError> {
        self.receiver.recv().map_err(|_| BuildError::WorkerLost)?
    }
}
