//! Workspace for reusing allocated memory between multiple surface detections

use std::fmt;
use std::fmt::Debug;

use crate::grid::Label;

/// Scratch storage reused by the stencil and clustering passes
///
/// The stencil passes snapshot the label grid before rewriting it in place, and the
/// clustering pass keeps a stack of voxels pending a visit. Passing the same workspace to
/// subsequent detections avoids reallocating both buffers.
#[derive(Default)]
pub struct DetectionWorkspace {
    /// Snapshot of the label grid taken at the entry of an in-place stencil pass
    pub(crate) snapshot: Vec<Label>,
    /// Voxels pending a visit during flood-fill clustering
    pub(crate) fill_stack: Vec<(usize, usize, usize)>,
}

impl DetectionWorkspace {
    /// Constructs a workspace without allocating additional memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot with a copy of the given labels and returns it
    pub(crate) fn take_snapshot(&mut self, labels: &[Label]) -> &[Label] {
        self.snapshot.clear();
        self.snapshot.extend_from_slice(labels);
        &self.snapshot
    }
}

impl Clone for DetectionWorkspace {
    /// Returns a new default workspace without any allocated memory
    fn clone(&self) -> Self {
        DetectionWorkspace::default()
    }
}

impl Debug for DetectionWorkspace {
    /// Only prints the name of the type to the formatter
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectionWorkspace").finish()
    }
}
