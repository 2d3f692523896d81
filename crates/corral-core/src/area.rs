//! Areas: the bounded search volumes agents work in.

use corral_types::{AreaId, BlockPos, Bounds};
use serde::{Deserialize, Serialize};

/// A pen of agents anchored at an origin block.
///
/// The search volume spans `radius` blocks horizontally and `height` blocks
/// vertically on each side of the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    /// The anchor, which doubles as the area's identifier.
    pub id: AreaId,
    /// Horizontal half-extent.
    pub radius: u32,
    /// Vertical half-extent.
    pub height: u32,
}

impl Area {
    /// Create an area.
    pub const fn new(id: AreaId, radius: u32, height: u32) -> Self {
        Self { id, radius, height }
    }

    /// The anchor block.
    pub const fn origin(&self) -> BlockPos {
        self.id.origin()
    }

    /// The inclusive search volume.
    pub fn bounds(&self) -> Bounds {
        Bounds::around(self.origin(), self.radius, self.height)
    }
}
