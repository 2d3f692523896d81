//! Spatial primitives: block positions, search volumes, and bounding boxes.
//!
//! The simulation is a voxel grid. Resources and destinations live at integer
//! [`BlockPos`] coordinates; agents occupy a floating-point [`Aabb`]. An area
//! (a pen of agents) is anchored at a block and searches the inclusive
//! [`Bounds`] volume around it.
//!
//! All integer math is widened to `i64` and saturates at the edges of the
//! coordinate space instead of wrapping.

use serde::{Deserialize, Serialize};

/// An integer position in the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// East/west coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
    /// North/south coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Create a position from its three coordinates.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Squared euclidean distance to `other`, saturating at `i64::MAX`.
    pub fn squared_distance(&self, other: &Self) -> i64 {
        let dx = i64::from(self.x).saturating_sub(i64::from(other.x));
        let dy = i64::from(self.y).saturating_sub(i64::from(other.y));
        let dz = i64::from(self.z).saturating_sub(i64::from(other.z));
        dx.saturating_mul(dx)
            .saturating_add(dy.saturating_mul(dy))
            .saturating_add(dz.saturating_mul(dz))
    }

    /// Return the position shifted by the given deltas, or `None` if any
    /// coordinate would leave the `i32` range.
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
            z: self.z.checked_add(dz)?,
        })
    }

    /// The position one block below, saturating at the bottom of the grid.
    pub const fn down(&self) -> Self {
        Self {
            x: self.x,
            y: self.y.saturating_sub(1),
            z: self.z,
        }
    }

    /// Move one block toward `target` on every axis that differs.
    ///
    /// Returns `self` unchanged when already at `target`.
    pub const fn step_toward(&self, target: &Self) -> Self {
        Self {
            x: step_axis(self.x, target.x),
            y: step_axis(self.y, target.y),
            z: step_axis(self.z, target.z),
        }
    }
}

const fn step_axis(from: i32, to: i32) -> i32 {
    if from < to {
        from.saturating_add(1)
    } else if from > to {
        from.saturating_sub(1)
    } else {
        from
    }
}

impl core::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Identifier of an area: the anchor block of a bounded search volume.
///
/// Two areas can never share an anchor, so the position doubles as the key
/// for every per-area table (target cache, active scans, assignments).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AreaId(pub BlockPos);

impl AreaId {
    /// Return the anchor position of this area.
    pub const fn origin(self) -> BlockPos {
        self.0
    }
}

impl From<BlockPos> for AreaId {
    fn from(pos: BlockPos) -> Self {
        Self(pos)
    }
}

impl core::fmt::Display for AreaId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "area@{}", self.0)
    }
}

/// An inclusive, axis-aligned volume of block positions.
///
/// A volume whose `min` exceeds `max` on any axis is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    /// Lowest corner (inclusive).
    pub min: BlockPos,
    /// Highest corner (inclusive).
    pub max: BlockPos,
}

impl Bounds {
    /// Create a volume from two inclusive corners.
    pub const fn new(min: BlockPos, max: BlockPos) -> Self {
        Self { min, max }
    }

    /// The search volume of an area: `radius` blocks horizontally and
    /// `height` blocks vertically in each direction from `origin`.
    ///
    /// A radius of 2 and height of 1 yields a 5 x 3 x 5 volume.
    pub fn around(origin: BlockPos, radius: u32, height: u32) -> Self {
        let r = i32::try_from(radius).unwrap_or(i32::MAX);
        let h = i32::try_from(height).unwrap_or(i32::MAX);
        Self {
            min: BlockPos::new(
                origin.x.saturating_sub(r),
                origin.y.saturating_sub(h),
                origin.z.saturating_sub(r),
            ),
            max: BlockPos::new(
                origin.x.saturating_add(r),
                origin.y.saturating_add(h),
                origin.z.saturating_add(r),
            ),
        }
    }

    /// Whether `pos` lies inside the volume.
    pub const fn contains(&self, pos: &BlockPos) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }

    /// Number of blocks along each axis `(x, y, z)`.
    pub fn extents(&self) -> (u64, u64, u64) {
        (
            axis_len(self.min.x, self.max.x),
            axis_len(self.min.y, self.max.y),
            axis_len(self.min.z, self.max.z),
        )
    }

    /// Total number of block positions in the volume.
    pub fn volume(&self) -> u64 {
        let (sx, sy, sz) = self.extents();
        sx.saturating_mul(sy).saturating_mul(sz)
    }

    /// Iterate every position in the volume exactly once.
    ///
    /// The order is fixed: `x` varies fastest, then `y`, then `z`.
    pub fn iter(&self) -> BoundsIter {
        let (size_x, size_y, _) = self.extents();
        BoundsIter {
            min: self.min,
            size_x,
            size_y,
            index: 0,
            volume: self.volume(),
        }
    }
}

impl IntoIterator for Bounds {
    type Item = BlockPos;
    type IntoIter = BoundsIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn axis_len(min: i32, max: i32) -> u64 {
    let span = i64::from(max)
        .saturating_sub(i64::from(min))
        .saturating_add(1);
    u64::try_from(span).unwrap_or(0)
}

/// Deterministic iterator over the positions of a [`Bounds`].
///
/// Holds only a linear cursor, so it is cheap to keep alive across ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundsIter {
    min: BlockPos,
    size_x: u64,
    size_y: u64,
    index: u64,
    volume: u64,
}

impl BoundsIter {
    /// Number of positions not yet yielded.
    pub const fn remaining(&self) -> u64 {
        self.volume.saturating_sub(self.index)
    }

    /// Whether every position has been yielded.
    pub const fn is_exhausted(&self) -> bool {
        self.index >= self.volume
    }

    fn position_at(&self, index: u64) -> Option<BlockPos> {
        let dx = index.checked_rem(self.size_x)?;
        let row = index.checked_div(self.size_x)?;
        let dy = row.checked_rem(self.size_y)?;
        let dz = row.checked_div(self.size_y)?;
        Some(BlockPos::new(
            shift(self.min.x, dx)?,
            shift(self.min.y, dy)?,
            shift(self.min.z, dz)?,
        ))
    }
}

fn shift(base: i32, delta: u64) -> Option<i32> {
    let delta = i64::try_from(delta).ok()?;
    i32::try_from(i64::from(base).checked_add(delta)?).ok()
}

impl Iterator for BoundsIter {
    type Item = BlockPos;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_exhausted() {
            return None;
        }
        let pos = self.position_at(self.index);
        self.index = self.index.saturating_add(1);
        if pos.is_none() {
            // Unreachable for well-formed bounds; stop rather than skip.
            self.index = self.volume;
        }
        pos
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

/// A floating-point axis-aligned bounding box.
///
/// Used for "has the agent arrived" checks: an agent has reached a block
/// when its box intersects the block's box expanded by an interaction radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum x.
    pub min_x: f64,
    /// Minimum y.
    pub min_y: f64,
    /// Minimum z.
    pub min_z: f64,
    /// Maximum x.
    pub max_x: f64,
    /// Maximum y.
    pub max_y: f64,
    /// Maximum z.
    pub max_z: f64,
}

impl Aabb {
    /// The unit cube occupied by a block.
    pub fn of_block(pos: BlockPos) -> Self {
        let x = f64::from(pos.x);
        let y = f64::from(pos.y);
        let z = f64::from(pos.z);
        Self {
            min_x: x,
            min_y: y,
            min_z: z,
            max_x: x + 1.0,
            max_y: y + 1.0,
            max_z: z + 1.0,
        }
    }

    /// Grow the box by `amount` on every side. A negative amount shrinks it.
    pub fn expand(&self, amount: f64) -> Self {
        Self {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            min_z: self.min_z - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
            max_z: self.max_z + amount,
        }
    }

    /// Whether the two boxes overlap with non-zero volume.
    ///
    /// Boxes that merely touch along a face do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
            && self.min_z < other.max_z
            && self.max_z > other.min_z
    }
}
