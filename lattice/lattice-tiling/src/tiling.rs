//! Periodic lattice fitting and tiling.

use lattice_kernel::GeometryKernel;
use lattice_types::{Aabb, Axis, AxisFlags, CellSize, Periodicity};
use nalgebra::Vector3;
use tracing::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cell::UnitaryCell;
use crate::error::{KernelContext, LatticeError, LatticeResult};

/// Relative slack when counting cells, so that an exact multiple is not
/// rounded up by floating point noise.
const COUNT_TOLERANCE: f64 = 1e-9;

/// The grid of cells fitted to an envelope.
///
/// Along a strict axis the preferred cell size is kept and the envelope grows
/// symmetrically until a whole number of cells spans it. Along a non-strict
/// axis the envelope is kept and the cell shrinks instead.
///
/// The adjusted envelope is the fitted envelope shrunk by one cell on every
/// axis; its minimum corner is the center of the first tile and its maximum
/// corner the center of the last.
///
/// # Example
///
/// ```
/// use lattice_tiling::LatticeLayout;
/// use lattice_types::{Aabb, AxisFlags, CellSize, Periodicity, Vector3};
///
/// let envelope = Aabb::centered(Vector3::repeat(20.0));
/// let layout = LatticeLayout::fit(&envelope, CellSize::cubic(7.0), AxisFlags::all(true)).unwrap();
///
/// assert_eq!(layout.periodicity(), Periodicity::new(3, 3, 3));
/// assert_eq!(layout.grown().size(), Vector3::repeat(21.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatticeLayout {
    envelope: Aabb,
    grown: Aabb,
    adjusted: Aabb,
    cell_size: CellSize,
    periodicity: Periodicity,
}

impl LatticeLayout {
    /// Fits cells of `preferred` size into `envelope`.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::InvalidBounds`] if the envelope has no extent on an axis
    /// - [`LatticeError::InvalidCellSize`] unless every component of
    ///   `preferred` is positive and finite
    pub fn fit(envelope: &Aabb, preferred: CellSize, strict: AxisFlags) -> LatticeResult<Self> {
        let has_extent = |axis: Axis| {
            let length = envelope.length(axis);
            length.is_finite() && length > 0.0
        };
        if !Axis::ALL.iter().all(|&axis| has_extent(axis)) {
            return Err(LatticeError::InvalidBounds {
                min: envelope.min.coords.into(),
                max: envelope.max.coords.into(),
            });
        }
        if !preferred.is_valid() {
            return Err(LatticeError::InvalidCellSize {
                dx: preferred.dx,
                dy: preferred.dy,
                dz: preferred.dz,
            });
        }

        let mut grown = *envelope;
        let mut cell_size = preferred;
        let mut periodicity = Periodicity::default();
        for axis in Axis::ALL {
            let length = envelope.length(axis);
            let count = cell_count(length, preferred[axis]);
            periodicity[axis] = count;
            #[allow(clippy::cast_precision_loss)] // tile counts are far below 2^52
            let tiles = count as f64;
            if strict[axis] {
                // the count tolerance may leave p*s a hair below L
                let growth = tiles.mul_add(preferred[axis], -length).max(0.0);
                grown = grown.extended(axis, growth);
            } else {
                cell_size[axis] = length / tiles;
            }
        }
        let adjusted = Axis::ALL
            .iter()
            .fold(grown, |acc, &axis| acc.extended(axis, -cell_size[axis]));

        debug!(
            "Fitted lattice {} with cell {:?} into envelope {:?}",
            periodicity,
            cell_size.to_vector().as_slice(),
            envelope.size().as_slice()
        );
        Ok(Self {
            envelope: *envelope,
            grown,
            adjusted,
            cell_size,
            periodicity,
        })
    }

    /// The envelope the layout was fitted to.
    #[must_use]
    pub const fn envelope(&self) -> &Aabb {
        &self.envelope
    }

    /// The envelope spanned exactly by the tiles.
    ///
    /// Equal to [`envelope`](Self::envelope) along non-strict axes.
    #[must_use]
    pub const fn grown(&self) -> &Aabb {
        &self.grown
    }

    /// The box of tile centers.
    #[must_use]
    pub const fn adjusted(&self) -> &Aabb {
        &self.adjusted
    }

    /// The fitted cell size.
    #[must_use]
    pub const fn cell_size(&self) -> CellSize {
        self.cell_size
    }

    /// Tile counts per axis.
    #[must_use]
    pub const fn periodicity(&self) -> Periodicity {
        self.periodicity
    }

    /// Number of tiles.
    #[must_use]
    pub const fn placement_count(&self) -> usize {
        self.periodicity.count()
    }

    /// Translations of every tile, x outermost, then y, then z.
    pub fn placements(&self) -> impl Iterator<Item = Vector3<f64>> + '_ {
        let origin = self.adjusted.min.coords;
        let step = self.cell_size.to_vector();
        let Periodicity { nx, ny, nz } = self.periodicity;
        (0..nx).flat_map(move |i| {
            (0..ny).flat_map(move |j| {
                (0..nz).map(move |k| {
                    #[allow(clippy::cast_precision_loss)]
                    let index = Vector3::new(i as f64, j as f64, k as f64);
                    origin + index.component_mul(&step)
                })
            })
        })
    }
}

/// Whole cells of size `size` needed to cover `length`, at least one.
fn cell_count(length: f64, size: f64) -> usize {
    let ratio = length / size;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = (ratio - ratio * COUNT_TOLERANCE).ceil() as usize;
    count.max(1)
}

/// A tiled lattice of unit cells.
///
/// Created from an envelope and a preferred cell size, then tiled against a
/// built [`UnitaryCell`] of the fitted size. Tiles are kept as one compound
/// solid; merging is left to the intersection with the envelope.
#[derive(Debug, Clone)]
pub struct Lattice<S> {
    layout: Option<LatticeLayout>,
    geometry: Option<S>,
}

impl<S> Default for Lattice<S> {
    /// An uninitialized lattice with no layout.
    fn default() -> Self {
        Self {
            layout: None,
            geometry: None,
        }
    }
}

impl<S: Clone> Lattice<S> {
    /// Fits a lattice into `envelope`.
    ///
    /// A zero `preferred` size leaves the lattice uninitialized, so that
    /// [`create`](Self::create) reports [`LatticeError::NotInitialized`].
    ///
    /// # Errors
    ///
    /// See [`LatticeLayout::fit`].
    pub fn new(envelope: &Aabb, preferred: CellSize, strict: AxisFlags) -> LatticeResult<Self> {
        if preferred.is_zero() {
            return Ok(Self::default());
        }
        LatticeLayout::fit(envelope, preferred, strict).map(Self::from_layout)
    }

    /// Wraps an already fitted layout.
    #[must_use]
    pub const fn from_layout(layout: LatticeLayout) -> Self {
        Self {
            layout: Some(layout),
            geometry: None,
        }
    }

    /// The fitted layout.
    #[must_use]
    pub const fn layout(&self) -> Option<&LatticeLayout> {
        self.layout.as_ref()
    }

    /// Returns true once tiles have been placed.
    #[must_use]
    pub const fn is_built(&self) -> bool {
        self.geometry.is_some()
    }

    /// The tiled geometry.
    #[must_use]
    pub const fn geometry(&self) -> Option<&S> {
        self.geometry.as_ref()
    }

    /// Places a copy of `cell` at every tile position and stores them as one
    /// compound.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::NotInitialized`] if the lattice has no layout or the
    ///   cell is not built
    /// - [`LatticeError::CellSizeMismatch`] if the cell was built for another
    ///   size than the fitted one
    /// - [`LatticeError::KernelFailure`] if the compound cannot be formed
    pub fn create<K>(&mut self, kernel: &K, cell: &UnitaryCell<S>) -> LatticeResult<()>
    where
        K: GeometryKernel<Solid = S>,
    {
        let tiles = self.tiles(kernel, cell)?;
        let count = tiles.len();
        let compound = kernel
            .compound(tiles)
            .context("lattice compound", "cell size")?;
        self.geometry = Some(compound);
        info!("Tiled lattice with {} cells", count);
        Ok(())
    }

    /// Like [`create`](Self::create), but unions the tiles into one solid.
    ///
    /// Issues one boolean per tile; prefer `create` for large lattices.
    ///
    /// # Errors
    ///
    /// As [`create`](Self::create).
    pub fn create_merged<K>(&mut self, kernel: &K, cell: &UnitaryCell<S>) -> LatticeResult<()>
    where
        K: GeometryKernel<Solid = S>,
    {
        let mut tiles = self.tiles(kernel, cell)?.into_iter();
        let first = tiles.next().ok_or(LatticeError::NoTopology)?;
        let merged = tiles.try_fold(first, |acc, tile| {
            kernel
                .boolean_union(&acc, &tile)
                .context("lattice union", "cell size")
        })?;
        self.geometry = Some(merged);
        info!("Tiled and merged lattice");
        Ok(())
    }

    fn tiles<K>(&self, kernel: &K, cell: &UnitaryCell<S>) -> LatticeResult<Vec<S>>
    where
        K: GeometryKernel<Solid = S>,
    {
        let layout = self.layout.as_ref().ok_or(LatticeError::NotInitialized("lattice"))?;
        let solid = cell.geometry().ok_or(LatticeError::NotInitialized("unit cell"))?;
        let expected = layout.cell_size();
        let actual = cell.size();
        let tolerance = expected.to_vector().amax() * COUNT_TOLERANCE;
        if !expected.approx_eq(&actual, tolerance) {
            return Err(LatticeError::CellSizeMismatch {
                expected: expected.to_vector().into(),
                actual: actual.to_vector().into(),
            });
        }

        info!(
            "Placing {} copies of the unit cell",
            layout.placement_count()
        );
        Ok(layout
            .placements()
            .map(|offset| kernel.place_at(solid, offset))
            .collect())
    }

    /// Drops the tiled geometry, keeping the layout.
    pub fn reset(&mut self) {
        self.geometry = None;
    }
}
