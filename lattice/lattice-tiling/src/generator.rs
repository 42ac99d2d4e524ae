//! Step-by-step infill pipeline.

use lattice_kernel::GeometryKernel;
use lattice_topology::{CellConfiguration, Descriptor, Entity, Insert};
use lattice_types::{AxisFlags, CellSize};
use tracing::info;

use crate::cell::UnitaryCell;
use crate::error::{KernelContext, LatticeError, LatticeResult};
use crate::params::InfillParams;
use crate::tiling::{Lattice, LatticeLayout};

/// Result of a complete infill run.
#[derive(Debug, Clone)]
pub struct InfillResult<S> {
    /// Shell united with the trimmed lattice.
    pub unified: S,

    /// Shell around the envelope surface (for inspection).
    pub shell: S,

    /// Lattice trimmed to the envelope (for inspection).
    pub lattice: S,

    /// The fitted lattice grid.
    pub layout: LatticeLayout,

    /// Relative density of the unit cell.
    pub cell_density: f64,

    /// Volume of the shell.
    pub shell_volume: f64,

    /// Volume of the trimmed lattice.
    pub lattice_volume: f64,
}

impl<S> InfillResult<S> {
    /// Returns the total volume (shell + lattice).
    ///
    /// Counts the overlap of shell and lattice twice.
    #[must_use]
    pub fn total_volume(&self) -> f64 {
        self.shell_volume + self.lattice_volume
    }
}

/// Runs the infill pipeline one step at a time.
///
/// Steps in order:
/// envelope → shell → unit cell initialization → entities → unit cell →
/// lattice → lattice trimmed to the envelope → union with the shell.
///
/// Every product is stored. Replacing or deleting a product discards every
/// product derived from it; getters of missing products return
/// [`LatticeError::NotInitialized`].
///
/// # Example
///
/// ```
/// use lattice_kernel::{GeometryKernel, ImplicitKernel};
/// use lattice_tiling::InfillGenerator;
/// use lattice_types::{AxisFlags, CellSize, Vector3};
///
/// let kernel = ImplicitKernel::new().with_resolution(16);
/// let envelope = kernel.create_box(Vector3::repeat(20.0)).unwrap();
///
/// let mut generator = InfillGenerator::new(kernel);
/// generator.set_envelope(envelope);
/// generator.create_shell(1.0, 0.0).unwrap();
/// generator.init_unitary_cell(CellSize::cubic(7.0), AxisFlags::all(true)).unwrap();
/// generator.add_entities_str("[1, 7, {'diameter': 1.0}],\n[2, 8, {'diameter': 1.0}]").unwrap();
/// generator.create_unitary_cell().unwrap();
/// generator.create_lattice().unwrap();
/// generator.intersect_lattice().unwrap();
/// generator.unify().unwrap();
///
/// assert!(generator.unified().is_ok());
/// ```
#[derive(Debug)]
pub struct InfillGenerator<K: GeometryKernel> {
    kernel: K,
    envelope: Option<K::Solid>,
    shell: Option<K::Solid>,
    config: CellConfiguration,
    cell: UnitaryCell<K::Solid>,
    lattice: Lattice<K::Solid>,
    core: Option<K::Solid>,
    unified: Option<K::Solid>,
    clip_cell: bool,
}

impl<K: GeometryKernel> InfillGenerator<K> {
    /// Creates an empty pipeline on `kernel`.
    #[must_use]
    pub fn new(kernel: K) -> Self {
        Self {
            kernel,
            envelope: None,
            shell: None,
            config: CellConfiguration::new(),
            cell: UnitaryCell::default(),
            lattice: Lattice::default(),
            core: None,
            unified: None,
            clip_cell: true,
        }
    }

    /// Enables or disables clipping of unit cells initialized afterwards.
    #[must_use]
    pub const fn with_clipping(mut self, enabled: bool) -> Self {
        self.clip_cell = enabled;
        self
    }

    /// The geometry kernel.
    #[must_use]
    pub const fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Runs every step with `params` and returns the products.
    ///
    /// # Errors
    ///
    /// Returns the first error of [`InfillParams::validate`] or of any step.
    pub fn run(
        kernel: K,
        envelope: K::Solid,
        params: &InfillParams,
        descriptors: impl Into<Insert>,
    ) -> LatticeResult<InfillResult<K::Solid>> {
        params.validate()?;
        info!(
            "Generating infill with cell {:?}, shell inner={:.2}mm outer={:.2}mm",
            params.cell_size.to_vector().as_slice(),
            params.shell_inner,
            params.shell_outer
        );

        let mut generator = Self::new(kernel).with_clipping(params.clip_cell);
        generator.set_envelope(envelope);
        generator.create_shell(params.shell_inner, params.shell_outer)?;
        generator.init_unitary_cell(params.cell_size, params.strict)?;
        generator.add_entities(descriptors)?;
        generator.create_unitary_cell()?;
        generator.create_lattice()?;
        generator.intersect_lattice()?;
        generator.unify()?;

        let shell = generator.shell()?.clone();
        let lattice = generator.intersected_lattice()?.clone();
        let result = InfillResult {
            unified: generator.unified()?.clone(),
            shell_volume: generator.kernel.volume(&shell),
            lattice_volume: generator.kernel.volume(&lattice),
            shell,
            lattice,
            layout: *generator.layout()?,
            cell_density: generator.density().unwrap_or(0.0),
        };
        info!(
            "Infill complete: shell volume {:.2}, lattice volume {:.2}",
            result.shell_volume, result.lattice_volume
        );
        Ok(result)
    }

    // ---- envelope ----

    /// Sets the envelope, discarding everything built so far.
    pub fn set_envelope(&mut self, envelope: K::Solid) {
        self.delete_envelope();
        self.envelope = Some(envelope);
    }

    /// The envelope.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::NotInitialized`] if no envelope is set.
    pub fn envelope(&self) -> LatticeResult<&K::Solid> {
        self.envelope
            .as_ref()
            .ok_or(LatticeError::NotInitialized("envelope"))
    }

    /// Removes the envelope and everything built on it.
    pub fn delete_envelope(&mut self) {
        self.envelope = None;
        self.delete_shell();
        self.config = CellConfiguration::new();
        self.cell = UnitaryCell::default();
        self.lattice = Lattice::default();
        self.delete_intersected_lattice();
    }

    // ---- shell ----

    /// Builds the shell: `inner` below and `outer` above the envelope surface.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::NotInitialized`] if no envelope is set
    /// - [`LatticeError::InvalidShellThickness`] if a thickness is negative or
    ///   both are zero
    /// - [`LatticeError::KernelFailure`] if the kernel cannot offset the envelope
    pub fn create_shell(&mut self, inner: f64, outer: f64) -> LatticeResult<()> {
        let envelope = self.envelope()?;
        if !(inner >= 0.0 && outer >= 0.0) || inner + outer <= 0.0 {
            return Err(LatticeError::InvalidShellThickness { inner, outer });
        }
        info!("Generating shell with inner={:.2}mm outer={:.2}mm", inner, outer);
        let shell = self
            .kernel
            .offset_shell(envelope, inner, outer)
            .context("shell", "shell thickness")?;
        self.set_shell(shell);
        Ok(())
    }

    /// Uses an externally built shell.
    pub fn set_shell(&mut self, shell: K::Solid) {
        self.delete_shell();
        self.shell = Some(shell);
    }

    /// The shell.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::NotInitialized`] if no shell exists.
    pub fn shell(&self) -> LatticeResult<&K::Solid> {
        self.shell
            .as_ref()
            .ok_or(LatticeError::NotInitialized("shell"))
    }

    /// Removes the shell and the unified result.
    pub fn delete_shell(&mut self) {
        self.shell = None;
        self.delete_unified();
    }

    // ---- unit cell configuration ----

    /// Fits the lattice to the envelope bounds and prepares an empty unit
    /// cell of the fitted size.
    ///
    /// Discards entities and every cell, lattice and trimmed product.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::NotInitialized`] if no envelope is set
    /// - [`LatticeError::InvalidCellSize`] or [`LatticeError::InvalidBounds`]
    ///   if no layout fits
    pub fn init_unitary_cell(&mut self, size: CellSize, strict: AxisFlags) -> LatticeResult<()> {
        let bounds = self.kernel.bounding_box(self.envelope()?);
        let layout = LatticeLayout::fit(&bounds, size, strict)?;
        let cell = UnitaryCell::new(layout.cell_size())?.with_clipping(self.clip_cell);

        self.config.initialize(*cell.corners());
        self.cell = cell;
        self.lattice = Lattice::from_layout(layout);
        self.delete_intersected_lattice();
        info!(
            "Initialized unit cell {:?} for a {} lattice",
            layout.cell_size().to_vector().as_slice(),
            layout.periodicity()
        );
        Ok(())
    }

    /// Entity at `index`.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::NoTopology`] if no entity was added
    /// - [`LatticeError::Topology`] if `index` is out of range
    pub fn entity(&self, index: usize) -> LatticeResult<&Entity> {
        if self.config.is_empty() {
            return Err(LatticeError::NoTopology);
        }
        Ok(self.config.entity(index)?)
    }

    /// The cell configuration.
    #[must_use]
    pub const fn config(&self) -> &CellConfiguration {
        &self.config
    }

    /// Appends one descriptor.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::NotInitialized`] before [`init_unitary_cell`](Self::init_unitary_cell)
    /// - [`LatticeError::Topology`] if the descriptor does not resolve; the
    ///   configuration and every built product are then left as they were
    pub fn add_entity(&mut self, descriptor: Descriptor) -> LatticeResult<()> {
        self.require_cell()?;
        self.config.append(descriptor)?;
        self.invalidate_cell();
        Ok(())
    }

    /// Parses and appends one descriptor.
    ///
    /// # Errors
    ///
    /// As [`add_entity`](Self::add_entity).
    pub fn add_entity_str(&mut self, text: &str) -> LatticeResult<()> {
        self.require_cell()?;
        self.config.append_str(text)?;
        self.invalidate_cell();
        Ok(())
    }

    /// Inserts a batch of descriptors or entities.
    ///
    /// # Errors
    ///
    /// As [`add_entity`](Self::add_entity).
    pub fn add_entities(&mut self, batch: impl Into<Insert>) -> LatticeResult<()> {
        self.require_cell()?;
        self.config.insert(batch)?;
        self.invalidate_cell();
        Ok(())
    }

    /// Parses and inserts a batch of descriptors.
    ///
    /// # Errors
    ///
    /// As [`add_entity`](Self::add_entity).
    pub fn add_entities_str(&mut self, text: &str) -> LatticeResult<()> {
        self.require_cell()?;
        self.config.insert_str(text)?;
        self.invalidate_cell();
        Ok(())
    }

    /// Removes all entities and variables, and everything built from them.
    pub fn delete_entities(&mut self) {
        self.config.reset();
        self.invalidate_cell();
    }

    fn require_cell(&self) -> LatticeResult<()> {
        if self.cell.is_initialized() {
            Ok(())
        } else {
            Err(LatticeError::NotInitialized("unit cell"))
        }
    }

    fn invalidate_cell(&mut self) {
        self.cell.clear_geometry();
        self.delete_lattice();
    }

    // ---- unit cell ----

    /// Builds the unit cell from the configured entities.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::NoTopology`] if no entity was added
    /// - [`LatticeError::NotInitialized`] before [`init_unitary_cell`](Self::init_unitary_cell)
    /// - any error of [`UnitaryCell::create`]
    pub fn create_unitary_cell(&mut self) -> LatticeResult<()> {
        if self.config.is_empty() {
            return Err(LatticeError::NoTopology);
        }
        self.require_cell()?;
        self.cell.create(&self.kernel, &self.config)?;
        self.delete_lattice();
        Ok(())
    }

    /// The built unit cell geometry.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::NotInitialized`] if the cell is not built.
    pub fn unitary_cell(&self) -> LatticeResult<&K::Solid> {
        self.cell
            .geometry()
            .ok_or(LatticeError::NotInitialized("unit cell"))
    }

    /// The unit cell, built or not.
    #[must_use]
    pub const fn cell(&self) -> &UnitaryCell<K::Solid> {
        &self.cell
    }

    /// Relative density of the built unit cell.
    #[must_use]
    pub fn density(&self) -> Option<f64> {
        self.cell.density(&self.kernel)
    }

    /// Removes the unit cell geometry and everything tiled from it.
    pub fn delete_unitary_cell(&mut self) {
        self.invalidate_cell();
    }

    // ---- lattice ----

    /// Tiles the built unit cell over the fitted grid.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::NotInitialized`] if the cell is not built
    /// - any error of [`Lattice::create`]
    pub fn create_lattice(&mut self) -> LatticeResult<()> {
        self.unitary_cell()?;
        self.lattice.create(&self.kernel, &self.cell)?;
        self.delete_intersected_lattice();
        Ok(())
    }

    /// The tiled lattice geometry.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::NotInitialized`] if the lattice is not built.
    pub fn lattice(&self) -> LatticeResult<&K::Solid> {
        self.lattice
            .geometry()
            .ok_or(LatticeError::NotInitialized("lattice"))
    }

    /// The fitted lattice grid.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::NotInitialized`] before
    /// [`init_unitary_cell`](Self::init_unitary_cell).
    pub fn layout(&self) -> LatticeResult<&LatticeLayout> {
        self.lattice
            .layout()
            .ok_or(LatticeError::NotInitialized("lattice"))
    }

    /// Removes the lattice geometry and everything derived from it.
    pub fn delete_lattice(&mut self) {
        self.lattice.reset();
        self.delete_intersected_lattice();
    }

    // ---- trimmed lattice ----

    /// Trims the lattice to the envelope.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::NotInitialized`] if the lattice is not built or no
    ///   envelope is set
    /// - [`LatticeError::KernelFailure`] if the intersection fails
    pub fn intersect_lattice(&mut self) -> LatticeResult<()> {
        let lattice = self.lattice()?;
        let envelope = self.envelope()?;
        info!("Trimming lattice to the envelope");
        let core = self
            .kernel
            .boolean_intersect(envelope, lattice)
            .context("lattice intersection", "cell size")?;
        self.delete_intersected_lattice();
        self.core = Some(core);
        Ok(())
    }

    /// The lattice trimmed to the envelope.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::NotInitialized`] before
    /// [`intersect_lattice`](Self::intersect_lattice).
    pub fn intersected_lattice(&self) -> LatticeResult<&K::Solid> {
        self.core
            .as_ref()
            .ok_or(LatticeError::NotInitialized("intersected lattice"))
    }

    /// Removes the trimmed lattice and the unified result.
    pub fn delete_intersected_lattice(&mut self) {
        self.core = None;
        self.delete_unified();
    }

    // ---- unified ----

    /// Unites the shell with the trimmed lattice.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::NotInitialized`] if the trimmed lattice or the shell
    ///   is missing
    /// - [`LatticeError::KernelFailure`] if the union fails
    pub fn unify(&mut self) -> LatticeResult<()> {
        let core = self.intersected_lattice()?;
        let shell = self.shell()?;
        info!("Uniting shell and lattice");
        let unified = self
            .kernel
            .boolean_union(shell, core)
            .context("shell union", "shell thickness")?;
        self.unified = Some(unified);
        Ok(())
    }

    /// The shell united with the trimmed lattice.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::NotInitialized`] before [`unify`](Self::unify).
    pub fn unified(&self) -> LatticeResult<&K::Solid> {
        self.unified
            .as_ref()
            .ok_or(LatticeError::NotInitialized("unified geometry"))
    }

    /// Removes the unified result.
    pub fn delete_unified(&mut self) {
        self.unified = None;
    }
}
