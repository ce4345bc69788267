//! [`Detector`]: a named model instance with its installed fields.

use std::fmt;
use std::sync::Arc;

use pixsim_core::{DetectorId, PixelIndex, Point3, ThicknessDomain, Vector3};
use pixsim_field::{FieldData, FieldFunction, FieldType, FieldValue};

use crate::error::FieldQueryError;
use crate::field::{DetectorField, GridBoundary, GridField};
use crate::model::DetectorModel;

/// The kinds of field a detector can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Scalar weighting potential of a pixel.
    WeightingPotential,
    /// Electric field in V/mm.
    ElectricField,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WeightingPotential => f.write_str("weighting potential"),
            Self::ElectricField => f.write_str("electric field"),
        }
    }
}

/// A detector instance in the simulation.
///
/// Fields are installed during module initialization and only read while
/// events are processed. Installing a field of a kind that is already
/// present replaces it.
#[derive(Clone, Debug)]
pub struct Detector {
    id: DetectorId,
    model: Arc<DetectorModel>,
    weighting_potential: Option<DetectorField<f64>>,
    electric_field: Option<DetectorField<Vector3>>,
}

impl Detector {
    /// Create a detector with no fields installed.
    pub fn new(id: impl Into<DetectorId>, model: Arc<DetectorModel>) -> Self {
        Self {
            id: id.into(),
            model,
            weighting_potential: None,
            electric_field: None,
        }
    }

    /// Detector name.
    pub fn id(&self) -> &DetectorId {
        &self.id
    }

    /// Shared geometry.
    pub fn model(&self) -> &Arc<DetectorModel> {
        &self.model
    }

    // ── Installation ────────────────────────────────────────────

    /// Install a tabulated weighting potential.
    ///
    /// `scale` is the table extent in units of the pixel pitch and
    /// `offset` a shift in mm. The potential is zero outside the table.
    pub fn set_weighting_potential_grid(
        &mut self,
        data: Arc<FieldData<f64>>,
        scale: [f64; 2],
        offset: [f64; 2],
        thickness_domain: ThicknessDomain,
    ) {
        log_grid(&self.id, FieldKind::WeightingPotential, &data);
        let grid = GridField {
            data,
            scale,
            offset,
            boundary: GridBoundary::Bounded,
        };
        replace(
            &self.id,
            FieldKind::WeightingPotential,
            &mut self.weighting_potential,
            DetectorField::grid(grid, thickness_domain),
        );
    }

    /// Install an analytic weighting potential.
    pub fn set_weighting_potential_function(
        &mut self,
        function: FieldFunction<f64>,
        thickness_domain: ThicknessDomain,
        field_type: FieldType,
    ) {
        log::info!("Set {field_type} weighting potential on {}", self.id);
        replace(
            &self.id,
            FieldKind::WeightingPotential,
            &mut self.weighting_potential,
            DetectorField::function(function, thickness_domain, field_type),
        );
    }

    /// Install a tabulated electric field, repeated in every pixel cell.
    pub fn set_electric_field_grid(
        &mut self,
        data: Arc<FieldData<Vector3>>,
        scale: [f64; 2],
        offset: [f64; 2],
        thickness_domain: ThicknessDomain,
    ) {
        log_grid(&self.id, FieldKind::ElectricField, &data);
        let grid = GridField {
            data,
            scale,
            offset,
            boundary: GridBoundary::Periodic,
        };
        replace(
            &self.id,
            FieldKind::ElectricField,
            &mut self.electric_field,
            DetectorField::grid(grid, thickness_domain),
        );
    }

    /// Install an analytic electric field.
    pub fn set_electric_field_function(
        &mut self,
        function: FieldFunction<Vector3>,
        thickness_domain: ThicknessDomain,
        field_type: FieldType,
    ) {
        log::info!("Set {field_type} electric field on {}", self.id);
        replace(
            &self.id,
            FieldKind::ElectricField,
            &mut self.electric_field,
            DetectorField::function(function, thickness_domain, field_type),
        );
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Whether a field of `kind` is installed.
    pub fn has_field(&self, kind: FieldKind) -> bool {
        match kind {
            FieldKind::WeightingPotential => self.weighting_potential.is_some(),
            FieldKind::ElectricField => self.electric_field.is_some(),
        }
    }

    /// How the installed field of `kind` was produced, if any.
    pub fn field_type(&self, kind: FieldKind) -> Option<FieldType> {
        match kind {
            FieldKind::WeightingPotential => self.weighting_potential.as_ref().map(|f| f.field_type()),
            FieldKind::ElectricField => self.electric_field.as_ref().map(|f| f.field_type()),
        }
    }

    /// Thickness domain of the installed field of `kind`, if any.
    pub fn field_domain(&self, kind: FieldKind) -> Option<ThicknessDomain> {
        match kind {
            FieldKind::WeightingPotential => {
                self.weighting_potential.as_ref().map(|f| f.thickness_domain())
            }
            FieldKind::ElectricField => self.electric_field.as_ref().map(|f| f.thickness_domain()),
        }
    }

    /// Weighting potential of `pixel` at `pos` (local frame).
    pub fn weighting_potential(&self, pos: Point3, pixel: PixelIndex) -> Result<f64, FieldQueryError> {
        self.query(FieldKind::WeightingPotential, self.weighting_potential.as_ref(), pos, pixel)
    }

    /// Electric field at `pos` (local frame), addressed relative to `pixel`.
    pub fn electric_field(
        &self,
        pos: Point3,
        pixel: PixelIndex,
    ) -> Result<Vector3, FieldQueryError> {
        self.query(FieldKind::ElectricField, self.electric_field.as_ref(), pos, pixel)
    }

    /// Electric field at `pos`, relative to the pixel containing it.
    ///
    /// Positions outside the pixel matrix are addressed relative to the
    /// nearest pixel cell, which is what a periodic field expects.
    pub fn electric_field_at(&self, pos: Point3) -> Result<Vector3, FieldQueryError> {
        let pitch = self.model.pixel_size();
        let pixel = PixelIndex::new(
            (pos.x / pitch.x).round() as i32,
            (pos.y / pitch.y).round() as i32,
        );
        self.electric_field(pos, pixel)
    }

    fn query<T: FieldValue>(
        &self,
        kind: FieldKind,
        field: Option<&DetectorField<T>>,
        pos: Point3,
        pixel: PixelIndex,
    ) -> Result<T, FieldQueryError> {
        let field = field.ok_or_else(|| FieldQueryError::NotConfigured {
            detector: self.id.clone(),
            kind,
        })?;
        let center = self.model.pixel_center(pixel);
        let local = Point3::new(pos.x - center.x, pos.y - center.y, pos.z);
        Ok(field.evaluate(local, self.model.pixel_size()))
    }
}

fn log_grid<T: FieldValue>(id: &DetectorId, kind: FieldKind, data: &FieldData<T>) {
    let [nx, ny, nz] = data.dimensions();
    log::info!("Set {kind} on {id} with {nx}x{ny}x{nz} cells");
}

fn replace<T: FieldValue>(
    id: &DetectorId,
    kind: FieldKind,
    slot: &mut Option<DetectorField<T>>,
    field: DetectorField<T>,
) {
    if let Some(previous) = slot.replace(field) {
        log::debug!("Replaced {} {kind} on {id}", previous.field_type());
    }
}
