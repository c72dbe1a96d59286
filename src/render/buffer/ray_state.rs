//! Per-pixel ray phase

use crate::core::types::IVec3;

/// Parametric interval `[entry, exit]` along a ray, in voxel units
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub entry: f32,
    pub exit: f32,
}

impl Span {
    pub fn new(entry: f32, exit: f32) -> Self {
        Self { entry, exit }
    }

    pub fn length(&self) -> f32 {
        (self.exit - self.entry).max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        !(self.exit > self.entry)
    }
}

/// The part of a ray inside one occupied voxel
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub voxel: IVec3,
    pub span: Span,
}

/// Where a pixel's ray is in the march/decode cycle.
///
/// `Marching` rays still have `span` of occupied-or-empty grid ahead of
/// them; `Pending` rays have found an occupied voxel that the decode stage
/// has not consumed yet, with `rest` left to march afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum RayPhase {
    Marching(Span),
    Pending { hit: Hit, rest: Span },
    #[default]
    Finished,
}

impl RayPhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, RayPhase::Finished)
    }
}
