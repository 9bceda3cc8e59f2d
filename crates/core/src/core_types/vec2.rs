//! Vector type alias for planar geographic displacements.

use nalgebra::Vector2;

/// 2D vector type for lon/lat displacements and shadow offsets.
///
/// This is a simple alias for `nalgebra::Vector2<f64>`, used where the
/// analysis projects meter-scale offsets into degree space (x = longitude,
/// y = latitude).
pub type Vec2 = Vector2<f64>;
