//! The `portal_core` crate decides which of six worlds a point of the trefoil
//! portal scene belongs to, as seen from a viewer who may themselves have
//! walked through the portal.
//!
//! Key components:
//! - **Solvers**: closed-form real roots of quadratics, cubics and quartics.
//! - **Portal**: the world-crossing traversal along straight segments and the
//!   two-hop resolution of a rendered sample.
//! - **Trefoil / Modeling**: the knot's parameterization and the scene meshes.
//! - **Scene**: the viewer and the balls, each threading its world as it moves.

pub mod error;
pub mod modeling;
pub mod portal;
pub mod scene;
pub mod solvers;
pub mod traits;
pub mod trefoil;
