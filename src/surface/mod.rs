//! Surface backends.
//!
//! [`HeadlessSurface`] lays text out in memory and is what scripted runs
//! and tests render onto; [`PointerRouter`] converts pointer positions
//! into the enter/leave/move inputs a real host would dispatch.

pub mod headless;
pub mod router;

pub use headless::{HeadlessSurface, Viewport};
pub use router::PointerRouter;
