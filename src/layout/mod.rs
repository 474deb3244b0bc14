/*!
 * Page layout: detected regions and text reflow.
 */

pub use self::reflow::Reflow;
pub use self::region::{BoundingBox, Detection, Region, RegionExtractor, RegionLabel, RegionRole};

pub mod reflow;
pub mod region;
