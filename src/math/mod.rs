mod extent;
mod transform;

pub use extent::Extent;
pub use transform::{MapTransform, WorldConfig};
