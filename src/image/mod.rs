pub mod f32;
pub mod io;
pub mod traits;
pub mod volume_f32;

pub use self::f32::ImageF32;
pub use self::traits::{ImageView, ImageViewMut};
pub use self::volume_f32::VolumeF32;
