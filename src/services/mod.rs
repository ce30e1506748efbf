pub mod catalog;
pub mod driver;
pub mod options;

pub use catalog::VolumeCatalog;
pub use driver::{Capabilities, DriverConfig, VolumeDriver, VolumeInfo};
pub use options::parse_create_options;
