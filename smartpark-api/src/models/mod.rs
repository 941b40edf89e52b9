mod alert;
mod control;
mod device;
mod notification;
mod telemetry;
mod threshold;

pub use alert::*;
pub use control::*;
pub use device::*;
pub use notification::*;
pub use telemetry::*;
pub use threshold::*;

pub type Id = i32;
