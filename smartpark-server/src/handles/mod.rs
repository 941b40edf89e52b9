mod alert_handle;
mod automation_handle;
mod device_handle;
mod sse_handle;

pub use alert_handle::*;
pub use automation_handle::*;
pub use device_handle::*;
pub use sse_handle::*;
