mod alert_service;
mod automation_service;
mod control_service;
mod notification_hub;
mod polling_service;
mod system_state;
mod telemetry_service;

pub use alert_service::*;
pub use automation_service::*;
pub use control_service::*;
pub use notification_hub::*;
pub use polling_service::*;
pub use system_state::*;
pub use telemetry_service::*;
