mod alert;
mod device;
mod event_log;
mod telemetry;

pub use alert::{AlertRow, AlertTable};
pub use device::{DeviceRow, DeviceTable};
pub use event_log::{EventLog, EventLogTable};
pub use telemetry::{TelemetryRow, TelemetryTable};

pub trait Table {
    /// The name of the table
    fn name(&self) -> &'static str;

    /// The SQL statement to create the table
    fn create(&self) -> String;

    /// The SQL statement to dispose the table
    fn dispose(&self) -> String;

    /// The dependencies of the table
    fn dependencies(&self) -> Vec<&'static str>;
}
