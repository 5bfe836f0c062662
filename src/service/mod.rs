//! Service layer: per-message pipeline and device supervision.

pub mod pipeline;
pub mod supervisor;

pub use pipeline::{EventPipeline, MessageOutcome};
pub use supervisor::{DeviceExit, DeviceReport, DeviceState, FleetReport, FleetSupervisor};
