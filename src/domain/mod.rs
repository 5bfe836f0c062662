//! Domain layer: device identity, decoded events, routing policy, clock.
//!
//! Nothing in here performs I/O. Events are decoded from raw stream text,
//! classified by the router, and handed to the sink by the service layer.

pub mod clock;
pub mod device_id;
pub mod event;
pub mod router;

pub use clock::{Clock, FixedClock, SystemClock};
pub use device_id::DeviceId;
pub use event::{Event, ResponseType};
pub use router::{EventRouter, RouteDecision};
