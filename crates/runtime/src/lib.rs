pub mod epoch;
pub mod event_bus;
pub mod invalidation;
pub mod poller;

pub use epoch::*;
pub use event_bus::*;
pub use invalidation::*;
pub use poller::*;
