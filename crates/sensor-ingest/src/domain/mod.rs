mod device_catalog;
mod error;
mod record_sink;
mod uplink;
mod uplink_service;

pub use device_catalog::*;
pub use error::*;
pub use record_sink::*;
pub use uplink::*;
pub use uplink_service::*;
