pub mod device;
pub mod field;
pub mod metrics;
pub mod smart;
