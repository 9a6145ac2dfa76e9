pub mod fields;
pub mod smart;
pub mod tables;
