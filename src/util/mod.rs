pub mod human;
pub mod lookup;
pub mod normalize;
pub mod report;
