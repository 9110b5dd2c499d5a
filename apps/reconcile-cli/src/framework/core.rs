pub mod execute;
pub mod infrastructure;
pub mod params;
pub mod plan;
pub mod query;
