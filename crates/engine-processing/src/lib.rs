pub mod cluster;
pub mod error;
pub mod scan;
pub mod stat;
