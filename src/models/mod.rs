pub mod assignment;
pub mod catalog;
pub mod media;
pub mod scan;
