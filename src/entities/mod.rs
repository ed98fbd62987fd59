pub mod prelude;

pub mod episodes;
pub mod library_paths;
pub mod media_assignments;
pub mod media_directories;
pub mod media_files;
pub mod movies;
pub mod people;
pub mod releases;
pub mod scan_results;
pub mod series;
