pub use super::episodes::Entity as Episodes;
pub use super::library_paths::Entity as LibraryPaths;
pub use super::media_assignments::Entity as MediaAssignments;
pub use super::media_directories::Entity as MediaDirectories;
pub use super::media_files::Entity as MediaFiles;
pub use super::movies::Entity as Movies;
pub use super::people::Entity as People;
pub use super::releases::Entity as Releases;
pub use super::scan_results::Entity as ScanResults;
pub use super::series::Entity as Series;
