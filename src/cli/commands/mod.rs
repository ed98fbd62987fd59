mod add;
mod ls;
mod movies;
mod probe;
mod scan;
mod search;

pub use add::cmd_add_movie;
pub use ls::cmd_list_directory;
pub use movies::cmd_list_movies;
pub use probe::cmd_probe;
pub use scan::cmd_scan_library;
pub use search::cmd_search_movies;
