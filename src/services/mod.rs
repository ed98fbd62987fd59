pub mod error;
pub use error::LibraryError;

pub mod filesystem;
pub use filesystem::FileSystemManager;

pub mod image;
pub use image::ImageService;

pub mod media_info;

pub mod metadata;
pub use metadata::MetadataExtractor;

pub mod media_service;
pub mod media_service_impl;
pub use media_service::{MediaError, MediaService};
pub use media_service_impl::SeaOrmMediaService;

pub mod movie_form;
pub use movie_form::{FormError, MovieForm, MovieFormService};

pub mod scanner;
pub use scanner::LibraryScanner;

pub mod tasks;
pub use tasks::TaskManager;
