pub mod omdb;
