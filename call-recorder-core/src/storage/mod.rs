pub mod library;
pub mod metadata;
pub mod raw_writer;
