pub mod image_file_reader;
pub mod transient_image_store;
