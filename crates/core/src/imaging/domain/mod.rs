pub mod image_payload;
pub mod image_reader;
