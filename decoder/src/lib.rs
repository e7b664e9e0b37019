mod decoder;
mod file_decoder;

pub use decoder::*;
pub use file_decoder::FileDecoder;
