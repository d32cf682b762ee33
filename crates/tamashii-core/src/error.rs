use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Event errors
    #[error("Event body is not valid UTF-8")]
    NonUtf8Body,

    #[error("Unknown system command: {0}")]
    UnknownSystemCommand(String),

    // Framing errors
    #[error("Frame body of {size} bytes exceeds maximum of {max} bytes")]
    FrameTooLarge { size: usize, max: usize },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
