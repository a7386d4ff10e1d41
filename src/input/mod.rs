pub mod log_reader;

pub use log_reader::{LogReader, ReadError};
