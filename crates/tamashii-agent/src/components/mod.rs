//! The components the master creates: the manager link, the buzzer and the
//! card reader.

pub mod buzzer;
pub mod card_reader;
pub mod connection;

pub use buzzer::{Buzzer, BuzzerConfig};
pub use card_reader::{CardReader, CardReaderConfig};
pub use connection::{Connection, ConnectionConfig};
