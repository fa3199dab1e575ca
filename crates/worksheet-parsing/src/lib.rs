pub mod broadcast;
pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod parsing;
pub mod schema;
pub mod stream;

pub use broadcast::{ParsingStore, StateChangeEvent};
pub use config::{load_config, load_config_from_str, ParsingConfig};
pub use driver::{ParsingDriver, StreamHandle, StreamRequest};
pub use error::{ConfigError, DriverError, EventError, LoggingError, ParsingError, Result};
pub use parsing::{
    parsing_reducer, reduce, ParsingAction, ParsingContextState, Reduction, StreamType,
    StreamingState, StreamingStatus,
};
pub use schema::{ParsingStats, WorksheetParsingResult};
