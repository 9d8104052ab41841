mod epoch;
pub use epoch::*;

pub mod logging;
pub use logging::{FileLogger, StdoutLogger, init_file_logger, init_stdout_logger};

pub mod time;
pub use time::*;

// downstream crates log through `base::log::*`
pub use log;
