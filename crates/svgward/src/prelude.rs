pub use crate::error::{Error, SvResult};

pub use tracing::{debug, info, trace, warn};

// vim: ts=4
