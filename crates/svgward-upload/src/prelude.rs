pub use crate::error::{Error, UpResult};

pub use tracing::{debug, info, warn};

// vim: ts=4
