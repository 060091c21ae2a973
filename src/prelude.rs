//! Standard APIs we use everywhere.

pub use std::path::{Path, PathBuf};

pub use anyhow::{Context as _, Result, anyhow};
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use serde_json::{Map, Value};
#[allow(unused_imports)]
pub use tracing::{debug, error, info, instrument, trace, warn};
