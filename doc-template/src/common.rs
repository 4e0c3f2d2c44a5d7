pub use anyhow::{format_err, Context as _, Result};
pub use doc_region::RatioRegion;
pub use indexmap::IndexMap;
pub use itertools::Itertools as _;
pub use log::{error, info, warn};
pub use once_cell::sync::OnceCell;
pub use regex::Regex;
pub use serde::{Deserialize, Serialize};
pub use serde_json::Value;
pub use std::path::{Path, PathBuf};
