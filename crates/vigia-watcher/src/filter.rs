//! Name filter restricting observation to XML documents.

use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::{WatchError, WatchResult};

/// Matches file names ending in `.xml`, case-insensitively.
#[derive(Debug, Clone)]
pub struct XmlFilter {
    set: GlobSet,
}

impl XmlFilter {
    /// Compile the XML name pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the glob fails to compile.
    pub fn new() -> WatchResult<Self> {
        let glob = GlobBuilder::new("*.xml")
            .case_insensitive(true)
            .build()
            .map_err(WatchError::pattern)?;
        let mut builder = GlobSetBuilder::new();
        builder.add(glob);
        let set = builder.build().map_err(WatchError::pattern)?;
        Ok(Self { set })
    }

    /// Whether the path's file name is an XML document name.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| self.set.is_match(Path::new(name)))
    }
}
