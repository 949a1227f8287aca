use smol_str::SmolStr;

/// Document-level compile settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileOptions {
    /// Written into `<title>` when set.
    pub title: Option<SmolStr>,
}

impl CompileOptions {
    pub fn with_title(title: impl Into<SmolStr>) -> Self {
        Self {
            title: Some(title.into()),
        }
    }
}
