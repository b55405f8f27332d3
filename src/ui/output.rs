//! Output verbosity.

/// Output verbosity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Show everything, including per-platform detail.
    Verbose,
    /// Show progress and status.
    #[default]
    Normal,
    /// Show only warnings and errors.
    Quiet,
}

impl OutputMode {
    /// Check if this mode shows detail lines (per-platform listings).
    pub fn shows_detail(&self) -> bool {
        matches!(self, Self::Verbose)
    }

    /// Check if this mode shows progress, status messages and headers.
    pub fn shows_status(&self) -> bool {
        !matches!(self, Self::Quiet)
    }
}
