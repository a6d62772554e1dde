//! Writer configuration.
//!
//! Options can be set programmatically or picked up from environment
//! variables with [`WriterOptions::from_env`]:
//!
//! ```
//! use gmt_vector::config::WriterOptions;
//!
//! let options = WriterOptions { use_tab: true };
//! assert_eq!(options.separator(), '\t');
//! assert_eq!(WriterOptions::default().separator(), ' ');
//! ```

/// Environment variable selecting tab-separated vertex coordinates.
pub const GMT_USE_TAB: &str = "GMT_USE_TAB";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriterOptions {
    /// Separate vertex coordinates with a tab instead of a space.
    pub use_tab: bool,
}

impl WriterOptions {
    /// Read options from the environment. Unset variables keep their
    /// default value.
    pub fn from_env() -> Self {
        let use_tab = std::env::var(GMT_USE_TAB)
            .map(|value| test_bool(&value))
            .unwrap_or(false);
        Self { use_tab }
    }

    pub fn separator(&self) -> char {
        if self.use_tab { '\t' } else { ' ' }
    }
}

/// `YES`, `ON`, `TRUE` and `1` are true, case-insensitively.
fn test_bool(value: &str) -> bool {
    let value = value.trim();
    ["YES", "ON", "TRUE", "1"]
        .iter()
        .any(|truthy| value.eq_ignore_ascii_case(truthy))
}
