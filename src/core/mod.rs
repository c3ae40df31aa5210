pub mod lister;
pub mod runner;

use thiserror::Error;

/// Represents one storage device parsed from the listing command's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub path: String,
    pub size: String,
    pub model_name: String,
    pub transport_type: Option<String>,
    pub logical_sector_size: Option<String>,
    pub physical_sector_size: Option<String>,
    pub partition_table_type: Option<String>,
}

impl Device {
    pub fn new(path: String, size: String, model_name: String) -> Self {
        Self {
            path,
            size,
            model_name,
            transport_type: None,
            logical_sector_size: None,
            physical_sector_size: None,
            partition_table_type: None,
        }
    }

    /// Informational entry shown while no real device is selectable.
    /// Its empty path keeps it out of install actions.
    pub fn placeholder(label: &str) -> Self {
        Self::new(String::new(), String::new(), label.to_string())
    }

    pub fn is_placeholder(&self) -> bool {
        self.path.is_empty()
    }

    /// Model name with the size label appended when one was captured
    pub fn display_label(&self) -> String {
        if self.size.is_empty() {
            self.model_name.clone()
        } else {
            format!("{} ({})", self.model_name, self.size)
        }
    }
}

/// Application state machine
#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Idle,
    /// Typed-confirmation dialog is open for the device at this path
    ConfirmInstall(String),
    Installing,
    Error(String),
    Success(String),
}

/// Errors that can occur while enumerating devices
#[derive(Error, Debug)]
pub enum EnumerationError {
    #[error("failed to launch {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read listing output: {0}")]
    Read(#[from] std::io::Error),

    #[error("invalid match pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Errors that can occur while running the install script
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("failed to launch {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("install output stream failed: {0}")]
    Stream(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_label_appends_size_when_present() {
        let dev = Device::new("/dev/sda".into(), "8GB".into(), "Generic Flash Disk".into());
        assert_eq!(dev.display_label(), "Generic Flash Disk (8GB)");
    }

    #[test]
    fn display_label_is_model_alone_without_size() {
        let dev = Device::new("/dev/sda".into(), String::new(), "Generic Flash Disk".into());
        assert_eq!(dev.display_label(), "Generic Flash Disk");
    }

    #[test]
    fn placeholder_has_empty_path() {
        let dev = Device::placeholder("<select installation disk>");
        assert!(dev.is_placeholder());
        assert_eq!(dev.display_label(), "<select installation disk>");
    }
}
