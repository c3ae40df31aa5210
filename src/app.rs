use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::config::Config;
use crate::core::runner::{self, InstallEvent, InstallOutcome};
use crate::core::{AppState, Device, lister};

/// Oldest output lines are dropped past this many
const OUTPUT_CAPACITY: usize = 500;

/// Main application state
pub struct App {
    pub config: Config,
    pub devices: Vec<Device>,
    pub selected_index: usize,
    pub state: AppState,
    pub input_buffer: String,
    /// Install script output, append-only ring shown in the output pane
    pub output_lines: VecDeque<String>,
    pub progress: u64,
    /// Set when the last enumeration failed, so an empty list reads as
    /// "scan failed", not "no devices found"
    pub scan_error: Option<String>,
    pub should_quit: bool,
    pub tick: u64,
    pub events_tx: UnboundedSender<InstallEvent>,
    pub events_rx: UnboundedReceiver<InstallEvent>,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
        Self {
            config,
            devices: Vec::new(),
            selected_index: 0,
            state: AppState::Idle,
            input_buffer: String::new(),
            output_lines: VecDeque::new(),
            progress: 0,
            scan_error: None,
            should_quit: false,
            tick: 0,
            events_tx,
            events_rx,
            cancel_flag: None,
        }
    }

    /// Replace the device list wholesale with a fresh enumeration pass
    pub fn refresh_devices(&mut self) {
        match lister::enumerate_devices(&self.config) {
            Ok(devices) => {
                self.devices = devices;
                self.scan_error = None;
                if self.selected_index >= self.devices.len() && !self.devices.is_empty() {
                    self.selected_index = self.devices.len() - 1;
                }
            }
            Err(e) => {
                log::error!("device enumeration failed: {e}");
                self.devices.clear();
                self.selected_index = 0;
                self.scan_error = Some(e.to_string());
            }
        }
    }

    pub fn select_next(&mut self) {
        if !self.devices.is_empty() {
            self.selected_index = (self.selected_index + 1) % self.devices.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.devices.is_empty() {
            if self.selected_index == 0 {
                self.selected_index = self.devices.len() - 1;
            } else {
                self.selected_index -= 1;
            }
        }
    }

    pub fn selected_device(&self) -> Option<&Device> {
        self.devices.get(self.selected_index)
    }

    pub fn enter_confirm_mode(&mut self) {
        if let Some(device) = self.selected_device() {
            if !device.is_placeholder() {
                self.state = AppState::ConfirmInstall(device.path.clone());
                self.input_buffer.clear();
            }
        }
    }

    pub fn cancel(&mut self) {
        self.state = AppState::Idle;
        self.input_buffer.clear();
    }

    pub fn push_output(&mut self, line: String) {
        if self.output_lines.len() >= OUTPUT_CAPACITY {
            self.output_lines.pop_front();
        }
        self.output_lines.push_back(line);
    }

    /// Kick off the install on a background task. The typed dialog text
    /// becomes the runner's confirmation gate: mismatching text declines.
    /// Only one install may be in flight.
    pub fn start_install(&mut self) {
        if self.state == AppState::Installing {
            return;
        }
        let AppState::ConfirmInstall(target) = self.state.clone() else {
            return;
        };

        let typed = self.input_buffer.trim().to_string();
        let cfg = self.config.clone();
        let tx = self.events_tx.clone();
        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel_flag = Some(Arc::clone(&cancel));
        self.progress = 0;
        self.input_buffer.clear();
        self.state = AppState::Installing;

        tokio::task::spawn_blocking(move || {
            let confirm = |_message: &str, path: &str| typed == path;
            let output = {
                let tx = tx.clone();
                move |line: &str| {
                    let _ = tx.send(InstallEvent::Line(line.to_string()));
                }
            };
            let progress = {
                let tx = tx.clone();
                move |value: u64| {
                    let _ = tx.send(InstallEvent::Progress(value));
                }
            };
            let result = runner::run_install(&cfg, &target, confirm, output, progress, &cancel);
            let _ = tx.send(InstallEvent::Finished(result));
        });
    }

    /// Ask the in-flight install to stop; the runner kills the child
    pub fn request_cancel(&self) {
        if let Some(flag) = &self.cancel_flag {
            flag.store(true, Ordering::SeqCst);
        }
    }

    pub fn handle_install_event(&mut self, event: InstallEvent) {
        match event {
            InstallEvent::Line(line) => self.push_output(line),
            InstallEvent::Progress(value) => self.progress = value,
            InstallEvent::Finished(result) => {
                self.cancel_flag = None;
                match result {
                    Ok(InstallOutcome::Completed) => {
                        self.state = AppState::Success("Installation finished".to_string());
                    }
                    // declined / cancelled / empty target: the runner already
                    // put an explanatory line in the output pane
                    Ok(_) => self.state = AppState::Idle,
                    Err(e) => {
                        log::error!("install failed: {e}");
                        self.state = AppState::Error(e.to_string());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_ring_is_capped() {
        let mut app = App::new(Config::default());
        for i in 0..(OUTPUT_CAPACITY + 10) {
            app.push_output(format!("line {i}"));
        }
        assert_eq!(app.output_lines.len(), OUTPUT_CAPACITY);
        assert_eq!(app.output_lines.front().map(String::as_str), Some("line 10"));
    }

    #[test]
    fn start_install_refuses_outside_confirm_state() {
        let mut app = App::new(Config::default());
        app.state = AppState::Installing;
        app.progress = 42;

        // second trigger while one is in flight must be a no-op
        app.start_install();
        assert_eq!(app.state, AppState::Installing);
        assert_eq!(app.progress, 42);

        app.state = AppState::Idle;
        app.start_install();
        assert_eq!(app.state, AppState::Idle);
    }
}
