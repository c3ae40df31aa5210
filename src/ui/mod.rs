pub mod dashboard;
pub mod prompt;

use ratatui::Frame;

use crate::app::App;
use crate::core::AppState;

/// Main draw function: the dashboard is always visible, dialogs and status
/// messages overlay it
pub fn draw(frame: &mut Frame, app: &App) {
    dashboard::draw_dashboard(frame, app);

    match &app.state {
        AppState::Idle | AppState::Installing => {}
        AppState::ConfirmInstall(path) => {
            prompt::draw_confirm_dialog(frame, app, path);
        }
        AppState::Error(msg) => {
            prompt::draw_status_message(frame, msg, prompt::MessageType::Error);
        }
        AppState::Success(msg) => {
            prompt::draw_status_message(frame, msg, prompt::MessageType::Success);
        }
    }
}
