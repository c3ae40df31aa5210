use std::sync::OnceLock;

use elevate::RunningAs;

static IS_ROOT: OnceLock<bool> = OnceLock::new();

/// Returns whether the current process is running as root/admin.
/// The result is cached on first call using OnceLock.
pub fn is_root() -> bool {
    *IS_ROOT.get_or_init(|| matches!(elevate::check(), RunningAs::Root | RunningAs::Suid))
}
