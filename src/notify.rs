//! Notification surface
//!
//! The dialog/indicator layer is an external collaborator: the loading queue
//! and the default failure handlers talk to it only through this trait. The
//! built-in [`LogNotifier`] renders everything through the `log` facade,
//! which keeps the crate headless while staying observable.

/// The notification/dialog surface consumed by the client.
pub trait Notifier: Send + Sync {
    /// Show the shared busy indicator. `mask` blocks the whole surface.
    fn notify(&self, text: &str, mask: bool);

    /// Hide the busy indicator and any mask.
    fn hide(&self);

    /// Upgrade an already-visible indicator to a masked one.
    fn set_mask(&self);

    /// Modal informational dialog.
    fn alert(&self, text: &str);

    /// Modal confirmation dialog; the implementation answers for the user.
    fn confirm(&self, text: &str) -> bool;

    /// Modal warning dialog.
    fn warning(&self, text: &str);

    /// Navigate away, e.g. to a sign-in page.
    fn redirect(&self, url: &str);
}

/// Headless notifier that logs every surface interaction.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, text: &str, mask: bool) {
        log::info!("notify: {text} (mask: {mask})");
    }

    fn hide(&self) {
        log::info!("notify hidden");
    }

    fn set_mask(&self) {
        log::info!("notify mask enabled");
    }

    fn alert(&self, text: &str) {
        log::warn!("alert: {text}");
    }

    fn confirm(&self, text: &str) -> bool {
        log::info!("confirm: {text}");
        true
    }

    fn warning(&self, text: &str) {
        log::warn!("warning: {text}");
    }

    fn redirect(&self, url: &str) {
        log::warn!("redirect requested: {url}");
    }
}
