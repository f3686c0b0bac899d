/// Presentation surface of a provisioning attempt.
///
/// The browser version swaps the launch button for a waiting video, writes an
/// inline error block, reloads the page and asks for confirmation; any
/// front end (terminal, test recorder) implements the same four hooks.
pub trait ProvisioningUi: Send + Sync {
    /// Replace the launch action with a waiting indicator.
    fn show_waiting(&self);

    /// Render an inline error block.
    fn show_error(&self, status_text: &str, error_text: &str);

    /// Re-read server-side state after a successful save or reset.
    fn reload(&self);

    /// Blocking yes/no confirmation.
    fn confirm(&self, prompt: &str) -> bool;
}
