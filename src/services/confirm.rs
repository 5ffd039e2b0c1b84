/// Synchronous yes/no prompt shown before a side-effecting operation. The
/// presentation layer supplies the interactive implementation.
pub trait ConfirmPrompt: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// Accepts every prompt. Suits headless use and scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl ConfirmPrompt for AlwaysConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// Declines every prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl ConfirmPrompt for NeverConfirm {
    fn confirm(&self, _message: &str) -> bool {
        false
    }
}
