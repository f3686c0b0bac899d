use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use sandbox_client::ProvisioningUi;

/// Terminal rendering of the provisioning hooks.
///
/// `reload` only records that server state changed; the command re-reads the
/// status afterwards.
#[derive(Debug, Default)]
pub struct TerminalUi {
    assume_yes: bool,
    reloaded: AtomicBool,
}

impl TerminalUi {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            reloaded: AtomicBool::new(false),
        }
    }

    pub fn reloaded(&self) -> bool {
        self.reloaded.load(Ordering::SeqCst)
    }
}

impl ProvisioningUi for TerminalUi {
    fn show_waiting(&self) {
        eprintln!("Provisioning your sandbox, this can take a few minutes...");
    }

    fn show_error(&self, status_text: &str, error_text: &str) {
        eprintln!("{status_text}: {error_text}");
    }

    fn reload(&self) {
        self.reloaded.store(true, Ordering::SeqCst);
    }

    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{prompt} [y/N] ");
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}
