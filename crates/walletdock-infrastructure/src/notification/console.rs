use std::io::Write;
use tracing::{error, info, warn};

use walletdock_domain::notification::{Notice, NoticeLevel, Notifier};

/// Prints notices on stdout, one line each, and mirrors them to the log
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }

    pub fn format(notice: &Notice) -> String {
        let tag = match notice.level {
            NoticeLevel::Info => "[info]",
            NoticeLevel::Success => "[ok]",
            NoticeLevel::Warning => "[warn]",
            NoticeLevel::Error => "[error]",
        };
        match &notice.content {
            Some(content) => format!("{} {}: {}", tag, notice.title, content),
            None => format!("{} {}", tag, notice.title),
        }
    }

    fn write_line(out: &mut impl Write, notice: &Notice) -> std::io::Result<()> {
        writeln!(out, "{}", Self::format(notice))?;
        out.flush()
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info | NoticeLevel::Success => info!(notice = %notice.title, "Notice shown"),
            NoticeLevel::Warning => warn!(notice = %notice.title, "Notice shown"),
            NoticeLevel::Error => error!(notice = %notice.title, "Notice shown"),
        }

        if let Err(e) = Self::write_line(&mut std::io::stdout().lock(), &notice) {
            warn!("Failed to print notice {:?}: {}", notice.title, e);
        }
    }
}
