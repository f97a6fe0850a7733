use std::sync::Mutex;

use walletdock_domain::notification::{Notice, NoticeLevel, Notifier};

/// Keeps every notice in memory, for embedding front ends and tests
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices
            .lock()
            .map(|n| n.iter().filter(|notice| notice.level == level).count())
            .unwrap_or(0)
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().ok().and_then(|n| n.last().cloned())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_level() {
        let notifier = RecordingNotifier::new();
        notifier.notify(Notice::success("a"));
        notifier.notify(Notice::error("b"));
        notifier.notify(Notice::success("c"));

        assert_eq!(notifier.count(NoticeLevel::Success), 2);
        assert_eq!(notifier.count(NoticeLevel::Error), 1);
        assert_eq!(notifier.last().unwrap().title, "c");
        assert_eq!(notifier.notices().len(), 3);
    }
}
