mod console;
mod recording;

pub use console::ConsoleNotifier;
pub use recording::RecordingNotifier;
