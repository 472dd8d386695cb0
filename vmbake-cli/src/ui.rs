use vmbake::Ui;

/// Terminal Ui. Everything goes to stderr so stdout stays machine-readable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleUi;

impl Ui for ConsoleUi {
    fn say(&self, message: &str) {
        eprintln!("==> {}", message);
    }

    fn message(&self, message: &str) {
        for line in message.lines() {
            eprintln!("    {}", line);
        }
    }

    fn error(&self, message: &str) {
        eprintln!("Error: {}", message);
    }
}
