//! Output channels for program execution
//!
//! `say` and `echo` write to two independent append-only sinks. The sinks
//! are supplied per execution, so nothing about output handling is global
//! process state.

/// Destination for the two output channels
pub trait Console {
    /// Append a line to the primary channel (`say`)
    fn say(&mut self, text: &str);

    /// Append a line to the secondary channel (`echo`)
    fn echo(&mut self, text: &str);
}

/// Console backed by the process's standard streams: `say` goes to
/// stdout, `echo` to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct StdioConsole;

impl Console for StdioConsole {
    fn say(&mut self, text: &str) {
        println!("{text}");
    }

    fn echo(&mut self, text: &str) {
        eprintln!("{text}");
    }
}

/// Console that collects both channels into in-memory buffers
#[derive(Debug, Clone, Default)]
pub struct BufferConsole {
    say: String,
    echo: String,
}

impl BufferConsole {
    /// Create an empty buffer console
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written to the primary channel so far
    #[must_use]
    pub fn say_output(&self) -> &str {
        &self.say
    }

    /// Everything written to the secondary channel so far
    #[must_use]
    pub fn echo_output(&self) -> &str {
        &self.echo
    }
}

impl Console for BufferConsole {
    fn say(&mut self, text: &str) {
        self.say.push_str(text);
        self.say.push('\n');
    }

    fn echo(&mut self, text: &str) {
        self.echo.push_str(text);
        self.echo.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_keep_channels_separate() {
        let mut console = BufferConsole::new();
        console.say("one");
        console.echo("two");
        console.say("three");

        assert_eq!(console.say_output(), "one\nthree\n");
        assert_eq!(console.echo_output(), "two\n");
    }
}
