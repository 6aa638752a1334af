/// Destination for user-facing status and error text.
///
/// Kept separate from `log`: everything written here is meant for the person
/// who issued the command.
pub trait MessageSink {
    fn println(&mut self, line: &str);
}

/// Writes status lines to stdout and nothing else.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl MessageSink for ConsoleSink {
    fn println(&mut self, line: &str) {
        println!("{}", line);
    }
}

/// Collects lines in memory.
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    pub lines: Vec<String>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl MessageSink for BufferSink {
    fn println(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}
