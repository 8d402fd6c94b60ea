//! Bounded ring buffer over a process's diagnostic output.
//!
//! The decode tool is chatty; for failure reports only the last few lines
//! matter. [`LogTail`] keeps a fixed number of the most recent lines and
//! renders them joined for log attachment.

use std::collections::VecDeque;
use std::fmt;

/// Ring buffer of the most recent diagnostic lines.
#[derive(Clone, Debug, Default)]
pub struct LogTail {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogTail {
    /// Creates a tail keeping at most `capacity` lines (clamped to 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Appends a line, evicting the oldest when full.
    pub fn push(&mut self, line: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Number of retained lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if no line was retained.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for LogTail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_most_recent_lines() {
        let mut tail = LogTail::new(3);
        for line in ["a", "b", "c", "d", "e"] {
            tail.push(line.to_string());
        }
        assert_eq!(tail.len(), 3);
        assert_eq!(tail.to_string(), "c\nd\ne");
    }

    #[test]
    fn capacity_is_clamped_to_one() {
        let mut tail = LogTail::new(0);
        tail.push("only".to_string());
        tail.push("last".to_string());
        assert_eq!(tail.to_string(), "last");
    }

    #[test]
    fn empty_tail_renders_empty() {
        let tail = LogTail::new(3);
        assert!(tail.is_empty());
        assert_eq!(tail.to_string(), "");
    }
}
