//! Line printer used by the emitter.
//!
//! Every call writes one line. Indentation follows braces: a line starting
//! with `}` is dedented before it is written and a line ending with `{`
//! indents the lines after it, so emitted code comes out formatted without a
//! separate pass. The first write error is kept and every later write is
//! skipped; callers check it once with [`Printer::status`] or
//! [`Printer::finish`].

use std::fmt::{self, Write};

const INDENT: &str = "    ";

/// Accumulates emitted lines into `W`.
#[derive(Debug)]
pub struct Printer<W> {
    w: W,
    depth: usize,
    err: Option<fmt::Error>,
}

impl<W: Write> Printer<W> {
    pub fn new(w: W) -> Self {
        Printer {
            w,
            depth: 0,
            err: None,
        }
    }

    /// Write `args` as one or more lines.
    pub fn line(&mut self, args: fmt::Arguments<'_>) {
        if self.err.is_some() {
            return;
        }
        let mut text = String::new();
        let res = text
            .write_fmt(args)
            .and_then(|()| self.write_lines(&text));
        if let Err(err) = res {
            self.err = Some(err);
        }
    }

    /// Write an empty line.
    pub fn blank(&mut self) {
        self.line(format_args!(""));
    }

    fn write_lines(&mut self, text: &str) -> fmt::Result {
        if text.is_empty() {
            return self.w.write_char('\n');
        }
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                self.w.write_char('\n')?;
                continue;
            }
            if line.starts_with('}') {
                self.depth = self.depth.saturating_sub(1);
            }
            for _ in 0..self.depth {
                self.w.write_str(INDENT)?;
            }
            self.w.write_str(line)?;
            self.w.write_char('\n')?;
            if line.ends_with('{') {
                self.depth += 1;
            }
        }
        Ok(())
    }

    /// The first write error, if any.
    pub fn status(&self) -> fmt::Result {
        match self.err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Return the writer, or the first error hit while writing to it.
    pub fn finish(self) -> Result<W, fmt::Error> {
        self.status()?;
        Ok(self.w)
    }
}

/// `emit!(p, "fmt", args..)` writes one formatted line to a [`Printer`].
macro_rules! emit {
    ($p:expr, $($arg:tt)*) => {
        $p.line(format_args!($($arg)*))
    };
}

pub(crate) use emit;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_brace_indentation() {
        let mut p = Printer::new(String::new());
        emit!(p, "fn f(x: i64) -> i64 {{");
        emit!(p, "if x > {} {{", 0);
        emit!(p, "x");
        emit!(p, "}} else {{");
        emit!(p, "-x");
        emit!(p, "}}");
        emit!(p, "}}");
        p.blank();
        let out = p.finish().unwrap();
        assert_eq!(
            out,
            "fn f(x: i64) -> i64 {\n    if x > 0 {\n        x\n    } else {\n        -x\n    }\n}\n\n"
        );
    }

    struct FailAfter(usize);

    impl Write for FailAfter {
        fn write_str(&mut self, _: &str) -> fmt::Result {
            if self.0 == 0 {
                return Err(fmt::Error);
            }
            self.0 -= 1;
            Ok(())
        }
    }

    #[test]
    fn test_first_error_is_sticky() {
        let mut p = Printer::new(FailAfter(3));
        emit!(p, "a");
        assert!(p.status().is_ok());
        emit!(p, "b");
        assert!(p.status().is_err());
        emit!(p, "c");
        assert!(p.finish().is_err());
    }
}
