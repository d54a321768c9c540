//! Ordered, line-granular output.
//!
//! The dispatcher and the search thread both print through an
//! [`OutputSink`]. Each call writes its lines under one lock and flushes, so
//! a multi-line reply can never be split by an `info` line.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Clone)]
pub struct OutputSink {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl OutputSink {
    #[must_use]
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        OutputSink {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    #[must_use]
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    #[must_use]
    pub fn stderr() -> Self {
        Self::from_writer(io::stderr())
    }

    pub fn line(&self, line: impl AsRef<str>) {
        self.lines([line]);
    }

    pub fn lines<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = self.inner.lock();
        let written = lines
            .into_iter()
            .try_for_each(|line| writeln!(out, "{}", line.as_ref()))
            .and_then(|()| out.flush());
        if let Err(err) = written {
            log::warn!("failed to write output: {err}");
        }
    }
}

/// In-memory writer whose contents can be read while a sink holds a clone.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
