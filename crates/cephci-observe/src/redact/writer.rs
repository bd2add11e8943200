use std::io::{self, Write};

use tracing_subscriber::fmt::MakeWriter;

use crate::redact::SensitiveFilter;

/// `MakeWriter` adapter that redacts every formatted event before it reaches `M`.
///
/// The fmt layer asks for one writer per event, so each writer buffers a complete
/// record (message plus fields) and rewrites it in one piece when dropped.
#[derive(Debug, Clone)]
pub struct RedactingMakeWriter<M> {
    inner: M,
    filter: SensitiveFilter,
}

impl<M> RedactingMakeWriter<M> {
    pub fn new(inner: M, filter: SensitiveFilter) -> Self {
        Self { inner, filter }
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<'a, M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer(),
            filter: &self.filter,
            buf: Vec::with_capacity(256),
        }
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer_for(meta),
            filter: &self.filter,
            buf: Vec::with_capacity(256),
        }
    }
}

pub struct RedactingWriter<'a, W: Write> {
    inner: W,
    filter: &'a SensitiveFilter,
    buf: Vec<u8>,
}

impl<W: Write> RedactingWriter<'_, W> {
    fn drain(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let raw = std::mem::take(&mut self.buf);
        // Invalid UTF-8 is written back untouched between the redacted runs.
        for chunk in raw.utf8_chunks() {
            self.inner
                .write_all(self.filter.redact_str(chunk.valid()).as_bytes())?;
            self.inner.write_all(chunk.invalid())?;
        }
        self.inner.flush()
    }
}

impl<W: Write> Write for RedactingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    /// Buffered bytes are held back until the writer is dropped so that a value
    /// is never split from its keyword.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Write> Drop for RedactingWriter<'_, W> {
    fn drop(&mut self) {
        // Nowhere to report a failing sink from here.
        let _ = self.drain();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;
        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn record_is_redacted_as_a_whole() {
        let sink = Capture::default();
        let mk = RedactingMakeWriter::new(sink.clone(), SensitiveFilter::default());
        {
            let mut w = mk.make_writer();
            write!(w, "login password").unwrap();
            writeln!(w, "=s3cr3t user=admin").unwrap();
            w.flush().unwrap();
            assert!(sink.text().is_empty());
        }
        assert_eq!(sink.text(), "login password=<masked> user=admin\n");
    }

    #[test]
    fn invalid_utf8_passes_through() {
        let sink = Capture::default();
        let mk = RedactingMakeWriter::new(sink.clone(), SensitiveFilter::default());
        {
            let mut w = mk.make_writer();
            w.write_all(b"token=abc \xff\xfe tail\n").unwrap();
        }
        assert_eq!(
            sink.0.lock().unwrap().as_slice(),
            b"token=<masked> \xff\xfe tail\n"
        );
    }

    #[test]
    fn coloured_fmt_layer_output_is_redacted() {
        use tracing_subscriber::layer::SubscriberExt;

        let sink = Capture::default();
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .without_time()
            .with_writer(RedactingMakeWriter::new(sink.clone(), SensitiveFilter::default()));
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(token = "abc123", password = "hunter2", "login");
        });

        let out = sink.text();
        assert!(out.contains("login"), "{out:?}");
        assert!(out.contains("\"<masked>\""), "{out:?}");
        assert!(!out.contains("abc123"), "{out:?}");
        assert!(!out.contains("hunter2"), "{out:?}");
    }

    #[test]
    fn fmt_layer_output_is_redacted() {
        use tracing_subscriber::layer::SubscriberExt;

        let sink = Capture::default();
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .without_time()
            .with_writer(RedactingMakeWriter::new(sink.clone(), SensitiveFilter::default()));
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(token = "abc123", "auth with keyring /etc/ceph/ceph.keyring");
        });

        let out = sink.text();
        assert!(out.contains("keyring <masked>"), "{out}");
        assert!(out.contains(r#"token="<masked>""#), "{out}");
        assert!(!out.contains("abc123"), "{out}");
    }
}
