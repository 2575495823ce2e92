//! Internal module for the buffered character source of the reader
//!
//! [`JsonInput`] wraps either a file, which is read chunk by chunk, or a borrowed
//! in-memory buffer behind the same cursor interface.

use std::{
    fs::File,
    io::{ErrorKind, Read},
    path::Path,
};

use crate::{
    reader::{CancelHandle, Failure, ParseErrorKind},
    text::GrowableText,
    utf8,
};

/// Input of a read operation
#[derive(Clone, Copy, Debug)]
pub(crate) enum Source<'s> {
    File(&'s Path),
    Buffer(&'s [u8]),
}

enum Data<'s> {
    File { file: File, chunk: Vec<u8> },
    Buffer(&'s [u8]),
}

/// Whether the byte is skipped by non-verbatim reads
fn is_insignificant(byte: u8) -> bool {
    matches!(byte, b' ' | b'\r' | b'\n' | b'\t' | b':' | b',' | b'\0')
}

fn hex_value(byte: u8) -> Result<u32, Failure> {
    match byte {
        b'0'..=b'9' => Ok(u32::from(byte - b'0')),
        b'a'..=b'f' => Ok(u32::from(byte - b'a' + 10)),
        b'A'..=b'F' => Ok(u32::from(byte - b'A' + 10)),
        _ => Err(Failure::Parse(ParseErrorKind::InvalidHexDigit)),
    }
}

/// Callback registered for progress notifications, with its threshold step
pub(crate) struct ProgressListener<'a> {
    pub(crate) step_percent: u8,
    pub(crate) callback: Box<dyn FnMut(u8) + 'a>,
}

/// Tracks when the next progress notification is due
struct ProgressTracker<'a> {
    listener: ProgressListener<'a>,
    total_len: u64,
    /// Position at which the next notification is due
    next_threshold: u64,
}

impl<'a> ProgressTracker<'a> {
    fn new(mut listener: ProgressListener<'a>, total_len: u64) -> Self {
        listener.step_percent = listener.step_percent.clamp(1, 100);
        let mut tracker = ProgressTracker {
            listener,
            total_len,
            next_threshold: u64::MAX,
        };
        tracker.arm(tracker.listener.step_percent);
        tracker
    }

    /// Sets the next threshold to `percent` of the total length
    fn arm(&mut self, percent: u8) {
        self.next_threshold = if self.total_len == 0 || percent >= 100 {
            // 100% is only reported by `finish`
            u64::MAX
        } else {
            // Rounded up, so that crossing it means at least `percent` were read
            (self.total_len * u64::from(percent)).div_ceil(100).max(1)
        };
    }

    fn update(&mut self, position: u64) {
        if position < self.next_threshold {
            return;
        }
        let percent = (position * 100 / self.total_len).min(100) as u8;
        if percent < 100 {
            (self.listener.callback)(percent);
        }
        let step = self.listener.step_percent;
        let next_percent = (u16::from(percent / step) + 1) * u16::from(step);
        self.arm(next_percent.min(100) as u8);
    }

    fn finish(&mut self) {
        (self.listener.callback)(100);
    }
}

/// Cursor over the JSON data
///
/// The cursor index starts at a sentinel so that the first advance lands on the
/// first byte of the data.
pub(crate) struct JsonInput<'s, 'a> {
    data: Data<'s>,
    /// Number of valid bytes in the current chunk
    buf_len: usize,
    /// Index of the current byte within the current chunk
    idx: usize,
    /// Number of bytes consumed from the start of the input
    position: u64,
    is_eof: bool,
    progress: Option<ProgressTracker<'a>>,
    cancel: CancelHandle,
}

impl<'s, 'a> JsonInput<'s, 'a> {
    /// Opens the source; for files the total size is determined and the first chunk is read
    pub(crate) fn open(
        source: Source<'s>,
        file_buffer_size: usize,
        progress: Option<ProgressListener<'a>>,
        cancel: CancelHandle,
    ) -> Result<Self, Failure> {
        let (data, total_len) = match source {
            Source::File(path) => {
                let file = File::open(path).map_err(Failure::Io)?;
                let total_len = file.metadata().map_err(Failure::Io)?.len();
                let chunk = vec![0; file_buffer_size.max(1)];
                (Data::File { file, chunk }, total_len)
            }
            Source::Buffer(buffer) => {
                // The buffer ends at its NUL terminator, if any
                let len = buffer.iter().position(|b| *b == 0).unwrap_or(buffer.len());
                let buffer = &buffer[..len];
                (Data::Buffer(buffer), buffer.len() as u64)
            }
        };
        log::debug!("opened JSON input of {total_len} bytes");

        let mut input = JsonInput {
            data,
            buf_len: 0,
            idx: usize::MAX,
            position: 0,
            is_eof: false,
            progress: progress.map(|listener| ProgressTracker::new(listener, total_len)),
            cancel,
        };
        match input.data {
            Data::Buffer(buffer) => input.buf_len = buffer.len(),
            Data::File { .. } => {
                input.fill_buffer()?;
            }
        }
        // `fill_buffer` moves the index; restore the sentinel
        input.idx = usize::MAX;
        Ok(input)
    }

    fn chunk(&self) -> &[u8] {
        match &self.data {
            Data::File { chunk, .. } => &chunk[..self.buf_len],
            Data::Buffer(buffer) => buffer,
        }
    }

    /// Refills the chunk from the file
    ///
    /// Returns `false` if no more data is available; buffer sources are never refilled.
    fn fill_buffer(&mut self) -> Result<bool, Failure> {
        let Data::File { file, chunk } = &mut self.data else {
            return Ok(false);
        };
        let read_bytes_count = loop {
            match file.read(chunk) {
                Ok(read_bytes_count) => break read_bytes_count,
                // Retry if interrupted
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Failure::Io(e)),
            }
        };
        log::trace!(
            "read chunk of {read_bytes_count} bytes at position {}",
            self.position
        );
        if read_bytes_count == 0 {
            return Ok(false);
        }
        self.buf_len = read_bytes_count;
        self.idx = 0;
        Ok(true)
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.is_eof
    }

    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    pub(crate) fn check_cancelled(&self) -> Result<(), Failure> {
        if self.cancel.is_cancelled() {
            Err(Failure::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Advances to the next byte and returns it
    ///
    /// Unless `verbatim` is set, whitespace, `:`, `,` and NUL are skipped. At the end
    /// of the input `0` is returned and [`is_eof`](Self::is_eof) is set; advancing
    /// again afterwards fails with [`Failure::UnexpectedEof`].
    pub(crate) fn next_char(&mut self, verbatim: bool) -> Result<u8, Failure> {
        if self.is_eof {
            return Err(Failure::UnexpectedEof);
        }
        if !verbatim {
            self.check_cancelled()?;
        }
        loop {
            let mut next = self.idx.wrapping_add(1);
            if next >= self.buf_len {
                if !self.fill_buffer()? {
                    self.is_eof = true;
                    self.idx = self.buf_len;
                    return Ok(0);
                }
                next = 0;
            }
            self.idx = next;
            self.position += 1;
            if let Some(progress) = &mut self.progress {
                progress.update(self.position);
            }

            let byte = self.chunk()[next];
            if verbatim || !is_insignificant(byte) {
                return Ok(byte);
            }
        }
    }

    /// Like [`next_char`](Self::next_char), but reaching the end of the input is an error
    pub(crate) fn next_char_required(&mut self, verbatim: bool) -> Result<u8, Failure> {
        let byte = self.next_char(verbatim)?;
        if self.is_eof {
            return Err(Failure::UnexpectedEof);
        }
        Ok(byte)
    }

    /// Gets the byte at the cursor without advancing; `0` if there is none
    pub(crate) fn current_char(&self) -> u8 {
        self.chunk().get(self.idx).copied().unwrap_or(0)
    }

    /// Steps back exactly one byte, so that the next advance returns the current byte again
    pub(crate) fn go_to_previous_char(&mut self) {
        if self.is_eof {
            // Next advance detects the end of the input again
            self.is_eof = false;
        } else {
            self.idx = self.idx.wrapping_sub(1);
            self.position -= 1;
        }
    }

    /// Advances until the byte at the cursor is `"`
    pub(crate) fn go_to_next_quote(&mut self) -> Result<(), Failure> {
        while self.current_char() != b'"' {
            self.next_char_required(true)?;
        }
        Ok(())
    }

    /// Advances to the first significant byte of the document
    ///
    /// Returns `false` if the input is empty or only contains whitespace. The byte is
    /// not checked; whether it can start a value is up to the parser.
    pub(crate) fn find_first_char(&mut self) -> Result<bool, Failure> {
        self.next_char(false)?;
        Ok(!self.is_eof)
    }

    /// Decodes the escape sequence following a consumed `\` and appends it to `text`
    pub(crate) fn read_escape_sequence(&mut self, text: &mut GrowableText) -> Result<(), Failure> {
        let byte = self.next_char_required(true)?;
        self.decode_escape(byte, text)
    }

    fn decode_escape(&mut self, byte: u8, text: &mut GrowableText) -> Result<(), Failure> {
        let decoded = match byte {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0C,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => return self.read_escaped_code_point(text),
            _ => return Err(Failure::Parse(ParseErrorKind::InvalidEscapeSequence)),
        };
        text.push(decoded);
        Ok(())
    }

    fn read_hex_code_unit(&mut self) -> Result<u32, Failure> {
        let mut code_unit = 0;
        for _ in 0..4 {
            code_unit = code_unit << 4 | hex_value(self.next_char_required(true)?)?;
        }
        Ok(code_unit)
    }

    /// Reads the `XXXX` of a `\uXXXX` escape and appends the code point as UTF-8
    ///
    /// A high surrogate directly followed by an escaped low surrogate is combined;
    /// unpaired surrogates are replaced with U+FFFD.
    fn read_escaped_code_point(&mut self, text: &mut GrowableText) -> Result<(), Failure> {
        let mut code_point = self.read_hex_code_unit()?;

        while utf8::is_high_surrogate(code_point) {
            if self.next_char_required(true)? != b'\\' {
                self.go_to_previous_char();
                break;
            }
            let escape = self.next_char_required(true)?;
            if escape != b'u' {
                Self::append_code_point(code_point, text);
                return self.decode_escape(escape, text);
            }
            let next = self.read_hex_code_unit()?;
            if utf8::is_low_surrogate(next) {
                code_point = utf8::combine_surrogates(code_point, next);
            } else {
                // `next` can itself be the high surrogate of a pair
                Self::append_code_point(code_point, text);
                code_point = next;
            }
        }

        Self::append_code_point(code_point, text);
        Ok(())
    }

    fn append_code_point(code_point: u32, text: &mut GrowableText) {
        let mut buf = [0_u8; utf8::MAX_BYTES_PER_CHAR];
        text.extend_from_slice(utf8::encode_code_point(code_point, &mut buf));
        text.set_ascii(false);
    }

    /// Delivers the final 100% progress notification, if a listener is registered
    pub(crate) fn notify_progress_end(&mut self) {
        if let Some(progress) = &mut self.progress {
            progress.finish();
        }
    }
}
