//! Byte-level scanner that turns a raw input stream into C0 controls,
//! `ESC`/SS3/CSI sequences, and runs of ordinary text.
//!
//! This is the layer underneath [`crate::parser::TerminalInputParser`]:
//! it knows nothing about key codes or mouse protocols, only the VT
//! escape-sequence grammar. A side channel (`VTInputCapture`) lets a
//! caller tell the scanner to buffer raw bytes until a terminator shows
//! up, which is how bracketed paste works: the CSI `200~` event asks
//! for everything up to `ESC [ 201 ~` to come back as `Capture` chunks
//! instead of being re-parsed as escape sequences.

/// Request every event category. There is currently only one category,
/// so this is the only value in practical use, but the const generic
/// is kept so interest filtering can be added without breaking callers.
pub const VT_PARSER_INTEREST_ALL: u32 = u32::MAX;

/// Intermediate bytes (`0x20..=0x2F`) collected before a CSI/ESC final
/// byte. Real sequences carry at most one or two; this stores up to two
/// inline and drops the rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VTIntermediate {
    bytes: [u8; 2],
    len: u8,
}

impl VTIntermediate {
    #[must_use]
    pub const fn empty() -> Self {
        VTIntermediate { bytes: [0; 2], len: 0 }
    }

    #[must_use]
    pub const fn one(byte: u8) -> Self {
        VTIntermediate { bytes: [byte, 0], len: 1 }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn has(&self, byte: u8) -> bool {
        self.bytes[..self.len as usize].contains(&byte)
    }

    fn push(&mut self, byte: u8) {
        if (self.len as usize) < self.bytes.len() {
            self.bytes[self.len as usize] = byte;
            self.len += 1;
        }
    }
}

/// The raw parameter bytes of a CSI sequence (between the private
/// marker/intermediates and the final byte), split on `;`. Fields may
/// themselves carry `:`-separated sub-parameters; callers that care
/// about those split further on the slice `get` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamBuf<'a>(&'a [u8]);

impl<'a> ParamBuf<'a> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        if self.0.is_empty() {
            0
        } else {
            self.0.split(|&b| b == b';').count()
        }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        if self.0.is_empty() {
            return None;
        }
        self.0.split(|&b| b == b';').nth(index)
    }

    /// Parse field `index`, stopping at the first `:` sub-parameter
    /// separator. An empty field parses as zero, matching how terminals
    /// encode an omitted parameter.
    #[must_use]
    pub fn try_parse<T: std::str::FromStr>(&self, index: usize) -> Option<T> {
        let field = self.get(index)?;
        let main = field.split(|&b| b == b':').next().unwrap_or(field);
        let text = std::str::from_utf8(main).ok()?;
        if text.is_empty() { "0".parse().ok() } else { text.parse().ok() }
    }
}

/// A fully-parsed CSI (`ESC [ ...`) sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CSI<'a> {
    pub params: ParamBuf<'a>,
    pub intermediates: VTIntermediate,
    pub private: Option<u8>,
    pub final_byte: u8,
}

/// An SS3 (`ESC O x`) sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SS3 {
    pub char: u8,
}

/// A generic `ESC` sequence (not CSI or SS3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Esc {
    pub intermediates: VTIntermediate,
    pub final_byte: u8,
    pub private: Option<u8>,
}

/// An `ESC` sequence that did not form a valid escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscInvalid {
    /// A single byte that could not continue the sequence.
    One(u8),
    /// Input ended mid-sequence.
    Truncated,
}

/// A single decoded unit of input, borrowing from the buffer it was
/// scanned out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VTEvent<'a> {
    /// A run of bytes that are neither C0 controls nor part of an
    /// escape sequence (printable ASCII, UTF-8 continuation bytes, and
    /// the C0 codes terminals treat as plain text: tab, CR, LF).
    Raw(&'a [u8]),
    /// A single C0 control byte (`0x00..=0x1F` minus tab/CR/LF, or DEL).
    C0(u8),
    Esc(Esc),
    EscInvalid(EscInvalid),
    Csi(CSI<'a>),
    Ss3(SS3),
}

impl<'a> VTEvent<'a> {
    #[must_use]
    pub fn to_owned(&self) -> VTOwnedEvent {
        match *self {
            VTEvent::Raw(bytes) => VTOwnedEvent::Raw(bytes.to_vec()),
            VTEvent::C0(byte) => VTOwnedEvent::C0(byte),
            VTEvent::Esc(esc) => VTOwnedEvent::Esc(esc),
            VTEvent::EscInvalid(esc) => VTOwnedEvent::EscInvalid(esc),
            VTEvent::Csi(csi) => VTOwnedEvent::Csi {
                params: csi.params.0.to_vec(),
                intermediates: csi.intermediates,
                private: csi.private,
                final_byte: csi.final_byte,
            },
            VTEvent::Ss3(ss3) => VTOwnedEvent::Ss3(ss3),
        }
    }
}

/// An owned copy of [`VTEvent`], for buffering past the lifetime of the
/// slice that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VTOwnedEvent {
    Raw(Vec<u8>),
    C0(u8),
    Esc(Esc),
    EscInvalid(EscInvalid),
    Csi {
        params: Vec<u8>,
        intermediates: VTIntermediate,
        private: Option<u8>,
        final_byte: u8,
    },
    Ss3(SS3),
}

/// What a capture-event callback wants the scanner to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VTInputCapture {
    /// Resume normal scanning.
    None,
    /// Buffer raw bytes until `terminator` appears, delivered as
    /// `VTCaptureEvent::Capture` chunks, then a `CaptureEnd`.
    Terminator(&'static [u8]),
}

/// An event from [`VTCapturePushParser::feed_with`]: either a decoded
/// [`VTEvent`], or a chunk/end marker from an active capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VTCaptureEvent<'a> {
    VTEvent(VTEvent<'a>),
    Capture(&'a [u8]),
    CaptureEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    Ss3Wait,
    Csi,
}

struct CaptureState {
    terminator: &'static [u8],
    matched: usize,
    buf: Vec<u8>,
}

/// Incremental scanner: feed it bytes as they arrive, get events back
/// through a callback. Partial sequences at the end of a `feed_with`
/// call carry over into the next one.
pub struct VTCapturePushParser<const INTEREST: u32> {
    state: State,
    private: Option<u8>,
    params: Vec<u8>,
    intermediates: VTIntermediate,
    capture: Option<CaptureState>,
}

impl<const INTEREST: u32> VTCapturePushParser<INTEREST> {
    #[must_use]
    pub const fn new_with_interest<const I: u32>() -> VTCapturePushParser<I> {
        VTCapturePushParser {
            state: State::Ground,
            private: None,
            params: Vec::new(),
            intermediates: VTIntermediate::empty(),
            capture: None,
        }
    }

    fn apply_capture(&mut self, capture: VTInputCapture) {
        if let VTInputCapture::Terminator(terminator) = capture {
            if !terminator.is_empty() {
                self.capture = Some(CaptureState {
                    terminator,
                    matched: 0,
                    buf: Vec::new(),
                });
            }
        }
    }

    /// Feed a chunk of bytes, calling `cb` once per decoded event. The
    /// callback's return value steers capture mode (see
    /// [`VTInputCapture`]).
    pub fn feed_with<F>(&mut self, input: &[u8], mut cb: F)
    where
        F: for<'b> FnMut(VTCaptureEvent<'b>) -> VTInputCapture,
    {
        let mut raw_start: Option<usize> = None;
        let mut i = 0;

        while i < input.len() {
            if let Some(cap) = self.capture.as_mut() {
                // A capture can't start mid-raw-run; nothing to flush.
                let byte = input[i];
                cap.buf.push(byte);
                cap.matched = if byte == cap.terminator[cap.matched] {
                    cap.matched + 1
                } else {
                    usize::from(byte == cap.terminator[0])
                };
                if cap.matched == cap.terminator.len() {
                    let term_len = cap.terminator.len();
                    let data = cap.buf[..cap.buf.len() - term_len].to_vec();
                    self.capture = None;
                    if !data.is_empty() {
                        let next = cb(VTCaptureEvent::Capture(&data));
                        self.apply_capture(next);
                    }
                    cb(VTCaptureEvent::CaptureEnd);
                }
                i += 1;
                continue;
            }

            let byte = input[i];
            match self.state {
                State::Ground => match byte {
                    0x1B => {
                        if let Some(start) = raw_start.take() {
                            let next = cb(VTCaptureEvent::VTEvent(VTEvent::Raw(&input[start..i])));
                            self.apply_capture(next);
                        }
                        self.state = State::Escape;
                    }
                    0x09 | 0x0A | 0x0D => {
                        if raw_start.is_none() {
                            raw_start = Some(i);
                        }
                    }
                    0x00..=0x1F | 0x7F => {
                        if let Some(start) = raw_start.take() {
                            let next = cb(VTCaptureEvent::VTEvent(VTEvent::Raw(&input[start..i])));
                            self.apply_capture(next);
                        }
                        let next = cb(VTCaptureEvent::VTEvent(VTEvent::C0(byte)));
                        self.apply_capture(next);
                    }
                    _ => {
                        if raw_start.is_none() {
                            raw_start = Some(i);
                        }
                    }
                },
                State::Escape => match byte {
                    b'[' => {
                        self.private = None;
                        self.params.clear();
                        self.intermediates = VTIntermediate::empty();
                        self.state = State::Csi;
                    }
                    b'O' => self.state = State::Ss3Wait,
                    0x20..=0x2F => self.intermediates.push(byte),
                    0x30..=0x7E => {
                        let event = VTEvent::Esc(Esc {
                            intermediates: self.intermediates,
                            final_byte: byte,
                            private: None,
                        });
                        self.intermediates = VTIntermediate::empty();
                        self.state = State::Ground;
                        let next = cb(VTCaptureEvent::VTEvent(event));
                        self.apply_capture(next);
                    }
                    _ => {
                        self.intermediates = VTIntermediate::empty();
                        self.state = State::Ground;
                        let next =
                            cb(VTCaptureEvent::VTEvent(VTEvent::EscInvalid(EscInvalid::One(byte))));
                        self.apply_capture(next);
                    }
                },
                State::Ss3Wait => {
                    self.state = State::Ground;
                    let next = cb(VTCaptureEvent::VTEvent(VTEvent::Ss3(SS3 { char: byte })));
                    self.apply_capture(next);
                }
                State::Csi => {
                    if self.params.is_empty()
                        && self.intermediates.is_empty()
                        && self.private.is_none()
                        && matches!(byte, b'<' | b'=' | b'>' | b'?')
                    {
                        self.private = Some(byte);
                    } else if byte.is_ascii_digit() || byte == b';' || byte == b':' {
                        self.params.push(byte);
                    } else if (0x20..=0x2F).contains(&byte) {
                        self.intermediates.push(byte);
                    } else if (0x40..=0x7E).contains(&byte) {
                        let event = VTEvent::Csi(CSI {
                            params: ParamBuf(&self.params),
                            intermediates: self.intermediates,
                            private: self.private,
                            final_byte: byte,
                        });
                        let next = cb(VTCaptureEvent::VTEvent(event));
                        self.params.clear();
                        self.intermediates = VTIntermediate::empty();
                        self.private = None;
                        self.state = State::Ground;
                        self.apply_capture(next);
                    } else {
                        // Malformed CSI body: abandon the sequence.
                        self.params.clear();
                        self.intermediates = VTIntermediate::empty();
                        self.private = None;
                        self.state = State::Ground;
                    }
                }
            }
            i += 1;
        }

        if let Some(start) = raw_start.take() {
            cb(VTCaptureEvent::VTEvent(VTEvent::Raw(&input[start..])));
        }
    }

    /// Flush whatever the scanner was waiting on when input stopped
    /// arriving. A lone trailing `ESC` (no follow-up byte yet) becomes a
    /// plain `Escape` key rather than staying buffered forever; any
    /// other incomplete sequence is quietly dropped.
    #[must_use]
    pub fn idle(&mut self) -> Option<VTCaptureEvent<'static>> {
        match self.state {
            State::Escape => {
                self.state = State::Ground;
                self.intermediates = VTIntermediate::empty();
                Some(VTCaptureEvent::VTEvent(VTEvent::C0(0x1B)))
            }
            State::Csi | State::Ss3Wait => {
                self.state = State::Ground;
                self.params.clear();
                self.intermediates = VTIntermediate::empty();
                self.private = None;
                None
            }
            State::Ground => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn scan(input: &[u8]) -> Vec<VTOwnedEvent> {
        let mut parser = VTCapturePushParser::<VT_PARSER_INTEREST_ALL>::new_with_interest::<
            VT_PARSER_INTEREST_ALL,
        >();
        let mut events = Vec::new();
        parser.feed_with(input, |event| {
            if let VTCaptureEvent::VTEvent(vt_event) = event {
                events.push(vt_event.to_owned());
            }
            VTInputCapture::None
        });
        events
    }

    #[test]
    fn plain_text_is_one_raw_run() {
        let events = scan(b"hello");
        assert_eq!(events, vec![VTOwnedEvent::Raw(b"hello".to_vec())]);
    }

    #[test]
    fn control_byte_splits_raw_runs() {
        let events = scan(b"ab\x01cd");
        assert_eq!(
            events,
            vec![
                VTOwnedEvent::Raw(b"ab".to_vec()),
                VTOwnedEvent::C0(0x01),
                VTOwnedEvent::Raw(b"cd".to_vec()),
            ]
        );
    }

    #[test]
    fn tab_cr_lf_stay_raw() {
        let events = scan(b"a\tb\rc\nd");
        assert_eq!(events, vec![VTOwnedEvent::Raw(b"a\tb\rc\nd".to_vec())]);
    }

    #[test]
    fn csi_cursor_up() {
        let events = scan(b"\x1b[A");
        assert_eq!(
            events,
            vec![VTOwnedEvent::Csi {
                params: Vec::new(),
                intermediates: VTIntermediate::empty(),
                private: None,
                final_byte: b'A',
            }]
        );
    }

    #[test]
    fn csi_with_params_and_private_marker() {
        let events = scan(b"\x1b[?1049h");
        assert_eq!(
            events,
            vec![VTOwnedEvent::Csi {
                params: b"1049".to_vec(),
                intermediates: VTIntermediate::empty(),
                private: Some(b'?'),
                final_byte: b'h',
            }]
        );
    }

    #[test]
    fn ss3_cursor_up() {
        let events = scan(b"\x1bOA");
        assert_eq!(events, vec![VTOwnedEvent::Ss3(SS3 { char: b'A' })]);
    }

    #[test]
    fn esc_alt_key() {
        let events = scan(b"\x1ba");
        assert_eq!(
            events,
            vec![VTOwnedEvent::Esc(Esc {
                intermediates: VTIntermediate::empty(),
                final_byte: b'a',
                private: None,
            })]
        );
    }

    #[test]
    fn idle_flushes_lone_escape_as_c0() {
        let mut parser = VTCapturePushParser::<VT_PARSER_INTEREST_ALL>::new_with_interest::<
            VT_PARSER_INTEREST_ALL,
        >();
        let mut events = Vec::new();
        parser.feed_with(b"\x1b", |event| {
            if let VTCaptureEvent::VTEvent(vt_event) = event {
                events.push(vt_event.to_owned());
            }
            VTInputCapture::None
        });
        assert!(events.is_empty());

        let flushed = parser.idle();
        assert_eq!(flushed, Some(VTCaptureEvent::VTEvent(VTEvent::C0(0x1B))));
    }

    #[test]
    fn bracketed_paste_capture_round_trip() {
        let mut parser = VTCapturePushParser::<VT_PARSER_INTEREST_ALL>::new_with_interest::<
            VT_PARSER_INTEREST_ALL,
        >();
        let mut captured = Vec::new();
        let mut saw_end = false;
        let input = b"\x1b[200~hi there\x1b[201~";
        parser.feed_with(input, |event| match event {
            VTCaptureEvent::VTEvent(VTEvent::Csi(csi)) if csi.final_byte == b'~' => {
                VTInputCapture::Terminator(b"\x1b[201~")
            }
            VTCaptureEvent::Capture(data) => {
                captured.extend_from_slice(data);
                VTInputCapture::None
            }
            VTCaptureEvent::CaptureEnd => {
                saw_end = true;
                VTInputCapture::None
            }
            _ => VTInputCapture::None,
        });
        assert_eq!(captured, b"hi there");
        assert!(saw_end);
    }

    #[test]
    fn param_buf_splits_on_semicolon_and_parses_subfields() {
        let raw = b"97;2;;65";
        let buf = ParamBuf(raw);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.try_parse::<u32>(0), Some(97));
        assert_eq!(buf.try_parse::<u32>(2), Some(0));
        assert_eq!(buf.get(2), Some(&b""[..]));
    }
}
