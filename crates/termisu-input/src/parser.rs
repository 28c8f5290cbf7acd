use crate::engine::{
    VT_PARSER_INTEREST_ALL, VTCaptureEvent, VTCapturePushParser, VTEvent, VTInputCapture,
};

use crate::event::TerminalInputEvent;

struct ParserState {
    // Buffer for incomplete UTF-8 sequences from previous feed (max 4 bytes)
    utf8_buffer: [u8; crate::char::MAX_UTF8_CHAR_BYTES],
    utf8_buffer_len: usize,
    paste_buffer: Vec<u8>,
}

impl ParserState {
    const fn new() -> Self {
        Self {
            utf8_buffer: [0; crate::char::MAX_UTF8_CHAR_BYTES],
            utf8_buffer_len: 0,
            paste_buffer: Vec::new(),
        }
    }
}

pub struct TerminalInputParser {
    seq_parser: VTCapturePushParser<VT_PARSER_INTEREST_ALL>,
    state: ParserState,
}

impl Default for TerminalInputParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalInputParser {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            seq_parser: VTCapturePushParser::new_with_interest::<VT_PARSER_INTEREST_ALL>(),
            state: ParserState::new(),
        }
    }

    /// Decode a buffer of bytes into a series of events.
    pub fn decode_buffer<'a>(input: &'a [u8], mut cb: impl for<'b> FnMut(TerminalInputEvent<'b>)) {
        let mut parser = TerminalInputParser::new();
        parser.feed_with(input, &mut cb);
    }

    // =====================
    // Callback-driven API
    // =====================

    /// Feed bytes into the parser. This is the main entry point for the parser.
    /// It will call the callback with events as they are emitted.
    ///
    /// The callback must be valid for the lifetime of the `feed_with` call.
    ///
    /// The callback may emit any number of events (including zero), depending
    /// on the state of the internal parser.
    #[inline]
    pub fn feed_with<'this, 'input, F: for<'any> FnMut(TerminalInputEvent<'any>)>(
        &'this mut self,
        input: &'input [u8],
        cb: &mut F,
    ) {
        self.seq_parser
            .feed_with(input, |vt_event: VTCaptureEvent<'_>| {
                Self::process_vt_event(&vt_event, &mut self.state, cb)
            });
    }

    fn process_vt_event<F: for<'any> FnMut(TerminalInputEvent<'any>)>(
        vt_event: &VTCaptureEvent,
        state: &mut ParserState,
        cb: &mut F,
    ) -> VTInputCapture {
        match vt_event {
            VTCaptureEvent::VTEvent(VTEvent::Raw(bytes)) => {
                if state.utf8_buffer_len == 0 {
                    state.utf8_buffer_len =
                        crate::char::bytes_to_events(bytes, &mut state.utf8_buffer, cb);
                } else {
                    let buf_len = state.utf8_buffer_len;

                    // Combine buffered bytes with just enough new bytes to
                    // complete a UTF-8 char (max 4 bytes total).
                    let mut temp_buf = [0u8; crate::char::MAX_UTF8_CHAR_BYTES];
                    temp_buf[..buf_len].copy_from_slice(&state.utf8_buffer[..buf_len]);

                    let take = bytes.len().min(crate::char::MAX_UTF8_CHAR_BYTES - buf_len);
                    temp_buf[buf_len..buf_len + take].copy_from_slice(&bytes[..take]);

                    let incomplete_len = crate::char::bytes_to_events(
                        &temp_buf[..buf_len + take],
                        &mut state.utf8_buffer,
                        cb,
                    );

                    state.utf8_buffer_len = if take < bytes.len() && incomplete_len <= take {
                        // Process from start of incomplete sequence (or from take if none)
                        crate::char::bytes_to_events(
                            &bytes[take - incomplete_len..],
                            &mut state.utf8_buffer,
                            cb,
                        )
                    } else {
                        // No more input, or incomplete bytes span buffer boundary
                        incomplete_len
                    };
                }
                VTInputCapture::None
            }
            VTCaptureEvent::VTEvent(vt_event @ VTEvent::Csi(csi)) => {
                if let Some(internal_event) = crate::csi::parse_csi(csi) {
                    match internal_event {
                        crate::event::InternalEvent::Event(event) => {
                            cb(event);
                            VTInputCapture::None
                        }
                        crate::event::InternalEvent::BracketedPasteStart => {
                            state.paste_buffer.clear();
                            VTInputCapture::Terminator(b"\x1b[201~")
                        }
                    }
                } else {
                    // Emit unrecognized CSI as LowLevel event
                    cb(TerminalInputEvent::LowLevel(vt_event));
                    VTInputCapture::None
                }
            }
            VTCaptureEvent::VTEvent(vt_event @ VTEvent::C0(byte)) => {
                cb(crate::c0::parse_c0(*byte).unwrap_or(TerminalInputEvent::LowLevel(vt_event)));
                VTInputCapture::None
            }
            VTCaptureEvent::VTEvent(vt_event @ VTEvent::Esc(esc)) => {
                cb(crate::esc::parse_esc(*esc).unwrap_or(TerminalInputEvent::LowLevel(vt_event)));
                VTInputCapture::None
            }
            VTCaptureEvent::VTEvent(vt_event @ VTEvent::EscInvalid(esc)) => {
                cb(crate::esc::parse_esc_invalid(*esc)
                    .unwrap_or(TerminalInputEvent::LowLevel(vt_event)));
                VTInputCapture::None
            }
            VTCaptureEvent::VTEvent(vt_event @ VTEvent::Ss3(ss3)) => {
                cb(crate::ss::parse_ss3(*ss3).unwrap_or(TerminalInputEvent::LowLevel(vt_event)));
                VTInputCapture::None
            }
            VTCaptureEvent::Capture(data) => {
                state.paste_buffer.extend_from_slice(data);
                VTInputCapture::None
            }
            VTCaptureEvent::CaptureEnd => {
                cb(TerminalInputEvent::Paste(&state.paste_buffer));
                state.paste_buffer.clear();
                VTInputCapture::None
            }
            VTCaptureEvent::VTEvent(vt_event) => {
                cb(TerminalInputEvent::LowLevel(vt_event));
                VTInputCapture::None
            }
        }
    }

    /// Handle idle state by flushing any incomplete escape sequences.
    ///
    /// This method should be called when input has stopped but the parser
    /// may be in the middle of processing an escape sequence. It will emit
    /// any appropriate events for incomplete sequences and reset the parser
    /// to ground state.
    ///
    /// Return `true` if any events were emitted, `false` otherwise.
    pub fn idle<F: FnMut(TerminalInputEvent)>(&mut self, cb: &mut F) -> bool {
        if let Some(vt_event) = self.seq_parser.idle() {
            Self::process_vt_event(&vt_event, &mut self.state, cb);
            true
        } else {
            false
        }
    }
}
