//! Parametrized terminfo string evaluation ("tparm"): a small stack machine
//! embedded in capability template strings.

use std::sync::Mutex;

/// Process-wide static variables (`%P<A..Z>` / `%g<A..Z>`), shared across
/// every `tparm` call in the process per spec.
static STATIC_VARS: Mutex<[i64; 26]> = Mutex::new([0; 26]);

/// Reset the process-wide static variable table. Exposed for tests so each
/// test starts from a clean slate.
pub fn reset_static_vars() {
    *STATIC_VARS.lock().unwrap() = [0; 26];
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Stop {
    Then,
    Else,
    Semi,
}

struct Machine<'a> {
    template: &'a [u8],
    pos: usize,
    stack: Vec<i64>,
    out: Vec<u8>,
    params: [i64; 9],
    dynamic: [i64; 26],
}

fn var_index(c: u8) -> Option<usize> {
    match c {
        b'a'..=b'z' => Some((c - b'a') as usize),
        b'A'..=b'Z' => Some((c - b'A') as usize),
        _ => None,
    }
}

impl<'a> Machine<'a> {
    fn new(template: &'a str, params: &[i64]) -> Self {
        let mut p = [0i64; 9];
        for (slot, value) in p.iter_mut().zip(params.iter()) {
            *slot = *value;
        }
        Self {
            template: template.as_bytes(),
            pos: 0,
            stack: Vec::new(),
            out: Vec::new(),
            params: p,
            dynamic: [0; 26],
        }
    }

    fn pop(&mut self) -> i64 {
        self.stack.pop().unwrap_or(0)
    }

    fn push(&mut self, v: i64) {
        self.stack.push(v);
    }

    /// Scan from `self.pos`, dispatching escapes (when `skip` is false) or
    /// merely advancing past them (when `skip` is true, for the untaken
    /// conditional branch), until end-of-template or one of the `stop`
    /// tokens is seen at this nesting level. Nested `%?...%;` conditionals
    /// are always fully consumed before continuing the scan, so stop
    /// tokens never match inside a nested conditional. Returns which stop
    /// token ended the scan, if any.
    fn exec(&mut self, stop: &[Stop], skip: bool) -> Option<Stop> {
        while self.pos < self.template.len() {
            if self.template[self.pos] != b'%' {
                if !skip {
                    self.out.push(self.template[self.pos]);
                }
                self.pos += 1;
                continue;
            }
            let Some(op) = self.template.get(self.pos + 1).copied() else {
                // Trailing lone '%': the cursor still advances, ending the
                // template.
                self.pos += 1;
                break;
            };
            match op {
                b't' if stop.contains(&Stop::Then) => {
                    self.pos += 2;
                    return Some(Stop::Then);
                }
                b'e' if stop.contains(&Stop::Else) => {
                    self.pos += 2;
                    return Some(Stop::Else);
                }
                b';' if stop.contains(&Stop::Semi) => {
                    self.pos += 2;
                    return Some(Stop::Semi);
                }
                b'?' => {
                    self.pos += 2;
                    self.run_conditional(skip);
                }
                _ => {
                    self.pos += 2;
                    self.dispatch(op, skip);
                }
            }
        }
        None
    }

    /// Dispatch a single escape operator whose `%<op>` prefix has already
    /// been consumed. `self.pos` sits right after the operator byte; some
    /// operators (`%{`, `%'`) consume further bytes here. When `skip` is
    /// true, variable-length operands are still consumed (to keep the
    /// cursor correct) but no stack, variable, or output side effect
    /// happens.
    fn dispatch(&mut self, op: u8, skip: bool) {
        match op {
            b'%' => {
                if !skip {
                    self.out.push(b'%');
                }
            }
            b'p' => {
                if let Some(n) = self.template.get(self.pos).copied() {
                    if n.is_ascii_digit() && n != b'0' {
                        self.pos += 1;
                        if !skip {
                            let idx = (n - b'1') as usize;
                            self.push(self.params.get(idx).copied().unwrap_or(0));
                        }
                    }
                }
            }
            b'P' => {
                if let Some(v) = self.template.get(self.pos).copied() {
                    self.pos += 1;
                    if !skip {
                        let value = self.pop();
                        if let Some(idx) = var_index(v) {
                            if v.is_ascii_uppercase() {
                                STATIC_VARS.lock().unwrap()[idx] = value;
                            } else {
                                self.dynamic[idx] = value;
                            }
                        }
                    }
                }
            }
            b'g' => {
                if let Some(v) = self.template.get(self.pos).copied() {
                    self.pos += 1;
                    if !skip {
                        if let Some(idx) = var_index(v) {
                            let value = if v.is_ascii_uppercase() {
                                STATIC_VARS.lock().unwrap()[idx]
                            } else {
                                self.dynamic[idx]
                            };
                            self.push(value);
                        }
                    }
                }
            }
            b'{' => {
                let start = self.pos;
                while self.template.get(self.pos).is_some_and(|&b| b != b'}') {
                    self.pos += 1;
                }
                if !skip {
                    let digits = std::str::from_utf8(&self.template[start..self.pos]).unwrap_or("0");
                    let value = digits.parse::<i64>().unwrap_or(0);
                    self.push(value);
                }
                if self.template.get(self.pos) == Some(&b'}') {
                    self.pos += 1;
                }
            }
            b'\'' => {
                if let Some(c) = self.template.get(self.pos).copied() {
                    self.pos += 1;
                    if !skip {
                        self.push(i64::from(c));
                    }
                    if self.template.get(self.pos) == Some(&b'\'') {
                        self.pos += 1;
                    }
                }
            }
            b'd' | b's' => {
                if !skip {
                    let v = self.pop();
                    self.out.extend_from_slice(v.to_string().as_bytes());
                }
            }
            b'c' => {
                if !skip {
                    let v = self.pop();
                    self.out.push(v as u8);
                }
            }
            b'i' => {
                if !skip {
                    self.params[0] = self.params[0].wrapping_add(1);
                    self.params[1] = self.params[1].wrapping_add(1);
                }
            }
            b'+' | b'-' | b'*' | b'/' | b'm' | b'&' | b'|' | b'^' | b'=' | b'<' | b'>'
            | b'A' | b'O' => {
                if !skip {
                    let rhs = self.pop();
                    let lhs = self.pop();
                    self.push(binary_op(op, lhs, rhs));
                }
            }
            b'!' => {
                if !skip {
                    let v = self.pop();
                    self.push(i64::from(v == 0));
                }
            }
            b'~' => {
                if !skip {
                    let v = self.pop();
                    self.push(!v);
                }
            }
            b'l' => {
                if !skip {
                    let v = self.pop();
                    self.push(v.to_string().len() as i64);
                }
            }
            _ => {
                // Unknown escape character: skipped silently, no bytes
                // beyond the operator itself are consumed.
            }
        }
    }

    /// Handle `%? cond %t then [ %e else ] %;`. The condition is evaluated
    /// with full processing (the spec calls this a "restricted
    /// sub-processor" but in practice conditions only ever use stack and
    /// variable ops, which `dispatch` already limits to); the chosen
    /// branch gets full processing, the other is structurally skipped.
    fn run_conditional(&mut self, outer_skip: bool) {
        self.exec(&[Stop::Then], outer_skip);
        let condition_true = !outer_skip && self.pop() != 0;

        if condition_true {
            match self.exec(&[Stop::Else, Stop::Semi], false) {
                Some(Stop::Else) => {
                    self.exec(&[Stop::Semi], true);
                }
                _ => {}
            }
        } else {
            match self.exec(&[Stop::Else, Stop::Semi], true) {
                Some(Stop::Else) => {
                    self.exec(&[Stop::Semi], outer_skip);
                }
                _ => {}
            }
        }
    }
}

fn binary_op(op: u8, lhs: i64, rhs: i64) -> i64 {
    match op {
        b'+' => lhs.wrapping_add(rhs),
        b'-' => lhs.wrapping_sub(rhs),
        b'*' => lhs.wrapping_mul(rhs),
        b'/' => {
            if rhs == 0 {
                0
            } else {
                lhs.wrapping_div(rhs)
            }
        }
        b'm' => {
            if rhs == 0 {
                0
            } else {
                lhs.wrapping_rem(rhs)
            }
        }
        b'&' => lhs & rhs,
        b'|' => lhs | rhs,
        b'^' => lhs ^ rhs,
        b'=' => i64::from(lhs == rhs),
        b'<' => i64::from(lhs < rhs),
        b'>' => i64::from(lhs > rhs),
        b'A' => i64::from(lhs != 0 && rhs != 0),
        b'O' => i64::from(lhs != 0 || rhs != 0),
        _ => 0,
    }
}

/// Evaluate a terminfo parametrized capability template against the given
/// parameters.
///
/// Terminates for any finite input (the cursor strictly advances every
/// iteration); never panics on malformed templates (unrecognized escapes
/// are skipped); the result depends only on `template`, `params`, and the
/// static-variable state at call entry.
#[must_use]
pub fn tparm(template: &str, params: &[i64]) -> Vec<u8> {
    let mut machine = Machine::new(template, params);
    machine.exec(&[], false);
    machine.out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn literal_bytes_pass_through() {
        assert_eq!(tparm("hello", &[]), b"hello");
    }

    #[test]
    fn percent_escape() {
        assert_eq!(tparm("100%%", &[]), b"100%");
    }

    #[test]
    fn addition() {
        assert_eq!(tparm("%p1%p2%+%d", &[3, 4]), b"7");
    }

    #[test]
    fn division_by_nonzero() {
        assert_eq!(tparm("%{10}%{3}%/%d", &[]), b"3");
    }

    #[test]
    fn division_by_zero_yields_zero() {
        assert_eq!(tparm("%{10}%{0}%/%d", &[]), b"0");
    }

    #[test]
    fn cursor_positioning_capability() {
        assert_eq!(tparm("\x1b[%i%p1%d;%p2%dH", &[0, 0]), b"\x1b[1;1H");
    }

    #[test]
    fn conditional_then_branch() {
        let out = tparm("%p1%{1}%=%t YES %e NO %;", &[1]);
        assert_eq!(out, b" YES ");
    }

    #[test]
    fn conditional_else_branch() {
        let out = tparm("%p1%{1}%=%t YES %e NO %;", &[0]);
        assert_eq!(out, b" NO ");
    }

    #[test]
    fn conditional_without_else() {
        assert_eq!(tparm("%p1%{1}%=%tYES%;", &[1]), b"YES");
        assert_eq!(tparm("%p1%{1}%=%tYES%;", &[0]), b"");
    }

    #[test]
    fn nested_conditional() {
        // if p1 then (if p2 then "A" else "B") else "C"
        let tmpl = "%p1%{1}%=%t%p2%{1}%=%tA%eB%;%eC%;";
        assert_eq!(tparm(tmpl, &[1, 1]), b"A");
        assert_eq!(tparm(tmpl, &[1, 0]), b"B");
        assert_eq!(tparm(tmpl, &[0, 0]), b"C");
    }

    #[test]
    fn missing_parameter_is_zero() {
        assert_eq!(tparm("%p5%d", &[1, 2]), b"0");
    }

    #[test]
    fn unknown_escape_is_skipped() {
        assert_eq!(tparm("a%Qb", &[]), b"ab");
    }

    #[test]
    fn static_variables_are_process_wide() {
        reset_static_vars();
        let _ = tparm("%{42}%PA", &[]);
        let out = tparm("%gA%d", &[]);
        assert_eq!(out, b"42");
        reset_static_vars();
    }

    #[test]
    fn dynamic_variables_are_call_local() {
        let _ = tparm("%{99}%Pa", &[]);
        let out = tparm("%ga%d", &[]);
        // A fresh call sees a zeroed dynamic table.
        assert_eq!(out, b"0");
    }

    proptest! {
        #[test]
        fn tparm_terminates_and_produces_bytes(
            template in "[ -~]{0,64}",
            params in prop::collection::vec(any::<i64>(), 0..9),
        ) {
            let _ = tparm(&template, &params);
        }
    }
}
