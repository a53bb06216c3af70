//! WiReach response line grammar.
//!
//! The adapter answers every `AT+i` command with one or more CR/LF
//! terminated ASCII lines:
//!
//! ```text
//! I/OK                      status: command accepted
//! I/ERROR (203)             status: command rejected, optional code
//! WLSI="CarNet"             parameter report (quotes around the value)
//! (000,001,-1,-1)           active socket handle list
//! ```
//!
//! Parsing is zero-copy: the returned variants borrow from the input
//! line. The caller matches the parsed shape against the in-flight
//! state's expected grammar; anything that fits no shape comes back as
//! [`ResponseLine::Other`] and is handled as unexpected.

/// One parsed response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseLine<'a> {
    /// `I/OK` status.
    Ok,
    /// `I/ERROR` status with the optional parenthesized code.
    Error(Option<u16>),
    /// `key="value"` parameter report (quotes stripped).
    Param { key: &'a str, value: &'a str },
    /// `(h1,h2,h3,h4)` socket handle list; `-1` entries map to `None`.
    Sockets([Option<u16>; 4]),
    /// Anything else (echo, banner text, partial garbage).
    Other(&'a str),
}

/// Parse one terminator-stripped response line.
pub fn parse_line(line: &str) -> ResponseLine<'_> {
    let line = line.trim();

    if line == "I/OK" {
        return ResponseLine::Ok;
    }

    if let Some(rest) = line.strip_prefix("I/ERROR") {
        let code = rest
            .trim()
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .and_then(|s| s.trim().parse::<u16>().ok());
        return ResponseLine::Error(code);
    }

    if let Some(inner) = line.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        if let Some(handles) = parse_socket_list(inner) {
            return ResponseLine::Sockets(handles);
        }
    }

    if let Some(eq) = line.find('=') {
        let (key, raw) = line.split_at(eq);
        let raw = &raw[1..];
        // The value side must be quoted; a bare `=` is not a parameter
        // report (it could be command echo).
        if let Some(value) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            if !key.is_empty() {
                return ResponseLine::Param { key, value };
            }
        }
    }

    ResponseLine::Other(line)
}

fn parse_socket_list(inner: &str) -> Option<[Option<u16>; 4]> {
    let mut handles = [None; 4];
    let mut count = 0;

    for part in inner.split(',') {
        if count >= handles.len() {
            return None; // more than four entries is not a socket list
        }
        let part = part.trim();
        handles[count] = match part.parse::<i32>().ok()? {
            n if n < 0 => None,
            n if n <= i32::from(u16::MAX) => Some(n as u16),
            _ => return None,
        };
        count += 1;
    }

    if count == 4 { Some(handles) } else { None }
}
