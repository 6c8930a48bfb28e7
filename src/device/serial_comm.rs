use super::Result;

/// Baud rate ELM327 adapters use out of the box
pub const DEFAULT_BAUD_RATE: u32 = 38_400;

/// An API to communicate with a serial device
pub trait SerialComm {
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Read whatever is waiting, returning `Ok(0)` when nothing arrived in time
    fn read(&mut self, data: &mut [u8]) -> Result<usize>;
    fn purge_buffers(&mut self) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};

    /// Scripted stand-in for an ELM327 on the other end of the wire
    ///
    /// Every line written is echoed back, followed by the scripted response (or `?` for unknown
    /// commands) and the `>` prompt.
    #[derive(Default)]
    pub(crate) struct MockElm {
        responses: HashMap<String, String>,
        silent: Vec<String>,
        muted: Vec<String>,
        pending: Vec<u8>,
        output: VecDeque<u8>,
        pub(crate) sent: Vec<String>,
    }

    impl MockElm {
        pub(crate) fn new() -> Self {
            let mut mock = Self::default();
            mock.respond(" ", "?");
            mock.respond("ATZ", "\rELM327 v1.5");
            mock.respond("ATSP0", "OK");
            mock.respond("0100", "SEARCHING...\r41 00 BE 1F A8 13");
            mock
        }

        /// Answer `command` with `response`; lines inside `response` are separated by `\r`
        pub(crate) fn respond(&mut self, command: &str, response: &str) {
            self.responses
                .insert(command.to_owned(), response.to_owned());
        }

        /// Echo `command` but never send the prompt
        pub(crate) fn stall(&mut self, command: &str) {
            self.silent.push(command.to_owned());
        }

        /// Ignore `command` entirely, as if the link had dropped
        pub(crate) fn mute(&mut self, command: &str) {
            self.muted.push(command.to_owned());
        }

        fn receive_line(&mut self, line: String) {
            if self.muted.contains(&line) {
                self.sent.push(line);
                return;
            }
            self.output.extend(line.as_bytes());
            self.output.push_back(b'\r');
            if !self.silent.contains(&line) {
                let response = self
                    .responses
                    .get(&line)
                    .cloned()
                    .unwrap_or_else(|| "?".to_owned());
                self.output.extend(response.as_bytes());
                self.output.extend(b"\r\r>");
            }
            self.sent.push(line);
        }
    }

    impl SerialComm for MockElm {
        fn write_all(&mut self, data: &[u8]) -> Result<()> {
            for &b in data {
                if b == b'\n' {
                    let line = String::from_utf8_lossy(&self.pending)
                        .trim_end_matches('\r')
                        .to_owned();
                    self.pending.clear();
                    self.receive_line(line);
                } else {
                    self.pending.push(b);
                }
            }
            Ok(())
        }

        fn read(&mut self, data: &mut [u8]) -> Result<usize> {
            let mut n = 0;
            while n < data.len() {
                match self.output.pop_front() {
                    Some(b) => {
                        data[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }

        fn purge_buffers(&mut self) -> Result<()> {
            self.output.clear();
            Ok(())
        }
    }
}
