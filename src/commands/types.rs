use std::fmt;

/// A single OBD-II parameter request and the formula that turns its data bytes into a quantity
#[derive(Clone, Copy)]
pub struct PidCommand {
    /// Constant name, for diagnostics
    pub name: &'static str,
    /// OBD-II service (mode), `0x01` for current data
    pub service: u8,
    pub pid: u8,
    /// Number of data bytes the formula consumes
    pub response_len: usize,
    pub unit: &'static str,
    /// Decode exactly `response_len` data bytes
    pub decode: fn(&[u8]) -> f64,
}

impl fmt::Debug for PidCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PidCommand")
            .field("name", &self.name)
            .field("service", &format_args!("{:02X}", self.service))
            .field("pid", &format_args!("{:02X}", self.pid))
            .field("response_len", &self.response_len)
            .field("unit", &self.unit)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PidCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}", self.service, self.pid)
    }
}

/// A decoded PID response from the first ECU that answered
#[derive(Debug, Clone, PartialEq)]
pub struct PidValue {
    /// Data bytes after the mode and PID echo
    pub raw: Vec<u8>,
    pub value: f64,
}

impl PidValue {
    /// The data bytes as space separated hex, the way the adapter prints them
    pub fn raw_hex(&self) -> String {
        self.raw
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Which PIDs of a service the vehicle claims to support
///
/// Built from the bitmask PIDs (0x00, 0x20, 0x40, ...). Each covers the 32 PIDs after it, with
/// the most significant bit standing for the lowest PID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportedPids {
    masks: [u32; 8],
    known: u8,
}

impl SupportedPids {
    /// Record the bitmask answered for `base` (a multiple of 0x20)
    pub fn insert_range(&mut self, base: u8, mask: u32) {
        let idx = usize::from(base / 0x20);
        self.masks[idx] = mask;
        self.known |= 1 << idx;
    }

    /// `None` when the range holding `pid` was never reported
    pub fn supports(&self, pid: u8) -> Option<bool> {
        if pid == 0 {
            return Some(self.known & 1 == 1);
        }
        let offset = pid - 1;
        let idx = usize::from(offset / 0x20);
        if self.known & (1 << idx) == 0 {
            return None;
        }
        let bit = 31 - u32::from(offset % 0x20);
        Some((self.masks[idx] >> bit) & 1 == 1)
    }

    /// All PIDs reported as supported, in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (1..=u8::MAX).filter(|&pid| self.supports(pid) == Some(true))
    }
}
