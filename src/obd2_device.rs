use crate::{Error, Result};

/// Request/response access to the vehicle, one service and PID at a time
pub trait Obd2Device {
    /// Request `pid` of `service` and return the data bytes of every ECU that answered
    ///
    /// The echoed service (`0x40 | service`) and PID are checked and stripped, so each element
    /// holds only the payload the formulas work on.
    fn obd_command(&mut self, service: u8, pid: u8) -> Result<Vec<Vec<u8>>>;

    /// Like [obd_command](Self::obd_command), with every answer required to be exactly `LEN`
    /// bytes long
    fn obd_command_len<const LEN: usize>(
        &mut self,
        service: u8,
        pid: u8,
    ) -> Result<Vec<[u8; LEN]>> {
        self.obd_command(service, pid)?
            .into_iter()
            .map(|data| {
                let got = data.len();
                <[u8; LEN]>::try_from(data)
                    .map_err(|_| Error::IncorrectResponseLength("payload", LEN, got))
            })
            .collect()
    }

    /// The answer of the first ECU to respond
    ///
    /// Vehicles with several control units may all answer a broadcast request; for current data
    /// the engine ECU responds first.
    fn first_response(&mut self, service: u8, pid: u8) -> Result<Vec<u8>> {
        self.obd_command(service, pid)?
            .into_iter()
            .next()
            .ok_or(Error::NoData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TwoEcus;

    impl Obd2Device for TwoEcus {
        fn obd_command(&mut self, _: u8, pid: u8) -> Result<Vec<Vec<u8>>> {
            match pid {
                0x00 => Ok(vec![vec![0xBE, 0x1F, 0xA8, 0x13], vec![0x80, 0x00, 0x00, 0x00]]),
                0x0D => Ok(vec![vec![0x30], vec![0x31]]),
                _ => Ok(Vec::new()),
            }
        }
    }

    #[test]
    fn test_fixed_length() {
        let masks = TwoEcus.obd_command_len::<4>(0x01, 0x00).unwrap();
        assert_eq!(masks.len(), 2);
        assert!(matches!(
            TwoEcus.obd_command_len::<2>(0x01, 0x00),
            Err(Error::IncorrectResponseLength("payload", 2, 4))
        ));
    }

    #[test]
    fn test_first_response() {
        assert_eq!(TwoEcus.first_response(0x01, 0x0D).unwrap(), vec![0x30]);
        assert!(matches!(TwoEcus.first_response(0x01, 0x0C), Err(Error::NoData)));
    }
}
