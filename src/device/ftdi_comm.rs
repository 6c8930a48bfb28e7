use super::serial_comm::SerialComm;
use super::Result;
use std::io::{Read, Write};

const FT232R_VID: u16 = 0x0403;
const FT232R_PID: u16 = 0x6001;

/// Communicate with a USB to Serial FTDI device
/// with the FTDI library
pub struct FTDIDevice {
    device: ftdi::Device,
}

impl FTDIDevice {
    /// Creates a new instance of an FTDIDevice
    pub fn new(baud_rate: u32) -> Result<Self> {
        let mut device = ftdi::find_by_vid_pid(FT232R_VID, FT232R_PID)
            .interface(ftdi::Interface::A)
            .open()?;

        device.set_baud_rate(baud_rate)?;
        device.configure(ftdi::Bits::Eight, ftdi::StopBits::One, ftdi::Parity::None)?;
        device.usb_reset()?;

        Ok(Self { device })
    }
}

impl SerialComm for FTDIDevice {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        Ok(self.device.write_all(data)?)
    }

    fn read(&mut self, data: &mut [u8]) -> Result<usize> {
        Ok(self.device.read(data)?)
    }

    fn purge_buffers(&mut self) -> Result<()> {
        Ok(self.device.usb_purge_buffers()?)
    }
}
