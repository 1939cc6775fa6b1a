use embedded_hal::i2c::I2c;
use linux_embedded_hal::I2cdev;

use crate::errors::{AppError, Result};

pub const TCA9548A_ADDRESS: u8 = 0x70;
pub const CHANNEL_COUNT: u8 = 8;

/// Control byte that enables exactly `channel`.
pub fn channel_mask(channel: u8) -> Result<u8> {
    if channel >= CHANNEL_COUNT {
        return Err(AppError::multiplexer(&format!(
            "Channel must be between 0 and {}, got {}",
            CHANNEL_COUNT - 1,
            channel
        )));
    }
    Ok(1u8 << channel)
}

// Eight-channel I2C switch sitting between the Pi and the OLED
pub struct Tca9548a {
    i2c: I2cdev,
    address: u8,
    current_channel: Option<u8>,
}

impl Tca9548a {
    pub fn new(i2c: I2cdev, address: u8) -> Self {
        Self {
            i2c,
            address,
            current_channel: None,
        }
    }

    pub fn select_channel(&mut self, channel: u8) -> Result<()> {
        let mask = channel_mask(channel)?;
        self.write(mask)?;
        self.current_channel = Some(channel);
        Ok(())
    }

    pub fn disable_all_channels(&mut self) -> Result<()> {
        self.write(0x00)?;
        self.current_channel = None;
        Ok(())
    }

    pub fn current_channel(&self) -> Option<u8> {
        self.current_channel
    }

    fn write(&mut self, control: u8) -> Result<()> {
        self.i2c.write(self.address, &[control]).map_err(|e| {
            AppError::multiplexer(&format!(
                "Failed to write 0x{:02X} to multiplexer at 0x{:02X}: {:?}",
                control, self.address, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_mask() {
        assert_eq!(channel_mask(0).unwrap(), 0b0000_0001);
        assert_eq!(channel_mask(3).unwrap(), 0b0000_1000);
        assert_eq!(channel_mask(7).unwrap(), 0b1000_0000);
    }

    #[test]
    fn test_channel_out_of_range() {
        let err = channel_mask(8).unwrap_err();
        assert!(matches!(err, AppError::Multiplexer(_)));
        assert!(err.to_string().contains("between 0 and 7"));
    }
}
