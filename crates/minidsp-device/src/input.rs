use tracing::debug;

use crate::client::DeviceClient;
use crate::commands;
use crate::error::Result;

/// One analog input channel (1 or 2).
#[derive(Debug, Clone)]
pub struct Input {
    client: DeviceClient,
    index: u8,
}

impl Input {
    pub(crate) fn new(client: DeviceClient, index: u8) -> Self {
        Self { client, index }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub async fn set_mute(&self, muted: bool) -> Result<()> {
        let frame = commands::set_input_mute(self.index, muted)?;
        self.client.send_frame(frame).await?;
        Ok(())
    }

    /// Set the channel gain in dB, from -127 up to 12.
    pub async fn set_gain(&self, db: f32) -> Result<()> {
        let frame = commands::set_input_gain(self.index, db)?;
        self.client.send_frame(frame).await?;
        Ok(())
    }

    /// The equalizer band stored at `address` in `bank`.
    pub fn eq(&self, address: u16, bank: u16) -> Equalizer {
        Equalizer {
            client: self.client.clone(),
            input: self.index,
            address,
            bank,
        }
    }
}

/// One biquad section of an input equalizer.
#[derive(Debug, Clone)]
pub struct Equalizer {
    client: DeviceClient,
    input: u8,
    address: u16,
    bank: u16,
}

impl Equalizer {
    /// Upload normalized coefficients `[b0, b1, b2, a1, a2]`.
    pub async fn set_biquads(&self, coefficients: &[f32]) -> Result<()> {
        let frame = commands::write_biquad(self.address, self.bank, coefficients)?;
        debug!(
            input = self.input,
            address = self.address,
            bank = self.bank,
            "uploading biquad"
        );
        self.client.send_frame(frame).await?;
        Ok(())
    }
}
