//! The bus side of a transaction.
//!
//! The ADBMS6948 talks SPI: every byte clocked out is at the same time a
//! byte clocked in. A transport therefore exchanges a buffer in place, the
//! caller hands over the complete frame including the zero placeholders it
//! expects the devices to fill.

use std::fmt;

pub trait Transport {
    type Error: fmt::Debug;

    /// Runs one chip-select framed transaction. On return `buffer` holds
    /// the bytes received while its previous contents were sent.
    fn exchange(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn exchange(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        (**self).exchange(buffer)
    }
}

/// Adapter for an `embedded-hal` SPI device, which already asserts
/// chip-select around each transfer.
#[cfg_attr(docsrs, doc(cfg(feature = "embedded-hal")))]
#[cfg(feature = "embedded-hal")]
#[derive(Debug)]
pub struct SpiTransport<SPI>(SPI);

#[cfg(feature = "embedded-hal")]
impl<SPI: embedded_hal::spi::SpiDevice> SpiTransport<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self(spi)
    }

    pub fn into_inner(self) -> SPI {
        self.0
    }
}

#[cfg(feature = "embedded-hal")]
impl<SPI: embedded_hal::spi::SpiDevice> Transport for SpiTransport<SPI> {
    type Error = SPI::Error;

    fn exchange(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.0.transfer_in_place(buffer)
    }
}
