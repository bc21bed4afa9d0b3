//! Polled USART1 console

use avr_device::atmega128a::USART1;
use core::convert::Infallible;

use crate::config::{CPU_FREQ_HZ, UART_BAUD};

const UBRR: u16 = (CPU_FREQ_HZ / (16 * UART_BAUD) - 1) as u16;

// UCSR1A
const RXC1: u8 = 1 << 7;
const UDRE1: u8 = 1 << 5;
// UCSR1B
const RXEN1: u8 = 1 << 4;
const TXEN1: u8 = 1 << 3;
// UCSR1C: asynchronous, no parity, 1 stop bit, 8 data bits
const FORMAT_8N1: u8 = 0b0000_0110;

pub struct Uart {
    usart: USART1,
}

impl Uart {
    pub fn new(usart: USART1) -> Self {
        usart.ubrr1h.write(|w| unsafe { w.bits((UBRR >> 8) as u8) });
        usart.ubrr1l.write(|w| unsafe { w.bits(UBRR as u8) });
        usart.ucsr1c.write(|w| unsafe { w.bits(FORMAT_8N1) });
        usart.ucsr1b.write(|w| unsafe { w.bits(RXEN1 | TXEN1) });
        Self { usart }
    }

    pub fn release(self) -> USART1 {
        self.usart.ucsr1b.write(|w| unsafe { w.bits(0) });
        self.usart
    }

    pub fn write_byte(&mut self, byte: u8) {
        while self.usart.ucsr1a.read().bits() & UDRE1 == 0 {}
        self.usart.udr1.write(|w| unsafe { w.bits(byte) });
    }

    pub fn read(&mut self) -> nb::Result<u8, Infallible> {
        if self.usart.ucsr1a.read().bits() & RXC1 != 0 {
            Ok(self.usart.udr1.read().bits())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl ufmt::uWrite for Uart {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        s.bytes().for_each(|b| self.write_byte(b));
        Ok(())
    }
}
