#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]

#[cfg(target_arch = "avr")]
mod firmware {
    use panic_halt as _;

    use avr_device::atmega128a;

    use counter_multimeter::hal::gpio::board::{ChannelSelect, TapA, TapB, TapC};
    use counter_multimeter::hal::{CounterTimer, PinSelector, Uart};
    use counter_multimeter::logger::LogType;
    use counter_multimeter::report::{self, Command};
    use counter_multimeter::Counter;
    use ufmt::uwriteln;

    #[avr_device::entry]
    fn main() -> ! {
        let dp = match atmega128a::Peripherals::take() {
            Some(dp) => dp,
            None => loop {},
        };
        let mut console = Uart::new(dp.USART1);
        let selector = PinSelector::new(
            ChannelSelect::new(),
            TapA::new(),
            TapB::new(),
            TapC::new(),
        );
        let timer = CounterTimer::new(dp.TC0, dp.TC1, dp.TC3, &dp.PORTD);
        let mut counter = Counter::new(timer, selector);

        uwriteln!(console, "Counter firmware v0.1.0\r").ok();
        uwriteln!(console, "Ready...\r").ok();

        loop {
            let byte = match nb::block!(console.read()) {
                Ok(byte) => byte,
                Err(never) => match never {},
            };
            match Command::parse(byte) {
                Ok(Command::Measure(range)) => {
                    let result = counter.take_measurement(range);
                    report::write_reading(&mut console, range, &result).ok();
                }
                Ok(Command::DumpLog) => {
                    counter.log().dump(&mut console, LogType::Debug).ok();
                }
                Ok(Command::ClearLog) => counter.log_mut().clear(),
                // line endings from terminals
                Err(_) if byte == b'\r' || byte == b'\n' => {}
                Err(err) => {
                    report::write_error(&mut console, &err).ok();
                }
            }
        }
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {
    println!("counter_multimeter runs on the ATmega128; build with --target avr-atmega128");
}
