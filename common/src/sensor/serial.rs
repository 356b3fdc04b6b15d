use std::io::BufReader;

use log::info;
use serialport::SerialPort;

use super::{LineSource, SerialConfig};

/// Lines read from a serial port.
pub type SerialSource = LineSource<BufReader<Box<dyn SerialPort>>>;

/// Opens the serial port described by `config` and waits for the board to settle.
pub fn open_serial(config: &SerialConfig) -> serialport::Result<SerialSource> {
    let port = serialport::new(&config.path, config.baud_rate)
        .timeout(config.timeout)
        .open()?;
    info!(
        "Serial port {} opened at {} baud",
        config.path, config.baud_rate
    );

    std::thread::sleep(config.settle);

    Ok(LineSource::new(BufReader::new(port)))
}
