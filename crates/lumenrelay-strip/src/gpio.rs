use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{Result, StripError};

const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// How long to wait for udev to create the pin directory after an export.
const EXPORT_SETTLE: Duration = Duration::from_millis(500);

/// Software SPI: clocks APA102 data out on two GPIO pins through sysfs.
///
/// Much slower than [`crate::SpiDevice`], but works on any two free pins.
#[derive(Debug)]
pub struct GpioBitBang {
    data: OutputPin,
    clock: OutputPin,
}

impl GpioBitBang {
    pub fn open(data_pin: u32, clock_pin: u32) -> Result<Self> {
        Self::with_root(SYSFS_GPIO_ROOT, data_pin, clock_pin)
    }

    /// Open the pins under an alternate sysfs GPIO root.
    pub fn with_root(root: impl AsRef<Path>, data_pin: u32, clock_pin: u32) -> Result<Self> {
        let root = root.as_ref();
        let data = OutputPin::export(root, data_pin)?;
        let clock = OutputPin::export(root, clock_pin)?;
        info!(data_pin, clock_pin, "bit-banging strip output over sysfs gpio");
        Ok(Self { data, clock })
    }

    fn clock_byte(&mut self, byte: u8) -> std::io::Result<()> {
        for bit in (0..8).rev() {
            self.data.set(byte & (1 << bit) != 0)?;
            self.clock.set(true)?;
            self.clock.set(false)?;
        }
        Ok(())
    }
}

impl Write for GpioBitBang {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        for &byte in buf {
            self.clock_byte(byte)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
struct OutputPin {
    pin: u32,
    value: File,
    level: Option<bool>,
}

impl OutputPin {
    fn export(root: &Path, pin: u32) -> Result<Self> {
        let gpio_err = |source: std::io::Error| StripError::Gpio { pin, source };
        let dir = root.join(format!("gpio{pin}"));

        if !dir.exists() {
            match write_attr(&root.join("export"), &pin.to_string()) {
                Ok(()) => {}
                // Already exported by someone else.
                Err(err) if err.kind() == ErrorKind::ResourceBusy => {}
                Err(err) => return Err(gpio_err(err)),
            }
            wait_for(&dir).map_err(gpio_err)?;
        }

        write_attr(&dir.join("direction"), "out").map_err(gpio_err)?;
        let value = OpenOptions::new()
            .write(true)
            .open(dir.join("value"))
            .map_err(gpio_err)?;

        debug!(pin, "gpio pin configured as output");
        Ok(Self {
            pin,
            value,
            level: None,
        })
    }

    fn set(&mut self, high: bool) -> std::io::Result<()> {
        if self.level == Some(high) {
            return Ok(());
        }
        write_value(&self.value, if high { b"1" } else { b"0" })?;
        self.level = Some(high);
        Ok(())
    }
}

impl Drop for OutputPin {
    fn drop(&mut self) {
        if let Err(err) = write_value(&self.value, b"0") {
            debug!(pin = self.pin, error = %err, "failed to drive pin low on release");
        }
    }
}

#[cfg(unix)]
fn write_value(file: &File, level: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;

    // sysfs value files are rewritten from offset 0 on every change.
    file.write_all_at(level, 0)
}

#[cfg(not(unix))]
fn write_value(mut file: &File, level: &[u8]) -> std::io::Result<()> {
    use std::io::{Seek, SeekFrom};

    file.seek(SeekFrom::Start(0))?;
    file.write_all(level)
}

fn write_attr(path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).open(path)?;
    file.write_all(value.as_bytes())
}

fn wait_for(dir: &Path) -> std::io::Result<()> {
    let deadline = Instant::now() + EXPORT_SETTLE;
    loop {
        if dir.join("direction").exists() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(std::io::Error::new(
                ErrorKind::TimedOut,
                format!("{} did not appear after export", dir.display()),
            ));
        }
        thread::sleep(Duration::from_millis(10));
    }
}
