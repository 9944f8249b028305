use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, StripError};

/// Largest single transfer the spidev driver accepts by default.
const SPIDEV_BUFSIZ: usize = 4096;

/// Hardware SPI output through a Linux `spidev` character device.
///
/// On a Raspberry Pi, `/dev/spidev0.0` drives MOSI (GPIO 10) and SCLK
/// (GPIO 11).
#[derive(Debug)]
pub struct SpiDevice {
    file: File,
    path: PathBuf,
}

impl SpiDevice {
    pub const DEFAULT_PATH: &'static str = "/dev/spidev0.0";
    pub const DEFAULT_SPEED_HZ: u32 = 8_000_000;

    /// Open the device and configure SPI mode 0, 8-bit words and the clock rate.
    pub fn open(path: impl AsRef<Path>, speed_hz: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let spi_err = |source: std::io::Error| StripError::Spi {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(spi_err)?;
        configure(&file, speed_hz).map_err(spi_err)?;

        info!(?path, speed_hz, "opened spi device");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Write for SpiDevice {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let len = buf.len().min(SPIDEV_BUFSIZ);
        self.file.write(&buf[..len])
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(target_os = "linux")]
fn configure(file: &File, speed_hz: u32) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    // _IOW('k', nr, size) from linux/spi/spidev.h.
    const SPI_IOC_WR_MODE: u32 = 0x4001_6b01;
    const SPI_IOC_WR_BITS_PER_WORD: u32 = 0x4001_6b03;
    const SPI_IOC_WR_MAX_SPEED_HZ: u32 = 0x4004_6b04;

    let fd = file.as_raw_fd();
    let mode: u8 = 0;
    let bits: u8 = 8;

    // SAFETY: `fd` is an open spidev descriptor owned by `file`, and each
    // request reads exactly the size of the pointed-to value.
    unsafe {
        check(libc::ioctl(fd, SPI_IOC_WR_MODE as _, &mode as *const u8))?;
        check(libc::ioctl(
            fd,
            SPI_IOC_WR_BITS_PER_WORD as _,
            &bits as *const u8,
        ))?;
        check(libc::ioctl(
            fd,
            SPI_IOC_WR_MAX_SPEED_HZ as _,
            &speed_hz as *const u32,
        ))?;
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn check(rc: libc::c_int) -> std::io::Result<()> {
    if rc < 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(not(target_os = "linux"))]
fn configure(_file: &File, _speed_hz: u32) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "spidev is only available on Linux",
    ))
}
