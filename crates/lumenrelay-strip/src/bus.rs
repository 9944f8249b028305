use std::io::Write;

use lumenrelay_frame::Rgb;
use tracing::{debug, trace};

use crate::apa102::{self, MAX_BRIGHTNESS};
use crate::color::ColorOrder;
use crate::error::{Result, StripError};

/// A strip of individually addressable pixels.
///
/// Pixel writes are buffered by the bus; nothing reaches the LEDs until
/// [`PixelBus::show`] latches the whole strip at once.
pub trait PixelBus {
    fn pixel_count(&self) -> usize;

    fn set_pixel_color(&mut self, index: usize, color: Rgb) -> Result<()>;

    fn show(&mut self) -> Result<()>;
}

impl<B: PixelBus + ?Sized> PixelBus for Box<B> {
    fn pixel_count(&self) -> usize {
        (**self).pixel_count()
    }

    fn set_pixel_color(&mut self, index: usize, color: Rgb) -> Result<()> {
        (**self).set_pixel_color(index, color)
    }

    fn show(&mut self) -> Result<()> {
        (**self).show()
    }
}

/// APA102 strip driven through any byte output (SPI device, bit-bang pins).
pub struct Apa102Strip<W> {
    output: W,
    pixels: Vec<Rgb>,
    order: ColorOrder,
    brightness: u8,
    wire: Vec<u8>,
}

impl<W: Write> Apa102Strip<W> {
    pub fn new(output: W, pixel_count: usize) -> Result<Self> {
        if pixel_count == 0 {
            return Err(StripError::NoPixels);
        }
        Ok(Self {
            output,
            pixels: vec![Rgb::BLACK; pixel_count],
            order: ColorOrder::default(),
            brightness: MAX_BRIGHTNESS,
            wire: Vec::with_capacity(apa102::encoded_len(pixel_count)),
        })
    }

    pub fn with_color_order(mut self, order: ColorOrder) -> Self {
        self.order = order;
        self
    }

    /// Global 5-bit brightness, 0-31. Larger values mean full brightness.
    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = brightness.min(MAX_BRIGHTNESS);
        self
    }

    /// Colour currently buffered for `index`.
    pub fn pixel(&self, index: usize) -> Option<Rgb> {
        self.pixels.get(index).copied()
    }

    pub fn get_ref(&self) -> &W {
        &self.output
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}

impl<W: Write> PixelBus for Apa102Strip<W> {
    fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    fn set_pixel_color(&mut self, index: usize, color: Rgb) -> Result<()> {
        let count = self.pixels.len();
        let slot = self
            .pixels
            .get_mut(index)
            .ok_or(StripError::PixelIndex { index, count })?;
        *slot = color;
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        apa102::encode(&self.pixels, self.order, self.brightness, &mut self.wire);
        self.output.write_all(&self.wire).map_err(StripError::Bus)?;
        self.output.flush().map_err(StripError::Bus)?;
        trace!(bytes = self.wire.len(), "strip refreshed");
        Ok(())
    }
}

/// A bus that drives no hardware; it keeps the last shown frame and logs it.
#[derive(Debug, Clone)]
pub struct DryRunBus {
    pending: Vec<Rgb>,
    shown: Vec<Rgb>,
    shows: u64,
}

impl DryRunBus {
    pub fn new(pixel_count: usize) -> Result<Self> {
        if pixel_count == 0 {
            return Err(StripError::NoPixels);
        }
        Ok(Self {
            pending: vec![Rgb::BLACK; pixel_count],
            shown: vec![Rgb::BLACK; pixel_count],
            shows: 0,
        })
    }

    /// Pixels as of the most recent `show`.
    pub fn shown(&self) -> &[Rgb] {
        &self.shown
    }

    pub fn shows(&self) -> u64 {
        self.shows
    }
}

impl PixelBus for DryRunBus {
    fn pixel_count(&self) -> usize {
        self.pending.len()
    }

    fn set_pixel_color(&mut self, index: usize, color: Rgb) -> Result<()> {
        let count = self.pending.len();
        let slot = self
            .pending
            .get_mut(index)
            .ok_or(StripError::PixelIndex { index, count })?;
        *slot = color;
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        self.shown.copy_from_slice(&self.pending);
        self.shows += 1;
        let lit = self.shown.iter().filter(|&&p| p != Rgb::BLACK).count();
        debug!(show = self.shows, lit, "dry-run strip refresh");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_is_written_before_show() {
        let mut strip = Apa102Strip::new(Vec::new(), 2).unwrap();
        strip.set_pixel_color(0, Rgb::new(1, 2, 3)).unwrap();
        assert!(strip.get_ref().is_empty());

        strip.show().unwrap();
        assert_eq!(strip.get_ref().len(), apa102::encoded_len(2));
    }

    #[test]
    fn show_encodes_current_pixels() {
        let mut strip = Apa102Strip::new(Vec::new(), 1)
            .unwrap()
            .with_color_order(ColorOrder::Grb)
            .with_brightness(7);
        strip.set_pixel_color(0, Rgb::new(10, 20, 30)).unwrap();
        strip.show().unwrap();

        let out = strip.into_inner();
        assert_eq!(out, vec![0, 0, 0, 0, 0b1110_0111, 20, 10, 30, 0xff]);
    }

    #[test]
    fn index_past_end_is_rejected() {
        let mut strip = Apa102Strip::new(Vec::new(), 2).unwrap();
        let err = strip.set_pixel_color(2, Rgb::BLACK).unwrap_err();
        assert!(matches!(err, StripError::PixelIndex { index: 2, count: 2 }));
    }

    #[test]
    fn empty_strip_is_rejected() {
        assert!(matches!(
            Apa102Strip::new(Vec::new(), 0),
            Err(StripError::NoPixels)
        ));
        assert!(matches!(DryRunBus::new(0), Err(StripError::NoPixels)));
    }

    #[test]
    fn output_failure_surfaces_as_bus_error() {
        let mut strip = Apa102Strip::new(FailingOutput, 1).unwrap();
        assert!(matches!(strip.show(), Err(StripError::Bus(_))));
    }

    #[test]
    fn dry_run_latches_on_show() {
        let mut bus = DryRunBus::new(2).unwrap();
        bus.set_pixel_color(1, Rgb::new(9, 9, 9)).unwrap();
        assert_eq!(bus.shown(), &[Rgb::BLACK, Rgb::BLACK]);

        bus.show().unwrap();
        assert_eq!(bus.shown(), &[Rgb::BLACK, Rgb::new(9, 9, 9)]);
        assert_eq!(bus.shows(), 1);
    }

    #[test]
    fn boxed_bus_forwards() {
        let mut bus: Box<dyn PixelBus> = Box::new(DryRunBus::new(3).unwrap());
        assert_eq!(bus.pixel_count(), 3);
        bus.set_pixel_color(0, Rgb::new(1, 1, 1)).unwrap();
        bus.show().unwrap();
    }

    struct FailingOutput;

    impl Write for FailingOutput {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
