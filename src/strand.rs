use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use byteorder::WriteBytesExt;

use crate::error::StripError;

const WHEEL_POSITIONS: u16 = 384;
const PULSE_STEP_DELAY: Duration = Duration::from_millis(50);

/// Brightness lookup for LPD8806-style drivers: 7 bit channels with the
/// protocol header bit set, remapped for perceptual brightness.
pub struct GammaTable([u8; 256]);

impl GammaTable {
    pub fn new() -> Self {
        let mut table = [0u8; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = 0x80 | ((i as f64 / 255.0).powf(2.5) * 127.0 + 0.5) as u8;
        }
        Self(table)
    }

    pub fn correct(&self, value: u8) -> u8 {
        self.0[value as usize]
    }
}

impl Default for GammaTable {
    fn default() -> Self {
        Self::new()
    }
}

/// When a running pulsate animation notices its cancellation token was
/// cleared. `EndOfCycle` keeps the original strip firmware behaviour of only
/// checking between full breathe cycles (up to ~9s latency).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PulseCancel {
    EveryStep,
    EndOfCycle,
}

struct StrandInner {
    // one G,R,B triple per led, already gamma corrected
    buffer: Vec<[u8; 3]>,
    wheel_offset: u16,
    sink: Box<dyn Write + Send>,
}

#[derive(Clone)]
pub struct Strand {
    led_count: usize,
    gamma: Arc<GammaTable>,
    inner: Arc<Mutex<StrandInner>>,
    pulsing: Arc<AtomicBool>,
    cancel: PulseCancel,
}

impl Strand {
    pub fn new<W: Write + Send + 'static>(led_count: usize, sink: W) -> Self {
        Self {
            led_count,
            gamma: Arc::new(GammaTable::new()),
            inner: Arc::new(Mutex::new(StrandInner {
                buffer: vec![[0; 3]; led_count],
                wheel_offset: 0,
                sink: Box::new(sink),
            })),
            pulsing: Arc::new(AtomicBool::new(false)),
            cancel: PulseCancel::EveryStep,
        }
    }

    pub fn with_pulse_cancel(mut self, cancel: PulseCancel) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fill the whole strand with a single color.
    pub fn fill(&self, r: u8, g: u8, b: u8) -> Result<(), StripError> {
        self.fill_range(r, g, b, 0, self.led_count)
    }

    /// Fill `[start, end)` with a single color. Bounds are validated before
    /// anything is touched, so a failed call leaves the buffer, the sink and
    /// any running animation exactly as they were.
    pub fn fill_range(
        &self,
        r: u8,
        g: u8,
        b: u8,
        start: usize,
        end: usize,
    ) -> Result<(), StripError> {
        if end > self.led_count || start > end {
            return Err(StripError::Range {
                start,
                end,
                led_count: self.led_count,
            });
        }

        self.pulsing.store(false, Ordering::SeqCst);
        self.write_fill(r, g, b, start, end)
    }

    /// Set a single led, then flush the whole buffer. The full-frame flush
    /// per pixel is the cost of the one-frame protocol, not an oversight.
    pub fn set(&self, pixel: usize, r: u8, g: u8, b: u8) -> Result<(), StripError> {
        self.pulsing.store(false, Ordering::SeqCst);

        let mut inner = self.inner.lock().unwrap();
        inner.buffer[pixel] = self.triple(r, g, b);
        flush_frame(&mut inner)
    }

    /// Flush the buffer to the strand.
    pub fn update(&self) -> Result<(), StripError> {
        flush_frame(&mut self.inner.lock().unwrap())
    }

    /// Advance the moving color wheel one step across the whole strand.
    pub fn wheel(&self) -> Result<(), StripError> {
        self.wheel_range(0, self.led_count)
    }

    pub fn wheel_range(&self, start: usize, end: usize) -> Result<(), StripError> {
        let size = end.saturating_sub(start);
        if size == 0 {
            return Ok(());
        }

        let step = (WHEEL_POSITIONS as usize / size) as u16;
        let offset = {
            let mut inner = self.inner.lock().unwrap();
            inner.wheel_offset = (inner.wheel_offset + 1) % WHEEL_POSITIONS;
            inner.wheel_offset
        };

        for i in 0..size {
            let position = (i as u16 * step + offset) % WHEEL_POSITIONS;
            let (r, g, b) = wheel_colour(position);
            self.set(start + i, r, g, b)?;
        }

        self.update()
    }

    /// Start a breathing animation at the given color. A no-op while another
    /// pulsate is running; any later `fill` or `set` cancels it.
    pub fn pulsate(&self, r: u8, g: u8, b: u8) {
        if self.pulsing.swap(true, Ordering::SeqCst) {
            return;
        }

        let strand = self.clone();
        tokio::spawn(async move {
            strand.run_pulse(r, g, b).await;
        });
    }

    async fn run_pulse(&self, r: u8, g: u8, b: u8) {
        loop {
            for mult in pulse_steps() {
                if self.cancel == PulseCancel::EveryStep && !self.pulsing.load(Ordering::SeqCst) {
                    return;
                }

                let scaled = |v: u8| (v as f32 * mult) as u8;
                if let Err(err) = self.write_fill(scaled(r), scaled(g), scaled(b), 0, self.led_count)
                {
                    log::warn!("pulsate stopped: {err}");
                    self.pulsing.store(false, Ordering::SeqCst);
                    return;
                }

                tokio::time::sleep(PULSE_STEP_DELAY).await;
            }

            if !self.pulsing.load(Ordering::SeqCst) {
                return;
            }
        }
    }

    // Buffer write without touching the cancellation token; the animation
    // task uses this so only foreground fills count as cancellation.
    fn write_fill(&self, r: u8, g: u8, b: u8, start: usize, end: usize) -> Result<(), StripError> {
        let mut inner = self.inner.lock().unwrap();
        let triple = self.triple(r, g, b);
        for led in &mut inner.buffer[start..end] {
            *led = triple;
        }
        flush_frame(&mut inner)
    }

    fn triple(&self, r: u8, g: u8, b: u8) -> [u8; 3] {
        [
            self.gamma.correct(g),
            self.gamma.correct(r),
            self.gamma.correct(b),
        ]
    }
}

// Stream one frame: 3 bytes per led in strand order, then the single zero
// latch byte the original firmware expects regardless of strand length.
fn flush_frame(inner: &mut StrandInner) -> Result<(), StripError> {
    let StrandInner { buffer, sink, .. } = inner;
    for led in buffer.iter() {
        sink.write_all(led)?;
    }
    sink.write_u8(0x00)?;
    sink.flush()?;
    Ok(())
}

// 1.00 down to 0.10 in 90 steps, then 0.10 back up to 1.00.
fn pulse_steps() -> impl Iterator<Item = f32> {
    (0..90)
        .map(|x| 1.0 - x as f32 * 0.01)
        .chain((10..100).map(|x| x as f32 * 0.01))
}

// Three-segment hue ramp over 384 positions; the lit channels always sum to
// 127, with at least one channel dark.
fn wheel_colour(position: u16) -> (u8, u8, u8) {
    if position < 128 {
        ((127 - position) as u8, position as u8, 0)
    } else if position < 256 {
        let p = position - 128;
        (0, (127 - p) as u8, p as u8)
    } else {
        let p = position - 256;
        (p as u8, 0, (127 - p) as u8)
    }
}
