use crate::error::StripError;
use crate::strand::Strand;

/// Semantic colours the translator deals in; `Blue` doubles as the neutral
/// "stage pending" marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colour {
    Red,
    Green,
    Blue,
    White,
}

impl Colour {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Colour::Red => (255, 0, 0),
            Colour::Green => (0, 255, 0),
            Colour::Blue => (0, 0, 255),
            Colour::White => (255, 255, 255),
        }
    }
}

/// One compound update covering every stage segment of a pipeline: the first
/// entry in `colours` lands on the segment at `offset`, each following entry
/// on the next `segment_width` pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagesUpdate {
    pub offset: usize,
    pub segment_width: usize,
    pub colours: Vec<Colour>,
}

/// An update to exactly one stage segment. Segment numbers start at 1 for
/// the first rendered segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentUpdate {
    pub offset: usize,
    pub segment_width: usize,
    pub segment_number: usize,
    pub colour: Colour,
}

pub trait Renderer {
    fn issue_all_off(&mut self) -> Result<(), StripError>;
    fn issue_start_build_step(&mut self, pixel: usize, r: u8, g: u8, b: u8)
        -> Result<(), StripError>;
    fn issue_update(&mut self, update: StagesUpdate) -> Result<(), StripError>;
    fn issue_update_segment(&mut self, update: SegmentUpdate) -> Result<(), StripError>;
}

/// Renderer backed directly by a shared `Strand`.
#[derive(Clone)]
pub struct StrandRenderer {
    strand: Strand,
}

impl StrandRenderer {
    pub fn new(strand: Strand) -> Self {
        Self { strand }
    }
}

impl Renderer for StrandRenderer {
    fn issue_all_off(&mut self) -> Result<(), StripError> {
        self.strand.fill(0, 0, 0)
    }

    fn issue_start_build_step(
        &mut self,
        pixel: usize,
        r: u8,
        g: u8,
        b: u8,
    ) -> Result<(), StripError> {
        self.strand.set(pixel, r, g, b)
    }

    fn issue_update(&mut self, update: StagesUpdate) -> Result<(), StripError> {
        for (i, colour) in update.colours.iter().enumerate() {
            let start = update.offset + i * update.segment_width;
            let (r, g, b) = colour.rgb();
            self.strand
                .fill_range(r, g, b, start, start + update.segment_width)?;
        }
        Ok(())
    }

    fn issue_update_segment(&mut self, update: SegmentUpdate) -> Result<(), StripError> {
        let start = update.offset + (update.segment_number - 1) * update.segment_width;
        let (r, g, b) = update.colour.rgb();
        self.strand
            .fill_range(r, g, b, start, start + update.segment_width)
    }
}
