use crate::config::PipelineConfig;
use crate::error::StripError;
use crate::render::{Colour, Renderer, SegmentUpdate, StagesUpdate};

// Fade-to-black gradient cycled through by the start-build chase.
#[rustfmt::skip]
const CHASE_PALETTE: [[u8; 3]; 32] = [
    [0, 0, 250], [0, 0, 225], [0, 0, 200], [0, 0, 175], [0, 0, 150],
    [0, 0, 125], [0, 0, 100], [0, 0, 75], [0, 0, 50], [0, 0, 25],
    [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0],
    [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0],
    [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0],
    [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0],
];

/// Rotating view over the first `len` palette entries, kept as a head index
/// into a fixed ring so a rotation costs O(1).
#[derive(Debug, Clone)]
struct ChaseWindow {
    len: usize,
    head: usize,
}

impl ChaseWindow {
    fn new(len: usize) -> Self {
        Self { len, head: 0 }
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn len(&self) -> usize {
        self.len
    }

    // Rotating by n moves the entry n slots from the back to the front.
    fn rotate(&mut self, n: usize) {
        self.head = (self.head + self.len - n % self.len) % self.len;
    }

    fn front(&self) -> usize {
        self.head
    }
}

/// Renders one CI pipeline's progress onto its reserved pixel range of the
/// shared strip.
pub struct Pipeline<R> {
    config: PipelineConfig,
    window: ChaseWindow,
    renderer: R,
}

impl<R: Renderer> Pipeline<R> {
    pub fn new(config: PipelineConfig, renderer: R) -> Self {
        let span = pixel_span(&config);
        Self {
            window: ChaseWindow::new(span.min(CHASE_PALETTE.len())),
            config,
            renderer,
        }
    }

    /// True when this pipeline's routing prefix matches the stage name.
    pub fn claims(&self, stage_name: &str) -> bool {
        self.config
            .name_prefix
            .as_deref()
            .map_or(false, |prefix| stage_name.starts_with(prefix))
    }

    pub fn issue_all_off(&mut self) -> Result<(), StripError> {
        self.renderer.issue_all_off()
    }

    /// Sweep the chase animation across the pipeline's span, one palette
    /// rotation per pixel, then rotate back to keep repeated builds starting
    /// from the same alignment.
    pub fn issue_start_build(&mut self) -> Result<(), StripError> {
        if self.window.is_empty() {
            return Ok(());
        }

        let span = pixel_span(&self.config);
        for pixel in self.config.offset..self.config.offset + span {
            self.window.rotate(1);
            let [r, g, b] = CHASE_PALETTE[self.window.front()];
            self.renderer.issue_start_build_step(pixel, r, g, b)?;
        }
        self.window.rotate(self.window.len() - 1);

        Ok(())
    }

    /// The given stage resolved with `colour`; every later stage goes back to
    /// the neutral pending marker.
    pub fn issue_all_stages_update(&mut self, colour: Colour) -> Result<(), StripError> {
        let stage_count = self.config.stages.len();
        let mut colours = vec![colour];
        colours.extend(std::iter::repeat(Colour::Blue).take(stage_count.saturating_sub(2)));

        self.renderer.issue_update(StagesUpdate {
            offset: self.config.offset,
            segment_width: self.config.stage_width,
            colours,
        })
    }

    pub fn issue_update_segment(
        &mut self,
        segment_number: usize,
        colour: Colour,
    ) -> Result<(), StripError> {
        self.renderer.issue_update_segment(SegmentUpdate {
            offset: self.config.offset,
            segment_width: self.config.stage_width,
            segment_number,
            colour,
        })
    }

    pub fn determine_segment_number(&self, stage_name: &str) -> Result<usize, StripError> {
        self.config
            .stages
            .get(stage_name)
            .copied()
            .ok_or_else(|| StripError::UnknownStage(stage_name.to_string()))
    }
}

// Pixels spanned by the rendered segments; the "Prepare" stage owns no pixels.
fn pixel_span(config: &PipelineConfig) -> usize {
    config.stage_width * config.stages.len().saturating_sub(1)
}
