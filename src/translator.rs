use crate::directive::{BuildResult, Directive};
use crate::error::StripError;
use crate::pipeline::Pipeline;
use crate::render::{Colour, Renderer};
use crate::sounds::SoundCues;

/// Routes normalized build directives to the pipeline owning the stage and
/// dispatches the matching rendering operation, with optional audio cues.
pub struct Translator<R> {
    pipelines: Vec<Pipeline<R>>,
    sounds: Box<dyn SoundCues + Send>,
}

impl<R: Renderer> Translator<R> {
    pub fn new(pipelines: Vec<Pipeline<R>>, sounds: Box<dyn SoundCues + Send>) -> Self {
        Self { pipelines, sounds }
    }

    // Stage names carrying a configured prefix go to that pipeline, everything
    // else to the first.
    fn determine_pipeline(&mut self, stage_name: &str) -> &mut Pipeline<R> {
        let index = self
            .pipelines
            .iter()
            .position(|pipeline| pipeline.claims(stage_name))
            .unwrap_or(0);
        &mut self.pipelines[index]
    }

    pub fn issue_directive(
        &mut self,
        directive: &Directive,
        play_sound: bool,
    ) -> Result<(), StripError> {
        let (result, stage_name) = match directive {
            // both pipelines share the physical strip, the first will do
            Directive::AllOff => return self.pipelines[0].issue_all_off(),
            Directive::BuildEvent { result, stage_name } => (*result, stage_name.as_str()),
        };

        let pipeline = self.determine_pipeline(stage_name);
        let segment_number = pipeline.determine_segment_number(stage_name)?;

        if segment_number == 0 {
            pipeline.issue_start_build()?;
            if play_sound {
                self.sounds.play_random_start_sound();
            }
            return Ok(());
        }

        let colour = determine_colour(result);
        if segment_number == 1 {
            pipeline.issue_all_stages_update(colour)?;
            if play_sound {
                match colour {
                    Colour::Green => self.sounds.play_random_success_sound(),
                    Colour::Red => self.sounds.play_random_failure_sound(),
                    _ => {}
                }
            }
            return Ok(());
        }

        pipeline.issue_update_segment(segment_number, colour)
    }
}

pub fn determine_colour(result: BuildResult) -> Colour {
    match result {
        BuildResult::Failure => Colour::Red,
        BuildResult::Success => Colour::Green,
        BuildResult::Aborted => Colour::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StripConfig;
    use crate::directive::parse;
    use crate::render::{SegmentUpdate, StagesUpdate};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        AllOff,
        StartStep(usize),
        Update(StagesUpdate),
        Segment(SegmentUpdate),
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Event>>>);

    impl Recorder {
        fn events(&self) -> Vec<Event> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Renderer for Recorder {
        fn issue_all_off(&mut self) -> Result<(), StripError> {
            self.0.lock().unwrap().push(Event::AllOff);
            Ok(())
        }

        fn issue_start_build_step(
            &mut self,
            pixel: usize,
            _r: u8,
            _g: u8,
            _b: u8,
        ) -> Result<(), StripError> {
            self.0.lock().unwrap().push(Event::StartStep(pixel));
            Ok(())
        }

        fn issue_update(&mut self, update: StagesUpdate) -> Result<(), StripError> {
            self.0.lock().unwrap().push(Event::Update(update));
            Ok(())
        }

        fn issue_update_segment(&mut self, update: SegmentUpdate) -> Result<(), StripError> {
            self.0.lock().unwrap().push(Event::Segment(update));
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Cues(Arc<Mutex<Vec<&'static str>>>);

    impl Cues {
        fn played(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().clone()
        }
    }

    impl SoundCues for Cues {
        fn play_random_start_sound(&self) {
            self.0.lock().unwrap().push("start");
        }

        fn play_random_success_sound(&self) {
            self.0.lock().unwrap().push("success");
        }

        fn play_random_failure_sound(&self) {
            self.0.lock().unwrap().push("failure");
        }
    }

    fn translator(recorder: &Recorder, cues: &Cues) -> Translator<Recorder> {
        let pipelines = StripConfig::default()
            .pipelines
            .into_iter()
            .map(|config| Pipeline::new(config, recorder.clone()))
            .collect();
        Translator::new(pipelines, Box::new(cues.clone()))
    }

    fn issue(translator: &mut Translator<Recorder>, message: &str, play_sound: bool) {
        let directive = parse(message).unwrap();
        translator.issue_directive(&directive, play_sound).unwrap();
    }

    #[test]
    fn first_stage_success_updates_all_stages() {
        let (recorder, cues) = (Recorder::default(), Cues::default());
        let mut translator = translator(&recorder, &cues);

        issue(&mut translator, "Build SUCCESS: Unit Tests #42", false);

        assert_eq!(
            recorder.events(),
            vec![Event::Update(StagesUpdate {
                offset: 0,
                segment_width: 4,
                colours: vec![
                    Colour::Green,
                    Colour::Blue,
                    Colour::Blue,
                    Colour::Blue,
                    Colour::Blue,
                ],
            })]
        );
    }

    #[test]
    fn prefixed_stage_routes_to_the_second_pipeline() {
        let (recorder, cues) = (Recorder::default(), Cues::default());
        let mut translator = translator(&recorder, &cues);

        issue(&mut translator, "Build FAILURE: DT - Deploy Test #7", false);

        assert_eq!(
            recorder.events(),
            vec![Event::Segment(SegmentUpdate {
                offset: 20,
                segment_width: 4,
                segment_number: 2,
                colour: Colour::Red,
            })]
        );
    }

    #[test]
    fn all_off_is_issued_exactly_once() {
        let (recorder, cues) = (Recorder::default(), Cues::default());
        let mut translator = translator(&recorder, &cues);

        issue(&mut translator, "all_off", true);

        assert_eq!(recorder.events(), vec![Event::AllOff]);
        assert!(cues.played().is_empty());
    }

    #[test]
    fn prepare_runs_the_chase_and_cues_the_start_sound() {
        let (recorder, cues) = (Recorder::default(), Cues::default());
        let mut translator = translator(&recorder, &cues);

        issue(&mut translator, "Build SUCCESS: Prepare #1", true);

        // 5 stages after Prepare, 4 pixels each
        let events = recorder.events();
        assert_eq!(events.len(), 20);
        assert!(events.iter().all(|e| matches!(e, Event::StartStep(_))));
        assert_eq!(cues.played(), vec!["start"]);
    }

    #[test]
    fn cue_matches_the_resolved_colour() {
        let (recorder, cues) = (Recorder::default(), Cues::default());
        let mut translator = translator(&recorder, &cues);

        issue(&mut translator, "Build SUCCESS: Unit Tests #1", true);
        issue(&mut translator, "Build FAILURE: Unit Tests #2", true);
        issue(&mut translator, "Build ABORTED: Unit Tests #3", true);

        assert_eq!(cues.played(), vec!["success", "failure"]);
    }

    #[test]
    fn later_segments_render_without_a_cue() {
        let (recorder, cues) = (Recorder::default(), Cues::default());
        let mut translator = translator(&recorder, &cues);

        issue(&mut translator, "Build SUCCESS: Integration Tests #5", true);

        assert_eq!(
            recorder.events(),
            vec![Event::Segment(SegmentUpdate {
                offset: 0,
                segment_width: 4,
                segment_number: 2,
                colour: Colour::Green,
            })]
        );
        assert!(cues.played().is_empty());
    }

    #[test]
    fn sound_stays_silent_when_disabled() {
        let (recorder, cues) = (Recorder::default(), Cues::default());
        let mut translator = translator(&recorder, &cues);

        issue(&mut translator, "Build SUCCESS: Prepare #1", false);
        issue(&mut translator, "Build FAILURE: Unit Tests #2", false);

        assert!(cues.played().is_empty());
    }

    #[test]
    fn unknown_stage_renders_nothing() {
        let (recorder, cues) = (Recorder::default(), Cues::default());
        let mut translator = translator(&recorder, &cues);

        let directive = parse("Build SUCCESS: Nightly Cleanup #9").unwrap();
        let err = translator.issue_directive(&directive, true).unwrap_err();

        assert!(matches!(err, StripError::UnknownStage(name) if name == "Nightly Cleanup"));
        assert!(recorder.events().is_empty());
        assert!(cues.played().is_empty());
    }
}
