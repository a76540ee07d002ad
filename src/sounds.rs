use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;

use rand::seq::SliceRandom;

/// Fire-and-forget audio cues for build events.
pub trait SoundCues {
    fn play_random_start_sound(&self);
    fn play_random_success_sound(&self);
    fn play_random_failure_sound(&self);
}

/// Used when no sound directory is configured.
pub struct Silent;

impl SoundCues for Silent {
    fn play_random_start_sound(&self) {}
    fn play_random_success_sound(&self) {}
    fn play_random_failure_sound(&self) {}
}

/// Plays a random clip out of the configured directory. File names pick the
/// category: anything starting with `start`, `success` or `failure`.
pub struct Player {
    dir: PathBuf,
}

impl Player {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn play_random(&self, category: &str) {
        let path = match pick_random(&self.dir, category) {
            Some(path) => path,
            None => {
                log::warn!("no {category} sounds in {}", self.dir.display());
                return;
            }
        };

        // rodio output streams are not Send, playback gets its own thread
        thread::spawn(move || {
            if let Err(err) = play_file(&path) {
                log::warn!("could not play {}: {err}", path.display());
            }
        });
    }
}

impl SoundCues for Player {
    fn play_random_start_sound(&self) {
        self.play_random("start");
    }

    fn play_random_success_sound(&self) {
        self.play_random("success");
    }

    fn play_random_failure_sound(&self) {
        self.play_random("failure");
    }
}

fn pick_random(dir: &Path, prefix: &str) -> Option<PathBuf> {
    let candidates: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map_or(false, |name| name.starts_with(prefix))
        })
        .collect();

    candidates.choose(&mut rand::thread_rng()).cloned()
}

fn play_file(path: &Path) -> anyhow::Result<()> {
    let (_stream, handle) = rodio::OutputStream::try_default()?;
    let sink = rodio::Sink::try_new(&handle)?;
    let file = fs::File::open(path)?;
    sink.append(rodio::Decoder::new(BufReader::new(file))?);
    sink.sleep_until_end();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("buildlight-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn picks_only_from_the_requested_category() {
        let dir = scratch_dir("cues");
        fs::write(dir.join("start-horn.mp3"), b"").unwrap();
        fs::write(dir.join("start-bell.mp3"), b"").unwrap();
        fs::write(dir.join("success-tada.mp3"), b"").unwrap();

        for _ in 0..20 {
            let name = pick_random(&dir, "start").unwrap();
            let name = name.file_name().unwrap().to_str().unwrap();
            assert!(name.starts_with("start"), "picked {name}");
        }

        assert!(pick_random(&dir, "failure").is_none());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_directory_yields_nothing() {
        let dir = std::env::temp_dir().join("buildlight-no-such-dir");
        assert!(pick_random(&dir, "start").is_none());
    }
}
