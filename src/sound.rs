use std::path::PathBuf;

/// Audio collaborator driven by the overlay thread.
///
/// Implementations swallow their own failures; playback is always best
/// effort.
pub trait SoundPlayer {
    /// Start playback that repeats until [`SoundPlayer::stop`] is called.
    fn start_loop(&mut self);
    /// Stop any playback started by this player.
    fn stop(&mut self);
    /// Fire a single non-blocking playback.
    fn play_once(&mut self);
}

/// Build the platform player for `path`.
///
/// Must be called on the thread that will drive the player: the audio output
/// stream is bound to the thread that opened it.
pub fn open_player(path: PathBuf) -> Option<Box<dyn SoundPlayer>> {
    #[cfg(target_os = "windows")]
    {
        return platform::RodioPlayer::open(path).map(|p| Box::new(p) as Box<dyn SoundPlayer>);
    }

    #[cfg(not(target_os = "windows"))]
    {
        tracing::warn!(
            "audio playback is not supported on this platform; {} will not be played",
            path.display()
        );
        None
    }
}

#[cfg(target_os = "windows")]
mod platform {
    use super::SoundPlayer;
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
    use std::fs::File;
    use std::io::BufReader;
    use std::path::PathBuf;

    pub struct RodioPlayer {
        path: PathBuf,
        _stream: OutputStream,
        handle: OutputStreamHandle,
        looping: Option<Sink>,
    }

    impl RodioPlayer {
        pub fn open(path: PathBuf) -> Option<Self> {
            match OutputStream::try_default() {
                Ok((stream, handle)) => Some(Self {
                    path,
                    _stream: stream,
                    handle,
                    looping: None,
                }),
                Err(err) => {
                    tracing::warn!("no audio output device: {err}");
                    None
                }
            }
        }

        fn decoder(&self) -> Option<Decoder<BufReader<File>>> {
            let file = match File::open(&self.path) {
                Ok(file) => file,
                Err(err) => {
                    tracing::warn!("failed to open {}: {err}", self.path.display());
                    return None;
                }
            };
            match Decoder::new(BufReader::new(file)) {
                Ok(decoder) => Some(decoder),
                Err(err) => {
                    tracing::warn!("failed to decode {}: {err}", self.path.display());
                    None
                }
            }
        }
    }

    impl SoundPlayer for RodioPlayer {
        fn start_loop(&mut self) {
            self.stop();
            let Some(source) = self.decoder() else { return; };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                sink.append(source.repeat_infinite());
                self.looping = Some(sink);
            }
        }

        fn stop(&mut self) {
            if let Some(sink) = self.looping.take() {
                sink.stop();
            }
        }

        fn play_once(&mut self) {
            let Some(source) = self.decoder() else { return; };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                sink.append(source);
                sink.detach();
            }
        }
    }
}
