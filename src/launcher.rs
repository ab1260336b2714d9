use std::io;
use std::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("no URL opener is available on this platform")]
    Unsupported,
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// Opens a URL in the user's default browser.
///
/// Implementations fire and forget: the spawned opener is never waited on
/// and its exit status is not observed.
pub trait Launcher {
    fn open(&self, url: &str) -> Result<(), LaunchError>;
}

/// Shells out to a platform opener command with the URL as the final
/// argument.
pub struct CommandLauncher {
    program: &'static str,
    args: &'static [&'static str],
}

impl CommandLauncher {
    pub fn new(program: &'static str, args: &'static [&'static str]) -> Self {
        Self { program, args }
    }
}

impl Launcher for CommandLauncher {
    fn open(&self, url: &str) -> Result<(), LaunchError> {
        Command::new(self.program)
            .args(self.args)
            .arg(url)
            .spawn()
            .map(|_| ())
            .map_err(|source| LaunchError::Spawn {
                command: self.program.to_string(),
                source,
            })
    }
}

struct UnsupportedLauncher;

impl Launcher for UnsupportedLauncher {
    fn open(&self, _url: &str) -> Result<(), LaunchError> {
        Err(LaunchError::Unsupported)
    }
}

/// Picks the opener for the current platform, once, at startup.
pub fn platform() -> Box<dyn Launcher> {
    if cfg!(target_os = "linux") {
        Box::new(CommandLauncher::new("xdg-open", &[]))
    } else if cfg!(target_os = "macos") {
        Box::new(CommandLauncher::new("open", &[]))
    } else if cfg!(target_os = "windows") {
        Box::new(CommandLauncher::new("rundll32", &["url.dll,FileProtocolHandler"]))
    } else {
        Box::new(UnsupportedLauncher)
    }
}
