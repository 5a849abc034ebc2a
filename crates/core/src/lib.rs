pub mod config;
pub mod error;
pub mod fit;
pub mod logging;
pub mod transcript;

pub use config::{
    Config, LayoutConfig, LoggingSettings, ProviderConfig, SessionConfig, SpeakerConfig,
    SpeakersConfig,
};
pub use error::{Error, Result};
pub use fit::{Measure, fit_to_viewport};
pub use logging::{LogFormat, LoggingConfig, init_logging};
pub use transcript::{Transcript, TurnBlock};
