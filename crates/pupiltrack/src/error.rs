//! Error types for pipeline stages and the tracking session.

/// Stage precondition failures. None of these are faults: the pipeline turns
/// them into an invalid frame result.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackError {
    /// Frame too small to place a single seed block inside the ignored border.
    NoSeed {
        /// Frame width.
        width: u32,
        /// Frame height.
        height: u32,
        /// Smallest accepted side length.
        min_side: u32,
    },
    /// Too few points to fit an ellipse.
    InsufficientPoints {
        /// Required minimum number of points.
        needed: usize,
        /// Provided number of points.
        got: usize,
    },
    /// Points were sufficient but the least-squares solution is not an ellipse.
    DegenerateFit,
}

impl std::fmt::Display for TrackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSeed {
                width,
                height,
                min_side,
            } => write!(
                f,
                "no seed: frame {}x{} is smaller than {} px on a side",
                width, height, min_side
            ),
            Self::InsufficientPoints { needed, got } => {
                write!(f, "insufficient points: need {}, got {}", needed, got)
            }
            Self::DegenerateFit => write!(f, "least-squares fit did not yield an ellipse"),
        }
    }
}

impl std::error::Error for TrackError {}

/// Failures of one actuator command exchange.
#[derive(Debug)]
pub enum ActuatorError {
    /// No acknowledgment byte arrived within the configured timeout.
    AckTimeout {
        /// Command byte that was sent.
        command: u8,
    },
    /// A byte arrived but it is neither the ack nor the terminate byte.
    AckMismatch {
        /// Configured acknowledgment byte.
        expected: u8,
        /// Byte actually received.
        got: u8,
    },
    /// The remote side requested session shutdown.
    RemoteTerminate,
    /// Transport failure.
    Io(std::io::Error),
}

impl ActuatorError {
    /// Only a remote terminate ends the session; everything else is logged and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RemoteTerminate)
    }
}

impl std::fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AckTimeout { command } => {
                write!(f, "no acknowledgment for command '{}'", *command as char)
            }
            Self::AckMismatch { expected, got } => write!(
                f,
                "unexpected acknowledgment: expected 0x{:02X}, got 0x{:02X}",
                expected, got
            ),
            Self::RemoteTerminate => write!(f, "actuator requested shutdown"),
            Self::Io(e) => write!(f, "actuator I/O error: {}", e),
        }
    }
}

impl std::error::Error for ActuatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ActuatorError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Conditions that end a tracking session.
#[derive(Debug)]
pub enum SessionError {
    /// The actuator sent its terminate byte.
    RemoteTerminate,
    /// Actuator transport failed while shutting down.
    Io(std::io::Error),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemoteTerminate => write!(f, "session terminated by actuator"),
            Self::Io(e) => write!(f, "session I/O error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::RemoteTerminate => None,
        }
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid configuration: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}
