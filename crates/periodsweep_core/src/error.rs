use std::fmt;

use crate::analysis::PointId;

/// Errors raised by the integrator for a single parameter pair
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrationError {
    /// The time interval is empty or not finite
    InvalidSpan { t0: f64, tf: f64 },
    /// Step size fell below the resolution of `t`
    StepSizeTooSmall { t: f64, h: f64 },
    /// Step budget exhausted before reaching the final time
    TooManySteps { t: f64, steps: usize },
    /// The linearly implicit stage matrix `I - h*gamma*J` is singular
    SingularIterationMatrix { t: f64 },
    /// State became NaN or infinite
    NonFiniteState { t: f64 },
}

impl fmt::Display for IntegrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrationError::InvalidSpan { t0, tf } => {
                write!(f, "invalid integration interval [{t0}, {tf}]")
            }
            IntegrationError::StepSizeTooSmall { t, h } => {
                write!(f, "step size {h:e} too small at t={t}")
            }
            IntegrationError::TooManySteps { t, steps } => {
                write!(f, "exceeded {steps} steps at t={t}")
            }
            IntegrationError::SingularIterationMatrix { t } => {
                write!(f, "singular iteration matrix at t={t}")
            }
            IntegrationError::NonFiniteState { t } => {
                write!(f, "non-finite state at t={t}")
            }
        }
    }
}

impl std::error::Error for IntegrationError {}

/// A worker could not hand its result to the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryError {
    pub id: PointId,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "result for point {} could not be delivered", self.id)
    }
}

impl std::error::Error for DeliveryError {}

/// Errors raised by a render sink
#[derive(Debug)]
pub enum RenderError {
    Io(std::io::Error),
    Backend(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Io(e) => write!(f, "render io error: {e}"),
            RenderError::Backend(msg) => write!(f, "render backend error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Io(e) => Some(e),
            RenderError::Backend(_) => None,
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Io(err)
    }
}

/// Errors that abort a whole sweep
#[derive(Debug)]
pub enum SweepError {
    /// The worker pool could not be created
    Pool(String),
    /// Invalid ranges or settings
    Config(String),
    /// Rendering the plot failed
    Render(RenderError),
    /// The driver thread panicked
    Driver(String),
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepError::Pool(msg) => write!(f, "failed to allocate worker pool: {msg}"),
            SweepError::Config(msg) => write!(f, "configuration error: {msg}"),
            SweepError::Render(e) => write!(f, "{e}"),
            SweepError::Driver(msg) => write!(f, "sweep driver failed: {msg}"),
        }
    }
}

impl std::error::Error for SweepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SweepError::Render(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderError> for SweepError {
    fn from(err: RenderError) -> Self {
        SweepError::Render(err)
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;
