use std::fmt;

use super::navigator::NavigatorKey;
use crate::presentation::SceneKey;

/// Errors raised while building or restoring a navigator.
///
/// All of them are programming errors on the application side: an empty
/// initial stack, or a restore factory that does not know a key it produced
/// itself. Missing or corrupt saved state is not an error; builders fall back
/// to the initial stack instead.
#[derive(Debug)]
pub enum NavigatorError {
    /// The initial stack of scenes or child navigators was empty.
    EmptyStack { navigator: NavigatorKey },
    /// The wizard produced no scene for index 0.
    EmptyWizard { navigator: NavigatorKey },
    /// A scene factory was asked for a key it does not know.
    UnknownScene(SceneKey),
    /// A navigator factory was asked for a key it does not know.
    UnknownNavigator(NavigatorKey),
}

impl fmt::Display for NavigatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigatorError::EmptyStack { navigator } => {
                write!(f, "navigator {navigator}: initial stack may not be empty")
            }
            NavigatorError::EmptyWizard { navigator } => {
                write!(f, "navigator {navigator}: initial scene may not be missing")
            }
            NavigatorError::UnknownScene(key) => write!(f, "unknown scene: {key}"),
            NavigatorError::UnknownNavigator(key) => write!(f, "unknown navigator: {key}"),
        }
    }
}

impl std::error::Error for NavigatorError {}
