//! Error values carried through the `error` channel of a sequence.

use std::any::Any;

/// A failure travelling through an observable sequence.
///
/// `Raised` is an error a producer pushed explicitly. `Panicked` is a panic
/// payload that was captured at a task boundary and turned into a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
  #[error("{0}")]
  Raised(String),
  #[error("panicked: {0}")]
  Panicked(String),
}

impl Fault {
  #[inline]
  pub fn raised(message: impl Into<String>) -> Self { Fault::Raised(message.into()) }

  /// Converts the payload returned by `catch_unwind` or `JoinHandle::join`.
  pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
    Fault::Panicked(panic_message(payload.as_ref()))
  }

  /// The message without the variant prefix.
  pub fn message(&self) -> &str {
    match self {
      Fault::Raised(msg) | Fault::Panicked(msg) => msg,
    }
  }

  #[inline]
  pub fn is_panic(&self) -> bool { matches!(self, Fault::Panicked(_)) }
}

/// Best effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(msg) = payload.downcast_ref::<&'static str>() {
    (*msg).to_owned()
  } else if let Some(msg) = payload.downcast_ref::<String>() {
    msg.clone()
  } else {
    "<non-string panic payload>".to_owned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::panic::catch_unwind;

  #[test]
  fn static_str_payload() {
    let payload = catch_unwind(|| panic!("BANG")).unwrap_err();
    assert_eq!(Fault::from_panic(payload), Fault::Panicked("BANG".into()));
  }

  #[test]
  fn formatted_payload() {
    let code = 7;
    let payload = catch_unwind(move || panic!("code {}", code)).unwrap_err();
    let fault = Fault::from_panic(payload);
    assert!(fault.is_panic());
    assert_eq!(fault.message(), "code 7");
    assert_eq!(fault.to_string(), "panicked: code 7");
  }

  #[test]
  fn opaque_payload() {
    let payload = catch_unwind(|| std::panic::panic_any(42_u8)).unwrap_err();
    assert_eq!(Fault::from_panic(payload).message(), "<non-string panic payload>");
  }

  #[test]
  fn raised_display() {
    let fault = Fault::raised("ONERROR BANG");
    assert!(!fault.is_panic());
    assert_eq!(fault.to_string(), "ONERROR BANG");
  }
}
