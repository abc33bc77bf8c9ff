//! # Render strategies.
//!
//! A strategy turns an outcome into an opaque [`Rendered`] payload. The handler keeps
//! one optional strategy per outcome kind and falls back to a built-in default:
//!
//! | Kind      | Input             | Default                   |
//! |-----------|-------------------|---------------------------|
//! | `loading` | nothing           | [`DEFAULT_LOADING`]       |
//! | `success` | `&[T]` in order   | [`DEFAULT_SUCCESS`]       |
//! | `failure` | `&HandlerError`   | [`DEFAULT_FAILURE`]       |

use std::fmt;
use std::sync::Arc;

use crate::error::HandlerError;

/// Placeholder shown until the outcome is published.
pub const DEFAULT_LOADING: &str = "Loading...";
/// Payload published on success when no success strategy is registered.
pub const DEFAULT_SUCCESS: &str = "Content loaded!";
/// Payload published on failure when no failure strategy is registered.
pub const DEFAULT_FAILURE: &str = "Error loading content";

/// Opaque rendered payload produced by a strategy. Cheap to clone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rendered(Arc<str>);

impl Rendered {
    /// Returns the payload as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Rendered {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<String> for Rendered {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for Rendered {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

type LoadingFn = Box<dyn Fn() -> Rendered + Send + Sync>;
type SuccessFn<T> = Box<dyn Fn(&[T]) -> Rendered + Send + Sync>;
type FailureFn = Box<dyn Fn(&HandlerError) -> Rendered + Send + Sync>;

/// The three optional strategies of a handler.
pub(crate) struct RenderStrategies<T> {
    loading: Option<LoadingFn>,
    success: Option<SuccessFn<T>>,
    failure: Option<FailureFn>,
}

impl<T> Default for RenderStrategies<T> {
    fn default() -> Self {
        Self {
            loading: None,
            success: None,
            failure: None,
        }
    }
}

impl<T: 'static> RenderStrategies<T> {
    pub(crate) fn set_loading<F, R>(&mut self, f: F)
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: Into<Rendered>,
    {
        self.loading = Some(Box::new(move || f().into()));
    }

    pub(crate) fn set_success<F, R>(&mut self, f: F)
    where
        F: Fn(&[T]) -> R + Send + Sync + 'static,
        R: Into<Rendered>,
    {
        self.success = Some(Box::new(move |values: &[T]| f(values).into()));
    }

    pub(crate) fn set_failure<F, R>(&mut self, f: F)
    where
        F: Fn(&HandlerError) -> R + Send + Sync + 'static,
        R: Into<Rendered>,
    {
        self.failure = Some(Box::new(move |err: &HandlerError| f(err).into()));
    }

    pub(crate) fn render_loading(&self) -> Rendered {
        match &self.loading {
            Some(f) => f(),
            None => Rendered::from(DEFAULT_LOADING),
        }
    }

    pub(crate) fn render_success(&self, values: &[T]) -> Rendered {
        match &self.success {
            Some(f) => f(values),
            None => Rendered::from(DEFAULT_SUCCESS),
        }
    }

    pub(crate) fn render_failure(&self, error: &HandlerError) -> Rendered {
        match &self.failure {
            Some(f) => f(error),
            None => Rendered::from(DEFAULT_FAILURE),
        }
    }

    /// Names of the registered strategies, for debugging.
    pub(crate) fn registered(&self) -> Vec<&'static str> {
        [
            ("loading", self.loading.is_some()),
            ("success", self.success.is_some()),
            ("failure", self.failure.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;

    #[test]
    fn test_defaults_when_nothing_registered() {
        let s = RenderStrategies::<u8>::default();
        assert_eq!(s.render_loading().as_str(), DEFAULT_LOADING);
        assert_eq!(s.render_success(&[1, 2]).as_str(), DEFAULT_SUCCESS);
        assert_eq!(
            s.render_failure(&TaskError::fail("x").into()).as_str(),
            DEFAULT_FAILURE
        );
        assert!(s.registered().is_empty());
    }

    #[test]
    fn test_registered_strategies_receive_arguments() {
        let mut s = RenderStrategies::<u8>::default();
        s.set_loading(|| "spinner");
        s.set_success(|values: &[u8]| format!("sum={}", values.iter().sum::<u8>()));
        s.set_failure(|err: &HandlerError| format!("oops: {err}"));

        assert_eq!(s.render_loading().as_str(), "spinner");
        assert_eq!(s.render_success(&[1, 2, 3]).as_str(), "sum=6");
        assert_eq!(
            s.render_failure(&TaskError::fail("db").into()).as_str(),
            "oops: execution failed: db"
        );
        assert_eq!(s.registered(), vec!["loading", "success", "failure"]);
    }
}
