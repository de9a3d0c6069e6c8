//! Shared driver handle and configuration.

use crate::driver::{Driver, Name};
use crate::error::{Error, ErrorCode, Result};
use std::{fmt, rc};

/// Specifies what happens to errors the driver records after a forwarded call.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorChecking {
    /// Poll the driver after every call and return pending errors as
    /// [`Error::Driver`].
    ///
    /// [`Error::Driver`]: ../error/enum.Error.html#variant.Driver
    Strict,

    /// Poll the driver after every call and log pending errors.
    Log,

    /// Never poll; errors stay in the driver queue until collected with
    /// [`Context::poll_error`].
    ///
    /// [`Context::poll_error`]: struct.Context.html#method.poll_error
    Deferred,
}

impl Default for ErrorChecking {
    fn default() -> Self {
        ErrorChecking::Strict
    }
}

/// Context configuration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Config {
    /// Driver error policy.
    ///
    /// Default: `Strict`.
    pub error_checking: ErrorChecking,

    /// Whether programs memoize their active uniforms after linking.
    ///
    /// Default: `true`.
    pub cache_uniforms: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            error_checking: ErrorChecking::Strict,
            cache_uniforms: true,
        }
    }
}

impl Config {
    /// Sets the driver error policy.
    pub fn error_checking(mut self, error_checking: ErrorChecking) -> Self {
        self.error_checking = error_checking;
        self
    }

    /// Enables or disables the program uniform cache.
    pub fn cache_uniforms(mut self, cache_uniforms: bool) -> Self {
        self.cache_uniforms = cache_uniforms;
        self
    }
}

/// A handle to the driver of the current thread's context.
///
/// Cloning is cheap and yields another handle to the same driver. `Context`
/// is neither `Send` nor `Sync`.
#[derive(Clone)]
pub struct Context {
    driver: rc::Rc<dyn Driver>,
    config: Config,
}

impl Context {
    /// Constructor.
    pub fn new<D: Driver + 'static>(driver: rc::Rc<D>, config: Config) -> Self {
        Self { driver, config }
    }

    /// Returns the underlying driver.
    ///
    /// Unless errors are `Deferred`, errors still queued from earlier calls
    /// are discarded first, so the next check only sees errors of the calls
    /// made through the returned driver.
    pub fn driver(&self) -> &dyn Driver {
        if self.config.error_checking != ErrorChecking::Deferred {
            self.discard_stale_errors();
        }
        &*self.driver
    }

    /// Returns the context configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Removes one error from the driver queue.
    pub fn poll_error(&self) -> Option<ErrorCode> {
        ErrorCode::from_gl_enum(self.driver.get_error())
    }

    /// Removes every pending error from the driver queue.
    pub fn drain_errors(&self) -> Vec<ErrorCode> {
        let mut errors = Vec::new();
        while let Some(code) = self.poll_error() {
            errors.push(code);
            // Broken drivers may report the same flag forever.
            if errors.len() >= 32 {
                break;
            }
        }
        errors
    }

    fn discard_stale_errors(&self) {
        for code in self.drain_errors() {
            warn!(target: "gl", "discarding stale {}", code);
        }
    }

    /// Applies the error policy after a forwarded driver call.
    ///
    /// Every pending error is consumed; `Strict` reports the first one.
    pub(crate) fn check(&self, call: &'static str) -> Result<()> {
        match self.config.error_checking {
            ErrorChecking::Strict => {
                let mut errors = self.drain_errors().into_iter();
                match errors.next() {
                    Some(code) => {
                        for extra in errors {
                            warn!(target: "gl", "{}: also {}", call, extra);
                        }
                        Err(Error::Driver { call, code })
                    }
                    None => Ok(()),
                }
            }
            ErrorChecking::Log => {
                for code in self.drain_errors() {
                    error!(target: "gl", "{}: {}", call, code);
                }
                Ok(())
            }
            ErrorChecking::Deferred => Ok(()),
        }
    }

    /// Queries a single integer of driver state.
    ///
    /// Keys with several values answer with the first one.
    pub fn get_integer(&self, pname: u32) -> Result<i32> {
        let value = self.driver().get_integer(pname);
        self.check("glGetIntegerv")?;
        Ok(value)
    }

    /// Returns the name occupying the slot queried by `binding`, or 0.
    pub fn bound(&self, binding: u32) -> Result<Name> {
        self.get_integer(binding).map(|name| name as Name)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Context").field("config", &self.config).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl;
    use crate::soft::SoftDriver;

    #[test]
    fn default_config_is_strict_and_cached() {
        let config = Config::default();
        assert_eq!(config.error_checking, ErrorChecking::Strict);
        assert!(config.cache_uniforms);
    }

    #[test]
    fn strict_checking_returns_pending_errors() {
        let driver = rc::Rc::new(SoftDriver::new());
        let ctx = Context::new(driver.clone(), Config::default());
        driver.bind_buffer(0xdead, 0);
        match ctx.check("glBindBuffer") {
            Err(Error::Driver { call, code }) => {
                assert_eq!(call, "glBindBuffer");
                assert_eq!(code, ErrorCode::InvalidEnum);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(ctx.poll_error(), None);
    }

    #[test]
    fn strict_checking_consumes_every_pending_error() {
        let driver = rc::Rc::new(SoftDriver::new());
        let ctx = Context::new(driver.clone(), Config::default());
        driver.bind_buffer(0xdead, 0);
        driver.bind_buffer(gl::ARRAY_BUFFER, 99);
        match ctx.check("glBindBuffer") {
            Err(Error::Driver { code, .. }) => assert_eq!(code, ErrorCode::InvalidEnum),
            other => panic!("unexpected {:?}", other),
        }
        assert!(ctx.check("glBindBuffer").is_ok());
    }

    #[test]
    fn stale_errors_are_discarded_before_driver_access() {
        let driver = rc::Rc::new(SoftDriver::new());
        let ctx = Context::new(driver.clone(), Config::default());
        driver.bind_buffer(0xdead, 0);
        assert_eq!(ctx.get_integer(gl::ARRAY_BUFFER_BINDING).unwrap(), 0);
        assert_eq!(ctx.poll_error(), None);
    }

    #[test]
    fn deferred_checking_leaves_errors_queued() {
        let driver = rc::Rc::new(SoftDriver::new());
        let config = Config::default().error_checking(ErrorChecking::Deferred);
        let ctx = Context::new(driver.clone(), config);
        driver.bind_buffer(0xdead, 0);
        assert!(ctx.check("glBindBuffer").is_ok());
        assert_eq!(ctx.drain_errors(), vec![ErrorCode::InvalidEnum]);
        assert_eq!(ctx.bound(gl::ARRAY_BUFFER_BINDING).unwrap(), 0);
    }
}
