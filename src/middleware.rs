//! Named value injection for commands.
//!
//! A [`Middleware`] captures one value under one name. A [`Command`] applies
//! every middleware registered on it to a fresh [`Injected`] bag before calling
//! its handler, so the handler can ask for values (the process runner, the
//! process environment, ...) by name instead of reaching for globals.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};

use crate::error::MiddlewareError;

/// Values supplied to a command handler, keyed by name
#[derive(Default)]
pub struct Injected {
    values: HashMap<String, Box<dyn Any>>,
}

impl Injected {
    pub fn insert<T: 'static>(&mut self, name: &str, value: T) {
        self.values.insert(name.to_string(), Box::new(value));
    }

    pub fn get<T: 'static>(&self, name: &str) -> Result<&T, MiddlewareError> {
        self.values
            .get(name)
            .and_then(|value| value.downcast_ref::<T>())
            .ok_or_else(|| MiddlewareError::Missing {
                name: name.to_string(),
            })
    }

    /// Removes the value, handing over ownership
    pub fn take<T: 'static>(&mut self, name: &str) -> Result<T, MiddlewareError> {
        match self.values.remove(name).map(|value| value.downcast::<T>()) {
            Some(Ok(value)) => Ok(*value),
            Some(Err(value)) => {
                // Wrong type: put it back for whoever asks correctly
                self.values.insert(name.to_string(), value);
                Err(MiddlewareError::Missing {
                    name: name.to_string(),
                })
            }
            None => Err(MiddlewareError::Missing {
                name: name.to_string(),
            }),
        }
    }
}

/// Supplies one fixed value under one name
pub struct Middleware {
    name: String,
    inject: Box<dyn Fn(&mut Injected)>,
}

impl Middleware {
    pub fn new<T: Clone + 'static>(name: &str, value: T) -> Self {
        let key = name.to_string();
        Self {
            name: name.to_string(),
            inject: Box::new(move |injected: &mut Injected| injected.insert(&key, value.clone())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, injected: &mut Injected) {
        (self.inject)(injected)
    }
}

/// Builder for a set of middlewares, one per option name
#[derive(Default)]
pub struct Middlewares {
    by_name: BTreeMap<String, Middleware>,
}

/// Starts an empty set; add values with [`Middlewares::with`]
pub fn make_middlewares() -> Middlewares {
    Middlewares::default()
}

impl Middlewares {
    /// Registers `value` under `name`, replacing any earlier value
    pub fn with<T: Clone + 'static>(mut self, name: &str, value: T) -> Self {
        self.by_name
            .insert(name.to_string(), Middleware::new(name, value));
        self
    }

    pub fn values(self) -> impl Iterator<Item = Middleware> {
        self.by_name.into_values()
    }
}

/// A named handler plus the middlewares that feed it
pub struct Command<F> {
    name: String,
    handler: F,
    middlewares: Vec<Middleware>,
}

impl<F, T> Command<F>
where
    F: FnOnce(&mut Injected) -> T,
{
    pub fn new(name: &str, handler: F) -> Self {
        Self {
            name: name.to_string(),
            handler,
            middlewares: Vec::new(),
        }
    }

    pub fn add(&mut self, middleware: Middleware) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    /// Injects every registered value, then calls the handler once
    pub fn run(self) -> T {
        let mut injected = Injected::default();
        for middleware in &self.middlewares {
            log::trace!("[{}] injecting {}", self.name, middleware.name());
            middleware.apply(&mut injected);
        }
        (self.handler)(&mut injected)
    }
}
