use crate::{
    data::{normalize_path, RequestData, ResponseData},
    error::Error,
};
use std::{collections::HashMap, fmt, sync::Arc};

/// Computes a response per request. Takes precedence over any canned response for
/// the same path.
pub trait Handler: Send + Sync {
    fn handle(&self, request: &RequestData) -> Result<ResponseData, Error>;
}

impl<F> Handler for F
where
    F: Fn(&RequestData) -> Result<ResponseData, Error> + Send + Sync,
{
    fn handle(&self, request: &RequestData) -> Result<ResponseData, Error> {
        self(request)
    }
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: AsRef<str>, H: Handler + 'static>(&mut self, pattern: S, handler: H) {
        self.handlers
            .insert(normalize_path(pattern.as_ref()), Arc::new(handler));
    }

    pub fn find(&self, path: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(&normalize_path(path)).cloned()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}
