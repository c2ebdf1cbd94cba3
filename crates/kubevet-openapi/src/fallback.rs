//! Fallback source
//!
//! Tries children in order; the first that enumerates successfully is
//! memoized for the process lifetime and every later call delegates to it.
//! Double-enumeration under concurrent first calls is harmless — the cell
//! publishes exactly one winner and results are idempotent.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::{Result, SourceError};
use crate::source::{SchemaSource, SourceMap};

pub struct FallbackSource {
    sources: Vec<Arc<dyn SchemaSource>>,
    chosen: OnceCell<usize>,
}

impl FallbackSource {
    pub fn new(sources: Vec<Arc<dyn SchemaSource>>) -> Self {
        Self {
            sources,
            chosen: OnceCell::new(),
        }
    }
}

impl SchemaSource for FallbackSource {
    fn enumerate(&self) -> Result<SourceMap> {
        if let Some(&index) = self.chosen.get() {
            return self.sources[index].enumerate();
        }

        let mut errors = Vec::new();
        for (index, source) in self.sources.iter().enumerate() {
            match source.enumerate() {
                Ok(map) => {
                    debug!(index, "fallback source chosen");
                    let _ = self.chosen.set(index);
                    return Ok(map);
                }
                Err(err) => errors.push(err),
            }
        }

        Err(SourceError::Aggregate(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl SchemaSource for CountingSource {
        fn enumerate(&self) -> Result<SourceMap> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SourceError::NoFetchers)
            } else {
                Ok(SourceMap::new())
            }
        }
    }

    fn counting(fail: bool) -> (Arc<AtomicUsize>, Arc<dyn SchemaSource>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Arc::new(CountingSource {
            calls: calls.clone(),
            fail,
        });
        (calls, source)
    }

    #[test]
    fn test_first_success_is_memoized() {
        let (failing_calls, failing) = counting(true);
        let (ok_calls, ok) = counting(false);
        let (late_calls, late) = counting(false);

        let fallback = FallbackSource::new(vec![failing, ok, late]);

        fallback.enumerate().unwrap();
        fallback.enumerate().unwrap();
        fallback.enumerate().unwrap();

        // the failing child was only tried before the choice was made
        assert_eq!(failing_calls.load(Ordering::SeqCst), 1);
        assert_eq!(ok_calls.load(Ordering::SeqCst), 3);
        // the later child is never consulted
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_all_failures_joined() {
        let (_, a) = counting(true);
        let (_, b) = counting(true);
        let fallback = FallbackSource::new(vec![a, b]);

        let err = fallback.enumerate().err().unwrap();
        assert!(matches!(err, SourceError::Aggregate(ref errs) if errs.len() == 2));
    }
}
