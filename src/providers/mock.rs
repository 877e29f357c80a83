/*!
 * Mock translator implementations for testing.
 *
 * This module provides a mock translator that simulates the behaviors the
 * pipeline has to cope with:
 * - `MockTranslator::echo()` - Always succeeds with translated text
 * - `MockTranslator::omitting(..)` - Succeeds but never resolves some lines
 * - `MockTranslator::failing_times(..)` - Transient failures that recover
 * - `MockTranslator::terminal_on_call(..)` - A terminal failure mid-run
 *
 * Every instance records how many calls it served and which line ids each
 * call requested, so tests can assert on retry and resume behavior.
 */

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::ProviderError;
use crate::providers::{TranslationOutcome, TranslationRequest, Translator};

/// Behavior mode for the mock translator
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always succeeds, echoing each line as "[target] text"
    Echo,
    /// Succeeds but never resolves the given line ids
    OmitIds(HashSet<usize>),
    /// Omits the given ids the first time each is requested, then resolves them
    OmitIdsOnce(HashSet<usize>),
    /// Fails the first `n` calls with a transient error, then echoes
    FailTimes(usize),
    /// Every call fails with a transient error
    AlwaysTransient,
    /// The nth call (1-based) fails with a terminal error; other calls echo
    TerminalOnCall(usize),
    /// Any call requesting one of these ids fails with a terminal error
    TerminalForIds(HashSet<usize>),
    /// Succeeds with an empty outcome
    Empty,
    /// Sleeps before echoing (for cancellation testing)
    Delayed { delay_ms: u64 },
}

/// Mock translator for exercising pipeline behavior without a real service
#[derive(Debug)]
pub struct MockTranslator {
    /// Behavior mode
    behavior: MockBehavior,
    /// Number of calls served so far
    call_count: Arc<AtomicUsize>,
    /// Line ids requested by each call, in call order
    requested_ids: Arc<Mutex<Vec<Vec<usize>>>>,
    /// Ids already omitted once, for `OmitIdsOnce`
    omitted_once: Arc<Mutex<HashSet<usize>>>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            call_count: Arc::new(AtomicUsize::new(0)),
            requested_ids: Arc::new(Mutex::new(Vec::new())),
            omitted_once: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Create a mock that always succeeds
    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    /// Create a mock that never resolves the given ids
    pub fn omitting(ids: impl IntoIterator<Item = usize>) -> Self {
        Self::new(MockBehavior::OmitIds(ids.into_iter().collect()))
    }

    /// Create a mock that omits the given ids on first request only
    pub fn omitting_once(ids: impl IntoIterator<Item = usize>) -> Self {
        Self::new(MockBehavior::OmitIdsOnce(ids.into_iter().collect()))
    }

    /// Create a mock whose first `n` calls fail with a transient error
    pub fn failing_times(n: usize) -> Self {
        Self::new(MockBehavior::FailTimes(n))
    }

    /// Create a mock that always fails with a transient error
    pub fn always_failing() -> Self {
        Self::new(MockBehavior::AlwaysTransient)
    }

    /// Create a mock whose nth call (1-based) fails with a terminal error
    pub fn terminal_on_call(n: usize) -> Self {
        Self::new(MockBehavior::TerminalOnCall(n))
    }

    /// Create a mock that fails terminally whenever the given id is requested
    pub fn terminal_for_id(id: usize) -> Self {
        Self::new(MockBehavior::TerminalForIds(HashSet::from([id])))
    }

    /// Create a mock that succeeds with an empty outcome
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that sleeps before echoing
    pub fn delayed(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Delayed { delay_ms })
    }

    /// Number of calls served so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Line ids requested by each call, in call order
    pub fn requests(&self) -> Vec<Vec<usize>> {
        self.requested_ids.lock().clone()
    }

    /// Number of calls that requested the given id
    pub fn calls_requesting(&self, id: usize) -> usize {
        self.requested_ids
            .lock()
            .iter()
            .filter(|ids| ids.contains(&id))
            .count()
    }

    /// Echo the requested lines as translations, skipping `skip` ids
    fn echo_outcome(request: &TranslationRequest, skip: &HashSet<usize>) -> TranslationOutcome {
        let mut outcome = TranslationOutcome::default();
        for line in &request.lines {
            if !skip.contains(&line.id) {
                outcome
                    .resolved
                    .insert(line.id, format!("[{}] {}", request.target_language, line.text));
            }
        }
        outcome
    }
}

impl Clone for MockTranslator {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior.clone(),
            call_count: Arc::clone(&self.call_count),
            requested_ids: Arc::clone(&self.requested_ids),
            omitted_once: Arc::clone(&self.omitted_once),
        }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate_lines(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationOutcome, ProviderError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        let ids = request.line_ids();
        self.requested_ids.lock().push(ids.clone());

        match &self.behavior {
            MockBehavior::Echo => Ok(Self::echo_outcome(request, &HashSet::new())),

            MockBehavior::OmitIds(omit) => Ok(Self::echo_outcome(request, omit)),

            MockBehavior::OmitIdsOnce(omit) => {
                let mut seen = self.omitted_once.lock();
                let skip: HashSet<usize> = ids
                    .iter()
                    .copied()
                    .filter(|id| omit.contains(id) && seen.insert(*id))
                    .collect();
                Ok(Self::echo_outcome(request, &skip))
            }

            MockBehavior::FailTimes(n) => {
                if call <= *n {
                    Err(ProviderError::ServerOverloaded(format!(
                        "Simulated overload (call #{})",
                        call
                    )))
                } else {
                    Ok(Self::echo_outcome(request, &HashSet::new()))
                }
            }

            MockBehavior::AlwaysTransient => Err(ProviderError::ServerOverloaded(format!(
                "Simulated overload (call #{})",
                call
            ))),

            MockBehavior::TerminalOnCall(n) => {
                if call == *n {
                    Err(ProviderError::AuthenticationError(
                        "Simulated credential rejection".to_string(),
                    ))
                } else {
                    Ok(Self::echo_outcome(request, &HashSet::new()))
                }
            }

            MockBehavior::TerminalForIds(terminal_ids) => {
                if ids.iter().any(|id| terminal_ids.contains(id)) {
                    Err(ProviderError::QuotaExhausted(
                        "Simulated quota exhaustion".to_string(),
                    ))
                } else {
                    Ok(Self::echo_outcome(request, &HashSet::new()))
                }
            }

            MockBehavior::Empty => Ok(TranslationOutcome::default()),

            MockBehavior::Delayed { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(*delay_ms)).await;
                Ok(Self::echo_outcome(request, &HashSet::new()))
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
