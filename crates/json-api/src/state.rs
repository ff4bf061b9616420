//! Shared handler state.

use std::sync::Arc;

use jiff::Timestamp;
use trellis_app::context::AppContext;

/// Services reachable from every handler, injected once per router.
#[derive(Clone)]
pub(crate) struct State {
    pub(crate) app: AppContext,

    /// When this process started serving.
    pub(crate) started_at: Timestamp,
}

impl State {
    #[must_use]
    pub(crate) fn new(app: AppContext, started_at: Timestamp) -> Self {
        Self { app, started_at }
    }

    #[must_use]
    pub(crate) fn from_app_context(app: AppContext) -> Arc<Self> {
        Arc::new(Self::new(app, Timestamp::now()))
    }

    /// Whole seconds since [`State::started_at`], never negative.
    #[must_use]
    pub(crate) fn uptime_seconds(&self, now: Timestamp) -> i64 {
        now.duration_since(self.started_at).as_secs().max(0)
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use testresult::TestResult;

    use crate::test_helpers::Mocks;

    use super::*;

    #[test]
    fn uptime_counts_whole_seconds() -> TestResult {
        let started_at: Timestamp = "2026-03-01T09:00:00Z".parse()?;
        let state = State::new(Mocks::default().into_app_context(), started_at);

        let later = started_at.checked_add(SignedDuration::from_millis(90_500))?;

        assert_eq!(state.uptime_seconds(later), 90);

        Ok(())
    }

    #[test]
    fn clock_going_backwards_reports_zero() -> TestResult {
        let started_at: Timestamp = "2026-03-01T09:00:00Z".parse()?;
        let state = State::new(Mocks::default().into_app_context(), started_at);

        let earlier = started_at.checked_sub(SignedDuration::from_secs(5))?;

        assert_eq!(state.uptime_seconds(earlier), 0);

        Ok(())
    }
}
