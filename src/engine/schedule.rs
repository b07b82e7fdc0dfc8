/// One-shot rebuild timer on the engine clock. Each request re-arms the deadline, so a
/// burst of changes coalesces into a single rebuild after the last one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RebuildScheduler {
    delay: f64,
    deadline: Option<f64>,
    fit_after: bool,
}

/// A rebuild that came due.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DueRebuild {
    /// Some request in the burst asked for the camera to frame the result.
    pub fit: bool,
}

impl RebuildScheduler {
    pub fn new(delay_secs: f64) -> Self {
        Self {
            delay: delay_secs.max(0.0),
            deadline: None,
            fit_after: false,
        }
    }

    pub fn request(&mut self, now: f64) {
        self.deadline = Some(now + self.delay);
    }

    pub fn request_with_fit(&mut self, now: f64) {
        self.request(now);
        self.fit_after = true;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn take_due(&mut self, now: f64) -> Option<DueRebuild> {
        if self.deadline? > now {
            return None;
        }
        self.deadline = None;
        Some(DueRebuild {
            fit: std::mem::take(&mut self.fit_after),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_due_without_request() {
        let mut schedule = RebuildScheduler::new(0.016);
        assert_eq!(schedule.take_due(100.0), None);
    }

    #[test]
    fn latest_request_wins() {
        let mut schedule = RebuildScheduler::new(0.016);
        schedule.request(0.0);
        schedule.request(0.01);
        assert_eq!(schedule.take_due(0.02), None);
        assert_eq!(schedule.take_due(0.03), Some(DueRebuild { fit: false }));
        assert!(!schedule.is_pending());
        assert_eq!(schedule.take_due(1.0), None);
    }

    #[test]
    fn fit_survives_later_plain_requests() {
        let mut schedule = RebuildScheduler::new(0.016);
        schedule.request_with_fit(0.0);
        schedule.request(0.005);
        assert_eq!(schedule.take_due(0.1), Some(DueRebuild { fit: true }));

        schedule.request(0.2);
        assert_eq!(schedule.take_due(0.3), Some(DueRebuild { fit: false }));
    }
}
