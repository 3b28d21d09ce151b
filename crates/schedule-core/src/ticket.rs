//! Tickets for ignoring stale timer and request completions.

/// Token handed out when a deferred operation starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Issues tickets; only the most recent one is current
#[derive(Debug, Default, Clone)]
pub struct TicketCounter {
    current: u64,
    live: bool,
}

impl TicketCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new operation, invalidating any earlier ticket
    pub fn issue(&mut self) -> Ticket {
        self.current += 1;
        self.live = true;
        Ticket(self.current)
    }

    /// Invalidate the outstanding ticket without issuing a new one
    pub fn invalidate(&mut self) {
        self.live = false;
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.live && ticket.0 == self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_ticket_is_current() {
        let mut counter = TicketCounter::new();
        let first = counter.issue();
        let second = counter.issue();
        assert!(!counter.is_current(first));
        assert!(counter.is_current(second));

        counter.invalidate();
        assert!(!counter.is_current(second));
    }

    #[test]
    fn test_ticket_from_closed_session_stays_stale() {
        let mut counter = TicketCounter::new();
        let submitted = counter.issue();
        // Closed, reopened and submitted again before the first request finished
        counter.invalidate();
        let resubmitted = counter.issue();
        assert!(!counter.is_current(submitted));
        assert!(counter.is_current(resubmitted));
    }
}
