//! Completion State Machine
//!
//! Per-card transient state for marking an item done. Completing is
//! deferred by a short visual delay; un-completing is immediate. The
//! machine never talks to the store or to timers itself, it returns the
//! effect the caller must carry out.

use crate::ticket::{Ticket, TicketCounter};

/// Delay between the user's click and the toggle reaching the store
pub const COMPLETION_DELAY_MS: u32 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPhase {
    Idle,
    /// Waiting for the delay identified by the ticket
    Completing(Ticket),
}

/// What the caller has to do after feeding an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionEffect {
    None,
    /// Schedule `elapsed(ticket)` after `delay_ms`
    StartDelay { ticket: Ticket, delay_ms: u32 },
    /// Send `set_completed(completed)` to the store
    Emit { completed: bool },
    /// Drop the pending timer
    CancelDelay,
}

#[derive(Debug, Clone)]
pub struct CompletionMachine {
    phase: CompletionPhase,
    tickets: TicketCounter,
    delay_ms: u32,
}

impl Default for CompletionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionMachine {
    pub fn new() -> Self {
        Self::with_delay(COMPLETION_DELAY_MS)
    }

    pub fn with_delay(delay_ms: u32) -> Self {
        Self {
            phase: CompletionPhase::Idle,
            tickets: TicketCounter::new(),
            delay_ms,
        }
    }

    pub fn phase(&self) -> CompletionPhase {
        self.phase
    }

    /// Control is disabled while completing
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, CompletionPhase::Completing(_))
    }

    /// Checkmark state to draw given the last persisted value
    pub fn shows_completed(&self, persisted_completed: bool) -> bool {
        persisted_completed || self.is_busy()
    }

    /// User clicked the checkbox
    pub fn press(&mut self, persisted_completed: bool) -> CompletionEffect {
        match self.phase {
            CompletionPhase::Completing(_) => CompletionEffect::None,
            CompletionPhase::Idle if persisted_completed => CompletionEffect::Emit { completed: false },
            CompletionPhase::Idle => {
                let ticket = self.tickets.issue();
                self.phase = CompletionPhase::Completing(ticket);
                CompletionEffect::StartDelay {
                    ticket,
                    delay_ms: self.delay_ms,
                }
            }
        }
    }

    /// A scheduled delay fired
    pub fn elapsed(&mut self, ticket: Ticket) -> CompletionEffect {
        match self.phase {
            CompletionPhase::Completing(live) if live == ticket && self.tickets.is_current(ticket) => {
                self.tickets.invalidate();
                self.phase = CompletionPhase::Idle;
                CompletionEffect::Emit { completed: true }
            }
            _ => CompletionEffect::None,
        }
    }

    /// User reversed the action before the delay elapsed
    pub fn cancel(&mut self) -> CompletionEffect {
        match self.phase {
            CompletionPhase::Completing(_) => {
                self.tickets.invalidate();
                self.phase = CompletionPhase::Idle;
                CompletionEffect::CancelDelay
            }
            CompletionPhase::Idle => CompletionEffect::None,
        }
    }

    /// The card is leaving the view; a pending toggle must not be emitted
    pub fn unmount(&mut self) -> CompletionEffect {
        self.cancel()
    }
}
