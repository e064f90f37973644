use crate::scheduler::{Scheduler, TimerHandle};

/// What a session timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRole {
    Clock,
    CheckIn,
    Interaction,
    BuddyFade,
    PromptTimeout,
    BreakOver,
}

/// Handles of one session's timers. At most one of each role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTimers {
    pub clock: Option<TimerHandle>,
    pub check_in: Option<TimerHandle>,
    pub interaction: Option<TimerHandle>,
    pub buddy_fade: Option<TimerHandle>,
    pub prompt_timeout: Option<TimerHandle>,
    pub break_over: Option<TimerHandle>,
}

impl SessionTimers {
    fn slots(&self) -> [(TimerRole, Option<TimerHandle>); 6] {
        [
            (TimerRole::Clock, self.clock),
            (TimerRole::CheckIn, self.check_in),
            (TimerRole::Interaction, self.interaction),
            (TimerRole::BuddyFade, self.buddy_fade),
            (TimerRole::PromptTimeout, self.prompt_timeout),
            (TimerRole::BreakOver, self.break_over),
        ]
    }

    fn slot_mut(&mut self, role: TimerRole) -> &mut Option<TimerHandle> {
        match role {
            TimerRole::Clock => &mut self.clock,
            TimerRole::CheckIn => &mut self.check_in,
            TimerRole::Interaction => &mut self.interaction,
            TimerRole::BuddyFade => &mut self.buddy_fade,
            TimerRole::PromptTimeout => &mut self.prompt_timeout,
            TimerRole::BreakOver => &mut self.break_over,
        }
    }

    pub fn role_of(&self, handle: TimerHandle) -> Option<TimerRole> {
        self.slots()
            .into_iter()
            .find(|(_, h)| *h == Some(handle))
            .map(|(role, _)| role)
    }

    pub fn get(&self, role: TimerRole) -> Option<TimerHandle> {
        self.slots()
            .into_iter()
            .find(|(r, _)| *r == role)
            .and_then(|(_, h)| h)
    }

    /// Store `handle` under `role`, cancelling whatever was there.
    pub fn replace(&mut self, scheduler: &mut Scheduler, role: TimerRole, handle: TimerHandle) {
        if let Some(old) = self.slot_mut(role).replace(handle) {
            scheduler.clear(old);
        }
    }

    pub fn cancel(&mut self, scheduler: &mut Scheduler, role: TimerRole) {
        if let Some(old) = self.slot_mut(role).take() {
            scheduler.clear(old);
        }
    }

    /// Drop a handle the scheduler already removed (a fired timeout or a
    /// background-paused interval).
    pub fn forget(&mut self, handle: TimerHandle) {
        if let Some(role) = self.role_of(handle) {
            *self.slot_mut(role) = None;
        }
    }

    pub fn clear_all(&mut self, scheduler: &mut Scheduler) {
        for (_, handle) in self.slots() {
            if let Some(h) = handle {
                scheduler.clear(h);
            }
        }
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.slots().iter().all(|(_, h)| h.is_none())
    }
}
