/*
 *  state/mod.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  System state machine
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

//! Coarse system phases
//!
//! ```text
//! Init --button held / no credentials--> ProvisionAp
//! Init --> ConnectingSta --> Running --upload--> Updating --> restart
//! any fatal init failure --> Error
//! ```
//!
//! A state asks for a transition through [`Transition`]; the machine applies
//! it at the start of the next tick, never in the middle of a call.

mod connecting;
mod error;
mod init;
mod provision;
mod running;
mod updating;

use log::{info, warn};
use serde::Serialize;

use crate::services::Services;

pub use connecting::{ConnectingStaState, STA_RETRY};
pub use error::ErrorState;
pub use init::InitState;
pub use provision::ProvisionApState;
pub use running::RunningState;
pub use updating::UpdatingState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StateId {
    Init,
    ProvisionAp,
    ConnectingSta,
    Running,
    Updating,
    Error,
}

impl StateId {
    /// No way out except a manual reset
    pub fn is_terminal(&self) -> bool {
        matches!(self, StateId::Error)
    }
}

/// Transition request collected during one call
#[derive(Debug, Default)]
pub struct Transition {
    next: Option<StateId>,
}

impl Transition {
    pub fn set(&mut self, next: StateId) {
        self.next = Some(next);
    }

    pub fn requested(&self) -> Option<StateId> {
        self.next
    }
}

pub trait State: Send {
    fn id(&self) -> StateId;

    /// Once, on the first tick in this state
    fn entry(&mut self, _svc: &mut Services, _tr: &mut Transition) {}

    /// Every tick
    fn process(&mut self, svc: &mut Services, tr: &mut Transition);

    /// Once, before the next state is entered
    fn exit(&mut self, _svc: &mut Services) {}
}

fn create(id: StateId) -> Box<dyn State> {
    match id {
        StateId::Init => Box::new(InitState),
        StateId::ProvisionAp => Box::new(ProvisionApState),
        StateId::ConnectingSta => Box::new(ConnectingStaState::new(STA_RETRY)),
        StateId::Running => Box::new(RunningState),
        StateId::Updating => Box::new(UpdatingState),
        StateId::Error => Box::new(ErrorState),
    }
}

pub struct StateMachine {
    current: Box<dyn State>,
    pending: Option<StateId>,
    entered: bool,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Starts in [`StateId::Init`]
    pub fn new() -> Self {
        Self::with_state(create(StateId::Init))
    }

    pub fn with_state(state: Box<dyn State>) -> Self {
        Self { current: state, pending: None, entered: false }
    }

    pub fn current(&self) -> StateId {
        self.current.id()
    }

    /// Transition waiting for the next tick
    pub fn pending(&self) -> Option<StateId> {
        self.pending
    }

    /// Request a transition from outside the states
    pub fn request(&mut self, next: StateId) {
        self.pending = Some(next);
    }

    pub fn tick(&mut self, svc: &mut Services) {
        if let Some(next) = self.pending.take() {
            self.switch(next, svc);
        }

        let mut tr = Transition::default();
        if !self.entered {
            self.entered = true;
            self.current.entry(svc, &mut tr);
        }
        if tr.requested().is_none() {
            self.current.process(svc, &mut tr);
        }
        if let Some(next) = tr.requested() {
            self.pending = Some(next);
        }
    }

    fn switch(&mut self, next: StateId, svc: &mut Services) {
        let from = self.current.id();
        if from == next {
            return;
        }
        if from.is_terminal() {
            warn!("state {:?} is terminal, {:?} ignored", from, next);
            return;
        }
        self.current.exit(svc);
        info!("state {:?} -> {:?}", from, next);
        self.current = create(next);
        self.entered = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServicesBuilder;

    struct Counting {
        id: StateId,
        entries: usize,
        processes: usize,
        next: Option<StateId>,
    }

    impl State for Counting {
        fn id(&self) -> StateId {
            self.id
        }

        fn entry(&mut self, _svc: &mut Services, _tr: &mut Transition) {
            self.entries += 1;
        }

        fn process(&mut self, _svc: &mut Services, tr: &mut Transition) {
            self.processes += 1;
            if let Some(next) = self.next {
                tr.set(next);
            }
        }
    }

    #[test]
    fn test_transition_applies_next_tick() {
        let Ok(mut svc) = ServicesBuilder::new().build() else { panic!("build failed") };
        let state = Counting { id: StateId::Running, entries: 0, processes: 0, next: Some(StateId::Error) };
        let mut sm = StateMachine::with_state(Box::new(state));
        sm.tick(&mut svc);
        assert_eq!(sm.current(), StateId::Running);
        assert_eq!(sm.pending(), Some(StateId::Error));
        sm.tick(&mut svc);
        assert_eq!(sm.current(), StateId::Error);
    }

    #[test]
    fn test_error_is_terminal() {
        let Ok(mut svc) = ServicesBuilder::new().build() else { panic!("build failed") };
        let mut sm = StateMachine::with_state(create(StateId::Error));
        sm.tick(&mut svc);
        sm.request(StateId::Running);
        sm.tick(&mut svc);
        assert_eq!(sm.current(), StateId::Error);
    }
}
