//! Completion barrier over a set of animations
//!
//! The epilogue runs exactly once, after the last member ends, regardless of
//! completion order or whether members finished or were canceled. Used to
//! restore view state that several concurrent animations temporarily changed.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::animator::Animator;
use crate::error::{Error, Result};

type Epilogue = Box<dyn FnOnce()>;

struct GroupState {
    remaining: Cell<usize>,
    members: RefCell<Vec<Animator>>,
    epilogue: RefCell<Option<Epilogue>>,
}

impl GroupState {
    fn member_ended(&self) {
        let remaining = self.remaining.get().saturating_sub(1);
        self.remaining.set(remaining);
        if remaining == 0 {
            self.run_epilogue();
        }
    }

    fn run_epilogue(&self) {
        let epilogue = self.epilogue.borrow_mut().take();
        if let Some(epilogue) = epilogue {
            epilogue();
        }
    }
}

#[derive(Clone)]
pub struct AnimationGroup {
    state: Rc<GroupState>,
}

impl AnimationGroup {
    /// Attach the epilogue to every member; an empty group completes at once
    pub fn new(members: Vec<Animator>, epilogue: impl FnOnce() + 'static) -> Self {
        let group = Self {
            state: Rc::new(GroupState {
                remaining: Cell::new(members.len()),
                members: RefCell::new(Vec::new()),
                epilogue: RefCell::new(Some(Box::new(epilogue))),
            }),
        };

        if members.is_empty() {
            group.state.run_epilogue();
            return group;
        }
        for member in members {
            group.attach(member);
        }
        group
    }

    /// Add a member; only allowed before any member has started
    pub fn add(&self, member: Animator) -> Result<()> {
        if self.is_sealed() {
            return Err(Error::GroupSealed);
        }
        self.state.remaining.set(self.state.remaining.get() + 1);
        self.attach(member);
        Ok(())
    }

    fn attach(&self, member: Animator) {
        self.state.members.borrow_mut().push(member.clone());
        let state = self.state.clone();
        member.add_listener(move |_| state.member_ended());
    }

    fn is_sealed(&self) -> bool {
        self.has_completed()
            || self
                .state
                .members
                .borrow()
                .iter()
                .any(|m| m.is_started() || m.has_ended())
    }

    pub fn start(&self) {
        let members = self.state.members.borrow().clone();
        for member in members {
            member.start();
        }
    }

    pub fn cancel(&self) {
        let members = self.state.members.borrow().clone();
        for member in members {
            member.cancel();
        }
    }

    /// Jump every member to its end value
    pub fn end(&self) {
        let members = self.state.members.borrow().clone();
        for member in members {
            member.end();
        }
    }

    pub fn remaining(&self) -> usize {
        self.state.remaining.get()
    }

    pub fn has_completed(&self) -> bool {
        self.state.epilogue.borrow().is_none()
    }
}
