//! Lexical parameter scopes and environment slot allocation.
//!
//! Every lambda (the root one included) pushes a frame of named, typed
//! parameters. Each parameter owns a slot in the flat environment vector
//! the evaluator runs over; slots are handed out monotonically and never
//! reused, so a closure can snapshot the environment without aliasing a
//! sibling lambda's parameters.

use std::sync::Arc;

use dynexpr_core::Ty;

/// One in-scope parameter.
#[derive(Debug, Clone)]
pub(crate) struct ParamBinding {
    /// Empty for the anonymous parameters of a non-lambda root.
    pub name: Arc<str>,
    pub slot: usize,
    pub ty: Ty,
}

/// Stack of lambda parameter frames, innermost last.
#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    frames: Vec<Vec<ParamBinding>>,
    next_slot: usize,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack::default()
    }

    /// Total number of environment slots handed out so far.
    pub fn slot_count(&self) -> usize {
        self.next_slot
    }

    /// Open a frame; returns the slots assigned to the parameters in
    /// declaration order.
    pub fn push_frame(&mut self, params: &[(Arc<str>, Ty)]) -> Vec<usize> {
        let mut frame = Vec::with_capacity(params.len());
        let mut slots = Vec::with_capacity(params.len());
        for (name, ty) in params {
            let slot = self.next_slot;
            self.next_slot += 1;
            slots.push(slot);
            frame.push(ParamBinding {
                name: name.clone(),
                slot,
                ty: ty.clone(),
            });
        }
        self.frames.push(frame);
        slots
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Parameter visible under `name`, innermost frame first. Anonymous
    /// parameters are never found by name.
    pub fn resolve(&self, name: &str) -> Option<&ParamBinding> {
        if name.is_empty() {
            return None;
        }
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.iter().find(|b| b.name.as_ref() == name))
    }

    /// The one parameter in scope, when exactly one is bound anywhere.
    /// Unqualified member and method names fall back to it.
    pub fn sole_binding(&self) -> Option<&ParamBinding> {
        let mut found = None;
        for binding in self.frames.iter().flatten() {
            if found.is_some() {
                return None;
            }
            found = Some(binding);
        }
        found
    }
}
