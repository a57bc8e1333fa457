// Scoped variable storage used while rendering

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use super::value::Value;

pub type Frame = HashMap<String, Value>;

/// A stack of variable frames; lookups see the innermost binding first.
#[derive(Debug, Clone)]
pub struct Context {
    frames: Vec<Frame>,
}

impl Context {
    /// A context holding one empty root frame.
    pub fn new() -> Self {
        Self::from_map(Frame::new())
    }

    /// A context whose root frame is `frame`.
    pub fn from_map(frame: Frame) -> Self {
        Self { frames: vec![frame] }
    }

    /// A context with no frames at all; `set` is a no-op until something is pushed.
    pub fn empty() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(key))
    }

    /// Bind `key` in the innermost frame. A null value removes the binding.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        let key = key.into();
        match value.into() {
            Value::Null => {
                frame.remove(&key);
            }
            value => {
                frame.insert(key, value);
            }
        }
    }

    pub fn push(&mut self, frame: Option<Frame>) {
        self.frames.push(frame.unwrap_or_default());
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Push `frame` for as long as the returned guard lives.
    ///
    /// The guard derefs to the context and pops the frame when dropped, so an
    /// early `?` return or a panic inside the scope still restores the stack.
    pub fn scope(&mut self, frame: Option<Frame>) -> Scope<'_> {
        self.push(frame);
        Scope { context: self }
    }

    /// Run `body` with `frame` pushed, popping it on every exit path.
    pub fn with_frame<T>(&mut self, frame: Option<Frame>, body: impl FnOnce(&mut Context) -> T) -> T {
        let mut scope = self.scope(frame);
        body(&mut scope)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Frame> for Context {
    fn from(frame: Frame) -> Self {
        Self::from_map(frame)
    }
}

pub struct Scope<'a> {
    context: &'a mut Context,
}

impl Deref for Scope<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.context
    }
}

impl DerefMut for Scope<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.context
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        self.context.pop();
    }
}
