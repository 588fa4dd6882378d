//! Boolean combinators over child conditions

use std::sync::Arc;

use weir_protocol::Message;

use crate::Condition;

/// True when every child matches; an empty child list is true
pub struct AndCondition {
    children: Vec<Arc<dyn Condition>>,
}

impl AndCondition {
    pub fn new(children: Vec<Arc<dyn Condition>>) -> Self {
        Self { children }
    }
}

impl Condition for AndCondition {
    fn check(&self, msg: &Message) -> bool {
        self.children.iter().all(|c| c.check(msg))
    }

    fn name(&self) -> &'static str {
        "and"
    }
}

/// True when any child matches; an empty child list is false
pub struct OrCondition {
    children: Vec<Arc<dyn Condition>>,
}

impl OrCondition {
    pub fn new(children: Vec<Arc<dyn Condition>>) -> Self {
        Self { children }
    }
}

impl Condition for OrCondition {
    fn check(&self, msg: &Message) -> bool {
        self.children.iter().any(|c| c.check(msg))
    }

    fn name(&self) -> &'static str {
        "or"
    }
}

/// Inverts its child
pub struct NotCondition {
    child: Arc<dyn Condition>,
}

impl NotCondition {
    pub fn new(child: Arc<dyn Condition>) -> Self {
        Self { child }
    }
}

impl Condition for NotCondition {
    fn check(&self, msg: &Message) -> bool {
        !self.child.check(msg)
    }

    fn name(&self) -> &'static str {
        "not"
    }
}
