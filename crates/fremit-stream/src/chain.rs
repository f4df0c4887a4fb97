//! Composition of stages into a single callable.

use std::rc::Rc;

use serde_json::Value;

use crate::stage::Stage;
use crate::stream::Stream;

/// A realized pipeline: feed it a value and every stage runs in order.
pub type Chain = Rc<dyn Fn(Value)>;

/// Compose `stages` into one callable ending in `terminal`.
///
/// Composition runs from the last stage to the first: the last stage gets
/// `terminal` as its continuation, and each earlier stage gets the callable
/// built for everything after it. With no stages the result is `terminal`
/// itself.
#[must_use]
pub fn compose(stages: &[Stage], terminal: Chain) -> Chain {
    stages.iter().rev().fold(terminal, |next, stage| {
        let stage = stage.clone();
        let chain: Chain = Rc::new(move |value: Value| stage.run(value, &*next));
        chain
    })
}

/// Terminal stage delivering a value to every child, in order.
pub(crate) fn fan_out(children: Vec<Stream>) -> Chain {
    Rc::new(move |value: Value| {
        let Some((last, rest)) = children.split_last() else {
            return;
        };
        for child in rest {
            child.deliver(value.clone());
        }
        last.deliver(value);
    })
}
