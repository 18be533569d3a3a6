use strum::IntoStaticStr;

use crate::{
    env::Env,
    heap::HeapData,
    types::vector,
    value::Tag,
};

/// Result alias for every operation that can unwind.
pub(crate) type EvalResult<T> = Result<T, Unwind>;

/// The typed unwind token.
///
/// Evaluation never uses host exceptions; an unwinding computation returns
/// `Err` and every frame on the way out restores its own bookkeeping. `block`
/// and `with-condition` are the only catch points; `Exit` passes through both
/// and terminates the host loop.
#[derive(Debug)]
pub(crate) enum Unwind {
    /// A raised condition object.
    Condition(Tag),
    /// A `(tag . value)` pair thrown by `return`, caught by a matching `block`.
    Throw(Tag),
    /// `(exit n)` from user code.
    Exit(i32),
}

/// Condition classes, printed as keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum CondClass {
    #[strum(serialize = "simple")]
    Simple,
    #[strum(serialize = "type")]
    Type,
    #[strum(serialize = "parse")]
    Parse,
    #[strum(serialize = "read")]
    Read,
    #[strum(serialize = "arith")]
    Arith,
    #[strum(serialize = "zerodiv")]
    ZeroDiv,
    #[strum(serialize = "fpover")]
    FpOver,
    #[strum(serialize = "fpunder")]
    FpUnder,
    #[strum(serialize = "fpinex")]
    FpInex,
    #[strum(serialize = "fpinv")]
    FpInv,
    #[strum(serialize = "cell")]
    Cell,
    #[strum(serialize = "control")]
    Control,
    #[strum(serialize = "range")]
    Range,
    #[strum(serialize = "unslot")]
    Unslot,
    #[strum(serialize = "unsym")]
    Unsym,
    #[strum(serialize = "unfunc")]
    Unfunc,
    #[strum(serialize = "stream")]
    Stream,
    #[strum(serialize = "file")]
    File,
    #[strum(serialize = "eof")]
    Eof,
    #[strum(serialize = "program")]
    Program,
    #[strum(serialize = "print")]
    Print,
    #[strum(serialize = "store")]
    Store,
}

impl CondClass {
    pub(crate) fn keyword(self) -> Tag {
        Tag::keyword(self.into())
    }
}

/// Heap layout of a condition object.
#[derive(Debug)]
pub(crate) struct ConditionData {
    /// Condition class keyword.
    pub class: Tag,
    /// View of the oldest live frame at raise time.
    pub frame: Tag,
    /// The offending source value.
    pub source: Tag,
    /// Human-readable reason string.
    pub reason: Tag,
}

pub(crate) fn is_condition(env: &Env, tag: Tag) -> bool {
    tag.is_extended() && matches!(env.heap.get(tag), HeapData::Condition(_))
}

/// Allocates a condition carrying the current oldest-frame view.
pub(crate) fn make_condition(env: &mut Env, class: Tag, reason: Tag, source: Tag) -> Tag {
    let frame = env.last_frame_view();
    env.heap.alloc(HeapData::Condition(ConditionData {
        class,
        frame,
        source,
        reason,
    }))
}

/// Raises a condition of `class`: builds the object and returns the unwind.
pub(crate) fn raise<T>(env: &mut Env, class: CondClass, reason: &str, source: Tag) -> EvalResult<T> {
    let reason = vector::make_string(&mut env.heap, reason.as_bytes());
    let condition = make_condition(env, class.keyword(), reason, source);
    env.tracer.on_condition(class.into());
    Err(Unwind::Condition(condition))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_keywords_fit_the_immediate_cap() {
        for class in [
            CondClass::Simple,
            CondClass::ZeroDiv,
            CondClass::FpUnder,
            CondClass::Control,
            CondClass::Program,
        ] {
            let name: &'static str = class.into();
            assert!(name.len() <= 7, "{name} is too long for a keyword");
            assert!(class.keyword().is_keyword());
        }
    }
}
