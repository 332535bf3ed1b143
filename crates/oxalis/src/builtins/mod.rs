//! The builtin primitive library.
//!
//! Each module registers one concern's worth of primitives into the global
//! frame through the registration surface hosts use for their own
//! primitives. Registration happens at interpreter construction, before the
//! first `eval`.

pub(crate) mod lists;
pub(crate) mod numbers;
pub(crate) mod predicates;
pub(crate) mod re;
pub(crate) mod special_forms;
pub(crate) mod system;

use crate::interp::Interp;

pub(crate) fn register_core(interp: &mut Interp) {
    special_forms::register(interp);
    lists::register(interp);
    numbers::register(interp);
    predicates::register(interp);
    system::register(interp);
    re::register(interp);
}
