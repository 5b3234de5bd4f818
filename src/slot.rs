//! Callback slots shared by the stubs

/// Borrow a configured callback, panicking if the slot is empty.
#[track_caller]
pub(crate) fn get<'a, F: ?Sized>(slot: &'a Option<Box<F>>, owner: &str, name: &str) -> &'a F {
    match slot {
        Some(f) => f,
        None => missing(owner, name),
    }
}

/// Mutably borrow a configured callback, panicking if the slot is empty.
#[track_caller]
pub(crate) fn get_mut<'a, F: ?Sized>(
    slot: &'a mut Option<Box<F>>,
    owner: &str,
    name: &str,
) -> &'a mut F {
    match slot {
        Some(f) => f,
        None => missing(owner, name),
    }
}

/// Render which slots are configured, for `Debug` output.
pub(crate) fn state<F: ?Sized>(slot: &Option<Box<F>>) -> &'static str {
    if slot.is_some() {
        "configured"
    } else {
        "unset"
    }
}

#[cold]
#[track_caller]
fn missing(owner: &str, name: &str) -> ! {
    log::error!("{owner}::{name} invoked without a configured callback");
    panic!("{owner}: no `{name}` callback configured");
}
