use std::any::Any;

/// Extracts the human-readable message from a panic payload, when it has
/// one. `panic!` with a literal yields `&str`; formatted panics yield
/// `String`; anything else is opaque.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}
