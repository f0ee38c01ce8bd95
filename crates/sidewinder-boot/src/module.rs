use crate::error::InitError;

/// An instantiated compiled module.
///
/// The only entry point the bootstrap knows about is `init`. What happens
/// when it is called a second time is up to the module; the sequencer never
/// does that.
pub trait Module {
    /// Hands the module its shader text, vertex first.
    fn init(&mut self, vertex: &str, fragment: &str) -> Result<(), InitError>;
}

impl<M: Module + ?Sized> Module for Box<M> {
    fn init(&mut self, vertex: &str, fragment: &str) -> Result<(), InitError> {
        (**self).init(vertex, fragment)
    }
}
