use super::component::ComponentKind;
use super::entity::Entity;

/// Behavior run once per tick for every active entity holding all of
/// [`System::requires`].
pub trait System: Send {
    fn name(&self) -> &str;

    fn requires(&self) -> &[ComponentKind];

    /// A system may switch itself off; the manager skips it entirely.
    fn enabled(&self) -> bool {
        true
    }

    fn run(&mut self, entity: &mut Entity, dt: f32);
}
