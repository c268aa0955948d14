//! Systems are actions performed every frame to manipulate entities and components.
//!
//! A system declares a [`Spec`] describing its priority and the view it maintains.
//! Each frame, the [scheduler](crate::scheduler) calls [`System::update`] in the update pass
//! and [`System::draw`] in the draw pass,
//! with [`System::before`] and [`System::after`] around each of them.

use std::any::Any;
use std::ops::{Deref, DerefMut};

use crate::scheduler::{Frame, Pass};
use crate::view::View;
use crate::world::State;
use crate::{storage, Component, Entity};

pub mod spec;
#[doc(inline)]
pub use spec::Spec;

#[cfg(test)]
mod tests;

/// A system stores some states of its own and runs once per pass.
///
/// There may be multiple instances of the same implementor type.
/// This is meaningful as they may have different states.
pub trait System {
    /// Describes this instance of system.
    ///
    /// The method is only called when the system is scheduled,
    /// but it should return a consistent value.
    fn spec(&self) -> Spec;

    /// Called before the body of the system in `pass`.
    fn before(&mut self, _pass: Pass, _frame: &Frame) {}

    /// Runs the system in the update pass.
    fn update(&mut self, _ctx: &mut Context<'_>) {}

    /// Runs the system in the draw pass.
    fn draw(&mut self, _ctx: &mut DrawContext<'_>) {}

    /// Called after the body of the system in `pass`.
    fn after(&mut self, _pass: Pass, _frame: &Frame) {}
}

/// The mutable world access given to a system in the update pass.
///
/// Dereferences to [`State`], so all component and global operations are available.
pub struct Context<'t> {
    state: &'t mut State,
    frame: Frame,
    view:  Option<usize>,
}

impl<'t> Context<'t> {
    pub(crate) fn new(state: &'t mut State, frame: Frame, view: Option<usize>) -> Self {
        Self { state, frame, view }
    }

    /// The frame being executed.
    pub fn frame(&self) -> &Frame { &self.frame }

    /// The view of the running system.
    ///
    /// # Panics
    /// Panics if the system does not require any component or flag group.
    pub fn view(&self) -> &View {
        match self.view {
            Some(index) => &self.state.views[index],
            None => panic!("The running system has no view because its spec requires nothing"),
        }
    }

    /// Collects the entities in the view of the running system.
    pub fn entities(&self) -> Vec<Entity> { self.view().entities().collect() }

    /// Calls `f` on the component `C` of each entity in the view.
    pub fn for_each<C: Component>(&self, mut f: impl FnMut(Entity, &C)) {
        let view = self.view();
        for entity in view.entities() {
            if let Some(value) = view.get::<C>(&*self.state, entity) {
                f(entity, value);
            }
        }
    }

    /// Calls `f` on the component `C` of each entity in the view mutably.
    ///
    /// Entities in the view without a `C` are skipped.
    pub fn for_each_mut<C: Component>(&mut self, mut f: impl FnMut(Entity, &mut C)) {
        let index = match self.view {
            Some(index) => index,
            None => panic!("The running system has no view because its spec requires nothing"),
        };
        let flag = self.state.flag_of::<C>();

        let State { views, stores, .. } = &mut *self.state;
        let view = &mut views[index];
        view.refresh(stores);
        let store = storage::downcast_mut::<C>(stores[flag.index()].as_mut());

        match view.column_index(flag) {
            Some(column) => {
                for (entity, slots) in view.rows() {
                    if let Some(slot) = slots[column] {
                        let (owner, value) = store.get_at_mut(slot).expect("column was refreshed");
                        debug_assert_eq!(owner, entity);
                        f(entity, value);
                    }
                }
            }
            None => {
                for entity in view.entities() {
                    if let Some(value) = store.get_mut(entity) {
                        f(entity, value);
                    }
                }
            }
        }
    }
}

impl<'t> Deref for Context<'t> {
    type Target = State;

    fn deref(&self) -> &State { &*self.state }
}

impl<'t> DerefMut for Context<'t> {
    fn deref_mut(&mut self) -> &mut State { &mut *self.state }
}

/// The read-only world access given to a system in the draw pass.
pub struct DrawContext<'t> {
    /// The world state. Components cannot be mutated during the draw pass.
    pub state:  &'t State,
    /// The render target provided by the host.
    pub target: &'t mut dyn Any,
    /// The frame being executed.
    pub frame:  Frame,
    view:       Option<usize>,
}

impl<'t> DrawContext<'t> {
    pub(crate) fn new(
        state: &'t State,
        target: &'t mut dyn Any,
        frame: Frame,
        view: Option<usize>,
    ) -> Self {
        Self { state, target, frame, view }
    }

    /// The view of the running system, if its spec requires anything.
    pub fn view(&self) -> Option<&'t View> {
        let state = self.state;
        self.view.map(move |index| &state.views[index])
    }

    /// Downcasts the render target.
    pub fn target_mut<T: 'static>(&mut self) -> Option<&mut T> { self.target.downcast_mut() }
}

/// A system implemented by closures.
struct FnSystem<U, D> {
    spec:   Spec,
    update: U,
    draw:   D,
}

impl<U, D> System for FnSystem<U, D>
where
    U: FnMut(&mut Context<'_>),
    D: FnMut(&mut DrawContext<'_>),
{
    fn spec(&self) -> Spec { self.spec.clone() }

    fn update(&mut self, ctx: &mut Context<'_>) { (self.update)(ctx) }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) { (self.draw)(ctx) }
}

/// Creates a system that runs `update` in the update pass.
pub fn from_fn(spec: Spec, update: impl FnMut(&mut Context<'_>) + 'static) -> Box<dyn System> {
    Box::new(FnSystem { spec, update, draw: |_: &mut DrawContext<'_>| {} })
}

/// Creates a system that runs `draw` in the draw pass.
pub fn from_draw_fn(
    spec: Spec,
    draw: impl FnMut(&mut DrawContext<'_>) + 'static,
) -> Box<dyn System> {
    Box::new(FnSystem { spec, update: |_: &mut Context<'_>| {}, draw })
}
