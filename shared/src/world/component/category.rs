use crate::StateCategory;

/// Declares which state category a component belongs to.
///
/// Simulation systems can guard their inputs with `assert_simulation_safe`:
///
/// ```
/// use lockstep_shared::{assert_simulation_safe, StateCategorized, StateCategory};
///
/// struct Position;
/// impl StateCategorized for Position {
///     const CATEGORY: StateCategory = StateCategory::Simulated;
/// }
///
/// assert_simulation_safe::<Position>();
/// ```
pub trait StateCategorized {
    const CATEGORY: StateCategory;
}

/// True for categories that simulation code may read
pub const fn is_simulation_safe<T: StateCategorized>() -> bool {
    matches!(T::CATEGORY, StateCategory::Simulated | StateCategory::Derived)
}

/// Debug-build check that a simulation code path only touches Simulated or
/// Derived state. Compiles to nothing in release builds.
#[track_caller]
pub fn assert_simulation_safe<T: StateCategorized>() {
    debug_assert!(
        is_simulation_safe::<T>(),
        "{} is {:?} state and must not be read by simulation code",
        std::any::type_name::<T>(),
        T::CATEGORY
    );
}
