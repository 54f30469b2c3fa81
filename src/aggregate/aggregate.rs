use std::fmt;

use crate::entity::{Entity, EventRecord};

/// Trait for domain aggregates that can be event-sourced.
///
/// An aggregate owns one embedded `Entity` and interprets its event
/// stream into typed fields via `replay_event`. Mutators never touch
/// storage; they only call `entity_mut().digest(...)`.
pub trait Aggregate: Sized + Default {
    type ReplayError: fmt::Display;

    fn entity(&self) -> &Entity;
    fn entity_mut(&mut self) -> &mut Entity;
    fn replay_event(&mut self, event: &EventRecord) -> Result<(), Self::ReplayError>;
}

/// Wires an aggregate struct's embedded `Entity` field and a replay
/// function into the `Aggregate` trait.
#[macro_export]
macro_rules! impl_aggregate {
    ($ty:ty, $entity:ident, $replay:ident) => {
        $crate::impl_aggregate!($ty, $entity, $replay, String);
    };
    ($ty:ty, $entity:ident, $replay:ident, $err:ty) => {
        impl $crate::Aggregate for $ty {
            type ReplayError = $err;

            fn entity(&self) -> &$crate::Entity {
                &self.$entity
            }

            fn entity_mut(&mut self) -> &mut $crate::Entity {
                &mut self.$entity
            }

            fn replay_event(
                &mut self,
                event: &$crate::EventRecord,
            ) -> Result<(), Self::ReplayError> {
                Self::$replay(self, event)
            }
        }
    };
}

/// Hydrate an aggregate from a loaded `Entity` by replaying its history.
pub fn hydrate<A: Aggregate>(entity: Entity) -> Result<A, A::ReplayError> {
    let mut agg = A::default();
    *agg.entity_mut() = entity;

    let events = agg.entity().events().to_vec();
    agg.entity_mut().set_replaying(true);
    for event in &events {
        if let Err(err) = agg.replay_event(event) {
            agg.entity_mut().set_replaying(false);
            return Err(err);
        }
    }
    agg.entity_mut().set_replaying(false);

    Ok(agg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        entity: Entity,
        value: i64,
    }

    impl Counter {
        fn replay(&mut self, event: &EventRecord) -> Result<(), String> {
            match event.event_name.as_str() {
                "Incremented" => {
                    let by: i64 = event.decode().map_err(|e| e.to_string())?;
                    self.value += by;
                    Ok(())
                }
                other => Err(format!("unknown event {other}")),
            }
        }

        fn increment(&mut self, by: i64) {
            self.entity.digest("Incremented", &by);
            self.value += by;
        }
    }

    impl_aggregate!(Counter, entity, replay);

    #[test]
    fn hydrate_replays_events_in_order() {
        let mut counter = Counter::default();
        counter.entity.set_id("c1");
        counter.increment(2);
        counter.increment(3);

        let entity = counter.entity().clone();
        let rehydrated: Counter = hydrate(entity).unwrap();
        assert_eq!(rehydrated.value, 5);
        assert_eq!(rehydrated.entity().id(), "c1");
    }

    #[test]
    fn hydrate_surfaces_replay_error() {
        let mut entity = Entity::with_id("c1");
        entity.digest("Unknown", &());
        let result: Result<Counter, String> = hydrate(entity);
        assert!(result.is_err());
    }
}
