//! Condition evaluation against world state and event payloads.

use crate::event::Event;
use crate::model::{Condition, ConditionKind, Predicate, RuntimeObject, Selector};

/// Who satisfied a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Satisfier {
    /// A single runtime object, by index.
    Actor(usize),
    /// Every object in the scene (a won game has no single actor).
    AllObjects,
}

/// The payload view a predicate is tested against. World-state kinds
/// ignore it; event-carried kinds require the relevant references.
#[derive(Debug, Clone, Copy, Default)]
struct EventView {
    primary: Option<usize>,
    secondary: Option<usize>,
    arg: f32,
    won: bool,
}

impl EventView {
    /// Only the world state: the view an AND branch is tested with.
    const WORLD: EventView = EventView {
        primary: None,
        secondary: None,
        arg: 0.0,
        won: false,
    };

    fn of(event: &Event) -> Self {
        match *event {
            Event::Tick => EventView::WORLD,
            Event::Attack {
                attacker,
                target,
                damage,
            } => EventView {
                primary: Some(attacker),
                secondary: Some(target),
                arg: damage,
                ..EventView::WORLD
            },
            Event::Attacked { target, damage } => EventView {
                primary: Some(target),
                secondary: None,
                arg: damage,
                ..EventView::WORLD
            },
            Event::Died { victim } => EventView {
                primary: Some(victim),
                ..EventView::WORLD
            },
            Event::Won => EventView {
                won: true,
                ..EventView::WORLD
            },
        }
    }
}

/// Tests a condition against the current scene and event.
///
/// Returns who gets the credit when it holds. With an AND branch, both
/// predicates must hold; the branch is tested against world state only
/// and, when it names an actor, that actor takes the credit.
pub fn evaluate(
    cond: &Condition,
    objects: &[RuntimeObject],
    event: &Event,
) -> Option<Satisfier> {
    let actor = eval_predicate(&cond.first, objects, &EventView::of(event))?;
    let actor = match &cond.second {
        None => actor,
        Some(second) => eval_predicate(second, objects, &EventView::WORLD)?,
    };
    if cond.first.kind == ConditionKind::GameWon {
        Some(Satisfier::AllObjects)
    } else {
        Some(Satisfier::Actor(actor))
    }
}

fn eval_predicate(
    pred: &Predicate,
    objects: &[RuntimeObject],
    view: &EventView,
) -> Option<usize> {
    match pred.kind {
        ConditionKind::Proximity => find_pair(objects, pred, |a, b| {
            a.pos.dist(&b.pos) <= pred.arg
        }),
        ConditionKind::Approaching => find_pair(objects, pred, |a, b| {
            a.pos.dist(&b.pos) < a.prev_pos.dist(&b.prev_pos)
        }),
        ConditionKind::Retiring => find_pair(objects, pred, |a, b| {
            a.pos.dist(&b.pos) > a.prev_pos.dist(&b.prev_pos)
        }),
        ConditionKind::Moving => objects
            .iter()
            .position(|o| selects(&pred.primary, o) && o.pos.dist(&o.prev_pos) > 0.0),
        ConditionKind::GameWon => view.won.then_some(0),
        ConditionKind::Attacked => {
            let primary = view.primary?;
            let secondary = view.secondary?;
            (selects(&pred.primary, &objects[primary])
                && selects(&pred.secondary, &objects[secondary])
                && pred.arg >= view.arg)
                .then_some(primary)
        }
        ConditionKind::Damaged => {
            let primary = view.primary?;
            (selects(&pred.primary, &objects[primary]) && pred.arg >= view.arg)
                .then_some(primary)
        }
        ConditionKind::Destroyed => {
            let primary = view.primary?;
            selects(&pred.primary, &objects[primary]).then_some(primary)
        }
    }
}

/// First ordered pair of distinct objects where the primary/secondary
/// selectors match and `test` holds; the primary index is the actor.
fn find_pair(
    objects: &[RuntimeObject],
    pred: &Predicate,
    test: impl Fn(&RuntimeObject, &RuntimeObject) -> bool,
) -> Option<usize> {
    for (i, a) in objects.iter().enumerate() {
        if !selects(&pred.primary, a) {
            continue;
        }
        for (j, b) in objects.iter().enumerate() {
            if i == j || !selects(&pred.secondary, b) {
                continue;
            }
            if test(a, b) {
                return Some(i);
            }
        }
    }
    None
}

/// The player carries no class; everything else must match the selector
/// class exactly.
fn selects(sel: &Selector, object: &RuntimeObject) -> bool {
    object.ty == sel.ty
        && (object.ty == crate::model::ObjectType::Player || object.class == sel.class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::ObjectType;

    fn mob(id: &str, class: &str, pos: Point, prev: Point) -> RuntimeObject {
        RuntimeObject {
            ty: ObjectType::Mob,
            class: class.into(),
            id: id.into(),
            pos,
            prev_pos: prev,
            hp: 10.0,
            damage: 1.0,
            pos_predefined: true,
            valid: false,
        }
    }

    fn selector(ty: ObjectType, class: &str) -> Selector {
        Selector {
            ty,
            class: class.into(),
        }
    }

    fn predicate(kind: ConditionKind, primary: Selector, secondary: Selector, arg: f32) -> Predicate {
        Predicate {
            kind,
            primary,
            secondary,
            arg,
        }
    }

    fn simple(kind: ConditionKind, primary: Selector, secondary: Selector, arg: f32) -> Condition {
        Condition {
            n: 1,
            first: predicate(kind, primary, secondary, arg),
            second: None,
        }
    }

    /// Player at index 1, zombie at index 0, one step apart.
    fn close_scene() -> Vec<RuntimeObject> {
        vec![
            mob("zombie_1", "zombie", Point::new(5.0, 5.0), Point::new(5.0, 5.0)),
            RuntimeObject::player(Point::new(4.0, 5.0)),
        ]
    }

    #[test]
    fn proximity_credits_the_primary() {
        let cond = simple(
            ConditionKind::Proximity,
            selector(ObjectType::Player, ""),
            selector(ObjectType::Mob, "zombie"),
            2.0,
        );
        let objects = close_scene();
        assert_eq!(
            evaluate(&cond, &objects, &Event::Tick),
            Some(Satisfier::Actor(1))
        );
    }

    #[test]
    fn proximity_respects_the_distance_bound() {
        let cond = simple(
            ConditionKind::Proximity,
            selector(ObjectType::Player, ""),
            selector(ObjectType::Mob, "zombie"),
            0.5,
        );
        let objects = close_scene();
        assert_eq!(evaluate(&cond, &objects, &Event::Tick), None);
    }

    #[test]
    fn proximity_class_must_match() {
        let cond = simple(
            ConditionKind::Proximity,
            selector(ObjectType::Player, ""),
            selector(ObjectType::Mob, "skeleton"),
            10.0,
        );
        let objects = close_scene();
        assert_eq!(evaluate(&cond, &objects, &Event::Tick), None);
    }

    #[test]
    fn approaching_compares_against_previous_distance() {
        let cond = simple(
            ConditionKind::Approaching,
            selector(ObjectType::Player, ""),
            selector(ObjectType::Mob, "zombie"),
            0.0,
        );
        let mut objects = close_scene();
        // No movement yet: previous distance equals current distance.
        assert_eq!(evaluate(&cond, &objects, &Event::Tick), None);

        objects[1].move_to(Point::new(4.5, 5.0));
        assert_eq!(
            evaluate(&cond, &objects, &Event::Tick),
            Some(Satisfier::Actor(1))
        );
    }

    #[test]
    fn retiring_is_the_opposite_direction() {
        let cond = simple(
            ConditionKind::Retiring,
            selector(ObjectType::Player, ""),
            selector(ObjectType::Mob, "zombie"),
            0.0,
        );
        let mut objects = close_scene();
        objects[1].move_to(Point::new(2.0, 5.0));
        assert_eq!(
            evaluate(&cond, &objects, &Event::Tick),
            Some(Satisfier::Actor(1))
        );
    }

    #[test]
    fn moving_requires_a_position_change_and_class_match() {
        let cond = simple(
            ConditionKind::Moving,
            selector(ObjectType::Mob, "zombie"),
            Selector::default(),
            0.0,
        );
        let mut objects = close_scene();
        assert_eq!(evaluate(&cond, &objects, &Event::Tick), None);

        objects[0].move_to(Point::new(5.0, 6.0));
        assert_eq!(
            evaluate(&cond, &objects, &Event::Tick),
            Some(Satisfier::Actor(0))
        );

        let other_class = simple(
            ConditionKind::Moving,
            selector(ObjectType::Mob, "skeleton"),
            Selector::default(),
            0.0,
        );
        assert_eq!(evaluate(&other_class, &objects, &Event::Tick), None);
    }

    #[test]
    fn attacked_needs_both_references_and_damage_bound() {
        let cond = simple(
            ConditionKind::Attacked,
            selector(ObjectType::Player, ""),
            selector(ObjectType::Mob, "zombie"),
            5.0,
        );
        let objects = close_scene();

        let hit = Event::Attack {
            attacker: 1,
            target: 0,
            damage: 2.0,
        };
        assert_eq!(evaluate(&cond, &objects, &hit), Some(Satisfier::Actor(1)));

        let too_hard = Event::Attack {
            attacker: 1,
            target: 0,
            damage: 9.0,
        };
        assert_eq!(evaluate(&cond, &objects, &too_hard), None);

        // A tick carries no attack payload.
        assert_eq!(evaluate(&cond, &objects, &Event::Tick), None);
    }

    #[test]
    fn damaged_matches_the_event_primary() {
        let cond = simple(
            ConditionKind::Damaged,
            selector(ObjectType::Mob, "zombie"),
            Selector::default(),
            5.0,
        );
        let objects = close_scene();
        let event = Event::Attacked {
            target: 0,
            damage: 3.0,
        };
        assert_eq!(evaluate(&cond, &objects, &event), Some(Satisfier::Actor(0)));
    }

    #[test]
    fn destroyed_matches_the_victim() {
        let cond = simple(
            ConditionKind::Destroyed,
            selector(ObjectType::Mob, "zombie"),
            Selector::default(),
            0.0,
        );
        let objects = close_scene();
        assert_eq!(
            evaluate(&cond, &objects, &Event::Died { victim: 0 }),
            Some(Satisfier::Actor(0))
        );
        assert_eq!(
            evaluate(&cond, &objects, &Event::Died { victim: 1 }),
            None
        );
    }

    #[test]
    fn game_won_credits_all_objects() {
        let cond = simple(
            ConditionKind::GameWon,
            Selector::default(),
            Selector::default(),
            0.0,
        );
        let objects = close_scene();
        assert_eq!(
            evaluate(&cond, &objects, &Event::Won),
            Some(Satisfier::AllObjects)
        );
        assert_eq!(evaluate(&cond, &objects, &Event::Tick), None);
    }

    #[test]
    fn and_branch_is_tested_on_world_state_and_names_the_actor() {
        let cond = Condition {
            n: 1,
            first: predicate(
                ConditionKind::Approaching,
                selector(ObjectType::Player, ""),
                selector(ObjectType::Mob, "zombie"),
                0.0,
            ),
            second: Some(predicate(
                ConditionKind::Proximity,
                selector(ObjectType::Player, ""),
                selector(ObjectType::Mob, "zombie"),
                3.0,
            )),
        };
        let mut objects = vec![
            mob("zombie_1", "zombie", Point::new(5.0, 5.0), Point::new(5.0, 5.0)),
            RuntimeObject::player(Point::new(10.0, 10.0)),
        ];
        objects[1].move_to(Point::new(7.0, 5.0));
        assert_eq!(
            evaluate(&cond, &objects, &Event::Tick),
            Some(Satisfier::Actor(1))
        );
    }

    #[test]
    fn and_branch_failure_fails_the_condition() {
        let cond = Condition {
            n: 1,
            first: predicate(
                ConditionKind::Approaching,
                selector(ObjectType::Player, ""),
                selector(ObjectType::Mob, "zombie"),
                0.0,
            ),
            second: Some(predicate(
                ConditionKind::Proximity,
                selector(ObjectType::Player, ""),
                selector(ObjectType::Mob, "zombie"),
                1.0,
            )),
        };
        let mut objects = vec![
            mob("zombie_1", "zombie", Point::new(5.0, 5.0), Point::new(5.0, 5.0)),
            RuntimeObject::player(Point::new(10.0, 10.0)),
        ];
        // Approaching, but still 2.0 away: the AND branch misses.
        objects[1].move_to(Point::new(7.0, 5.0));
        assert_eq!(evaluate(&cond, &objects, &Event::Tick), None);
    }

    #[test]
    fn event_payload_branch_in_and_position_never_matches() {
        // The AND branch sees no payload, so an event-carried predicate
        // there can never hold.
        let cond = Condition {
            n: 1,
            first: predicate(
                ConditionKind::Proximity,
                selector(ObjectType::Player, ""),
                selector(ObjectType::Mob, "zombie"),
                2.0,
            ),
            second: Some(predicate(
                ConditionKind::Destroyed,
                selector(ObjectType::Mob, "zombie"),
                Selector::default(),
                0.0,
            )),
        };
        let objects = close_scene();
        assert_eq!(
            evaluate(&cond, &objects, &Event::Died { victim: 0 }),
            None
        );
    }
}
