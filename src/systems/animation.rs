use hecs::{Entity, World};

use crate::components::{EnemyFsm, PlayerFsm};
use crate::events::{EventQueue, GameEvent};
use crate::fsm::{FsmState, StateMachine};

fn announce<S: FsmState>(events: &mut EventQueue, actor: Entity, fsm: &mut StateMachine<S>) {
    if !fsm.take_entered() {
        return;
    }
    let state = fsm.state();
    events.push(GameEvent::StateEntered { actor, state: state.tag() });
    events.push(GameEvent::AnimationRequested {
        actor,
        clip: state.tag(),
        looped: state.looping(),
    });
}

/// Ask the presenter to play the clip of every state entered since the last
/// call. Each entry is reported exactly once.
pub fn animation_system(world: &mut World, events: &mut EventQueue) {
    for (actor, fsm) in world.query_mut::<&mut PlayerFsm>() {
        announce(events, actor, fsm);
    }
    for (actor, fsm) in world.query_mut::<&mut EnemyFsm>() {
        announce(events, actor, fsm);
    }
}
