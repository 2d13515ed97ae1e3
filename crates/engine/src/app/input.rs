#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    Forward,
    Backward,
    Left,
    Right,
    Jump,
    Dash,
}

const ACTION_COUNT: usize = 6;

pub(crate) const ALL_ACTIONS: [InputAction; ACTION_COUNT] = [
    InputAction::Forward,
    InputAction::Backward,
    InputAction::Left,
    InputAction::Right,
    InputAction::Jump,
    InputAction::Dash,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn any_down(&self) -> bool {
        self.down.iter().any(|down| *down)
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::Forward => 0,
            InputAction::Backward => 1,
            InputAction::Left => 2,
            InputAction::Right => 3,
            InputAction::Jump => 4,
            InputAction::Dash => 5,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            InputAction::Forward => "forward",
            InputAction::Backward => "backward",
            InputAction::Left => "left",
            InputAction::Right => "right",
            InputAction::Jump => "jump",
            InputAction::Dash => "dash",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_has_a_distinct_slot() {
        let mut states = ActionStates::default();
        for action in ALL_ACTIONS {
            states.set(action, true);
            for other in ALL_ACTIONS {
                assert_eq!(states.is_down(other), other == action, "{:?}", other);
            }
            states.set(action, false);
        }
        assert!(!states.any_down());
    }
}
