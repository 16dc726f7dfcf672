use super::math::Vec2;

/// Physical actions as reported by the platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    LookLeft,
    LookRight,
    Jump,
    Interact,
    Reset,
    Quit,
}

const ACTION_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
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

    pub(crate) fn move_axis(&self) -> Vec2 {
        let x = axis_value(
            self.is_down(InputAction::MoveRight),
            self.is_down(InputAction::MoveLeft),
        );
        let y = axis_value(
            self.is_down(InputAction::MoveForward),
            self.is_down(InputAction::MoveBack),
        );
        Vec2::new(x, y).clamp_length_one()
    }

    pub(crate) fn look_axis(&self) -> f32 {
        axis_value(
            self.is_down(InputAction::LookRight),
            self.is_down(InputAction::LookLeft),
        )
    }
}

fn axis_value(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveForward => 0,
            InputAction::MoveBack => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::LookLeft => 4,
            InputAction::LookRight => 5,
            InputAction::Jump => 6,
            InputAction::Interact => 7,
            InputAction::Reset => 8,
            InputAction::Quit => 9,
        }
    }
}

/// Raw device state for one fixed tick. Press flags are edges: they are set
/// for exactly one tick per physical press.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    quit_requested: bool,
    move_axis: Vec2,
    look_axis: f32,
    jump_pressed: bool,
    interact_pressed: bool,
    reset_pressed: bool,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_collector(
        quit_requested: bool,
        actions: &ActionStates,
        jump_pressed: bool,
        interact_pressed: bool,
        reset_pressed: bool,
    ) -> Self {
        Self {
            quit_requested,
            move_axis: actions.move_axis(),
            look_axis: actions.look_axis(),
            jump_pressed,
            interact_pressed,
            reset_pressed,
        }
    }

    pub fn with_move_axis(mut self, move_axis: Vec2) -> Self {
        self.move_axis = move_axis;
        self
    }

    pub fn with_look_axis(mut self, look_axis: f32) -> Self {
        self.look_axis = look_axis;
        self
    }

    pub fn with_jump_pressed(mut self, jump_pressed: bool) -> Self {
        self.jump_pressed = jump_pressed;
        self
    }

    pub fn with_interact_pressed(mut self, interact_pressed: bool) -> Self {
        self.interact_pressed = interact_pressed;
        self
    }

    pub fn with_reset_pressed(mut self, reset_pressed: bool) -> Self {
        self.reset_pressed = reset_pressed;
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn move_axis(&self) -> Vec2 {
        self.move_axis
    }

    pub fn look_axis(&self) -> f32 {
        self.look_axis
    }

    pub fn jump_pressed(&self) -> bool {
        self.jump_pressed
    }

    pub fn interact_pressed(&self) -> bool {
        self.interact_pressed
    }

    pub fn reset_pressed(&self) -> bool {
        self.reset_pressed
    }
}

/// Logical input streams that gameplay can switch on and off independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputStream {
    Movement,
    Jump,
    Interact,
    MazeTilt,
    Look,
}

const STREAM_COUNT: usize = 5;

impl InputStream {
    pub const ALL: [InputStream; STREAM_COUNT] = [
        InputStream::Movement,
        InputStream::Jump,
        InputStream::Interact,
        InputStream::MazeTilt,
        InputStream::Look,
    ];

    const fn index(self) -> usize {
        match self {
            InputStream::Movement => 0,
            InputStream::Jump => 1,
            InputStream::Interact => 2,
            InputStream::MazeTilt => 3,
            InputStream::Look => 4,
        }
    }
}

/// Enable flags per stream. A disabled stream reads as zero / not triggered.
/// Every stream starts disabled; owners enable what they consume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionMap {
    enabled: [bool; STREAM_COUNT],
}

impl ActionMap {
    /// Returns `true` if the stream was previously disabled.
    pub fn enable(&mut self, stream: InputStream) -> bool {
        let was_enabled = self.enabled[stream.index()];
        self.enabled[stream.index()] = true;
        !was_enabled
    }

    /// Returns `true` if the stream was previously enabled.
    pub fn disable(&mut self, stream: InputStream) -> bool {
        let was_enabled = self.enabled[stream.index()];
        self.enabled[stream.index()] = false;
        was_enabled
    }

    pub fn is_enabled(&self, stream: InputStream) -> bool {
        self.enabled[stream.index()]
    }

    pub fn read_vector(&self, stream: InputStream, input: &InputSnapshot) -> Vec2 {
        if !self.is_enabled(stream) {
            return Vec2::ZERO;
        }
        match stream {
            InputStream::Movement | InputStream::MazeTilt => input.move_axis(),
            InputStream::Look => Vec2::new(input.look_axis(), 0.0),
            InputStream::Jump | InputStream::Interact => Vec2::ZERO,
        }
    }

    pub fn triggered(&self, stream: InputStream, input: &InputSnapshot) -> bool {
        if !self.is_enabled(stream) {
            return false;
        }
        match stream {
            InputStream::Jump => input.jump_pressed(),
            InputStream::Interact => input.interact_pressed(),
            InputStream::Movement | InputStream::MazeTilt | InputStream::Look => false,
        }
    }
}
