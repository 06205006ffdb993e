//! Engine constants and tuning parameters.
//!
//! Distances are pixels, speeds pixels per second, angles radians unless a
//! name says otherwise. Per-frame factors refer to a 60 Hz frame and are
//! rescaled with `types::frame_factor` for other delta times.

// --- Frame clock ---

/// Reference frame rate for per-frame damping factors (Hz).
pub const REFERENCE_FRAME_RATE: f64 = 60.0;

/// Largest delta time a single frame may integrate (seconds).
pub const MAX_FRAME_DT: f64 = 0.1;

/// Input coordinates beyond this magnitude are rejected at the boundary.
pub const MAX_INPUT_COORDINATE: f64 = 1.0e7;

// --- Velocity tracker ---

/// Pointer samples retained for the release velocity estimate.
pub const VELOCITY_HISTORY_LEN: usize = 5;

// --- Drag pendulum ---

/// Gravity torque at 90 degrees from equilibrium (rad/s^2).
pub const DRAG_GRAVITY_STRENGTH: f64 = 2.0;

/// Gravity multiplier while the input point is moving.
pub const DRAG_MOVING_GRAVITY_FACTOR: f64 = 0.3;

/// Input movement below this distance per frame counts as static.
pub const FINGER_MOVE_EPSILON: f64 = 0.1;

/// Scale from (lever arm x input velocity) to angular acceleration.
pub const FINGER_TORQUE_INFLUENCE: f64 = 0.05;

/// Angular damping per frame while the input is moving.
pub const DRAG_DAMPING_MOVING: f64 = 0.98;

/// Angular damping per frame while static and away from equilibrium.
pub const DRAG_DAMPING_SWINGING: f64 = 0.95;

/// Angular damping per frame while static and near equilibrium.
pub const DRAG_DAMPING_SETTLING: f64 = 0.90;

/// Angle from equilibrium below which the heavier settling damping applies.
pub const DRAG_SETTLE_ANGLE: f64 = 0.1;

/// Hard cap on angular speed in every state (rad/s).
pub const MAX_ANGULAR_VELOCITY: f64 = 15.0;

/// Scale of a lifted card.
pub const LIFTED_SCALE: f64 = 1.05;

/// Scale of a card at rest in the hand.
pub const REST_SCALE: f64 = 1.0;

/// Scale change per second while lifting or relaxing.
pub const LIFT_RATE: f64 = 1.2;

// --- Center of mass (fractions of card height toward the top) ---

pub const COM_FACE_CARD: f64 = 0.02;
pub const COM_TEN: f64 = 0.015;
pub const COM_MID_PIP: f64 = 0.01;
pub const COM_LOW_PIP: f64 = 0.005;
pub const COM_BLACK_SUIT: f64 = 0.005;

/// Full jitter span as a fraction of width (x) and height (y).
pub const COM_JITTER: f64 = 0.01;

// --- Throw intent ---

/// Release speed that always counts as an intentional throw.
pub const INTENT_FAST_SPEED: f64 = 150.0;

/// Release speed that counts as intentional after a deliberate drag.
pub const INTENT_DELIBERATE_SPEED: f64 = 50.0;

/// Drag duration that makes a slow release deliberate (seconds).
pub const INTENT_DELIBERATE_DRAG_SECS: f64 = 0.2;

// --- Throw validation ---

/// Releases slower than this are drops; direction and aim are not checked.
pub const MIN_DIRECTIONAL_SPEED: f64 = 30.0;

/// Disallowed release arc, screen-down convention (90 = straight down).
pub const DOWNWARD_ARC_MIN_DEG: f64 = 45.0;
pub const DOWNWARD_ARC_MAX_DEG: f64 = 135.0;

/// Beyond this distance a release needs `MIN_THROW_SPEED`.
pub const LONG_THROW_DISTANCE: f64 = 200.0;

/// Minimum release speed for a long throw.
pub const MIN_THROW_SPEED: f64 = 100.0;

/// Aim allowance as a fraction of the viewport's smaller dimension.
pub const AIM_ALLOWANCE_MOBILE: f64 = 0.45;
pub const AIM_ALLOWANCE_TABLET: f64 = 0.35;
pub const AIM_ALLOWANCE_DESKTOP: f64 = 0.25;

/// Speed class thresholds.
pub const SPEED_CLASS_MEDIUM: f64 = 400.0;
pub const SPEED_CLASS_FAST: f64 = 1000.0;

/// Aim offset that still counts as on-target for a slow throw.
pub const ON_TARGET_BASE_OFFSET: f64 = 60.0;

/// On-target tolerance multipliers per speed class.
pub const ON_TARGET_FACTOR_SLOW: f64 = 1.0;
pub const ON_TARGET_FACTOR_MEDIUM: f64 = 0.75;
pub const ON_TARGET_FACTOR_FAST: f64 = 0.5;

// --- Guided flight ---

/// Time from release by which every accepted throw has arrived (seconds).
pub const DOCKING_BUDGET_SECS: f64 = 2.5;

/// Light air drag per frame during unguided flight.
pub const FLIGHT_DRAG: f64 = 0.995;

/// On-target guidance starts after this fraction of the budget.
pub const ON_TARGET_GUIDANCE_FRACTION: f64 = 0.4;

/// Guidance aims to arrive this long before the budget runs out (seconds).
pub const GUIDANCE_TIME_MARGIN: f64 = 0.3;

/// Lateral bow of the correction curve per pixel of aim error.
pub const CURVE_BOW_FACTOR: f64 = 0.5;

/// Correction curve duration bounds.
pub const CURVE_MIN_DURATION: f64 = 0.35;
pub const CURVE_BUDGET_FRACTION: f64 = 0.7;

/// How far ahead along the curve the desired velocity looks (seconds).
pub const CURVE_LOOKAHEAD_SECS: f64 = 0.1;

/// Curve blend weight at release.
pub const CURVE_MIN_WEIGHT: f64 = 0.05;

/// Curve progress at which the direct pull-to-target starts.
pub const DIRECT_PULL_START: f64 = 0.8;

/// Upper bound on any speed requested by guidance.
pub const MAX_GUIDED_SPEED: f64 = 3000.0;

/// Pointer velocities above this are clamped where they enter the engine (px/s).
pub const MAX_RELEASE_SPEED: f64 = 20_000.0;

/// Radius of the near-target capture zone.
pub const CAPTURE_RADIUS: f64 = 120.0;

/// Incoming speed cap inside the capture zone.
pub const CAPTURE_SPEED_CAP: f64 = 600.0;

/// Fraction of excess speed kept per frame while braking.
pub const CAPTURE_BRAKE_RETAIN: f64 = 0.6;

/// Magnetic pull at the target center (px/s^2), linear in proximity.
pub const MAGNET_STRENGTH: f64 = 2400.0;

/// Docking capture distance.
pub const DOCK_CAPTURE_DISTANCE: f64 = 24.0;

/// Docking capture speed.
pub const DOCK_CAPTURE_SPEED: f64 = 650.0;

/// Zone where spin is damped hard before docking.
pub const FINAL_DOCK_ZONE: f64 = 30.0;

/// Angular damping per frame during flight.
pub const FLIGHT_ANGULAR_DAMPING: f64 = 0.998;

/// Angular damping per frame inside the final dock zone.
pub const FINAL_ZONE_ANGULAR_DAMPING: f64 = 0.92 * 0.8;

/// Spin cap inside the final dock zone (rad/s).
pub const FINAL_ZONE_MAX_SPIN: f64 = 5.0;

/// Duration of the forced direct interpolation once the budget is spent.
pub const FORCE_DOCK_SECS: f64 = 0.1;

/// How far outside the viewport a card may travel.
pub const CONTAINMENT_MARGIN: f64 = 80.0;

/// Largest displacement per frame as a fraction of the viewport diagonal.
pub const MAX_STEP_FRACTION: f64 = 0.25;

// --- Docking ---

/// Rotation and scale settle time after capture (seconds).
pub const DOCK_SETTLE_SECS: f64 = 0.25;

/// Rotation this close to a right angle is left alone on docking.
pub const UPRIGHT_TOLERANCE: f64 = 0.1;

/// Delay between completion and removal from the registry (seconds).
pub const COMPLETION_GRACE_SECS: f64 = 0.5;

// --- Returning ---

/// Exponential blend rate toward the home anchor (1/s).
pub const RETURN_BLEND_RATE: f64 = 10.0;

/// Distance at which a returning card counts as home.
pub const RETURN_ARRIVAL_DISTANCE: f64 = 1.5;

/// Returning always completes after this long (seconds).
pub const RETURN_TIMEOUT_SECS: f64 = 1.2;

/// Angular damping per frame while returning.
pub const RETURN_ANGULAR_DAMPING: f64 = 0.92;

// --- Defaults ---

pub const DEFAULT_CARD_WIDTH: f64 = 57.0;
pub const DEFAULT_CARD_HEIGHT: f64 = 80.0;
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 1400.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 800.0;

/// Device class breakpoints on viewport width.
pub const MOBILE_MAX_WIDTH: f64 = 768.0;
pub const TABLET_MAX_WIDTH: f64 = 1200.0;
