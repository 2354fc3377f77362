mod mass;
mod meteor;
mod motion;
mod stitch;
mod tilt;

pub use mass::{center_of_mass, com_offset, MassSystem};
pub use meteor::{find_site, impact_impulse, is_valid_site, MeteorSystem};
pub use motion::{
    advance_knockback, apply_motion_model, downward_alignment, handicap, stamina_drain,
    MotionSystem,
};
pub use stitch::StitchSystem;
pub use tilt::{capped_target, damp, TiltSystem};
