// Interpolation utilities

use nalgebra_glm as glm;

/// Locate the keys surrounding `time`.
/// Returns (before, after, t) where t is the normalized position between the two.
/// Outside the keyed range both indices point at the nearest end key.
pub fn keyframe_span(times: &[f32], time: f32) -> Option<(usize, usize, f32)> {
    let last = times.len().checked_sub(1)?;

    if time <= times[0] {
        return Some((0, 0, 0.0));
    }
    if time >= times[last] {
        return Some((last, last, 0.0));
    }

    // First key strictly after `time`; guaranteed in 1..=last by the checks above
    let after = times.partition_point(|&k| k <= time);
    let before = after - 1;
    let span = times[after] - times[before];
    let t = if span > 0.0 {
        (time - times[before]) / span
    } else {
        0.0
    };
    Some((before, after, t))
}

/// Linear interpolation for vectors
pub fn lerp_vec3(v1: &glm::Vec3, v2: &glm::Vec3, t: f32) -> glm::Vec3 {
    glm::lerp(v1, v2, t)
}

/// Linear interpolation for scalars
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Local transform matrix from translation, rotation and scale (T * R * S)
pub fn compose_trs(translation: &glm::Vec3, rotation: &glm::Quat, scale: &glm::Vec3) -> glm::Mat4 {
    glm::translation(translation) * glm::quat_to_mat4(rotation) * glm::scaling(scale)
}
