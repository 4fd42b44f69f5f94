use glam::{Mat4, Quat, Vec3};
use std::cell::{Cell, Ref, RefCell};

#[derive(Debug, Clone)]
pub struct Transform {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,

    local_matrix: RefCell<Mat4>,
    world_matrix: RefCell<Mat4>,
    inverse_transpose_world_matrix: RefCell<Mat4>,
    local_dirty: Cell<bool>,
    world_dirty: Cell<bool>,
    has_changed_since_last_update: Cell<bool>,
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_matrix: RefCell::new(Mat4::IDENTITY),
            world_matrix: RefCell::new(Mat4::IDENTITY),
            inverse_transpose_world_matrix: RefCell::new(Mat4::IDENTITY),
            local_dirty: Cell::new(true),
            world_dirty: Cell::new(true),
            has_changed_since_last_update: Cell::new(true),
        }
    }

    pub fn get_local_matrix(&self) -> Ref<Mat4> {
        if self.local_dirty.get() {
            let matrix =
                Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation);

            self.local_matrix.replace(matrix);
            self.local_dirty.set(false);
            self.invalidate_world();
        }

        self.local_matrix.borrow()
    }

    pub fn get_world_matrix(&self) -> Ref<Mat4> {
        self.world_matrix.borrow()
    }

    pub fn get_inverse_transpose_world_matrix(&self) -> Ref<Mat4> {
        self.inverse_transpose_world_matrix.borrow()
    }

    pub fn set_world_matrix(&self, world_matrix: Mat4) {
        self.world_matrix.replace(world_matrix);
        self.world_dirty.set(false);
        self.has_changed_since_last_update.set(true);

        // A zero scale axis (a shrunk-away actor) has no inverse; keep the last good one
        let inverse = world_matrix.inverse();
        if inverse.is_finite() {
            self.inverse_transpose_world_matrix
                .replace(inverse.transpose());
        }
    }

    pub fn invalidate_local(&self) {
        self.local_dirty.set(true);
        self.world_dirty.set(true);
        self.has_changed_since_last_update.set(true);
    }

    pub fn invalidate_world(&self) {
        self.world_dirty.set(true);
    }

    pub fn is_world_dirty(&self) -> bool {
        self.world_dirty.get()
    }

    pub fn set_transform(&mut self, translation: Vec3, rotation: Quat, scale: Vec3) {
        if self.translation == translation && self.rotation == rotation && self.scale == scale {
            return;
        }

        self.translation = translation;
        self.rotation = rotation;
        self.scale = scale;
        self.invalidate_local();
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn reset_flags(&self) {
        self.has_changed_since_last_update.set(false);
    }

    pub fn has_changed(&self) -> bool {
        self.has_changed_since_last_update.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_matrix_follows_trs() {
        let mut transform = Transform::from_translation(Vec3::ZERO);
        transform.set_transform(Vec3::new(25.0, 0.0, 0.0), Quat::IDENTITY, Vec3::splat(3.0));

        let point = transform.get_local_matrix().transform_point3(Vec3::X);
        assert_eq!(point, Vec3::new(28.0, 0.0, 0.0));
        assert!(transform.is_world_dirty());
    }

    #[test]
    fn unchanged_transform_stays_clean() {
        let mut transform = Transform::from_translation(Vec3::ZERO);
        let _ = transform.get_local_matrix();
        transform.set_world_matrix(Mat4::IDENTITY);
        transform.reset_flags();

        transform.set_transform(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);

        assert!(!transform.has_changed());
        assert!(!transform.is_world_dirty());
    }

    #[test]
    fn degenerate_scale_keeps_previous_normal_matrix() {
        let transform = Transform::from_translation(Vec3::ZERO);
        transform.set_world_matrix(Mat4::from_scale(Vec3::splat(2.0)));
        let before = *transform.get_inverse_transpose_world_matrix();

        transform.set_world_matrix(Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0)));

        assert_eq!(*transform.get_inverse_transpose_world_matrix(), before);
    }

    #[test]
    fn tiny_scale_still_rotates_normals() {
        let transform = Transform::from_translation(Vec3::ZERO);
        transform.set_world_matrix(Mat4::from_scale_rotation_translation(
            Vec3::splat(0.001),
            Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
            Vec3::ZERO,
        ));

        let normal = transform
            .get_inverse_transpose_world_matrix()
            .transform_vector3(Vec3::Y)
            .normalize();
        assert!((normal - Vec3::Z).length() < 1e-4, "{normal:?}");
    }
}
