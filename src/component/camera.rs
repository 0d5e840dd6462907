//! Camera 组件
//!
//! 根据投影类型依赖 [`Transform2D`]（正交）或 [`Transform3D`]（透视），
//! 每帧在 `update` 阶段由变换重新计算投影矩阵，在 `late_update` 阶段把发生变化的
//! 矩阵上传到绑定的 uniform 缓冲区。

use serde::{Deserialize, Serialize};

use super::{Component, ComponentBase, ComponentKind, RequiredComponents, ResourceRef};
use super::{Transform2D, Transform3D};
use crate::core::error::{DistSceneError, Result};
use crate::core::math::{matrix, utils, Matrix4};
use crate::resource::{Buffer, BufferUsage};
use crate::runtime::StateInfo;

/// 投影类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionType {
    /// 正交投影，跟随 Transform2D
    #[default]
    Orthographic,
    /// 透视投影，跟随 Transform3D
    Perspective,
}

/// Camera 组件
pub struct Camera {
    base: ComponentBase,

    /// 投影类型
    projection_type: ProjectionType,

    /// 视口宽度（像素）
    width: u32,

    /// 视口高度（像素）
    height: u32,

    /// 垂直视场角（弧度）
    fov_y: f32,

    /// 近裁剪面距离
    near_z: f32,

    /// 远裁剪面距离
    far_z: f32,

    /// 投影矩阵
    projection: Matrix4,

    transform_2d: ResourceRef<Transform2D>,
    transform_3d: ResourceRef<Transform3D>,

    /// 投影矩阵的上传目标（可选）
    uniform: Option<Buffer>,
}

impl Camera {
    /// 创建新的 Camera，默认视口 1280x720
    pub fn new(name: impl Into<String>, projection_type: ProjectionType) -> Self {
        Self {
            base: ComponentBase::new(name),
            projection_type,
            width: 1280,
            height: 720,
            fov_y: utils::deg_to_rad(45.0),
            near_z: 0.1,
            far_z: 1000.0,
            projection: Matrix4::identity(),
            transform_2d: ResourceRef::empty(),
            transform_3d: ResourceRef::empty(),
            uniform: None,
        }
    }

    pub fn projection_type(&self) -> ProjectionType {
        self.projection_type
    }

    /// 切换投影类型
    ///
    /// 激活之后切换时，通过所属对象查找新投影需要的变换组件。
    pub fn set_projection_type(&mut self, projection_type: ProjectionType) {
        if self.projection_type == projection_type {
            return;
        }
        self.projection_type = projection_type;

        let object = self.base.object().clone();
        match projection_type {
            ProjectionType::Orthographic if !self.transform_2d.is_valid() && object.is_alive() => {
                if let Some(shared) = object.get_component::<Transform2D>() {
                    self.transform_2d = ResourceRef::new(&shared);
                }
            }
            ProjectionType::Perspective if !self.transform_3d.is_valid() && object.is_alive() => {
                if let Some(shared) = object.get_component::<Transform3D>() {
                    self.transform_3d = ResourceRef::new(&shared);
                }
            }
            _ => {}
        }

        self.base.mark_changed();
    }

    /// 视口尺寸
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// 设置视口尺寸
    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.base.mark_changed();
    }

    /// 宽高比
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }

    /// 透视投影参数 (fov_y, near_z, far_z)
    pub fn lens(&self) -> (f32, f32, f32) {
        (self.fov_y, self.near_z, self.far_z)
    }

    /// 设置透视投影参数
    ///
    /// # 参数
    /// - `fov_y`: 垂直视场角（弧度）
    /// - `near_z`: 近裁剪面距离
    /// - `far_z`: 远裁剪面距离
    pub fn set_lens(&mut self, fov_y: f32, near_z: f32, far_z: f32) {
        self.fov_y = fov_y;
        self.near_z = near_z;
        self.far_z = far_z;
        self.base.mark_changed();
    }

    /// 获取投影矩阵
    pub fn projection(&self) -> Matrix4 {
        self.projection
    }

    /// 绑定投影矩阵的 uniform 缓冲区
    pub fn bind_uniform_buffer(&mut self, buffer: Buffer) {
        self.uniform = Some(buffer);
    }

    pub fn uniform_buffer(&self) -> Option<&Buffer> {
        self.uniform.as_ref()
    }

    /// 把当前投影矩阵上传到绑定的缓冲区
    ///
    /// 缓冲区无效时由缓冲区记录误用错误，本操作为空操作。
    pub fn apply_projection(&mut self) {
        if let Some(buffer) = self.uniform.as_mut() {
            buffer.upload(bytemuck::cast_slice(self.projection.as_slice()), BufferUsage::Often);
        }
    }

    /// 由变换重新计算投影矩阵
    ///
    /// 依赖的变换已失效时保留上一帧的矩阵。
    fn update_projection(&mut self) {
        let projection = match self.projection_type {
            ProjectionType::Orthographic => self.orthographic(),
            ProjectionType::Perspective => self.perspective(),
        };

        if let Some(projection) = projection {
            if projection != self.projection {
                self.projection = projection;
                self.base.mark_changed();
            }
        }
    }

    fn orthographic(&self) -> Option<Matrix4> {
        let (position, rotation) = self.transform_2d.with(|t| (t.position(), t.rotation()))?;
        let half_width = self.width as f32 / 2.0;
        let half_height = self.height as f32 / 2.0;

        Some(
            matrix::orthographic(-half_width, half_width, -half_height, half_height, -1.0, 1.0)
                * matrix::translation(position.x, position.y, 0.0)
                * matrix::rotation_z(rotation),
        )
    }

    fn perspective(&self) -> Option<Matrix4> {
        let (position, rotation) = self.transform_3d.with(|t| (t.position(), t.rotation()))?;

        Some(
            matrix::perspective(self.fov_y, self.aspect(), self.near_z, self.far_z)
                * matrix::translation(position.x, position.y, position.z)
                * matrix::rotation_euler(&rotation),
        )
    }

    fn transform_kind(&self) -> ComponentKind {
        match self.projection_type {
            ProjectionType::Orthographic => ComponentKind::of::<Transform2D>(),
            ProjectionType::Perspective => ComponentKind::of::<Transform3D>(),
        }
    }
}

impl Component for Camera {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn required_kinds(&self) -> Vec<ComponentKind> {
        vec![self.transform_kind()]
    }

    fn set_required_components(&mut self, required: RequiredComponents) {
        if let Some(transform) = required.get::<Transform2D>() {
            self.transform_2d = transform;
        }
        if let Some(transform) = required.get::<Transform3D>() {
            self.transform_3d = transform;
        }
    }

    fn start(&mut self) -> Result<()> {
        let wired = match self.projection_type {
            ProjectionType::Orthographic => self.transform_2d.is_valid(),
            ProjectionType::Perspective => self.transform_3d.is_valid(),
        };
        if !wired {
            return Err(DistSceneError::Component(format!(
                "camera '{}' has no {} to follow",
                self.base.name(),
                self.transform_kind()
            )));
        }

        self.update_projection();
        Ok(())
    }

    fn update(&mut self, _state: &StateInfo) {
        self.update_projection();
    }

    fn late_update(&mut self, _state: &StateInfo) {
        if self.has_changed() {
            self.apply_projection();
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new("Camera", ProjectionType::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::component::GameObject;
    use crate::core::math::{Vector2, Vector3, Vector4};
    use crate::resource::{BufferType, HeadlessBackend};

    fn state() -> StateInfo {
        StateInfo::new(0.016, 1, 0.016)
    }

    #[test]
    fn test_requires_transform_for_projection() {
        let ortho = Camera::new("Ortho", ProjectionType::Orthographic);
        assert_eq!(ortho.required_kinds(), vec![ComponentKind::of::<Transform2D>()]);

        let persp = Camera::new("Persp", ProjectionType::Perspective);
        assert_eq!(persp.required_kinds(), vec![ComponentKind::of::<Transform3D>()]);
    }

    #[test]
    fn test_orthographic_follows_transform() {
        let mut go = GameObject::with_camera("MainCamera", ProjectionType::Orthographic);
        go.activate().unwrap();

        let transform = go.get_component::<Transform2D>().unwrap();
        let camera = go.get_component::<Camera>().unwrap();

        let origin = camera.borrow().projection() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(origin.x.abs() < 1e-6);

        transform.borrow_mut().set_position(Vector2::new(64.0, 0.0));
        camera.borrow_mut().frame_cleanup();
        camera.borrow_mut().update(&state());
        assert!(camera.borrow().has_changed());

        let moved = camera.borrow().projection() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((moved.x - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_switch_projection_after_activation() {
        let mut go = GameObject::with_camera("MainCamera", ProjectionType::Orthographic);
        go.activate().unwrap();

        let camera = go.get_component::<Camera>().unwrap();
        let transform = go.get_component::<Transform3D>().unwrap();
        transform.borrow_mut().set_position(Vector3::new(0.0, 0.0, -5.0));

        camera.borrow_mut().set_projection_type(ProjectionType::Perspective);
        camera.borrow_mut().update(&state());

        let expected = matrix::perspective(utils::deg_to_rad(45.0), 1280.0 / 720.0, 0.1, 1000.0)
            * matrix::translation(0.0, 0.0, -5.0);
        let diff = (camera.borrow().projection() - expected).abs().max();
        assert!(diff < 1e-5);
    }

    #[test]
    fn test_followed_transform_cannot_be_removed() {
        let mut go = GameObject::with_camera("MainCamera", ProjectionType::Orthographic);
        go.activate().unwrap();

        let camera = go.get_component::<Camera>().unwrap();
        let before = camera.borrow().projection();

        assert!(!go.remove_component::<Transform2D>());
        assert!(go.has_component::<Transform2D>());
        camera.borrow_mut().update(&state());
        assert_eq!(camera.borrow().projection(), before);

        // 切换到透视后 Transform2D 不再被依赖
        camera.borrow_mut().set_projection_type(ProjectionType::Perspective);
        assert!(go.remove_component::<Transform2D>());
        assert!(!go.remove_component::<Transform3D>());

        camera.borrow_mut().update(&state());
        assert_ne!(camera.borrow().projection(), before);
    }

    #[test]
    fn test_projection_uploaded_when_changed() {
        let backend = Rc::new(HeadlessBackend::new());
        let mut go = GameObject::with_camera("MainCamera", ProjectionType::Orthographic);
        go.activate().unwrap();

        let camera = go.get_component::<Camera>().unwrap();
        let buffer = Buffer::new(backend.clone(), BufferType::Uniform);
        let handle = buffer.handle();
        camera.borrow_mut().bind_uniform_buffer(buffer);

        camera.borrow_mut().late_update(&state());
        let uploaded = backend.contents(handle).unwrap();
        assert_eq!(uploaded.len(), 16 * std::mem::size_of::<f32>());

        // 没有变化时不重复上传
        camera.borrow_mut().frame_cleanup();
        backend.clear_upload_count();
        camera.borrow_mut().late_update(&state());
        assert_eq!(backend.upload_count(), 0);
    }

    #[test]
    fn test_unwired_camera_fails_to_start() {
        let mut camera = Camera::default();
        assert!(camera.start().is_err());
    }
}
