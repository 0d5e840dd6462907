//! Transform 组件
//!
//! 管理游戏对象的空间变换（位置、旋转、缩放）。
//! 提供 2D 与 3D 两种变换，相机根据投影类型依赖其中之一。

use super::{Component, ComponentBase};
use crate::core::math::{matrix, Matrix4, Quaternion, Vector2, Vector3};

/// 2D 变换组件
///
/// 旋转为绕 Z 轴的弧度。
pub struct Transform2D {
    base: ComponentBase,
    position: Vector2,
    rotation: f32,
    scale: Vector2,
}

impl Transform2D {
    /// 创建新的 Transform2D 组件
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ComponentBase::new(name),
            position: Vector2::zeros(),
            rotation: 0.0,
            scale: Vector2::new(1.0, 1.0),
        }
    }

    /// 创建带位置的 Transform2D
    pub fn with_position(name: impl Into<String>, position: Vector2) -> Self {
        let mut transform = Self::new(name);
        transform.position = position;
        transform
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn scale(&self) -> Vector2 {
        self.scale
    }

    /// 设置位置
    pub fn set_position(&mut self, position: Vector2) {
        self.position = position;
        self.base.mark_changed();
    }

    /// 设置旋转（弧度）
    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
        self.base.mark_changed();
    }

    /// 设置缩放
    pub fn set_scale(&mut self, scale: Vector2) {
        self.scale = scale;
        self.base.mark_changed();
    }

    /// 添加位置偏移
    pub fn translate(&mut self, offset: Vector2) {
        self.position += offset;
        self.base.mark_changed();
    }

    /// 添加旋转偏移（弧度）
    pub fn rotate(&mut self, angle: f32) {
        self.rotation += angle;
        self.base.mark_changed();
    }

    /// 模型矩阵：T * R * S
    pub fn matrix(&self) -> Matrix4 {
        matrix::translation(self.position.x, self.position.y, 0.0)
            * matrix::rotation_z(self.rotation)
            * matrix::scaling(self.scale.x, self.scale.y, 1.0)
    }
}

impl Component for Transform2D {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::new("Transform2D")
    }
}

/// 3D 变换组件
pub struct Transform3D {
    base: ComponentBase,

    /// 位置
    position: Vector3,

    /// 欧拉角（弧度）
    rotation: Vector3,

    /// 缩放
    scale: Vector3,

    /// 前方向量
    forward: Vector3,

    /// 四元数
    quaternion: Quaternion,

    /// 世界矩阵缓存
    world_matrix: Matrix4,

    /// 世界矩阵是否需要更新
    world_dirty: bool,
}

impl Transform3D {
    /// 创建新的 Transform3D 组件
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ComponentBase::new(name),
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            forward: Vector3::new(0.0, 0.0, -1.0),
            quaternion: Quaternion::identity(),
            world_matrix: Matrix4::identity(),
            world_dirty: true,
        }
    }

    /// 创建带位置和旋转的 Transform3D
    pub fn with_position_rotation(
        name: impl Into<String>,
        position: Vector3,
        rotation: Vector3,
    ) -> Self {
        let mut transform = Self::new(name);
        transform.position = position;
        transform.rotation = rotation;
        transform
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn rotation(&self) -> Vector3 {
        self.rotation
    }

    pub fn scale(&self) -> Vector3 {
        self.scale
    }

    /// 设置位置
    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
        self.touch();
    }

    /// 设置欧拉角（弧度）
    pub fn set_rotation(&mut self, rotation: Vector3) {
        self.rotation = rotation;
        self.touch();
    }

    /// 设置缩放
    pub fn set_scale(&mut self, scale: Vector3) {
        self.scale = scale;
        self.touch();
    }

    /// 添加位置偏移
    pub fn translate(&mut self, offset: Vector3) {
        self.position += offset;
        self.touch();
    }

    /// 添加旋转偏移（弧度）
    pub fn rotate(&mut self, offset: Vector3) {
        self.rotation += offset;
        self.touch();
    }

    fn touch(&mut self) {
        self.world_dirty = true;
        self.base.mark_changed();
    }

    /// 获取四元数
    pub fn quaternion(&mut self) -> Quaternion {
        if self.world_dirty {
            self.update_world_matrix();
        }
        self.quaternion
    }

    /// 获取前方向量
    pub fn forward(&mut self) -> Vector3 {
        if self.world_dirty {
            self.update_world_matrix();
        }
        self.forward
    }

    /// 获取世界矩阵
    pub fn world_matrix(&mut self) -> Matrix4 {
        if self.world_dirty {
            self.update_world_matrix();
        }
        self.world_matrix
    }

    fn update_world_matrix(&mut self) {
        let translation = Matrix4::new_translation(&self.position);
        let rotation = matrix::rotation_euler(&self.rotation);
        let scale = Matrix4::new_nonuniform_scaling(&self.scale);

        // 组合：T * R * S
        self.world_matrix = translation * rotation * scale;
        self.quaternion = Quaternion::from_euler_angles(self.rotation.x, self.rotation.y, self.rotation.z);
        self.forward = rotation.transform_vector(&Vector3::new(0.0, 0.0, -1.0)).normalize();
        self.world_dirty = false;
    }
}

impl Component for Transform3D {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn late_update(&mut self, _state: &crate::runtime::StateInfo) {
        // 渲染读取之前刷新缓存
        if self.world_dirty {
            self.update_world_matrix();
        }
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::new("Transform3D")
    }
}
