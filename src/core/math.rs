//! 数学库模块
//!
//! 基于 `nalgebra` 提供变换组件与相机使用的类型别名和辅助函数。

pub use nalgebra::{
    Matrix4 as Mat4, UnitQuaternion,
    Vector2 as Vec2, Vector3 as Vec3, Vector4 as Vec4,
};

// 类型别名，使用更简洁的名称
pub type Vector2 = Vec2<f32>;
pub type Vector3 = Vec3<f32>;
pub type Vector4 = Vec4<f32>;
pub type Matrix4 = Mat4<f32>;
pub type Quaternion = UnitQuaternion<f32>;

/// 数学常量
pub mod constants {
    /// 角度转弧度的系数
    pub const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;

    /// 浮点比较默认误差
    pub const EPSILON: f32 = 1e-6;
}

/// 工具函数
pub mod utils {
    use super::constants;

    /// 角度转弧度
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// 检查两个浮点数是否近似相等
    pub fn approx_eq(a: f32, b: f32, epsilon: f32) -> bool {
        (a - b).abs() < epsilon
    }
}

/// 矩阵辅助函数
pub mod matrix {
    use super::*;

    /// 创建平移矩阵
    pub fn translation(x: f32, y: f32, z: f32) -> Matrix4 {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// 创建缩放矩阵
    pub fn scaling(x: f32, y: f32, z: f32) -> Matrix4 {
        Matrix4::new_nonuniform_scaling(&Vector3::new(x, y, z))
    }

    /// 创建绕 Z 轴旋转的矩阵
    pub fn rotation_z(angle: f32) -> Matrix4 {
        Matrix4::from_axis_angle(&Vector3::z_axis(), angle)
    }

    /// 按 Z * Y * X 顺序组合欧拉角旋转（弧度）
    pub fn rotation_euler(euler: &Vector3) -> Matrix4 {
        let rotation_x = Matrix4::from_axis_angle(&Vector3::x_axis(), euler.x);
        let rotation_y = Matrix4::from_axis_angle(&Vector3::y_axis(), euler.y);
        rotation_z(euler.z) * rotation_y * rotation_x
    }

    /// 创建透视投影矩阵
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Matrix4 {
        Matrix4::new_perspective(aspect, fov_y, near, far)
    }

    /// 创建正交投影矩阵
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Matrix4 {
        Matrix4::new_orthographic(left, right, bottom, top, near, far)
    }
}
