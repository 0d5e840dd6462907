//! 场景描述模块
//!
//! 用 TOML 声明场景中的对象及其组件，加载后交给
//! [`Scene::from_config`](crate::runtime::Scene::from_config) 构建。
//!
//! ```toml
//! name = "Demo"
//!
//! [[objects]]
//! name = "MainCamera"
//!
//! [[objects.components]]
//! type = "transform3d"
//! position = [0.0, 0.0, 3.0]
//!
//! [[objects.components]]
//! type = "camera"
//! projection = "perspective"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::component::{Camera, GameObject, ProjectionType, Transform2D, Transform3D};
use crate::core::error::{ConfigError, DistSceneError, Result};
use crate::core::math::{utils, Vector2, Vector3};

/// 组件描述，`type` 字段区分组件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ComponentConfig {
    #[serde(rename = "transform2d")]
    Transform2D {
        #[serde(default)]
        position: [f32; 2],

        /// 旋转角（度数）
        #[serde(default)]
        rotation: f32,

        #[serde(default = "default_scale_2d")]
        scale: [f32; 2],
    },

    #[serde(rename = "transform3d")]
    Transform3D {
        #[serde(default)]
        position: [f32; 3],

        /// 欧拉角（度数）(pitch, yaw, roll)
        #[serde(default)]
        rotation: [f32; 3],

        #[serde(default = "default_scale_3d")]
        scale: [f32; 3],
    },

    #[serde(rename = "camera")]
    Camera {
        #[serde(default)]
        projection: ProjectionType,

        #[serde(default = "default_width")]
        width: u32,

        #[serde(default = "default_height")]
        height: u32,

        /// 垂直视场角（度数）
        #[serde(default = "default_fov")]
        fov: f32,
    },
}

fn default_scale_2d() -> [f32; 2] {
    [1.0, 1.0]
}

fn default_scale_3d() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_fov() -> f32 {
    45.0
}

impl ComponentConfig {
    /// 按描述创建组件并挂到对象上
    fn attach(&self, object: &mut GameObject, object_name: &str) -> Result<()> {
        match self {
            ComponentConfig::Transform2D { position, rotation, scale } => {
                let mut transform = Transform2D::new(format!("{}Transform2D", object_name));
                transform.set_position(Vector2::new(position[0], position[1]));
                transform.set_rotation(utils::deg_to_rad(*rotation));
                transform.set_scale(Vector2::new(scale[0], scale[1]));
                object.add_component(transform)?;
            }
            ComponentConfig::Transform3D { position, rotation, scale } => {
                let mut transform = Transform3D::new(format!("{}Transform3D", object_name));
                transform.set_position(Vector3::from(*position));
                transform.set_rotation(Vector3::from(*rotation).map(utils::deg_to_rad));
                transform.set_scale(Vector3::from(*scale));
                object.add_component(transform)?;
            }
            ComponentConfig::Camera { projection, width, height, fov } => {
                let mut camera = Camera::new(format!("{}Camera", object_name), *projection);
                camera.set_dimensions(*width, *height);
                let (_, near_z, far_z) = camera.lens();
                camera.set_lens(utils::deg_to_rad(*fov), near_z, far_z);
                object.add_component(camera)?;
            }
        }
        Ok(())
    }
}

/// 对象描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectConfig {
    pub name: String,

    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

impl ObjectConfig {
    /// 构建尚未激活的对象
    ///
    /// 无法添加的组件（例如重复的类型）会被记录并跳过，对象本身仍然创建。
    pub fn build(&self) -> GameObject {
        let mut object = GameObject::new(self.name.clone());
        for component in &self.components {
            if let Err(e) = component.attach(&mut object, &self.name) {
                tracing::warn!(object = %self.name, "Skipped component from scene description: {}", e);
            }
        }
        object
    }
}

/// 场景描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// 场景名称
    #[serde(default = "default_scene_name")]
    pub name: String,

    /// 场景中的对象，按声明顺序参与每帧更新
    #[serde(default)]
    pub objects: Vec<ObjectConfig>,
}

fn default_scene_name() -> String {
    "Untitled".to_string()
}

impl Default for SceneConfig {
    /// 只含一个正交相机的默认场景
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            objects: vec![ObjectConfig {
                name: "MainCamera".to_string(),
                components: vec![
                    ComponentConfig::Transform2D {
                        position: [0.0, 0.0],
                        rotation: 0.0,
                        scale: default_scale_2d(),
                    },
                    ComponentConfig::Camera {
                        projection: ProjectionType::Orthographic,
                        width: default_width(),
                        height: default_height(),
                        fov: default_fov(),
                    },
                ],
            }],
        }
    }
}

impl SceneConfig {
    /// 从文件加载场景描述
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| DistSceneError::Config(ConfigError::FileNotFound(format!(
                "Failed to read scene file '{}': {}",
                path.display(),
                e
            ))))?;

        Self::from_toml(&contents)
    }

    /// 从 TOML 文本解析
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| DistSceneError::Config(ConfigError::ParseError(format!(
                "Failed to parse scene file: {}",
                e
            ))))
    }

    /// 从文件加载，如果文件不存在或无法解析则返回默认场景
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path.exists() {
            match Self::from_file(path) {
                Ok(config) => {
                    tracing::info!("Loaded scene from: {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to load scene: {}, using default scene", e);
                    Self::default()
                }
            }
        } else {
            tracing::info!("Scene file not found, using default scene");
            Self::default()
        }
    }

    /// 保存到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)
            .map_err(|e| DistSceneError::Config(ConfigError::ParseError(format!(
                "Failed to serialize scene: {}",
                e
            ))))?;

        fs::write(path, contents)?;

        tracing::info!("Saved scene to: {}", path.display());
        Ok(())
    }

    /// 按声明顺序构建全部对象
    pub fn build_objects(&self) -> Vec<GameObject> {
        self.objects.iter().map(ObjectConfig::build).collect()
    }
}
