//! 配置管理命令
//!
//! 配置文件位于 `<config_dir>/sanxi/config.toml`。

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use sanxi_sdk::protocol::{Joint, JointLimits, JointRange, MotionParameters};
use sanxi_sdk::serial::SerialConfig;
use sanxi_sdk::teleop::TeleopConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 配置目录
fn config_dir() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("sanxi");
    Ok(path)
}

pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// 单轴限位覆盖
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitOverride {
    /// 关节编号 1..=6
    pub joint: u8,
    pub min: f64,
    pub max: f64,
}

/// CLI 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// 默认串口
    pub port: Option<String>,

    pub serial: SerialConfig,

    /// 连接后下发的运动参数
    pub motion: MotionParameters,

    pub teleop: TeleopConfig,

    /// 在出厂限位表上逐轴覆盖
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub joint_limits: Vec<LimitOverride>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            port: None,
            serial: SerialConfig::default(),
            motion: MotionParameters::default(),
            teleop: TeleopConfig::default(),
            joint_limits: Vec::new(),
        }
    }
}

impl CliConfig {
    /// 从默认位置加载；文件不存在时返回默认配置
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        config.limits()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("创建配置目录失败")?;
        }
        let body = toml::to_string_pretty(self).context("序列化配置失败")?;
        let content = format!("# Sanxi CLI Configuration\n\n{}", body);
        fs::write(path, content).with_context(|| format!("写入配置文件失败: {}", path.display()))?;
        Ok(())
    }

    /// 出厂限位表叠加覆盖项
    pub fn limits(&self) -> Result<JointLimits> {
        let mut limits = JointLimits::FACTORY;
        for entry in &self.joint_limits {
            let joint = Joint::try_from(entry.joint)
                .map_err(|_| anyhow::anyhow!("无效的关节编号: {}", entry.joint))?;
            if !(entry.min.is_finite() && entry.max.is_finite()) || entry.min > entry.max {
                bail!(
                    "J{} 限位无效: [{}, {}]",
                    entry.joint,
                    entry.min,
                    entry.max
                );
            }
            limits.ranges[joint.index()] = Some(JointRange::new(entry.min, entry.max));
        }
        Ok(limits)
    }
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 显示当前配置
    Show,

    /// 显示配置文件路径
    Path,

    /// 写入默认配置文件
    Init {
        /// 覆盖已有文件
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    /// `port` 为全局 `--port`，`init` 时写入配置
    pub fn execute(self, port: Option<String>) -> Result<()> {
        let path = config_file()?;
        match self {
            ConfigCommand::Show => {
                let config = CliConfig::load_from(&path)?;
                println!("配置文件: {}", path.display());
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            },
            ConfigCommand::Path => {
                println!("{}", path.display());
                Ok(())
            },
            ConfigCommand::Init { force } => init(&path, force, port),
        }
    }
}

fn init(path: &Path, force: bool, port: Option<String>) -> Result<()> {
    if path.exists() && !force {
        bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
    }
    let config = CliConfig {
        port,
        ..Default::default()
    };
    config.save_to(path)?;
    println!("✅ 已写入配置文件: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CliConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.limits().unwrap(), JointLimits::FACTORY);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = CliConfig {
            port: Some("/dev/ttyUSB1".to_string()),
            motion: MotionParameters::new(20.0, 40.0, 40.0),
            joint_limits: vec![LimitOverride {
                joint: 6,
                min: -90.0,
                max: 90.0,
            }],
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        let loaded = CliConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(
            loaded.limits().unwrap().range(Joint::J6),
            Some(JointRange::new(-90.0, 90.0))
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "port = \"COM3\"\n\n[teleop]\nposition_scale = 0.25\n",
        )
        .unwrap();

        let config = CliConfig::load_from(&path).unwrap();
        assert_eq!(config.port.as_deref(), Some("COM3"));
        assert_eq!(config.teleop.position_scale, 0.25);
        assert_eq!(config.teleop.period_ms, 80);
        assert_eq!(config.serial, SerialConfig::default());
    }

    #[test]
    fn test_invalid_limit_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[[joint_limits]]\njoint = 7\nmin = 0.0\nmax = 1.0\n").unwrap();
        assert!(CliConfig::load_from(&path).is_err());

        fs::write(&path, "[[joint_limits]]\njoint = 2\nmin = 5.0\nmax = 1.0\n").unwrap();
        assert!(CliConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        init(&path, false, Some("mock0".to_string())).unwrap();
        assert!(init(&path, false, None).is_err());
        init(&path, true, None).unwrap();
        assert_eq!(CliConfig::load_from(&path).unwrap().port, None);
    }
}
