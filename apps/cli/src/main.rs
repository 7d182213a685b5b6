//! # Sanxi CLI
//!
//! 三喜机械臂命令行工具。每个命令独立执行：连接 → 操作 → 断开。
//!
//! ```bash
//! # 配置默认串口
//! sanxi-cli config init --port /dev/ttyUSB0
//!
//! # 查询坐标、直线运动
//! sanxi-cli query
//! sanxi-cli move-cartesian --line --x 250 --z 300
//!
//! # 脚本设备遥操作 10 秒
//! sanxi-cli teleop --script demo.json --duration-s 10
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod modes;

use commands::{
    ConfigCommand, JogCommand, ModeCommand, MoveCartesianCommand, MoveJointsCommand,
    ParamsCommand, QueryCommand, SendCommand, TeleopCommand,
};
use modes::oneshot::OneShotMode;

/// Sanxi CLI - 机械臂命令行工具
#[derive(Parser, Debug)]
#[command(name = "sanxi-cli")]
#[command(about = "Command-line interface for SANXI arm control", long_about = None)]
#[command(version)]
struct Cli {
    /// 串口（覆盖配置文件）
    #[arg(long, global = true)]
    port: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 查询当前坐标
    Query {
        #[command(flatten)]
        args: QueryCommand,
    },

    /// 切换工作模式
    Mode {
        #[command(flatten)]
        args: ModeCommand,
    },

    /// 查询固件当前模式
    QueryMode,

    /// 笛卡尔运动
    MoveCartesian {
        #[command(flatten)]
        args: MoveCartesianCommand,
    },

    /// 多关节运动
    MoveJoints {
        #[command(flatten)]
        args: MoveJointsCommand,
    },

    /// 单轴点动
    Jog {
        #[command(flatten)]
        args: JogCommand,
    },

    /// 设置运动参数
    Params {
        #[command(flatten)]
        args: ParamsCommand,
    },

    /// 透传文本指令
    Send {
        #[command(flatten)]
        args: SendCommand,
    },

    /// 遥操作（脚本设备）
    Teleop {
        #[command(flatten)]
        args: TeleopCommand,
    },
}

fn main() -> Result<()> {
    sanxi_sdk::init_logger();

    let Cli { port, command } = Cli::parse();
    let oneshot = || OneShotMode::new(port.clone());

    match command {
        Commands::Config(cmd) => cmd.execute(port.clone()),
        Commands::Query { args } => args.execute(&oneshot()?),
        Commands::Mode { args } => args.execute(&oneshot()?),
        Commands::QueryMode => commands::query::query_mode(&oneshot()?),
        Commands::MoveCartesian { args } => args.execute(&oneshot()?),
        Commands::MoveJoints { args } => args.execute(&oneshot()?),
        Commands::Jog { args } => args.execute(&oneshot()?),
        Commands::Params { args } => args.execute(&oneshot()?),
        Commands::Send { args } => args.execute(&oneshot()?),
        Commands::Teleop { args } => args.execute(&oneshot()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_move_cartesian() {
        let cli = Cli::try_parse_from([
            "sanxi-cli",
            "move-cartesian",
            "--line",
            "--x",
            "-12.5",
            "--port",
            "COM3",
        ])
        .unwrap();
        assert_eq!(cli.port.as_deref(), Some("COM3"));
        match cli.command {
            Commands::MoveCartesian { args } => {
                assert!(args.line);
                assert_eq!(args.x, Some(-12.5));
            },
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_jog_rejects_bad_axis() {
        assert!(Cli::try_parse_from(["sanxi-cli", "jog", "7", "pos"]).is_err());
        assert!(Cli::try_parse_from(["sanxi-cli", "jog", "3", "neg", "--duration-ms", "50"]).is_ok());
    }

    #[test]
    fn test_parse_teleop_and_params() {
        let cli = Cli::try_parse_from([
            "sanxi-cli",
            "teleop",
            "--script",
            "demo.json",
            "--duration-s",
            "2.5",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Teleop { .. }));

        let cli = Cli::try_parse_from(["sanxi-cli", "params", "5", "30", "10"]).unwrap();
        match cli.command {
            Commands::Params { args } => assert_eq!(args.parameters().accel_pct, 30.0),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
