//! 透传文本指令

use anyhow::{Context, Result, bail};
use clap::Args;
use sanxi_sdk::protocol::split_raw_lines;
use std::io::Read;
use std::path::PathBuf;

use crate::modes::oneshot::OneShotMode;

/// 逐行发送文件（或标准输入 `-`）中的指令
#[derive(Args, Debug)]
pub struct SendCommand {
    /// 指令文件路径，`-` 表示标准输入
    pub input: PathBuf,
}

impl SendCommand {
    pub fn read_input(&self) -> Result<String> {
        if self.input.as_os_str() == "-" {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("读取标准输入失败")?;
            Ok(text)
        } else {
            std::fs::read_to_string(&self.input)
                .with_context(|| format!("读取 {} 失败", self.input.display()))
        }
    }

    pub fn execute(self, mode: &OneShotMode) -> Result<()> {
        let text = self.read_input()?;
        if split_raw_lines(&text).is_empty() {
            bail!("没有可发送的指令");
        }
        mode.run(|arm| {
            let sent = arm.send_raw_text(&text)?;
            println!("✅ 已发送 {} 行", sent);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_input_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "G00 J1=10").unwrap();
        writeln!(file, "G00 J2=20").unwrap();

        let cmd = SendCommand {
            input: file.path().to_path_buf(),
        };
        let text = cmd.read_input().unwrap();
        assert_eq!(split_raw_lines(&text), vec!["G00 J1=10", "G00 J2=20"]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let cmd = SendCommand {
            input: PathBuf::from("/nonexistent/sanxi/commands.txt"),
        };
        assert!(cmd.read_input().is_err());
    }
}
