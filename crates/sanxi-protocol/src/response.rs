//! 返回帧解析
//!
//! 固件返回的是自由文本，其中可能夹带一段坐标键值序列：
//!
//! ```text
//! <任意文本>J1=<f> J2=<f> J3=<f> J4=<f> J5=<f> J6=<f>\r<空白>
//! <任意文本>X=<f> Y=<f> Z=<f> A=<f> B=<f> C=<f> D=<f>\r<空白>
//! ```
//!
//! 两种语法在每一帧上都会尝试（解析层面不互斥）。坐标序列必须位于
//! 帧的第一行内。匹配失败不是错误：调用方保留旧缓存。

use crate::types::{CartesianPose, JointAngles};

const JOINT_KEYS: [&str; 6] = ["J1", "J2", "J3", "J4", "J5", "J6"];
const CARTESIAN_KEYS: [&str; 7] = ["X", "Y", "Z", "A", "B", "C", "D"];

/// 坐标帧语法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    Joint,
    Cartesian,
}

/// 单一语法的匹配结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameMatch {
    NoMatch,
    Joint(JointAngles),
    Cartesian(CartesianPose),
}

impl FrameMatch {
    pub fn is_match(&self) -> bool {
        !matches!(self, FrameMatch::NoMatch)
    }
}

impl Grammar {
    fn keys(self) -> &'static [&'static str] {
        match self {
            Grammar::Joint => &JOINT_KEYS,
            Grammar::Cartesian => &CARTESIAN_KEYS,
        }
    }

    /// 用本语法匹配一帧
    pub fn match_frame(self, frame: &str) -> FrameMatch {
        let Some(values) = match_sequence(frame, self.keys()) else {
            return FrameMatch::NoMatch;
        };

        match self {
            Grammar::Joint => {
                let mut out = [0.0; 6];
                out.copy_from_slice(&values);
                FrameMatch::Joint(JointAngles(out))
            },
            Grammar::Cartesian => {
                let mut out = [0.0; 7];
                out.copy_from_slice(&values);
                FrameMatch::Cartesian(CartesianPose::from_array(out))
            },
        }
    }
}

/// 一帧的完整解析结果（两种语法各自独立）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParsedResponse {
    pub joints: Option<JointAngles>,
    pub cartesian: Option<CartesianPose>,
}

impl ParsedResponse {
    pub fn is_empty(&self) -> bool {
        self.joints.is_none() && self.cartesian.is_none()
    }
}

/// 对一帧同时尝试两种语法
pub fn parse_response(frame: &str) -> ParsedResponse {
    let joints = match Grammar::Joint.match_frame(frame) {
        FrameMatch::Joint(angles) => Some(angles),
        _ => None,
    };
    let cartesian = match Grammar::Cartesian.match_frame(frame) {
        FrameMatch::Cartesian(pose) => Some(pose),
        _ => None,
    };
    ParsedResponse { joints, cartesian }
}

/// 在第一行内寻找 `<k1>=<v> <k2>=<v> ... <kn>=<v>\r<空白>`
fn match_sequence(frame: &str, keys: &[&str]) -> Option<Vec<f64>> {
    // 第一行（保留换行符，它可以充当 `\r` 之后的空白）
    let line = match frame.find('\n') {
        Some(pos) => &frame[..=pos],
        None => frame,
    };

    // 结束标记：`\r` 后紧跟空白。从最后一个开始尝试
    let terminators: Vec<usize> = line
        .char_indices()
        .filter(|&(i, c)| {
            c == '\r'
                && line[i + 1..]
                    .chars()
                    .next()
                    .is_some_and(char::is_whitespace)
        })
        .map(|(i, _)| i)
        .collect();

    terminators
        .iter()
        .rev()
        .find_map(|&end| parse_body(&line[..end], keys))
}

fn parse_body(body: &str, keys: &[&str]) -> Option<Vec<f64>> {
    let first = format!("{}=", keys[0]);
    // 前缀为任意文本，取最后一次出现的首键
    let start = body.rfind(&first)?;
    let mut rest = &body[start + first.len()..];

    let mut values = Vec::with_capacity(keys.len());
    for key in &keys[1..] {
        let marker = format!(" {}=", key);
        let pos = rest.find(&marker)?;
        values.push(parse_number(&rest[..pos])?);
        rest = &rest[pos + marker.len()..];
    }
    values.push(parse_number(rest)?);
    Some(values)
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_frame() {
        let frame = "J1=10.00 J2=0 J3=0 J4=0 J5=0 J6=0\r\n";
        assert_eq!(
            Grammar::Joint.match_frame(frame),
            FrameMatch::Joint(JointAngles([10.0, 0.0, 0.0, 0.0, 0.0, 0.0]))
        );
        assert_eq!(Grammar::Cartesian.match_frame(frame), FrameMatch::NoMatch);
    }

    #[test]
    fn test_cartesian_frame_with_prefix() {
        let frame = "OK G00 X=100.5 Y=-20 Z=300 A=1 B=2 C=3 D=0\r\n";
        let parsed = parse_response(frame);
        assert!(parsed.joints.is_none());
        assert_eq!(
            parsed.cartesian,
            Some(CartesianPose::from_array([100.5, -20.0, 300.0, 1.0, 2.0, 3.0, 0.0]))
        );
    }

    #[test]
    fn test_requires_carriage_return_terminator() {
        // 只有 `\n`，没有 `\r`
        assert!(parse_response("J1=1 J2=2 J3=3 J4=4 J5=5 J6=6\n").is_empty());
        // `\r` 位于帧尾，后面没有空白
        assert!(parse_response("J1=1 J2=2 J3=3 J4=4 J5=5 J6=6\r").is_empty());
        // `\r` 后跟空格也可以
        assert!(parse_response("J1=1 J2=2 J3=3 J4=4 J5=5 J6=6\r ").joints.is_some());
    }

    #[test]
    fn test_non_coordinate_chatter() {
        assert!(parse_response("").is_empty());
        assert!(parse_response("\x14").is_empty());
        assert!(parse_response("READY\r\n").is_empty());
    }

    #[test]
    fn test_missing_key_is_no_match() {
        assert!(parse_response("J1=1 J2=2 J3=3 J5=5 J6=6\r\n").is_empty());
        assert!(parse_response("X=1 Y=2 Z=3 A=4 B=5 C=6\r\n").is_empty());
    }

    #[test]
    fn test_invalid_number_is_no_match() {
        assert!(parse_response("J1=abc J2=2 J3=3 J4=4 J5=5 J6=6\r\n").is_empty());
        assert!(parse_response("J1=nan J2=2 J3=3 J4=4 J5=5 J6=6\r\n").is_empty());
    }

    #[test]
    fn test_sequence_must_be_on_first_line() {
        let frame = "chatter\nJ1=1 J2=2 J3=3 J4=4 J5=5 J6=6\r\n";
        assert!(parse_response(frame).is_empty());
    }

    #[test]
    fn test_both_grammars_can_match_same_frame() {
        let frame = "J1=1 J2=2 J3=3 J4=4 J5=5 J6=6 X=1 Y=2 Z=3 A=4 B=5 C=6 D=7\r\n";
        let parsed = parse_response(frame);
        // 关节序列的 J6 值吞掉了后面的文本，无法解析为数值
        assert!(parsed.joints.is_none());
        assert!(parsed.cartesian.is_some());
    }

    #[test]
    fn test_last_prefix_occurrence_wins() {
        let frame = "X=9 noise X=1 Y=2 Z=3 A=4 B=5 C=6 D=7\r\n";
        let parsed = parse_response(frame);
        assert_eq!(parsed.cartesian.unwrap().x, 1.0);
    }

    #[test]
    fn test_negative_and_scientific_values() {
        let frame = "J1=-1.5 J2=2e1 J3=-0 J4=4 J5=5 J6=-6.25\r\n";
        let parsed = parse_response(frame);
        assert_eq!(
            parsed.joints,
            Some(JointAngles([-1.5, 20.0, 0.0, 4.0, 5.0, -6.25]))
        );
    }
}
