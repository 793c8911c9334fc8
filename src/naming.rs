//! 骨骼名称筛选与左右镜像
//!
//! 左右侧由名称末尾的 `_l` / `_r` 决定；没有这两种后缀的名称视为中线骨骼，不做镜像。

use regex::Regex;

use crate::Result;

/// 骨骼所在侧
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Center,
}

impl Side {
    /// 名称后缀字符
    pub fn suffix(self) -> Option<char> {
        match self {
            Side::Left => Some('l'),
            Side::Right => Some('r'),
            Side::Center => None,
        }
    }

    pub fn mirrored(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Center => Side::Center,
        }
    }
}

/// 根据名称后缀判断侧
pub fn side(name: &str) -> Side {
    if name.ends_with("_l") {
        Side::Left
    } else if name.ends_with("_r") {
        Side::Right
    } else {
        Side::Center
    }
}

/// 按正则筛选名称，保持输入顺序
pub fn filter_names<S: AsRef<str>>(names: &[S], pattern: &str) -> Result<Vec<String>> {
    let re = Regex::new(pattern)?;
    Ok(names
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| re.is_match(name))
        .map(str::to_string)
        .collect())
}

/// 交换末尾的 `_l` / `_r`，其他名称原样返回
pub fn mirror_name(name: &str) -> String {
    swap_suffix(name)
}

/// 对模式字符串做同样的后缀交换
///
/// 允许模式末尾带 `$` 锚点，例如 `glute_(\d{2})_l$`。
pub fn mirror_pattern(pattern: &str) -> String {
    match pattern.strip_suffix('$') {
        Some(body) => format!("{}$", swap_suffix(body)),
        None => swap_suffix(pattern),
    }
}

fn swap_suffix(s: &str) -> String {
    if let Some(stem) = s.strip_suffix("_l") {
        format!("{stem}_r")
    } else if let Some(stem) = s.strip_suffix("_r") {
        format!("{stem}_l")
    } else {
        s.to_string()
    }
}
