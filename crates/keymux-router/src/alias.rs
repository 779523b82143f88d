//! # alias 模块说明
//!
//! ## 角色定位（Why）
//! - 从键值对序列中分拣别名定义（`$name = 原始值`），并对别名命名文法做
//!   快速失败校验；
//! - 规则可以写在其引用的别名之前，因此分拣必须先于规则编译整体完成，
//!   这也是构建流程采用两段式扫描的原因。
//!
//! ## 契约说明（What）
//! - 合法别名键完整匹配 `$[A-Za-z_][A-Za-z0-9_]*`；
//! - `$` 后跟非字母/下划线（典型是数字开头）为致命错误；
//! - 同名别名后写覆盖先写（properties 语义），表内保存的是未展开的原始值；
//! - 值是否构成别名引用由 [`AliasTable::is_reference`] 判定：`$` 后跟字母或
//!   下划线才算引用，`$1` 这类记号属于捕获占位符而非别名。

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::FilterError;

static ALIAS_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$[A-Za-z_][A-Za-z0-9_]*$").expect("alias name regex"));

/// 别名表：别名记号到未展开原始值的只读映射。
///
/// # 教案式说明
/// - **意图 (Why)**：把"名字长什么样"与"值怎么用"分离，规则编译器只需做
///   整记号查询；
/// - **契约 (What)**：构建完成后不可变，多线程只读访问无需同步；
/// - **风险 (Trade-offs)**：不做别名间的递归展开，`$a = $b` 这类值会作为普通
///   模板进入 URI 校验并在那里失败，错误消息仍能指回来源别名。
#[derive(Debug, Default)]
pub(crate) struct AliasTable {
    entries: HashMap<String, String>,
}

impl AliasTable {
    /// 把键值对分拣为（别名表，过滤器键值对）。
    ///
    /// # 教案式说明
    /// - **意图 (Why)**：单次遍历同时完成命名校验与分拣，非法别名键立即中止
    ///   整个构建；
    /// - **契约 (What)**：
    ///   - 输入为解析层产出的有序键值对；
    ///   - 过滤器对保持原有顺序返回，供编译器按行序报错；
    ///   - **后置条件**：返回的表中只含合法别名，重复定义保留最后一个。
    pub(crate) fn partition(
        pairs: Vec<(String, String)>,
    ) -> Result<(AliasTable, Vec<(String, String)>), FilterError> {
        let mut entries = HashMap::new();
        let mut filters = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            if !key.starts_with('$') {
                filters.push((key, value));
                continue;
            }
            if ALIAS_NAME.is_match(&key) {
                entries.insert(key, value);
                continue;
            }
            let detail = match key[1..].chars().next() {
                None => "alias name is empty",
                Some(first) if !first.is_ascii_alphabetic() && first != '_' => {
                    "aliases may not start with a digit"
                }
                Some(_) => "alias names may only contain letters, digits, and underscores",
            };
            return Err(FilterError::AliasNaming {
                key,
                detail: detail.to_owned(),
            });
        }
        Ok((AliasTable { entries }, filters))
    }

    /// 按整记号查询别名的原始值。
    pub(crate) fn resolve(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    /// 判断规则值是否构成别名引用。
    ///
    /// - **契约 (What)**：`$` 后第一个字符是字母或下划线即判定为引用；引用必须
    ///   整体命中已定义别名，部分匹配由调用方报 `UndefinedAliasReference`。
    pub(crate) fn is_reference(value: &str) -> bool {
        value.strip_prefix('$').is_some_and(|rest| {
            rest.chars()
                .next()
                .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        })
    }

    /// 表内别名数量。
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
