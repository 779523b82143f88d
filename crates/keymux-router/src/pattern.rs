//! # pattern 模块说明
//!
//! ## 角色定位（Why）
//! - 把过滤器文法（字面段、`.` 分隔符、`*`、`**`、捕获括号）翻译成宿主模式
//!   引擎可执行的正则对：精确模式与后代模式；
//! - 翻译输出被刻意限制在字面量、`[^.]` 字符类、懒惰重复与捕获组四种构造上，
//!   过滤器语义因此不依赖正则引擎的其他特性。
//!
//! ## 契约说明（What）
//! - 精确模式两端锚定：键必须整体满足过滤器；
//! - 后代模式仅锚定起始：命中键本身或以过滤器文本为前缀的更长键（按文本
//!   前缀判定，不感知段边界）；
//! - 两个模式出自同一翻译产物，非通配字符逐一一致；
//! - `*` 翻译为段内懒惰匹配（不跨 `.`），`**` 翻译为跨段懒惰匹配。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::FilterError;

/// 过滤器键允许的字符集合，越界字符在翻译前即报错。
fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '(' | ')' | '*' | '.')
}

/// 编译后的过滤器模式对。
///
/// # 教案式说明
/// - **意图 (Why)**：精确匹配服务单键路由，后代匹配服务"命名空间下全部后端"
///   查询，两者共享翻译结果以保证语义一致；
/// - **契约 (What)**：
///   - `matches` 为全锚定判定；`matches_descendant` 为前缀判定；
///   - `captures` 等于过滤器中通过校验的 `(` 数量；
///   - 实例构建后不可变，可跨线程只读共享；
/// - **设计权衡 (Trade-offs)**：懒惰重复（`*?`）决定捕获取最短文本，与消歧
///   启发式"更具体者胜"的方向一致；贪婪重复会让 `(**)` 类捕获吞掉后续字面段。
#[derive(Debug, Clone)]
pub(crate) struct FilterPattern {
    exact: Regex,
    descendant: Regex,
    captures: usize,
}

impl FilterPattern {
    /// 将过滤器键编译为模式对。
    ///
    /// # 教案式说明
    /// - **意图 (Why)**：单次从左到右扫描同时完成三件事：字符集校验、通配符
    ///   翻译、捕获括号配对校验，任何一项失败都立即中止构建；
    /// - **执行 (How)**：
    ///   1. 逐字符确认落在允许集合内；
    ///   2. `**` 翻译为 `.*?`，单个 `*` 翻译为 `[^.]*?`，`.` 转义为 `\.`，
    ///      括号原样保留并计数，其余字符按字面写入；
    ///   3. 以 `^…$` 编译精确模式、`^…` 编译后代模式。
    /// - **契约 (What)**：括号不配对（嵌套开括号、多余闭括号、未闭合）均为
    ///   致命错误；翻译产物被引擎拒绝属于实现缺陷，以 `Internal` 兜底上报。
    pub(crate) fn compile(filter: &str) -> Result<FilterPattern, FilterError> {
        for c in filter.chars() {
            if !is_allowed(c) {
                return Err(FilterError::InvalidFilterCharacter {
                    filter: filter.to_owned(),
                    character: c,
                });
            }
        }

        // 字符集校验通过后输入必为 ASCII，按字节扫描是安全的。
        let bytes = filter.as_bytes();
        let mut body = String::with_capacity(filter.len() + 8);
        let mut captures = 0usize;
        let mut in_group = false;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'*' if bytes.get(i + 1) == Some(&b'*') => {
                    body.push_str(".*?");
                    i += 2;
                    continue;
                }
                b'*' => body.push_str("[^.]*?"),
                b'.' => body.push_str(r"\."),
                b'(' => {
                    if in_group {
                        return Err(unbalanced(
                            filter,
                            "a new capture group opened before the previous one closed",
                        ));
                    }
                    in_group = true;
                    captures += 1;
                    body.push('(');
                }
                b')' => {
                    if !in_group {
                        return Err(unbalanced(filter, "a capture group closed but none was open"));
                    }
                    in_group = false;
                    body.push(')');
                }
                literal => body.push(literal as char),
            }
            i += 1;
        }
        if in_group {
            return Err(unbalanced(filter, "a capture group was not closed"));
        }

        let exact = Regex::new(&format!("^{body}$"))
            .map_err(|err| FilterError::internal(format!("exact pattern for `{filter}`: {err}")))?;
        let descendant = Regex::new(&format!("^{body}")).map_err(|err| {
            FilterError::internal(format!("descendant pattern for `{filter}`: {err}"))
        })?;
        Ok(FilterPattern {
            exact,
            descendant,
            captures,
        })
    }

    /// 键是否整体满足过滤器。
    pub(crate) fn matches(&self, key: &str) -> bool {
        self.exact.is_match(key)
    }

    /// 键是否等于过滤器前缀或以其为文本前缀。
    pub(crate) fn matches_descendant(&self, key: &str) -> bool {
        self.descendant.is_match(key)
    }

    /// 过滤器声明的捕获组数量。
    pub(crate) fn captures(&self) -> usize {
        self.captures
    }

    /// 精确模式的源文本，作为重复定义检测的结构同一性标识。
    pub(crate) fn exact_source(&self) -> &str {
        self.exact.as_str()
    }

    /// 在键上执行精确匹配并返回捕获内容。
    pub(crate) fn capture_texts<'k>(&self, key: &'k str) -> Option<regex::Captures<'k>> {
        self.exact.captures(key)
    }
}

fn unbalanced(filter: &str, detail: &str) -> FilterError {
    FilterError::UnbalancedCaptureGroup {
        filter: filter.to_owned(),
        detail: detail.to_owned(),
    }
}

/// 捕获引用扫描器（`$` 后跟一串数字），供值校验与替换引擎共用。
pub(crate) static CAPTURE_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\d+)").expect("capture reference regex"));

/// URI 探测用占位符扫描器：`$` 连同其后全部数字（可为零个）。
pub(crate) static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\d*").expect("placeholder regex"));
