//! # properties 模块说明
//!
//! ## 角色定位（Why）
//! - 把规则文本按 properties 风格拆成有序的 `(键, 值)` 对，供别名表与规则
//!   编译器消费；
//! - 解析器自身不做任何语义校验：重复键原样保留（重复检测属于规则编译器），
//!   文件顺序原样保留（错误报告按首个越界行触发）。
//!
//! ## 契约说明（What）
//! - 空行与以 `#`、`!` 开头的注释行被忽略；
//! - 每行在首个 `=` 处切分，键与值两侧空白被去除；
//! - 没有 `=` 的行整体作为键、值为空串（空值随后会在 URI 校验处失败）。

/// 解析规则文本为有序键值对序列。
///
/// # 教案式说明
/// - **意图 (Why)**：规则语言只需要 properties 格式的一个极小子集，完整实现
///   （转义、续行、`:` 分隔）反而会让过滤器文法里的字符产生歧义；
/// - **契约 (What)**：输入为完整规则文本；输出向量保持文件行序，绝不合并或
///   丢弃重复键；
/// - **风险 (Trade-offs)**：值在首个 `=` 之后原样保留（仅去空白），因此 URI
///   模板中允许再出现 `=`。
pub(crate) fn parse_lines(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (line, ""),
        };
        pairs.push((key.to_owned(), value.to_owned()));
    }
    pairs
}
